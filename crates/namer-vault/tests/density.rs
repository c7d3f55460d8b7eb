//! Property tests: series stay dense under any mix of adds and removes.

use std::fs;

use namer_core::{Chapter, CounterStore, CreatorId, Difficulty, Kind, Series};
use namer_vault::{AddRequest, Contributor, NoInterrupt, Transaction};
use proptest::prelude::*;

#[derive(Debug, Clone)]
enum Op {
    Add(Series, u8),
    /// Remove the n-th file (modulo the series length), if any.
    Remove(Series, usize),
}

fn any_series() -> impl Strategy<Value = Series> {
    prop::sample::select(Series::ALL.to_vec())
}

fn any_op() -> impl Strategy<Value = Op> {
    prop_oneof![
        3 => (any_series(), 0u8..4).prop_map(|(s, c)| Op::Add(s, c)),
        1 => (any_series(), any::<usize>()).prop_map(|(s, i)| Op::Remove(s, i)),
    ]
}

fn add(c: &Contributor, series: Series, chapter: u8) {
    let request = AddRequest {
        series,
        chapter: Chapter::new(u32::from(chapter)).unwrap(),
        difficulty: Difficulty::L2,
        kind: if chapter % 2 == 0 { Kind::Math } else { Kind::Lean },
        content: format!("{series} chapter {chapter}").into_bytes(),
    };
    Transaction::begin(c, &NoInterrupt)
        .unwrap()
        .add(request)
        .unwrap();
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(32))]

    #[test]
    fn series_stay_dense(ops in prop::collection::vec(any_op(), 1..24)) {
        let root = tempfile::tempdir().unwrap();
        let c = Contributor::create(root.path(), CreatorId::new(42).unwrap(), "Prop").unwrap();
        let mut model = [Vec::<String>::new(), Vec::<String>::new()];

        for op in ops {
            match op {
                Op::Add(series, chapter) => {
                    add(&c, series, chapter);
                    let content = format!("{series} chapter {chapter}");
                    model[series as usize].push(content);
                }
                Op::Remove(series, index) => {
                    let mut entries: Vec<_> = c
                        .series()
                        .list_matching()
                        .unwrap()
                        .filter(|e| e.name.series == series)
                        .collect();
                    if entries.is_empty() {
                        continue;
                    }
                    entries.sort_by_key(|e| e.name.sequence);
                    let victim = &entries[index % entries.len()];
                    let file = victim.path.file_name().unwrap().to_string_lossy().into_owned();
                    Transaction::begin(&c, &NoInterrupt).unwrap().remove(&file).unwrap();
                    model[series as usize].remove(index % entries.len());
                }
            }
        }

        let counters = CounterStore::load(&c.counter_path()).unwrap();
        for series in Series::ALL {
            let mut entries: Vec<_> = c
                .series()
                .list_matching()
                .unwrap()
                .filter(|e| e.name.series == series)
                .collect();
            entries.sort_by_key(|e| e.name.sequence);

            let expected = &model[series as usize];
            let sequences: Vec<u32> = entries.iter().map(|e| e.name.sequence).collect();
            let dense: Vec<u32> = (1..=u32::try_from(expected.len()).unwrap()).collect();
            prop_assert_eq!(&sequences, &dense);
            prop_assert_eq!(counters.get(series), u32::try_from(expected.len()).unwrap());

            let contents: Vec<String> = entries
                .iter()
                .map(|e| fs::read_to_string(&e.path).unwrap())
                .collect();
            prop_assert_eq!(&contents, expected);
        }
    }
}
