//! Structured dataset filenames.
//!
//! Every dataset file is named
//! `<series><creator:2><sequence:4>_C<chapter:2>_L<difficulty>_<kind>.<ext>`,
//! for example `WS070001_C02_L3_MATH.tex`. Tokens are matched
//! case-insensitively and always written upper-case; the extension is
//! always written lower-case and must agree with the kind.

use std::fmt;
use std::str::FromStr;
use std::sync::LazyLock;

use regex::Regex;
use serde::Serialize;

use crate::error::{NamerError, Result};

/// Largest sequence that fits the four-digit field.
pub const MAX_SEQUENCE: u32 = 9999;

static PATTERN: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?i)^(WS|NS)([0-9]{2})([0-9]{4})_C([0-9]{2})_L([1-5])_(MATH|LEAN)\.(tex|lean)$")
        .expect("filename pattern compiles")
});

/// One of the two independent numbering namespaces of a contributor.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum Series {
    Ws,
    Ns,
}

impl Series {
    pub const ALL: [Series; 2] = [Series::Ws, Series::Ns];

    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Ws => "WS",
            Self::Ns => "NS",
        }
    }
}

impl fmt::Display for Series {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Series {
    type Err = NamerError;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_ascii_uppercase().as_str() {
            "WS" => Ok(Self::Ws),
            "NS" => Ok(Self::Ns),
            _ => Err(invalid("series", s)),
        }
    }
}

/// Two-digit contributor number.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize)]
pub struct CreatorId(u8);

impl CreatorId {
    /// # Errors
    ///
    /// Returns [`NamerError::InvalidInput`] if `id` does not fit two digits.
    pub fn new(id: u32) -> Result<Self> {
        u8::try_from(id)
            .ok()
            .filter(|id| *id <= 99)
            .map(Self)
            .ok_or_else(|| invalid("creator id", &id.to_string()))
    }

    #[must_use]
    pub fn get(self) -> u8 {
        self.0
    }
}

impl fmt::Display for CreatorId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:02}", self.0)
    }
}

impl FromStr for CreatorId {
    type Err = NamerError;

    fn from_str(s: &str) -> Result<Self> {
        let id: u32 = parse_digits(s.trim()).ok_or_else(|| invalid("creator id", s))?;
        Self::new(id)
    }
}

/// Two-digit chapter number, written with a `C` tag.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize)]
pub struct Chapter(u8);

impl Chapter {
    /// # Errors
    ///
    /// Returns [`NamerError::InvalidInput`] if `chapter` does not fit two digits.
    pub fn new(chapter: u32) -> Result<Self> {
        u8::try_from(chapter)
            .ok()
            .filter(|c| *c <= 99)
            .map(Self)
            .ok_or_else(|| invalid("chapter", &chapter.to_string()))
    }

    #[must_use]
    pub fn get(self) -> u8 {
        self.0
    }
}

impl fmt::Display for Chapter {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "C{:02}", self.0)
    }
}

/// Accepts `C02`, `c2` and `2`.
impl FromStr for Chapter {
    type Err = NamerError;

    fn from_str(s: &str) -> Result<Self> {
        let trimmed = s.trim();
        let digits = trimmed
            .strip_prefix(['C', 'c'])
            .unwrap_or(trimmed);
        let chapter = parse_digits(digits).ok_or_else(|| invalid("chapter", s))?;
        Self::new(chapter)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum Difficulty {
    L1,
    L2,
    L3,
    L4,
    L5,
}

impl Difficulty {
    pub const ALL: [Difficulty; 5] = [
        Difficulty::L1,
        Difficulty::L2,
        Difficulty::L3,
        Difficulty::L4,
        Difficulty::L5,
    ];

    #[must_use]
    pub fn level(self) -> u8 {
        match self {
            Self::L1 => 1,
            Self::L2 => 2,
            Self::L3 => 3,
            Self::L4 => 4,
            Self::L5 => 5,
        }
    }

    fn from_level(level: u8) -> Option<Self> {
        Self::ALL.get(usize::from(level).checked_sub(1)?).copied()
    }
}

impl fmt::Display for Difficulty {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "L{}", self.level())
    }
}

impl FromStr for Difficulty {
    type Err = NamerError;

    fn from_str(s: &str) -> Result<Self> {
        let upper = s.trim().to_ascii_uppercase();
        upper
            .strip_prefix('L')
            .filter(|d| d.len() == 1)
            .and_then(|d| d.parse::<u8>().ok())
            .and_then(Self::from_level)
            .ok_or_else(|| invalid("difficulty", s))
    }
}

/// What the file holds; decides the extension.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum Kind {
    Math,
    Lean,
}

impl Kind {
    pub const ALL: [Kind; 2] = [Kind::Math, Kind::Lean];

    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Math => "MATH",
            Self::Lean => "LEAN",
        }
    }

    /// File extension, without the dot.
    #[must_use]
    pub fn extension(self) -> &'static str {
        match self {
            Self::Math => "tex",
            Self::Lean => "lean",
        }
    }
}

impl fmt::Display for Kind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Kind {
    type Err = NamerError;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_ascii_uppercase().as_str() {
            "MATH" => Ok(Self::Math),
            "LEAN" => Ok(Self::Lean),
            _ => Err(invalid("kind", s)),
        }
    }
}

/// A decoded dataset filename.
///
/// `sequence` is at most [`MAX_SEQUENCE`]; `encode` and `decode` are
/// mutually inverse for every such record.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
pub struct FileName {
    pub series: Series,
    pub creator: CreatorId,
    pub sequence: u32,
    pub chapter: Chapter,
    pub difficulty: Difficulty,
    pub kind: Kind,
}

impl FileName {
    /// Render the canonical filename.
    #[must_use]
    pub fn encode(&self) -> String {
        self.to_string()
    }

    /// Parse a filename against the dataset grammar.
    ///
    /// # Errors
    ///
    /// Returns [`NamerError::NotAPattern`] if any field is malformed, has the
    /// wrong width, or the extension does not match the kind.
    pub fn decode(name: &str) -> Result<Self> {
        let not_a_pattern = || NamerError::NotAPattern(name.to_string());
        let caps = PATTERN.captures(name).ok_or_else(not_a_pattern)?;

        let kind: Kind = caps[6].parse().map_err(|_| not_a_pattern())?;
        if !caps[7].eq_ignore_ascii_case(kind.extension()) {
            return Err(not_a_pattern());
        }

        Ok(Self {
            series: caps[1].parse().map_err(|_| not_a_pattern())?,
            creator: caps[2].parse().map_err(|_| not_a_pattern())?,
            sequence: caps[3].parse().map_err(|_| not_a_pattern())?,
            chapter: caps[4].parse().map_err(|_| not_a_pattern())?,
            difficulty: Difficulty::from_level(caps[5].parse().map_err(|_| not_a_pattern())?)
                .ok_or_else(not_a_pattern)?,
            kind,
        })
    }

    /// Same record with only the numeric sequence replaced.
    #[must_use]
    pub fn with_sequence(self, sequence: u32) -> Self {
        Self { sequence, ..self }
    }

    /// Linear probe for the first sequence `>= start` whose candidate name
    /// is not reported as taken by `exists`.
    ///
    /// # Errors
    ///
    /// Returns [`NamerError::SequenceExhausted`] if every slot up to
    /// [`MAX_SEQUENCE`] is taken.
    pub fn next_candidate(
        self,
        start: u32,
        mut exists: impl FnMut(&FileName) -> bool,
    ) -> Result<Self> {
        (start..=MAX_SEQUENCE)
            .map(|seq| self.with_sequence(seq))
            .find(|candidate| !exists(candidate))
            .ok_or(NamerError::SequenceExhausted(self.series))
    }
}

impl fmt::Display for FileName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{}{}{:04}_{}_{}_{}.{}",
            self.series,
            self.creator,
            self.sequence,
            self.chapter,
            self.difficulty,
            self.kind,
            self.kind.extension()
        )
    }
}

impl FromStr for FileName {
    type Err = NamerError;

    fn from_str(s: &str) -> Result<Self> {
        Self::decode(s)
    }
}

fn parse_digits(s: &str) -> Option<u32> {
    if s.is_empty() || !s.bytes().all(|b| b.is_ascii_digit()) {
        return None;
    }
    s.parse().ok()
}

fn invalid(field: &'static str, value: &str) -> NamerError {
    NamerError::InvalidInput {
        field,
        value: value.trim().to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    fn sample(sequence: u32) -> FileName {
        FileName {
            series: Series::Ws,
            creator: CreatorId::new(7).unwrap(),
            sequence,
            chapter: Chapter::new(2).unwrap(),
            difficulty: Difficulty::L3,
            kind: Kind::Math,
        }
    }

    #[test]
    fn encode_pads_every_field() {
        assert_eq!(sample(1).encode(), "WS070001_C02_L3_MATH.tex");

        let lean = FileName {
            series: Series::Ns,
            creator: CreatorId::new(12).unwrap(),
            sequence: 345,
            chapter: Chapter::new(10).unwrap(),
            difficulty: Difficulty::L5,
            kind: Kind::Lean,
        };
        assert_eq!(lean.encode(), "NS120345_C10_L5_LEAN.lean");
    }

    #[test]
    fn decode_reads_fields() {
        let name = FileName::decode("NS120345_C10_L5_LEAN.lean").unwrap();
        assert_eq!(name.series, Series::Ns);
        assert_eq!(name.creator.get(), 12);
        assert_eq!(name.sequence, 345);
        assert_eq!(name.chapter.get(), 10);
        assert_eq!(name.difficulty, Difficulty::L5);
        assert_eq!(name.kind, Kind::Lean);
    }

    #[test]
    fn decode_is_case_insensitive_and_normalises() {
        let name = FileName::decode("ws070001_c02_l3_math.TEX").unwrap();
        assert_eq!(name, sample(1));
        assert_eq!(name.encode(), "WS070001_C02_L3_MATH.tex");
    }

    #[test]
    fn decode_rejects_malformed_names() {
        for bad in [
            "WS07001_C02_L3_MATH.tex",   // sequence too short
            "WS0700001_C02_L3_MATH.tex", // too long
            "XS070001_C02_L3_MATH.tex",
            "WS070001_C2_L3_MATH.tex",
            "WS070001_C02_L6_MATH.tex",
            "WS070001_C02_L0_MATH.tex",
            "WS070001_C02_L3_MATH.lean", // extension/kind mismatch
            "WS070001_C02_L3_LEAN.tex",
            "WS070001_C02_L3_MATH.tex.tmp",
            "WS070001_C02_L3_MATH",
            "WS07٠001_C02_L3_MATH.tex", // non-ascii digit
            ".cache",
            "",
        ] {
            assert!(
                matches!(FileName::decode(bad), Err(NamerError::NotAPattern(_))),
                "{bad} should not decode"
            );
        }
    }

    #[test]
    fn leading_zeros_are_insignificant() {
        assert_eq!(FileName::decode("WS070010_C02_L3_MATH.tex").unwrap().sequence, 10);
        assert_eq!(FileName::decode("WS070000_C02_L3_MATH.tex").unwrap().sequence, 0);
    }

    #[test]
    fn field_parsers_accept_operator_input() {
        assert_eq!("ws".parse::<Series>().unwrap(), Series::Ws);
        assert_eq!(" NS ".parse::<Series>().unwrap(), Series::Ns);
        assert!("xs".parse::<Series>().is_err());

        assert_eq!("C02".parse::<Chapter>().unwrap().get(), 2);
        assert_eq!("c2".parse::<Chapter>().unwrap().get(), 2);
        assert_eq!("2".parse::<Chapter>().unwrap().get(), 2);
        assert!("C100".parse::<Chapter>().is_err());
        assert!("C".parse::<Chapter>().is_err());
        assert!("-1".parse::<Chapter>().is_err());

        assert_eq!("l4".parse::<Difficulty>().unwrap(), Difficulty::L4);
        assert!("L6".parse::<Difficulty>().is_err());
        assert!("L11".parse::<Difficulty>().is_err());

        assert_eq!("lean".parse::<Kind>().unwrap(), Kind::Lean);
        assert!("tex".parse::<Kind>().is_err());

        assert_eq!("7".parse::<CreatorId>().unwrap().to_string(), "07");
        assert!("100".parse::<CreatorId>().is_err());
        assert!("seven".parse::<CreatorId>().is_err());
    }

    #[test]
    fn next_candidate_skips_taken_slots() {
        let taken = [sample(1).encode(), sample(2).encode()];
        let next = sample(0)
            .next_candidate(1, |c| taken.contains(&c.encode()))
            .unwrap();
        assert_eq!(next.sequence, 3);

        let first = sample(0).next_candidate(5, |_| false).unwrap();
        assert_eq!(first.sequence, 5);
    }

    #[test]
    fn next_candidate_reports_exhaustion() {
        let err = sample(0)
            .next_candidate(MAX_SEQUENCE, |_| true)
            .unwrap_err();
        assert!(matches!(err, NamerError::SequenceExhausted(Series::Ws)));
        assert!(sample(0).next_candidate(MAX_SEQUENCE + 1, |_| false).is_err());
    }

    fn any_name() -> impl Strategy<Value = FileName> {
        (
            prop::sample::select(Series::ALL.to_vec()),
            0u32..=99,
            0u32..=MAX_SEQUENCE,
            0u32..=99,
            prop::sample::select(Difficulty::ALL.to_vec()),
            prop::sample::select(Kind::ALL.to_vec()),
        )
            .prop_map(|(series, creator, sequence, chapter, difficulty, kind)| FileName {
                series,
                creator: CreatorId::new(creator).unwrap(),
                sequence,
                chapter: Chapter::new(chapter).unwrap(),
                difficulty,
                kind,
            })
    }

    proptest! {
        #[test]
        fn decode_inverts_encode(name in any_name()) {
            let encoded = name.encode();
            prop_assert_eq!(FileName::decode(&encoded).unwrap(), name);
        }

        #[test]
        fn decode_accepts_any_token_casing(name in any_name()) {
            let lowered = name.encode().to_ascii_lowercase();
            prop_assert_eq!(FileName::decode(&lowered).unwrap(), name);
        }
    }
}
