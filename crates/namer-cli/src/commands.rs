//! `add`, `rm` and `status`.

use std::fs;
use std::io::{BufRead, Write};
use std::path::{Path, PathBuf};

use anyhow::{bail, Context as _, Result};
use serde::Serialize;

use namer_core::{
    Chapter, CounterStore, Counters, CreatorId, Difficulty, FileName, Kind, Series,
};
use namer_sync::GitSync;
use namer_vault::{AddRequest, Contributor, ShutdownSignal, Transaction};

use crate::config::Config;
use crate::prompt::Prompter;

/// Settings shared by every command.
pub struct Context {
    pub root: PathBuf,
    pub config: Config,
    pub sync: bool,
    pub json: bool,
    pub shutdown: ShutdownSignal,
}

impl Context {
    fn repo(&self, candidates: &[&Path]) -> Option<GitSync> {
        if !self.sync || !self.config.sync.enabled {
            return None;
        }
        GitSync::discover(candidates).map(|git| git.with_push(self.config.sync.push))
    }

    fn emit<T: Serialize>(&self, value: &T) -> Result<()> {
        if self.json {
            println!("{}", serde_json::to_string_pretty(value)?);
        }
        Ok(())
    }

    fn say(&self, line: impl std::fmt::Display) {
        if !self.json {
            println!("{line}");
        }
    }
}

#[derive(Debug, Default, clap::Args)]
pub struct AddArgs {
    /// Creator numeric id (0-99)
    #[arg(long)]
    pub creator: Option<CreatorId>,
    /// Creator name, used only when the creator folder does not exist yet
    #[arg(long)]
    pub name: Option<String>,
    /// WS or NS
    #[arg(long)]
    pub series: Option<Series>,
    /// Chapter as C02 or 2
    #[arg(long)]
    pub chapter: Option<Chapter>,
    /// L1..L5
    #[arg(long)]
    pub difficulty: Option<Difficulty>,
    /// MATH or LEAN
    #[arg(long)]
    pub kind: Option<Kind>,
    /// Read the content from this file instead of standard input
    #[arg(long)]
    pub content_file: Option<PathBuf>,
}

#[derive(Debug, Default, clap::Args)]
pub struct RmArgs {
    /// Creator numeric id (0-99)
    #[arg(long)]
    pub creator: Option<CreatorId>,
    /// Full filename to remove, e.g. WS010001_C02_L3_MATH.tex
    pub file: Option<String>,
}

#[derive(Debug, Default, clap::Args)]
pub struct StatusArgs {
    /// Creator numeric id (0-99)
    #[arg(long)]
    pub creator: Option<CreatorId>,
}

#[derive(Serialize)]
struct AddOutput<'a> {
    file: String,
    path: &'a Path,
    counters: Counters,
    synced: bool,
}

#[derive(Serialize)]
struct RmOutput<'a> {
    removed: String,
    renamed: Vec<(String, String)>,
    counters: Counters,
    synced: bool,
    path: &'a Path,
}

pub fn add<R: BufRead, W: Write>(
    ctx: &Context,
    args: AddArgs,
    prompt: &mut Prompter<R, W>,
) -> Result<()> {
    let repo = ctx.repo(&[ctx.root.as_path()]);
    if let Some(repo) = &repo {
        if ctx.config.sync.pull_before_add {
            namer_sync::refresh(repo);
        }
    }

    let creator = match args.creator {
        Some(id) => id,
        None => prompt.ask("Creator numeric ID: ")?,
    };
    let contributor = Contributor::open_or_create(&ctx.root, creator, || match args.name {
        Some(name) => Ok(name),
        None => prompt.ask_text(
            "Enter creator name (will be saved for future runs): ",
            "creator name",
        ),
    })?;
    tracing::info!(dir = %contributor.dir().display(), "contributor folder");

    let series = match args.series {
        Some(series) => series,
        None => prompt.ask("WS or NS: ")?,
    };
    let chapter = match args.chapter {
        Some(chapter) => chapter,
        None => prompt.ask("Chapter (C02 or 2): ")?,
    };
    let difficulty = match args.difficulty {
        Some(difficulty) => difficulty,
        None => prompt.ask("Difficulty L1..L5: ")?,
    };
    let kind = match args.kind {
        Some(kind) => kind,
        None => prompt.ask("MATH or LEAN: ")?,
    };
    let content = match &args.content_file {
        Some(path) => fs::read(path).with_context(|| format!("reading {}", path.display()))?,
        None => prompt.content("Enter file content (end with . on a line):")?,
    };

    let request = AddRequest {
        series,
        chapter,
        difficulty,
        kind,
        content,
    };

    let guard = ctx.shutdown.arm();
    let outcome = Transaction::begin(&contributor, &ctx.shutdown).and_then(|tx| tx.add(request));
    let late_signal = guard.interrupted();
    drop(guard);
    let added = outcome?;

    ctx.say(format_args!("Final filename: {}", added.name));
    ctx.say(format_args!("Saved: {}", added.path.display()));
    if late_signal {
        bail!(
            "interrupted after {} was committed; skipping repository sync",
            added.name
        );
    }

    let synced = repo.as_ref().is_some_and(|repo| {
        namer_sync::publish(
            repo,
            &[added.path.clone()],
            &format!("New file data: {}", added.name),
        )
    });

    ctx.emit(&AddOutput {
        file: added.name.encode(),
        path: &added.path,
        counters: added.counters,
        synced,
    })
}

pub fn remove<R: BufRead, W: Write>(
    ctx: &Context,
    args: RmArgs,
    prompt: &mut Prompter<R, W>,
) -> Result<()> {
    let creator = match args.creator {
        Some(id) => id,
        None => prompt.ask("Creator numeric ID: ")?,
    };
    let contributor = Contributor::open(&ctx.root, creator)?;
    tracing::info!(dir = %contributor.dir().display(), "detected creator folder");

    let file = match args.file {
        Some(file) => file.trim().to_string(),
        None => prompt.ask_with(
            "Enter full filename to remove (e.g. WS010001_C02_L3_MATH.tex): ",
            |s| FileName::decode(s.trim()).map(|_| s.trim().to_string()),
        )?,
    };

    let guard = ctx.shutdown.arm();
    let outcome =
        Transaction::begin(&contributor, &ctx.shutdown).and_then(|tx| tx.remove(&file));
    let late_signal = guard.interrupted();
    drop(guard);
    let removed = outcome?;

    ctx.say(format_args!("Deleted: {}", removed.path.display()));
    for (from, to) in &removed.renamed {
        ctx.say(format_args!("Renamed: {} -> {}", file_name(from), file_name(to)));
    }
    ctx.say(format_args!(
        "Cache updated. {} now ends at {}",
        removed.name.series,
        removed.counters.get(removed.name.series)
    ));
    if late_signal {
        bail!("interrupted after removing {file}; skipping repository sync");
    }

    let repo = ctx.repo(&[ctx.root.as_path(), contributor.dir()]);
    let synced = repo.as_ref().is_some_and(|repo| {
        namer_sync::publish(
            repo,
            &[contributor.dir().to_path_buf()],
            &format!("Removed file data: {file}"),
        )
    });

    ctx.emit(&RmOutput {
        removed: file.clone(),
        renamed: removed
            .renamed
            .iter()
            .map(|(from, to)| (file_name(from), file_name(to)))
            .collect(),
        counters: removed.counters,
        synced,
        path: &removed.path,
    })
}

#[derive(Debug, Serialize)]
struct SeriesStatus {
    series: Series,
    counter: u32,
    files: usize,
    highest: Option<u32>,
    missing: Vec<u32>,
    consistent: bool,
}

#[derive(Debug, Serialize)]
struct StatusOutput {
    creator: String,
    name: String,
    dir: PathBuf,
    series: Vec<SeriesStatus>,
}

pub fn status<R: BufRead, W: Write>(
    ctx: &Context,
    args: StatusArgs,
    prompt: &mut Prompter<R, W>,
) -> Result<()> {
    let creator = match args.creator {
        Some(id) => id,
        None => prompt.ask("Creator numeric ID: ")?,
    };
    let contributor = Contributor::open(&ctx.root, creator)?;
    let counters = CounterStore::load(&contributor.counter_path())?;
    let dir = contributor.series();

    let mut series_status = Vec::with_capacity(Series::ALL.len());
    for series in Series::ALL {
        let files = dir.in_series(creator, series)?.count();
        let sequences = dir.sequences(creator, series)?;
        let highest = sequences.last().copied();
        let missing: Vec<u32> = (1..=highest.unwrap_or(0))
            .filter(|seq| !sequences.contains(seq))
            .collect();
        let counter = counters.get(series);
        series_status.push(SeriesStatus {
            series,
            counter,
            files,
            highest,
            missing: missing.clone(),
            consistent: counter == highest.unwrap_or(0)
                && missing.is_empty()
                && files == sequences.len(),
        });
    }

    for s in &series_status {
        ctx.say(format_args!(
            "{}: counter={} files={} highest={}{}",
            s.series,
            s.counter,
            s.files,
            s.highest.map_or_else(|| "-".to_string(), |h| h.to_string()),
            if s.consistent { "" } else { "  (inconsistent)" }
        ));
        if !s.missing.is_empty() {
            ctx.say(format_args!("  missing sequences: {:?}", s.missing));
        }
    }

    ctx.emit(&StatusOutput {
        creator: creator.to_string(),
        name: contributor.name().to_string(),
        dir: contributor.dir().to_path_buf(),
        series: series_status,
    })
}

fn file_name(path: &Path) -> String {
    path.file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_default()
}
