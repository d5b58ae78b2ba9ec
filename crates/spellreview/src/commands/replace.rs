//! Replace command: non-interactive occurrence replacement.

use anyhow::bail;
use camino::Utf8PathBuf;
use clap::{ArgGroup, Args};
use serde::Serialize;
use tracing::{debug, instrument, warn};

use spellreview_core::replace::ReplaceMode;
use spellreview_core::scanner::{BoundaryPolicy, Scanner};

use super::{read_input_file, write_output};

/// Arguments for the `replace` subcommand.
#[derive(Args, Debug)]
#[command(group(ArgGroup::new("target").required(true).args(["occurrence", "all"])))]
pub struct ReplaceArgs {
    /// File to edit.
    pub file: Utf8PathBuf,

    /// Word to replace (case-sensitive).
    pub word: String,

    /// Replacement text.
    pub replacement: String,

    /// Replace only occurrence N (1-based, as listed by `scan`).
    #[arg(long, value_name = "N", value_parser = clap::value_parser!(u64).range(1..))]
    pub occurrence: Option<u64>,

    /// Replace every occurrence.
    #[arg(long)]
    pub all: bool,

    /// Write the result back into the file instead of stdout.
    #[arg(long)]
    pub in_place: bool,

    /// Which side of a match must sit on a word boundary.
    #[arg(long, value_enum)]
    pub boundary: Option<BoundaryPolicy>,
}

#[derive(Serialize)]
struct ReplaceReport {
    replaced: usize,
    text: String,
}

/// Replace one or all occurrences of a word in a file.
#[instrument(name = "cmd_replace", skip_all, fields(file = %args.file, word = %args.word))]
pub fn cmd_replace(
    args: ReplaceArgs,
    global_json: bool,
    scanner: Scanner,
    max_input_bytes: Option<usize>,
) -> anyhow::Result<()> {
    debug!(occurrence = ?args.occurrence, all = args.all, "executing replace command");

    let content = read_input_file(&args.file, max_input_bytes)?;
    let scanner = args
        .boundary
        .map_or(scanner, |policy| Scanner::new(policy, scanner.window()));

    let (mode, target) = match args.occurrence {
        Some(n) if !args.all => (ReplaceMode::Single, usize::try_from(n)?),
        _ => (ReplaceMode::All, 0),
    };

    let replaced = scanner.replace(&content, &args.word, &args.replacement, mode, target);
    if mode == ReplaceMode::Single && replaced.replaced == 0 {
        bail!(
            "occurrence {target} of `{}` not found in {}",
            args.word,
            args.file
        );
    }
    if replaced.replaced == 0 {
        warn!(word = %args.word, "no occurrences to replace");
    }

    if args.in_place {
        write_output(Some(args.file.as_path()), &replaced.text)?;
    }

    if global_json {
        let report = ReplaceReport {
            replaced: replaced.replaced,
            text: replaced.text,
        };
        println!("{}", serde_json::to_string_pretty(&report)?);
    } else if args.in_place {
        eprintln!("replaced {} occurrence(s) in {}", replaced.replaced, args.file);
    } else {
        write_output(None, &replaced.text)?;
    }

    Ok(())
}
