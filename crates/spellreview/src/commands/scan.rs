//! Scan command: list whole-word occurrences with context.

use camino::Utf8PathBuf;
use clap::Args;
use owo_colors::{OwoColorize, Stream};
use serde::Serialize;
use tracing::{debug, instrument};

use spellreview_core::scanner::{BoundaryPolicy, ContextFragments, Scanner};

use super::read_input_file;

/// Arguments for the `scan` subcommand.
#[derive(Args, Debug)]
pub struct ScanArgs {
    /// File to scan.
    pub file: Utf8PathBuf,

    /// Word to look for (case-sensitive).
    pub word: String,

    /// Render context as HTML with the word highlighted.
    #[arg(long)]
    pub html: bool,

    /// Which side of a match must sit on a word boundary.
    #[arg(long, value_enum)]
    pub boundary: Option<BoundaryPolicy>,
}

#[derive(Serialize)]
struct ScanHit {
    occurrence: usize,
    start: usize,
    end: usize,
    context: ContextFragments,
    #[serde(skip_serializing_if = "Option::is_none")]
    html: Option<String>,
}

#[derive(Serialize)]
struct ScanReport<'a> {
    word: &'a str,
    count: usize,
    occurrences: Vec<ScanHit>,
}

/// List every accepted occurrence of a word in a file.
#[instrument(name = "cmd_scan", skip_all, fields(file = %args.file, word = %args.word))]
pub fn cmd_scan(
    args: ScanArgs,
    global_json: bool,
    scanner: Scanner,
    max_input_bytes: Option<usize>,
) -> anyhow::Result<()> {
    debug!(html = args.html, boundary = ?args.boundary, "executing scan command");

    let content = read_input_file(&args.file, max_input_bytes)?;
    let scanner = args
        .boundary
        .map_or(scanner, |policy| Scanner::new(policy, scanner.window()));

    let occurrences: Vec<ScanHit> = scanner
        .occurrences(&content, &args.word)
        .filter_map(|hit| {
            let context = scanner.extract_context(&content, &args.word, hit.ordinal)?;
            Some(ScanHit {
                occurrence: hit.ordinal,
                start: hit.start,
                end: hit.end,
                html: args.html.then(|| context.to_html()),
                context,
            })
        })
        .collect();

    let report = ScanReport {
        word: &args.word,
        count: occurrences.len(),
        occurrences,
    };

    if global_json {
        println!("{}", serde_json::to_string_pretty(&report)?);
        return Ok(());
    }

    if report.count == 0 {
        println!(
            "{}: no occurrences of {}",
            args.file,
            report.word.if_supports_color(Stream::Stdout, |t| t.bold())
        );
        return Ok(());
    }

    for hit in &report.occurrences {
        let context = match hit.html {
            Some(ref html) => html.clone(),
            None => format!(
                "{}{}{}",
                hit.context.before.replace('\n', " "),
                hit.context
                    .word
                    .if_supports_color(Stream::Stdout, |t| t.red())
                    .if_supports_color(Stream::Stdout, |t| t.underline()),
                hit.context.after.replace('\n', " "),
            ),
        };
        println!(
            "{}:{} #{}  {}",
            args.file.if_supports_color(Stream::Stdout, |t| t.dimmed()),
            hit.start,
            hit.occurrence,
            context
        );
    }
    println!(
        "{} occurrence{} of {}",
        report.count,
        if report.count == 1 { "" } else { "s" },
        report.word.if_supports_color(Stream::Stdout, |t| t.bold())
    );

    Ok(())
}
