//! Review command: check a file and walk through each flagged word.
//!
//! The conversation runs on stderr so stdout carries only the reviewed text
//! (or the `--json` summary). Commands are read one per line from stdin:
//!
//! | Input              | Effect                                        |
//! |--------------------|-----------------------------------------------|
//! | `i`, `ignore`      | skip this occurrence                          |
//! | `I`, `ignore-all`  | skip every occurrence of the word             |
//! | `c [N\|WORD]`      | change this occurrence                        |
//! | `C [N\|WORD]`      | change every occurrence                       |
//! | `u`, `undo`        | revert the last change                        |
//! | `q`, `close`       | stop and keep the changes made so far         |
//! | `?`, `help`        | list commands                                 |

use std::io::{self, BufRead, Write};
use std::time::Duration;

use anyhow::{Context, bail};
use camino::Utf8PathBuf;
use clap::Args;
use indicatif::{ProgressBar, ProgressStyle};
use owo_colors::{OwoColorize, Stream};
use serde::Serialize;
use tracing::{debug, instrument};

use spellreview_core::config::Config;
use spellreview_core::error::TransportResult;
use spellreview_core::scanner::{BoundaryPolicy, Scanner};
use spellreview_core::session::{CheckStart, Notice, ReviewSession, Scope, Transition, WordView};
use spellreview_core::transport::{CheckRequest, CheckResult, CheckTransport, StaticTransport};

use super::{read_input_file, write_output};

/// Arguments for the `review` subcommand.
#[derive(Args, Debug)]
pub struct ReviewArgs {
    /// File to review.
    pub file: Utf8PathBuf,

    /// Replay a saved check result instead of calling the service.
    #[arg(long, value_name = "JSON", conflicts_with = "endpoint")]
    pub result: Option<Utf8PathBuf>,

    /// Checking service URL (overrides config).
    #[arg(long, value_name = "URL")]
    pub endpoint: Option<String>,

    /// Extra form field sent with the check request (repeatable).
    #[arg(long = "field", value_name = "KEY=VALUE", value_parser = parse_field)]
    pub fields: Vec<(String, String)>,

    /// Write the reviewed text to FILE instead of stdout.
    #[arg(short, long, value_name = "FILE", conflicts_with = "in_place")]
    pub output: Option<Utf8PathBuf>,

    /// Write the reviewed text back into the input file.
    #[arg(long)]
    pub in_place: bool,

    /// Which side of a match must sit on a word boundary.
    #[arg(long, value_enum)]
    pub boundary: Option<BoundaryPolicy>,
}

fn parse_field(raw: &str) -> Result<(String, String), String> {
    let (key, value) = raw
        .split_once('=')
        .ok_or_else(|| format!("expected KEY=VALUE, got `{raw}`"))?;
    if key.is_empty() {
        return Err(format!("empty field name in `{raw}`"));
    }
    Ok((key.to_string(), value.to_string()))
}

/// Where check results come from.
enum Checker {
    Replay(StaticTransport),
    #[cfg(feature = "http")]
    Http(crate::http::HttpTransport),
}

impl Checker {
    fn from_args(args: &ReviewArgs, config: &Config) -> anyhow::Result<Self> {
        if let Some(ref path) = args.result {
            let body = std::fs::read_to_string(path.as_std_path())
                .with_context(|| format!("failed to read {path}"))?;
            return Ok(Self::Replay(StaticTransport::from_body(body)));
        }

        let Some(endpoint) = args.endpoint.as_ref().or(config.endpoint.as_ref()) else {
            bail!("no checking service configured; pass --endpoint URL or --result FILE");
        };

        Self::http(endpoint, config)
    }

    #[cfg(feature = "http")]
    fn http(endpoint: &str, config: &Config) -> anyhow::Result<Self> {
        let timeout = config.request_timeout_secs.map(Duration::from_secs);
        let transport = crate::http::HttpTransport::new(endpoint, timeout)?;
        Ok(Self::Http(transport))
    }

    #[cfg(not(feature = "http"))]
    fn http(endpoint: &str, _config: &Config) -> anyhow::Result<Self> {
        bail!("cannot reach {endpoint}: built without the `http` feature");
    }

    async fn check(&self, request: &CheckRequest) -> TransportResult<CheckResult> {
        match self {
            Self::Replay(transport) => transport.check(request).await,
            #[cfg(feature = "http")]
            Self::Http(transport) => transport.check(request).await,
        }
    }
}

/// A parsed line of user input.
#[derive(Debug, Clone, PartialEq, Eq)]
enum Intent {
    Ignore(Scope),
    Change(Scope, Choice),
    Undo,
    Close,
    Help,
}

/// Which replacement a change uses.
#[derive(Debug, Clone, PartialEq, Eq)]
enum Choice {
    /// The preselected first suggestion.
    First,
    /// Suggestion number N (1-based).
    Suggestion(usize),
    /// Text typed by the user.
    Literal(String),
}

impl Choice {
    fn from_arg(arg: &str) -> Self {
        match arg.parse::<usize>() {
            _ if arg.is_empty() => Self::First,
            Ok(n) if n > 0 => Self::Suggestion(n),
            _ => Self::Literal(arg.to_string()),
        }
    }

    fn resolve<'a>(&'a self, view: &'a WordView) -> Result<&'a str, String> {
        match self {
            Self::First => view.suggestions.first().map(String::as_str).ok_or_else(|| {
                format!(
                    "no suggestions for `{}`; type `c WORD` to enter a replacement",
                    view.word
                )
            }),
            Self::Suggestion(n) => view
                .suggestions
                .get(n - 1)
                .map(String::as_str)
                .ok_or_else(|| format!("no suggestion {n} for `{}`", view.word)),
            Self::Literal(text) => Ok(text),
        }
    }
}

/// Parse one input line. Blank lines yield `Ok(None)`.
fn parse_intent(line: &str) -> Result<Option<Intent>, String> {
    let line = line.trim();
    if line.is_empty() {
        return Ok(None);
    }
    let (command, arg) = line
        .split_once(char::is_whitespace)
        .map_or((line, ""), |(c, a)| (c, a.trim()));

    let intent = match command {
        "i" | "ignore" => Intent::Ignore(Scope::ThisOccurrence),
        "I" | "ignore-all" => Intent::Ignore(Scope::AllOccurrences),
        "c" | "change" => Intent::Change(Scope::ThisOccurrence, Choice::from_arg(arg)),
        "C" | "change-all" => Intent::Change(Scope::AllOccurrences, Choice::from_arg(arg)),
        "u" | "undo" => Intent::Undo,
        "q" | "close" | "quit" => Intent::Close,
        "?" | "h" | "help" => Intent::Help,
        other => return Err(format!("unknown command `{other}`; type `?` for help")),
    };
    Ok(Some(intent))
}

const HELP: &str = "\
  i, ignore          skip this occurrence
  I, ignore-all      skip every occurrence of this word
  c, change [N|WORD] change this occurrence (default: first suggestion)
  C, change-all      change every occurrence, same arguments as `c`
  u, undo            revert the last change
  q, close           stop and keep the changes made so far
  ?, help            show this list";

/// How the review ended.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
struct ReviewSummary {
    /// Final notice; `None` when the user closed the review.
    notice: Option<Notice>,
    text: String,
    changes: usize,
    ignored: usize,
}

/// Drive an open session from `input`, drawing on `ui`.
///
/// Returns when the session leaves `Open`. End of input closes it.
fn run_review<R: BufRead, W: Write>(
    session: &mut ReviewSession,
    first: Transition,
    original: &str,
    input: R,
    ui: &mut W,
) -> io::Result<ReviewSummary> {
    let mut lines = input.lines();
    let mut changes = 0usize;
    let mut ignored = 0usize;
    let mut transition = first;

    loop {
        let notice = match transition {
            Transition::Review(ref view) => {
                render_view(ui, view)?;
                None
            }
            Transition::Unchanged => None,
            Transition::Complete { text } => {
                return Ok(ReviewSummary {
                    notice: Some(Notice::ReviewComplete),
                    text,
                    changes,
                    ignored,
                });
            }
            Transition::Closed { text } => {
                return Ok(ReviewSummary {
                    notice: None,
                    text: text.unwrap_or_else(|| original.to_string()),
                    changes,
                    ignored,
                });
            }
            Transition::Notice(notice) => Some(notice),
        };
        if let Some(notice) = notice {
            return Ok(ReviewSummary {
                notice: Some(notice),
                text: original.to_string(),
                changes,
                ignored,
            });
        }

        write!(ui, "{} ", ">".if_supports_color(Stream::Stderr, |t| t.cyan()))?;
        ui.flush()?;
        let Some(line) = lines.next().transpose()? else {
            writeln!(ui)?;
            debug!("input closed, ending review");
            transition = session.close();
            continue;
        };

        let intent = match parse_intent(&line) {
            Ok(Some(intent)) => intent,
            Ok(None) => {
                transition = Transition::Unchanged;
                continue;
            }
            Err(msg) => {
                writeln!(ui, "{msg}")?;
                transition = Transition::Unchanged;
                continue;
            }
        };
        debug!(?intent, "review input");

        transition = match intent {
            Intent::Ignore(scope) => {
                ignored += 1;
                session.ignore(scope)
            }
            Intent::Change(scope, choice) => {
                let Some(view) = session.view() else {
                    transition = Transition::Unchanged;
                    continue;
                };
                match choice.resolve(&view) {
                    Ok(replacement) => {
                        changes += 1;
                        session.change(replacement, scope)
                    }
                    Err(msg) => {
                        writeln!(ui, "{msg}")?;
                        Transition::Unchanged
                    }
                }
            }
            Intent::Undo => {
                let undone = session.undo();
                if undone.is_unchanged() {
                    writeln!(ui, "nothing to undo")?;
                } else {
                    changes = changes.saturating_sub(1);
                }
                undone
            }
            Intent::Close => session.close(),
            Intent::Help => {
                writeln!(ui, "{HELP}")?;
                Transition::Unchanged
            }
        };
    }
}

fn render_view<W: Write>(ui: &mut W, view: &WordView) -> io::Result<()> {
    writeln!(ui)?;
    write!(
        ui,
        "{}",
        view.word.if_supports_color(Stream::Stderr, |t| t.bold())
    )?;
    if view.occurrence_count > 0 {
        write!(
            ui,
            "  (occurrence {} of {})",
            view.occurrence_cursor, view.occurrence_count
        )?;
    } else {
        write!(ui, "  (no longer in the text)")?;
    }
    if view.remaining_words > 1 {
        write!(ui, "  {} more words", view.remaining_words - 1)?;
    }
    writeln!(ui)?;

    if let Some(ref context) = view.context {
        writeln!(
            ui,
            "  {}{}{}",
            context.before.replace('\n', " "),
            context
                .word
                .if_supports_color(Stream::Stderr, |t| t.red())
                .if_supports_color(Stream::Stderr, |t| t.underline()),
            context.after.replace('\n', " "),
        )?;
    }

    if view.suggestions.is_empty() {
        writeln!(ui, "  no suggestions")?;
    } else {
        let numbered: Vec<String> = view
            .suggestions
            .iter()
            .enumerate()
            .map(|(i, s)| format!("{}) {s}", i + 1))
            .collect();
        writeln!(ui, "  {}", numbered.join("  "))?;
    }
    if view.can_undo {
        writeln!(ui, "  (u to undo)")?;
    }
    Ok(())
}

/// Check a file and review each flagged word interactively.
#[instrument(name = "cmd_review", skip_all, fields(file = %args.file))]
pub async fn cmd_review(
    args: ReviewArgs,
    global_json: bool,
    config: &Config,
    max_input_bytes: Option<usize>,
) -> anyhow::Result<()> {
    debug!(file = %args.file, "executing review command");

    let original = read_input_file(&args.file, max_input_bytes)?;
    let checker = Checker::from_args(&args, config)?;

    let mut options = config.review_options();
    if let Some(boundary) = args.boundary {
        options.scanner = Scanner::new(boundary, options.scanner.window());
    }
    let mut session = ReviewSession::with_options(options);

    let first = match session.begin_check(original.as_str()) {
        CheckStart::Settled(transition) => transition,
        CheckStart::Pending(ticket) => {
            let request = CheckRequest::new(original.as_str())
                .with_field(config.text_field())
                .with_extras(config.extra_fields.clone())
                .with_extras(args.fields.iter().cloned());

            let spinner = ProgressBar::new_spinner();
            if let Ok(style) = ProgressStyle::with_template("{spinner} {msg}") {
                spinner.set_style(style);
            }
            spinner.set_message(Notice::Checking.message());
            spinner.enable_steady_tick(Duration::from_millis(100));
            let outcome = checker.check(&request).await;
            spinner.finish_and_clear();

            if let Err(ref err) = outcome {
                tracing::warn!(error = %err, "check request failed");
            }
            session.deliver(ticket, outcome)
        }
    };

    let mut ui = io::stderr().lock();
    let summary = run_review(
        &mut session,
        first,
        &original,
        io::stdin().lock(),
        &mut ui,
    )
    .context("failed to run review")?;

    match summary.notice {
        Some(Notice::ServiceError) => bail!("{}", Notice::ServiceError.message()),
        Some(notice) => writeln!(ui, "{}", notice.if_supports_color(Stream::Stderr, |t| t.green()))?,
        None => writeln!(ui, "review closed")?,
    }
    drop(ui);

    let destination = if args.in_place {
        Some(args.file.as_path())
    } else {
        args.output.as_deref()
    };

    if global_json {
        if let Some(path) = destination {
            write_output(Some(path), &summary.text)?;
        }
        println!("{}", serde_json::to_string_pretty(&summary)?);
    } else {
        write_output(destination, &summary.text)?;
    }

    Ok(())
}
