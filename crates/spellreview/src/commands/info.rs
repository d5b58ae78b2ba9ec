//! Info command implementation

use clap::Args;
use owo_colors::{OwoColorize, Stream};
use serde::Serialize;
use spellreview_core::config::{Config, ConfigSources};
use tracing::{debug, instrument};

/// Arguments for the `info` subcommand.
#[derive(Args, Debug, Default)]
pub struct InfoArgs {
    // No subcommand-specific arguments; uses global --json flag
}

#[derive(Serialize)]
struct PackageInfo {
    name: &'static str,
    version: &'static str,
    #[serde(skip_serializing_if = "str::is_empty")]
    description: &'static str,
    #[serde(skip_serializing_if = "str::is_empty")]
    repository: &'static str,
    #[serde(skip_serializing_if = "str::is_empty")]
    homepage: &'static str,
    #[serde(skip_serializing_if = "str::is_empty")]
    license: &'static str,
}

impl PackageInfo {
    const fn new() -> Self {
        Self {
            name: env!("CARGO_PKG_NAME"),
            version: env!("CARGO_PKG_VERSION"),
            description: env!("CARGO_PKG_DESCRIPTION"),
            repository: env!("CARGO_PKG_REPOSITORY"),
            homepage: env!("CARGO_PKG_HOMEPAGE"),
            license: env!("CARGO_PKG_LICENSE"),
        }
    }
}

#[derive(Serialize)]
struct ConfigInfo {
    #[serde(skip_serializing_if = "Option::is_none")]
    config_file: Option<String>,
    log_level: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    log_dir: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    endpoint: Option<String>,
    text_field: String,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    extra_fields: Vec<String>,
    boundary: &'static str,
    context_before: usize,
    context_after: usize,
    min_text_chars: usize,
    #[serde(skip_serializing_if = "Option::is_none")]
    request_timeout_secs: Option<u64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    max_input_bytes: Option<usize>,
}

impl ConfigInfo {
    fn from_config(config: &Config, sources: &ConfigSources) -> Self {
        let options = config.review_options();
        let window = options.scanner.window();
        Self {
            config_file: sources.primary_file().map(|p| p.to_string()),
            log_level: config.log_level.as_str().to_string(),
            log_dir: config.log_dir.as_ref().map(|p| p.to_string()),
            endpoint: config.endpoint.clone(),
            text_field: config.text_field().to_string(),
            extra_fields: config.extra_fields.keys().cloned().collect(),
            boundary: options.scanner.policy().as_str(),
            context_before: window.before,
            context_after: window.after,
            min_text_chars: options.min_text_chars,
            request_timeout_secs: config.request_timeout_secs,
            max_input_bytes: config.input_limit(),
        }
    }
}

#[derive(Serialize)]
struct FullInfo {
    #[serde(flatten)]
    package: PackageInfo,
    config: ConfigInfo,
}

/// Print package information
///
/// # Arguments
/// * `global_json` - Global `--json` flag from CLI
/// * `config` - Loaded configuration
/// * `sources` - Config source metadata from loading
#[instrument(name = "cmd_info", skip_all, fields(json_output))]
pub fn cmd_info(
    _args: InfoArgs,
    global_json: bool,
    config: &Config,
    sources: &ConfigSources,
) -> anyhow::Result<()> {
    let info = PackageInfo::new();

    debug!(json_output = global_json, "executing info command");

    let full_info = FullInfo {
        package: info,
        config: ConfigInfo::from_config(config, sources),
    };

    if global_json {
        println!("{}", serde_json::to_string_pretty(&full_info)?);
        return Ok(());
    }

    let package = &full_info.package;
    println!(
        "{} {}",
        package.name.if_supports_color(Stream::Stdout, |t| t.bold()),
        package.version.if_supports_color(Stream::Stdout, |t| t.green())
    );
    if !package.description.is_empty() {
        println!("{}", package.description);
    }
    if !package.license.is_empty() {
        println!("{}: {}", label("License"), package.license);
    }
    if !package.repository.is_empty() {
        println!(
            "{}: {}",
            label("Repository"),
            package.repository.if_supports_color(Stream::Stdout, |t| t.cyan())
        );
    }

    let config = &full_info.config;
    heading("Configuration");
    print_opt("Config file", config.config_file.as_deref());
    println!("{}: {}", label("Log level"), config.log_level);
    if let Some(ref dir) = config.log_dir {
        println!("{}: {}", label("Log directory"), dir);
    }

    heading("Checking Service");
    print_opt("Endpoint", config.endpoint.as_deref());
    println!("{}: {}", label("Text field"), config.text_field);
    if !config.extra_fields.is_empty() {
        println!("{}: {}", label("Extra fields"), config.extra_fields.join(", "));
    }
    print_opt("Timeout (s)", config.request_timeout_secs);

    heading("Review");
    println!("{}: {}", label("Boundary"), config.boundary);
    println!(
        "{}: {} before, {} after",
        label("Context"),
        config.context_before,
        config.context_after
    );
    println!("{}: {}", label("Min text chars"), config.min_text_chars);
    print_opt("Input limit (bytes)", config.max_input_bytes);

    Ok(())
}

fn heading(text: &str) {
    println!();
    println!(
        "{}",
        text.if_supports_color(Stream::Stdout, |t| t.bold())
            .if_supports_color(Stream::Stdout, |t| t.underline())
    );
}

fn label(text: &str) -> String {
    text.if_supports_color(Stream::Stdout, |t| t.dimmed())
        .to_string()
}

/// Print an optional value or "(not set)".
fn print_opt<T: std::fmt::Display>(name: &str, value: Option<T>) {
    match value {
        Some(v) => println!("{}: {}", label(name), v),
        None => println!("{}: {}", label(name), label("(not set)")),
    }
}
