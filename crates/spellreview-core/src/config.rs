//! Configuration loading.
//!
//! Settings are layered, lowest precedence first:
//!
//! 1. built-in defaults
//! 2. the user file, `config.{toml,yaml,yml,json}` in the platform config
//!    directory (`~/.config/spellreview/` on Linux)
//! 3. project files from the nearest directory, at or above the working
//!    directory, that has any; the search stops at a repository root
//! 4. files passed explicitly (`--config`)
//! 5. `SPELLREVIEW_*` environment variables
//!
//! Project files are named `spellcheck` or `spellreview`, optionally with a
//! leading dot. Within one directory they merge in the order
//! `.spellcheck`, `spellcheck`, `.spellreview`, `spellreview`, each by
//! extension `toml`, `yaml`, `yml`, `json`; later files win.
//!
//! ```no_run
//! use spellreview_core::config::ConfigLoader;
//!
//! let (config, sources) = ConfigLoader::new()
//!     .with_project_search("/path/to/project")
//!     .load()?;
//! println!("endpoint: {:?} from {:?}", config.endpoint, sources.primary_file());
//! # Ok::<(), spellreview_core::ConfigError>(())
//! ```

use std::collections::BTreeMap;

use camino::{Utf8Path, Utf8PathBuf};
use figment::Figment;
use figment::providers::{Env, Format, Json, Serialized, Toml, Yaml};
use serde::{Deserialize, Serialize};

use crate::error::{ConfigError, ConfigResult};
use crate::scanner::{BoundaryPolicy, ContextWindow, Scanner};
use crate::session::{DEFAULT_MIN_TEXT_CHARS, ReviewOptions};
use crate::transport::DEFAULT_TEXT_FIELD;

/// The configuration for spellreview.
#[derive(Debug, Clone, Default, Deserialize, Serialize, PartialEq, Eq)]
#[serde(default)]
pub struct Config {
    /// Log level for the application (e.g., "debug", "info", "warn", "error").
    pub log_level: LogLevel,
    /// Directory for rolling log files. Logs go to stderr when unset.
    pub log_dir: Option<Utf8PathBuf>,
    /// URL of the checking service.
    pub endpoint: Option<String>,
    /// Form field that carries the text (default: `text`).
    pub text_field: Option<String>,
    /// Extra form fields sent with every check request.
    pub extra_fields: BTreeMap<String, String>,
    /// Which side of a match must sit on a word boundary.
    pub boundary: BoundaryPolicy,
    /// Characters of context shown before a word (default: 20).
    pub context_before: Option<usize>,
    /// Characters of context shown after a word (default: 50).
    pub context_after: Option<usize>,
    /// Texts shorter than this are reported clean without a request (default: 2).
    pub min_text_chars: Option<usize>,
    /// Timeout for a single check request, in seconds.
    pub request_timeout_secs: Option<u64>,
    /// Maximum input size in bytes (default: 5 MiB).
    ///
    /// Applies to the CLI and the MCP server. Use `disable_input_limit` to
    /// remove the limit entirely.
    pub max_input_bytes: Option<usize>,
    /// Disable the input size limit entirely.
    pub disable_input_limit: bool,
}

impl Config {
    /// Form field name for the text, falling back to the default.
    pub fn text_field(&self) -> &str {
        self.text_field.as_deref().unwrap_or(DEFAULT_TEXT_FIELD)
    }

    /// The scanner described by `boundary` and the context settings.
    pub fn scanner(&self) -> Scanner {
        let defaults = ContextWindow::default();
        Scanner::new(
            self.boundary,
            ContextWindow {
                before: self.context_before.unwrap_or(defaults.before),
                after: self.context_after.unwrap_or(defaults.after),
            },
        )
    }

    /// Session options derived from this configuration.
    pub fn review_options(&self) -> ReviewOptions {
        ReviewOptions {
            scanner: self.scanner(),
            min_text_chars: self.min_text_chars.unwrap_or(DEFAULT_MIN_TEXT_CHARS),
        }
    }

    /// Effective input size limit, `None` when disabled.
    pub fn input_limit(&self) -> Option<usize> {
        if self.disable_input_limit {
            None
        } else {
            Some(
                self.max_input_bytes
                    .unwrap_or(crate::DEFAULT_MAX_INPUT_BYTES),
            )
        }
    }
}

/// Log level configuration.
#[derive(Debug, Clone, Default, Deserialize, Serialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum LogLevel {
    /// Verbose output for debugging and development.
    Debug,
    /// Standard operational information (default).
    #[default]
    Info,
    /// Warnings about potential issues.
    Warn,
    /// Errors that indicate failures.
    Error,
}

impl LogLevel {
    /// Returns the log level as a lowercase string slice.
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::Debug => "debug",
            Self::Info => "info",
            Self::Warn => "warn",
            Self::Error => "error",
        }
    }
}

/// Metadata about which configuration sources were loaded.
///
/// Returned alongside [`Config`] from [`ConfigLoader::load()`] so commands
/// can report the actual config files without re-discovering them.
#[derive(Debug, Clone, Default, Serialize)]
pub struct ConfigSources {
    /// Project config files found by walking up, ordered low→high precedence.
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub project_files: Vec<Utf8PathBuf>,
    /// User config file from XDG config directory.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub user_file: Option<Utf8PathBuf>,
    /// Explicit config files loaded (e.g., from `--config` flag).
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub explicit_files: Vec<Utf8PathBuf>,
}

impl ConfigSources {
    /// Returns the highest-precedence config file that was loaded.
    ///
    /// Precedence: explicit files > project files > user file.
    pub fn primary_file(&self) -> Option<&Utf8Path> {
        self.explicit_files
            .last()
            .map(Utf8PathBuf::as_path)
            .or_else(|| self.project_files.last().map(Utf8PathBuf::as_path))
            .or(self.user_file.as_deref())
    }
}

/// Extensions tried for every config file name, in merge order.
const CONFIG_EXTENSIONS: &[&str] = &["toml", "yaml", "yml", "json"];

/// Project file stems, in merge order.
const PROJECT_NAMES: &[&str] = &["spellcheck", "spellreview"];

/// A directory containing this entry is a repository root.
const REPOSITORY_MARKER: &str = ".git";

const APP_NAME: &str = "spellreview";

const ENV_PREFIX: &str = "SPELLREVIEW_";

/// Builder for [`Config`]: collects sources, then merges them in [`load`](Self::load).
#[derive(Debug)]
pub struct ConfigLoader {
    search_from: Option<Utf8PathBuf>,
    user_config: bool,
    explicit_files: Vec<Utf8PathBuf>,
}

impl Default for ConfigLoader {
    fn default() -> Self {
        Self::new()
    }
}

impl ConfigLoader {
    /// A loader that reads the user config and the environment.
    pub const fn new() -> Self {
        Self {
            search_from: None,
            user_config: true,
            explicit_files: Vec::new(),
        }
    }

    /// Look for project files starting at `dir`.
    pub fn with_project_search(mut self, dir: impl AsRef<Utf8Path>) -> Self {
        self.search_from = Some(dir.as_ref().to_path_buf());
        self
    }

    /// Include or skip the user config file.
    pub const fn with_user_config(mut self, include: bool) -> Self {
        self.user_config = include;
        self
    }

    /// Merge `path` after every discovered file.
    pub fn with_file(mut self, path: impl AsRef<Utf8Path>) -> Self {
        self.explicit_files.push(path.as_ref().to_path_buf());
        self
    }

    /// Merge every source and extract the result.
    #[tracing::instrument(skip(self), fields(search_from = ?self.search_from))]
    pub fn load(self) -> ConfigResult<(Config, ConfigSources)> {
        let sources = ConfigSources {
            project_files: self
                .search_from
                .as_deref()
                .map(discover_project_files)
                .unwrap_or_default(),
            user_file: if self.user_config {
                find_user_file()
            } else {
                None
            },
            explicit_files: self.explicit_files,
        };

        let files = sources
            .user_file
            .iter()
            .chain(&sources.project_files)
            .chain(&sources.explicit_files);
        let figment = files
            .fold(
                Figment::from(Serialized::defaults(Config::default())),
                |figment, path| {
                    tracing::debug!(%path, "merging config file");
                    merge_file(figment, path)
                },
            )
            .merge(Env::prefixed(ENV_PREFIX).lowercase(true));

        let config: Config = figment
            .extract()
            .map_err(|e| ConfigError::Deserialize(Box::new(e)))?;
        tracing::info!(
            boundary = config.boundary.as_str(),
            endpoint = config.endpoint.as_deref(),
            file = sources.primary_file().map(Utf8Path::as_str),
            "configuration loaded"
        );
        Ok((config, sources))
    }
}

/// Candidate project files in `dir`, in merge order.
fn project_candidates(dir: &Utf8Path) -> impl Iterator<Item = Utf8PathBuf> + '_ {
    PROJECT_NAMES
        .iter()
        .flat_map(|name| [format!(".{name}"), (*name).to_string()])
        .flat_map(move |stem| {
            CONFIG_EXTENSIONS
                .iter()
                .map(move |ext| dir.join(format!("{stem}.{ext}")))
        })
}

/// Project files from the nearest directory that has any.
fn discover_project_files(start: &Utf8Path) -> Vec<Utf8PathBuf> {
    for dir in start.ancestors() {
        let found: Vec<Utf8PathBuf> = project_candidates(dir).filter(|p| p.is_file()).collect();
        if !found.is_empty() {
            return found;
        }
        if dir.join(REPOSITORY_MARKER).exists() {
            tracing::trace!(%dir, "repository root reached without project config");
            break;
        }
    }
    Vec::new()
}

fn find_user_file() -> Option<Utf8PathBuf> {
    let dir = user_config_dir()?;
    CONFIG_EXTENSIONS
        .iter()
        .map(|ext| dir.join(format!("config.{ext}")))
        .find(|path| path.is_file())
}

fn merge_file(figment: Figment, path: &Utf8Path) -> Figment {
    match path.extension() {
        Some("yaml" | "yml") => figment.merge(Yaml::file_exact(path)),
        Some("json") => figment.merge(Json::file_exact(path)),
        _ => figment.merge(Toml::file_exact(path)),
    }
}

/// The platform config directory for spellreview, if a home directory is known.
pub fn user_config_dir() -> Option<Utf8PathBuf> {
    let dirs = directories::ProjectDirs::from("", "", APP_NAME)?;
    Utf8PathBuf::from_path_buf(dirs.config_dir().to_path_buf()).ok()
}
