//! Core library for spellreview.
//!
//! This crate holds the I/O-free engine behind the `spellreview` CLI: it
//! finds whole-word occurrences, rewrites them, and drives a review session
//! over the words a checking service flagged.
//!
//! # Modules
//!
//! - [`scanner`] - Whole-word occurrence search and context extraction
//! - [`replace`] - Occurrence replacement
//! - [`session`] - The review session state machine
//! - [`transport`] - Checking-service request/response contract
//! - [`html`] - HTML rendering of context
//! - [`config`] - Configuration loading and management
//! - [`error`] - Error types and result aliases
//!
//! # Quick Start
//!
//! ```
//! use spellreview_core::{CheckResult, ReviewSession, Scope};
//!
//! let body = r#"{"success":true,"errors":true,"words":{"Helo":["Hello"],"wrold":["world"]}}"#;
//! let result = spellreview_core::decode_check_result(body).unwrap();
//!
//! let mut session = ReviewSession::new();
//! session.open("Helo wrold", Ok(result));
//! session.change("Hello", Scope::ThisOccurrence);
//! session.change("world", Scope::ThisOccurrence);
//! assert!(session.is_closed());
//! # let _ = CheckResult::clean();
//! ```
#![deny(unsafe_code)]

pub mod config;
pub mod error;
pub mod html;
pub mod replace;
pub mod scanner;
pub mod session;
pub mod transport;

pub use config::{Config, ConfigLoader, ConfigSources, LogLevel};
pub use error::{ConfigError, ConfigResult, TransportError, TransportResult};
pub use html::escape_html;
pub use replace::{ReplaceMode, Replaced, apply_replacement};
pub use scanner::{
    BoundaryPolicy, ContextFragments, ContextWindow, Occurrence, Scanner, extract_context,
    locate_occurrences,
};
pub use session::{
    CheckStart, CheckTicket, Notice, ReviewOptions, ReviewSession, Scope, Transition, WordView,
};
pub use transport::{
    CheckRequest, CheckResult, CheckTransport, StaticTransport, SuggestionMap,
    decode_check_result,
};

/// Default input size limit in bytes (5 MiB).
pub const DEFAULT_MAX_INPUT_BYTES: usize = 5 * 1024 * 1024;
