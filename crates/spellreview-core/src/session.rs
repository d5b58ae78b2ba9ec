//! The review session state machine.
//!
//! A [`ReviewSession`] walks the user through every misspelled word reported
//! by the checking service, one occurrence at a time. It performs no I/O:
//! [`ReviewSession::begin_check`] hands out a [`CheckTicket`], the caller
//! runs the transport, and [`ReviewSession::deliver`] applies the outcome.
//!
//! ```
//! use spellreview_core::session::{ReviewSession, Scope, Transition};
//! use spellreview_core::transport::{CheckResult, SuggestionMap};
//!
//! let words: SuggestionMap = [("Helo", vec!["Hello"])].into_iter().collect();
//! let mut session = ReviewSession::new();
//! session.open("Helo there", Ok(CheckResult::flagged(words)));
//! assert_eq!(session.current_word(), Some("Helo"));
//!
//! let done = session.change("Hello", Scope::ThisOccurrence);
//! assert_eq!(done, Transition::Complete { text: "Hello there".into() });
//! ```

use std::collections::VecDeque;
use std::fmt;
use std::mem;

use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::error::TransportResult;
use crate::replace::ReplaceMode;
use crate::scanner::{ContextFragments, Scanner};
use crate::transport::{CheckResult, SuggestionMap};

/// Inputs shorter than this many characters are never sent for checking.
pub const DEFAULT_MIN_TEXT_CHARS: usize = 2;

/// How far an ignore or change reaches.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Deserialize, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Scope {
    /// The occurrence under the cursor.
    ThisOccurrence,
    /// Every occurrence of the current word.
    AllOccurrences,
}

impl Scope {
    /// The replacement mode a change with this scope uses.
    pub const fn replace_mode(self) -> ReplaceMode {
        match self {
            Self::ThisOccurrence => ReplaceMode::Single,
            Self::AllOccurrences => ReplaceMode::All,
        }
    }
}

/// User-facing status notices.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Deserialize, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Notice {
    /// A check is in flight.
    Checking,
    /// The checking service failed or could not be reached.
    ServiceError,
    /// The text has no misspellings.
    NoErrors,
    /// Every flagged word has been resolved.
    ReviewComplete,
}

impl Notice {
    /// The message shown to the user.
    pub const fn message(self) -> &'static str {
        match self {
            Self::Checking => "Checking...",
            Self::ServiceError => {
                "We have experienced an error and cannot complete the spell check."
            }
            Self::NoErrors => "Spell check completed. No errors found.",
            Self::ReviewComplete => "Spell check completed",
        }
    }
}

impl fmt::Display for Notice {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.message())
    }
}

/// Everything a presentation layer needs to draw the word under review.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct WordView {
    /// The word under review.
    pub word: String,
    /// Suggestions in service order; the first is the default choice.
    pub suggestions: Vec<String>,
    /// Context around the current occurrence, absent when the word no
    /// longer occurs in the text.
    pub context: Option<ContextFragments>,
    /// Accepted occurrences of the word in the current text.
    pub occurrence_count: usize,
    /// 1-based index of the occurrence shown.
    pub occurrence_cursor: usize,
    /// Whether [`ReviewSession::undo`] would do anything.
    pub can_undo: bool,
    /// Words still queued, this one included.
    pub remaining_words: usize,
}

/// What a session operation did.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Transition {
    /// The operation was not valid in the current state.
    Unchanged,
    /// A status notice; the session is `Checking` or `Closed` afterwards.
    Notice(Notice),
    /// The session is open on a word.
    Review(WordView),
    /// The last word was resolved and the session closed.
    Complete {
        /// The final text.
        text: String,
    },
    /// The session was closed by the user.
    Closed {
        /// The working text, when closed during a review.
        text: Option<String>,
    },
}

impl Transition {
    /// The notice this transition carries, if any.
    pub const fn notice(&self) -> Option<Notice> {
        match self {
            Self::Notice(notice) => Some(*notice),
            Self::Complete { .. } => Some(Notice::ReviewComplete),
            _ => None,
        }
    }

    /// Returns `true` for a guarded no-op.
    pub const fn is_unchanged(&self) -> bool {
        matches!(self, Self::Unchanged)
    }

    /// The word view, for [`Transition::Review`].
    pub const fn view(&self) -> Option<&WordView> {
        match self {
            Self::Review(view) => Some(view),
            _ => None,
        }
    }
}

/// Identifies one in-flight check.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct CheckTicket(Uuid);

impl CheckTicket {
    fn new() -> Self {
        Self(Uuid::new_v4())
    }

    /// The underlying identifier.
    pub const fn as_uuid(&self) -> &Uuid {
        &self.0
    }
}

impl fmt::Display for CheckTicket {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.0.fmt(f)
    }
}

/// Result of [`ReviewSession::begin_check`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CheckStart {
    /// The transport should be called; pass the ticket back to `deliver`.
    Pending(CheckTicket),
    /// No check is needed; the transition is final.
    Settled(Transition),
}

impl CheckStart {
    /// The ticket, if a check is pending.
    pub const fn ticket(&self) -> Option<CheckTicket> {
        match self {
            Self::Pending(ticket) => Some(*ticket),
            Self::Settled(_) => None,
        }
    }

    /// The transition to present now.
    pub fn into_transition(self) -> Transition {
        match self {
            Self::Pending(_) => Transition::Notice(Notice::Checking),
            Self::Settled(transition) => transition,
        }
    }
}

/// Tunables for a review session.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ReviewOptions {
    /// Occurrence matching and context extraction.
    pub scanner: Scanner,
    /// Shorter inputs short-circuit to [`Notice::NoErrors`].
    pub min_text_chars: usize,
}

impl Default for ReviewOptions {
    fn default() -> Self {
        Self {
            scanner: Scanner::default(),
            min_text_chars: DEFAULT_MIN_TEXT_CHARS,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
struct UndoSnapshot {
    text: String,
    word: String,
    occurrence_count: usize,
    occurrence_cursor: usize,
}

#[derive(Debug, Clone, PartialEq, Eq)]
struct Review {
    text: String,
    suggestions: SuggestionMap,
    pending: VecDeque<String>,
    occurrence_count: usize,
    occurrence_cursor: usize,
    undo: Option<UndoSnapshot>,
}

impl Review {
    fn current_word(&self) -> Option<&str> {
        self.pending.front().map(String::as_str)
    }

    /// Ignoring or changing the occurrence under the cursor finishes the word.
    const fn resolves_word(&self, scope: Scope) -> bool {
        matches!(scope, Scope::AllOccurrences)
            || self.occurrence_count <= 1
            || self.occurrence_cursor >= self.occurrence_count
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
enum State {
    #[default]
    Closed,
    Checking {
        ticket: CheckTicket,
        text: String,
    },
    Open(Review),
}

/// Interactive review of one text.
///
/// Lifecycle: `Closed` → `Checking` → `Open` → `Closed`. Operations that do
/// not apply to the current state return [`Transition::Unchanged`].
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ReviewSession {
    options: ReviewOptions,
    state: State,
}

impl ReviewSession {
    /// A closed session with default options.
    pub fn new() -> Self {
        Self::default()
    }

    /// A closed session with the given options.
    pub fn with_options(options: ReviewOptions) -> Self {
        Self {
            options,
            state: State::Closed,
        }
    }

    /// The options this session was built with.
    pub const fn options(&self) -> &ReviewOptions {
        &self.options
    }

    /// Start a check of `text`.
    ///
    /// Only valid while closed. Trivially short text settles immediately
    /// with [`Notice::NoErrors`].
    pub fn begin_check(&mut self, text: impl Into<String>) -> CheckStart {
        if !self.is_closed() {
            tracing::debug!("begin_check ignored: session already active");
            return CheckStart::Settled(Transition::Unchanged);
        }

        let text = text.into();
        if text.chars().count() < self.options.min_text_chars {
            tracing::debug!(
                text_len = text.len(),
                "text below minimum length, skipping check"
            );
            return CheckStart::Settled(Transition::Notice(Notice::NoErrors));
        }

        let ticket = CheckTicket::new();
        tracing::debug!(%ticket, text_len = text.len(), "check started");
        self.state = State::Checking { ticket, text };
        CheckStart::Pending(ticket)
    }

    /// Apply the transport outcome for `ticket`.
    ///
    /// Outcomes for any ticket other than the one currently in flight are
    /// dropped.
    pub fn deliver(
        &mut self,
        ticket: CheckTicket,
        outcome: TransportResult<CheckResult>,
    ) -> Transition {
        let text = match mem::take(&mut self.state) {
            State::Checking {
                ticket: current,
                text,
            } if current == ticket => text,
            other => {
                tracing::debug!(%ticket, "discarding stale check result");
                self.state = other;
                return Transition::Unchanged;
            }
        };

        let result = match outcome {
            Ok(result) if result.success => result,
            Ok(_) => {
                tracing::warn!(%ticket, "checking service reported failure");
                return Transition::Notice(Notice::ServiceError);
            }
            Err(err) => {
                tracing::warn!(%ticket, error = %err, "check failed");
                return Transition::Notice(Notice::ServiceError);
            }
        };

        if !result.has_errors {
            tracing::info!(%ticket, "no misspellings found");
            return Transition::Notice(Notice::NoErrors);
        }

        let pending: VecDeque<String> = result.words.words().map(str::to_string).collect();
        tracing::info!(%ticket, words = pending.len(), "review opened");
        self.state = State::Open(Review {
            text,
            suggestions: result.words,
            pending,
            occurrence_count: 0,
            occurrence_cursor: 1,
            undo: None,
        });
        self.advance()
    }

    /// [`begin_check`](Self::begin_check) and [`deliver`](Self::deliver)
    /// with an outcome already in hand.
    pub fn open(
        &mut self,
        text: impl Into<String>,
        outcome: TransportResult<CheckResult>,
    ) -> Transition {
        match self.begin_check(text) {
            CheckStart::Pending(ticket) => self.deliver(ticket, outcome),
            CheckStart::Settled(transition) => transition,
        }
    }

    /// Ignore the current occurrence, or every occurrence of the word.
    pub fn ignore(&mut self, scope: Scope) -> Transition {
        let State::Open(review) = &mut self.state else {
            return Transition::Unchanged;
        };
        review.undo = None;

        if review.resolves_word(scope) {
            let word = review.pending.pop_front();
            tracing::debug!(word = word.as_deref(), ?scope, "word ignored");
            return self.advance();
        }

        review.occurrence_cursor += 1;
        tracing::debug!(
            word = review.current_word(),
            cursor = review.occurrence_cursor,
            count = review.occurrence_count,
            "occurrence ignored"
        );
        self.current_view()
    }

    /// Replace the current occurrence, or every occurrence, with
    /// `replacement`.
    ///
    /// The previous text is kept for a single [`undo`](Self::undo).
    pub fn change(&mut self, replacement: &str, scope: Scope) -> Transition {
        let scanner = self.options.scanner;
        let State::Open(review) = &mut self.state else {
            return Transition::Unchanged;
        };
        let Some(word) = review.current_word().map(str::to_string) else {
            return Transition::Unchanged;
        };

        let replaced = scanner.replace(
            &review.text,
            &word,
            replacement,
            scope.replace_mode(),
            review.occurrence_cursor,
        );
        let resolves = review.resolves_word(scope);
        let previous = mem::replace(&mut review.text, replaced.text);
        review.undo = Some(UndoSnapshot {
            text: previous,
            word: word.clone(),
            occurrence_count: review.occurrence_count,
            occurrence_cursor: review.occurrence_cursor,
        });
        tracing::debug!(
            word = %word,
            replaced = replaced.replaced,
            ?scope,
            "text changed"
        );

        if !resolves {
            let resume_at = replaced.last_end.unwrap_or(0);
            let mut count = 0;
            let mut passed = 0;
            for hit in scanner.occurrences(&review.text, &word) {
                count += 1;
                if hit.start < resume_at {
                    passed += 1;
                }
            }
            let cursor = passed + 1;
            if cursor <= count {
                review.occurrence_count = count;
                review.occurrence_cursor = cursor;
                return self.current_view();
            }
        }

        review.pending.pop_front();
        self.advance()
    }

    /// Revert the most recent change.
    ///
    /// Only the last change can be undone, and only until the next ignore.
    pub fn undo(&mut self) -> Transition {
        let State::Open(review) = &mut self.state else {
            return Transition::Unchanged;
        };
        let Some(snapshot) = review.undo.take() else {
            return Transition::Unchanged;
        };

        review.text = snapshot.text;
        review.pending.retain(|w| *w != snapshot.word);
        review.pending.push_front(snapshot.word);
        review.occurrence_count = snapshot.occurrence_count;
        review.occurrence_cursor = snapshot.occurrence_cursor;
        tracing::debug!(
            word = review.current_word(),
            cursor = review.occurrence_cursor,
            "change undone"
        );
        self.current_view()
    }

    /// Close the session, discarding all review state.
    ///
    /// Any check in flight is forgotten; its result will be ignored.
    pub fn close(&mut self) -> Transition {
        match mem::take(&mut self.state) {
            State::Closed => Transition::Unchanged,
            State::Checking { ticket, .. } => {
                tracing::debug!(%ticket, "check abandoned");
                Transition::Closed { text: None }
            }
            State::Open(review) => {
                tracing::info!(remaining = review.pending.len(), "review closed");
                Transition::Closed {
                    text: Some(review.text),
                }
            }
        }
    }

    /// Returns `true` while a review is open.
    pub const fn is_open(&self) -> bool {
        matches!(self.state, State::Open(_))
    }

    /// Returns `true` while a check is in flight.
    pub const fn is_checking(&self) -> bool {
        matches!(self.state, State::Checking { .. })
    }

    /// Returns `true` when no check or review is active.
    pub const fn is_closed(&self) -> bool {
        matches!(self.state, State::Closed)
    }

    /// The working text, while checking or reviewing.
    pub fn text(&self) -> Option<&str> {
        match &self.state {
            State::Closed => None,
            State::Checking { text, .. } => Some(text),
            State::Open(review) => Some(&review.text),
        }
    }

    /// The word under review.
    pub fn current_word(&self) -> Option<&str> {
        self.review().and_then(Review::current_word)
    }

    /// Queued words, the current word first.
    pub fn pending_words(&self) -> Vec<&str> {
        self.review()
            .map(|r| r.pending.iter().map(String::as_str).collect())
            .unwrap_or_default()
    }

    /// Occurrences of the current word; zero when not reviewing.
    pub fn occurrence_count(&self) -> usize {
        self.review().map_or(0, |r| r.occurrence_count)
    }

    /// 1-based occurrence shown; zero when not reviewing.
    pub fn occurrence_cursor(&self) -> usize {
        self.review().map_or(0, |r| r.occurrence_cursor)
    }

    /// Whether a change can be undone.
    pub fn can_undo(&self) -> bool {
        self.review().is_some_and(|r| r.undo.is_some())
    }

    /// Suggestions for the current word.
    pub fn suggestions(&self) -> &[String] {
        self.review()
            .and_then(|r| r.current_word().and_then(|w| r.suggestions.get(w)))
            .unwrap_or_default()
    }

    /// Context around the current occurrence.
    pub fn context(&self) -> Option<ContextFragments> {
        let review = self.review()?;
        let word = review.current_word()?;
        self.options
            .scanner
            .extract_context(&review.text, word, review.occurrence_cursor)
    }

    /// A snapshot of the word under review.
    pub fn view(&self) -> Option<WordView> {
        let review = self.review()?;
        let word = review.current_word()?;
        Some(WordView {
            word: word.to_string(),
            suggestions: self.suggestions().to_vec(),
            context: self.context(),
            occurrence_count: review.occurrence_count,
            occurrence_cursor: review.occurrence_cursor,
            can_undo: review.undo.is_some(),
            remaining_words: review.pending.len(),
        })
    }

    const fn review(&self) -> Option<&Review> {
        match &self.state {
            State::Open(review) => Some(review),
            _ => None,
        }
    }

    fn advance(&mut self) -> Transition {
        let scanner = self.options.scanner;
        let State::Open(review) = &mut self.state else {
            return Transition::Unchanged;
        };

        let Some(word) = review.pending.front() else {
            let State::Open(review) = mem::take(&mut self.state) else {
                return Transition::Unchanged;
            };
            tracing::info!("review complete");
            return Transition::Complete { text: review.text };
        };

        review.occurrence_count = scanner.count(&review.text, word);
        review.occurrence_cursor = 1;
        tracing::debug!(
            word = %word,
            count = review.occurrence_count,
            "reviewing word"
        );
        self.current_view()
    }

    fn current_view(&self) -> Transition {
        self.view().map_or(Transition::Unchanged, Transition::Review)
    }
}
