//! Whole-word occurrence scanning and context extraction.
//!
//! A word flagged by the checking service is located with a literal,
//! case-sensitive scan. A candidate only counts as an occurrence when it is
//! not the prefix of a longer word, so `pre` is found in "pre example" but
//! not in "previous example". The [`BoundaryPolicy`] decides whether the
//! character before a candidate is checked as well.

use std::fmt;

use serde::{Deserialize, Serialize};

/// Characters of context kept before an occurrence.
pub const DEFAULT_CONTEXT_BEFORE: usize = 20;

/// Characters of context kept after an occurrence.
pub const DEFAULT_CONTEXT_AFTER: usize = 50;

/// Which sides of a candidate match must sit on a word boundary.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Deserialize, Serialize)]
#[serde(rename_all = "lowercase")]
#[cfg_attr(feature = "clap", derive(clap::ValueEnum))]
#[cfg_attr(feature = "schemars", derive(schemars::JsonSchema))]
pub enum BoundaryPolicy {
    /// Reject a candidate followed by a word character.
    ///
    /// The character before the candidate is not inspected, so `wrold`
    /// also matches the tail of `awrold`.
    #[default]
    Trailing,
    /// Reject a candidate followed or preceded by a word character.
    Both,
}

impl BoundaryPolicy {
    /// Returns the policy name as used in configuration files.
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::Trailing => "trailing",
            Self::Both => "both",
        }
    }

    fn accepts(self, text: &str, start: usize, end: usize) -> bool {
        if text[end..].chars().next().is_some_and(is_word_char) {
            return false;
        }
        match self {
            Self::Trailing => true,
            Self::Both => !text[..start].chars().next_back().is_some_and(is_word_char),
        }
    }
}

impl fmt::Display for BoundaryPolicy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Size of the context window around an occurrence, in characters.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Deserialize, Serialize)]
pub struct ContextWindow {
    /// Characters kept before the occurrence.
    pub before: usize,
    /// Characters kept after the occurrence.
    pub after: usize,
}

impl Default for ContextWindow {
    fn default() -> Self {
        Self {
            before: DEFAULT_CONTEXT_BEFORE,
            after: DEFAULT_CONTEXT_AFTER,
        }
    }
}

/// One accepted occurrence of a word.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct Occurrence {
    /// Position in the accepted-match sequence (1-based).
    pub ordinal: usize,
    /// Byte offset of the first character.
    pub start: usize,
    /// Byte offset one past the last character.
    pub end: usize,
}

/// Plain-text context around an occurrence.
///
/// Fragments are never escaped; see [`ContextFragments::to_html`] for
/// display markup.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ContextFragments {
    /// Text leading up to the word.
    pub before: String,
    /// The word itself, as it appears in the text.
    pub word: String,
    /// Text following the word.
    pub after: String,
}

impl fmt::Display for ContextFragments {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}{}{}", self.before, self.word, self.after)
    }
}

/// Locates true-boundary occurrences and extracts context around them.
///
/// `Scanner` is a small `Copy` value; each review session owns one.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash)]
pub struct Scanner {
    policy: BoundaryPolicy,
    window: ContextWindow,
}

impl Scanner {
    /// Create a scanner with an explicit boundary policy and context window.
    pub const fn new(policy: BoundaryPolicy, window: ContextWindow) -> Self {
        Self { policy, window }
    }

    /// Create a scanner with the given boundary policy and default window.
    pub fn with_policy(policy: BoundaryPolicy) -> Self {
        Self {
            policy,
            ..Self::default()
        }
    }

    /// The boundary policy in use.
    pub const fn policy(self) -> BoundaryPolicy {
        self.policy
    }

    /// The context window in use.
    pub const fn window(self) -> ContextWindow {
        self.window
    }

    /// Iterate over accepted occurrences of `word` in `text`, left to right.
    ///
    /// Candidates never overlap: a rejected candidate is skipped as a whole,
    /// and scanning resumes after it. An empty `word` yields nothing.
    pub fn occurrences<'a>(
        self,
        text: &'a str,
        word: &'a str,
    ) -> impl Iterator<Item = Occurrence> + 'a {
        let policy = self.policy;
        let candidates = (!word.is_empty()).then(|| text.match_indices(word));
        candidates
            .into_iter()
            .flatten()
            .map(|(start, matched)| (start, start + matched.len()))
            .filter(move |&(start, end)| policy.accepts(text, start, end))
            .enumerate()
            .map(|(idx, (start, end))| Occurrence {
                ordinal: idx + 1,
                start,
                end,
            })
    }

    /// Collect every accepted occurrence of `word` in `text`.
    #[tracing::instrument(level = "trace", skip(text), fields(text_len = text.len()))]
    pub fn locate(self, text: &str, word: &str) -> Vec<Occurrence> {
        self.occurrences(text, word).collect()
    }

    /// Count accepted occurrences of `word` in `text`.
    pub fn count(self, text: &str, word: &str) -> usize {
        self.occurrences(text, word).count()
    }

    /// The occurrence with the given 1-based ordinal, if it exists.
    pub fn nth(self, text: &str, word: &str, ordinal: usize) -> Option<Occurrence> {
        let idx = ordinal.checked_sub(1)?;
        self.occurrences(text, word).nth(idx)
    }

    /// Extract the context around the `ordinal`-th occurrence of `word`.
    ///
    /// A window cut short by its limit loses its partial outer word along
    /// with surrounding whitespace. A window that reaches the edge of the
    /// text is kept whole.
    pub fn extract_context(
        self,
        text: &str,
        word: &str,
        ordinal: usize,
    ) -> Option<ContextFragments> {
        let hit = self.nth(text, word, ordinal)?;

        let (before, before_cut) = last_chars(&text[..hit.start], self.window.before);
        let (after, after_cut) = first_chars(&text[hit.end..], self.window.after);

        let before = if before_cut {
            trim_partial_lead(before)
        } else {
            before
        };
        let after = if after_cut {
            trim_partial_tail(after)
        } else {
            after
        };

        Some(ContextFragments {
            before: before.to_string(),
            word: text[hit.start..hit.end].to_string(),
            after: after.to_string(),
        })
    }
}

/// Locate occurrences with the default trailing-boundary policy.
pub fn locate_occurrences(text: &str, word: &str) -> Vec<Occurrence> {
    Scanner::default().locate(text, word)
}

/// Extract context with the default policy and window.
pub fn extract_context(text: &str, word: &str, ordinal: usize) -> Option<ContextFragments> {
    Scanner::default().extract_context(text, word, ordinal)
}

/// ASCII word character: letter, digit, or underscore.
pub const fn is_word_char(c: char) -> bool {
    c.is_ascii_alphanumeric() || c == '_'
}

/// The last `n` characters of `s`, and whether anything was left out.
fn last_chars(s: &str, n: usize) -> (&str, bool) {
    if n == 0 {
        return ("", !s.is_empty());
    }
    match s.char_indices().rev().nth(n - 1) {
        Some((idx, _)) => (&s[idx..], idx > 0),
        None => (s, false),
    }
}

/// The first `n` characters of `s`, and whether anything was left out.
fn first_chars(s: &str, n: usize) -> (&str, bool) {
    match s.char_indices().nth(n) {
        Some((idx, _)) => (&s[..idx], true),
        None => (s, false),
    }
}

fn trim_partial_lead(s: &str) -> &str {
    s.trim_start()
        .trim_start_matches(|c: char| !c.is_whitespace())
        .trim_start()
}

fn trim_partial_tail(s: &str) -> &str {
    s.trim_end()
        .trim_end_matches(|c: char| !c.is_whitespace())
        .trim_end()
}
