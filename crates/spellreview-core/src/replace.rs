//! Occurrence replacement.
//!
//! Replacement walks the same accepted-match sequence as the
//! [`Scanner`](crate::scanner::Scanner), so an occurrence number shown to
//! the user always names the span that gets rewritten.

use serde::{Deserialize, Serialize};

use crate::scanner::Scanner;

/// Which occurrences a replacement rewrites.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Deserialize, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum ReplaceMode {
    /// Only the occurrence whose ordinal equals the target.
    Single,
    /// Every accepted occurrence; the target is ignored.
    All,
}

/// Outcome of a replacement pass.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Replaced {
    /// The rewritten text.
    pub text: String,
    /// Number of occurrences rewritten.
    pub replaced: usize,
    /// Byte offset in `text` just past the last inserted replacement.
    pub last_end: Option<usize>,
}

impl Scanner {
    /// Replace the selected occurrence(s) of `word` with `replacement`.
    ///
    /// `target` is the 1-based ordinal used by [`ReplaceMode::Single`].
    /// The input is left untouched; unselected occurrences and rejected
    /// candidates are copied through verbatim.
    #[tracing::instrument(level = "trace", skip(text), fields(text_len = text.len()))]
    pub fn replace(
        self,
        text: &str,
        word: &str,
        replacement: &str,
        mode: ReplaceMode,
        target: usize,
    ) -> Replaced {
        let mut out = String::with_capacity(text.len());
        let mut copied_to = 0;
        let mut replaced = 0;
        let mut last_end = None;

        for hit in self.occurrences(text, word) {
            if mode == ReplaceMode::Single && hit.ordinal != target {
                continue;
            }
            out.push_str(&text[copied_to..hit.start]);
            out.push_str(replacement);
            copied_to = hit.end;
            replaced += 1;
            last_end = Some(out.len());
            if mode == ReplaceMode::Single {
                break;
            }
        }
        out.push_str(&text[copied_to..]);

        Replaced {
            text: out,
            replaced,
            last_end,
        }
    }
}

/// Replace occurrences of `word` using the default boundary policy.
pub fn apply_replacement(
    text: &str,
    word: &str,
    replacement: &str,
    mode: ReplaceMode,
    target: usize,
) -> String {
    Scanner::default()
        .replace(text, word, replacement, mode, target)
        .text
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::scanner::BoundaryPolicy;

    #[test]
    fn single_replaces_only_target() {
        let out = apply_replacement("cat cat cat", "cat", "dog", ReplaceMode::Single, 2);
        assert_eq!(out, "cat dog cat");
    }

    #[test]
    fn all_replaces_every_occurrence() {
        let out = apply_replacement("cat cat cat", "cat", "dog", ReplaceMode::All, 2);
        assert_eq!(out, "dog dog dog");
    }

    #[test]
    fn rejected_candidates_pass_through() {
        let out = apply_replacement(
            "cat catalog cat cats",
            "cat",
            "dog",
            ReplaceMode::All,
            1,
        );
        assert_eq!(out, "dog catalog dog cats");
    }

    #[test]
    fn ordinal_skips_rejected_candidates() {
        let out = apply_replacement("catalog cat cat", "cat", "dog", ReplaceMode::Single, 2);
        assert_eq!(out, "catalog cat dog");
    }

    #[test]
    fn missing_target_leaves_text_unchanged() {
        let replaced =
            Scanner::default().replace("cat cat", "cat", "dog", ReplaceMode::Single, 5);
        assert_eq!(replaced.text, "cat cat");
        assert_eq!(replaced.replaced, 0);
        assert!(replaced.last_end.is_none());
    }

    #[test]
    fn reports_span_of_last_replacement() {
        let replaced = Scanner::default().replace(
            "teh cat teh",
            "teh",
            "the",
            ReplaceMode::All,
            1,
        );
        assert_eq!(replaced.text, "the cat the");
        assert_eq!(replaced.replaced, 2);
        assert_eq!(replaced.last_end, Some(11));
    }

    #[test]
    fn replacement_may_change_length() {
        let replaced = Scanner::default().replace(
            "a teh b teh c",
            "teh",
            "there",
            ReplaceMode::Single,
            1,
        );
        assert_eq!(replaced.text, "a there b teh c");
        assert_eq!(replaced.last_end, Some(7));
    }

    #[test]
    fn empty_replacement_deletes_word() {
        let out = apply_replacement("the the cat", "the", "", ReplaceMode::Single, 2);
        assert_eq!(out, "the  cat");
    }

    #[test]
    fn both_policy_leaves_word_tails_alone() {
        let scanner = Scanner::with_policy(BoundaryPolicy::Both);
        let replaced = scanner.replace("awrold wrold", "wrold", "world", ReplaceMode::All, 1);
        assert_eq!(replaced.text, "awrold world");
    }

    #[test]
    fn multibyte_text_is_preserved() {
        let out = apply_replacement("café teh naïve", "teh", "the", ReplaceMode::All, 1);
        assert_eq!(out, "café the naïve");
    }
}
