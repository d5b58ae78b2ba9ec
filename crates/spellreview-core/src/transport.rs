//! Checking-service contract: request shape, result decoding, transports.
//!
//! The review engine never performs I/O. A [`CheckTransport`] turns a
//! [`CheckRequest`] into a [`CheckResult`] (or a [`TransportError`]) and the
//! caller hands that outcome to
//! [`ReviewSession::deliver`](crate::session::ReviewSession::deliver).
//!
//! # Wire format
//!
//! ```json
//! { "success": true, "errors": true, "words": { "Helo": ["Hello", "Help"] } }
//! ```
//!
//! Word order in `words` is preserved; it is the order of review.

use std::collections::BTreeMap;
use std::fmt;
use std::future::Future;

use indexmap::IndexMap;
use serde::de::{self, IgnoredAny, MapAccess, SeqAccess, Visitor};
use serde::ser::SerializeMap;
use serde::{Deserialize, Deserializer, Serialize, Serializer};

use crate::error::{TransportError, TransportResult};

/// Form field that carries the text when none is configured.
pub const DEFAULT_TEXT_FIELD: &str = "text";

/// Misspelled words and their suggestions, in service order.
///
/// Each word appears once. Inserting a word again replaces its suggestions
/// but keeps its original position.
#[derive(Debug, Clone, Default)]
pub struct SuggestionMap {
    entries: IndexMap<String, Vec<String>>,
}

impl SuggestionMap {
    /// Create an empty map.
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert or update the suggestions for `word`.
    pub fn insert(&mut self, word: impl Into<String>, suggestions: Vec<String>) {
        self.entries.insert(word.into(), suggestions);
    }

    /// Suggestions for `word`, if it is present.
    pub fn get(&self, word: &str) -> Option<&[String]> {
        self.entries.get(word).map(Vec::as_slice)
    }

    /// Words in service order.
    pub fn words(&self) -> impl Iterator<Item = &str> {
        self.entries.keys().map(String::as_str)
    }

    /// `(word, suggestions)` pairs in service order.
    pub fn iter(&self) -> impl Iterator<Item = (&str, &[String])> {
        self.entries
            .iter()
            .map(|(w, s)| (w.as_str(), s.as_slice()))
    }

    /// Number of distinct words.
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Returns `true` if no words are present.
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

// Review order is part of the value.
impl PartialEq for SuggestionMap {
    fn eq(&self, other: &Self) -> bool {
        self.entries.iter().eq(other.entries.iter())
    }
}

impl Eq for SuggestionMap {}

impl<W, S> FromIterator<(W, Vec<S>)> for SuggestionMap
where
    W: Into<String>,
    S: Into<String>,
{
    fn from_iter<I: IntoIterator<Item = (W, Vec<S>)>>(iter: I) -> Self {
        let mut map = Self::new();
        for (word, suggestions) in iter {
            map.insert(word, suggestions.into_iter().map(Into::into).collect());
        }
        map
    }
}

impl Serialize for SuggestionMap {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut map = serializer.serialize_map(Some(self.entries.len()))?;
        for (word, suggestions) in &self.entries {
            map.serialize_entry(word, suggestions)?;
        }
        map.end()
    }
}

impl<'de> Deserialize<'de> for SuggestionMap {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        deserializer.deserialize_any(SuggestionMapVisitor)
    }
}

struct SuggestionMapVisitor;

impl<'de> Visitor<'de> for SuggestionMapVisitor {
    type Value = SuggestionMap;

    fn expecting(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("a map of words to suggestion lists")
    }

    fn visit_map<A: MapAccess<'de>>(self, mut access: A) -> Result<Self::Value, A::Error> {
        let mut map = SuggestionMap::new();
        while let Some((word, suggestions)) = access.next_entry::<String, Option<Vec<String>>>()? {
            map.insert(word, suggestions.unwrap_or_default());
        }
        Ok(map)
    }

    // PHP encodes an empty associative array as `[]`.
    fn visit_seq<A: SeqAccess<'de>>(self, mut access: A) -> Result<Self::Value, A::Error> {
        if access.next_element::<IgnoredAny>()?.is_some() {
            return Err(de::Error::invalid_type(de::Unexpected::Seq, &self));
        }
        Ok(SuggestionMap::new())
    }

    fn visit_unit<E: de::Error>(self) -> Result<Self::Value, E> {
        Ok(SuggestionMap::new())
    }

    fn visit_none<E: de::Error>(self) -> Result<Self::Value, E> {
        Ok(SuggestionMap::new())
    }
}

/// Decoded response from the checking service.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct CheckResult {
    /// The service processed the request.
    pub success: bool,
    /// At least one misspelled word was found.
    #[serde(rename = "errors")]
    pub has_errors: bool,
    /// Misspelled words with their suggestions.
    pub words: SuggestionMap,
}

impl CheckResult {
    /// A successful check that found nothing.
    pub fn clean() -> Self {
        Self {
            success: true,
            has_errors: false,
            words: SuggestionMap::new(),
        }
    }

    /// A successful check that flagged `words`.
    pub fn flagged(words: SuggestionMap) -> Self {
        Self {
            success: true,
            has_errors: true,
            words,
        }
    }

    /// A response in which the service reported failure.
    pub fn failed() -> Self {
        Self::default()
    }
}

/// Decode a response body into a [`CheckResult`].
pub fn decode_check_result(body: &str) -> TransportResult<CheckResult> {
    let body = body.trim();
    if body.is_empty() {
        return Err(TransportError::Malformed("empty response body".to_string()));
    }
    serde_json::from_str(body).map_err(|e| TransportError::Malformed(e.to_string()))
}

/// Text to check plus any extra form fields.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct CheckRequest {
    /// Name of the form field carrying the text.
    pub field: String,
    /// The text to check.
    pub text: String,
    /// Additional fields sent with every request.
    pub extra: BTreeMap<String, String>,
}

impl CheckRequest {
    /// Create a request for `text` using the default field name.
    pub fn new(text: impl Into<String>) -> Self {
        Self {
            field: DEFAULT_TEXT_FIELD.to_string(),
            text: text.into(),
            extra: BTreeMap::new(),
        }
    }

    /// Send the text under a different field name.
    pub fn with_field(mut self, field: impl Into<String>) -> Self {
        self.field = field.into();
        self
    }

    /// Add one extra field.
    pub fn with_extra(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.extra.insert(key.into(), value.into());
        self
    }

    /// Add several extra fields.
    pub fn with_extras<K, V>(mut self, fields: impl IntoIterator<Item = (K, V)>) -> Self
    where
        K: Into<String>,
        V: Into<String>,
    {
        self.extra
            .extend(fields.into_iter().map(|(k, v)| (k.into(), v.into())));
        self
    }

    /// Form body pairs: the text first, then extra fields in key order.
    ///
    /// An extra field that reuses the text field name is dropped.
    pub fn form_pairs(&self) -> Vec<(&str, &str)> {
        std::iter::once((self.field.as_str(), self.text.as_str()))
            .chain(
                self.extra
                    .iter()
                    .filter(|(k, _)| **k != self.field)
                    .map(|(k, v)| (k.as_str(), v.as_str())),
            )
            .collect()
    }
}

/// Delivers text to a checking service.
///
/// Each call is a single attempt; retry policy belongs to the implementor.
pub trait CheckTransport {
    /// Check `request` and return the decoded result.
    fn check(
        &self,
        request: &CheckRequest,
    ) -> impl Future<Output = TransportResult<CheckResult>> + Send;
}

/// A transport that replays a canned response body.
///
/// The body goes through [`decode_check_result`], so malformed fixtures
/// fail the same way a misbehaving service would.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StaticTransport {
    response: TransportResult<String>,
}

impl StaticTransport {
    /// Replay `body` verbatim.
    pub fn from_body(body: impl Into<String>) -> Self {
        Self {
            response: Ok(body.into()),
        }
    }

    /// Replay the JSON encoding of `result`.
    pub fn from_result(result: &CheckResult) -> Self {
        Self {
            response: serde_json::to_string(result)
                .map_err(|e| TransportError::Malformed(e.to_string())),
        }
    }

    /// Fail every check with `error`.
    pub const fn failing(error: TransportError) -> Self {
        Self {
            response: Err(error),
        }
    }

    /// Decode the canned response without going through a future.
    pub fn replay(&self) -> TransportResult<CheckResult> {
        self.response
            .as_deref()
            .map_err(Clone::clone)
            .and_then(decode_check_result)
    }
}

impl CheckTransport for StaticTransport {
    fn check(
        &self,
        request: &CheckRequest,
    ) -> impl Future<Output = TransportResult<CheckResult>> + Send {
        tracing::debug!(
            field = %request.field,
            text_len = request.text.len(),
            "replaying canned check response"
        );
        std::future::ready(self.replay())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn decodes_words_in_service_order() {
        let body = r#"{"success":true,"errors":true,"words":{"zebr":["zebra"],"Helo":["Hello","Help"],"abot":[]}}"#;
        let result = decode_check_result(body).unwrap();
        assert!(result.success);
        assert!(result.has_errors);
        let words: Vec<&str> = result.words.words().collect();
        assert_eq!(words, vec!["zebr", "Helo", "abot"]);
        assert_eq!(
            result.words.get("Helo").unwrap(),
            &["Hello".to_string(), "Help".to_string()]
        );
        assert!(result.words.get("abot").unwrap().is_empty());
    }

    #[test]
    fn duplicate_keys_keep_first_position_last_value() {
        let body = r#"{"success":true,"errors":true,"words":{"a":["x"],"b":["y"],"a":["z"]}}"#;
        let result = decode_check_result(body).unwrap();
        let words: Vec<&str> = result.words.words().collect();
        assert_eq!(words, vec!["a", "b"]);
        assert_eq!(result.words.get("a").unwrap(), &["z".to_string()]);
    }

    #[test]
    fn empty_array_words_is_empty_map() {
        let result = decode_check_result(r#"{"success":true,"errors":false,"words":[]}"#).unwrap();
        assert!(result.words.is_empty());
    }

    #[test]
    fn non_empty_array_words_is_malformed() {
        let err = decode_check_result(r#"{"success":true,"errors":true,"words":["a"]}"#)
            .unwrap_err();
        assert!(matches!(err, TransportError::Malformed(_)));
    }

    #[test]
    fn null_suggestions_are_empty() {
        let result =
            decode_check_result(r#"{"success":true,"errors":true,"words":{"teh":null}}"#).unwrap();
        assert!(result.words.get("teh").unwrap().is_empty());
    }

    #[test]
    fn missing_fields_default_to_false_and_empty() {
        let result = decode_check_result("{}").unwrap();
        assert_eq!(result, CheckResult::failed());
        let result = decode_check_result(r#"{"success":true}"#).unwrap();
        assert_eq!(result, CheckResult::clean());
    }

    #[test]
    fn empty_and_garbage_bodies_are_malformed() {
        assert!(matches!(
            decode_check_result("   \n"),
            Err(TransportError::Malformed(_))
        ));
        assert!(matches!(
            decode_check_result("<html>500</html>"),
            Err(TransportError::Malformed(_))
        ));
        assert!(matches!(
            decode_check_result(r#"{"success":"yes"}"#),
            Err(TransportError::Malformed(_))
        ));
    }

    #[test]
    fn serializes_with_wire_names() {
        let words: SuggestionMap = [("teh", vec!["the"])].into_iter().collect();
        let json = serde_json::to_value(CheckResult::flagged(words)).unwrap();
        assert_eq!(json["errors"], true);
        assert_eq!(json["words"]["teh"][0], "the");
    }

    #[test]
    fn insert_replaces_without_reordering() {
        let mut map = SuggestionMap::new();
        map.insert("b", vec![]);
        map.insert("a", vec![]);
        map.insert("b", vec!["bee".to_string()]);
        assert_eq!(map.words().collect::<Vec<_>>(), vec!["b", "a"]);
        assert_eq!(map.len(), 2);
        assert_eq!(map.get("b").unwrap(), &["bee".to_string()]);
    }

    #[test]
    fn equality_respects_review_order() {
        let ab: SuggestionMap = [("a", vec!["x"]), ("b", vec!["y"])].into_iter().collect();
        let ba: SuggestionMap = [("b", vec!["y"]), ("a", vec!["x"])].into_iter().collect();
        assert_ne!(ab, ba);
        assert_eq!(ab.get("b"), ba.get("b"));
    }

    #[test]
    fn form_pairs_put_text_first() {
        let request = CheckRequest::new("Helo wrold")
            .with_field("content")
            .with_extra("lang", "en")
            .with_extras([("dict", "custom"), ("content", "shadowed")]);
        assert_eq!(
            request.form_pairs(),
            vec![
                ("content", "Helo wrold"),
                ("dict", "custom"),
                ("lang", "en"),
            ]
        );
    }

    #[test]
    fn default_field_is_text() {
        let request = CheckRequest::new("abc");
        assert_eq!(request.form_pairs(), vec![("text", "abc")]);
    }

    #[test]
    fn static_transport_replays_result() {
        let words: SuggestionMap = [("Helo", vec!["Hello"])].into_iter().collect();
        let transport = StaticTransport::from_result(&CheckResult::flagged(words.clone()));
        assert_eq!(transport.replay().unwrap(), CheckResult::flagged(words));
    }

    #[test]
    fn static_transport_surfaces_failures() {
        let transport = StaticTransport::failing(TransportError::Status(502));
        assert_eq!(transport.replay(), Err(TransportError::Status(502)));

        let transport = StaticTransport::from_body("not json");
        assert!(matches!(
            transport.replay(),
            Err(TransportError::Malformed(_))
        ));
    }
}
