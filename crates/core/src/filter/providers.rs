use std::collections::HashMap;

use serde::{Deserialize, Serialize};

/// Translates one segment at a time.
///
/// Called synchronously, once per non-empty segment, outer segments before
/// the external segments nested in them. `escape` tells whether LaTeX escapes
/// were undone for this segment; `comment` describes the surrounding
/// environments when enabled.
pub trait TranslationProvider {
    /// Return the translation of `text`.
    fn translate(&mut self, text: &str, escape: bool, comment: Option<&str>) -> String;
}

impl<F> TranslationProvider for F
where
    F: FnMut(&str, bool, Option<&str>) -> String,
{
    fn translate(&mut self, text: &str, escape: bool, comment: Option<&str>) -> String {
        self(text, escape, comment)
    }
}

/// Returns every segment unchanged.
#[derive(Debug, Clone, Copy, Default)]
pub struct IdentityProvider;

impl TranslationProvider for IdentityProvider {
    fn translate(&mut self, text: &str, _escape: bool, _comment: Option<&str>) -> String {
        text.to_string()
    }
}

/// A translatable segment as the translator sees it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Segment {
    /// Segment text with inline tags.
    pub text: String,
    /// LaTeX escapes were undone.
    pub escape: bool,
    /// Environment description, if any.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub comment: Option<String>,
}

/// Records every segment and returns it unchanged.
#[derive(Debug, Clone, Default)]
pub struct SegmentCollector {
    segments: Vec<Segment>,
}

impl SegmentCollector {
    /// An empty collector.
    pub fn new() -> Self {
        Self::default()
    }

    /// Segments recorded so far, in call order.
    pub fn segments(&self) -> &[Segment] {
        &self.segments
    }

    /// Consume the collector.
    pub fn into_segments(self) -> Vec<Segment> {
        self.segments
    }
}

impl TranslationProvider for SegmentCollector {
    fn translate(&mut self, text: &str, escape: bool, comment: Option<&str>) -> String {
        self.segments.push(Segment {
            text: text.to_string(),
            escape,
            comment: comment.map(str::to_string),
        });
        text.to_string()
    }
}

/// Looks segments up in a source → target dictionary.
///
/// Unknown segments are returned unchanged and counted as misses.
#[derive(Debug, Clone, Default)]
pub struct DictionaryProvider {
    entries: HashMap<String, String>,
    hits: usize,
    misses: usize,
}

impl DictionaryProvider {
    /// Build from a map.
    pub fn new(entries: HashMap<String, String>) -> Self {
        Self {
            entries,
            hits: 0,
            misses: 0,
        }
    }

    /// Parse a JSON object of `"source": "target"` pairs.
    pub fn from_json_str(json: &str) -> Result<Self, serde_json::Error> {
        Ok(Self::new(serde_json::from_str(json)?))
    }

    /// Number of entries.
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// `true` when the dictionary has no entries.
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Segments found in the dictionary.
    pub fn hits(&self) -> usize {
        self.hits
    }

    /// Segments passed through untranslated.
    pub fn misses(&self) -> usize {
        self.misses
    }
}

impl TranslationProvider for DictionaryProvider {
    fn translate(&mut self, text: &str, _escape: bool, _comment: Option<&str>) -> String {
        match self.entries.get(text) {
            Some(target) => {
                self.hits += 1;
                target.clone()
            }
            None => {
                self.misses += 1;
                tracing::debug!(segment = text, "no dictionary entry");
                text.to_string()
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn closure_is_a_provider() {
        let mut upper = |text: &str, _: bool, _: Option<&str>| text.to_uppercase();
        assert_eq!(upper.translate("ab", true, None), "AB");
    }

    #[test]
    fn collector_records_calls() {
        let mut c = SegmentCollector::new();
        assert_eq!(c.translate("x", false, Some("Environments: table")), "x");
        assert_eq!(
            c.into_segments(),
            vec![Segment {
                text: "x".into(),
                escape: false,
                comment: Some("Environments: table".into()),
            }]
        );
    }

    #[test]
    fn dictionary_counts_hits_and_misses() {
        let mut d = DictionaryProvider::from_json_str(r#"{"Hello": "Bonjour"}"#).unwrap();
        assert_eq!(d.len(), 1);
        assert_eq!(d.translate("Hello", true, None), "Bonjour");
        assert_eq!(d.translate("World", true, None), "World");
        assert_eq!((d.hits(), d.misses()), (1, 1));
    }

    #[test]
    fn dictionary_rejects_non_object_json() {
        assert!(DictionaryProvider::from_json_str("[1, 2]").is_err());
    }
}
