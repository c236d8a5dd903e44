//! Key-value NLU adapter for the console host and tests.
//!
//! Recognizes two token shapes in whitespace-separated input:
//! `#name` sets the intent (last one wins) and `name=value` adds an entity.
//! Everything else is plain text. The raw text is always the full input.

use async_trait::async_trait;

use crate::domain::dialogue::NlpResult;
use crate::ports::{NluError, NluProvider};

/// Deterministic NLU driven by inline markup
#[derive(Debug, Clone, Copy, Default)]
pub struct KeyValueNluProvider;

impl KeyValueNluProvider {
    pub fn new() -> Self {
        Self
    }

    /// Parses one message synchronously.
    pub fn parse(&self, text: &str) -> Result<NlpResult, NluError> {
        let mut result = NlpResult::text(text.trim());
        for token in text.split_whitespace() {
            if let Some(intent) = token.strip_prefix('#') {
                if intent.is_empty() {
                    return Err(NluError::Parse("empty intent marker '#'".to_string()));
                }
                result.intent = Some(intent.to_string());
            } else if let Some((name, value)) = token.split_once('=') {
                if name.is_empty() {
                    return Err(NluError::Parse(format!("entity without a name: '{}'", token)));
                }
                result = result.with_entity(name, value);
            }
        }
        Ok(result)
    }
}

#[async_trait]
impl NluProvider for KeyValueNluProvider {
    async fn understand(&self, text: &str) -> Result<NlpResult, NluError> {
        self.parse(text)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn plain_text_has_no_intent_or_entities() {
        let nlp = KeyValueNluProvider::new().parse("  Boston  ").unwrap();
        assert_eq!(nlp.raw_text, "Boston");
        assert!(nlp.intent.is_none());
        assert!(!nlp.has_entities());
    }

    #[test]
    fn extracts_intent_and_entities_in_order() {
        let nlp = KeyValueNluProvider::new()
            .parse("#book_flight destination=LAX origin=NYC please")
            .unwrap();
        assert_eq!(nlp.intent.as_deref(), Some("book_flight"));
        let names: Vec<_> = nlp.entities.iter().map(|e| e.name.as_str()).collect();
        assert_eq!(names, vec!["destination", "origin"]);
        assert_eq!(nlp.entity("origin").unwrap().value, "NYC");
    }

    #[test]
    fn rejects_malformed_markup() {
        let nlu = KeyValueNluProvider::new();
        assert!(matches!(nlu.parse("# hi"), Err(NluError::Parse(_))));
        assert!(matches!(nlu.parse("=NYC"), Err(NluError::Parse(_))));
    }

    #[tokio::test]
    async fn understand_delegates_to_parse() {
        let nlp = KeyValueNluProvider::new().understand("#greet").await.unwrap();
        assert_eq!(nlp.intent.as_deref(), Some("greet"));
    }
}
