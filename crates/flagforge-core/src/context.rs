use std::collections::HashMap;

use crate::config::TARGETING_KEY_ATTRIBUTE;
use crate::value::AttributeValue;

/// Immutable carrier of a targeting key plus a bag of attributes. All
/// accessors return defensive copies: mutating a map you passed in earlier,
/// or one you received back from [`EvaluationContext::attributes`], never
/// mutates the context itself.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct EvaluationContext {
    targeting_key: String,
    attributes: HashMap<String, AttributeValue>,
}

impl EvaluationContext {
    pub fn new(targeting_key: impl Into<String>, attributes: HashMap<String, AttributeValue>) -> Self {
        Self {
            targeting_key: targeting_key.into(),
            attributes,
        }
    }

    pub fn empty() -> Self {
        Self::default()
    }

    pub fn targeting_key(&self) -> &str {
        &self.targeting_key
    }

    /// Defensive copy of the attribute map.
    pub fn attributes(&self) -> HashMap<String, AttributeValue> {
        self.attributes.clone()
    }

    pub fn with_attribute(mut self, key: impl Into<String>, value: impl Into<AttributeValue>) -> Self {
        self.attributes.insert(key.into(), value.into());
        self
    }

    /// Merge an ordered slice of contexts, lowest precedence first, into one.
    ///
    /// `targeting_key` = first non-empty key scanning from highest precedence
    /// downward. `attributes` = union where a higher-precedence key overrides
    /// a lower one. Associative in precedence order and idempotent when the
    /// same context appears twice, since it reduces to ordered `HashMap`
    /// inserts and a single reverse-scan.
    pub fn merge(contexts: &[EvaluationContext]) -> EvaluationContext {
        let mut attributes = HashMap::new();
        for ctx in contexts {
            attributes.extend(ctx.attributes.clone());
        }
        let targeting_key = contexts
            .iter()
            .rev()
            .find(|c| !c.targeting_key.is_empty())
            .map(|c| c.targeting_key.clone())
            .unwrap_or_default();
        EvaluationContext { targeting_key, attributes }
    }

    /// Merge a single higher-precedence context on top of `self`.
    pub fn merged_with(&self, higher: &EvaluationContext) -> EvaluationContext {
        EvaluationContext::merge(&[self.clone(), higher.clone()])
    }

    pub fn flatten(&self) -> FlattenedContext {
        FlattenedContext::from(self)
    }
}

/// Read-only view used at the provider boundary: the attribute map plus the
/// targeting key under the reserved attribute name.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct FlattenedContext(HashMap<String, AttributeValue>);

impl FlattenedContext {
    pub fn get(&self, key: &str) -> Option<&AttributeValue> {
        self.0.get(key)
    }

    pub fn targeting_key(&self) -> Option<&str> {
        self.0.get(TARGETING_KEY_ATTRIBUTE).and_then(|v| v.as_str())
    }

    pub fn as_map(&self) -> &HashMap<String, AttributeValue> {
        &self.0
    }
}

impl From<&EvaluationContext> for FlattenedContext {
    fn from(ctx: &EvaluationContext) -> Self {
        let mut map = ctx.attributes.clone();
        // The top-level targeting key field always wins over an
        // attributes["targetingKey"] entry.
        if !ctx.targeting_key.is_empty() {
            map.insert(TARGETING_KEY_ATTRIBUTE.to_string(), AttributeValue::String(ctx.targeting_key.clone()));
        }
        FlattenedContext(map)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defensive_copy_on_construction() {
        let mut attrs = HashMap::new();
        attrs.insert("foo".to_string(), AttributeValue::from("bar"));
        let ctx = EvaluationContext::new("user-1", attrs.clone());
        attrs.insert("foo".to_string(), AttributeValue::from("mutated"));
        assert_eq!(ctx.attributes().get("foo").unwrap().as_str(), Some("bar"));
    }

    #[test]
    fn defensive_copy_on_read() {
        let ctx = EvaluationContext::new("user-1", HashMap::new()).with_attribute("foo", "bar");
        let mut copy = ctx.attributes();
        copy.insert("foo".to_string(), AttributeValue::from("mutated"));
        assert_eq!(ctx.attributes().get("foo").unwrap().as_str(), Some("bar"));
    }

    #[test]
    fn merge_precedence_and_targeting_key() {
        let global = EvaluationContext::new("A", HashMap::new()).with_attribute("foo", "g");
        let client = EvaluationContext::new("C", HashMap::new()).with_attribute("foo", "c");
        let invocation = EvaluationContext::new("", HashMap::new()).with_attribute("bar", "i");
        let transaction = EvaluationContext::new("T", HashMap::new()).with_attribute("foo", "t");

        // global < transaction < client < invocation
        let merged = EvaluationContext::merge(&[global, transaction, client, invocation]);
        assert_eq!(merged.targeting_key(), "C");
        let attrs = merged.attributes();
        assert_eq!(attrs.get("foo").unwrap().as_str(), Some("c"));
        assert_eq!(attrs.get("bar").unwrap().as_str(), Some("i"));

        let flat = merged.flatten();
        assert_eq!(flat.targeting_key(), Some("C"));
        assert_eq!(flat.get("bar").unwrap().as_str(), Some("i"));
    }

    #[test]
    fn merge_is_idempotent_for_repeated_context() {
        let a = EvaluationContext::new("A", HashMap::new()).with_attribute("foo", "a");
        let once = EvaluationContext::merge(&[a.clone()]);
        let twice = EvaluationContext::merge(&[a.clone(), a]);
        assert_eq!(once, twice);
    }

    #[test]
    fn top_level_targeting_key_wins_over_attribute_entry() {
        let ctx = EvaluationContext::new("top-level", HashMap::new())
            .with_attribute("targetingKey", "shadowed");
        let flat = ctx.flatten();
        assert_eq!(flat.targeting_key(), Some("top-level"));
    }
}
