//! Gating predicates for externally triggered mutations.
//!
//! Before an external caller may change an index property, the registered
//! `on_change_property` condition is consulted. The default allows every change.

use std::fmt;
use std::sync::Arc;

use serde_json::Value;

/// Decides whether a property change requested by an external caller may proceed.
pub trait ChangePropertyCondition: Send + Sync {
    fn allows(&self, index: &str, key: &str, value: &Value) -> bool;
}

impl<F> ChangePropertyCondition for F
where
    F: Fn(&str, &str, &Value) -> bool + Send + Sync,
{
    fn allows(&self, index: &str, key: &str, value: &Value) -> bool {
        self(index, key, value)
    }
}

/// Condition that allows every change.
#[derive(Debug, Clone, Copy, Default)]
pub struct AllowAll;

impl ChangePropertyCondition for AllowAll {
    fn allows(&self, _index: &str, _key: &str, _value: &Value) -> bool {
        true
    }
}

/// The set of registered conditions.
#[derive(Clone)]
pub struct Conditions {
    pub on_change_property: Arc<dyn ChangePropertyCondition>,
}

impl Default for Conditions {
    fn default() -> Self {
        Self {
            on_change_property: Arc::new(AllowAll),
        }
    }
}

impl fmt::Debug for Conditions {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Conditions").finish_non_exhaustive()
    }
}

/// Replacement conditions. Entries left as `None` keep the current condition.
#[derive(Clone, Default)]
pub struct ConditionsUpdate {
    pub on_change_property: Option<Arc<dyn ChangePropertyCondition>>,
}

impl ConditionsUpdate {
    /// Replace the property change condition.
    pub fn on_change_property(condition: impl ChangePropertyCondition + 'static) -> Self {
        Self {
            on_change_property: Some(Arc::new(condition)),
        }
    }
}

impl Conditions {
    /// Apply `update`, replacing each condition it names.
    pub fn apply(&mut self, update: ConditionsUpdate) {
        if let Some(condition) = update.on_change_property {
            self.on_change_property = condition;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_default_allows_everything() {
        let conditions = Conditions::default();
        assert!(conditions
            .on_change_property
            .allows("posts", "limit", &json!(5)));
        assert!(conditions
            .on_change_property
            .allows("", "anything", &Value::Null));
    }

    #[test]
    fn test_closure_condition() {
        let mut conditions = Conditions::default();
        conditions.apply(ConditionsUpdate::on_change_property(
            |_index: &str, key: &str, _value: &Value| key != "limit",
        ));

        assert!(!conditions
            .on_change_property
            .allows("posts", "limit", &json!(5)));
        assert!(conditions
            .on_change_property
            .allows("posts", "format", &json!("native")));
    }

    #[test]
    fn test_empty_update_keeps_existing_condition() {
        let mut conditions = Conditions::default();
        conditions.apply(ConditionsUpdate::on_change_property(
            |_: &str, _: &str, _: &Value| false,
        ));
        conditions.apply(ConditionsUpdate::default());

        assert!(!conditions
            .on_change_property
            .allows("posts", "limit", &json!(5)));
    }
}
