//! One validator per schema name, used by one unit of work at a time
//!
//! Each name owns a slot behind a `tokio::sync::Mutex`, whose waiters are
//! served first come, first served. The validator is compiled by the
//! first unit that reaches an empty slot and kept for the life of the
//! queue.

use std::collections::HashMap;
use std::future::Future;
use std::sync::{Arc, Mutex, PoisonError};

use quarto_yaml_validation::{Schema, Validator};

type Slot = Arc<tokio::sync::Mutex<Option<Arc<Validator>>>>;

#[derive(Debug, Default)]
pub struct ValidatorQueue {
    slots: Mutex<HashMap<String, Slot>>,
}

impl ValidatorQueue {
    pub fn new() -> Self {
        Self::default()
    }

    fn slot(&self, name: &str) -> Slot {
        let mut slots = self.slots.lock().unwrap_or_else(PoisonError::into_inner);
        Arc::clone(slots.entry(name.to_string()).or_default())
    }

    /// Run `work` against the validator for `name`, after every unit
    /// queued before it for the same name has finished.
    ///
    /// Returns `None`, after logging, when the validator cannot be built
    /// or `work` fails. A failure does not affect later units.
    pub async fn with_validator<T, F, Fut>(
        &self,
        name: &str,
        schema: &Arc<Schema>,
        definitions: &Arc<Vec<Schema>>,
        work: F,
    ) -> Option<T>
    where
        F: FnOnce(Arc<Validator>) -> Fut,
        Fut: Future<Output = anyhow::Result<T>>,
    {
        let slot = self.slot(name);
        let mut guard = slot.lock().await;

        let validator = match guard.as_ref() {
            Some(validator) => Arc::clone(validator),
            None => match Validator::new(Arc::clone(schema), Arc::clone(definitions)) {
                Ok(validator) => {
                    tracing::debug!(schema = %name, "constructed validator");
                    let validator = Arc::new(validator);
                    *guard = Some(Arc::clone(&validator));
                    validator
                }
                Err(e) => {
                    tracing::error!(schema = %name, error = %e, "failed to construct validator");
                    return None;
                }
            },
        };

        match work(validator).await {
            Ok(result) => Some(result),
            Err(e) => {
                tracing::error!(schema = %name, error = format!("{e:#}"), "validation failed");
                None
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use std::sync::atomic::{AtomicBool, Ordering};
    use std::time::Duration;

    fn schema(value: serde_json::Value) -> Arc<Schema> {
        Arc::new(Schema::from_json(&value).unwrap())
    }

    fn no_definitions() -> Arc<Vec<Schema>> {
        Arc::new(Vec::new())
    }

    #[tokio::test]
    async fn test_validator_is_built_once() {
        let queue = ValidatorQueue::new();
        let schema = schema(json!({"type": "string"}));
        let defs = no_definitions();

        let first = queue
            .with_validator("x", &schema, &defs, |v| async move { Ok(v) })
            .await
            .unwrap();
        let second = queue
            .with_validator("x", &schema, &defs, |v| async move { Ok(v) })
            .await
            .unwrap();
        assert!(Arc::ptr_eq(&first, &second));

        let other = queue
            .with_validator("y", &schema, &defs, |v| async move { Ok(v) })
            .await
            .unwrap();
        assert!(!Arc::ptr_eq(&first, &other));
    }

    #[tokio::test]
    async fn test_units_for_one_name_never_overlap() {
        let queue = ValidatorQueue::new();
        let schema = schema(json!({"type": "string"}));
        let defs = no_definitions();
        let busy = AtomicBool::new(false);
        let order = Mutex::new(Vec::new());

        let unit = |id: u32| {
            let busy = &busy;
            let order = &order;
            move |_v: Arc<Validator>| async move {
                assert!(!busy.swap(true, Ordering::SeqCst), "units overlapped");
                tokio::time::sleep(Duration::from_millis(20)).await;
                order.lock().unwrap().push(id);
                busy.store(false, Ordering::SeqCst);
                Ok(id)
            }
        };

        let (a, b, c) = tokio::join!(
            queue.with_validator("x", &schema, &defs, unit(1)),
            queue.with_validator("x", &schema, &defs, unit(2)),
            queue.with_validator("x", &schema, &defs, unit(3)),
        );
        assert_eq!((a, b, c), (Some(1), Some(2), Some(3)));
        assert_eq!(*order.lock().unwrap(), vec![1, 2, 3]);
    }

    #[tokio::test]
    async fn test_names_are_independent() {
        let queue = ValidatorQueue::new();
        let schema = schema(json!({"type": "string"}));
        let defs = no_definitions();
        let notify = tokio::sync::Notify::new();
        let released = &notify;

        // "a" waits for "b"; serializing them across names would deadlock
        let run = async {
            tokio::join!(
                queue.with_validator("a", &schema, &defs, |_| async move {
                    released.notified().await;
                    Ok("a")
                }),
                queue.with_validator("b", &schema, &defs, |_| async move {
                    released.notify_one();
                    Ok("b")
                }),
            )
        };
        let result = tokio::time::timeout(Duration::from_secs(5), run).await.unwrap();
        assert_eq!(result, (Some("a"), Some("b")));
    }

    #[tokio::test]
    async fn test_failures_are_contained() {
        let queue = ValidatorQueue::new();
        let schema = schema(json!({"type": "string"}));
        let defs = no_definitions();

        let failed: Option<()> = queue
            .with_validator("x", &schema, &defs, |_| async { Err(anyhow::anyhow!("boom")) })
            .await;
        assert!(failed.is_none());

        let ok = queue
            .with_validator("x", &schema, &defs, |_| async { Ok(7) })
            .await;
        assert_eq!(ok, Some(7));
    }

    #[tokio::test]
    async fn test_broken_schema_yields_none() {
        let queue = ValidatorQueue::new();
        let schema = schema(json!({"$ref": "missing"}));
        let result = queue
            .with_validator("broken", &schema, &no_definitions(), |_| async { Ok(()) })
            .await;
        assert!(result.is_none());
    }
}
