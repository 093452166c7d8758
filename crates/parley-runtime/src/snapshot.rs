//! Per-run assistant snapshots.

use async_trait::async_trait;
use parley_core::{Assistant, AssistantRegistry, StoreError, StoreResult};
use std::sync::Arc;

use crate::error::RunError;

/// The candidate assistants of one run, resolved once when the run is created.
///
/// Tool registration after this point produces new `Assistant` values in the
/// registry and leaves the snapshot untouched. The snapshot also serves as
/// the assistant registry the step executor resolves against.
#[derive(Debug, Clone)]
pub struct AssistantSnapshot {
    assistants: Vec<Arc<Assistant>>,
}

impl AssistantSnapshot {
    /// Wrap an ordered candidate list. Order is significant: index 0 is the
    /// default owner and supplies the planning model.
    ///
    /// # Errors
    ///
    /// Returns `RunError::NoAssistants` for an empty list.
    pub fn new(assistants: Vec<Arc<Assistant>>) -> Result<Self, RunError> {
        if assistants.is_empty() {
            return Err(RunError::NoAssistants);
        }
        Ok(Self { assistants })
    }

    /// Resolve assistant identifiers through a registry, preserving order.
    pub async fn resolve(
        registry: &dyn AssistantRegistry,
        ids: &[String],
    ) -> Result<Self, RunError> {
        let mut assistants = Vec::with_capacity(ids.len());
        for id in ids {
            assistants.push(registry.get(id).await?);
        }
        Self::new(assistants)
    }

    /// The default candidate.
    pub fn first(&self) -> &Arc<Assistant> {
        &self.assistants[0]
    }

    pub fn get_index(&self, index: usize) -> Option<&Arc<Assistant>> {
        self.assistants.get(index)
    }

    pub fn find(&self, id: &str) -> Option<&Arc<Assistant>> {
        self.assistants.iter().find(|assistant| assistant.id == id)
    }

    pub fn as_slice(&self) -> &[Arc<Assistant>] {
        &self.assistants
    }

    pub fn len(&self) -> usize {
        self.assistants.len()
    }

    pub fn is_empty(&self) -> bool {
        self.assistants.is_empty()
    }
}

#[async_trait]
impl AssistantRegistry for AssistantSnapshot {
    async fn get(&self, id: &str) -> StoreResult<Arc<Assistant>> {
        self.find(id)
            .cloned()
            .ok_or_else(|| StoreError::AssistantNotFound(id.to_string()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use parley_store::AssistantManager;
    use parley_testing::{ScriptedModel, fixtures};

    #[test]
    fn test_empty_snapshot_rejected() {
        assert!(matches!(
            AssistantSnapshot::new(Vec::new()),
            Err(RunError::NoAssistants)
        ));
    }

    #[tokio::test]
    async fn test_resolve_preserves_order() {
        let manager = AssistantManager::new();
        let a = manager
            .create_assistant(fixtures::calculator_spec(ScriptedModel::shared()))
            .await;
        let b = manager
            .create_assistant(fixtures::calculator_spec(ScriptedModel::shared()))
            .await;

        let snapshot = AssistantSnapshot::resolve(&manager, &[b.id.clone(), a.id.clone()])
            .await
            .unwrap();
        assert_eq!(snapshot.len(), 2);
        assert_eq!(snapshot.first().id, b.id);
        assert_eq!(snapshot.get_index(1).unwrap().id, a.id);
        assert!(snapshot.get_index(2).is_none());
    }

    #[tokio::test]
    async fn test_resolve_missing_assistant() {
        let manager = AssistantManager::new();
        let err = AssistantSnapshot::resolve(&manager, &["ghost".to_string()])
            .await
            .unwrap_err();
        assert!(matches!(err, RunError::AssistantNotFound(ref id) if id == "ghost"));
    }

    #[tokio::test]
    async fn test_snapshot_ignores_later_tool_registration() {
        let manager = AssistantManager::new();
        let calc = manager
            .create_assistant(fixtures::calculator_spec(ScriptedModel::shared()))
            .await;
        let snapshot = AssistantSnapshot::resolve(&manager, &[calc.id.clone()])
            .await
            .unwrap();

        manager
            .add_tool(&calc.id, fixtures::convert_function())
            .await
            .unwrap();

        let held = snapshot.get(&calc.id).await.unwrap();
        assert!(held.find_function("convert_temperature").is_none());
        let fresh = manager.get_assistant(&calc.id).await.unwrap();
        assert!(fresh.find_function("convert_temperature").is_some());
    }
}
