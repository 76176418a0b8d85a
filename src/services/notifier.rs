//! Post-commit notification seam for scope changes.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::database::entities::deployable_entities::EntityKind;
use crate::errors::ScopeResult;

/// Emitted after an entity's resolved edge set has been committed.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct ScopeChangeEvent {
    pub tenant_id: String,
    pub entity_id: String,
    pub entity_kind: EntityKind,
    pub deploy_ids: Vec<String>,
    pub undeploy_ids: Vec<String>,
}

/// Receives scope-change events after commit. Implementations push to edge
/// clusters, message buses, whatever downstream needs them.
#[async_trait]
pub trait ScopeChangeNotifier: Send + Sync {
    async fn scope_changed(&self, event: ScopeChangeEvent) -> ScopeResult<()>;
}

/// Default notifier that only logs the event.
#[derive(Debug, Default)]
pub struct NoopNotifier;

#[async_trait]
impl ScopeChangeNotifier for NoopNotifier {
    async fn scope_changed(&self, event: ScopeChangeEvent) -> ScopeResult<()> {
        debug!(
            entity_id = %event.entity_id,
            deploy = event.deploy_ids.len(),
            undeploy = event.undeploy_ids.len(),
            "scope change"
        );
        Ok(())
    }
}
