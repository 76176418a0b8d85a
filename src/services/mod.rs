pub mod edge_resolver;
pub mod entity_service;
pub mod notifier;
pub mod project_reconciler;
pub mod project_service;
pub mod selector_store;
pub mod topic_claim_service;

pub use edge_resolver::{EntityScopeInput, ResolvedEdges};
pub use entity_service::{DeployableEntityInput, EntityService};
pub use notifier::{NoopNotifier, ScopeChangeEvent, ScopeChangeNotifier};
pub use project_reconciler::ProjectUpdate;
pub use project_service::{ProjectEdgeConfigInput, ProjectService};
pub use topic_claim_service::{ClaimOwner, DataIfcEndpoint};
