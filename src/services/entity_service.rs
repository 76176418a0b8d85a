//! Transactional lifecycle of deployable entities: create, update, delete.
//!
//! Each operation runs in a single transaction covering validation, the entity
//! row, selector rows, resolved assignments, and topic claims, so a failure in
//! any step leaves no partial state. Notifications go out only after commit.

use std::collections::{HashMap, HashSet};
use std::sync::Arc;

use chrono::Utc;
use sea_orm::{
    ActiveModelTrait, ColumnTrait, ConnectionTrait, DatabaseConnection, EntityTrait, QueryFilter,
    Set, TransactionTrait,
};
use tracing::{info, warn};
use uuid::Uuid;

use crate::category::Selector;
use crate::config::EngineConfig;
use crate::database::entities::data_sources::{self, IfcKind};
use crate::database::entities::deployable_entities::{self, EntityKind};
use crate::database::entities::projects::EdgeSelectorType;
use crate::errors::{ScopeError, ScopeResult};
use crate::services::edge_resolver::{self, EntityScopeInput, ResolvedEdges};
use crate::services::notifier::{ScopeChangeEvent, ScopeChangeNotifier};
use crate::services::selector_store;
use crate::services::topic_claim_service::{self, ClaimOwner, DataIfcEndpoint};

/// Caller-supplied fields of a deployable entity.
#[derive(Clone, Debug)]
pub struct DeployableEntityInput {
    pub name: String,
    pub kind: EntityKind,
    pub project_id: String,
    pub selector: Selector,
    pub edge_ids: Vec<String>,
    pub exclude_edge_ids: Vec<String>,
    pub data_ifc_endpoints: Vec<DataIfcEndpoint>,
}

pub struct EntityService {
    db: DatabaseConnection,
    config: EngineConfig,
    notifier: Arc<dyn ScopeChangeNotifier>,
}

impl EntityService {
    pub fn new(
        db: DatabaseConnection,
        config: EngineConfig,
        notifier: Arc<dyn ScopeChangeNotifier>,
    ) -> Self {
        Self {
            db,
            config,
            notifier,
        }
    }

    /// Create an entity, resolve its edge assignments, and claim its OUT
    /// endpoints, all in one transaction.
    pub async fn create_entity(
        &self,
        tenant_id: &str,
        input: &DeployableEntityInput,
    ) -> ScopeResult<deployable_entities::Model> {
        let txn = self.db.begin().await?;

        let selector_type = self.validate_scope_input(&txn, tenant_id, input).await?;
        let sources = load_endpoint_sources(&txn, tenant_id, &input.data_ifc_endpoints).await?;
        topic_claim_service::validate_endpoint_count_limits(
            &sources,
            self.config.max_in_endpoints,
            self.config.max_out_endpoints,
        )?;

        let now = Utc::now();
        let entity = deployable_entities::ActiveModel {
            id: Set(Uuid::new_v4().to_string()),
            tenant_id: Set(tenant_id.to_string()),
            project_id: Set(input.project_id.clone()),
            kind: Set(input.kind.as_str().to_string()),
            name: Set(input.name.clone()),
            data_ifc_endpoints: Set(encode_endpoints(&input.data_ifc_endpoints)?),
            created_at: Set(now),
            updated_at: Set(now),
        }
        .insert(&txn)
        .await?;

        // Selectors only mean anything under a Category-mode project
        if selector_type == EdgeSelectorType::Category {
            selector_store::save_entity_selector(&txn, &entity.id, &input.selector).await?;
        }

        let resolved =
            edge_resolver::resolve_entity_edges(&txn, tenant_id, &entity.id, &scope_input(input))
                .await?;

        let owner = claim_owner(input.kind, &entity.id);
        claim_out_endpoints(&txn, tenant_id, &input.data_ifc_endpoints, &sources, &owner).await?;

        txn.commit().await?;
        info!(entity_id = %entity.id, kind = input.kind.as_str(), "entity created");
        self.dispatch(tenant_id, &entity.id, input.kind, &resolved);
        Ok(entity)
    }

    /// Update an entity's scoping fields and endpoints. Previously claimed
    /// endpoints are released before the new set is claimed, so moving a topic
    /// between an entity's endpoints never conflicts with itself.
    pub async fn update_entity(
        &self,
        tenant_id: &str,
        entity_id: &str,
        input: &DeployableEntityInput,
    ) -> ScopeResult<deployable_entities::Model> {
        let txn = self.db.begin().await?;

        let existing = load_entity(&txn, tenant_id, entity_id).await?;
        if existing.project_id != input.project_id {
            return Err(ScopeError::bad_request(
                "projectId",
                "an entity cannot move between projects",
            ));
        }
        let kind = parse_entity_kind(&existing)?;

        let selector_type = self.validate_scope_input(&txn, tenant_id, input).await?;
        let sources = load_endpoint_sources(&txn, tenant_id, &input.data_ifc_endpoints).await?;
        topic_claim_service::validate_endpoint_count_limits(
            &sources,
            self.config.max_in_endpoints,
            self.config.max_out_endpoints,
        )?;

        let owner = claim_owner(kind, entity_id);
        let prior_endpoints = decode_endpoints(&existing.data_ifc_endpoints)?;
        for endpoint in &prior_endpoints {
            topic_claim_service::unclaim_topic(&txn, endpoint, &owner).await?;
        }

        let mut active: deployable_entities::ActiveModel = existing.into();
        active.name = Set(input.name.clone());
        active.data_ifc_endpoints = Set(encode_endpoints(&input.data_ifc_endpoints)?);
        active.updated_at = Set(Utc::now());
        let entity = active.update(&txn).await?;

        match selector_type {
            EdgeSelectorType::Category => {
                selector_store::save_entity_selector(&txn, entity_id, &input.selector).await?;
            }
            EdgeSelectorType::Explicit => {
                selector_store::clear_entity_selector(&txn, entity_id).await?;
            }
        }

        let resolved =
            edge_resolver::resolve_entity_edges(&txn, tenant_id, entity_id, &scope_input(input))
                .await?;

        claim_out_endpoints(&txn, tenant_id, &input.data_ifc_endpoints, &sources, &owner).await?;

        txn.commit().await?;
        info!(entity_id, "entity updated");
        self.dispatch(tenant_id, entity_id, kind, &resolved);
        Ok(entity)
    }

    /// Delete an entity, releasing its topic claims. Assignment and selector
    /// rows go with the entity row via cascade.
    pub async fn delete_entity(&self, tenant_id: &str, entity_id: &str) -> ScopeResult<()> {
        let txn = self.db.begin().await?;

        let existing = load_entity(&txn, tenant_id, entity_id).await?;
        let kind = parse_entity_kind(&existing)?;
        let owner = claim_owner(kind, entity_id);
        for endpoint in decode_endpoints(&existing.data_ifc_endpoints)? {
            topic_claim_service::unclaim_topic(&txn, &endpoint, &owner).await?;
        }

        deployable_entities::Entity::delete_by_id(entity_id)
            .exec(&txn)
            .await?;

        txn.commit().await?;
        info!(entity_id, "entity deleted");
        self.dispatch(tenant_id, entity_id, kind, &ResolvedEdges::default());
        Ok(())
    }

    pub async fn get_entity(
        &self,
        tenant_id: &str,
        entity_id: &str,
    ) -> ScopeResult<deployable_entities::Model> {
        load_entity(&self.db, tenant_id, entity_id).await
    }

    /// Explicit-mode structural check against the owning project. Returns the
    /// project's selector mode so callers branch without a second load.
    async fn validate_scope_input<C: ConnectionTrait>(
        &self,
        conn: &C,
        tenant_id: &str,
        input: &DeployableEntityInput,
    ) -> ScopeResult<EdgeSelectorType> {
        let project = edge_resolver::load_project(conn, tenant_id, &input.project_id).await?;
        let selector_type = edge_resolver::parse_selector_type(&project)?;
        if selector_type == EdgeSelectorType::Explicit {
            let project_edge_ids =
                edge_resolver::load_project_edge_ids(conn, &input.project_id).await?;
            edge_resolver::validate_explicit_edges(&project_edge_ids, &input.edge_ids)?;
        }
        Ok(selector_type)
    }

    /// Post-commit notification. Fire-and-forget; a failing notifier must not
    /// fail the already-committed operation.
    fn dispatch(
        &self,
        tenant_id: &str,
        entity_id: &str,
        kind: EntityKind,
        resolved: &ResolvedEdges,
    ) {
        let event = ScopeChangeEvent {
            tenant_id: tenant_id.to_string(),
            entity_id: entity_id.to_string(),
            entity_kind: kind,
            deploy_ids: resolved.deploy_ids.clone(),
            undeploy_ids: resolved.undeploy_ids.clone(),
        };
        let notifier = Arc::clone(&self.notifier);
        tokio::spawn(async move {
            if let Err(err) = notifier.scope_changed(event).await {
                warn!(error = %err, "scope change notification failed");
            }
        });
    }
}

fn scope_input(input: &DeployableEntityInput) -> EntityScopeInput {
    EntityScopeInput {
        project_id: input.project_id.clone(),
        selector: input.selector.clone(),
        edge_ids: input.edge_ids.clone(),
        exclude_edge_ids: input.exclude_edge_ids.clone(),
    }
}

fn claim_owner(kind: EntityKind, entity_id: &str) -> ClaimOwner {
    match kind {
        EntityKind::Application => ClaimOwner::Application(entity_id.to_string()),
        EntityKind::DataStream => ClaimOwner::DataStream(entity_id.to_string()),
    }
}

async fn load_entity<C: ConnectionTrait>(
    conn: &C,
    tenant_id: &str,
    entity_id: &str,
) -> ScopeResult<deployable_entities::Model> {
    deployable_entities::Entity::find_by_id(entity_id)
        .filter(deployable_entities::Column::TenantId.eq(tenant_id))
        .one(conn)
        .await?
        .ok_or_else(|| ScopeError::not_found("entity"))
}

fn parse_entity_kind(entity: &deployable_entities::Model) -> ScopeResult<EntityKind> {
    EntityKind::parse(&entity.kind).ok_or_else(|| {
        ScopeError::internal(format!(
            "entity {} has unknown kind {}",
            entity.id, entity.kind
        ))
    })
}

/// Load the data source behind each endpoint. An endpoint whose source does
/// not exist for this tenant cannot be claimed, and a source without a data
/// interface cannot carry endpoints at all.
async fn load_endpoint_sources<C: ConnectionTrait>(
    conn: &C,
    tenant_id: &str,
    endpoints: &[DataIfcEndpoint],
) -> ScopeResult<Vec<data_sources::Model>> {
    if endpoints.is_empty() {
        return Ok(Vec::new());
    }
    let ids: HashSet<&str> = endpoints.iter().map(|e| e.data_source_id.as_str()).collect();
    let rows = data_sources::Entity::find()
        .filter(data_sources::Column::Id.is_in(ids.iter().copied()))
        .filter(data_sources::Column::TenantId.eq(tenant_id))
        .all(conn)
        .await?;
    let found: HashSet<&str> = rows.iter().map(|r| r.id.as_str()).collect();
    for endpoint in endpoints {
        if !found.contains(endpoint.data_source_id.as_str()) {
            return Err(ScopeError::precondition_failed(format!(
                "data source {} does not exist",
                endpoint.data_source_id
            )));
        }
    }
    for row in &rows {
        if row.ifc_kind.as_deref().and_then(IfcKind::parse).is_none() {
            return Err(ScopeError::bad_request(
                "dataIfcEndpoints",
                format!("data source {} has no data interface", row.id),
            ));
        }
    }
    Ok(rows)
}

/// Claim every endpoint backed by an OUT data interface.
async fn claim_out_endpoints<C: ConnectionTrait>(
    conn: &C,
    tenant_id: &str,
    endpoints: &[DataIfcEndpoint],
    sources: &[data_sources::Model],
    owner: &ClaimOwner,
) -> ScopeResult<()> {
    let kinds: HashMap<&str, Option<IfcKind>> = sources
        .iter()
        .map(|s| (s.id.as_str(), s.ifc_kind.as_deref().and_then(IfcKind::parse)))
        .collect();
    for endpoint in endpoints {
        if kinds.get(endpoint.data_source_id.as_str()) == Some(&Some(IfcKind::Out)) {
            topic_claim_service::claim_topic(conn, tenant_id, endpoint, owner).await?;
        }
    }
    Ok(())
}

fn encode_endpoints(endpoints: &[DataIfcEndpoint]) -> ScopeResult<String> {
    serde_json::to_string(endpoints)
        .map_err(|e| ScopeError::internal(format!("failed to encode endpoints: {}", e)))
}

fn decode_endpoints(raw: &str) -> ScopeResult<Vec<DataIfcEndpoint>> {
    serde_json::from_str(raw)
        .map_err(|e| ScopeError::internal(format!("failed to decode endpoints: {}", e)))
}
