//! Edge resolution: computing an entity's deploy/undeploy edge sets from its
//! owning project's selector mode.
//!
//! Resolution returns a `ResolvedEdges` value instead of mutating the caller's
//! entity, so callers persist exactly what was resolved.

use std::collections::HashSet;

use sea_orm::{
    ActiveModelTrait, ColumnTrait, ConnectionTrait, EntityTrait, QueryFilter, Set,
};
use tracing::debug;

use crate::category::{EdgeClusterLabels, Selector};
use crate::database::entities::{
    entity_edges::{self, AssignmentState},
    project_edges,
    projects::{self, EdgeSelectorType},
};
use crate::errors::{ScopeError, ScopeResult};
use crate::services::selector_store;

/// The scoping fields of a deployable entity, as supplied by the caller.
#[derive(Clone, Debug, Default)]
pub struct EntityScopeInput {
    pub project_id: String,
    /// Only meaningful when the owning project is in Category mode.
    pub selector: Selector,
    /// Only meaningful when the owning project is in Explicit mode.
    pub edge_ids: Vec<String>,
    pub exclude_edge_ids: Vec<String>,
}

/// A resolved assignment: which edges the entity deploys to and which it is
/// explicitly withheld from. Both lists are sorted and duplicate-free.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct ResolvedEdges {
    pub deploy_ids: Vec<String>,
    pub undeploy_ids: Vec<String>,
}

/// Resolve an entity's edge sets against its owning project.
pub async fn resolve<C: ConnectionTrait>(
    conn: &C,
    tenant_id: &str,
    input: &EntityScopeInput,
) -> ScopeResult<ResolvedEdges> {
    let project = load_project(conn, tenant_id, &input.project_id).await?;
    let selector_type = parse_selector_type(&project)?;

    match selector_type {
        EdgeSelectorType::Explicit => Ok(resolve_explicit_edges(
            &input.edge_ids,
            &input.exclude_edge_ids,
        )),
        EdgeSelectorType::Category => {
            let project_selector = selector_store::load_project_selector(conn, &project.id).await?;
            let combined = project_selector.and(&input.selector);
            let snapshot = selector_store::load_edge_cluster_labels(conn, tenant_id).await?;
            Ok(resolve_category_edges(
                &combined,
                &input.exclude_edge_ids,
                &snapshot,
            ))
        }
    }
}

/// Explicit mode: deploy the unique explicit IDs, with excluded IDs moved to
/// the undeploy set (exclude overrides deploy on conflict).
pub fn resolve_explicit_edges(edge_ids: &[String], exclude_edge_ids: &[String]) -> ResolvedEdges {
    let undeploy_ids = unique(exclude_edge_ids);
    let exclude_set: HashSet<&str> = undeploy_ids.iter().map(String::as_str).collect();
    let deploy_ids = unique(edge_ids)
        .into_iter()
        .filter(|id| !exclude_set.contains(id.as_str()))
        .collect();
    sorted(ResolvedEdges {
        deploy_ids,
        undeploy_ids,
    })
}

/// Category mode: match the combined selector against the tenant's edge
/// labels. Exclusion IDs outside the matched set are silently dropped, so
/// invalid excludes never persist.
pub fn resolve_category_edges(
    combined: &Selector,
    exclude_edge_ids: &[String],
    snapshot: &[EdgeClusterLabels],
) -> ResolvedEdges {
    let exclude_set: HashSet<&str> = exclude_edge_ids.iter().map(String::as_str).collect();
    let mut deploy_ids = Vec::new();
    let mut undeploy_ids = Vec::new();
    for edge in snapshot {
        if combined.matches(&edge.labels) {
            if exclude_set.contains(edge.edge_id.as_str()) {
                undeploy_ids.push(edge.edge_id.clone());
            } else {
                deploy_ids.push(edge.edge_id.clone());
            }
        }
    }
    sorted(ResolvedEdges {
        deploy_ids,
        undeploy_ids,
    })
}

/// Explicit-mode structural check: every entity edge ID must be part of the
/// project's edge set. Run by callers before resolution.
pub fn validate_explicit_edges(
    project_edge_ids: &[String],
    entity_edge_ids: &[String],
) -> ScopeResult<()> {
    let known: HashSet<&str> = project_edge_ids.iter().map(String::as_str).collect();
    let bad: Vec<&str> = entity_edge_ids
        .iter()
        .map(String::as_str)
        .filter(|id| !known.contains(id))
        .collect();
    if bad.is_empty() {
        Ok(())
    } else {
        Err(ScopeError::bad_request(
            "edgeIds",
            format!("edges with IDs {} are not part of the project", bad.join(", ")),
        ))
    }
}

/// Replace the entity's persisted assignment rows with the resolved sets.
pub async fn persist<C: ConnectionTrait>(
    conn: &C,
    entity_id: &str,
    resolved: &ResolvedEdges,
) -> ScopeResult<()> {
    entity_edges::Entity::delete_many()
        .filter(entity_edges::Column::EntityId.eq(entity_id))
        .exec(conn)
        .await?;

    for edge_id in &resolved.deploy_ids {
        insert_assignment(conn, entity_id, edge_id, AssignmentState::Deploy).await?;
    }
    for edge_id in &resolved.undeploy_ids {
        insert_assignment(conn, entity_id, edge_id, AssignmentState::Undeploy).await?;
    }
    Ok(())
}

/// Resolve and persist in one step, inside the caller's transaction.
pub async fn resolve_entity_edges<C: ConnectionTrait>(
    conn: &C,
    tenant_id: &str,
    entity_id: &str,
    input: &EntityScopeInput,
) -> ScopeResult<ResolvedEdges> {
    let resolved = resolve(conn, tenant_id, input).await?;
    debug!(
        entity_id,
        deploy = resolved.deploy_ids.len(),
        undeploy = resolved.undeploy_ids.len(),
        "resolved entity edges"
    );
    persist(conn, entity_id, &resolved).await?;
    Ok(resolved)
}

pub async fn load_project<C: ConnectionTrait>(
    conn: &C,
    tenant_id: &str,
    project_id: &str,
) -> ScopeResult<projects::Model> {
    projects::Entity::find_by_id(project_id)
        .filter(projects::Column::TenantId.eq(tenant_id))
        .one(conn)
        .await?
        .ok_or_else(|| ScopeError::not_found("project"))
}

pub async fn load_project_edge_ids<C: ConnectionTrait>(
    conn: &C,
    project_id: &str,
) -> ScopeResult<Vec<String>> {
    let rows = project_edges::Entity::find()
        .filter(project_edges::Column::ProjectId.eq(project_id))
        .all(conn)
        .await?;
    Ok(rows.into_iter().map(|r| r.edge_id).collect())
}

pub fn parse_selector_type(project: &projects::Model) -> ScopeResult<EdgeSelectorType> {
    EdgeSelectorType::parse(&project.edge_selector_type).ok_or_else(|| {
        ScopeError::internal(format!(
            "project {} has unknown edge selector type {}",
            project.id, project.edge_selector_type
        ))
    })
}

async fn insert_assignment<C: ConnectionTrait>(
    conn: &C,
    entity_id: &str,
    edge_id: &str,
    state: AssignmentState,
) -> ScopeResult<()> {
    entity_edges::ActiveModel {
        entity_id: Set(entity_id.to_string()),
        edge_id: Set(edge_id.to_string()),
        state: Set(state.as_str().to_string()),
        ..Default::default()
    }
    .insert(conn)
    .await?;
    Ok(())
}

fn unique(ids: &[String]) -> Vec<String> {
    let mut seen = HashSet::new();
    ids.iter()
        .filter(|id| seen.insert(id.as_str()))
        .cloned()
        .collect()
}

fn sorted(mut resolved: ResolvedEdges) -> ResolvedEdges {
    resolved.deploy_ids.sort();
    resolved.undeploy_ids.sort();
    resolved
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::category::CategoryLabel;
    use crate::database::test_utils::{fixtures, setup_test_db};

    fn ids(values: &[&str]) -> Vec<String> {
        values.iter().map(|s| s.to_string()).collect()
    }

    #[test]
    fn test_explicit_mode_exclude_overrides_deploy() {
        let resolved = resolve_explicit_edges(&ids(&["e1", "e2", "e1"]), &ids(&["e2", "e3"]));
        assert_eq!(resolved.deploy_ids, ids(&["e1"]));
        assert_eq!(resolved.undeploy_ids, ids(&["e2", "e3"]));
    }

    #[test]
    fn test_explicit_mode_no_excludes() {
        let resolved = resolve_explicit_edges(&ids(&["e2", "e1"]), &[]);
        assert_eq!(resolved.deploy_ids, ids(&["e1", "e2"]));
        assert!(resolved.undeploy_ids.is_empty());
    }

    #[test]
    fn test_validate_explicit_edges() {
        assert!(validate_explicit_edges(&ids(&["e1", "e2"]), &ids(&["e1"])).is_ok());
        let err = validate_explicit_edges(&ids(&["e1"]), &ids(&["e1", "e9"])).unwrap_err();
        assert!(err.is_bad_request());
    }

    #[tokio::test]
    async fn test_missing_project_is_not_found() {
        let db = setup_test_db().await;
        let input = EntityScopeInput {
            project_id: "nope".to_string(),
            ..Default::default()
        };
        let err = resolve(&db, fixtures::TENANT, &input).await.unwrap_err();
        assert!(err.is_not_found());
    }

    /// Scenario A: project selects {env=prod}; E1 is prod, E2 is dev. An
    /// entity with an empty selector deploys to E1 only, and excluding E2
    /// persists nothing because E2 is not in the matched set.
    #[tokio::test]
    async fn test_category_mode_invalid_exclude_is_dropped() {
        let db = setup_test_db().await;
        let env = fixtures::create_category(&db, "env").await;
        let prod = fixtures::create_category_value(&db, &env.id, "prod").await;
        let dev = fixtures::create_category_value(&db, &env.id, "dev").await;
        let e1 = fixtures::create_edge(&db, "e1").await;
        let e2 = fixtures::create_edge(&db, "e2").await;
        fixtures::label_edge(&db, &e1.id, &prod.id).await;
        fixtures::label_edge(&db, &e2.id, &dev.id).await;

        let project = fixtures::create_project(&db, EdgeSelectorType::Category).await;
        fixtures::add_project_selector(&db, &project.id, &prod.id).await;

        let input = EntityScopeInput {
            project_id: project.id.clone(),
            exclude_edge_ids: vec![e2.id.clone()],
            ..Default::default()
        };
        let resolved = resolve(&db, fixtures::TENANT, &input).await.unwrap();
        assert_eq!(resolved.deploy_ids, vec![e1.id.clone()]);
        assert!(resolved.undeploy_ids.is_empty());
    }

    #[tokio::test]
    async fn test_category_mode_valid_exclude_moves_to_undeploy() {
        let db = setup_test_db().await;
        let env = fixtures::create_category(&db, "env").await;
        let prod = fixtures::create_category_value(&db, &env.id, "prod").await;
        let e1 = fixtures::create_edge(&db, "e1").await;
        fixtures::label_edge(&db, &e1.id, &prod.id).await;

        let project = fixtures::create_project(&db, EdgeSelectorType::Category).await;
        fixtures::add_project_selector(&db, &project.id, &prod.id).await;

        let input = EntityScopeInput {
            project_id: project.id.clone(),
            exclude_edge_ids: vec![e1.id.clone()],
            ..Default::default()
        };
        let resolved = resolve(&db, fixtures::TENANT, &input).await.unwrap();
        assert!(resolved.deploy_ids.is_empty());
        assert_eq!(resolved.undeploy_ids, vec![e1.id.clone()]);
    }

    #[tokio::test]
    async fn test_category_mode_entity_selector_narrows_project_selector() {
        let db = setup_test_db().await;
        let env = fixtures::create_category(&db, "env").await;
        let region = fixtures::create_category(&db, "region").await;
        let prod = fixtures::create_category_value(&db, &env.id, "prod").await;
        let us = fixtures::create_category_value(&db, &region.id, "us").await;

        let e1 = fixtures::create_edge(&db, "e1").await;
        let e2 = fixtures::create_edge(&db, "e2").await;
        fixtures::label_edge(&db, &e1.id, &prod.id).await;
        fixtures::label_edge(&db, &e1.id, &us.id).await;
        fixtures::label_edge(&db, &e2.id, &prod.id).await;

        let project = fixtures::create_project(&db, EdgeSelectorType::Category).await;
        fixtures::add_project_selector(&db, &project.id, &prod.id).await;

        let input = EntityScopeInput {
            project_id: project.id.clone(),
            selector: [CategoryLabel::new(region.id.clone(), "us")]
                .into_iter()
                .collect(),
            ..Default::default()
        };
        let resolved = resolve(&db, fixtures::TENANT, &input).await.unwrap();
        assert_eq!(resolved.deploy_ids, vec![e1.id.clone()]);
    }

    #[tokio::test]
    async fn test_category_mode_empty_selectors_match_all_tenant_edges() {
        let db = setup_test_db().await;
        let e1 = fixtures::create_edge(&db, "e1").await;
        let e2 = fixtures::create_edge(&db, "e2").await;
        let project = fixtures::create_project(&db, EdgeSelectorType::Category).await;

        let input = EntityScopeInput {
            project_id: project.id.clone(),
            ..Default::default()
        };
        let resolved = resolve(&db, fixtures::TENANT, &input).await.unwrap();
        let mut expected = vec![e1.id, e2.id];
        expected.sort();
        assert_eq!(resolved.deploy_ids, expected);
    }

    #[tokio::test]
    async fn test_resolution_is_idempotent() {
        let db = setup_test_db().await;
        let env = fixtures::create_category(&db, "env").await;
        let prod = fixtures::create_category_value(&db, &env.id, "prod").await;
        let e1 = fixtures::create_edge(&db, "e1").await;
        fixtures::label_edge(&db, &e1.id, &prod.id).await;
        let project = fixtures::create_project(&db, EdgeSelectorType::Category).await;
        fixtures::add_project_selector(&db, &project.id, &prod.id).await;

        let input = EntityScopeInput {
            project_id: project.id.clone(),
            ..Default::default()
        };
        let first = resolve(&db, fixtures::TENANT, &input).await.unwrap();
        let second = resolve(&db, fixtures::TENANT, &input).await.unwrap();
        assert_eq!(first, second);
    }

    #[tokio::test]
    async fn test_persist_replaces_prior_assignments() {
        let db = setup_test_db().await;
        let project = fixtures::create_project(&db, EdgeSelectorType::Explicit).await;
        let entity = fixtures::create_application(&db, &project.id).await;
        let e1 = fixtures::create_edge(&db, "e1").await;
        let e2 = fixtures::create_edge(&db, "e2").await;

        persist(
            &db,
            &entity.id,
            &ResolvedEdges {
                deploy_ids: vec![e1.id.clone()],
                undeploy_ids: vec![],
            },
        )
        .await
        .unwrap();

        persist(
            &db,
            &entity.id,
            &ResolvedEdges {
                deploy_ids: vec![e2.id.clone()],
                undeploy_ids: vec![e1.id.clone()],
            },
        )
        .await
        .unwrap();

        let rows = entity_edges::Entity::find()
            .filter(entity_edges::Column::EntityId.eq(entity.id.clone()))
            .all(&db)
            .await
            .unwrap();
        assert_eq!(rows.len(), 2);
        let deploy: Vec<_> = rows
            .iter()
            .filter(|r| r.state == AssignmentState::Deploy.as_str())
            .map(|r| r.edge_id.clone())
            .collect();
        let undeploy: Vec<_> = rows
            .iter()
            .filter(|r| r.state == AssignmentState::Undeploy.as_str())
            .map(|r| r.edge_id.clone())
            .collect();
        assert_eq!(deploy, vec![e2.id.clone()]);
        assert_eq!(undeploy, vec![e1.id.clone()]);
    }
}
