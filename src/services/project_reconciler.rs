//! Cascading of project-level edge-configuration changes into the persisted
//! assignments of every entity the project owns.
//!
//! Runs inside the caller's project-update transaction, before the project
//! rows themselves are rewritten, so prior state is read straight from the
//! open transaction. Topic claims are never touched here.

use std::collections::HashMap;

use sea_orm::{ColumnTrait, ConnectionTrait, EntityTrait, QueryFilter};
use tracing::debug;

use crate::category::{EdgeClusterLabels, Selector};
use crate::database::entities::{
    deployable_entities, entity_edge_selectors, entity_edges, project_edges,
    projects::{self, EdgeSelectorType},
};
use crate::errors::{ScopeError, ScopeResult};
use crate::services::{edge_resolver, selector_store};

/// The desired new edge configuration of one project.
#[derive(Clone, Debug)]
pub struct ProjectUpdate {
    pub id: String,
    pub edge_selector_type: EdgeSelectorType,
    /// Explicit mode only.
    pub edge_ids: Vec<String>,
    /// Category mode only.
    pub selector: Selector,
}

/// Re-derive or invalidate the persisted assignments of every entity owned by
/// an updated project. The caller supplies the new project states; prior
/// states are read from the transaction. `edge_labels_snapshot` is optional
/// and loaded on demand when any project stays in Category mode.
pub async fn reconcile_project_edge_change<C: ConnectionTrait>(
    conn: &C,
    tenant_id: &str,
    updated_projects: &[ProjectUpdate],
    edge_labels_snapshot: Option<Vec<EdgeClusterLabels>>,
) -> ScopeResult<()> {
    if updated_projects.is_empty() {
        return Ok(());
    }

    let project_ids: Vec<String> = updated_projects.iter().map(|p| p.id.clone()).collect();
    let prior_rows = projects::Entity::find()
        .filter(projects::Column::Id.is_in(project_ids.clone()))
        .filter(projects::Column::TenantId.eq(tenant_id))
        .all(conn)
        .await?;
    if prior_rows.is_empty() {
        return Err(ScopeError::not_found("project"));
    }
    let prior_projects: HashMap<String, projects::Model> =
        prior_rows.into_iter().map(|p| (p.id.clone(), p)).collect();

    let prior_edge_rows = project_edges::Entity::find()
        .filter(project_edges::Column::ProjectId.is_in(project_ids.clone()))
        .all(conn)
        .await?;
    let mut prior_edge_ids: HashMap<String, Vec<String>> = HashMap::new();
    for row in prior_edge_rows {
        prior_edge_ids
            .entry(row.project_id)
            .or_default()
            .push(row.edge_id);
    }

    let entity_rows = deployable_entities::Entity::find()
        .filter(deployable_entities::Column::ProjectId.is_in(project_ids))
        .all(conn)
        .await?;
    if entity_rows.is_empty() {
        debug!("no entities found under updated projects, nothing to reconcile");
        return Ok(());
    }
    let mut entities_by_project: HashMap<String, Vec<String>> = HashMap::new();
    for row in entity_rows {
        entities_by_project
            .entry(row.project_id)
            .or_default()
            .push(row.id);
    }

    // Entities under projects that stay in Category mode, paired with the
    // project's new selector. Recomputed in one pass at the end.
    let mut category_entities: Vec<(String, Selector)> = Vec::new();

    for update in updated_projects {
        let prior = match prior_projects.get(&update.id) {
            Some(prior) => prior,
            // Only changes to existing projects are handled
            None => continue,
        };
        let entity_ids = match entities_by_project.get(&update.id) {
            Some(ids) => ids.clone(),
            None => continue,
        };
        let prior_type = edge_resolver::parse_selector_type(prior)?;

        if update.edge_selector_type != prior_type {
            // A selector-type flip invalidates every prior assignment
            debug!(
                project_id = %update.id,
                from = prior_type.as_str(),
                to = update.edge_selector_type.as_str(),
                entities = entity_ids.len(),
                "project selector type changed, clearing entity assignments"
            );
            entity_edges::Entity::delete_many()
                .filter(entity_edges::Column::EntityId.is_in(entity_ids.clone()))
                .exec(conn)
                .await?;
            if update.edge_selector_type == EdgeSelectorType::Explicit {
                // Entity selectors are meaningless under an Explicit project
                entity_edge_selectors::Entity::delete_many()
                    .filter(entity_edge_selectors::Column::EntityId.is_in(entity_ids))
                    .exec(conn)
                    .await?;
            }
        } else if update.edge_selector_type == EdgeSelectorType::Category {
            for entity_id in entity_ids {
                category_entities.push((entity_id, update.selector.clone()));
            }
        } else {
            let kept: std::collections::HashSet<&str> =
                update.edge_ids.iter().map(String::as_str).collect();
            let removed: Vec<String> = prior_edge_ids
                .get(&update.id)
                .map(|ids| {
                    ids.iter()
                        .filter(|id| !kept.contains(id.as_str()))
                        .cloned()
                        .collect()
                })
                .unwrap_or_default();
            if !removed.is_empty() {
                debug!(
                    project_id = %update.id,
                    removed = removed.len(),
                    "project removed explicit edges, deleting stale assignments"
                );
                entity_edges::Entity::delete_many()
                    .filter(entity_edges::Column::EntityId.is_in(entity_ids))
                    .filter(entity_edges::Column::EdgeId.is_in(removed))
                    .exec(conn)
                    .await?;
            }
        }
    }

    if category_entities.is_empty() {
        return Ok(());
    }

    let entity_ids: Vec<String> = category_entities.iter().map(|(id, _)| id.clone()).collect();
    let entity_selectors = selector_store::load_entity_selectors(conn, &entity_ids).await?;
    let snapshot = match edge_labels_snapshot {
        Some(snapshot) => snapshot,
        None => selector_store::load_edge_cluster_labels(conn, tenant_id).await?,
    };

    for (entity_id, project_selector) in category_entities {
        let entity_selector = entity_selectors.get(&entity_id).cloned().unwrap_or_default();
        let combined = project_selector.and(&entity_selector);
        let invalid: Vec<String> = snapshot
            .iter()
            .filter(|edge| !combined.matches(&edge.labels))
            .map(|edge| edge.edge_id.clone())
            .collect();
        if !invalid.is_empty() {
            entity_edges::Entity::delete_many()
                .filter(entity_edges::Column::EntityId.eq(entity_id))
                .filter(entity_edges::Column::EdgeId.is_in(invalid))
                .exec(conn)
                .await?;
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::category::CategoryLabel;
    use crate::database::entities::entity_edges::AssignmentState;
    use crate::database::test_utils::{fixtures, setup_test_db};

    async fn assignment_edge_ids(
        db: &sea_orm::DatabaseConnection,
        entity_id: &str,
    ) -> Vec<String> {
        let mut ids: Vec<String> = entity_edges::Entity::find()
            .filter(entity_edges::Column::EntityId.eq(entity_id))
            .all(db)
            .await
            .unwrap()
            .into_iter()
            .map(|r| r.edge_id)
            .collect();
        ids.sort();
        ids
    }

    /// Scenario C: flipping a project from Category to Explicit deletes every
    /// assignment row and every entity selector row under the project.
    #[tokio::test]
    async fn test_selector_type_flip_clears_assignments_and_selectors() {
        let db = setup_test_db().await;
        let env = fixtures::create_category(&db, "env").await;
        let prod = fixtures::create_category_value(&db, &env.id, "prod").await;
        let e1 = fixtures::create_edge(&db, "e1").await;

        let project = fixtures::create_project(&db, EdgeSelectorType::Category).await;
        fixtures::add_project_selector(&db, &project.id, &prod.id).await;
        let entity = fixtures::create_application(&db, &project.id).await;
        fixtures::add_entity_selector(&db, &entity.id, &prod.id).await;
        fixtures::add_entity_edge(&db, &entity.id, &e1.id, AssignmentState::Undeploy).await;

        reconcile_project_edge_change(
            &db,
            fixtures::TENANT,
            &[ProjectUpdate {
                id: project.id.clone(),
                edge_selector_type: EdgeSelectorType::Explicit,
                edge_ids: vec![e1.id.clone()],
                selector: Selector::new(),
            }],
            None,
        )
        .await
        .unwrap();

        assert!(assignment_edge_ids(&db, &entity.id).await.is_empty());
        let selector_rows = entity_edge_selectors::Entity::find()
            .filter(entity_edge_selectors::Column::EntityId.eq(entity.id.clone()))
            .all(&db)
            .await
            .unwrap();
        assert!(selector_rows.is_empty());
    }

    /// Scenario D: removing an edge from an Explicit project deletes every
    /// entity assignment row referencing it, and only those.
    #[tokio::test]
    async fn test_explicit_edge_removal_deletes_stale_assignments() {
        let db = setup_test_db().await;
        let e1 = fixtures::create_edge(&db, "e1").await;
        let e3 = fixtures::create_edge(&db, "e3").await;

        let project = fixtures::create_project(&db, EdgeSelectorType::Explicit).await;
        fixtures::add_project_edge(&db, &project.id, &e1.id).await;
        fixtures::add_project_edge(&db, &project.id, &e3.id).await;
        let a = fixtures::create_application(&db, &project.id).await;
        let s = fixtures::create_data_stream(&db, &project.id).await;
        fixtures::add_entity_edge(&db, &a.id, &e1.id, AssignmentState::Deploy).await;
        fixtures::add_entity_edge(&db, &a.id, &e3.id, AssignmentState::Deploy).await;
        fixtures::add_entity_edge(&db, &s.id, &e3.id, AssignmentState::Deploy).await;

        reconcile_project_edge_change(
            &db,
            fixtures::TENANT,
            &[ProjectUpdate {
                id: project.id.clone(),
                edge_selector_type: EdgeSelectorType::Explicit,
                edge_ids: vec![e1.id.clone()],
                selector: Selector::new(),
            }],
            None,
        )
        .await
        .unwrap();

        assert_eq!(assignment_edge_ids(&db, &a.id).await, vec![e1.id.clone()]);
        assert!(assignment_edge_ids(&db, &s.id).await.is_empty());
    }

    /// A project staying in Category mode prunes exclusions that no longer
    /// match under the new project selector.
    #[tokio::test]
    async fn test_category_recompute_prunes_stale_exclusions() {
        let db = setup_test_db().await;
        let env = fixtures::create_category(&db, "env").await;
        let prod = fixtures::create_category_value(&db, &env.id, "prod").await;
        let dev = fixtures::create_category_value(&db, &env.id, "dev").await;
        let e_prod = fixtures::create_edge(&db, "e-prod").await;
        let e_dev = fixtures::create_edge(&db, "e-dev").await;
        fixtures::label_edge(&db, &e_prod.id, &prod.id).await;
        fixtures::label_edge(&db, &e_dev.id, &dev.id).await;

        let project = fixtures::create_project(&db, EdgeSelectorType::Category).await;
        fixtures::add_project_selector(&db, &project.id, &prod.id).await;
        let entity = fixtures::create_application(&db, &project.id).await;
        // A persisted exclusion of the prod edge, valid under the old selector
        fixtures::add_entity_edge(&db, &entity.id, &e_prod.id, AssignmentState::Undeploy).await;

        // Project selector moves to {env=dev}: the prod exclusion goes stale
        reconcile_project_edge_change(
            &db,
            fixtures::TENANT,
            &[ProjectUpdate {
                id: project.id.clone(),
                edge_selector_type: EdgeSelectorType::Category,
                edge_ids: vec![],
                selector: [CategoryLabel::new(env.id.clone(), "dev")].into_iter().collect(),
            }],
            None,
        )
        .await
        .unwrap();

        assert!(assignment_edge_ids(&db, &entity.id).await.is_empty());
    }

    #[tokio::test]
    async fn test_unrelated_projects_are_untouched() {
        let db = setup_test_db().await;
        let e1 = fixtures::create_edge(&db, "e1").await;
        let updated = fixtures::create_project(&db, EdgeSelectorType::Explicit).await;
        fixtures::add_project_edge(&db, &updated.id, &e1.id).await;
        let other = fixtures::create_project(&db, EdgeSelectorType::Explicit).await;
        fixtures::add_project_edge(&db, &other.id, &e1.id).await;
        let bystander = fixtures::create_application(&db, &other.id).await;
        fixtures::add_entity_edge(&db, &bystander.id, &e1.id, AssignmentState::Deploy).await;

        reconcile_project_edge_change(
            &db,
            fixtures::TENANT,
            &[ProjectUpdate {
                id: updated.id.clone(),
                edge_selector_type: EdgeSelectorType::Explicit,
                edge_ids: vec![],
                selector: Selector::new(),
            }],
            None,
        )
        .await
        .unwrap();

        assert_eq!(
            assignment_edge_ids(&db, &bystander.id).await,
            vec![e1.id.clone()]
        );
    }

    #[tokio::test]
    async fn test_unknown_project_set_is_not_found() {
        let db = setup_test_db().await;
        let err = reconcile_project_edge_change(
            &db,
            fixtures::TENANT,
            &[ProjectUpdate {
                id: "missing".to_string(),
                edge_selector_type: EdgeSelectorType::Explicit,
                edge_ids: vec![],
                selector: Selector::new(),
            }],
            None,
        )
        .await
        .unwrap_err();
        assert!(err.is_not_found());
    }
}
