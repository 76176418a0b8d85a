//! Project lifecycle and project-level edge configuration changes.
//!
//! Changing a project's edge configuration reconciles every entity under the
//! project in the same transaction, so entity assignments never outlive the
//! project state that justified them.

use chrono::Utc;
use sea_orm::{
    ActiveModelTrait, ColumnTrait, ConnectionTrait, DatabaseConnection, EntityTrait, QueryFilter,
    Set, TransactionTrait,
};
use tracing::info;
use uuid::Uuid;

use crate::category::Selector;
use crate::database::entities::projects::{self, EdgeSelectorType};
use crate::database::entities::project_edges;
use crate::errors::{ScopeError, ScopeResult};
use crate::services::project_reconciler::{self, ProjectUpdate};
use crate::services::selector_store;

/// A project's desired edge configuration.
#[derive(Clone, Debug)]
pub struct ProjectEdgeConfigInput {
    pub edge_selector_type: EdgeSelectorType,
    /// Explicit mode only.
    pub edge_ids: Vec<String>,
    /// Category mode only.
    pub selector: Selector,
}

pub struct ProjectService {
    db: DatabaseConnection,
}

impl ProjectService {
    pub fn new(db: DatabaseConnection) -> Self {
        Self { db }
    }

    pub async fn create_project(
        &self,
        tenant_id: &str,
        name: &str,
        config: &ProjectEdgeConfigInput,
    ) -> ScopeResult<projects::Model> {
        let txn = self.db.begin().await?;

        let now = Utc::now();
        let project = projects::ActiveModel {
            id: Set(Uuid::new_v4().to_string()),
            tenant_id: Set(tenant_id.to_string()),
            name: Set(name.to_string()),
            edge_selector_type: Set(config.edge_selector_type.as_str().to_string()),
            created_at: Set(now),
            updated_at: Set(now),
        }
        .insert(&txn)
        .await?;

        apply_edge_config(&txn, &project.id, config).await?;

        txn.commit().await?;
        info!(project_id = %project.id, "project created");
        Ok(project)
    }

    /// Replace a project's edge configuration, reconciling entity assignments
    /// first so the reconciler still sees the prior project state.
    pub async fn update_project_edge_config(
        &self,
        tenant_id: &str,
        project_id: &str,
        config: &ProjectEdgeConfigInput,
    ) -> ScopeResult<projects::Model> {
        let txn = self.db.begin().await?;

        let existing = projects::Entity::find_by_id(project_id)
            .filter(projects::Column::TenantId.eq(tenant_id))
            .one(&txn)
            .await?
            .ok_or_else(|| ScopeError::not_found("project"))?;

        let update = ProjectUpdate {
            id: existing.id.clone(),
            edge_selector_type: config.edge_selector_type,
            edge_ids: config.edge_ids.clone(),
            selector: config.selector.clone(),
        };
        project_reconciler::reconcile_project_edge_change(&txn, tenant_id, &[update], None).await?;

        let mut active: projects::ActiveModel = existing.into();
        active.edge_selector_type = Set(config.edge_selector_type.as_str().to_string());
        active.updated_at = Set(Utc::now());
        let project = active.update(&txn).await?;

        apply_edge_config(&txn, project_id, config).await?;

        txn.commit().await?;
        info!(
            project_id,
            selector_type = config.edge_selector_type.as_str(),
            "project edge configuration updated"
        );
        Ok(project)
    }

    pub async fn get_project(
        &self,
        tenant_id: &str,
        project_id: &str,
    ) -> ScopeResult<projects::Model> {
        projects::Entity::find_by_id(project_id)
            .filter(projects::Column::TenantId.eq(tenant_id))
            .one(&self.db)
            .await?
            .ok_or_else(|| ScopeError::not_found("project"))
    }
}

/// Write the membership rows for a project's mode: edge rows for Explicit,
/// selector rows for Category, each clearing the other's.
async fn apply_edge_config<C: ConnectionTrait>(
    conn: &C,
    project_id: &str,
    config: &ProjectEdgeConfigInput,
) -> ScopeResult<()> {
    project_edges::Entity::delete_many()
        .filter(project_edges::Column::ProjectId.eq(project_id))
        .exec(conn)
        .await?;

    match config.edge_selector_type {
        EdgeSelectorType::Explicit => {
            selector_store::clear_project_selector(conn, project_id).await?;
            for edge_id in &config.edge_ids {
                project_edges::ActiveModel {
                    project_id: Set(project_id.to_string()),
                    edge_id: Set(edge_id.clone()),
                    ..Default::default()
                }
                .insert(conn)
                .await?;
            }
        }
        EdgeSelectorType::Category => {
            selector_store::save_project_selector(conn, project_id, &config.selector).await?;
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::category::CategoryLabel;
    use crate::database::entities::{entity_edge_selectors, entity_edges};
    use crate::database::entities::entity_edges::AssignmentState;
    use crate::database::test_utils::{fixtures, setup_test_db};

    fn explicit(edge_ids: Vec<String>) -> ProjectEdgeConfigInput {
        ProjectEdgeConfigInput {
            edge_selector_type: EdgeSelectorType::Explicit,
            edge_ids,
            selector: Selector::new(),
        }
    }

    fn category(selector: Selector) -> ProjectEdgeConfigInput {
        ProjectEdgeConfigInput {
            edge_selector_type: EdgeSelectorType::Category,
            edge_ids: vec![],
            selector,
        }
    }

    #[tokio::test]
    async fn test_create_explicit_project_persists_edge_rows() {
        let db = setup_test_db().await;
        let svc = ProjectService::new(db.clone());
        let e1 = fixtures::create_edge(&db, "e1").await;

        let project = svc
            .create_project(fixtures::TENANT, "p", &explicit(vec![e1.id.clone()]))
            .await
            .unwrap();

        let rows = project_edges::Entity::find()
            .filter(project_edges::Column::ProjectId.eq(project.id.clone()))
            .all(&db)
            .await
            .unwrap();
        assert_eq!(rows.len(), 1);
        assert_eq!(rows[0].edge_id, e1.id);
    }

    #[tokio::test]
    async fn test_create_category_project_persists_selector() {
        let db = setup_test_db().await;
        let svc = ProjectService::new(db.clone());
        let env = fixtures::create_category(&db, "env").await;
        fixtures::create_category_value(&db, &env.id, "prod").await;

        let selector: Selector = [CategoryLabel::new(env.id.clone(), "prod")]
            .into_iter()
            .collect();
        let project = svc
            .create_project(fixtures::TENANT, "p", &category(selector.clone()))
            .await
            .unwrap();

        let loaded = selector_store::load_project_selector(&db, &project.id)
            .await
            .unwrap();
        assert_eq!(loaded, selector);
    }

    #[tokio::test]
    async fn test_mode_flip_reconciles_entities() {
        let db = setup_test_db().await;
        let svc = ProjectService::new(db.clone());
        let e1 = fixtures::create_edge(&db, "e1").await;
        let env = fixtures::create_category(&db, "env").await;
        fixtures::create_category_value(&db, &env.id, "prod").await;

        let project = svc
            .create_project(fixtures::TENANT, "p", &explicit(vec![e1.id.clone()]))
            .await
            .unwrap();
        let entity = fixtures::create_application(&db, &project.id).await;
        fixtures::add_entity_edge(&db, &entity.id, &e1.id, AssignmentState::Deploy).await;

        let selector: Selector = [CategoryLabel::new(env.id.clone(), "prod")]
            .into_iter()
            .collect();
        let updated = svc
            .update_project_edge_config(fixtures::TENANT, &project.id, &category(selector))
            .await
            .unwrap();
        assert_eq!(updated.edge_selector_type, "category");

        // Prior explicit assignments are gone
        let rows = entity_edges::Entity::find()
            .filter(entity_edges::Column::EntityId.eq(entity.id.clone()))
            .all(&db)
            .await
            .unwrap();
        assert!(rows.is_empty());
        // Selector rows replaced the edge rows
        assert_eq!(
            selector_store::load_project_selector(&db, &project.id)
                .await
                .unwrap()
                .len(),
            1
        );
        assert!(project_edges::Entity::find()
            .filter(project_edges::Column::ProjectId.eq(project.id.clone()))
            .all(&db)
            .await
            .unwrap()
            .is_empty());
    }

    #[tokio::test]
    async fn test_flip_to_explicit_clears_entity_selectors() {
        let db = setup_test_db().await;
        let svc = ProjectService::new(db.clone());
        let env = fixtures::create_category(&db, "env").await;
        let prod = fixtures::create_category_value(&db, &env.id, "prod").await;
        let selector: Selector = [CategoryLabel::new(env.id.clone(), "prod")]
            .into_iter()
            .collect();

        let project = svc
            .create_project(fixtures::TENANT, "p", &category(selector))
            .await
            .unwrap();
        let entity = fixtures::create_application(&db, &project.id).await;
        fixtures::add_entity_selector(&db, &entity.id, &prod.id).await;

        svc.update_project_edge_config(fixtures::TENANT, &project.id, &explicit(vec![]))
            .await
            .unwrap();

        let rows = entity_edge_selectors::Entity::find()
            .filter(entity_edge_selectors::Column::EntityId.eq(entity.id.clone()))
            .all(&db)
            .await
            .unwrap();
        assert!(rows.is_empty());
    }

    #[tokio::test]
    async fn test_explicit_edge_removal_prunes_entity_assignments() {
        let db = setup_test_db().await;
        let svc = ProjectService::new(db.clone());
        let e1 = fixtures::create_edge(&db, "e1").await;
        let e2 = fixtures::create_edge(&db, "e2").await;

        let project = svc
            .create_project(
                fixtures::TENANT,
                "p",
                &explicit(vec![e1.id.clone(), e2.id.clone()]),
            )
            .await
            .unwrap();
        let entity = fixtures::create_application(&db, &project.id).await;
        fixtures::add_entity_edge(&db, &entity.id, &e1.id, AssignmentState::Deploy).await;
        fixtures::add_entity_edge(&db, &entity.id, &e2.id, AssignmentState::Deploy).await;

        svc.update_project_edge_config(
            fixtures::TENANT,
            &project.id,
            &explicit(vec![e1.id.clone()]),
        )
        .await
        .unwrap();

        let rows = entity_edges::Entity::find()
            .filter(entity_edges::Column::EntityId.eq(entity.id.clone()))
            .all(&db)
            .await
            .unwrap();
        assert_eq!(rows.len(), 1);
        assert_eq!(rows[0].edge_id, e1.id);
    }

    #[tokio::test]
    async fn test_update_missing_project_is_not_found() {
        let db = setup_test_db().await;
        let svc = ProjectService::new(db.clone());
        let err = svc
            .update_project_edge_config(fixtures::TENANT, "missing", &explicit(vec![]))
            .await
            .unwrap_err();
        assert!(err.is_not_found());
    }
}
