//! Persistence of selectors as rows referencing `category_values`, and the
//! tenant-wide edge-label snapshot used by resolution.
//!
//! All functions are generic over `ConnectionTrait` so they run inside the
//! caller's transaction.

use std::collections::HashMap;

use sea_orm::{
    ActiveModelTrait, ColumnTrait, ConnectionTrait, EntityTrait, QueryFilter, QueryOrder, Set,
};
use tracing::warn;

use crate::category::{CategoryLabel, EdgeClusterLabels, Selector};
use crate::database::entities::{
    category_values, edge_labels, edges, entity_edge_selectors, project_edge_selectors,
};
use crate::errors::{ScopeError, ScopeResult};

/// Replace an entity's selector rows with the given selector.
/// A constraint whose category value does not exist is `NotFound`.
pub async fn save_entity_selector<C: ConnectionTrait>(
    conn: &C,
    entity_id: &str,
    selector: &Selector,
) -> ScopeResult<()> {
    entity_edge_selectors::Entity::delete_many()
        .filter(entity_edge_selectors::Column::EntityId.eq(entity_id))
        .exec(conn)
        .await?;

    for value_id in resolve_category_value_ids(conn, selector).await? {
        entity_edge_selectors::ActiveModel {
            entity_id: Set(entity_id.to_string()),
            category_value_id: Set(value_id),
            ..Default::default()
        }
        .insert(conn)
        .await?;
    }
    Ok(())
}

/// Delete an entity's selector rows (Explicit-mode entities carry none).
pub async fn clear_entity_selector<C: ConnectionTrait>(
    conn: &C,
    entity_id: &str,
) -> ScopeResult<()> {
    entity_edge_selectors::Entity::delete_many()
        .filter(entity_edge_selectors::Column::EntityId.eq(entity_id))
        .exec(conn)
        .await?;
    Ok(())
}

/// Replace a project's selector rows with the given selector.
pub async fn save_project_selector<C: ConnectionTrait>(
    conn: &C,
    project_id: &str,
    selector: &Selector,
) -> ScopeResult<()> {
    project_edge_selectors::Entity::delete_many()
        .filter(project_edge_selectors::Column::ProjectId.eq(project_id))
        .exec(conn)
        .await?;

    for value_id in resolve_category_value_ids(conn, selector).await? {
        project_edge_selectors::ActiveModel {
            project_id: Set(project_id.to_string()),
            category_value_id: Set(value_id),
            ..Default::default()
        }
        .insert(conn)
        .await?;
    }
    Ok(())
}

pub async fn clear_project_selector<C: ConnectionTrait>(
    conn: &C,
    project_id: &str,
) -> ScopeResult<()> {
    project_edge_selectors::Entity::delete_many()
        .filter(project_edge_selectors::Column::ProjectId.eq(project_id))
        .exec(conn)
        .await?;
    Ok(())
}

pub async fn load_entity_selector<C: ConnectionTrait>(
    conn: &C,
    entity_id: &str,
) -> ScopeResult<Selector> {
    let rows = entity_edge_selectors::Entity::find()
        .filter(entity_edge_selectors::Column::EntityId.eq(entity_id))
        .all(conn)
        .await?;
    let value_ids: Vec<String> = rows.into_iter().map(|r| r.category_value_id).collect();
    let labels = labels_for_value_ids(conn, &value_ids).await?;
    Ok(labels.into_values().collect())
}

/// Bulk-load the selectors of many entities, for reconciliation.
pub async fn load_entity_selectors<C: ConnectionTrait>(
    conn: &C,
    entity_ids: &[String],
) -> ScopeResult<HashMap<String, Selector>> {
    if entity_ids.is_empty() {
        return Ok(HashMap::new());
    }
    let rows = entity_edge_selectors::Entity::find()
        .filter(entity_edge_selectors::Column::EntityId.is_in(entity_ids.iter().cloned()))
        .all(conn)
        .await?;

    let value_ids: Vec<String> = rows.iter().map(|r| r.category_value_id.clone()).collect();
    let labels = labels_for_value_ids(conn, &value_ids).await?;

    let mut selectors: HashMap<String, Selector> = HashMap::new();
    for row in rows {
        if let Some(label) = labels.get(&row.category_value_id) {
            selectors
                .entry(row.entity_id)
                .or_default()
                .extend_label(label.clone());
        }
    }
    Ok(selectors)
}

pub async fn load_project_selector<C: ConnectionTrait>(
    conn: &C,
    project_id: &str,
) -> ScopeResult<Selector> {
    let rows = project_edge_selectors::Entity::find()
        .filter(project_edge_selectors::Column::ProjectId.eq(project_id))
        .all(conn)
        .await?;
    let value_ids: Vec<String> = rows.into_iter().map(|r| r.category_value_id).collect();
    let labels = labels_for_value_ids(conn, &value_ids).await?;
    Ok(labels.into_values().collect())
}

/// Tenant-wide snapshot of every edge cluster and its category labels,
/// ordered by edge ID.
pub async fn load_edge_cluster_labels<C: ConnectionTrait>(
    conn: &C,
    tenant_id: &str,
) -> ScopeResult<Vec<EdgeClusterLabels>> {
    let edge_rows = edges::Entity::find()
        .filter(edges::Column::TenantId.eq(tenant_id))
        .order_by_asc(edges::Column::Id)
        .all(conn)
        .await?;
    if edge_rows.is_empty() {
        return Ok(Vec::new());
    }

    let edge_ids: Vec<String> = edge_rows.iter().map(|e| e.id.clone()).collect();
    let label_rows = edge_labels::Entity::find()
        .filter(edge_labels::Column::EdgeId.is_in(edge_ids))
        .all(conn)
        .await?;

    let value_ids: Vec<String> = label_rows
        .iter()
        .map(|l| l.category_value_id.clone())
        .collect();
    let labels = labels_for_value_ids(conn, &value_ids).await?;

    let mut by_edge: HashMap<String, Vec<CategoryLabel>> = HashMap::new();
    for row in label_rows {
        if let Some(label) = labels.get(&row.category_value_id) {
            by_edge.entry(row.edge_id).or_default().push(label.clone());
        }
    }

    Ok(edge_rows
        .into_iter()
        .map(|e| EdgeClusterLabels {
            labels: by_edge.remove(&e.id).unwrap_or_default(),
            edge_id: e.id,
        })
        .collect())
}

/// Map each selector constraint to its `category_values` row ID.
async fn resolve_category_value_ids<C: ConnectionTrait>(
    conn: &C,
    selector: &Selector,
) -> ScopeResult<Vec<String>> {
    if selector.is_empty() {
        return Ok(Vec::new());
    }
    let category_ids: Vec<String> = selector
        .labels()
        .map(|l| l.category_id.clone())
        .collect();
    let rows = category_values::Entity::find()
        .filter(category_values::Column::CategoryId.is_in(category_ids))
        .all(conn)
        .await?;

    let by_pair: HashMap<(String, String), String> = rows
        .into_iter()
        .map(|r| ((r.category_id, r.value), r.id))
        .collect();

    let mut value_ids = Vec::with_capacity(selector.len());
    for label in selector.labels() {
        let key = (label.category_id.clone(), label.value.clone());
        match by_pair.get(&key) {
            Some(id) => value_ids.push(id.clone()),
            None => {
                return Err(ScopeError::not_found(format!(
                    "category value {}:{}",
                    label.category_id, label.value
                )))
            }
        }
    }
    Ok(value_ids)
}

/// Resolve `category_values` row IDs back to (category, value) labels.
/// Dangling IDs are skipped; foreign keys keep them from occurring outside
/// of concurrent deletes.
async fn labels_for_value_ids<C: ConnectionTrait>(
    conn: &C,
    value_ids: &[String],
) -> ScopeResult<HashMap<String, CategoryLabel>> {
    if value_ids.is_empty() {
        return Ok(HashMap::new());
    }
    let rows = category_values::Entity::find()
        .filter(category_values::Column::Id.is_in(value_ids.iter().cloned()))
        .all(conn)
        .await?;
    if rows.len() < value_ids.len() {
        warn!(
            expected = value_ids.len(),
            found = rows.len(),
            "some category values referenced by selector rows no longer exist"
        );
    }
    Ok(rows
        .into_iter()
        .map(|r| {
            (
                r.id,
                CategoryLabel {
                    category_id: r.category_id,
                    value: r.value,
                },
            )
        })
        .collect())
}
