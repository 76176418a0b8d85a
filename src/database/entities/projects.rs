use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

/// A tenant's project: the scoping boundary for deployable entities.
///
/// `edge_selector_type` decides how the project (and everything under it)
/// selects edge clusters: an explicit edge list, or category-label matching.
#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "projects")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub id: String,
    pub tenant_id: String,
    pub name: String,
    pub edge_selector_type: String, // 'explicit' or 'category'
    pub created_at: ChronoDateTimeUtc,
    pub updated_at: ChronoDateTimeUtc,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(has_many = "super::deployable_entities::Entity")]
    DeployableEntities,
    #[sea_orm(has_many = "super::project_edges::Entity")]
    ProjectEdges,
    #[sea_orm(has_many = "super::project_edge_selectors::Entity")]
    ProjectEdgeSelectors,
}

impl Related<super::deployable_entities::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::DeployableEntities.def()
    }
}

impl Related<super::project_edges::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::ProjectEdges.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}

/// How a project selects its edge clusters
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum EdgeSelectorType {
    #[serde(rename = "explicit")]
    Explicit,
    #[serde(rename = "category")]
    Category,
}

impl EdgeSelectorType {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Explicit => "explicit",
            Self::Category => "category",
        }
    }

    pub fn parse(value: &str) -> Option<Self> {
        match value {
            "explicit" => Some(Self::Explicit),
            "category" => Some(Self::Category),
            _ => None,
        }
    }
}

impl From<EdgeSelectorType> for String {
    fn from(selector_type: EdgeSelectorType) -> Self {
        selector_type.as_str().to_string()
    }
}
