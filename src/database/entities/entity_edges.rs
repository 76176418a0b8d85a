use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

/// A persisted edge assignment: one entity-to-edge row in Deploy or Undeploy
/// state. Unique per (entity_id, edge_id).
#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "entity_edge")]
pub struct Model {
    #[sea_orm(primary_key)]
    pub id: i32,
    pub entity_id: String,
    pub edge_id: String,
    pub state: String, // 'deploy' or 'undeploy'
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(
        belongs_to = "super::deployable_entities::Entity",
        from = "Column::EntityId",
        to = "super::deployable_entities::Column::Id"
    )]
    DeployableEntities,
    #[sea_orm(
        belongs_to = "super::edges::Entity",
        from = "Column::EdgeId",
        to = "super::edges::Column::Id"
    )]
    Edges,
}

impl Related<super::deployable_entities::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::DeployableEntities.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}

/// The two persisted states of an entity-to-edge assignment
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum AssignmentState {
    #[serde(rename = "deploy")]
    Deploy,
    #[serde(rename = "undeploy")]
    Undeploy,
}

impl AssignmentState {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Deploy => "deploy",
            Self::Undeploy => "undeploy",
        }
    }

    pub fn parse(value: &str) -> Option<Self> {
        match value {
            "deploy" => Some(Self::Deploy),
            "undeploy" => Some(Self::Undeploy),
            _ => None,
        }
    }
}

impl From<AssignmentState> for String {
    fn from(state: AssignmentState) -> Self {
        state.as_str().to_string()
    }
}
