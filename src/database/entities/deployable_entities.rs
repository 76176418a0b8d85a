use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

/// A deployable entity: an application or a data stream bound to a project.
///
/// Scoping fields are split across tables: explicit deploy/undeploy
/// assignments live in `entity_edge`, selector constraints in
/// `entity_edge_selector`. The entity's data-interface endpoints are kept on
/// the row itself so update flows can unclaim the previous endpoints.
#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "deployable_entities")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub id: String,
    pub tenant_id: String,
    pub project_id: String,
    pub kind: String, // 'application' or 'data_stream'
    pub name: String,
    #[sea_orm(column_type = "Text", default_value = "[]")]
    pub data_ifc_endpoints: String, // JSON array stored as string
    pub created_at: ChronoDateTimeUtc,
    pub updated_at: ChronoDateTimeUtc,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(
        belongs_to = "super::projects::Entity",
        from = "Column::ProjectId",
        to = "super::projects::Column::Id"
    )]
    Projects,
    #[sea_orm(has_many = "super::entity_edges::Entity")]
    EntityEdges,
    #[sea_orm(has_many = "super::entity_edge_selectors::Entity")]
    EntityEdgeSelectors,
}

impl Related<super::projects::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Projects.def()
    }
}

impl Related<super::entity_edges::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::EntityEdges.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}

/// Discriminator for the two deployable entity flavours
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum EntityKind {
    #[serde(rename = "application")]
    Application,
    #[serde(rename = "data_stream")]
    DataStream,
}

impl EntityKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Application => "application",
            Self::DataStream => "data_stream",
        }
    }

    pub fn parse(value: &str) -> Option<Self> {
        match value {
            "application" => Some(Self::Application),
            "data_stream" => Some(Self::DataStream),
            _ => None,
        }
    }
}

impl From<EntityKind> for String {
    fn from(kind: EntityKind) -> Self {
        kind.as_str().to_string()
    }
}
