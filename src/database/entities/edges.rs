use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

/// An edge cluster: a tenant's deployment target carrying category labels.
#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "edges")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub id: String,
    pub tenant_id: String,
    pub name: String,
    pub created_at: ChronoDateTimeUtc,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(has_many = "super::edge_labels::Entity")]
    EdgeLabels,
}

impl Related<super::edge_labels::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::EdgeLabels.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}
