use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

/// Exclusive ownership of one (tenant, data source, topic) key by a single
/// downstream entity. The unique index over the key enforces the at-most-one
/// invariant at commit time.
#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "topic_claim")]
pub struct Model {
    #[sea_orm(primary_key)]
    pub id: i32,
    pub tenant_id: String,
    pub data_source_id: String,
    pub topic: String,
    pub owner_kind: String, // 'application' or 'data_stream'
    pub owner_id: String,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(
        belongs_to = "super::data_sources::Entity",
        from = "Column::DataSourceId",
        to = "super::data_sources::Column::Id"
    )]
    DataSources,
}

impl Related<super::data_sources::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::DataSources.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}
