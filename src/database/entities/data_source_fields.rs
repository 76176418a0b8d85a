use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

/// A named field on a data source, bound to an MQTT topic. OUT-kind fields
/// are created the first time a topic is claimed and removed on unclaim.
#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "data_source_field")]
pub struct Model {
    #[sea_orm(primary_key)]
    pub id: i32,
    pub data_source_id: String,
    pub name: String,
    pub mqtt_topic: String,
    pub field_type: String, // 'out' for claim-created fields
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
