use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

/// One selector constraint of a deployable entity. Only meaningful while the
/// owning project is in Category selector mode.
#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "entity_edge_selector")]
pub struct Model {
    #[sea_orm(primary_key)]
    pub id: i32,
    pub entity_id: String,
    pub category_value_id: String,
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
        belongs_to = "super::category_values::Entity",
        from = "Column::CategoryValueId",
        to = "super::category_values::Column::Id"
    )]
    CategoryValues,
}

impl Related<super::deployable_entities::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::DeployableEntities.def()
    }
}

impl Related<super::category_values::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::CategoryValues.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}
