use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

/// One selector constraint of a project (Category selector mode).
#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "project_edge_selector")]
pub struct Model {
    #[sea_orm(primary_key)]
    pub id: i32,
    pub project_id: String,
    pub category_value_id: String,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(
        belongs_to = "super::projects::Entity",
        from = "Column::ProjectId",
        to = "super::projects::Column::Id"
    )]
    Projects,
    #[sea_orm(
        belongs_to = "super::category_values::Entity",
        from = "Column::CategoryValueId",
        to = "super::category_values::Column::Id"
    )]
    CategoryValues,
}

impl Related<super::projects::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Projects.def()
    }
}

impl Related<super::category_values::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::CategoryValues.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}
