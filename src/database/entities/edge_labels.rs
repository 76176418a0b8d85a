use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

/// Attachment of a category value to an edge cluster.
#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "edge_label")]
pub struct Model {
    #[sea_orm(primary_key)]
    pub id: i32,
    pub edge_id: String,
    pub category_value_id: String,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(
        belongs_to = "super::edges::Entity",
        from = "Column::EdgeId",
        to = "super::edges::Column::Id"
    )]
    Edges,
    #[sea_orm(
        belongs_to = "super::category_values::Entity",
        from = "Column::CategoryValueId",
        to = "super::category_values::Column::Id"
    )]
    CategoryValues,
}

impl Related<super::edges::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Edges.def()
    }
}

impl Related<super::category_values::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::CategoryValues.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}
