use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

/// A tenant-defined classification axis, e.g. "environment".
#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "categories")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub id: String,
    pub tenant_id: String,
    pub name: String,
    pub created_at: ChronoDateTimeUtc,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(has_many = "super::category_values::Entity")]
    CategoryValues,
}

impl Related<super::category_values::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::CategoryValues.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}
