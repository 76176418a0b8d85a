use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

/// A sensor or data interface producing topics that downstream entities may
/// claim. `ifc_kind` is set only for data interfaces.
#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "data_sources")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub id: String,
    pub tenant_id: String,
    pub name: String,
    pub ifc_kind: Option<String>, // 'in' or 'out' when a data interface
    pub created_at: ChronoDateTimeUtc,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(has_many = "super::data_source_fields::Entity")]
    DataSourceFields,
    #[sea_orm(has_many = "super::topic_claims::Entity")]
    TopicClaims,
}

impl Related<super::data_source_fields::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::DataSourceFields.def()
    }
}

impl Related<super::topic_claims::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::TopicClaims.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}

/// Direction of a data interface
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum IfcKind {
    #[serde(rename = "in")]
    In,
    #[serde(rename = "out")]
    Out,
}

impl IfcKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::In => "in",
            Self::Out => "out",
        }
    }

    pub fn parse(value: &str) -> Option<Self> {
        match value {
            "in" => Some(Self::In),
            "out" => Some(Self::Out),
            _ => None,
        }
    }
}

impl From<IfcKind> for String {
    fn from(kind: IfcKind) -> Self {
        kind.as_str().to_string()
    }
}
