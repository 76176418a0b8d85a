//! Exclusive topic-claim arbitration.
//!
//! A claim binds one `(tenant, data source, topic)` key to exactly one owner.
//! Claiming and unclaiming run on the caller's transaction so a failed entity
//! write never leaks a claim; true exclusiveness under concurrency comes from
//! the unique index over the claim key, surfacing as a unique-constraint
//! violation at insert time.

use sea_orm::{ActiveModelTrait, ColumnTrait, ConnectionTrait, EntityTrait, QueryFilter, Set};
use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

use crate::database::entities::data_sources::{self, IfcKind};
use crate::database::entities::deployable_entities::EntityKind;
use crate::database::entities::{data_source_fields, topic_claims};
use crate::errors::{ScopeError, ScopeResult};

/// The holder of a topic claim. Kind and ID travel together so two owner
/// namespaces can never be conflated.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum ClaimOwner {
    Application(String),
    DataStream(String),
}

impl ClaimOwner {
    pub fn kind(&self) -> EntityKind {
        match self {
            Self::Application(_) => EntityKind::Application,
            Self::DataStream(_) => EntityKind::DataStream,
        }
    }

    pub fn owner_id(&self) -> &str {
        match self {
            Self::Application(id) | Self::DataStream(id) => id,
        }
    }
}

/// A data-interface endpoint an entity consumes or produces.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct DataIfcEndpoint {
    #[serde(rename = "dataSourceId")]
    pub data_source_id: String,
    pub name: String,
    pub topic: String,
}

/// Claim an endpoint's topic on its data source for the given owner.
///
/// Ensures an OUT field named after the endpoint exists on the data source,
/// then takes the claim row. Re-claiming an already-held topic is a no-op;
/// a topic held by anyone else is a precondition failure.
pub async fn claim_topic<C: ConnectionTrait>(
    conn: &C,
    tenant_id: &str,
    endpoint: &DataIfcEndpoint,
    owner: &ClaimOwner,
) -> ScopeResult<()> {
    ensure_out_field(conn, endpoint).await?;

    let existing = topic_claims::Entity::find()
        .filter(topic_claims::Column::TenantId.eq(tenant_id))
        .filter(topic_claims::Column::DataSourceId.eq(endpoint.data_source_id.as_str()))
        .filter(topic_claims::Column::Topic.eq(endpoint.topic.as_str()))
        .all(conn)
        .await?;

    match existing.len() {
        0 => {
            topic_claims::ActiveModel {
                tenant_id: Set(tenant_id.to_string()),
                data_source_id: Set(endpoint.data_source_id.clone()),
                topic: Set(endpoint.topic.clone()),
                owner_kind: Set(owner.kind().as_str().to_string()),
                owner_id: Set(owner.owner_id().to_string()),
                ..Default::default()
            }
            .insert(conn)
            .await?;
            debug!(
                data_source_id = %endpoint.data_source_id,
                topic = %endpoint.topic,
                "topic claimed"
            );
            Ok(())
        }
        1 => {
            let claim = &existing[0];
            if claim.owner_kind == owner.kind().as_str() && claim.owner_id == owner.owner_id() {
                return Ok(());
            }
            Err(ScopeError::precondition_failed(format!(
                "topic {} on data source {} is already taken",
                endpoint.topic, endpoint.data_source_id
            )))
        }
        n => Err(ScopeError::internal(format!(
            "{} claims exist for topic {} on data source {}",
            n, endpoint.topic, endpoint.data_source_id
        ))),
    }
}

/// Release an endpoint claimed by the given owner: the claim-created OUT field
/// is removed and every claim the owner holds on the data source is deleted.
/// Idempotent; unclaiming something never claimed is fine.
pub async fn unclaim_topic<C: ConnectionTrait>(
    conn: &C,
    endpoint: &DataIfcEndpoint,
    owner: &ClaimOwner,
) -> ScopeResult<()> {
    data_source_fields::Entity::delete_many()
        .filter(data_source_fields::Column::DataSourceId.eq(endpoint.data_source_id.as_str()))
        .filter(data_source_fields::Column::FieldType.eq(IfcKind::Out.as_str()))
        .filter(data_source_fields::Column::Name.eq(endpoint.name.as_str()))
        .filter(data_source_fields::Column::MqttTopic.eq(endpoint.topic.as_str()))
        .exec(conn)
        .await?;

    let deleted = topic_claims::Entity::delete_many()
        .filter(topic_claims::Column::DataSourceId.eq(endpoint.data_source_id.as_str()))
        .filter(topic_claims::Column::OwnerKind.eq(owner.kind().as_str()))
        .filter(topic_claims::Column::OwnerId.eq(owner.owner_id()))
        .exec(conn)
        .await?;
    if deleted.rows_affected > 0 {
        debug!(
            data_source_id = %endpoint.data_source_id,
            topic = %endpoint.topic,
            "topic unclaimed"
        );
    }
    Ok(())
}

/// Check per-direction endpoint counts against the configured limits. Data
/// sources without an interface kind do not count against either limit.
pub fn validate_endpoint_count_limits(
    sources: &[data_sources::Model],
    max_in: usize,
    max_out: usize,
) -> ScopeResult<()> {
    let mut in_count = 0usize;
    let mut out_count = 0usize;
    for source in sources {
        match source.ifc_kind.as_deref().and_then(IfcKind::parse) {
            Some(IfcKind::In) => in_count += 1,
            Some(IfcKind::Out) => out_count += 1,
            None => {
                warn!(data_source_id = %source.id, "data source has no interface kind");
            }
        }
    }
    if in_count > max_in {
        return Err(ScopeError::bad_request(
            "dataIfcEndpoints",
            format!("at most {} IN data interface endpoints allowed", max_in),
        ));
    }
    if out_count > max_out {
        return Err(ScopeError::bad_request(
            "dataIfcEndpoints",
            format!("at most {} OUT data interface endpoints allowed", max_out),
        ));
    }
    Ok(())
}

/// Create the OUT field backing a claimed topic, unless it already exists with
/// the same name and topic. A field with the same name but a different topic
/// belongs to someone else's wiring and is a bad request.
async fn ensure_out_field<C: ConnectionTrait>(
    conn: &C,
    endpoint: &DataIfcEndpoint,
) -> ScopeResult<()> {
    let fields = data_source_fields::Entity::find()
        .filter(data_source_fields::Column::DataSourceId.eq(endpoint.data_source_id.as_str()))
        .filter(data_source_fields::Column::Name.eq(endpoint.name.as_str()))
        .all(conn)
        .await?;

    if let Some(field) = fields.first() {
        if field.mqtt_topic == endpoint.topic {
            return Ok(());
        }
        return Err(ScopeError::bad_request(
            "dataIfcEndpoints",
            format!(
                "field {} on data source {} is already bound to topic {}",
                endpoint.name, endpoint.data_source_id, field.mqtt_topic
            ),
        ));
    }

    data_source_fields::ActiveModel {
        data_source_id: Set(endpoint.data_source_id.clone()),
        name: Set(endpoint.name.clone()),
        mqtt_topic: Set(endpoint.topic.clone()),
        field_type: Set(IfcKind::Out.as_str().to_string()),
        ..Default::default()
    }
    .insert(conn)
    .await?;
    Ok(())
}
