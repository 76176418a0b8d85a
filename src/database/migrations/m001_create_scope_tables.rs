use sea_orm_migration::prelude::*;

#[derive(DeriveMigrationName)]
pub struct Migration;

#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        // Create projects table
        manager
            .create_table(
                Table::create()
                    .table(Projects::Table)
                    .if_not_exists()
                    .col(
                        ColumnDef::new(Projects::Id)
                            .string()
                            .not_null()
                            .primary_key(),
                    )
                    .col(ColumnDef::new(Projects::TenantId).string().not_null())
                    .col(ColumnDef::new(Projects::Name).string().not_null())
                    .col(
                        ColumnDef::new(Projects::EdgeSelectorType)
                            .string()
                            .not_null()
                            .default("explicit"),
                    )
                    .col(ColumnDef::new(Projects::CreatedAt).timestamp().not_null())
                    .col(ColumnDef::new(Projects::UpdatedAt).timestamp().not_null())
                    .to_owned(),
            )
            .await?;

        // Create edges table
        manager
            .create_table(
                Table::create()
                    .table(Edges::Table)
                    .if_not_exists()
                    .col(ColumnDef::new(Edges::Id).string().not_null().primary_key())
                    .col(ColumnDef::new(Edges::TenantId).string().not_null())
                    .col(ColumnDef::new(Edges::Name).string().not_null())
                    .col(ColumnDef::new(Edges::CreatedAt).timestamp().not_null())
                    .to_owned(),
            )
            .await?;

        // Create categories table
        manager
            .create_table(
                Table::create()
                    .table(Categories::Table)
                    .if_not_exists()
                    .col(
                        ColumnDef::new(Categories::Id)
                            .string()
                            .not_null()
                            .primary_key(),
                    )
                    .col(ColumnDef::new(Categories::TenantId).string().not_null())
                    .col(ColumnDef::new(Categories::Name).string().not_null())
                    .col(ColumnDef::new(Categories::CreatedAt).timestamp().not_null())
                    .to_owned(),
            )
            .await?;

        // Create category_values table
        manager
            .create_table(
                Table::create()
                    .table(CategoryValues::Table)
                    .if_not_exists()
                    .col(
                        ColumnDef::new(CategoryValues::Id)
                            .string()
                            .not_null()
                            .primary_key(),
                    )
                    .col(ColumnDef::new(CategoryValues::CategoryId).string().not_null())
                    .col(ColumnDef::new(CategoryValues::Value).string().not_null())
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_category_value_category_id")
                            .from(CategoryValues::Table, CategoryValues::CategoryId)
                            .to(Categories::Table, Categories::Id)
                            .on_delete(ForeignKeyAction::Cascade),
                    )
                    .to_owned(),
            )
            .await?;

        manager
            .create_index(
                Index::create()
                    .name("uq_category_value_pair")
                    .table(CategoryValues::Table)
                    .col(CategoryValues::CategoryId)
                    .col(CategoryValues::Value)
                    .unique()
                    .to_owned(),
            )
            .await?;

        // Create edge_label table
        manager
            .create_table(
                Table::create()
                    .table(EdgeLabel::Table)
                    .if_not_exists()
                    .col(
                        ColumnDef::new(EdgeLabel::Id)
                            .integer()
                            .not_null()
                            .auto_increment()
                            .primary_key(),
                    )
                    .col(ColumnDef::new(EdgeLabel::EdgeId).string().not_null())
                    .col(ColumnDef::new(EdgeLabel::CategoryValueId).string().not_null())
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_edge_label_edge_id")
                            .from(EdgeLabel::Table, EdgeLabel::EdgeId)
                            .to(Edges::Table, Edges::Id)
                            .on_delete(ForeignKeyAction::Cascade),
                    )
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_edge_label_category_value_id")
                            .from(EdgeLabel::Table, EdgeLabel::CategoryValueId)
                            .to(CategoryValues::Table, CategoryValues::Id)
                            .on_delete(ForeignKeyAction::Cascade),
                    )
                    .to_owned(),
            )
            .await?;

        manager
            .create_index(
                Index::create()
                    .name("uq_edge_label_pair")
                    .table(EdgeLabel::Table)
                    .col(EdgeLabel::EdgeId)
                    .col(EdgeLabel::CategoryValueId)
                    .unique()
                    .to_owned(),
            )
            .await?;

        // Create project_edge table
        manager
            .create_table(
                Table::create()
                    .table(ProjectEdge::Table)
                    .if_not_exists()
                    .col(
                        ColumnDef::new(ProjectEdge::Id)
                            .integer()
                            .not_null()
                            .auto_increment()
                            .primary_key(),
                    )
                    .col(ColumnDef::new(ProjectEdge::ProjectId).string().not_null())
                    .col(ColumnDef::new(ProjectEdge::EdgeId).string().not_null())
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_project_edge_project_id")
                            .from(ProjectEdge::Table, ProjectEdge::ProjectId)
                            .to(Projects::Table, Projects::Id)
                            .on_delete(ForeignKeyAction::Cascade),
                    )
                    .to_owned(),
            )
            .await?;

        manager
            .create_index(
                Index::create()
                    .name("uq_project_edge_pair")
                    .table(ProjectEdge::Table)
                    .col(ProjectEdge::ProjectId)
                    .col(ProjectEdge::EdgeId)
                    .unique()
                    .to_owned(),
            )
            .await?;

        // Create project_edge_selector table
        manager
            .create_table(
                Table::create()
                    .table(ProjectEdgeSelector::Table)
                    .if_not_exists()
                    .col(
                        ColumnDef::new(ProjectEdgeSelector::Id)
                            .integer()
                            .not_null()
                            .auto_increment()
                            .primary_key(),
                    )
                    .col(
                        ColumnDef::new(ProjectEdgeSelector::ProjectId)
                            .string()
                            .not_null(),
                    )
                    .col(
                        ColumnDef::new(ProjectEdgeSelector::CategoryValueId)
                            .string()
                            .not_null(),
                    )
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_project_edge_selector_project_id")
                            .from(ProjectEdgeSelector::Table, ProjectEdgeSelector::ProjectId)
                            .to(Projects::Table, Projects::Id)
                            .on_delete(ForeignKeyAction::Cascade),
                    )
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_project_edge_selector_category_value_id")
                            .from(
                                ProjectEdgeSelector::Table,
                                ProjectEdgeSelector::CategoryValueId,
                            )
                            .to(CategoryValues::Table, CategoryValues::Id)
                            .on_delete(ForeignKeyAction::Cascade),
                    )
                    .to_owned(),
            )
            .await?;

        // Create deployable_entities table
        manager
            .create_table(
                Table::create()
                    .table(DeployableEntities::Table)
                    .if_not_exists()
                    .col(
                        ColumnDef::new(DeployableEntities::Id)
                            .string()
                            .not_null()
                            .primary_key(),
                    )
                    .col(
                        ColumnDef::new(DeployableEntities::TenantId)
                            .string()
                            .not_null(),
                    )
                    .col(
                        ColumnDef::new(DeployableEntities::ProjectId)
                            .string()
                            .not_null(),
                    )
                    .col(ColumnDef::new(DeployableEntities::Kind).string().not_null())
                    .col(ColumnDef::new(DeployableEntities::Name).string().not_null())
                    .col(
                        ColumnDef::new(DeployableEntities::DataIfcEndpoints)
                            .text()
                            .not_null()
                            .default("[]"),
                    )
                    .col(
                        ColumnDef::new(DeployableEntities::CreatedAt)
                            .timestamp()
                            .not_null(),
                    )
                    .col(
                        ColumnDef::new(DeployableEntities::UpdatedAt)
                            .timestamp()
                            .not_null(),
                    )
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_deployable_entity_project_id")
                            .from(DeployableEntities::Table, DeployableEntities::ProjectId)
                            .to(Projects::Table, Projects::Id)
                            .on_delete(ForeignKeyAction::Cascade),
                    )
                    .to_owned(),
            )
            .await?;

        // Create entity_edge table
        manager
            .create_table(
                Table::create()
                    .table(EntityEdge::Table)
                    .if_not_exists()
                    .col(
                        ColumnDef::new(EntityEdge::Id)
                            .integer()
                            .not_null()
                            .auto_increment()
                            .primary_key(),
                    )
                    .col(ColumnDef::new(EntityEdge::EntityId).string().not_null())
                    .col(ColumnDef::new(EntityEdge::EdgeId).string().not_null())
                    .col(ColumnDef::new(EntityEdge::State).string().not_null())
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_entity_edge_entity_id")
                            .from(EntityEdge::Table, EntityEdge::EntityId)
                            .to(DeployableEntities::Table, DeployableEntities::Id)
                            .on_delete(ForeignKeyAction::Cascade),
                    )
                    .to_owned(),
            )
            .await?;

        manager
            .create_index(
                Index::create()
                    .name("uq_entity_edge_pair")
                    .table(EntityEdge::Table)
                    .col(EntityEdge::EntityId)
                    .col(EntityEdge::EdgeId)
                    .unique()
                    .to_owned(),
            )
            .await?;

        // Create entity_edge_selector table
        manager
            .create_table(
                Table::create()
                    .table(EntityEdgeSelector::Table)
                    .if_not_exists()
                    .col(
                        ColumnDef::new(EntityEdgeSelector::Id)
                            .integer()
                            .not_null()
                            .auto_increment()
                            .primary_key(),
                    )
                    .col(
                        ColumnDef::new(EntityEdgeSelector::EntityId)
                            .string()
                            .not_null(),
                    )
                    .col(
                        ColumnDef::new(EntityEdgeSelector::CategoryValueId)
                            .string()
                            .not_null(),
                    )
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_entity_edge_selector_entity_id")
                            .from(EntityEdgeSelector::Table, EntityEdgeSelector::EntityId)
                            .to(DeployableEntities::Table, DeployableEntities::Id)
                            .on_delete(ForeignKeyAction::Cascade),
                    )
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_entity_edge_selector_category_value_id")
                            .from(
                                EntityEdgeSelector::Table,
                                EntityEdgeSelector::CategoryValueId,
                            )
                            .to(CategoryValues::Table, CategoryValues::Id)
                            .on_delete(ForeignKeyAction::Cascade),
                    )
                    .to_owned(),
            )
            .await?;

        // Create data_sources table
        manager
            .create_table(
                Table::create()
                    .table(DataSources::Table)
                    .if_not_exists()
                    .col(
                        ColumnDef::new(DataSources::Id)
                            .string()
                            .not_null()
                            .primary_key(),
                    )
                    .col(ColumnDef::new(DataSources::TenantId).string().not_null())
                    .col(ColumnDef::new(DataSources::Name).string().not_null())
                    .col(ColumnDef::new(DataSources::IfcKind).string())
                    .col(ColumnDef::new(DataSources::CreatedAt).timestamp().not_null())
                    .to_owned(),
            )
            .await?;

        // Create data_source_field table
        manager
            .create_table(
                Table::create()
                    .table(DataSourceField::Table)
                    .if_not_exists()
                    .col(
                        ColumnDef::new(DataSourceField::Id)
                            .integer()
                            .not_null()
                            .auto_increment()
                            .primary_key(),
                    )
                    .col(
                        ColumnDef::new(DataSourceField::DataSourceId)
                            .string()
                            .not_null(),
                    )
                    .col(ColumnDef::new(DataSourceField::Name).string().not_null())
                    .col(ColumnDef::new(DataSourceField::MqttTopic).string().not_null())
                    .col(ColumnDef::new(DataSourceField::FieldType).string().not_null())
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_data_source_field_data_source_id")
                            .from(DataSourceField::Table, DataSourceField::DataSourceId)
                            .to(DataSources::Table, DataSources::Id)
                            .on_delete(ForeignKeyAction::Cascade),
                    )
                    .to_owned(),
            )
            .await?;

        // Create topic_claim table
        manager
            .create_table(
                Table::create()
                    .table(TopicClaim::Table)
                    .if_not_exists()
                    .col(
                        ColumnDef::new(TopicClaim::Id)
                            .integer()
                            .not_null()
                            .auto_increment()
                            .primary_key(),
                    )
                    .col(ColumnDef::new(TopicClaim::TenantId).string().not_null())
                    .col(ColumnDef::new(TopicClaim::DataSourceId).string().not_null())
                    .col(ColumnDef::new(TopicClaim::Topic).string().not_null())
                    .col(ColumnDef::new(TopicClaim::OwnerKind).string().not_null())
                    .col(ColumnDef::new(TopicClaim::OwnerId).string().not_null())
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_topic_claim_data_source_id")
                            .from(TopicClaim::Table, TopicClaim::DataSourceId)
                            .to(DataSources::Table, DataSources::Id)
                            .on_delete(ForeignKeyAction::Cascade),
                    )
                    .to_owned(),
            )
            .await?;

        // Claim exclusivity: at most one claim per (tenant, data source, topic)
        manager
            .create_index(
                Index::create()
                    .name("uq_topic_claim_key")
                    .table(TopicClaim::Table)
                    .col(TopicClaim::TenantId)
                    .col(TopicClaim::DataSourceId)
                    .col(TopicClaim::Topic)
                    .unique()
                    .to_owned(),
            )
            .await?;

        Ok(())
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .drop_table(Table::drop().table(TopicClaim::Table).to_owned())
            .await?;
        manager
            .drop_table(Table::drop().table(DataSourceField::Table).to_owned())
            .await?;
        manager
            .drop_table(Table::drop().table(DataSources::Table).to_owned())
            .await?;
        manager
            .drop_table(Table::drop().table(EntityEdgeSelector::Table).to_owned())
            .await?;
        manager
            .drop_table(Table::drop().table(EntityEdge::Table).to_owned())
            .await?;
        manager
            .drop_table(Table::drop().table(DeployableEntities::Table).to_owned())
            .await?;
        manager
            .drop_table(Table::drop().table(ProjectEdgeSelector::Table).to_owned())
            .await?;
        manager
            .drop_table(Table::drop().table(ProjectEdge::Table).to_owned())
            .await?;
        manager
            .drop_table(Table::drop().table(EdgeLabel::Table).to_owned())
            .await?;
        manager
            .drop_table(Table::drop().table(CategoryValues::Table).to_owned())
            .await?;
        manager
            .drop_table(Table::drop().table(Categories::Table).to_owned())
            .await?;
        manager
            .drop_table(Table::drop().table(Edges::Table).to_owned())
            .await?;
        manager
            .drop_table(Table::drop().table(Projects::Table).to_owned())
            .await?;
        Ok(())
    }
}

#[derive(DeriveIden)]
enum Projects {
    Table,
    Id,
    TenantId,
    Name,
    EdgeSelectorType,
    CreatedAt,
    UpdatedAt,
}

#[derive(DeriveIden)]
enum Edges {
    Table,
    Id,
    TenantId,
    Name,
    CreatedAt,
}

#[derive(DeriveIden)]
enum Categories {
    Table,
    Id,
    TenantId,
    Name,
    CreatedAt,
}

#[derive(DeriveIden)]
enum CategoryValues {
    Table,
    Id,
    CategoryId,
    Value,
}

#[derive(DeriveIden)]
enum EdgeLabel {
    Table,
    Id,
    EdgeId,
    CategoryValueId,
}

#[derive(DeriveIden)]
enum ProjectEdge {
    Table,
    Id,
    ProjectId,
    EdgeId,
}

#[derive(DeriveIden)]
enum ProjectEdgeSelector {
    Table,
    Id,
    ProjectId,
    CategoryValueId,
}

#[derive(DeriveIden)]
enum DeployableEntities {
    Table,
    Id,
    TenantId,
    ProjectId,
    Kind,
    Name,
    DataIfcEndpoints,
    CreatedAt,
    UpdatedAt,
}

#[derive(DeriveIden)]
enum EntityEdge {
    Table,
    Id,
    EntityId,
    EdgeId,
    State,
}

#[derive(DeriveIden)]
enum EntityEdgeSelector {
    Table,
    Id,
    EntityId,
    CategoryValueId,
}

#[derive(DeriveIden)]
enum DataSources {
    Table,
    Id,
    TenantId,
    Name,
    IfcKind,
    CreatedAt,
}

#[derive(DeriveIden)]
enum DataSourceField {
    Table,
    Id,
    DataSourceId,
    Name,
    MqttTopic,
    FieldType,
}

#[derive(DeriveIden)]
enum TopicClaim {
    Table,
    Id,
    TenantId,
    DataSourceId,
    Topic,
    OwnerKind,
    OwnerId,
}
