use sea_orm_migration::prelude::*;

pub struct Migrator;

#[async_trait::async_trait]
impl MigratorTrait for Migrator {
    fn migrations() -> Vec<Box<dyn MigrationTrait>> {
        vec![
            Box::new(m20240301_000001_create_stages_table::Migration),
            Box::new(m20240301_000002_create_sub_stages_table::Migration),
            Box::new(m20240301_000003_create_export_orders_table::Migration),
            Box::new(m20240301_000004_create_order_items_table::Migration),
            Box::new(m20240301_000005_create_stage_allocations_table::Migration),
            Box::new(m20240301_000006_create_movement_history_table::Migration),
        ]
    }
}

// Migration implementations

mod m20240301_000001_create_stages_table {

    use sea_orm_migration::prelude::*;

    pub struct Migration;

    impl MigrationName for Migration {
        fn name(&self) -> &str {
            "m20240301_000001_create_stages_table"
        }
    }

    #[async_trait::async_trait]
    impl MigrationTrait for Migration {
        async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
            manager
                .create_table(
                    Table::create()
                        .table(Stages::Table)
                        .if_not_exists()
                        .col(ColumnDef::new(Stages::Id).uuid().primary_key().not_null())
                        .col(ColumnDef::new(Stages::OrganizationId).uuid().not_null())
                        .col(ColumnDef::new(Stages::Name).string().not_null())
                        .col(ColumnDef::new(Stages::SequenceOrder).integer().not_null())
                        .col(ColumnDef::new(Stages::Location).string().null())
                        .col(ColumnDef::new(Stages::CreatedAt).timestamp().not_null())
                        .col(ColumnDef::new(Stages::UpdatedAt).timestamp().null())
                        .to_owned(),
                )
                .await?;

            manager
                .create_index(
                    Index::create()
                        .if_not_exists()
                        .name("idx_stages_organization_id")
                        .table(Stages::Table)
                        .col(Stages::OrganizationId)
                        .to_owned(),
                )
                .await?;

            manager
                .create_index(
                    Index::create()
                        .if_not_exists()
                        .name("idx_stages_org_sequence")
                        .table(Stages::Table)
                        .col(Stages::OrganizationId)
                        .col(Stages::SequenceOrder)
                        .to_owned(),
                )
                .await
        }

        async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
            manager
                .drop_table(Table::drop().table(Stages::Table).to_owned())
                .await
        }
    }

    #[derive(DeriveIden)]
    pub(super) enum Stages {
        Table,
        Id,
        OrganizationId,
        Name,
        SequenceOrder,
        Location,
        CreatedAt,
        UpdatedAt,
    }
}

mod m20240301_000002_create_sub_stages_table {

    use super::m20240301_000001_create_stages_table::Stages;
    use sea_orm_migration::prelude::*;

    pub struct Migration;

    impl MigrationName for Migration {
        fn name(&self) -> &str {
            "m20240301_000002_create_sub_stages_table"
        }
    }

    #[async_trait::async_trait]
    impl MigrationTrait for Migration {
        async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
            manager
                .create_table(
                    Table::create()
                        .table(SubStages::Table)
                        .if_not_exists()
                        .col(ColumnDef::new(SubStages::Id).uuid().primary_key().not_null())
                        .col(ColumnDef::new(SubStages::StageId).uuid().not_null())
                        .col(ColumnDef::new(SubStages::Name).string().not_null())
                        .col(ColumnDef::new(SubStages::SequenceOrder).integer().not_null())
                        .col(ColumnDef::new(SubStages::Location).string().null())
                        .col(ColumnDef::new(SubStages::CreatedAt).timestamp().not_null())
                        .col(ColumnDef::new(SubStages::UpdatedAt).timestamp().null())
                        .foreign_key(
                            ForeignKey::create()
                                .name("fk_sub_stages_stage_id")
                                .from(SubStages::Table, SubStages::StageId)
                                .to(Stages::Table, Stages::Id)
                                .on_delete(ForeignKeyAction::Cascade)
                                .on_update(ForeignKeyAction::Cascade),
                        )
                        .to_owned(),
                )
                .await?;

            manager
                .create_index(
                    Index::create()
                        .if_not_exists()
                        .name("idx_sub_stages_stage_id")
                        .table(SubStages::Table)
                        .col(SubStages::StageId)
                        .to_owned(),
                )
                .await
        }

        async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
            manager
                .drop_table(Table::drop().table(SubStages::Table).to_owned())
                .await
        }
    }

    #[derive(DeriveIden)]
    pub(super) enum SubStages {
        Table,
        Id,
        StageId,
        Name,
        SequenceOrder,
        Location,
        CreatedAt,
        UpdatedAt,
    }
}

mod m20240301_000003_create_export_orders_table {

    use sea_orm_migration::prelude::*;

    pub struct Migration;

    impl MigrationName for Migration {
        fn name(&self) -> &str {
            "m20240301_000003_create_export_orders_table"
        }
    }

    #[async_trait::async_trait]
    impl MigrationTrait for Migration {
        async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
            manager
                .create_table(
                    Table::create()
                        .table(ExportOrders::Table)
                        .if_not_exists()
                        .col(
                            ColumnDef::new(ExportOrders::Id)
                                .uuid()
                                .primary_key()
                                .not_null(),
                        )
                        .col(ColumnDef::new(ExportOrders::OrganizationId).uuid().not_null())
                        .col(ColumnDef::new(ExportOrders::OrderNumber).string().not_null())
                        .col(ColumnDef::new(ExportOrders::BuyerName).string().null())
                        .col(ColumnDef::new(ExportOrders::Notes).string().null())
                        .col(ColumnDef::new(ExportOrders::CreatedAt).timestamp().not_null())
                        .col(ColumnDef::new(ExportOrders::UpdatedAt).timestamp().null())
                        .to_owned(),
                )
                .await?;

            manager
                .create_index(
                    Index::create()
                        .if_not_exists()
                        .name("idx_export_orders_organization_id")
                        .table(ExportOrders::Table)
                        .col(ExportOrders::OrganizationId)
                        .to_owned(),
                )
                .await?;

            manager
                .create_index(
                    Index::create()
                        .if_not_exists()
                        .name("idx_export_orders_order_number")
                        .table(ExportOrders::Table)
                        .col(ExportOrders::OrderNumber)
                        .to_owned(),
                )
                .await
        }

        async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
            manager
                .drop_table(Table::drop().table(ExportOrders::Table).to_owned())
                .await
        }
    }

    #[derive(DeriveIden)]
    pub(super) enum ExportOrders {
        Table,
        Id,
        OrganizationId,
        OrderNumber,
        BuyerName,
        Notes,
        CreatedAt,
        UpdatedAt,
    }
}

mod m20240301_000004_create_order_items_table {

    use super::m20240301_000003_create_export_orders_table::ExportOrders;
    use sea_orm_migration::prelude::*;

    pub struct Migration;

    impl MigrationName for Migration {
        fn name(&self) -> &str {
            "m20240301_000004_create_order_items_table"
        }
    }

    #[async_trait::async_trait]
    impl MigrationTrait for Migration {
        async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
            manager
                .create_table(
                    Table::create()
                        .table(OrderItems::Table)
                        .if_not_exists()
                        .col(ColumnDef::new(OrderItems::Id).uuid().primary_key().not_null())
                        .col(ColumnDef::new(OrderItems::OrderId).uuid().not_null())
                        .col(ColumnDef::new(OrderItems::OrganizationId).uuid().not_null())
                        .col(ColumnDef::new(OrderItems::Sku).string().not_null())
                        .col(ColumnDef::new(OrderItems::Name).string().not_null())
                        .col(ColumnDef::new(OrderItems::TotalQuantity).integer().not_null())
                        .col(ColumnDef::new(OrderItems::Attributes).json().null())
                        .col(ColumnDef::new(OrderItems::CreatedAt).timestamp().not_null())
                        .col(ColumnDef::new(OrderItems::UpdatedAt).timestamp().null())
                        .foreign_key(
                            ForeignKey::create()
                                .name("fk_order_items_order_id")
                                .from(OrderItems::Table, OrderItems::OrderId)
                                .to(ExportOrders::Table, ExportOrders::Id)
                                .on_delete(ForeignKeyAction::Cascade)
                                .on_update(ForeignKeyAction::Cascade),
                        )
                        .to_owned(),
                )
                .await?;

            manager
                .create_index(
                    Index::create()
                        .if_not_exists()
                        .name("idx_order_items_order_id")
                        .table(OrderItems::Table)
                        .col(OrderItems::OrderId)
                        .to_owned(),
                )
                .await?;

            manager
                .create_index(
                    Index::create()
                        .if_not_exists()
                        .name("idx_order_items_organization_id")
                        .table(OrderItems::Table)
                        .col(OrderItems::OrganizationId)
                        .to_owned(),
                )
                .await
        }

        async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
            manager
                .drop_table(Table::drop().table(OrderItems::Table).to_owned())
                .await
        }
    }

    #[derive(DeriveIden)]
    pub(super) enum OrderItems {
        Table,
        Id,
        OrderId,
        OrganizationId,
        Sku,
        Name,
        TotalQuantity,
        Attributes,
        CreatedAt,
        UpdatedAt,
    }
}

mod m20240301_000005_create_stage_allocations_table {

    use super::m20240301_000001_create_stages_table::Stages;
    use super::m20240301_000002_create_sub_stages_table::SubStages;
    use super::m20240301_000004_create_order_items_table::OrderItems;
    use sea_orm_migration::prelude::*;

    pub struct Migration;

    impl MigrationName for Migration {
        fn name(&self) -> &str {
            "m20240301_000005_create_stage_allocations_table"
        }
    }

    #[async_trait::async_trait]
    impl MigrationTrait for Migration {
        async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
            manager
                .create_table(
                    Table::create()
                        .table(StageAllocations::Table)
                        .if_not_exists()
                        .col(
                            ColumnDef::new(StageAllocations::Id)
                                .uuid()
                                .primary_key()
                                .not_null(),
                        )
                        .col(ColumnDef::new(StageAllocations::ItemId).uuid().not_null())
                        .col(
                            ColumnDef::new(StageAllocations::OrganizationId)
                                .uuid()
                                .not_null(),
                        )
                        .col(ColumnDef::new(StageAllocations::StageId).uuid().not_null())
                        .col(ColumnDef::new(StageAllocations::SubStageId).uuid().null())
                        .col(ColumnDef::new(StageAllocations::Quantity).integer().not_null())
                        .col(ColumnDef::new(StageAllocations::MovedBy).uuid().not_null())
                        .col(
                            ColumnDef::new(StageAllocations::CreatedAt)
                                .timestamp()
                                .not_null(),
                        )
                        .col(
                            ColumnDef::new(StageAllocations::UpdatedAt)
                                .timestamp()
                                .not_null(),
                        )
                        .foreign_key(
                            ForeignKey::create()
                                .name("fk_stage_allocations_item_id")
                                .from(StageAllocations::Table, StageAllocations::ItemId)
                                .to(OrderItems::Table, OrderItems::Id)
                                .on_delete(ForeignKeyAction::Cascade)
                                .on_update(ForeignKeyAction::Cascade),
                        )
                        .foreign_key(
                            ForeignKey::create()
                                .name("fk_stage_allocations_stage_id")
                                .from(StageAllocations::Table, StageAllocations::StageId)
                                .to(Stages::Table, Stages::Id)
                                .on_delete(ForeignKeyAction::Restrict)
                                .on_update(ForeignKeyAction::Cascade),
                        )
                        .foreign_key(
                            ForeignKey::create()
                                .name("fk_stage_allocations_sub_stage_id")
                                .from(StageAllocations::Table, StageAllocations::SubStageId)
                                .to(SubStages::Table, SubStages::Id)
                                .on_delete(ForeignKeyAction::Restrict)
                                .on_update(ForeignKeyAction::Cascade),
                        )
                        .to_owned(),
                )
                .await?;

            // One row per position and item; the engine consolidates instead
            // of inserting duplicates, this index backs that up.
            manager
                .create_index(
                    Index::create()
                        .if_not_exists()
                        .name("idx_stage_allocations_item_position")
                        .table(StageAllocations::Table)
                        .col(StageAllocations::ItemId)
                        .col(StageAllocations::StageId)
                        .col(StageAllocations::SubStageId)
                        .unique()
                        .to_owned(),
                )
                .await?;

            manager
                .create_index(
                    Index::create()
                        .if_not_exists()
                        .name("idx_stage_allocations_item_id")
                        .table(StageAllocations::Table)
                        .col(StageAllocations::ItemId)
                        .to_owned(),
                )
                .await?;

            manager
                .create_index(
                    Index::create()
                        .if_not_exists()
                        .name("idx_stage_allocations_stage_id")
                        .table(StageAllocations::Table)
                        .col(StageAllocations::StageId)
                        .to_owned(),
                )
                .await
        }

        async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
            manager
                .drop_table(Table::drop().table(StageAllocations::Table).to_owned())
                .await
        }
    }

    #[derive(DeriveIden)]
    pub(super) enum StageAllocations {
        Table,
        Id,
        ItemId,
        OrganizationId,
        StageId,
        SubStageId,
        Quantity,
        MovedBy,
        CreatedAt,
        UpdatedAt,
    }
}

mod m20240301_000006_create_movement_history_table {

    use super::m20240301_000004_create_order_items_table::OrderItems;
    use sea_orm_migration::prelude::*;

    pub struct Migration;

    impl MigrationName for Migration {
        fn name(&self) -> &str {
            "m20240301_000006_create_movement_history_table"
        }
    }

    #[async_trait::async_trait]
    impl MigrationTrait for Migration {
        async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
            // No foreign keys to stages here: history survives the deletion
            // of a stage that no longer holds allocations.
            manager
                .create_table(
                    Table::create()
                        .table(MovementHistory::Table)
                        .if_not_exists()
                        .col(
                            ColumnDef::new(MovementHistory::Id)
                                .uuid()
                                .primary_key()
                                .not_null(),
                        )
                        .col(ColumnDef::new(MovementHistory::ItemId).uuid().not_null())
                        .col(
                            ColumnDef::new(MovementHistory::OrganizationId)
                                .uuid()
                                .not_null(),
                        )
                        .col(ColumnDef::new(MovementHistory::FromStageId).uuid().null())
                        .col(ColumnDef::new(MovementHistory::FromSubStageId).uuid().null())
                        .col(ColumnDef::new(MovementHistory::ToStageId).uuid().not_null())
                        .col(ColumnDef::new(MovementHistory::ToSubStageId).uuid().null())
                        .col(ColumnDef::new(MovementHistory::Quantity).integer().not_null())
                        .col(ColumnDef::new(MovementHistory::MovedAt).timestamp().not_null())
                        .col(ColumnDef::new(MovementHistory::MovedBy).uuid().not_null())
                        .col(ColumnDef::new(MovementHistory::ReworkReason).string().null())
                        .foreign_key(
                            ForeignKey::create()
                                .name("fk_movement_history_item_id")
                                .from(MovementHistory::Table, MovementHistory::ItemId)
                                .to(OrderItems::Table, OrderItems::Id)
                                .on_delete(ForeignKeyAction::Cascade)
                                .on_update(ForeignKeyAction::Cascade),
                        )
                        .to_owned(),
                )
                .await?;

            manager
                .create_index(
                    Index::create()
                        .if_not_exists()
                        .name("idx_movement_history_item_id")
                        .table(MovementHistory::Table)
                        .col(MovementHistory::ItemId)
                        .to_owned(),
                )
                .await?;

            manager
                .create_index(
                    Index::create()
                        .if_not_exists()
                        .name("idx_movement_history_org_moved_at")
                        .table(MovementHistory::Table)
                        .col(MovementHistory::OrganizationId)
                        .col(MovementHistory::MovedAt)
                        .to_owned(),
                )
                .await
        }

        async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
            manager
                .drop_table(Table::drop().table(MovementHistory::Table).to_owned())
                .await
        }
    }

    #[derive(DeriveIden)]
    pub(super) enum MovementHistory {
        Table,
        Id,
        ItemId,
        OrganizationId,
        FromStageId,
        FromSubStageId,
        ToStageId,
        ToSubStageId,
        Quantity,
        MovedAt,
        MovedBy,
        ReworkReason,
    }
}
