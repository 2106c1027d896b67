use sea_orm_migration::prelude::*;

pub struct Migrator;

#[async_trait::async_trait]
impl MigratorTrait for Migrator {
    fn migrations() -> Vec<Box<dyn MigrationTrait>> {
        vec![
            Box::new(m20240301_000001_create_suppliers_table::Migration),
            Box::new(m20240301_000002_create_inventory_tables::Migration),
            Box::new(m20240301_000003_create_catalog_tables::Migration),
            Box::new(m20240301_000004_create_order_tables::Migration),
            Box::new(m20240301_000005_create_production_tables::Migration),
            Box::new(m20240301_000006_create_dispatch_tables::Migration),
        ]
    }
}

// Migration implementations

mod m20240301_000001_create_suppliers_table {
    use sea_orm_migration::prelude::*;

    pub struct Migration;

    impl MigrationName for Migration {
        fn name(&self) -> &str {
            "m20240301_000001_create_suppliers_table"
        }
    }

    #[async_trait::async_trait]
    impl MigrationTrait for Migration {
        async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
            manager
                .create_table(
                    Table::create()
                        .table(Suppliers::Table)
                        .if_not_exists()
                        .col(
                            ColumnDef::new(Suppliers::Id)
                                .uuid()
                                .primary_key()
                                .not_null(),
                        )
                        .col(ColumnDef::new(Suppliers::Name).string().not_null())
                        .col(ColumnDef::new(Suppliers::ContactPerson).string())
                        .col(ColumnDef::new(Suppliers::Phone).string())
                        .col(ColumnDef::new(Suppliers::Email).string())
                        .col(ColumnDef::new(Suppliers::Address).string())
                        .col(ColumnDef::new(Suppliers::GstNumber).string())
                        .col(
                            ColumnDef::new(Suppliers::CreatedAt)
                                .timestamp_with_time_zone()
                                .not_null(),
                        )
                        .col(ColumnDef::new(Suppliers::UpdatedAt).timestamp_with_time_zone())
                        .to_owned(),
                )
                .await
        }

        async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
            manager
                .drop_table(Table::drop().table(Suppliers::Table).to_owned())
                .await
        }
    }

    #[derive(Iden)]
    pub enum Suppliers {
        Table,
        Id,
        Name,
        ContactPerson,
        Phone,
        Email,
        Address,
        GstNumber,
        CreatedAt,
        UpdatedAt,
    }
}

mod m20240301_000002_create_inventory_tables {
    use sea_orm_migration::prelude::*;

    pub struct Migration;

    impl MigrationName for Migration {
        fn name(&self) -> &str {
            "m20240301_000002_create_inventory_tables"
        }
    }

    #[async_trait::async_trait]
    impl MigrationTrait for Migration {
        async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
            manager
                .create_table(
                    Table::create()
                        .table(InventoryItems::Table)
                        .if_not_exists()
                        .col(
                            ColumnDef::new(InventoryItems::Id)
                                .uuid()
                                .primary_key()
                                .not_null(),
                        )
                        .col(ColumnDef::new(InventoryItems::Name).string().not_null())
                        .col(ColumnDef::new(InventoryItems::MaterialType).string())
                        .col(ColumnDef::new(InventoryItems::Unit).string().not_null())
                        .col(
                            ColumnDef::new(InventoryItems::Quantity)
                                .decimal_len(14, 4)
                                .not_null(),
                        )
                        .col(
                            ColumnDef::new(InventoryItems::MinStockLevel)
                                .decimal_len(14, 4)
                                .not_null(),
                        )
                        .col(
                            ColumnDef::new(InventoryItems::UnitRate)
                                .decimal_len(12, 2)
                                .not_null(),
                        )
                        .col(ColumnDef::new(InventoryItems::SupplierId).uuid())
                        .col(
                            ColumnDef::new(InventoryItems::CreatedAt)
                                .timestamp_with_time_zone()
                                .not_null(),
                        )
                        .col(ColumnDef::new(InventoryItems::UpdatedAt).timestamp_with_time_zone())
                        .col(
                            ColumnDef::new(InventoryItems::Version)
                                .integer()
                                .not_null()
                                .default(1),
                        )
                        .to_owned(),
                )
                .await?;

            manager
                .create_table(
                    Table::create()
                        .table(InventoryTransactions::Table)
                        .if_not_exists()
                        .col(
                            ColumnDef::new(InventoryTransactions::Id)
                                .uuid()
                                .primary_key()
                                .not_null(),
                        )
                        .col(
                            ColumnDef::new(InventoryTransactions::InventoryItemId)
                                .uuid()
                                .not_null(),
                        )
                        .col(
                            ColumnDef::new(InventoryTransactions::TransactionType)
                                .string()
                                .not_null(),
                        )
                        .col(
                            ColumnDef::new(InventoryTransactions::Quantity)
                                .decimal_len(14, 4)
                                .not_null(),
                        )
                        .col(ColumnDef::new(InventoryTransactions::BatchId).uuid())
                        .col(ColumnDef::new(InventoryTransactions::JobCardId).uuid())
                        .col(
                            ColumnDef::new(InventoryTransactions::Reversed)
                                .boolean()
                                .not_null()
                                .default(false),
                        )
                        .col(ColumnDef::new(InventoryTransactions::Notes).string())
                        .col(
                            ColumnDef::new(InventoryTransactions::CreatedAt)
                                .timestamp_with_time_zone()
                                .not_null(),
                        )
                        .to_owned(),
                )
                .await?;

            manager
                .create_index(
                    Index::create()
                        .if_not_exists()
                        .name("idx_inventory_transactions_item")
                        .table(InventoryTransactions::Table)
                        .col(InventoryTransactions::InventoryItemId)
                        .to_owned(),
                )
                .await?;

            manager
                .create_index(
                    Index::create()
                        .if_not_exists()
                        .name("idx_inventory_transactions_batch")
                        .table(InventoryTransactions::Table)
                        .col(InventoryTransactions::BatchId)
                        .to_owned(),
                )
                .await
        }

        async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
            manager
                .drop_table(Table::drop().table(InventoryTransactions::Table).to_owned())
                .await?;
            manager
                .drop_table(Table::drop().table(InventoryItems::Table).to_owned())
                .await
        }
    }

    #[derive(Iden)]
    pub enum InventoryItems {
        Table,
        Id,
        Name,
        MaterialType,
        Unit,
        Quantity,
        MinStockLevel,
        UnitRate,
        SupplierId,
        CreatedAt,
        UpdatedAt,
        Version,
    }

    #[derive(Iden)]
    pub enum InventoryTransactions {
        Table,
        Id,
        InventoryItemId,
        TransactionType,
        Quantity,
        BatchId,
        JobCardId,
        Reversed,
        Notes,
        CreatedAt,
    }
}

mod m20240301_000003_create_catalog_tables {
    use sea_orm_migration::prelude::*;

    pub struct Migration;

    impl MigrationName for Migration {
        fn name(&self) -> &str {
            "m20240301_000003_create_catalog_tables"
        }
    }

    #[async_trait::async_trait]
    impl MigrationTrait for Migration {
        async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
            manager
                .create_table(
                    Table::create()
                        .table(Catalog::Table)
                        .if_not_exists()
                        .col(ColumnDef::new(Catalog::Id).uuid().primary_key().not_null())
                        .col(ColumnDef::new(Catalog::Name).string().not_null())
                        .col(ColumnDef::new(Catalog::BagType).string())
                        .col(ColumnDef::new(Catalog::Length).decimal_len(10, 2))
                        .col(ColumnDef::new(Catalog::Width).decimal_len(10, 2))
                        .col(
                            ColumnDef::new(Catalog::DefaultQuantity)
                                .integer()
                                .not_null()
                                .default(1),
                        )
                        .col(
                            ColumnDef::new(Catalog::CuttingCharge)
                                .decimal_len(12, 2)
                                .not_null(),
                        )
                        .col(
                            ColumnDef::new(Catalog::PrintingCharge)
                                .decimal_len(12, 2)
                                .not_null(),
                        )
                        .col(
                            ColumnDef::new(Catalog::StitchingCharge)
                                .decimal_len(12, 2)
                                .not_null(),
                        )
                        .col(
                            ColumnDef::new(Catalog::TransportCharge)
                                .decimal_len(12, 2)
                                .not_null(),
                        )
                        .col(
                            ColumnDef::new(Catalog::MaterialCost)
                                .decimal_len(12, 2)
                                .not_null(),
                        )
                        .col(
                            ColumnDef::new(Catalog::TotalCost)
                                .decimal_len(12, 2)
                                .not_null(),
                        )
                        .col(ColumnDef::new(Catalog::SellingRate).decimal_len(12, 2))
                        .col(ColumnDef::new(Catalog::Margin).decimal_len(8, 2))
                        .col(ColumnDef::new(Catalog::Notes).string())
                        .col(
                            ColumnDef::new(Catalog::CreatedAt)
                                .timestamp_with_time_zone()
                                .not_null(),
                        )
                        .col(ColumnDef::new(Catalog::UpdatedAt).timestamp_with_time_zone())
                        .col(
                            ColumnDef::new(Catalog::Version)
                                .integer()
                                .not_null()
                                .default(1),
                        )
                        .to_owned(),
                )
                .await?;

            manager
                .create_table(
                    Table::create()
                        .table(CatalogComponents::Table)
                        .if_not_exists()
                        .col(
                            ColumnDef::new(CatalogComponents::Id)
                                .uuid()
                                .primary_key()
                                .not_null(),
                        )
                        .col(ColumnDef::new(CatalogComponents::CatalogId).uuid().not_null())
                        .col(
                            ColumnDef::new(CatalogComponents::ComponentType)
                                .string()
                                .not_null(),
                        )
                        .col(ColumnDef::new(CatalogComponents::Length).decimal_len(10, 2))
                        .col(ColumnDef::new(CatalogComponents::Width).decimal_len(10, 2))
                        .col(ColumnDef::new(CatalogComponents::RollWidth).decimal_len(10, 2))
                        .col(ColumnDef::new(CatalogComponents::MaterialId).uuid())
                        .col(
                            ColumnDef::new(CatalogComponents::Formula)
                                .string()
                                .not_null(),
                        )
                        .col(ColumnDef::new(CatalogComponents::Consumption).decimal_len(14, 4))
                        .col(ColumnDef::new(CatalogComponents::MaterialRate).decimal_len(12, 2))
                        .col(ColumnDef::new(CatalogComponents::MaterialCost).decimal_len(12, 2))
                        .col(
                            ColumnDef::new(CatalogComponents::CreatedAt)
                                .timestamp_with_time_zone()
                                .not_null(),
                        )
                        .to_owned(),
                )
                .await?;

            manager
                .create_index(
                    Index::create()
                        .if_not_exists()
                        .name("idx_catalog_components_catalog")
                        .table(CatalogComponents::Table)
                        .col(CatalogComponents::CatalogId)
                        .to_owned(),
                )
                .await
        }

        async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
            manager
                .drop_table(Table::drop().table(CatalogComponents::Table).to_owned())
                .await?;
            manager
                .drop_table(Table::drop().table(Catalog::Table).to_owned())
                .await
        }
    }

    #[derive(Iden)]
    pub enum Catalog {
        Table,
        Id,
        Name,
        BagType,
        Length,
        Width,
        DefaultQuantity,
        CuttingCharge,
        PrintingCharge,
        StitchingCharge,
        TransportCharge,
        MaterialCost,
        TotalCost,
        SellingRate,
        Margin,
        Notes,
        CreatedAt,
        UpdatedAt,
        Version,
    }

    #[derive(Iden)]
    pub enum CatalogComponents {
        Table,
        Id,
        CatalogId,
        ComponentType,
        Length,
        Width,
        RollWidth,
        MaterialId,
        Formula,
        Consumption,
        MaterialRate,
        MaterialCost,
        CreatedAt,
    }
}

mod m20240301_000004_create_order_tables {
    use sea_orm_migration::prelude::*;

    pub struct Migration;

    impl MigrationName for Migration {
        fn name(&self) -> &str {
            "m20240301_000004_create_order_tables"
        }
    }

    #[async_trait::async_trait]
    impl MigrationTrait for Migration {
        async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
            manager
                .create_table(
                    Table::create()
                        .table(Orders::Table)
                        .if_not_exists()
                        .col(ColumnDef::new(Orders::Id).uuid().primary_key().not_null())
                        .col(
                            ColumnDef::new(Orders::OrderNumber)
                                .string()
                                .not_null()
                                .unique_key(),
                        )
                        .col(ColumnDef::new(Orders::CustomerName).string().not_null())
                        .col(ColumnDef::new(Orders::CatalogId).uuid())
                        .col(ColumnDef::new(Orders::Status).string().not_null())
                        .col(
                            ColumnDef::new(Orders::OrderDate)
                                .timestamp_with_time_zone()
                                .not_null(),
                        )
                        .col(ColumnDef::new(Orders::Quantity).integer().not_null())
                        .col(ColumnDef::new(Orders::Length).decimal_len(10, 2))
                        .col(ColumnDef::new(Orders::Width).decimal_len(10, 2))
                        .col(
                            ColumnDef::new(Orders::CuttingCharge)
                                .decimal_len(12, 2)
                                .not_null(),
                        )
                        .col(
                            ColumnDef::new(Orders::PrintingCharge)
                                .decimal_len(12, 2)
                                .not_null(),
                        )
                        .col(
                            ColumnDef::new(Orders::StitchingCharge)
                                .decimal_len(12, 2)
                                .not_null(),
                        )
                        .col(
                            ColumnDef::new(Orders::TransportCharge)
                                .decimal_len(12, 2)
                                .not_null(),
                        )
                        .col(
                            ColumnDef::new(Orders::MaterialCost)
                                .decimal_len(12, 2)
                                .not_null(),
                        )
                        .col(
                            ColumnDef::new(Orders::TotalCost)
                                .decimal_len(12, 2)
                                .not_null(),
                        )
                        .col(ColumnDef::new(Orders::SellingRate).decimal_len(12, 2))
                        .col(ColumnDef::new(Orders::Margin).decimal_len(8, 2))
                        .col(ColumnDef::new(Orders::Notes).string())
                        .col(
                            ColumnDef::new(Orders::CreatedAt)
                                .timestamp_with_time_zone()
                                .not_null(),
                        )
                        .col(ColumnDef::new(Orders::UpdatedAt).timestamp_with_time_zone())
                        .col(
                            ColumnDef::new(Orders::Version)
                                .integer()
                                .not_null()
                                .default(1),
                        )
                        .to_owned(),
                )
                .await?;

            manager
                .create_table(
                    Table::create()
                        .table(OrderComponents::Table)
                        .if_not_exists()
                        .col(
                            ColumnDef::new(OrderComponents::Id)
                                .uuid()
                                .primary_key()
                                .not_null(),
                        )
                        .col(ColumnDef::new(OrderComponents::OrderId).uuid().not_null())
                        .col(
                            ColumnDef::new(OrderComponents::ComponentType)
                                .string()
                                .not_null(),
                        )
                        .col(ColumnDef::new(OrderComponents::Length).decimal_len(10, 2))
                        .col(ColumnDef::new(OrderComponents::Width).decimal_len(10, 2))
                        .col(ColumnDef::new(OrderComponents::RollWidth).decimal_len(10, 2))
                        .col(ColumnDef::new(OrderComponents::MaterialId).uuid())
                        .col(ColumnDef::new(OrderComponents::Formula).string().not_null())
                        .col(ColumnDef::new(OrderComponents::Consumption).decimal_len(14, 4))
                        .col(
                            ColumnDef::new(OrderComponents::TotalConsumption)
                                .decimal_len(14, 4),
                        )
                        .col(ColumnDef::new(OrderComponents::MaterialRate).decimal_len(12, 2))
                        .col(ColumnDef::new(OrderComponents::MaterialCost).decimal_len(12, 2))
                        .col(
                            ColumnDef::new(OrderComponents::CreatedAt)
                                .timestamp_with_time_zone()
                                .not_null(),
                        )
                        .to_owned(),
                )
                .await?;

            manager
                .create_index(
                    Index::create()
                        .if_not_exists()
                        .name("idx_order_components_order")
                        .table(OrderComponents::Table)
                        .col(OrderComponents::OrderId)
                        .to_owned(),
                )
                .await
        }

        async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
            manager
                .drop_table(Table::drop().table(OrderComponents::Table).to_owned())
                .await?;
            manager
                .drop_table(Table::drop().table(Orders::Table).to_owned())
                .await
        }
    }

    #[derive(Iden)]
    pub enum Orders {
        Table,
        Id,
        OrderNumber,
        CustomerName,
        CatalogId,
        Status,
        OrderDate,
        Quantity,
        Length,
        Width,
        CuttingCharge,
        PrintingCharge,
        StitchingCharge,
        TransportCharge,
        MaterialCost,
        TotalCost,
        SellingRate,
        Margin,
        Notes,
        CreatedAt,
        UpdatedAt,
        Version,
    }

    #[derive(Iden)]
    pub enum OrderComponents {
        Table,
        Id,
        OrderId,
        ComponentType,
        Length,
        Width,
        RollWidth,
        MaterialId,
        Formula,
        Consumption,
        TotalConsumption,
        MaterialRate,
        MaterialCost,
        CreatedAt,
    }
}

mod m20240301_000005_create_production_tables {
    use sea_orm_migration::prelude::*;

    pub struct Migration;

    impl MigrationName for Migration {
        fn name(&self) -> &str {
            "m20240301_000005_create_production_tables"
        }
    }

    #[async_trait::async_trait]
    impl MigrationTrait for Migration {
        async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
            manager
                .create_table(
                    Table::create()
                        .table(JobCards::Table)
                        .if_not_exists()
                        .col(ColumnDef::new(JobCards::Id).uuid().primary_key().not_null())
                        .col(
                            ColumnDef::new(JobCards::CardNumber)
                                .string()
                                .not_null()
                                .unique_key(),
                        )
                        .col(
                            ColumnDef::new(JobCards::OrderId)
                                .uuid()
                                .not_null()
                                .unique_key(),
                        )
                        .col(
                            ColumnDef::new(JobCards::ConsumptionBatchId)
                                .uuid()
                                .not_null(),
                        )
                        .col(ColumnDef::new(JobCards::Notes).string())
                        .col(
                            ColumnDef::new(JobCards::CreatedAt)
                                .timestamp_with_time_zone()
                                .not_null(),
                        )
                        .col(ColumnDef::new(JobCards::UpdatedAt).timestamp_with_time_zone())
                        .to_owned(),
                )
                .await?;

            manager
                .create_table(
                    Table::create()
                        .table(ProductionJobs::Table)
                        .if_not_exists()
                        .col(
                            ColumnDef::new(ProductionJobs::Id)
                                .uuid()
                                .primary_key()
                                .not_null(),
                        )
                        .col(ColumnDef::new(ProductionJobs::JobCardId).uuid().not_null())
                        .col(ColumnDef::new(ProductionJobs::Stage).string().not_null())
                        .col(ColumnDef::new(ProductionJobs::Status).string().not_null())
                        .col(ColumnDef::new(ProductionJobs::AssignedTo).string())
                        .col(ColumnDef::new(ProductionJobs::Quantity).integer())
                        .col(ColumnDef::new(ProductionJobs::StartedAt).timestamp_with_time_zone())
                        .col(
                            ColumnDef::new(ProductionJobs::CompletedAt)
                                .timestamp_with_time_zone(),
                        )
                        .col(ColumnDef::new(ProductionJobs::Notes).string())
                        .col(
                            ColumnDef::new(ProductionJobs::CreatedAt)
                                .timestamp_with_time_zone()
                                .not_null(),
                        )
                        .col(ColumnDef::new(ProductionJobs::UpdatedAt).timestamp_with_time_zone())
                        .to_owned(),
                )
                .await?;

            manager
                .create_index(
                    Index::create()
                        .if_not_exists()
                        .name("idx_production_jobs_card_stage")
                        .table(ProductionJobs::Table)
                        .col(ProductionJobs::JobCardId)
                        .col(ProductionJobs::Stage)
                        .to_owned(),
                )
                .await
        }

        async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
            manager
                .drop_table(Table::drop().table(ProductionJobs::Table).to_owned())
                .await?;
            manager
                .drop_table(Table::drop().table(JobCards::Table).to_owned())
                .await
        }
    }

    #[derive(Iden)]
    pub enum JobCards {
        Table,
        Id,
        CardNumber,
        OrderId,
        ConsumptionBatchId,
        Notes,
        CreatedAt,
        UpdatedAt,
    }

    #[derive(Iden)]
    pub enum ProductionJobs {
        Table,
        Id,
        JobCardId,
        Stage,
        Status,
        AssignedTo,
        Quantity,
        StartedAt,
        CompletedAt,
        Notes,
        CreatedAt,
        UpdatedAt,
    }
}

mod m20240301_000006_create_dispatch_tables {
    use sea_orm_migration::prelude::*;

    pub struct Migration;

    impl MigrationName for Migration {
        fn name(&self) -> &str {
            "m20240301_000006_create_dispatch_tables"
        }
    }

    #[async_trait::async_trait]
    impl MigrationTrait for Migration {
        async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
            manager
                .create_table(
                    Table::create()
                        .table(DispatchBatches::Table)
                        .if_not_exists()
                        .col(
                            ColumnDef::new(DispatchBatches::Id)
                                .uuid()
                                .primary_key()
                                .not_null(),
                        )
                        .col(
                            ColumnDef::new(DispatchBatches::BatchNumber)
                                .string()
                                .not_null()
                                .unique_key(),
                        )
                        .col(
                            ColumnDef::new(DispatchBatches::DispatchDate)
                                .timestamp_with_time_zone()
                                .not_null(),
                        )
                        .col(ColumnDef::new(DispatchBatches::Notes).string())
                        .col(
                            ColumnDef::new(DispatchBatches::CreatedAt)
                                .timestamp_with_time_zone()
                                .not_null(),
                        )
                        .to_owned(),
                )
                .await?;

            manager
                .create_table(
                    Table::create()
                        .table(OrderDispatches::Table)
                        .if_not_exists()
                        .col(
                            ColumnDef::new(OrderDispatches::Id)
                                .uuid()
                                .primary_key()
                                .not_null(),
                        )
                        .col(ColumnDef::new(OrderDispatches::OrderId).uuid().not_null())
                        .col(ColumnDef::new(OrderDispatches::BatchId).uuid())
                        .col(ColumnDef::new(OrderDispatches::Quantity).integer().not_null())
                        .col(
                            ColumnDef::new(OrderDispatches::DispatchDate)
                                .timestamp_with_time_zone()
                                .not_null(),
                        )
                        .col(ColumnDef::new(OrderDispatches::VehicleNumber).string())
                        .col(ColumnDef::new(OrderDispatches::Notes).string())
                        .col(
                            ColumnDef::new(OrderDispatches::CreatedAt)
                                .timestamp_with_time_zone()
                                .not_null(),
                        )
                        .to_owned(),
                )
                .await?;

            manager
                .create_index(
                    Index::create()
                        .if_not_exists()
                        .name("idx_order_dispatches_order")
                        .table(OrderDispatches::Table)
                        .col(OrderDispatches::OrderId)
                        .to_owned(),
                )
                .await
        }

        async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
            manager
                .drop_table(Table::drop().table(OrderDispatches::Table).to_owned())
                .await?;
            manager
                .drop_table(Table::drop().table(DispatchBatches::Table).to_owned())
                .await
        }
    }

    #[derive(Iden)]
    pub enum DispatchBatches {
        Table,
        Id,
        BatchNumber,
        DispatchDate,
        Notes,
        CreatedAt,
    }

    #[derive(Iden)]
    pub enum OrderDispatches {
        Table,
        Id,
        OrderId,
        BatchId,
        Quantity,
        DispatchDate,
        VehicleNumber,
        Notes,
        CreatedAt,
    }
}
