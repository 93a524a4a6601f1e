use sea_orm_migration::prelude::*;

pub struct Migrator;

#[async_trait::async_trait]
impl MigratorTrait for Migrator {
    fn migrations() -> Vec<Box<dyn MigrationTrait>> {
        vec![
            Box::new(m20250101_000001_create_catalog_tables::Migration),
            Box::new(m20250101_000002_create_lead_tables::Migration),
            Box::new(m20250101_000003_create_portal_tables::Migration),
        ]
    }
}

// Migration implementations

mod m20250101_000001_create_catalog_tables {

    use sea_orm_migration::prelude::*;

    pub struct Migration;

    impl MigrationName for Migration {
        fn name(&self) -> &str {
            "m20250101_000001_create_catalog_tables"
        }
    }

    #[async_trait::async_trait]
    impl MigrationTrait for Migration {
        async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
            manager
                .create_table(
                    Table::create()
                        .table(Equipment::Table)
                        .if_not_exists()
                        .col(
                            ColumnDef::new(Equipment::Id)
                                .integer()
                                .not_null()
                                .auto_increment()
                                .primary_key(),
                        )
                        .col(
                            ColumnDef::new(Equipment::EquipmentId)
                                .string_len(20)
                                .not_null()
                                .unique_key(),
                        )
                        .col(ColumnDef::new(Equipment::Make).string_len(50).not_null())
                        .col(ColumnDef::new(Equipment::Model).string_len(100).not_null())
                        .col(ColumnDef::new(Equipment::Year).integer().null())
                        .col(ColumnDef::new(Equipment::Meter).integer().null())
                        .col(ColumnDef::new(Equipment::Price).string_len(50).null())
                        .col(ColumnDef::new(Equipment::City).string_len(100).null())
                        .col(ColumnDef::new(Equipment::State).string_len(10).null())
                        .col(ColumnDef::new(Equipment::Category).string_len(50).not_null())
                        .col(ColumnDef::new(Equipment::ImageUrl).text().null())
                        .to_owned(),
                )
                .await?;

            manager
                .create_index(
                    Index::create()
                        .if_not_exists()
                        .name("idx_equipment_category")
                        .table(Equipment::Table)
                        .col(Equipment::Category)
                        .to_owned(),
                )
                .await?;

            manager
                .create_table(
                    Table::create()
                        .table(Parts::Table)
                        .if_not_exists()
                        .col(
                            ColumnDef::new(Parts::Id)
                                .integer()
                                .not_null()
                                .auto_increment()
                                .primary_key(),
                        )
                        .col(ColumnDef::new(Parts::PartNumber).string_len(50).not_null())
                        .col(ColumnDef::new(Parts::Description).text().not_null())
                        .col(ColumnDef::new(Parts::Category).string_len(50).not_null())
                        .col(ColumnDef::new(Parts::Subcategory).string_len(100).null())
                        .col(ColumnDef::new(Parts::Price).string_len(50).null())
                        .col(ColumnDef::new(Parts::Compatibility).text().null())
                        .col(ColumnDef::new(Parts::EngineModel).text().null())
                        .col(ColumnDef::new(Parts::Gasket).string_len(50).null())
                        .col(ColumnDef::new(Parts::Equipment).text().null())
                        .col(ColumnDef::new(Parts::ImageUrl).text().null())
                        .to_owned(),
                )
                .await?;

            manager
                .create_index(
                    Index::create()
                        .if_not_exists()
                        .name("idx_parts_category_subcategory")
                        .table(Parts::Table)
                        .col(Parts::Category)
                        .col(Parts::Subcategory)
                        .to_owned(),
                )
                .await?;

            manager
                .create_index(
                    Index::create()
                        .if_not_exists()
                        .name("idx_parts_part_number")
                        .table(Parts::Table)
                        .col(Parts::PartNumber)
                        .to_owned(),
                )
                .await?;

            manager
                .create_table(
                    Table::create()
                        .table(PowerUnits::Table)
                        .if_not_exists()
                        .col(
                            ColumnDef::new(PowerUnits::Id)
                                .integer()
                                .not_null()
                                .auto_increment()
                                .primary_key(),
                        )
                        .col(ColumnDef::new(PowerUnits::StockNumber).string_len(30).not_null())
                        .col(ColumnDef::new(PowerUnits::Brand).string_len(100).null())
                        .col(ColumnDef::new(PowerUnits::Model).string_len(150).not_null())
                        .col(ColumnDef::new(PowerUnits::Category).string_len(50).not_null())
                        .col(ColumnDef::new(PowerUnits::Hp).integer().null())
                        .col(ColumnDef::new(PowerUnits::Kw).integer().null())
                        .col(ColumnDef::new(PowerUnits::Rpm).integer().null())
                        .col(ColumnDef::new(PowerUnits::EngineRpm).integer().null())
                        .col(ColumnDef::new(PowerUnits::Year).string_len(20).null())
                        .col(ColumnDef::new(PowerUnits::Condition).string_len(100).null())
                        .col(ColumnDef::new(PowerUnits::Hours).string_len(30).null())
                        .col(ColumnDef::new(PowerUnits::TierRating).string_len(50).null())
                        .col(ColumnDef::new(PowerUnits::FuelType).string_len(50).null())
                        .col(ColumnDef::new(PowerUnits::Cooling).string_len(50).null())
                        .col(ColumnDef::new(PowerUnits::Enclosure).string_len(50).null())
                        .col(ColumnDef::new(PowerUnits::Volts).string_len(50).null())
                        .col(ColumnDef::new(PowerUnits::Stage).string_len(50).null())
                        .col(ColumnDef::new(PowerUnits::SellingStage).string_len(50).null())
                        .col(ColumnDef::new(PowerUnits::UnitType).string_len(50).null())
                        .col(ColumnDef::new(PowerUnits::Location).string_len(100).null())
                        .col(ColumnDef::new(PowerUnits::Price).string_len(50).null())
                        .col(ColumnDef::new(PowerUnits::ImageUrl).text().null())
                        .to_owned(),
                )
                .await?;

            manager
                .create_index(
                    Index::create()
                        .if_not_exists()
                        .name("idx_power_units_category")
                        .table(PowerUnits::Table)
                        .col(PowerUnits::Category)
                        .to_owned(),
                )
                .await?;

            manager
                .create_index(
                    Index::create()
                        .if_not_exists()
                        .name("idx_power_units_stock_number")
                        .table(PowerUnits::Table)
                        .col(PowerUnits::StockNumber)
                        .to_owned(),
                )
                .await
        }

        async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
            manager
                .drop_table(Table::drop().table(PowerUnits::Table).to_owned())
                .await?;
            manager
                .drop_table(Table::drop().table(Parts::Table).to_owned())
                .await?;
            manager
                .drop_table(Table::drop().table(Equipment::Table).to_owned())
                .await
        }
    }

    #[derive(DeriveIden)]
    enum Equipment {
        Table,
        Id,
        EquipmentId,
        Make,
        Model,
        Year,
        Meter,
        Price,
        City,
        State,
        Category,
        ImageUrl,
    }

    #[derive(DeriveIden)]
    enum Parts {
        Table,
        Id,
        PartNumber,
        Description,
        Category,
        Subcategory,
        Price,
        Compatibility,
        EngineModel,
        Gasket,
        Equipment,
        ImageUrl,
    }

    #[derive(DeriveIden)]
    enum PowerUnits {
        Table,
        Id,
        StockNumber,
        Brand,
        Model,
        Category,
        Hp,
        Kw,
        Rpm,
        EngineRpm,
        Year,
        Condition,
        Hours,
        TierRating,
        FuelType,
        Cooling,
        Enclosure,
        Volts,
        Stage,
        SellingStage,
        UnitType,
        Location,
        Price,
        ImageUrl,
    }
}

mod m20250101_000002_create_lead_tables {

    use sea_orm_migration::prelude::*;

    pub struct Migration;

    impl MigrationName for Migration {
        fn name(&self) -> &str {
            "m20250101_000002_create_lead_tables"
        }
    }

    #[async_trait::async_trait]
    impl MigrationTrait for Migration {
        async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
            manager
                .create_table(
                    Table::create()
                        .table(QuoteRequests::Table)
                        .if_not_exists()
                        .col(
                            ColumnDef::new(QuoteRequests::Id)
                                .integer()
                                .not_null()
                                .auto_increment()
                                .primary_key(),
                        )
                        .col(ColumnDef::new(QuoteRequests::CustomerId).string_len(255).null())
                        .col(ColumnDef::new(QuoteRequests::Name).string_len(200).not_null())
                        .col(ColumnDef::new(QuoteRequests::Email).string_len(200).not_null())
                        .col(ColumnDef::new(QuoteRequests::Phone).string_len(50).null())
                        .col(ColumnDef::new(QuoteRequests::ShipTo).text().null())
                        .col(ColumnDef::new(QuoteRequests::Notes).text().null())
                        .col(ColumnDef::new(QuoteRequests::Items).text().null())
                        .col(
                            ColumnDef::new(QuoteRequests::Status)
                                .string_len(30)
                                .not_null()
                                .default("pending"),
                        )
                        .col(
                            ColumnDef::new(QuoteRequests::CreatedAt)
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
                        .name("idx_quote_requests_customer_id")
                        .table(QuoteRequests::Table)
                        .col(QuoteRequests::CustomerId)
                        .to_owned(),
                )
                .await?;

            manager
                .create_index(
                    Index::create()
                        .if_not_exists()
                        .name("idx_quote_requests_email")
                        .table(QuoteRequests::Table)
                        .col(QuoteRequests::Email)
                        .to_owned(),
                )
                .await?;

            manager
                .create_table(
                    Table::create()
                        .table(ContactInquiries::Table)
                        .if_not_exists()
                        .col(
                            ColumnDef::new(ContactInquiries::Id)
                                .integer()
                                .not_null()
                                .auto_increment()
                                .primary_key(),
                        )
                        .col(ColumnDef::new(ContactInquiries::Name).string_len(200).not_null())
                        .col(ColumnDef::new(ContactInquiries::Email).string_len(200).not_null())
                        .col(ColumnDef::new(ContactInquiries::Message).text().not_null())
                        .col(
                            ColumnDef::new(ContactInquiries::CreatedAt)
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
                        .name("idx_contact_inquiries_email")
                        .table(ContactInquiries::Table)
                        .col(ContactInquiries::Email)
                        .to_owned(),
                )
                .await?;

            manager
                .create_table(
                    Table::create()
                        .table(ProjectEstimates::Table)
                        .if_not_exists()
                        .col(
                            ColumnDef::new(ProjectEstimates::Id)
                                .integer()
                                .not_null()
                                .auto_increment()
                                .primary_key(),
                        )
                        .col(
                            ColumnDef::new(ProjectEstimates::ProjectName)
                                .string_len(200)
                                .not_null(),
                        )
                        .col(
                            ColumnDef::new(ProjectEstimates::ProjectType)
                                .string_len(100)
                                .not_null(),
                        )
                        .col(
                            ColumnDef::new(ProjectEstimates::Location)
                                .string_len(200)
                                .not_null(),
                        )
                        .col(
                            ColumnDef::new(ProjectEstimates::Terrain)
                                .string_len(100)
                                .not_null(),
                        )
                        .col(
                            ColumnDef::new(ProjectEstimates::ProjectSize)
                                .string_len(100)
                                .not_null(),
                        )
                        .col(
                            ColumnDef::new(ProjectEstimates::Duration)
                                .string_len(100)
                                .not_null(),
                        )
                        .col(ColumnDef::new(ProjectEstimates::AdditionalDetails).text().null())
                        .col(ColumnDef::new(ProjectEstimates::EstimateResult).text().not_null())
                        .col(
                            ColumnDef::new(ProjectEstimates::CreatedAt)
                                .timestamp_with_time_zone()
                                .not_null(),
                        )
                        .to_owned(),
                )
                .await
        }

        async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
            manager
                .drop_table(Table::drop().table(ProjectEstimates::Table).to_owned())
                .await?;
            manager
                .drop_table(Table::drop().table(ContactInquiries::Table).to_owned())
                .await?;
            manager
                .drop_table(Table::drop().table(QuoteRequests::Table).to_owned())
                .await
        }
    }

    #[derive(DeriveIden)]
    enum QuoteRequests {
        Table,
        Id,
        CustomerId,
        Name,
        Email,
        Phone,
        ShipTo,
        Notes,
        Items,
        Status,
        CreatedAt,
    }

    #[derive(DeriveIden)]
    enum ContactInquiries {
        Table,
        Id,
        Name,
        Email,
        Message,
        CreatedAt,
    }

    #[derive(DeriveIden)]
    enum ProjectEstimates {
        Table,
        Id,
        ProjectName,
        ProjectType,
        Location,
        Terrain,
        ProjectSize,
        Duration,
        AdditionalDetails,
        EstimateResult,
        CreatedAt,
    }
}

mod m20250101_000003_create_portal_tables {

    use sea_orm_migration::prelude::*;

    pub struct Migration;

    impl MigrationName for Migration {
        fn name(&self) -> &str {
            "m20250101_000003_create_portal_tables"
        }
    }

    #[async_trait::async_trait]
    impl MigrationTrait for Migration {
        async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
            manager
                .create_table(
                    Table::create()
                        .table(CustomerOrders::Table)
                        .if_not_exists()
                        .col(
                            ColumnDef::new(CustomerOrders::Id)
                                .integer()
                                .not_null()
                                .auto_increment()
                                .primary_key(),
                        )
                        .col(
                            ColumnDef::new(CustomerOrders::CustomerId)
                                .string_len(255)
                                .not_null(),
                        )
                        .col(
                            ColumnDef::new(CustomerOrders::CustomerEmail)
                                .string_len(200)
                                .not_null(),
                        )
                        .col(ColumnDef::new(CustomerOrders::QuoteRequestId).integer().null())
                        .col(ColumnDef::new(CustomerOrders::ItemType).string_len(30).null())
                        .col(ColumnDef::new(CustomerOrders::ItemDescription).text().null())
                        .col(ColumnDef::new(CustomerOrders::Total).string_len(50).null())
                        .col(
                            ColumnDef::new(CustomerOrders::Status)
                                .string_len(30)
                                .not_null()
                                .default("processing"),
                        )
                        .col(
                            ColumnDef::new(CustomerOrders::CreatedAt)
                                .timestamp_with_time_zone()
                                .not_null(),
                        )
                        .col(
                            ColumnDef::new(CustomerOrders::UpdatedAt)
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
                        .name("idx_customer_orders_customer_id")
                        .table(CustomerOrders::Table)
                        .col(CustomerOrders::CustomerId)
                        .to_owned(),
                )
                .await?;

            manager
                .create_table(
                    Table::create()
                        .table(CustomerPayments::Table)
                        .if_not_exists()
                        .col(
                            ColumnDef::new(CustomerPayments::Id)
                                .integer()
                                .not_null()
                                .auto_increment()
                                .primary_key(),
                        )
                        .col(
                            ColumnDef::new(CustomerPayments::CustomerId)
                                .string_len(255)
                                .not_null(),
                        )
                        .col(
                            ColumnDef::new(CustomerPayments::CustomerEmail)
                                .string_len(200)
                                .not_null(),
                        )
                        .col(ColumnDef::new(CustomerPayments::OrderId).integer().null())
                        .col(ColumnDef::new(CustomerPayments::Amount).string_len(50).not_null())
                        .col(
                            ColumnDef::new(CustomerPayments::Status)
                                .string_len(30)
                                .not_null()
                                .default("pending"),
                        )
                        .col(ColumnDef::new(CustomerPayments::Method).string_len(50).null())
                        .col(ColumnDef::new(CustomerPayments::Reference).string_len(200).null())
                        .col(
                            ColumnDef::new(CustomerPayments::PaidAt)
                                .timestamp_with_time_zone()
                                .null(),
                        )
                        .col(
                            ColumnDef::new(CustomerPayments::CreatedAt)
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
                        .name("idx_customer_payments_customer_id")
                        .table(CustomerPayments::Table)
                        .col(CustomerPayments::CustomerId)
                        .to_owned(),
                )
                .await
        }

        async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
            manager
                .drop_table(Table::drop().table(CustomerPayments::Table).to_owned())
                .await?;
            manager
                .drop_table(Table::drop().table(CustomerOrders::Table).to_owned())
                .await
        }
    }

    #[derive(DeriveIden)]
    enum CustomerOrders {
        Table,
        Id,
        CustomerId,
        CustomerEmail,
        QuoteRequestId,
        ItemType,
        ItemDescription,
        Total,
        Status,
        CreatedAt,
        UpdatedAt,
    }

    #[derive(DeriveIden)]
    enum CustomerPayments {
        Table,
        Id,
        CustomerId,
        CustomerEmail,
        OrderId,
        Amount,
        Status,
        Method,
        Reference,
        PaidAt,
        CreatedAt,
    }
}
