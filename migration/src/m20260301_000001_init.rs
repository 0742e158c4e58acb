use sea_orm_migration::prelude::*;

#[derive(DeriveMigrationName)]
pub struct Migration;

#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        // ========== USERS ==========
        manager
            .create_table(
                Table::create()
                    .table(Users::Table)
                    .if_not_exists()
                    .col(
                        ColumnDef::new(Users::Id)
                            .integer()
                            .not_null()
                            .auto_increment()
                            .primary_key(),
                    )
                    .col(ColumnDef::new(Users::Name).string_len(128).not_null())
                    .to_owned(),
            )
            .await?;

        // ========== ADMINS ==========
        manager
            .create_table(
                Table::create()
                    .table(Admins::Table)
                    .if_not_exists()
                    .col(
                        ColumnDef::new(Admins::UserId)
                            .integer()
                            .not_null()
                            .primary_key(),
                    )
                    .col(ColumnDef::new(Admins::Email).string_len(256).not_null())
                    .col(ColumnDef::new(Admins::PasswordHash).string_len(256).not_null())
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_admins_user")
                            .from(Admins::Table, Admins::UserId)
                            .to(Users::Table, Users::Id),
                    )
                    .to_owned(),
            )
            .await?;

        manager
            .create_index(
                Index::create()
                    .name("idx_admins_email")
                    .table(Admins::Table)
                    .col(Admins::Email)
                    .unique()
                    .to_owned(),
            )
            .await?;

        // ========== DEVICES ==========
        manager
            .create_table(
                Table::create()
                    .table(Devices::Table)
                    .if_not_exists()
                    .col(
                        ColumnDef::new(Devices::Id)
                            .integer()
                            .not_null()
                            .auto_increment()
                            .primary_key(),
                    )
                    .col(ColumnDef::new(Devices::Name).string_len(128).not_null())
                    .col(ColumnDef::new(Devices::DeviceType).string_len(128).not_null())
                    .col(ColumnDef::new(Devices::Firmware).string_len(128).not_null())
                    .col(ColumnDef::new(Devices::Generation).string_len(128).not_null())
                    .col(ColumnDef::new(Devices::MacAddress).string_len(64).not_null())
                    .col(ColumnDef::new(Devices::UserId).integer().not_null())
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_devices_user")
                            .from(Devices::Table, Devices::UserId)
                            .to(Users::Table, Users::Id),
                    )
                    .to_owned(),
            )
            .await?;

        // ========== SENSORS ==========
        manager
            .create_table(
                Table::create()
                    .table(Sensors::Table)
                    .if_not_exists()
                    .col(
                        ColumnDef::new(Sensors::Id)
                            .integer()
                            .not_null()
                            .auto_increment()
                            .primary_key(),
                    )
                    .col(ColumnDef::new(Sensors::SensorTypeId).integer().not_null())
                    .col(ColumnDef::new(Sensors::Name).string_len(128).not_null())
                    .col(
                        ColumnDef::new(Sensors::DeviceUniqueSensorId)
                            .integer()
                            .not_null(),
                    )
                    .col(ColumnDef::new(Sensors::DeviceId).integer().not_null())
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_sensors_device")
                            .from(Sensors::Table, Sensors::DeviceId)
                            .to(Devices::Table, Devices::Id),
                    )
                    .to_owned(),
            )
            .await?;

        // ========== SESSIONS ==========
        manager
            .create_table(
                Table::create()
                    .table(Sessions::Table)
                    .if_not_exists()
                    .col(
                        ColumnDef::new(Sessions::Id)
                            .integer()
                            .not_null()
                            .auto_increment()
                            .primary_key(),
                    )
                    .col(
                        ColumnDef::new(Sessions::CreatedAt)
                            .timestamp_with_time_zone()
                            .not_null(),
                    )
                    .to_owned(),
            )
            .await?;

        // ========== PROJECTS ==========
        manager
            .create_table(
                Table::create()
                    .table(Projects::Table)
                    .if_not_exists()
                    .col(
                        ColumnDef::new(Projects::Id)
                            .integer()
                            .not_null()
                            .auto_increment()
                            .primary_key(),
                    )
                    .col(ColumnDef::new(Projects::Name).string_len(256).not_null())
                    .col(ColumnDef::new(Projects::AdminId).integer().not_null())
                    .col(
                        ColumnDef::new(Projects::SessionId)
                            .integer()
                            .not_null()
                            .unique_key(),
                    )
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_projects_admin")
                            .from(Projects::Table, Projects::AdminId)
                            .to(Users::Table, Users::Id),
                    )
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_projects_session")
                            .from(Projects::Table, Projects::SessionId)
                            .to(Sessions::Table, Sessions::Id),
                    )
                    .to_owned(),
            )
            .await?;

        manager
            .create_index(
                Index::create()
                    .name("idx_projects_admin")
                    .table(Projects::Table)
                    .col(Projects::AdminId)
                    .to_owned(),
            )
            .await?;

        // ========== DATASETS ==========
        manager
            .create_table(
                Table::create()
                    .table(Datasets::Table)
                    .if_not_exists()
                    .col(
                        ColumnDef::new(Datasets::Id)
                            .integer()
                            .not_null()
                            .auto_increment()
                            .primary_key(),
                    )
                    .col(ColumnDef::new(Datasets::ProjectId).integer().not_null())
                    .col(ColumnDef::new(Datasets::UserId).integer().not_null())
                    .col(ColumnDef::new(Datasets::Name).string_len(256).not_null())
                    .col(ColumnDef::new(Datasets::SessionId).integer().not_null())
                    .col(
                        ColumnDef::new(Datasets::CreatedAt)
                            .timestamp_with_time_zone()
                            .not_null(),
                    )
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_datasets_project")
                            .from(Datasets::Table, Datasets::ProjectId)
                            .to(Projects::Table, Projects::Id),
                    )
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_datasets_user")
                            .from(Datasets::Table, Datasets::UserId)
                            .to(Users::Table, Users::Id),
                    )
                    .to_owned(),
            )
            .await?;

        manager
            .create_index(
                Index::create()
                    .name("idx_datasets_project_session")
                    .table(Datasets::Table)
                    .col(Datasets::ProjectId)
                    .col(Datasets::SessionId)
                    .to_owned(),
            )
            .await?;

        // ========== DATAROWS ==========
        // Row ids are chosen by the client and only unique within their dataset.
        manager
            .create_table(
                Table::create()
                    .table(Datarows::Table)
                    .if_not_exists()
                    .col(ColumnDef::new(Datarows::Id).integer().not_null())
                    .col(ColumnDef::new(Datarows::DatasetId).integer().not_null())
                    .col(ColumnDef::new(Datarows::Name).string_len(256).not_null())
                    .col(ColumnDef::new(Datarows::SensorId).integer().not_null())
                    .col(ColumnDef::new(Datarows::DataJson).text().not_null())
                    .primary_key(
                        Index::create()
                            .col(Datarows::Id)
                            .col(Datarows::DatasetId),
                    )
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_datarows_dataset")
                            .from(Datarows::Table, Datarows::DatasetId)
                            .to(Datasets::Table, Datasets::Id),
                    )
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_datarows_sensor")
                            .from(Datarows::Table, Datarows::SensorId)
                            .to(Sensors::Table, Sensors::Id),
                    )
                    .to_owned(),
            )
            .await?;

        // ========== LABELS ==========
        manager
            .create_table(
                Table::create()
                    .table(Labels::Table)
                    .if_not_exists()
                    .col(
                        ColumnDef::new(Labels::Id)
                            .integer()
                            .not_null()
                            .auto_increment()
                            .primary_key(),
                    )
                    .col(ColumnDef::new(Labels::DatasetId).integer().not_null())
                    .col(ColumnDef::new(Labels::Name).string_len(256).not_null())
                    .col(ColumnDef::new(Labels::Start).double().not_null())
                    .col(ColumnDef::new(Labels::End).double().not_null())
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_labels_dataset")
                            .from(Labels::Table, Labels::DatasetId)
                            .to(Datasets::Table, Datasets::Id),
                    )
                    .to_owned(),
            )
            .await?;

        // ========== CLASSIFIERS ==========
        // Written by the training job; this service only reads them.
        manager
            .create_table(
                Table::create()
                    .table(Classifiers::Table)
                    .if_not_exists()
                    .col(
                        ColumnDef::new(Classifiers::Id)
                            .integer()
                            .not_null()
                            .auto_increment()
                            .primary_key(),
                    )
                    .col(ColumnDef::new(Classifiers::ProjectId).integer().not_null())
                    .col(ColumnDef::new(Classifiers::Sensors).text().not_null())
                    .col(
                        ColumnDef::new(Classifiers::CreatedAt)
                            .timestamp_with_time_zone()
                            .not_null(),
                    )
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_classifiers_project")
                            .from(Classifiers::Table, Classifiers::ProjectId)
                            .to(Projects::Table, Projects::Id),
                    )
                    .to_owned(),
            )
            .await?;

        // ========== LANGUAGES ==========
        manager
            .create_table(
                Table::create()
                    .table(Languages::Table)
                    .if_not_exists()
                    .col(
                        ColumnDef::new(Languages::Code)
                            .string_len(16)
                            .not_null()
                            .primary_key(),
                    )
                    .col(ColumnDef::new(Languages::Name).string_len(64).not_null())
                    .col(ColumnDef::new(Languages::Language).text().not_null())
                    .to_owned(),
            )
            .await?;

        Ok(())
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        // Children before parents
        manager
            .drop_table(Table::drop().table(Languages::Table).if_exists().to_owned())
            .await?;
        manager
            .drop_table(Table::drop().table(Classifiers::Table).if_exists().to_owned())
            .await?;
        manager
            .drop_table(Table::drop().table(Labels::Table).if_exists().to_owned())
            .await?;
        manager
            .drop_table(Table::drop().table(Datarows::Table).if_exists().to_owned())
            .await?;
        manager
            .drop_table(Table::drop().table(Datasets::Table).if_exists().to_owned())
            .await?;
        manager
            .drop_table(Table::drop().table(Projects::Table).if_exists().to_owned())
            .await?;
        manager
            .drop_table(Table::drop().table(Sessions::Table).if_exists().to_owned())
            .await?;
        manager
            .drop_table(Table::drop().table(Sensors::Table).if_exists().to_owned())
            .await?;
        manager
            .drop_table(Table::drop().table(Devices::Table).if_exists().to_owned())
            .await?;
        manager
            .drop_table(Table::drop().table(Admins::Table).if_exists().to_owned())
            .await?;
        manager
            .drop_table(Table::drop().table(Users::Table).if_exists().to_owned())
            .await?;

        Ok(())
    }
}

#[derive(DeriveIden)]
enum Users {
    Table,
    Id,
    Name,
}

#[derive(DeriveIden)]
enum Admins {
    Table,
    UserId,
    Email,
    PasswordHash,
}

#[derive(DeriveIden)]
enum Devices {
    Table,
    Id,
    Name,
    DeviceType,
    Firmware,
    Generation,
    MacAddress,
    UserId,
}

#[derive(DeriveIden)]
enum Sensors {
    Table,
    Id,
    SensorTypeId,
    Name,
    DeviceUniqueSensorId,
    DeviceId,
}

#[derive(DeriveIden)]
enum Sessions {
    Table,
    Id,
    CreatedAt,
}

#[derive(DeriveIden)]
enum Projects {
    Table,
    Id,
    Name,
    AdminId,
    SessionId,
}

#[derive(DeriveIden)]
enum Datasets {
    Table,
    Id,
    ProjectId,
    UserId,
    Name,
    SessionId,
    CreatedAt,
}

#[derive(DeriveIden)]
enum Datarows {
    Table,
    Id,
    DatasetId,
    Name,
    SensorId,
    DataJson,
}

#[derive(DeriveIden)]
enum Labels {
    Table,
    Id,
    DatasetId,
    Name,
    Start,
    End,
}

#[derive(DeriveIden)]
enum Classifiers {
    Table,
    Id,
    ProjectId,
    Sensors,
    CreatedAt,
}

#[derive(DeriveIden)]
enum Languages {
    Table,
    Code,
    Name,
    Language,
}
