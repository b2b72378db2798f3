use sea_orm_migration::prelude::*;

use crate::seed::seed_catalogs;

#[derive(DeriveIden, Clone, Copy)]
pub(crate) enum Department {
    #[sea_orm(iden = "departments")]
    Table,
    Id,
    Name,
    Description,
    CreatedAt,
    UpdatedAt,
}

#[derive(DeriveIden, Clone, Copy)]
pub(crate) enum JobTitle {
    #[sea_orm(iden = "job_titles")]
    Table,
    Id,
    Name,
    Description,
    CreatedAt,
    UpdatedAt,
}

#[derive(DeriveMigrationName)]
pub struct Migration;

#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .create_table(
                Table::create()
                    .table(Department::Table)
                    .if_not_exists()
                    .col(
                        ColumnDef::new(Department::Id)
                            .integer()
                            .not_null()
                            .auto_increment()
                            .primary_key(),
                    )
                    .col(ColumnDef::new(Department::Name).string_len(100).not_null())
                    .col(ColumnDef::new(Department::Description).string_len(500))
                    .col(ColumnDef::new(Department::CreatedAt).timestamp_with_time_zone())
                    .col(ColumnDef::new(Department::UpdatedAt).timestamp_with_time_zone())
                    .to_owned(),
            )
            .await?;

        manager
            .create_index(
                Index::create()
                    .name("idx_departments_name")
                    .table(Department::Table)
                    .col(Department::Name)
                    .unique()
                    .to_owned(),
            )
            .await?;

        manager
            .create_table(
                Table::create()
                    .table(JobTitle::Table)
                    .if_not_exists()
                    .col(
                        ColumnDef::new(JobTitle::Id)
                            .integer()
                            .not_null()
                            .auto_increment()
                            .primary_key(),
                    )
                    .col(ColumnDef::new(JobTitle::Name).string_len(100).not_null())
                    .col(ColumnDef::new(JobTitle::Description).string_len(500))
                    .col(ColumnDef::new(JobTitle::CreatedAt).timestamp_with_time_zone())
                    .col(ColumnDef::new(JobTitle::UpdatedAt).timestamp_with_time_zone())
                    .to_owned(),
            )
            .await?;

        manager
            .create_index(
                Index::create()
                    .name("idx_job_titles_name")
                    .table(JobTitle::Table)
                    .col(JobTitle::Name)
                    .unique()
                    .to_owned(),
            )
            .await?;

        seed_catalogs(manager.get_connection()).await?;
        Ok(())
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .drop_table(Table::drop().table(JobTitle::Table).to_owned())
            .await?;
        manager
            .drop_table(Table::drop().table(Department::Table).to_owned())
            .await?;
        Ok(())
    }
}
