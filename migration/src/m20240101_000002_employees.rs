use sea_orm_migration::prelude::*;

use crate::m20240101_000001_catalogs::{Department, JobTitle};

#[derive(DeriveIden)]
enum Employee {
    #[sea_orm(iden = "employees")]
    Table,
    Id,
    Document,
    FirstNames,
    LastNames,
    BirthDate,
    Address,
    Phone,
    Email,
    Salary,
    HireDate,
    Status,
    EducationLevel,
    Profile,
    DepartmentId,
    JobTitleId,
    PasswordHash,
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
                    .table(Employee::Table)
                    .if_not_exists()
                    .col(
                        ColumnDef::new(Employee::Id)
                            .integer()
                            .not_null()
                            .auto_increment()
                            .primary_key(),
                    )
                    .col(ColumnDef::new(Employee::Document).string_len(20).not_null())
                    .col(ColumnDef::new(Employee::FirstNames).string_len(100).not_null())
                    .col(ColumnDef::new(Employee::LastNames).string_len(100).not_null())
                    .col(ColumnDef::new(Employee::BirthDate).date().not_null())
                    .col(ColumnDef::new(Employee::Address).string_len(200).not_null())
                    .col(ColumnDef::new(Employee::Phone).string_len(20).not_null())
                    .col(ColumnDef::new(Employee::Email).string_len(150).not_null())
                    .col(ColumnDef::new(Employee::Salary).decimal_len(18, 2).not_null())
                    .col(ColumnDef::new(Employee::HireDate).date().not_null())
                    .col(ColumnDef::new(Employee::Status).string_len(16).not_null())
                    .col(ColumnDef::new(Employee::EducationLevel).string_len(24).not_null())
                    .col(ColumnDef::new(Employee::Profile).string_len(500))
                    .col(ColumnDef::new(Employee::DepartmentId).integer().not_null())
                    .col(ColumnDef::new(Employee::JobTitleId).integer().not_null())
                    .col(ColumnDef::new(Employee::PasswordHash).string_len(255))
                    .col(ColumnDef::new(Employee::CreatedAt).timestamp_with_time_zone())
                    .col(ColumnDef::new(Employee::UpdatedAt).timestamp_with_time_zone())
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_employees_department")
                            .from(Employee::Table, Employee::DepartmentId)
                            .to(Department::Table, Department::Id)
                            .on_delete(ForeignKeyAction::Restrict)
                            .on_update(ForeignKeyAction::Cascade),
                    )
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_employees_job_title")
                            .from(Employee::Table, Employee::JobTitleId)
                            .to(JobTitle::Table, JobTitle::Id)
                            .on_delete(ForeignKeyAction::Restrict)
                            .on_update(ForeignKeyAction::Cascade),
                    )
                    .to_owned(),
            )
            .await?;

        manager
            .create_index(
                Index::create()
                    .name("idx_employees_document")
                    .table(Employee::Table)
                    .col(Employee::Document)
                    .unique()
                    .to_owned(),
            )
            .await?;

        manager
            .create_index(
                Index::create()
                    .name("idx_employees_email")
                    .table(Employee::Table)
                    .col(Employee::Email)
                    .unique()
                    .to_owned(),
            )
            .await?;

        manager
            .create_index(
                Index::create()
                    .name("idx_employees_department")
                    .table(Employee::Table)
                    .col(Employee::DepartmentId)
                    .to_owned(),
            )
            .await?;

        manager
            .create_index(
                Index::create()
                    .name("idx_employees_job_title")
                    .table(Employee::Table)
                    .col(Employee::JobTitleId)
                    .to_owned(),
            )
            .await?;

        Ok(())
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .drop_table(Table::drop().table(Employee::Table).to_owned())
            .await?;
        Ok(())
    }
}
