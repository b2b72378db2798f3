use sea_orm_migration::prelude::*;

#[derive(DeriveIden)]
enum AdminUser {
    #[sea_orm(iden = "admin_users")]
    Table,
    Id,
    Email,
    FirstNames,
    LastNames,
    Role,
    PasswordHash,
    FailedAttempts,
    LockedUntil,
    CreatedAt,
}

#[derive(DeriveIden)]
enum AdminSession {
    #[sea_orm(iden = "admin_sessions")]
    Table,
    Id,
    AdminUserId,
    CreatedAt,
    ExpiresAt,
    Persistent,
}

#[derive(DeriveMigrationName)]
pub struct Migration;

#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .create_table(
                Table::create()
                    .table(AdminUser::Table)
                    .if_not_exists()
                    .col(ColumnDef::new(AdminUser::Id).uuid().not_null().primary_key())
                    .col(ColumnDef::new(AdminUser::Email).string_len(256).not_null())
                    .col(ColumnDef::new(AdminUser::FirstNames).string_len(100).not_null())
                    .col(ColumnDef::new(AdminUser::LastNames).string_len(100).not_null())
                    .col(ColumnDef::new(AdminUser::Role).string_len(32).not_null())
                    .col(ColumnDef::new(AdminUser::PasswordHash).text().not_null())
                    .col(
                        ColumnDef::new(AdminUser::FailedAttempts)
                            .integer()
                            .not_null()
                            .default(0),
                    )
                    .col(ColumnDef::new(AdminUser::LockedUntil).timestamp_with_time_zone())
                    .col(
                        ColumnDef::new(AdminUser::CreatedAt)
                            .timestamp_with_time_zone()
                            .not_null(),
                    )
                    .to_owned(),
            )
            .await?;

        manager
            .create_index(
                Index::create()
                    .name("idx_admin_users_email")
                    .table(AdminUser::Table)
                    .col(AdminUser::Email)
                    .unique()
                    .to_owned(),
            )
            .await?;

        manager
            .create_table(
                Table::create()
                    .table(AdminSession::Table)
                    .if_not_exists()
                    .col(ColumnDef::new(AdminSession::Id).uuid().not_null().primary_key())
                    .col(ColumnDef::new(AdminSession::AdminUserId).uuid().not_null())
                    .col(
                        ColumnDef::new(AdminSession::CreatedAt)
                            .timestamp_with_time_zone()
                            .not_null(),
                    )
                    .col(
                        ColumnDef::new(AdminSession::ExpiresAt)
                            .timestamp_with_time_zone()
                            .not_null(),
                    )
                    .col(
                        ColumnDef::new(AdminSession::Persistent)
                            .boolean()
                            .not_null()
                            .default(false),
                    )
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_admin_sessions_user")
                            .from(AdminSession::Table, AdminSession::AdminUserId)
                            .to(AdminUser::Table, AdminUser::Id)
                            .on_delete(ForeignKeyAction::Cascade),
                    )
                    .to_owned(),
            )
            .await?;

        manager
            .create_index(
                Index::create()
                    .name("idx_admin_sessions_user")
                    .table(AdminSession::Table)
                    .col(AdminSession::AdminUserId)
                    .to_owned(),
            )
            .await?;

        Ok(())
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .drop_table(Table::drop().table(AdminSession::Table).to_owned())
            .await?;
        manager
            .drop_table(Table::drop().table(AdminUser::Table).to_owned())
            .await?;
        Ok(())
    }
}
