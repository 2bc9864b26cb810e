use sea_orm_migration::prelude::*;

use crate::m20250301_000001_create_users::Users;
use crate::m20250301_000002_create_events::Events;

#[derive(DeriveIden)]
enum UserEvents {
    Table,
    UserId,
    EventId,
    Outcome,
    Payload,
    CreatedAt,
}

#[derive(DeriveMigrationName)]
pub struct Migration;

#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        // one vote per (user, event): the composite key is the upsert guard
        manager
            .create_table(
                Table::create()
                    .table(UserEvents::Table)
                    .if_not_exists()
                    .col(
                        ColumnDef::new(UserEvents::UserId)
                            .string_len(36)
                            .not_null(),
                    )
                    .col(ColumnDef::new(UserEvents::EventId).integer().not_null())
                    .col(ColumnDef::new(UserEvents::Outcome).integer().null())
                    .col(ColumnDef::new(UserEvents::Payload).text().null())
                    .col(
                        ColumnDef::new(UserEvents::CreatedAt)
                            .timestamp_with_time_zone()
                            .not_null()
                            .default(Expr::current_timestamp()),
                    )
                    .primary_key(
                        Index::create()
                            .name("pk_user_events")
                            .col(UserEvents::UserId)
                            .col(UserEvents::EventId),
                    )
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_user_events_user")
                            .from(UserEvents::Table, UserEvents::UserId)
                            .to(Users::Table, Users::Id),
                    )
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_user_events_event")
                            .from(UserEvents::Table, UserEvents::EventId)
                            .to(Events::Table, Events::Id),
                    )
                    .to_owned(),
            )
            .await?;

        manager
            .create_index(
                Index::create()
                    .if_not_exists()
                    .name("idx_user_events_event_id")
                    .table(UserEvents::Table)
                    .col(UserEvents::EventId)
                    .to_owned(),
            )
            .await?;

        Ok(())
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .drop_table(Table::drop().table(UserEvents::Table).to_owned())
            .await?;
        Ok(())
    }
}
