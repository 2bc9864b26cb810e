use sea_orm_migration::prelude::*;

#[derive(DeriveIden)]
pub(crate) enum Events {
    Table,
    Id,
    Name,
    EventType,
    EndAt,
    MemberA,
    MemberB,
    ImageMemberA,
    ImageMemberB,
    ImageBgDesk,
    ImageBgMob,
    ResultText,
    ResultCode,
    GrandPrize,
    EveryoneForPrize,
    SiteKey,
    CreatedAt,
}

#[derive(DeriveMigrationName)]
pub struct Migration;

#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .create_table(
                Table::create()
                    .table(Events::Table)
                    .if_not_exists()
                    .col(
                        ColumnDef::new(Events::Id)
                            .integer()
                            .not_null()
                            .auto_increment()
                            .primary_key(),
                    )
                    .col(ColumnDef::new(Events::Name).string().not_null())
                    .col(ColumnDef::new(Events::EventType).string().not_null())
                    .col(
                        ColumnDef::new(Events::EndAt)
                            .timestamp_with_time_zone()
                            .not_null(),
                    )
                    .col(ColumnDef::new(Events::MemberA).string().not_null())
                    .col(ColumnDef::new(Events::MemberB).string().not_null())
                    .col(ColumnDef::new(Events::ImageMemberA).text().null())
                    .col(ColumnDef::new(Events::ImageMemberB).text().null())
                    .col(ColumnDef::new(Events::ImageBgDesk).text().null())
                    .col(ColumnDef::new(Events::ImageBgMob).text().null())
                    .col(ColumnDef::new(Events::ResultText).text().null())
                    .col(ColumnDef::new(Events::ResultCode).integer().null())
                    .col(ColumnDef::new(Events::GrandPrize).text().null())
                    .col(ColumnDef::new(Events::EveryoneForPrize).text().null())
                    .col(ColumnDef::new(Events::SiteKey).string().null())
                    .col(
                        ColumnDef::new(Events::CreatedAt)
                            .timestamp_with_time_zone()
                            .not_null()
                            .default(Expr::current_timestamp()),
                    )
                    .to_owned(),
            )
            .await?;

        // lookup by site key; not unique, several campaigns may share one
        manager
            .create_index(
                Index::create()
                    .if_not_exists()
                    .name("idx_events_site_key")
                    .table(Events::Table)
                    .col(Events::SiteKey)
                    .to_owned(),
            )
            .await?;

        Ok(())
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .drop_table(Table::drop().table(Events::Table).to_owned())
            .await?;
        Ok(())
    }
}
