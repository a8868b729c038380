//! Create `city` table with FK to `state`.
use sea_orm_migration::{prelude::*, schema::*};

#[derive(DeriveMigrationName)]
pub struct Migration;

#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .create_table(
                Table::create()
                    .table(City::Table)
                    .if_not_exists()
                    .col(uuid(City::Id).primary_key())
                    .col(uuid(City::StateId).not_null())
                    .col(string_len(City::Name, 128).not_null())
                    .col(timestamp_with_time_zone(City::CreatedAt).not_null())
                    .col(timestamp_with_time_zone(City::UpdatedAt).not_null())
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_city_state")
                            .from(City::Table, City::StateId)
                            .to(State::Table, State::Id)
                            .on_delete(ForeignKeyAction::Cascade)
                            .on_update(ForeignKeyAction::Cascade),
                    )
                    .to_owned(),
            )
            .await
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager.drop_table(Table::drop().table(City::Table).to_owned()).await
    }
}

#[derive(DeriveIden)]
enum City { Table, Id, StateId, Name, CreatedAt, UpdatedAt }

#[derive(DeriveIden)]
enum State { Table, Id }
