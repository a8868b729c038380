//! Create `place` table with FKs to `city` and `user`.
//!
//! Numeric detail columns are nullable: a place row only carries the fields
//! that were supplied at creation. Amenity references live in a JSON column.
use sea_orm_migration::{prelude::*, schema::*};

#[derive(DeriveMigrationName)]
pub struct Migration;

#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .create_table(
                Table::create()
                    .table(Place::Table)
                    .if_not_exists()
                    .col(uuid(Place::Id).primary_key())
                    .col(uuid(Place::CityId).not_null())
                    .col(uuid(Place::UserId).not_null())
                    .col(string_len(Place::Name, 128).not_null())
                    .col(ColumnDef::new(Place::Description).text().null())
                    .col(ColumnDef::new(Place::NumberRooms).integer().null())
                    .col(ColumnDef::new(Place::NumberBathrooms).integer().null())
                    .col(ColumnDef::new(Place::MaxGuest).integer().null())
                    .col(ColumnDef::new(Place::PriceByNight).integer().null())
                    .col(ColumnDef::new(Place::Latitude).double().null())
                    .col(ColumnDef::new(Place::Longitude).double().null())
                    .col(ColumnDef::new(Place::AmenityIds).json_binary().null())
                    .col(timestamp_with_time_zone(Place::CreatedAt).not_null())
                    .col(timestamp_with_time_zone(Place::UpdatedAt).not_null())
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_place_city")
                            .from(Place::Table, Place::CityId)
                            .to(City::Table, City::Id)
                            .on_delete(ForeignKeyAction::Cascade)
                            .on_update(ForeignKeyAction::Cascade),
                    )
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_place_user")
                            .from(Place::Table, Place::UserId)
                            .to(User::Table, User::Id)
                            .on_delete(ForeignKeyAction::Cascade)
                            .on_update(ForeignKeyAction::Cascade),
                    )
                    .to_owned(),
            )
            .await
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager.drop_table(Table::drop().table(Place::Table).to_owned()).await
    }
}

#[derive(DeriveIden)]
enum Place {
    Table,
    Id,
    CityId,
    UserId,
    Name,
    Description,
    NumberRooms,
    NumberBathrooms,
    MaxGuest,
    PriceByNight,
    Latitude,
    Longitude,
    AmenityIds,
    CreatedAt,
    UpdatedAt,
}

#[derive(DeriveIden)]
enum City { Table, Id }

#[derive(DeriveIden)]
enum User { Table, Id }
