use sea_orm_migration::prelude::*;

#[derive(DeriveMigrationName)]
pub struct Migration;

#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        // City: index on state_id for per-state listings
        manager
            .create_index(
                Index::create()
                    .name("idx_city_state")
                    .table(City::Table)
                    .col(City::StateId)
                    .to_owned(),
            )
            .await?;

        // Place: indexes on city_id and user_id
        manager
            .create_index(
                Index::create()
                    .name("idx_place_city")
                    .table(Place::Table)
                    .col(Place::CityId)
                    .to_owned(),
            )
            .await?;
        manager
            .create_index(
                Index::create()
                    .name("idx_place_user")
                    .table(Place::Table)
                    .col(Place::UserId)
                    .to_owned(),
            )
            .await?;

        // Review: indexes on place_id and user_id
        manager
            .create_index(
                Index::create()
                    .name("idx_review_place")
                    .table(Review::Table)
                    .col(Review::PlaceId)
                    .to_owned(),
            )
            .await?;
        manager
            .create_index(
                Index::create()
                    .name("idx_review_user")
                    .table(Review::Table)
                    .col(Review::UserId)
                    .to_owned(),
            )
            .await
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .drop_index(Index::drop().name("idx_city_state").table(City::Table).to_owned())
            .await?;
        manager
            .drop_index(Index::drop().name("idx_place_city").table(Place::Table).to_owned())
            .await?;
        manager
            .drop_index(Index::drop().name("idx_place_user").table(Place::Table).to_owned())
            .await?;
        manager
            .drop_index(Index::drop().name("idx_review_place").table(Review::Table).to_owned())
            .await?;
        manager
            .drop_index(Index::drop().name("idx_review_user").table(Review::Table).to_owned())
            .await
    }
}

#[derive(DeriveIden)]
enum City { Table, StateId }

#[derive(DeriveIden)]
enum Place { Table, CityId, UserId }

#[derive(DeriveIden)]
enum Review { Table, PlaceId, UserId }
