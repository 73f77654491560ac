use sea_orm_migration::{prelude::*, schema::*};

#[derive(DeriveMigrationName)]
pub struct Migration;

#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .create_table(
                Table::create()
                    .table(Bookings::Table)
                    .if_not_exists()
                    .col(pk_auto(Bookings::Id))
                    .col(string_len(Bookings::Name, 255).not_null())
                    .col(string_len_null(Bookings::Email, 255))
                    .col(string_len(Bookings::Phone, 32).not_null())
                    .col(string_len(Bookings::BookingType, 20).not_null())
                    .col(decimal_len(Bookings::BaseAmount, 12, 2).not_null())
                    .col(decimal_len(Bookings::Gst, 12, 2).not_null())
                    .col(decimal_len(Bookings::Total, 12, 2).not_null())
                    .col(
                        timestamp_with_time_zone(Bookings::CreatedAt)
                            .not_null()
                            .default(Expr::current_timestamp()),
                    )
                    .col(string_len_null(Bookings::HotelName, 255))
                    .col(string_len_null(Bookings::HotelCity, 100))
                    .col(string_len_null(Bookings::HotelCountry, 100))
                    .col(string_len_null(Bookings::OperatorName, 255))
                    .col(string_len_null(Bookings::FromJourney, 100))
                    .col(string_len_null(Bookings::FromJourneyCountry, 100))
                    .col(string_len_null(Bookings::ToJourney, 100))
                    .col(string_len_null(Bookings::ToJourneyCountry, 100))
                    .col(string_len_null(Bookings::VehicleNumber, 50))
                    .col(string_len_null(Bookings::ServiceDate, 20))
                    .col(string_len_null(Bookings::ServiceTime, 20))
                    .col(text_null(Bookings::CustomerAddress))
                    .col(boolean(Bookings::ApplyGst).not_null().default(true))
                    .col(boolean(Bookings::IsGroupBooking).not_null().default(false))
                    .to_owned(),
            )
            .await?;

        // Listing is newest-first, filtered by type
        manager
            .create_index(
                Index::create()
                    .name("idx_bookings_created_at")
                    .table(Bookings::Table)
                    .col(Bookings::CreatedAt)
                    .to_owned(),
            )
            .await?;

        manager
            .create_index(
                Index::create()
                    .name("idx_bookings_booking_type")
                    .table(Bookings::Table)
                    .col(Bookings::BookingType)
                    .to_owned(),
            )
            .await
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .drop_table(Table::drop().table(Bookings::Table).to_owned())
            .await
    }
}

#[derive(DeriveIden)]
pub enum Bookings {
    Table,
    Id,
    Name,
    Email,
    Phone,
    BookingType,
    BaseAmount,
    Gst,
    Total,
    CreatedAt,
    HotelName,
    HotelCity,
    HotelCountry,
    OperatorName,
    FromJourney,
    FromJourneyCountry,
    ToJourney,
    ToJourneyCountry,
    VehicleNumber,
    ServiceDate,
    ServiceTime,
    CustomerAddress,
    ApplyGst,
    IsGroupBooking,
}
