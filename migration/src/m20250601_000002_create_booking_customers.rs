use sea_orm_migration::{prelude::*, schema::*};

use super::m20250601_000001_create_bookings::Bookings;

#[derive(DeriveMigrationName)]
pub struct Migration;

#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .create_table(
                Table::create()
                    .table(BookingCustomers::Table)
                    .if_not_exists()
                    .col(pk_auto(BookingCustomers::Id))
                    .col(integer(BookingCustomers::BookingId).not_null())
                    .col(string_len(BookingCustomers::CustomerName, 255).not_null())
                    .col(string_len_null(BookingCustomers::CustomerEmail, 255))
                    .col(string_len_null(BookingCustomers::CustomerPhone, 32))
                    .col(string_len_null(BookingCustomers::SeatRoomNumber, 50))
                    .col(decimal_len(BookingCustomers::CustomerAmount, 12, 2).not_null())
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_booking_customers_booking")
                            .from(BookingCustomers::Table, BookingCustomers::BookingId)
                            .to(Bookings::Table, Bookings::Id)
                            .on_delete(ForeignKeyAction::Cascade),
                    )
                    .to_owned(),
            )
            .await?;

        manager
            .create_index(
                Index::create()
                    .name("idx_booking_customers_booking_id")
                    .table(BookingCustomers::Table)
                    .col(BookingCustomers::BookingId)
                    .to_owned(),
            )
            .await
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .drop_table(Table::drop().table(BookingCustomers::Table).to_owned())
            .await
    }
}

#[derive(DeriveIden)]
pub enum BookingCustomers {
    Table,
    Id,
    BookingId,
    CustomerName,
    CustomerEmail,
    CustomerPhone,
    SeatRoomNumber,
    CustomerAmount,
}
