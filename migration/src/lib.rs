pub use sea_orm_migration::prelude::*;

mod m20250601_000001_create_bookings;
mod m20250601_000002_create_booking_customers;
mod m20250615_000001_create_app_settings;

pub struct Migrator;

#[async_trait::async_trait]
impl MigratorTrait for Migrator {
    fn migrations() -> Vec<Box<dyn MigrationTrait>> {
        vec![
            Box::new(m20250601_000001_create_bookings::Migration),
            Box::new(m20250601_000002_create_booking_customers::Migration),
            Box::new(m20250615_000001_create_app_settings::Migration),
        ]
    }
}
