pub mod app_setting;
pub mod booking;
pub mod booking_customer;
