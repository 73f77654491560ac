pub mod booking;
pub mod config;
pub mod db;
pub mod entities;
pub mod error;
pub mod handlers;
pub mod middleware;
pub mod notify;
pub mod routes;
pub mod settings;
pub mod utils;

use sea_orm::DatabaseConnection;

pub use config::Config;
pub use error::{AppError, AppResult};

use notify::Notifications;
use settings::SharedSettings;

#[derive(Clone)]
pub struct AppState {
    pub db: DatabaseConnection,
    pub settings: SharedSettings,
    pub notifications: Notifications,
}
