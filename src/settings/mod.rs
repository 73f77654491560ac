//! Business settings: a typed catalog, the `app_settings` table behind it,
//! and the immutable [`Settings`] snapshot the rest of the crate reads.

pub mod catalog;
pub mod store;

use std::collections::HashMap;
use std::str::FromStr;
use std::sync::{Arc, RwLock};

use rust_decimal::Decimal;
use rust_decimal_macros::dec;

pub use catalog::{SettingCategory, SettingDefinition, SettingType, CATALOG};
pub use store::{SettingView, SettingsStore};

/// GST percentage used when the settings table cannot be read
pub const DEFAULT_GST_PERCENT: Decimal = dec!(5);

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WhatsAppProvider {
    Mock,
    GreenApi,
}

#[derive(Debug, Clone, PartialEq)]
pub struct AgencyInfo {
    pub name: String,
    pub tagline: String,
    pub gstin: String,
    pub address: String,
    pub phone: String,
    pub email: String,
}

#[derive(Debug, Clone, PartialEq)]
pub struct WhatsAppSettings {
    pub enabled: bool,
    pub send_on_booking: bool,
    pub provider: WhatsAppProvider,
    pub green_api_instance_id: String,
    pub green_api_token: String,
}

#[derive(Debug, Clone, PartialEq)]
pub struct EmailSettings {
    pub enabled: bool,
    pub smtp_server: String,
    pub smtp_port: u16,
    pub smtp_username: String,
    pub smtp_password: String,
    /// Falls back to `smtp_username` when empty
    pub from_email: String,
}

impl EmailSettings {
    /// Server, login and password are all needed to send
    pub fn is_complete(&self) -> bool {
        !self.smtp_server.is_empty() && !self.smtp_username.is_empty() && !self.smtp_password.is_empty()
    }

    pub fn sender(&self) -> &str {
        if self.from_email.is_empty() {
            &self.smtp_username
        } else {
            &self.from_email
        }
    }
}

/// Point-in-time view of the business settings. Never mutated; a refresh
/// builds a new one.
#[derive(Debug, Clone, PartialEq)]
pub struct Settings {
    pub gst_percent: Decimal,
    pub apply_gst_default: bool,
    pub agency: AgencyInfo,
    pub whatsapp: WhatsAppSettings,
    pub email: EmailSettings,
    pub default_page_size: u64,
}

impl Default for Settings {
    fn default() -> Self {
        Self::from_values(&HashMap::new())
    }
}

impl Settings {
    /// Build a snapshot from stored `key -> value` pairs. Missing or invalid
    /// values fall back to the catalog default.
    pub fn from_values(values: &HashMap<String, String>) -> Self {
        let raw = |key: &str| -> String {
            let Some(def) = catalog::find(key) else {
                return String::new();
            };
            match values.get(key) {
                Some(value) if def.validate(value).is_ok() => value.trim().to_string(),
                Some(value) => {
                    tracing::warn!(key, value = %value, "Ignoring invalid stored setting");
                    def.default.to_string()
                }
                None => def.default.to_string(),
            }
        };
        let flag = |key: &str| catalog::parse_bool(&raw(key)).unwrap_or(false);

        let provider = match raw("whatsapp_provider").as_str() {
            "green_api" => WhatsAppProvider::GreenApi,
            _ => WhatsAppProvider::Mock,
        };

        Self {
            gst_percent: Decimal::from_str(&raw("gst_percent")).unwrap_or(DEFAULT_GST_PERCENT),
            apply_gst_default: flag("apply_gst_default"),
            agency: AgencyInfo {
                name: raw("agency_name"),
                tagline: raw("agency_tagline"),
                gstin: raw("gstin"),
                address: raw("agency_address"),
                phone: raw("agency_phone"),
                email: raw("agency_email"),
            },
            whatsapp: WhatsAppSettings {
                enabled: flag("whatsapp_enabled"),
                send_on_booking: flag("whatsapp_send_on_booking"),
                provider,
                green_api_instance_id: raw("green_api_instance_id"),
                green_api_token: raw("green_api_token"),
            },
            email: EmailSettings {
                enabled: flag("email_enabled"),
                smtp_server: raw("smtp_server"),
                smtp_port: raw("smtp_port").parse().unwrap_or(587),
                smtp_username: raw("smtp_username"),
                smtp_password: raw("smtp_password"),
                from_email: raw("from_email"),
            },
            default_page_size: raw("default_page_size").parse().unwrap_or(10),
        }
    }
}

/// Handle to the current settings snapshot, shared across requests.
///
/// Readers clone the inner `Arc` and keep working on that snapshot even if a
/// refresh swaps in a new one mid-request.
#[derive(Clone, Debug)]
pub struct SharedSettings(Arc<RwLock<Arc<Settings>>>);

impl SharedSettings {
    pub fn new(settings: Settings) -> Self {
        Self(Arc::new(RwLock::new(Arc::new(settings))))
    }

    pub fn current(&self) -> Arc<Settings> {
        let guard = self.0.read().unwrap_or_else(|poisoned| poisoned.into_inner());
        Arc::clone(&guard)
    }

    pub fn replace(&self, settings: Settings) -> Arc<Settings> {
        let snapshot = Arc::new(settings);
        let mut guard = self.0.write().unwrap_or_else(|poisoned| poisoned.into_inner());
        *guard = Arc::clone(&snapshot);
        snapshot
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let settings = Settings::default();
        assert_eq!(settings.gst_percent, dec!(5));
        assert!(settings.apply_gst_default);
        assert_eq!(settings.agency.name, "Himanshi Travels");
        assert_eq!(settings.whatsapp.provider, WhatsAppProvider::Mock);
        assert_eq!(settings.default_page_size, 10);
        assert!(!settings.email.enabled);
        assert_eq!(settings.email.smtp_port, 587);
    }

    #[test]
    fn test_email_sender_falls_back_to_login() {
        let values = HashMap::from([
            ("smtp_server".to_string(), "smtp.example.com".to_string()),
            ("smtp_username".to_string(), "agent@example.com".to_string()),
            ("smtp_password".to_string(), "secret".to_string()),
            ("smtp_port".to_string(), "2525".to_string()),
        ]);
        let email = Settings::from_values(&values).email;
        assert!(email.is_complete());
        assert_eq!(email.smtp_port, 2525);
        assert_eq!(email.sender(), "agent@example.com");

        let email = EmailSettings {
            from_email: "bookings@example.com".to_string(),
            ..email
        };
        assert_eq!(email.sender(), "bookings@example.com");
    }

    #[test]
    fn test_stored_values_override_defaults() {
        let values = HashMap::from([
            ("gst_percent".to_string(), "18".to_string()),
            ("apply_gst_default".to_string(), "false".to_string()),
            ("whatsapp_provider".to_string(), "green_api".to_string()),
        ]);
        let settings = Settings::from_values(&values);
        assert_eq!(settings.gst_percent, dec!(18));
        assert!(!settings.apply_gst_default);
        assert_eq!(settings.whatsapp.provider, WhatsAppProvider::GreenApi);
    }

    #[test]
    fn test_invalid_stored_value_falls_back() {
        let values = HashMap::from([("gst_percent".to_string(), "lots".to_string())]);
        assert_eq!(Settings::from_values(&values).gst_percent, DEFAULT_GST_PERCENT);
    }

    #[test]
    fn test_replace_keeps_old_snapshot_alive() {
        let shared = SharedSettings::new(Settings::default());
        let before = shared.current();

        let mut next = Settings::default();
        next.gst_percent = dec!(12);
        shared.replace(next);

        assert_eq!(before.gst_percent, dec!(5));
        assert_eq!(shared.current().gst_percent, dec!(12));
    }
}
