use std::str::FromStr;
use std::sync::LazyLock;

use regex::Regex;
use rust_decimal::Decimal;
use rust_decimal_macros::dec;
use serde::Serialize;

use crate::utils::validation::is_valid_email;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum SettingType {
    String,
    Boolean,
    Number,
    Password,
    Email,
    Url,
    Phone,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum SettingCategory {
    Business,
    Whatsapp,
    Email,
    App,
}

/// One entry of the settings catalog
#[derive(Debug, Clone, Serialize)]
pub struct SettingDefinition {
    pub key: &'static str,
    pub setting_type: SettingType,
    pub category: SettingCategory,
    pub description: &'static str,
    pub default: &'static str,
    pub required: bool,
    pub sensitive: bool,
    /// Inclusive bounds for numeric settings
    #[serde(skip)]
    pub bounds: Option<(Decimal, Decimal)>,
    /// Allowed values, empty when free-form
    pub choices: &'static [&'static str],
    #[serde(skip)]
    pub pattern: Option<&'static str>,
}

const fn field(
    key: &'static str,
    setting_type: SettingType,
    category: SettingCategory,
    description: &'static str,
    default: &'static str,
) -> SettingDefinition {
    SettingDefinition {
        key,
        setting_type,
        category,
        description,
        default,
        required: false,
        sensitive: false,
        bounds: None,
        choices: &[],
        pattern: None,
    }
}

const GSTIN_PATTERN: &str = r"^\d{2}[A-Z]{5}\d{4}[A-Z][A-Z\d]Z[A-Z\d]$";

pub const CATALOG: &[SettingDefinition] = &[
    SettingDefinition {
        required: true,
        bounds: Some((Decimal::ZERO, Decimal::ONE_HUNDRED)),
        ..field(
            "gst_percent",
            SettingType::Number,
            SettingCategory::Business,
            "GST percentage applied to the base amount",
            "5",
        )
    },
    field(
        "apply_gst_default",
        SettingType::Boolean,
        SettingCategory::Business,
        "Apply GST when the booking form does not say otherwise",
        "true",
    ),
    SettingDefinition {
        required: true,
        ..field(
            "agency_name",
            SettingType::String,
            SettingCategory::Business,
            "Agency name printed on invoices",
            "Himanshi Travels",
        )
    },
    field(
        "agency_tagline",
        SettingType::String,
        SettingCategory::Business,
        "Tagline printed under the agency name",
        "Your Journey, Our Passion",
    ),
    SettingDefinition {
        required: true,
        pattern: Some(GSTIN_PATTERN),
        ..field(
            "gstin",
            SettingType::String,
            SettingCategory::Business,
            "GST identification number",
            "29ABCDE1234F2Z5",
        )
    },
    field(
        "agency_address",
        SettingType::String,
        SettingCategory::Business,
        "Postal address printed on invoices",
        "123 Travel Street, Adventure City, State 123456",
    ),
    field(
        "agency_phone",
        SettingType::Phone,
        SettingCategory::Business,
        "Contact number for customer queries",
        "+91 98765 43210",
    ),
    field(
        "agency_email",
        SettingType::Email,
        SettingCategory::Business,
        "Contact email for customer queries",
        "info@himanshitravels.com",
    ),
    field(
        "whatsapp_enabled",
        SettingType::Boolean,
        SettingCategory::Whatsapp,
        "Enable WhatsApp notifications",
        "true",
    ),
    field(
        "whatsapp_send_on_booking",
        SettingType::Boolean,
        SettingCategory::Whatsapp,
        "Send a confirmation message when a booking is created",
        "true",
    ),
    SettingDefinition {
        choices: &["mock", "green_api"],
        ..field(
            "whatsapp_provider",
            SettingType::String,
            SettingCategory::Whatsapp,
            "WhatsApp delivery provider",
            "mock",
        )
    },
    field(
        "green_api_instance_id",
        SettingType::String,
        SettingCategory::Whatsapp,
        "Green API instance id",
        "",
    ),
    SettingDefinition {
        sensitive: true,
        ..field(
            "green_api_token",
            SettingType::Password,
            SettingCategory::Whatsapp,
            "Green API token",
            "",
        )
    },
    field(
        "email_enabled",
        SettingType::Boolean,
        SettingCategory::Email,
        "Email a confirmation with the invoice attached when a booking is created",
        "false",
    ),
    field(
        "smtp_server",
        SettingType::String,
        SettingCategory::Email,
        "SMTP relay host, reached over STARTTLS",
        "",
    ),
    SettingDefinition {
        bounds: Some((Decimal::ONE, dec!(65535))),
        ..field(
            "smtp_port",
            SettingType::Number,
            SettingCategory::Email,
            "SMTP relay port",
            "587",
        )
    },
    field(
        "smtp_username",
        SettingType::String,
        SettingCategory::Email,
        "SMTP login",
        "",
    ),
    SettingDefinition {
        sensitive: true,
        ..field(
            "smtp_password",
            SettingType::Password,
            SettingCategory::Email,
            "SMTP password",
            "",
        )
    },
    field(
        "from_email",
        SettingType::Email,
        SettingCategory::Email,
        "Sender address, the SMTP login when empty",
        "",
    ),
    SettingDefinition {
        bounds: Some((Decimal::ONE, Decimal::ONE_HUNDRED)),
        ..field(
            "default_page_size",
            SettingType::Number,
            SettingCategory::App,
            "Bookings per page when the request does not say",
            "10",
        )
    },
];

pub fn find(key: &str) -> Option<&'static SettingDefinition> {
    CATALOG.iter().find(|d| d.key == key)
}

/// Accepts true/false, 1/0 and yes/no in any case
pub fn parse_bool(value: &str) -> Option<bool> {
    match value.trim().to_ascii_lowercase().as_str() {
        "true" | "1" | "yes" | "on" => Some(true),
        "false" | "0" | "no" | "off" => Some(false),
        _ => None,
    }
}

impl SettingDefinition {
    pub fn validate(&self, value: &str) -> Result<(), String> {
        let value = value.trim();

        if value.is_empty() {
            return if self.required {
                Err(format!("{} is required", self.key))
            } else {
                Ok(())
            };
        }

        match self.setting_type {
            SettingType::Email if !is_valid_email(value) => {
                return Err("Invalid email format".to_string());
            }
            SettingType::Url if !is_valid_url(value) => {
                return Err("Invalid URL format (must start with http:// or https://)".to_string());
            }
            SettingType::Phone => {
                let digits = value.chars().filter(|c| c.is_ascii_digit()).count();
                if !(10..=15).contains(&digits) {
                    return Err("Phone number must be between 10-15 digits".to_string());
                }
            }
            SettingType::Number => {
                let number = Decimal::from_str(value)
                    .map_err(|_| "Value must be a number".to_string())?;
                if let Some((min, max)) = self.bounds {
                    if number < min || number > max {
                        return Err(format!("Value must be between {} and {}", min, max));
                    }
                }
            }
            SettingType::Boolean if parse_bool(value).is_none() => {
                return Err("Value must be true or false".to_string());
            }
            _ => {}
        }

        if !self.choices.is_empty() && !self.choices.contains(&value) {
            return Err(format!("Value must be one of: {}", self.choices.join(", ")));
        }

        if let Some(pattern) = self.pattern {
            let matches = Regex::new(pattern)
                .map(|re| re.is_match(value))
                .unwrap_or(false);
            if !matches {
                return Err(format!("Invalid {} format", self.key));
            }
        }

        Ok(())
    }
}

fn is_valid_url(value: &str) -> bool {
    static REGEX: LazyLock<Regex> = LazyLock::new(|| {
        Regex::new(r"^https?://[^\s/$.?#].[^\s]*$").expect("valid regex")
    });

    REGEX.is_match(value)
}
