use std::fmt;
use std::str::FromStr;

use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, EnumIter, DeriveActiveEnum, Serialize, Deserialize)]
#[sea_orm(rs_type = "String", db_type = "String(StringLen::N(20))")]
pub enum BookingType {
    #[sea_orm(string_value = "Hotel")]
    Hotel,
    #[sea_orm(string_value = "Flight")]
    Flight,
    #[sea_orm(string_value = "Train")]
    Train,
    #[sea_orm(string_value = "Bus")]
    Bus,
    #[sea_orm(string_value = "Transport")]
    Transport,
}

impl BookingType {
    pub const ALL: [BookingType; 5] = [
        BookingType::Hotel,
        BookingType::Flight,
        BookingType::Train,
        BookingType::Bus,
        BookingType::Transport,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            BookingType::Hotel => "Hotel",
            BookingType::Flight => "Flight",
            BookingType::Train => "Train",
            BookingType::Bus => "Bus",
            BookingType::Transport => "Transport",
        }
    }

    /// Label printed next to the vehicle/room number on invoices
    pub fn vehicle_label(&self) -> &'static str {
        match self {
            BookingType::Hotel => "Room Number:",
            BookingType::Flight => "Flight Number:",
            BookingType::Train => "Train Number:",
            BookingType::Bus => "Bus Number:",
            BookingType::Transport => "Vehicle Number:",
        }
    }
}

impl fmt::Display for BookingType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for BookingType {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        BookingType::ALL
            .into_iter()
            .find(|t| t.as_str() == s)
            .ok_or_else(|| {
                let names: Vec<&str> = BookingType::ALL.iter().map(|t| t.as_str()).collect();
                format!("Invalid booking type. Must be one of: {}", names.join(", "))
            })
    }
}

#[derive(Clone, Debug, PartialEq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "bookings")]
pub struct Model {
    #[sea_orm(primary_key)]
    pub id: i32,
    pub name: String,
    pub email: Option<String>,
    pub phone: String,
    pub booking_type: BookingType,
    pub base_amount: Decimal,
    pub gst: Decimal,
    pub total: Decimal,
    pub created_at: DateTimeWithTimeZone,
    pub hotel_name: Option<String>,
    pub hotel_city: Option<String>,
    pub hotel_country: Option<String>,
    pub operator_name: Option<String>,
    pub from_journey: Option<String>,
    pub from_journey_country: Option<String>,
    pub to_journey: Option<String>,
    pub to_journey_country: Option<String>,
    pub vehicle_number: Option<String>,
    pub service_date: Option<String>,
    pub service_time: Option<String>,
    #[sea_orm(column_type = "Text", nullable)]
    pub customer_address: Option<String>,
    pub apply_gst: bool,
    pub is_group_booking: bool,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(has_many = "super::booking_customer::Entity")]
    Customers,
}

impl Related<super::booking_customer::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Customers.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_booking_type_parses_exact_names() {
        assert_eq!("Hotel".parse::<BookingType>().unwrap(), BookingType::Hotel);
        assert_eq!("Transport".parse::<BookingType>().unwrap(), BookingType::Transport);
    }

    #[test]
    fn test_booking_type_rejects_unknown() {
        let err = "Cruise".parse::<BookingType>().unwrap_err();
        assert_eq!(
            err,
            "Invalid booking type. Must be one of: Hotel, Flight, Train, Bus, Transport"
        );
        // Matching is case-sensitive, as stored
        assert!("hotel".parse::<BookingType>().is_err());
    }
}
