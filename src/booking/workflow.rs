use sea_orm::DatabaseConnection;

use super::form::BookingForm;
use super::repository::BookingRepository;
use super::totals::compute_totals;
use super::validator::{self, BookingMode, ValidatedBooking, MAX_AMOUNT};
use super::{BookingFields, ServiceDetails};
use crate::error::{AppError, AppResult};
use crate::settings::Settings;
use crate::utils::format::display_id;

/// Result of a successful create
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Committed {
    pub booking_id: i32,
    pub message: String,
}

/// Validate, price and persist booking requests against one settings snapshot
pub struct BookingWorkflow<'a> {
    db: &'a DatabaseConnection,
    settings: &'a Settings,
}

impl<'a> BookingWorkflow<'a> {
    pub fn new(db: &'a DatabaseConnection, settings: &'a Settings) -> Self {
        Self { db, settings }
    }

    pub async fn create(&self, form: BookingForm) -> AppResult<Committed> {
        let form = form.clean();
        let mode = if form.is_group() {
            BookingMode::Group
        } else {
            BookingMode::Single
        };

        let valid = validator::validate(&form, mode).map_err(AppError::Validation)?;
        let fields = self.price(&form, &valid)?;

        let booking_id =
            BookingRepository::create_with_customers(self.db, &fields, &valid.customers).await?;

        tracing::info!(
            booking_id,
            booking_type = %valid.booking_type,
            total = %fields.total,
            customers = valid.customers.len(),
            "Booking created"
        );

        let message = match mode {
            BookingMode::Single => "Booking created successfully",
            BookingMode::Group => "Group booking created successfully",
        };

        Ok(Committed {
            booking_id,
            message: message.to_string(),
        })
    }

    pub async fn update(&self, booking_id: i32, form: BookingForm) -> AppResult<String> {
        let form = form.clean();
        let valid = validator::validate_update(&form).map_err(AppError::Validation)?;
        let fields = self.price(&form, &valid)?;

        let customers = match valid.mode {
            BookingMode::Group => Some(valid.customers.as_slice()),
            BookingMode::Single => None,
        };

        if !BookingRepository::update(self.db, booking_id, &fields, customers).await? {
            return Err(AppError::NotFound("Booking not found".to_string()));
        }

        tracing::info!(booking_id, total = %fields.total, "Booking updated");
        Ok(format!("Booking {} updated successfully", display_id(booking_id)))
    }

    fn price(&self, form: &BookingForm, valid: &ValidatedBooking) -> AppResult<BookingFields> {
        let apply_gst = form.apply_gst.unwrap_or(self.settings.apply_gst_default);
        let totals = compute_totals(valid.base_amount, apply_gst, self.settings.gst_percent)
            .filter(|totals| totals.total <= MAX_AMOUNT)
            .ok_or_else(|| {
                AppError::Validation(format!("Total amount cannot exceed {}", MAX_AMOUNT))
            })?;

        Ok(BookingFields {
            name: valid.name.clone(),
            email: valid.email.clone(),
            phone: valid.phone.clone(),
            booking_type: valid.booking_type,
            base_amount: valid.base_amount,
            gst: totals.tax,
            total: totals.total,
            details: ServiceDetails::from_form(form),
            customer_address: form.customer_address.clone(),
            apply_gst,
            is_group_booking: valid.mode == BookingMode::Group,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::booking::form::CustomerForm;
    use crate::db::test_connection;
    use crate::entities::booking;
    use rust_decimal_macros::dec;
    use sea_orm::{EntityTrait, PaginatorTrait};

    fn asha() -> BookingForm {
        BookingForm {
            name: Some("Asha".into()),
            phone: Some("9876543210".into()),
            booking_type: Some("Hotel".into()),
            base_amount: Some("1000".into()),
            apply_gst: Some(true),
            ..Default::default()
        }
    }

    fn group_form(amounts: &[&str]) -> BookingForm {
        BookingForm {
            booking_type: Some("Flight".into()),
            is_group_booking: Some(true),
            customers: amounts
                .iter()
                .enumerate()
                .map(|(i, amount)| CustomerForm {
                    name: Some(format!("Traveller {}", i + 1)),
                    amount: Some(amount.to_string()),
                    ..Default::default()
                })
                .collect(),
            ..Default::default()
        }
    }

    #[tokio::test]
    async fn test_single_booking_at_five_percent() {
        let db = test_connection().await;
        let settings = Settings::default();
        let workflow = BookingWorkflow::new(&db, &settings);

        let committed = workflow.create(asha()).await.unwrap();
        assert_eq!(committed.message, "Booking created successfully");

        let stored = BookingRepository::get_by_id(&db, committed.booking_id)
            .await
            .unwrap()
            .unwrap();
        assert_eq!(stored.booking.gst, dec!(50.00));
        assert_eq!(stored.booking.total, dec!(1050.00));
        assert!(stored.booking.apply_gst);
        assert!(!stored.booking.is_group_booking);
    }

    #[tokio::test]
    async fn test_group_booking_sums_customers() {
        let db = test_connection().await;
        let settings = Settings::default();
        let workflow = BookingWorkflow::new(&db, &settings);

        let mut form = group_form(&["1500", "2000"]);
        form.apply_gst = Some(true);
        let committed = workflow.create(form).await.unwrap();
        assert_eq!(committed.message, "Group booking created successfully");

        let stored = BookingRepository::get_by_id(&db, committed.booking_id)
            .await
            .unwrap()
            .unwrap();
        assert_eq!(stored.booking.base_amount, dec!(3500.00));
        assert_eq!(stored.booking.gst, dec!(175.00));
        assert_eq!(stored.booking.total, dec!(3675.00));
        assert_eq!(stored.booking.name, "Traveller 1");
        assert_eq!(stored.customers.len(), 2);

        let sum: rust_decimal::Decimal = stored.customers.iter().map(|c| c.customer_amount).sum();
        assert_eq!(sum, stored.booking.base_amount);
    }

    #[tokio::test]
    async fn test_invalid_request_writes_nothing() {
        let db = test_connection().await;
        let settings = Settings::default();
        let workflow = BookingWorkflow::new(&db, &settings);

        let mut form = asha();
        form.phone = Some("123".into());
        let err = workflow.create(form).await.unwrap_err();

        assert!(matches!(err, AppError::Validation(_)));
        assert_eq!(booking::Entity::find().count(&db).await.unwrap(), 0);
    }

    #[tokio::test]
    async fn test_gst_flag_falls_back_to_settings() {
        let db = test_connection().await;
        let settings = Settings {
            apply_gst_default: false,
            ..Settings::default()
        };
        let workflow = BookingWorkflow::new(&db, &settings);

        let mut form = asha();
        form.apply_gst = None;
        let committed = workflow.create(form).await.unwrap();

        let stored = BookingRepository::get_by_id(&db, committed.booking_id)
            .await
            .unwrap()
            .unwrap();
        assert_eq!(stored.booking.gst, dec!(0));
        assert_eq!(stored.booking.total, dec!(1000));
        assert!(!stored.booking.apply_gst);
    }

    #[tokio::test]
    async fn test_update_recomputes_totals() {
        let db = test_connection().await;
        let settings = Settings::default();
        let workflow = BookingWorkflow::new(&db, &settings);
        let id = workflow.create(asha()).await.unwrap().booking_id;

        let mut form = asha();
        form.base_amount = Some("2000".into());
        let message = workflow.update(id, form).await.unwrap();
        assert_eq!(message, format!("Booking {} updated successfully", display_id(id)));

        let stored = BookingRepository::get_by_id(&db, id).await.unwrap().unwrap();
        assert_eq!(stored.booking.gst, dec!(100));
        assert_eq!(stored.booking.total, dec!(2100));
    }

    #[tokio::test]
    async fn test_update_single_to_group() {
        let db = test_connection().await;
        let settings = Settings::default();
        let workflow = BookingWorkflow::new(&db, &settings);
        let id = workflow.create(asha()).await.unwrap().booking_id;

        workflow.update(id, group_form(&["100", "200"])).await.unwrap();

        let stored = BookingRepository::get_by_id(&db, id).await.unwrap().unwrap();
        assert!(stored.booking.is_group_booking);
        assert_eq!(stored.booking.base_amount, dec!(300));
        assert_eq!(stored.customers.len(), 2);
    }

    #[tokio::test]
    async fn test_update_missing_booking_is_not_found() {
        let db = test_connection().await;
        let settings = Settings::default();
        let workflow = BookingWorkflow::new(&db, &settings);

        let err = workflow.update(42, asha()).await.unwrap_err();
        assert!(matches!(err, AppError::NotFound(_)));
    }

    #[tokio::test]
    async fn test_oversized_amount_is_a_validation_error() {
        let db = test_connection().await;
        let settings = Settings::default();
        let workflow = BookingWorkflow::new(&db, &settings);

        let mut form = asha();
        form.base_amount = Some("79228162514264337593543950335".into());
        let err = workflow.create(form).await.unwrap_err();
        assert!(matches!(err, AppError::Validation(ref m) if m == "Missing or invalid field: base_amount"));

        let err = workflow
            .create(group_form(&["9999999999.99", "9999999999.99"]))
            .await
            .unwrap_err();
        assert!(matches!(err, AppError::Validation(_)));

        assert_eq!(booking::Entity::find().count(&db).await.unwrap(), 0);
    }

    #[tokio::test]
    async fn test_total_past_column_limit_is_rejected() {
        let db = test_connection().await;
        let settings = Settings::default();
        let workflow = BookingWorkflow::new(&db, &settings);

        let mut form = asha();
        form.base_amount = Some("9999999999.99".into());
        let err = workflow.create(form.clone()).await.unwrap_err();
        assert!(
            matches!(err, AppError::Validation(ref m) if m == "Total amount cannot exceed 9999999999.99")
        );

        // Without GST the same base fits
        form.apply_gst = Some(false);
        assert!(workflow.create(form).await.is_ok());
    }

    #[tokio::test]
    async fn test_padded_fields_read_back_trimmed() {
        let db = test_connection().await;
        let settings = Settings::default();
        let workflow = BookingWorkflow::new(&db, &settings);

        let form = BookingForm {
            name: Some("  Asha Rao ".into()),
            email: Some("  asha@example.com  ".into()),
            phone: Some(" 9876543210 ".into()),
            booking_type: Some(" Hotel ".into()),
            base_amount: Some(" 2500.50 ".into()),
            customer_address: Some("  12 MG Road, Pune  ".into()),
            hotel_name: Some("\tTaj Palace ".into()),
            hotel_city: Some(" Mumbai".into()),
            hotel_country: Some("   ".into()),
            service_date: Some(" 2024-03-01 ".into()),
            apply_gst: Some(true),
            ..Default::default()
        };
        let id = workflow.create(form).await.unwrap().booking_id;

        let stored = BookingRepository::get_by_id(&db, id).await.unwrap().unwrap();
        let booking = &stored.booking;
        assert_eq!(booking.name, "Asha Rao");
        assert_eq!(booking.email.as_deref(), Some("asha@example.com"));
        assert_eq!(booking.phone, "9876543210");
        assert_eq!(booking.booking_type, booking::BookingType::Hotel);
        assert_eq!(booking.customer_address.as_deref(), Some("12 MG Road, Pune"));
        assert_eq!(booking.hotel_name.as_deref(), Some("Taj Palace"));
        assert_eq!(booking.hotel_city.as_deref(), Some("Mumbai"));
        assert_eq!(booking.hotel_country, None);
        assert_eq!(booking.service_date.as_deref(), Some("2024-03-01"));
        assert_eq!(booking.base_amount, dec!(2500.50));
        // 2500.50 * 5% = 125.025 -> 125.02
        assert_eq!(booking.gst, dec!(125.02));
        assert_eq!(booking.total, dec!(2625.52));
        assert_eq!(booking.total, booking.base_amount + booking.gst);
        assert!(stored.customers.is_empty());
    }
}
