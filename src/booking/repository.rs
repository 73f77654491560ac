use std::collections::HashMap;

use chrono::Utc;
use sea_orm::sea_query::{Expr, Func, LikeExpr};
use sea_orm::{
    ActiveModelTrait, ColumnTrait, Condition, ConnectionTrait, DatabaseConnection,
    DatabaseTransaction, EntityTrait, PaginatorTrait, QueryFilter, QueryOrder, Set,
    TransactionTrait,
};
use serde::Serialize;

use super::{BookingDetails, BookingFields, NewCustomer};
use crate::entities::booking::{self, BookingType};
use crate::entities::booking_customer;
use crate::error::AppResult;
use crate::utils::format::display_id;

/// Columns matched by free-text search
const SEARCH_COLUMNS: [booking::Column; 8] = [
    booking::Column::Name,
    booking::Column::Email,
    booking::Column::Phone,
    booking::Column::HotelName,
    booking::Column::OperatorName,
    booking::Column::FromJourney,
    booking::Column::ToJourney,
    booking::Column::VehicleNumber,
];

/// Customer names shown next to a search result
const SUMMARY_NAME_LIMIT: usize = 3;

#[derive(Debug, Clone)]
pub struct SearchQuery {
    pub query: Option<String>,
    pub booking_type: Option<BookingType>,
    /// 1-based
    pub page: u64,
    pub page_size: u64,
}

#[derive(Debug, Clone, Serialize)]
pub struct BookingSummary {
    #[serde(flatten)]
    pub booking: booking::Model,
    pub customer_count: usize,
    pub customer_names: Vec<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Pagination {
    pub page: u64,
    pub per_page: u64,
    pub total: u64,
    pub total_pages: u64,
    pub has_next: bool,
    pub has_prev: bool,
}

impl Pagination {
    pub fn new(page: u64, per_page: u64, total: u64) -> Self {
        let total_pages = total.div_ceil(per_page);
        Self {
            page,
            per_page,
            total,
            total_pages,
            has_next: page < total_pages,
            has_prev: page > 1,
        }
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct SearchPage {
    pub items: Vec<BookingSummary>,
    pub pagination: Pagination,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct DeleteOutcome {
    #[serde(rename = "success")]
    pub deleted: bool,
    pub message: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct BulkDeleteOutcome {
    pub success: bool,
    pub message: String,
    pub deleted_count: usize,
    #[serde(skip)]
    pub deleted_ids: Vec<i32>,
}

/// Escape LIKE wildcards so user input is matched literally
fn escape_like(input: &str) -> String {
    let mut escaped = String::with_capacity(input.len());
    for c in input.chars() {
        if matches!(c, '\\' | '%' | '_') {
            escaped.push('\\');
        }
        escaped.push(c);
    }
    escaped
}

fn write_fields(model: &mut booking::ActiveModel, fields: &BookingFields) {
    let details = &fields.details;
    model.name = Set(fields.name.clone());
    model.email = Set(fields.email.clone());
    model.phone = Set(fields.phone.clone());
    model.booking_type = Set(fields.booking_type);
    model.base_amount = Set(fields.base_amount);
    model.gst = Set(fields.gst);
    model.total = Set(fields.total);
    model.hotel_name = Set(details.hotel_name.clone());
    model.hotel_city = Set(details.hotel_city.clone());
    model.hotel_country = Set(details.hotel_country.clone());
    model.operator_name = Set(details.operator_name.clone());
    model.from_journey = Set(details.from_journey.clone());
    model.from_journey_country = Set(details.from_journey_country.clone());
    model.to_journey = Set(details.to_journey.clone());
    model.to_journey_country = Set(details.to_journey_country.clone());
    model.vehicle_number = Set(details.vehicle_number.clone());
    model.service_date = Set(details.service_date.clone());
    model.service_time = Set(details.service_time.clone());
    model.customer_address = Set(fields.customer_address.clone());
    model.apply_gst = Set(fields.apply_gst);
    model.is_group_booking = Set(fields.is_group_booking);
}

/// Commit on success, roll back otherwise
async fn finish<T>(txn: DatabaseTransaction, result: AppResult<T>) -> AppResult<T> {
    match result {
        Ok(value) => {
            txn.commit().await?;
            Ok(value)
        }
        Err(e) => {
            if let Err(rollback_err) = txn.rollback().await {
                tracing::warn!(error = %rollback_err, "Transaction rollback failed");
            }
            Err(e)
        }
    }
}

pub struct BookingRepository;

impl BookingRepository {
    /// Insert the booking row and return its id
    pub async fn create<C: ConnectionTrait>(db: &C, fields: &BookingFields) -> AppResult<i32> {
        let mut model = booking::ActiveModel {
            created_at: Set(Utc::now().into()),
            ..Default::default()
        };
        write_fields(&mut model, fields);

        let result = booking::Entity::insert(model).exec(db).await?;
        Ok(result.last_insert_id)
    }

    pub async fn create_customers<C: ConnectionTrait>(
        db: &C,
        booking_id: i32,
        customers: &[NewCustomer],
    ) -> AppResult<()> {
        if customers.is_empty() {
            return Ok(());
        }

        let models = customers.iter().map(|c| booking_customer::ActiveModel {
            booking_id: Set(booking_id),
            customer_name: Set(c.name.clone()),
            customer_email: Set(c.email.clone()),
            customer_phone: Set(c.phone.clone()),
            seat_room_number: Set(c.seat_room.clone()),
            customer_amount: Set(c.amount),
            ..Default::default()
        });

        booking_customer::Entity::insert_many(models).exec(db).await?;
        Ok(())
    }

    /// Booking and customers in one transaction. Either both land or neither does.
    pub async fn create_with_customers(
        db: &DatabaseConnection,
        fields: &BookingFields,
        customers: &[NewCustomer],
    ) -> AppResult<i32> {
        let txn = db.begin().await?;
        let result = Self::insert_all(&txn, fields, customers).await;
        finish(txn, result).await
    }

    async fn insert_all(
        txn: &DatabaseTransaction,
        fields: &BookingFields,
        customers: &[NewCustomer],
    ) -> AppResult<i32> {
        let booking_id = Self::create(txn, fields).await?;
        Self::create_customers(txn, booking_id, customers).await?;
        Ok(booking_id)
    }

    pub async fn get_by_id<C: ConnectionTrait>(
        db: &C,
        booking_id: i32,
    ) -> AppResult<Option<BookingDetails>> {
        let Some(booking) = booking::Entity::find_by_id(booking_id).one(db).await? else {
            return Ok(None);
        };

        let customers = if booking.is_group_booking {
            booking_customer::Entity::find()
                .filter(booking_customer::Column::BookingId.eq(booking_id))
                .order_by_asc(booking_customer::Column::Id)
                .all(db)
                .await?
        } else {
            Vec::new()
        };

        Ok(Some(BookingDetails { booking, customers }))
    }

    /// Case-insensitive search, newest first, one page at a time
    pub async fn search<C: ConnectionTrait>(db: &C, query: &SearchQuery) -> AppResult<SearchPage> {
        let page = query.page.max(1);
        let per_page = query.page_size.max(1);

        let mut select = booking::Entity::find();

        let term = query.query.as_deref().map(str::trim).filter(|q| !q.is_empty());
        if let Some(term) = term {
            let pattern = format!("%{}%", escape_like(&term.to_lowercase()));
            let condition = SEARCH_COLUMNS.iter().fold(Condition::any(), |cond, column| {
                cond.add(
                    Expr::expr(Func::lower(Expr::col(*column)))
                        .like(LikeExpr::new(pattern.clone()).escape('\\')),
                )
            });
            select = select.filter(condition);
        }

        if let Some(booking_type) = query.booking_type {
            select = select.filter(booking::Column::BookingType.eq(booking_type));
        }

        let paginator = select
            .order_by_desc(booking::Column::CreatedAt)
            .order_by_desc(booking::Column::Id)
            .paginate(db, per_page);

        let total = paginator.num_items().await?;
        let pagination = Pagination::new(page, per_page, total);

        // Past the last page there is nothing to fetch
        let bookings = if page > pagination.total_pages {
            Vec::new()
        } else {
            paginator.fetch_page(page - 1).await?
        };

        let group_ids: Vec<i32> = bookings
            .iter()
            .filter(|b| b.is_group_booking)
            .map(|b| b.id)
            .collect();

        let mut names_by_booking: HashMap<i32, Vec<String>> = HashMap::new();
        if !group_ids.is_empty() {
            let customers = booking_customer::Entity::find()
                .filter(booking_customer::Column::BookingId.is_in(group_ids))
                .order_by_asc(booking_customer::Column::Id)
                .all(db)
                .await?;
            for customer in customers {
                names_by_booking
                    .entry(customer.booking_id)
                    .or_default()
                    .push(customer.customer_name);
            }
        }

        let items = bookings
            .into_iter()
            .map(|booking| {
                let names = names_by_booking.remove(&booking.id).unwrap_or_default();
                BookingSummary {
                    customer_count: names.len(),
                    customer_names: names.into_iter().take(SUMMARY_NAME_LIMIT).collect(),
                    booking,
                }
            })
            .collect();

        Ok(SearchPage { items, pagination })
    }

    /// Overwrite a booking. `Some(customers)` replaces the traveller list, `None`
    /// clears it. Returns false when the booking does not exist.
    pub async fn update(
        db: &DatabaseConnection,
        booking_id: i32,
        fields: &BookingFields,
        customers: Option<&[NewCustomer]>,
    ) -> AppResult<bool> {
        let txn = db.begin().await?;
        let result = Self::overwrite(&txn, booking_id, fields, customers).await;
        finish(txn, result).await
    }

    async fn overwrite(
        txn: &DatabaseTransaction,
        booking_id: i32,
        fields: &BookingFields,
        customers: Option<&[NewCustomer]>,
    ) -> AppResult<bool> {
        let Some(existing) = booking::Entity::find_by_id(booking_id).one(txn).await? else {
            return Ok(false);
        };

        let mut model: booking::ActiveModel = existing.into();
        write_fields(&mut model, fields);
        model.update(txn).await?;

        booking_customer::Entity::delete_many()
            .filter(booking_customer::Column::BookingId.eq(booking_id))
            .exec(txn)
            .await?;

        if let Some(customers) = customers {
            let named: Vec<NewCustomer> = customers
                .iter()
                .filter(|c| !c.name.trim().is_empty())
                .cloned()
                .collect();
            Self::create_customers(txn, booking_id, &named).await?;
        }

        Ok(true)
    }

    pub async fn delete(db: &DatabaseConnection, booking_id: i32) -> AppResult<DeleteOutcome> {
        let txn = db.begin().await?;
        let result = Self::remove(&txn, booking_id).await;
        finish(txn, result).await
    }

    async fn remove(txn: &DatabaseTransaction, booking_id: i32) -> AppResult<DeleteOutcome> {
        let Some(existing) = booking::Entity::find_by_id(booking_id).one(txn).await? else {
            return Ok(DeleteOutcome {
                deleted: false,
                message: "Booking not found".to_string(),
            });
        };

        booking_customer::Entity::delete_many()
            .filter(booking_customer::Column::BookingId.eq(booking_id))
            .exec(txn)
            .await?;
        booking::Entity::delete_by_id(booking_id).exec(txn).await?;

        let kind = if existing.is_group_booking {
            "Group Booking"
        } else {
            "Booking"
        };

        Ok(DeleteOutcome {
            deleted: true,
            message: format!(
                "{} {} for {} has been deleted successfully",
                kind,
                display_id(booking_id),
                existing.name
            ),
        })
    }

    /// Delete each id on its own. Failures are logged and skipped.
    pub async fn bulk_delete(db: &DatabaseConnection, booking_ids: &[i32]) -> BulkDeleteOutcome {
        let mut deleted_ids = Vec::new();

        for &booking_id in booking_ids {
            match Self::delete(db, booking_id).await {
                Ok(outcome) if outcome.deleted => deleted_ids.push(booking_id),
                Ok(_) => tracing::debug!(booking_id, "Bulk delete skipped missing booking"),
                Err(e) => tracing::warn!(booking_id, error = %e, "Bulk delete failed for booking"),
            }
        }

        let deleted_count = deleted_ids.len();
        if deleted_count == 0 {
            return BulkDeleteOutcome {
                success: false,
                message: "No bookings were deleted".to_string(),
                deleted_count,
                deleted_ids,
            };
        }

        BulkDeleteOutcome {
            success: true,
            message: format!("Successfully deleted {} booking(s)", deleted_count),
            deleted_count,
            deleted_ids,
        }
    }

    /// Every booking, newest first
    pub async fn export_all<C: ConnectionTrait>(db: &C) -> AppResult<Vec<booking::Model>> {
        let bookings = booking::Entity::find()
            .order_by_desc(booking::Column::CreatedAt)
            .order_by_desc(booking::Column::Id)
            .all(db)
            .await?;
        Ok(bookings)
    }
}
