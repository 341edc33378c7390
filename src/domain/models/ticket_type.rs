use serde::{Deserialize, Serialize};
use chrono::{DateTime, Utc};
use sqlx::FromRow;
use uuid::Uuid;

/// Highest accepted ticket price, in minor units.
pub const MAX_TICKET_PRICE: i64 = 1_000_000_000;

/// A priced admission tier of an event. `price` is in minor currency units.
#[derive(Debug, Serialize, Deserialize, FromRow, Clone)]
pub struct TicketType {
    pub id: String,
    pub event_id: String,
    pub name: String,
    pub description: Option<String>,
    pub price: i64,
    pub currency: String,
    pub available_quantity: i32,
    pub sold_quantity: i32,
    pub max_per_user: i32,
    pub sales_start_date: Option<DateTime<Utc>>,
    pub sales_end_date: Option<DateTime<Utc>>,
    pub is_active: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

pub struct NewTicketTypeParams {
    pub event_id: String,
    pub name: String,
    pub description: Option<String>,
    pub price: i64,
    pub currency: Option<String>,
    pub available_quantity: i32,
    pub max_per_user: Option<i32>,
    pub sales_start_date: Option<DateTime<Utc>>,
    pub sales_end_date: Option<DateTime<Utc>>,
}

impl TicketType {
    pub fn new(params: NewTicketTypeParams) -> Self {
        let now = Utc::now();
        Self {
            id: Uuid::new_v4().to_string(),
            event_id: params.event_id,
            name: params.name,
            description: params.description,
            price: params.price,
            currency: params.currency.unwrap_or_else(|| "USD".to_string()),
            available_quantity: params.available_quantity,
            sold_quantity: 0,
            max_per_user: params.max_per_user.unwrap_or(1),
            sales_start_date: params.sales_start_date,
            sales_end_date: params.sales_end_date,
            is_active: true,
            created_at: now,
            updated_at: now,
        }
    }

    pub fn remaining(&self) -> i32 {
        (self.available_quantity - self.sold_quantity).max(0)
    }
}
