use serde::{Deserialize, Serialize};
use uuid::Uuid;
use chrono::{DateTime, Utc};
use sqlx::FromRow;
use rand::Rng;
use std::str::FromStr;
use crate::error::AppError;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum BookingStatus {
    Pending,
    Confirmed,
    Cancelled,
    Refunded,
}

impl BookingStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            BookingStatus::Pending => "pending",
            BookingStatus::Confirmed => "confirmed",
            BookingStatus::Cancelled => "cancelled",
            BookingStatus::Refunded => "refunded",
        }
    }
}

impl FromStr for BookingStatus {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "pending" => Ok(BookingStatus::Pending),
            "confirmed" => Ok(BookingStatus::Confirmed),
            "cancelled" => Ok(BookingStatus::Cancelled),
            "refunded" => Ok(BookingStatus::Refunded),
            other => Err(format!("Unknown booking status: {}", other)),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PaymentStatus {
    Pending,
    Paid,
    Failed,
    Refunded,
}

impl PaymentStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            PaymentStatus::Pending => "pending",
            PaymentStatus::Paid => "paid",
            PaymentStatus::Failed => "failed",
            PaymentStatus::Refunded => "refunded",
        }
    }
}

/// Transitions a booking can go through after creation.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BookingAction {
    ConfirmPayment,
    Cancel,
}

impl BookingAction {
    /// Statuses a booking must be in for this action to apply.
    pub fn allowed_from(&self) -> &'static [BookingStatus] {
        match self {
            BookingAction::ConfirmPayment => &[BookingStatus::Pending],
            BookingAction::Cancel => &[BookingStatus::Pending, BookingStatus::Confirmed],
        }
    }

    pub fn next_state(&self, current: BookingStatus) -> Option<(BookingStatus, PaymentStatus)> {
        if !self.allowed_from().contains(&current) {
            return None;
        }
        Some(match self {
            BookingAction::ConfirmPayment => (BookingStatus::Confirmed, PaymentStatus::Paid),
            BookingAction::Cancel => (BookingStatus::Cancelled, PaymentStatus::Refunded),
        })
    }
}

#[derive(Debug, Serialize, Deserialize, FromRow, Clone)]
pub struct Booking {
    pub id: String,
    pub user_id: String,
    pub event_id: String,
    pub ticket_type_id: String,
    pub quantity: i32,
    pub total_amount: i64,
    pub currency: String,
    pub booking_status: String,
    pub payment_status: String,
    pub payment_method: Option<String>,
    pub payment_reference: Option<String>,
    pub booking_reference: String,
    pub notes: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

pub struct NewBookingParams {
    pub user_id: String,
    pub event_id: String,
    pub ticket_type_id: String,
    pub quantity: i32,
    pub unit_price: i64,
    pub currency: String,
    pub payment_method: Option<String>,
    pub notes: Option<String>,
}

const CODE_CHARSET: &[u8] = b"ABCDEFGHIJKLMNOPQRSTUVWXYZ0123456789";

/// Uppercase alphanumeric suffix drawn uniformly from the thread-local CSPRNG.
pub(crate) fn random_code(len: usize) -> String {
    let mut rng = rand::thread_rng();
    (0..len)
        .map(|_| CODE_CHARSET[rng.gen_range(0..CODE_CHARSET.len())] as char)
        .collect()
}

impl Booking {
    pub fn new(params: NewBookingParams) -> Result<Self, AppError> {
        let total_amount = params.unit_price
            .checked_mul(i64::from(params.quantity))
            .filter(|total| *total >= 0)
            .ok_or_else(|| AppError::Validation("Booking total is out of range".to_string()))?;

        let now = Utc::now();
        Ok(Self {
            id: Uuid::new_v4().to_string(),
            user_id: params.user_id,
            event_id: params.event_id,
            ticket_type_id: params.ticket_type_id,
            quantity: params.quantity,
            total_amount,
            currency: params.currency,
            booking_status: BookingStatus::Pending.as_str().to_string(),
            payment_status: PaymentStatus::Pending.as_str().to_string(),
            payment_method: params.payment_method,
            payment_reference: None,
            booking_reference: Self::generate_reference(now),
            notes: params.notes,
            created_at: now,
            updated_at: now,
        })
    }

    pub fn generate_reference(now: DateTime<Utc>) -> String {
        format!("PP{}{}", now.timestamp_millis(), random_code(6))
    }

    pub fn status(&self) -> Option<BookingStatus> {
        self.booking_status.parse().ok()
    }
}
