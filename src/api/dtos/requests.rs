use crate::domain::models::ticket::AttendeeDetails;
use chrono::{DateTime, Utc};
use serde::Deserialize;

#[derive(Deserialize)]
pub struct RegisterRequest {
    pub name: String,
    pub email: String,
    pub password: String,
}

#[derive(Deserialize)]
pub struct LoginRequest {
    pub email: String,
    pub password: String,
}

#[derive(Deserialize)]
pub struct UpdateRoleRequest {
    pub role: String,
}

#[derive(Deserialize)]
pub struct CreateEventRequest {
    pub title: String,
    pub description: Option<String>,
    pub venue_name: String,
    pub venue_address: String,
    pub city: String,
    pub country: String,
    pub event_date: DateTime<Utc>,
}

#[derive(Deserialize)]
pub struct UpdateEventStatusRequest {
    pub status: String,
}

#[derive(Deserialize)]
pub struct CreateTicketTypeRequest {
    pub name: String,
    pub description: Option<String>,
    /// Minor currency units.
    pub price: i64,
    pub currency: Option<String>,
    pub available_quantity: i32,
    pub max_per_user: Option<i32>,
    pub sales_start_date: Option<DateTime<Utc>>,
    pub sales_end_date: Option<DateTime<Utc>>,
}

#[derive(Deserialize)]
pub struct SetActiveRequest {
    pub is_active: bool,
}

#[derive(Deserialize)]
pub struct PurchaseTicketsRequest {
    pub event_id: String,
    pub ticket_type_id: String,
    pub quantity: i32,
    #[serde(default)]
    pub attendee_details: Vec<AttendeeDetails>,
    pub payment_method: Option<String>,
    pub notes: Option<String>,
}

#[derive(Deserialize, Default)]
pub struct ConfirmPaymentRequest {
    pub payment_reference: Option<String>,
}

#[derive(Deserialize, Default)]
pub struct CancelBookingRequest {
    pub reason: Option<String>,
}

#[derive(Deserialize)]
pub struct BookingListQuery {
    pub status: Option<String>,
}

#[derive(Deserialize)]
pub struct EntryRequest {
    pub ticket_number: String,
    pub event_id: String,
}

#[derive(Deserialize)]
pub struct VerifyQrRequest {
    pub qr_data: String,
    pub max_age_hours: Option<i64>,
}
