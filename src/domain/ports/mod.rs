use crate::domain::models::{
    user::User, event::Event, ticket_type::TicketType, booking::Booking,
    ticket::Ticket, auth::RefreshTokenRecord
};
use crate::error::AppError;
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use uuid::Uuid;

#[async_trait]
pub trait UserRepository: Send + Sync {
    async fn create(&self, user: &User) -> Result<User, AppError>;
    async fn find_by_email(&self, email: &str) -> Result<Option<User>, AppError>;
    async fn find_by_id(&self, id: &str) -> Result<Option<User>, AppError>;
    async fn update_role(&self, id: &str, role: &str) -> Result<Option<User>, AppError>;
}

#[async_trait]
pub trait AuthRepository: Send + Sync {
    async fn create_refresh_token(&self, record: &RefreshTokenRecord) -> Result<(), AppError>;
    async fn find_refresh_token(&self, token_hash: &str) -> Result<Option<RefreshTokenRecord>, AppError>;
    async fn delete_refresh_token(&self, token_hash: &str) -> Result<(), AppError>;
    async fn delete_refresh_family(&self, family_id: Uuid) -> Result<(), AppError>;
    async fn purge_expired(&self, user_id: &str, now: DateTime<Utc>) -> Result<u64, AppError>;
}

#[async_trait]
pub trait EventRepository: Send + Sync {
    async fn create_event(&self, event: &Event) -> Result<Event, AppError>;
    async fn find_event(&self, id: &str) -> Result<Option<Event>, AppError>;
    async fn list_published(&self) -> Result<Vec<Event>, AppError>;
    async fn update_event_status(&self, id: &str, status: &str) -> Result<Option<Event>, AppError>;

    async fn create_ticket_type(&self, ticket_type: &TicketType) -> Result<TicketType, AppError>;
    async fn find_ticket_type(&self, id: &str) -> Result<Option<TicketType>, AppError>;
    async fn list_ticket_types(&self, event_id: &str, active_only: bool) -> Result<Vec<TicketType>, AppError>;
    async fn set_ticket_type_active(&self, id: &str, is_active: bool) -> Result<Option<TicketType>, AppError>;
}

#[async_trait]
pub trait BookingRepository: Send + Sync {
    /// Reserves `booking.quantity` seats and writes the booking plus its tickets in one
    /// transaction. A failed reservation yields `AppError::Purchase` and writes nothing.
    async fn create_with_tickets(&self, booking: &Booking, tickets: &[Ticket], now: DateTime<Utc>) -> Result<(), AppError>;
    async fn find_by_id(&self, id: &str) -> Result<Option<Booking>, AppError>;
    async fn list_by_user(&self, user_id: &str, status: Option<&str>) -> Result<Vec<Booking>, AppError>;
    /// `pending -> confirmed/paid`. `None` when the booking was no longer pending.
    async fn confirm(&self, id: &str, payment_reference: Option<&str>) -> Result<Option<Booking>, AppError>;
    /// `pending|confirmed -> cancelled/refunded`, releasing the seats in the same
    /// transaction. `None` when the booking was already past those states.
    async fn cancel(&self, id: &str, reason: Option<&str>) -> Result<Option<Booking>, AppError>;
}

#[async_trait]
pub trait TicketRepository: Send + Sync {
    async fn find_by_id(&self, id: &str) -> Result<Option<Ticket>, AppError>;
    async fn find_by_number(&self, ticket_number: &str) -> Result<Option<Ticket>, AppError>;
    async fn find_by_number_for_event(&self, ticket_number: &str, event_id: &str) -> Result<Option<Ticket>, AppError>;
    async fn list_by_booking(&self, booking_id: &str) -> Result<Vec<Ticket>, AppError>;
    async fn list_by_user(&self, user_id: &str) -> Result<Vec<Ticket>, AppError>;
    /// Flips `is_used` once. Returns false when the ticket was already used.
    async fn mark_used(&self, id: &str, now: DateTime<Utc>) -> Result<bool, AppError>;
    /// Marks the ticket used only if its event is published and not yet past.
    async fn check_in(&self, ticket_number: &str, event_id: &str, now: DateTime<Utc>) -> Result<Option<Ticket>, AppError>;
}

pub struct EmailAttachment {
    pub filename: String,
    pub content_type: String,
    pub data: Vec<u8>,
}

#[async_trait]
pub trait EmailService: Send + Sync {
    async fn send(&self, recipient: &str, subject: &str, html_body: &str, attachments: &[EmailAttachment]) -> Result<(), AppError>;
}
