use serde::{Deserialize, Serialize};
use uuid::Uuid;
use chrono::{DateTime, Utc};
use sqlx::FromRow;
use crate::domain::models::booking::random_code;

#[derive(Debug, Serialize, Deserialize, FromRow, Clone)]
pub struct Ticket {
    pub id: String,
    pub booking_id: String,
    pub user_id: String,
    pub event_id: String,
    pub ticket_type_id: String,
    pub ticket_number: String,
    pub attendee_name: String,
    pub attendee_email: String,
    pub attendee_phone: Option<String>,
    pub qr_code: String,
    pub qr_code_data: String,
    pub is_used: bool,
    pub used_at: Option<DateTime<Utc>>,
    pub seat_number: Option<String>,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct AttendeeDetails {
    pub name: String,
    pub email: String,
    pub phone: Option<String>,
    pub seat_number: Option<String>,
}

impl AttendeeDetails {
    pub fn is_complete(&self) -> bool {
        !self.name.trim().is_empty() && self.email.contains('@')
    }
}

pub struct NewTicketParams {
    pub id: String,
    pub ticket_number: String,
    pub booking_id: String,
    pub user_id: String,
    pub event_id: String,
    pub ticket_type_id: String,
    pub attendee: AttendeeDetails,
    pub qr_code: String,
    pub qr_code_data: String,
}

impl Ticket {
    pub fn new(params: NewTicketParams) -> Self {
        Self {
            id: params.id,
            booking_id: params.booking_id,
            user_id: params.user_id,
            event_id: params.event_id,
            ticket_type_id: params.ticket_type_id,
            ticket_number: params.ticket_number,
            attendee_name: params.attendee.name,
            attendee_email: params.attendee.email,
            attendee_phone: params.attendee.phone,
            qr_code: params.qr_code,
            qr_code_data: params.qr_code_data,
            is_used: false,
            used_at: None,
            seat_number: params.attendee.seat_number,
            created_at: Utc::now(),
        }
    }

    pub fn new_id() -> String {
        Uuid::new_v4().to_string()
    }

    pub fn generate_number(now: DateTime<Utc>) -> String {
        format!("T{}{}", now.timestamp_millis(), random_code(8))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashSet;

    #[test]
    fn test_ticket_numbers_are_distinct_within_one_millisecond() {
        let now = Utc::now();
        let numbers: HashSet<String> = (0..500).map(|_| Ticket::generate_number(now)).collect();
        assert_eq!(numbers.len(), 500);

        let sample = numbers.iter().next().unwrap();
        assert!(sample.starts_with(&format!("T{}", now.timestamp_millis())));
    }

    #[test]
    fn test_attendee_completeness() {
        let mut attendee = AttendeeDetails {
            name: "Lea".into(),
            email: "lea@example.com".into(),
            phone: None,
            seat_number: None,
        };
        assert!(attendee.is_complete());

        attendee.name = "  ".into();
        assert!(!attendee.is_complete());
    }
}
