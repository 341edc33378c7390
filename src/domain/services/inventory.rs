use chrono::{DateTime, Utc};
use std::fmt;
use crate::domain::models::ticket_type::TicketType;

/// Why a purchase was turned away. Each variant maps to a stable client-facing code.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PurchaseRejection {
    InvalidAttendeeDetails,
    TicketTypeNotFound,
    TicketTypeInactive,
    InsufficientTickets { available: i32 },
    SalesNotStarted,
    SalesEnded,
}

impl PurchaseRejection {
    pub fn code(&self) -> &'static str {
        match self {
            PurchaseRejection::InvalidAttendeeDetails => "INVALID_ATTENDEE_DETAILS",
            PurchaseRejection::TicketTypeNotFound => "TICKET_TYPE_NOT_FOUND",
            PurchaseRejection::TicketTypeInactive => "TICKET_TYPE_INACTIVE",
            PurchaseRejection::InsufficientTickets { .. } => "INSUFFICIENT_TICKETS",
            PurchaseRejection::SalesNotStarted => "SALES_NOT_STARTED",
            PurchaseRejection::SalesEnded => "SALES_ENDED",
        }
    }

    pub fn message(&self) -> String {
        match self {
            PurchaseRejection::InvalidAttendeeDetails => {
                "Attendee details must match quantity".to_string()
            }
            PurchaseRejection::TicketTypeNotFound => "Ticket type not found".to_string(),
            PurchaseRejection::TicketTypeInactive => "Ticket type is not available".to_string(),
            PurchaseRejection::InsufficientTickets { available } => {
                format!("Only {} tickets available", available)
            }
            PurchaseRejection::SalesNotStarted => "Ticket sales have not started yet".to_string(),
            PurchaseRejection::SalesEnded => "Ticket sales have ended".to_string(),
        }
    }
}

impl fmt::Display for PurchaseRejection {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}: {}", self.code(), self.message())
    }
}

/// Runs the sale gates in order and returns the remaining count on success.
///
/// Gate order: existence, active flag, remaining stock, sales start, sales end.
/// The first failing gate wins.
pub fn check_availability(
    ticket_type: Option<&TicketType>,
    quantity: i32,
    now: DateTime<Utc>,
) -> Result<i32, PurchaseRejection> {
    let tt = ticket_type.ok_or(PurchaseRejection::TicketTypeNotFound)?;

    if !tt.is_active {
        return Err(PurchaseRejection::TicketTypeInactive);
    }

    let available = tt.remaining();
    if available < quantity {
        return Err(PurchaseRejection::InsufficientTickets { available });
    }

    if let Some(start) = tt.sales_start_date {
        if now < start {
            return Err(PurchaseRejection::SalesNotStarted);
        }
    }

    if let Some(end) = tt.sales_end_date {
        if now > end {
            return Err(PurchaseRejection::SalesEnded);
        }
    }

    Ok(available)
}

/// Reason for a reservation that matched zero rows, judged from a fresh read of
/// the row. A row that passes on re-read lost a race for the last seats.
pub fn explain_failed_reservation(
    current: Option<&TicketType>,
    quantity: i32,
    now: DateTime<Utc>,
) -> PurchaseRejection {
    match check_availability(current, quantity, now) {
        Err(rejection) => rejection,
        Ok(_) => PurchaseRejection::InsufficientTickets {
            available: current.map(TicketType::remaining).unwrap_or(0),
        },
    }
}
