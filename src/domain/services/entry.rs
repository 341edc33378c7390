use chrono::{DateTime, Utc};
use serde::Serialize;
use crate::domain::models::{event::Event, ticket::Ticket};

pub const VALID_FOR_ENTRY: &str = "Ticket is valid for entry";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EntryRejection {
    TicketNotFound,
    EventNotActive,
    AlreadyUsed,
    EventPassed,
}

impl EntryRejection {
    pub fn message(&self) -> &'static str {
        match self {
            EntryRejection::TicketNotFound => "Ticket not found for this event",
            EntryRejection::EventNotActive => "Event is not active",
            EntryRejection::AlreadyUsed => "Ticket has already been used",
            EntryRejection::EventPassed => "Event date has passed",
        }
    }
}

/// Door checks, first failure wins. Does not mutate anything.
pub fn check_entry(
    ticket: Option<&Ticket>,
    event: Option<&Event>,
    now: DateTime<Utc>,
) -> Result<(), EntryRejection> {
    let ticket = ticket.ok_or(EntryRejection::TicketNotFound)?;
    let event = match event {
        Some(e) if e.id == ticket.event_id => e,
        _ => return Err(EntryRejection::TicketNotFound),
    };

    if !event.is_published() {
        return Err(EntryRejection::EventNotActive);
    }
    if ticket.is_used {
        return Err(EntryRejection::AlreadyUsed);
    }
    if now > event.event_date {
        return Err(EntryRejection::EventPassed);
    }
    Ok(())
}

#[derive(Debug, Serialize)]
pub struct EntryEventSummary {
    pub id: String,
    pub title: String,
    pub event_date: DateTime<Utc>,
    pub venue_name: String,
}

impl From<&Event> for EntryEventSummary {
    fn from(e: &Event) -> Self {
        Self {
            id: e.id.clone(),
            title: e.title.clone(),
            event_date: e.event_date,
            venue_name: e.venue_name.clone(),
        }
    }
}

#[derive(Debug, Serialize)]
pub struct EntryValidation {
    pub valid: bool,
    pub message: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub ticket: Option<Ticket>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub event: Option<EntryEventSummary>,
}

impl EntryValidation {
    pub fn evaluate(ticket: Option<Ticket>, event: Option<&Event>, now: DateTime<Utc>) -> Self {
        match check_entry(ticket.as_ref(), event, now) {
            Ok(()) => Self {
                valid: true,
                message: VALID_FOR_ENTRY.to_string(),
                ticket,
                event: event.map(EntryEventSummary::from),
            },
            Err(rejection) => Self {
                valid: false,
                message: rejection.message().to_string(),
                ticket: None,
                event: None,
            },
        }
    }
}
