use std::sync::Arc;
use chrono::Utc;
use serde::Serialize;
use tracing::{info, warn};
use crate::domain::{
    models::{
        auth::Principal,
        booking::{Booking, BookingAction, BookingStatus, NewBookingParams},
        ticket::{AttendeeDetails, NewTicketParams, Ticket},
    },
    ports::{BookingRepository, EventRepository, TicketRepository},
    services::{
        entry::{check_entry, EntryRejection, EntryValidation},
        inventory::{check_availability, PurchaseRejection},
        notification_service::NotificationService,
        qr_service::{QrService, TicketQrSubject, MAX_QR_AGE_HOURS},
    },
};
use crate::error::AppError;

pub struct PurchaseRequest {
    pub event_id: String,
    pub ticket_type_id: String,
    pub quantity: i32,
    pub attendee_details: Vec<AttendeeDetails>,
    pub payment_method: Option<String>,
    pub notes: Option<String>,
}

#[derive(Debug, Serialize)]
pub struct BookingWithTickets {
    pub booking: Booking,
    pub tickets: Vec<Ticket>,
}

#[derive(Debug, Serialize)]
pub struct QrVerification {
    pub valid: bool,
    pub signature_valid: bool,
    pub expired: bool,
    pub ticket_number: String,
}

/// Booking lifecycle and door operations over the repositories.
pub struct TicketService {
    events: Arc<dyn EventRepository>,
    bookings: Arc<dyn BookingRepository>,
    tickets: Arc<dyn TicketRepository>,
    qr: Arc<QrService>,
    notifier: NotificationService,
}

impl TicketService {
    pub fn new(
        events: Arc<dyn EventRepository>,
        bookings: Arc<dyn BookingRepository>,
        tickets: Arc<dyn TicketRepository>,
        qr: Arc<QrService>,
        notifier: NotificationService,
    ) -> Self {
        Self { events, bookings, tickets, qr, notifier }
    }

    pub async fn purchase(&self, buyer: &Principal, req: PurchaseRequest) -> Result<BookingWithTickets, AppError> {
        if req.quantity < 1 {
            return Err(AppError::Validation("Quantity must be at least 1".to_string()));
        }
        if req.attendee_details.len() != req.quantity as usize
            || !req.attendee_details.iter().all(AttendeeDetails::is_complete)
        {
            return Err(AppError::Purchase(PurchaseRejection::InvalidAttendeeDetails));
        }

        let now = Utc::now();
        let ticket_type = self.events.find_ticket_type(&req.ticket_type_id).await?
            .filter(|tt| tt.event_id == req.event_id);

        if let Err(rejection) = check_availability(ticket_type.as_ref(), req.quantity, now) {
            warn!("Purchase rejected for user {}: {}", buyer.user_id, rejection);
            return Err(AppError::Purchase(rejection));
        }
        let ticket_type = ticket_type.ok_or(AppError::Purchase(PurchaseRejection::TicketTypeNotFound))?;

        let event = self.events.find_event(&req.event_id).await?
            .ok_or(AppError::NotFound("Event not found".to_string()))?;

        let booking = Booking::new(NewBookingParams {
            user_id: buyer.user_id.clone(),
            event_id: event.id.clone(),
            ticket_type_id: ticket_type.id.clone(),
            quantity: req.quantity,
            unit_price: ticket_type.price,
            currency: ticket_type.currency.clone(),
            payment_method: req.payment_method,
            notes: req.notes,
        })?;

        let mut tickets = Vec::with_capacity(req.attendee_details.len());
        for attendee in req.attendee_details {
            let ticket_id = Ticket::new_id();
            let ticket_number = Ticket::generate_number(now);
            let issued = self.qr.issue(&TicketQrSubject {
                ticket_id: &ticket_id,
                ticket_number: &ticket_number,
                event_id: &event.id,
                user_id: &buyer.user_id,
                attendee_name: &attendee.name,
                attendee_email: &attendee.email,
            })?;

            tickets.push(Ticket::new(NewTicketParams {
                id: ticket_id,
                ticket_number,
                booking_id: booking.id.clone(),
                user_id: buyer.user_id.clone(),
                event_id: event.id.clone(),
                ticket_type_id: ticket_type.id.clone(),
                attendee,
                qr_code: issued.payload.ticket_number,
                qr_code_data: issued.png_base64,
            }));
        }

        if let Err(e) = self.bookings.create_with_tickets(&booking, &tickets, now).await {
            if let AppError::Purchase(rejection) = &e {
                warn!("Reservation failed for ticket type {}: {}", ticket_type.id, rejection);
            }
            return Err(e);
        }

        info!(
            "Booking {} created: {} x {} for user {}",
            booking.booking_reference, booking.quantity, ticket_type.name, buyer.user_id
        );

        self.notifier.send_purchase_confirmation(&booking, &event, &ticket_type.name, &tickets).await;

        Ok(BookingWithTickets { booking, tickets })
    }

    pub async fn confirm_payment(
        &self,
        actor: &Principal,
        booking_id: &str,
        payment_reference: Option<&str>,
    ) -> Result<BookingWithTickets, AppError> {
        let booking = self.load_for_transition(actor, booking_id, BookingAction::ConfirmPayment).await?;

        let confirmed = self.bookings.confirm(&booking.id, payment_reference).await?
            .ok_or_else(|| AppError::Conflict("Booking is no longer pending".to_string()))?;

        info!("Booking {} confirmed (payment ref: {:?})", confirmed.booking_reference, payment_reference);

        let tickets = self.tickets.list_by_booking(&confirmed.id).await?;
        match self.events.find_event(&confirmed.event_id).await? {
            Some(event) => self.notifier.send_ticket_details(&confirmed, &event, &tickets).await,
            None => warn!("Event {} missing for booking {}, ticket email skipped", confirmed.event_id, confirmed.id),
        }

        Ok(BookingWithTickets { booking: confirmed, tickets })
    }

    pub async fn cancel_booking(&self, actor: &Principal, booking_id: &str, reason: Option<&str>) -> Result<Booking, AppError> {
        let booking = self.load_for_transition(actor, booking_id, BookingAction::Cancel).await?;

        let note = reason.map(|r| format!("Cancellation reason: {}", r.trim()));
        let cancelled = self.bookings.cancel(&booking.id, note.as_deref()).await?
            .ok_or_else(|| AppError::Conflict("Booking has already been cancelled".to_string()))?;

        info!(
            "Booking {} cancelled, released {} seats of ticket type {}",
            cancelled.booking_reference, cancelled.quantity, cancelled.ticket_type_id
        );
        Ok(cancelled)
    }

    async fn load_for_transition(&self, actor: &Principal, booking_id: &str, action: BookingAction) -> Result<Booking, AppError> {
        let booking = self.bookings.find_by_id(booking_id).await?
            .ok_or(AppError::NotFound("Booking not found".to_string()))?;

        if booking.user_id != actor.user_id && !actor.is_admin() {
            return Err(AppError::Forbidden("Only the booking owner or an admin can change this booking".to_string()));
        }

        let current = booking.status()
            .ok_or_else(|| AppError::InternalWithMsg(format!("Unknown booking status '{}'", booking.booking_status)))?;

        if action.next_state(current).is_none() {
            return Err(AppError::Conflict(format!(
                "Booking cannot be {} while {}",
                match action {
                    BookingAction::ConfirmPayment => "confirmed",
                    BookingAction::Cancel => "cancelled",
                },
                current.as_str()
            )));
        }
        Ok(booking)
    }

    pub async fn list_user_bookings(&self, actor: &Principal, status: Option<&str>) -> Result<Vec<Booking>, AppError> {
        if let Some(s) = status {
            s.parse::<BookingStatus>().map_err(AppError::Validation)?;
        }
        self.bookings.list_by_user(&actor.user_id, status).await
    }

    pub async fn booking_details(&self, actor: &Principal, booking_id: &str) -> Result<BookingWithTickets, AppError> {
        let booking = self.bookings.find_by_id(booking_id).await?
            .ok_or(AppError::NotFound("Booking not found".to_string()))?;
        ensure_can_read(actor, &booking.user_id)?;

        let tickets = self.tickets.list_by_booking(&booking.id).await?;
        Ok(BookingWithTickets { booking, tickets })
    }

    pub async fn list_user_tickets(&self, actor: &Principal) -> Result<Vec<Ticket>, AppError> {
        self.tickets.list_by_user(&actor.user_id).await
    }

    pub async fn ticket_details(&self, actor: &Principal, ticket_id: &str) -> Result<Ticket, AppError> {
        let ticket = self.tickets.find_by_id(ticket_id).await?
            .ok_or(AppError::NotFound("Ticket not found".to_string()))?;
        ensure_can_read(actor, &ticket.user_id)?;
        Ok(ticket)
    }

    pub async fn ticket_by_number(&self, actor: &Principal, ticket_number: &str) -> Result<Ticket, AppError> {
        let ticket = self.tickets.find_by_number(ticket_number).await?
            .ok_or(AppError::NotFound("Ticket not found".to_string()))?;
        ensure_can_read(actor, &ticket.user_id)?;
        Ok(ticket)
    }

    /// Read-only door check.
    pub async fn validate_for_entry(&self, ticket_number: &str, event_id: &str) -> Result<EntryValidation, AppError> {
        let ticket = self.tickets.find_by_number_for_event(ticket_number, event_id).await?;
        let event = self.events.find_event(event_id).await?;
        let validation = EntryValidation::evaluate(ticket, event.as_ref(), Utc::now());

        if !validation.valid {
            warn!("Entry check failed for ticket {} at event {}: {}", ticket_number, event_id, validation.message);
        }
        Ok(validation)
    }

    pub async fn use_ticket(&self, ticket_id: &str) -> Result<Ticket, AppError> {
        let ticket = self.tickets.find_by_id(ticket_id).await?
            .ok_or(AppError::NotFound("Ticket not found".to_string()))?;

        if !self.tickets.mark_used(&ticket.id, Utc::now()).await? {
            warn!("Ticket {} presented again after use", ticket.ticket_number);
            return Err(AppError::Conflict(EntryRejection::AlreadyUsed.message().to_string()));
        }

        info!("Ticket {} marked as used", ticket.ticket_number);
        self.tickets.find_by_id(&ticket.id).await?
            .ok_or(AppError::NotFound("Ticket not found".to_string()))
    }

    /// Entry checks and the used flip as one conditional update.
    pub async fn check_in(&self, ticket_number: &str, event_id: &str) -> Result<Ticket, AppError> {
        let now = Utc::now();
        if let Some(ticket) = self.tickets.check_in(ticket_number, event_id, now).await? {
            info!("Ticket {} checked in at event {}", ticket.ticket_number, event_id);
            return Ok(ticket);
        }

        let ticket = self.tickets.find_by_number_for_event(ticket_number, event_id).await?;
        let event = self.events.find_event(event_id).await?;
        let rejection = check_entry(ticket.as_ref(), event.as_ref(), now)
            .err()
            .unwrap_or(EntryRejection::AlreadyUsed);

        warn!("Check-in refused for ticket {} at event {}: {}", ticket_number, event_id, rejection.message());
        Err(entry_error(rejection))
    }

    pub fn verify_qr(&self, raw: &str, max_age_hours: Option<i64>) -> Result<QrVerification, AppError> {
        if let Some(hours) = max_age_hours {
            if !(1..=MAX_QR_AGE_HOURS).contains(&hours) {
                return Err(AppError::Validation(format!(
                    "max_age_hours must be between 1 and {}", MAX_QR_AGE_HOURS
                )));
            }
        }

        let payload = self.qr.parse(raw)?;
        let signature_valid = self.qr.verify(&payload);
        let expired = max_age_hours
            .map(|hours| self.qr.is_expired(&payload, hours, Utc::now().timestamp_millis()))
            .unwrap_or(false);

        if !signature_valid {
            warn!("QR signature mismatch for ticket {}", payload.ticket_number);
        }

        Ok(QrVerification {
            valid: signature_valid && !expired,
            signature_valid,
            expired,
            ticket_number: payload.ticket_number,
        })
    }
}

fn ensure_can_read(actor: &Principal, owner_id: &str) -> Result<(), AppError> {
    if actor.user_id == owner_id || actor.role.can_manage_events() {
        Ok(())
    } else {
        Err(AppError::Forbidden("Access denied".to_string()))
    }
}

fn entry_error(rejection: EntryRejection) -> AppError {
    let msg = rejection.message().to_string();
    match rejection {
        EntryRejection::TicketNotFound => AppError::NotFound(msg),
        EntryRejection::AlreadyUsed => AppError::Conflict(msg),
        EntryRejection::EventNotActive | EntryRejection::EventPassed => AppError::Validation(msg),
    }
}
