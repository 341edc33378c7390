use std::sync::Arc;
use base64::{engine::general_purpose::STANDARD, Engine as _};
use tera::{Context, Tera};
use tracing::{info, warn};
use crate::domain::{
    models::{booking::Booking, event::Event, ticket::Ticket},
    ports::{EmailAttachment, EmailService},
};
use crate::error::AppError;

pub const CONFIRMATION_TEMPLATE: &str = "ticket_confirmation.html";
pub const DETAILS_TEMPLATE: &str = "ticket_details.html";

/// Builds the template set embedded in the binary.
pub fn load_templates() -> Result<Tera, AppError> {
    let mut tera = Tera::default();
    tera.add_raw_templates(vec![
        (CONFIRMATION_TEMPLATE, include_str!("../../../templates/ticket_confirmation.html")),
        (DETAILS_TEMPLATE, include_str!("../../../templates/ticket_details.html")),
    ])
    .map_err(|e| AppError::InternalWithMsg(format!("Tera parse error: {:?}", e)))?;
    Ok(tera)
}

/// Formats minor units as a decimal amount, e.g. 7550 -> "75.50".
pub fn format_minor_units(amount: i64) -> String {
    let sign = if amount < 0 { "-" } else { "" };
    let abs = amount.unsigned_abs();
    format!("{}{}.{:02}", sign, abs / 100, abs % 100)
}

/// Ticket emails. Delivery is best-effort: failures are logged, never returned.
pub struct NotificationService {
    mailer: Arc<dyn EmailService>,
    templates: Arc<Tera>,
}

impl NotificationService {
    pub fn new(mailer: Arc<dyn EmailService>, templates: Arc<Tera>) -> Self {
        Self { mailer, templates }
    }

    pub async fn send_purchase_confirmation(
        &self,
        booking: &Booking,
        event: &Event,
        ticket_type_name: &str,
        tickets: &[Ticket],
    ) {
        let Some(primary) = tickets.first() else { return };

        let mut context = base_context(event, tickets);
        context.insert("recipient_name", &primary.attendee_name);
        context.insert("booking", booking);
        context.insert("ticket_type_name", ticket_type_name);
        context.insert("total_display", &format_minor_units(booking.total_amount));

        let subject = format!("Ticket Confirmation - {}", event.title);
        self.deliver(&primary.attendee_email, &subject, CONFIRMATION_TEMPLATE, &context, Vec::new(), &booking.id)
            .await;
    }

    pub async fn send_ticket_details(&self, booking: &Booking, event: &Event, tickets: &[Ticket]) {
        let Some(primary) = tickets.first() else { return };

        let context = base_context(event, tickets);

        let mut attachments = Vec::with_capacity(tickets.len());
        for ticket in tickets {
            match STANDARD.decode(&ticket.qr_code_data) {
                Ok(data) => attachments.push(EmailAttachment {
                    filename: format!("{}.png", ticket.ticket_number),
                    content_type: "image/png".to_string(),
                    data,
                }),
                Err(e) => warn!("Skipping QR attachment for ticket {}: {}", ticket.ticket_number, e),
            }
        }

        let subject = format!("Your Digital Tickets - {}", event.title);
        self.deliver(&primary.attendee_email, &subject, DETAILS_TEMPLATE, &context, attachments, &booking.id)
            .await;
    }

    async fn deliver(
        &self,
        recipient: &str,
        subject: &str,
        template: &str,
        context: &Context,
        attachments: Vec<EmailAttachment>,
        booking_id: &str,
    ) {
        let body = match self.templates.render(template, context) {
            Ok(b) => b,
            Err(e) => {
                warn!("Failed to render {} for booking {}: {:?}", template, booking_id, e);
                return;
            }
        };

        match self.mailer.send(recipient, subject, &body, &attachments).await {
            Ok(()) => info!("Sent '{}' to {} for booking {}", subject, recipient, booking_id),
            Err(e) => warn!("Email delivery failed for booking {}: {}", booking_id, e),
        }
    }
}

fn base_context(event: &Event, tickets: &[Ticket]) -> Context {
    let mut context = Context::new();
    context.insert("event", event);
    context.insert("event_date", &event.event_date.format("%A, %B %-d, %Y %H:%M UTC").to_string());
    context.insert("tickets", tickets);
    context
}
