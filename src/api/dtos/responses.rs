use crate::domain::models::ticket::Ticket;
use serde::Serialize;

#[derive(Serialize)]
pub struct PurchasedTicket {
    pub ticket_id: String,
    pub ticket_number: String,
    /// Base64 PNG.
    pub qr_code: String,
    pub attendee_name: String,
    pub attendee_email: String,
}

impl From<&Ticket> for PurchasedTicket {
    fn from(t: &Ticket) -> Self {
        Self {
            ticket_id: t.id.clone(),
            ticket_number: t.ticket_number.clone(),
            qr_code: t.qr_code_data.clone(),
            attendee_name: t.attendee_name.clone(),
            attendee_email: t.attendee_email.clone(),
        }
    }
}

#[derive(Serialize)]
pub struct PurchaseResponse {
    pub success: bool,
    pub booking_id: String,
    pub booking_reference: String,
    pub tickets: Vec<PurchasedTicket>,
    pub total_amount: i64,
    pub currency: String,
    pub message: String,
}

#[derive(Serialize)]
pub struct TicketQrResponse {
    pub ticket_number: String,
    pub qr_code: String,
    pub verification_url: String,
}

#[derive(Serialize)]
pub struct ShareQrResponse {
    pub url: String,
    pub qr_code: String,
}
