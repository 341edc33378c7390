use base64::{engine::general_purpose::STANDARD, Engine as _};
use chrono::Utc;
use hmac::{Hmac, Mac};
use image::{ImageFormat, Rgb, RgbImage};
use qrcode::{EcLevel, QrCode};
use serde::{Deserialize, Serialize};
use sha2::Sha256;
use std::io::Cursor;
use crate::config::QrConfig;
use crate::error::AppError;

type HmacSha256 = Hmac<Sha256>;

const MILLIS_PER_HOUR: i64 = 60 * 60 * 1000;

/// Upper bound for a caller-supplied QR age window (ten years).
pub const MAX_QR_AGE_HOURS: i64 = 24 * 365 * 10;

/// Signed content encoded into a ticket's QR image.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct QrPayload {
    pub ticket_id: String,
    pub ticket_number: String,
    pub event_id: String,
    pub user_id: String,
    pub attendee_name: String,
    pub attendee_email: String,
    /// Issue time, epoch milliseconds.
    pub timestamp: i64,
    pub signature: String,
}

/// The ticket fields a QR credential is issued for.
pub struct TicketQrSubject<'a> {
    pub ticket_id: &'a str,
    pub ticket_number: &'a str,
    pub event_id: &'a str,
    pub user_id: &'a str,
    pub attendee_name: &'a str,
    pub attendee_email: &'a str,
}

/// A signed payload plus its JSON form and rendered image.
pub struct IssuedQr {
    pub payload: QrPayload,
    pub json: String,
    pub png_base64: String,
}

pub struct QrService {
    secret: Vec<u8>,
    width: u32,
    margin: u32,
    ec_level: EcLevel,
    dark: Rgb<u8>,
    light: Rgb<u8>,
    base_url: String,
}

impl QrService {
    pub fn new(config: &QrConfig, base_url: &str) -> Self {
        let ec_level = parse_ec_level(&config.error_correction).unwrap_or_else(|| {
            tracing::warn!("Unknown QR error correction level '{}', using M", config.error_correction);
            EcLevel::M
        });

        Self {
            secret: config.secret_key.as_bytes().to_vec(),
            width: config.width.max(21),
            margin: config.margin,
            ec_level,
            dark: parse_hex_color(&config.dark_color).unwrap_or(Rgb([0, 0, 0])),
            light: parse_hex_color(&config.light_color).unwrap_or(Rgb([255, 255, 255])),
            base_url: base_url.trim_end_matches('/').to_string(),
        }
    }

    fn sign(&self, ticket_id: &str, event_id: &str, user_id: &str, timestamp: i64) -> String {
        let mut mac = HmacSha256::new_from_slice(&self.secret).expect("HMAC can take key of any size");
        mac.update(format!("{}:{}:{}:{}", ticket_id, event_id, user_id, timestamp).as_bytes());
        hex::encode(mac.finalize().into_bytes())
    }

    pub fn sign_ticket(&self, subject: &TicketQrSubject<'_>, timestamp: i64) -> QrPayload {
        let signature = self.sign(subject.ticket_id, subject.event_id, subject.user_id, timestamp);
        QrPayload {
            ticket_id: subject.ticket_id.to_string(),
            ticket_number: subject.ticket_number.to_string(),
            event_id: subject.event_id.to_string(),
            user_id: subject.user_id.to_string(),
            attendee_name: subject.attendee_name.to_string(),
            attendee_email: subject.attendee_email.to_string(),
            timestamp,
            signature,
        }
    }

    /// Constant-time check of the signature over `ticket_id:event_id:user_id:timestamp`.
    pub fn verify(&self, payload: &QrPayload) -> bool {
        let Ok(expected) = hex::decode(&payload.signature) else {
            return false;
        };
        let mut mac = HmacSha256::new_from_slice(&self.secret).expect("HMAC can take key of any size");
        mac.update(
            format!("{}:{}:{}:{}", payload.ticket_id, payload.event_id, payload.user_id, payload.timestamp)
                .as_bytes(),
        );
        mac.verify_slice(&expected).is_ok()
    }

    pub fn parse(&self, raw: &str) -> Result<QrPayload, AppError> {
        let payload: QrPayload = serde_json::from_str(raw)
            .map_err(|_| AppError::Validation("Invalid QR code data".to_string()))?;

        let required = [
            &payload.ticket_id,
            &payload.ticket_number,
            &payload.event_id,
            &payload.user_id,
            &payload.attendee_name,
            &payload.attendee_email,
            &payload.signature,
        ];
        if required.iter().any(|f| f.trim().is_empty()) || payload.timestamp <= 0 {
            return Err(AppError::Validation("Invalid QR code data".to_string()));
        }

        Ok(payload)
    }

    /// A window too large to express in milliseconds never expires.
    pub fn is_expired(&self, payload: &QrPayload, max_age_hours: i64, now_ms: i64) -> bool {
        match max_age_hours.checked_mul(MILLIS_PER_HOUR) {
            Some(max_age_ms) => now_ms.saturating_sub(payload.timestamp) > max_age_ms,
            None => false,
        }
    }

    /// Signs, serialises and renders the credential for one ticket.
    pub fn issue(&self, subject: &TicketQrSubject<'_>) -> Result<IssuedQr, AppError> {
        let payload = self.sign_ticket(subject, Utc::now().timestamp_millis());
        let json = serde_json::to_string(&payload)
            .map_err(|e| AppError::InternalWithMsg(format!("QR payload serialisation failed: {}", e)))?;
        let png_base64 = self.render(&json)?;
        Ok(IssuedQr { payload, json, png_base64 })
    }

    /// Renders `data` as a PNG and returns it base64-encoded.
    pub fn render(&self, data: &str) -> Result<String, AppError> {
        Ok(STANDARD.encode(self.render_png(data)?))
    }

    pub fn render_png(&self, data: &str) -> Result<Vec<u8>, AppError> {
        let code = QrCode::with_error_correction_level(data.as_bytes(), self.ec_level)
            .map_err(|e| AppError::InternalWithMsg(format!("QR encoding failed: {}", e)))?;

        let modules = code.width() as u32 + 2 * self.margin;
        let module_px = (self.width / modules).max(1);

        let img = code
            .render::<Rgb<u8>>()
            .quiet_zone(false)
            .module_dimensions(module_px, module_px)
            .dark_color(self.dark)
            .light_color(self.light)
            .build();

        let side = modules * module_px;
        let mut canvas = RgbImage::from_pixel(side, side, self.light);
        let offset = (self.margin * module_px) as i64;
        image::imageops::overlay(&mut canvas, &img, offset, offset);

        let mut buf = Cursor::new(Vec::new());
        canvas
            .write_to(&mut buf, ImageFormat::Png)
            .map_err(|e| AppError::InternalWithMsg(format!("QR PNG encoding failed: {}", e)))?;
        Ok(buf.into_inner())
    }

    pub fn verification_url(&self, ticket_number: &str) -> String {
        format!("{}/verify-ticket/{}", self.base_url, ticket_number)
    }

    pub fn event_share_url(&self, event_id: &str) -> String {
        format!("{}/events/{}", self.base_url, event_id)
    }
}

fn parse_ec_level(level: &str) -> Option<EcLevel> {
    match level.trim().to_ascii_uppercase().as_str() {
        "L" => Some(EcLevel::L),
        "M" => Some(EcLevel::M),
        "Q" => Some(EcLevel::Q),
        "H" => Some(EcLevel::H),
        _ => None,
    }
}

fn parse_hex_color(hex: &str) -> Option<Rgb<u8>> {
    let digits = hex.trim().trim_start_matches('#');
    if digits.len() != 6 {
        return None;
    }
    let bytes = hex::decode(digits).ok()?;
    Some(Rgb([bytes[0], bytes[1], bytes[2]]))
}
