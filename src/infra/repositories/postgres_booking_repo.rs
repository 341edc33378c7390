use crate::domain::{
    models::{booking::Booking, ticket::Ticket, ticket_type::TicketType},
    ports::BookingRepository,
    services::inventory::explain_failed_reservation,
};
use crate::error::AppError;
use async_trait::async_trait;
use sqlx::PgPool;
use chrono::{DateTime, Utc};
use tracing::{error, warn};

pub struct PostgresBookingRepo {
    pool: PgPool,
}

impl PostgresBookingRepo {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl BookingRepository for PostgresBookingRepo {
    async fn create_with_tickets(&self, booking: &Booking, tickets: &[Ticket], now: DateTime<Utc>) -> Result<(), AppError> {
        let mut tx = self.pool.begin().await.map_err(AppError::Database)?;

        let reserved = sqlx::query(
            "UPDATE ticket_types SET sold_quantity = sold_quantity + $1, updated_at = $2
             WHERE id = $3 AND event_id = $4 AND is_active = TRUE
               AND sold_quantity + $5 <= available_quantity
               AND (sales_start_date IS NULL OR sales_start_date <= $6)
               AND (sales_end_date IS NULL OR sales_end_date >= $7)"
        )
            .bind(booking.quantity).bind(now)
            .bind(&booking.ticket_type_id).bind(&booking.event_id)
            .bind(booking.quantity).bind(now).bind(now)
            .execute(&mut *tx).await.map_err(AppError::Database)?;

        if reserved.rows_affected() == 0 {
            tx.rollback().await.map_err(AppError::Database)?;
            let current = sqlx::query_as::<_, TicketType>("SELECT * FROM ticket_types WHERE id = $1 AND event_id = $2")
                .bind(&booking.ticket_type_id).bind(&booking.event_id)
                .fetch_optional(&self.pool).await.map_err(AppError::Database)?;
            return Err(AppError::Purchase(explain_failed_reservation(current.as_ref(), booking.quantity, now)));
        }

        sqlx::query(
            "INSERT INTO bookings (id, user_id, event_id, ticket_type_id, quantity, total_amount, currency, booking_status, payment_status, payment_method, payment_reference, booking_reference, notes, created_at, updated_at)
             VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $12, $13, $14, $15)"
        )
            .bind(&booking.id).bind(&booking.user_id).bind(&booking.event_id).bind(&booking.ticket_type_id)
            .bind(booking.quantity).bind(booking.total_amount).bind(&booking.currency)
            .bind(&booking.booking_status).bind(&booking.payment_status).bind(&booking.payment_method)
            .bind(&booking.payment_reference).bind(&booking.booking_reference).bind(&booking.notes)
            .bind(booking.created_at).bind(booking.updated_at)
            .execute(&mut *tx).await.map_err(AppError::Database)?;

        for ticket in tickets {
            sqlx::query(
                "INSERT INTO tickets (id, booking_id, user_id, event_id, ticket_type_id, ticket_number, attendee_name, attendee_email, attendee_phone, qr_code, qr_code_data, is_used, used_at, seat_number, created_at)
                 VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $12, $13, $14, $15)"
            )
                .bind(&ticket.id).bind(&ticket.booking_id).bind(&ticket.user_id).bind(&ticket.event_id)
                .bind(&ticket.ticket_type_id).bind(&ticket.ticket_number).bind(&ticket.attendee_name)
                .bind(&ticket.attendee_email).bind(&ticket.attendee_phone).bind(&ticket.qr_code)
                .bind(&ticket.qr_code_data).bind(ticket.is_used).bind(ticket.used_at)
                .bind(&ticket.seat_number).bind(ticket.created_at)
                .execute(&mut *tx).await.map_err(AppError::Database)?;
        }

        tx.commit().await.map_err(AppError::Database)?;
        Ok(())
    }

    async fn find_by_id(&self, id: &str) -> Result<Option<Booking>, AppError> {
        sqlx::query_as::<_, Booking>("SELECT * FROM bookings WHERE id = $1")
            .bind(id)
            .fetch_optional(&self.pool).await.map_err(AppError::Database)
    }

    async fn list_by_user(&self, user_id: &str, status: Option<&str>) -> Result<Vec<Booking>, AppError> {
        sqlx::query_as::<_, Booking>(
            "SELECT * FROM bookings WHERE user_id = $1 AND ($2::text IS NULL OR booking_status = $3) ORDER BY created_at DESC"
        )
            .bind(user_id).bind(status).bind(status)
            .fetch_all(&self.pool).await.map_err(AppError::Database)
    }

    async fn confirm(&self, id: &str, payment_reference: Option<&str>) -> Result<Option<Booking>, AppError> {
        sqlx::query_as::<_, Booking>(
            "UPDATE bookings
             SET booking_status = 'confirmed', payment_status = 'paid',
                 payment_reference = COALESCE($1::text, payment_reference), updated_at = $2
             WHERE id = $3 AND booking_status = 'pending'
             RETURNING *"
        )
            .bind(payment_reference).bind(Utc::now()).bind(id)
            .fetch_optional(&self.pool).await.map_err(AppError::Database)
    }

    async fn cancel(&self, id: &str, reason: Option<&str>) -> Result<Option<Booking>, AppError> {
        let mut tx = self.pool.begin().await.map_err(AppError::Database)?;

        let cancelled = sqlx::query_as::<_, Booking>(
            "UPDATE bookings
             SET booking_status = 'cancelled', payment_status = 'refunded', updated_at = $1,
                 notes = CASE WHEN $2::text IS NULL THEN notes WHEN notes IS NULL THEN $3 ELSE notes || ' | ' || $4 END
             WHERE id = $5 AND booking_status IN ('pending', 'confirmed')
             RETURNING *"
        )
            .bind(Utc::now()).bind(reason).bind(reason).bind(reason).bind(id)
            .fetch_optional(&mut *tx).await.map_err(AppError::Database)?;

        let Some(booking) = cancelled else {
            warn!("Cancel skipped, booking {} is not cancellable", id);
            return Ok(None);
        };

        let released = sqlx::query(
            "UPDATE ticket_types SET sold_quantity = sold_quantity - $1, updated_at = $2
             WHERE id = $3 AND sold_quantity >= $4"
        )
            .bind(booking.quantity).bind(Utc::now()).bind(&booking.ticket_type_id).bind(booking.quantity)
            .execute(&mut *tx).await.map_err(AppError::Database)?;

        if released.rows_affected() == 0 {
            error!("Inventory release underflow for booking {} (ticket type {})", booking.id, booking.ticket_type_id);
            return Err(AppError::InternalWithMsg("Inventory release failed".to_string()));
        }

        tx.commit().await.map_err(AppError::Database)?;
        Ok(Some(booking))
    }
}
