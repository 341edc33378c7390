use crate::domain::{models::ticket::Ticket, ports::TicketRepository};
use crate::error::AppError;
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::PgPool;

pub struct PostgresTicketRepo {
    pool: PgPool,
}

impl PostgresTicketRepo {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl TicketRepository for PostgresTicketRepo {
    async fn find_by_id(&self, id: &str) -> Result<Option<Ticket>, AppError> {
        sqlx::query_as::<_, Ticket>("SELECT * FROM tickets WHERE id = $1")
            .bind(id)
            .fetch_optional(&self.pool).await.map_err(AppError::Database)
    }

    async fn find_by_number(&self, ticket_number: &str) -> Result<Option<Ticket>, AppError> {
        sqlx::query_as::<_, Ticket>("SELECT * FROM tickets WHERE ticket_number = $1")
            .bind(ticket_number)
            .fetch_optional(&self.pool).await.map_err(AppError::Database)
    }

    async fn find_by_number_for_event(&self, ticket_number: &str, event_id: &str) -> Result<Option<Ticket>, AppError> {
        sqlx::query_as::<_, Ticket>("SELECT * FROM tickets WHERE ticket_number = $1 AND event_id = $2")
            .bind(ticket_number).bind(event_id)
            .fetch_optional(&self.pool).await.map_err(AppError::Database)
    }

    async fn list_by_booking(&self, booking_id: &str) -> Result<Vec<Ticket>, AppError> {
        sqlx::query_as::<_, Ticket>("SELECT * FROM tickets WHERE booking_id = $1 ORDER BY created_at ASC, ticket_number ASC")
            .bind(booking_id)
            .fetch_all(&self.pool).await.map_err(AppError::Database)
    }

    async fn list_by_user(&self, user_id: &str) -> Result<Vec<Ticket>, AppError> {
        sqlx::query_as::<_, Ticket>("SELECT * FROM tickets WHERE user_id = $1 ORDER BY created_at DESC")
            .bind(user_id)
            .fetch_all(&self.pool).await.map_err(AppError::Database)
    }

    async fn mark_used(&self, id: &str, now: DateTime<Utc>) -> Result<bool, AppError> {
        let result = sqlx::query("UPDATE tickets SET is_used = TRUE, used_at = $1 WHERE id = $2 AND is_used = FALSE")
            .bind(now).bind(id)
            .execute(&self.pool).await.map_err(AppError::Database)?;
        Ok(result.rows_affected() == 1)
    }

    async fn check_in(&self, ticket_number: &str, event_id: &str, now: DateTime<Utc>) -> Result<Option<Ticket>, AppError> {
        sqlx::query_as::<_, Ticket>(
            "UPDATE tickets SET is_used = TRUE, used_at = $1
             WHERE ticket_number = $2 AND event_id = $3 AND is_used = FALSE
               AND EXISTS (
                   SELECT 1 FROM events e
                   WHERE e.id = tickets.event_id AND e.status = 'published' AND e.event_date >= $4
               )
             RETURNING *"
        )
            .bind(now).bind(ticket_number).bind(event_id).bind(now)
            .fetch_optional(&self.pool).await.map_err(AppError::Database)
    }
}
