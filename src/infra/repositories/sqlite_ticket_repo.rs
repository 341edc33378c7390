use crate::domain::{models::ticket::Ticket, ports::TicketRepository};
use crate::error::AppError;
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::SqlitePool;

pub struct SqliteTicketRepo {
    pool: SqlitePool,
}

impl SqliteTicketRepo {
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl TicketRepository for SqliteTicketRepo {
    async fn find_by_id(&self, id: &str) -> Result<Option<Ticket>, AppError> {
        sqlx::query_as::<_, Ticket>("SELECT * FROM tickets WHERE id = ?")
            .bind(id)
            .fetch_optional(&self.pool).await.map_err(AppError::Database)
    }

    async fn find_by_number(&self, ticket_number: &str) -> Result<Option<Ticket>, AppError> {
        sqlx::query_as::<_, Ticket>("SELECT * FROM tickets WHERE ticket_number = ?")
            .bind(ticket_number)
            .fetch_optional(&self.pool).await.map_err(AppError::Database)
    }

    async fn find_by_number_for_event(&self, ticket_number: &str, event_id: &str) -> Result<Option<Ticket>, AppError> {
        sqlx::query_as::<_, Ticket>("SELECT * FROM tickets WHERE ticket_number = ? AND event_id = ?")
            .bind(ticket_number).bind(event_id)
            .fetch_optional(&self.pool).await.map_err(AppError::Database)
    }

    async fn list_by_booking(&self, booking_id: &str) -> Result<Vec<Ticket>, AppError> {
        sqlx::query_as::<_, Ticket>("SELECT * FROM tickets WHERE booking_id = ? ORDER BY created_at ASC, ticket_number ASC")
            .bind(booking_id)
            .fetch_all(&self.pool).await.map_err(AppError::Database)
    }

    async fn list_by_user(&self, user_id: &str) -> Result<Vec<Ticket>, AppError> {
        sqlx::query_as::<_, Ticket>("SELECT * FROM tickets WHERE user_id = ? ORDER BY created_at DESC")
            .bind(user_id)
            .fetch_all(&self.pool).await.map_err(AppError::Database)
    }

    async fn mark_used(&self, id: &str, now: DateTime<Utc>) -> Result<bool, AppError> {
        let result = sqlx::query("UPDATE tickets SET is_used = 1, used_at = ? WHERE id = ? AND is_used = 0")
            .bind(now).bind(id)
            .execute(&self.pool).await.map_err(AppError::Database)?;
        Ok(result.rows_affected() == 1)
    }

    async fn check_in(&self, ticket_number: &str, event_id: &str, now: DateTime<Utc>) -> Result<Option<Ticket>, AppError> {
        sqlx::query_as::<_, Ticket>(
            "UPDATE tickets SET is_used = 1, used_at = ?
             WHERE ticket_number = ? AND event_id = ? AND is_used = 0
               AND EXISTS (
                   SELECT 1 FROM events e
                   WHERE e.id = tickets.event_id AND e.status = 'published' AND e.event_date >= ?
               )
             RETURNING *"
        )
            .bind(now).bind(ticket_number).bind(event_id).bind(now)
            .fetch_optional(&self.pool).await.map_err(AppError::Database)
    }
}
