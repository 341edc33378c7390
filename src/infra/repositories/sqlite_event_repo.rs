use crate::domain::{models::{event::Event, ticket_type::TicketType}, ports::EventRepository};
use crate::error::AppError;
use async_trait::async_trait;
use chrono::Utc;
use sqlx::SqlitePool;

pub struct SqliteEventRepo {
    pool: SqlitePool,
}

impl SqliteEventRepo {
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl EventRepository for SqliteEventRepo {
    async fn create_event(&self, event: &Event) -> Result<Event, AppError> {
        sqlx::query_as::<_, Event>(
            "INSERT INTO events (id, organizer_id, title, description, venue_name, venue_address, city, country, event_date, status, created_at, updated_at)
             VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?)
             RETURNING *"
        )
            .bind(&event.id).bind(&event.organizer_id).bind(&event.title).bind(&event.description)
            .bind(&event.venue_name).bind(&event.venue_address).bind(&event.city).bind(&event.country)
            .bind(event.event_date).bind(&event.status).bind(event.created_at).bind(event.updated_at)
            .fetch_one(&self.pool).await.map_err(AppError::Database)
    }

    async fn find_event(&self, id: &str) -> Result<Option<Event>, AppError> {
        sqlx::query_as::<_, Event>("SELECT * FROM events WHERE id = ?")
            .bind(id)
            .fetch_optional(&self.pool).await.map_err(AppError::Database)
    }

    async fn list_published(&self) -> Result<Vec<Event>, AppError> {
        sqlx::query_as::<_, Event>("SELECT * FROM events WHERE status = 'published' ORDER BY event_date ASC")
            .fetch_all(&self.pool).await.map_err(AppError::Database)
    }

    async fn update_event_status(&self, id: &str, status: &str) -> Result<Option<Event>, AppError> {
        sqlx::query_as::<_, Event>("UPDATE events SET status = ?, updated_at = ? WHERE id = ? RETURNING *")
            .bind(status).bind(Utc::now()).bind(id)
            .fetch_optional(&self.pool).await.map_err(AppError::Database)
    }

    async fn create_ticket_type(&self, tt: &TicketType) -> Result<TicketType, AppError> {
        sqlx::query_as::<_, TicketType>(
            "INSERT INTO ticket_types (id, event_id, name, description, price, currency, available_quantity, sold_quantity, max_per_user, sales_start_date, sales_end_date, is_active, created_at, updated_at)
             VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?)
             RETURNING *"
        )
            .bind(&tt.id).bind(&tt.event_id).bind(&tt.name).bind(&tt.description)
            .bind(tt.price).bind(&tt.currency).bind(tt.available_quantity).bind(tt.sold_quantity)
            .bind(tt.max_per_user).bind(tt.sales_start_date).bind(tt.sales_end_date).bind(tt.is_active)
            .bind(tt.created_at).bind(tt.updated_at)
            .fetch_one(&self.pool).await.map_err(AppError::Database)
    }

    async fn find_ticket_type(&self, id: &str) -> Result<Option<TicketType>, AppError> {
        sqlx::query_as::<_, TicketType>("SELECT * FROM ticket_types WHERE id = ?")
            .bind(id)
            .fetch_optional(&self.pool).await.map_err(AppError::Database)
    }

    async fn list_ticket_types(&self, event_id: &str, active_only: bool) -> Result<Vec<TicketType>, AppError> {
        sqlx::query_as::<_, TicketType>(
            "SELECT * FROM ticket_types WHERE event_id = ? AND (is_active = 1 OR ? = 0) ORDER BY price ASC, created_at ASC"
        )
            .bind(event_id).bind(active_only)
            .fetch_all(&self.pool).await.map_err(AppError::Database)
    }

    async fn set_ticket_type_active(&self, id: &str, is_active: bool) -> Result<Option<TicketType>, AppError> {
        sqlx::query_as::<_, TicketType>("UPDATE ticket_types SET is_active = ?, updated_at = ? WHERE id = ? RETURNING *")
            .bind(is_active).bind(Utc::now()).bind(id)
            .fetch_optional(&self.pool).await.map_err(AppError::Database)
    }
}
