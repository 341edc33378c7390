use std::str::FromStr;
use std::sync::Arc;
use std::time::Duration;
use sqlx::{postgres::{PgPoolOptions, PgConnectOptions}, sqlite::{SqlitePoolOptions, SqliteJournalMode, SqliteConnectOptions}};
use sqlx::{PgPool, SqlitePool, ConnectOptions};
use tracing::info;
use tracing::log::LevelFilter;

use crate::config::Config;
use crate::state::{AppState, Repositories};
use crate::infra::email::http_email_service::HttpEmailService;
use crate::domain::services::notification_service::load_templates;
use crate::infra::repositories::{
    postgres_user_repo::PostgresUserRepo, postgres_auth_repo::PostgresAuthRepo,
    postgres_event_repo::PostgresEventRepo, postgres_booking_repo::PostgresBookingRepo,
    postgres_ticket_repo::PostgresTicketRepo,
    sqlite_user_repo::SqliteUserRepo, sqlite_auth_repo::SqliteAuthRepo,
    sqlite_event_repo::SqliteEventRepo, sqlite_booking_repo::SqliteBookingRepo,
    sqlite_ticket_repo::SqliteTicketRepo,
};

pub fn sqlite_repositories(pool: &SqlitePool) -> Repositories {
    Repositories {
        user_repo: Arc::new(SqliteUserRepo::new(pool.clone())),
        auth_repo: Arc::new(SqliteAuthRepo::new(pool.clone())),
        event_repo: Arc::new(SqliteEventRepo::new(pool.clone())),
        booking_repo: Arc::new(SqliteBookingRepo::new(pool.clone())),
        ticket_repo: Arc::new(SqliteTicketRepo::new(pool.clone())),
    }
}

pub fn postgres_repositories(pool: &PgPool) -> Repositories {
    Repositories {
        user_repo: Arc::new(PostgresUserRepo::new(pool.clone())),
        auth_repo: Arc::new(PostgresAuthRepo::new(pool.clone())),
        event_repo: Arc::new(PostgresEventRepo::new(pool.clone())),
        booking_repo: Arc::new(PostgresBookingRepo::new(pool.clone())),
        ticket_repo: Arc::new(PostgresTicketRepo::new(pool.clone())),
    }
}

pub async fn bootstrap_state(config: &Config) -> AppState {
    let database_url = &config.database_url;
    let email_service = Arc::new(HttpEmailService::new(
        config.mail_service_url.clone(),
        config.mail_service_token.clone(),
    ));

    let templates = Arc::new(load_templates().expect("Failed to load email templates"));

    let repos = if database_url.starts_with("postgres://") || database_url.starts_with("postgresql://") {
        info!("Initializing PostgreSQL connection...");

        let mut opts: PgConnectOptions = database_url.parse().expect("Invalid Postgres URL");
        opts = opts.log_statements(LevelFilter::Debug)
            .log_slow_statements(LevelFilter::Warn, Duration::from_millis(500));

        let pool = PgPoolOptions::new()
            .max_connections(10)
            .connect_with(opts)
            .await
            .expect("Failed to connect to Postgres");

        run_postgres_migrations(&pool).await;
        postgres_repositories(&pool)
    } else {
        info!("Initializing SQLite connection with WAL Mode...");

        let opts = SqliteConnectOptions::from_str(database_url)
            .expect("Invalid SQLite connection string")
            .create_if_missing(true)
            .journal_mode(SqliteJournalMode::Wal)
            .busy_timeout(Duration::from_secs(5))
            .log_statements(LevelFilter::Debug)
            .log_slow_statements(LevelFilter::Warn, Duration::from_millis(500));

        let pool = SqlitePoolOptions::new()
            .max_connections(5)
            .connect_with(opts)
            .await
            .expect("Failed to connect to SQLite");

        run_sqlite_migrations(&pool).await;
        sqlite_repositories(&pool)
    };

    AppState::new(config.clone(), repos, email_service, templates)
}

async fn run_postgres_migrations(pool: &PgPool) {
    sqlx::migrate!("./migrations/postgres")
        .run(pool)
        .await
        .expect("Failed to run Postgres migrations");
}

async fn run_sqlite_migrations(pool: &SqlitePool) {
    sqlx::migrate!("./migrations/sqlite")
        .run(pool)
        .await
        .expect("Failed to run SQLite migrations");
}
