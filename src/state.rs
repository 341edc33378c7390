use std::sync::Arc;
use crate::domain::ports::{
    AuthRepository, BookingRepository, EmailService, EventRepository,
    TicketRepository, UserRepository,
};
use crate::domain::services::{
    auth_service::AuthService,
    notification_service::NotificationService,
    qr_service::QrService,
    ticket_service::TicketService,
};
use crate::config::Config;
use tera::Tera;

pub struct Repositories {
    pub user_repo: Arc<dyn UserRepository>,
    pub auth_repo: Arc<dyn AuthRepository>,
    pub event_repo: Arc<dyn EventRepository>,
    pub booking_repo: Arc<dyn BookingRepository>,
    pub ticket_repo: Arc<dyn TicketRepository>,
}

#[derive(Clone)]
pub struct AppState {
    pub config: Config,
    pub user_repo: Arc<dyn UserRepository>,
    pub event_repo: Arc<dyn EventRepository>,
    pub auth_service: Arc<AuthService>,
    pub qr_service: Arc<QrService>,
    pub ticket_service: Arc<TicketService>,
}

impl AppState {
    /// Wires services on top of the given backend.
    pub fn new(config: Config, repos: Repositories, email_service: Arc<dyn EmailService>, templates: Arc<Tera>) -> Self {
        let qr_service = Arc::new(QrService::new(&config.qr, &config.base_url));
        let auth_service = Arc::new(AuthService::new(repos.auth_repo, config.clone()));
        let notifier = NotificationService::new(email_service, templates);
        let ticket_service = Arc::new(TicketService::new(
            repos.event_repo.clone(),
            repos.booking_repo,
            repos.ticket_repo,
            qr_service.clone(),
            notifier,
        ));

        Self {
            config,
            user_repo: repos.user_repo,
            event_repo: repos.event_repo,
            auth_service,
            qr_service,
            ticket_service,
        }
    }
}
