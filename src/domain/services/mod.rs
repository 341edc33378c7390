pub mod auth_service;
pub mod entry;
pub mod inventory;
pub mod notification_service;
pub mod qr_service;
pub mod ticket_service;
