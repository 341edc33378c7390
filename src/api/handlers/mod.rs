pub mod admin;
pub mod auth;
pub mod entry;
pub mod event;
pub mod health;
pub mod ticket;
pub mod ticket_type;
