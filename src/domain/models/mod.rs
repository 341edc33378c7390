pub mod auth;
pub mod booking;
pub mod event;
pub mod ticket;
pub mod ticket_type;
pub mod user;
