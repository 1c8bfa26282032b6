pub mod auth;
pub mod categories;
pub mod comments;
pub mod languages;
pub mod notifications;
pub mod questions;
pub mod stories;
pub mod users;
