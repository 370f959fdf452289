pub mod api;
pub mod auth;
pub mod config;
pub mod error;
pub mod handlers;
pub mod services;
pub mod store;
