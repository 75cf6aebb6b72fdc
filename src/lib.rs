// Re-export modules
pub mod api;
pub mod config;
pub mod models;
pub mod security;
pub mod utils;
