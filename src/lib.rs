pub mod api;
pub mod cli;
pub mod client;
pub mod error;
pub mod models;
pub mod services;
pub mod state;
