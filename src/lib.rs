pub mod analytics;
pub mod auth;
pub mod backend;
pub mod chat;
pub mod cli;
pub mod config;
pub mod currency;
pub mod dashboards;
pub mod database;
pub mod error;
pub mod filter;
pub mod reports;
pub mod telemetry;
pub mod transparency;
