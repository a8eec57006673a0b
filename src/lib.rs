//! Command-line RSS aggregator: register, follow feeds, ingest their items
//! into PostgreSQL and browse them.

pub mod commands;
pub mod config;
pub mod database;
pub mod error;
pub mod fetcher;
pub mod scheduler;
pub mod utils;
