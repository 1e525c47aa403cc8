//! shorturl: a URL shortener with homoglyph-safe aliases and link
//! reputation checks.

pub mod admin;
pub mod alias;
pub mod api_doc;
pub mod cache;
pub mod config;
pub mod error;
pub mod middleware;
pub mod models;
pub mod reputation;
pub mod routes;
pub mod server;
pub mod services;
pub mod state;
pub mod store;
pub mod target;
