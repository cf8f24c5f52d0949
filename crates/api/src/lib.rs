//! HTTP API: server config, identity context, routing and response mapping.

pub mod app;
pub mod config;
pub mod context;
pub mod middleware;
