// Frameworks layer: process bootstrap, configuration and the HTTP server.

pub mod config;
pub mod server;
