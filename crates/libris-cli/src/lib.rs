//! libris command-line interface and HTTP server

pub mod commands;
pub mod config;
pub mod http;
