// Library exports for inbox-summarizer crate
// This allows tests and other crates to use the modules

pub mod auth;
pub mod config;
pub mod email;
pub mod error;
pub mod gmail_client;
pub mod pipeline;
pub mod store;
pub mod summarizer;
