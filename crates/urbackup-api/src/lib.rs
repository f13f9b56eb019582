// urbackup-api: Rust client for the UrBackup backup server's web API

pub mod error;
pub mod models;
pub mod retry;
pub mod server;
pub mod transport;

mod actions;
mod auth;
mod backups;
mod clients;
mod logs;
mod settings;
mod status;

pub use error::Error;
pub use retry::{Backoff, RetryPolicy};
pub use server::{ServerConfig, UrbackupServer};
pub use transport::{BasicAuth, TlsMode};
