use thiserror::Error;

use crate::models::StartType;

/// Top-level error type for the `urbackup-api` crate.
///
/// Covers every failure mode across the library: transport and URL
/// construction, the retrying call wrapper, the login handshake, and the
/// shape checks the domain operations perform on server answers.
#[derive(Debug, Error)]
pub enum Error {
    // ── Transport ───────────────────────────────────────────────────
    /// Base URL uses a scheme other than `http` or `https`.
    #[error("Unsupported URL scheme '{0}' (expected http or https)")]
    UnsupportedScheme(String),

    /// URL parsing error.
    #[error("Invalid URL: {0}")]
    InvalidUrl(#[from] url::ParseError),

    /// TLS setup or certificate error.
    #[error("TLS error: {0}")]
    Tls(String),

    /// HTTP transport error (connection refused, DNS failure, timeout, etc.)
    #[error("HTTP transport error: {0}")]
    Transport(#[from] reqwest::Error),

    /// Local file error while writing a download.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    // ── Call wrapper ────────────────────────────────────────────────
    /// Retry ceiling exhausted without a 200 answer.
    #[error("API call '{action}' failed after {attempts} attempts (last HTTP status {status})")]
    CallFailed {
        action: String,
        attempts: u32,
        status: u16,
    },

    /// JSON deserialization failed, with the raw body for debugging.
    #[error("Malformed answer to '{action}': {message}")]
    Decode {
        action: String,
        message: String,
        body: String,
    },

    // ── Authentication ──────────────────────────────────────────────
    /// The server has no account with the configured username.
    #[error("Server does not know user '{0}'")]
    UnknownUser(String),

    /// The server rejected the derived login credential.
    #[error("Login rejected for user '{0}'")]
    InvalidCredentials(String),

    // ── Domain operations ───────────────────────────────────────────
    /// Named client absent from the server's status list.
    #[error("No client named '{0}' in server status")]
    ClientNotFound(String),

    /// `add_client` on a name the server already has.
    #[error("Client '{0}' already exists on the server")]
    ClientExists(String),

    /// An action record handed to `stop_action` lacks a required field.
    #[error("Action record is missing the '{0}' field")]
    MissingField(&'static str),

    /// A 200 answer parsed fine but lacks a key the operation depends on.
    #[error("Answer to '{action}' is missing the expected '{field}' field")]
    UnexpectedShape {
        action: &'static str,
        field: &'static str,
    },

    /// The server refused to start the requested backup, or answered the
    /// start request with something other than exactly one `start_ok` entry.
    #[error("Server did not start {start_type} backup for client '{client}'")]
    BackupNotStarted { client: String, start_type: StartType },
}

impl Error {
    /// Returns `true` if this error means the handshake itself failed
    /// and no operation will succeed until the credentials change.
    pub fn is_auth_error(&self) -> bool {
        matches!(
            self,
            Self::UnknownUser(_) | Self::InvalidCredentials(_)
        )
    }

    /// Returns `true` if this is a transient error worth retrying
    /// at a higher level.
    pub fn is_transient(&self) -> bool {
        match self {
            Self::Transport(e) => e.is_timeout() || e.is_connect(),
            Self::CallFailed { .. } => true,
            _ => false,
        }
    }

    /// Returns `true` if this is a "not found" style error.
    pub fn is_not_found(&self) -> bool {
        matches!(self, Self::ClientNotFound(_))
    }
}
