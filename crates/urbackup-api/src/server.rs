// UrBackup server connection
//
// `UrbackupServer` owns the transport, the retry policy, the account
// credentials, and the two pieces of per-connection mutable state: the
// session token and the live-log cursor. Domain operations (status,
// settings, backups, ...) are implemented as inherent methods in their
// own modules to keep this one focused on call mechanics.

use std::path::Path;
use std::thread;

use reqwest::{Method, StatusCode};
use secrecy::SecretString;
use serde::de::DeserializeOwned;
use tracing::{debug, warn};

use crate::auth::SessionState;
use crate::error::Error;
use crate::retry::RetryPolicy;
use crate::transport::{BasicAuth, Params, TlsMode, Transport};

/// Connection settings for one UrBackup server.
#[derive(Debug, Clone)]
pub struct ServerConfig {
    /// Web root of the server, including any path prefix,
    /// e.g. `http://127.0.0.1:55414/x`.
    pub server_url: String,
    /// Account for the salted login handshake. Ignored when the server
    /// allows anonymous access.
    pub username: String,
    pub password: SecretString,
    /// HTTP Basic credentials if the server sits behind an `.htpasswd`
    /// gate; independent of the account login.
    pub basic_auth: Option<BasicAuth>,
    pub tls: TlsMode,
    pub retry: RetryPolicy,
}

impl ServerConfig {
    pub fn new(
        server_url: impl Into<String>,
        username: impl Into<String>,
        password: impl Into<String>,
    ) -> Self {
        Self {
            server_url: server_url.into(),
            username: username.into(),
            password: SecretString::from(password.into()),
            basic_auth: None,
            tls: TlsMode::default(),
            retry: RetryPolicy::default(),
        }
    }

    pub fn with_basic_auth(mut self, auth: BasicAuth) -> Self {
        self.basic_auth = Some(auth);
        self
    }

    pub fn with_tls(mut self, tls: TlsMode) -> Self {
        self.tls = tls;
        self
    }

    pub fn with_retry(mut self, retry: RetryPolicy) -> Self {
        self.retry = retry;
        self
    }
}

/// Client for one UrBackup server's web API.
///
/// Logs in lazily: the first operation that needs authentication runs the
/// handshake, later ones reuse the session. All operations take
/// `&mut self` -- the session token and live-log cursor are plain mutable
/// fields, and exclusive borrows are what makes this library's
/// single-threaded, blocking design hold up without locks.
///
/// ```no_run
/// use urbackup_api::{ServerConfig, UrbackupServer};
///
/// # fn main() -> Result<(), urbackup_api::Error> {
/// let config = ServerConfig::new("http://127.0.0.1:55414/x", "admin", "secret");
/// let mut server = UrbackupServer::new(config)?;
/// for client in server.get_status()? {
///     println!("{} online={:?}", client.name, client.online);
/// }
/// # Ok(())
/// # }
/// ```
pub struct UrbackupServer {
    pub(crate) transport: Transport,
    pub(crate) retry: RetryPolicy,
    pub(crate) username: String,
    pub(crate) password: SecretString,
    pub(crate) session: SessionState,
    /// Highest live-log entry id seen so far; `get_livelog` polls from here.
    pub(crate) last_log_id: i64,
}

impl UrbackupServer {
    /// Build a client from the given configuration.
    ///
    /// Fails on an unparseable URL, a non-http(s) scheme, or an unusable
    /// TLS setup. No network traffic happens here; login is lazy.
    pub fn new(config: ServerConfig) -> Result<Self, Error> {
        let base_url = url::Url::parse(&config.server_url)?;
        let transport = Transport::new(base_url, &config.tls, config.basic_auth)?;
        Ok(Self {
            transport,
            retry: config.retry,
            username: config.username,
            password: config.password,
            session: SessionState::Anonymous,
            last_log_id: 0,
        })
    }

    /// Whether a login has succeeded on this connection.
    pub fn logged_in(&self) -> bool {
        self.session.is_authenticated()
    }

    /// Merge the held session token into a parameter map. Every call,
    /// downloads included, carries the token once one exists.
    pub(crate) fn with_session(&self, mut params: Params) -> Params {
        if let Some(ses) = self.session.token() {
            params.insert("ses".to_owned(), ses.to_owned());
        }
        params
    }

    /// POST `action` and decode the JSON answer into `T`.
    ///
    /// Non-200 answers are retried up to the policy ceiling; exhaustion is
    /// `CallFailed`. Transport failures are not retried -- a server that
    /// answers at all is worth hammering, one that is unreachable is not.
    pub(crate) fn call_json<T: DeserializeOwned>(
        &self,
        action: &str,
        params: Params,
    ) -> Result<T, Error> {
        let params = self.with_session(params);
        let attempts = self.retry.max_attempts.max(1);
        let mut last_status = 0;

        for attempt in 1..=attempts {
            let response = self.transport.send(action, &params, Method::POST)?;
            let status = response.status();

            if status == StatusCode::OK {
                let body = response.text()?;
                return serde_json::from_str(&body).map_err(|e| Error::Decode {
                    action: action.to_owned(),
                    message: e.to_string(),
                    body,
                });
            }

            last_status = status.as_u16();
            if attempt < attempts {
                warn!(action, attempt, status = last_status, "API call failed, retrying");
                if let Some(delay) = self.retry.delay_after(attempt) {
                    thread::sleep(delay);
                }
            }
        }

        Err(Error::CallFailed {
            action: action.to_owned(),
            attempts,
            status: last_status,
        })
    }

    /// GET `action` and stream the response body into `dest`.
    ///
    /// Used for installer downloads. No retries: a broken download is
    /// reported, not resumed. Returns the number of bytes written.
    pub(crate) fn download_file(
        &self,
        action: &str,
        params: Params,
        dest: &Path,
    ) -> Result<u64, Error> {
        let params = self.with_session(params);
        let mut response = self.transport.send(action, &params, Method::GET)?;
        let status = response.status();

        if status != StatusCode::OK {
            return Err(Error::CallFailed {
                action: action.to_owned(),
                attempts: 1,
                status: status.as_u16(),
            });
        }

        let mut file = std::fs::File::create(dest)?;
        let bytes = response.copy_to(&mut file)?;
        debug!(action, bytes, dest = %dest.display(), "download complete");
        Ok(bytes)
    }
}
