// HTTP transport for the UrBackup web API.
//
// One request per call: the URL is the configured base plus `a=<action>`,
// parameters travel in the query string (GET) or as a form-urlencoded body
// (POST), and no idle connections are kept between calls. The session
// token is not handled here; the call wrapper merges it into the
// parameter map before dispatch.

use std::collections::BTreeMap;
use std::path::PathBuf;
use std::time::Duration;

use reqwest::Method;
use reqwest::blocking::{Client, Response};
use reqwest::header::{ACCEPT, CONTENT_TYPE, HeaderMap, HeaderValue};
use secrecy::{ExposeSecret, SecretString};
use tracing::debug;
use url::{Url, form_urlencoded};

use crate::error::Error;

/// Parameter mapping sent with every action call. Ordered so that encoded
/// request bodies are deterministic.
pub type Params = BTreeMap<String, String>;

/// Build a parameter map from borrowed pairs.
pub(crate) fn params(pairs: &[(&str, &str)]) -> Params {
    pairs
        .iter()
        .map(|(key, value)| ((*key).to_owned(), (*value).to_owned()))
        .collect()
}

/// Request timeout, connect and body transfer included. Generous because
/// installer downloads can run to hundreds of megabytes.
const HTTP_TIMEOUT: Duration = Duration::from_secs(600);

/// TLS verification mode for `https` servers.
#[derive(Debug, Clone, Default)]
pub enum TlsMode {
    /// Use the system certificate store.
    #[default]
    System,
    /// Use a custom CA certificate from the given PEM file.
    CustomCa(PathBuf),
    /// Accept any certificate (for self-signed lab servers).
    DangerAcceptInvalid,
}

/// HTTP Basic credentials for servers behind an `.htpasswd` gate.
///
/// Entirely separate from the application-level session login; both can be
/// active at once.
#[derive(Debug, Clone)]
pub struct BasicAuth {
    pub username: String,
    pub password: SecretString,
}

impl BasicAuth {
    pub fn new(username: impl Into<String>, password: impl Into<String>) -> Self {
        Self {
            username: username.into(),
            password: SecretString::from(password.into()),
        }
    }
}

/// Dispatches single HTTP requests against the server's web root.
#[derive(Debug)]
pub struct Transport {
    http: Client,
    base_url: Url,
    basic_auth: Option<BasicAuth>,
}

impl Transport {
    /// Build a transport for the given base URL.
    ///
    /// The URL should point at the server's web root, including any
    /// configured path prefix (e.g. `http://127.0.0.1:55414/x`). Schemes
    /// other than `http` and `https` are rejected up front.
    pub(crate) fn new(
        base_url: Url,
        tls: &TlsMode,
        basic_auth: Option<BasicAuth>,
    ) -> Result<Self, Error> {
        match base_url.scheme() {
            "http" | "https" => {}
            other => return Err(Error::UnsupportedScheme(other.to_owned())),
        }

        let mut headers = HeaderMap::new();
        headers.insert(ACCEPT, HeaderValue::from_static("application/json"));
        // The server expects this content type even on GET; observed wire
        // behavior, kept as-is.
        headers.insert(
            CONTENT_TYPE,
            HeaderValue::from_static("application/json; charset=UTF-8"),
        );

        let mut builder = Client::builder()
            .timeout(HTTP_TIMEOUT)
            .user_agent("urbackup-api/0.1.0")
            .default_headers(headers)
            // Every call opens and closes its own connection.
            .pool_max_idle_per_host(0);

        match tls {
            TlsMode::System => {}
            TlsMode::CustomCa(path) => {
                let cert_pem = std::fs::read(path)
                    .map_err(|e| Error::Tls(format!("failed to read CA cert: {e}")))?;
                let cert = reqwest::Certificate::from_pem(&cert_pem)
                    .map_err(|e| Error::Tls(format!("invalid CA cert: {e}")))?;
                builder = builder.add_root_certificate(cert);
            }
            TlsMode::DangerAcceptInvalid => {
                builder = builder.danger_accept_invalid_certs(true);
            }
        }

        let http = builder
            .build()
            .map_err(|e| Error::Tls(format!("failed to build HTTP client: {e}")))?;

        Ok(Self {
            http,
            base_url,
            basic_auth,
        })
    }

    /// Send one request for `action` and return the raw response.
    ///
    /// GET carries `params` in the query string; POST form-urlencodes them
    /// into the body. Non-200 statuses are returned, not mapped -- the call
    /// wrapper owns the retry decision.
    pub(crate) fn send(
        &self,
        action: &str,
        params: &Params,
        method: Method,
    ) -> Result<Response, Error> {
        let mut url = self.base_url.clone();
        {
            let mut query = url.query_pairs_mut();
            query.append_pair("a", action);
            if method == Method::GET {
                for (key, value) in params {
                    query.append_pair(key, value);
                }
            }
        }

        debug!("{} a={}", method, action);

        let mut request = self.http.request(method.clone(), url);
        if method == Method::POST {
            let mut body = form_urlencoded::Serializer::new(String::new());
            for (key, value) in params {
                body.append_pair(key, value);
            }
            request = request.body(body.finish());
        }
        if let Some(auth) = &self.basic_auth {
            request = request.basic_auth(&auth.username, Some(auth.password.expose_secret()));
        }

        request.send().map_err(Error::Transport)
    }
}
