//! Upload execution over blocking HTTP.
//!
//! The [`Transport`] trait isolates the wire from the pipeline so tests can
//! substitute a mock. The real implementation wraps a blocking reqwest
//! client: one POST per planned request, form-encoded metadata plus an
//! optional multipart file part, basic auth, no retries.

use mockall::automock;
use reqwest::blocking::multipart::{Form, Part};
use reqwest::blocking::Client;
use reqwest::header::{HeaderMap, HeaderValue, ACCEPT};
use tracing::debug;

use crate::error::TransportError;
use crate::plan::{Payload, UploadRequest};

/// Basic-auth credentials for the content repository.
#[derive(Debug, Clone)]
pub struct Credentials {
    pub user: String,
    pub password: String,
}

/// Result of one POST, real or synthetic.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UploadOutcome {
    /// HTTP status code; [`UploadOutcome::FAILURE`] when the transport
    /// itself failed.
    pub status: u16,
    pub reason: String,
}

impl UploadOutcome {
    /// Sentinel status for a request that never produced an HTTP response.
    pub const FAILURE: u16 = 0;

    pub fn is_success(&self) -> bool {
        (200..300).contains(&self.status)
    }
}

/// Blocking HTTP primitive consumed by the executor and the startup probe.
#[cfg_attr(any(test, feature = "test-export-mocks"), automock)]
pub trait Transport: Send + Sync {
    /// Issues one POST with the request's fields and payload.
    fn post(
        &self,
        request: &UploadRequest,
        auth: &Credentials,
    ) -> Result<UploadOutcome, TransportError>;

    /// HEAD probe: true when the URL answered with a status below 400.
    fn head_ok(&self, url: &str) -> bool;
}

/// Real transport over `reqwest::blocking`.
pub struct HttpTransport {
    client: Client,
}

impl HttpTransport {
    pub fn new() -> Result<Self, TransportError> {
        let mut headers = HeaderMap::new();
        headers.insert(ACCEPT, HeaderValue::from_static("application/json"));
        let client = Client::builder().default_headers(headers).build()?;
        Ok(HttpTransport { client })
    }
}

impl Transport for HttpTransport {
    fn post(
        &self,
        request: &UploadRequest,
        auth: &Credentials,
    ) -> Result<UploadOutcome, TransportError> {
        debug!(url = %request.url, label = request.label, "issuing POST");
        let builder = self
            .client
            .post(&request.url)
            .basic_auth(&auth.user, Some(&auth.password));

        let response = match &request.payload {
            Payload::None => {
                let fields: Vec<(&str, &str)> = request
                    .fields
                    .iter()
                    .map(|(k, v)| (k.as_str(), v.as_str()))
                    .collect();
                builder.form(&fields).send()?
            }
            Payload::FileBytes {
                part_name,
                content_type,
                source,
            } => {
                // The file handle is opened here, read once as the request
                // body, then released with the part.
                let mut part = Part::file(source)?.file_name(part_name.clone());
                if let Some(mime) = content_type {
                    part = part.mime_str(mime)?;
                }
                let mut form = Form::new();
                for (key, value) in &request.fields {
                    form = form.text(key.clone(), value.clone());
                }
                form = form.part(part_name.clone(), part);
                builder.multipart(form).send()?
            }
        };

        let status = response.status();
        Ok(UploadOutcome {
            status: status.as_u16(),
            reason: status.canonical_reason().unwrap_or_default().to_string(),
        })
    }

    fn head_ok(&self, url: &str) -> bool {
        match self.client.head(url).send() {
            Ok(response) => {
                debug!(url, status = response.status().as_u16(), "HEAD probe answered");
                response.status().as_u16() < 400
            }
            Err(error) => {
                debug!(url, error = %error, "HEAD probe failed");
                false
            }
        }
    }
}

/// Runs one planned request through the transport. A transport failure is
/// folded into a synthetic outcome and surfaced like any non-2xx response.
pub fn execute<T: Transport + ?Sized>(
    transport: &T,
    request: &UploadRequest,
    auth: &Credentials,
) -> UploadOutcome {
    match transport.post(request, auth) {
        Ok(outcome) => outcome,
        Err(error) => UploadOutcome {
            status: UploadOutcome::FAILURE,
            reason: error.to_string(),
        },
    }
}

/// Startup reachability probe against `{server}/pantheon`.
pub fn server_reachable<T: Transport + ?Sized>(transport: &T, server: &str) -> bool {
    transport.head_ok(&format!("{server}/pantheon"))
}
