//! Blocking HTTP exchange with an OpsDesk server.
//!
//! # Invariants
//! - `404` maps to `StoreError::NotFound` for the requested record.
//! - Connect failures, timeouts, `5xx` and undecodable bodies map to
//!   `StoreError::Transport`; no request is retried.
//! - Any other non-success status maps to `StoreError::Rejected`.

use crate::config::ClientConfig;
use log::debug;
use opsdesk_core::{RecordKind, StoreError, StoreResult};
use reqwest::blocking::{Client, Response};
use reqwest::{Method, StatusCode};
use serde::de::DeserializeOwned;
use serde::Serialize;
use serde_json::Value;
use uuid::Uuid;

pub const API_PREFIX: &str = "/api/v1";

/// Record a request targets, used to shape `NotFound`.
#[derive(Debug, Clone, Copy)]
pub(crate) struct Target {
    pub kind: RecordKind,
    pub id: Option<Uuid>,
}

impl Target {
    pub fn collection(kind: RecordKind) -> Self {
        Self { kind, id: None }
    }

    pub fn record(kind: RecordKind, id: Uuid) -> Self {
        Self { kind, id: Some(id) }
    }
}

#[derive(Debug, Clone)]
pub(crate) struct HttpTransport {
    http: Client,
    base_url: String,
}

impl HttpTransport {
    pub fn new(config: &ClientConfig) -> StoreResult<Self> {
        let http = Client::builder()
            .timeout(config.timeout)
            .build()
            .map_err(|err| StoreError::Transport(format!("failed to build http client: {err}")))?;
        Ok(Self {
            http,
            base_url: config.base_url.clone(),
        })
    }

    /// Sends a request and decodes a JSON success body.
    pub fn fetch<T: DeserializeOwned>(
        &self,
        method: Method,
        path: &str,
        target: Target,
        body: Option<&impl Serialize>,
    ) -> StoreResult<T> {
        let response = self.exchange(method, path, target, body)?;
        response
            .json::<T>()
            .map_err(|err| StoreError::Transport(format!("undecodable response body: {err}")))
    }

    /// Sends a request whose success body is ignored.
    pub fn execute(&self, method: Method, path: &str, target: Target) -> StoreResult<()> {
        self.exchange(method, path, target, None::<&Value>).map(|_| ())
    }

    fn exchange(
        &self,
        method: Method,
        path: &str,
        target: Target,
        body: Option<&impl Serialize>,
    ) -> StoreResult<Response> {
        let url = format!("{}{}{}", self.base_url, API_PREFIX, path);
        let mut request = self.http.request(method.clone(), &url);
        if let Some(body) = body {
            request = request.json(body);
        }

        let response = request.send().map_err(|err| {
            debug!("event=remote_request module=client status=error method={method} path={path} error={err}");
            StoreError::Transport(err.to_string())
        })?;

        let status = response.status();
        debug!(
            "event=remote_request module=client status=ok method={method} path={path} code={}",
            status.as_u16()
        );
        if status.is_success() {
            return Ok(response);
        }
        Err(classify_failure(status, target, response))
    }
}

fn classify_failure(status: StatusCode, target: Target, response: Response) -> StoreError {
    let detail = response_detail(response);
    match (status, target.id) {
        (StatusCode::NOT_FOUND, Some(id)) => StoreError::not_found(target.kind, id),
        (status, _) if status.is_server_error() || status == StatusCode::NOT_FOUND => {
            StoreError::Transport(format!("server answered {}: {detail}", status.as_u16()))
        }
        (status, _) => StoreError::Rejected {
            status: status.as_u16(),
            message: detail,
        },
    }
}

fn response_detail(response: Response) -> String {
    let text = response.text().unwrap_or_default();
    match serde_json::from_str::<Value>(&text) {
        Ok(Value::Object(map)) => match map.get("detail") {
            Some(Value::String(detail)) => detail.clone(),
            Some(other) => other.to_string(),
            None => text,
        },
        _ => text,
    }
}
