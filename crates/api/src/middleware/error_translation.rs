//! Error translation middleware.
//!
//! The single place where failures become responses. It wraps the whole
//! router: a response that carries a parked [`Failure`], or a panic unwinding
//! out of a route, is classified, logged once with the request's context and
//! a fresh [`ErrorId`], and written with the configured encoder. Every other
//! response passes through untouched.
//!
//! Classification follows the outermost failure. The innermost cause is only
//! logged, never written to the body.

use std::any::Any;
use std::error::Error as StdError;
use std::net::SocketAddr;
use std::panic::AssertUnwindSafe;
use std::sync::Arc;

use axum::body::{Body, Bytes};
use axum::extract::{ConnectInfo, Request, State};
use axum::http::request::Parts;
use axum::http::{HeaderValue, StatusCode, header};
use axum::middleware::Next;
use axum::response::{IntoResponse, Response};
use common::{CurrentUser, ErrorEnvelope, ErrorId, Localizer};
use domain::{AppError, BoxError, Failure, PersistenceError};
use futures_util::FutureExt;

use super::current_user;
use crate::config::{Config, is_sensitive_path};
use crate::error::ParkedFailure;
use crate::serialization::{ErrorEncoder, encoder_for};

const SUPPORT_MESSAGE: &str =
    "Please provide the ErrorId to the support team for further analysis.";
const UNEXPECTED: &str = "Something went wrong. Please try again later.";
const NOT_FOUND: &str = "The requested resource was not found.";
const BODY_TOO_LARGE: &str = "The request body exceeds {0} bytes.";
const REDACTED: &str = "[redacted]";

/// Shared state of the middleware.
#[derive(Clone)]
pub struct ErrorTranslation {
    localizer: Arc<dyn Localizer>,
    encoder: Arc<dyn ErrorEncoder>,
    sensitive_paths: Arc<[String]>,
    max_body_bytes: usize,
}

impl ErrorTranslation {
    pub fn new(config: &Config, localizer: Arc<dyn Localizer>) -> Self {
        Self {
            localizer,
            encoder: encoder_for(config.serializer),
            sensitive_paths: config.sensitive_paths.clone().into(),
            max_body_bytes: config.max_body_bytes,
        }
    }

    pub fn encoder(&self) -> &dyn ErrorEncoder {
        self.encoder.as_ref()
    }

    fn translate(&self, escaped: Escaped, request: &RequestSnapshot) -> Response {
        let error_id = ErrorId::generate();
        let outcome = self.classify(&escaped);
        let status = outcome.status.as_u16();

        tracing::error!(
            error_id = %error_id,
            remote_ip = %request.remote_ip,
            scheme = %request.scheme,
            host = %request.host,
            method = %request.method,
            path = %request.path,
            query = %request.query,
            body = %request.loggable_body(&self.sensitive_paths),
            status,
            user_id = %request.user.user_id().map(|id| id.to_string()).unwrap_or_default(),
            user_email = %request.user.email_or_anonymous(),
            root_cause = %root_cause(&escaped),
            "request failed"
        );
        metrics::counter!("http_errors_total", "status" => status.to_string()).increment(1);

        let envelope = ErrorEnvelope {
            succeeded: false,
            status_code: status,
            exception: outcome.exception,
            error_id: error_id.to_string(),
            support_message: self.localizer.text(SUPPORT_MESSAGE),
            source: outcome.source,
            remote_ip: request.remote_ip.clone(),
            messages: outcome.messages,
        };
        tracing::error!(
            "ERROR: {}::Request failed with Status Code: {}::Error Id: {}.",
            envelope.exception,
            status,
            error_id
        );

        match self.encoder.encode(&envelope) {
            Ok(body) => (
                outcome.status,
                [(
                    header::CONTENT_TYPE,
                    HeaderValue::from_static("application/json"),
                )],
                body,
            )
                .into_response(),
            Err(error) => {
                tracing::error!(%error_id, %error, encoder = self.encoder.name(), "failed to encode error envelope");
                StatusCode::INTERNAL_SERVER_ERROR.into_response()
            }
        }
    }

    fn classify(&self, escaped: &Escaped) -> Classification {
        match escaped {
            Escaped::Failure(failure) => match failure.as_ref() {
                Failure::Typed(error) => self.typed(error),
                Failure::Unhandled(error) if is_not_found(error) => {
                    let text = self.localizer.text(NOT_FOUND);
                    Classification {
                        status: StatusCode::NOT_FOUND,
                        exception: text.clone(),
                        source: None,
                        messages: vec![text],
                    }
                }
                Failure::Unhandled(_) => self.unexpected(),
            },
            Escaped::Panic(_) => self.unexpected(),
        }
    }

    fn typed(&self, error: &AppError) -> Classification {
        let status =
            StatusCode::from_u16(error.status_code()).unwrap_or(StatusCode::INTERNAL_SERVER_ERROR);
        let messages = error.messages(self.localizer.as_ref());
        let exception = messages
            .first()
            .cloned()
            .unwrap_or_else(|| error.to_string());

        Classification {
            status,
            exception,
            source: (!status.is_server_error())
                .then(|| format!("{}::{}", std::any::type_name::<AppError>(), error.kind())),
            messages,
        }
    }

    fn unexpected(&self) -> Classification {
        Classification {
            status: StatusCode::INTERNAL_SERVER_ERROR,
            exception: self.localizer.text(UNEXPECTED),
            source: None,
            messages: Vec::new(),
        }
    }
}

/// Middleware entry point, installed with `axum::middleware::from_fn_with_state`.
pub async fn translate_errors(
    State(translation): State<ErrorTranslation>,
    request: Request,
    next: Next,
) -> Response {
    let (parts, body) = request.into_parts();

    let bytes = match axum::body::to_bytes(body, translation.max_body_bytes).await {
        Ok(bytes) => bytes,
        Err(error) => {
            tracing::debug!(%error, "request body rejected");
            let snapshot = RequestSnapshot::capture(&parts, Bytes::new());
            let limit = translation.max_body_bytes.to_string();
            let failure = AppError::validation(
                "body",
                vec![translation.localizer.translate(BODY_TOO_LARGE, &[limit.as_str()])],
            );
            return translation.translate(Escaped::Failure(Arc::new(failure.into())), &snapshot);
        }
    };

    // The route sees a fresh stream over the same buffered bytes.
    let snapshot = RequestSnapshot::capture(&parts, bytes.clone());
    let request = Request::from_parts(parts, Body::from(bytes));

    let escaped = match AssertUnwindSafe(next.run(request)).catch_unwind().await {
        Ok(mut response) => match response.extensions_mut().remove::<ParkedFailure>() {
            Some(ParkedFailure(failure)) => Escaped::Failure(failure),
            None => return response,
        },
        Err(panic) => Escaped::Panic(panic_message(panic.as_ref())),
    };

    translation.translate(escaped, &snapshot)
}

/// What escaped the wrapped pipeline.
enum Escaped {
    Failure(Arc<Failure>),
    Panic(String),
}

struct Classification {
    status: StatusCode,
    exception: String,
    source: Option<String>,
    messages: Vec<String>,
}

/// Connection and request metadata kept for the failure log line.
struct RequestSnapshot {
    remote_ip: String,
    scheme: String,
    host: String,
    method: String,
    path: String,
    query: String,
    body: Bytes,
    user: CurrentUser,
}

impl RequestSnapshot {
    fn capture(parts: &Parts, body: Bytes) -> Self {
        let header_value = |name: &str| {
            parts
                .headers
                .get(name)
                .and_then(|v| v.to_str().ok())
                .map(str::to_string)
        };

        Self {
            remote_ip: parts
                .extensions
                .get::<ConnectInfo<SocketAddr>>()
                .map(|ConnectInfo(addr)| addr.ip().to_string())
                .unwrap_or_default(),
            scheme: parts
                .uri
                .scheme_str()
                .map(str::to_string)
                .or_else(|| header_value("x-forwarded-proto"))
                .unwrap_or_else(|| "http".to_string()),
            host: parts
                .uri
                .host()
                .map(str::to_string)
                .or_else(|| header_value(header::HOST.as_str()))
                .unwrap_or_default(),
            method: parts.method.to_string(),
            path: parts.uri.path().to_string(),
            query: parts.uri.query().unwrap_or_default().to_string(),
            body,
            user: current_user::resolve(&parts.headers),
        }
    }

    fn loggable_body(&self, sensitive_paths: &[String]) -> String {
        if self.body.is_empty() {
            String::new()
        } else if is_sensitive_path(sensitive_paths, &self.path) {
            REDACTED.to_string()
        } else {
            String::from_utf8_lossy(&self.body).into_owned()
        }
    }
}

fn is_not_found(error: &BoxError) -> bool {
    if let Some(e) = error.downcast_ref::<PersistenceError>() {
        return e.is_not_found();
    }
    if let Some(e) = error.downcast_ref::<std::io::Error>() {
        return e.kind() == std::io::ErrorKind::NotFound;
    }
    false
}

fn root_cause(escaped: &Escaped) -> String {
    match escaped {
        Escaped::Failure(failure) => {
            let mut cause: &(dyn StdError + 'static) = failure.as_error();
            while let Some(inner) = cause.source() {
                cause = inner;
            }
            cause.to_string()
        }
        Escaped::Panic(message) => format!("panic: {message}"),
    }
}

fn panic_message(payload: &(dyn Any + Send)) -> String {
    if let Some(message) = payload.downcast_ref::<&str>() {
        (*message).to_string()
    } else if let Some(message) = payload.downcast_ref::<String>() {
        message.clone()
    } else {
        "unknown panic payload".to_string()
    }
}
