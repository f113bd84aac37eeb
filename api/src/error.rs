use axum::{
    http::{header, HeaderValue, StatusCode},
    response::{IntoResponse, Response},
    Json,
};
use chrono::{SecondsFormat, Utc};
use clarity_codec::{AddressError, DecodeError, EncodeError, MatchError};
use serde::Serialize;
use serde_json::{json, Value};
use uuid::Uuid;

use crate::metrics;
use crate::upstream::FetchError;

pub const INVALID_ADDRESS: &str = "INVALID_ADDRESS";
pub const INVALID_QUERY: &str = "INVALID_QUERY";
pub const NOT_FOUND: &str = "NOT_FOUND";
pub const CONTRACT_ABI_ERROR: &str = "CONTRACT_ABI_ERROR";
pub const CLARITY_SERIALIZE_ERROR: &str = "CLARITY_SERIALIZE_ERROR";
pub const CLARITY_DESERIALIZE_ERROR: &str = "CLARITY_DESERIALIZE_ERROR";
pub const CALL_READ_ERROR: &str = "CALL_READ_ERROR";
pub const CONTRACT_DATA_VAR_READ_ERROR: &str = "CONTRACT_DATA_VAR_READ_ERROR";
pub const CONTRACT_DATA_MAP_READ_ERROR: &str = "CONTRACT_DATA_MAP_READ_ERROR";
pub const UPSTREAM_ERROR: &str = "UPSTREAM_ERROR";
pub const FETCH_ERROR: &str = "FETCH_ERROR";

#[derive(Debug)]
pub struct ApiError {
    status: StatusCode,
    error: String,
    message: String,
    details: Option<Value>,
    curl: Option<String>,
}

#[derive(Debug, Serialize)]
struct ErrorResponse {
    error: String,
    message: String,
    code: u16,
    timestamp: String,
    correlation_id: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    details: Option<Value>,
}

impl ApiError {
    pub fn new(status: StatusCode, error: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            status,
            error: error.into(),
            message: message.into(),
            details: None,
            curl: None,
        }
    }

    pub fn bad_request(error: impl Into<String>, message: impl Into<String>) -> Self {
        Self::new(StatusCode::BAD_REQUEST, error, message)
    }

    pub fn not_found(error: impl Into<String>, message: impl Into<String>) -> Self {
        Self::new(StatusCode::NOT_FOUND, error, message)
    }

    pub fn internal(error: impl Into<String>, message: impl Into<String>) -> Self {
        Self::new(StatusCode::INTERNAL_SERVER_ERROR, error, message)
    }

    pub fn bad_gateway(error: impl Into<String>, message: impl Into<String>) -> Self {
        Self::new(StatusCode::BAD_GATEWAY, error, message)
    }

    pub fn with_details(mut self, details: Value) -> Self {
        self.details = Some(details);
        self
    }

    /// Attach the upstream request as an `x-curl-equiv` header.
    pub fn with_curl(mut self, curl: impl Into<String>) -> Self {
        self.curl = Some(curl.into());
        self
    }

    pub fn status(&self) -> StatusCode {
        self.status
    }

    pub fn error_code(&self) -> &str {
        &self.error
    }

    /// Deserialization failure of a value received from upstream or a caller.
    pub fn deserialize(input: &str, err: DecodeError) -> Self {
        metrics::CLARITY_DECODE_FAILURES.inc();
        Self::internal(
            CLARITY_DESERIALIZE_ERROR,
            format!("Error deserializing Clarity value \"{}\": {}", input, err),
        )
    }

    /// Serialization failure of a caller-supplied value with no ABI context.
    pub fn serialize(input: &str, err: EncodeError) -> Self {
        metrics::CLARITY_ENCODE_FAILURES.inc();
        let mut error = Self::bad_request(
            CLARITY_SERIALIZE_ERROR,
            format!("Error serializing Clarity value \"{}\": {}", input, err),
        );
        if let Some(field) = err.offending_field() {
            error = error.with_details(json!({ "field": field }));
        }
        error
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let correlation_id = Uuid::new_v4().to_string();
        if self.status.is_server_error() {
            tracing::error!(
                correlation_id = %correlation_id,
                error = %self.error,
                "{}",
                self.message
            );
        }
        let payload = ErrorResponse {
            error: self.error,
            message: self.message,
            code: self.status.as_u16(),
            timestamp: Utc::now().to_rfc3339_opts(SecondsFormat::Secs, true),
            correlation_id: correlation_id.clone(),
            details: self.details,
        };

        let mut response = (self.status, Json(payload)).into_response();
        if let Ok(value) = HeaderValue::from_str(&correlation_id) {
            response.headers_mut().insert(header::HeaderName::from_static("x-correlation-id"), value);
        }
        if let Some(value) = self.curl.and_then(|c| HeaderValue::from_str(&c).ok()) {
            response.headers_mut().insert(header::HeaderName::from_static("x-curl-equiv"), value);
        }
        response
    }
}

impl From<AddressError> for ApiError {
    fn from(err: AddressError) -> Self {
        metrics::observe_translation("invalid");
        Self::bad_request(INVALID_ADDRESS, err.to_string())
    }
}

impl From<MatchError> for ApiError {
    fn from(err: MatchError) -> Self {
        match err {
            MatchError::ArityMismatch { expected, actual } => Self::bad_request(
                CONTRACT_ABI_ERROR,
                format!(
                    "Contract function requires {} arguments but {} were provided",
                    expected, actual
                ),
            )
            .with_details(json!({ "expected": expected, "actual": actual })),
            MatchError::UnknownAbiMember { kind, name } => Self::not_found(
                CONTRACT_ABI_ERROR,
                format!("Contract does not contain a {} titled \"{}\"", kind, name),
            ),
            MatchError::Encode {
                name,
                ty,
                input,
                source,
            } => {
                metrics::CLARITY_ENCODE_FAILURES.inc();
                let mut details = json!({ "argument": name, "type": ty, "input": input });
                if let Some(field) = source.offending_field() {
                    details["field"] = json!(field);
                }
                Self::bad_request(
                    CLARITY_SERIALIZE_ERROR,
                    format!(
                        "Argument \"{}\" of type {} could not be encoded from value \"{}\": {}",
                        name, ty, input, source
                    ),
                )
                .with_details(details)
            }
        }
    }
}

impl From<FetchError> for ApiError {
    fn from(err: FetchError) -> Self {
        Self::bad_gateway(FETCH_ERROR, format!("Server fetch error: {}", err))
    }
}

pub type ApiResult<T> = std::result::Result<T, ApiError>;
