use axum::{extract::Path, Json};
use clarity_codec::{decode_hex, infer_value};
use serde::Serialize;
use serde_json::Value;

use crate::error::{ApiError, ApiResult};

#[derive(Debug, Serialize)]
pub struct EncodedValue {
    #[serde(rename = "type")]
    pub type_name: String,
    pub serialized: String,
}

/// Decode a hex-serialized Clarity value into its typed JSON form.
pub async fn clarity_decode(Path(value): Path<String>) -> ApiResult<Json<Value>> {
    let decoded = decode_hex(value.trim()).map_err(|e| ApiError::deserialize(&value, e))?;
    Ok(Json(decoded.to_typed_json()))
}

/// Infer a Clarity value from human-readable input and serialize it.
pub async fn clarity_encode(Path(value): Path<String>) -> ApiResult<Json<EncodedValue>> {
    let inferred = infer_value(&value).map_err(|e| ApiError::serialize(&value, e))?;
    Ok(Json(EncodedValue {
        type_name: inferred.type_string(),
        serialized: inferred.to_hex(),
    }))
}
