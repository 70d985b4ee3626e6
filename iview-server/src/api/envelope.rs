//! Response envelope and request extractors that fail with [`ApiError`]
//!
//! Success: `{"success": true, "data": ...}`. Failures are rendered by
//! `ApiError::into_response`. The stock `Json`/`Query` rejections are plain
//! text, so handlers use [`ApiJson`] and [`ApiQuery`] instead.

use axum::{
    async_trait,
    extract::{
        rejection::{JsonRejection, QueryRejection},
        FromRequest, FromRequestParts, Query, Request,
    },
    http::{request::Parts, StatusCode},
    Json,
};
use serde::{de::DeserializeOwned, Deserialize, Deserializer, Serialize};

use crate::error::{ApiError, ApiResult};

/// Successful response body
#[derive(Debug, Serialize)]
pub struct Envelope<T> {
    pub success: bool,
    pub data: T,
}

/// 200 with `data`
pub fn ok<T: Serialize>(data: T) -> ApiResult<Json<Envelope<T>>> {
    Ok(Json(Envelope { success: true, data }))
}

/// 201 with `data`
pub fn created<T: Serialize>(data: T) -> ApiResult<(StatusCode, Json<Envelope<T>>)> {
    Ok((StatusCode::CREATED, Json(Envelope { success: true, data })))
}

/// JSON body extractor with envelope-shaped rejections
#[derive(Debug)]
pub struct ApiJson<T>(pub T);

#[async_trait]
impl<S, T> FromRequest<S> for ApiJson<T>
where
    T: DeserializeOwned,
    S: Send + Sync,
{
    type Rejection = ApiError;

    async fn from_request(req: Request, state: &S) -> Result<Self, Self::Rejection> {
        match Json::<T>::from_request(req, state).await {
            Ok(Json(value)) => Ok(ApiJson(value)),
            // Syntactically valid JSON with the wrong shape
            Err(JsonRejection::JsonDataError(e)) => Err(ApiError::Validation(e.body_text())),
            Err(rejection) => Err(ApiError::BadRequest(rejection.body_text())),
        }
    }
}

/// Query-string extractor with envelope-shaped rejections
#[derive(Debug)]
pub struct ApiQuery<T>(pub T);

#[async_trait]
impl<S, T> FromRequestParts<S> for ApiQuery<T>
where
    T: DeserializeOwned,
    S: Send + Sync,
{
    type Rejection = ApiError;

    async fn from_request_parts(parts: &mut Parts, state: &S) -> Result<Self, Self::Rejection> {
        Query::<T>::from_request_parts(parts, state)
            .await
            .map(|Query(value)| ApiQuery(value))
            .map_err(|rejection: QueryRejection| ApiError::BadRequest(rejection.body_text()))
    }
}

/// Trimmed, non-empty required text field
pub fn required_text(field: &str, value: &str, max_len: usize) -> ApiResult<String> {
    let trimmed = value.trim();
    if trimmed.is_empty() {
        return Err(ApiError::Validation(format!("{} must not be empty", field)));
    }
    if trimmed.chars().count() > max_len {
        return Err(ApiError::Validation(format!(
            "{} must be at most {} characters",
            field, max_len
        )));
    }
    Ok(trimmed.to_string())
}

/// Trimmed optional text field; blank becomes `None`
pub fn optional_text(
    field: &str,
    value: Option<&str>,
    max_len: usize,
) -> ApiResult<Option<String>> {
    match value.map(str::trim).filter(|v| !v.is_empty()) {
        None => Ok(None),
        Some(v) => required_text(field, v, max_len).map(Some),
    }
}

/// For PATCH bodies, with `#[serde(default, deserialize_with = "nullable")]`:
/// an absent field is `None`, an explicit `null` is `Some(None)`.
pub fn nullable<'de, T, D>(deserializer: D) -> Result<Option<Option<T>>, D::Error>
where
    T: Deserialize<'de>,
    D: Deserializer<'de>,
{
    Option::<T>::deserialize(deserializer).map(Some)
}

/// [`optional_text`] for a [`nullable`] field; `Some(None)` clears the column
pub fn patch_text(
    field: &str,
    value: Option<Option<String>>,
    max_len: usize,
) -> ApiResult<Option<Option<String>>> {
    value
        .map(|v| optional_text(field, v.as_deref(), max_len))
        .transpose()
}

/// Minimal email sanity check; returns the lowercased address
pub fn validate_email(value: &str) -> ApiResult<String> {
    let email = value.trim().to_lowercase();
    let valid = match email.split_once('@') {
        Some((local, domain)) => {
            !local.is_empty()
                && domain.contains('.')
                && !domain.starts_with('.')
                && !domain.ends_with('.')
                && !email.contains(char::is_whitespace)
                && email.len() <= 254
        }
        None => false,
    };
    if !valid {
        return Err(ApiError::Validation(format!("invalid email address '{}'", value.trim())));
    }
    Ok(email)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_required_text() {
        assert_eq!(
            required_text("title", "  Backend Engineer ", 100).unwrap(),
            "Backend Engineer"
        );
        assert!(required_text("title", "   ", 100).is_err());
        assert!(required_text("title", "abcdef", 5).is_err());
    }

    #[test]
    fn test_optional_text() {
        assert_eq!(optional_text("d", None, 10).unwrap(), None);
        assert_eq!(optional_text("d", Some("  "), 10).unwrap(), None);
        assert_eq!(optional_text("d", Some(" x "), 10).unwrap(), Some("x".to_string()));
    }

    #[derive(Debug, serde::Deserialize)]
    struct Patch {
        #[serde(default, deserialize_with = "nullable")]
        note: Option<Option<String>>,
    }

    #[test]
    fn test_nullable_distinguishes_absent_from_null() {
        let absent: Patch = serde_json::from_str("{}").unwrap();
        assert_eq!(absent.note, None);
        let null: Patch = serde_json::from_str(r#"{"note": null}"#).unwrap();
        assert_eq!(null.note, Some(None));
        let set: Patch = serde_json::from_str(r#"{"note": "hi"}"#).unwrap();
        assert_eq!(set.note, Some(Some("hi".to_string())));

        assert_eq!(patch_text("note", Some(Some("  ".to_string())), 10).unwrap(), Some(None));
        assert_eq!(patch_text("note", None, 10).unwrap(), None);
    }

    #[test]
    fn test_validate_email() {
        assert_eq!(validate_email(" Ada@Example.com ").unwrap(), "ada@example.com");
        assert!(validate_email("no-at-sign").is_err());
        assert!(validate_email("@example.com").is_err());
        assert!(validate_email("a@localhost").is_err());
        assert!(validate_email("a b@example.com").is_err());
    }
}
