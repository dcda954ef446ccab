//! Form decoding for `POST /api/generate`.
//!
//! The frontend posts `multipart/form-data`; scripts tend to post
//! `application/x-www-form-urlencoded`. Both collapse to a flat field map.

use super::error::ApiError;
use axum::extract::{FromRequest, Multipart, Request};
use axum::http::header::CONTENT_TYPE;
use axum::Form;
use photoset_core::GenerationRequest;
use std::collections::HashMap;

const DEFAULT_TEMPERATURE: f32 = 0.7;

/// Read every text field of a form body.
pub async fn read_fields(request: Request) -> Result<HashMap<String, String>, ApiError> {
    let is_multipart = request
        .headers()
        .get(CONTENT_TYPE)
        .and_then(|v| v.to_str().ok())
        .is_some_and(|ct| ct.starts_with("multipart/form-data"));

    if !is_multipart {
        let Form(fields) = Form::<HashMap<String, String>>::from_request(request, &())
            .await
            .map_err(|e| ApiError::new(e.status(), e.body_text()))?;
        return Ok(fields);
    }

    let mut multipart = Multipart::from_request(request, &())
        .await
        .map_err(|e| ApiError::new(e.status(), e.body_text()))?;

    let mut fields = HashMap::new();
    while let Some(field) = multipart.next_field().await? {
        let Some(name) = field.name().map(String::from) else {
            continue;
        };
        let value = field.text().await?;
        fields.insert(name, value);
    }
    Ok(fields)
}

fn required(fields: &mut HashMap<String, String>, name: &str) -> Result<String, ApiError> {
    fields
        .remove(name)
        .ok_or_else(|| ApiError::bad_request(format!("missing form field: {name}")))
}

/// Turn decoded form fields into a generation request.
///
/// `file_names` must be a JSON array of strings. `file_mapping` is optional
/// and a malformed value degrades to an empty mapping.
pub fn parse_generate(mut fields: HashMap<String, String>) -> Result<GenerationRequest, ApiError> {
    let endpoint = required(&mut fields, "api_endpoint")?;
    let system_prompt = required(&mut fields, "system_prompt")?;
    let raw_files = required(&mut fields, "file_names")?;

    let api_key = fields
        .remove("api_key")
        .filter(|k| !k.trim().is_empty());

    let temperature = match fields.remove("temperature") {
        Some(raw) if !raw.trim().is_empty() => raw
            .trim()
            .parse::<f32>()
            .ok()
            .filter(|t| t.is_finite())
            .ok_or_else(|| ApiError::bad_request(format!("invalid temperature: {raw}")))?,
        _ => DEFAULT_TEMPERATURE,
    };

    let target_files: Vec<String> = serde_json::from_str(&raw_files)
        .map_err(|e| ApiError::bad_request(format!("invalid file_names: {e}")))?;

    let name_mapping = match fields.remove("file_mapping") {
        Some(raw) => serde_json::from_str::<HashMap<String, String>>(&raw).unwrap_or_else(|e| {
            tracing::warn!("Ignoring malformed file_mapping: {e}");
            HashMap::new()
        }),
        None => HashMap::new(),
    };

    Ok(GenerationRequest {
        endpoint,
        api_key,
        system_prompt,
        temperature,
        target_files,
        name_mapping,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::http::StatusCode;

    fn fields(pairs: &[(&str, &str)]) -> HashMap<String, String> {
        pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect()
    }

    fn base() -> Vec<(&'static str, &'static str)> {
        vec![
            ("api_endpoint", "https://api.openai.com/v1/chat/completions"),
            ("system_prompt", "describe"),
            ("file_names", r#"["a.png", "b.jpg"]"#),
        ]
    }

    #[test]
    fn test_minimal_form_uses_defaults() {
        let req = parse_generate(fields(&base())).unwrap();
        assert_eq!(req.target_files, vec!["a.png", "b.jpg"]);
        assert_eq!(req.temperature, DEFAULT_TEMPERATURE);
        assert!(req.api_key.is_none());
        assert!(req.name_mapping.is_empty());
    }

    #[test]
    fn test_full_form() {
        let mut pairs = base();
        pairs.push(("api_key", "sk-1"));
        pairs.push(("temperature", "0.2"));
        pairs.push(("file_mapping", r#"{"a.png": "猫.png"}"#));

        let req = parse_generate(fields(&pairs)).unwrap();
        assert_eq!(req.api_key.as_deref(), Some("sk-1"));
        assert_eq!(req.temperature, 0.2);
        assert_eq!(req.display_name("a.png"), "猫.png");
        assert_eq!(req.display_name("b.jpg"), "b.jpg");
    }

    #[test]
    fn test_malformed_mapping_is_tolerated() {
        let mut pairs = base();
        pairs.push(("file_mapping", "{not json"));
        let req = parse_generate(fields(&pairs)).unwrap();
        assert!(req.name_mapping.is_empty());
    }

    #[test]
    fn test_malformed_file_names_is_rejected() {
        let mut pairs = base();
        pairs[2] = ("file_names", "a.png,b.jpg");
        let err = parse_generate(fields(&pairs)).unwrap_err();
        assert_eq!(err.status(), StatusCode::BAD_REQUEST);
        assert!(err.detail().contains("file_names"));
    }

    #[test]
    fn test_missing_endpoint_is_rejected() {
        let pairs: Vec<_> = base().into_iter().skip(1).collect();
        let err = parse_generate(fields(&pairs)).unwrap_err();
        assert!(err.detail().contains("api_endpoint"));
    }

    #[test]
    fn test_bad_temperature_is_rejected() {
        for raw in ["warm", "NaN", "inf"] {
            let mut pairs = base();
            pairs.push(("temperature", raw));
            assert!(parse_generate(fields(&pairs)).is_err(), "{raw}");
        }
    }

    #[test]
    fn test_blank_api_key_is_absent() {
        let mut pairs = base();
        pairs.push(("api_key", ""));
        assert!(parse_generate(fields(&pairs)).unwrap().api_key.is_none());
    }
}
