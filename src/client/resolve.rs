//! Response resolution.
//!
//! Turns a `reqwest::Response` into a [`Resolved`] value according to the
//! request's [`ResponseMode`] and `must` flag.

use crate::error::{ApiError, HighwayError};
use crate::models::request::{Resolver, ResponseMode};
use crate::models::response::{Blob, HttpResponse, Resolved};
use std::collections::HashMap;
use std::time::Instant;

const FORM_URLENCODED: &str = "application/x-www-form-urlencoded";

/// Applies status checking, empty-body rules and the resolver.
///
/// 1. Soft requests get the response back whatever the status.
/// 2. Non-success statuses become [`ApiError`]s; their body is left unread.
/// 3. An empty body fails with `EmptyBody` when `must` is set, otherwise it
///    yields `Empty` for resolved requests and the response for raw ones.
pub(crate) async fn resolve_response(
    response: reqwest::Response,
    mode: ResponseMode,
    must: bool,
    started: Instant,
) -> Result<Resolved, HighwayError> {
    if mode == ResponseMode::Soft {
        return Ok(Resolved::Response(buffer_response(response, started).await?));
    }

    if !response.status().is_success() {
        return Err(ApiError::new(response).into());
    }

    let buffered = buffer_response(response, started).await?;

    if buffered.is_empty() {
        if must {
            return Err(HighwayError::EmptyBody);
        }

        return Ok(match mode {
            ResponseMode::Resolve(_) => Resolved::Empty,
            _ => Resolved::Response(buffered),
        });
    }

    match mode {
        ResponseMode::Resolve(resolver) => decode(resolver, buffered),
        _ => Ok(Resolved::Response(buffered)),
    }
}

/// Reads the whole body and captures status, URL and headers.
async fn buffer_response(
    response: reqwest::Response,
    started: Instant,
) -> Result<HttpResponse, HighwayError> {
    let status = response.status();
    let url = response.url().to_string();

    let mut headers: HashMap<String, String> = HashMap::new();
    for (name, value) in response.headers() {
        let value = String::from_utf8_lossy(value.as_bytes());
        let value = value.as_ref();
        headers
            .entry(name.as_str().to_string())
            .and_modify(|existing| {
                existing.push_str(", ");
                existing.push_str(value);
            })
            .or_insert_with(|| value.to_string());
    }

    let body = response.bytes().await?.to_vec();

    Ok(HttpResponse {
        status_code: status.as_u16(),
        status_text: status.canonical_reason().unwrap_or("Unknown").to_string(),
        url,
        headers,
        body,
        duration: started.elapsed(),
    })
}

/// Decodes a non-empty, successful response with `resolver`.
pub(crate) fn decode(resolver: Resolver, response: HttpResponse) -> Result<Resolved, HighwayError> {
    match resolver {
        Resolver::Text => Ok(Resolved::Text(
            String::from_utf8_lossy(&response.body).into_owned(),
        )),
        Resolver::Json => serde_json::from_slice(&response.body)
            .map(Resolved::Json)
            .map_err(|e| HighwayError::Decode(format!("invalid JSON: {}", e))),
        Resolver::Blob => Ok(Resolved::Blob(Blob {
            content_type: response.content_type().map(str::to_string),
            bytes: response.body,
        })),
        Resolver::Bytes => Ok(Resolved::Bytes(response.body)),
        Resolver::Form => decode_form(&response),
        Resolver::Void => Ok(Resolved::Empty),
    }
}

fn decode_form(response: &HttpResponse) -> Result<Resolved, HighwayError> {
    let content_type = response.content_type().unwrap_or_default();
    let essence = content_type.split(';').next().unwrap_or_default().trim();

    if !essence.eq_ignore_ascii_case(FORM_URLENCODED) {
        return Err(HighwayError::Decode(format!(
            "cannot read form data from content type {:?}",
            content_type
        )));
    }

    let pairs = url::form_urlencoded::parse(&response.body)
        .into_owned()
        .collect();
    Ok(Resolved::Form(pairs))
}
