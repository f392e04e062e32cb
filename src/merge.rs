//! URL, header and body merging.
//!
//! These helpers turn an instance configuration plus a [`Request`](crate::models::Request)
//! into the pieces handed to the HTTP client.

use crate::error::HighwayError;
use crate::models::request::Body;
use reqwest::header::{HeaderMap, HeaderName, HeaderValue};
use url::Url;

const PLACEHOLDER_HOST: &str = "placeholder.invalid";

/// Merges a path onto a base URL, keeping the base pathname.
///
/// Standard relative resolution replaces the base path when the reference
/// starts with `/`. Here the two paths are concatenated instead, so a base of
/// `https://snowball.aq/api` and a path of `/penguin` give
/// `https://snowball.aq/api/penguin`.
///
/// - If `path` carries its own host, it is returned as-is and the base is ignored.
/// - Query pairs of the base come first, then those of `path`. Duplicated keys are kept.
/// - Fragments are dropped.
///
/// # Examples
///
/// ```
/// use highway::merge::merge_urls;
/// use url::Url;
///
/// let base = Url::parse("https://snowball.aq/api?foo=bar").unwrap();
/// let url = merge_urls("/penguin?page=2", Some(&base)).unwrap();
/// assert_eq!(url.as_str(), "https://snowball.aq/api/penguin?foo=bar&page=2");
/// ```
pub fn merge_urls(path: &str, base: Option<&Url>) -> Result<Url, HighwayError> {
    match Url::parse(path) {
        Ok(url) => return Ok(url),
        Err(url::ParseError::RelativeUrlWithoutBase) => {}
        Err(e) => return Err(e.into()),
    }

    let base = base.ok_or_else(|| HighwayError::MissingBase(path.to_string()))?;

    let placeholder = Url::parse(&format!("https://{}", PLACEHOLDER_HOST))?;
    let source = placeholder.join(path)?;
    // Protocol-relative paths ("//host/...") bring their own host.
    if source.host_str() != Some(PLACEHOLDER_HOST) {
        return Ok(source);
    }

    let mut merged = base.clone();
    let joined = format!("{}{}", significant_path(base), significant_path(&source));
    merged.set_path(if joined.is_empty() { "/" } else { &joined });
    merged.set_query(None);
    merged.set_fragment(None);

    let pairs: Vec<(String, String)> = base
        .query_pairs()
        .chain(source.query_pairs())
        .map(|(k, v)| (k.into_owned(), v.into_owned()))
        .collect();
    append_query(&mut merged, &pairs);

    Ok(merged)
}

// The root path "/" contributes nothing to a merged path.
fn significant_path(url: &Url) -> &str {
    match url.path() {
        "/" => "",
        path => path,
    }
}

/// Appends query pairs to `url`, keeping the ones already present.
pub fn append_query(url: &mut Url, pairs: &[(String, String)]) {
    if pairs.is_empty() {
        return;
    }

    let mut query = url.query_pairs_mut();
    for (key, value) in pairs {
        query.append_pair(key, value);
    }
}

/// Merges two header sets.
///
/// Every header name present in `overrides` replaces all values of that name
/// in `defaults`. Other headers of `defaults` are kept.
pub fn merge_headers(defaults: &HeaderMap, overrides: &HeaderMap) -> HeaderMap {
    let mut merged = defaults.clone();

    for name in overrides.keys() {
        merged.remove(name);
        for value in overrides.get_all(name) {
            merged.append(name.clone(), value.clone());
        }
    }

    merged
}

/// Validates name/value pairs into a `HeaderMap`.
///
/// A later pair with the same name replaces an earlier one.
pub fn header_map<I, K, V>(pairs: I) -> Result<HeaderMap, HighwayError>
where
    I: IntoIterator<Item = (K, V)>,
    K: AsRef<str>,
    V: AsRef<str>,
{
    let mut headers = HeaderMap::new();

    for (name, value) in pairs {
        let (name, value) = (name.as_ref(), value.as_ref());
        let header_name = HeaderName::from_bytes(name.as_bytes())
            .map_err(|e| HighwayError::InvalidHeader(format!("invalid name {:?}: {}", name, e)))?;
        let header_value = HeaderValue::from_str(value).map_err(|e| {
            HighwayError::InvalidHeader(format!("invalid value for {}: {}", name, e))
        })?;
        headers.insert(header_name, header_value);
    }

    Ok(headers)
}

/// Encodes a request body into the bytes sent on the wire.
pub fn encode_body(body: &Body) -> Result<Vec<u8>, HighwayError> {
    match body {
        Body::Text(text) => Ok(text.as_bytes().to_vec()),
        Body::Bytes(bytes) => Ok(bytes.clone()),
        Body::Json(value) => serde_json::to_vec(value).map_err(HighwayError::Encode),
    }
}
