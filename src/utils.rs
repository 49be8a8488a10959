use reqwest::Url;
use serde_json::Value;

use crate::error::ApiError;

/// Expands a request URL with additional query parameters.
///
/// Parameters already present in `base` are kept; on a key collision the
/// caller-supplied value wins. Every key appears exactly once in the result,
/// and values are percent-encoded.
pub fn expand_url(base: &str, params: &[(&str, String)]) -> Result<String, ApiError> {
    let mut url = Url::parse(base).map_err(|e| ApiError::InvalidUrl(e.to_string()))?;

    let mut pairs: Vec<(String, String)> = url
        .query_pairs()
        .map(|(k, v)| (k.into_owned(), v.into_owned()))
        .collect();

    for (key, value) in params {
        match pairs.iter_mut().find(|(k, _)| k == key) {
            Some(existing) => existing.1 = value.clone(),
            None => pairs.push((key.to_string(), value.clone())),
        }
    }

    if pairs.is_empty() {
        url.set_query(None);
    } else {
        let mut query = url.query_pairs_mut();
        query.clear();
        for (k, v) in &pairs {
            query.append_pair(k, v);
        }
        drop(query);
    }

    Ok(url.into())
}

/// Follows `path` through nested JSON objects and returns the array found at
/// the end, or `None` if any step is missing or the terminal value is not an
/// array.
pub fn pluck_items<'a>(body: &'a Value, path: &[&str]) -> Option<&'a Vec<Value>> {
    let mut node = body;
    for key in path {
        node = node.get(key)?;
    }
    node.as_array()
}

/// Renders an RFC 3339 timestamp (Spotify's `added_at` format) as a plain
/// date, falling back to the raw string when it does not parse.
pub fn format_added_at(added_at: &str) -> String {
    match chrono::DateTime::parse_from_rfc3339(added_at) {
        Ok(ts) => ts.format("%Y-%m-%d").to_string(),
        Err(_) => added_at.to_string(),
    }
}
