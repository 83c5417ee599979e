use axum::http::{HeaderMap, header};

/// Does the client accept JSON responses?
///
/// True iff the Accept header contains `application/json` or the `*/*` wildcard,
/// case-insensitively. The header may list several comma-separated media types;
/// a substring test over the whole value covers all of them. A missing header is
/// treated as an empty string and therefore does not accept JSON.
pub fn accepts_json(headers: &HeaderMap) -> bool {
    let accept = headers
        .get(header::ACCEPT)
        .and_then(|v| v.to_str().ok())
        .unwrap_or("")
        .to_ascii_lowercase();
    accept.contains("application/json") || accept.contains("*/*")
}

/// Is the request body declared as JSON?
///
/// True iff the Content-Type header contains `application/json`, case-insensitively
/// (parameters such as `; charset=utf-8` do not matter). A missing header is not JSON.
pub fn is_json_body(headers: &HeaderMap) -> bool {
    headers
        .get(header::CONTENT_TYPE)
        .and_then(|v| v.to_str().ok())
        .is_some_and(|ct| ct.to_ascii_lowercase().contains("application/json"))
}
