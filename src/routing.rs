use axum::http::Method;
use regex::Regex;
use std::sync::LazyLock;

/// All canonical API paths live under this prefix; GET requests outside it fall
/// through to the static file service.
pub const API_PREFIX: &str = "/api";

/// Lexical shape of a store-generated identifier: 8-24 lowercase alphanumerics.
/// A trailing segment that does not match is NOT an id, and the raw path is then
/// looked up verbatim (and misses the table).
static ID_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^[0-9a-z]{8,24}$").expect("valid id pattern"));

/// Route
///
/// One row of the static route table: a canonical path (never containing an id
/// segment) and its allowed methods. `allow` is the precomputed
/// `Access-Control-Allow-Methods` value for OPTIONS responses.
pub struct Route {
    pub path: &'static str,
    pub methods: &'static [Method],
    pub allow: &'static str,
}

/// Known API routes and their allowed methods.
///
/// Defined once, immutable for the process lifetime. Used both to reject
/// structurally invalid methods (405) and to answer OPTIONS preflights with the
/// correct Access-Control-Allow-Methods value.
static ROUTE_TABLE: [Route; 4] = [
    Route {
        path: "/api/register",
        methods: &[Method::POST],
        allow: "POST",
    },
    Route {
        path: "/api/users",
        methods: &[Method::GET, Method::PUT, Method::DELETE],
        allow: "GET,PUT,DELETE",
    },
    Route {
        path: "/api/products",
        methods: &[Method::GET, Method::POST, Method::PUT, Method::DELETE],
        allow: "GET,POST,PUT,DELETE",
    },
    Route {
        path: "/api/orders",
        methods: &[Method::GET, Method::POST],
        allow: "GET,POST",
    },
];

/// Exact-string lookup of a canonical path in the route table.
pub fn lookup(canonical_path: &str) -> Option<&'static Route> {
    ROUTE_TABLE.iter().find(|r| r.path == canonical_path)
}

/// ParsedRequestTarget
///
/// The classification of a concrete URL path: the canonical path used for table
/// lookup plus the trailing identifier, if one was recognized. Derived once per
/// request and never mutated afterwards.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ParsedRequestTarget {
    pub canonical_path: String,
    pub trailing_id: Option<String>,
}

/// Classify a URL path against the route table's shape.
///
/// An identifier segment is recognized when the path has exactly one more segment
/// than a canonical path (`/api/<resource>/<id>`) and that extra segment matches
/// the store's generated-id shape. The id is then stripped; otherwise the raw path
/// is the canonical path with no trailing id.
pub fn classify(path: &str) -> ParsedRequestTarget {
    let segments: Vec<&str> = path.split('/').collect();

    if segments.len() == 4 && ID_RE.is_match(segments[3]) {
        return ParsedRequestTarget {
            canonical_path: segments[..3].join("/"),
            trailing_id: Some(segments[3].to_string()),
        };
    }

    ParsedRequestTarget {
        canonical_path: path.to_string(),
        trailing_id: None,
    }
}
