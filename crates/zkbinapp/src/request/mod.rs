//! # Request Classification
//!
//! Turns the shape of an incoming HTTP request into exactly one [`Operation`]
//! and a parameter bag. Classification happens once, in [`Request::new`];
//! the result never changes for the lifetime of the request.
//!
//! The request itself arrives as an explicit [`RequestContext`] value, so
//! classification is a pure function of what the caller hands in.
//!
//! ## Parameters
//!
//! - Mutating methods (`POST`, `PUT`, `DELETE`) read their parameters from a
//!   JSON object in the body. A body that is not a JSON object yields an empty
//!   bag; validation further down rejects it.
//! - Other methods read the query string through a fixed allow-list, each
//!   field passed through the sanitizer for its type:
//!
//! | Parameter | Sanitizer |
//! |-----------|-----------|
//! | `deletetoken` | [`sanitize::special_chars`] |
//! | `jsonld` | [`sanitize::special_chars`] |
//! | `link` | [`sanitize::url`] |
//! | `pasteid` | [`sanitize::special_chars`] |
//! | `shortenviayourls` | [`sanitize::special_chars`] |
//!
//! Links of the form `/?5b65a01b43987bc2` carry the paste id as a bare query
//! key. When none of `pasteid`, `jsonld` or `link` is present and the query
//! string is not empty, the first bare key that is a valid id becomes the
//! paste id. Without one the paste id is set to [`INVALID_ID`], which later
//! fails id validation.
//!
//! ## Operation
//!
//! Resolved by priority:
//!
//! 1. paste id and delete token: `delete`
//! 2. paste id: `read`, unless the method is mutating (stays `create`)
//! 3. `jsonld`: `jsonld`
//! 4. `link` with a `/shortenviayourls` path or a `shortenviayourls` flag:
//!    `yourlsproxy`
//! 5. otherwise `create` for mutating methods, `view` for the rest

pub mod negotiate;
pub mod sanitize;

use crate::id::is_valid_id;
use serde::Serialize;
use serde_json::{Map, Number, Value};
use std::fmt;
use std::str::FromStr;

/// Paste id given to query strings that name no valid paste.
pub const INVALID_ID: &str = "invalid id";

const YOURLS_PATH: &str = "/shortenviayourls";

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Method {
    Get,
    Head,
    Post,
    Put,
    Delete,
    Other(String),
}

impl Method {
    /// True for the methods that carry a JSON body.
    pub fn is_mutating(&self) -> bool {
        matches!(self, Method::Post | Method::Put | Method::Delete)
    }
}

impl FromStr for Method {
    type Err = std::convert::Infallible;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Ok(match s.to_ascii_uppercase().as_str() {
            "GET" => Method::Get,
            "HEAD" => Method::Head,
            "POST" => Method::Post,
            "PUT" => Method::Put,
            "DELETE" => Method::Delete,
            other => Method::Other(other.to_string()),
        })
    }
}

impl fmt::Display for Method {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Method::Get => f.write_str("GET"),
            Method::Head => f.write_str("HEAD"),
            Method::Post => f.write_str("POST"),
            Method::Put => f.write_str("PUT"),
            Method::Delete => f.write_str("DELETE"),
            Method::Other(name) => f.write_str(name),
        }
    }
}

/// Everything the classifier gets to see of a request.
#[derive(Debug, Clone)]
pub struct RequestContext {
    method: Method,
    uri: String,
    headers: Vec<(String, String)>,
    body: Vec<u8>,
}

impl RequestContext {
    /// `uri` is the request target as received, query string included.
    pub fn new(method: Method, uri: impl Into<String>) -> Self {
        Self {
            method,
            uri: uri.into(),
            headers: Vec::new(),
            body: Vec::new(),
        }
    }

    pub fn with_header(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.headers.push((name.into(), value.into()));
        self
    }

    pub fn with_body(mut self, body: impl Into<Vec<u8>>) -> Self {
        self.body = body.into();
        self
    }

    pub fn method(&self) -> &Method {
        &self.method
    }

    pub fn uri(&self) -> &str {
        &self.uri
    }

    pub fn body(&self) -> &[u8] {
        &self.body
    }

    /// Everything after the first `?`, fragment excluded.
    pub fn query_string(&self) -> &str {
        let Some((_, query)) = self.uri.split_once('?') else {
            return "";
        };
        query.split('#').next().unwrap_or_default()
    }

    /// First header with this name, compared case-insensitively.
    pub fn header(&self, name: &str) -> Option<&str> {
        self.headers
            .iter()
            .find(|(key, _)| key.eq_ignore_ascii_case(name))
            .map(|(_, value)| value.as_str())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Operation {
    View,
    Create,
    Read,
    Delete,
    JsonLd,
    YourlsProxy,
}

impl Operation {
    pub fn as_str(&self) -> &'static str {
        match self {
            Operation::View => "view",
            Operation::Create => "create",
            Operation::Read => "read",
            Operation::Delete => "delete",
            Operation::JsonLd => "jsonld",
            Operation::YourlsProxy => "yourlsproxy",
        }
    }
}

impl fmt::Display for Operation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// The fields a create or read needs, projected out of the parameter bag.
///
/// Comments are posted with `pasteid` and `parentid`; pastes are posted with
/// `meta` instead. Whichever pair applies is always present, defaulting to
/// empty strings.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RequestData {
    pub adata: Value,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub meta: Option<Value>,
    pub v: Number,
    pub ct: Value,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub pasteid: Option<Value>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub parentid: Option<Value>,
}

/// A classified request.
#[derive(Debug, Clone)]
pub struct Request {
    operation: Operation,
    params: Map<String, Value>,
    json_api: bool,
    host: String,
    request_uri: String,
}

impl Request {
    pub fn new(ctx: &RequestContext) -> Self {
        let json_api = negotiate::is_json_request(
            ctx.header(negotiate::SCRIPT_MARKER_HEADER),
            ctx.header("Accept"),
        );
        let request_uri = non_empty_or(sanitize::url(ctx.uri()), "/");
        let host = non_empty_or(sanitize::url(ctx.header("Host").unwrap_or_default()), "localhost");

        let mutating = ctx.method().is_mutating();
        let mut params = if mutating {
            body_params(ctx.body())
        } else {
            query_params(ctx.query_string())
        };

        let query = ctx.query_string();
        if !["pasteid", "jsonld", "link"]
            .iter()
            .any(|key| params.contains_key(*key))
            && !query.is_empty()
        {
            let id = bare_id(query).unwrap_or_else(|| INVALID_ID.to_string());
            params.insert("pasteid".to_string(), Value::String(id));
        }

        let present = |key: &str| params.get(key).is_some_and(|value| !is_empty_value(value));
        let operation = if present("pasteid") {
            if present("deletetoken") {
                Operation::Delete
            } else if mutating {
                Operation::Create
            } else {
                Operation::Read
            }
        } else if present("jsonld") {
            Operation::JsonLd
        } else if present("link")
            && (request_uri.contains(YOURLS_PATH) || params.contains_key("shortenviayourls"))
        {
            Operation::YourlsProxy
        } else if mutating {
            Operation::Create
        } else {
            Operation::View
        };

        Self {
            operation,
            params,
            json_api,
            host,
            request_uri,
        }
    }

    pub fn operation(&self) -> Operation {
        self.operation
    }

    pub fn is_json_api(&self) -> bool {
        self.json_api
    }

    /// Sanitized `Host` header, `localhost` if absent.
    pub fn host(&self) -> &str {
        &self.host
    }

    /// Sanitized request target, `/` if absent.
    pub fn request_uri(&self) -> &str {
        &self.request_uri
    }

    pub fn params(&self) -> &Map<String, Value> {
        &self.params
    }

    pub fn param(&self, name: &str) -> Option<&Value> {
        self.params.get(name)
    }

    /// The parameter as text: strings verbatim, other JSON values in their
    /// JSON encoding, empty if absent.
    pub fn param_str(&self, name: &str) -> String {
        match self.params.get(name) {
            Some(Value::String(s)) => s.clone(),
            Some(Value::Null) | None => String::new(),
            Some(other) => other.to_string(),
        }
    }

    pub fn data(&self) -> RequestData {
        let param_or = |name: &str, default: Value| self.param(name).cloned().unwrap_or(default);
        let empty = || Value::String(String::new());

        let meta = self.param("meta").filter(|meta| !is_empty_value(meta)).cloned();
        let (pasteid, parentid) = match meta {
            Some(_) => (None, None),
            None => (Some(param_or("pasteid", empty())), Some(param_or("parentid", empty()))),
        };

        RequestData {
            adata: param_or("adata", empty()),
            meta,
            v: self.param("v").map(coerce_number).unwrap_or_else(|| Number::from(1)),
            ct: param_or("ct", empty()),
            pasteid,
            parentid,
        }
    }
}

fn non_empty_or(value: String, default: &str) -> String {
    if value.is_empty() {
        default.to_string()
    } else {
        value
    }
}

fn body_params(body: &[u8]) -> Map<String, Value> {
    match serde_json::from_slice(body) {
        Ok(Value::Object(map)) => map,
        _ => Map::new(),
    }
}

fn query_params(query: &str) -> Map<String, Value> {
    let mut params = Map::new();
    for (key, value) in form_urlencoded::parse(query.as_bytes()) {
        let sanitized = match &*key {
            "link" => sanitize::url(&value),
            "deletetoken" | "jsonld" | "pasteid" | "shortenviayourls" => {
                sanitize::special_chars(&value)
            }
            _ => continue,
        };
        params.insert(key.into_owned(), Value::String(sanitized));
    }
    params
}

/// First query key without a value that is a valid paste id.
fn bare_id(query: &str) -> Option<String> {
    form_urlencoded::parse(query.as_bytes())
        .find(|(key, value)| value.is_empty() && is_valid_id(key))
        .map(|(key, _)| key.into_owned())
}

/// Emptiness as loosely-typed form handling understands it: null, false,
/// zero, `""`, `"0"` and empty containers.
pub fn is_empty_value(value: &Value) -> bool {
    match value {
        Value::Null => true,
        Value::Bool(b) => !b,
        Value::Number(n) => n.as_f64() == Some(0.0),
        Value::String(s) => s.is_empty() || s == "0",
        Value::Array(items) => items.is_empty(),
        Value::Object(map) => map.is_empty(),
    }
}

/// Numeric reading of a version field: numbers as they are, numeric
/// strings parsed, booleans as 1 or 0, anything else 0.
fn coerce_number(value: &Value) -> Number {
    match value {
        Value::Number(n) => n.clone(),
        Value::String(s) => {
            let s = s.trim();
            s.parse::<i64>()
                .map(Number::from)
                .ok()
                .or_else(|| s.parse::<f64>().ok().and_then(Number::from_f64))
                .unwrap_or_else(|| Number::from(0))
        }
        Value::Bool(b) => Number::from(u8::from(*b)),
        _ => Number::from(0),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn get(uri: &str) -> Request {
        Request::new(&RequestContext::new(Method::Get, uri))
    }

    fn post(uri: &str, body: &str) -> Request {
        Request::new(&RequestContext::new(Method::Post, uri).with_body(body))
    }

    #[test]
    fn test_plain_view() {
        let request = get("/");
        assert_eq!(request.operation(), Operation::View);
        assert!(!request.is_json_api());
        assert_eq!(request.host(), "localhost");
        assert_eq!(request.request_uri(), "/");
    }

    #[test]
    fn test_read_by_bare_id() {
        let request = get("/?5b65a01b43987bc2");
        assert_eq!(request.operation(), Operation::Read);
        assert_eq!(request.param_str("pasteid"), "5b65a01b43987bc2");
    }

    #[test]
    fn test_read_by_pasteid_parameter() {
        let request = get("/?pasteid=5b65a01b43987bc2");
        assert_eq!(request.operation(), Operation::Read);
        assert_eq!(request.param_str("pasteid"), "5b65a01b43987bc2");
    }

    #[test]
    fn test_unknown_query_becomes_invalid_id() {
        let request = get("/?foo=bar");
        assert_eq!(request.operation(), Operation::Read);
        assert_eq!(request.param_str("pasteid"), INVALID_ID);

        let request = get("/?5b65a01b43987bc");
        assert_eq!(request.param_str("pasteid"), INVALID_ID);
    }

    #[test]
    fn test_bare_id_with_value_is_ignored() {
        let request = get("/?5b65a01b43987bc2=x&0000000000000001");
        assert_eq!(request.param_str("pasteid"), "0000000000000001");
    }

    #[test]
    fn test_delete_by_token() {
        let request = get("/?pasteid=5b65a01b43987bc2&deletetoken=abcd");
        assert_eq!(request.operation(), Operation::Delete);

        let request = post("/", r#"{"pasteid":"5b65a01b43987bc2","deletetoken":"abcd"}"#);
        assert_eq!(request.operation(), Operation::Delete);
    }

    #[test]
    fn test_empty_delete_token_reads() {
        let request = get("/?pasteid=5b65a01b43987bc2&deletetoken=");
        assert_eq!(request.operation(), Operation::Read);
    }

    #[test]
    fn test_create_from_body() {
        let request = post("/", r#"{"v":2,"adata":[],"ct":"abc","meta":{"expire":"5min"}}"#);
        assert_eq!(request.operation(), Operation::Create);
        assert_eq!(request.param_str("ct"), "abc");
    }

    #[test]
    fn test_comment_post_stays_create() {
        let body = r#"{"v":2,"adata":[],"ct":"abc","pasteid":"5b65a01b43987bc2","parentid":"5b65a01b43987bc2"}"#;
        let request = post("/", body);
        assert_eq!(request.operation(), Operation::Create);
    }

    #[test]
    fn test_malformed_body_is_empty_create() {
        let request = post("/", "{not json");
        assert_eq!(request.operation(), Operation::Create);
        assert!(request.params().is_empty());

        let request = post("/", "[1,2,3]");
        assert!(request.params().is_empty());
    }

    #[test]
    fn test_jsonld() {
        let request = get("/?jsonld=paste");
        assert_eq!(request.operation(), Operation::JsonLd);
        assert_eq!(request.param_str("jsonld"), "paste");
    }

    #[test]
    fn test_yourls_proxy() {
        let link = "https%3A%2F%2Fpaste.example.com%2F%3F5b65a01b43987bc2%23key";
        let request = get(&format!("/shortenviayourls?link={}", link));
        assert_eq!(request.operation(), Operation::YourlsProxy);
        assert_eq!(
            request.param_str("link"),
            "https://paste.example.com/?5b65a01b43987bc2#key"
        );

        let request = get(&format!("/?shortenviayourls&link={}", link));
        assert_eq!(request.operation(), Operation::YourlsProxy);

        let request = get(&format!("/?link={}", link));
        assert_eq!(request.operation(), Operation::View);
    }

    #[test]
    fn test_query_parameters_are_sanitized() {
        let request = get("/?pasteid=%3Cscript%3E&deletetoken=a%22b");
        assert_eq!(request.param_str("pasteid"), "&#60;script&#62;");
        assert_eq!(request.param_str("deletetoken"), "a&#34;b");
    }

    #[test]
    fn test_unlisted_query_parameters_are_dropped() {
        let request = get("/?pasteid=5b65a01b43987bc2&ct=abc");
        assert_eq!(request.param("ct"), None);
    }

    #[test]
    fn test_json_api_detection() {
        let ctx = RequestContext::new(Method::Get, "/?5b65a01b43987bc2")
            .with_header("accept", "application/json");
        assert!(Request::new(&ctx).is_json_api());

        let ctx = RequestContext::new(Method::Post, "/")
            .with_header("X-Requested-With", "JSONHttpRequest");
        assert!(Request::new(&ctx).is_json_api());

        let ctx = RequestContext::new(Method::Get, "/").with_header(
            "Accept",
            "text/html,application/xhtml+xml,application/xml;q=0.9,*/*;q=0.8",
        );
        assert!(!Request::new(&ctx).is_json_api());
    }

    #[test]
    fn test_host_is_sanitized() {
        let ctx = RequestContext::new(Method::Get, "/").with_header("Host", "paste.example.com\n");
        assert_eq!(Request::new(&ctx).host(), "paste.example.com");
    }

    #[test]
    fn test_data_for_paste() {
        let request = post(
            "/",
            r#"{"v":2,"adata":["x"],"ct":"abc","meta":{"expire":"5min"}}"#,
        );
        let data = request.data();
        assert_eq!(data.adata, json!(["x"]));
        assert_eq!(data.meta, Some(json!({"expire": "5min"})));
        assert_eq!(data.v, Number::from(2));
        assert_eq!(data.ct, json!("abc"));
        assert_eq!(data.pasteid, None);
        assert_eq!(data.parentid, None);
    }

    #[test]
    fn test_data_for_comment() {
        let request = post(
            "/",
            r#"{"v":2,"adata":[],"ct":"abc","pasteid":"5b65a01b43987bc2","parentid":"5b65a01b43987bc2"}"#,
        );
        let data = request.data();
        assert_eq!(data.meta, None);
        assert_eq!(data.pasteid, Some(json!("5b65a01b43987bc2")));
        assert_eq!(data.parentid, Some(json!("5b65a01b43987bc2")));
    }

    #[test]
    fn test_data_defaults() {
        let data = post("/", "{}").data();
        assert_eq!(data.adata, json!(""));
        assert_eq!(data.v, Number::from(1));
        assert_eq!(data.ct, json!(""));
        assert_eq!(data.pasteid, Some(json!("")));
        assert_eq!(data.parentid, Some(json!("")));
    }

    #[test]
    fn test_data_coerces_version() {
        assert_eq!(post("/", r#"{"v":"2"}"#).data().v, Number::from(2));
        assert_eq!(post("/", r#"{"v":"1.5"}"#).data().v.as_f64(), Some(1.5));
        assert_eq!(post("/", r#"{"v":true}"#).data().v, Number::from(1));
        assert_eq!(post("/", r#"{"v":"two"}"#).data().v, Number::from(0));
    }

    #[test]
    fn test_empty_values() {
        assert!(is_empty_value(&json!(null)));
        assert!(is_empty_value(&json!("0")));
        assert!(is_empty_value(&json!(0)));
        assert!(is_empty_value(&json!({})));
        assert!(!is_empty_value(&json!("a")));
        assert!(!is_empty_value(&json!([0])));
    }

    #[test]
    fn test_header_lookup_is_case_insensitive() {
        let ctx = RequestContext::new(Method::Get, "/?a=b#frag").with_header("X-Test", "1");
        assert_eq!(ctx.header("x-test"), Some("1"));
        assert_eq!(ctx.query_string(), "a=b");
    }
}
