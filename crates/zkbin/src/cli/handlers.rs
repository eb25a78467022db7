//! Per-command logic. Each handler returns the text to print.
//!
//! Handlers are generic over [`DataStore`] so they can be tested against
//! [`InMemoryStore`](zkbinapp::store::memory::InMemoryStore).

use anyhow::{anyhow, bail, Result};
use chrono::DateTime;
use serde_json::{json, Value};
use zkbinapp::config::StoreConfig;
use zkbinapp::id::PasteId;
use zkbinapp::request::{Method, Request, RequestContext};
use zkbinapp::salt::server_salt;
use zkbinapp::store::fs::FileStore;
use zkbinapp::store::DataStore;

pub struct AppState {
    pub store: FileStore,
    pub config: StoreConfig,
}

fn parse_id(raw: &str) -> Result<PasteId> {
    raw.parse()
        .map_err(|_| anyhow!("'{}' is not a valid paste id (expected 16 hex characters)", raw))
}

fn format_timestamp(ts: i64) -> Value {
    DateTime::from_timestamp(ts, 0)
        .map(|dt| Value::String(dt.to_rfc3339()))
        .unwrap_or(Value::Null)
}

pub fn purge<S: DataStore>(store: &S, batch: usize) -> String {
    let report = store.purge(batch);
    format!(
        "inspected {}, migrated {}, purged {}",
        report.inspected, report.migrated, report.purged
    )
}

pub fn list<S: DataStore>(store: &S) -> String {
    store
        .list_pastes()
        .iter()
        .map(PasteId::to_string)
        .collect::<Vec<_>>()
        .join("\n")
}

pub fn show<S: DataStore>(store: &S, id: &str) -> Result<String> {
    let id = parse_id(id)?;
    let Some(paste) = store.read(&id) else {
        bail!("paste {} not found", id);
    };
    let comments: Vec<_> = store.read_comments(&id).into_values().collect();
    let out = json!({
        "id": id,
        "expires": paste.expires().map(format_timestamp),
        "paste": paste,
        "comments": comments,
    });
    Ok(serde_json::to_string_pretty(&out)?)
}

pub fn delete<S: DataStore>(store: &S, id: &str) -> Result<String> {
    let id = parse_id(id)?;
    if !store.exists(&id) {
        bail!("paste {} not found", id);
    }
    store.delete(&id);
    if store.exists(&id) {
        bail!("failed to delete paste {}", id);
    }
    Ok(format!("Deleted paste {}", id))
}

pub fn value_get<S: DataStore>(store: &S, namespace: &str) -> String {
    store.get_value(namespace)
}

pub fn value_set<S: DataStore>(store: &S, namespace: &str, value: &str) -> Result<String> {
    if !store.set_value(value, namespace) {
        bail!(
            "could not store value in '{}' (namespaces: salt, purge_limiter, traffic_limiter)",
            namespace
        );
    }
    Ok(String::new())
}

pub fn salt<S: DataStore>(store: &S) -> Result<String> {
    server_salt(store).ok_or_else(|| anyhow!("could not store a new server salt"))
}

pub fn classify(
    method: &str,
    accept: Option<&str>,
    body: Option<&str>,
    uri: &str,
) -> Result<String> {
    let method: Method = method.parse()?;
    let mut ctx = RequestContext::new(method, uri);
    if let Some(accept) = accept {
        ctx = ctx.with_header("Accept", accept);
    }
    if let Some(body) = body {
        ctx = ctx.with_body(body);
    }

    let request = Request::new(&ctx);
    let out = json!({
        "operation": request.operation(),
        "json_api": request.is_json_api(),
        "host": request.host(),
        "request_uri": request.request_uri(),
        "params": request.params(),
        "data": request.data(),
    });
    Ok(serde_json::to_string_pretty(&out)?)
}
