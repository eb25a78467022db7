//! Opportunistic purge scheduling.
//!
//! Purging piggybacks on normal traffic instead of running on a timer. The
//! `purge_limiter` namespace holds the unix time of the last pass; a new pass
//! runs once at least `purge_limit_secs` have gone by.

use super::{DataStore, Namespace, PurgeReport};
use crate::config::StoreConfig;
use tracing::debug;

/// Runs one purge pass if the last one is old enough, recording `now` first
/// so concurrent callers mostly back off. Returns None when skipped.
pub fn purge_if_due<S: DataStore + ?Sized>(
    store: &S,
    config: &StoreConfig,
    now: i64,
) -> Option<PurgeReport> {
    let namespace = Namespace::PurgeLimiter.as_str();
    if config.purge_limit_secs > 0 {
        // a missing or unreadable stamp counts as never purged
        if let Ok(last) = store.get_value(namespace).parse::<i64>() {
            let elapsed = now.saturating_sub(last);
            let limit = i64::try_from(config.purge_limit_secs).unwrap_or(i64::MAX);
            if elapsed < limit {
                debug!(elapsed, "purge not due yet");
                return None;
            }
        }
    }
    if !store.set_value(&now.to_string(), namespace) {
        debug!("purge skipped, limiter stamp not writable");
        return None;
    }
    Some(store.purge(config.purge_batch_size))
}
