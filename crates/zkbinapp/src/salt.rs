//! Per-installation server salt.

use crate::store::{DataStore, Namespace};
use rand::RngCore;
use tracing::{info, warn};

/// Random bytes in a freshly generated salt.
pub const SALT_BYTES: usize = 32;

/// Returns the installation salt, generating and storing one on first use.
/// None if a new salt could not be persisted.
pub fn server_salt<S: DataStore + ?Sized>(store: &S) -> Option<String> {
    let namespace = Namespace::Salt.as_str();
    let existing = store.get_value(namespace);
    if !existing.is_empty() {
        return Some(existing);
    }

    let mut bytes = [0u8; SALT_BYTES];
    rand::thread_rng().fill_bytes(&mut bytes);
    let salt = hex::encode(bytes);
    if !store.set_value(&salt, namespace) {
        warn!("failed to persist server salt");
        return None;
    }
    info!("generated new server salt");
    Some(salt)
}
