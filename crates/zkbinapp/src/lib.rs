//! # zkbin Architecture
//!
//! zkbin is the storage and request-routing core of a zero-knowledge paste
//! service. Clients encrypt in the browser; the server only ever sees opaque
//! ciphertext plus the metadata it needs to route, store and expire it. This
//! crate holds that server-side core and nothing that depends on a web
//! framework, so any HTTP front end (or the `zkbin` admin CLI) can drive it.
//!
//! ## Layers
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────────┐
//! │  Front end (HTTP dispatcher, zkbin CLI)                     │
//! │  - Builds a RequestContext, renders responses               │
//! └─────────────────────────────────────────────────────────────┘
//!                              │
//!                              ▼
//! ┌─────────────────────────────────────────────────────────────┐
//! │  Request Layer (request/)                                   │
//! │  - Classifies a request into one Operation                  │
//! │  - Content negotiation, parameter sanitizing                │
//! └─────────────────────────────────────────────────────────────┘
//!                              │
//!                              ▼
//! ┌─────────────────────────────────────────────────────────────┐
//! │  Storage Layer (store/)                                     │
//! │  - DataStore trait, PasteStore over a StorageBackend        │
//! │  - FileStore (production), InMemoryStore (testing)          │
//! │  - Record format, legacy migration, purging                 │
//! └─────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Key Principle: Failures Stop at the Store
//!
//! Internally every operation returns [`error::Result`]. The [`store::DataStore`]
//! boundary turns errors into `false`, `None` or empty values and logs them
//! through `tracing`; callers never handle storage errors. Only configuration
//! loading reports an error to the caller.
//!
//! ## Module Overview
//!
//! - [`id`]: Paste id validation and generation
//! - [`model`]: Paste and comment records
//! - [`store`]: Storage abstraction, backends, format and migration
//! - [`request`]: Request classification
//! - [`salt`]: Per-installation server salt
//! - [`config`]: Configuration management
//! - [`error`]: Error types

pub mod config;
pub mod error;
pub mod id;
pub mod model;
pub mod request;
pub mod salt;
pub mod store;

#[cfg(any(test, feature = "test_utils"))]
pub mod test_utils;
