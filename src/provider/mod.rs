//! Provider data acquisition and normalization
//!
//! Turns a CurseForge or Modrinth project URL into a [`ProjectRecord`]: the
//! sorted, de-duplicated set of (game version, loader) pairs the project
//! ships for.
//!
//! # Architecture
//!
//! ```text
//! ┌─────────────┐     ┌─────────────┐     ┌─────────────┐
//! │  Registry   │────▶│   Adapter   │────▶│  PageCache  │
//! │ (host map)  │     │ (cf, mr)    │     │ (ttl check) │
//! └─────────────┘     └─────────────┘     └─────────────┘
//!                       │        │               │
//!                       ▼        ▼               ▼
//!              ┌──────────┐  ┌──────────┐  ┌─────────────┐
//!              │  Loader  │  │ Version  │  │  PageStore  │
//!              │ classify │  │   key    │  │ (fs/sqlite) │
//!              └──────────┘  └──────────┘  └─────────────┘
//! ```
//!
//! # Modules
//!
//! - [`registry`]: URL validation and dispatch to the right adapter
//! - [`adapter`]: `ModProvider` trait shared by both adapters
//! - [`providers`]: CurseForge and Modrinth implementations
//! - [`cache`]: Page keys and the cache-first fetch path
//! - [`store`]: `PageStore` trait; [`stores`] holds its backends
//! - [`http`]: JSON GET client with bounded retries
//! - [`loader`]: Loader tags and classification heuristics
//! - [`version_key`]: Orderable keys for game version strings
//! - [`record`]: Release-to-record reconciliation
//! - [`error`]: Error types for cache, fetch and provider operations
//! - [`types`]: `ProviderKind`, `ProjectRecord` and friends

pub mod adapter;
pub mod cache;
pub mod error;
pub mod http;
pub mod loader;
pub mod providers;
pub mod record;
pub mod registry;
pub mod store;
pub mod stores;
pub mod types;
pub mod version_key;

pub use error::ProviderError;
pub use loader::Loader;
pub use registry::ProviderRegistry;
pub use types::{ProjectRecord, ProviderKind, VersionPair};
