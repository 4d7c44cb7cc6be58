//! # Folio Search
//!
//! Content indexing and fuzzy-search worker for a markdown-driven
//! portfolio/blog site.
//!
//! Folio Search reads markdown documents (with YAML-like frontmatter) from
//! an external blob store, normalizes them into an in-memory index of
//! [`models::ContentItem`]s, caches that index as a TTL-bounded generation
//! in a key-value store, and answers free-text search and related-content
//! recommendation queries over JSON HTTP.
//!
//! ## Architecture
//!
//! ```text
//! ┌─────────────┐   ┌──────────────┐   ┌────────────┐
//! │ Blob Store  │──▶│   Indexer    │──▶│  KV Cache  │
//! │ (markdown)  │   │ parse+batch  │   │ generation │
//! └─────────────┘   └──────────────┘   └─────┬──────┘
//!                                            │
//!                         ┌──────────────────┤
//!                         ▼                  ▼
//!                   ┌──────────┐       ┌──────────┐
//!                   │   CLI    │       │   HTTP   │
//!                   │ (folio)  │       │  (axum)  │
//!                   └──────────┘       └──────────┘
//! ```
//!
//! ## Quick Start
//!
//! ```bash
//! folio index                    # build the index and warm the cache
//! folio search "leadership"      # one-shot keyword search
//! folio serve                    # start the JSON HTTP API
//! folio stats                    # cache introspection
//! ```
//!
//! ## Modules
//!
//! | Module | Purpose |
//! |--------|---------|
//! | [`config`] | TOML configuration parsing |
//! | [`error`] | Error taxonomy |
//! | [`models`] | Core data types |
//! | [`store`] | Blob-store content source adapter |
//! | [`parser`] | Frontmatter and markdown cleanup (pure) |
//! | [`indexer`] | Batched index construction |
//! | [`cache`] | Generation-stamped KV cache |
//! | [`query`] | Keyword search and recommendation scoring (pure) |
//! | [`service`] | Request-scoped service wiring |
//! | [`server`] | JSON HTTP API |

pub mod cache;
pub mod config;
pub mod error;
pub mod indexer;
pub mod models;
pub mod parser;
pub mod query;
pub mod server;
pub mod service;
pub mod store;

pub use error::{Error, Result};
