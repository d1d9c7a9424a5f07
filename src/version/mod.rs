//! Release freshness resolution
//!
//! Fetches release lists, picks the latest qualifying version and checks it
//! against configured constraints.
//!
//! # Architecture
//!
//! ```text
//! ┌─────────────┐     ┌─────────────┐     ┌─────────────┐
//! │   Source    │────▶│    Cache    │────▶│  Resolver   │
//! │  (fetch)    │     │ (ttl, flush)│     │  (latest)   │
//! └─────────────┘     └─────────────┘     └─────────────┘
//!        │                                       │
//!        ▼                                       ▼
//! ┌─────────────┐                         ┌─────────────┐
//! │   Sources   │                         │ Constraint  │
//! │(github,fake)│                         │  (check)    │
//! └─────────────┘                         └─────────────┘
//! ```
//!
//! # Modules
//!
//! - [`cache`]: TTL cache of resolved versions with full flush
//! - [`constraint`]: Version range parsing and evaluation
//! - [`error`]: Error types for sources and constraints
//! - [`release`]: Release records as returned by the hosting API
//! - [`resolver`]: Latest qualifying release selection
//! - [`semver`]: Tag parsing helpers
//! - [`source`]: Source trait for fetching releases
//! - [`sources`]: Concrete sources (GitHub, in-memory fake)

pub mod cache;
pub mod constraint;
pub mod error;
pub mod release;
pub mod resolver;
pub mod semver;
pub mod source;
pub mod sources;
