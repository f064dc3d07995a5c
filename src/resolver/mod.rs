//! Cache negotiation layer
//!
//! Decides whether a cached artifact is fresh enough to use, fetches it from
//! repositories when it is not, and keeps the local cache consistent while doing
//! so.
//!
//! # Architecture
//!
//! ```text
//! ┌──────────────┐     ┌──────────────┐     ┌──────────────┐
//! │  Negotiator  │────▶│  Staleness   │     │     Lock     │
//! │  (resolve)   │     │  (sidecar)   │     │ (directory)  │
//! └──────────────┘     └──────────────┘     └──────────────┘
//!        │
//!        ▼
//! ┌──────────────┐     ┌──────────────┐
//! │ FirstSuccess │────▶│ Repositories │
//! │  (race)      │     │   (fetch)    │
//! └──────────────┘     └──────────────┘
//! ```
//!
//! # Modules
//!
//! - [`negotiator`]: `CacheNegotiator`, the resolve protocol
//! - [`staleness`]: `.lastUpdated` sidecar record
//! - [`lock`]: Directory-scoped exclusive lock
//! - [`first_success`]: First-success-wins combinator over racing fetches
//! - [`repository`]: Repository trait
//! - [`repositories`]: Concrete repository implementations
//! - [`resource`]: Resolved artifacts and their attribution
//! - [`clock`]: Time source
//! - [`error`]: Error types for resolution and fetching

pub mod clock;
pub mod error;
mod files;
pub mod first_success;
pub mod lock;
pub mod negotiator;
pub mod repositories;
pub mod repository;
pub mod resource;
pub mod staleness;

pub use error::{RepositoryError, ResolveError};
pub use negotiator::CacheNegotiator;
pub use repository::Repository;
pub use resource::{ResolvedResource, ResourceSource};
