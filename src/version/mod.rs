//! Version constraint engine
//!
//! Pure, I/O-free parsing and evaluation of Maven versions and version ranges.
//!
//! # Modules
//!
//! - [`maven_version`]: `MavenVersion` and its "is newer than" relation
//! - [`range`]: `VersionRange` parsing, containment, intersection and recommendation
//! - [`error`]: Parse errors

pub mod error;
pub mod maven_version;
pub mod range;

pub use error::VersionError;
pub use maven_version::MavenVersion;
pub use range::{EdgeKind, FREE_RANGE, IntervalKind, VersionRange, VersionSet};
