//! Repository implementations for fetching artifacts

pub mod local;

pub use local::LocalRepository;
