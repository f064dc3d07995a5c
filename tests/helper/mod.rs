#![allow(dead_code)]

pub mod repository;

pub use repository::{ConcurrencyProbe, FakeRepository};
