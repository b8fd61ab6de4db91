//! Shared test doubles for lifecycle tests

pub mod mocks;
