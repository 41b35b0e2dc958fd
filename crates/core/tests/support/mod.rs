//! Shared test helpers for `spendledger-core` integration tests.
//!
//! In-memory port mocks and record fixtures so pipeline tests can focus on
//! behaviour instead of boilerplate.

#![allow(dead_code)]

pub mod fixtures;
pub mod repositories;
