//! Shared test fixtures and mocks.

#![cfg(test)]

pub mod fixtures;
pub mod mocks;
