//! Infrastructure layer - External service integrations
//!
//! This layer contains:
//! - Alloy-based storage reader implementations
//! - Keccak256 slot hashing
//! - In-memory storage snapshots

pub mod ethereum;
