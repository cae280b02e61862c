//! Scenario data generation for load-testing a house-rental marketplace API.
//!
//! A load-generation harness drives many virtual users against the REST
//! API; this crate supplies their "think" logic: randomized request
//! payloads, sampling of previously recorded identifiers, lightweight
//! persistence of created entities, and the weighted decisions that pick
//! each virtual user's next action. The harness itself, the target API and
//! the image assets are external.

pub mod generators;
pub mod hooks;
pub mod models;
pub mod sampling;
pub mod stats;
pub mod store;
