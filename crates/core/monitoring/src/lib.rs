//! Observability utilities shared across the partsync workspace.

pub mod logging;
