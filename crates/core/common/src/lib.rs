//! Shared plumbing for the partsync workspace: object-store construction,
//! partition-key handling and storage-side partition discovery.

pub mod discovery;
pub mod partition;
pub mod store;

pub use self::{
    partition::PartitionKey,
    store::{ext::ObjectStoreExt, url::ObjectStoreUrl},
};
