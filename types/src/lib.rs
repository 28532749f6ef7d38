//! Request and response models for OpenStack-family APIs.
//!
//! This crate contains plain serde types with no IO and no async. The
//! [`marshal`] module turns them into JSON or XML request bodies and parses
//! responses back; every other module is one service's resource vocabulary.

// Pedantic lint configuration - these are intentional design choices
#![allow(clippy::missing_errors_doc)] // Result-returning functions are self-explanatory
#![allow(clippy::missing_panics_doc)] // Panics are documented in assertions
#![allow(clippy::module_name_repetitions)]

pub mod bare_metal;
pub mod block_storage;
pub mod compute;
pub mod datagen;
pub mod identity;
pub mod images;
pub mod marshal;
pub mod networking;
pub mod object_storage;
mod secret;
mod serde_helpers;
pub mod status;

pub use marshal::{Collection, Envelope, Format, MarshalError};
pub use secret::Secret;
pub use status::{
    ImageStatus, NeutronStatus, PowerState, ProvisionState, ServerStatus, SnapshotStatus,
    TaskStatus, VolumeStatus, WireStatus,
};

/// Port and network status share the networking vocabulary.
pub type PortStatus = NeutronStatus;
pub type NetworkStatus = NeutronStatus;
