//! # Contracts
//!
//! Frozen interface contracts shared by every relay crate: event and snapshot
//! records, wire envelopes, the transport / world-reader seams and the relay
//! configuration model. Business crates depend on this crate only.
//!
//! ## Time Model
//! - Event timestamps are whole Unix seconds (UTC)
//! - No ordering is guaranteed across producers

mod error;
mod event;
mod relay_config;
mod snapshot;
mod transport;
mod wire;
mod world;

pub use error::*;
pub use event::*;
pub use relay_config::*;
pub use snapshot::*;
pub use transport::*;
pub use wire::*;
pub use world::*;
