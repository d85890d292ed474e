//! Domain model for the paygate billing gateway
//!
//! Holds the records the gateway works on (projects, payment methods,
//! payment systems, fixed packages and orders) together with the narrow
//! interfaces it consumes from the rest of the platform:
//!
//! - [`Repository`] for persistence
//! - [`GeoLookup`] for payer region resolution
//! - [`Clock`] for time
//!
//! ## Quick Start
//!
//! ```rust,ignore
//! use paygate_core::{InMemoryRepository, ManualClock, StaticGeoLookup};
//!
//! let repository = InMemoryRepository::new();
//! repository.add_project(project).await;
//!
//! let geo = StaticGeoLookup::new().with_entry("203.0.113.7".parse()?, "US");
//! let clock = ManualClock::default();
//! ```

pub mod clock;
pub mod compare;
pub mod error;
pub mod geo;
pub mod memory;
pub mod money;
pub mod order;
pub mod payment;
pub mod project;
pub mod repository;

pub use clock::*;
pub use compare::constant_time_eq;
pub use error::*;
pub use geo::*;
pub use memory::*;
pub use money::*;
pub use order::*;
pub use payment::*;
pub use project::*;
pub use repository::*;
