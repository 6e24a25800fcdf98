//! Token endpoint descriptors (data) and error classification strategies (behavior).
//!
//! `descriptor` holds the validated authorize/token endpoints plus the client
//! authentication mode. `strategy` defines [`ProviderStrategy`], the hook that maps
//! token endpoint failures into the gateway error taxonomy.

pub mod descriptor;
pub mod strategy;

pub use descriptor::*;
pub use strategy::*;
