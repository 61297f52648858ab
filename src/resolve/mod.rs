//! Reference and dependency resolution
//!
//! - `alias`: canonical names and link targets
//! - `reach`: `depends_on` and device-library gathering
//! - `finals`: the minimal final-library set of a consumer
//! - `runtime`: device-runtime inheritance and conflict checks

pub mod alias;
pub mod finals;
pub mod reach;
pub mod runtime;

pub use alias::{canonical, is_device_aware, link_target, lookup_canonical};
pub use finals::{maximal_antichain, resolve_final_libraries};
pub use reach::{depends_on, gather_device_libraries, reachable};
