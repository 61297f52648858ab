//! Target graph model
//!
//! In-memory representation of build targets, their typed properties and
//! the visibility-tagged dependency edges between them.

pub mod model;
pub mod properties;
pub mod target;

pub use model::TargetGraph;
pub use properties::{Properties, PropertyKind, Scoped};
pub use target::{
    DeviceCode, DeviceLink, ExternalLink, LibraryKind, OutputKind, RuntimeMode, ShadowRefs,
    Target, TargetId, TargetKind, Visibility,
};
