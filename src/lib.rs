//! rdclink: relocatable device code link orchestration
//!
//! Rewrites a build-target graph so libraries containing separately
//! compiled GPU device code link correctly:
//! - device libraries expand into object, static, middle and final targets
//! - consumers resolve the minimal set of final libraries they reach
//! - properties declared on a library are kept consistent across its shadows
//! - every target in a linked graph agrees on one device-runtime flavor
//!
//! # Architecture
//!
//! ```text
//! Description → Engine ─┬─ synth      (shadow expansion)
//!                       ├─ propagate  (usage requirements, final catch-up)
//!                       ├─ resolve    (aliases, reachability, finals, runtime)
//!                       └─ Host       (native declarations, device links)
//!                              ↓
//!                        TargetGraph → LinkPlan
//! ```
//!
//! # Example
//!
//! ```
//! use rdclink::{Engine, Policy, RecordingHost, Visibility};
//! use std::path::PathBuf;
//!
//! let policy = Policy::default();
//! let mut engine = Engine::new(policy.clone(), RecordingHost::from_policy(&policy));
//! engine.add_library("fft", None, &[PathBuf::from("fft.cu")])?;
//! engine.add_executable("app", &[PathBuf::from("main.cpp")])?;
//! engine.add_dependency("app", "fft", Visibility::Private)?;
//!
//! assert_eq!(engine.final_library_names("app")?, vec!["fft_final"]);
//! # Ok::<(), rdclink::BuildError>(())
//! ```

pub mod config;
pub mod description;
pub mod diagnostics;
pub mod graph;
pub mod host;
pub mod link;
pub mod plan;
pub mod propagate;
pub mod resolve;
pub mod synth;

pub use config::{Policy, ShadowNaming};
pub use description::{Description, Step};
pub use diagnostics::{BuildError, DescriptionError, SourceFile};
pub use graph::{
    DeviceCode, DeviceLink, LibraryKind, OutputKind, PropertyKind, RuntimeMode, Target,
    TargetGraph, TargetId, TargetKind, Visibility,
};
pub use host::{DevicePolicy, Host, HostCall, RecordingHost, SourceClassifier};
pub use link::{Constructed, Engine};
pub use plan::LinkPlan;

/// Library version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Parse a build description and construct its graph with a recording host
pub fn evaluate(source: &SourceFile) -> Result<Constructed<RecordingHost>, DescriptionError> {
    let description = Description::parse(source)?;
    Ok(description.evaluate()?)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_version() {
        assert!(!VERSION.is_empty());
    }

    #[test]
    fn test_evaluate_empty_description() {
        let constructed = evaluate(&SourceFile::new("empty.toml", "")).unwrap();
        assert!(constructed.graph.is_empty());
        assert!(constructed.host.calls().is_empty());
    }
}
