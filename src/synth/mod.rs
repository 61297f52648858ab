//! Shadow target synthesis
//!
//! Expands one logical library with device code into its physical targets:
//!
//! ```text
//!  SHARED:  name ──alias──▶ name_middle ──▶ name_objects
//!                           ▲                ▲
//!           name_final ─────┘   name_static ─┘
//!
//!  STATIC:  name ──alias──▶ name_static ──▶ name_objects
//!                           ▲
//!           name_final ─────┘
//! ```
//!
//! The middle target carries the ordinary symbols with device linking
//! disabled; the final target device-links the static archive and hosts the
//! result. Keeping the two apart prevents device objects from ending up in
//! two binaries loaded into the same process.
//!
//! A library without device sources, or built without a device compiler,
//! decays to one plain target.

use crate::config::Policy;
use crate::diagnostics::BuildError;
use crate::graph::{
    DeviceCode, DeviceLink, LibraryKind, OutputKind, ShadowRefs, Target, TargetGraph, TargetId,
    TargetKind, Visibility,
};
use std::path::PathBuf;
use tracing::{debug, info};

/// A library declaration
#[derive(Debug, Clone)]
pub struct LibraryRequest {
    pub name: String,
    pub kind: LibraryKind,
    pub sources: Vec<PathBuf>,
    /// Device sources present and a device compiler configured
    pub device: bool,
}

/// Result of synthesizing a library
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Synthesized {
    /// Decayed to an ordinary library
    Native(TargetId),
    /// Expanded into shadow targets
    Device(ShadowRefs),
}

impl Synthesized {
    /// Handle callers link against
    pub fn canonical(&self) -> TargetId {
        match self {
            Synthesized::Native(id) => *id,
            Synthesized::Device(refs) => refs.middle,
        }
    }
}

/// Register the targets for one library declaration
pub fn synthesize(
    graph: &mut TargetGraph,
    policy: &Policy,
    request: LibraryRequest,
) -> Result<Synthesized, BuildError> {
    let collapsed = match (request.kind, request.device) {
        (LibraryKind::Module, true) => {
            return Err(BuildError::ModuleWithDeviceCode { name: request.name });
        }
        (LibraryKind::Static, true) => true,
        (LibraryKind::Shared, true) => false,
        _ => return declare_native(graph, request),
    };

    let naming = &policy.naming;
    let name = request.name.as_str();
    let object_name = naming.object(name);
    let static_name = naming.static_lib(name);
    let middle_name = naming.middle(name);
    let final_name = naming.final_lib(name);

    let mut names = vec![
        name,
        object_name.as_str(),
        static_name.as_str(),
        final_name.as_str(),
    ];
    if !collapsed {
        names.push(middle_name.as_str());
    }
    if let Some(taken) = names.into_iter().find(|n| graph.contains(n)) {
        return Err(BuildError::DuplicateTarget {
            name: taken.to_string(),
        });
    }

    let mut object = Target::new(object_name, TargetKind::Object, Some(OutputKind::ObjectLibrary))
        .with_sources(request.sources.clone());
    object.device_code = DeviceCode::Sources;
    object.separable = true;
    object.position_independent = !collapsed;
    object.device_link = DeviceLink::Disabled;
    let object = graph.insert(object)?;

    let mut static_lib = Target::new(
        static_name,
        TargetKind::Static,
        Some(OutputKind::StaticLibrary),
    );
    static_lib.device_code = DeviceCode::Sources;
    static_lib.separable = true;
    static_lib.position_independent = !collapsed;
    static_lib.device_link = DeviceLink::Disabled;
    let static_lib = graph.insert(static_lib)?;
    graph.link(static_lib, object, Visibility::Private);

    let middle = if collapsed {
        static_lib
    } else {
        let mut middle = Target::new(
            middle_name,
            TargetKind::SharedMiddle,
            Some(OutputKind::SharedLibrary),
        );
        middle.device_code = DeviceCode::Sources;
        middle.separable = true;
        middle.position_independent = true;
        middle.device_link = DeviceLink::Disabled;
        let middle = graph.insert(middle)?;
        graph.link(middle, object, Visibility::Private);
        middle
    };

    let mut final_lib = Target::new(final_name, TargetKind::Final, Some(request.kind.output()))
        .with_sources(vec![PathBuf::from(&policy.empty_device_source)]);
    final_lib.device_code = DeviceCode::Sources;
    final_lib.separable = true;
    final_lib.position_independent = !collapsed;
    final_lib.device_link = DeviceLink::Own {
        inputs: vec![static_lib],
    };
    let final_lib = graph.insert(final_lib)?;
    graph.link(final_lib, middle, Visibility::Public);

    let logical = graph.insert(Target::alias(name, middle))?;

    let refs = ShadowRefs {
        logical,
        object,
        static_lib,
        middle,
        final_lib,
    };
    for id in refs.targets().into_iter().chain([logical]) {
        graph[id].shadows = Some(refs);
    }

    info!(
        "expanded {} device library `{}` into {} shadow targets",
        request.kind,
        name,
        refs.targets().len()
    );
    Ok(Synthesized::Device(refs))
}

fn declare_native(
    graph: &mut TargetGraph,
    request: LibraryRequest,
) -> Result<Synthesized, BuildError> {
    let kind = match request.kind {
        LibraryKind::Interface => TargetKind::Interface,
        _ => TargetKind::Plain,
    };
    debug!("`{}` declared as an ordinary {} library", request.name, request.kind);
    let target = Target::new(request.name, kind, Some(request.kind.output()))
        .with_sources(request.sources);
    Ok(Synthesized::Native(graph.insert(target)?))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn request(name: &str, kind: LibraryKind, device: bool) -> LibraryRequest {
        LibraryRequest {
            name: name.to_string(),
            kind,
            sources: vec![PathBuf::from(format!("{name}.cu"))],
            device,
        }
    }

    #[test]
    fn test_shared_expansion_wiring() {
        let mut g = TargetGraph::new();
        let policy = Policy::default();
        let Synthesized::Device(refs) =
            synthesize(&mut g, &policy, request("fft", LibraryKind::Shared, true)).unwrap()
        else {
            panic!("expected device expansion");
        };

        assert_eq!(g.name(refs.middle), "fft_middle");
        assert_eq!(g[refs.logical].alias_of, Some(refs.middle));
        assert_eq!(g.lookup("fft"), Some(refs.logical));
        assert!(g.has_edge(refs.final_lib, refs.middle));
        assert!(g.has_edge(refs.middle, refs.object));
        assert!(g.has_edge(refs.static_lib, refs.object));
        assert_eq!(g[refs.middle].device_link, DeviceLink::Disabled);
        assert_eq!(
            g[refs.final_lib].sources,
            vec![PathBuf::from("rdc_empty.cu")]
        );
    }

    #[test]
    fn test_module_rejected_before_any_insert() {
        let mut g = TargetGraph::new();
        let err = synthesize(
            &mut g,
            &Policy::default(),
            request("plugin", LibraryKind::Module, true),
        )
        .unwrap_err();
        assert_eq!(
            err,
            BuildError::ModuleWithDeviceCode {
                name: "plugin".into()
            }
        );
        assert!(g.is_empty());
    }

    #[test]
    fn test_module_without_device_code_is_native() {
        let mut g = TargetGraph::new();
        let out = synthesize(
            &mut g,
            &Policy::default(),
            request("plugin", LibraryKind::Module, false),
        )
        .unwrap();
        assert!(matches!(out, Synthesized::Native(_)));
        assert_eq!(g.len(), 1);
    }
}
