//! Without device code the engine must behave exactly like the host's own
//! declarations.

use pretty_assertions::assert_eq;
use proptest::prelude::*;
use rdclink::{
    DeviceLink, Engine, Host, HostCall, LibraryKind, OutputKind, Policy, PropertyKind,
    RecordingHost, TargetKind, Visibility,
};
use std::path::PathBuf;

fn paths(v: &[&str]) -> Vec<PathBuf> {
    v.iter().map(PathBuf::from).collect()
}

fn direct(policy: &Policy) -> RecordingHost {
    RecordingHost::from_policy(policy)
}

fn scenario(policy: Policy) -> (Vec<HostCall>, Vec<HostCall>) {
    let mut e = Engine::new(policy.clone(), RecordingHost::from_policy(&policy));
    e.add_library("core", Some(LibraryKind::Static), &paths(&["core.cpp"])).unwrap();
    e.add_library("net", None, &paths(&["net.cu"])).unwrap();
    e.add_executable("app", &paths(&["main.cu"])).unwrap();
    e.add_dependency("app", "net", Visibility::Private).unwrap();
    e.add_dependency("net", "core", Visibility::Public).unwrap();
    e.add_dependency("app", "m", Visibility::Private).unwrap();
    e.add_compile_options("net", Visibility::Public, &["-O2".to_string()]).unwrap();
    e.install(&["app", "net"]).unwrap();
    let done = e.finish().unwrap();

    for (_, target) in done.graph.targets() {
        assert_eq!(target.kind, TargetKind::Plain);
        assert_eq!(target.device_link, DeviceLink::Native);
    }

    let mut h = direct(&policy);
    h.declare_library("core", OutputKind::StaticLibrary, &paths(&["core.cpp"]));
    h.declare_library("net", OutputKind::SharedLibrary, &paths(&["net.cu"]));
    h.declare_executable("app", &paths(&["main.cu"]));
    h.declare_dependency("app", "net", Visibility::Private);
    h.declare_dependency("net", "core", Visibility::Public);
    h.declare_dependency("app", "m", Visibility::Private);
    h.declare_property(
        "net",
        PropertyKind::CompileOptions,
        Visibility::Public,
        &["-O2".to_string()],
    );
    h.declare_install(&["app".to_string(), "net".to_string()]);

    (done.host.into_calls(), h.into_calls())
}

#[test]
fn test_no_device_compiler_matches_native() {
    let (engine, native) = scenario(Policy::host_only());
    assert_eq!(engine, native);
}

#[test]
fn test_no_device_sources_matches_native() {
    let mut policy = Policy::default();
    policy.device_extensions = vec!["cuda".to_string()];
    let (engine, native) = scenario(policy);
    assert_eq!(engine, native);
}

#[derive(Debug, Clone)]
struct NativeLib {
    kind: LibraryKind,
    deps: Vec<usize>,
    visibility: Visibility,
}

fn native_lib(index: usize) -> impl Strategy<Value = NativeLib> {
    (
        prop_oneof![
            Just(LibraryKind::Static),
            Just(LibraryKind::Shared),
            Just(LibraryKind::Module),
            Just(LibraryKind::Interface),
        ],
        prop::collection::vec(0..index.max(1), 0..3),
        prop_oneof![
            Just(Visibility::Private),
            Just(Visibility::Public),
            Just(Visibility::Interface),
        ],
    )
        .prop_map(move |(kind, deps, visibility)| NativeLib {
            kind,
            deps: if index == 0 { Vec::new() } else { deps },
            visibility,
        })
}

fn native_libs() -> impl Strategy<Value = Vec<NativeLib>> {
    (1usize..6).prop_flat_map(|n| (0..n).map(native_lib).collect::<Vec<_>>())
}

proptest! {
    #[test]
    fn prop_host_only_graph_is_native(libs in native_libs()) {
        let policy = Policy::host_only();
        let mut e = Engine::new(policy.clone(), RecordingHost::from_policy(&policy));
        let mut h = direct(&policy);

        for (i, lib) in libs.iter().enumerate() {
            let name = format!("l{i}");
            let sources = paths(&["k.cu"]);
            e.add_library(&name, Some(lib.kind), &sources).unwrap();
            h.declare_library(&name, lib.kind.output(), &sources);
        }
        for (i, lib) in libs.iter().enumerate() {
            let name = format!("l{i}");
            for dep in &lib.deps {
                let dep = format!("l{dep}");
                e.add_dependency(&name, &dep, lib.visibility).unwrap();
                h.declare_dependency(&name, &dep, lib.visibility);
            }
        }

        let done = e.finish().unwrap();
        prop_assert_eq!(done.graph.len(), libs.len());
        prop_assert!(done.host.device_links().next().is_none());
        prop_assert_eq!(done.host.into_calls(), h.into_calls());
    }
}
