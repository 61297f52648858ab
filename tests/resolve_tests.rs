//! Final-library resolution tests

use pretty_assertions::assert_eq;
use proptest::prelude::*;
use rdclink::resolve::{depends_on, gather_device_libraries};
use rdclink::{DeviceCode, DeviceLink, Engine, Policy, RecordingHost, Visibility};
use std::path::PathBuf;

fn engine() -> Engine<RecordingHost> {
    let policy = Policy::default();
    let host = RecordingHost::from_policy(&policy);
    Engine::new(policy, host)
}

fn device_lib(e: &mut Engine<RecordingHost>, name: &str, deps: &[&str]) {
    e.add_library(name, None, &[PathBuf::from(format!("{name}.cu"))]).unwrap();
    for dep in deps {
        e.add_dependency(name, dep, Visibility::Public).unwrap();
    }
}

fn app(e: &mut Engine<RecordingHost>, deps: &[&str]) {
    e.add_executable("app", &[PathBuf::from("main.cpp")]).unwrap();
    for dep in deps {
        e.add_dependency("app", dep, Visibility::Private).unwrap();
    }
}

fn sorted(mut v: Vec<String>) -> Vec<String> {
    v.sort();
    v
}

#[test]
fn test_no_device_libraries() {
    let mut e = engine();
    e.add_library("util", None, &[PathBuf::from("util.cpp")]).unwrap();
    app(&mut e, &["util", "m"]);
    assert!(e.final_library_names("app").unwrap().is_empty());
}

#[test]
fn test_single_chain_resolves_to_top() {
    let mut e = engine();
    device_lib(&mut e, "a", &[]);
    device_lib(&mut e, "b", &["a"]);
    app(&mut e, &["b"]);
    assert_eq!(e.final_library_names("app").unwrap(), vec!["b_final"]);
}

#[test]
fn test_redundant_direct_dependency_is_subsumed() {
    let mut e = engine();
    device_lib(&mut e, "a", &[]);
    device_lib(&mut e, "b", &["a"]);
    app(&mut e, &["a", "b"]);
    assert_eq!(e.final_library_names("app").unwrap(), vec!["b_final"]);
}

#[test]
fn test_diamond_keeps_both_branches() {
    let mut e = engine();
    device_lib(&mut e, "a", &[]);
    device_lib(&mut e, "b", &["a"]);
    device_lib(&mut e, "c", &["a"]);
    app(&mut e, &["b", "c"]);
    assert_eq!(
        sorted(e.final_library_names("app").unwrap()),
        vec!["b_final", "c_final"]
    );

    let g = e.graph();
    let id = |n: &str| g.lookup(n).unwrap();
    let consumer = &g[id("app")];
    assert_eq!(consumer.device_code, DeviceCode::Promoted);
    assert_eq!(
        consumer.device_link,
        DeviceLink::Own {
            inputs: vec![id("b_static"), id("a_static"), id("c_static")]
        }
    );

    let done = e.finish().unwrap();
    let links: Vec<(String, Vec<String>)> = done
        .host
        .device_links()
        .map(|(t, i)| (t.to_string(), i.to_vec()))
        .collect();
    assert!(links.contains(&(
        "app".to_string(),
        vec!["b_static".into(), "a_static".into(), "c_static".into()]
    )));
}

#[test]
fn test_resolution_is_idempotent() {
    let mut e = engine();
    device_lib(&mut e, "a", &[]);
    device_lib(&mut e, "b", &["a"]);
    device_lib(&mut e, "c", &["a"]);
    app(&mut e, &["b", "a", "c"]);

    let edges = e.graph().edge_count();
    let first = e.resolve_final_libraries("app").unwrap();
    let second = e.resolve_final_libraries("app").unwrap();
    assert_eq!(first, second);
    assert_eq!(e.graph().edge_count(), edges);
}

#[test]
fn test_device_library_through_native_library() {
    let mut e = engine();
    device_lib(&mut e, "a", &[]);
    e.add_library("glue", None, &[PathBuf::from("glue.cpp")]).unwrap();
    e.add_dependency("glue", "a", Visibility::Public).unwrap();
    app(&mut e, &["glue"]);
    assert_eq!(e.final_library_names("app").unwrap(), vec!["a_final"]);
}

#[test]
fn test_library_excludes_itself() {
    let mut e = engine();
    device_lib(&mut e, "a", &[]);
    device_lib(&mut e, "b", &["a"]);
    assert_eq!(e.final_library_names("b").unwrap(), vec!["a_final"]);
    assert!(e.final_library_names("a").unwrap().is_empty());
}

#[test]
fn test_gather_is_flat_and_deduplicated() {
    let mut e = engine();
    device_lib(&mut e, "a", &[]);
    device_lib(&mut e, "b", &["a"]);
    device_lib(&mut e, "c", &["a"]);
    app(&mut e, &["b", "c"]);

    let g = e.graph();
    let gathered: Vec<&str> = gather_device_libraries(g, g.lookup("app").unwrap())
        .into_iter()
        .map(|id| g.name(id))
        .collect();
    assert_eq!(gathered, vec!["b_middle", "a_middle", "c_middle"]);
}

#[test]
fn test_depends_on_through_aliases() {
    let mut e = engine();
    device_lib(&mut e, "a", &[]);
    device_lib(&mut e, "b", &["a"]);
    let g = e.graph();
    let a = g.lookup("a").unwrap();
    let b = g.lookup("b").unwrap();
    assert!(depends_on(g, b, a));
    assert!(!depends_on(g, a, b));
}

/// A random acyclic device-library graph: library `i` may depend on any
/// library `j < i`.
#[derive(Debug, Clone)]
struct Layout {
    edges: Vec<(usize, usize)>,
    libraries: usize,
    picks: Vec<usize>,
}

fn layout() -> impl Strategy<Value = Layout> {
    (2usize..7).prop_flat_map(|n| {
        let pairs: Vec<(usize, usize)> = (0..n)
            .flat_map(|i| (0..i).map(move |j| (i, j)))
            .collect();
        let pair_count = pairs.len();
        (
            prop::collection::vec(any::<bool>(), pair_count),
            prop::collection::vec(any::<bool>(), n),
            Just((0..n).collect::<Vec<_>>()).prop_shuffle(),
        )
            .prop_map(move |(edge_bits, pick_bits, order)| Layout {
                edges: pairs
                    .iter()
                    .zip(edge_bits)
                    .filter(|(_, keep)| *keep)
                    .map(|(pair, _)| *pair)
                    .collect(),
                libraries: n,
                picks: order.into_iter().filter(|&i| pick_bits[i]).collect(),
            })
    })
}

fn build(layout: &Layout, picks: &[usize]) -> Engine<RecordingHost> {
    let mut e = engine();
    for i in 0..layout.libraries {
        let deps: Vec<String> = layout
            .edges
            .iter()
            .filter(|(from, _)| *from == i)
            .map(|(_, to)| format!("l{to}"))
            .collect();
        let deps: Vec<&str> = deps.iter().map(String::as_str).collect();
        device_lib(&mut e, &format!("l{i}"), &deps);
    }
    let names: Vec<String> = picks.iter().map(|i| format!("l{i}")).collect();
    let names: Vec<&str> = names.iter().map(String::as_str).collect();
    app(&mut e, &names);
    e
}

proptest! {
    #[test]
    fn prop_finals_form_maximal_antichain(layout in layout()) {
        let e = build(&layout, &layout.picks);
        let g = e.graph();
        let consumer = g.lookup("app").unwrap();

        let finals = e.resolve_final_libraries("app").unwrap();
        let middles: Vec<_> = finals
            .iter()
            .map(|&f| g[f].shadows.unwrap().middle)
            .collect();

        for &x in &middles {
            for &y in &middles {
                if x != y {
                    prop_assert!(!depends_on(g, x, y));
                }
            }
        }
        for lib in gather_device_libraries(g, consumer) {
            prop_assert!(
                middles.contains(&lib) || middles.iter().any(|&m| depends_on(g, m, lib))
            );
        }
    }

    #[test]
    fn prop_finals_independent_of_declaration_order(layout in layout()) {
        let forward = build(&layout, &layout.picks);
        let mut reversed_picks = layout.picks.clone();
        reversed_picks.reverse();
        let backward = build(&layout, &reversed_picks);

        prop_assert_eq!(
            sorted(forward.final_library_names("app").unwrap()),
            sorted(backward.final_library_names("app").unwrap())
        );
    }
}
