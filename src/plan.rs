//! Link plan
//!
//! A serializable, per-target view of a finished graph: what each target
//! links, whether it device-links, and the requirements it builds with.

use crate::graph::{
    DeviceCode, DeviceLink, OutputKind, PropertyKind, RuntimeMode, TargetGraph, TargetId,
    TargetKind,
};
use crate::propagate;
use indexmap::IndexMap;
use serde::Serialize;
use std::fmt;
use std::path::PathBuf;

/// Link plan of a whole graph, in declaration order
#[derive(Debug, Clone, Serialize)]
pub struct LinkPlan {
    pub targets: Vec<TargetPlan>,
}

/// Plan of one target
#[derive(Debug, Clone, Serialize)]
pub struct TargetPlan {
    pub name: String,
    /// Logical library a shadow target belongs to
    #[serde(skip_serializing_if = "Option::is_none")]
    pub library: Option<String>,
    pub kind: TargetKind,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub output: Option<OutputKind>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub alias_of: Option<String>,
    pub device_code: DeviceCode,
    pub runtime: RuntimeMode,
    pub separable: bool,
    pub position_independent: bool,
    pub sources: Vec<PathBuf>,
    pub link_line: Vec<String>,
    pub device_link: DeviceLinkPlan,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub resolve_device_symbols: Option<bool>,
    /// Effective, non-empty usage requirements
    pub requirements: IndexMap<PropertyKind, Vec<String>>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "mode", rename_all = "snake_case")]
pub enum DeviceLinkPlan {
    Native,
    Disabled,
    Final { library: String, bracket: bool },
    Own { inputs: Vec<String> },
}

impl LinkPlan {
    pub fn from_graph(graph: &TargetGraph) -> Self {
        Self {
            targets: graph.ids().into_iter().map(|id| TargetPlan::new(graph, id)).collect(),
        }
    }

    /// Keep only the named targets (plus, for a device library, its shadows)
    pub fn only(mut self, names: &[String]) -> Self {
        if !names.is_empty() {
            self.targets.retain(|t| {
                names.contains(&t.name) || t.library.as_ref().is_some_and(|l| names.contains(l))
            });
        }
        self
    }

    pub fn get(&self, name: &str) -> Option<&TargetPlan> {
        self.targets.iter().find(|t| t.name == name)
    }

    pub fn to_json(&self) -> serde_json::Result<String> {
        serde_json::to_string_pretty(self)
    }
}

impl TargetPlan {
    fn new(graph: &TargetGraph, id: TargetId) -> Self {
        let target = &graph[id];
        let library = target
            .shadows
            .filter(|refs| refs.logical != id)
            .map(|refs| graph.name(refs.logical).to_string());
        let requirements = if target.kind == TargetKind::Alias {
            IndexMap::new()
        } else {
            PropertyKind::ALL
                .iter()
                .map(|&kind| (kind, propagate::usage_requirements(graph, id, kind)))
                .filter(|(_, values)| !values.is_empty())
                .collect()
        };

        Self {
            name: target.name.clone(),
            library,
            kind: target.kind,
            output: target.output,
            alias_of: target.alias_of.map(|a| graph.name(a).to_string()),
            device_code: target.device_code,
            runtime: target.runtime,
            separable: target.separable,
            position_independent: target.position_independent,
            sources: target.sources.clone(),
            link_line: link_line(graph, id),
            device_link: device_link_plan(graph, &target.device_link),
            resolve_device_symbols: target.device_link.resolve_device_symbols(),
            requirements,
        }
    }
}

fn device_link_plan(graph: &TargetGraph, link: &DeviceLink) -> DeviceLinkPlan {
    match link {
        DeviceLink::Native => DeviceLinkPlan::Native,
        DeviceLink::Disabled => DeviceLinkPlan::Disabled,
        DeviceLink::Final { target, bracket } => DeviceLinkPlan::Final {
            library: graph.name(*target).to_string(),
            bracket: *bracket,
        },
        DeviceLink::Own { inputs } => DeviceLinkPlan::Own {
            inputs: inputs.iter().map(|&i| graph.name(i).to_string()).collect(),
        },
    }
}

/// Ordered link items of a target.
///
/// Dependency edges come first, then external link items. A consumer that
/// links a single final library appends it; a static consumer also places it
/// in front so both passes of a static link see it.
pub fn link_line(graph: &TargetGraph, id: TargetId) -> Vec<String> {
    let target = &graph[id];
    let mut line: Vec<String> = graph
        .dependencies(id)
        .into_iter()
        .map(|(dep, _)| graph.name(dep).to_string())
        .chain(target.externals.iter().map(|e| e.name.clone()))
        .collect();

    if let DeviceLink::Final { target: lib, bracket } = target.device_link {
        let lib = graph.name(lib).to_string();
        if bracket {
            line.insert(0, lib.clone());
        }
        line.push(lib);
    }
    line
}

impl fmt::Display for LinkPlan {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for (i, t) in self.targets.iter().enumerate() {
            if i > 0 {
                writeln!(f)?;
            }
            write!(f, "{}", t)?;
        }
        Ok(())
    }
}

impl fmt::Display for TargetPlan {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} ({:?}", self.name, self.kind)?;
        if let Some(library) = &self.library {
            write!(f, " of {library}")?;
        }
        writeln!(f, ")")?;

        if let Some(target) = &self.alias_of {
            return writeln!(f, "  alias of: {target}");
        }
        if self.device_code != DeviceCode::None {
            writeln!(f, "  device code: {:?}", self.device_code)?;
        }
        if self.runtime.is_set() {
            writeln!(f, "  runtime: {}", self.runtime)?;
        }
        if !self.link_line.is_empty() {
            writeln!(f, "  links: {}", self.link_line.join(" "))?;
        }
        match &self.device_link {
            DeviceLinkPlan::Native => {}
            DeviceLinkPlan::Disabled => writeln!(f, "  device link: disabled")?,
            DeviceLinkPlan::Final { library, bracket } => {
                write!(f, "  device link: via {library}")?;
                if *bracket {
                    write!(f, " (bracketed)")?;
                }
                writeln!(f)?;
            }
            DeviceLinkPlan::Own { inputs } => {
                writeln!(f, "  device link: own [{}]", inputs.join(", "))?;
            }
        }
        for (kind, values) in &self.requirements {
            writeln!(f, "  {kind}: {}", values.join(" "))?;
        }
        Ok(())
    }
}
