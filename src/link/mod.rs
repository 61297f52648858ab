//! Link/install façade
//!
//! The consumer-facing operations of one graph-construction pass. Each
//! operation resolves aliases, consults the device-awareness check once, and
//! then either fans out over a library's shadow targets or behaves exactly
//! like the host's native declaration.
//!
//! ```text
//! declarations ──▶ Engine ──▶ synth / propagate / resolve ──▶ TargetGraph
//!                    │
//!                    └──▶ Host (native declarations, device links)
//! ```

mod consumer;
mod install;

use crate::config::Policy;
use crate::diagnostics::BuildError;
use crate::graph::{
    DeviceCode, DeviceLink, LibraryKind, OutputKind, PropertyKind, RuntimeMode, Target,
    TargetGraph, TargetId, TargetKind, Visibility,
};
use crate::host::{DevicePolicy, Host};
use crate::propagate;
use crate::resolve::{self, runtime};
use crate::synth::{self, LibraryRequest, Synthesized};
use std::path::PathBuf;
use tracing::{debug, info};

/// Output of a finished construction pass
#[derive(Debug)]
pub struct Constructed<H> {
    pub graph: TargetGraph,
    pub host: H,
}

impl<H> Constructed<H> {
    /// Final libraries of `consumer` in the finished graph, as target names
    pub fn final_library_names(&self, consumer: &str) -> Result<Vec<String>, BuildError> {
        let id = resolve::lookup_canonical(&self.graph, consumer).ok_or_else(|| {
            BuildError::UnknownTarget {
                name: consumer.to_string(),
            }
        })?;
        Ok(resolve::resolve_final_libraries(&self.graph, id)
            .into_iter()
            .map(|f| self.graph.name(f).to_string())
            .collect())
    }
}

/// Graph-construction context for one build description
pub struct Engine<H: Host> {
    graph: TargetGraph,
    policy: Policy,
    host: H,
}

impl<H: Host> Engine<H> {
    pub fn new(policy: Policy, host: H) -> Self {
        Self {
            graph: TargetGraph::new(),
            policy,
            host,
        }
    }

    pub fn graph(&self) -> &TargetGraph {
        &self.graph
    }

    pub fn policy(&self) -> &Policy {
        &self.policy
    }

    pub fn host(&self) -> &H {
        &self.host
    }

    pub fn host_mut(&mut self) -> &mut H {
        &mut self.host
    }

    /// Look a name up and canonicalize it
    pub fn resolve(&self, name: &str) -> Result<TargetId, BuildError> {
        resolve::lookup_canonical(&self.graph, name).ok_or_else(|| BuildError::UnknownTarget {
            name: name.to_string(),
        })
    }

    pub fn is_device_aware(&self, name: &str) -> Result<bool, BuildError> {
        let id = self.resolve(name)?;
        Ok(resolve::is_device_aware(&self.graph, id))
    }

    fn has_device_sources(&self, sources: &[PathBuf]) -> bool {
        self.host.has_device_compiler() && sources.iter().any(|s| self.host.is_device_source(s))
    }

    /// Declare a library; returns the canonical link target
    pub fn add_library(
        &mut self,
        name: &str,
        kind: Option<LibraryKind>,
        sources: &[PathBuf],
    ) -> Result<TargetId, BuildError> {
        let kind = kind.unwrap_or(self.policy.default_library_kind);
        let request = LibraryRequest {
            name: name.to_string(),
            kind,
            sources: sources.to_vec(),
            device: kind != LibraryKind::Interface && self.has_device_sources(sources),
        };

        let synthesized = synth::synthesize(&mut self.graph, &self.policy, request)?;
        match synthesized {
            Synthesized::Native(_) => {
                self.host.declare_library(name, kind.output(), sources);
            }
            Synthesized::Device(refs) => {
                for id in refs.targets() {
                    let target = &self.graph[id];
                    if let Some(output) = target.output {
                        self.host.declare_library(&target.name, output, &target.sources);
                    }
                    for (dep, visibility) in self.graph.dependencies(id) {
                        self.host
                            .declare_dependency(&target.name, self.graph.name(dep), visibility);
                    }
                }
                self.host.declare_alias(name, self.graph.name(refs.middle));
            }
        }
        Ok(synthesized.canonical())
    }

    /// Declare an executable
    pub fn add_executable(
        &mut self,
        name: &str,
        sources: &[PathBuf],
    ) -> Result<TargetId, BuildError> {
        let mut target = Target::new(name, TargetKind::Plain, Some(OutputKind::Executable))
            .with_sources(sources.to_vec());
        if self.has_device_sources(sources) {
            debug!("executable `{name}` contains device code");
            target.device_code = DeviceCode::Sources;
            target.separable = true;
            target.device_link = DeviceLink::Own { inputs: Vec::new() };
        }
        let id = self.graph.insert(target)?;
        self.host.declare_executable(name, sources);
        Ok(id)
    }

    /// Declare `alias` as another name for `target`
    pub fn add_alias(&mut self, alias: &str, target: &str) -> Result<TargetId, BuildError> {
        let id = self
            .graph
            .lookup(target)
            .ok_or_else(|| BuildError::UnknownTarget {
                name: target.to_string(),
            })?;
        if self.graph[id].kind.is_shadow() {
            return Err(BuildError::ShadowAlias {
                alias: alias.to_string(),
                target: target.to_string(),
                logical: self.graph.display_name(id).to_string(),
            });
        }
        let alias_id = self.graph.insert(Target::alias(alias, id))?;
        self.host.declare_alias(alias, target);
        Ok(alias_id)
    }

    /// Attach `dependency` to `consumer`.
    ///
    /// Names that are not (yet) targets are recorded as external link items
    /// and rewritten by [`Engine::finish`] if a target with that name shows
    /// up later.
    pub fn add_dependency(
        &mut self,
        consumer: &str,
        dependency: &str,
        visibility: Visibility,
    ) -> Result<(), BuildError> {
        let id = self.resolve(consumer)?;
        let dep = self
            .graph
            .lookup(dependency)
            .map(|d| resolve::link_target(&self.graph, d));

        match self.graph[id].shadows {
            Some(refs) => {
                for shadow in refs.payload() {
                    self.attach(shadow, None, dep, dependency, visibility)?;
                }
                runtime::inherit(&mut self.graph, refs.final_lib, refs.middle)?;
            }
            None => self.attach(id, Some(consumer), dep, dependency, visibility)?,
        }

        self.refresh(id);
        Ok(())
    }

    fn attach(
        &mut self,
        consumer: TargetId,
        consumer_name: Option<&str>,
        dep: Option<TargetId>,
        dependency: &str,
        visibility: Visibility,
    ) -> Result<(), BuildError> {
        let consumer_name = consumer_name.unwrap_or(&self.graph[consumer].name).to_string();
        match dep {
            Some(dep)
                if dep == consumer
                    || self.graph[consumer].shadows.is_some_and(|r| r.middle == dep) =>
            {
                debug!("ignoring self-dependency of `{consumer_name}`");
            }
            Some(dep) => {
                self.graph.link(consumer, dep, visibility);
                let dep_name = if self.graph[dep].shadows.is_some() {
                    self.graph.name(dep)
                } else {
                    dependency
                };
                self.host.declare_dependency(&consumer_name, dep_name, visibility);
                runtime::inherit(&mut self.graph, consumer, dep)?;
            }
            None => {
                self.graph[consumer].add_external(dependency, visibility);
                self.host.declare_dependency(&consumer_name, dependency, visibility);
            }
        }
        Ok(())
    }

    /// Add include directories
    pub fn add_include_dirs(
        &mut self,
        target: &str,
        visibility: Visibility,
        dirs: &[String],
    ) -> Result<(), BuildError> {
        self.add_property(target, PropertyKind::IncludeDirs, visibility, dirs)
    }

    pub fn add_compile_options(
        &mut self,
        target: &str,
        visibility: Visibility,
        options: &[String],
    ) -> Result<(), BuildError> {
        self.add_property(target, PropertyKind::CompileOptions, visibility, options)
    }

    pub fn add_compile_definitions(
        &mut self,
        target: &str,
        visibility: Visibility,
        definitions: &[String],
    ) -> Result<(), BuildError> {
        self.add_property(
            target,
            PropertyKind::CompileDefinitions,
            visibility,
            definitions,
        )
    }

    pub fn add_link_options(
        &mut self,
        target: &str,
        visibility: Visibility,
        options: &[String],
    ) -> Result<(), BuildError> {
        self.add_property(target, PropertyKind::LinkOptions, visibility, options)
    }

    /// Add values to one property of a target
    pub fn add_property(
        &mut self,
        target: &str,
        kind: PropertyKind,
        visibility: Visibility,
        values: &[String],
    ) -> Result<(), BuildError> {
        let id = self.resolve(target)?;
        match self.graph[id].shadows {
            Some(refs) => {
                for shadow in refs.payload() {
                    propagate::add_values(&mut self.graph, shadow, kind, visibility, values);
                    self.host.declare_property(self.graph.name(shadow), kind, visibility, values);
                }
                self.catch_up(&refs);
            }
            None => {
                propagate::add_values(&mut self.graph, id, kind, visibility, values);
                self.host.declare_property(target, kind, visibility, values);
            }
        }
        Ok(())
    }

    /// Declare the device-runtime flavor of a target
    pub fn set_runtime_mode(&mut self, target: &str, mode: RuntimeMode) -> Result<(), BuildError> {
        let id = self.resolve(target)?;
        let (members, origin) = match self.graph[id].shadows {
            Some(refs) => {
                let mut members = refs.targets();
                members.push(refs.logical);
                (members, refs.middle)
            }
            None => (vec![id], id),
        };

        info!("`{target}` requires the {mode} device runtime");
        for &member in &members {
            runtime::declare(&mut self.graph, member, mode, origin);
        }
        for &member in &members {
            for (dep, _) in self.graph.dependencies(member) {
                runtime::inherit(&mut self.graph, member, dep)?;
            }
        }
        Ok(())
    }

    /// Final libraries `consumer` must device-link or link against
    pub fn resolve_final_libraries(&self, consumer: &str) -> Result<Vec<TargetId>, BuildError> {
        let id = self.resolve(consumer)?;
        Ok(resolve::resolve_final_libraries(&self.graph, id))
    }

    /// Same as [`Engine::resolve_final_libraries`], as target names
    pub fn final_library_names(&self, consumer: &str) -> Result<Vec<String>, BuildError> {
        Ok(self
            .resolve_final_libraries(consumer)?
            .into_iter()
            .map(|id| self.graph.name(id).to_string())
            .collect())
    }

    /// Effective values of `kind` for building `target`
    pub fn usage_requirements(
        &self,
        target: &str,
        kind: PropertyKind,
    ) -> Result<Vec<String>, BuildError> {
        let id = self.resolve(target)?;
        Ok(propagate::usage_requirements(&self.graph, id, kind))
    }

    /// End the construction pass.
    ///
    /// Rewrites late-bound dependency names, recomputes every consumer's
    /// device-link policy, validates runtime-mode uniformity and finally asks
    /// the host to perform each device link.
    pub fn finish(mut self) -> Result<Constructed<H>, BuildError> {
        self.rewrite_externals();

        for id in self.graph.ids() {
            self.refresh(id);
        }
        runtime::validate(&mut self.graph)?;

        self.declare_device_policies();

        for (id, target) in self.graph.targets() {
            let DeviceLink::Own { inputs } = &target.device_link else {
                continue;
            };
            let inputs: Vec<String> = inputs
                .iter()
                .map(|&i| self.graph.name(i).to_string())
                .collect();
            debug!(
                "device-linking `{}` over {} static input(s)",
                self.graph.name(id),
                inputs.len()
            );
            self.host
                .device_link(&target.name, &inputs)
                .map_err(|message| BuildError::DeviceLink {
                    target: target.name.clone(),
                    message,
                })?;
        }

        info!("constructed graph with {} targets", self.graph.len());
        Ok(Constructed {
            graph: self.graph,
            host: self.host,
        })
    }

    /// Push every settled device-link decision to the host.
    ///
    /// A consumer linking a single final library also gains a dependency on
    /// it; a promoted consumer reports the empty device translation unit.
    fn declare_device_policies(&mut self) {
        let empty = PathBuf::from(&self.policy.empty_device_source);
        for (_, target) in self.graph.targets() {
            let Some(resolve) = target.device_link.resolve_device_symbols() else {
                continue;
            };
            let mut policy = DevicePolicy {
                resolve_device_symbols: Some(resolve),
                separable: target.separable,
                ..Default::default()
            };
            if target.is_promoted() {
                policy.extra_sources.push(empty.clone());
            }
            if let DeviceLink::Final { target: lib, bracket } = target.device_link {
                let lib = self.graph.name(lib);
                self.host.declare_dependency(&target.name, lib, Visibility::Private);
                if bracket {
                    policy.link_first = Some(lib.to_string());
                }
            }
            self.host.declare_device_policy(&target.name, &policy);
        }
    }

    /// Turn external link items that now name targets into edges
    fn rewrite_externals(&mut self) {
        for id in self.graph.ids() {
            let externals = std::mem::take(&mut self.graph[id].externals);
            let mut kept = Vec::with_capacity(externals.len());
            for external in externals {
                match self.graph.lookup(&external.name) {
                    Some(dep) => {
                        let dep = resolve::link_target(&self.graph, dep);
                        debug!(
                            "`{}` now links target `{}` instead of external `{}`",
                            self.graph.name(id),
                            self.graph.name(dep),
                            external.name
                        );
                        self.graph.link(id, dep, external.visibility);
                    }
                    None => kept.push(external),
                }
            }
            self.graph[id].externals = kept;
        }
    }
}
