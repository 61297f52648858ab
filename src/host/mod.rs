//! Host build system interface
//!
//! The engine never executes compilers or writes build files itself. It
//! classifies sources, decays to native declarations and requests device
//! links through a [`Host`].

use crate::config::Policy;
use crate::graph::{OutputKind, PropertyKind, Visibility};
use rustc_hash::FxHashMap;
use serde::Serialize;
use std::path::{Path, PathBuf};

/// Services the engine consumes from the host build system
pub trait Host {
    /// Is a device compiler configured?
    fn has_device_compiler(&self) -> bool;

    /// Is this a device-separable source?
    fn is_device_source(&self, path: &Path) -> bool;

    fn declare_library(&mut self, name: &str, kind: OutputKind, sources: &[PathBuf]);

    fn declare_executable(&mut self, name: &str, sources: &[PathBuf]);

    fn declare_alias(&mut self, alias: &str, target: &str);

    fn declare_dependency(&mut self, consumer: &str, dependency: &str, visibility: Visibility);

    fn declare_property(
        &mut self,
        target: &str,
        kind: PropertyKind,
        visibility: Visibility,
        values: &[String],
    );

    fn declare_install(&mut self, targets: &[String]);

    /// Device-link settings of a target, decided after the graph is complete
    fn declare_device_policy(&mut self, target: &str, policy: &DevicePolicy);

    /// Resolve device code of `inputs` and embed it in `target`'s output
    fn device_link(&mut self, target: &str, inputs: &[String]) -> Result<(), String>;
}

/// Device-link settings pushed to the host for one target
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct DevicePolicy {
    /// Forced value of the host's device-symbol resolution switch
    pub resolve_device_symbols: Option<bool>,
    pub separable: bool,
    /// Sources added after the target was declared
    pub extra_sources: Vec<PathBuf>,
    /// Link item placed ahead of all others, for two-pass static links
    pub link_first: Option<String>,
}

/// Source language tag overriding extension-based classification
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Language {
    Device,
    Host,
}

/// Classifies sources by extension or explicit language tag
#[derive(Debug, Clone, Default)]
pub struct SourceClassifier {
    extensions: Vec<String>,
    tags: FxHashMap<PathBuf, Language>,
}

impl SourceClassifier {
    pub fn new<I, S>(extensions: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        Self {
            extensions: extensions
                .into_iter()
                .map(|e| e.as_ref().trim_start_matches('.').to_ascii_lowercase())
                .collect(),
            tags: FxHashMap::default(),
        }
    }

    pub fn tag(&mut self, path: impl Into<PathBuf>, language: Language) {
        self.tags.insert(path.into(), language);
    }

    pub fn is_device_source(&self, path: &Path) -> bool {
        if let Some(lang) = self.tags.get(path) {
            return *lang == Language::Device;
        }
        path.extension()
            .and_then(|e| e.to_str())
            .map(|e| self.extensions.iter().any(|x| x.eq_ignore_ascii_case(e)))
            .unwrap_or(false)
    }
}

/// One call the engine made into the host
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "call", rename_all = "snake_case")]
pub enum HostCall {
    Library {
        name: String,
        kind: OutputKind,
        sources: Vec<PathBuf>,
    },
    Executable {
        name: String,
        sources: Vec<PathBuf>,
    },
    Alias {
        alias: String,
        target: String,
    },
    Dependency {
        consumer: String,
        dependency: String,
        visibility: Visibility,
    },
    Property {
        target: String,
        kind: PropertyKind,
        visibility: Visibility,
        values: Vec<String>,
    },
    Install {
        targets: Vec<String>,
    },
    DevicePolicy {
        target: String,
        #[serde(flatten)]
        policy: DevicePolicy,
    },
    DeviceLink {
        target: String,
        inputs: Vec<String>,
    },
}

/// Host that records every call
#[derive(Debug, Clone)]
pub struct RecordingHost {
    device_compiler: bool,
    classifier: SourceClassifier,
    calls: Vec<HostCall>,
    /// Targets whose device link should fail
    failing_links: Vec<String>,
}

impl RecordingHost {
    pub fn new(device_compiler: bool, classifier: SourceClassifier) -> Self {
        Self {
            device_compiler,
            classifier,
            calls: Vec::new(),
            failing_links: Vec::new(),
        }
    }

    pub fn from_policy(policy: &Policy) -> Self {
        Self::new(
            policy.device_compiler,
            SourceClassifier::new(&policy.device_extensions),
        )
    }

    pub fn classifier_mut(&mut self) -> &mut SourceClassifier {
        &mut self.classifier
    }

    /// Make the device link of `target` report a failure
    pub fn fail_device_link(&mut self, target: impl Into<String>) {
        self.failing_links.push(target.into());
    }

    pub fn calls(&self) -> &[HostCall] {
        &self.calls
    }

    pub fn into_calls(self) -> Vec<HostCall> {
        self.calls
    }

    /// Device-link settings declared for `target`, if any
    pub fn device_policy(&self, target: &str) -> Option<&DevicePolicy> {
        self.calls.iter().find_map(|c| match c {
            HostCall::DevicePolicy { target: t, policy } if t == target => Some(policy),
            _ => None,
        })
    }

    pub fn device_links(&self) -> impl Iterator<Item = (&str, &[String])> {
        self.calls.iter().filter_map(|c| match c {
            HostCall::DeviceLink { target, inputs } => Some((target.as_str(), inputs.as_slice())),
            _ => None,
        })
    }
}

impl Host for RecordingHost {
    fn has_device_compiler(&self) -> bool {
        self.device_compiler
    }

    fn is_device_source(&self, path: &Path) -> bool {
        self.classifier.is_device_source(path)
    }

    fn declare_library(&mut self, name: &str, kind: OutputKind, sources: &[PathBuf]) {
        self.calls.push(HostCall::Library {
            name: name.to_string(),
            kind,
            sources: sources.to_vec(),
        });
    }

    fn declare_executable(&mut self, name: &str, sources: &[PathBuf]) {
        self.calls.push(HostCall::Executable {
            name: name.to_string(),
            sources: sources.to_vec(),
        });
    }

    fn declare_alias(&mut self, alias: &str, target: &str) {
        self.calls.push(HostCall::Alias {
            alias: alias.to_string(),
            target: target.to_string(),
        });
    }

    fn declare_dependency(&mut self, consumer: &str, dependency: &str, visibility: Visibility) {
        self.calls.push(HostCall::Dependency {
            consumer: consumer.to_string(),
            dependency: dependency.to_string(),
            visibility,
        });
    }

    fn declare_property(
        &mut self,
        target: &str,
        kind: PropertyKind,
        visibility: Visibility,
        values: &[String],
    ) {
        self.calls.push(HostCall::Property {
            target: target.to_string(),
            kind,
            visibility,
            values: values.to_vec(),
        });
    }

    fn declare_install(&mut self, targets: &[String]) {
        self.calls.push(HostCall::Install {
            targets: targets.to_vec(),
        });
    }

    fn declare_device_policy(&mut self, target: &str, policy: &DevicePolicy) {
        self.calls.push(HostCall::DevicePolicy {
            target: target.to_string(),
            policy: policy.clone(),
        });
    }

    fn device_link(&mut self, target: &str, inputs: &[String]) -> Result<(), String> {
        self.calls.push(HostCall::DeviceLink {
            target: target.to_string(),
            inputs: inputs.to_vec(),
        });
        if self.failing_links.iter().any(|t| t == target) {
            return Err(format!("no device linker available for `{target}`"));
        }
        Ok(())
    }
}
