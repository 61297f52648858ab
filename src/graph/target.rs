//! Target definitions
//!
//! A target is one compilation/link unit of the build graph. Logical
//! libraries with device code expand into several shadow targets that all
//! carry the same [`ShadowRefs`] so any of them can reach its siblings.

use super::properties::Properties;
use petgraph::graph::NodeIndex;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::PathBuf;

/// Unique target ID
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct TargetId(pub(crate) NodeIndex);

impl TargetId {
    pub fn index(self) -> usize {
        self.0.index()
    }
}

/// Role a target plays in the expanded graph
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum TargetKind {
    /// Ordinary target, no shadow expansion
    Plain,
    /// Device-separable object collection
    Object,
    /// Static archive fed to the device-link step
    Static,
    /// Shared payload with device link disabled
    SharedMiddle,
    /// Device-linked library hosting the resolved device code
    Final,
    /// Header-only target
    Interface,
    /// Name that forwards to another target
    Alias,
}

impl TargetKind {
    pub fn is_shadow(self) -> bool {
        matches!(
            self,
            TargetKind::Object | TargetKind::Static | TargetKind::SharedMiddle | TargetKind::Final
        )
    }
}

/// Binary kind requested when declaring a library
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum LibraryKind {
    Static,
    #[default]
    Shared,
    Module,
    Interface,
}

impl LibraryKind {
    pub fn output(self) -> OutputKind {
        match self {
            LibraryKind::Static => OutputKind::StaticLibrary,
            LibraryKind::Shared => OutputKind::SharedLibrary,
            LibraryKind::Module => OutputKind::ModuleLibrary,
            LibraryKind::Interface => OutputKind::InterfaceLibrary,
        }
    }
}

impl fmt::Display for LibraryKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            LibraryKind::Static => "STATIC",
            LibraryKind::Shared => "SHARED",
            LibraryKind::Module => "MODULE",
            LibraryKind::Interface => "INTERFACE",
        };
        f.write_str(s)
    }
}

/// What the host actually produces for a target
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum OutputKind {
    Executable,
    StaticLibrary,
    SharedLibrary,
    ModuleLibrary,
    ObjectLibrary,
    InterfaceLibrary,
}

/// Device-runtime flavor a connected subgraph must agree on
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RuntimeMode {
    #[default]
    Unset,
    Static,
    Shared,
}

impl RuntimeMode {
    pub fn is_set(self) -> bool {
        self != RuntimeMode::Unset
    }
}

impl fmt::Display for RuntimeMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            RuntimeMode::Unset => "unset",
            RuntimeMode::Static => "static",
            RuntimeMode::Shared => "shared",
        };
        f.write_str(s)
    }
}

/// Dependency edge visibility
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Visibility {
    /// Used only to build the consumer itself
    #[default]
    Private,
    /// Used by the consumer and re-exported to its consumers
    Public,
    /// Re-exported only
    Interface,
}

impl Visibility {
    /// Does the requirement apply to the consumer's own build?
    pub fn applies_to_self(self) -> bool {
        matches!(self, Visibility::Private | Visibility::Public)
    }

    /// Is the requirement re-exported to the consumer's consumers?
    pub fn exported(self) -> bool {
        matches!(self, Visibility::Public | Visibility::Interface)
    }

    /// Combine two declarations of the same edge
    pub fn merge(self, other: Visibility) -> Visibility {
        if self == other {
            self
        } else {
            Visibility::Public
        }
    }
}

impl fmt::Display for Visibility {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            Visibility::Private => "PRIVATE",
            Visibility::Public => "PUBLIC",
            Visibility::Interface => "INTERFACE",
        };
        f.write_str(s)
    }
}

/// Whether a target carries device code, and why
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum DeviceCode {
    #[default]
    None,
    /// Declared with device-separable sources
    Sources,
    /// Forced to device-link because it reaches several final libraries
    Promoted,
}

/// Back-references shared by every target of one expanded library
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ShadowRefs {
    /// The user-visible alias
    pub logical: TargetId,
    pub object: TargetId,
    pub static_lib: TargetId,
    /// Canonical link target; equals `static_lib` for static-only libraries
    pub middle: TargetId,
    pub final_lib: TargetId,
}

impl ShadowRefs {
    /// Static and middle roles collapsed into one target
    pub fn is_collapsed(&self) -> bool {
        self.static_lib == self.middle
    }

    /// Distinct physical targets, in declaration order
    pub fn targets(&self) -> Vec<TargetId> {
        let mut out = vec![self.object, self.static_lib];
        if !self.is_collapsed() {
            out.push(self.middle);
        }
        out.push(self.final_lib);
        out
    }

    /// Targets that share the logical library's compile and link requirements
    pub fn payload(&self) -> Vec<TargetId> {
        let mut out = vec![self.object, self.static_lib];
        if !self.is_collapsed() {
            out.push(self.middle);
        }
        out
    }

    /// Installable artifacts
    pub fn artifacts(&self) -> Vec<TargetId> {
        let mut out = vec![self.static_lib];
        if !self.is_collapsed() {
            out.push(self.middle);
        }
        out.push(self.final_lib);
        out
    }
}

/// How a target takes part in device linking
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub enum DeviceLink {
    /// No device-link involvement
    #[default]
    Native,
    /// Device-symbol resolution intentionally off
    Disabled,
    /// Links one final library directly instead of device-linking itself
    Final { target: TargetId, bracket: bool },
    /// Runs its own device-link pass over these static artifacts
    Own { inputs: Vec<TargetId> },
}

impl DeviceLink {
    /// Value of the host's "resolve device symbols" switch, if forced
    pub fn resolve_device_symbols(&self) -> Option<bool> {
        match self {
            DeviceLink::Native => None,
            DeviceLink::Disabled | DeviceLink::Final { .. } => Some(false),
            DeviceLink::Own { .. } => Some(true),
        }
    }
}

/// Link item that does not name a target
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExternalLink {
    pub name: String,
    pub visibility: Visibility,
}

/// A build target
#[derive(Debug, Clone)]
pub struct Target {
    pub name: String,
    pub kind: TargetKind,
    /// `None` for aliases
    pub output: Option<OutputKind>,
    pub sources: Vec<PathBuf>,
    pub device_code: DeviceCode,
    /// Effective runtime mode, declared or inherited
    pub runtime: RuntimeMode,
    /// Target that declared `runtime`
    pub runtime_origin: Option<TargetId>,
    pub shadows: Option<ShadowRefs>,
    pub alias_of: Option<TargetId>,
    pub properties: Properties,
    pub externals: Vec<ExternalLink>,
    pub separable: bool,
    pub position_independent: bool,
    pub device_link: DeviceLink,
}

impl Target {
    pub fn new(name: impl Into<String>, kind: TargetKind, output: Option<OutputKind>) -> Self {
        Self {
            name: name.into(),
            kind,
            output,
            sources: Vec::new(),
            device_code: DeviceCode::None,
            runtime: RuntimeMode::Unset,
            runtime_origin: None,
            shadows: None,
            alias_of: None,
            properties: Properties::default(),
            externals: Vec::new(),
            separable: false,
            position_independent: false,
            device_link: DeviceLink::Native,
        }
    }

    pub fn alias(name: impl Into<String>, target: TargetId) -> Self {
        let mut t = Self::new(name, TargetKind::Alias, None);
        t.alias_of = Some(target);
        t
    }

    pub fn with_sources(mut self, sources: Vec<PathBuf>) -> Self {
        self.sources = sources;
        self
    }

    pub fn contains_device_code(&self) -> bool {
        self.device_code != DeviceCode::None
    }

    pub fn is_promoted(&self) -> bool {
        self.device_code == DeviceCode::Promoted
    }

    /// Does this target produce something that gets linked?
    pub fn is_linkable(&self) -> bool {
        matches!(
            self.output,
            Some(
                OutputKind::Executable
                    | OutputKind::StaticLibrary
                    | OutputKind::SharedLibrary
                    | OutputKind::ModuleLibrary
            )
        )
    }

    pub fn add_external(&mut self, name: &str, visibility: Visibility) {
        if let Some(existing) = self.externals.iter_mut().find(|e| e.name == name) {
            existing.visibility = existing.visibility.merge(visibility);
        } else {
            self.externals.push(ExternalLink {
                name: name.to_string(),
                visibility,
            });
        }
    }
}
