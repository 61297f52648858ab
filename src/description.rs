//! Build descriptions
//!
//! A description is a TOML file holding an optional `[policy]` table and an
//! ordered list of `[[step]]` declarations:
//!
//! ```toml
//! [policy]
//! default_library_kind = "shared"
//!
//! [[step]]
//! op = "library"
//! name = "fft"
//! sources = ["fft.cu"]
//!
//! [[step]]
//! op = "executable"
//! name = "app"
//! sources = ["main.cpp"]
//!
//! [[step]]
//! op = "link"
//! consumer = "app"
//! dependencies = ["fft"]
//! ```
//!
//! Steps are applied in file order, then the construction pass is finished.

use crate::config::Policy;
use crate::diagnostics::{BuildError, DescriptionError, SourceFile};
use crate::graph::{LibraryKind, PropertyKind, RuntimeMode, Visibility};
use crate::host::{Host, RecordingHost};
use crate::link::{Constructed, Engine};
use serde::Deserialize;
use std::path::{Path, PathBuf};
use tracing::debug;

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct Description {
    #[serde(default)]
    pub policy: Policy,
    #[serde(default, rename = "step")]
    pub steps: Vec<Step>,
}

/// One declaration
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(tag = "op", rename_all = "snake_case")]
pub enum Step {
    Library {
        name: String,
        #[serde(default)]
        kind: Option<LibraryKind>,
        #[serde(default)]
        sources: Vec<PathBuf>,
    },
    Executable {
        name: String,
        #[serde(default)]
        sources: Vec<PathBuf>,
    },
    Alias {
        name: String,
        target: String,
    },
    Link {
        consumer: String,
        #[serde(default)]
        visibility: Visibility,
        dependencies: Vec<String>,
    },
    Property {
        target: String,
        property: PropertyKind,
        #[serde(default)]
        visibility: Visibility,
        values: Vec<String>,
    },
    Runtime {
        target: String,
        mode: RuntimeMode,
    },
    Install {
        targets: Vec<String>,
    },
}

impl Description {
    pub fn parse(source: &SourceFile) -> Result<Self, DescriptionError> {
        toml::from_str(&source.content).map_err(|e| DescriptionError::parse(&e, source))
    }

    /// Read and parse a description file
    pub fn load(path: &Path) -> Result<(Self, SourceFile), DescriptionError> {
        let content = std::fs::read_to_string(path).map_err(|source| DescriptionError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        let source = SourceFile::new(path.display().to_string(), content);
        let description = Self::parse(&source)?;
        Ok((description, source))
    }

    /// Apply every step to `engine`, in order
    pub fn apply<H: Host>(&self, engine: &mut Engine<H>) -> Result<(), BuildError> {
        for (i, step) in self.steps.iter().enumerate() {
            debug!("step {}: {:?}", i + 1, step);
            step.apply(engine)?;
        }
        Ok(())
    }

    /// Construct and finish a graph with a [`RecordingHost`]
    pub fn evaluate(&self) -> Result<Constructed<RecordingHost>, BuildError> {
        let host = RecordingHost::from_policy(&self.policy);
        let mut engine = Engine::new(self.policy.clone(), host);
        self.apply(&mut engine)?;
        engine.finish()
    }
}

impl Step {
    pub fn apply<H: Host>(&self, engine: &mut Engine<H>) -> Result<(), BuildError> {
        match self {
            Step::Library {
                name,
                kind,
                sources,
            } => {
                engine.add_library(name, *kind, sources)?;
            }
            Step::Executable { name, sources } => {
                engine.add_executable(name, sources)?;
            }
            Step::Alias { name, target } => {
                engine.add_alias(name, target)?;
            }
            Step::Link {
                consumer,
                visibility,
                dependencies,
            } => {
                for dependency in dependencies {
                    engine.add_dependency(consumer, dependency, *visibility)?;
                }
            }
            Step::Property {
                target,
                property,
                visibility,
                values,
            } => engine.add_property(target, *property, *visibility, values)?,
            Step::Runtime { target, mode } => engine.set_runtime_mode(target, *mode)?,
            Step::Install { targets } => {
                let targets: Vec<&str> = targets.iter().map(String::as_str).collect();
                engine.install(&targets)?;
            }
        }
        Ok(())
    }
}
