//! Diagnostic reporting
//!
//! Configuration errors abort graph construction; this module provides them
//! as miette diagnostics, plus description-file errors with source locations.

use crate::graph::RuntimeMode;
use miette::{Diagnostic, NamedSource, SourceSpan};
use std::path::PathBuf;
use std::sync::Arc;
use thiserror::Error;

/// Build description source for error reporting
#[derive(Debug, Clone)]
pub struct SourceFile {
    pub name: String,
    pub content: Arc<str>,
}

impl SourceFile {
    pub fn new(name: impl Into<String>, content: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            content: Arc::from(content.into()),
        }
    }

    pub fn to_named_source(&self) -> NamedSource<String> {
        NamedSource::new(self.name.clone(), self.content.to_string())
    }
}

/// Fatal graph-construction error
#[derive(Error, Debug, Diagnostic, Clone, PartialEq, Eq)]
pub enum BuildError {
    // === Configuration Errors ===
    #[error("Library `{name}` contains device code and cannot be a MODULE library")]
    #[diagnostic(
        code(config::module_with_device_code),
        help("declare `{name}` as a STATIC or SHARED library")
    )]
    ModuleWithDeviceCode { name: String },

    #[error(
        "Device runtime mismatch: `{target}` uses the {target_mode} runtime but its dependency `{dependency}` requires {dependency_mode}"
    )]
    #[diagnostic(
        code(config::runtime_mismatch),
        help("every target in a linked graph must use the same device runtime")
    )]
    RuntimeModeMismatch {
        target: String,
        target_mode: RuntimeMode,
        dependency: String,
        dependency_mode: RuntimeMode,
    },

    #[error(
        "Conflicting device runtimes for `{consumer}`: `{first}` requires {first_mode} but `{second}` requires {second_mode}"
    )]
    #[diagnostic(
        code(config::runtime_conflict),
        help("make both libraries agree on one device runtime")
    )]
    ConflictingRuntimeModes {
        consumer: String,
        first: String,
        first_mode: RuntimeMode,
        second: String,
        second_mode: RuntimeMode,
    },

    // === Declaration Errors ===
    #[error("Unknown target `{name}`")]
    #[diagnostic(
        code(declare::unknown_target),
        help("declare `{name}` before referencing it")
    )]
    UnknownTarget { name: String },

    #[error("Target `{name}` is already defined")]
    #[diagnostic(
        code(declare::duplicate_target),
        help("target names, including generated shadow names, must be unique")
    )]
    DuplicateTarget { name: String },

    #[error("Alias `{alias}` cannot point at shadow target `{target}`")]
    #[diagnostic(
        code(declare::shadow_alias),
        help("alias the library `{logical}` instead")
    )]
    ShadowAlias {
        alias: String,
        target: String,
        logical: String,
    },

    // === Host Errors ===
    #[error("Device link of `{target}` failed: {message}")]
    #[diagnostic(
        code(host::device_link),
        help("check that a device linker is configured for this build")
    )]
    DeviceLink { target: String, message: String },
}

/// Error reading or evaluating a build description
#[derive(Error, Debug, Diagnostic)]
pub enum DescriptionError {
    #[error("Failed to read build description `{}`", .path.display())]
    #[diagnostic(code(description::io))]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Invalid build description: {message}")]
    #[diagnostic(code(description::parse))]
    Parse {
        message: String,
        #[label("here")]
        span: Option<SourceSpan>,
        #[source_code]
        src: NamedSource<String>,
    },

    #[error(transparent)]
    #[diagnostic(transparent)]
    Build(#[from] BuildError),
}

impl DescriptionError {
    pub fn parse(error: &toml::de::Error, source: &SourceFile) -> Self {
        DescriptionError::Parse {
            message: error.message().to_string(),
            span: error.span().map(SourceSpan::from),
            src: source.to_named_source(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_conflict_names_both_libraries() {
        let err = BuildError::ConflictingRuntimeModes {
            consumer: "app".into(),
            first: "a".into(),
            first_mode: RuntimeMode::Static,
            second: "b".into(),
            second_mode: RuntimeMode::Shared,
        };
        let msg = err.to_string();
        assert!(msg.contains("`a` requires static"));
        assert!(msg.contains("`b` requires shared"));
    }

    #[test]
    fn test_diagnostic_codes() {
        let err = BuildError::ModuleWithDeviceCode { name: "k".into() };
        let code = err.code().map(|c| c.to_string());
        assert_eq!(code.as_deref(), Some("config::module_with_device_code"));
    }

    #[test]
    fn test_every_error_has_help() {
        let errors = [
            BuildError::ModuleWithDeviceCode { name: "k".into() },
            BuildError::UnknownTarget { name: "k".into() },
            BuildError::DuplicateTarget { name: "k".into() },
            BuildError::ShadowAlias {
                alias: "a".into(),
                target: "k_final".into(),
                logical: "k".into(),
            },
            BuildError::DeviceLink {
                target: "k_final".into(),
                message: "failed".into(),
            },
        ];
        for err in errors {
            assert!(err.help().is_some(), "{err} has no help text");
        }
    }
}
