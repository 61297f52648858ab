//! Typed, two-scope target properties

use super::target::Visibility;
use indexmap::IndexSet;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Recognized list-valued property kinds
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PropertyKind {
    IncludeDirs,
    CompileOptions,
    CompileDefinitions,
    LinkOptions,
}

impl PropertyKind {
    pub const ALL: [PropertyKind; 4] = [
        PropertyKind::IncludeDirs,
        PropertyKind::CompileOptions,
        PropertyKind::CompileDefinitions,
        PropertyKind::LinkOptions,
    ];

    /// Kinds copied from a static shadow onto its final library
    pub const FINAL_CATCH_UP: [PropertyKind; 3] = [
        PropertyKind::CompileOptions,
        PropertyKind::CompileDefinitions,
        PropertyKind::LinkOptions,
    ];
}

impl fmt::Display for PropertyKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            PropertyKind::IncludeDirs => "include_dirs",
            PropertyKind::CompileOptions => "compile_options",
            PropertyKind::CompileDefinitions => "compile_definitions",
            PropertyKind::LinkOptions => "link_options",
        };
        f.write_str(s)
    }
}

/// Own and interface values of one property
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Scoped {
    pub own: IndexSet<String>,
    pub interface: IndexSet<String>,
}

impl Scoped {
    /// Add values in the scopes selected by `visibility`
    pub fn add<I, S>(&mut self, visibility: Visibility, values: I)
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        for value in values {
            let value = value.into();
            if visibility.applies_to_self() {
                self.own.insert(value.clone());
            }
            if visibility.exported() {
                self.interface.insert(value);
            }
        }
    }

    /// Merge values into the own scope, returning the ones that were new
    pub fn merge_own<'a, I>(&mut self, values: I) -> Vec<String>
    where
        I: IntoIterator<Item = &'a String>,
    {
        values
            .into_iter()
            .filter(|v| self.own.insert((*v).clone()))
            .cloned()
            .collect()
    }

    /// Own values followed by interface values, deduplicated
    pub fn all(&self) -> IndexSet<String> {
        self.own.iter().chain(self.interface.iter()).cloned().collect()
    }

    pub fn is_empty(&self) -> bool {
        self.own.is_empty() && self.interface.is_empty()
    }
}

/// Property storage of one target
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Properties {
    include_dirs: Scoped,
    compile_options: Scoped,
    compile_definitions: Scoped,
    link_options: Scoped,
}

impl Properties {
    pub fn get(&self, kind: PropertyKind) -> &Scoped {
        match kind {
            PropertyKind::IncludeDirs => &self.include_dirs,
            PropertyKind::CompileOptions => &self.compile_options,
            PropertyKind::CompileDefinitions => &self.compile_definitions,
            PropertyKind::LinkOptions => &self.link_options,
        }
    }

    pub fn get_mut(&mut self, kind: PropertyKind) -> &mut Scoped {
        match kind {
            PropertyKind::IncludeDirs => &mut self.include_dirs,
            PropertyKind::CompileOptions => &mut self.compile_options,
            PropertyKind::CompileDefinitions => &mut self.compile_definitions,
            PropertyKind::LinkOptions => &mut self.link_options,
        }
    }
}
