//! Build policy
//!
//! Global switches consulted when a declaration leaves something open, such
//! as the binary kind of a library or the names of its shadow targets.

use crate::graph::LibraryKind;
use serde::{Deserialize, Serialize};

/// Global build policy
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct Policy {
    /// Kind used for libraries declared without one
    pub default_library_kind: LibraryKind,
    /// Whether a device compiler is configured
    pub device_compiler: bool,
    /// Extensions of device-separable sources (without the dot)
    pub device_extensions: Vec<String>,
    /// Empty device translation unit attached to final and promoted targets
    pub empty_device_source: String,
    pub naming: ShadowNaming,
}

impl Default for Policy {
    fn default() -> Self {
        Self {
            default_library_kind: LibraryKind::Shared,
            device_compiler: true,
            device_extensions: vec!["cu".to_string()],
            empty_device_source: "rdc_empty.cu".to_string(),
            naming: ShadowNaming::default(),
        }
    }
}

impl Policy {
    /// Policy for a host without a device compiler
    pub fn host_only() -> Self {
        Self {
            device_compiler: false,
            ..Default::default()
        }
    }

    pub fn with_default_kind(mut self, kind: LibraryKind) -> Self {
        self.default_library_kind = kind;
        self
    }
}

/// Suffixes appended to a logical library name for its shadow targets
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct ShadowNaming {
    pub object: String,
    #[serde(rename = "static")]
    pub static_lib: String,
    pub middle: String,
    #[serde(rename = "final")]
    pub final_lib: String,
}

impl Default for ShadowNaming {
    fn default() -> Self {
        Self {
            object: "_objects".to_string(),
            static_lib: "_static".to_string(),
            middle: "_middle".to_string(),
            final_lib: "_final".to_string(),
        }
    }
}

impl ShadowNaming {
    pub fn object(&self, logical: &str) -> String {
        format!("{logical}{}", self.object)
    }

    pub fn static_lib(&self, logical: &str) -> String {
        format!("{logical}{}", self.static_lib)
    }

    pub fn middle(&self, logical: &str) -> String {
        format!("{logical}{}", self.middle)
    }

    pub fn final_lib(&self, logical: &str) -> String {
        format!("{logical}{}", self.final_lib)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_policy_from_partial_toml() {
        let policy: Policy = toml::from_str(
            r#"
            default_library_kind = "static"
            [naming]
            final = "_dlink"
            "#,
        )
        .unwrap();

        assert_eq!(policy.default_library_kind, LibraryKind::Static);
        assert!(policy.device_compiler);
        assert_eq!(policy.naming.final_lib("fft"), "fft_dlink");
        assert_eq!(policy.naming.middle("fft"), "fft_middle");
    }
}
