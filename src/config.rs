use std::fmt;
use std::path::PathBuf;

use serde::Deserialize;

/// Preprocessor settings. All fields have defaults, so an empty TOML
/// document is a valid configuration.
#[derive(Clone, Debug, Deserialize, PartialEq)]
#[serde(default)]
pub struct PreprocessorConfig {
    /// Directories searched, in order, for quoted includes that are not
    /// found next to the including file.
    pub include_paths: Vec<PathBuf>,

    /// Version of the graphics context `#version __CONTEXT__` expands to.
    pub context: Option<ContextVersion>,

    /// Prefix every `#line` marker with an empty statement, so that drivers
    /// which attribute errors to the previous statement keep them in the
    /// right file.
    pub isolate_line_markers: bool,

    /// Upper bound on `#{...}` expansions within a single line.
    pub max_substitutions_per_line: usize,
}

impl Default for PreprocessorConfig {
    fn default() -> Self {
        Self {
            include_paths: Vec::new(),
            context: None,
            isolate_line_markers: false,
            max_substitutions_per_line: 1024,
        }
    }
}

impl PreprocessorConfig {
    pub fn from_toml_str(s: &str) -> crate::Result<Self> {
        Ok(toml::from_str(s)?)
    }
}

#[derive(Clone, Copy, Debug, Deserialize, PartialEq, Eq)]
pub struct ContextVersion {
    pub major: u32,
    pub minor: u32,
    pub profile: ContextProfile,
}

#[derive(Clone, Copy, Debug, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum ContextProfile {
    Core,
    Compatibility,
}

impl fmt::Display for ContextProfile {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ContextProfile::Core => write!(f, "core"),
            ContextProfile::Compatibility => write!(f, "compatibility"),
        }
    }
}

impl ContextVersion {
    pub fn new(major: u32, minor: u32, profile: ContextProfile) -> Self {
        Self {
            major,
            minor,
            profile,
        }
    }

    /// The GLSL version directive matching this context, e.g. `#version 460 core`.
    pub fn version_directive(&self) -> String {
        format!("#version {}{}0 {}", self.major, self.minor, self.profile)
    }
}
