use std::path::PathBuf;

pub type BoxedIncludeProviderError = Box<dyn std::error::Error + Send + Sync + 'static>;

pub type Result<T> = std::result::Result<T, PrepperError>;

#[derive(Debug, thiserror::Error)]
pub enum PrepperError {
    /// Any error reported by the `IncludeProvider` while reading a resolved file
    #[error("include provider error: \"{cause:?}\" when trying to include {file:?}")]
    IncludeProviderError {
        file: String,
        cause: BoxedIncludeProviderError,
    },

    /// Include path which could not be resolved relative to the including file,
    /// against the include paths, or as an absolute path
    #[error("could not resolve file path for include file {file:?}; triggered in {from:?} ({from_line:?})")]
    IncludeError {
        file: PathBuf,

        /// Including file; empty for the root file
        from: String,

        /// Line in the `from` file on which the include happened
        from_line: usize,
    },

    /// Recursively included file, along with information about where it was encountered
    #[error("file {file:?} is recursively included; triggered in {from:?} ({from_line:?})")]
    RecursiveInclude {
        /// File which was included recursively
        file: String,

        /// File which included the recursively included one
        from: String,

        /// Line in the `from` file on which the include happened
        from_line: usize,
    },

    /// Malformed directive, unbalanced `#for`/`#endfor`, or premature end of file
    #[error("parse error: {message} {file:?} ({line:?})")]
    ParseError {
        file: String,
        line: usize,
        message: String,
    },

    /// A `#{...}` token which could not be turned into GLSL text
    #[error("substitution error for {variable:?}: {message} {file:?} ({line:?})")]
    SubstitutionError {
        /// Token as written between the braces
        variable: String,
        message: String,
        file: String,
        line: usize,
    },

    /// `#version __CONTEXT__` was used without a context version in the config
    #[error("#version __CONTEXT__ requires a context version; triggered in {file:?} ({line:?})")]
    MissingContextVersion { file: String, line: usize },

    #[error("include path {path:?} is not an existing directory")]
    InvalidIncludePath { path: PathBuf },

    /// TOML value with no counterpart among the dictionary value types
    #[error("cannot store {key:?} in a dictionary: {message}")]
    DictionaryValue { key: String, message: String },

    #[error("invalid configuration: {0}")]
    Config(#[from] toml::de::Error),
}

impl PrepperError {
    /// Line in the offending file, if the error is tied to one.
    pub fn line(&self) -> Option<usize> {
        match self {
            PrepperError::ParseError { line, .. }
            | PrepperError::SubstitutionError { line, .. }
            | PrepperError::MissingContextVersion { line, .. } => Some(*line),
            PrepperError::IncludeError { from_line, .. }
            | PrepperError::RecursiveInclude { from_line, .. } => Some(*from_line),
            _ => None,
        }
    }
}

/// File and line an error is reported against.
#[derive(Clone, Debug)]
pub(crate) struct Location {
    pub file: String,
    pub line: usize,
}

impl Location {
    pub fn parse_error(&self, message: impl Into<String>) -> PrepperError {
        PrepperError::ParseError {
            file: self.file.clone(),
            line: self.line,
            message: message.into(),
        }
    }

    pub fn include_error(&self, file: impl Into<PathBuf>) -> PrepperError {
        PrepperError::IncludeError {
            file: file.into(),
            from: self.file.clone(),
            from_line: self.line,
        }
    }

    pub fn substitution_error(
        &self,
        variable: impl Into<String>,
        message: impl Into<String>,
    ) -> PrepperError {
        PrepperError::SubstitutionError {
            variable: variable.into(),
            message: message.into(),
            file: self.file.clone(),
            line: self.line,
        }
    }
}
