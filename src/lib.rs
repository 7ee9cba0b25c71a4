//! **glsl-prepper** is a GLSL shader preprocessor. It flattens a tree of shader files into
//! a single source string which can be handed straight to the driver.
//!
//! On top of `#include`, it understands a small templating language driven by a
//! hierarchical [`Dictionary`]:
//!
//! * `#{name}` and `#{a.b.c}` are replaced by the dictionary value, formatted as a GLSL
//!   literal (`1`/`0` for booleans, `ivec2(1,2)` for vectors, and so on).
//! * `#for key, value in dictionary` ... `#endfor` repeats its body once per key.
//!   `#for i in 0..3` iterates over an integer range.
//! * `#version __CONTEXT__` becomes the version of the configured graphics context.
//! * `#define __OS__` defines the name of the current platform.
//!
//! All other lines are copied into the output. `#line <line> <file-id>` markers are
//! emitted around includes and loop iterations, so compiler errors can be mapped
//! back to the original files via [`Preprocessor::file_identifiers_string`].
//!
//! # Example
//!
//! ```rust,no_run
//! use glsl_prepper::{Dictionary, Preprocessor, PreprocessorConfig};
//!
//! let mut dictionary = Dictionary::new();
//! dictionary.set_value("useShadows", true);
//!
//! let config = PreprocessorConfig::from_toml_str(
//!     r#"
//!     include_paths = ["shaders/common"]
//!
//!     [context]
//!     major = 4
//!     minor = 6
//!     profile = "core"
//!     "#,
//! )?;
//!
//! let mut preprocessor = Preprocessor::new("shaders/main.frag", dictionary).with_config(config);
//! let source = preprocessor.process()?;
//! # Ok::<(), glsl_prepper::PrepperError>(())
//! ```

mod config;
mod dictionary;
mod directives;
mod error;
mod file_registry;
mod for_loop;
mod include_provider;
mod preprocessor;
mod scanner;
mod scope;
mod substitution;

#[cfg(feature = "gl_compiler")]
pub mod gl_compiler;


pub use config::{ContextProfile, ContextVersion, PreprocessorConfig};
pub use dictionary::{Dictionary, FromValue, Value};
pub use error::{BoxedIncludeProviderError, PrepperError, Result};
pub use file_registry::{ChangeHook, FileEntry, FileRegistry, FileWatcher};
pub use include_provider::{normalize, FsIncludeProvider, IncludeProvider, ResolvedIncludePath};
pub use preprocessor::Preprocessor;
