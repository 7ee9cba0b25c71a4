//! OpenGL reports compile errors against numeric source-string indices, in a
//! vendor-specific format. Since the preprocessor emits `#line <line> <file-id>`
//! markers, those indices are file identifiers from the [`FileRegistry`].
//!
//! This module provides `compile_shader`, which runs the preprocessor, calls a
//! user-provided compiler callback, and rewrites the log so that every location
//! names the file it came from.
//!
//! ```rust,ignore
//! let compiled = compile_shader(&mut preprocessor, |source| {
//!     let handle = gl.CreateShader(shader_type);
//!     // ... ShaderSource, CompileShader, GetShaderInfoLog ...
//!     ShaderCompilerOutput { artifact: Some(handle), log: None }
//! })?;
//!
//! if let Some(log) = compiled.log {
//!     tracing::info!("Shader compiler output: {}", log);
//! }
//! ```

use crate::{FileRegistry, Preprocessor};

/// User-defined output of OpenGL's shader compiler, along with an info log.
pub struct ShaderCompilerOutput<Artifact> {
    pub artifact: Artifact,
    pub log: Option<String>,
}

/// Preprocess, then compile via `compiler_fn`, which receives the flattened source.
///
/// `Artifact` is a user-defined output of the shader compiler, e.g. `Option<GLuint>`.
pub fn compile_shader<Artifact, CompilerFn>(
    preprocessor: &mut Preprocessor,
    compiler_fn: CompilerFn,
) -> crate::Result<ShaderCompilerOutput<Artifact>>
where
    CompilerFn: FnOnce(&str) -> ShaderCompilerOutput<Artifact>,
{
    let source = preprocessor.process()?;
    let compiler_output = compiler_fn(&source);

    Ok(ShaderCompilerOutput {
        artifact: compiler_output.artifact,
        log: compiler_output
            .log
            .map(|log| remap_compiler_log(&log, preprocessor.file_registry())),
    })
}

/// Replace `ERROR: <id>:<line>` (Intel, AMD) and `<id>(<line>)` (NVIDIA)
/// locations with `<path>(<line>)`. Unknown identifiers are left alone.
pub fn remap_compiler_log(log: &str, registry: &FileRegistry) -> String {
    lazy_static::lazy_static! {
        static ref INTEL_AMD_ERROR_RE: regex::Regex = regex::Regex::new(r"(?m)^ERROR:\s*(\d+):(\d+)").unwrap();
    }

    lazy_static::lazy_static! {
        static ref NV_ERROR_RE: regex::Regex = regex::Regex::new(r"(?m)^(\d+)\((\d+)\)").unwrap();
    }

    let error_replacement = |captures: &regex::Captures| -> String {
        let path = captures[1]
            .parse::<usize>()
            .ok()
            .and_then(|id| registry.path_of(id));

        match path {
            Some(path) => format!("{}({})", path.display(), &captures[2]),
            None => captures[0].to_string(),
        }
    };

    let log = INTEL_AMD_ERROR_RE.replace_all(log, error_replacement);
    NV_ERROR_RE
        .replace_all(&log, error_replacement)
        .into_owned()
}
