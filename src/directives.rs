use std::path::PathBuf;

use crate::error::Location;

pub(crate) const VERSION_DIRECTIVE: &str = "#version __CONTEXT__";
pub(crate) const OS_DIRECTIVE: &str = "#define __OS__";

const INCLUDE_DIRECTIVE: &str = "#include";
const NO_TRACK_MARKER: &str = ":notrack";

/// Platform name `#define __OS__` expands to.
pub(crate) fn os_name() -> &'static str {
    if cfg!(windows) {
        "WIN32"
    } else if cfg!(target_os = "macos") {
        "APPLE"
    } else if cfg!(target_os = "linux") {
        "linux"
    } else {
        std::env::consts::OS
    }
}

pub(crate) fn os_block(os: &str) -> String {
    format!(
        "#ifndef __OS__\n#define __OS__ {}\n#define {}\n#endif\n",
        os, os
    )
}

#[derive(Debug, PartialEq)]
pub(crate) enum IncludeTarget {
    /// `"path"`: relative to the including file, then the include paths, then as is
    Quoted(PathBuf),
    /// `<path>`: the path itself, no search
    Angled(PathBuf),
}

#[derive(Debug, PartialEq)]
pub(crate) struct IncludeDirective {
    pub target: IncludeTarget,
    pub track: bool,
}

pub(crate) fn parse_include(line: &str, loc: &Location) -> crate::Result<Option<IncludeDirective>> {
    let Some(rest) = line.strip_prefix(INCLUDE_DIRECTIVE) else {
        return Ok(None);
    };
    let rest = rest.trim_start();

    let (right_delim, quoted) = match rest.chars().next() {
        None => return Err(loc.parse_error("expected file path after #include")),
        Some('"') => ('"', true),
        Some('<') => ('>', false),
        Some(_) => return Err(loc.parse_error("expected \" or < after #include")),
    };

    let rest = &rest[1..];
    let Some(end) = rest.find(right_delim) else {
        return Err(loc.parse_error(format!("expected {} to close #include path", right_delim)));
    };

    let path = PathBuf::from(&rest[..end]);
    let track = !rest[end + 1..].contains(NO_TRACK_MARKER);

    Ok(Some(IncludeDirective {
        target: if quoted {
            IncludeTarget::Quoted(path)
        } else {
            IncludeTarget::Angled(path)
        },
        track,
    }))
}
