//! `#{...}` expansion.
//!
//! The line is scanned for the *last* `#{`, which is matched with the next `}`.
//! The token in between is replaced by its value and the whole line is scanned
//! again, so a value that itself contains `#{...}` is expanded as well.

use crate::dictionary::{Dictionary, Value};
use crate::error::Location;
use crate::scope::AliasTable;

/// Range overlay first, then the user's dictionary.
#[derive(Clone, Copy)]
pub(crate) struct Lookup<'a> {
    pub overlay: &'a Dictionary,
    pub dictionary: &'a Dictionary,
}

impl<'a> Lookup<'a> {
    pub fn value(&self, path: &str) -> Option<&'a Value> {
        self.overlay
            .value(path)
            .or_else(|| self.dictionary.value(path))
    }

    pub fn dictionary(&self, path: &str) -> Option<&'a Dictionary> {
        match self.value(path)? {
            Value::Dictionary(d) => Some(d),
            _ => None,
        }
    }
}

pub(crate) fn is_string_literal(s: &str) -> bool {
    s.len() > 1 && s.starts_with('"') && s.ends_with('"')
}

pub(crate) fn glsl_double(v: f64) -> String {
    // Debug keeps the fractional part (`1.0`), so GLSL sees a float literal.
    format!("{:?}", v)
}

/// GLSL text for a dictionary value, or `None` for nested dictionaries.
pub(crate) fn format_value(value: &Value) -> Option<String> {
    Some(match value {
        Value::Bool(b) => i32::from(*b).to_string(),
        Value::String(s) => s.clone(),
        Value::Int(i) => i.to_string(),
        Value::Double(d) => glsl_double(*d),
        Value::IVec2([x, y]) => format!("ivec2({},{})", x, y),
        Value::IVec3([x, y, z]) => format!("ivec3({},{},{})", x, y, z),
        Value::DVec2([x, y]) => format!("dvec2({},{})", glsl_double(*x), glsl_double(*y)),
        Value::DVec3([x, y, z]) => format!(
            "dvec3({},{},{})",
            glsl_double(*x),
            glsl_double(*y),
            glsl_double(*z)
        ),
        Value::Dictionary(_) => return None,
    })
}

pub(crate) struct Substituter<'a> {
    pub aliases: &'a AliasTable,
    pub lookup: Lookup<'a>,
    pub max_per_line: usize,
}

impl<'a> Substituter<'a> {
    /// Apply loop aliases to `token`. Returns the resolved path if it names a
    /// quoted literal or an existing dictionary entry.
    pub fn resolve_alias(&self, token: &str) -> Option<String> {
        let resolved = self.aliases.resolve(token);
        let has_tail = token.contains('.');

        if (!has_tail && is_string_literal(&resolved)) || self.lookup.value(&resolved).is_some() {
            Some(resolved)
        } else {
            None
        }
    }

    pub fn substitute(&self, token: &str, loc: &Location) -> crate::Result<String> {
        let resolved = self
            .resolve_alias(token)
            .ok_or_else(|| loc.substitution_error(token, "could not resolve variable"))?;

        if is_string_literal(&resolved) {
            return Ok(resolved[1..resolved.len() - 1].to_string());
        }

        let out = self.lookup.value(&resolved).and_then(format_value);
        tracing::trace!(token, %resolved, ?out, "substitution");

        out.ok_or_else(|| {
            loc.substitution_error(
                token,
                format!(
                    "resolved to {:?} which is a type that is not supported",
                    resolved
                ),
            )
        })
    }

    pub fn substitute_line(&self, line: &mut String, loc: &Location) -> crate::Result<()> {
        let mut count = 0;

        while let Some(begin) = line.rfind("#{") {
            let Some(len) = line[begin..].find('}') else {
                return Err(loc.parse_error("could not parse line, missing '}' after '#{'"));
            };

            if count == self.max_per_line {
                return Err(loc.parse_error(format!(
                    "more than {} substitutions in a single line",
                    self.max_per_line
                )));
            }
            count += 1;

            let replacement = self.substitute(&line[begin + 2..begin + len], loc)?;
            line.replace_range(begin..=begin + len, &replacement);
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn values_format_as_glsl_literals() {
        assert_eq!(format_value(&Value::Bool(true)).unwrap(), "1");
        assert_eq!(format_value(&Value::Bool(false)).unwrap(), "0");
        assert_eq!(format_value(&Value::Int(-7)).unwrap(), "-7");
        assert_eq!(format_value(&Value::Double(2.0)).unwrap(), "2.0");
        assert_eq!(format_value(&Value::IVec3([1, 2, 3])).unwrap(), "ivec3(1,2,3)");
        assert_eq!(
            format_value(&Value::DVec2([0.5, 1.0])).unwrap(),
            "dvec2(0.5,1.0)"
        );
        assert_eq!(format_value(&Value::Dictionary(Dictionary::new())), None);
    }

    #[test]
    fn string_literal_needs_both_quotes() {
        assert!(is_string_literal("\"a\""));
        assert!(is_string_literal("\"\""));
        assert!(!is_string_literal("\""));
        assert!(!is_string_literal("\"a"));
    }
}
