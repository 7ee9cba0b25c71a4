//! `#for <key>, <value> in <dictionary>` and `#for <value> in <min>..<max>`.
//!
//! A loop body is not captured; `#endfor` rewinds the input to the line after
//! the header and the body is scanned again with the next binding.

use crate::dictionary::Dictionary;
use crate::error::Location;

#[derive(Debug, PartialEq)]
pub(crate) struct ForHeader {
    /// `None` for the range shorthand
    pub key: Option<String>,
    pub value: String,
    pub collection: String,
}

pub(crate) fn is_for_line(line: &str) -> bool {
    line.strip_prefix("#for")
        .map_or(false, |rest| rest.starts_with(char::is_whitespace))
}

pub(crate) fn is_endfor_line(line: &str) -> bool {
    line.starts_with("#endfor")
}

pub(crate) fn parse_for_header(line: &str, loc: &Location) -> crate::Result<Option<ForHeader>> {
    if !is_for_line(line) {
        return Ok(None);
    }
    let rest = &line["#for".len()..];

    let (key, rest) = match rest.split_once(',') {
        Some((key, rest)) => {
            let key = key.trim();
            if key.is_empty() || key.contains(char::is_whitespace) {
                return Err(loc.parse_error("expected a key name before ',' in #for statement"));
            }
            (Some(key.to_string()), rest)
        }
        None => (None, rest),
    };

    let mut words = rest.split_whitespace();
    let value = words
        .next()
        .ok_or_else(|| loc.parse_error("expected a value name in #for statement"))?;

    if words.next() != Some("in") {
        return Err(loc.parse_error("expected 'in' in #for statement"));
    }

    let collection = words
        .next()
        .ok_or_else(|| loc.parse_error("expected a dictionary after 'in' in #for statement"))?;

    Ok(Some(ForHeader {
        key,
        value: value.to_string(),
        collection: collection.to_string(),
    }))
}

/// Expand `min..max` into a dictionary `{"1": "min", ..., "n": "max"}`.
pub(crate) fn parse_range(text: &str, loc: &Location) -> crate::Result<(i32, i32, Dictionary)> {
    let (min, max) = text
        .split_once("..")
        .ok_or_else(|| loc.parse_error(format!("expected '..' in range {:?}", text)))?;

    let bound = |s: &str| {
        s.trim()
            .parse::<i32>()
            .map_err(|_| loc.parse_error(format!("invalid range bound {:?} in {:?}", s, text)))
    };
    let (min, max) = (bound(min)?, bound(max)?);

    let range = (min..=max)
        .enumerate()
        .map(|(i, v)| ((i + 1).to_string(), v.to_string()))
        .collect();

    Ok((min, max, range))
}

pub(crate) fn range_name(min: i32, max: i32) -> String {
    // Not a valid dotted path, so it cannot collide with user keys
    format!("(Range {} to {})", min, max)
}

/// An open loop.
#[derive(Debug)]
pub(crate) struct ForStatement {
    /// Depth in the input stack of the file the loop was opened in
    pub input_index: usize,
    pub file: String,
    /// 1-based line of the `#for` header; the body starts on the next line
    pub header_line: usize,
    pub key_name: Option<String>,
    pub value_name: String,
    pub dictionary_ref: String,
    pub keys: Vec<String>,
    pub key_index: usize,
    /// `#for` headers seen inside the body of an empty loop, still unclosed
    pub skipped_depth: usize,
}

impl ForStatement {
    pub fn is_empty_loop(&self) -> bool {
        self.keys.is_empty()
    }

    pub fn current_key(&self) -> Option<&str> {
        self.keys.get(self.key_index).map(String::as_str)
    }

    /// Aliases for the current iteration: the key as a quoted literal and the
    /// value as a dotted path into the iterated dictionary.
    pub fn bindings(&self) -> Option<Vec<(String, String)>> {
        let key = self.current_key()?;
        let mut bindings = Vec::with_capacity(2);

        if let Some(key_name) = &self.key_name {
            bindings.push((key_name.clone(), format!("\"{}\"", key)));
        }
        bindings.push((
            self.value_name.clone(),
            format!("{}.{}", self.dictionary_ref, key),
        ));

        Some(bindings)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn loc() -> Location {
        Location {
            file: "test".to_string(),
            line: 3,
        }
    }

    fn header(line: &str) -> Option<ForHeader> {
        parse_for_header(line, &loc()).unwrap()
    }

    #[test]
    fn key_value_header() {
        assert_eq!(
            header("#for  name , light in lights"),
            Some(ForHeader {
                key: Some("name".to_string()),
                value: "light".to_string(),
                collection: "lights".to_string(),
            })
        );
    }

    #[test]
    fn range_header() {
        assert_eq!(
            header("#for i in 0..3"),
            Some(ForHeader {
                key: None,
                value: "i".to_string(),
                collection: "0..3".to_string(),
            })
        );
    }

    #[test]
    fn not_a_loop() {
        assert_eq!(header("#format"), None);
        assert_eq!(header("for i in 0..3"), None);
        assert_eq!(header("#endfor"), None);
    }

    #[test]
    fn missing_in() {
        match parse_for_header("#for k, v of d", &loc()) {
            Err(crate::PrepperError::ParseError { line: 3, .. }) => (),
            val => panic!("{:?}", val),
        }
        assert!(parse_for_header("#for k, v in", &loc()).is_err());
        assert!(parse_for_header("#for , v in d", &loc()).is_err());
    }

    #[test]
    fn range_dictionary() {
        let (min, max, range) = parse_range("3..5", &loc()).unwrap();
        assert_eq!((min, max), (3, 5));
        assert_eq!(range.keys().collect::<Vec<_>>(), vec!["1", "2", "3"]);
        assert_eq!(range.get::<String>("3").as_deref(), Some("5"));

        let (_, _, empty) = parse_range("5..3", &loc()).unwrap();
        assert!(empty.is_empty());

        assert!(parse_range("lights", &loc()).is_err());
        assert!(parse_range("a..3", &loc()).is_err());
    }
}
