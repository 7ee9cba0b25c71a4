use crate::config::PreprocessorConfig;
use crate::dictionary::Dictionary;
use crate::directives::{self, IncludeTarget};
use crate::error::Location;
use crate::file_registry::FileRegistry;
use crate::for_loop::{self, ForStatement};
use crate::include_provider::{self, IncludeProvider, ResolvedIncludePath};
use crate::scope::AliasTable;
use crate::substitution::{Lookup, Substituter};
use crate::PrepperError;

const LINE_MARKER_SEPARATOR: &str = "; // preprocessor add semicolon to isolate error messages";

/// A file being scanned; one per level of `#include` nesting.
struct Input {
    path: ResolvedIncludePath,
    file_id: usize,
    lines: Vec<String>,
    /// Number of lines consumed, i.e. the 1-based number of the last line read
    line_number: usize,
    /// Indentation of every including line up the stack
    indentation: String,
}

impl Input {
    fn next_line(&mut self) -> Option<String> {
        let line = self.lines.get(self.line_number)?.clone();
        self.line_number += 1;
        Some(line)
    }
}

fn split_indentation(line: &str) -> (&str, &str) {
    let is_ws = |c: char| matches!(c, ' ' | '\t' | '\r' | '\n');
    let trimmed = line.trim_start_matches(is_ws);
    let indentation = &line[..line.len() - trimmed.len()];
    (indentation, trimmed.trim_end_matches(is_ws))
}

/// One preprocessing pass over a root file and everything it includes.
pub(crate) struct Scanner<'a> {
    include_provider: &'a mut dyn IncludeProvider,
    registry: &'a mut FileRegistry,
    config: &'a PreprocessorConfig,
    dictionary: &'a Dictionary,
    /// Dictionaries synthesized for range loops; consulted before `dictionary`
    ranges: Dictionary,
    aliases: AliasTable,
    for_statements: Vec<ForStatement>,
    inputs: Vec<Input>,
    /// Leading whitespace of the line being processed
    indentation: String,
    output: String,
}

impl<'a> Scanner<'a> {
    pub fn new(
        include_provider: &'a mut dyn IncludeProvider,
        registry: &'a mut FileRegistry,
        config: &'a PreprocessorConfig,
        dictionary: &'a Dictionary,
    ) -> Scanner<'a> {
        Scanner {
            include_provider,
            registry,
            config,
            dictionary,
            ranges: Dictionary::new(),
            aliases: AliasTable::default(),
            for_statements: Vec::new(),
            inputs: Vec::new(),
            indentation: String::new(),
            output: String::new(),
        }
    }

    /// Scan `root` and return the flattened source.
    pub fn process(mut self, root: ResolvedIncludePath) -> crate::Result<String> {
        let root_file = root.display().to_string();
        self.include_file(root, true)?;

        if let Some(stmt) = self.for_statements.last() {
            return Err(PrepperError::ParseError {
                file: stmt.file.clone(),
                line: stmt.header_line,
                message: "unexpected end of file in the middle of expanding #for statement"
                    .to_string(),
            });
        }

        if self.aliases.open_scopes() > 0 {
            return Err(PrepperError::ParseError {
                file: root_file,
                line: 0,
                message: "unexpected end of file with open scopes".to_string(),
            });
        }

        Ok(self.output)
    }

    fn location(&self) -> Location {
        match self.inputs.last() {
            Some(input) => Location {
                file: input.path.display().to_string(),
                line: input.line_number,
            },
            None => Location {
                file: String::new(),
                line: 0,
            },
        }
    }

    fn lookup(&self) -> Lookup<'_> {
        Lookup {
            overlay: &self.ranges,
            dictionary: self.dictionary,
        }
    }

    fn substituter(&self) -> Substituter<'_> {
        Substituter {
            aliases: &self.aliases,
            lookup: self.lookup(),
            max_per_line: self.config.max_substitutions_per_line,
        }
    }

    /// Emit a `#line` marker for the current position in the innermost file.
    fn add_line_number(&mut self) {
        let Some(input) = self.inputs.last() else {
            return;
        };

        let separator = if self.config.isolate_line_markers {
            LINE_MARKER_SEPARATOR
        } else {
            ""
        };

        self.output.push_str(&format!(
            "{}\n#line {} {} // {}\n",
            separator,
            input.line_number,
            input.file_id,
            input.path.display()
        ));
    }

    fn include_file(&mut self, path: ResolvedIncludePath, track: bool) -> crate::Result<()> {
        let from = self.location();

        if !self.include_provider.is_file(path.as_path()) {
            return Err(from.include_error(path.0));
        }

        if self.inputs.iter().any(|input| input.path == path) {
            return Err(PrepperError::RecursiveInclude {
                file: path.display().to_string(),
                from: from.file,
                from_line: from.line,
            });
        }

        let file_id = self.registry.register(&path, track);

        let source = self
            .include_provider
            .get_include(&path)
            .map_err(|e| PrepperError::IncludeProviderError {
                file: path.display().to_string(),
                cause: e,
            })?;

        let indentation = match self.inputs.last() {
            Some(parent) => format!("{}{}", parent.indentation, self.indentation),
            None => self.indentation.clone(),
        };

        tracing::debug!(path = %path.display(), file_id, depth = self.inputs.len(), "entering file");

        self.inputs.push(Input {
            path,
            file_id,
            lines: source.lines().map(str::to_string).collect(),
            line_number: 0,
            indentation,
        });

        if self.inputs.len() > 1 {
            self.add_line_number();
        }

        while self.parse_line()? {}

        let depth = self.inputs.len() - 1;
        if let Some(stmt) = self.for_statements.last() {
            if stmt.input_index >= depth {
                return Err(PrepperError::ParseError {
                    file: stmt.file.clone(),
                    line: stmt.header_line,
                    message: "unexpected end of file, still processing #for loop".to_string(),
                });
            }
        }

        if let Some(input) = self.inputs.pop() {
            tracing::debug!(path = %input.path.display(), "leaving file");
        }

        if !self.inputs.is_empty() {
            self.add_line_number();
        }

        Ok(())
    }

    /// Process one line of the innermost file. Returns `false` once it is exhausted.
    fn parse_line(&mut self) -> crate::Result<bool> {
        let Some(raw) = self.inputs.last_mut().and_then(Input::next_line) else {
            return Ok(false);
        };

        let (indentation, line) = split_indentation(&raw);
        self.indentation = indentation.to_string();
        let mut line = line.to_string();

        if let Some(stmt) = self.for_statements.last_mut() {
            if stmt.is_empty_loop() {
                if for_loop::is_endfor_line(&line) {
                    if stmt.skipped_depth > 0 {
                        stmt.skipped_depth -= 1;
                    } else {
                        self.parse_end_for()?;
                    }
                } else if for_loop::is_for_line(&line) {
                    stmt.skipped_depth += 1;
                }
                return Ok(true);
            }
        }

        if for_loop::is_endfor_line(&line) {
            self.parse_end_for()?;
            return Ok(true);
        }

        let loc = self.location();
        self.substituter().substitute_line(&mut line, &loc)?;

        let is_special = self.parse_version(&line, &loc)?
            || self.parse_os(&line)
            || self.parse_include(&line, &loc)?
            || self.parse_for(&line, &loc)?;

        if !is_special {
            if let Some(input) = self.inputs.last() {
                self.output.push_str(&input.indentation);
            }
            self.output.push_str(&self.indentation);
            self.output.push_str(&line);
            self.output.push('\n');
        }

        Ok(true)
    }

    fn parse_version(&mut self, line: &str, loc: &Location) -> crate::Result<bool> {
        if !line.starts_with(directives::VERSION_DIRECTIVE) {
            return Ok(false);
        }

        let context = self
            .config
            .context
            .ok_or_else(|| PrepperError::MissingContextVersion {
                file: loc.file.clone(),
                line: loc.line,
            })?;

        self.output.push_str(&context.version_directive());
        self.output.push('\n');
        Ok(true)
    }

    fn parse_os(&mut self, line: &str) -> bool {
        if !line.starts_with(directives::OS_DIRECTIVE) {
            return false;
        }

        self.output
            .push_str(&directives::os_block(directives::os_name()));
        self.add_line_number();
        true
    }

    fn parse_include(&mut self, line: &str, loc: &Location) -> crate::Result<bool> {
        let Some(directive) = directives::parse_include(line, loc)? else {
            return Ok(false);
        };

        let resolved = match &directive.target {
            IncludeTarget::Quoted(include) => {
                let including_file = match self.inputs.last() {
                    Some(input) => input.path.as_path(),
                    None => std::path::Path::new(""),
                };
                include_provider::resolve_quoted(
                    &*self.include_provider,
                    include,
                    including_file,
                    &self.config.include_paths,
                )
                .ok_or_else(|| loc.include_error(include.as_path()))?
            }
            IncludeTarget::Angled(include) => {
                include_provider::resolve_angled(&*self.include_provider, include)
                    .ok_or_else(|| loc.include_error(include.as_path()))?
            }
        };

        self.include_file(resolved, directive.track)?;
        Ok(true)
    }

    fn parse_for(&mut self, line: &str, loc: &Location) -> crate::Result<bool> {
        let Some(header) = for_loop::parse_for_header(line, loc)? else {
            return Ok(false);
        };

        let mut collection = header.collection;
        if header.key.is_none() {
            let (min, max, range) = for_loop::parse_range(&collection, loc)?;
            collection = for_loop::range_name(min, max);
            self.ranges.set_value(collection.clone(), range);
        }

        let dictionary_ref = self
            .substituter()
            .resolve_alias(&collection)
            .ok_or_else(|| loc.substitution_error(collection.as_str(), "could not resolve variable"))?;

        let keys: Vec<String> = self
            .lookup()
            .dictionary(&dictionary_ref)
            .ok_or_else(|| {
                loc.substitution_error(
                    collection.as_str(),
                    format!("{:?} is not a dictionary", dictionary_ref),
                )
            })?
            .keys()
            .map(str::to_string)
            .collect();

        let stmt = ForStatement {
            input_index: self.inputs.len() - 1,
            file: loc.file.clone(),
            header_line: loc.line,
            key_name: header.key,
            value_name: header.value,
            dictionary_ref,
            keys,
            key_index: 0,
            skipped_depth: 0,
        };

        match (stmt.current_key(), stmt.bindings()) {
            (Some(key), Some(bindings)) => {
                tracing::debug!(dictionary = %stmt.dictionary_ref, iterations = stmt.keys.len(), "for loop");
                self.output.push_str(&format!(
                    "//# For loop over {}\n//# Key {} in {}\n",
                    stmt.dictionary_ref, key, stmt.dictionary_ref
                ));
                self.aliases.push_scope(bindings);
                self.add_line_number();
            }
            _ => {
                tracing::debug!(dictionary = %stmt.dictionary_ref, "empty for loop");
                self.output.push_str("//# Empty for loop\n");
                self.aliases.push_scope(Vec::new());
            }
        }

        self.for_statements.push(stmt);
        Ok(true)
    }

    fn parse_end_for(&mut self) -> crate::Result<()> {
        let loc = self.location();
        let depth = self.inputs.len() - 1;

        let Some(stmt) = self.for_statements.last_mut() else {
            return Err(loc.parse_error("unexpected #endfor, no corresponding #for was found"));
        };

        // #for and #endfor must be in the same file
        if stmt.input_index != depth {
            return Err(loc.parse_error(format!(
                "unexpected #endfor, last #for was in {} ({})",
                stmt.file, stmt.header_line
            )));
        }

        self.aliases.pop_scope();
        stmt.key_index += 1;

        let dictionary_ref = stmt.dictionary_ref.clone();
        let header_line = stmt.header_line;
        let next = stmt
            .current_key()
            .map(str::to_string)
            .zip(stmt.bindings());

        match next {
            Some((key, bindings)) => {
                tracing::trace!(dictionary = %dictionary_ref, %key, "next iteration");
                self.aliases.push_scope(bindings);
                self.output
                    .push_str(&format!("//# Key {} in {}\n", key, dictionary_ref));
                if let Some(input) = self.inputs.last_mut() {
                    input.line_number = header_line;
                }
                self.add_line_number();
            }
            None => {
                tracing::debug!(dictionary = %dictionary_ref, "for loop terminated");
                self.output
                    .push_str(&format!("//# Terminated loop over {}\n", dictionary_ref));
                self.for_statements.pop();
                self.add_line_number();
            }
        }

        Ok(())
    }
}
