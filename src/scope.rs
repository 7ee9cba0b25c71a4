use std::collections::HashMap;

/// Loop-bound names. Each name maps to a stack of values so that an inner
/// loop can shadow an outer binding and restore it when it ends.
#[derive(Debug, Default)]
pub(crate) struct AliasTable {
    aliases: HashMap<String, Vec<String>>,
    scopes: Vec<Vec<String>>,
}

impl AliasTable {
    pub fn push_scope(&mut self, bindings: Vec<(String, String)>) {
        let mut scope = Vec::with_capacity(bindings.len());
        for (name, value) in bindings {
            self.aliases.entry(name.clone()).or_default().push(value);
            scope.push(name);
        }
        self.scopes.push(scope);
    }

    pub fn pop_scope(&mut self) {
        let scope = self
            .scopes
            .pop()
            .unwrap_or_else(|| panic!("popped a scope with none open"));

        for name in scope {
            let Some(stack) = self.aliases.get_mut(&name) else {
                panic!("no alias stack for {:?} while popping its scope", name);
            };
            assert!(stack.pop().is_some(), "empty alias stack for {:?}", name);
            if stack.is_empty() {
                self.aliases.remove(&name);
            }
        }
    }

    /// Innermost value bound to `name`.
    pub fn get(&self, name: &str) -> Option<&str> {
        self.aliases
            .get(name)
            .and_then(|stack| stack.last())
            .map(String::as_str)
    }

    pub fn open_scopes(&self) -> usize {
        self.scopes.len()
    }

    /// Substitute the part of `path` before the first dot if it is a bound name.
    pub fn resolve(&self, path: &str) -> String {
        let (head, tail) = match path.find('.') {
            Some(dot) => path.split_at(dot),
            None => (path, ""),
        };

        match self.get(head) {
            Some(bound) => format!("{}{}", bound, tail),
            None => path.to_string(),
        }
    }
}
