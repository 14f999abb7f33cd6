use std::collections::HashMap;
use std::sync::Arc;

use crate::runtime_value::RuntimeValue;
use crate::template::Template;

/// A single scope level: the render root, a block invocation, or a macro call.
#[derive(Debug, Clone, Default)]
pub struct Scope {
    variables: HashMap<String, RuntimeValue>,
    /// Lookups stop here instead of continuing into enclosing scopes.
    isolated: bool,
}

impl Scope {
    pub fn new() -> Self {
        Scope::default()
    }

    /// A scope that only sees its own bindings, as macro bodies do.
    pub fn isolated(bindings: impl IntoIterator<Item = (String, RuntimeValue)>) -> Self {
        Scope {
            variables: bindings.into_iter().collect(),
            isolated: true,
        }
    }

    pub fn get_variable(&self, name: &str) -> Option<&RuntimeValue> {
        self.variables.get(name)
    }

    pub fn set_variable(&mut self, name: &str, value: RuntimeValue) {
        self.variables.insert(name.to_string(), value);
    }
}

/// Per-render state: a stack of variable scopes plus the inheritance chain,
/// most-derived template first. Create one per render call and never share it.
#[derive(Debug)]
pub struct Context {
    scopes: Vec<Scope>,
    inheritance_chain: Vec<Arc<Template>>,
}

impl Default for Context {
    fn default() -> Self {
        Context::new()
    }
}

impl Context {
    pub fn new() -> Self {
        Context {
            scopes: vec![Scope::new()],
            inheritance_chain: Vec::new(),
        }
    }

    /// A context whose root scope starts out with `variables`.
    pub fn with_variables<K, V>(variables: impl IntoIterator<Item = (K, V)>) -> Self
    where
        K: Into<String>,
        V: Into<RuntimeValue>,
    {
        let mut context = Context::new();
        for (name, value) in variables {
            context.set_variable(&name.into(), value.into());
        }
        context
    }

    pub fn push_inheritance_chain(&mut self, template: Arc<Template>) {
        self.inheritance_chain.push(template);
    }

    pub fn inheritance_chain(&self) -> &[Arc<Template>] {
        &self.inheritance_chain
    }

    pub fn push_scope(&mut self, scope: Scope) {
        self.scopes.push(scope);
    }

    /// The root scope is never popped.
    pub fn pop_scope(&mut self) -> Option<Scope> {
        if self.scopes.len() > 1 {
            self.scopes.pop()
        } else {
            None
        }
    }

    /// Look up a variable, searching from the innermost scope outward and
    /// stopping after the first isolated scope.
    pub fn get_variable(&self, name: &str) -> Option<&RuntimeValue> {
        for scope in self.scopes.iter().rev() {
            if let Some(value) = scope.get_variable(name) {
                return Some(value);
            }
            if scope.isolated {
                break;
            }
        }
        None
    }

    /// Bind in the innermost scope.
    pub fn set_variable(&mut self, name: &str, value: RuntimeValue) {
        if let Some(scope) = self.scopes.last_mut() {
            scope.set_variable(name, value);
        }
    }
}
