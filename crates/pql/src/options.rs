//! Analyzer configuration

use pql_diagnostics::{Result, SemanticError};
use pql_types::{
    BindingEnvironment, FunctionRegistry, FunctionSignature, InferenceOptions, ScopeConstraint,
    StaticType,
};
use serde::{Deserialize, Serialize};

/// Configuration of a [`StaticAnalyzer`](crate::StaticAnalyzer)
///
/// Missing JSON fields take their defaults.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SemanticOptions {
    /// Restrictions on global variable access
    pub constraints: Vec<ScopeConstraint>,
    /// Signatures added to the registry; a custom signature replaces a
    /// built-in of the same name
    pub custom_functions: Vec<FunctionSignature>,
    /// Whether the built-in functions are available
    pub include_builtins: bool,
    /// Global variables and their types
    pub globals: BindingEnvironment,
}

impl Default for SemanticOptions {
    fn default() -> Self {
        Self {
            constraints: Vec::new(),
            custom_functions: Vec::new(),
            include_builtins: true,
            globals: BindingEnvironment::new(),
        }
    }
}

impl SemanticOptions {
    pub fn new() -> Self {
        Self::default()
    }

    /// Load options from JSON
    pub fn from_json(json: &str) -> Result<Self> {
        serde_json::from_str(json).map_err(|e| SemanticError::Configuration {
            message: e.to_string(),
        })
    }

    pub fn with_constraint(mut self, constraint: ScopeConstraint) -> Self {
        if !self.constraints.contains(&constraint) {
            self.constraints.push(constraint);
        }
        self
    }

    pub fn with_function(mut self, signature: FunctionSignature) -> Self {
        self.custom_functions.push(signature);
        self
    }

    pub fn with_global(mut self, name: impl Into<String>, ty: StaticType) -> Self {
        self.globals = self.globals.with(name, ty);
        self
    }

    pub fn without_builtins(mut self) -> Self {
        self.include_builtins = false;
        self
    }

    /// Build the function registry
    pub fn function_registry(&self) -> FunctionRegistry {
        let mut registry = if self.include_builtins {
            FunctionRegistry::builtins()
        } else {
            FunctionRegistry::empty()
        };
        for signature in &self.custom_functions {
            registry.register(signature.clone());
        }
        registry
    }

    /// The slice of configuration used by scope resolution
    pub fn inference_options(&self) -> InferenceOptions {
        self.constraints
            .iter()
            .fold(InferenceOptions::new(), |options, c| options.with_constraint(*c))
    }
}
