//! Global symbols: the binding environment and function signatures

use indexmap::IndexMap;
use pql_ast::{CollectionKind, Identifier};
use serde::{Deserialize, Serialize};

use crate::{ArityRange, StaticType};

/// Immutable catalog of global variables and their types
///
/// Lookups of unquoted identifiers ignore case; quoted identifiers must match
/// exactly.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct BindingEnvironment {
    globals: IndexMap<String, StaticType>,
}

/// Outcome of a global lookup
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum GlobalLookup<'a> {
    Found(&'a str, &'a StaticType),
    NotFound,
    /// Several globals match a case-insensitive lookup
    Ambiguous,
}

impl BindingEnvironment {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a global
    pub fn with(mut self, name: impl Into<String>, ty: StaticType) -> Self {
        self.globals.insert(name.into(), ty);
        self
    }

    pub fn lookup(&self, name: &Identifier) -> GlobalLookup<'_> {
        let mut found = self.globals.iter().filter(|(global, _)| name.matches(global));
        match (found.next(), found.next()) {
            (Some((global, ty)), None) => GlobalLookup::Found(global, ty),
            (None, _) => GlobalLookup::NotFound,
            (Some(_), Some(_)) => GlobalLookup::Ambiguous,
        }
    }

    pub fn len(&self) -> usize {
        self.globals.len()
    }

    pub fn is_empty(&self) -> bool {
        self.globals.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&String, &StaticType)> {
        self.globals.iter()
    }
}

impl<N: Into<String>> FromIterator<(N, StaticType)> for BindingEnvironment {
    fn from_iter<I: IntoIterator<Item = (N, StaticType)>>(iter: I) -> Self {
        Self {
            globals: iter.into_iter().map(|(n, t)| (n.into(), t)).collect(),
        }
    }
}

/// Repeated trailing parameter of a function
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct VariadicParam {
    #[serde(rename = "type")]
    pub ty: StaticType,
    pub min_occurs: usize,
}

/// Function signature
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FunctionSignature {
    /// Function name, matched case-insensitively
    pub name: String,
    #[serde(default)]
    pub required_params: Vec<StaticType>,
    #[serde(default)]
    pub optional_params: Vec<StaticType>,
    #[serde(default)]
    pub variadic_param: Option<VariadicParam>,
    pub return_type: StaticType,
}

impl FunctionSignature {
    /// Create a signature without parameters
    pub fn new(name: impl Into<String>, return_type: StaticType) -> Self {
        Self {
            name: name.into(),
            required_params: Vec::new(),
            optional_params: Vec::new(),
            variadic_param: None,
            return_type,
        }
    }

    /// Add a required parameter
    pub fn required(mut self, ty: StaticType) -> Self {
        self.required_params.push(ty);
        self
    }

    /// Add an optional parameter
    pub fn optional(mut self, ty: StaticType) -> Self {
        self.optional_params.push(ty);
        self
    }

    /// Set the variadic parameter
    pub fn variadic(mut self, ty: StaticType, min_occurs: usize) -> Self {
        self.variadic_param = Some(VariadicParam { ty, min_occurs });
        self
    }

    /// Accepted argument counts
    pub fn arity(&self) -> ArityRange {
        let required = self.required_params.len();
        match &self.variadic_param {
            Some(variadic) => ArityRange {
                min: required + variadic.min_occurs,
                max: None,
            },
            None => ArityRange {
                min: required,
                max: Some(required + self.optional_params.len()),
            },
        }
    }

    /// Declared type of the `index`-th argument
    pub fn param_type(&self, index: usize) -> Option<&StaticType> {
        let required = self.required_params.len();
        if index < required {
            return self.required_params.get(index);
        }
        if let Some(optional) = self.optional_params.get(index - required) {
            return Some(optional);
        }
        self.variadic_param.as_ref().map(|v| &v.ty)
    }
}

/// Check whether a parameter type accepts a (non-union) argument type
///
/// Integer parameters take any integer kind, numeric, text and lob
/// parameters take any member of their family, and collections must agree
/// on their kind.
pub fn accepts(param: &StaticType, arg: &StaticType) -> bool {
    match (param, arg) {
        (StaticType::Any, _) | (_, StaticType::Any) => true,
        (StaticType::Union(_), _) => param.members().iter().any(|p| accepts(p, arg)),
        (StaticType::Scalar(p), StaticType::Scalar(a)) => {
            if p.kind.is_integer() {
                a.kind.is_integer()
            } else if p.kind.is_numeric() {
                a.kind.is_numeric()
            } else if p.kind.is_text() {
                a.kind.is_text()
            } else if p.kind.is_lob() {
                a.kind.is_lob()
            } else {
                p.kind == a.kind
            }
        }
        (StaticType::Collection(p), StaticType::Collection(a)) => {
            p.kind == a.kind && accepts(&p.element, &a.element)
        }
        (StaticType::Struct(_), StaticType::Struct(_)) => true,
        _ => false,
    }
}

/// Function signatures available to a type checking run
#[derive(Debug, Clone, Default, PartialEq)]
pub struct FunctionRegistry {
    functions: IndexMap<String, FunctionSignature>,
}

impl FunctionRegistry {
    /// Registry without any function
    pub fn empty() -> Self {
        Self::default()
    }

    /// Registry holding the built-in functions
    pub fn builtins() -> Self {
        let any_collection = StaticType::union_of(
            [CollectionKind::List, CollectionKind::Bag, CollectionKind::Sexp]
                .into_iter()
                .map(|k| StaticType::collection(k, StaticType::Any)),
        );

        let mut registry = Self::empty();
        for signature in [
            FunctionSignature::new("upper", StaticType::string()).required(StaticType::string()),
            FunctionSignature::new("lower", StaticType::string()).required(StaticType::string()),
            FunctionSignature::new("char_length", StaticType::int8())
                .required(StaticType::string()),
            FunctionSignature::new("character_length", StaticType::int8())
                .required(StaticType::string()),
            FunctionSignature::new("substring", StaticType::string())
                .required(StaticType::string())
                .required(StaticType::int())
                .optional(StaticType::int()),
            FunctionSignature::new("trim", StaticType::string()).required(StaticType::string()),
            FunctionSignature::new("exists", StaticType::bool()).required(StaticType::Any),
            FunctionSignature::new("size", StaticType::int8()).required(any_collection),
            FunctionSignature::new("abs", StaticType::all_numeric())
                .required(StaticType::all_numeric()),
            FunctionSignature::new("utcnow", StaticType::timestamp()),
            FunctionSignature::new("to_string", StaticType::string())
                .required(StaticType::timestamp())
                .required(StaticType::string()),
            FunctionSignature::new("concat", StaticType::string())
                .required(StaticType::string())
                .variadic(StaticType::string(), 1),
        ] {
            registry.register(signature);
        }
        registry
    }

    /// Add a signature, replacing any signature with the same name
    pub fn register(&mut self, signature: FunctionSignature) {
        self.functions
            .insert(signature.name.to_ascii_lowercase(), signature);
    }

    pub fn get(&self, name: &str) -> Option<&FunctionSignature> {
        self.functions.get(&name.to_ascii_lowercase())
    }

    pub fn len(&self) -> usize {
        self.functions.len()
    }

    pub fn is_empty(&self) -> bool {
        self.functions.is_empty()
    }

    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.functions.values().map(|s| s.name.as_str())
    }
}
