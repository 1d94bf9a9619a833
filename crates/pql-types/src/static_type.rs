//! Static types
//!
//! This module defines the closed set of static types and the lattice
//! operations the inference engine is built on:
//! - `union`, which flattens, deduplicates and is absorbed by `Any`
//! - numeric `widen` over the rank int2 < int4 < int8 < int < float < decimal
//! - `is_comparable`, the compatibility relation used by comparisons

use pql_ast::{CollectionKind, TypeName};
use serde::{Deserialize, Serialize};
use smallvec::{SmallVec, smallvec};
use std::collections::BTreeSet;
use std::fmt;

/// Scalar kinds
///
/// The declaration order of the numeric kinds is their widening rank.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ScalarKind {
    Int2,
    Int4,
    Int8,
    Int,
    Float,
    Decimal,
    String,
    Symbol,
    Bool,
    Timestamp,
    Blob,
    Clob,
}

impl ScalarKind {
    pub const NUMERIC: [ScalarKind; 6] = [
        ScalarKind::Int2,
        ScalarKind::Int4,
        ScalarKind::Int8,
        ScalarKind::Int,
        ScalarKind::Float,
        ScalarKind::Decimal,
    ];

    pub const fn is_numeric(&self) -> bool {
        matches!(
            self,
            Self::Int2 | Self::Int4 | Self::Int8 | Self::Int | Self::Float | Self::Decimal
        )
    }

    pub const fn is_integer(&self) -> bool {
        matches!(self, Self::Int2 | Self::Int4 | Self::Int8 | Self::Int)
    }

    pub const fn is_text(&self) -> bool {
        matches!(self, Self::String | Self::Symbol)
    }

    pub const fn is_lob(&self) -> bool {
        matches!(self, Self::Blob | Self::Clob)
    }

    pub const fn name(&self) -> &'static str {
        match self {
            Self::Int2 => "int2",
            Self::Int4 => "int4",
            Self::Int8 => "int8",
            Self::Int => "int",
            Self::Float => "float",
            Self::Decimal => "decimal",
            Self::String => "string",
            Self::Symbol => "symbol",
            Self::Bool => "bool",
            Self::Timestamp => "timestamp",
            Self::Blob => "blob",
            Self::Clob => "clob",
        }
    }
}

/// Length constraint of a string type
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum StringLength {
    /// Exactly `n` characters
    Equals(u32),
    /// At most `n` characters
    UpTo(u32),
}

impl StringLength {
    pub const fn value(&self) -> u32 {
        match self {
            Self::Equals(n) | Self::UpTo(n) => *n,
        }
    }
}

/// Constraint narrowing a scalar kind
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ScalarConstraint {
    Decimal { precision: u32, scale: u32 },
    Length(StringLength),
}

/// A scalar type with its optional constraint
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct ScalarType {
    pub kind: ScalarKind,
    pub constraint: Option<ScalarConstraint>,
}

impl ScalarType {
    pub const fn new(kind: ScalarKind) -> Self {
        Self {
            kind,
            constraint: None,
        }
    }

    /// Length constraint, for string types
    pub fn length(&self) -> Option<StringLength> {
        match self.constraint {
            Some(ScalarConstraint::Length(len)) => Some(len),
            _ => None,
        }
    }
}

/// A collection type
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct CollectionType {
    pub kind: CollectionKind,
    pub element: Box<StaticType>,
}

/// A named struct field
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct StructField {
    pub name: String,
    #[serde(rename = "type")]
    pub ty: StaticType,
}

impl StructField {
    pub fn new(name: impl Into<String>, ty: StaticType) -> Self {
        Self {
            name: name.into(),
            ty,
        }
    }
}

/// A struct type
///
/// A closed struct lists every field it can have; an open struct may carry
/// fields not listed here.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct StructType {
    pub fields: Vec<StructField>,
    pub content_closed: bool,
}

impl StructType {
    /// Look up a field type
    ///
    /// Case-insensitive lookups that match several fields yield the union of
    /// their types.
    pub fn field(&self, name: &str, case_sensitive: bool) -> Option<StaticType> {
        let matches: Vec<StaticType> = self
            .fields
            .iter()
            .filter(|f| {
                if case_sensitive {
                    f.name == name
                } else {
                    f.name.eq_ignore_ascii_case(name)
                }
            })
            .map(|f| f.ty.clone())
            .collect();
        if matches.is_empty() {
            None
        } else {
            Some(StaticType::union_of(matches))
        }
    }
}

/// A union of two or more non-union, non-`Any` types
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct UnionType {
    members: BTreeSet<StaticType>,
}

impl UnionType {
    pub fn members(&self) -> impl Iterator<Item = &StaticType> {
        self.members.iter()
    }

    pub fn len(&self) -> usize {
        self.members.len()
    }

    pub fn is_empty(&self) -> bool {
        self.members.is_empty()
    }
}

/// A static type
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum StaticType {
    /// Scalar value
    Scalar(ScalarType),
    /// List, bag or sexp
    Collection(CollectionType),
    /// Struct
    Struct(StructType),
    /// `NULL`
    Null,
    /// `MISSING`
    Missing,
    /// Top type
    #[default]
    Any,
    /// Flattened union
    Union(UnionType),
}

/// Comparison family of a non-union type
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Family {
    Numeric,
    Text,
    Lob,
    Bool,
    Timestamp,
    Collection(CollectionKind),
    Struct,
    Unknown,
    Any,
}

impl StaticType {
    // === Constructors ===

    pub const fn scalar(kind: ScalarKind) -> Self {
        Self::Scalar(ScalarType::new(kind))
    }

    pub const fn int2() -> Self {
        Self::scalar(ScalarKind::Int2)
    }

    pub const fn int4() -> Self {
        Self::scalar(ScalarKind::Int4)
    }

    pub const fn int8() -> Self {
        Self::scalar(ScalarKind::Int8)
    }

    pub const fn int() -> Self {
        Self::scalar(ScalarKind::Int)
    }

    pub const fn float() -> Self {
        Self::scalar(ScalarKind::Float)
    }

    pub const fn decimal() -> Self {
        Self::scalar(ScalarKind::Decimal)
    }

    pub const fn decimal_with(precision: u32, scale: u32) -> Self {
        Self::Scalar(ScalarType {
            kind: ScalarKind::Decimal,
            constraint: Some(ScalarConstraint::Decimal { precision, scale }),
        })
    }

    pub const fn string() -> Self {
        Self::scalar(ScalarKind::String)
    }

    pub const fn string_with(length: StringLength) -> Self {
        Self::Scalar(ScalarType {
            kind: ScalarKind::String,
            constraint: Some(ScalarConstraint::Length(length)),
        })
    }

    pub const fn symbol() -> Self {
        Self::scalar(ScalarKind::Symbol)
    }

    pub const fn bool() -> Self {
        Self::scalar(ScalarKind::Bool)
    }

    pub const fn timestamp() -> Self {
        Self::scalar(ScalarKind::Timestamp)
    }

    pub const fn blob() -> Self {
        Self::scalar(ScalarKind::Blob)
    }

    pub const fn clob() -> Self {
        Self::scalar(ScalarKind::Clob)
    }

    pub fn collection(kind: CollectionKind, element: StaticType) -> Self {
        Self::Collection(CollectionType {
            kind,
            element: Box::new(element),
        })
    }

    pub fn list(element: StaticType) -> Self {
        Self::collection(CollectionKind::List, element)
    }

    pub fn bag(element: StaticType) -> Self {
        Self::collection(CollectionKind::Bag, element)
    }

    pub fn sexp(element: StaticType) -> Self {
        Self::collection(CollectionKind::Sexp, element)
    }

    pub fn structure(fields: Vec<StructField>, content_closed: bool) -> Self {
        Self::Struct(StructType {
            fields,
            content_closed,
        })
    }

    /// Closed struct from `(name, type)` pairs
    pub fn closed_struct<N: Into<String>>(fields: impl IntoIterator<Item = (N, StaticType)>) -> Self {
        Self::structure(
            fields
                .into_iter()
                .map(|(name, ty)| StructField::new(name, ty))
                .collect(),
            true,
        )
    }

    /// Struct with no known fields
    pub fn open_struct() -> Self {
        Self::structure(Vec::new(), false)
    }

    /// Union of every numeric scalar kind
    pub fn all_numeric() -> Self {
        Self::union_of(ScalarKind::NUMERIC.iter().map(|k| Self::scalar(*k)))
    }

    /// Union of the given types
    ///
    /// Nested unions are flattened, duplicates removed, and `Any` absorbs the
    /// whole union. A single remaining member is returned as is; the empty
    /// union is `Missing`.
    pub fn union_of(types: impl IntoIterator<Item = StaticType>) -> Self {
        let mut members = BTreeSet::new();
        for ty in types {
            match ty {
                Self::Any => return Self::Any,
                Self::Union(u) => members.extend(u.members),
                other => {
                    members.insert(other);
                }
            }
        }
        match members.len() {
            0 => Self::Missing,
            1 => members.into_iter().next().unwrap_or(Self::Missing),
            _ => Self::Union(UnionType { members }),
        }
    }

    /// Union with another type
    pub fn union(&self, other: &StaticType) -> Self {
        Self::union_of([self.clone(), other.clone()])
    }

    /// Union with `Null`
    pub fn as_nullable(&self) -> Self {
        self.union(&Self::Null)
    }

    /// Union with `Missing`
    pub fn as_optional(&self) -> Self {
        self.union(&Self::Missing)
    }

    // === Inspection ===

    /// Members of a union, or the type itself
    pub fn members(&self) -> SmallVec<[&StaticType; 4]> {
        match self {
            Self::Union(u) => u.members().collect(),
            other => smallvec![other],
        }
    }

    pub fn is_any(&self) -> bool {
        matches!(self, Self::Any)
    }

    fn all_members(&self, pred: impl Fn(&StaticType) -> bool) -> bool {
        self.members().into_iter().all(pred)
    }

    fn any_member(&self, pred: impl Fn(&StaticType) -> bool) -> bool {
        self.members().into_iter().any(pred)
    }

    pub fn is_numeric(&self) -> bool {
        self.all_members(|t| matches!(t, Self::Scalar(s) if s.kind.is_numeric()))
    }

    pub fn is_text(&self) -> bool {
        self.all_members(|t| matches!(t, Self::Scalar(s) if s.kind.is_text()))
    }

    pub fn is_lob(&self) -> bool {
        self.all_members(|t| matches!(t, Self::Scalar(s) if s.kind.is_lob()))
    }

    pub fn is_bool(&self) -> bool {
        self.all_members(|t| matches!(t, Self::Scalar(s) if s.kind == ScalarKind::Bool))
    }

    /// `Null`, `Missing` or a union of only those
    pub fn is_unknown(&self) -> bool {
        self.all_members(|t| matches!(t, Self::Null | Self::Missing))
    }

    /// May evaluate to `NULL`
    pub fn is_nullable(&self) -> bool {
        self.any_member(|t| matches!(t, Self::Null))
    }

    /// May evaluate to `MISSING`
    pub fn is_optional(&self) -> bool {
        self.any_member(|t| matches!(t, Self::Missing))
    }

    /// The type without its `Null` and `Missing` members
    ///
    /// An unknown type is returned unchanged.
    pub fn without_unknowns(&self) -> Self {
        if self.is_unknown() {
            return self.clone();
        }
        Self::union_of(
            self.members()
                .into_iter()
                .filter(|t| !matches!(t, Self::Null | Self::Missing))
                .cloned(),
        )
    }

    /// Members that are neither `Null` nor `Missing`
    pub fn known_members(&self) -> SmallVec<[&StaticType; 4]> {
        self.members()
            .into_iter()
            .filter(|t| !matches!(t, Self::Null | Self::Missing))
            .collect()
    }

    /// The unknown part of the type: `Null`, `Missing`, both, or `None`
    pub fn unknown_part(&self) -> Option<StaticType> {
        match (self.is_nullable(), self.is_optional()) {
            (true, true) => Some(Self::union_of([Self::Null, Self::Missing])),
            (true, false) => Some(Self::Null),
            (false, true) => Some(Self::Missing),
            (false, false) => None,
        }
    }

    pub fn as_scalar(&self) -> Option<&ScalarType> {
        match self {
            Self::Scalar(s) => Some(s),
            _ => None,
        }
    }

    pub fn as_collection(&self) -> Option<&CollectionType> {
        match self {
            Self::Collection(c) => Some(c),
            _ => None,
        }
    }

    pub fn as_struct(&self) -> Option<&StructType> {
        match self {
            Self::Struct(s) => Some(s),
            _ => None,
        }
    }

    // === Lattice operations ===

    fn family(&self) -> Family {
        match self {
            Self::Scalar(s) if s.kind.is_numeric() => Family::Numeric,
            Self::Scalar(s) if s.kind.is_text() => Family::Text,
            Self::Scalar(s) if s.kind.is_lob() => Family::Lob,
            Self::Scalar(s) if s.kind == ScalarKind::Bool => Family::Bool,
            Self::Scalar(_) => Family::Timestamp,
            Self::Collection(c) => Family::Collection(c.kind),
            Self::Struct(_) => Family::Struct,
            Self::Null | Self::Missing => Family::Unknown,
            Self::Any | Self::Union(_) => Family::Any,
        }
    }

    /// Check whether values of both types can be compared
    ///
    /// Numeric types compare with each other, as do text and lob types; any
    /// other type, collections and structs included, only compares with an
    /// equal type. `Any` and unknown types compare with everything. For
    /// unions one comparable pair of known members is enough.
    pub fn is_comparable(&self, other: &StaticType) -> bool {
        if self.is_any() || other.is_any() || self.is_unknown() || other.is_unknown() {
            return true;
        }
        let lhs = self.known_members();
        let rhs = other.known_members();
        lhs.iter().any(|a| {
            rhs.iter().any(|b| match a.family() {
                Family::Numeric | Family::Text | Family::Lob => a.family() == b.family(),
                _ => a == b,
            })
        })
    }

    /// Check whether two types share a type family, ignoring constraints
    pub fn same_family(&self, other: &StaticType) -> bool {
        self.family() == other.family()
    }

    /// Widen two numeric types
    ///
    /// Scalars widen to the higher ranked kind; constraints survive only
    /// when both sides agree. Unions widen pairwise, and a pair without a
    /// common numeric type contributes `Missing`.
    pub fn widen(&self, other: &StaticType) -> Self {
        if self.is_any() || other.is_any() {
            return Self::Any;
        }
        let mut out: SmallVec<[StaticType; 8]> = SmallVec::new();
        for a in self.members() {
            for b in other.members() {
                out.push(match (a, b) {
                    (Self::Scalar(x), Self::Scalar(y))
                        if x.kind.is_numeric() && y.kind.is_numeric() =>
                    {
                        widen_scalar(x, y)
                    }
                    _ => Self::Missing,
                });
            }
        }
        Self::union_of(out)
    }
}

fn widen_scalar(a: &ScalarType, b: &ScalarType) -> StaticType {
    match a.kind.cmp(&b.kind) {
        std::cmp::Ordering::Greater => StaticType::Scalar(a.clone()),
        std::cmp::Ordering::Less => StaticType::Scalar(b.clone()),
        std::cmp::Ordering::Equal if a == b => StaticType::Scalar(a.clone()),
        std::cmp::Ordering::Equal => StaticType::scalar(a.kind),
    }
}

impl From<ScalarKind> for StaticType {
    fn from(kind: ScalarKind) -> Self {
        Self::scalar(kind)
    }
}

impl From<&TypeName> for StaticType {
    fn from(name: &TypeName) -> Self {
        match name {
            TypeName::Null => Self::Null,
            TypeName::Missing => Self::Missing,
            TypeName::Any => Self::Any,
            TypeName::Boolean => Self::bool(),
            TypeName::SmallInt => Self::int2(),
            TypeName::Integer4 => Self::int4(),
            TypeName::Integer8 => Self::int8(),
            TypeName::Integer => Self::int(),
            TypeName::Float | TypeName::Real | TypeName::DoublePrecision => Self::float(),
            TypeName::Decimal {
                precision: Some(p),
                scale,
            } => Self::decimal_with(*p, scale.unwrap_or(0)),
            TypeName::Decimal { precision: None, .. } => Self::decimal(),
            TypeName::Character { length } => {
                Self::string_with(StringLength::Equals(length.unwrap_or(1)))
            }
            TypeName::CharacterVarying { length: Some(n) } => {
                Self::string_with(StringLength::UpTo(*n))
            }
            TypeName::CharacterVarying { length: None } | TypeName::String => Self::string(),
            TypeName::Symbol => Self::symbol(),
            TypeName::Timestamp => Self::timestamp(),
            TypeName::Blob => Self::blob(),
            TypeName::Clob => Self::clob(),
            TypeName::Struct | TypeName::Tuple => Self::open_struct(),
            TypeName::List => Self::list(Self::Any),
            TypeName::Bag => Self::bag(Self::Any),
            TypeName::Sexp => Self::sexp(Self::Any),
        }
    }
}

impl fmt::Display for ScalarType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.kind.name())?;
        match self.constraint {
            Some(ScalarConstraint::Decimal { precision, scale }) => {
                write!(f, "({precision},{scale})")
            }
            Some(ScalarConstraint::Length(StringLength::Equals(n))) => write!(f, "(={n})"),
            Some(ScalarConstraint::Length(StringLength::UpTo(n))) => write!(f, "(<={n})"),
            None => Ok(()),
        }
    }
}

impl fmt::Display for StaticType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Scalar(s) => write!(f, "{s}"),
            Self::Collection(c) => write!(f, "{}({})", c.kind.name(), c.element),
            Self::Struct(s) => {
                f.write_str("struct(")?;
                for field in &s.fields {
                    write!(f, "{}: {}, ", field.name, field.ty)?;
                }
                f.write_str(if s.content_closed { "closed)" } else { "open)" })
            }
            Self::Null => f.write_str("null"),
            Self::Missing => f.write_str("missing"),
            Self::Any => f.write_str("any"),
            Self::Union(u) => {
                f.write_str("union(")?;
                for (i, member) in u.members().enumerate() {
                    if i > 0 {
                        f.write_str(", ")?;
                    }
                    write!(f, "{member}")?;
                }
                f.write_str(")")
            }
        }
    }
}
