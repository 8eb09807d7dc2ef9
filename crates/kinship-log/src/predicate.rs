//! Typed equality predicates over event payloads.
//!
//! A [`Predicate`] is a set of `path = literal` clauses. Paths are dotted
//! (`clonedFrom.personId`) and address nested object fields. A clause
//! matches only when the field exists and holds the literal; absent fields
//! never match, and numbers compare by value (`1.0` matches `1`).
//!
//! The same predicate is evaluated in two places: directly against JSON by
//! the in-memory log ([`Predicate::matches`]), and by `PostgreSQL` through a
//! single JSONB containment document bound as a query parameter
//! ([`Predicate::to_containment`]). Literals never reach SQL text.

use std::collections::BTreeMap;

use serde_json::{Map, Value};
use uuid::Uuid;

use kinship_types::{EventId, FaceId, FamilyId, PersonId, PhotoId, ThreadId, UserId};

/// A scalar value a payload field is compared against.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum Literal {
    /// A JSON string (IDs are stored as strings).
    Text(String),
    /// A JSON integer.
    Integer(i64),
    /// A JSON boolean.
    Bool(bool),
}

impl Literal {
    /// The literal as a JSON value.
    pub fn to_json(&self) -> Value {
        match self {
            Self::Text(s) => Value::String(s.clone()),
            Self::Integer(n) => Value::from(*n),
            Self::Bool(b) => Value::Bool(*b),
        }
    }

    /// Equality against a JSON value. Numbers compare by value, so `1.0`
    /// equals `1` as it does in a JSONB comparison.
    fn equals(&self, value: &Value) -> bool {
        match (self, value) {
            (Self::Text(s), Value::String(v)) => s == v,
            (Self::Integer(n), Value::Number(v)) => v.as_i64().map_or_else(
                || v.as_f64().is_some_and(|f| f.to_string() == n.to_string()),
                |i| i == *n,
            ),
            (Self::Bool(b), Value::Bool(v)) => b == v,
            _ => false,
        }
    }
}

impl From<&str> for Literal {
    fn from(value: &str) -> Self {
        Self::Text(value.to_owned())
    }
}

impl From<String> for Literal {
    fn from(value: String) -> Self {
        Self::Text(value)
    }
}

impl From<i64> for Literal {
    fn from(value: i64) -> Self {
        Self::Integer(value)
    }
}

impl From<bool> for Literal {
    fn from(value: bool) -> Self {
        Self::Bool(value)
    }
}

impl From<Uuid> for Literal {
    fn from(value: Uuid) -> Self {
        Self::Text(value.to_string())
    }
}

/// IDs compare as their string form, which is how payloads store them.
macro_rules! literal_from_id {
    ($($id:ty),* $(,)?) => {
        $(
            impl From<$id> for Literal {
                fn from(value: $id) -> Self {
                    Self::Text(value.to_string())
                }
            }
        )*
    };
}

literal_from_id!(PersonId, PhotoId, ThreadId, FamilyId, UserId, FaceId, EventId);

/// A dotted path into a payload object.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct JsonPath(Vec<String>);

impl JsonPath {
    /// Split a dotted path into its segments.
    ///
    /// Segments are taken verbatim; an empty segment names the key `""`,
    /// which payloads never contain, so such a clause never matches.
    pub fn parse(path: &str) -> Self {
        Self(path.split('.').map(str::to_owned).collect())
    }

    /// The path segments, outermost first.
    pub fn segments(&self) -> &[String] {
        &self.0
    }

    /// Look the path up inside `value`.
    pub fn resolve<'v>(&self, value: &'v Value) -> Option<&'v Value> {
        self.0
            .iter()
            .try_fold(value, |current, segment| current.as_object()?.get(segment))
    }
}

impl core::fmt::Display for JsonPath {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.write_str(&self.0.join("."))
    }
}

/// A conjunction of payload equality clauses.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Predicate {
    clauses: BTreeMap<JsonPath, Literal>,
}

impl Predicate {
    /// A predicate that matches every payload.
    pub const fn new() -> Self {
        Self {
            clauses: BTreeMap::new(),
        }
    }

    /// Add the clause `path = value`. A later clause on the same path
    /// replaces the earlier one.
    #[must_use]
    pub fn eq(mut self, path: &str, value: impl Into<Literal>) -> Self {
        self.clauses.insert(JsonPath::parse(path), value.into());
        self
    }

    /// Whether the predicate has no clauses.
    pub fn is_empty(&self) -> bool {
        self.clauses.is_empty()
    }

    /// Iterate over the clauses in path order.
    pub fn clauses(&self) -> impl Iterator<Item = (&JsonPath, &Literal)> {
        self.clauses.iter()
    }

    /// Whether `payload` satisfies every clause.
    pub fn matches(&self, payload: &Value) -> bool {
        self.clauses
            .iter()
            .all(|(path, literal)| path.resolve(payload).is_some_and(|v| literal.equals(v)))
    }

    /// Build the JSONB document `d` such that `payload @> d` holds exactly
    /// when the predicate matches.
    ///
    /// Returns `None` when two clauses are contradictory (one path is a
    /// prefix of another), in which case nothing can match.
    pub fn to_containment(&self) -> Option<Value> {
        let mut root = Map::new();
        for (path, literal) in &self.clauses {
            let (last, parents) = path.segments().split_last()?;
            let mut node = &mut root;
            for segment in parents {
                let child = node
                    .entry(segment.clone())
                    .or_insert_with(|| Value::Object(Map::new()));
                node = child.as_object_mut()?;
            }
            if node.contains_key(last) {
                return None;
            }
            node.insert(last.clone(), literal.to_json());
        }
        Some(Value::Object(root))
    }
}
