//! Abstract value domain for values living on the component stack.
//!
//! The processor does not define how values compare or render — it only
//! requires a total order, an equality, and 1-based indexed access into the
//! compound variants. See §4.B.

use serde::{Deserialize, Serialize};
use std::cmp::Ordering;
use std::collections::BTreeMap;
use std::fmt;

/// A reference/citation into the external document repository: a tag,
/// version, and optional content digest. A digest of `None` denotes a draft
/// (mutable, not yet committed); `Some` denotes an immutable committed
/// document.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct Reference {
    /// Opaque document tag.
    pub tag: String,
    /// Document version string, e.g. `"v1.2"`.
    pub version: String,
    /// Content digest of the committed document, absent for drafts.
    pub digest: Option<String>,
}

impl Reference {
    /// Construct a draft reference (no digest).
    pub fn draft(tag: impl Into<String>, version: impl Into<String>) -> Self {
        Self {
            tag: tag.into(),
            version: version.into(),
            digest: None,
        }
    }

    /// Construct a committed reference.
    pub fn committed(tag: impl Into<String>, version: impl Into<String>, digest: impl Into<String>) -> Self {
        Self {
            tag: tag.into(),
            version: version.into(),
            digest: Some(digest.into()),
        }
    }

    /// `true` if this reference names a draft rather than a committed
    /// document.
    pub fn is_draft(&self) -> bool {
        self.digest.is_none()
    }
}

impl fmt::Display for Reference {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.digest {
            Some(d) => write!(f, "<bali:/{}/{}#{}>", self.tag, self.version, d),
            None => write!(f, "<bali:/{}/{}>", self.tag, self.version),
        }
    }
}

/// The three distinguished singleton templates.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum Template {
    /// The absence of a meaningful value.
    None,
    /// The boolean truth value.
    True,
    /// The boolean falsity value.
    False,
}

impl fmt::Display for Template {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::None => f.write_str("none"),
            Self::True => f.write_str("true"),
            Self::False => f.write_str("false"),
        }
    }
}

/// An already-parsed procedure body, carried as a value so it can be pushed
/// by `PUSH CODE` and later consumed by the compiler/assembler collaborator.
/// Opaque to the processor beyond equality and ordering.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct Code(pub String);

/// The abstract value domain. Primitives, compounds, and code, per §3/§4.B.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum Value {
    /// A numeric literal. Carried as its source text plus a parsed `f64` for
    /// ordering; the source text is preserved so export round-trips exactly.
    Number {
        /// Original literal text, e.g. `"2i"` or `"1/3"`.
        text: String,
        /// Parsed magnitude used for ordering and equality.
        magnitude: f64,
    },
    /// A named symbol, e.g. `$hello`.
    Symbol(String),
    /// One of the three singleton templates.
    Template(Template),
    /// A probability in `[0, 1]`.
    Probability(f64),
    /// A citation into the document repository.
    Reference(Reference),
    /// An opaque type tag.
    Tag(String),
    /// An ordered, 1-based indexed list of values.
    List(Vec<Value>),
    /// An ordered association of symbol keys to values, 1-based indexed.
    Catalog(Vec<(String, Value)>),
    /// A parsed procedure body.
    Code(Code),
}

impl Value {
    /// The `NONE` template value.
    pub const fn none() -> Self {
        Self::Template(Template::None)
    }

    /// The `TRUE` template value.
    pub const fn truthy() -> Self {
        Self::Template(Template::True)
    }

    /// The `FALSE` template value.
    pub const fn falsy() -> Self {
        Self::Template(Template::False)
    }

    /// Construct a symbol value.
    pub fn symbol(name: impl Into<String>) -> Self {
        Self::Symbol(name.into())
    }

    /// Parse a number from its literal source text.
    pub fn number_from_literal(text: impl Into<String>) -> Self {
        let text = text.into();
        let magnitude = text.parse::<f64>().unwrap_or(f64::NAN);
        Self::Number { text, magnitude }
    }

    /// `true` if this value is one of the three distinguished templates.
    pub fn matches_template(&self, template: Template) -> bool {
        matches!(self, Self::Template(t) if *t == template)
    }

    /// 1-based indexed access into a [`Value::List`]. Returns `None` if this
    /// value is not a list or the index is out of range.
    pub fn get_indexed(&self, index: usize) -> Option<&Value> {
        match self {
            Self::List(items) if index >= 1 => items.get(index - 1),
            _ => None,
        }
    }

    /// Keyed access into a [`Value::Catalog`]. Returns `None` if this value
    /// is not a catalog or the key is absent.
    pub fn get_keyed(&self, key: &str) -> Option<&Value> {
        match self {
            Self::Catalog(entries) => entries.iter().find(|(k, _)| k == key).map(|(_, v)| v),
            _ => None,
        }
    }

    /// Structural equality, per §4.B's `equalTo`.
    pub fn equal_to(&self, other: &Value) -> bool {
        self.cmp_to(other) == Ordering::Equal
    }

    /// Total order over the value domain, per §4.B's `cmp`. Cross-variant
    /// comparisons order by a fixed variant rank so that `cmp` is total even
    /// between incomparable kinds.
    pub fn cmp_to(&self, other: &Value) -> Ordering {
        fn rank(v: &Value) -> u8 {
            match v {
                Value::Number { .. } => 0,
                Value::Symbol(_) => 1,
                Value::Template(_) => 2,
                Value::Probability(_) => 3,
                Value::Reference(_) => 4,
                Value::Tag(_) => 5,
                Value::List(_) => 6,
                Value::Catalog(_) => 7,
                Value::Code(_) => 8,
            }
        }
        match (self, other) {
            (Value::Number { magnitude: a, .. }, Value::Number { magnitude: b, .. }) => {
                a.partial_cmp(b).unwrap_or(Ordering::Equal)
            }
            (Value::Symbol(a), Value::Symbol(b)) => a.cmp(b),
            (Value::Template(a), Value::Template(b)) => (*a as u8).cmp(&(*b as u8)),
            (Value::Probability(a), Value::Probability(b)) => a.partial_cmp(b).unwrap_or(Ordering::Equal),
            (Value::Reference(a), Value::Reference(b)) => a.cmp(b),
            (Value::Tag(a), Value::Tag(b)) => a.cmp(b),
            (Value::List(a), Value::List(b)) => a
                .iter()
                .zip(b.iter())
                .find_map(|(x, y)| {
                    let ord = x.cmp_to(y);
                    (ord != Ordering::Equal).then_some(ord)
                })
                .unwrap_or_else(|| a.len().cmp(&b.len())),
            (Value::Catalog(a), Value::Catalog(b)) => a.len().cmp(&b.len()).then_with(|| {
                a.iter().zip(b.iter()).find_map(|((ka, va), (kb, vb))| {
                    let ord = ka.cmp(kb).then_with(|| va.cmp_to(vb));
                    (ord != Ordering::Equal).then_some(ord)
                }).unwrap_or(Ordering::Equal)
            }),
            (Value::Code(a), Value::Code(b)) => a.cmp(b),
            _ => rank(self).cmp(&rank(other)),
        }
    }
}

impl Eq for Value {}

impl PartialOrd for Value {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp_to(other))
    }
}

impl Ord for Value {
    fn cmp(&self, other: &Self) -> Ordering {
        self.cmp_to(other)
    }
}

impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Number { text, .. } => f.write_str(text),
            Self::Symbol(s) => write!(f, "${s}"),
            Self::Template(t) => write!(f, "{t}"),
            Self::Probability(p) => write!(f, "{p}"),
            Self::Reference(r) => write!(f, "{r}"),
            Self::Tag(t) => write!(f, "#{t}"),
            Self::List(items) => {
                write!(f, "[")?;
                for (i, v) in items.iter().enumerate() {
                    if i > 0 {
                        write!(f, ", ")?;
                    }
                    write!(f, "{v}")?;
                }
                write!(f, "]")
            }
            Self::Catalog(entries) => {
                write!(f, "[")?;
                for (i, (k, v)) in entries.iter().enumerate() {
                    if i > 0 {
                        write!(f, ", ")?;
                    }
                    write!(f, "{k}: {v}")?;
                }
                write!(f, "]")
            }
            Self::Code(c) => write!(f, "{{{}}}", c.0),
        }
    }
}

/// An ordered set of values, reimplemented here as a sorted `Vec` with
/// binary-search membership and rank. The distilled spec's treap is a
/// supporting utility off the VM's critical path; this crate only needs the
/// properties it exposes to the VM (`O(log n)` membership and index-of,
/// ordered iteration), which a sorted vector already provides without a
/// hand-rolled balanced tree. See DESIGN.md for the full rationale.
#[derive(Debug, Clone, Default)]
pub struct OrderedSet {
    items: Vec<Value>,
}

impl OrderedSet {
    /// An empty ordered set.
    pub fn new() -> Self {
        Self { items: Vec::new() }
    }

    /// Number of elements.
    pub fn len(&self) -> usize {
        self.items.len()
    }

    /// `true` if this set has no elements.
    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    /// Insert a value, maintaining sort order. Returns `false` if an equal
    /// value was already present (a no-op in that case).
    pub fn insert(&mut self, value: Value) -> bool {
        match self.items.binary_search_by(|probe| probe.cmp_to(&value)) {
            Ok(_) => false,
            Err(at) => {
                self.items.insert(at, value);
                true
            }
        }
    }

    /// Remove a value equal to the given one, if present.
    pub fn remove(&mut self, value: &Value) -> bool {
        match self.items.binary_search_by(|probe| probe.cmp_to(value)) {
            Ok(at) => {
                self.items.remove(at);
                true
            }
            Err(_) => false,
        }
    }

    /// `O(log n)` membership test.
    pub fn contains(&self, value: &Value) -> bool {
        self.items.binary_search_by(|probe| probe.cmp_to(value)).is_ok()
    }

    /// `O(log n)` rank of a value: the number of elements strictly less than
    /// it, i.e. the index it would occupy (or does occupy) in sorted order.
    pub fn index_of(&self, value: &Value) -> usize {
        match self.items.binary_search_by(|probe| probe.cmp_to(value)) {
            Ok(at) | Err(at) => at,
        }
    }

    /// Ordered iteration over the set's elements.
    pub fn iter(&self) -> impl Iterator<Item = &Value> {
        self.items.iter()
    }
}

/// Helper for constructing a [`Value::Catalog`] from JSON-like literal pairs
/// in tests and document decoding.
pub fn catalog_from_map(map: BTreeMap<String, Value>) -> Value {
    Value::Catalog(map.into_iter().collect())
}
