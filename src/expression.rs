//! Range expressions and size-bounded partitioning.
//!
//! The range server only answers GET requests, so an expression has to fit in
//! a URL. Expressions that don't are cut at comma boundaries into chunks that
//! each fit within the endpoint's character limit.

use serde::Serialize;
use std::fmt;
use tracing::{debug, trace};

/// Separator between the atoms of an expression
pub const ATOM_SEPARATOR: &str = ",";

/// Length of `expr` as counted against an endpoint's limit, in characters
pub fn char_len(expr: &str) -> usize {
    expr.chars().count()
}

/// A range expression as handed to the client.
///
/// Callers may pass either a single expression string or a list of
/// expressions; a list is always treated as its comma-joined form.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Expression {
    Literal(String),
    Atoms(Vec<String>),
}

impl Expression {
    /// Canonical single-string form of the expression
    pub fn normalize(&self) -> String {
        match self {
            Expression::Literal(expr) => expr.clone(),
            Expression::Atoms(atoms) => atoms.join(ATOM_SEPARATOR),
        }
    }

    /// Atoms in the order the partitioner packs them.
    ///
    /// A literal is split on commas and sorted so chunk membership only
    /// depends on the atom set. An explicit atom list keeps its order.
    pub fn atoms(&self) -> Vec<String> {
        match self {
            Expression::Literal(expr) => {
                let mut atoms: Vec<String> = expr.split(ATOM_SEPARATOR).map(String::from).collect();
                atoms.sort();
                atoms
            }
            Expression::Atoms(atoms) => atoms.clone(),
        }
    }
}

impl fmt::Display for Expression {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.normalize())
    }
}

impl From<&str> for Expression {
    fn from(expr: &str) -> Self {
        Expression::Literal(expr.to_string())
    }
}

impl From<String> for Expression {
    fn from(expr: String) -> Self {
        Expression::Literal(expr)
    }
}

impl From<&String> for Expression {
    fn from(expr: &String) -> Self {
        Expression::Literal(expr.clone())
    }
}

impl From<Vec<String>> for Expression {
    fn from(atoms: Vec<String>) -> Self {
        Expression::Atoms(atoms)
    }
}

impl From<Vec<&str>> for Expression {
    fn from(atoms: Vec<&str>) -> Self {
        Expression::Atoms(atoms.into_iter().map(String::from).collect())
    }
}

impl From<&[&str]> for Expression {
    fn from(atoms: &[&str]) -> Self {
        Expression::Atoms(atoms.iter().map(|s| s.to_string()).collect())
    }
}

/// Ordered chunks of atoms, each small enough for a single request.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct SplitBatch {
    chunks: Vec<Vec<String>>,
}

impl SplitBatch {
    pub fn chunks(&self) -> &[Vec<String>] {
        &self.chunks
    }

    pub fn len(&self) -> usize {
        self.chunks.len()
    }

    pub fn is_empty(&self) -> bool {
        self.chunks.is_empty()
    }

    /// Each chunk serialized back into an expression string
    pub fn joined(&self) -> Vec<String> {
        self.chunks.iter().map(|chunk| chunk.join(ATOM_SEPARATOR)).collect()
    }

    pub fn into_chunks(self) -> Vec<Vec<String>> {
        self.chunks
    }
}

impl IntoIterator for SplitBatch {
    type Item = Vec<String>;
    type IntoIter = std::vec::IntoIter<Vec<String>>;

    fn into_iter(self) -> Self::IntoIter {
        self.chunks.into_iter()
    }
}

/// Greedily packs the atoms of `expr` into chunks of at most `max_chars`.
///
/// Every atom costs its length plus one for the separator. When the next atom
/// would push the running total over the limit the current chunk is closed
/// and the atom opens a new one. An atom longer than the limit ends up alone
/// in its own chunk; atoms are never dropped or cut.
pub fn partition(expr: &Expression, max_chars: usize) -> SplitBatch {
    let atoms = expr.atoms();
    trace!("Partitioning {} atoms with max_chars={}", atoms.len(), max_chars);

    let mut chunks = Vec::new();
    let mut current: Vec<String> = Vec::new();
    let mut running_total = 0;

    for atom in atoms {
        let cost = char_len(&atom) + 1;
        if running_total + cost > max_chars && !current.is_empty() {
            chunks.push(std::mem::take(&mut current));
            running_total = 0;
        }
        if cost > max_chars {
            debug!("Atom of {} chars exceeds limit of {}, sending it alone", cost - 1, max_chars);
        }
        running_total += cost;
        current.push(atom);
    }
    if !current.is_empty() {
        chunks.push(current);
    }

    debug!("Partitioned expression into {} chunks", chunks.len());
    SplitBatch { chunks }
}
