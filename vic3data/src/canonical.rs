//! Normalizes loosely-shaped script blocks into a fixed per-record shape.
//!
//! The same logical field can show up as a bare scalar, a braced list, a repeated
//! key, or not at all. Record constructors describe which keys are lists and which
//! are repeatable blocks with a [`Shape`]; [`canonicalize`] then resolves every key
//! once so the domain code never has to look at the raw layout again.

use vic3txt::{Scalar, Tree, Value};

/// Which keys of a record are repeatable, and how.
#[derive(Debug, Clone, Copy, Default)]
pub struct Shape {
    /// Keys holding a sequence of scalars: `{ a b }`, a bare `a`, or `k = a k = b`.
    pub lists: &'static [&'static str],
    /// Keys holding a sequence of blocks: `k = { .. } k = { .. }`.
    pub records: &'static [&'static str],
}

#[derive(Debug, Clone)]
enum Field<'a> {
    Scalar(&'a Scalar),
    Block(&'a Tree),
    List(Vec<&'a Scalar>),
    Records(Vec<&'a Tree>),
}

/// A record whose fields have been resolved against a [`Shape`].
#[derive(Debug, Clone, Default)]
pub struct Canonical<'a> {
    fields: Vec<(&'a str, Field<'a>)>,
}

/// Resolves every key of `tree` once.
///
/// List keys accumulate scalars across repeats, flattening braced lists. Record keys
/// accumulate blocks; a scalar under a record key is dropped. Other keys keep their
/// last value. Keys are reported in first-seen order.
pub fn canonicalize<'a>(tree: &'a Tree, shape: &Shape) -> Canonical<'a> {
    let mut canon = Canonical::default();
    for (key, value) in tree.pairs() {
        if shape.lists.contains(&key) {
            let list = canon.list_slot(key);
            match value {
                Value::Scalar(s) => list.push(s),
                Value::Block(block) => list.extend(block.items()),
            }
        } else if shape.records.contains(&key) {
            let records = canon.records_slot(key);
            if let Value::Block(block) = value {
                records.push(block);
            }
        } else {
            let field = match value {
                Value::Scalar(s) => Field::Scalar(s),
                Value::Block(b) => Field::Block(b),
            };
            match canon.fields.iter_mut().find(|(k, _)| *k == key) {
                Some(slot) => slot.1 = field,
                None => canon.fields.push((key, field)),
            }
        }
    }
    canon
}

impl<'a> Canonical<'a> {
    fn slot(&mut self, key: &'a str, make: impl FnOnce() -> Field<'a>) -> &mut Field<'a> {
        let i = match self.fields.iter().position(|(k, _)| *k == key) {
            Some(i) => i,
            None => {
                self.fields.push((key, make()));
                self.fields.len() - 1
            }
        };
        &mut self.fields[i].1
    }

    fn list_slot(&mut self, key: &'a str) -> &mut Vec<&'a Scalar> {
        match self.slot(key, || Field::List(Vec::new())) {
            Field::List(list) => list,
            _ => unreachable!("list keys only ever hold lists"),
        }
    }

    fn records_slot(&mut self, key: &'a str) -> &mut Vec<&'a Tree> {
        match self.slot(key, || Field::Records(Vec::new())) {
            Field::Records(records) => records,
            _ => unreachable!("record keys only ever hold records"),
        }
    }

    fn field(&self, key: &str) -> Option<&Field<'a>> {
        self.fields.iter().find(|(k, _)| *k == key).map(|(_, f)| f)
    }

    pub fn has(&self, key: &str) -> bool {
        self.field(key).is_some()
    }

    /// Keys in first-seen order.
    pub fn keys(&self) -> impl Iterator<Item = &'a str> + '_ {
        self.fields.iter().map(|(k, _)| *k)
    }

    /// The scalars of a list key; empty when absent.
    pub fn list(&self, key: &str) -> Vec<Scalar> {
        match self.field(key) {
            Some(Field::List(list)) => list.iter().map(|s| (*s).clone()).collect(),
            _ => Vec::new(),
        }
    }

    /// The blocks of a record key; empty when absent.
    pub fn records(&self, key: &str) -> &[&'a Tree] {
        match self.field(key) {
            Some(Field::Records(records)) => records,
            _ => &[],
        }
    }

    /// A single scalar field.
    pub fn scalar(&self, key: &str) -> Option<&'a Scalar> {
        match self.field(key) {
            Some(Field::Scalar(s)) => Some(*s),
            _ => None,
        }
    }

    /// A single block field.
    pub fn block(&self, key: &str) -> Option<&'a Tree> {
        match self.field(key) {
            Some(Field::Block(b)) => Some(*b),
            _ => None,
        }
    }

    /// A numeric field; absent or non-numeric values read as zero.
    pub fn int(&self, key: &str) -> i64 {
        self.scalar(key).map(to_int).unwrap_or(0)
    }

    /// A numeric field that is `None` when absent.
    pub fn opt_int(&self, key: &str) -> Option<i64> {
        self.scalar(key).map(to_int)
    }
}

/// Reads an integer from script text. Decimals truncate; anything else is zero.
pub fn to_int(scalar: &Scalar) -> i64 {
    let text = scalar.text().trim();
    text.parse::<i64>()
        .ok()
        .or_else(|| text.parse::<f64>().ok().filter(|f| f.is_finite()).map(|f| f as i64))
        .unwrap_or(0)
}
