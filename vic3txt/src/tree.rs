//! Ordered key/value view of a parsed script file, and its writer.

use std::fmt;
use std::hash::{Hash, Hasher};

use serde::Serialize;

use crate::{Vic3TxtAstItem, Vic3TxtParseNode};

/// Operators that may join a key to its value.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
pub enum Operator {
    /// `=`
    Eq,
    /// `?=`
    QuestionEq,
    /// `==`
    EqEq,
    /// `!=`
    NotEq,
    /// `<`
    Less,
    /// `<=`
    LessEq,
    /// `>`
    Greater,
    /// `>=`
    GreaterEq,
}

impl Operator {
    pub fn as_str(&self) -> &'static str {
        match self {
            Operator::Eq => "=",
            Operator::QuestionEq => "?=",
            Operator::EqEq => "==",
            Operator::NotEq => "!=",
            Operator::Less => "<",
            Operator::LessEq => "<=",
            Operator::Greater => ">",
            Operator::GreaterEq => ">=",
        }
    }
}

/// A leaf token.
///
/// Equality and hashing look at the text only; whether the token was written
/// with double quotes is kept so it can be reproduced on output.
#[derive(Debug, Clone, Eq, Serialize)]
pub struct Scalar {
    text: String,
    quoted: bool,
}

impl Scalar {
    pub fn bare(text: impl Into<String>) -> Self {
        Self {
            text: text.into(),
            quoted: false,
        }
    }

    pub fn quoted(text: impl Into<String>) -> Self {
        Self {
            text: text.into(),
            quoted: true,
        }
    }

    pub fn text(&self) -> &str {
        &self.text
    }

    pub fn is_quoted(&self) -> bool {
        self.quoted
    }

    /// Returns a scalar with the same quoting style and different text.
    pub fn with_text(&self, text: impl Into<String>) -> Self {
        Self {
            text: text.into(),
            quoted: self.quoted,
        }
    }
}

impl PartialEq for Scalar {
    fn eq(&self, other: &Self) -> bool {
        self.text == other.text
    }
}

impl Hash for Scalar {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.text.hash(state);
    }
}

impl From<&str> for Scalar {
    fn from(text: &str) -> Self {
        Scalar::bare(text)
    }
}

impl fmt::Display for Scalar {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.quoted {
            write!(f, "\"{}\"", self.text)
        } else {
            f.write_str(&self.text)
        }
    }
}

/// The right-hand side of an assignment, or a bare list item.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub enum Value {
    Scalar(Scalar),
    Block(Tree),
}

impl Value {
    pub fn as_scalar(&self) -> Option<&Scalar> {
        match self {
            Value::Scalar(s) => Some(s),
            Value::Block(_) => None,
        }
    }

    pub fn as_block(&self) -> Option<&Tree> {
        match self {
            Value::Block(t) => Some(t),
            Value::Scalar(_) => None,
        }
    }
}

/// One line of a block: `key = value` or a bare value.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub enum Entry {
    Pair {
        key: String,
        op: Operator,
        value: Value,
    },
    Item(Value),
}

/// An ordered block of entries. Keys may repeat; order is preserved.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct Tree {
    pub entries: Vec<Entry>,
}

impl Tree {
    pub fn new() -> Self {
        Self::default()
    }

    /// Converts a parsed `AssignmentList` node. Other node kinds yield an empty tree.
    pub fn from_node(node: &Vic3TxtParseNode) -> Self {
        let mut tree = Tree::new();
        if node.entry != Vic3TxtAstItem::AssignmentList {
            return tree;
        }
        for child in &node.children {
            match &child.entry {
                Vic3TxtAstItem::Assignment(op) => {
                    let (Some(lhs), Some(rhs)) = (child.children.first(), child.children.get(1))
                    else {
                        continue;
                    };
                    let key = match &lhs.entry {
                        Vic3TxtAstItem::Identifier(s) | Vic3TxtAstItem::StringValue(s) => s.clone(),
                        _ => continue,
                    };
                    if let Some(value) = Value::from_node(rhs) {
                        tree.entries.push(Entry::Pair { key, op: *op, value });
                    }
                }
                _ => {
                    if let Some(value) = Value::from_node(child) {
                        tree.entries.push(Entry::Item(value));
                    }
                }
            }
        }
        tree
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn push_pair(&mut self, key: impl Into<String>, value: Value) {
        self.entries.push(Entry::Pair {
            key: key.into(),
            op: Operator::Eq,
            value,
        });
    }

    pub fn push_item(&mut self, value: Value) {
        self.entries.push(Entry::Item(value));
    }

    /// Appends all entries of `other`.
    pub fn extend(&mut self, other: Tree) {
        self.entries.extend(other.entries);
    }

    /// Iterates `key = value` entries in order, skipping bare items.
    pub fn pairs(&self) -> impl Iterator<Item = (&str, &Value)> {
        self.entries.iter().filter_map(|e| match e {
            Entry::Pair { key, value, .. } => Some((key.as_str(), value)),
            Entry::Item(_) => None,
        })
    }

    /// Iterates bare scalar items in order.
    pub fn items(&self) -> impl Iterator<Item = &Scalar> {
        self.entries.iter().filter_map(|e| match e {
            Entry::Item(Value::Scalar(s)) => Some(s),
            _ => None,
        })
    }

    /// The last value assigned to `key`.
    pub fn get(&self, key: &str) -> Option<&Value> {
        self.pairs().filter(|(k, _)| *k == key).map(|(_, v)| v).last()
    }

    /// Every value assigned to `key`, in order.
    pub fn get_all<'a>(&'a self, key: &'a str) -> impl Iterator<Item = &'a Value> + 'a {
        self.pairs().filter(move |(k, _)| *k == key).map(|(_, v)| v)
    }

    fn is_inline(&self) -> bool {
        self.entries
            .iter()
            .all(|e| matches!(e, Entry::Item(Value::Scalar(_))))
    }
}

impl Value {
    fn from_node(node: &Vic3TxtParseNode) -> Option<Value> {
        match &node.entry {
            Vic3TxtAstItem::Identifier(s) => Some(Value::Scalar(Scalar::bare(s.clone()))),
            Vic3TxtAstItem::StringValue(s) => Some(Value::Scalar(Scalar::quoted(s.clone()))),
            Vic3TxtAstItem::AssignmentList => Some(Value::Block(Tree::from_node(node))),
            _ => None,
        }
    }
}

const INDENT: &str = "    ";

fn write_block(out: &mut String, tree: &Tree, depth: usize) {
    if tree.is_inline() {
        out.push_str("{ ");
        for item in tree.items() {
            out.push_str(&item.to_string());
            out.push(' ');
        }
        out.push_str("}\n");
    } else {
        out.push_str("{\n");
        out.push_str(&write_tree(tree, depth + 1));
        out.push_str(&INDENT.repeat(depth));
        out.push_str("}\n");
    }
}

/// Renders `tree` as script text, each entry on its own line indented `depth` levels.
///
/// Blocks holding only scalar items are written inline: `key = { a b c }`.
pub fn write_tree(tree: &Tree, depth: usize) -> String {
    let indent = INDENT.repeat(depth);
    let mut out = String::new();
    for entry in &tree.entries {
        out.push_str(&indent);
        match entry {
            Entry::Pair { key, op, value } => {
                out.push_str(key);
                out.push(' ');
                out.push_str(op.as_str());
                out.push(' ');
                match value {
                    Value::Scalar(s) => {
                        out.push_str(&s.to_string());
                        out.push('\n');
                    }
                    Value::Block(block) => write_block(&mut out, block, depth),
                }
            }
            Entry::Item(Value::Scalar(s)) => {
                out.push_str(&s.to_string());
                out.push('\n');
            }
            Entry::Item(Value::Block(block)) => write_block(&mut out, block, depth),
        }
    }
    out
}

impl fmt::Display for Tree {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&write_tree(self, 0))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{DefaultVic3Txt, Vic3Txt};

    #[test]
    fn test_scalar_identity_ignores_quotes() {
        assert_eq!(Scalar::bare("x1"), Scalar::quoted("x1"));
        assert_eq!(Scalar::quoted("x1").to_string(), "\"x1\"");
        assert_eq!(Scalar::bare("x1").to_string(), "x1");
    }

    #[test]
    fn test_get_last_wins() {
        let tree = DefaultVic3Txt::parse_str("a = 1 b = 2 a = 3").unwrap();
        assert_eq!(tree.get("a").and_then(Value::as_scalar), Some(&Scalar::bare("3")));
        assert_eq!(tree.get_all("a").count(), 2);
        assert!(tree.get("c").is_none());
    }

    #[test]
    fn test_write_tree() {
        let src = "if = { limit = { has_dlc_feature ?= foundations } }\nprovinces = { \"x1\" \"x2\" }\n";
        let tree = DefaultVic3Txt::parse_str(src).unwrap();
        assert_eq!(
            write_tree(&tree, 0),
            "if = {\n    limit = {\n        has_dlc_feature ?= foundations\n    }\n}\nprovinces = { \"x1\" \"x2\" }\n"
        );
    }

    #[test]
    fn test_write_then_parse_is_stable() {
        let src = "a = { b = \"c\" d = { 1 2 3 } { e = f } }\n";
        let tree = DefaultVic3Txt::parse_str(src).unwrap();
        let again = DefaultVic3Txt::parse_str(&tree.to_string()).unwrap();
        assert_eq!(tree, again);
    }
}
