//! A parser library for Victoria 3 clause-script files.
//!
//! This library provides a tokenizer and recursive-descent parser for the Paradox
//! script format, which is loosely based on braces `{}` and `key = value` assignments,
//! encoded as UTF-8 (usually with a BOM). Parsed files are exposed as an ordered
//! [`Tree`] that can be written back out in the same syntax.

mod error;
mod tree;

pub use error::{ErrorKind, ParseError};
pub use tree::{Entry, Operator, Scalar, Tree, Value, write_tree};

use std::fs::File;
use std::io::{BufReader, Read};
use std::path::Path;

use encoding_rs::UTF_8;
use encoding_rs_io::DecodeReaderBytesBuilder;

/// Represents a token scanned from a script file.
#[derive(Debug, Clone, PartialEq)]
pub enum Vic3TxtToken {
    /// A bare word: keys, tags, numbers, scoped references like `c:GBR`.
    Identifier(String),
    /// A double-quoted string value (quotes stripped, escapes kept verbatim).
    StringValue(String),
    /// An assignment or comparison operator.
    Operator(Operator),
    /// `{`
    LeftBrace,
    /// `}`
    RightBrace,
}

impl Vic3TxtToken {
    fn describe(&self) -> String {
        match self {
            Vic3TxtToken::Identifier(s) => s.clone(),
            Vic3TxtToken::StringValue(s) => format!("\"{}\"", s),
            Vic3TxtToken::Operator(op) => op.as_str().to_string(),
            Vic3TxtToken::LeftBrace => "{".to_string(),
            Vic3TxtToken::RightBrace => "}".to_string(),
        }
    }
}

/// Represents an item in the Abstract Syntax Tree (AST).
#[derive(Debug, Clone, PartialEq)]
pub enum Vic3TxtAstItem {
    /// An empty placeholder node.
    Brace,
    /// A `key <op> value` assignment; children are `[lhs, rhs]`.
    Assignment(Operator),
    /// A list of assignments or values (the file body or a braced block).
    AssignmentList,
    /// An unquoted value.
    Identifier(String),
    /// A quoted value.
    StringValue(String),
}

/// A node in the parse tree.
#[derive(Debug, Clone, PartialEq)]
pub struct Vic3TxtParseNode {
    /// Child nodes (for lists or assignments).
    pub children: Vec<Vic3TxtParseNode>,
    /// The type of item and its data.
    pub entry: Vic3TxtAstItem,
}

impl Default for Vic3TxtParseNode {
    fn default() -> Self {
        Self::new()
    }
}

impl Vic3TxtParseNode {
    /// Creates a new empty node with `Brace` type.
    pub fn new() -> Vic3TxtParseNode {
        Vic3TxtParseNode {
            children: Vec::new(),
            entry: Vic3TxtAstItem::Brace,
        }
    }

    fn leaf(entry: Vic3TxtAstItem) -> Vic3TxtParseNode {
        Vic3TxtParseNode {
            children: Vec::new(),
            entry,
        }
    }

    /// Counts the total number of nodes in this subtree (inclusive).
    pub fn node_count(&self) -> usize {
        1 + self.children.iter().map(|c| c.node_count()).sum::<usize>()
    }
}

fn ends_word(c: char, next: Option<char>) -> bool {
    match c {
        c if c.is_whitespace() => true,
        '=' | '{' | '}' | '#' | '"' | '<' | '>' => true,
        '?' | '!' => next == Some('='),
        _ => false,
    }
}

fn read_txt<P: AsRef<Path>>(path: P) -> std::io::Result<String> {
    let file = File::open(path)?;
    let mut buf_reader = BufReader::new(
        DecodeReaderBytesBuilder::new()
            .encoding(Some(UTF_8))
            .build(file),
    );
    let mut contents = String::new();
    buf_reader.read_to_string(&mut contents)?;
    Ok(contents)
}

pub trait Vic3Txt {
    /// Reads a script file (UTF-8, BOM tolerated) and tokenizes it.
    fn open_txt<P: AsRef<Path>>(path: P) -> std::io::Result<Vec<Vic3TxtToken>> {
        Ok(Self::tokenize(&read_txt(path)?))
    }

    fn tokenize(contents: &str) -> Vec<Vic3TxtToken> {
        Self::tokenize_lines(contents).0
    }

    /// Like [`Vic3Txt::tokenize`], also returning the 1-based line each token starts on.
    fn tokenize_lines(contents: &str) -> (Vec<Vic3TxtToken>, Vec<usize>) {
        let chars: Vec<char> = contents.trim_start_matches('\u{feff}').chars().collect();
        let mut tokens: Vec<Vic3TxtToken> = Vec::new();
        let mut lines: Vec<usize> = Vec::new();
        let mut line = 1;
        let mut i = 0;

        while i < chars.len() {
            let c = chars[i];
            let next = chars.get(i + 1).copied();
            if !c.is_whitespace() && c != '#' {
                lines.push(line);
            }
            match c {
                c if c.is_whitespace() => {
                    if c == '\n' {
                        line += 1;
                    }
                    i += 1;
                }
                '#' => {
                    while i < chars.len() && chars[i] != '\n' && chars[i] != '\r' {
                        i += 1;
                    }
                }
                '{' => {
                    tokens.push(Vic3TxtToken::LeftBrace);
                    i += 1;
                }
                '}' => {
                    tokens.push(Vic3TxtToken::RightBrace);
                    i += 1;
                }
                '=' | '<' | '>' | '?' | '!' if ends_word(c, next) => {
                    let (op, width) = match (c, next) {
                        ('=', Some('=')) => (Operator::EqEq, 2),
                        ('=', _) => (Operator::Eq, 1),
                        ('?', _) => (Operator::QuestionEq, 2),
                        ('!', _) => (Operator::NotEq, 2),
                        ('<', Some('=')) => (Operator::LessEq, 2),
                        ('<', _) => (Operator::Less, 1),
                        ('>', Some('=')) => (Operator::GreaterEq, 2),
                        _ => (Operator::Greater, 1),
                    };
                    tokens.push(Vic3TxtToken::Operator(op));
                    i += width;
                }
                '"' => {
                    i += 1; // opening quote
                    let mut s = String::new();
                    while i < chars.len() && chars[i] != '"' {
                        if chars[i] == '\\' && i + 1 < chars.len() {
                            s.push(chars[i]);
                            i += 1;
                        }
                        if chars[i] == '\n' {
                            line += 1;
                        }
                        s.push(chars[i]);
                        i += 1;
                    }
                    i += 1; // closing quote
                    tokens.push(Vic3TxtToken::StringValue(s));
                }
                _ => {
                    let mut s = String::new();
                    while i < chars.len() && !ends_word(chars[i], chars.get(i + 1).copied()) {
                        s.push(chars[i]);
                        i += 1;
                    }
                    tokens.push(Vic3TxtToken::Identifier(s));
                }
            }
        }
        (tokens, lines)
    }

    fn parse_terminal(
        tokens: &[Vic3TxtToken],
        pos: usize,
    ) -> Result<(Vic3TxtParseNode, usize), ParseError> {
        let tok = tokens
            .get(pos)
            .ok_or(ParseError::at(pos, ErrorKind::UnclosedBlock))?;
        match tok {
            Vic3TxtToken::Identifier(s) => Ok((
                Vic3TxtParseNode::leaf(Vic3TxtAstItem::Identifier(s.clone())),
                pos + 1,
            )),
            Vic3TxtToken::StringValue(s) => Ok((
                Vic3TxtParseNode::leaf(Vic3TxtAstItem::StringValue(s.clone())),
                pos + 1,
            )),
            _ => Err(ParseError::at(
                pos,
                ErrorKind::ExpectedValue {
                    found: tok.describe(),
                },
            )),
        }
    }

    /// Parses assignments and bare values until the closing brace (when `nested`)
    /// or the end of input.
    fn parse_assignment_list(
        tokens: &[Vic3TxtToken],
        pos: usize,
        nested: bool,
    ) -> Result<(Vic3TxtParseNode, usize), ParseError> {
        let mut assignment_list = Vic3TxtParseNode::leaf(Vic3TxtAstItem::AssignmentList);
        let mut loop_pos = pos;
        loop {
            let Some(lhs_tok) = tokens.get(loop_pos) else {
                if nested {
                    return Err(ParseError::at(loop_pos, ErrorKind::UnclosedBlock));
                }
                break;
            };
            match lhs_tok {
                Vic3TxtToken::RightBrace => {
                    if nested {
                        loop_pos += 1;
                    }
                    break;
                }
                Vic3TxtToken::LeftBrace => {
                    // anonymous block inside a list: `{ { ... } { ... } }`
                    let (block, next_pos) =
                        Self::parse_assignment_list(tokens, loop_pos + 1, true)?;
                    assignment_list.children.push(block);
                    loop_pos = next_pos;
                    continue;
                }
                Vic3TxtToken::Operator(op) => {
                    return Err(ParseError::at(
                        loop_pos,
                        ErrorKind::OperatorWithoutKey {
                            operator: op.as_str().to_string(),
                        },
                    ));
                }
                _ => {}
            }

            let (node_lhs, op_pos) = Self::parse_terminal(tokens, loop_pos)?;
            let Some(Vic3TxtToken::Operator(op)) = tokens.get(op_pos) else {
                // a bare value in a list: `{ 1 2 3 }`
                assignment_list.children.push(node_lhs);
                loop_pos = op_pos;
                continue;
            };

            let (node_rhs, next_pos) = match tokens.get(op_pos + 1) {
                Some(Vic3TxtToken::LeftBrace) => {
                    Self::parse_assignment_list(tokens, op_pos + 2, true)?
                }
                Some(Vic3TxtToken::Identifier(_)) | Some(Vic3TxtToken::StringValue(_)) => {
                    Self::parse_terminal(tokens, op_pos + 1)?
                }
                _ => {
                    return Err(ParseError::at(
                        op_pos + 1,
                        ErrorKind::MissingValue {
                            operator: op.as_str().to_string(),
                        },
                    ));
                }
            };
            let mut assignment = Vic3TxtParseNode::leaf(Vic3TxtAstItem::Assignment(*op));
            assignment.children.push(node_lhs);
            assignment.children.push(node_rhs);
            assignment_list.children.push(assignment);
            loop_pos = next_pos;
        }
        Ok((assignment_list, loop_pos))
    }

    fn parse(tokens: Vec<Vic3TxtToken>) -> Result<Vic3TxtParseNode, ParseError> {
        if tokens.is_empty() {
            return Err(ParseError::at(0, ErrorKind::EmptyInput));
        }
        let (node, pos) = Self::parse_assignment_list(&tokens, 0, false)?;
        if pos == tokens.len() {
            Ok(node)
        } else {
            Err(ParseError::at(pos, ErrorKind::StrayCloseBrace))
        }
    }

    /// Tokenizes and parses a whole document into a [`Tree`].
    ///
    /// An input with no tokens (blank or comments only) yields an empty tree.
    ///
    /// Errors carry the source line of the offending token.
    fn parse_str(contents: &str) -> Result<Tree, ParseError> {
        let (tokens, lines) = Self::tokenize_lines(contents);
        if tokens.is_empty() {
            return Ok(Tree::new());
        }
        let ast = Self::parse(tokens).map_err(|e| e.locate(&lines))?;
        Ok(Tree::from_node(&ast))
    }

    /// Reads and parses a file into a [`Tree`].
    fn parse_file<P: AsRef<Path>>(path: P) -> Result<Tree, Box<dyn std::error::Error + Send + Sync>> {
        Ok(Self::parse_str(&read_txt(path)?)?)
    }
}

pub struct DefaultVic3Txt {}
impl Vic3Txt for DefaultVic3Txt {}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn nonexistent() {
        let r = DefaultVic3Txt::open_txt("path/to/nowhere");
        assert!(r.is_err());
    }

    #[test]
    fn tokenize_operators_and_scopes() {
        let tokens = DefaultVic3Txt::tokenize("a ?= c:GBR b>=3 x!=y # trailing\n");
        assert_eq!(
            tokens,
            vec![
                Vic3TxtToken::Identifier("a".into()),
                Vic3TxtToken::Operator(Operator::QuestionEq),
                Vic3TxtToken::Identifier("c:GBR".into()),
                Vic3TxtToken::Identifier("b".into()),
                Vic3TxtToken::Operator(Operator::GreaterEq),
                Vic3TxtToken::Identifier("3".into()),
                Vic3TxtToken::Identifier("x".into()),
                Vic3TxtToken::Operator(Operator::NotEq),
                Vic3TxtToken::Identifier("y".into()),
            ]
        );
    }

    #[test]
    fn tokenize_strips_bom_and_keeps_quotes_apart() {
        let tokens = DefaultVic3Txt::tokenize("\u{feff}city = \"x0A1B2C\"");
        assert_eq!(tokens.len(), 3);
        assert_eq!(tokens[2], Vic3TxtToken::StringValue("x0A1B2C".into()));
    }

    #[test]
    fn parse_nested() {
        let tokens = DefaultVic3Txt::tokenize("a = { b = 1 c = { 1 2 } } d = e");
        let ast = DefaultVic3Txt::parse(tokens).unwrap();
        assert_eq!(ast.entry, Vic3TxtAstItem::AssignmentList);
        assert_eq!(ast.children.len(), 2);
        assert_eq!(ast.node_count(), 15);
    }

    #[test]
    fn parse_unclosed_brace() {
        let tokens = DefaultVic3Txt::tokenize("a = { b = 1");
        assert!(matches!(
            DefaultVic3Txt::parse(tokens),
            Err(ParseError { kind: ErrorKind::UnclosedBlock, .. })
        ));
    }

    #[test]
    fn parse_stray_brace() {
        let tokens = DefaultVic3Txt::tokenize("a = 1 }");
        assert_eq!(
            DefaultVic3Txt::parse(tokens),
            Err(ParseError {
                kind: ErrorKind::StrayCloseBrace,
                position: 3,
                line: None,
            })
        );
    }

    #[test]
    fn parse_missing_rhs() {
        let tokens = DefaultVic3Txt::tokenize("a = }");
        assert!(matches!(
            DefaultVic3Txt::parse(tokens),
            Err(ParseError { kind: ErrorKind::MissingValue { .. }, position: 2, .. })
        ));
    }

    #[test]
    fn parse_empty() {
        assert!(matches!(
            DefaultVic3Txt::parse(vec![]),
            Err(ParseError { kind: ErrorKind::EmptyInput, .. })
        ));
        assert!(DefaultVic3Txt::parse_str("# only a comment\n").unwrap().is_empty());
    }

    #[test]
    fn token_lines() {
        let (tokens, lines) = DefaultVic3Txt::tokenize_lines(
            "# header\na = {\n    b = \"two\nlines\"\n}\nc = 1\n",
        );
        assert_eq!(tokens.len(), lines.len());
        assert_eq!(lines, vec![2, 2, 2, 3, 3, 3, 5, 6, 6, 6]);
    }

    #[test]
    fn parse_str_reports_line() {
        let err = DefaultVic3Txt::parse_str("a = 1\nb = {\n    c = 2\n").unwrap_err();
        assert_eq!(err.kind, ErrorKind::UnclosedBlock);
        assert_eq!(err.line, Some(3));

        let err = DefaultVic3Txt::parse_str("a = 1\n\nb = }\n").unwrap_err();
        assert_eq!(err.line, Some(3));
        assert_eq!(err.to_string(), "line 3: `=` has no value on its right");
    }
}
