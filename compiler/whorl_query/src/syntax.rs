//! Query text to pattern syntax.
//!
//! A recursive-descent reader over the query bytes. Names stay unresolved
//! here; [`crate::compile`] looks them up in the grammar. Every name keeps
//! its byte offset so resolution errors point into the query text.

use crate::error::QueryError;

/// A name and where it was written.
#[derive(Clone, Debug, PartialEq, Eq)]
pub(crate) struct Name {
    pub text: String,
    pub offset: usize,
}

#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub(crate) enum Quantifier {
    ZeroOrMore,
    OneOrMore,
    ZeroOrOne,
}

/// What a single node must be.
#[derive(Clone, Debug, PartialEq, Eq)]
pub(crate) enum Atom {
    /// `(kind …)`, including `(ERROR …)`.
    Kind { name: Name, children: Vec<Item> },
    /// `(_ …)` when `named`, bare `_` otherwise.
    Wildcard { named: bool, children: Vec<Item> },
    /// `"text"`: an anonymous node.
    Literal(Name),
    /// `(MISSING)` or `(MISSING kind)`.
    Missing(Option<Name>),
    /// `[ … ]`: the first branch that matches the node.
    Alternation(Vec<NodePattern>),
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub(crate) struct NodePattern {
    pub atom: Atom,
    pub field: Option<Name>,
    pub captures: Vec<Name>,
    pub offset: usize,
}

/// An element of a child list.
#[derive(Clone, Debug, PartialEq, Eq)]
pub(crate) enum Item {
    Node(NodePattern),
    /// `( item … )`: a sequence of siblings.
    Group(Vec<Item>),
    Quantified(Box<Item>, Quantifier),
}

impl Item {
    /// Whether the item can match without consuming a child.
    pub fn is_nullable(&self) -> bool {
        match self {
            Item::Node(_) => false,
            Item::Group(items) => items.iter().all(Item::is_nullable),
            Item::Quantified(inner, Quantifier::OneOrMore) => inner.is_nullable(),
            Item::Quantified(_, _) => true,
        }
    }
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub(crate) enum PredicateArg {
    Capture(Name),
    String(String),
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub(crate) struct PredicateSyntax {
    pub name: Name,
    pub args: Vec<PredicateArg>,
}

/// One top-level pattern and the predicates written inside it.
#[derive(Clone, Debug, PartialEq, Eq)]
pub(crate) struct TopLevel {
    pub node: NodePattern,
    pub predicates: Vec<PredicateSyntax>,
}

/// Read every top-level pattern in `source`.
pub(crate) fn parse(source: &str) -> Result<Vec<TopLevel>, QueryError> {
    let mut reader = Reader {
        bytes: source.as_bytes(),
        source,
        pos: 0,
        predicates: Vec::new(),
    };
    let mut patterns = Vec::new();
    loop {
        reader.skip_trivia();
        if reader.at_end() {
            break;
        }
        patterns.push(reader.top_level()?);
    }
    Ok(patterns)
}

struct Reader<'a> {
    source: &'a str,
    bytes: &'a [u8],
    pos: usize,
    /// Predicates of the top-level pattern being read.
    predicates: Vec<PredicateSyntax>,
}

fn is_name_byte(b: u8) -> bool {
    b.is_ascii_alphanumeric() || matches!(b, b'_' | b'-' | b'.')
}

impl<'a> Reader<'a> {
    // === Cursor ===

    fn at_end(&self) -> bool {
        self.pos >= self.bytes.len()
    }

    fn peek(&self) -> Option<u8> {
        self.bytes.get(self.pos).copied()
    }

    fn peek_at(&self, ahead: usize) -> Option<u8> {
        self.bytes.get(self.pos + ahead).copied()
    }

    fn eat(&mut self, b: u8) -> bool {
        if self.peek() == Some(b) {
            self.pos += 1;
            true
        } else {
            false
        }
    }

    fn expect(&mut self, b: u8) -> Result<(), QueryError> {
        self.skip_trivia();
        if self.eat(b) {
            Ok(())
        } else {
            Err(self.unexpected(&format!("`{}`", b as char)))
        }
    }

    /// Whitespace and `;` line comments.
    fn skip_trivia(&mut self) {
        while let Some(b) = self.peek() {
            if b.is_ascii_whitespace() {
                self.pos += 1;
            } else if b == b';' {
                while self.peek().is_some_and(|b| b != b'\n') {
                    self.pos += 1;
                }
            } else {
                break;
            }
        }
    }

    fn unexpected(&self, expected: &str) -> QueryError {
        let found = match self.source[self.pos..].chars().next() {
            Some(c) => format!("`{c}`"),
            None => "end of query".to_owned(),
        };
        QueryError::syntax(self.pos, format!("expected {expected}, found {found}"))
    }

    fn name(&mut self) -> Option<Name> {
        let start = self.pos;
        while self.peek().is_some_and(is_name_byte) {
            self.pos += 1;
        }
        (self.pos > start).then(|| Name {
            text: self.source[start..self.pos].to_owned(),
            offset: start,
        })
    }

    /// A double-quoted string with `\"`, `\\`, `\n` and `\t` escapes.
    fn string(&mut self) -> Result<Name, QueryError> {
        let offset = self.pos;
        if !self.eat(b'"') {
            return Err(self.unexpected("a string"));
        }
        let source = self.source;
        let mut text = String::new();
        let mut chars = source[self.pos..].char_indices();
        while let Some((i, c)) = chars.next() {
            match c {
                '"' => {
                    self.pos += i + 1;
                    return Ok(Name { text, offset });
                }
                '\\' => {
                    let escaped = match chars.next() {
                        Some((_, 'n')) => '\n',
                        Some((_, 't')) => '\t',
                        Some((_, c @ ('"' | '\\'))) => c,
                        Some((j, c)) => {
                            return Err(QueryError::syntax(
                                self.pos + j,
                                format!("unknown escape `\\{c}`"),
                            ))
                        }
                        None => break,
                    };
                    text.push(escaped);
                }
                c => text.push(c),
            }
        }
        Err(QueryError::syntax(offset, "unterminated string"))
    }

    // === Patterns ===

    fn top_level(&mut self) -> Result<TopLevel, QueryError> {
        self.predicates.clear();
        let offset = self.pos;
        let item = self.item()?;
        let node = match item {
            Item::Node(node) => node,
            Item::Group(mut items) if items.len() == 1 => match items.pop() {
                Some(Item::Node(node)) => node,
                _ => return Err(QueryError::syntax(offset, "expected a node pattern")),
            },
            Item::Group(_) => {
                return Err(QueryError::syntax(
                    offset,
                    "a top-level group must hold exactly one node pattern",
                ))
            }
            Item::Quantified(..) => {
                return Err(QueryError::syntax(
                    offset,
                    "top-level patterns cannot be quantified",
                ))
            }
        };
        if let Some(field) = &node.field {
            return Err(QueryError::syntax(
                field.offset,
                "top-level patterns cannot have a field",
            ));
        }
        Ok(TopLevel {
            node,
            predicates: std::mem::take(&mut self.predicates),
        })
    }

    /// `[field:] atom [quantifier] [@capture]*`
    fn item(&mut self) -> Result<Item, QueryError> {
        self.skip_trivia();
        let offset = self.pos;
        let field = self.field()?;

        let mut item = if self.peek() == Some(b'(') && self.opens_group() {
            let group = self.group()?;
            if let Some(field) = field {
                return Err(QueryError::syntax(field.offset, "a group cannot have a field"));
            }
            group
        } else {
            Item::Node(NodePattern {
                atom: self.atom()?,
                field,
                captures: Vec::new(),
                offset,
            })
        };

        self.skip_trivia();
        let quantifier = match self.peek() {
            Some(b'*') => Some(Quantifier::ZeroOrMore),
            Some(b'+') => Some(Quantifier::OneOrMore),
            Some(b'?') => Some(Quantifier::ZeroOrOne),
            _ => None,
        };
        if let Some(quantifier) = quantifier {
            if !matches!(quantifier, Quantifier::ZeroOrOne) && item.is_nullable() {
                return Err(QueryError::syntax(
                    self.pos,
                    "a repeated group must match at least one node",
                ));
            }
            self.pos += 1;
        }

        self.skip_trivia();
        while self.peek() == Some(b'@') {
            let at = self.pos;
            self.pos += 1;
            let Some(name) = self.name() else {
                return Err(self.unexpected("a capture name"));
            };
            match &mut item {
                Item::Node(node) => node.captures.push(name),
                _ => return Err(QueryError::syntax(at, "only node patterns can be captured")),
            }
            self.skip_trivia();
        }

        if let Some(quantifier) = quantifier {
            item = Item::Quantified(Box::new(item), quantifier);
        }
        Ok(item)
    }

    /// `name:` if one is written here.
    fn field(&mut self) -> Result<Option<Name>, QueryError> {
        let start = self.pos;
        if !self.peek().is_some_and(|b| b.is_ascii_alphabetic()) {
            return Ok(None);
        }
        let Some(name) = self.name() else {
            return Ok(None);
        };
        self.skip_trivia();
        if self.eat(b':') {
            self.skip_trivia();
            return Ok(Some(name));
        }
        Err(QueryError::syntax(
            start,
            format!("bare name `{}`; write `({})` for a node", name.text, name.text),
        ))
    }

    /// Whether the `(` at the cursor starts a sibling group rather than a node.
    fn opens_group(&self) -> bool {
        let mut ahead = 1;
        while let Some(b) = self.peek_at(ahead) {
            if b.is_ascii_whitespace() {
                ahead += 1;
            } else {
                return matches!(b, b'(' | b'[' | b'"');
            }
        }
        false
    }

    fn group(&mut self) -> Result<Item, QueryError> {
        self.expect(b'(')?;
        let items = self.child_list()?;
        if items.is_empty() {
            return Err(QueryError::syntax(self.pos, "empty group"));
        }
        self.expect(b')')?;
        Ok(Item::Group(items))
    }

    /// Items up to the closing `)`, with predicates moved aside.
    fn child_list(&mut self) -> Result<Vec<Item>, QueryError> {
        let mut items = Vec::new();
        loop {
            self.skip_trivia();
            match self.peek() {
                Some(b')') | None => return Ok(items),
                Some(b'(') if self.peek_predicate() => self.predicate()?,
                _ => items.push(self.item()?),
            }
        }
    }

    fn peek_predicate(&self) -> bool {
        let mut ahead = 1;
        while self.peek_at(ahead).is_some_and(|b| b.is_ascii_whitespace()) {
            ahead += 1;
        }
        self.peek_at(ahead) == Some(b'#')
    }

    fn atom(&mut self) -> Result<Atom, QueryError> {
        match self.peek() {
            Some(b'"') => Ok(Atom::Literal(self.string()?)),
            Some(b'[') => self.alternation(),
            Some(b'_') if !self.peek_at(1).is_some_and(is_name_byte) => {
                self.pos += 1;
                Ok(Atom::Wildcard {
                    named: false,
                    children: Vec::new(),
                })
            }
            Some(b'(') => self.parenthesized(),
            _ => Err(self.unexpected("a pattern")),
        }
    }

    fn parenthesized(&mut self) -> Result<Atom, QueryError> {
        let open = self.pos;
        self.expect(b'(')?;
        self.skip_trivia();
        if self.peek() == Some(b'_') && !self.peek_at(1).is_some_and(is_name_byte) {
            self.pos += 1;
            let children = self.child_list()?;
            self.expect(b')')?;
            return Ok(Atom::Wildcard {
                named: true,
                children,
            });
        }
        let Some(name) = self.name() else {
            if self.peek() == Some(b')') {
                return Err(QueryError::syntax(open, "empty pattern"));
            }
            return Err(self.unexpected("a node kind"));
        };
        if name.text == "MISSING" {
            self.skip_trivia();
            let kind = match self.peek() {
                Some(b'"') => Some(self.string()?),
                Some(b')') => None,
                _ => match self.name() {
                    Some(kind) => Some(kind),
                    None => return Err(self.unexpected("a node kind or `)`")),
                },
            };
            self.expect(b')')?;
            return Ok(Atom::Missing(kind));
        }
        let children = self.child_list()?;
        self.expect(b')')?;
        Ok(Atom::Kind { name, children })
    }

    fn alternation(&mut self) -> Result<Atom, QueryError> {
        let open = self.pos;
        self.expect(b'[')?;
        let mut branches = Vec::new();
        loop {
            self.skip_trivia();
            if self.eat(b']') {
                break;
            }
            if self.at_end() {
                return Err(self.unexpected("`]`"));
            }
            match self.item()? {
                Item::Node(node) => branches.push(node),
                _ => {
                    return Err(QueryError::syntax(
                        open,
                        "alternation branches must be single node patterns",
                    ))
                }
            }
        }
        if branches.is_empty() {
            return Err(QueryError::syntax(open, "empty alternation"));
        }
        Ok(Atom::Alternation(branches))
    }

    /// `(#name? arg …)`
    fn predicate(&mut self) -> Result<(), QueryError> {
        self.expect(b'(')?;
        self.skip_trivia();
        let offset = self.pos;
        self.eat(b'#');
        let Some(mut name) = self.name() else {
            return Err(self.unexpected("a predicate name"));
        };
        if self.eat(b'?') {
            name.text.push('?');
        }
        name.offset = offset;

        let mut args = Vec::new();
        loop {
            self.skip_trivia();
            match self.peek() {
                Some(b')') => break,
                Some(b'@') => {
                    self.pos += 1;
                    let Some(capture) = self.name() else {
                        return Err(self.unexpected("a capture name"));
                    };
                    args.push(PredicateArg::Capture(capture));
                }
                Some(b'"') => args.push(PredicateArg::String(self.string()?.text)),
                _ => return Err(self.unexpected("a capture, a string or `)`")),
            }
        }
        self.expect(b')')?;
        self.predicates.push(PredicateSyntax { name, args });
        Ok(())
    }
}
