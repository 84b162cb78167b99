//! Name resolution and child-program generation.

use rustc_hash::FxHashMap;
use smallvec::SmallVec;
use whorl_grammar::GrammarHandle;
use whorl_ir::SymbolId;

use crate::error::{QueryError, QueryErrorKind};
use crate::query::{
    Instr, MatcherId, NodeMatcher, NodeTest, Operand, PatternInfo, Predicate, Query,
};
use crate::syntax::{
    Atom, Item, Name, NodePattern, PredicateArg, PredicateSyntax, Quantifier, TopLevel,
};

pub(crate) struct Compiler<'g> {
    grammar: &'g GrammarHandle,
    nodes: Vec<NodeMatcher>,
    capture_names: Vec<String>,
    capture_map: FxHashMap<String, u32>,
    /// Captures bound by the pattern being compiled.
    bound: SmallVec<[u32; 8]>,
}

impl<'g> Compiler<'g> {
    pub fn new(grammar: &'g GrammarHandle) -> Self {
        Compiler {
            grammar,
            nodes: Vec::new(),
            capture_names: Vec::new(),
            capture_map: FxHashMap::default(),
            bound: SmallVec::new(),
        }
    }

    pub fn compile(mut self, patterns: &[TopLevel]) -> Result<Query, QueryError> {
        let mut infos = Vec::with_capacity(patterns.len());
        for pattern in patterns {
            self.bound.clear();
            let root = self.node(&pattern.node)?;
            let predicates = pattern
                .predicates
                .iter()
                .map(|p| self.predicate(p))
                .collect::<Result<Vec<_>, _>>()?;
            infos.push(PatternInfo {
                root,
                predicates,
                start_byte: whorl_ir::to_u32(pattern.node.offset, "query offset"),
            });
        }
        Ok(Query {
            grammar: self.grammar.clone(),
            nodes: self.nodes,
            patterns: infos,
            capture_names: self.capture_names,
            capture_map: self.capture_map,
        })
    }

    fn node(&mut self, pattern: &NodePattern) -> Result<MatcherId, QueryError> {
        let field = match &pattern.field {
            Some(name) => Some(self.grammar.field_id(&name.text).ok_or_else(|| {
                QueryError::new(
                    QueryErrorKind::Field,
                    name.offset,
                    format!("unknown field `{}`", name.text),
                )
            })?),
            None => None,
        };
        let captures = pattern
            .captures
            .iter()
            .map(|name| self.capture(&name.text))
            .collect();

        let (test, program) = match &pattern.atom {
            Atom::Kind { name, children } => {
                let symbol = self.symbol(name, true)?;
                (NodeTest::Symbol(symbol), self.program(children)?)
            }
            Atom::Wildcard { named, children } => {
                let test = if *named { NodeTest::Named } else { NodeTest::Any };
                (test, self.program(children)?)
            }
            Atom::Literal(name) => (NodeTest::Symbol(self.symbol(name, false)?), Vec::new()),
            Atom::Missing(kind) => {
                let symbol = match kind {
                    Some(name) => Some(
                        self.symbol(name, true)
                            .or_else(|_| self.symbol(name, false))?,
                    ),
                    None => None,
                };
                (NodeTest::Missing(symbol), Vec::new())
            }
            Atom::Alternation(branches) => {
                let mut ids = Vec::with_capacity(branches.len());
                for branch in branches {
                    if let Some(field) = &branch.field {
                        return Err(QueryError::syntax(
                            field.offset,
                            "put the field before the alternation",
                        ));
                    }
                    ids.push(self.node(branch)?);
                }
                (NodeTest::Alternation(ids), Vec::new())
            }
        };

        self.nodes.push(NodeMatcher {
            test,
            field,
            captures,
            program,
        });
        Ok(self.nodes.len() - 1)
    }

    fn symbol(&self, name: &Name, named: bool) -> Result<SymbolId, QueryError> {
        self.grammar
            .symbol_for_name(&name.text, named)
            .ok_or_else(|| {
                let what = if named { "node kind" } else { "anonymous node" };
                QueryError::new(
                    QueryErrorKind::NodeKind,
                    name.offset,
                    format!("unknown {what} `{}`", name.text),
                )
            })
    }

    fn capture(&mut self, name: &str) -> u32 {
        let next = whorl_ir::to_u32(self.capture_names.len(), "captures");
        let index = *self.capture_map.entry(name.to_owned()).or_insert_with(|| {
            self.capture_names.push(name.to_owned());
            next
        });
        if !self.bound.contains(&index) {
            self.bound.push(index);
        }
        index
    }

    /// A child list as a program ending in `Done`; empty if there are no items.
    fn program(&mut self, items: &[Item]) -> Result<Vec<Instr>, QueryError> {
        if items.is_empty() {
            return Ok(Vec::new());
        }
        let mut code = Vec::new();
        for item in items {
            self.item(item, &mut code)?;
        }
        code.push(Instr::Done);
        Ok(code)
    }

    fn item(&mut self, item: &Item, code: &mut Vec<Instr>) -> Result<(), QueryError> {
        match item {
            Item::Node(node) => {
                let id = self.node(node)?;
                code.push(Instr::Node(id));
            }
            Item::Group(items) => {
                for item in items {
                    self.item(item, code)?;
                }
            }
            Item::Quantified(inner, Quantifier::ZeroOrMore) => {
                // L: split body, exit; body; jump L
                let split = code.len();
                code.push(Instr::Done);
                self.item(inner, code)?;
                code.push(Instr::Jump(split));
                code[split] = Instr::Split(split + 1, code.len());
            }
            Item::Quantified(inner, Quantifier::OneOrMore) => {
                let body = code.len();
                self.item(inner, code)?;
                code.push(Instr::Split(body, code.len() + 1));
            }
            Item::Quantified(inner, Quantifier::ZeroOrOne) => {
                let split = code.len();
                code.push(Instr::Done);
                self.item(inner, code)?;
                code[split] = Instr::Split(split + 1, code.len());
            }
        }
        Ok(())
    }

    fn predicate(&self, predicate: &PredicateSyntax) -> Result<Predicate, QueryError> {
        let name = &predicate.name;
        let bad = |message: String| QueryError::new(QueryErrorKind::Predicate, name.offset, message);
        if !matches!(name.text.as_str(), "eq?" | "not-eq?" | "any-of?") {
            return Err(bad(format!("unknown predicate `#{}`", name.text)));
        }

        let (subject, rest) = match predicate.args.split_first() {
            Some((PredicateArg::Capture(capture), rest)) => (self.bound_capture(capture)?, rest),
            _ => {
                return Err(bad(format!(
                    "`#{}` takes a capture as its first argument",
                    name.text
                )))
            }
        };

        match name.text.as_str() {
            "eq?" | "not-eq?" => {
                let other = match rest {
                    [PredicateArg::Capture(capture)] => {
                        Operand::Capture(self.bound_capture(capture)?)
                    }
                    [PredicateArg::String(text)] => Operand::Text(text.clone()),
                    _ => {
                        return Err(bad(format!(
                            "`#{}` takes a capture and one more argument",
                            name.text
                        )))
                    }
                };
                Ok(Predicate::Eq {
                    capture: subject,
                    other,
                    negated: name.text == "not-eq?",
                })
            }
            "any-of?" => {
                let values = rest
                    .iter()
                    .map(|arg| match arg {
                        PredicateArg::String(text) => Ok(text.clone()),
                        PredicateArg::Capture(_) => {
                            Err(bad("`#any-of?` takes strings after the capture".to_owned()))
                        }
                    })
                    .collect::<Result<Vec<_>, _>>()?;
                if values.is_empty() {
                    return Err(bad("`#any-of?` needs at least one string".to_owned()));
                }
                Ok(Predicate::AnyOf {
                    capture: subject,
                    values,
                })
            }
            other => Err(bad(format!("unknown predicate `#{other}`"))),
        }
    }

    fn bound_capture(&self, name: &Name) -> Result<u32, QueryError> {
        self.capture_map
            .get(&name.text)
            .copied()
            .filter(|index| self.bound.contains(index))
            .ok_or_else(|| {
                QueryError::new(
                    QueryErrorKind::Capture,
                    name.offset,
                    format!("`@{}` is not captured by this pattern", name.text),
                )
            })
    }
}
