//! Backtracking matcher.
//!
//! Matching is continuation-passing: matching a node takes the rest of the
//! work as a callback, and a failed callback makes the caller try its next
//! option. A child that fails to extend the match is skipped over, a split
//! falls back to its second branch, and an alternation tries its next
//! branch. Predicates run in the final callback, so a binding that fails
//! them is backtracked like any other mismatch.
//!
//! Captures live on one stack. Every level truncates what it pushed before
//! reporting failure, so a successful match leaves exactly its bindings.

use whorl_ir::stack::ensure_sufficient_stack;
use whorl_ir::FieldId;
use whorl_tree::Node;

use crate::cursor::QueryCapture;
use crate::query::{Instr, MatcherId, NodeTest, Operand, Predicate, Query};

type Captures<'t> = Vec<QueryCapture<'t>>;

pub(crate) struct Vm<'q, 's> {
    query: &'q Query,
    source: &'s [u8],
    steps: u32,
    limit: u32,
    pub exceeded: bool,
}

impl<'q, 's> Vm<'q, 's> {
    pub fn new(query: &'q Query, source: &'s [u8], limit: u32) -> Self {
        Vm {
            query,
            source,
            steps: 0,
            limit,
            exceeded: false,
        }
    }

    /// Match pattern `pattern_index` rooted at `node`.
    ///
    /// The step budget is per call: one pathological pattern does not
    /// starve the rest.
    pub fn match_pattern<'t>(
        &mut self,
        node: Node<'t>,
        pattern_index: usize,
    ) -> Option<Captures<'t>> {
        self.steps = 0;
        let root = self.query.patterns[pattern_index].root;
        let mut captures = Vec::new();
        let mut finish =
            |vm: &mut Self, caps: &mut Captures<'t>| vm.predicates_hold(pattern_index, caps);
        let matched = self.match_node(node, root, &mut captures, &mut finish);
        matched.then_some(captures)
    }

    fn step(&mut self) -> bool {
        self.steps += 1;
        if self.steps > self.limit {
            self.exceeded = true;
        }
        !self.exceeded
    }

    fn match_node<'t>(
        &mut self,
        node: Node<'t>,
        id: MatcherId,
        caps: &mut Captures<'t>,
        k: &mut dyn FnMut(&mut Self, &mut Captures<'t>) -> bool,
    ) -> bool {
        ensure_sufficient_stack(|| self.match_node_inner(node, id, caps, k))
    }

    fn match_node_inner<'t>(
        &mut self,
        node: Node<'t>,
        id: MatcherId,
        caps: &mut Captures<'t>,
        k: &mut dyn FnMut(&mut Self, &mut Captures<'t>) -> bool,
    ) -> bool {
        if !self.step() {
            return false;
        }
        let query = self.query;
        let matcher = &query.nodes[id];

        let passes = match &matcher.test {
            NodeTest::Symbol(symbol) => node.kind_id() == *symbol,
            NodeTest::Named => node.is_named(),
            NodeTest::Any | NodeTest::Alternation(_) => true,
            NodeTest::Missing(kind) => {
                node.is_missing() && kind.is_none_or(|s| node.kind_id() == s)
            }
        };
        if !passes {
            return false;
        }

        let mark = caps.len();
        caps.extend(matcher.captures.iter().map(|&index| QueryCapture { node, index }));

        let matched = if let NodeTest::Alternation(branches) = &matcher.test {
            branches
                .iter()
                .any(|&branch| self.match_node(node, branch, caps, &mut *k))
        } else if matcher.program.is_empty() {
            k(self, caps)
        } else {
            let children: Vec<(Node<'t>, Option<FieldId>)> = node.child_fields().collect();
            self.run(&children, &matcher.program, 0, 0, caps, k)
        };

        if !matched {
            caps.truncate(mark);
        }
        matched
    }

    /// Run `program` from `pc`, with children before `next` already used.
    fn run<'t>(
        &mut self,
        children: &[(Node<'t>, Option<FieldId>)],
        program: &[Instr],
        pc: usize,
        next: usize,
        caps: &mut Captures<'t>,
        k: &mut dyn FnMut(&mut Self, &mut Captures<'t>) -> bool,
    ) -> bool {
        match program[pc] {
            Instr::Done => k(self, caps),
            Instr::Jump(to) => self.run(children, program, to, next, caps, k),
            Instr::Split(first, second) => {
                self.run(children, program, first, next, caps, &mut *k)
                    || (!self.exceeded && self.run(children, program, second, next, caps, k))
            }
            Instr::Node(id) => {
                let field = self.query.nodes[id].field;
                for (index, &(child, child_field)) in children.iter().enumerate().skip(next) {
                    if field.is_some() && child_field != field {
                        continue;
                    }
                    let matched = self.match_node(
                        child,
                        id,
                        caps,
                        &mut |vm: &mut Self, caps: &mut Captures<'t>| {
                            vm.run(children, program, pc + 1, index + 1, caps, &mut *k)
                        },
                    );
                    if matched {
                        return true;
                    }
                    if self.exceeded {
                        return false;
                    }
                }
                false
            }
        }
    }

    fn predicates_hold(&self, pattern_index: usize, caps: &[QueryCapture<'_>]) -> bool {
        self.query.patterns[pattern_index]
            .predicates
            .iter()
            .all(|predicate| self.holds(predicate, caps))
    }

    fn text(&self, node: Node<'_>) -> Option<&'s [u8]> {
        self.source.get(node.byte_range())
    }

    /// Every node of the subject capture must pass; none at all passes.
    fn holds(&self, predicate: &Predicate, caps: &[QueryCapture<'_>]) -> bool {
        let nodes_of = move |index: u32| caps.iter().filter(move |c| c.index == index).map(|c| c.node);
        match predicate {
            Predicate::Eq {
                capture,
                other,
                negated,
            } => {
                let expected = match other {
                    Operand::Text(text) => text.as_bytes(),
                    Operand::Capture(index) => match nodes_of(*index).next() {
                        Some(node) => match self.text(node) {
                            Some(text) => text,
                            None => return false,
                        },
                        None => return true,
                    },
                };
                nodes_of(*capture).all(|node| {
                    self.text(node)
                        .is_some_and(|text| (text == expected) != *negated)
                })
            }
            Predicate::AnyOf { capture, values } => nodes_of(*capture).all(|node| {
                self.text(node)
                    .is_some_and(|text| values.iter().any(|v| v.as_bytes() == text))
            }),
        }
    }
}
