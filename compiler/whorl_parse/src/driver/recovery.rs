//! Error recovery for the last surviving version.
//!
//! Strategies, tried in order:
//!
//! 1. A lexical `ERROR` token is skipped into an `ERROR` node.
//! 2. One missing token is inserted when the real lookahead can be consumed
//!    right after it. At most [`MAX_INSERTIONS_PER_POSITION`] insertions
//!    happen at one position.
//! 3. Any other token except `END` is skipped. Consecutive skipped tokens
//!    extend the same `ERROR` node.
//! 4. At `END`, the top of the stack is wrapped into an `ERROR` node down to
//!    the deepest state from which `END` can be accepted, and failing that
//!    the whole stack becomes an `ERROR` root.
//!
//! Every strategy either consumes input or guarantees the next step
//! does, so recovery cannot loop.

use smallvec::SmallVec;
use tracing::debug;
use whorl_grammar::ParseAction;
use whorl_ir::{RuleId, StateId, SymbolId, TextLength};
use whorl_lexer::Token;
use whorl_tree::{BranchSpec, ChildRef, LeafSpec, NodeFlags, ERROR_COST_PER_RECOVERY};

use super::{Accepted, Run};
use crate::stack::{Entry, Lookahead, Version};
use crate::ParseError;

/// Missing tokens inserted at one position before the lookahead is skipped.
pub const MAX_INSERTIONS_PER_POSITION: u8 = 3;

impl Run<'_> {
    pub(super) fn recover(
        &mut self,
        mut version: Version,
        lookahead: &Lookahead,
    ) -> Result<(), ParseError> {
        self.stats.recoveries += 1;
        let token = lookahead.token;
        debug!(
            state = version.state().raw(),
            lookahead = self.grammar.symbol_name(token.symbol),
            position = token.start.bytes,
            "recovering"
        );

        if token.is_error() {
            self.skip_token(&mut version, &token);
            self.versions.push(version);
            return Ok(());
        }
        if self.insert_missing(&mut version, &token)? {
            self.versions.push(version);
            return Ok(());
        }
        if !token.is_end() {
            self.skip_token(&mut version, &token);
            self.versions.push(version);
            return Ok(());
        }
        if self.pop_to_recover(&mut version, &token) {
            self.versions.push(version);
            return Ok(());
        }

        debug!(entries = version.entries.len(), "collapsing stack into an error root");
        let (root, start) = self.error_root(&version.entries, &token);
        self.accepted.push(Accepted {
            seq: version.seq,
            root,
            start,
            error_cost: version.error_cost().saturating_add(ERROR_COST_PER_RECOVERY),
            dynamic_precedence: 0,
        });
        Ok(())
    }

    /// The action recovery assumes for a cell: the only action, or the
    /// statically resolved one.
    fn static_action(&self, state: StateId, symbol: SymbolId) -> Option<ParseAction> {
        match self.grammar.actions(state, symbol) {
            [] => None,
            [single] => Some(*single),
            many => self.grammar.resolve(many, symbol),
        }
    }

    /// Run the reductions `symbol` triggers on a bare state stack and return
    /// the action that ends them.
    fn simulate(&self, states: &mut Vec<StateId>, symbol: SymbolId) -> Option<ParseAction> {
        for _ in 0..=self.options.max_reductions_per_token {
            let state = *states.last()?;
            match self.static_action(state, symbol)? {
                ParseAction::Reduce(rule) => {
                    let rule = self.grammar.rule(rule)?;
                    let keep = states.len().checked_sub(usize::from(rule.rhs_len))?;
                    if keep == 0 {
                        return None;
                    }
                    states.truncate(keep);
                    let target = self.grammar.goto(*states.last()?, rule.lhs)?;
                    states.push(target);
                }
                other => return Some(other),
            }
        }
        None
    }

    fn insertion_works(&self, states: &[StateId], missing: SymbolId, real: SymbolId) -> bool {
        let mut states = states.to_vec();
        match self.simulate(&mut states, missing) {
            Some(ParseAction::Shift(next)) => states.push(next),
            _ => return false,
        }
        matches!(
            self.simulate(&mut states, real),
            Some(ParseAction::Shift(_) | ParseAction::Accept)
        )
    }

    /// Insert a zero-width `MISSING` token before `token`.
    fn insert_missing(&mut self, version: &mut Version, token: &Token) -> Result<bool, ParseError> {
        let at = token.start.bytes;
        let count = if version.insertions.0 == at {
            version.insertions.1
        } else {
            0
        };
        if count >= MAX_INSERTIONS_PER_POSITION {
            return Ok(false);
        }

        let grammar = self.grammar;
        let states = version.states();
        let Some(missing) = grammar
            .expected_tokens(version.state())
            .filter(|&m| !grammar.is_extra(m))
            .find(|&m| self.insertion_works(&states, m, token.symbol))
        else {
            return Ok(false);
        };

        // The reductions below depend on the recovery decision, so none of
        // their nodes may be reused on their own.
        let stand_in = Token {
            symbol: missing,
            end: token.start,
            ..*token
        };
        loop {
            match self.static_action(version.state(), missing) {
                Some(ParseAction::Reduce(rule)) => self.reduce(version, rule, &stand_in, true)?,
                Some(ParseAction::Shift(next)) => {
                    let leaf = self.builder.leaf(LeafSpec {
                        symbol: missing,
                        len: TextLength::ZERO,
                        flags: NodeFlags::MISSING,
                        pre_state: version.state(),
                        lex_mode: token.lex_mode,
                        lookahead_bytes: token.lookahead_end.saturating_sub(at),
                    });
                    version.entries.push(Entry {
                        state: next,
                        subtree: self.subtree(leaf, token.start),
                    });
                    version.error_run = false;
                    break;
                }
                _ => return Ok(false),
            }
        }
        version.insertions = (at, count + 1);
        debug!(missing = grammar.symbol_name(missing), position = at, "inserted missing token");
        self.check_depth(version)?;
        Ok(true)
    }

    /// Skip `token` into an `ERROR` node, extending the one on top of the
    /// stack if the previous token was skipped too.
    fn skip_token(&mut self, version: &mut Version, token: &Token) {
        let pre_state = version.state();
        let leaf = self.builder.leaf(LeafSpec {
            symbol: token.symbol,
            len: token.len(),
            flags: NodeFlags::empty(),
            pre_state,
            lex_mode: token.lex_mode,
            lookahead_bytes: token.lookahead_bytes(),
        });

        let open = version.error_run
            && version
                .entries
                .last()
                .is_some_and(|e| e.subtree.error && e.subtree.extra);
        let mut children: SmallVec<[ChildRef; 8]> = SmallVec::new();
        let start = match version.entries.pop() {
            Some(top) if open => {
                children.extend_from_slice(self.builder.children(top.subtree.id));
                top.subtree.start
            }
            other => {
                version.entries.extend(other);
                token.start
            }
        };
        children.push(ChildRef::new(leaf, token.start - start));

        let node = self.builder.branch(BranchSpec {
            symbol: SymbolId::ERROR,
            rule: RuleId::NONE,
            children: &children,
            flags: NodeFlags::EXTRA,
            pre_state,
            follow_examined: 0,
            follow_lex_mode: token.lex_mode,
        });
        debug!(
            skipped = self.grammar.symbol_name(token.symbol),
            start = token.start.bytes,
            end = token.end.bytes,
            extended = open,
            "skipped token"
        );
        version.entries.push(Entry {
            state: pre_state,
            subtree: self.subtree(node, start),
        });
        version.position = token.end;
        version.lookahead = None;
        version.error_run = true;
        version.reductions = 0;
    }

    /// Wrap the top of the stack into an `ERROR` node so that `END` can be
    /// accepted from the state below it.
    fn pop_to_recover(&mut self, version: &mut Version, end: &Token) -> bool {
        let structural: Vec<usize> = version
            .entries
            .iter()
            .enumerate()
            .filter(|(_, e)| !e.subtree.extra)
            .map(|(index, _)| index)
            .collect();
        let states = version.states();

        for (kept, &cut) in structural.iter().enumerate().rev() {
            let mut prefix = states[..=kept].to_vec();
            if self.simulate(&mut prefix, SymbolId::END) != Some(ParseAction::Accept) {
                continue;
            }

            let wrapped = version.entries.split_off(cut);
            let start = wrapped
                .first()
                .map_or(end.start, |e| e.subtree.start);
            let children: SmallVec<[ChildRef; 8]> = wrapped
                .iter()
                .map(|e| ChildRef::new(e.subtree.id, e.subtree.start - start))
                .collect();
            let pre_state = version.state();
            let node = self.builder.branch(BranchSpec {
                symbol: SymbolId::ERROR,
                rule: RuleId::NONE,
                children: &children,
                flags: NodeFlags::EXTRA,
                pre_state,
                follow_examined: 0,
                follow_lex_mode: end.lex_mode,
            });
            debug!(wrapped = wrapped.len(), state = pre_state.raw(), "popped to recover");
            version.entries.push(Entry {
                state: pre_state,
                subtree: self.subtree(node, start),
            });
            version.error_run = false;
            return true;
        }
        false
    }
}
