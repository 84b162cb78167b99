//! The GLR driver.
//!
//! A run owns a set of stack versions. The version furthest behind in the
//! input is advanced until it consumes a token, accepts or fails; then
//! versions that reached the same configuration are merged. Forks happen on
//! ambiguous table cells when the policy is [`AmbiguityPolicy::Glr`]: the
//! clone carries the action it has to take and is advanced like any other
//! version.
//!
//! When only one version is alive and a prior tree is available, the next
//! token and whole subtrees may come from the prior tree instead of the
//! lexer (see [`crate::incremental`]).

mod recovery;

pub use recovery::MAX_INSERTIONS_PER_POSITION;

use std::cmp::Reverse;
use std::time::Instant;

use smallvec::SmallVec;
use tracing::{debug, trace};
use whorl_grammar::{Action, Grammar, ParseAction};
use whorl_ir::{RuleId, StateId, SymbolId, TextLength};
use whorl_lexer::{Lexer, SourceBuffer, Token};
use whorl_tree::{BranchSpec, ChildRef, LeafSpec, NodeFlags, NodeId, NodeInfo, TreeBuilder};

use crate::incremental::{Candidate, ReusableNodes};
use crate::stack::{Entry, Lookahead, Subtree, Version};
use crate::{AmbiguityPolicy, Limit, ParseError, ParseOptions, ParseOutput, ParseStats};

/// Reductions between two interruption checks.
const CHECK_INTERVAL: usize = 256;

/// A version that reached `Accept`, or collapsed into an error root.
#[derive(Copy, Clone, Debug)]
struct Accepted {
    seq: u32,
    root: NodeId,
    start: TextLength,
    error_cost: u32,
    dynamic_precedence: i32,
}

pub(crate) struct Run<'a> {
    grammar: &'a Grammar,
    options: &'a ParseOptions,
    lexer: Lexer<'a>,
    builder: TreeBuilder,
    versions: Vec<Version>,
    accepted: Vec<Accepted>,
    reusable: Option<ReusableNodes<'a>>,
    stats: ParseStats,
    next_seq: u32,
    started: Instant,
    text_len: TextLength,
}

impl<'a> Run<'a> {
    pub fn new(
        grammar: &'a Grammar,
        options: &'a ParseOptions,
        source: &'a SourceBuffer,
        builder: TreeBuilder,
        reusable: Option<ReusableNodes<'a>>,
    ) -> Self {
        Run {
            grammar,
            options,
            lexer: Lexer::new(grammar, source),
            builder,
            versions: Vec::new(),
            accepted: Vec::new(),
            reusable,
            stats: ParseStats::default(),
            next_seq: 0,
            started: Instant::now(),
            text_len: TextLength::of_text(source.as_bytes()),
        }
    }

    pub fn run(mut self) -> Result<ParseOutput, ParseError> {
        let first = self.fresh_version();
        self.versions.push(first);
        self.stats.peak_versions = 1;

        while let Some(index) = self.next_version() {
            self.check_interrupt()?;
            let version = self.versions.swap_remove(index);
            self.advance(version)?;
            self.merge_versions();
            self.stats.peak_versions = self.stats.peak_versions.max(self.versions.len());
        }
        self.finish()
    }

    fn fresh_version(&mut self) -> Version {
        let version = Version::new(self.next_seq);
        self.next_seq += 1;
        version
    }

    /// The version furthest behind; earlier versions first.
    fn next_version(&self) -> Option<usize> {
        self.versions
            .iter()
            .enumerate()
            .min_by_key(|(_, v)| (v.position.bytes, v.seq))
            .map(|(index, _)| index)
    }

    /// Whether versions other than the one being advanced are alive or done.
    fn others_alive(&self) -> bool {
        !self.versions.is_empty() || !self.accepted.is_empty()
    }

    fn check_interrupt(&self) -> Result<(), ParseError> {
        if self
            .options
            .cancellation
            .as_ref()
            .is_some_and(crate::CancellationFlag::is_cancelled)
        {
            return Err(ParseError::Cancelled);
        }
        if let Some(timeout) = self.options.timeout {
            if self.started.elapsed() > timeout {
                return Err(ParseError::Cancelled);
            }
        }
        Ok(())
    }

    fn check_depth(&self, version: &Version) -> Result<(), ParseError> {
        if version.entries.len() > self.options.max_stack_depth {
            return Err(ParseError::ResourceExhausted {
                limit: Limit::StackDepth,
                max: self.options.max_stack_depth,
            });
        }
        Ok(())
    }

    /// Run `version` until it consumes a token, accepts or is dropped.
    fn advance(&mut self, mut version: Version) -> Result<(), ParseError> {
        let grammar = self.grammar;
        let lookahead = self.lookahead(&mut version)?;
        let symbol = lookahead.token.symbol;

        loop {
            let state = version.state();
            let action = if let Some(forced) = version.forced.take() {
                Action::from(forced)
            } else {
                match grammar.action(state, symbol) {
                    Action::AmbiguousChoice(actions) => match self.options.policy {
                        AmbiguityPolicy::Precedence => grammar
                            .resolve(actions, symbol)
                            .map_or(Action::Error, Action::from),
                        AmbiguityPolicy::Glr => {
                            self.fork(&version, &actions[1..])?;
                            Action::from(actions[0])
                        }
                    },
                    other => other,
                }
            };
            trace!(
                version = version.seq,
                state = state.raw(),
                lookahead = grammar.symbol_name(symbol),
                ?action,
                "action"
            );

            match action {
                Action::Reduce(rule) => self.reduce(&mut version, rule, &lookahead.token, false)?,
                Action::Shift(next) => {
                    if !self.reuse_subtree(&mut version, &lookahead)? {
                        self.shift(&mut version, next, &lookahead, false)?;
                    }
                    self.versions.push(version);
                    return Ok(());
                }
                Action::ShiftExtra => {
                    self.shift(&mut version, state, &lookahead, true)?;
                    self.versions.push(version);
                    return Ok(());
                }
                Action::Accept => {
                    self.accept(&version, &lookahead.token);
                    return Ok(());
                }
                Action::Error | Action::AmbiguousChoice(_) => {
                    if self.others_alive() {
                        debug!(
                            version = version.seq,
                            position = lookahead.token.start.bytes,
                            "dropping failed version"
                        );
                        return Ok(());
                    }
                    return self.recover(version, &lookahead);
                }
            }
        }
    }

    /// Clone `version` once per extra action of an ambiguous cell.
    fn fork(&mut self, version: &Version, actions: &[ParseAction]) -> Result<(), ParseError> {
        if self.stats.forks + actions.len() > self.options.max_forks {
            return Err(ParseError::ResourceExhausted {
                limit: Limit::Forks,
                max: self.options.max_forks,
            });
        }
        for &action in actions {
            let mut clone = version.clone();
            clone.seq = self.next_seq;
            self.next_seq += 1;
            clone.forced = Some(action);
            debug!(from = version.seq, to = clone.seq, ?action, "fork");
            self.versions.push(clone);
            self.stats.forks += 1;
        }
        self.prune_versions();
        Ok(())
    }

    /// Drop the least preferred versions until at most `max_versions` are
    /// alive, counting the one being advanced.
    fn prune_versions(&mut self) {
        while self.versions.len() >= self.options.max_versions {
            let Some(worst) = (0..self.versions.len()).reduce(|a, b| {
                if self.versions[a].preferred_over(&self.versions[b]) {
                    b
                } else {
                    a
                }
            }) else {
                return;
            };
            let pruned = self.versions.swap_remove(worst);
            debug!(version = pruned.seq, cost = pruned.error_cost(), "pruned version");
        }
    }

    /// The next token of `version`: pending, reused or freshly lexed.
    fn lookahead(&mut self, version: &mut Version) -> Result<Lookahead, ParseError> {
        if let Some(lookahead) = &version.lookahead {
            return Ok(lookahead.clone());
        }
        let state = version.state();
        let mode = version
            .lex_override
            .take()
            .unwrap_or_else(|| self.grammar.lex_mode(state));

        let lookahead = if let Some(reused) = self.reusable_token(version, state, mode) {
            reused
        } else {
            let token = self
                .lexer
                .next_token_in_mode(state, mode, version.position);
            self.stats.tokens_lexed += 1;
            if self.stats.tokens_lexed > self.options.max_tokens {
                return Err(ParseError::ResourceExhausted {
                    limit: Limit::Tokens,
                    max: self.options.max_tokens,
                });
            }
            Lookahead::lexed(token)
        };
        version.lookahead = Some(lookahead.clone());
        Ok(lookahead)
    }

    /// A token taken from the prior tree, if one is usable at the version's
    /// position.
    fn reusable_token(
        &mut self,
        version: &Version,
        state: StateId,
        mode: whorl_grammar::LexMode,
    ) -> Option<Lookahead> {
        if self.others_alive() {
            return None;
        }
        let start = self.lexer.skip_separators(version.position);
        // An external scanner sees the separators too.
        if start.bytes != version.position.bytes && mode.external_lex_state != 0 {
            return None;
        }
        let reusable = self.reusable.as_mut()?;
        let old = reusable.marker().old_position(start.bytes)?;
        let chain = reusable.chain_at(old)?;
        if chain.leaf.info.lex_mode != mode {
            return None;
        }
        let info = chain.leaf.info;
        let end = start + info.len;
        let token = Token {
            symbol: info.symbol,
            start,
            end,
            lookahead_end: end.bytes.saturating_add(info.lookahead_bytes),
            parse_state: state,
            lex_mode: mode,
        };
        trace!(symbol = self.grammar.symbol_name(info.symbol), span = ?token.span(), "reused token");
        Some(Lookahead {
            token,
            leaf: Some(chain.leaf),
            outer: chain.outer,
        })
    }

    fn subtree(&self, id: NodeId, start: TextLength) -> Subtree {
        let info = self.builder.info(id).unwrap_or(NodeInfo::DANGLING);
        Subtree::new(id, start, &info)
    }

    fn flags_for_new_node(&self) -> NodeFlags {
        if self.versions.is_empty() {
            NodeFlags::empty()
        } else {
            NodeFlags::FRAGILE
        }
    }

    fn note_reuse(&mut self, candidate: &Candidate) {
        self.stats.subtrees_reused += 1;
        self.stats.nodes_reused += candidate.info.descendant_count as usize;
        self.stats.bytes_reused += candidate.info.len.bytes as usize;
    }

    fn shift(
        &mut self,
        version: &mut Version,
        next: StateId,
        lookahead: &Lookahead,
        extra: bool,
    ) -> Result<(), ParseError> {
        let token = lookahead.token;
        let pre_state = version.state();
        let reused = lookahead
            .leaf
            .filter(|c| c.info.pre_state == pre_state && c.info.is_extra() == extra);
        let id = if let Some(candidate) = reused {
            self.note_reuse(&candidate);
            candidate.id
        } else {
            let mut flags = self.flags_for_new_node();
            if extra {
                flags |= NodeFlags::EXTRA;
            }
            self.builder.leaf(LeafSpec {
                symbol: token.symbol,
                len: token.len(),
                flags,
                pre_state,
                lex_mode: token.lex_mode,
                lookahead_bytes: token.lookahead_bytes(),
            })
        };
        let state = if extra { pre_state } else { next };
        version.entries.push(Entry {
            state,
            subtree: self.subtree(id, token.start),
        });
        version.position = token.end;
        version.lookahead = None;
        version.error_run = false;
        version.reductions = 0;
        self.check_depth(version)
    }

    /// Push the largest prior subtree that starts with the lookahead and was
    /// originally pushed from the current state.
    fn reuse_subtree(
        &mut self,
        version: &mut Version,
        lookahead: &Lookahead,
    ) -> Result<bool, ParseError> {
        if lookahead.outer.is_empty() || self.others_alive() {
            return Ok(false);
        }
        let state = version.state();
        for candidate in &lookahead.outer {
            if candidate.info.pre_state != state {
                continue;
            }
            let Some(target) = self.grammar.goto(state, candidate.info.symbol) else {
                continue;
            };
            let start = lookahead.token.start;
            version.entries.push(Entry {
                state: target,
                subtree: Subtree::new(candidate.id, start, &candidate.info),
            });
            version.position = start + candidate.info.len;
            version.lookahead = None;
            version.lex_override = Some(candidate.info.follow_lex_mode);
            version.error_run = false;
            version.reductions = 0;
            self.note_reuse(candidate);
            debug!(
                symbol = self.grammar.symbol_name(candidate.info.symbol),
                start = start.bytes,
                len = candidate.info.len.bytes,
                "reused subtree"
            );
            self.check_depth(version)?;
            return Ok(true);
        }
        Ok(false)
    }

    /// Reduce by `rule` with `follow` as the lookahead.
    ///
    /// `fragile` marks the new node as unsafe to reuse, for reductions made
    /// on behalf of a token recovery inserted.
    fn reduce(
        &mut self,
        version: &mut Version,
        rule_id: RuleId,
        follow: &Token,
        fragile: bool,
    ) -> Result<(), ParseError> {
        let grammar = self.grammar;
        let Some(rule) = grammar.rule(rule_id) else {
            return Err(ParseError::InvalidTable {
                state: version.state().raw(),
                symbol: format!("<rule {}>", rule_id.raw()),
            });
        };

        version.reductions += 1;
        self.stats.reductions += 1;
        if version.reductions > self.options.max_reductions_per_token {
            return Err(ParseError::ResourceExhausted {
                limit: Limit::ReductionsPerToken,
                max: self.options.max_reductions_per_token,
            });
        }
        if version.reductions % CHECK_INTERVAL == 0 {
            self.check_interrupt()?;
        }

        let mut trailing: SmallVec<[Entry; 4]> = SmallVec::new();
        while let Some(top) = version.entries.last() {
            if !top.subtree.extra {
                break;
            }
            trailing.extend(version.entries.pop());
        }

        let mut popped: SmallVec<[Entry; 8]> = SmallVec::new();
        let mut remaining = rule.rhs_len;
        while remaining > 0 {
            let Some(entry) = version.entries.pop() else {
                return Err(ParseError::InvalidTable {
                    state: version.state().raw(),
                    symbol: grammar.symbol_name(rule.lhs).to_owned(),
                });
            };
            if !entry.subtree.extra {
                remaining -= 1;
            }
            popped.push(entry);
        }
        popped.reverse();

        let pre_state = version.state();
        let Some(target) = grammar.goto(pre_state, rule.lhs) else {
            return Err(ParseError::InvalidTable {
                state: pre_state.raw(),
                symbol: grammar.symbol_name(rule.lhs).to_owned(),
            });
        };

        let start = popped
            .first()
            .map_or_else(|| version.top_end(), |e| e.subtree.start);
        let end = popped.last().map_or(start, |e| e.subtree.end());
        let children: SmallVec<[ChildRef; 8]> = popped
            .iter()
            .map(|e| ChildRef::new(e.subtree.id, e.subtree.start - start))
            .collect();
        let mut flags = self.flags_for_new_node();
        if fragile {
            flags |= NodeFlags::FRAGILE;
        }
        let id = self.builder.branch(BranchSpec {
            symbol: rule.lhs,
            rule: rule_id,
            children: &children,
            flags,
            pre_state,
            follow_examined: follow.lookahead_end.saturating_sub(end.bytes),
            follow_lex_mode: follow.lex_mode,
        });
        trace!(
            version = version.seq,
            rule = rule_id.raw(),
            symbol = grammar.symbol_name(rule.lhs),
            children = children.len(),
            "reduce"
        );

        version.entries.push(Entry {
            state: target,
            subtree: self.subtree(id, start),
        });
        // Reductions under an open ERROR run leave it open.
        if trailing.is_empty() {
            version.error_run = false;
        }
        version.entries.extend(trailing.into_iter().rev().map(|mut e| {
            e.state = target;
            e
        }));
        self.check_depth(version)
    }

    fn accept(&mut self, version: &Version, end: &Token) {
        let (root, start) = self.assemble_root(&version.entries, end);
        debug!(version = version.seq, error_cost = version.error_cost(), "accept");
        self.accepted.push(Accepted {
            seq: version.seq,
            root,
            start,
            error_cost: version.error_cost(),
            dynamic_precedence: version.dynamic_precedence(),
        });
    }

    /// The start-symbol node with the extras around it spliced in.
    fn assemble_root(&mut self, entries: &[Entry], end: &Token) -> (NodeId, TextLength) {
        let mut structural = entries.iter().filter(|e| !e.subtree.extra);
        let (Some(main), None) = (structural.next().copied(), structural.next()) else {
            return self.error_root(entries, end);
        };
        if entries.len() == 1 {
            return (main.subtree.id, main.subtree.start);
        }

        // A childless main node splices away, so the root starts at
        // whatever comes first after splicing.
        let mut placed: SmallVec<[(NodeId, TextLength); 8]> = SmallVec::new();
        for entry in entries {
            if entry.subtree.id == main.subtree.id && !entry.subtree.extra {
                placed.extend(
                    self.builder
                        .children(main.subtree.id)
                        .iter()
                        .map(|c| (c.node, main.subtree.start + c.offset)),
                );
            } else {
                placed.push((entry.subtree.id, entry.subtree.start));
            }
        }
        let start = placed.first().map_or(main.subtree.start, |&(_, at)| at);
        let children: SmallVec<[ChildRef; 8]> = placed
            .iter()
            .map(|&(node, at)| ChildRef::new(node, at - start))
            .collect();
        let info = self
            .builder
            .info(main.subtree.id)
            .unwrap_or(NodeInfo::DANGLING);
        let id = self.builder.branch(BranchSpec {
            symbol: main.subtree.symbol,
            rule: info.rule,
            children: &children,
            flags: NodeFlags::empty(),
            pre_state: StateId::START,
            follow_examined: 0,
            follow_lex_mode: info.follow_lex_mode,
        });
        (id, start)
    }

    /// Everything on the stack under one `ERROR` root.
    fn error_root(&mut self, entries: &[Entry], end: &Token) -> (NodeId, TextLength) {
        let start = entries.first().map_or(end.start, |e| e.subtree.start);
        let children: SmallVec<[ChildRef; 8]> = entries
            .iter()
            .map(|e| ChildRef::new(e.subtree.id, e.subtree.start - start))
            .collect();
        let id = self.builder.branch(BranchSpec {
            symbol: SymbolId::ERROR,
            rule: RuleId::NONE,
            children: &children,
            flags: NodeFlags::empty(),
            pre_state: StateId::START,
            follow_examined: 0,
            follow_lex_mode: end.lex_mode,
        });
        (id, start)
    }

    /// Merge versions that reached the same configuration.
    fn merge_versions(&mut self) {
        'restart: loop {
            for i in 0..self.versions.len() {
                for j in i + 1..self.versions.len() {
                    if !self.versions[i].same_configuration(&self.versions[j]) {
                        continue;
                    }
                    let (winner, loser) = if self.versions[i].preferred_over(&self.versions[j]) {
                        (i, j)
                    } else {
                        (j, i)
                    };
                    self.record_alternative(winner, loser);
                    debug!(
                        winner = self.versions[winner].seq,
                        loser = self.versions[loser].seq,
                        position = self.versions[winner].position.bytes,
                        "merge"
                    );
                    self.versions.swap_remove(loser);
                    self.stats.merges += 1;
                    continue 'restart;
                }
            }
            return;
        }
    }

    /// When two merging stacks differ in exactly one subtree, keep the
    /// loser's subtree as an alternative of the winner's.
    fn record_alternative(&mut self, winner: usize, loser: usize) {
        let pair = {
            let grammar = self.grammar;
            let same = |a: &Subtree, b: &Subtree| {
                a.id == b.id
                    || (grammar.is_token(a.symbol)
                        && a.symbol == b.symbol
                        && a.start == b.start
                        && a.len == b.len
                        && a.extra == b.extra)
            };
            let mut differing = self.versions[winner]
                .entries
                .iter()
                .zip(&self.versions[loser].entries)
                .filter(|(a, b)| !same(&a.subtree, &b.subtree));
            match (differing.next(), differing.next()) {
                (Some((a, b)), None)
                    if a.subtree.start == b.subtree.start && a.subtree.len == b.subtree.len =>
                {
                    Some((a.subtree.id, b.subtree.id))
                }
                _ => None,
            }
        };
        if let Some((node, alternative)) = pair {
            if self.builder.add_alternative(node, alternative) {
                debug!(?node, ?alternative, "recorded alternative");
            }
        }
    }

    fn finish(mut self) -> Result<ParseOutput, ParseError> {
        let best = self
            .accepted
            .iter()
            .min_by_key(|a| (a.error_cost, Reverse(a.dynamic_precedence), a.seq))
            .copied();
        let (root, start) = match best {
            Some(best) => (best.root, best.start),
            None => {
                let end = self.lexer.next_token(StateId::START, self.text_len);
                self.error_root(&[], &end)
            }
        };

        let mut stats = self.stats;
        let tree = self.builder.finish(root, start, self.text_len);
        let total = tree.root_node().descendant_count() as usize;
        stats.nodes_created = total.saturating_sub(stats.nodes_reused);
        debug!(
            nodes = total,
            reused = stats.nodes_reused,
            tokens = stats.tokens_lexed,
            forks = stats.forks,
            recoveries = stats.recoveries,
            "parse finished"
        );
        Ok(ParseOutput { tree, stats })
    }
}
