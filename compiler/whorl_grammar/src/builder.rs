//! Programmatic grammar construction.
//!
//! Grammar compilers emit serialized tables; the builder is for grammars
//! written by hand and for tests. Symbols are numbered in declaration order,
//! so every token (terminal, extra or external) must be declared before the
//! first non-terminal. States are addressed by explicit ids so tables can be
//! transcribed from an LR automaton listing.

use rustc_hash::FxHashMap;
use smallvec::SmallVec;
use whorl_ir::{FieldId, LexStateId, RuleId, StateId, SymbolId};

use crate::grammar::Tables;
use crate::{
    CharClass, Grammar, GrammarError, LexMode, LexState, ParseAction, Precedence, Rule,
    SymbolInfo, SymbolKind,
};

/// Name of the end-of-input symbol.
pub const END_NAME: &str = "end";

type Cell = SmallVec<[ParseAction; 2]>;

/// Builder for [`Grammar`].
///
/// # Example
///
/// ```
/// use whorl_grammar::{CharClass, GrammarBuilder, LexMode, LexState, ParseAction, Rule};
/// use whorl_ir::{LexStateId, StateId};
///
/// // item := 'x'
/// let mut b = GrammarBuilder::new("tiny");
/// let x = b.terminal("x", false);
/// let item = b.nonterminal("item");
/// let rule = b.rule(Rule::new(item, 1));
/// b.start(item);
///
/// let l0 = LexStateId::new(0);
/// let l1 = LexStateId::new(1);
/// b.set_lex_state(l0, LexState::new().on(CharClass::char('x'), l1));
/// b.set_lex_state(l1, LexState::new().accept(x));
///
/// let (s0, s1, s2) = (StateId::new(0), StateId::new(1), StateId::new(2));
/// b.shift(s0, x, s1);
/// b.goto(s0, item, s2);
/// b.reduce(s1, &[whorl_ir::SymbolId::END], rule);
/// b.accept(s2);
///
/// let grammar = b.build().unwrap();
/// assert_eq!(grammar.state_count(), 3);
/// ```
#[derive(Clone, Debug)]
pub struct GrammarBuilder {
    name: String,
    revision: u32,
    symbols: Vec<SymbolInfo>,
    token_precedence: FxHashMap<SymbolId, Precedence>,
    fields: Vec<String>,
    rules: Vec<Rule>,
    start_symbol: Option<SymbolId>,
    lex_modes: FxHashMap<StateId, LexMode>,
    cells: FxHashMap<(StateId, SymbolId), Cell>,
    gotos: FxHashMap<(StateId, SymbolId), StateId>,
    max_state: Option<StateId>,
    lex_states: FxHashMap<LexStateId, LexState>,
    separators: CharClass,
    externals: Vec<SymbolId>,
    external_states: Vec<Vec<SymbolId>>,
    extras_everywhere: Vec<SymbolId>,
}

impl GrammarBuilder {
    /// Start a grammar. Symbol 0 (`end`) is declared automatically.
    pub fn new(name: impl Into<String>) -> Self {
        GrammarBuilder {
            name: name.into(),
            revision: 0,
            symbols: vec![SymbolInfo {
                name: END_NAME.to_string(),
                kind: SymbolKind::Terminal,
                named: false,
                extra: false,
            }],
            token_precedence: FxHashMap::default(),
            fields: Vec::new(),
            rules: Vec::new(),
            start_symbol: None,
            lex_modes: FxHashMap::default(),
            cells: FxHashMap::default(),
            gotos: FxHashMap::default(),
            max_state: None,
            lex_states: FxHashMap::default(),
            separators: CharClass::empty(),
            externals: Vec::new(),
            external_states: Vec::new(),
            extras_everywhere: Vec::new(),
        }
    }

    pub fn revision(&mut self, revision: u32) -> &mut Self {
        self.revision = revision;
        self
    }

    fn push_symbol(&mut self, name: &str, kind: SymbolKind, named: bool, extra: bool) -> SymbolId {
        let id = SymbolId::new(whorl_ir::to_u16(self.symbols.len(), "symbols"));
        self.symbols.push(SymbolInfo {
            name: name.to_string(),
            kind,
            named,
            extra,
        });
        id
    }

    /// Declare a terminal produced by the lex DFA.
    pub fn terminal(&mut self, name: &str, named: bool) -> SymbolId {
        self.push_symbol(name, SymbolKind::Terminal, named, false)
    }

    /// Declare an extra terminal (comment, etc.).
    pub fn extra(&mut self, name: &str, named: bool) -> SymbolId {
        self.push_symbol(name, SymbolKind::Terminal, named, true)
    }

    /// Declare a token produced by the external scanner.
    pub fn external(&mut self, name: &str, named: bool) -> SymbolId {
        let id = self.push_symbol(name, SymbolKind::External, named, false);
        self.externals.push(id);
        id
    }

    /// Declare a non-terminal.
    pub fn nonterminal(&mut self, name: &str) -> SymbolId {
        self.push_symbol(name, SymbolKind::NonTerminal, true, false)
    }

    /// Declare (or look up) a field name.
    pub fn field(&mut self, name: &str) -> FieldId {
        let index = match self.fields.iter().position(|f| f == name) {
            Some(index) => index,
            None => {
                self.fields.push(name.to_string());
                self.fields.len() - 1
            }
        };
        FieldId::new(whorl_ir::to_u16(index, "fields"))
    }

    /// Attach static precedence to a token.
    pub fn precedence(&mut self, token: SymbolId, precedence: Precedence) -> &mut Self {
        self.token_precedence.insert(token, precedence);
        self
    }

    pub fn rule(&mut self, rule: Rule) -> RuleId {
        self.rules.push(rule);
        RuleId::new(whorl_ir::to_u16(self.rules.len() - 1, "rules"))
    }

    pub fn start(&mut self, symbol: SymbolId) -> &mut Self {
        self.start_symbol = Some(symbol);
        self
    }

    /// Characters skipped before every token.
    pub fn separators(&mut self, class: CharClass) -> &mut Self {
        self.separators = class;
        self
    }

    pub fn set_lex_state(&mut self, id: LexStateId, state: LexState) -> &mut Self {
        self.lex_states.insert(id, state);
        self
    }

    /// Declare a set of valid external tokens; returns the external lex state
    /// to use in [`LexMode::with_externals`].
    pub fn external_lex_state(&mut self, valid: &[SymbolId]) -> u16 {
        self.external_states.push(valid.to_vec());
        whorl_ir::to_u16(self.external_states.len(), "external lex states")
    }

    fn touch(&mut self, state: StateId) {
        self.max_state = Some(self.max_state.map_or(state, |m| m.max(state)));
    }

    /// Set the lex mode of a parse state (default: lex state 0, no externals).
    pub fn lex_mode(&mut self, state: StateId, mode: LexMode) -> &mut Self {
        self.touch(state);
        self.lex_modes.insert(state, mode);
        self
    }

    /// Append an action to a cell. More than one action makes the cell ambiguous.
    pub fn action(&mut self, state: StateId, symbol: SymbolId, action: ParseAction) -> &mut Self {
        self.touch(state);
        if let ParseAction::Shift(target) = action {
            self.touch(target);
        }
        let cell = self.cells.entry((state, symbol)).or_default();
        if !cell.contains(&action) {
            cell.push(action);
        }
        self
    }

    pub fn shift(&mut self, state: StateId, symbol: SymbolId, target: StateId) -> &mut Self {
        self.action(state, symbol, ParseAction::Shift(target))
    }

    /// Reduce by `rule` on each of the lookaheads.
    pub fn reduce(&mut self, state: StateId, lookaheads: &[SymbolId], rule: RuleId) -> &mut Self {
        for &symbol in lookaheads {
            self.action(state, symbol, ParseAction::Reduce(rule));
        }
        self
    }

    /// Accept on end of input.
    pub fn accept(&mut self, state: StateId) -> &mut Self {
        self.action(state, SymbolId::END, ParseAction::Accept)
    }

    pub fn goto(&mut self, state: StateId, nonterminal: SymbolId, target: StateId) -> &mut Self {
        self.touch(state);
        self.touch(target);
        self.gotos.insert((state, nonterminal), target);
        self
    }

    /// Allow an extra token in every state that has no other use for it.
    pub fn extra_everywhere(&mut self, symbol: SymbolId) -> &mut Self {
        self.extras_everywhere.push(symbol);
        self
    }

    /// Assemble and validate the tables.
    pub fn build(&self) -> Result<Grammar, GrammarError> {
        if self.symbols.len() >= usize::from(u16::MAX) {
            return Err(GrammarError::TooManySymbols(self.symbols.len()));
        }
        let token_count = self.symbols.iter().take_while(|s| s.is_token()).count();
        if let Some(late) = self.symbols[token_count..].iter().find(|s| s.is_token()) {
            return Err(GrammarError::SymbolOrder {
                name: late.name.clone(),
            });
        }
        let nonterminal_count = self.symbols.len() - token_count;
        let state_count = self.max_state.map_or(0, |s| s.index() + 1);
        let start_symbol = self
            .start_symbol
            .or_else(|| self.rules.first().map(|r| r.lhs))
            .ok_or(GrammarError::InvalidStartSymbol(0))?;

        for &(state, symbol) in self.cells.keys() {
            if symbol.index() >= token_count {
                return Err(GrammarError::ActionOnNonTerminal {
                    state: state.raw(),
                    name: self.symbol_name(symbol),
                });
            }
        }
        for &(state, symbol) in self.gotos.keys() {
            if symbol.index() < token_count || symbol.index() >= self.symbols.len() {
                return Err(GrammarError::GotoOnToken {
                    state: state.raw(),
                    name: self.symbol_name(symbol),
                });
            }
        }

        let mut cells = Vec::with_capacity(state_count * token_count);
        let mut actions = Vec::new();
        for state in 0..state_count {
            let state = StateId::new(whorl_ir::to_u16(state, "states"));
            for token in 0..token_count {
                let symbol = SymbolId::new(whorl_ir::to_u16(token, "symbols"));
                let start = whorl_ir::to_u32(actions.len(), "actions");
                match self.cells.get(&(state, symbol)) {
                    Some(cell) => actions.extend_from_slice(cell),
                    None if self.extras_everywhere.contains(&symbol) => {
                        actions.push(ParseAction::ShiftExtra);
                    }
                    None => {}
                }
                let len = whorl_ir::to_u16(actions.len() - start as usize, "actions in cell");
                cells.push((start, len));
            }
        }

        let mut gotos = vec![u16::MAX; state_count * nonterminal_count];
        for (&(state, symbol), &target) in &self.gotos {
            gotos[state.index() * nonterminal_count + symbol.index() - token_count] = target.raw();
        }

        let lex_modes = (0..state_count)
            .map(|s| {
                let id = StateId::new(whorl_ir::to_u16(s, "states"));
                self.lex_modes.get(&id).copied().unwrap_or_default()
            })
            .collect();

        let lex_state_count = self.lex_states.keys().map(|id| id.index() + 1).max().unwrap_or(0);
        let mut lex_states = Vec::with_capacity(lex_state_count);
        for i in 0..lex_state_count {
            let id = LexStateId::new(whorl_ir::to_u16(i, "lex states"));
            let state = self
                .lex_states
                .get(&id)
                .cloned()
                .ok_or(GrammarError::LexStateOutOfRange {
                    state: id.raw(),
                    count: self.lex_states.len(),
                })?;
            lex_states.push(state);
        }

        let mut external_states = vec![vec![false; self.externals.len()]];
        for valid in &self.external_states {
            let row = self
                .externals
                .iter()
                .map(|external| valid.contains(external))
                .collect();
            external_states.push(row);
        }

        let token_precedence = (0..token_count)
            .map(|t| {
                let id = SymbolId::new(whorl_ir::to_u16(t, "symbols"));
                self.token_precedence.get(&id).copied()
            })
            .collect();

        Grammar::from_tables(Tables {
            name: self.name.clone(),
            revision: self.revision,
            symbols: self.symbols.clone(),
            token_count: whorl_ir::to_u16(token_count, "tokens"),
            start_symbol,
            fields: self.fields.clone(),
            rules: self.rules.clone(),
            token_precedence,
            state_count: whorl_ir::to_u16(state_count, "states"),
            cells,
            actions,
            gotos,
            lex_modes,
            lex_states,
            separators: self.separators.clone(),
            externals: self.externals.clone(),
            external_states,
        })
    }

    fn symbol_name(&self, symbol: SymbolId) -> String {
        self.symbols
            .get(symbol.index())
            .map_or_else(|| format!("#{}", symbol.raw()), |s| s.name.clone())
    }
}
