//! The compiled grammar: symbol table, parse table and lex table.

use std::fmt;
use std::hash::Hasher;
use std::sync::Arc;

use rustc_hash::FxHasher;
use serde::{Deserialize, Serialize};
use tracing::debug;
use whorl_ir::{FieldId, LexStateId, RuleId, StateId, SymbolId};

use crate::{
    action, Action, CharClass, ExternalScanner, GrammarError, LexMode, LexState, ParseAction,
    Precedence, Rule, SymbolInfo, SymbolKind,
};

/// Leading bytes of serialized tables.
const MAGIC: &[u8; 8] = b"WHRLGRAM";

/// Bumped whenever the serialized layout changes.
pub const FORMAT_VERSION: u32 = 1;

/// Goto-table value for "no transition".
const NO_GOTO: u16 = u16::MAX;

/// Name used for the built-in error symbol.
pub const ERROR_NAME: &str = "ERROR";

/// Identity of a grammar revision.
///
/// Two grammars with equal tags have identical tables. Trees record the tag
/// of the grammar that built them, so reparsing with a different grammar and
/// loading a stale tree cache can both be rejected.
#[derive(Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct GrammarTag {
    pub name: String,
    pub revision: u32,
    /// Hash of the serialized tables.
    pub fingerprint: u64,
}

impl fmt::Display for GrammarTag {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}@{}#{:016x}", self.name, self.revision, self.fingerprint)
    }
}

/// The serializable part of a grammar.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub(crate) struct Tables {
    pub(crate) name: String,
    pub(crate) revision: u32,
    pub(crate) symbols: Vec<SymbolInfo>,
    /// Symbols `0..token_count` are tokens, the rest non-terminals.
    pub(crate) token_count: u16,
    pub(crate) start_symbol: SymbolId,
    pub(crate) fields: Vec<String>,
    pub(crate) rules: Vec<Rule>,
    /// Indexed by token.
    pub(crate) token_precedence: Vec<Option<Precedence>>,
    pub(crate) state_count: u16,
    /// `state * token_count + token` → `(start, len)` in `actions`.
    pub(crate) cells: Vec<(u32, u16)>,
    pub(crate) actions: Vec<ParseAction>,
    /// `state * nonterminal_count + (symbol - token_count)` → state.
    pub(crate) gotos: Vec<u16>,
    pub(crate) lex_modes: Vec<LexMode>,
    pub(crate) lex_states: Vec<LexState>,
    pub(crate) separators: CharClass,
    pub(crate) externals: Vec<SymbolId>,
    /// Row 0 marks every external token invalid.
    pub(crate) external_states: Vec<Vec<bool>>,
}

/// An immutable compiled grammar.
///
/// Built with [`GrammarBuilder`](crate::GrammarBuilder) or loaded with
/// [`Grammar::from_bytes`], then shared through a
/// [`GrammarHandle`](crate::GrammarHandle).
pub struct Grammar {
    tables: Tables,
    tag: GrammarTag,
    scanner: Option<Arc<dyn ExternalScanner>>,
}

impl Grammar {
    /// Validate tables and compute the tag.
    pub(crate) fn from_tables(tables: Tables) -> Result<Self, GrammarError> {
        tables.validate()?;
        let body = bincode::serialize(&tables).map_err(|e| GrammarError::Encode(e.to_string()))?;
        let tag = GrammarTag {
            name: tables.name.clone(),
            revision: tables.revision,
            fingerprint: fingerprint(&body),
        };
        Ok(Grammar {
            tables,
            tag,
            scanner: None,
        })
    }

    /// Serialize the tables. The external scanner is native code and is not
    /// included; reattach it with [`Grammar::with_external_scanner`].
    pub fn to_bytes(&self) -> Result<Vec<u8>, GrammarError> {
        let body =
            bincode::serialize(&self.tables).map_err(|e| GrammarError::Encode(e.to_string()))?;
        let mut out = Vec::with_capacity(MAGIC.len() + 4 + body.len());
        out.extend_from_slice(MAGIC);
        out.extend_from_slice(&FORMAT_VERSION.to_le_bytes());
        out.extend_from_slice(&body);
        Ok(out)
    }

    /// Load tables written by [`Grammar::to_bytes`], validating them.
    pub fn from_bytes(bytes: &[u8]) -> Result<Self, GrammarError> {
        let rest = bytes.strip_prefix(MAGIC).ok_or(GrammarError::BadMagic)?;
        if rest.len() < 4 {
            return Err(GrammarError::BadMagic);
        }
        let (version, body) = rest.split_at(4);
        let mut raw = [0u8; 4];
        raw.copy_from_slice(version);
        let found = u32::from_le_bytes(raw);
        if found != FORMAT_VERSION {
            return Err(GrammarError::UnsupportedVersion {
                found,
                expected: FORMAT_VERSION,
            });
        }
        let tables: Tables =
            bincode::deserialize(body).map_err(|e| GrammarError::Decode(e.to_string()))?;
        let grammar = Grammar::from_tables(tables)?;
        debug!(tag = %grammar.tag, "loaded grammar tables");
        Ok(grammar)
    }

    /// Attach the native scanner for this grammar's external tokens.
    #[must_use]
    pub fn with_external_scanner(mut self, scanner: Arc<dyn ExternalScanner>) -> Self {
        self.scanner = Some(scanner);
        self
    }

    pub fn external_scanner(&self) -> Option<&dyn ExternalScanner> {
        self.scanner.as_deref()
    }

    pub fn tag(&self) -> &GrammarTag {
        &self.tag
    }

    pub fn name(&self) -> &str {
        &self.tables.name
    }

    // === Symbols ===

    /// Number of symbols, not counting the built-in `ERROR` symbol.
    #[inline]
    pub fn symbol_count(&self) -> usize {
        self.tables.symbols.len()
    }

    /// Number of tokens (terminals and external tokens, `END` included).
    #[inline]
    pub fn token_count(&self) -> usize {
        usize::from(self.tables.token_count)
    }

    #[inline]
    pub fn is_valid_symbol(&self, symbol: SymbolId) -> bool {
        symbol.is_error() || symbol.index() < self.tables.symbols.len()
    }

    pub fn symbol_info(&self, symbol: SymbolId) -> Option<&SymbolInfo> {
        self.tables.symbols.get(symbol.index())
    }

    /// Display name of a symbol.
    pub fn symbol_name(&self, symbol: SymbolId) -> &str {
        if symbol.is_error() {
            return ERROR_NAME;
        }
        self.symbol_info(symbol).map_or("<unknown>", |s| s.name.as_str())
    }

    /// Look up a symbol by name and namedness.
    pub fn symbol_for_name(&self, name: &str, named: bool) -> Option<SymbolId> {
        if named && name == ERROR_NAME {
            return Some(SymbolId::ERROR);
        }
        self.tables
            .symbols
            .iter()
            .position(|s| s.named == named && s.name == name)
            .map(|i| SymbolId::new(whorl_ir::to_u16(i, "symbols")))
    }

    /// Named symbols show up in s-expressions and match `(_)`.
    #[inline]
    pub fn is_named(&self, symbol: SymbolId) -> bool {
        symbol.is_error() || self.symbol_info(symbol).is_some_and(|s| s.named)
    }

    #[inline]
    pub fn is_extra(&self, symbol: SymbolId) -> bool {
        self.symbol_info(symbol).is_some_and(|s| s.extra)
    }

    /// Tokens come from the lexer; everything else from reductions.
    #[inline]
    pub fn is_token(&self, symbol: SymbolId) -> bool {
        symbol.index() < self.token_count()
    }

    #[inline]
    pub fn is_external(&self, symbol: SymbolId) -> bool {
        self.symbol_info(symbol)
            .is_some_and(|s| s.kind == SymbolKind::External)
    }

    pub fn start_symbol(&self) -> SymbolId {
        self.tables.start_symbol
    }

    /// Static precedence of a token, if declared.
    pub fn token_precedence(&self, symbol: SymbolId) -> Option<Precedence> {
        self.tables
            .token_precedence
            .get(symbol.index())
            .copied()
            .flatten()
    }

    // === Fields ===

    pub fn field_count(&self) -> usize {
        self.tables.fields.len()
    }

    pub fn field_name(&self, field: FieldId) -> Option<&str> {
        self.tables.fields.get(field.index()).map(String::as_str)
    }

    pub fn field_id(&self, name: &str) -> Option<FieldId> {
        self.tables
            .fields
            .iter()
            .position(|f| f == name)
            .map(|i| FieldId::new(whorl_ir::to_u16(i, "fields")))
    }

    // === Rules ===

    pub fn rule_count(&self) -> usize {
        self.tables.rules.len()
    }

    pub fn rule(&self, rule: RuleId) -> Option<&Rule> {
        self.tables.rules.get(rule.index())
    }

    // === Parse table ===

    #[inline]
    pub fn state_count(&self) -> usize {
        usize::from(self.tables.state_count)
    }

    /// Raw action cell. Empty for out-of-range states and non-tokens.
    #[inline]
    pub fn actions(&self, state: StateId, symbol: SymbolId) -> &[ParseAction] {
        if state.index() >= self.state_count() || !self.is_token(symbol) {
            return &[];
        }
        let (start, len) = self.tables.cells[state.index() * self.token_count() + symbol.index()];
        let start = start as usize;
        &self.tables.actions[start..start + usize::from(len)]
    }

    /// Action for a token in a state.
    #[inline]
    pub fn action(&self, state: StateId, symbol: SymbolId) -> Action<'_> {
        Action::from_cell(self.actions(state, symbol))
    }

    /// Whether the token has any action in the state.
    #[inline]
    pub fn has_action(&self, state: StateId, symbol: SymbolId) -> bool {
        !self.actions(state, symbol).is_empty()
    }

    /// Target of the goto on a non-terminal.
    #[inline]
    pub fn goto(&self, state: StateId, nonterminal: SymbolId) -> Option<StateId> {
        let nt = nonterminal.index().checked_sub(self.token_count())?;
        let nt_count = self.symbol_count() - self.token_count();
        if nt >= nt_count || state.index() >= self.state_count() {
            return None;
        }
        match self.tables.gotos[state.index() * nt_count + nt] {
            NO_GOTO => None,
            target => Some(StateId::new(target)),
        }
    }

    /// Lex mode of a parse state.
    #[inline]
    pub fn lex_mode(&self, state: StateId) -> LexMode {
        self.tables
            .lex_modes
            .get(state.index())
            .copied()
            .unwrap_or_default()
    }

    /// Tokens with a non-extra action in the state, excluding `END`.
    pub fn expected_tokens(&self, state: StateId) -> impl Iterator<Item = SymbolId> + '_ {
        (1..self.tables.token_count)
            .map(SymbolId::new)
            .filter(move |&sym| {
                self.actions(state, sym)
                    .iter()
                    .any(|a| *a != ParseAction::ShiftExtra)
            })
    }

    /// Resolve an ambiguous cell with static precedence and associativity.
    ///
    /// `None` means the conflict resolves to a syntax error.
    pub fn resolve(&self, actions: &[ParseAction], lookahead: SymbolId) -> Option<ParseAction> {
        action::resolve(actions, self.token_precedence(lookahead), |rule| {
            self.rule(rule).and_then(|r| r.precedence)
        })
    }

    // === Lex table ===

    pub fn lex_state(&self, state: LexStateId) -> Option<&LexState> {
        self.tables.lex_states.get(state.index())
    }

    pub fn lex_state_count(&self) -> usize {
        self.tables.lex_states.len()
    }

    /// Characters skipped before every token.
    pub fn separators(&self) -> &CharClass {
        &self.tables.separators
    }

    /// External tokens, in the order the scanner indexes them.
    pub fn external_tokens(&self) -> &[SymbolId] {
        &self.tables.externals
    }

    /// Validity of each external token for an external lex state.
    pub fn external_valid(&self, external_lex_state: u16) -> &[bool] {
        self.tables
            .external_states
            .get(usize::from(external_lex_state))
            .map_or(&[], Vec::as_slice)
    }
}

impl fmt::Debug for Grammar {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Grammar")
            .field("tag", &self.tag)
            .field("symbols", &self.symbol_count())
            .field("states", &self.state_count())
            .field("external_scanner", &self.scanner.is_some())
            .finish_non_exhaustive()
    }
}

fn fingerprint(bytes: &[u8]) -> u64 {
    let mut hasher = FxHasher::default();
    hasher.write(bytes);
    hasher.finish()
}

impl Tables {
    fn nonterminal_count(&self) -> usize {
        self.symbols.len() - usize::from(self.token_count)
    }

    /// Check every cross-reference in the tables.
    pub(crate) fn validate(&self) -> Result<(), GrammarError> {
        self.validate_symbols()?;
        self.validate_rules()?;
        self.validate_parse_table()?;
        self.validate_lex_table()?;
        self.validate_externals()
    }

    fn validate_symbols(&self) -> Result<(), GrammarError> {
        if self.symbols.len() >= usize::from(u16::MAX) {
            return Err(GrammarError::TooManySymbols(self.symbols.len()));
        }
        match self.symbols.first() {
            Some(end) if end.kind == SymbolKind::Terminal => {}
            _ => return Err(GrammarError::MissingEndSymbol),
        }
        let tokens = usize::from(self.token_count);
        if tokens > self.symbols.len() {
            return Err(GrammarError::MalformedTable("token count exceeds symbol count"));
        }
        for (i, symbol) in self.symbols.iter().enumerate() {
            if symbol.is_token() != (i < tokens) {
                return Err(GrammarError::SymbolOrder {
                    name: symbol.name.clone(),
                });
            }
        }
        let start = self.start_symbol.index();
        if start < tokens || start >= self.symbols.len() {
            return Err(GrammarError::InvalidStartSymbol(self.start_symbol.raw()));
        }
        if self.token_precedence.len() != tokens {
            return Err(GrammarError::MalformedTable("token precedence length"));
        }
        Ok(())
    }

    fn validate_rules(&self) -> Result<(), GrammarError> {
        let tokens = usize::from(self.token_count);
        for (i, rule) in self.rules.iter().enumerate() {
            let lhs = rule.lhs.index();
            if lhs < tokens || lhs >= self.symbols.len() {
                return Err(GrammarError::UnknownSymbol {
                    symbol: rule.lhs.raw(),
                    context: "rule left-hand side",
                });
            }
            for mapping in &rule.fields {
                if mapping.child_index >= rule.rhs_len {
                    return Err(GrammarError::FieldOutOfRange {
                        rule: whorl_ir::to_u16(i, "rules"),
                        child_index: mapping.child_index,
                        rhs_len: rule.rhs_len,
                    });
                }
                if mapping.field.index() >= self.fields.len() {
                    return Err(GrammarError::UnknownField(mapping.field.raw()));
                }
            }
        }
        Ok(())
    }

    fn validate_parse_table(&self) -> Result<(), GrammarError> {
        let states = usize::from(self.state_count);
        if self.cells.len() != states * usize::from(self.token_count) {
            return Err(GrammarError::MalformedTable("action cell count"));
        }
        if self.gotos.len() != states * self.nonterminal_count() {
            return Err(GrammarError::MalformedTable("goto count"));
        }
        if self.lex_modes.len() != states {
            return Err(GrammarError::MalformedTable("lex mode count"));
        }
        for &(start, len) in &self.cells {
            let end = start as usize + usize::from(len);
            if end > self.actions.len() {
                return Err(GrammarError::MalformedTable("action cell out of bounds"));
            }
        }
        for action in &self.actions {
            match *action {
                ParseAction::Shift(target) if target.index() >= states => {
                    return Err(GrammarError::StateOutOfRange {
                        state: target.raw(),
                        count: states,
                    });
                }
                ParseAction::Reduce(rule) if rule.index() >= self.rules.len() => {
                    return Err(GrammarError::RuleOutOfRange {
                        rule: rule.raw(),
                        count: self.rules.len(),
                    });
                }
                _ => {}
            }
        }
        for &target in &self.gotos {
            if target != NO_GOTO && usize::from(target) >= states {
                return Err(GrammarError::StateOutOfRange {
                    state: target,
                    count: states,
                });
            }
        }
        for mode in &self.lex_modes {
            if mode.lex_state.index() >= self.lex_states.len() {
                return Err(GrammarError::LexStateOutOfRange {
                    state: mode.lex_state.raw(),
                    count: self.lex_states.len(),
                });
            }
            if usize::from(mode.external_lex_state) >= self.external_states.len() {
                return Err(GrammarError::ExternalStateOutOfRange {
                    state: mode.external_lex_state,
                    count: self.external_states.len(),
                });
            }
        }
        Ok(())
    }

    fn validate_lex_table(&self) -> Result<(), GrammarError> {
        if !self.separators.is_normalized() {
            return Err(GrammarError::MalformedTable("separator class not normalized"));
        }
        for state in &self.lex_states {
            if let Some(symbol) = state.accept {
                let ok = self
                    .symbols
                    .get(symbol.index())
                    .is_some_and(|s| s.kind == SymbolKind::Terminal)
                    && !symbol.is_end();
                if !ok {
                    return Err(GrammarError::UnknownSymbol {
                        symbol: symbol.raw(),
                        context: "lex state accept",
                    });
                }
            }
            for (class, target) in &state.transitions {
                if !class.is_normalized() {
                    return Err(GrammarError::MalformedTable("character class not normalized"));
                }
                if target.index() >= self.lex_states.len() {
                    return Err(GrammarError::LexStateOutOfRange {
                        state: target.raw(),
                        count: self.lex_states.len(),
                    });
                }
            }
        }
        Ok(())
    }

    fn validate_externals(&self) -> Result<(), GrammarError> {
        for &symbol in &self.externals {
            let ok = self
                .symbols
                .get(symbol.index())
                .is_some_and(|s| s.kind == SymbolKind::External);
            if !ok {
                return Err(GrammarError::UnknownSymbol {
                    symbol: symbol.raw(),
                    context: "external token list",
                });
            }
        }
        for (i, symbol) in self.symbols.iter().enumerate() {
            if symbol.kind == SymbolKind::External
                && !self.externals.iter().any(|e| e.index() == i)
            {
                return Err(GrammarError::UndeclaredExternal {
                    name: symbol.name.clone(),
                });
            }
        }
        match self.external_states.first() {
            Some(row) if row.iter().all(|valid| !valid) => {}
            _ => return Err(GrammarError::MalformedTable("external state row 0 must be empty")),
        }
        if self
            .external_states
            .iter()
            .any(|row| row.len() != self.externals.len())
        {
            return Err(GrammarError::MalformedTable("external state row width"));
        }
        Ok(())
    }
}
