//! The public parser entry points.

use tracing::debug;
use whorl_grammar::GrammarHandle;
use whorl_ir::{ChangeMarker, InputEdit, TextChange};
use whorl_lexer::SourceBuffer;
use whorl_tree::{Tree, TreeBuilder};

use crate::driver::Run;
use crate::incremental::ReusableNodes;
use crate::{ParseError, ParseOptions, ParseStats};

/// Largest source the parser accepts, in bytes. Offsets are `u32` and the
/// lexer peeks one byte past the end.
pub const MAX_SOURCE_LEN: usize = u32::MAX as usize - 1;

/// A parse result.
#[derive(Clone, Debug)]
pub struct ParseOutput {
    pub tree: Tree,
    pub stats: ParseStats,
}

/// Parses text with one grammar.
///
/// A parser holds no per-parse state; one parser can serve any number of
/// parses, from several threads at once.
#[derive(Clone, Debug)]
pub struct Parser {
    grammar: GrammarHandle,
    options: ParseOptions,
}

impl Parser {
    pub fn new(grammar: GrammarHandle) -> Self {
        Parser::with_options(grammar, ParseOptions::default())
    }

    pub fn with_options(grammar: GrammarHandle, options: ParseOptions) -> Self {
        Parser { grammar, options }
    }

    pub fn grammar(&self) -> &GrammarHandle {
        &self.grammar
    }

    pub fn options(&self) -> &ParseOptions {
        &self.options
    }

    pub fn set_options(&mut self, options: ParseOptions) {
        self.options = options;
    }

    /// Parse `text` from scratch.
    ///
    /// Syntax errors do not fail the parse; they are recovered from and
    /// show up in the tree as `ERROR` and `MISSING` nodes.
    #[tracing::instrument(level = "debug", skip_all, fields(grammar = %self.grammar.tag(), bytes = text.len()))]
    pub fn parse(&self, text: &[u8]) -> Result<ParseOutput, ParseError> {
        check_size(text)?;
        let source = SourceBuffer::new(text);
        let builder = TreeBuilder::new(self.grammar.clone());
        Run::new(&self.grammar, &self.options, &source, builder, None).run()
    }

    /// Parse `new_text`, the result of applying `edit` to the text of
    /// `prior`, reusing the parts of `prior` the edit cannot have changed.
    ///
    /// The result equals a fresh parse of `new_text`. `prior` is left
    /// untouched and stays valid.
    #[tracing::instrument(level = "debug", skip_all, fields(grammar = %self.grammar.tag(), bytes = new_text.len()))]
    pub fn reparse(
        &self,
        prior: &Tree,
        edit: &InputEdit,
        new_text: &[u8],
    ) -> Result<ParseOutput, ParseError> {
        if prior.grammar() != &self.grammar {
            return Err(ParseError::GrammarMismatch {
                tree: prior.grammar().tag().to_string(),
                parser: self.grammar.tag().to_string(),
            });
        }
        let change = check_edit(edit, prior, new_text)?;
        check_size(new_text)?;

        if change.is_noop() {
            debug!("no-op edit; returning the prior tree");
            let stats = ParseStats {
                nodes_reused: prior.root_node().descendant_count() as usize,
                subtrees_reused: 1,
                bytes_reused: new_text.len(),
                ..ParseStats::default()
            };
            return Ok(ParseOutput {
                tree: prior.clone(),
                stats,
            });
        }

        let source = SourceBuffer::new(new_text);
        let builder = TreeBuilder::with_prior(self.grammar.clone(), prior);
        let reusable = ReusableNodes::new(prior, ChangeMarker::from_change(&change));
        let output = Run::new(&self.grammar, &self.options, &source, builder, Some(reusable)).run()?;
        debug!(
            reuse_rate = output.stats.reuse_rate(),
            bytes_reused = output.stats.bytes_reused,
            "reparsed"
        );
        Ok(output)
    }

    /// Reparse after a plain byte-range change.
    pub fn reparse_change(
        &self,
        prior: &Tree,
        change: TextChange,
        old_text: &[u8],
        new_text: &[u8],
    ) -> Result<ParseOutput, ParseError> {
        self.reparse(prior, &InputEdit::from_change(change, old_text, new_text), new_text)
    }
}

fn check_size(text: &[u8]) -> Result<(), ParseError> {
    if text.len() > MAX_SOURCE_LEN {
        return Err(ParseError::SourceTooLarge {
            len: text.len(),
            max: MAX_SOURCE_LEN,
        });
    }
    Ok(())
}

fn check_edit(edit: &InputEdit, prior: &Tree, new_text: &[u8]) -> Result<TextChange, ParseError> {
    if edit.new_end_byte < edit.start_byte {
        return Err(ParseError::InvalidEdit(format!(
            "edit starts at byte {} but its new end is byte {}",
            edit.start_byte, edit.new_end_byte
        )));
    }
    let change = edit.change();
    let old_len = prior.text_len().bytes;
    if change.start > change.old_end {
        return Err(ParseError::InvalidEdit(format!(
            "edit starts at byte {} but ends at byte {}",
            change.start, change.old_end
        )));
    }
    if change.old_end > old_len {
        return Err(ParseError::InvalidEdit(format!(
            "edit ends at byte {} but the tree covers {old_len} bytes",
            change.old_end
        )));
    }
    let expected = u64::from(old_len) - u64::from(change.old_len()) + u64::from(change.new_len);
    if new_text.len() as u64 != expected {
        return Err(ParseError::InvalidEdit(format!(
            "new text is {} bytes but the edit implies {expected}",
            new_text.len()
        )));
    }
    Ok(change)
}
