use crate::block::{Block, Span};
use crate::inline;
use crate::lexer::{self, MarkerKind, Token};

/// Knobs for the block builder.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ParseOptions {
    /// Columns of leading whitespace per list nesting level.
    pub indent_width: usize,
    /// Start a numbered run at the number the author typed instead of 1.
    pub honor_list_start: bool,
}

impl Default for ParseOptions {
    fn default() -> Self {
        Self {
            indent_width: 2,
            honor_list_start: false,
        }
    }
}

/// Parse markup into a list of blocks
pub fn parse(markup: &str, options: &ParseOptions) -> Vec<Block> {
    let mut blocks = Vec::new();
    let mut state = ParseState::default();

    for tokens in lexer::tokenize(markup, options.indent_width) {
        process_line(&tokens, options, &mut state, &mut blocks);
    }
    state.flush_paragraph(&mut blocks);

    blocks
}

#[derive(Default)]
struct ParseState {
    // Lines of the paragraph being built
    paragraph: Vec<Span>,
    // Current run of numbered items
    numbering: Option<NumberedRun>,
}

struct NumberedRun {
    depth: usize,
    next: u32,
}

impl ParseState {
    fn flush_paragraph(&mut self, blocks: &mut Vec<Block>) {
        let content = std::mem::take(&mut self.paragraph);
        if !content.is_empty() {
            blocks.push(Block::Paragraph { content });
        }
    }

    fn next_ordinal(&mut self, depth: usize, hint: u32, options: &ParseOptions) -> u32 {
        if let Some(run) = self.numbering.as_mut() {
            if run.depth == depth {
                let ordinal = run.next;
                run.next = ordinal.saturating_add(1);
                return ordinal;
            }
        }
        let start = if options.honor_list_start { hint } else { 1 };
        self.numbering = Some(NumberedRun {
            depth,
            next: start.saturating_add(1),
        });
        start
    }
}

fn process_line(
    tokens: &[Token],
    options: &ParseOptions,
    state: &mut ParseState,
    blocks: &mut Vec<Block>,
) {
    match tokens.split_first() {
        // Blank line ends paragraphs and list runs
        None => {
            state.flush_paragraph(blocks);
            state.numbering = None;
        }

        Some((Token::BlockMarker { kind, level }, rest)) => {
            state.flush_paragraph(blocks);
            let content = inline::resolve(rest);
            match kind {
                MarkerKind::Heading => {
                    state.numbering = None;
                    blocks.push(Block::Heading {
                        level: (*level).clamp(1, 3) as u8,
                        content,
                    });
                }
                MarkerKind::Rule => {
                    state.numbering = None;
                    blocks.push(Block::Rule);
                }
                MarkerKind::Bullet => {
                    state.numbering = None;
                    blocks.push(Block::BulletItem {
                        depth: *level,
                        content,
                    });
                }
                MarkerKind::Numbered { hint } => {
                    let ordinal = state.next_ordinal(*level, *hint, options);
                    blocks.push(Block::NumberedItem {
                        depth: *level,
                        ordinal,
                        content,
                    });
                }
            }
        }

        // Unmarked line: paragraph text, joined to the previous line
        Some(_) => {
            state.numbering = None;
            let spans = inline::resolve(tokens);
            if !state.paragraph.is_empty() {
                state.paragraph.push(Span::LineBreak);
            }
            state.paragraph.extend(spans);
        }
    }
}
