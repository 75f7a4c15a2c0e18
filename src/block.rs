use crate::template::Template;

/// Background highlight classes, one per delimiter pair.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Highlight {
    /// `==text==`
    A,
    /// `{{text}}`
    B,
    /// `[[text]]`
    C,
    /// `((text))`
    D,
}

/// Foreground colors available through `{name}...{/name}`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum NamedColor {
    Red,
    Blue,
    Green,
    Orange,
}

impl NamedColor {
    pub const ALL: [NamedColor; 4] = [
        NamedColor::Red,
        NamedColor::Blue,
        NamedColor::Green,
        NamedColor::Orange,
    ];

    pub fn name(self) -> &'static str {
        match self {
            NamedColor::Red => "red",
            NamedColor::Blue => "blue",
            NamedColor::Green => "green",
            NamedColor::Orange => "orange",
        }
    }
}

/// Inline text spans with formatting
#[derive(Debug, Clone, PartialEq)]
pub enum Span {
    Text(String),
    Bold(Vec<Span>),
    Italic(Vec<Span>),
    Strike(Vec<Span>),
    Highlight(Highlight, Vec<Span>),
    Color(NamedColor, Vec<Span>),
    Link { url: String, content: Vec<Span> },
    /// Joins two source lines of the same paragraph.
    LineBreak,
}

impl Span {
    /// Child spans of a styled span; empty for leaves.
    pub fn children(&self) -> &[Span] {
        match self {
            Span::Text(_) | Span::LineBreak => &[],
            Span::Bold(inner)
            | Span::Italic(inner)
            | Span::Strike(inner)
            | Span::Highlight(_, inner)
            | Span::Color(_, inner)
            | Span::Link { content: inner, .. } => inner,
        }
    }

    /// Plain text of this span with all formatting dropped.
    pub fn plain_text(&self) -> String {
        match self {
            Span::Text(text) => text.clone(),
            Span::LineBreak => "\n".to_string(),
            _ => self.children().iter().map(Span::plain_text).collect(),
        }
    }
}

/// Accumulated formatting of a literal run: the union of every enclosing
/// span's style.
///
/// Named colors and highlights are separate categories; inside each the
/// innermost span wins, so a run carries at most one of each.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct StyleSet {
    pub bold: bool,
    pub italic: bool,
    pub strike: bool,
    pub highlight: Option<Highlight>,
    pub color: Option<NamedColor>,
    pub link: Option<String>,
}

impl StyleSet {
    pub fn is_plain(&self) -> bool {
        *self == StyleSet::default()
    }

    /// The style set seen by the children of `span`.
    pub fn within(&self, span: &Span) -> StyleSet {
        let mut next = self.clone();
        match span {
            Span::Bold(_) => next.bold = true,
            Span::Italic(_) => next.italic = true,
            Span::Strike(_) => next.strike = true,
            Span::Highlight(highlight, _) => next.highlight = Some(*highlight),
            Span::Color(color, _) => next.color = Some(*color),
            Span::Link { url, .. } => next.link = Some(url.clone()),
            Span::Text(_) | Span::LineBreak => {}
        }
        next
    }
}

/// Block-level elements parsed from the markup
#[derive(Debug, Clone, PartialEq)]
pub enum Block {
    Heading {
        level: u8,
        content: Vec<Span>,
    },
    Paragraph {
        content: Vec<Span>,
    },
    BulletItem {
        depth: usize,
        content: Vec<Span>,
    },
    NumberedItem {
        depth: usize,
        ordinal: u32,
        content: Vec<Span>,
    },
    Rule,
}

/// Everything the emitter needs: the blocks plus the selected template.
#[derive(Debug, Clone)]
pub struct Document {
    pub blocks: Vec<Block>,
    pub template: Template,
}

impl Document {
    pub fn new(blocks: Vec<Block>, template: Template) -> Self {
        Self { blocks, template }
    }
}
