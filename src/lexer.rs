//! Line tokenizer for the markup dialect
//!
//! Each line is split into an optional block marker, decided from the line's
//! leading characters alone, followed by inline tokens produced by a logos
//! lexer. Nothing here fails: characters that are not part of a recognized
//! delimiter come out as [`Token::Text`].

use logos::Logos;

use crate::block::{Highlight, NamedColor};

/// Kind of block marker found at the start of a line.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MarkerKind {
    Heading,
    Bullet,
    /// `hint` is the number the author typed.
    Numbered { hint: u32 },
    Rule,
}

/// Inline style delimiters.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Delimiter {
    Bold,
    Italic,
    /// `***`, a bold and an italic delimiter written together.
    BoldItalic,
    Strike,
    HighlightA,
    OpenHighlight(Highlight),
    CloseHighlight(Highlight),
    OpenColor(NamedColor),
    CloseColor(NamedColor),
}

impl Delimiter {
    /// The source text of the delimiter, used when it degrades to literal text.
    pub fn as_str(self) -> &'static str {
        match self {
            Delimiter::Bold => "**",
            Delimiter::Italic => "*",
            Delimiter::BoldItalic => "***",
            Delimiter::Strike => "~~",
            Delimiter::HighlightA => "==",
            Delimiter::OpenHighlight(Highlight::B) => "{{",
            Delimiter::CloseHighlight(Highlight::B) => "}}",
            Delimiter::OpenHighlight(Highlight::C) => "[[",
            Delimiter::CloseHighlight(Highlight::C) => "]]",
            Delimiter::OpenHighlight(Highlight::D) => "((",
            Delimiter::CloseHighlight(Highlight::D) => "))",
            // `==` is symmetric and always lexed as HighlightA
            Delimiter::OpenHighlight(Highlight::A) | Delimiter::CloseHighlight(Highlight::A) => "==",
            Delimiter::OpenColor(NamedColor::Red) => "{red}",
            Delimiter::OpenColor(NamedColor::Blue) => "{blue}",
            Delimiter::OpenColor(NamedColor::Green) => "{green}",
            Delimiter::OpenColor(NamedColor::Orange) => "{orange}",
            Delimiter::CloseColor(NamedColor::Red) => "{/red}",
            Delimiter::CloseColor(NamedColor::Blue) => "{/blue}",
            Delimiter::CloseColor(NamedColor::Green) => "{/green}",
            Delimiter::CloseColor(NamedColor::Orange) => "{/orange}",
        }
    }
}

/// A lexed unit of one line.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Token {
    /// `level` is the heading level for headings and the list depth otherwise.
    BlockMarker { kind: MarkerKind, level: usize },
    Delimiter(Delimiter),
    Text(String),
    Link { label: String, url: String },
}

/// Raw inline tokens. Longest match wins, so `[[` beats a failed link and
/// `{red}` beats a stray `{`.
#[derive(Logos, Debug, Clone, Copy, PartialEq)]
enum Inline {
    #[token("***")]
    TripleStar,
    #[token("**")]
    DoubleStar,
    #[token("*")]
    Star,
    #[token("~~")]
    Tildes,
    #[token("==")]
    Equals,
    #[token("{{")]
    OpenBraces,
    #[token("}}")]
    CloseBraces,
    #[token("[[")]
    OpenBrackets,
    #[token("]]")]
    CloseBrackets,
    #[token("((")]
    OpenParens,
    #[token("))")]
    CloseParens,
    #[regex(r"\{(red|blue|green|orange)\}")]
    OpenColor,
    #[regex(r"\{/(red|blue|green|orange)\}")]
    CloseColor,
    #[regex(r"\[[^\]\n]+\]\([^)\s]+\)")]
    Link,
    #[regex(r"[^*~={}\[\]()]+")]
    Text,
    // Lone delimiter characters that start nothing
    #[regex(r"[~={}\[\]()]")]
    Stray,
}

/// Tokenize the whole markup text, one token vector per line. `\n`, `\r\n`
/// and a lone `\r` all end a line.
pub fn tokenize(markup: &str, indent_width: usize) -> Vec<Vec<Token>> {
    markup
        .replace("\r\n", "\n")
        .split(['\n', '\r'])
        .map(|line| tokenize_line(line, indent_width))
        .collect()
}

/// Tokenize one line. Blank lines produce no tokens.
pub fn tokenize_line(line: &str, indent_width: usize) -> Vec<Token> {
    if line.trim().is_empty() {
        return Vec::new();
    }

    let indent_width = indent_width.max(1);
    let (columns, rest) = split_indent(line, indent_width);
    let depth = columns / indent_width;

    let mut tokens = Vec::new();
    let inline = match detect_marker(rest) {
        Some((kind, heading_level, remainder)) => {
            tokens.push(Token::BlockMarker {
                kind,
                level: heading_level.unwrap_or(depth),
            });
            remainder
        }
        None => rest,
    };
    tokens.extend(tokenize_inline(inline.trim_end()));
    tokens
}

/// Measure leading indentation in columns; a tab counts as one indent unit.
fn split_indent(line: &str, indent_width: usize) -> (usize, &str) {
    let mut columns = 0;
    for (idx, ch) in line.char_indices() {
        match ch {
            ' ' => columns += 1,
            '\t' => columns += indent_width,
            _ => return (columns, &line[idx..]),
        }
    }
    (columns, "")
}

/// Returns the marker kind, the heading level for headings, and the rest of
/// the line.
fn detect_marker(rest: &str) -> Option<(MarkerKind, Option<usize>, &str)> {
    let trimmed = rest.trim_end();
    if trimmed.len() >= 3 && trimmed.chars().all(|c| c == '-') {
        return Some((MarkerKind::Rule, None, ""));
    }

    let hashes = rest.chars().take_while(|&c| c == '#').count();
    if (1..=3).contains(&hashes) {
        let after = &rest[hashes..];
        if after.is_empty() {
            return Some((MarkerKind::Heading, Some(hashes), ""));
        }
        if let Some(text) = after.strip_prefix(' ') {
            return Some((MarkerKind::Heading, Some(hashes), text));
        }
    }

    for bullet in ["- ", "* ", "• "] {
        if let Some(text) = rest.strip_prefix(bullet) {
            return Some((MarkerKind::Bullet, None, text));
        }
    }

    let digits = rest.chars().take_while(|c| c.is_ascii_digit()).count();
    if digits > 0 {
        if let Some(text) = rest[digits..].strip_prefix(". ") {
            let hint = rest[..digits].parse().unwrap_or(u32::MAX);
            return Some((MarkerKind::Numbered { hint }, None, text));
        }
    }

    None
}

/// Scan inline content into delimiter, link and text tokens.
pub fn tokenize_inline(text: &str) -> Vec<Token> {
    let mut tokens = Vec::new();
    let mut lexer = Inline::lexer(text);

    while let Some(result) = lexer.next() {
        let slice = lexer.slice();
        let token = match result {
            Ok(Inline::TripleStar) => Token::Delimiter(Delimiter::BoldItalic),
            Ok(Inline::DoubleStar) => Token::Delimiter(Delimiter::Bold),
            Ok(Inline::Star) => Token::Delimiter(Delimiter::Italic),
            Ok(Inline::Tildes) => Token::Delimiter(Delimiter::Strike),
            Ok(Inline::Equals) => Token::Delimiter(Delimiter::HighlightA),
            Ok(Inline::OpenBraces) => Token::Delimiter(Delimiter::OpenHighlight(Highlight::B)),
            Ok(Inline::CloseBraces) => Token::Delimiter(Delimiter::CloseHighlight(Highlight::B)),
            Ok(Inline::OpenBrackets) => Token::Delimiter(Delimiter::OpenHighlight(Highlight::C)),
            Ok(Inline::CloseBrackets) => Token::Delimiter(Delimiter::CloseHighlight(Highlight::C)),
            Ok(Inline::OpenParens) => Token::Delimiter(Delimiter::OpenHighlight(Highlight::D)),
            Ok(Inline::CloseParens) => Token::Delimiter(Delimiter::CloseHighlight(Highlight::D)),
            Ok(Inline::OpenColor) => match color_named(&slice[1..slice.len() - 1]) {
                Some(color) => Token::Delimiter(Delimiter::OpenColor(color)),
                None => Token::Text(slice.to_string()),
            },
            Ok(Inline::CloseColor) => match color_named(&slice[2..slice.len() - 1]) {
                Some(color) => Token::Delimiter(Delimiter::CloseColor(color)),
                None => Token::Text(slice.to_string()),
            },
            Ok(Inline::Link) => split_link(slice),
            Ok(Inline::Text) | Ok(Inline::Stray) | Err(()) => Token::Text(slice.to_string()),
        };
        push_merged(&mut tokens, token);
    }

    tokens
}

fn color_named(name: &str) -> Option<NamedColor> {
    NamedColor::ALL.into_iter().find(|color| color.name() == name)
}

/// Split `[label](url)`. The label cannot contain `]`, so the first `](` is
/// the boundary.
fn split_link(slice: &str) -> Token {
    match slice.find("](") {
        Some(boundary) => Token::Link {
            label: slice[1..boundary].to_string(),
            url: slice[boundary + 2..slice.len() - 1].to_string(),
        },
        None => Token::Text(slice.to_string()),
    }
}

/// Append a token, merging adjacent text runs.
fn push_merged(tokens: &mut Vec<Token>, token: Token) {
    if let Token::Text(text) = &token {
        if let Some(Token::Text(last)) = tokens.last_mut() {
            last.push_str(text);
            return;
        }
    }
    tokens.push(token);
}
