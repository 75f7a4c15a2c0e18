//! Inline span resolution
//!
//! Turns one line's tokens into a tree of [`Span`]s using an explicit stack of
//! open scopes. A closing delimiter pairs with the most recently opened scope
//! of the same kind; scopes opened after that one are unwound back into
//! literal text. Anything still open at the end of the line is unwound the
//! same way, so every input produces a well-formed tree.

use crate::block::{Highlight, NamedColor, Span};
use crate::lexer::{self, Delimiter, Token};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum ScopeKind {
    Bold,
    Italic,
    Strike,
    Highlight(Highlight),
    Color(NamedColor),
}

impl ScopeKind {
    fn wrap(self, children: Vec<Span>) -> Span {
        match self {
            ScopeKind::Bold => Span::Bold(children),
            ScopeKind::Italic => Span::Italic(children),
            ScopeKind::Strike => Span::Strike(children),
            ScopeKind::Highlight(highlight) => Span::Highlight(highlight, children),
            ScopeKind::Color(color) => Span::Color(color, children),
        }
    }
}

struct Scope {
    kind: ScopeKind,
    opener: &'static str,
    children: Vec<Span>,
}

#[derive(Default)]
struct Resolver {
    root: Vec<Span>,
    stack: Vec<Scope>,
}

impl Resolver {
    fn current(&mut self) -> &mut Vec<Span> {
        match self.stack.last_mut() {
            Some(scope) => &mut scope.children,
            None => &mut self.root,
        }
    }

    fn push_text(&mut self, text: &str) {
        if text.is_empty() {
            return;
        }
        let spans = self.current();
        if let Some(Span::Text(last)) = spans.last_mut() {
            last.push_str(text);
        } else {
            spans.push(Span::Text(text.to_string()));
        }
    }

    fn push_span(&mut self, span: Span) {
        match span {
            Span::Text(text) => self.push_text(&text),
            other => self.current().push(other),
        }
    }

    fn open(&mut self, kind: ScopeKind, opener: &'static str) {
        self.stack.push(Scope {
            kind,
            opener,
            children: Vec::new(),
        });
    }

    /// Pop a scope and splice its opener and children into the parent.
    fn unwind_top(&mut self) {
        if let Some(scope) = self.stack.pop() {
            self.push_text(scope.opener);
            for child in scope.children {
                self.push_span(child);
            }
        }
    }

    /// Close the most recent scope of `kind`. Returns false when none is open.
    fn close(&mut self, kind: ScopeKind, closer: &'static str) -> bool {
        let Some(position) = self.stack.iter().rposition(|scope| scope.kind == kind) else {
            return false;
        };
        while self.stack.len() > position + 1 {
            self.unwind_top();
        }
        if let Some(scope) = self.stack.pop() {
            if scope.children.is_empty() {
                // `****` or `====` with nothing inside stays literal
                self.push_text(scope.opener);
                self.push_text(closer);
            } else {
                self.push_span(scope.kind.wrap(scope.children));
            }
        }
        true
    }

    fn toggle(&mut self, kind: ScopeKind, delimiter: &'static str) {
        if !self.close(kind, delimiter) {
            self.open(kind, delimiter);
        }
    }

    fn delimiter(&mut self, delimiter: Delimiter) {
        let text = delimiter.as_str();
        match delimiter {
            Delimiter::Bold => self.toggle(ScopeKind::Bold, text),
            Delimiter::Italic => self.toggle(ScopeKind::Italic, text),
            Delimiter::Strike => self.toggle(ScopeKind::Strike, text),
            Delimiter::HighlightA => self.toggle(ScopeKind::Highlight(Highlight::A), text),
            Delimiter::BoldItalic => {
                let italic_innermost = self
                    .stack
                    .last()
                    .is_some_and(|scope| scope.kind == ScopeKind::Italic);
                if italic_innermost {
                    self.toggle(ScopeKind::Italic, Delimiter::Italic.as_str());
                    self.toggle(ScopeKind::Bold, Delimiter::Bold.as_str());
                } else {
                    self.toggle(ScopeKind::Bold, Delimiter::Bold.as_str());
                    self.toggle(ScopeKind::Italic, Delimiter::Italic.as_str());
                }
            }
            Delimiter::OpenHighlight(highlight) => self.open(ScopeKind::Highlight(highlight), text),
            Delimiter::OpenColor(color) => self.open(ScopeKind::Color(color), text),
            Delimiter::CloseHighlight(highlight) => {
                if !self.close(ScopeKind::Highlight(highlight), text) {
                    self.push_text(text);
                }
            }
            Delimiter::CloseColor(color) => {
                if !self.close(ScopeKind::Color(color), text) {
                    self.push_text(text);
                }
            }
        }
    }

    fn finish(mut self) -> Vec<Span> {
        while !self.stack.is_empty() {
            self.unwind_top();
        }
        self.root
    }
}

/// Resolve a line's inline tokens into spans. Block markers are ignored; the
/// block builder consumes them.
pub fn resolve(tokens: &[Token]) -> Vec<Span> {
    let mut resolver = Resolver::default();
    for token in tokens {
        match token {
            Token::Text(text) => resolver.push_text(text),
            Token::Delimiter(delimiter) => resolver.delimiter(*delimiter),
            Token::Link { label, url } => {
                let content = resolve(&lexer::tokenize_inline(label));
                resolver.push_span(Span::Link {
                    url: url.clone(),
                    content,
                });
            }
            Token::BlockMarker { .. } => {}
        }
    }
    resolver.finish()
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn text(s: &str) -> Span {
        Span::Text(s.to_string())
    }

    fn resolve_str(markup: &str) -> Vec<Span> {
        resolve(&lexer::tokenize_inline(markup))
    }

    #[test]
    fn plain_text_is_one_leaf() {
        assert_eq!(resolve_str("nothing special here"), vec![text("nothing special here")]);
    }

    #[test]
    fn bold_and_italic() {
        assert_eq!(
            resolve_str("**b** and *i*"),
            vec![
                Span::Bold(vec![text("b")]),
                text(" and "),
                Span::Italic(vec![text("i")]),
            ]
        );
    }

    #[test]
    fn nesting_composes() {
        assert_eq!(
            resolve_str("**bold *both* bold**"),
            vec![Span::Bold(vec![
                text("bold "),
                Span::Italic(vec![text("both")]),
                text(" bold"),
            ])]
        );
    }

    #[test]
    fn triple_star_opens_and_closes_both() {
        assert_eq!(
            resolve_str("***x***"),
            vec![Span::Bold(vec![Span::Italic(vec![text("x")])])]
        );
    }

    #[test]
    fn unmatched_opener_is_literal() {
        assert_eq!(resolve_str("**bold with no close"), vec![text("**bold with no close")]);
        assert_eq!(resolve_str("{{open"), vec![text("{{open")]);
    }

    #[test]
    fn stray_closer_is_literal() {
        assert_eq!(resolve_str("a }} b {/red}"), vec![text("a }} b {/red}")]);
    }

    #[test]
    fn overlapping_pairs_unwind_inner_scope() {
        assert_eq!(
            resolve_str("**bold *ital**ic*"),
            vec![Span::Bold(vec![text("bold *ital")]), text("ic*")]
        );
    }

    #[test]
    fn unclosed_scope_keeps_its_closed_children() {
        assert_eq!(
            resolve_str("{red}a **b** c"),
            vec![text("{red}a "), Span::Bold(vec![text("b")]), text(" c")]
        );
    }

    #[test]
    fn empty_pair_stays_literal() {
        assert_eq!(resolve_str("a ==== b"), vec![text("a ==== b")]);
    }

    #[test]
    fn highlights_and_colors() {
        assert_eq!(
            resolve_str("==a== {{b}} [[c]] ((d)) {blue}e{/blue}"),
            vec![
                Span::Highlight(Highlight::A, vec![text("a")]),
                text(" "),
                Span::Highlight(Highlight::B, vec![text("b")]),
                text(" "),
                Span::Highlight(Highlight::C, vec![text("c")]),
                text(" "),
                Span::Highlight(Highlight::D, vec![text("d")]),
                text(" "),
                Span::Color(NamedColor::Blue, vec![text("e")]),
            ]
        );
    }

    #[test]
    fn color_inside_highlight() {
        assert_eq!(
            resolve_str("=={red}hot{/red}=="),
            vec![Span::Highlight(
                Highlight::A,
                vec![Span::Color(NamedColor::Red, vec![text("hot")])]
            )]
        );
    }

    #[test]
    fn bold_label_inside_link() {
        assert_eq!(
            resolve_str("[**Important**](https://example.com)"),
            vec![Span::Link {
                url: "https://example.com".to_string(),
                content: vec![Span::Bold(vec![text("Important")])],
            }]
        );
    }

    #[test]
    fn bold_around_link() {
        assert_eq!(
            resolve_str("**[Bold Link](https://example.com)**"),
            vec![Span::Bold(vec![Span::Link {
                url: "https://example.com".to_string(),
                content: vec![text("Bold Link")],
            }])]
        );
    }

    #[test]
    fn url_is_never_formatted() {
        assert_eq!(
            resolve_str("[x](https://example.com/**not-bold**)"),
            vec![Span::Link {
                url: "https://example.com/**not-bold**".to_string(),
                content: vec![text("x")],
            }]
        );
    }

    #[test]
    fn link_label_cannot_close_outer_scope() {
        assert_eq!(
            resolve_str("**a [b**](u)"),
            vec![
                text("**a "),
                Span::Link {
                    url: "u".to_string(),
                    content: vec![text("b**")],
                },
            ]
        );
    }
}
