mod block;
mod error;
mod inline;
mod lexer;
mod parser;
mod rtf;
mod template;

pub mod config;
pub mod mcp;
pub mod output;

pub use block::{Block, Document, Highlight, NamedColor, Span, StyleSet};
pub use error::{ConvertError, TemplateError};
pub use parser::ParseOptions;
pub use rtf::escape_text;
pub use template::{BASE_TEMPLATE, Rgb, Template, TemplateRegistry};

/// Parse markup text into a vector of blocks.
pub fn parse(markup: &str) -> Vec<Block> {
    parser::parse(markup, &ParseOptions::default())
}

/// Markup-to-RTF pipeline bound to a template registry.
#[derive(Debug, Clone)]
pub struct Converter {
    registry: TemplateRegistry,
    options: ParseOptions,
}

impl Converter {
    pub fn new(registry: TemplateRegistry, options: ParseOptions) -> Self {
        Self { registry, options }
    }

    /// Converter over the built-in templates with default options.
    pub fn builtin() -> Result<Self, TemplateError> {
        Ok(Self::new(TemplateRegistry::builtin()?, ParseOptions::default()))
    }

    pub fn registry(&self) -> &TemplateRegistry {
        &self.registry
    }

    /// Convert markup to RTF bytes using the named template, or the
    /// baseline when `template` is `None`.
    ///
    /// The template is resolved before any parsing, so an unknown key
    /// produces no output at all.
    pub fn convert(&self, markup: &str, template: Option<&str>) -> Result<Vec<u8>, ConvertError> {
        let template = self.registry.get(template.unwrap_or(BASE_TEMPLATE))?;
        let blocks = parser::parse(markup, &self.options);
        let document = Document::new(blocks, template.clone());
        rtf::document_to_rtf(&document)
    }
}

/// Convert markup to RTF with one of the built-in templates.
pub fn markup_to_rtf(markup: &str, template: &str) -> Result<Vec<u8>, ConvertError> {
    // With no loadable built-ins there is no template to select
    let registry = TemplateRegistry::builtin().map_err(|_| ConvertError::UnknownTemplate {
        name: template.to_string(),
        available: Vec::new(),
    })?;
    Converter::new(registry, ParseOptions::default()).convert(markup, Some(template))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn unknown_template_produces_no_bytes() {
        let converter = Converter::builtin().unwrap();
        let err = converter.convert("# Hello", Some("nope")).unwrap_err();
        assert_eq!(err.kind(), "UnknownTemplate");
    }

    #[test]
    fn default_template_is_baseline() {
        let converter = Converter::builtin().unwrap();
        assert_eq!(
            converter.convert("text", None).unwrap(),
            markup_to_rtf("text", BASE_TEMPLATE).unwrap()
        );
    }

    #[test]
    fn every_builtin_template_converts() {
        let converter = Converter::builtin().unwrap();
        for name in converter.registry().names() {
            let bytes = converter.convert("# Title\n- item\n1. step", Some(&name)).unwrap();
            assert!(bytes.starts_with(b"{\\rtf1"), "{name}");
            assert!(bytes.is_ascii(), "{name}");
        }
    }

    #[test]
    fn parse_exposes_blocks() {
        assert_eq!(parse("---"), vec![Block::Rule]);
    }
}
