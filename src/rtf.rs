use crate::block::{Block, Document, Span, StyleSet};
use crate::error::ConvertError;
use crate::template::{Rgb, Template};

/// Letter paper, in twips
const PAPER_WIDTH: i32 = 12240;
const PAPER_HEIGHT: i32 = 15840;

const BULLET: &str = "\\u8226?";

/// Convert a document to an RTF byte stream
pub fn document_to_rtf(document: &Document) -> Result<Vec<u8>, ConvertError> {
    let mut emitter = Emitter::new(&document.template);

    for (index, block) in document.blocks.iter().enumerate() {
        emitter.block = index;
        emitter.emit_block(block)?;
    }

    let mut out = String::new();
    write_preamble(&document.template, &emitter.colors, &mut out);
    out.push_str(&emitter.body);
    out.push_str("}\n");
    Ok(out.into_bytes())
}

/// Colors referenced by the document, in first-reference order. Index 0 is
/// the reader's automatic color, so entries are numbered from 1.
#[derive(Debug, Default)]
struct ColorTable {
    entries: Vec<Rgb>,
}

impl ColorTable {
    fn index_of(&mut self, color: Rgb) -> usize {
        match self.entries.iter().position(|entry| *entry == color) {
            Some(position) => position + 1,
            None => {
                self.entries.push(color);
                self.entries.len()
            }
        }
    }

    fn write(&self, out: &mut String) {
        out.push_str("{\\colortbl;");
        for color in &self.entries {
            out.push_str(&format!(
                "\\red{}\\green{}\\blue{};",
                color.red, color.green, color.blue
            ));
        }
        out.push_str("}\n");
    }
}

fn write_preamble(template: &Template, colors: &ColorTable, out: &mut String) {
    out.push_str("{\\rtf1\\ansi\\ansicpg1252\\deff0\\uc1\n");

    // Font names are not document text; control characters are dropped
    let family: String = template
        .font
        .family
        .chars()
        .filter(|c| !c.is_control())
        .collect();
    let family = escape_text(&family).unwrap_or_default();
    out.push_str(&format!(
        "{{\\fonttbl\\f0\\{}\\fcharset0 {};}}\n",
        template.font.class.control_word(),
        family
    ));

    colors.write(out);

    let margins = &template.margins;
    out.push_str(&format!(
        "\\paperw{}\\paperh{}\\margl{}\\margr{}\\margt{}\\margb{}\\viewkind0\n",
        PAPER_WIDTH,
        PAPER_HEIGHT,
        twips(margins.left),
        twips(margins.right),
        twips(margins.top),
        twips(margins.bottom)
    ));
}

struct Emitter<'a> {
    template: &'a Template,
    colors: ColorTable,
    text_color: Option<usize>,
    body: String,
    // Index of the block being emitted, for error reports
    block: usize,
}

impl<'a> Emitter<'a> {
    fn new(template: &'a Template) -> Self {
        let mut colors = ColorTable::default();
        let text_color = template.text_color.map(|color| colors.index_of(color));
        Self {
            template,
            colors,
            text_color,
            body: String::new(),
            block: 0,
        }
    }

    fn emit_block(&mut self, block: &Block) -> Result<(), ConvertError> {
        let template = self.template;
        match block {
            Block::Heading { level, content } => {
                let style = template.headings.for_level(*level);
                let align = if style.centered { "\\qc" } else { "" };
                self.start_paragraph(style.size, style.space_before, style.space_after, align);
                self.body.push_str("{\\b ");
                self.emit_spans(content, &StyleSet::default())?;
                self.body.push('}');
                self.end_paragraph();
            }
            Block::Paragraph { content } => {
                self.start_paragraph(template.font.size, 0.0, template.paragraph_spacing, "");
                self.emit_spans(content, &StyleSet::default())?;
                self.end_paragraph();
            }
            Block::BulletItem { depth, content } => {
                self.start_list_item(*depth);
                self.body.push_str(BULLET);
                self.body.push_str("\\tab ");
                self.emit_spans(content, &StyleSet::default())?;
                self.end_paragraph();
            }
            Block::NumberedItem {
                depth,
                ordinal,
                content,
            } => {
                self.start_list_item(*depth);
                self.body.push_str(&format!("{}.\\tab ", ordinal));
                self.emit_spans(content, &StyleSet::default())?;
                self.end_paragraph();
            }
            Block::Rule => {
                self.start_paragraph(
                    template.font.size,
                    0.0,
                    template.paragraph_spacing,
                    "\\brdrb\\brdrs\\brdrw10\\brsp20",
                );
                self.end_paragraph();
            }
        }
        Ok(())
    }

    /// Reset paragraph and character state, then apply this paragraph's
    /// properties. Always ends with the space that delimits the last control
    /// word.
    fn start_paragraph(&mut self, size: f32, space_before: f32, space_after: f32, extra: &str) {
        let template = self.template;
        self.body
            .push_str(&format!("\\pard\\plain\\f0\\fs{}", half_points(size)));
        if space_before > 0.0 {
            self.body.push_str(&format!("\\sb{}", twips(space_before)));
        }
        self.body.push_str(&format!("\\sa{}", twips(space_after)));
        if (template.line_spacing - 1.0).abs() > f32::EPSILON {
            let line = (240.0 * template.line_spacing).round() as i32;
            self.body.push_str(&format!("\\sl{}\\slmult1", line));
        }
        self.body.push_str(extra);
        if let Some(index) = self.text_color {
            self.body.push_str(&format!("\\cf{}", index));
        }
        self.body.push(' ');
    }

    /// Hanging indent: the marker sits in the first `list_indent` points and
    /// a tab stop lines the text up with wrapped lines.
    fn start_list_item(&mut self, depth: usize) {
        let template = self.template;
        let hang = twips(template.list_indent);
        let indent = hang * (depth as i32 + 1);
        let extra = format!("\\tx{indent}\\li{indent}\\fi-{hang}");
        self.start_paragraph(template.font.size, 0.0, template.paragraph_spacing, &extra);
    }

    fn end_paragraph(&mut self) {
        self.body.push_str("\\par\n");
    }

    fn emit_spans(&mut self, spans: &[Span], styles: &StyleSet) -> Result<(), ConvertError> {
        for span in spans {
            match span {
                Span::Text(text) => self.emit_run(text, styles)?,
                Span::LineBreak => self.body.push_str("\\line "),
                Span::Link { url, content } => {
                    self.emit_link(url, content, &styles.within(span))?;
                }
                _ => self.emit_spans(span.children(), &styles.within(span))?,
            }
        }
        Ok(())
    }

    /// A literal leaf: bare when unstyled, otherwise a group carrying every
    /// accumulated style.
    fn emit_run(&mut self, text: &str, styles: &StyleSet) -> Result<(), ConvertError> {
        let escaped = self.escape(text)?;
        if styles.is_plain() {
            self.body.push_str(&escaped);
            return Ok(());
        }

        let controls = self.style_controls(styles);
        self.body.push('{');
        self.body.push_str(&controls);
        self.body.push(' ');
        self.body.push_str(&escaped);
        self.body.push('}');
        Ok(())
    }

    fn emit_link(
        &mut self,
        url: &str,
        content: &[Span],
        styles: &StyleSet,
    ) -> Result<(), ConvertError> {
        let target = self.escape(&url.replace('"', "%22"))?;
        self.body.push_str("{\\field{\\*\\fldinst{HYPERLINK \"");
        self.body.push_str(&target);
        self.body.push_str("\"}}{\\fldrslt ");
        self.emit_spans(content, styles)?;
        self.body.push_str("}}");
        Ok(())
    }

    fn style_controls(&mut self, styles: &StyleSet) -> String {
        let palette = &self.template.palette;
        let mut controls = String::new();

        if styles.bold {
            controls.push_str("\\b");
        }
        if styles.italic {
            controls.push_str("\\i");
        }
        if styles.strike {
            controls.push_str("\\strike");
        }
        if styles.link.is_some() {
            controls.push_str("\\ul");
        }

        let foreground = match (styles.color, &styles.link) {
            (Some(color), _) => Some(palette.color(color)),
            (None, Some(_)) => Some(palette.link),
            (None, None) => None,
        };
        if let Some(color) = foreground {
            let index = self.colors.index_of(color);
            controls.push_str(&format!("\\cf{}", index));
        }

        if let Some(highlight) = styles.highlight {
            let index = self.colors.index_of(palette.highlight(highlight));
            controls.push_str(&format!("\\cb{index}\\highlight{index}"));
        }

        controls
    }

    fn escape(&self, text: &str) -> Result<String, ConvertError> {
        escape_text(text).map_err(|character| ConvertError::EncodingFailure {
            character,
            block: self.block,
        })
    }
}

/// Escape literal text for RTF. Returns the first character that has no
/// representation.
pub fn escape_text(text: &str) -> Result<String, char> {
    let mut out = String::with_capacity(text.len());
    for ch in text.chars() {
        match ch {
            '\\' => out.push_str("\\\\"),
            '{' => out.push_str("\\{"),
            '}' => out.push_str("\\}"),
            '\t' => out.push_str("\\tab "),
            c if c.is_ascii_control() => return Err(c),
            c if c.is_ascii() => out.push(c),
            c => {
                let mut units = [0u16; 2];
                for unit in c.encode_utf16(&mut units) {
                    out.push_str(&format!("\\u{}?", *unit as i16));
                }
            }
        }
    }
    Ok(out)
}

fn twips(points: f32) -> i32 {
    (points * 20.0).round() as i32
}

fn half_points(points: f32) -> i32 {
    (points * 2.0).round() as i32
}

#[cfg(test)]
mod tests {
    use crate::markup_to_rtf;
    use pretty_assertions::assert_eq;

    use super::escape_text;

    fn render(markup: &str) -> String {
        render_with(markup, "custom")
    }

    fn render_with(markup: &str, template: &str) -> String {
        let bytes = markup_to_rtf(markup, template).expect("conversion to succeed");
        String::from_utf8(bytes).expect("RTF output is ASCII")
    }

    /// Everything after the preamble, without the closing brace.
    fn body(rtf: &str) -> &str {
        let start = rtf.find("\\viewkind0\n").expect("preamble") + "\\viewkind0\n".len();
        rtf[start..].trim_end().trim_end_matches('}')
    }

    fn color_table(rtf: &str) -> &str {
        let start = rtf.find("{\\colortbl").expect("color table");
        let end = start + rtf[start..].find('}').expect("table end");
        &rtf[start..=end]
    }

    #[test]
    fn preamble() {
        let rtf = render("hello");
        assert!(rtf.starts_with("{\\rtf1\\ansi\\ansicpg1252\\deff0\\uc1\n"));
        assert!(rtf.contains("{\\fonttbl\\f0\\fswiss\\fcharset0 Helvetica;}\n"));
        assert!(rtf.contains("\\margl1440\\margr1440\\margt1440\\margb1440"));
        assert!(rtf.ends_with("}\n"));
    }

    #[test]
    fn paragraph() {
        assert_eq!(body(&render("Hello world")), "\\pard\\plain\\f0\\fs24\\sa120 Hello world\\par\n");
    }

    #[test]
    fn plain_text_has_no_style_groups() {
        let rtf = render("no markup at all");
        assert_eq!(body(&rtf).matches("no markup at all").count(), 1);
        assert!(!body(&rtf).contains('{'));
        assert_eq!(color_table(&rtf), "{\\colortbl;}");
    }

    #[test]
    fn bold_and_italic() {
        assert_eq!(
            body(&render("**bold** *italic*")),
            "\\pard\\plain\\f0\\fs24\\sa120 {\\b bold} {\\i italic}\\par\n"
        );
    }

    #[test]
    fn nested_styles_compose() {
        assert!(render("**a *b* c**").contains("{\\b a }{\\b\\i b}{\\b  c}"));
    }

    #[test]
    fn ancestor_styles_accumulate() {
        assert!(render("**a ~~b *c*~~**").contains("{\\b a }{\\b\\strike b }{\\b\\i\\strike c}"));
    }

    #[test]
    fn innermost_color_wins() {
        let rtf = render("{red}{blue}x{/blue}{/red}");
        assert!(rtf.contains("{\\cf1 x}"));
        assert_eq!(color_table(&rtf), "{\\colortbl;\\red0\\green0\\blue255;}");
    }

    #[test]
    fn innermost_highlight_wins() {
        let rtf = render("=={{x}}==");
        assert!(rtf.contains("{\\cb1\\highlight1 x}"));
        assert_eq!(color_table(&rtf), "{\\colortbl;\\red0\\green255\\blue0;}");
    }

    #[test]
    fn color_and_highlight_coexist() {
        let rtf = render("=={red}**x**{/red}==");
        assert!(rtf.contains("{\\b\\cf1\\cb2\\highlight2 x}"));
        assert_eq!(
            color_table(&rtf),
            "{\\colortbl;\\red255\\green0\\blue0;\\red255\\green255\\blue0;}"
        );
    }

    #[test]
    fn strike() {
        assert!(render("~~gone~~").contains("{\\strike gone}"));
    }

    #[test]
    fn bold_and_highlight_end_to_end() {
        let rtf = render("**bold** and ==hi==");
        assert_eq!(color_table(&rtf), "{\\colortbl;\\red255\\green255\\blue0;}");
        assert!(rtf.contains("{\\b bold} and {\\cb1\\highlight1 hi}"));
    }

    #[test]
    fn colors_indexed_by_first_reference() {
        let rtf = render("{green}g{/green} {red}r{/red} {green}again{/green}");
        assert_eq!(
            color_table(&rtf),
            "{\\colortbl;\\red0\\green128\\blue0;\\red255\\green0\\blue0;}"
        );
        assert!(rtf.contains("{\\cf1 g} {\\cf2 r} {\\cf1 again}"));
    }

    #[test]
    fn unreferenced_palette_entries_are_omitted() {
        let rtf = render("{{only green highlight}}");
        assert_eq!(color_table(&rtf), "{\\colortbl;\\red0\\green255\\blue0;}");
    }

    #[test]
    fn heading_sizes_by_level() {
        assert!(render("# Title").contains("\\fs48\\sa240\\qc {\\b Title}\\par"));
        assert!(render("## Title").contains("\\fs36\\sb240\\sa120 {\\b Title}\\par"));
        assert!(render("### Title").contains("\\fs28\\sb120\\sa60 {\\b Title}\\par"));
    }

    #[test]
    fn bullet_list() {
        assert_eq!(
            body(&render("- one\n  - two")),
            "\\pard\\plain\\f0\\fs24\\sa120\\tx400\\li400\\fi-400 \\u8226?\\tab one\\par\n\
             \\pard\\plain\\f0\\fs24\\sa120\\tx800\\li800\\fi-400 \\u8226?\\tab two\\par\n"
        );
    }

    #[test]
    fn numbered_list_uses_computed_ordinals() {
        let rtf = render("7. first\n7. second");
        assert!(rtf.contains(" 1.\\tab first\\par"));
        assert!(rtf.contains(" 2.\\tab second\\par"));
        assert!(!rtf.contains("7."));
    }

    #[test]
    fn horizontal_rule() {
        assert_eq!(
            body(&render("---")),
            "\\pard\\plain\\f0\\fs24\\sa120\\brdrb\\brdrs\\brdrw10\\brsp20 \\par\n"
        );
    }

    #[test]
    fn paragraph_lines_join_with_line_breaks() {
        assert!(render("one\ntwo").contains("one\\line two\\par"));
    }

    #[test]
    fn hyperlink_field() {
        let rtf = render("[Docs](https://example.com)");
        assert!(rtf.contains(
            "{\\field{\\*\\fldinst{HYPERLINK \"https://example.com\"}}{\\fldrslt {\\ul\\cf1 Docs}}}"
        ));
        assert_eq!(color_table(&rtf), "{\\colortbl;\\red0\\green0\\blue255;}");
    }

    #[test]
    fn mailto_link() {
        assert!(render("[Mail](mailto:help@example.com)")
            .contains("HYPERLINK \"mailto:help@example.com\""));
    }

    #[test]
    fn bold_link_keeps_bold_label() {
        assert!(render("**[Bold Link](https://example.com)**")
            .contains("{\\fldrslt {\\b\\ul\\cf1 Bold Link}}"));
    }

    #[test]
    fn link_with_named_color_uses_that_color() {
        let rtf = render("{red}[x](u){/red}");
        assert!(rtf.contains("{\\fldrslt {\\ul\\cf1 x}}"));
        assert_eq!(color_table(&rtf), "{\\colortbl;\\red255\\green0\\blue0;}");
    }

    #[test]
    fn escapes_special_chars() {
        assert!(render("a \\ b { c } d").contains(" a \\\\ b \\{ c \\} d\\par"));
    }

    #[test]
    fn escapes_inside_link_labels_and_urls() {
        let rtf = render("[café {x}](https://example.com/a\"b)");
        assert!(rtf.contains("HYPERLINK \"https://example.com/a%22b\""));
        assert!(rtf.contains("caf\\u233? \\{x\\}"));
    }

    #[test]
    fn unmatched_delimiters_stay_literal() {
        assert!(render("**bold with no close").contains(" **bold with no close\\par"));
    }

    #[test]
    fn text_color_template() {
        let rtf = render_with("**x** {red}y{/red}", "technical");
        assert!(rtf.contains("{\\fonttbl\\f0\\fmodern\\fcharset0 Menlo;}"));
        assert_eq!(
            color_table(&rtf),
            "{\\colortbl;\\red64\\green64\\blue64;\\red255\\green0\\blue0;}"
        );
        assert!(rtf.contains("\\fs22\\sa80\\cf1 {\\b x} {\\cf2 y}\\par"));
    }

    #[test]
    fn line_spacing_template() {
        assert!(render_with("x", "meeting").contains("\\fs22\\sa120\\sl360\\slmult1\\cf1 x\\par"));
    }

    #[test]
    fn every_color_reference_is_in_the_table() {
        let rtf = render(
            "==a== {{b}} [[c]] ((d)) {red}e{/red} {blue}f{/blue} {green}g{/green} \
             {orange}h{/orange} [i](u)",
        );
        let table = color_table(&rtf);
        let entries = table.matches(';').count() - 1;
        for word in ["\\cf", "\\cb", "\\highlight"] {
            for (position, _) in rtf.match_indices(word) {
                let digits: String = rtf[position + word.len()..]
                    .chars()
                    .take_while(char::is_ascii_digit)
                    .collect();
                let index: usize = digits.parse().expect("index after color control");
                assert!(index >= 1 && index <= entries, "{word}{index} outside table");
            }
        }
    }

    #[test]
    fn escape_non_ascii() {
        assert_eq!(escape_text("é"), Ok("\\u233?".to_string()));
        assert_eq!(escape_text("•"), Ok("\\u8226?".to_string()));
        // astral plane characters become a surrogate pair
        assert_eq!(escape_text("🍍"), Ok("\\u-10180?\\u-8371?".to_string()));
        assert_eq!(escape_text("\u{ffff}"), Ok("\\u-1?".to_string()));
    }

    #[test]
    fn escape_tab() {
        assert_eq!(escape_text("a\tb"), Ok("a\\tab b".to_string()));
    }

    #[test]
    fn control_characters_abort() {
        assert_eq!(escape_text("bell\u{7}"), Err('\u{7}'));
        assert_eq!(escape_text("\u{7f}"), Err('\u{7f}'));
    }

    #[test]
    fn encoding_failure_aborts_the_document() {
        let err = markup_to_rtf("fine\n\nnot \u{0} fine", "custom").unwrap_err();
        assert_eq!(
            err,
            crate::ConvertError::EncodingFailure {
                character: '\u{0}',
                block: 1
            }
        );
    }
}
