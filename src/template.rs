//! Named document templates
//!
//! Built-in templates are embedded from `templates.toml`. Every template is
//! layered over the `custom` baseline before deserializing, so a template
//! only spells out what it changes. Users can add or replace templates from
//! their own TOML file with [`TemplateRegistry::load_file`].

use std::collections::BTreeMap;
use std::fmt;
use std::path::Path;
use std::str::FromStr;

use serde::Deserialize;
use serde::de::Error as _;

use crate::block::{Highlight, NamedColor};
use crate::error::{ConvertError, TemplateError};

const BUILTIN_TOML: &str = include_str!("templates.toml");

/// Key of the baseline template, used when a request names none.
pub const BASE_TEMPLATE: &str = "custom";

/// An sRGB color written as `#rrggbb`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Deserialize)]
#[serde(try_from = "String")]
pub struct Rgb {
    pub red: u8,
    pub green: u8,
    pub blue: u8,
}

impl Rgb {
    pub const fn new(red: u8, green: u8, blue: u8) -> Self {
        Self { red, green, blue }
    }
}

impl FromStr for Rgb {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let hex = s
            .strip_prefix('#')
            .filter(|hex| hex.len() == 6 && hex.is_ascii())
            .ok_or_else(|| format!("expected a color like \"#ff8000\", got {s:?}"))?;
        let channel = |range: std::ops::Range<usize>| {
            u8::from_str_radix(&hex[range], 16).map_err(|e| format!("invalid color {s:?}: {e}"))
        };
        Ok(Self::new(channel(0..2)?, channel(2..4)?, channel(4..6)?))
    }
}

impl TryFrom<String> for Rgb {
    type Error = String;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        value.parse()
    }
}

impl fmt::Display for Rgb {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{:02x}{:02x}{:02x}", self.red, self.green, self.blue)
    }
}

/// RTF font family classes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum FontClass {
    Nil,
    Roman,
    Swiss,
    Modern,
}

impl FontClass {
    pub fn control_word(self) -> &'static str {
        match self {
            FontClass::Nil => "fnil",
            FontClass::Roman => "froman",
            FontClass::Swiss => "fswiss",
            FontClass::Modern => "fmodern",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct Font {
    pub family: String,
    pub class: FontClass,
    /// Body text size in points.
    pub size: f32,
}

/// Page margins in points.
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct Margins {
    pub top: f32,
    pub bottom: f32,
    pub left: f32,
    pub right: f32,
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct HeadingStyle {
    pub size: f32,
    pub space_before: f32,
    pub space_after: f32,
    #[serde(default)]
    pub centered: bool,
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct Headings {
    pub h1: HeadingStyle,
    pub h2: HeadingStyle,
    pub h3: HeadingStyle,
}

impl Headings {
    /// Style for a heading level; levels past 3 use the level 3 style.
    pub fn for_level(&self, level: u8) -> &HeadingStyle {
        match level {
            0 | 1 => &self.h1,
            2 => &self.h2,
            _ => &self.h3,
        }
    }
}

/// Concrete colors behind the symbolic names used in markup.
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct Palette {
    pub red: Rgb,
    pub blue: Rgb,
    pub green: Rgb,
    pub orange: Rgb,
    pub link: Rgb,
    pub highlight_a: Rgb,
    pub highlight_b: Rgb,
    pub highlight_c: Rgb,
    pub highlight_d: Rgb,
}

impl Palette {
    pub fn color(&self, color: NamedColor) -> Rgb {
        match color {
            NamedColor::Red => self.red,
            NamedColor::Blue => self.blue,
            NamedColor::Green => self.green,
            NamedColor::Orange => self.orange,
        }
    }

    pub fn highlight(&self, highlight: Highlight) -> Rgb {
        match highlight {
            Highlight::A => self.highlight_a,
            Highlight::B => self.highlight_b,
            Highlight::C => self.highlight_c,
            Highlight::D => self.highlight_d,
        }
    }
}

/// A named bundle of fonts, margins, spacing and palette.
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct Template {
    #[serde(default)]
    pub description: String,
    pub font: Font,
    pub margins: Margins,
    /// Space after each paragraph and list item, in points.
    pub paragraph_spacing: f32,
    /// Line height multiplier.
    pub line_spacing: f32,
    /// Indent per list level, in points.
    pub list_indent: f32,
    /// Body text color; `None` leaves it to the reader's default.
    #[serde(default)]
    pub text_color: Option<Rgb>,
    pub headings: Headings,
    pub palette: Palette,
}

/// Lookup table of templates by key.
#[derive(Debug, Clone)]
pub struct TemplateRegistry {
    templates: BTreeMap<String, Template>,
    base: toml::Table,
}

impl TemplateRegistry {
    /// Registry holding the embedded templates.
    pub fn builtin() -> Result<Self, TemplateError> {
        let root: toml::Table =
            toml::from_str(BUILTIN_TOML).map_err(|source| TemplateError::Builtin { source })?;
        let base = root
            .get("templates")
            .and_then(|templates| templates.get(BASE_TEMPLATE))
            .and_then(toml::Value::as_table)
            .cloned()
            .unwrap_or_default();

        let mut registry = Self {
            templates: BTreeMap::new(),
            base,
        };
        registry.add_templates(&root)?;
        Ok(registry)
    }

    /// Layer templates from a user TOML file over the current set. Entries
    /// with an existing key replace it.
    pub fn load_file(&mut self, path: impl AsRef<Path>) -> Result<(), TemplateError> {
        let path = path.as_ref();
        let content = std::fs::read_to_string(path).map_err(|source| TemplateError::Read {
            path: path.to_path_buf(),
            source,
        })?;
        let root: toml::Table = toml::from_str(&content).map_err(|source| TemplateError::Parse {
            path: path.to_path_buf(),
            source,
        })?;
        self.add_templates(&root)
    }

    fn add_templates(&mut self, root: &toml::Table) -> Result<(), TemplateError> {
        let Some(templates) = root.get("templates").and_then(toml::Value::as_table) else {
            return Ok(());
        };

        for (name, value) in templates {
            let invalid = |source| TemplateError::Invalid {
                name: name.clone(),
                source,
            };
            let overlay = value
                .as_table()
                .ok_or_else(|| invalid(toml::de::Error::custom("expected a table")))?;
            let mut merged = self.base.clone();
            merge_tables(&mut merged, overlay);
            let template: Template = toml::Value::Table(merged).try_into().map_err(invalid)?;
            self.templates.insert(name.clone(), template);
        }
        Ok(())
    }

    /// Look up a template by key.
    pub fn get(&self, name: &str) -> Result<&Template, ConvertError> {
        self.templates
            .get(name)
            .ok_or_else(|| ConvertError::UnknownTemplate {
                name: name.to_string(),
                available: self.names(),
            })
    }

    pub fn contains(&self, name: &str) -> bool {
        self.templates.contains_key(name)
    }

    /// All template keys, sorted.
    pub fn names(&self) -> Vec<String> {
        self.templates.keys().cloned().collect()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &Template)> {
        self.templates
            .iter()
            .map(|(name, template)| (name.as_str(), template))
    }
}

/// Deep-merge `overlay` into `base`; nested tables merge, everything else
/// replaces.
fn merge_tables(base: &mut toml::Table, overlay: &toml::Table) {
    for (key, value) in overlay {
        if let (Some(toml::Value::Table(existing)), toml::Value::Table(incoming)) =
            (base.get_mut(key), value)
        {
            merge_tables(existing, incoming);
            continue;
        }
        base.insert(key.clone(), value.clone());
    }
}
