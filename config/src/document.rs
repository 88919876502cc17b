//! Settings file documents, read and written with `rust-ini`.
//!
//! ```text
//! [LLM]
//! model = qwen2.5:3b
//!
//! [PROMPTS]
//! grammar = Fix the grammar:\nkeep the author's voice
//! ```
//!
//! - `key = value` or `key: value`; the first `=` or `:` splits the line
//! - keys are trimmed and ASCII-lowercased, values are trimmed
//! - `#` and `;` start a comment line
//! - line breaks inside a value are written as `\n` escapes
//!
//! On top of what `rust-ini` accepts, a document must not contain keys
//! outside a section, empty keys or names, or the same section or key twice.
//! Which sections and keys are valid is decided by the config layer.

use std::io;

use ini::{Ini, ParseOption, Properties, WriteOption};
use thiserror::Error;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum IniError {
    /// The text is not INI at all (unterminated header, line without `=`).
    #[error("{0}")]
    Syntax(String),
    #[error("key '{0}' outside of any [section]")]
    MissingSectionHeader(String),
    #[error("empty key in [{0}]")]
    EmptyKey(String),
    #[error("empty section name")]
    EmptySectionName,
    #[error("section [{0}] appears twice")]
    DuplicateSection(String),
    #[error("key '{key}' appears twice in [{section}]")]
    DuplicateKey { section: String, key: String },
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct IniSection {
    name: String,
    entries: Vec<(String, String)>,
}

impl IniSection {
    fn empty(name: &str) -> Self {
        Self {
            name: name.to_string(),
            entries: Vec::new(),
        }
    }

    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn entries(&self) -> impl Iterator<Item = (&str, &str)> {
        self.entries
            .iter()
            .map(|(key, value)| (key.as_str(), value.as_str()))
    }

    #[must_use]
    pub fn get(&self, key: &str) -> Option<&str> {
        self.entries
            .iter()
            .find(|(k, _)| k == key)
            .map(|(_, v)| v.as_str())
    }

    /// Set `key`, replacing an existing value in place.
    pub fn set(&mut self, key: impl Into<String>, value: impl Into<String>) {
        let key = key.into();
        let value = value.into();
        match self.entries.iter_mut().find(|(k, _)| *k == key) {
            Some(entry) => entry.1 = value,
            None => self.entries.push((key, value)),
        }
    }

    fn from_properties(name: &str, props: &Properties) -> Result<Self, IniError> {
        let mut section = Self::empty(name);
        for (key, value) in props.iter() {
            let key = key.trim().to_ascii_lowercase();
            if key.is_empty() {
                return Err(IniError::EmptyKey(section.name));
            }
            if section.get(&key).is_some() {
                return Err(IniError::DuplicateKey {
                    section: section.name,
                    key,
                });
            }
            section.entries.push((key, value.trim().to_string()));
        }
        Ok(section)
    }
}

/// Parsed settings file: sections and entries in file order.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct IniDocument {
    sections: Vec<IniSection>,
}

impl IniDocument {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    #[must_use]
    pub fn sections(&self) -> &[IniSection] {
        &self.sections
    }

    #[must_use]
    pub fn section(&self, name: &str) -> Option<&IniSection> {
        self.sections.iter().find(|s| s.name == name)
    }

    /// Get or append the section called `name`.
    pub fn section_mut(&mut self, name: &str) -> &mut IniSection {
        let index = match self.sections.iter().position(|s| s.name == name) {
            Some(index) => index,
            None => {
                self.sections.push(IniSection::empty(name));
                self.sections.len() - 1
            }
        };
        &mut self.sections[index]
    }

    pub fn parse(text: &str) -> Result<Self, IniError> {
        let options = ParseOption {
            enabled_quote: false,
            ..ParseOption::default()
        };
        let ini =
            Ini::load_from_str_opt(text, options).map_err(|err| IniError::Syntax(err.to_string()))?;

        let mut doc = Self::new();
        for (name, props) in ini.iter() {
            let Some(name) = name else {
                if let Some((key, _)) = props.iter().next() {
                    return Err(IniError::MissingSectionHeader(key.trim().to_string()));
                }
                continue;
            };
            let name = name.trim();
            if name.is_empty() {
                return Err(IniError::EmptySectionName);
            }
            if doc.section(name).is_some() {
                return Err(IniError::DuplicateSection(name.to_string()));
            }
            doc.sections.push(IniSection::from_properties(name, props)?);
        }
        Ok(doc)
    }

    /// Serialize back to text, sections separated by a blank line.
    pub fn render(&self) -> io::Result<String> {
        let mut ini = Ini::new();
        for section in &self.sections {
            let props = ini
                .entry(Some(section.name.clone()))
                .or_insert_with(Properties::new);
            for (key, value) in &section.entries {
                props.insert(key.as_str(), value.as_str());
            }
        }

        let mut buf = Vec::new();
        ini.write_to_opt(
            &mut buf,
            WriteOption {
                kv_separator: " = ",
                ..WriteOption::default()
            },
        )?;
        String::from_utf8(buf).map_err(|err| io::Error::new(io::ErrorKind::InvalidData, err))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_sections_in_order() {
        let doc = IniDocument::parse(
            "[LLM]\nmodel = t5-base\nmax_length: 128\n\n[PROMPTS]\nGrammar = Fix:\n",
        )
        .unwrap();
        let names: Vec<_> = doc.sections().iter().map(IniSection::name).collect();
        assert_eq!(names, ["LLM", "PROMPTS"]);

        let llm = doc.section("LLM").unwrap();
        assert_eq!(llm.get("model"), Some("t5-base"));
        assert_eq!(llm.get("max_length"), Some("128"));
        assert_eq!(doc.section("PROMPTS").unwrap().get("grammar"), Some("Fix:"));
    }

    #[test]
    fn first_delimiter_splits_key_from_value() {
        let doc = IniDocument::parse("[LLM]\nmodel = qwen2.5:3b\n").unwrap();
        assert_eq!(doc.section("LLM").unwrap().get("model"), Some("qwen2.5:3b"));
    }

    #[test]
    fn skips_comments_and_blank_lines() {
        let doc = IniDocument::parse("# top\n\n[UI]\n; note\nshow_spinner = True\n").unwrap();
        let entries: Vec<_> = doc.section("UI").unwrap().entries().collect();
        assert_eq!(entries, [("show_spinner", "True")]);
    }

    #[test]
    fn comment_markers_inside_values_are_kept() {
        let doc = IniDocument::parse("[PROMPTS]\ngrammar = Fix # this; now\n").unwrap();
        assert_eq!(
            doc.section("PROMPTS").unwrap().get("grammar"),
            Some("Fix # this; now")
        );
    }

    #[test]
    fn line_without_delimiter_is_a_syntax_error() {
        assert!(matches!(
            IniDocument::parse("[A]\nnonsense\n"),
            Err(IniError::Syntax(_))
        ));
        assert!(matches!(
            IniDocument::parse("[BROKEN\n"),
            Err(IniError::Syntax(_))
        ));
    }

    #[test]
    fn rejects_key_before_header() {
        assert_eq!(
            IniDocument::parse("model = x\n[LLM]\n").unwrap_err(),
            IniError::MissingSectionHeader("model".to_string())
        );
    }

    #[test]
    fn rejects_duplicates() {
        assert_eq!(
            IniDocument::parse("[A]\nx = 1\n[A]\ny = 2\n").unwrap_err(),
            IniError::DuplicateSection("A".to_string())
        );
        assert_eq!(
            IniDocument::parse("[A]\nKey = 1\nkey = 2\n").unwrap_err(),
            IniError::DuplicateKey {
                section: "A".to_string(),
                key: "key".to_string()
            }
        );
    }

    #[test]
    fn rejects_empty_key() {
        assert!(matches!(
            IniDocument::parse("[A]\n = value\n"),
            Err(IniError::EmptyKey(_) | IniError::Syntax(_))
        ));
    }

    #[test]
    fn render_escapes_line_breaks_and_parses_back() {
        let mut doc = IniDocument::new();
        doc.section_mut("LLM").set("model", "t5-base");
        doc.section_mut("PROMPTS").set("grammar", "Fix this:\nkeep tone");
        doc.section_mut("LLM").set("model", "t5-large");

        let text = doc.render().unwrap();
        assert!(text.contains("model = t5-large"), "{text}");
        assert!(text.contains("grammar = Fix this:\\nkeep tone"), "{text}");
        assert!(text.find("[LLM]") < text.find("[PROMPTS]"), "{text}");
        assert_eq!(IniDocument::parse(&text).unwrap(), doc);
    }
}
