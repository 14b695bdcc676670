use std::path::Path;

use indexmap::IndexMap;
use rustc_hash::FxBuildHasher;

use crate::error::{GrfError, Result};
use crate::grf::cipher::latin1_to_string;

type FxIndexMap<V> = IndexMap<String, V, FxBuildHasher>;

/// Minimal INI reader for archive collection lists such as `DATA.INI`.
///
/// Section and key lookups ignore ASCII case. Entries keep file order.
#[derive(Debug, Clone, Default)]
pub struct IniFile {
    sections: FxIndexMap<IniSection>,
}

#[derive(Debug, Clone, Default)]
struct IniSection {
    // lowercased key -> (key as written, value)
    entries: FxIndexMap<(String, String)>,
}

impl IniFile {
    pub fn load<P>(path: P) -> Result<Self>
    where
        P: AsRef<Path>,
    {
        let path = path.as_ref();
        let bytes = std::fs::read(path).map_err(|e| GrfError::not_found_or_io(e, path))?;
        let text = match String::from_utf8(bytes) {
            Ok(text) => text,
            Err(e) => latin1_to_string(e.as_bytes()),
        };
        Ok(Self::parse(&text))
    }

    /// Lines before the first `[section]` belong to the unnamed section `""`.
    /// A repeated section header starts that section over; a repeated key
    /// replaces the earlier value.
    pub fn parse(text: &str) -> Self {
        let mut this = Self::default();
        let mut current = String::new();
        this.sections.insert(current.clone(), IniSection::default());

        for line in text.lines() {
            let line = line.trim();
            if line.is_empty() || line.starts_with(';') || line.starts_with('#') {
                continue;
            }

            if let Some(name) = line.strip_prefix('[').and_then(|l| l.strip_suffix(']')) {
                current = name.trim().to_ascii_lowercase();
                this.sections.insert(current.clone(), IniSection::default());
                continue;
            }

            let Some((key, value)) = line.split_once('=') else {
                continue;
            };
            let key = key.trim();
            if let Some(section) = this.sections.get_mut(&current) {
                section
                    .entries
                    .insert(key.to_ascii_lowercase(), (key.to_string(), value.trim().to_string()));
            }
        }

        this
    }

    fn section(&self, section: &str) -> Result<&IniSection> {
        self.sections
            .get(&section.to_ascii_lowercase())
            .ok_or_else(|| GrfError::SectionMissing(section.to_string()))
    }

    pub fn has_section(&self, section: &str) -> bool {
        self.sections.contains_key(&section.to_ascii_lowercase())
    }

    pub fn value(&self, section: &str, key: &str) -> Option<&str> {
        let section = self.section(section).ok()?;
        section
            .entries
            .get(&key.to_ascii_lowercase())
            .map(|(_, value)| value.as_str())
    }

    pub fn keys(&self, section: &str) -> Result<Vec<&str>> {
        let section = self.section(section)?;
        Ok(section.entries.values().map(|(key, _)| key.as_str()).collect())
    }

    /// Values of `section` in file order.
    pub fn values(&self, section: &str) -> Result<Vec<&str>> {
        let section = self.section(section)?;
        Ok(section.entries.values().map(|(_, value)| value.as_str()).collect())
    }
}
