//! Line-preserving model of certbot's renewal config (configobj syntax).
//!
//! Only the pieces the hook editor needs are understood: top-level
//! `key = value` lines, `[section]` headers and `[[subsection]]` headers
//! nested in the preceding section. Comments, blank lines and anything
//! unrecognized are carried through untouched.

#[derive(Debug, Clone, PartialEq, Eq)]
enum Line {
    Raw(String),
    Entry { key: String, value: String, raw: String },
}

impl Line {
    fn parse(raw: &str) -> Self {
        let trimmed = raw.trim();
        if trimmed.is_empty() || trimmed.starts_with('#') {
            return Line::Raw(raw.to_string());
        }
        match trimmed.split_once('=') {
            Some((key, value)) if !key.trim().is_empty() => Line::Entry {
                key: key.trim().to_string(),
                value: unquote(value.trim()).to_string(),
                raw: raw.to_string(),
            },
            _ => Line::Raw(raw.to_string()),
        }
    }

    fn entry(key: &str, value: &str) -> Self {
        Line::Entry {
            key: key.to_string(),
            value: value.to_string(),
            raw: format!("{key} = {value}"),
        }
    }

    fn key(&self) -> Option<&str> {
        match self {
            Line::Entry { key, .. } => Some(key),
            Line::Raw(_) => None,
        }
    }

    fn raw(&self) -> &str {
        match self {
            Line::Raw(raw) | Line::Entry { raw, .. } => raw,
        }
    }
}

fn unquote(value: &str) -> &str {
    for quote in ['"', '\''] {
        if value.len() >= 2 && value.starts_with(quote) && value.ends_with(quote) {
            return &value[1..value.len() - 1];
        }
    }
    value
}

#[derive(Debug, Clone, PartialEq, Eq)]
struct Section {
    depth: usize,
    name: String,
    header: String,
    lines: Vec<Line>,
}

impl Section {
    fn new(depth: usize, name: &str) -> Self {
        Self {
            depth,
            name: name.to_string(),
            header: format!("{}{}{}", "[".repeat(depth), name, "]".repeat(depth)),
            lines: Vec::new(),
        }
    }

    fn get(&self, key: &str) -> Option<&str> {
        self.lines.iter().find_map(|line| match line {
            Line::Entry { key: k, value, .. } if k.as_str() == key => Some(value.as_str()),
            _ => None,
        })
    }

    fn entries(&self) -> impl Iterator<Item = (&str, &str)> {
        self.lines.iter().filter_map(|line| match line {
            Line::Entry { key, value, .. } => Some((key.as_str(), value.as_str())),
            Line::Raw(_) => None,
        })
    }

    fn set(&mut self, key: &str, value: &str) {
        let positions: Vec<usize> = self
            .lines
            .iter()
            .enumerate()
            .filter(|(_, line)| line.key() == Some(key))
            .map(|(idx, _)| idx)
            .collect();
        if let Some((&first, duplicates)) = positions.split_first() {
            self.lines[first] = Line::entry(key, value);
            for &idx in duplicates.iter().rev() {
                self.lines.remove(idx);
            }
            return;
        }

        // Append after the last entry so trailing comments stay trailing.
        let at = self
            .lines
            .iter()
            .rposition(|line| matches!(line, Line::Entry { .. }))
            .map(|idx| idx + 1)
            .unwrap_or(0);
        self.lines.insert(at, Line::entry(key, value));
    }
}

fn parse_header(trimmed: &str) -> Option<(usize, String)> {
    if !trimmed.starts_with('[') {
        return None;
    }
    let depth = trimmed.chars().take_while(|c| *c == '[').count();
    let closing = trimmed.chars().rev().take_while(|c| *c == ']').count();
    if depth != closing || trimmed.len() <= depth * 2 {
        return None;
    }
    let name = trimmed[depth..trimmed.len() - depth].trim();
    (!name.is_empty()).then(|| (depth, name.to_string()))
}

/// A renewal config file.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct RenewalDocument {
    preamble: Vec<Line>,
    sections: Vec<Section>,
}

impl RenewalDocument {
    pub fn parse(content: &str) -> Self {
        let mut doc = RenewalDocument::default();
        for raw in content.lines() {
            if let Some((depth, name)) = parse_header(raw.trim()) {
                doc.sections.push(Section {
                    depth,
                    name,
                    header: raw.to_string(),
                    lines: Vec::new(),
                });
                continue;
            }
            let line = Line::parse(raw);
            match doc.sections.last_mut() {
                Some(section) => section.lines.push(line),
                None => doc.preamble.push(line),
            }
        }
        doc
    }

    pub fn render(&self) -> String {
        let mut out = String::new();
        for line in &self.preamble {
            out.push_str(line.raw());
            out.push('\n');
        }
        for section in &self.sections {
            out.push_str(&section.header);
            out.push('\n');
            for line in &section.lines {
                out.push_str(line.raw());
                out.push('\n');
            }
        }
        out
    }

    fn section_index(&self, name: &str) -> Option<usize> {
        self.sections
            .iter()
            .position(|s| s.depth == 1 && s.name == name)
    }

    /// Index range of the nested sections that belong to `parent`.
    fn children(&self, parent: usize) -> std::ops::Range<usize> {
        let start = parent + 1;
        let end = self.sections[start..]
            .iter()
            .position(|s| s.depth <= 1)
            .map(|offset| start + offset)
            .unwrap_or(self.sections.len());
        start..end
    }

    pub fn has_section(&self, name: &str) -> bool {
        self.section_index(name).is_some()
    }

    pub fn get(&self, section: &str, key: &str) -> Option<&str> {
        let idx = self.section_index(section)?;
        self.sections[idx].get(key)
    }

    /// Set `key` in `section`, creating the section at the end if missing.
    pub fn set(&mut self, section: &str, key: &str, value: &str) {
        let idx = match self.section_index(section) {
            Some(idx) => idx,
            None => {
                self.sections.push(Section::new(1, section));
                self.sections.len() - 1
            }
        };
        self.sections[idx].set(key, value);
    }

    pub fn subsection_entries(&self, parent: &str, name: &str) -> Vec<(String, String)> {
        let Some(parent_idx) = self.section_index(parent) else {
            return Vec::new();
        };
        self.sections[self.children(parent_idx)]
            .iter()
            .filter(|s| s.depth == 2 && s.name == name)
            .flat_map(|s| s.entries())
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect()
    }

    /// Replace (or add) the `[[name]]` subsection of `parent` with `entries`.
    ///
    /// Returns `false` when `parent` does not exist.
    pub fn replace_subsection(
        &mut self,
        parent: &str,
        name: &str,
        entries: &[(&str, &str)],
    ) -> bool {
        let Some(parent_idx) = self.section_index(parent) else {
            return false;
        };
        let children = self.children(parent_idx);
        let mut subsection = Section::new(2, name);
        for (key, value) in entries {
            subsection.lines.push(Line::entry(key, value));
        }

        match self.sections[children.clone()]
            .iter()
            .position(|s| s.depth == 2 && s.name == name)
        {
            Some(offset) => {
                let existing = &mut self.sections[children.start + offset];
                existing.lines = subsection.lines;
            }
            None => self.sections.insert(children.end, subsection),
        }
        true
    }
}
