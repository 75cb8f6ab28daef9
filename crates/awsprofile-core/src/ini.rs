//! Lossless INI document model
//!
//! Every line of the source is kept verbatim alongside its classification,
//! so a document that is parsed and rendered without edits is byte-identical
//! to its input. Edits only touch the lines of the section being changed.

use std::fmt;

/// Classification of a single source line
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LineKind {
    /// `[name]`
    Section(String),
    /// `key = value` or `key: value`
    Entry { key: String, value: String },
    /// Indented line continuing the previous entry's value
    Continuation(String),
    /// `#` or `;` comment
    Comment,
    /// Whitespace only
    Blank,
    /// Anything else
    Invalid,
}

/// One source line
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Line {
    raw: String,
    kind: LineKind,
}

impl Line {
    /// The line exactly as it appeared, including its terminator
    #[must_use]
    pub fn raw(&self) -> &str {
        &self.raw
    }

    #[must_use]
    pub fn kind(&self) -> &LineKind {
        &self.kind
    }

    fn is_filler(&self) -> bool {
        matches!(self.kind, LineKind::Blank | LineKind::Comment)
    }
}

/// A section as seen by readers: header name plus its entries in order
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ParsedSection {
    pub name: String,
    pub entries: Vec<(String, String)>,
}

/// A line or block skipped while building the read view
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ParseWarning {
    /// 1-based line number
    pub line: usize,
    pub message: String,
}

impl fmt::Display for ParseWarning {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "line {}: {}", self.line, self.message)
    }
}

/// Line range of one section block, header included, end exclusive
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
struct Block {
    start: usize,
    end: usize,
}

/// Parsed INI file
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct IniDocument {
    lines: Vec<Line>,
}

impl IniDocument {
    /// Parse INI text. Never fails; unrecognised lines are kept as `Invalid`.
    #[must_use]
    pub fn parse(text: &str) -> Self {
        let mut lines = Vec::new();
        let mut in_entry = false;

        for raw in text.split_inclusive('\n') {
            let kind = classify(raw, in_entry);
            in_entry = match kind {
                LineKind::Entry { .. } | LineKind::Continuation(_) => true,
                LineKind::Comment => in_entry,
                _ => false,
            };
            lines.push(Line {
                raw: raw.to_string(),
                kind,
            });
        }

        Self { lines }
    }

    /// Render back to text
    #[must_use]
    pub fn render(&self) -> String {
        self.lines.iter().map(|l| l.raw.as_str()).collect()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.lines.is_empty()
    }

    #[must_use]
    pub fn lines(&self) -> &[Line] {
        &self.lines
    }

    /// Whether any block carries this header name
    #[must_use]
    pub fn has_section(&self, name: &str) -> bool {
        !self.blocks_named(name).is_empty()
    }

    /// Build the read view, recovering from malformed content.
    ///
    /// Lines outside any section and invalid lines are skipped, a repeated
    /// section keeps its first block, and a repeated key keeps its first
    /// value. Each skip is reported as a warning.
    #[must_use]
    pub fn sections(&self) -> (Vec<ParsedSection>, Vec<ParseWarning>) {
        let mut sections: Vec<ParsedSection> = Vec::new();
        let mut warnings = Vec::new();
        // Index into `sections` of the block being read; None while skipping
        let mut current: Option<usize> = None;
        let mut skipping_duplicate = false;
        let mut last_entry_kept = false;

        for (idx, line) in self.lines.iter().enumerate() {
            let line_no = idx + 1;
            match &line.kind {
                LineKind::Section(name) => {
                    last_entry_kept = false;
                    if sections.iter().any(|s| &s.name == name) {
                        warnings.push(ParseWarning {
                            line: line_no,
                            message: format!("duplicate section [{name}] skipped"),
                        });
                        current = None;
                        skipping_duplicate = true;
                    } else {
                        sections.push(ParsedSection {
                            name: name.clone(),
                            entries: Vec::new(),
                        });
                        current = Some(sections.len() - 1);
                        skipping_duplicate = false;
                    }
                }
                LineKind::Entry { key, value } => {
                    last_entry_kept = false;
                    let Some(section_idx) = current else {
                        if !skipping_duplicate {
                            warnings.push(ParseWarning {
                                line: line_no,
                                message: format!("entry '{key}' outside of any section skipped"),
                            });
                        }
                        continue;
                    };
                    let section = &mut sections[section_idx];
                    if section.entries.iter().any(|(k, _)| k == key) {
                        warnings.push(ParseWarning {
                            line: line_no,
                            message: format!(
                                "duplicate key '{key}' in [{}] skipped",
                                section.name
                            ),
                        });
                    } else {
                        section.entries.push((key.clone(), value.clone()));
                        last_entry_kept = true;
                    }
                }
                LineKind::Continuation(text) => {
                    if let (true, Some(section_idx)) = (last_entry_kept, current) {
                        if let Some((_, value)) = sections[section_idx].entries.last_mut() {
                            value.push('\n');
                            value.push_str(text);
                        }
                    }
                }
                LineKind::Invalid => {
                    warnings.push(ParseWarning {
                        line: line_no,
                        message: format!("unparsable line skipped: {:?}", line.raw.trim_end()),
                    });
                }
                LineKind::Comment | LineKind::Blank => {}
            }
        }

        (sections, warnings)
    }

    /// Remove every block headed `[name]`. Returns whether anything changed.
    ///
    /// A block's entries and the blank lines after them go; comment lines
    /// trailing the block stay, since they usually describe the next section.
    pub fn remove_section(&mut self, name: &str) -> bool {
        let blocks = self.blocks_named(name);
        if blocks.is_empty() {
            return false;
        }

        for block in blocks.into_iter().rev() {
            let content_end = self.content_end(block);
            let mut remove_end = content_end;
            while remove_end < block.end && self.lines[remove_end].kind == LineKind::Blank {
                remove_end += 1;
            }
            self.lines.drain(block.start..remove_end);
        }
        true
    }

    /// Replace the entries of `[name]`, or append the section if absent.
    ///
    /// The first block keeps its position and header line; further blocks
    /// of the same name are dropped.
    pub fn upsert_section(&mut self, name: &str, entries: &[(String, String)]) {
        let newline = self.newline();
        let blocks = self.blocks_named(name);

        let Some((first, duplicates)) = blocks.split_first() else {
            self.append_section(name, entries, newline);
            return;
        };

        for block in duplicates.iter().rev() {
            let content_end = self.content_end(*block);
            self.lines.drain(block.start..content_end);
        }

        let mut header = self.lines[first.start].raw.clone();
        if !header.ends_with('\n') {
            header.push_str(newline);
        }
        let mut replacement = vec![Line {
            raw: header,
            kind: LineKind::Section(name.to_string()),
        }];
        replacement.extend(entry_lines(entries, newline));

        let content_end = self.content_end(*first);
        self.lines.splice(first.start..content_end, replacement);
    }

    fn append_section(&mut self, name: &str, entries: &[(String, String)], newline: &str) {
        if let Some(last) = self.lines.last_mut() {
            if !last.raw.ends_with('\n') {
                last.raw.push_str(newline);
            }
            if last.kind != LineKind::Blank {
                self.lines.push(Line {
                    raw: newline.to_string(),
                    kind: LineKind::Blank,
                });
            }
        }
        self.lines.push(Line {
            raw: format!("[{name}]{newline}"),
            kind: LineKind::Section(name.to_string()),
        });
        self.lines.extend(entry_lines(entries, newline));
    }

    fn blocks(&self) -> Vec<(String, Block)> {
        let mut blocks: Vec<(String, Block)> = Vec::new();
        for (idx, line) in self.lines.iter().enumerate() {
            if let LineKind::Section(name) = &line.kind {
                if let Some((_, prev)) = blocks.last_mut() {
                    prev.end = idx;
                }
                blocks.push((
                    name.clone(),
                    Block {
                        start: idx,
                        end: self.lines.len(),
                    },
                ));
            }
        }
        blocks
    }

    fn blocks_named(&self, name: &str) -> Vec<Block> {
        self.blocks()
            .into_iter()
            .filter(|(n, _)| n == name)
            .map(|(_, b)| b)
            .collect()
    }

    /// Index just past the last non-filler line of a block (at least past the header)
    fn content_end(&self, block: Block) -> usize {
        let mut end = block.end;
        while end > block.start + 1 && self.lines[end - 1].is_filler() {
            end -= 1;
        }
        end
    }

    /// Line terminator used by the document, `\n` unless it uses CRLF
    fn newline(&self) -> &'static str {
        match self.lines.first() {
            Some(line) if line.raw.ends_with("\r\n") => "\r\n",
            _ => "\n",
        }
    }
}

fn classify(raw: &str, in_entry: bool) -> LineKind {
    let content = raw.trim_end_matches(['\n', '\r']);
    let trimmed = content.trim();

    if trimmed.is_empty() {
        return LineKind::Blank;
    }
    if trimmed.starts_with('#') || trimmed.starts_with(';') {
        return LineKind::Comment;
    }
    if let Some(name) = parse_header(trimmed) {
        return if name.is_empty() {
            LineKind::Invalid
        } else {
            LineKind::Section(name)
        };
    }
    if in_entry && content.starts_with([' ', '\t']) {
        return LineKind::Continuation(trimmed.to_string());
    }
    if let Some(pos) = trimmed.find(['=', ':']) {
        let key = trimmed[..pos].trim();
        if key.is_empty() {
            return LineKind::Invalid;
        }
        return LineKind::Entry {
            key: key.to_string(),
            value: trimmed[pos + 1..].trim().to_string(),
        };
    }
    LineKind::Invalid
}

/// `[name]`, optionally followed by a comment
fn parse_header(trimmed: &str) -> Option<String> {
    let rest = trimmed.strip_prefix('[')?;
    let close = rest.find(']')?;
    let tail = rest[close + 1..].trim();
    if !tail.is_empty() && !tail.starts_with('#') && !tail.starts_with(';') {
        return None;
    }
    Some(rest[..close].trim().to_string())
}

fn entry_lines(entries: &[(String, String)], newline: &str) -> Vec<Line> {
    let mut lines = Vec::new();
    for (key, value) in entries {
        let mut parts = value.split('\n');
        let first = parts.next().unwrap_or_default();
        let raw = if first.is_empty() {
            format!("{key} ={newline}")
        } else {
            format!("{key} = {first}{newline}")
        };
        lines.push(Line {
            raw,
            kind: LineKind::Entry {
                key: key.clone(),
                value: first.to_string(),
            },
        });
        for part in parts.filter(|p| !p.trim().is_empty()) {
            lines.push(Line {
                raw: format!("    {part}{newline}"),
                kind: LineKind::Continuation(part.to_string()),
            });
        }
    }
    lines
}
