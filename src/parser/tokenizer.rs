//! Line and section tokenizer for PBS files.
//!
//! PBS files are read lazily: [`Lines`] yields comment-stripped, trimmed,
//! non-empty lines with their 1-based numbers, and [`Sections`] groups those
//! lines into `[header]` blocks of `Key = value` pairs.

use std::fs::File;
use std::io::{BufRead, BufReader};
use std::path::Path;

use crate::cancel::CancellationToken;
use crate::error::{PbsError, Result};

use super::line_data::FileLineData;

/// A prepared (comment-stripped, trimmed) source line.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PbsLine {
    /// Line number (1-indexed)
    pub number: usize,
    pub text: String,
}

/// One `Key = value` line inside a section.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PbsPair {
    pub key: String,
    pub value: String,
    pub line_number: usize,
}

/// A `[header]` block and its ordered key/value pairs.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PbsSection {
    pub name: String,
    pub line_number: usize,
    pub pairs: Vec<PbsPair>,
}

impl PbsSection {
    pub fn new(name: impl Into<String>, line_number: usize) -> Self {
        Self {
            name: name.into(),
            line_number,
            pairs: Vec::new(),
        }
    }

    /// Line data positioned on this section's header.
    pub fn line_data(&self, base: &FileLineData) -> FileLineData {
        FileLineData {
            line_number: self.line_number,
            ..base.with_section(&self.name, None, &self.name)
        }
    }

    /// Values of every pair with the given key, in file order.
    pub fn values<'a>(&'a self, key: &'a str) -> impl Iterator<Item = &'a PbsPair> + 'a {
        self.pairs.iter().filter(move |p| p.key == key)
    }
}

/// Strip a trailing `#` comment (outside double quotes) and trim.
pub fn prep_line(line: &str) -> &str {
    let mut in_quotes = false;
    for (i, c) in line.char_indices() {
        match c {
            '"' => in_quotes = !in_quotes,
            '#' if !in_quotes => return line[..i].trim(),
            _ => {}
        }
    }
    line.trim()
}

/// Parse a `[name]` header line, returning the trimmed name.
pub fn parse_section_header(text: &str) -> Option<&str> {
    let text = text.trim();
    text.strip_prefix('[')
        .and_then(|rest| rest.strip_suffix(']'))
        .map(str::trim)
}

/// Split a `Key = value` line. Keys may only contain word characters.
pub fn parse_key_value(text: &str) -> Option<(&str, &str)> {
    let (key, value) = text.split_once('=')?;
    let key = key.trim();
    if key.is_empty() || !key.chars().all(|c| c.is_alphanumeric() || c == '_') {
        return None;
    }
    Some((key, value.trim()))
}

/// Lazy iterator over the meaningful lines of a PBS source.
pub struct Lines<R> {
    reader: R,
    number: usize,
    buffer: String,
    cancel: CancellationToken,
    finished: bool,
}

impl<R: BufRead> Lines<R> {
    pub fn new(reader: R, cancel: CancellationToken) -> Self {
        Self {
            reader,
            number: 0,
            buffer: String::new(),
            cancel,
            finished: false,
        }
    }
}

impl<R: BufRead> Iterator for Lines<R> {
    type Item = Result<PbsLine>;

    fn next(&mut self) -> Option<Self::Item> {
        if self.finished {
            return None;
        }
        loop {
            if let Err(e) = self.cancel.check() {
                self.finished = true;
                return Some(Err(e));
            }

            self.buffer.clear();
            match self.reader.read_line(&mut self.buffer) {
                Ok(0) => {
                    self.finished = true;
                    return None;
                }
                Ok(_) => {}
                Err(e) => {
                    self.finished = true;
                    return Some(Err(e.into()));
                }
            }
            self.number += 1;

            let mut raw = self.buffer.as_str();
            if self.number == 1 {
                raw = raw.trim_start_matches('\u{feff}');
            }
            let text = prep_line(raw);
            if text.is_empty() {
                continue;
            }
            return Some(Ok(PbsLine {
                number: self.number,
                text: text.to_string(),
            }));
        }
    }
}

/// Lazy iterator grouping lines into [`PbsSection`]s.
pub struct Sections<R> {
    lines: Lines<R>,
    line_data: FileLineData,
    pending: Option<PbsSection>,
    finished: bool,
}

impl<R: BufRead> Sections<R> {
    pub fn new(reader: R, line_data: FileLineData, cancel: CancellationToken) -> Self {
        Self {
            lines: Lines::new(reader, cancel),
            line_data,
            pending: None,
            finished: false,
        }
    }

    fn fail(&mut self, err: PbsError) -> Option<Result<PbsSection>> {
        self.finished = true;
        Some(Err(err))
    }
}

impl<R: BufRead> Iterator for Sections<R> {
    type Item = Result<PbsSection>;

    fn next(&mut self) -> Option<Self::Item> {
        if self.finished {
            return None;
        }
        loop {
            let line = match self.lines.next() {
                None => {
                    self.finished = true;
                    return self.pending.take().map(Ok);
                }
                Some(Err(e)) => return self.fail(e),
                Some(Ok(line)) => line,
            };

            let line_data = self.line_data.with_line(&line.text, line.number);

            if let Some(name) = parse_section_header(&line.text) {
                if name.is_empty() {
                    return self.fail(PbsError::parse_at("Section name cannot be empty.", &line_data));
                }
                let next = PbsSection::new(name, line.number);
                if let Some(done) = self.pending.replace(next) {
                    return Some(Ok(done));
                }
                continue;
            }

            if self.pending.is_none() {
                return self.fail(PbsError::parse_at(
                    "Expected a section at the beginning of the file.",
                    &line_data,
                ));
            }

            let Some((key, value)) = parse_key_value(&line.text) else {
                return self.fail(PbsError::parse_at(
                    "Bad line syntax (expected syntax like XXX=YYY).",
                    &line_data,
                ));
            };
            let pair = PbsPair {
                key: key.to_string(),
                value: value.to_string(),
                line_number: line.number,
            };
            if let Some(section) = self.pending.as_mut() {
                section.pairs.push(pair);
            }
        }
    }
}

/// Open a PBS file for reading.
pub fn open_file(path: &Path) -> Result<BufReader<File>> {
    let file = File::open(path).map_err(|e| PbsError::Io {
        path: path.to_path_buf(),
        message: format!("Failed to open PBS file: {}", e),
    })?;
    Ok(BufReader::new(file))
}

/// Iterate the lines of a file on disk.
pub fn read_file_lines(path: &Path, cancel: &CancellationToken) -> Result<Lines<BufReader<File>>> {
    Ok(Lines::new(open_file(path)?, cancel.clone()))
}

/// Iterate the sections of a file on disk.
pub fn read_file_sections(
    path: &Path,
    cancel: &CancellationToken,
) -> Result<Sections<BufReader<File>>> {
    Ok(Sections::new(
        open_file(path)?,
        FileLineData::new(path),
        cancel.clone(),
    ))
}
