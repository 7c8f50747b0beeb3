//! Line reader over the converted manual with single-line pushback.
//!
//! Page marker lines injected by the text conversion are consumed here and
//! only update the page counter. Per-pass remediation tables repair known
//! defects of the converted text (dropped ranges, wrapped lines, split table
//! cells) before a line reaches any scanner.

use crate::error::{Result, ScanError};
use regex::Regex;
use std::collections::{BTreeMap, BTreeSet};
use std::fmt;
use std::fs::File;
use std::io::{BufRead, BufReader, Seek, SeekFrom};
use std::path::{Path, PathBuf};
use std::sync::LazyLock;
use tracing::warn;

static RE_PAGE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^<{20} (?:Table of Contents )?Page (\d+) >{20}$").unwrap()
});

/// Anything the reader can pull lines from and seek in.
pub trait Source: BufRead + Seek {}

impl<T: BufRead + Seek> Source for T {}

// -- Remediation --------------------------------------------------------------

/// A table cell whose text was wrapped onto the following line.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WrappedCell {
    /// Cell text at the start of the first line.
    pub first: String,
    /// Cell continuation at the start of the second line.
    pub second: String,
}

/// Line-level fixes for one scan pass, keyed by physical line number.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Remediation {
    pub skip_lines: Vec<(usize, usize)>,
    pub merge_lines: BTreeSet<usize>,
    pub wrapped_cells: BTreeMap<usize, WrappedCell>,
}

impl Remediation {
    pub fn is_empty(&self) -> bool {
        self.skip_lines.is_empty() && self.merge_lines.is_empty() && self.wrapped_cells.is_empty()
    }

    /// Add the entries of `other`; on conflicting wrapped cells `other` wins.
    pub fn extend(&mut self, other: &Remediation) {
        self.skip_lines.extend(other.skip_lines.iter().copied());
        self.merge_lines.extend(other.merge_lines.iter().copied());
        for (line, cell) in &other.wrapped_cells {
            self.wrapped_cells.insert(*line, cell.clone());
        }
    }

    fn is_skipped(&self, line_no: usize) -> bool {
        self.skip_lines
            .iter()
            .any(|&(first, last)| (first..=last).contains(&line_no))
    }
}

// -- Reader -------------------------------------------------------------------

/// Position snapshot used for rewind and multi-line lookahead.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Mark {
    pos: u64,
    page_no: usize,
    line_no: usize,
    physical: usize,
    rewind: Option<(u64, usize, usize, usize)>,
}

pub struct RewindReader {
    path: PathBuf,
    source: Box<dyn Source>,
    remediation: Remediation,
    page_no: usize,
    /// First physical line of the most recently yielded line.
    line_no: usize,
    /// Physical lines consumed so far.
    physical: usize,
    /// State before the most recently yielded line, cleared by `rewind()`.
    rewind: Option<(u64, usize, usize, usize)>,
}

impl RewindReader {
    pub fn open(path: &Path) -> Result<Self> {
        let file = File::open(path)?;
        Ok(Self::new(path.to_path_buf(), Box::new(BufReader::new(file))))
    }

    /// Reader over in-memory text; `name` stands in for the file path.
    #[cfg(test)]
    pub fn from_text(name: &str, text: &str) -> Self {
        Self::new(
            PathBuf::from(name),
            Box::new(std::io::Cursor::new(text.as_bytes().to_vec())),
        )
    }

    fn new(path: PathBuf, source: Box<dyn Source>) -> Self {
        Self {
            path,
            source,
            remediation: Remediation::default(),
            page_no: 0,
            line_no: 0,
            physical: 0,
            rewind: None,
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// File name without directories, as written to the tables.
    pub fn file_name(&self) -> String {
        self.path
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_else(|| self.path.to_string_lossy().into_owned())
    }

    pub fn page_no(&self) -> usize {
        self.page_no
    }

    pub fn line_no(&self) -> usize {
        self.line_no
    }

    pub fn set_remediation(&mut self, remediation: Remediation) {
        self.remediation = remediation;
    }

    /// Human-readable position of the most recently yielded line.
    pub fn location(&self) -> Location<'_> {
        Location {
            page_no: self.page_no,
            path: &self.path,
            line_no: self.line_no,
        }
    }

    /// Start over at the beginning of the file.
    pub fn reset(&mut self) -> Result<()> {
        self.source.seek(SeekFrom::Start(0))?;
        self.page_no = 0;
        self.line_no = 0;
        self.physical = 0;
        self.rewind = None;
        Ok(())
    }

    /// Next logical line, or `None` at the end of the file.
    pub fn next_line(&mut self) -> Result<Option<String>> {
        let before = (
            self.source.stream_position()?,
            self.page_no,
            self.line_no,
            self.physical,
        );
        loop {
            let Some(mut line) = self.read_raw()? else {
                return Ok(None);
            };
            if let Some(caps) = RE_PAGE.captures(&line) {
                self.page_no = caps[1].parse().unwrap_or(self.page_no);
                continue;
            }
            let first = self.physical;
            if self.remediation.is_skipped(first) {
                continue;
            }
            self.line_no = first;
            while self.remediation.merge_lines.contains(&self.physical) {
                match self.read_raw()? {
                    Some(next) => {
                        line.push(' ');
                        line.push_str(&next);
                    }
                    None => break,
                }
            }
            if let Some(cell) = self.remediation.wrapped_cells.get(&first).cloned() {
                line = self.join_wrapped_cell(line, &cell)?;
            }
            self.rewind = Some(before);
            return Ok(Some(line));
        }
    }

    /// Push the most recently yielded line back.
    pub fn rewind(&mut self) -> Result<()> {
        match self.rewind.take() {
            Some((pos, page_no, line_no, physical)) => {
                self.source.seek(SeekFrom::Start(pos))?;
                self.page_no = page_no;
                self.line_no = line_no;
                self.physical = physical;
                Ok(())
            }
            None => Err(ScanError::Rewind(self.location().to_string())),
        }
    }

    pub fn mark(&mut self) -> Result<Mark> {
        Ok(Mark {
            pos: self.source.stream_position()?,
            page_no: self.page_no,
            line_no: self.line_no,
            physical: self.physical,
            rewind: self.rewind,
        })
    }

    pub fn restore(&mut self, mark: Mark) -> Result<()> {
        self.source.seek(SeekFrom::Start(mark.pos))?;
        self.page_no = mark.page_no;
        self.line_no = mark.line_no;
        self.physical = mark.physical;
        self.rewind = mark.rewind;
        Ok(())
    }

    /// Read up to `count` lines ahead without consuming them.
    pub fn peek(&mut self, count: usize) -> Result<Vec<String>> {
        let mark = self.mark()?;
        let mut lines = Vec::with_capacity(count);
        for _ in 0..count {
            match self.next_line()? {
                Some(line) => lines.push(line),
                None => break,
            }
        }
        self.restore(mark)?;
        Ok(lines)
    }

    fn read_raw(&mut self) -> Result<Option<String>> {
        let mut buf = String::new();
        if self.source.read_line(&mut buf)? == 0 {
            return Ok(None);
        }
        self.physical += 1;
        let trimmed = buf.trim_end().len();
        buf.truncate(trimmed);
        Ok(Some(buf))
    }

    fn join_wrapped_cell(&mut self, line: String, cell: &WrappedCell) -> Result<String> {
        let Some(rest) = line.strip_prefix(cell.first.as_str()) else {
            warn!(
                "Wrapped cell {:?} not found ({})",
                cell.first,
                self.location()
            );
            return Ok(line);
        };
        let pos = self.source.stream_position()?;
        let physical = self.physical;
        if let Some(next) = self.read_raw()? {
            if let Some(rest_next) = next.strip_prefix(cell.second.as_str()) {
                let text = [rest.trim(), rest_next.trim()]
                    .iter()
                    .filter(|s| !s.is_empty())
                    .copied()
                    .collect::<Vec<_>>()
                    .join(" ");
                return Ok(format!("{}{}  {}", cell.first, cell.second, text)
                    .trim_end()
                    .to_string());
            }
        }
        self.source.seek(SeekFrom::Start(pos))?;
        self.physical = physical;
        warn!(
            "Wrapped cell continuation {:?} not found ({})",
            cell.second,
            self.location()
        );
        Ok(line)
    }
}

/// `page <n>, File "<path>", line <n>`
pub struct Location<'a> {
    page_no: usize,
    path: &'a Path,
    line_no: usize,
}

impl fmt::Display for Location<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "page {}, File \"{}\", line {}",
            self.page_no,
            self.path.display(),
            self.line_no
        )
    }
}
