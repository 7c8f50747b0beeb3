//! Table of contents scan.
//!
//! Collects chapter headlines and the categories declared under each of
//! them. The result is read-only reference data for the item scanners.

use crate::error::{Result, ScanError};
use crate::reader::RewindReader;
use indexmap::IndexMap;
use regex::Regex;
use std::sync::LazyLock;
use tracing::{debug, info, warn};

static RE_TOC_START: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^(\d+\.\s+)?Table of Contents").unwrap());

static RE_TOC_END: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^(\d+\.\s+)?Disclaimer$").unwrap());

static RE_HEADLINE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^(\d+\.\s+.+?)\s+\.+\s+(\d+)$").unwrap());

static RE_CATEGORY: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^(.+?)\s+\.+\s+(\d+)$").unwrap());

#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct TableOfContents {
    /// Headline -> page number.
    pub headlines: IndexMap<String, usize>,
    /// Headline -> (category -> page number).
    pub categories: IndexMap<String, IndexMap<String, usize>>,
}

impl TableOfContents {
    pub fn is_headline(&self, line: &str) -> bool {
        self.headlines.contains_key(line)
    }

    /// Categories declared under `headline`, empty if there are none.
    pub fn categories_of(&self, headline: &str) -> IndexMap<String, usize> {
        self.categories.get(headline).cloned().unwrap_or_default()
    }

    pub fn category_count(&self) -> usize {
        self.categories.values().map(IndexMap::len).sum()
    }

    /// Render the contents with dot leaders, one entry per line.
    pub fn render(&self) -> String {
        let mut out = String::new();
        for (headline, page) in &self.headlines {
            out.push_str(&leader_line("", headline, *page, 78));
            if let Some(categories) = self.categories.get(headline) {
                for (category, page) in categories {
                    out.push_str(&leader_line("   ", category, *page, 75));
                }
            }
        }
        out
    }
}

fn leader_line(indent: &str, title: &str, page: usize, width: usize) -> String {
    let page = page.to_string();
    let dots = width.saturating_sub(title.chars().count() + page.len()).max(3);
    format!("{}{} {} {}\n", indent, title, ".".repeat(dots), page)
}

/// ToC boundary patterns; the defaults match the KSP reference manual.
#[derive(Debug, Clone)]
pub struct TocPatterns {
    pub start: Regex,
    pub end: Regex,
}

impl Default for TocPatterns {
    fn default() -> Self {
        Self {
            start: RE_TOC_START.clone(),
            end: RE_TOC_END.clone(),
        }
    }
}

/// Scan the table of contents starting at the reader's current position.
///
/// A category line before the first headline is fatal: the ToC is not
/// shaped the way the scanner expects.
pub fn scan(reader: &mut RewindReader, patterns: &TocPatterns) -> Result<TableOfContents> {
    info!("Parse headlines and categories in {}", reader.path().display());
    let mut toc = TableOfContents::default();

    let mut found = false;
    while let Some(line) = reader.next_line()? {
        if patterns.start.is_match(&line) {
            debug!("Found TOC start ({})", reader.location());
            reader.rewind()?;
            found = true;
            break;
        }
    }
    if !found {
        warn!("No table of contents found in {}", reader.path().display());
        return Ok(toc);
    }

    let mut last_headline: Option<String> = None;
    while let Some(line) = reader.next_line()? {
        if patterns.end.is_match(&line) {
            debug!("Found TOC end ({})", reader.location());
            reader.rewind()?;
            break;
        }
        if let Some(caps) = RE_HEADLINE.captures(&line) {
            let headline = caps[1].to_string();
            debug!("- Found TOC headline: {} ({})", headline, reader.location());
            toc.headlines.insert(headline.clone(), parse_page(&caps[2]));
            last_headline = Some(headline);
        } else if let Some(caps) = RE_CATEGORY.captures(&line) {
            let category = caps[1].to_string();
            debug!("   - Found TOC category: {} ({})", category, reader.location());
            let Some(headline) = last_headline.as_ref() else {
                return Err(ScanError::CategoryWithoutHeadline {
                    category,
                    location: reader.location().to_string(),
                });
            };
            toc.categories
                .entry(headline.clone())
                .or_default()
                .insert(category, parse_page(&caps[2]));
        }
    }

    info!("{} headlines found", toc.headlines.len());
    info!("{} categories found", toc.category_count());
    Ok(toc)
}

fn parse_page(text: &str) -> usize {
    text.parse().unwrap_or_default()
}

#[cfg(test)]
mod tests {
    use super::*;

    const MANUAL: &str = "\
Title page
Table of Contents
1. Callbacks ........................ 5
on init ............................. 6
on note ............................. 7
2. Variables ........................ 9
General ............................. 9
Disclaimer
1. Callbacks
";

    #[test]
    fn collects_headlines_and_categories() {
        let mut reader = RewindReader::from_text("manual.txt", MANUAL);
        let toc = scan(&mut reader, &TocPatterns::default()).unwrap();
        assert_eq!(toc.headlines.len(), 2);
        assert_eq!(toc.headlines["1. Callbacks"], 5);
        assert_eq!(toc.headlines["2. Variables"], 9);
        let callbacks = toc.categories_of("1. Callbacks");
        assert_eq!(callbacks.keys().collect::<Vec<_>>(), vec!["on init", "on note"]);
        assert_eq!(toc.categories_of("2. Variables")["General"], 9);
        assert!(toc.categories_of("3. Missing").is_empty());
    }

    #[test]
    fn stops_before_end_marker() {
        let mut reader = RewindReader::from_text("manual.txt", MANUAL);
        scan(&mut reader, &TocPatterns::default()).unwrap();
        assert_eq!(reader.next_line().unwrap().as_deref(), Some("Disclaimer"));
    }

    #[test]
    fn category_without_headline_is_fatal() {
        let text = "Table of Contents\nGeneral ...... 3\n1. Callbacks ..... 5\n";
        let mut reader = RewindReader::from_text("manual.txt", text);
        let err = scan(&mut reader, &TocPatterns::default()).unwrap_err();
        match err {
            ScanError::CategoryWithoutHeadline { category, location } => {
                assert_eq!(category, "General");
                assert!(location.ends_with("line 2"));
            }
            other => panic!("unexpected error: {other}"),
        }
    }

    #[test]
    fn missing_toc_is_empty() {
        let mut reader = RewindReader::from_text("manual.txt", "no contents here\n");
        let toc = scan(&mut reader, &TocPatterns::default()).unwrap();
        assert!(toc.headlines.is_empty());
    }

    #[test]
    fn render_uses_dot_leaders() {
        let mut reader = RewindReader::from_text("manual.txt", MANUAL);
        let toc = scan(&mut reader, &TocPatterns::default()).unwrap();
        let rendered = toc.render();
        let first = rendered.lines().next().unwrap();
        assert!(first.starts_with("1. Callbacks ..."));
        assert!(first.ends_with(" 5"));
        assert!(rendered.contains("\n   on init ..."));
    }
}
