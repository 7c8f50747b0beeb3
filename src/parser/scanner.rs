//! Item scanner state machine shared by all item kinds.
//!
//! The scanner walks the reader zone by zone. Each line inside a zone is
//! run through [`CLASSIFIERS`] in order; the first one that matches decides
//! the transition. Kind-specific decisions are delegated to [`ItemRules`].

use crate::error::Result;
use crate::model::{DocItem, DocState, ItemKind, Origin};
use crate::parser::store::ItemStore;
use crate::parser::zone::ContentPattern;
use crate::reader::RewindReader;
use crate::toc::TableOfContents;
use indexmap::IndexMap;
use regex::Regex;
use std::sync::LazyLock;
use tracing::{debug, info};

static RE_REMARKS: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"^Remarks$").unwrap());

static RE_EXAMPLES: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"^\s*Examples?$").unwrap());

static RE_SEE_ALSO: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"(?i)^See Also$").unwrap());

/// Marker for categories that are missing from the table of contents.
pub const CATEGORY_MARKER: &str = "[C]";

/// Remarks, Examples or See Also heading.
pub fn is_section_header(line: &str) -> bool {
    RE_REMARKS.is_match(line) || RE_EXAMPLES.is_match(line) || RE_SEE_ALSO.is_match(line)
}

// -- Context ------------------------------------------------------------------

/// Mutable scan state handed to the kind-specific rules.
pub struct ScanContext<'a> {
    pub reader: &'a mut RewindReader,
    pub toc: &'a TableOfContents,
    pub headline: String,
    pub category: String,
    pub chapter_categories: IndexMap<String, usize>,
    pub state: DocState,
    pub last_line: Option<String>,
    pub store: ItemStore,
    /// Keep the current line out of the raw text of the current item.
    pub skip_parsed_line: bool,
    zone: Option<ContentPattern>,
}

impl<'a> ScanContext<'a> {
    pub fn new(reader: &'a mut RewindReader, toc: &'a TableOfContents) -> Self {
        Self {
            reader,
            toc,
            headline: String::new(),
            category: String::new(),
            chapter_categories: IndexMap::new(),
            state: DocState::None,
            last_line: None,
            store: ItemStore::default(),
            skip_parsed_line: false,
            zone: None,
        }
    }

    /// Origin of an item defined on the line just read.
    pub fn origin(&self) -> Origin {
        Origin {
            file: self.reader.file_name(),
            page_no: self.reader.page_no(),
            line_no: self.reader.line_no(),
            headline: self.headline.clone(),
            category: self.category.clone(),
        }
    }

    pub fn new_item(&self, kind: ItemKind, name: &str) -> DocItem {
        DocItem::new(kind, name, self.origin())
    }

    pub fn add_item(&mut self, item: DocItem) -> usize {
        self.store.add(item, self.reader.location())
    }

    /// Append `line` to the field of the current state on every current item.
    pub fn append_to_current(&mut self, line: &str) {
        let current = self.store.current().to_vec();
        self.store.append_text(&current, self.state, line);
    }

    /// Append a line of prose to the description of every current item.
    pub fn append_to_current_description(&mut self, text: &str) {
        let current = self.store.current().to_vec();
        self.store.append_text(&current, DocState::Description, text);
    }

    fn reset_zone(&mut self, zone: ContentPattern) {
        self.zone = Some(zone);
        self.headline.clear();
        self.category.clear();
        self.chapter_categories.clear();
        self.state = DocState::None;
        self.last_line = None;
        self.store.clear_current();
    }
}

// -- Kind-specific rules ------------------------------------------------------

pub trait ItemRules {
    fn kind(&self) -> ItemKind;

    /// Is `line` the start of a new category within the current headline?
    fn check_category(&mut self, ctx: &mut ScanContext<'_>, line: &str) -> Result<bool> {
        Ok(line.starts_with(CATEGORY_MARKER) || ctx.chapter_categories.contains_key(line))
    }

    /// Register the item(s) defined by `line`, returning the next state.
    fn check_item(&mut self, ctx: &mut ScanContext<'_>, line: &str) -> Result<Option<DocState>>;

    fn add_item_documentation(&mut self, ctx: &mut ScanContext<'_>, line: &str) {
        ctx.append_to_current(line);
    }

    fn on_headline(&mut self, _ctx: &mut ScanContext<'_>, _headline: &str) {}

    fn on_category(&mut self, _ctx: &mut ScanContext<'_>, _category: &str) {}

    /// Close out the current item list (cross-item links, shared text).
    fn finalize_item_list(&mut self, _ctx: &mut ScanContext<'_>) {}

    /// Post-processing once a zone has been scanned completely.
    fn finish_zone(&mut self, _ctx: &mut ScanContext<'_>) {}
}

// -- Classification -----------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Transition {
    Stop,
    Headline,
    Category,
    Item(DocState),
    Section(DocState),
    Documentation,
}

type Classify = fn(&mut dyn ItemRules, &mut ScanContext<'_>, &str) -> Result<Option<Transition>>;

/// Line classifiers in priority order.
pub const CLASSIFIERS: &[(&str, Classify)] = &[
    ("stop", classify_stop),
    ("headline", classify_headline),
    ("category", classify_category),
    ("item", classify_item),
    ("remarks", classify_remarks),
    ("examples", classify_examples),
    ("see_also", classify_see_also),
    ("documentation", classify_documentation),
];

fn classify_stop(_: &mut dyn ItemRules, ctx: &mut ScanContext<'_>, line: &str) -> Result<Option<Transition>> {
    let stop = ctx.zone.as_ref().is_some_and(|zone| zone.is_stop(line));
    Ok(stop.then_some(Transition::Stop))
}

fn classify_headline(_: &mut dyn ItemRules, ctx: &mut ScanContext<'_>, line: &str) -> Result<Option<Transition>> {
    Ok(ctx.toc.is_headline(line).then_some(Transition::Headline))
}

fn classify_category(
    rules: &mut dyn ItemRules,
    ctx: &mut ScanContext<'_>,
    line: &str,
) -> Result<Option<Transition>> {
    // See Also blocks reference other categories by name.
    if ctx.state == DocState::SeeAlso {
        return Ok(None);
    }
    Ok(rules.check_category(ctx, line)?.then_some(Transition::Category))
}

fn classify_item(rules: &mut dyn ItemRules, ctx: &mut ScanContext<'_>, line: &str) -> Result<Option<Transition>> {
    if ctx.state == DocState::None {
        return Ok(None);
    }
    Ok(rules.check_item(ctx, line)?.map(Transition::Item))
}

fn section(ctx: &ScanContext<'_>, re: &Regex, line: &str, state: DocState) -> Option<Transition> {
    (ctx.state != DocState::None && re.is_match(line)).then_some(Transition::Section(state))
}

fn classify_remarks(_: &mut dyn ItemRules, ctx: &mut ScanContext<'_>, line: &str) -> Result<Option<Transition>> {
    Ok(section(ctx, &RE_REMARKS, line, DocState::Remarks))
}

fn classify_examples(_: &mut dyn ItemRules, ctx: &mut ScanContext<'_>, line: &str) -> Result<Option<Transition>> {
    Ok(section(ctx, &RE_EXAMPLES, line, DocState::Examples))
}

fn classify_see_also(_: &mut dyn ItemRules, ctx: &mut ScanContext<'_>, line: &str) -> Result<Option<Transition>> {
    Ok(section(ctx, &RE_SEE_ALSO, line, DocState::SeeAlso))
}

fn classify_documentation(
    _: &mut dyn ItemRules,
    ctx: &mut ScanContext<'_>,
    _line: &str,
) -> Result<Option<Transition>> {
    let documenting = !matches!(ctx.state, DocState::None | DocState::Category);
    Ok(documenting.then_some(Transition::Documentation))
}

// -- Scanner ------------------------------------------------------------------

pub struct ItemScanner {
    rules: Box<dyn ItemRules>,
    zones: Vec<ContentPattern>,
}

impl ItemScanner {
    pub fn new(rules: Box<dyn ItemRules>, zones: Vec<ContentPattern>) -> Self {
        Self { rules, zones }
    }

    /// Scan every zone of the document from the start and collect the items.
    pub fn parse(&mut self, reader: &mut RewindReader, toc: &TableOfContents) -> Result<ItemStore> {
        let kind = self.rules.kind();
        info!("Parse {} in {}", kind.plural(), reader.path().display());
        reader.reset()?;
        let mut ctx = ScanContext::new(reader, toc);
        while let Some(zone) = self.search_content_start(&mut ctx)? {
            ctx.reset_zone(zone);
            self.scan_items(&mut ctx)?;
            self.rules.finish_zone(&mut ctx);
        }
        ctx.store.fix_documentation();
        info!("{} {} found", ctx.store.item_count(), kind.plural());
        info!("{} duplicate {}", ctx.store.duplicate_count(), kind.plural());
        Ok(ctx.store)
    }

    fn search_content_start(&self, ctx: &mut ScanContext<'_>) -> Result<Option<ContentPattern>> {
        while let Some(line) = ctx.reader.next_line()? {
            if let Some(zone) = self.zones.iter().find(|zone| zone.is_start(&line)) {
                debug!(
                    "Found content start {} ({})",
                    zone.start_pattern(),
                    ctx.reader.location()
                );
                ctx.reader.rewind()?;
                return Ok(Some(zone.clone()));
            }
        }
        Ok(None)
    }

    fn scan_items(&mut self, ctx: &mut ScanContext<'_>) -> Result<()> {
        let mut first = true;
        loop {
            let Some(line) = ctx.reader.next_line()? else {
                // End of file closes the zone like its stop headline.
                self.rules.finalize_item_list(ctx);
                break;
            };
            // The start headline may also match the stop pattern.
            let transition = if first {
                classify_from(1, self.rules.as_mut(), ctx, &line)?
            } else {
                classify_from(0, self.rules.as_mut(), ctx, &line)?
            };
            first = false;
            match transition {
                Some(Transition::Stop) => {
                    self.rules.finalize_item_list(ctx);
                    ctx.reader.rewind()?;
                    debug!("Found content stop ({})", ctx.reader.location());
                    break;
                }
                Some(Transition::Headline) => self.enter_headline(ctx, &line),
                Some(Transition::Category) => self.enter_category(ctx, &line),
                Some(Transition::Item(state)) | Some(Transition::Section(state)) => {
                    ctx.state = state;
                    self.after_item_line(ctx, &line);
                }
                Some(Transition::Documentation) => {
                    self.rules.add_item_documentation(ctx, &line);
                    self.after_item_line(ctx, &line);
                }
                None if ctx.state != DocState::None => self.after_item_line(ctx, &line),
                None => {}
            }
            ctx.last_line = Some(line);
        }
        ctx.zone = None;
        Ok(())
    }

    fn enter_headline(&mut self, ctx: &mut ScanContext<'_>, line: &str) {
        self.rules.finalize_item_list(ctx);
        ctx.headline = line.to_string();
        ctx.chapter_categories = ctx.toc.categories_of(line);
        ctx.category.clear();
        self.rules.on_headline(ctx, line);
        ctx.store.clear_current();
        debug!("- Headline: {} ({})", ctx.headline, ctx.reader.location());
        ctx.state = DocState::None;
    }

    fn enter_category(&mut self, ctx: &mut ScanContext<'_>, line: &str) {
        self.rules.finalize_item_list(ctx);
        let category = line.strip_prefix(CATEGORY_MARKER).unwrap_or(line);
        ctx.category = category.to_string();
        self.rules.on_category(ctx, category);
        ctx.state = DocState::Category;
        ctx.store.clear_current();
        debug!("   - Category: {} ({})", ctx.category, ctx.reader.location());
    }

    /// Raw text bookkeeping and blank-line termination inside a headline.
    fn after_item_line(&mut self, ctx: &mut ScanContext<'_>, line: &str) {
        if !ctx.skip_parsed_line {
            ctx.store.append_parsed(line);
        }
        ctx.skip_parsed_line = false;
        // One blank line ends a See Also block, two end any other block.
        if line.is_empty()
            && (ctx.state == DocState::SeeAlso || ctx.last_line.as_deref() == Some(""))
        {
            self.rules.finalize_item_list(ctx);
            ctx.store.clear_current();
            ctx.state = DocState::Category;
        }
    }
}

fn classify_from(
    skip: usize,
    rules: &mut dyn ItemRules,
    ctx: &mut ScanContext<'_>,
    line: &str,
) -> Result<Option<Transition>> {
    for (_, classify) in CLASSIFIERS.iter().skip(skip) {
        if let Some(transition) = classify(rules, ctx, line)? {
            return Ok(Some(transition));
        }
    }
    Ok(None)
}
