//! Manual scanners: one state machine, one rule set per item kind.

pub mod callback;
pub mod command;
pub mod function;
pub mod registry;
pub mod scanner;
pub mod store;
pub mod variable;
pub mod widget;
pub mod zone;

use crate::error::Result;
use crate::model::ItemKind;
use crate::parser::registry::{ManualVersion, Registry};
use crate::parser::scanner::ItemScanner;
use crate::parser::store::ItemStore;
use crate::parser::zone::ContentPattern;
use crate::reader::{Remediation, RewindReader};
use crate::toc::TableOfContents;
use tracing::debug;

/// Inputs of one scan pass besides the document itself.
pub struct PassOptions<'a> {
    pub version: ManualVersion,
    pub zones: Vec<ContentPattern>,
    /// Appended to the remediation tables of the version rules.
    pub remediation: &'a Remediation,
}

/// Scan the whole document for items of `kind`.
pub fn scan_kind(
    registry: &Registry,
    kind: ItemKind,
    options: PassOptions<'_>,
    reader: &mut RewindReader,
    toc: &TableOfContents,
) -> Result<ItemStore> {
    let kind_rules = registry.create(kind, options.version);
    let mut remediation = kind_rules.remediation;
    remediation.extend(options.remediation);
    if !remediation.is_empty() {
        debug!(
            "Line remediation for {}: {} skipped ranges, {} merged lines, {} wrapped cells",
            kind.plural(),
            remediation.skip_lines.len(),
            remediation.merge_lines.len(),
            remediation.wrapped_cells.len()
        );
    }
    reader.set_remediation(remediation);
    let mut scanner = ItemScanner::new(kind_rules.rules, options.zones);
    let store = scanner.parse(reader, toc);
    reader.set_remediation(Remediation::default());
    store
}
