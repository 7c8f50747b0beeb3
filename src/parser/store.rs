//! Item storage for one scan pass.
//!
//! Items live in an arena; `by_name` keeps every occurrence of a name in
//! the order found. The current item list holds the items that trailing
//! documentation lines are appended to.

use crate::model::{DocItem, DocState, ItemKind};
use indexmap::IndexMap;
use std::fmt;
use tracing::{debug, info};

#[derive(Debug, Default)]
pub struct ItemStore {
    items: Vec<DocItem>,
    by_name: IndexMap<String, Vec<usize>>,
    current: Vec<usize>,
    item_cnt: usize,
    duplicate_cnt: usize,
}

impl ItemStore {
    /// Register an item and make it part of the current item list.
    ///
    /// A name seen before is a duplicate: it is kept as a further occurrence
    /// with its own documentation. Earlier occurrences stay closed.
    pub fn add(&mut self, item: DocItem, location: impl fmt::Display) -> usize {
        let idx = self.items.len();
        let name = item.name.clone();
        self.items.push(item);
        match self.by_name.get_mut(&name) {
            Some(occurrences) => {
                debug!("      - Duplicate {} ({})", name, location);
                occurrences.push(idx);
                self.duplicate_cnt += 1;
            }
            None => {
                debug!("      - Found {} ({})", name, location);
                self.by_name.insert(name, vec![idx]);
                self.item_cnt += 1;
            }
        }
        self.current.push(idx);
        idx
    }

    pub fn current(&self) -> &[usize] {
        &self.current
    }

    pub fn clear_current(&mut self) {
        self.current.clear();
    }

    pub fn item(&self, idx: usize) -> &DocItem {
        &self.items[idx]
    }

    pub fn item_mut(&mut self, idx: usize) -> &mut DocItem {
        &mut self.items[idx]
    }

    /// Append `line` to the field selected by `state` on the given items.
    pub fn append_text(&mut self, indices: &[usize], state: DocState, line: &str) {
        for &idx in indices {
            if let Some(text) = self.items[idx].text_mut(state) {
                text.push_str(line);
                text.push('\n');
            }
        }
    }

    /// Record `line` in the raw text of the last current item.
    pub fn append_parsed(&mut self, line: &str) {
        if let Some(&idx) = self.current.last() {
            let text = &mut self.items[idx].parsed_text;
            text.push_str(line);
            text.push('\n');
        }
    }

    pub fn contains(&self, name: &str) -> bool {
        self.by_name.contains_key(name)
    }

    /// All occurrences of `name`, canonical first.
    pub fn occurrences(&self, name: &str) -> Vec<&DocItem> {
        self.by_name
            .get(name)
            .map(|list| list.iter().map(|&i| &self.items[i]).collect())
            .unwrap_or_default()
    }

    pub fn first_index(&self, name: &str) -> Option<usize> {
        self.by_name.get(name).and_then(|list| list.first().copied())
    }

    /// Replace the canonical occurrence of `item.name`, or add it as new.
    /// Derived items are not counted as found.
    pub fn replace_first(&mut self, item: DocItem) {
        match self.first_index(&item.name) {
            Some(idx) => self.items[idx] = item,
            None => {
                let name = item.name.clone();
                self.items.push(item);
                self.by_name.insert(name, vec![self.items.len() - 1]);
            }
        }
    }

    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.by_name.keys().map(String::as_str)
    }

    pub fn item_count(&self) -> usize {
        self.item_cnt
    }

    pub fn duplicate_count(&self) -> usize {
        self.duplicate_cnt
    }

    pub fn fix_documentation(&mut self) {
        self.items.iter_mut().for_each(DocItem::fix_documentation);
    }

    /// Items grouped by name in order of first appearance.
    pub fn iter(&self) -> impl Iterator<Item = &DocItem> {
        self.by_name
            .values()
            .flat_map(|list| list.iter().map(|&i| &self.items[i]))
    }

    pub fn into_items(self) -> Vec<DocItem> {
        self.iter().cloned().collect()
    }

    pub fn dump(&self, kind: ItemKind, with_text: bool) {
        info!("Dump {}", kind.plural());
        for name in self.names() {
            for (n, item) in self.occurrences(name).into_iter().enumerate() {
                if n == 0 {
                    info!("{} {} {}", "-".repeat(30), name, "-".repeat(30));
                } else {
                    info!("{} {} (DUPLICATE {}) {}", "-".repeat(30), name, n, "-".repeat(30));
                }
                for line in item.dump_lines(with_text) {
                    info!("{}", line);
                }
            }
        }
    }
}
