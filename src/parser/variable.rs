//! Variable and constant rules.
//!
//! Recognized line shapes:
//!
//! - `$NAME`, `%NAME[<index>]`, `$NAME (comment)`, optionally bulleted
//! - `$NAME: description` or `$NAME  description` (two-column tables)
//! - `$MARK_1 ... $MARK_28`, one item per index sharing one description
//! - `Some headline:` introducing a list of constants
//!
//! Text before the first item of a category becomes the block headline of
//! the items that follow.

use crate::error::Result;
use crate::model::{Detail, DocState, ItemKind};
use crate::parser::scanner::{is_section_header, ItemRules, ScanContext};
use regex::Regex;
use std::sync::LazyLock;
use tracing::{debug, warn};

static RE_VAR: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^(?:•\s*)?([$%!~@?][A-Z]+[A-Z_0-9]*)(\[<(.+)>\]+)?(?:\s+(\(.+\)))?$").unwrap()
});

static RE_RANGE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^(?:•\s*)?([$%!~@?][A-Z_]+)(\d+)\s+\.\.\.\s+([$%!~@?][A-Z_]+)(\d+)$").unwrap()
});

static RE_TABLE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^(?:•\s*)?([$%!~@?][A-Z]+[A-Z_0-9]*)(?::\s*|\s{2,})(\S.*)$").unwrap()
});

#[derive(Debug, Default)]
pub struct VariableRules {
    block_headline: String,
    item_list_headline: String,
    /// The current item list is an expanded range.
    in_range: bool,
}

impl VariableRules {
    fn reset_headlines(&mut self) {
        self.block_headline.clear();
        self.item_list_headline.clear();
    }

    fn start_item(&mut self, ctx: &mut ScanContext<'_>) {
        self.finish_range(ctx);
        ctx.store.clear_current();
    }

    fn add_variable(
        &self,
        ctx: &mut ScanContext<'_>,
        name: &str,
        parameter: &str,
        comment: &str,
        range: (usize, usize),
    ) -> usize {
        let mut item = ctx.new_item(ItemKind::Variable, name);
        if let Detail::Variable {
            block_headline,
            item_list_headline,
            range_start,
            range_end,
            parameter: p,
            comment: c,
            ..
        } = &mut item.detail
        {
            block_headline.clone_from(&self.block_headline);
            item_list_headline.clone_from(&self.item_list_headline);
            *range_start = range.0;
            *range_end = range.1;
            *p = parameter.to_string();
            *c = comment.to_string();
        }
        ctx.add_item(item)
    }

    /// Share the last range element's description across the range and
    /// link the elements to each other.
    fn finish_range(&mut self, ctx: &mut ScanContext<'_>) {
        if !std::mem::take(&mut self.in_range) {
            return;
        }
        let current = ctx.store.current().to_vec();
        let Some(&last) = current.last() else {
            return;
        };
        let description = ctx.store.item(last).description.clone();
        let names: Vec<String> = current
            .iter()
            .map(|&i| ctx.store.item(i).name.clone())
            .collect();
        for &idx in &current {
            let item = ctx.store.item_mut(idx);
            item.description.clone_from(&description);
            let others: Vec<&str> = names
                .iter()
                .filter(|n| **n != item.name)
                .map(String::as_str)
                .collect();
            if let Detail::Variable { see_also, .. } = &mut item.detail {
                *see_also = others.join(", ");
            }
        }
    }

    fn item_list_headline(&mut self, ctx: &mut ScanContext<'_>, line: &str) {
        let text = line.strip_suffix(':').unwrap_or(line);
        // "...the previous sentence. Possible values:"
        let headline = match text.rfind(". ") {
            Some(pos) => {
                let prose = &text[..=pos];
                ctx.append_to_current_description(prose);
                &text[pos + 2..]
            }
            None => text,
        };
        self.item_list_headline = headline.trim().to_string();
        debug!(
            "   - Item list headline: {} ({})",
            self.item_list_headline,
            ctx.reader.location()
        );
    }
}

impl ItemRules for VariableRules {
    fn kind(&self) -> ItemKind {
        ItemKind::Variable
    }

    fn check_item(&mut self, ctx: &mut ScanContext<'_>, line: &str) -> Result<Option<DocState>> {
        if let Some(caps) = RE_VAR.captures(line) {
            self.start_item(ctx);
            let parameter = caps.get(3).map_or("", |m| m.as_str());
            let comment = caps.get(4).map_or("", |m| m.as_str());
            self.add_variable(ctx, &caps[1], parameter, comment, (0, 0));
            return Ok(Some(DocState::Description));
        }

        if let Some(caps) = RE_RANGE.captures(line) {
            let (start, end) = match (caps[2].parse::<usize>(), caps[4].parse::<usize>()) {
                (Ok(start), Ok(end)) if start <= end => (start, end),
                _ => {
                    warn!("Invalid variable range {} ({})", line, ctx.reader.location());
                    return Ok(None);
                }
            };
            if caps[1] != caps[3] {
                warn!("Range with different names {} ({})", line, ctx.reader.location());
            }
            self.start_item(ctx);
            for index in start..=end {
                let name = format!("{}{}", &caps[1], index);
                self.add_variable(ctx, &name, "", "", (start, end));
            }
            self.in_range = true;
            return Ok(Some(DocState::Description));
        }

        if let Some(caps) = RE_TABLE.captures(line) {
            self.start_item(ctx);
            let idx = self.add_variable(ctx, &caps[1], "", "", (0, 0));
            let item = ctx.store.item_mut(idx);
            item.description.push_str(&caps[2]);
            item.description.push('\n');
            return Ok(Some(DocState::Description));
        }

        if line.ends_with(':') {
            self.item_list_headline(ctx, line);
            return Ok(Some(ctx.state));
        }

        if ctx.state == DocState::Category
            && ctx.store.current().is_empty()
            && !line.is_empty()
            && !is_section_header(line)
        {
            self.block_headline.push_str(line);
            self.block_headline.push('\n');
            self.item_list_headline.clear();
            debug!("   - Block headline: {} ({})", line, ctx.reader.location());
            return Ok(Some(DocState::Category));
        }
        Ok(None)
    }

    /// Range elements share the documentation collected by the last one.
    fn add_item_documentation(&mut self, ctx: &mut ScanContext<'_>, line: &str) {
        if self.in_range {
            if let Some(&last) = ctx.store.current().last() {
                ctx.store.append_text(&[last], ctx.state, line);
            }
        } else {
            ctx.append_to_current(line);
        }
    }

    fn on_headline(&mut self, _ctx: &mut ScanContext<'_>, _headline: &str) {
        self.in_range = false;
        self.reset_headlines();
    }

    fn on_category(&mut self, _ctx: &mut ScanContext<'_>, _category: &str) {
        self.in_range = false;
        self.reset_headlines();
    }

    fn finalize_item_list(&mut self, ctx: &mut ScanContext<'_>) {
        self.finish_range(ctx);
        if !ctx.store.current().is_empty() {
            self.reset_headlines();
        }
    }
}
