//! Command rules: `<name>(<arg>, <arg>, ...)`.

use crate::error::Result;
use crate::model::{Detail, DocState, ItemKind};
use crate::parser::callback::is_echoed;
use crate::parser::scanner::{ItemRules, ScanContext, CATEGORY_MARKER};
use regex::Regex;
use std::sync::LazyLock;
use tracing::debug;

static RE_COMMAND: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^([a-z_]+)(?:\((.*)\))?$").unwrap());

/// Category under which both RPN commands are documented together.
const RPN_CATEGORY: &str = "set_rpn()/set_nrpn()";

#[derive(Debug, Default)]
pub struct CommandRules;

impl ItemRules for CommandRules {
    fn kind(&self) -> ItemKind {
        ItemKind::Command
    }

    fn check_category(&mut self, ctx: &mut ScanContext<'_>, line: &str) -> Result<bool> {
        if line.starts_with(CATEGORY_MARKER) {
            return Ok(true);
        }
        if !ctx.chapter_categories.contains_key(line) {
            return Ok(false);
        }
        if line == RPN_CATEGORY {
            return Ok(true);
        }
        // "random()" is echoed as "random(<min>, <max>)"
        let prefix = line.strip_suffix(')').unwrap_or(line);
        is_echoed(ctx, prefix)
    }

    fn check_item(&mut self, ctx: &mut ScanContext<'_>, line: &str) -> Result<Option<DocState>> {
        if ctx.state != DocState::Category || line.is_empty() {
            return Ok(None);
        }
        let Some(caps) = RE_COMMAND.captures(line) else {
            return Ok(None);
        };
        let name = &caps[1];
        let mut item = ctx.new_item(ItemKind::Command, name);
        if let Detail::Command { parameter_list, .. } = &mut item.detail {
            *parameter_list = split_parameters(caps.get(2).map_or("", |m| m.as_str()));
        }
        ctx.add_item(item);
        // set_rpn and set_nrpn follow each other and share one entry.
        if name == "set_rpn" {
            return Ok(Some(DocState::Category));
        }
        Ok(Some(DocState::Description))
    }

    /// The manual documents `set_rpn` only through the combined `set_nrpn`
    /// entry, so its canonical item becomes a renamed copy of `set_nrpn`.
    fn finish_zone(&mut self, ctx: &mut ScanContext<'_>) {
        let Some(idx) = ctx.store.first_index("set_nrpn") else {
            debug!("No set_nrpn found, set_rpn left as is");
            return;
        };
        if !ctx.store.contains("set_rpn") {
            debug!("No set_rpn found, added as a copy of set_nrpn");
        }
        let mut alias = ctx.store.item(idx).clone();
        alias.name = "set_rpn".to_string();
        ctx.store.replace_first(alias);
    }
}

/// Split `<a>, <b>` into `["a", "b"]`.
pub(crate) fn split_parameters(arguments: &str) -> Vec<String> {
    if arguments.trim().is_empty() {
        return Vec::new();
    }
    arguments
        .split(',')
        .map(|p| p.trim().replace(['<', '>'], ""))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::parser::scanner::tests::scan_text;
    use crate::parser::store::ItemStore;

    const ZONE: (&str, &str) = (
        r"^(\d+\.\s+)?Arithmetic Commands & Operators$",
        r"^(\d+\.\s+)?Built-in Variables and Constants$",
    );

    const TOC: &str = "\
Table of Contents
1. Arithmetic Commands & Operators ... 10
2. General Commands .................. 12
random() ............................. 12
set_rpn()/set_nrpn() ................. 13
3. Built-in Variables and Constants .. 20
Disclaimer
";

    fn scan(body: &str) -> ItemStore {
        scan_text(Box::new(CommandRules), ZONE, &format!("{TOC}{body}"))
    }

    fn params(store: &ItemStore, name: &str) -> Vec<String> {
        store.occurrences(name)[0].parameter_list().to_vec()
    }

    #[test]
    fn parameters_are_split() {
        assert_eq!(split_parameters("<min>, <max>"), vec!["min", "max"]);
        assert!(split_parameters("").is_empty());
    }

    #[test]
    fn echoed_category_defines_command() {
        let store = scan(
            "1. Arithmetic Commands & Operators\n2. General Commands\nrandom()\n\nrandom(<min>, <max>)\n\
             generate a random number\n\n\n3. Built-in Variables and Constants\n",
        );
        let random = store.occurrences("random")[0];
        assert_eq!(random.category, "random()");
        assert_eq!(random.headline, "2. General Commands");
        assert_eq!(random.description, "generate a random number");
        assert_eq!(params(&store, "random"), vec!["min", "max"]);
    }

    #[test]
    fn set_rpn_is_copied_from_set_nrpn() {
        let store = scan(
            "1. Arithmetic Commands & Operators\n2. General Commands\nset_rpn()/set_nrpn()\n\nset_rpn(<address>, <value>)\nset_nrpn(<address>, <value>)\n\
             send a rpn or nrpn message\nRemarks\nonly in note callbacks\n\n\n",
        );
        let rpn = store.occurrences("set_rpn")[0];
        let nrpn = store.occurrences("set_nrpn")[0];
        assert_eq!(rpn.description, nrpn.description);
        assert_eq!(rpn.description, "send a rpn or nrpn message");
        assert_eq!(rpn.line_no, nrpn.line_no);
        assert_eq!(params(&store, "set_rpn"), vec!["address", "value"]);
    }

    #[test]
    fn set_rpn_is_created_when_missing() {
        let store = scan(
            "1. Arithmetic Commands & Operators\n2. General Commands\n[C]RPN\nset_nrpn(<address>, <value>)\n\
             send a nrpn message\n",
        );
        // the derived set_rpn is not counted as found
        assert_eq!(store.item_count(), 1);
        let rpn = store.occurrences("set_rpn")[0];
        assert_eq!(rpn.description, "send a nrpn message");
        assert_eq!(rpn.category, "RPN");
        let names: Vec<&str> = store.names().collect();
        assert_eq!(names, vec!["set_nrpn", "set_rpn"]);
    }

    #[test]
    fn duplicate_commands_are_counted() {
        let store = scan(
            "1. Arithmetic Commands & Operators\n2. General Commands\n[C]Misc\nstop_wait(<id>)\nfirst\n\n\nstop_wait(<id>)\nsecond\n",
        );
        let stop_wait = store.occurrences("stop_wait");
        assert_eq!(stop_wait.len(), 2);
        assert_eq!(stop_wait[0].description, "first");
        assert_eq!(stop_wait[1].description, "second");
        assert_eq!(store.duplicate_count(), 1);
    }
}
