//! Callback rules: `on <name>[/<name>] [(<parameter>)]`.

use crate::error::Result;
use crate::model::{Detail, DocState, ItemKind};
use crate::parser::scanner::{ItemRules, ScanContext, CATEGORY_MARKER};
use regex::Regex;
use std::sync::LazyLock;
use tracing::{debug, error};

static RE_CALLBACK: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^on\s+([a-z_]+)(?:/([a-z_]+))?(?:\s+\(<([a-z-]+)>\))?$").unwrap()
});

#[derive(Debug, Default)]
pub struct CallbackRules;

impl ItemRules for CallbackRules {
    fn kind(&self) -> ItemKind {
        ItemKind::Callback
    }

    /// The manual repeats each category as the first line of its entry.
    /// A category name elsewhere (e.g. inside an example) is not followed
    /// by that echo and is rejected.
    fn check_category(&mut self, ctx: &mut ScanContext<'_>, line: &str) -> Result<bool> {
        if line.starts_with(CATEGORY_MARKER) {
            return Ok(true);
        }
        if !ctx.chapter_categories.contains_key(line) {
            return Ok(false);
        }
        is_echoed(ctx, line)
    }

    fn check_item(&mut self, ctx: &mut ScanContext<'_>, line: &str) -> Result<Option<DocState>> {
        if ctx.state != DocState::Category || line.is_empty() {
            return Ok(None);
        }
        let caps = match RE_CALLBACK.captures(line) {
            Some(caps) if line.starts_with(ctx.category.as_str()) => caps,
            _ => {
                error!(
                    "Can't find the expected callback {}, but got {} ({})",
                    ctx.category,
                    line,
                    ctx.reader.location()
                );
                return Ok(None);
            }
        };
        let parameter = caps.get(3).map_or("", |m| m.as_str()).to_string();
        let names: Vec<&str> = [caps.get(1), caps.get(2)]
            .into_iter()
            .flatten()
            .map(|m| m.as_str())
            .collect();
        ctx.store.clear_current();
        for name in names {
            let mut item = ctx.new_item(ItemKind::Callback, name);
            if let Detail::Callback { parameter: p, .. } = &mut item.detail {
                p.clone_from(&parameter);
            }
            ctx.add_item(item);
        }
        Ok(Some(DocState::Description))
    }
}

/// Does the line after the next one start with `text` again?
pub(crate) fn is_echoed(ctx: &mut ScanContext<'_>, text: &str) -> Result<bool> {
    let ahead = ctx.reader.peek(2)?;
    let echoed = ahead.get(1).is_some_and(|next| next.starts_with(text));
    if !echoed {
        debug!(
            "   - Category candidate {} not echoed, kept as text ({})",
            text,
            ctx.reader.location()
        );
    }
    Ok(echoed)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::parser::scanner::tests::scan_text;

    const ZONE: (&str, &str) = (r"^(\d+\.\s+)?Callbacks$", r"^(\d+\.\s+)?Variables$");

    const TOC: &str = "\
Table of Contents
1. Callbacks .................... 5
on init ......................... 5
on rpn/nrpn ..................... 6
on ui_control ................... 6
2. Variables .................... 9
Disclaimer
";

    fn scan(body: &str) -> crate::parser::store::ItemStore {
        scan_text(Box::new(CallbackRules), ZONE, &format!("{TOC}{body}"))
    }

    #[test]
    fn single_callback_end_to_end() {
        let store = scan(
            "1. Callbacks\non init\n\non init\n\nexecuted when the script was successfully analyzed.\n\n\n2. Variables\n",
        );
        assert_eq!(store.item_count(), 1);
        let init = store.occurrences("init")[0];
        assert_eq!(init.description, "executed when the script was successfully analyzed.");
        let Detail::Callback { parameter, remarks, examples, see_also } = &init.detail else {
            panic!("not a callback");
        };
        assert!(parameter.is_empty());
        assert!(remarks.is_empty());
        assert!(examples.is_empty());
        assert!(see_also.is_empty());
        assert_eq!(init.category, "on init");
        assert_eq!(init.source, "BUILT-IN");
    }

    #[test]
    fn two_names_share_documentation() {
        let store = scan("1. Callbacks\non rpn/nrpn\n\non rpn/nrpn\nexecuted on rpn or nrpn messages\n");
        assert_eq!(store.occurrences("rpn")[0].description, "executed on rpn or nrpn messages");
        assert_eq!(store.occurrences("nrpn")[0].description, "executed on rpn or nrpn messages");
    }

    #[test]
    fn parameter_is_captured() {
        let store = scan("1. Callbacks\non ui_control\n\non ui_control (<variable>)\nexecuted on change\n");
        let Detail::Callback { parameter, .. } = &store.occurrences("ui_control")[0].detail else {
            panic!("not a callback");
        };
        assert_eq!(parameter, "variable");
    }

    #[test]
    fn category_without_echo_is_documentation() {
        let store = scan(
            "1. Callbacks\non init\n\non init\nruns first\nExamples\non init\n    declare $x\nend on\n\n\n",
        );
        assert_eq!(store.item_count(), 1);
        let Detail::Callback { examples, .. } = &store.occurrences("init")[0].detail else {
            panic!("not a callback");
        };
        assert_eq!(examples, "on init\n    declare $x\nend on");
    }

    #[test]
    fn mismatching_item_is_skipped() {
        let store = scan("1. Callbacks\n[C]on init\nsomething else\n");
        assert_eq!(store.item_count(), 0);
    }

    #[test]
    fn duplicate_callback_keeps_each_description() {
        let store = scan(
            "1. Callbacks\non init\n\non init\nfirst entry\n\n\non init\n\non init\nsecond entry\n\n\n2. Variables\n",
        );
        assert_eq!(store.item_count(), 1);
        assert_eq!(store.duplicate_count(), 1);
        let init = store.occurrences("init");
        assert_eq!(init.len(), 2);
        assert_eq!(init[0].description, "first entry");
        assert_eq!(init[1].description, "second entry");
    }
}
