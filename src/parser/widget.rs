//! Widget rules: `declare <ui_kind> $<variable>[<index>] (<params>)`.

use crate::error::Result;
use crate::model::{Detail, DocState, ItemKind};
use crate::parser::command::split_parameters;
use crate::parser::scanner::{ItemRules, ScanContext};
use regex::Regex;
use std::sync::LazyLock;

static RE_WIDGET: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^declare\s+([a-z_]+)\s+([$%]<[a-z-]+>)(?:\[([^\]]+)\])?(?:\s+\((.*)\))?$").unwrap()
});

#[derive(Debug, Default)]
pub struct WidgetRules;

impl ItemRules for WidgetRules {
    fn kind(&self) -> ItemKind {
        ItemKind::Widget
    }

    fn check_item(&mut self, ctx: &mut ScanContext<'_>, line: &str) -> Result<Option<DocState>> {
        let Some(caps) = RE_WIDGET.captures(line) else {
            return Ok(None);
        };
        let mut item = ctx.new_item(ItemKind::Widget, &caps[1]);
        if let Detail::Widget {
            variable_name,
            index_name,
            parameter_list,
            ..
        } = &mut item.detail
        {
            *variable_name = caps[2].to_string();
            *index_name = caps.get(3).map_or("", |m| m.as_str()).to_string();
            *parameter_list = split_parameters(caps.get(4).map_or("", |m| m.as_str()));
        }
        ctx.store.clear_current();
        ctx.add_item(item);
        Ok(Some(DocState::Description))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::parser::scanner::tests::scan_text;
    use crate::parser::store::ItemStore;

    const TOC: &str = "\
Table of Contents
1. User Interface Controls ....... 30
ui_button ........................ 30
ui_table ......................... 32
2. Keyboard Commands ............. 40
Disclaimer
";

    fn scan(body: &str) -> ItemStore {
        scan_text(
            Box::new(WidgetRules),
            (
                r"^(\d+\.\s+)?User Interface Controls$",
                r"^(\d+\.\s+)?Keyboard Commands$",
            ),
            &format!("{TOC}{body}"),
        )
    }

    #[test]
    fn widget_with_index_and_parameters() {
        let store = scan(
            "1. User Interface Controls\nui_table\ndeclare ui_table %<array-name>[num-elements] (<grid-width>, <grid-height>, <range>)\n\
             create a user interface table\nExamples\ndeclare ui_table %table[32] (2, 2, 100)\n\n\n2. Keyboard Commands\n",
        );
        let table = store.occurrences("ui_table")[0];
        let Detail::Widget {
            variable_name,
            index_name,
            parameter_list,
            examples,
            ..
        } = &table.detail
        else {
            panic!("not a widget");
        };
        assert_eq!(variable_name, "%<array-name>");
        assert_eq!(index_name, "num-elements");
        assert_eq!(parameter_list, &["grid-width", "grid-height", "range"]);
        assert_eq!(table.description, "create a user interface table");
        assert_eq!(examples, "declare ui_table %table[32] (2, 2, 100)");
        assert_eq!(table.category, "ui_table");
    }

    #[test]
    fn plain_widget() {
        let store = scan("1. User Interface Controls\nui_button\ndeclare ui_button $<variable-name>\ncreate a button\n");
        let button = store.occurrences("ui_button")[0];
        let Detail::Widget { variable_name, index_name, parameter_list, .. } = &button.detail else {
            panic!("not a widget");
        };
        assert_eq!(variable_name, "$<variable-name>");
        assert!(index_name.is_empty());
        assert!(parameter_list.is_empty());
        assert_eq!(button.description, "create a button");
    }

    #[test]
    fn duplicate_widget_keeps_each_description() {
        let store = scan(
            "1. User Interface Controls\nui_button\ndeclare ui_button $<variable-name>\ncreate a button\n\n\n\
             ui_table\ndeclare ui_button $<variable-name>\ncreate another button\n\n\n2. Keyboard Commands\n",
        );
        assert_eq!(store.item_count(), 1);
        assert_eq!(store.duplicate_count(), 1);
        let buttons = store.occurrences("ui_button");
        assert_eq!(buttons.len(), 2);
        assert_eq!(buttons[0].description, "create a button");
        assert_eq!(buttons[0].category, "ui_button");
        assert_eq!(buttons[1].description, "create another button");
        assert_eq!(buttons[1].category, "ui_table");
    }
}
