//! Function rules: `<name>(x[, y]): <description>`.

use crate::error::Result;
use crate::model::{Detail, DocState, ItemKind};
use crate::parser::scanner::{ItemRules, ScanContext};
use regex::Regex;
use std::sync::LazyLock;

static RE_FUNCTION: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^([a-z_]+)\((x(?:, y)?|<expression>, <shift-bits>)\)(?::\s+(.*))?$").unwrap()
});

#[derive(Debug, Default)]
pub struct FunctionRules;

impl ItemRules for FunctionRules {
    fn kind(&self) -> ItemKind {
        ItemKind::Function
    }

    fn check_item(&mut self, ctx: &mut ScanContext<'_>, line: &str) -> Result<Option<DocState>> {
        let Some(caps) = RE_FUNCTION.captures(line) else {
            return Ok(None);
        };
        let mut item = ctx.new_item(ItemKind::Function, &caps[1]);
        if let Detail::Function { parameter_list } = &mut item.detail {
            *parameter_list = caps[2].split(',').map(|p| p.trim().to_string()).collect();
        }
        // The description follows the colon on the defining line.
        if let Some(description) = caps.get(3) {
            item.description = format!("{}\n", description.as_str());
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
1. Arithmetic Commands & Operators ... 10
Basic Operators ...................... 10
Bit Operators ........................ 11
2. Control Statements ................ 14
Disclaimer
";

    fn scan(body: &str) -> ItemStore {
        scan_text(
            Box::new(FunctionRules),
            (
                r"^(\d+\.\s+)?Arithmetic Commands & Operators$",
                r"^(\d+\.\s+)?Control Statements$",
            ),
            &format!("{TOC}{body}"),
        )
    }

    #[test]
    fn inline_descriptions() {
        let store = scan(
            "1. Arithmetic Commands & Operators\nBasic Operators\nabs(x): absolute value\n\
             max(x, y): larger of the two values\nBit Operators\n\
             sh_left(<expression>, <shift-bits>): shifts the bits to the left\n2. Control Statements\n",
        );
        assert_eq!(store.item_count(), 3);
        let abs = store.occurrences("abs")[0];
        assert_eq!(abs.description, "absolute value");
        assert_eq!(abs.category, "Basic Operators");
        assert_eq!(abs.parameter_list(), ["x"]);
        assert_eq!(store.occurrences("max")[0].parameter_list(), ["x", "y"]);
        let shift = store.occurrences("sh_left")[0];
        assert_eq!(shift.parameter_list(), ["<expression>", "<shift-bits>"]);
        assert_eq!(shift.category, "Bit Operators");
    }

    #[test]
    fn continuation_lines_extend_description() {
        let store = scan(
            "1. Arithmetic Commands & Operators\nBasic Operators\nint_to_real(x): converts an integer\nvalue to a real number\n",
        );
        assert_eq!(
            store.occurrences("int_to_real")[0].description,
            "converts an integer\nvalue to a real number"
        );
    }

    #[test]
    fn commands_are_not_functions() {
        let store = scan("1. Arithmetic Commands & Operators\nBasic Operators\nrandom(<min>, <max>)\n");
        assert_eq!(store.item_count(), 0);
    }

    #[test]
    fn duplicate_function_keeps_each_description() {
        let store = scan(
            "1. Arithmetic Commands & Operators\nBasic Operators\nabs(x): absolute value\n\
             max(x, y): larger of the two values\nBit Operators\nabs(x): absolute value again\n2. Control Statements\n",
        );
        assert_eq!(store.item_count(), 2);
        assert_eq!(store.duplicate_count(), 1);
        let abs = store.occurrences("abs");
        assert_eq!(abs.len(), 2);
        assert_eq!(abs[0].description, "absolute value");
        assert_eq!(abs[0].category, "Basic Operators");
        assert_eq!(abs[1].description, "absolute value again");
        assert_eq!(abs[1].category, "Bit Operators");
    }
}
