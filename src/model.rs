//! Data model for scanned documentation items.
//!
//! Every kind shares the origin and identity fields of [`DocItem`]; the
//! kind-specific fields live in [`Detail`]. Column order of the delimited
//! tables is fixed per kind by [`csv_header`].

use crate::error::{Result, ScanError};
use regex::Regex;
use std::fmt;
use std::str::FromStr;
use std::sync::LazyLock;

pub const BUILT_IN: &str = "BUILT-IN";

static RE_SPACES: LazyLock<Regex> = LazyLock::new(|| Regex::new(r" {2,}").unwrap());

static RE_BULLET: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"(?m)^•[ \t]+").unwrap());

// -- Kinds and states ---------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum ItemKind {
    Callback,
    Command,
    Function,
    Widget,
    Variable,
}

impl ItemKind {
    /// Default scan order.
    pub const ALL: [ItemKind; 5] = [
        ItemKind::Callback,
        ItemKind::Widget,
        ItemKind::Command,
        ItemKind::Function,
        ItemKind::Variable,
    ];

    pub fn name(self) -> &'static str {
        match self {
            ItemKind::Callback => "callback",
            ItemKind::Command => "command",
            ItemKind::Function => "function",
            ItemKind::Widget => "widget",
            ItemKind::Variable => "variable",
        }
    }

    pub fn plural(self) -> &'static str {
        match self {
            ItemKind::Callback => "callbacks",
            ItemKind::Command => "commands",
            ItemKind::Function => "functions",
            ItemKind::Widget => "widgets",
            ItemKind::Variable => "variables",
        }
    }
}

impl fmt::Display for ItemKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for ItemKind {
    type Err = ScanError;

    /// Accepts singular or plural names in any case.
    fn from_str(s: &str) -> Result<Self> {
        let lower = s.trim().to_ascii_lowercase();
        ItemKind::ALL
            .into_iter()
            .find(|k| lower == k.name() || lower == k.plural())
            .ok_or_else(|| ScanError::UnknownKind(s.to_string()))
    }
}

/// Which part of an item the scanner is currently filling.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DocState {
    None,
    Category,
    Description,
    Remarks,
    Examples,
    SeeAlso,
}

// -- Items --------------------------------------------------------------------

/// Where and under which headings an item was found.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Origin {
    pub file: String,
    pub page_no: usize,
    pub line_no: usize,
    pub headline: String,
    pub category: String,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Detail {
    Callback {
        parameter: String,
        remarks: String,
        examples: String,
        see_also: String,
    },
    Command {
        parameter_list: Vec<String>,
        remarks: String,
        examples: String,
        see_also: String,
    },
    Function {
        parameter_list: Vec<String>,
    },
    Widget {
        variable_name: String,
        index_name: String,
        parameter_list: Vec<String>,
        remarks: String,
        examples: String,
        see_also: String,
    },
    Variable {
        block_headline: String,
        item_list_headline: String,
        range_start: usize,
        range_end: usize,
        parameter: String,
        comment: String,
        see_also: String,
    },
}

impl Detail {
    pub fn empty(kind: ItemKind) -> Self {
        match kind {
            ItemKind::Callback => Detail::Callback {
                parameter: String::new(),
                remarks: String::new(),
                examples: String::new(),
                see_also: String::new(),
            },
            ItemKind::Command => Detail::Command {
                parameter_list: Vec::new(),
                remarks: String::new(),
                examples: String::new(),
                see_also: String::new(),
            },
            ItemKind::Function => Detail::Function {
                parameter_list: Vec::new(),
            },
            ItemKind::Widget => Detail::Widget {
                variable_name: String::new(),
                index_name: String::new(),
                parameter_list: Vec::new(),
                remarks: String::new(),
                examples: String::new(),
                see_also: String::new(),
            },
            ItemKind::Variable => Detail::Variable {
                block_headline: String::new(),
                item_list_headline: String::new(),
                range_start: 0,
                range_end: 0,
                parameter: String::new(),
                comment: String::new(),
                see_also: String::new(),
            },
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DocItem {
    pub file: String,
    pub page_no: usize,
    pub line_no: usize,
    pub headline: String,
    pub category: String,
    pub name: String,
    pub description: String,
    pub source: String,
    /// Every line that contributed to this item, for dumps.
    pub parsed_text: String,
    pub detail: Detail,
}

impl DocItem {
    pub fn new(kind: ItemKind, name: &str, origin: Origin) -> Self {
        Self {
            file: origin.file,
            page_no: origin.page_no,
            line_no: origin.line_no,
            headline: origin.headline,
            category: origin.category,
            name: name.to_string(),
            description: String::new(),
            source: BUILT_IN.to_string(),
            parsed_text: String::new(),
            detail: Detail::empty(kind),
        }
    }

    pub fn kind(&self) -> ItemKind {
        match self.detail {
            Detail::Callback { .. } => ItemKind::Callback,
            Detail::Command { .. } => ItemKind::Command,
            Detail::Function { .. } => ItemKind::Function,
            Detail::Widget { .. } => ItemKind::Widget,
            Detail::Variable { .. } => ItemKind::Variable,
        }
    }

    /// Field that collects documentation lines in `state`, if this kind has one.
    pub fn text_mut(&mut self, state: DocState) -> Option<&mut String> {
        if state == DocState::Description {
            return Some(&mut self.description);
        }
        match (state, &mut self.detail) {
            (
                DocState::Remarks,
                Detail::Callback { remarks, .. }
                | Detail::Command { remarks, .. }
                | Detail::Widget { remarks, .. },
            ) => Some(remarks),
            (
                DocState::Examples,
                Detail::Callback { examples, .. }
                | Detail::Command { examples, .. }
                | Detail::Widget { examples, .. },
            ) => Some(examples),
            (
                DocState::SeeAlso,
                Detail::Callback { see_also, .. }
                | Detail::Command { see_also, .. }
                | Detail::Widget { see_also, .. }
                | Detail::Variable { see_also, .. },
            ) => Some(see_also),
            _ => None,
        }
    }

    pub fn parameter_list(&self) -> &[String] {
        match &self.detail {
            Detail::Command { parameter_list, .. }
            | Detail::Function { parameter_list }
            | Detail::Widget { parameter_list, .. } => parameter_list,
            _ => &[],
        }
    }

    /// Strip and normalise all text fields. Applying it twice changes nothing.
    pub fn fix_documentation(&mut self) {
        let tighten = self.kind() == ItemKind::Variable;
        trim_in_place(&mut self.headline);
        trim_in_place(&mut self.category);
        trim_in_place(&mut self.name);
        self.description = fix_text(&self.description, tighten);
        match &mut self.detail {
            Detail::Callback {
                parameter,
                remarks,
                examples,
                see_also,
            } => {
                trim_in_place(parameter);
                *remarks = fix_text(remarks, false);
                trim_in_place(examples);
                trim_in_place(see_also);
            }
            Detail::Command {
                parameter_list,
                remarks,
                examples,
                see_also,
            } => {
                parameter_list.iter_mut().for_each(trim_in_place);
                *remarks = fix_text(remarks, false);
                trim_in_place(examples);
                trim_in_place(see_also);
            }
            Detail::Function { parameter_list } => {
                parameter_list.iter_mut().for_each(trim_in_place);
            }
            Detail::Widget {
                variable_name,
                index_name,
                parameter_list,
                remarks,
                examples,
                see_also,
            } => {
                trim_in_place(variable_name);
                trim_in_place(index_name);
                parameter_list.iter_mut().for_each(trim_in_place);
                *remarks = fix_text(remarks, false);
                trim_in_place(examples);
                trim_in_place(see_also);
            }
            Detail::Variable {
                block_headline,
                item_list_headline,
                parameter,
                comment,
                see_also,
                ..
            } => {
                trim_in_place(block_headline);
                trim_in_place(item_list_headline);
                trim_in_place(parameter);
                trim_in_place(comment);
                trim_in_place(see_also);
            }
        }
    }

    /// Values in the column order of [`csv_header`].
    pub fn as_csv_list(&self) -> Vec<String> {
        let mut row = vec![
            self.file.clone(),
            self.page_no.to_string(),
            self.line_no.to_string(),
            self.headline.clone(),
            self.category.clone(),
        ];
        match &self.detail {
            Detail::Callback {
                parameter,
                remarks,
                examples,
                see_also,
            } => row.extend([
                self.name.clone(),
                parameter.clone(),
                self.description.clone(),
                remarks.clone(),
                examples.clone(),
                see_also.clone(),
            ]),
            Detail::Command {
                parameter_list,
                remarks,
                examples,
                see_also,
            } => row.extend([
                self.name.clone(),
                parameter_list.join(","),
                self.description.clone(),
                remarks.clone(),
                examples.clone(),
                see_also.clone(),
            ]),
            Detail::Function { parameter_list } => row.extend([
                self.name.clone(),
                parameter_list.join(","),
                self.description.clone(),
            ]),
            Detail::Widget {
                variable_name,
                index_name,
                parameter_list,
                remarks,
                examples,
                see_also,
            } => row.extend([
                self.name.clone(),
                variable_name.clone(),
                index_name.clone(),
                parameter_list.join(","),
                self.description.clone(),
                remarks.clone(),
                examples.clone(),
                see_also.clone(),
            ]),
            Detail::Variable {
                block_headline,
                item_list_headline,
                parameter,
                comment,
                see_also,
                ..
            } => row.extend([
                block_headline.clone(),
                item_list_headline.clone(),
                self.name.clone(),
                parameter.clone(),
                comment.clone(),
                self.description.clone(),
                see_also.clone(),
            ]),
        }
        row.push(self.source.clone());
        row
    }

    /// Rebuild an item from a table row, matching columns by header name.
    pub fn from_row(kind: ItemKind, header: &[String], row: &[String]) -> Result<Self> {
        let mut item = DocItem::new(kind, "", Origin::default());
        item.source.clear();
        for (column, value) in header.iter().zip(row) {
            item.set_column(column.trim(), value)?;
        }
        if item.name.is_empty() {
            return Err(ScanError::Table {
                file: item.file.clone(),
                message: format!("{} row without a name", kind),
            });
        }
        Ok(item)
    }

    fn set_column(&mut self, column: &str, value: &str) -> Result<()> {
        let kind = self.kind();
        let owned = value.to_string();
        match column {
            "File" => self.file = owned,
            "Page No" => self.page_no = parse_number(&self.file, column, value)?,
            "Line No" => self.line_no = parse_number(&self.file, column, value)?,
            "Headline" => self.headline = owned,
            "Category" => self.category = owned,
            "Name" => self.name = owned,
            "Description" => self.description = owned,
            "Source" => self.source = owned,
            _ => {
                let field = match (&mut self.detail, column) {
                    (Detail::Command { parameter_list, .. }, "Parameter List")
                    | (Detail::Function { parameter_list }, "Parameter List")
                    | (Detail::Widget { parameter_list, .. }, "Parameter List") => {
                        *parameter_list = split_list(value);
                        return Ok(());
                    }
                    (Detail::Callback { parameter, .. }, "Parameter")
                    | (Detail::Variable { parameter, .. }, "Parameter") => Some(parameter),
                    (Detail::Callback { remarks, .. }, "Remarks")
                    | (Detail::Command { remarks, .. }, "Remarks")
                    | (Detail::Widget { remarks, .. }, "Remarks") => Some(remarks),
                    (Detail::Callback { examples, .. }, "Examples")
                    | (Detail::Command { examples, .. }, "Examples")
                    | (Detail::Widget { examples, .. }, "Examples") => Some(examples),
                    (Detail::Callback { see_also, .. }, "See Also")
                    | (Detail::Command { see_also, .. }, "See Also")
                    | (Detail::Widget { see_also, .. }, "See Also")
                    | (Detail::Variable { see_also, .. }, "See Also") => Some(see_also),
                    (Detail::Widget { variable_name, .. }, "Variable Name") => Some(variable_name),
                    (Detail::Widget { index_name, .. }, "Index Name") => Some(index_name),
                    (Detail::Variable { block_headline, .. }, "Block Headline") => {
                        Some(block_headline)
                    }
                    (Detail::Variable { item_list_headline, .. }, "Item List Headline") => {
                        Some(item_list_headline)
                    }
                    (Detail::Variable { comment, .. }, "Comment") => Some(comment),
                    _ => None,
                };
                match field {
                    Some(field) => *field = owned,
                    None => {
                        return Err(ScanError::Table {
                            file: self.file.clone(),
                            message: format!("unknown {} column {:?}", kind, column),
                        })
                    }
                }
            }
        }
        Ok(())
    }

    /// Human-readable dump, one log line per entry.
    pub fn dump_lines(&self, with_text: bool) -> Vec<String> {
        let mut out = vec![format!(
            "Page {}, File \"{}\", line {}",
            self.page_no, self.file, self.line_no
        )];
        if with_text {
            out.push(format!("{} Parsed Text Start {}", "*".repeat(10), "*".repeat(10)));
            out.extend(self.parsed_text.lines().map(str::to_string));
            out.push(format!("{} Parsed Text End {}", "*".repeat(10), "*".repeat(10)));
        }
        let mut fields: Vec<(&str, &str)> = vec![
            ("Headline", self.headline.as_str()),
            ("Category", self.category.as_str()),
            ("Source", self.source.as_str()),
            ("Name", self.name.as_str()),
        ];
        let mut sections: Vec<(&str, &str)> = vec![("Description", self.description.as_str())];
        match &self.detail {
            Detail::Callback {
                parameter,
                remarks,
                examples,
                see_also,
            } => {
                fields.push(("Parameter", parameter.as_str()));
                sections.extend([
                    ("Remarks", remarks.as_str()),
                    ("Examples", examples.as_str()),
                    ("See Also", see_also.as_str()),
                ]);
            }
            Detail::Command {
                remarks,
                examples,
                see_also,
                ..
            } => {
                sections.extend([
                    ("Remarks", remarks.as_str()),
                    ("Examples", examples.as_str()),
                    ("See Also", see_also.as_str()),
                ]);
            }
            Detail::Function { .. } => {}
            Detail::Widget {
                variable_name,
                index_name,
                remarks,
                examples,
                see_also,
                ..
            } => {
                fields.extend([
                    ("Variable Name", variable_name.as_str()),
                    ("Index Name", index_name.as_str()),
                ]);
                sections.extend([
                    ("Remarks", remarks.as_str()),
                    ("Examples", examples.as_str()),
                    ("See Also", see_also.as_str()),
                ]);
            }
            Detail::Variable {
                block_headline,
                item_list_headline,
                parameter,
                comment,
                see_also,
                ..
            } => {
                fields.extend([
                    ("Block Headline", block_headline.as_str()),
                    ("Item List Headline", item_list_headline.as_str()),
                    ("Parameter", parameter.as_str()),
                    ("Comment", comment.as_str()),
                ]);
                sections.push(("See Also", see_also.as_str()));
            }
        }
        for (title, value) in fields {
            if !value.is_empty() {
                out.push(format!("{}: {}", title, value));
            }
        }
        if !self.parameter_list().is_empty() {
            out.push(format!("Parameters: {}", self.parameter_list().join(",")));
        }
        for (title, value) in sections {
            if !value.is_empty() {
                out.push(format!("{} {} {}", ">".repeat(10), title, "<".repeat(10)));
                out.extend(value.lines().map(str::to_string));
            }
        }
        out
    }
}

/// Column names of the table for `kind`, in export order.
pub fn csv_header(kind: ItemKind) -> &'static [&'static str] {
    match kind {
        ItemKind::Callback => &[
            "File", "Page No", "Line No", "Headline", "Category", "Name", "Parameter",
            "Description", "Remarks", "Examples", "See Also", "Source",
        ],
        ItemKind::Command => &[
            "File", "Page No", "Line No", "Headline", "Category", "Name", "Parameter List",
            "Description", "Remarks", "Examples", "See Also", "Source",
        ],
        ItemKind::Function => &[
            "File", "Page No", "Line No", "Headline", "Category", "Name", "Parameter List",
            "Description", "Source",
        ],
        ItemKind::Widget => &[
            "File", "Page No", "Line No", "Headline", "Category", "Name", "Variable Name",
            "Index Name", "Parameter List", "Description", "Remarks", "Examples", "See Also",
            "Source",
        ],
        ItemKind::Variable => &[
            "File", "Page No", "Line No", "Headline", "Category", "Block Headline",
            "Item List Headline", "Name", "Parameter", "Comment", "Description", "See Also",
            "Source",
        ],
    }
}

// -- Text cleanup -------------------------------------------------------------

fn trim_in_place(text: &mut String) {
    let trimmed = text.trim();
    if trimmed.len() != text.len() {
        *text = trimmed.to_string();
    }
}

fn parse_number(file: &str, column: &str, value: &str) -> Result<usize> {
    if value.is_empty() {
        return Ok(0);
    }
    value.parse().map_err(|_| ScanError::Table {
        file: file.to_string(),
        message: format!("column {:?}: {:?} is not a number", column, value),
    })
}

fn split_list(value: &str) -> Vec<String> {
    value
        .split(',')
        .map(str::trim)
        .filter(|p| !p.is_empty())
        .map(str::to_string)
        .collect()
}

/// Collapse runs of spaces and turn `•` bullets into `- `.
pub fn fix_text(text: &str, tighten: bool) -> String {
    let text = RE_SPACES.replace_all(text.trim(), " ");
    let mut text = normalize_bullets(&text);
    if tighten {
        text = text.replace(" .", ".").replace("( ", "(").replace(" )", ")");
    }
    text.trim().to_string()
}

pub fn normalize_bullets(text: &str) -> String {
    RE_BULLET.replace_all(text, "- ").into_owned()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn origin() -> Origin {
        Origin {
            file: "manual.txt".into(),
            page_no: 12,
            line_no: 340,
            headline: "1. Callbacks".into(),
            category: "on init".into(),
        }
    }

    #[test]
    fn kind_from_str() {
        assert_eq!("callbacks".parse::<ItemKind>().unwrap(), ItemKind::Callback);
        assert_eq!("Widget".parse::<ItemKind>().unwrap(), ItemKind::Widget);
        assert!(matches!(
            "types".parse::<ItemKind>(),
            Err(ScanError::UnknownKind(_))
        ));
    }

    #[test]
    fn bullets_only_at_line_start() {
        assert_eq!(normalize_bullets("•  one\n• two\nno • bullet"), "- one\n- two\nno • bullet");
    }

    #[test]
    fn fix_documentation_is_idempotent() {
        let mut item = DocItem::new(ItemKind::Callback, "init", origin());
        item.description = "\n\n  executed  when   loaded\n•   first\n\n".into();
        if let Some(remarks) = item.text_mut(DocState::Remarks) {
            remarks.push_str("•  only  once\n");
        }
        if let Some(examples) = item.text_mut(DocState::Examples) {
            examples.push_str("\non init\n    message(\"\")\nend on\n\n");
        }
        item.fix_documentation();
        assert_eq!(item.description, "executed when loaded\n- first");
        let Detail::Callback { remarks, examples, .. } = &item.detail else {
            panic!("not a callback");
        };
        assert_eq!(remarks, "- only once");
        assert_eq!(examples, "on init\n    message(\"\")\nend on");
        let once = item.clone();
        item.fix_documentation();
        assert_eq!(item, once);
    }

    #[test]
    fn variable_text_is_tightened() {
        let mut item = DocItem::new(ItemKind::Variable, "$NI_BUS_OFFSET", origin());
        item.description = "bus offset ( see  below ) .".into();
        item.fix_documentation();
        assert_eq!(item.description, "bus offset (see below).");
        let once = item.clone();
        item.fix_documentation();
        assert_eq!(item, once);
    }

    #[test]
    fn text_fields_by_state() {
        let mut function = DocItem::new(ItemKind::Function, "abs", origin());
        assert!(function.text_mut(DocState::Description).is_some());
        assert!(function.text_mut(DocState::Remarks).is_none());
        let mut variable = DocItem::new(ItemKind::Variable, "$X", origin());
        assert!(variable.text_mut(DocState::SeeAlso).is_some());
        assert!(variable.text_mut(DocState::Examples).is_none());
        assert!(variable.text_mut(DocState::Category).is_none());
    }

    #[test]
    fn csv_columns_follow_header() {
        for kind in ItemKind::ALL {
            let item = DocItem::new(kind, "x", origin());
            assert_eq!(item.as_csv_list().len(), csv_header(kind).len(), "{kind}");
        }
        let mut widget = DocItem::new(ItemKind::Widget, "ui_table", origin());
        widget.detail = Detail::Widget {
            variable_name: "%<array-name>".into(),
            index_name: "num-elements".into(),
            parameter_list: vec!["grid-width".into(), "grid-height".into()],
            remarks: String::new(),
            examples: String::new(),
            see_also: String::new(),
        };
        let row = widget.as_csv_list();
        assert_eq!(row[5], "ui_table");
        assert_eq!(row[6], "%<array-name>");
        assert_eq!(row[8], "grid-width,grid-height");
        assert_eq!(row.last().unwrap(), BUILT_IN);
    }

    #[test]
    fn row_rebuilds_item() {
        let mut item = DocItem::new(ItemKind::Command, "play_note", origin());
        item.description = "plays a note".into();
        if let Detail::Command { parameter_list, .. } = &mut item.detail {
            *parameter_list = vec!["note-number".into(), "velocity".into()];
        }
        let header: Vec<String> = csv_header(ItemKind::Command).iter().map(|h| h.to_string()).collect();
        let rebuilt = DocItem::from_row(ItemKind::Command, &header, &item.as_csv_list()).unwrap();
        assert_eq!(rebuilt, item);
    }

    #[test]
    fn row_with_unknown_column_fails() {
        let header = vec!["Name".to_string(), "Colour".to_string()];
        let row = vec!["abs".to_string(), "red".to_string()];
        assert!(DocItem::from_row(ItemKind::Function, &header, &row).is_err());
    }

    #[test]
    fn dump_skips_empty_fields() {
        let mut item = DocItem::new(ItemKind::Callback, "init", origin());
        item.description = "executed once".into();
        item.parsed_text = "on init\nexecuted once\n".into();
        let lines = item.dump_lines(true);
        assert_eq!(lines[0], "Page 12, File \"manual.txt\", line 340");
        assert!(lines.contains(&"Name: init".to_string()));
        assert!(!lines.iter().any(|l| l.starts_with("Parameter:")));
        assert!(lines.contains(&"executed once".to_string()));
    }
}
