//! JSON renderer: an array of row objects keyed by column header.

use crate::error::Result;
use crate::model::{csv_header, DocItem, ItemKind};
use crate::render::Renderer;
use serde_json::{Map, Value};

pub struct JsonRenderer;

impl Renderer for JsonRenderer {
    fn render(&self, kind: ItemKind, items: &[DocItem]) -> Result<String> {
        let header = csv_header(kind);
        let rows: Vec<Value> = items
            .iter()
            .map(|item| {
                let row: Map<String, Value> = header
                    .iter()
                    .zip(item.as_csv_list())
                    .map(|(column, value)| (column.to_string(), Value::String(value)))
                    .collect();
                Value::Object(row)
            })
            .collect();
        let mut out = serde_json::to_string_pretty(&rows)?;
        out.push('\n');
        Ok(out)
    }

    fn file_extension(&self) -> &str {
        "json"
    }
}
