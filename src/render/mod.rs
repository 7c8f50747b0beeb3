//! Table export: trait-based format dispatch.

pub mod delimited;
pub mod json;

use crate::error::Result;
use crate::model::{DocItem, ItemKind};
use anyhow::anyhow;

/// Renders the items of one kind into a table document.
pub trait Renderer {
    fn render(&self, kind: ItemKind, items: &[DocItem]) -> Result<String>;
    fn file_extension(&self) -> &str;
}

/// Create a renderer for the given format name.
pub fn create_renderer(format: &str, delimiter: u8) -> anyhow::Result<Box<dyn Renderer>> {
    match format {
        "delimited" | "csv" => Ok(Box::new(delimited::DelimitedRenderer { delimiter })),
        "json" => Ok(Box::new(json::JsonRenderer)),
        _ => Err(anyhow!(
            "unknown format: {}. Use delimited or json",
            format
        )),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn known_formats() {
        assert_eq!(create_renderer("csv", b';').unwrap().file_extension(), "csv");
        assert_eq!(create_renderer("delimited", b';').unwrap().file_extension(), "csv");
        assert_eq!(create_renderer("json", b';').unwrap().file_extension(), "json");
    }

    #[test]
    fn unknown_format() {
        let err = create_renderer("yaml", b';').err().unwrap();
        assert!(err.to_string().contains("unknown format: yaml"));
    }
}
