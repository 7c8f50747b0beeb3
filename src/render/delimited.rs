//! Delimited table renderer.
//!
//! One header row from the kind's column contract, then one row per item.
//! Fields are quoted only when they contain the delimiter, a quote or a
//! line break.

use crate::error::{Result, ScanError};
use crate::model::{csv_header, DocItem, ItemKind};
use crate::render::Renderer;
use csv::{QuoteStyle, WriterBuilder};

pub struct DelimitedRenderer {
    pub delimiter: u8,
}

impl Renderer for DelimitedRenderer {
    fn render(&self, kind: ItemKind, items: &[DocItem]) -> Result<String> {
        let mut writer = WriterBuilder::new()
            .delimiter(self.delimiter)
            .quote_style(QuoteStyle::Necessary)
            .from_writer(Vec::new());
        writer.write_record(csv_header(kind))?;
        for item in items {
            writer.write_record(item.as_csv_list())?;
        }
        let bytes = writer
            .into_inner()
            .map_err(|e| ScanError::Io(e.into_error()))?;
        String::from_utf8(bytes).map_err(|e| ScanError::Table {
            file: kind.plural().to_string(),
            message: e.to_string(),
        })
    }

    fn file_extension(&self) -> &str {
        "csv"
    }
}
