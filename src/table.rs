//! Reading exported tables back, with patch tables layered on top.
//!
//! A patch table sits beside the generated one (`built_in_commands.csv` is
//! patched by `patch_commands.csv`) and uses the same columns. Rows are
//! merged by name: later rows replace earlier ones in place.

use crate::error::{Result, ScanError};
use crate::model::{DocItem, ItemKind};
use csv::ReaderBuilder;
use indexmap::IndexMap;
use std::fs;
use std::path::{Path, PathBuf};
use tracing::{debug, info};

/// Read every row of a delimited table.
pub fn read_table(path: &Path, kind: ItemKind, delimiter: u8) -> Result<Vec<DocItem>> {
    let mut reader = ReaderBuilder::new()
        .delimiter(delimiter)
        .has_headers(true)
        .from_path(path)?;
    let header: Vec<String> = reader.headers()?.iter().map(str::to_string).collect();
    let mut items = Vec::new();
    for record in reader.records() {
        let row: Vec<String> = record?.iter().map(str::to_string).collect();
        items.push(DocItem::from_row(kind, &header, &row).map_err(|e| match e {
            ScanError::Table { message, .. } => ScanError::Table {
                file: path.display().to_string(),
                message,
            },
            other => other,
        })?);
    }
    debug!("Read {} {} from {}", items.len(), kind.plural(), path.display());
    Ok(items)
}

/// Path of the patch table belonging to `path`.
pub fn patch_path(path: &Path) -> PathBuf {
    let name = path
        .file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_default();
    let patched = if name.contains("built_in") {
        name.replacen("built_in", "patch", 1)
    } else {
        format!("patch_{}", name)
    };
    path.with_file_name(patched)
}

/// Merge rows by name; the last row for a name wins, first position kept.
pub fn merge_rows(rows: impl IntoIterator<Item = DocItem>, into: &mut IndexMap<String, DocItem>) {
    for item in rows {
        into.insert(item.name.clone(), item);
    }
}

/// Load a generated table and apply its patch table when one exists.
pub fn load_patched(
    path: &Path,
    kind: ItemKind,
    delimiter: u8,
    apply_patch: bool,
) -> Result<IndexMap<String, DocItem>> {
    let mut items = IndexMap::new();
    merge_rows(read_table(path, kind, delimiter)?, &mut items);
    let patch = patch_path(path);
    if apply_patch && patch.is_file() {
        let rows = read_table(&patch, kind, delimiter)?;
        info!("Apply {} patched {} from {}", rows.len(), kind.plural(), patch.display());
        merge_rows(rows, &mut items);
    }
    Ok(items)
}

/// Write a rendered table, creating the parent directory as needed.
pub fn write_table(path: &Path, content: &str) -> Result<()> {
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent)?;
    }
    fs::write(path, content)?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::Detail;
    use tempfile::TempDir;

    const HEADER: &str =
        "File;Page No;Line No;Headline;Category;Name;Parameter List;Description;Source\n";

    #[test]
    fn patch_path_naming() {
        assert_eq!(
            patch_path(Path::new("out/built_in_commands.csv")),
            PathBuf::from("out/patch_commands.csv")
        );
        assert_eq!(
            patch_path(Path::new("out/commands.csv")),
            PathBuf::from("out/patch_commands.csv")
        );
    }

    #[test]
    fn reads_rows_by_header() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("built_in_functions.csv");
        fs::write(
            &path,
            format!("{HEADER}manual.txt;3;42;Operators;Bit Operators;sh_left;<x>, <y>;shift;BUILT-IN\n"),
        )
        .unwrap();
        let items = read_table(&path, ItemKind::Function, b';').unwrap();
        assert_eq!(items.len(), 1);
        assert_eq!(items[0].name, "sh_left");
        assert_eq!(items[0].line_no, 42);
        let Detail::Function { parameter_list } = &items[0].detail else {
            panic!("not a function");
        };
        assert_eq!(parameter_list, &vec!["<x>".to_string(), "<y>".to_string()]);
    }

    #[test]
    fn bad_number_names_the_table() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("built_in_functions.csv");
        fs::write(&path, format!("{HEADER}manual.txt;x;1;H;C;abs;;;BUILT-IN\n")).unwrap();
        let err = read_table(&path, ItemKind::Function, b';').unwrap_err();
        assert!(err.to_string().contains("built_in_functions.csv"));
    }

    #[test]
    fn patch_rows_override_and_append() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("built_in_functions.csv");
        fs::write(
            &path,
            format!("{HEADER}m;1;1;H;C;abs;<x>;old;BUILT-IN\nm;1;2;H;C;sh_left;<x>;left;BUILT-IN\n"),
        )
        .unwrap();
        fs::write(
            dir.path().join("patch_functions.csv"),
            format!("{HEADER}m;1;1;H;C;abs;<x>;new;PATCH\nm;1;9;H;C;in_range;<x>;range;PATCH\n"),
        )
        .unwrap();

        let items = load_patched(&path, ItemKind::Function, b';', true).unwrap();
        let names: Vec<&str> = items.keys().map(String::as_str).collect();
        assert_eq!(names, vec!["abs", "sh_left", "in_range"]);
        assert_eq!(items["abs"].description, "new");
        assert_eq!(items["abs"].source, "PATCH");

        let items = load_patched(&path, ItemKind::Function, b';', false).unwrap();
        assert_eq!(items.len(), 2);
        assert_eq!(items["abs"].description, "old");
    }
}
