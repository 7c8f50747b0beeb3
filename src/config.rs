//! Scanner settings.
//!
//! Settings come from one config file (format chosen by extension) with
//! `KSPDOC_*` environment overrides, e.g. `KSPDOC_GENERAL__MANUAL_VERSION=7.9`.
//! Relative paths are resolved against the directory of the config file.

use crate::model::ItemKind;
use crate::parser::registry::ManualVersion;
use crate::parser::zone::ContentPattern;
use crate::reader::{Remediation, WrappedCell};
use crate::toc::TocPatterns;
use anyhow::{bail, Context, Result};
use regex::Regex;
use serde::Deserialize;
use std::path::{Path, PathBuf};

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct General {
    pub manual_version: String,
    pub txt_file: PathBuf,
    pub csv_dir: PathBuf,
    pub delimiter: String,
    pub phases: Vec<String>,
    pub dump: bool,
    pub verbose: bool,
    pub toc_start: Option<String>,
    pub toc_end: Option<String>,
}

impl Default for General {
    fn default() -> Self {
        Self {
            manual_version: "7.8".to_string(),
            txt_file: PathBuf::new(),
            csv_dir: PathBuf::from("."),
            delimiter: ";".to_string(),
            phases: Vec::new(),
            dump: false,
            verbose: false,
            toc_start: None,
            toc_end: None,
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct ZoneSetting {
    pub start: String,
    pub stop: String,
}

#[derive(Debug, Clone, Deserialize)]
pub struct WrappedCellSetting {
    pub line: usize,
    pub first: String,
    pub second: String,
}

/// Per-kind overrides; everything is optional.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct KindSection {
    pub csv: Option<PathBuf>,
    pub zones: Vec<ZoneSetting>,
    pub skip_lines: Vec<(usize, usize)>,
    pub merge_lines: Vec<usize>,
    pub wrapped_cells: Vec<WrappedCellSetting>,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct Settings {
    pub general: General,
    pub callbacks: KindSection,
    pub commands: KindSection,
    pub functions: KindSection,
    pub widgets: KindSection,
    pub variables: KindSection,
    #[serde(skip)]
    base_dir: PathBuf,
}

/// Chapter headings bounding each kind in the KSP reference manual.
fn default_zones(kind: ItemKind) -> &'static [(&'static str, &'static str)] {
    match kind {
        ItemKind::Callback => &[(r"^(\d+\.\s+)?Callbacks$", r"^(\d+\.\s+)?Variables$")],
        ItemKind::Command => &[(
            r"^(\d+\.\s+)?Arithmetic Commands & Operators$",
            r"^(\d+\.\s+)?Built-in Variables and Constants$",
        )],
        ItemKind::Function => &[(
            r"^(\d+\.\s+)?Arithmetic Commands & Operators$",
            r"^(\d+\.\s+)?Control Statements$",
        )],
        ItemKind::Widget => &[(
            r"^(\d+\.\s+)?User Interface Controls$",
            r"^(\d+\.\s+)?Keyboard Commands$",
        )],
        ItemKind::Variable => &[(
            r"^(\d+\.\s+)?Built-in Variables and Constants$",
            r"^(\d+\.\s+)?Advanced Concepts$",
        )],
    }
}

impl Settings {
    /// Load settings from `path` plus environment overrides.
    pub fn load(path: &Path) -> Result<Self> {
        let cfg = config::Config::builder()
            .add_source(config::File::from(path))
            .add_source(
                config::Environment::with_prefix("KSPDOC")
                    .prefix_separator("_")
                    .separator("__"),
            )
            .build()
            .with_context(|| format!("failed to load configuration {}", path.display()))?;
        let mut settings: Settings = cfg
            .try_deserialize()
            .with_context(|| format!("failed to parse configuration {}", path.display()))?;
        settings.base_dir = path
            .parent()
            .map(Path::to_path_buf)
            .unwrap_or_default();
        Ok(settings)
    }

    fn resolve(&self, path: &Path) -> PathBuf {
        if path.is_absolute() {
            path.to_path_buf()
        } else {
            self.base_dir.join(path)
        }
    }

    fn section(&self, kind: ItemKind) -> &KindSection {
        match kind {
            ItemKind::Callback => &self.callbacks,
            ItemKind::Command => &self.commands,
            ItemKind::Function => &self.functions,
            ItemKind::Widget => &self.widgets,
            ItemKind::Variable => &self.variables,
        }
    }

    pub fn txt_file(&self) -> Result<PathBuf> {
        if self.general.txt_file.as_os_str().is_empty() {
            bail!("general.txt_file is not set");
        }
        Ok(self.resolve(&self.general.txt_file))
    }

    /// Table file of `kind`; defaults to `built_in_<kind>s.csv` in `csv_dir`.
    pub fn csv_file(&self, kind: ItemKind) -> PathBuf {
        let csv_dir = self.resolve(&self.general.csv_dir);
        match &self.section(kind).csv {
            Some(file) if file.is_absolute() => file.clone(),
            Some(file) => csv_dir.join(file),
            None => csv_dir.join(format!("built_in_{}.csv", kind.plural())),
        }
    }

    pub fn zones(&self, kind: ItemKind) -> Result<Vec<ContentPattern>> {
        let configured = &self.section(kind).zones;
        let zones: crate::error::Result<Vec<ContentPattern>> = if configured.is_empty() {
            default_zones(kind)
                .iter()
                .map(|(start, stop)| ContentPattern::new(start, stop))
                .collect()
        } else {
            configured
                .iter()
                .map(|zone| ContentPattern::new(&zone.start, &zone.stop))
                .collect()
        };
        zones.with_context(|| format!("invalid {} zone", kind))
    }

    pub fn remediation(&self, kind: ItemKind) -> Remediation {
        let section = self.section(kind);
        let mut remediation = Remediation {
            skip_lines: section.skip_lines.clone(),
            merge_lines: section.merge_lines.iter().copied().collect(),
            ..Remediation::default()
        };
        for cell in &section.wrapped_cells {
            remediation.wrapped_cells.insert(
                cell.line,
                WrappedCell {
                    first: cell.first.clone(),
                    second: cell.second.clone(),
                },
            );
        }
        remediation
    }

    /// Active phases in configured order; all kinds when none are listed.
    pub fn phases(&self) -> Result<Vec<ItemKind>> {
        if self.general.phases.is_empty() {
            return Ok(ItemKind::ALL.to_vec());
        }
        let mut phases = Vec::new();
        for name in &self.general.phases {
            let kind: ItemKind = name
                .parse()
                .context("invalid phase in general.phases")?;
            if !phases.contains(&kind) {
                phases.push(kind);
            }
        }
        Ok(phases)
    }

    pub fn delimiter(&self) -> Result<u8> {
        match self.general.delimiter.as_bytes() {
            [b] if b.is_ascii() => Ok(*b),
            _ => bail!(
                "delimiter must be a single ASCII character, got {:?}",
                self.general.delimiter
            ),
        }
    }

    pub fn version(&self) -> Result<ManualVersion> {
        let version = self.general.manual_version.replace('_', ".");
        version
            .parse::<ManualVersion>()
            .context("invalid general.manual_version")
    }

    pub fn toc_patterns(&self) -> Result<TocPatterns> {
        let mut patterns = TocPatterns::default();
        if let Some(start) = &self.general.toc_start {
            patterns.start = Regex::new(start).context("invalid general.toc_start")?;
        }
        if let Some(end) = &self.general.toc_end {
            patterns.end = Regex::new(end).context("invalid general.toc_end")?;
        }
        Ok(patterns)
    }
}
