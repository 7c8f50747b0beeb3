//! Version registry for item rules.
//!
//! Each manual version may ship its own rules and line remediation tables
//! per item kind. Lookup falls back from the exact version to the latest
//! registered minor of the same major version, then to the base rules.

use crate::error::{Result, ScanError};
use crate::model::ItemKind;
use crate::parser::callback::CallbackRules;
use crate::parser::command::CommandRules;
use crate::parser::function::FunctionRules;
use crate::parser::scanner::ItemRules;
use crate::parser::variable::VariableRules;
use crate::parser::widget::WidgetRules;
use crate::reader::{Remediation, WrappedCell};
use std::collections::BTreeMap;
use std::fmt;
use std::str::FromStr;
use tracing::{info, warn};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ManualVersion {
    pub major: u32,
    pub minor: u32,
}

impl ManualVersion {
    pub const fn new(major: u32, minor: u32) -> Self {
        Self { major, minor }
    }
}

impl FromStr for ManualVersion {
    type Err = ScanError;

    fn from_str(s: &str) -> Result<Self> {
        let invalid = || ScanError::Version(s.to_string());
        let mut parts = s.trim().splitn(2, '.');
        let major = parts
            .next()
            .and_then(|p| p.parse().ok())
            .ok_or_else(invalid)?;
        let minor = match parts.next() {
            Some(p) => p.parse().map_err(|_| invalid())?,
            None => 0,
        };
        Ok(Self { major, minor })
    }
}

impl fmt::Display for ManualVersion {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}.{}", self.major, self.minor)
    }
}

/// Rules and remediation tables for one kind of one manual version.
pub struct KindRules {
    pub rules: Box<dyn ItemRules>,
    pub remediation: Remediation,
}

pub type Factory = fn() -> KindRules;

#[derive(Default)]
pub struct Registry {
    entries: BTreeMap<(ItemKind, ManualVersion), Factory>,
}

impl Registry {
    /// Registry with the versions known to this build.
    pub fn builtin() -> Self {
        let mut registry = Self::default();
        let v7_8 = ManualVersion::new(7, 8);
        registry.register(ItemKind::Callback, v7_8, callbacks_7_8);
        registry.register(ItemKind::Variable, v7_8, variables_7_8);
        registry
    }

    pub fn register(&mut self, kind: ItemKind, version: ManualVersion, factory: Factory) {
        self.entries.insert((kind, version), factory);
    }

    /// Version whose entry serves `version`, if any.
    pub fn resolve_version(&self, kind: ItemKind, version: ManualVersion) -> Option<ManualVersion> {
        if self.entries.contains_key(&(kind, version)) {
            return Some(version);
        }
        self.entries
            .keys()
            .filter(|(k, v)| *k == kind && v.major == version.major)
            .map(|(_, v)| *v)
            .max()
    }

    pub fn create(&self, kind: ItemKind, version: ManualVersion) -> KindRules {
        match self.resolve_version(kind, version) {
            Some(found) => {
                if found != version {
                    warn!("No {} rules for manual version {}", kind, version);
                    info!("=> Use {} rules for manual version {} instead", kind, found);
                }
                (self.entries[&(kind, found)])()
            }
            None => base(kind),
        }
    }
}

/// Version independent rules without remediation.
pub fn base(kind: ItemKind) -> KindRules {
    let rules: Box<dyn ItemRules> = match kind {
        ItemKind::Callback => Box::new(CallbackRules),
        ItemKind::Command => Box::new(CommandRules),
        ItemKind::Function => Box::new(FunctionRules),
        ItemKind::Widget => Box::new(WidgetRules),
        ItemKind::Variable => Box::new(VariableRules::default()),
    };
    KindRules {
        rules,
        remediation: Remediation::default(),
    }
}

// -- Manual 7.8 ---------------------------------------------------------------

fn callbacks_7_8() -> KindRules {
    let mut kind_rules = base(ItemKind::Callback);
    kind_rules.remediation.skip_lines = vec![(399, 433), (488, 489)];
    kind_rules
}

fn variables_7_8() -> KindRules {
    let mut kind_rules = base(ItemKind::Variable);
    let remediation = &mut kind_rules.remediation;
    remediation
        .merge_lines
        .extend([9072, 9074, 9075, 9076, 9078, 9533]);
    for (line, first, second) in [
        (9905, "$CONTROL_PAR_WAVE_END_", "COLOR"),
        (9907, "$CONTROL_PAR_WAVE_END_", "ALPHA"),
        (9909, "$CONTROL_PAR_WAVETABLE", "_END_COLOR"),
        (9911, "$CONTROL_PAR_WAVETABLE", "_END_ALPHA"),
    ] {
        remediation.wrapped_cells.insert(
            line,
            WrappedCell {
                first: first.to_string(),
                second: second.to_string(),
            },
        );
    }
    kind_rules
}
