//! Shared domain types.
//!
//! These types are kept lightweight and serializable so they can be:
//!
//! - used in-memory during estimation
//! - exported to JSON/CSV
//! - reloaded later for reporting

use std::fmt;
use std::path::PathBuf;

use chrono::{DateTime, Utc};
use clap::ValueEnum;
use serde::de::{MapAccess, Visitor};
use serde::ser::SerializeMap;
use serde::{Deserialize, Deserializer, Serialize, Serializer};

use crate::error::EstimateError;
use crate::fit::FitOptions;

/// Identifier of a spatial unit (ecozone/ecoprovince/ecoregion id).
///
/// Integer ids read from CSV are kept in their text form.
pub type UnitId = String;

/// Level of the ecological land classification used as the spatial unit.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, ValueEnum)]
#[serde(rename_all = "lowercase")]
pub enum EcoLevel {
    Ecozone,
    Ecoprovince,
    Ecoregion,
}

impl EcoLevel {
    /// Column holding the unit id in the annual statistics table.
    pub fn default_column(self) -> &'static str {
        match self {
            EcoLevel::Ecozone => "ECOZONE",
            EcoLevel::Ecoprovince => "ECOPROVINCE",
            EcoLevel::Ecoregion => "ECOREGION",
        }
    }

    pub fn display_name(self) -> &'static str {
        match self {
            EcoLevel::Ecozone => "ecozone",
            EcoLevel::Ecoprovince => "ecoprovince",
            EcoLevel::Ecoregion => "ecoregion",
        }
    }
}

/// Column holding the annual land-area fraction burned.
pub const DEFAULT_FRACTION_COLUMN: &str = "LAND_AREA_FRACTION";

/// One spatial-unit/year row of the annual statistics table.
#[derive(Debug, Clone, PartialEq)]
pub struct Observation {
    pub unit_id: UnitId,
    /// Fraction of the unit's land area burned in that year.
    pub burn_fraction: f64,
}

impl Observation {
    pub fn new(unit_id: impl Into<UnitId>, burn_fraction: f64) -> Self {
        Self {
            unit_id: unit_id.into(),
            burn_fraction,
        }
    }
}

/// Fitted two-component exponential mixture.
///
/// Invariants for any fitted value: `0 <= w <= 1`, `scale1 >= 1`, `scale2 >= 1`.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct MixtureParams {
    pub w: f64,
    pub scale1: f64,
    pub scale2: f64,
}

impl MixtureParams {
    pub fn new(w: f64, scale1: f64, scale2: f64) -> Self {
        Self { w, scale1, scale2 }
    }

    pub fn to_array(self) -> [f64; 3] {
        [self.w, self.scale1, self.scale2]
    }

    pub fn from_array(p: [f64; 3]) -> Self {
        Self::new(p[0], p[1], p[2])
    }
}

/// Fit output for one spatial unit.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct UnitFit {
    pub params: MixtureParams,
    /// Number of annual observations used.
    pub samples: usize,
}

/// Ordered mapping `unit id -> fit`, in first-seen unit order.
///
/// Units whose estimation failed are absent.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct FitResults {
    entries: Vec<(UnitId, UnitFit)>,
}

impl FitResults {
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert or replace; a new id is appended at the end.
    pub fn insert(&mut self, unit_id: UnitId, fit: UnitFit) {
        match self.entries.iter_mut().find(|(id, _)| *id == unit_id) {
            Some((_, slot)) => *slot = fit,
            None => self.entries.push((unit_id, fit)),
        }
    }

    pub fn get(&self, unit_id: &str) -> Option<&UnitFit> {
        self.entries
            .iter()
            .find(|(id, _)| id == unit_id)
            .map(|(_, fit)| fit)
    }

    pub fn contains(&self, unit_id: &str) -> bool {
        self.get(unit_id).is_some()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&UnitId, &UnitFit)> {
        self.entries.iter().map(|(id, fit)| (id, fit))
    }

    pub fn unit_ids(&self) -> impl Iterator<Item = &UnitId> {
        self.entries.iter().map(|(id, _)| id)
    }
}

impl Serialize for FitResults {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut map = serializer.serialize_map(Some(self.entries.len()))?;
        for (id, fit) in &self.entries {
            map.serialize_entry(id, fit)?;
        }
        map.end()
    }
}

impl<'de> Deserialize<'de> for FitResults {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        struct ResultsVisitor;

        impl<'de> Visitor<'de> for ResultsVisitor {
            type Value = FitResults;

            fn expecting(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                f.write_str("a map of unit id to fit")
            }

            fn visit_map<A: MapAccess<'de>>(self, mut access: A) -> Result<FitResults, A::Error> {
                let mut out = FitResults::new();
                while let Some((id, fit)) = access.next_entry::<UnitId, UnitFit>()? {
                    out.insert(id, fit);
                }
                Ok(out)
            }
        }

        deserializer.deserialize_map(ResultsVisitor)
    }
}

/// Per-unit outcome, including skipped units (for reporting).
#[derive(Debug, Clone, PartialEq)]
pub enum FitOutcome {
    Fitted(UnitFit),
    Skipped { samples: usize, error: EstimateError },
}

/// Estimator settings shared by the builder and the fitter.
#[derive(Debug, Clone)]
pub struct EstimateConfig {
    /// Largest empirical PMF (in one-year steps) the builder will allocate.
    pub max_support_len: usize,
    pub fit: FitOptions,
}

impl Default for EstimateConfig {
    fn default() -> Self {
        Self {
            max_support_len: 10_000_000,
            fit: FitOptions::default(),
        }
    }
}

impl EstimateConfig {
    pub fn validate(&self) -> Result<(), EstimateError> {
        if self.max_support_len == 0 {
            return Err(EstimateError::InvalidConfig(
                "max_support_len must be > 0".to_string(),
            ));
        }
        self.fit.validate()
    }
}

/// A full run's configuration as understood by the pipeline.
///
/// This is derived from CLI flags (plus defaults).
#[derive(Debug, Clone)]
pub struct RunConfig {
    pub csv_path: PathBuf,
    pub level: EcoLevel,
    /// Overrides `level.default_column()` when set.
    pub unit_column: Option<String>,
    pub fraction_column: String,
    pub estimate: EstimateConfig,
    pub export_json: Option<PathBuf>,
    pub export_csv: Option<PathBuf>,
}

impl RunConfig {
    pub fn resolved_unit_column(&self) -> &str {
        self.unit_column
            .as_deref()
            .unwrap_or_else(|| self.level.default_column())
    }
}

/// A saved results file (JSON).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ResultsFile {
    pub tool: String,
    pub level: EcoLevel,
    pub generated: DateTime<Utc>,
    pub units: FitResults,
}
