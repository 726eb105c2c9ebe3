//! Battery health analysis.
//!
//! Pack voltages are logged as totals; dividing by the series cell count of
//! the airframe's configured pack gives a per-cell voltage that can be
//! classified against Li-ion/LiPo bands.
//!
//! The imbalance flag compares per-cell takeoff and landing voltage. It is a
//! proxy built from aggregate pack voltage, not a measurement of the spread
//! between individual cells, which the logs do not carry.

use std::collections::HashMap;

use serde::{Deserialize, Serialize};

use crate::record::{BatterySlot, FlightRecord, VoltageReading};

/// Per-cell landing voltage at or below which a pack should be replaced.
pub const LOW_VOLTAGE_MAX: f64 = 3.40;

/// Lower bound (inclusive) of the nominal band.
pub const NOMINAL_MIN: f64 = 3.65;

/// Per-cell landing voltage at or above which a pack is fully charged.
pub const FULLY_CHARGED_MIN: f64 = 4.15;

/// Default per-cell takeoff/landing delta above which imbalance is flagged.
pub const DEFAULT_IMBALANCE_THRESHOLD: f64 = 0.006;

/// Cell configuration for one drone model.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BatteryConfig {
    /// Model name as it appears in flight records.
    pub model: String,
    /// Series cell count of the slot 1 pack.
    pub slot1_cells: u32,
    /// Series cell count of the slot 2 pack; absent on single-battery models.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub slot2_cells: Option<u32>,
}

impl BatteryConfig {
    /// Build a configuration row.
    #[must_use]
    pub fn new(model: impl Into<String>, slot1_cells: u32, slot2_cells: Option<u32>) -> Self {
        Self {
            model: model.into(),
            slot1_cells,
            slot2_cells,
        }
    }

    /// Cell count for a slot, `None` when the model has no such pack.
    #[must_use]
    pub fn cells(&self, slot: BatterySlot) -> Option<u32> {
        match slot {
            BatterySlot::One => Some(self.slot1_cells),
            BatterySlot::Two => self.slot2_cells,
        }
    }

    /// Pack label such as `3S`.
    #[must_use]
    pub fn pack_label(&self, slot: BatterySlot) -> Option<String> {
        self.cells(slot).map(|c| format!("{c}S"))
    }
}

/// The fleet's model-to-battery reference table.
///
/// Lookups are case-insensitive on the trimmed model name.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct BatteryTable {
    rows: Vec<BatteryConfig>,
    index: HashMap<String, usize>,
}

impl BatteryTable {
    /// Build a table from configuration rows. Later duplicates win.
    #[must_use]
    pub fn new(rows: Vec<BatteryConfig>) -> Self {
        let index = rows
            .iter()
            .enumerate()
            .map(|(i, row)| (Self::key(&row.model), i))
            .collect();
        Self { rows, index }
    }

    fn key(model: &str) -> String {
        model.trim().to_lowercase()
    }

    /// Configuration for a model, if known.
    #[must_use]
    pub fn get(&self, model: &str) -> Option<&BatteryConfig> {
        self.index.get(&Self::key(model)).map(|&i| &self.rows[i])
    }

    /// All configured rows in load order.
    #[must_use]
    pub fn rows(&self) -> &[BatteryConfig] {
        &self.rows
    }

    /// Configured model names in load order.
    pub fn models(&self) -> impl Iterator<Item = &str> {
        self.rows.iter().map(|r| r.model.as_str())
    }

    /// Number of configured models.
    #[must_use]
    pub fn len(&self) -> usize {
        self.rows.len()
    }

    /// Whether no models are configured.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }
}

/// The fleet shipped as the default battery table.
#[must_use]
pub fn default_battery_models() -> Vec<BatteryConfig> {
    let families: [(&str, u32, Option<u32>); 4] = [
        ("Arsenio", 3, Some(7)),
        ("Argini", 3, Some(12)),
        ("Xander", 6, None),
        ("Damisa", 3, Some(12)),
    ];
    families
        .iter()
        .flat_map(|&(family, s1, s2)| {
            (1..=5).map(move |n| BatteryConfig::new(format!("{family} {n:03}"), s1, s2))
        })
        .collect()
}

/// Health classification of a pack from its per-cell landing voltage.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum HealthStatus {
    /// At or below 3.40 V per cell; replace the pack.
    LowVoltage,
    /// 3.65 V up to (not including) 4.15 V per cell.
    Nominal,
    /// 4.15 V per cell or above.
    FullyCharged,
    /// No landing voltage, or a value between the low and nominal bands.
    Unknown,
    /// The model has no pack in this slot, or the model is not configured.
    NotApplicable,
}

impl HealthStatus {
    /// Classify a per-cell landing voltage.
    #[must_use]
    pub fn classify(per_cell_landing: f64) -> Self {
        if per_cell_landing <= LOW_VOLTAGE_MAX {
            Self::LowVoltage
        } else if per_cell_landing >= FULLY_CHARGED_MIN {
            Self::FullyCharged
        } else if per_cell_landing >= NOMINAL_MIN {
            Self::Nominal
        } else {
            Self::Unknown
        }
    }

    /// Operator guidance attached to the status, if any.
    #[must_use]
    pub fn advice(self) -> Option<&'static str> {
        match self {
            Self::LowVoltage => Some("Consider replacing battery"),
            _ => None,
        }
    }
}

impl std::fmt::Display for HealthStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let s = match self {
            Self::LowVoltage => "Low Voltage",
            Self::Nominal => "Nominal",
            Self::FullyCharged => "Fully Charged",
            Self::Unknown => "Unknown",
            Self::NotApplicable => "N/A",
        };
        f.write_str(s)
    }
}

/// Discharge efficiency: voltage drop as a percentage of takeoff voltage.
///
/// Defined only for a positive takeoff voltage; otherwise `0.0`. A missing
/// landing voltage counts as `0.0`.
#[must_use]
pub fn efficiency(takeoff: Option<f64>, landing: Option<f64>) -> f64 {
    match takeoff {
        Some(t) if t > 0.0 => (t - landing.unwrap_or(0.0)) / t * 100.0,
        _ => 0.0,
    }
}

/// Per-cell voltage of a pack, `None` when either input is missing.
#[must_use]
pub fn per_cell(total: Option<f64>, cells: Option<u32>) -> Option<f64> {
    match (total, cells) {
        (Some(v), Some(c)) if c > 0 => Some(v / f64::from(c)),
        _ => None,
    }
}

/// Health assessment of one battery slot on one flight.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SlotHealth {
    /// Which slot this is.
    pub slot: BatterySlot,
    /// Configured series cell count.
    pub cells: Option<u32>,
    /// Per-cell takeoff voltage.
    pub per_cell_takeoff: Option<f64>,
    /// Per-cell landing voltage.
    pub per_cell_landing: Option<f64>,
    /// Classification from the per-cell landing voltage.
    pub status: HealthStatus,
    /// Set when the per-cell takeoff/landing delta exceeds the threshold.
    pub imbalance: bool,
    /// Discharge efficiency percentage.
    pub efficiency: f64,
}

impl SlotHealth {
    /// Imbalance warning text, if flagged.
    #[must_use]
    pub fn imbalance_warning(&self) -> Option<&'static str> {
        self.imbalance
            .then_some("Imbalance detected (isolate battery)")
    }
}

/// Health of both slots for one flight.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct BatteryHealth {
    /// Slot 1 assessment.
    pub slot1: SlotHealth,
    /// Slot 2 assessment.
    pub slot2: SlotHealth,
}

impl BatteryHealth {
    /// Whether either slot needs replacing.
    #[must_use]
    pub fn needs_replacement(&self) -> bool {
        self.slot1.status == HealthStatus::LowVoltage
            || self.slot2.status == HealthStatus::LowVoltage
    }

    /// Whether either slot is flagged imbalanced.
    #[must_use]
    pub fn is_imbalanced(&self) -> bool {
        self.slot1.imbalance || self.slot2.imbalance
    }

    /// Both slots in order.
    #[must_use]
    pub fn slots(&self) -> [&SlotHealth; 2] {
        [&self.slot1, &self.slot2]
    }
}

/// Classifies battery health against a model's cell configuration.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct BatteryAnalyzer {
    imbalance_threshold: f64,
}

impl Default for BatteryAnalyzer {
    fn default() -> Self {
        Self::new(DEFAULT_IMBALANCE_THRESHOLD)
    }
}

impl BatteryAnalyzer {
    /// Create an analyzer with the given per-cell imbalance threshold (volts).
    #[must_use]
    pub fn new(imbalance_threshold: f64) -> Self {
        Self {
            imbalance_threshold,
        }
    }

    /// Assess both slots of a record.
    ///
    /// `config` is the record's model configuration; with `None` every slot
    /// reports [`HealthStatus::NotApplicable`].
    #[must_use]
    pub fn analyze(&self, record: &FlightRecord, config: Option<&BatteryConfig>) -> BatteryHealth {
        let assess = |slot| {
            self.analyze_slot(
                slot,
                record.battery(slot),
                config.and_then(|c| c.cells(slot)),
            )
        };
        BatteryHealth {
            slot1: assess(BatterySlot::One),
            slot2: assess(BatterySlot::Two),
        }
    }

    /// Assess one slot given its readings and cell count.
    #[must_use]
    pub fn analyze_slot(
        &self,
        slot: BatterySlot,
        reading: &VoltageReading,
        cells: Option<u32>,
    ) -> SlotHealth {
        let efficiency = efficiency(reading.takeoff, reading.landing);
        if cells.is_none() {
            return SlotHealth {
                slot,
                cells,
                per_cell_takeoff: None,
                per_cell_landing: None,
                status: HealthStatus::NotApplicable,
                imbalance: false,
                efficiency,
            };
        }

        let per_cell_takeoff = per_cell(reading.takeoff, cells);
        let per_cell_landing = per_cell(reading.landing, cells);
        let status = per_cell_landing.map_or(HealthStatus::Unknown, HealthStatus::classify);
        let imbalance = match (per_cell_takeoff, per_cell_landing) {
            (Some(t), Some(l)) => (t - l).abs() > self.imbalance_threshold,
            _ => false,
        };

        SlotHealth {
            slot,
            cells,
            per_cell_takeoff,
            per_cell_landing,
            status,
            imbalance,
            efficiency,
        }
    }
}
