use chrono::NaiveDate;
use serde::Serialize;
use std::collections::HashSet;
use tabled::Tabled;

use crate::util::{format_int, format_number};

/// One long-form row of the coagulopathy acquisitions dataset.
/// `quantity` is always finite and non-negative; rows whose year column
/// header failed to parse never make it here.
#[derive(Debug, Clone, PartialEq)]
pub struct AcquisitionRow {
    pub medicine: String,
    pub year: i32,
    pub quantity: f64,
}

/// One row of the Hemo 8R distribution-by-health-service dataset.
/// UI columns zero-fill on unparseable input; rows with an unparseable
/// period label are dropped before construction.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DistributionRow {
    pub period: NaiveDate,
    pub service: String,
    pub ui_250: i64,
    pub ui_500: i64,
    pub ui_1000: i64,
    pub ui_1500: i64,
    pub total: i64,
}

/// One row of the Ministry of Health annual Hemo 8R series.
#[derive(Debug, Clone, PartialEq)]
pub struct AnnualRow {
    pub year: i32,
    pub quantity: f64,
}

/// Ephemeral per-interaction filter state. Never persisted; an empty
/// `selected` set means "no key filter".
#[derive(Debug, Clone, Default)]
pub struct FilterSelection {
    pub range: Option<(i32, i32)>,
    pub selected: HashSet<String>,
}

// ---------------------------------------------------------------------------
// Numeric aggregates produced by `reports`.

#[derive(Debug, Clone, PartialEq)]
pub struct YearTotal {
    pub year: i32,
    pub quantity: f64,
}

#[derive(Debug, Clone, PartialEq)]
pub struct MedicineYearTotal {
    pub year: i32,
    pub medicine: String,
    pub quantity: f64,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MonthlyUiTotal {
    pub period: NaiveDate,
    pub ui_250: i64,
    pub ui_500: i64,
    pub ui_1000: i64,
    pub ui_1500: i64,
    pub total: i64,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ServiceTotal {
    pub service: String,
    pub total: i64,
}

// ---------------------------------------------------------------------------
// Console presentation rows. Values are pre-formatted strings so the table
// renders with Brazilian separators.

#[derive(Debug, Clone, Tabled)]
pub struct YearTotalView {
    #[tabled(rename = "Ano")]
    pub year: i32,
    #[tabled(rename = "Quantidade")]
    pub quantity: String,
}

impl From<&YearTotal> for YearTotalView {
    fn from(t: &YearTotal) -> Self {
        YearTotalView {
            year: t.year,
            quantity: format_number(t.quantity, 0),
        }
    }
}

#[derive(Debug, Clone, Tabled)]
pub struct MedicineYearView {
    #[tabled(rename = "Ano")]
    pub year: i32,
    #[tabled(rename = "Medicamento")]
    pub medicine: String,
    #[tabled(rename = "Quantidade")]
    pub quantity: String,
}

impl From<&MedicineYearTotal> for MedicineYearView {
    fn from(t: &MedicineYearTotal) -> Self {
        MedicineYearView {
            year: t.year,
            medicine: t.medicine.clone(),
            quantity: format_number(t.quantity, 0),
        }
    }
}

#[derive(Debug, Clone, Tabled)]
pub struct MonthlyUiView {
    #[tabled(rename = "Período")]
    pub period: String,
    #[tabled(rename = "250 UI")]
    pub ui_250: String,
    #[tabled(rename = "500 UI")]
    pub ui_500: String,
    #[tabled(rename = "1000 UI")]
    pub ui_1000: String,
    #[tabled(rename = "1500 UI")]
    pub ui_1500: String,
    #[tabled(rename = "Total Geral")]
    pub total: String,
}

impl From<&MonthlyUiTotal> for MonthlyUiView {
    fn from(t: &MonthlyUiTotal) -> Self {
        MonthlyUiView {
            period: t.period.format("%m/%Y").to_string(),
            ui_250: format_int(t.ui_250),
            ui_500: format_int(t.ui_500),
            ui_1000: format_int(t.ui_1000),
            ui_1500: format_int(t.ui_1500),
            total: format_int(t.total),
        }
    }
}

#[derive(Debug, Clone, Tabled)]
pub struct ServiceRankView {
    #[tabled(rename = "Rank")]
    pub rank: usize,
    #[tabled(rename = "Serviço de Saúde")]
    pub service: String,
    #[tabled(rename = "Volume total (UI)")]
    pub total: String,
}

#[derive(Debug, Clone, Tabled)]
pub struct AcquisitionView {
    #[tabled(rename = "Ano")]
    pub year: i32,
    #[tabled(rename = "medicamento")]
    pub medicine: String,
    #[tabled(rename = "Quantidade")]
    pub quantity: String,
}

impl From<&AcquisitionRow> for AcquisitionView {
    fn from(r: &AcquisitionRow) -> Self {
        AcquisitionView {
            year: r.year,
            medicine: r.medicine.clone(),
            quantity: format_number(r.quantity, 0),
        }
    }
}

#[derive(Debug, Clone, Tabled)]
pub struct DistributionView {
    #[tabled(rename = "Período")]
    pub period: String,
    #[tabled(rename = "Serviço de Saúde")]
    pub service: String,
    #[tabled(rename = "250 UI")]
    pub ui_250: String,
    #[tabled(rename = "500 UI")]
    pub ui_500: String,
    #[tabled(rename = "1000 UI")]
    pub ui_1000: String,
    #[tabled(rename = "1500 UI")]
    pub ui_1500: String,
    #[tabled(rename = "Total Geral")]
    pub total: String,
}

impl From<&DistributionRow> for DistributionView {
    fn from(r: &DistributionRow) -> Self {
        DistributionView {
            period: r.period.format("%m/%Y").to_string(),
            service: r.service.clone(),
            ui_250: format_int(r.ui_250),
            ui_500: format_int(r.ui_500),
            ui_1000: format_int(r.ui_1000),
            ui_1500: format_int(r.ui_1500),
            total: format_int(r.total),
        }
    }
}

// ---------------------------------------------------------------------------
// Per-page KPI summaries, printed both as metric lines and as JSON.

#[derive(Debug, Clone, Serialize)]
pub struct AcquisitionsSummary {
    pub year_from: i32,
    pub year_to: i32,
    pub distinct_medicines: usize,
    pub distinct_years: usize,
    pub total_quantity: f64,
}

#[derive(Debug, Clone, Serialize)]
pub struct DistributionSummary {
    pub period_from: NaiveDate,
    pub period_to: NaiveDate,
    pub distinct_services: usize,
    pub total_volume_ui: i64,
    pub records: usize,
}

#[derive(Debug, Clone, Serialize)]
pub struct AnnualSummary {
    pub year_from: i32,
    pub year_to: i32,
    pub total_quantity: f64,
}
