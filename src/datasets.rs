// Per-dataset normalization pipelines.
//
// This is the single place where untyped text cells become typed rows, so
// every coercion and zero-fill decision lives here:
// - quantities zero-fill on unparseable input (the dashboards must still
//   render partial data),
// - rows with an unparseable period/year key are excluded entirely (a key
//   with no ordering position has no bucket to land in).
use std::path::Path;
use std::sync::Arc;

use crate::loader::{self, IngestError, RawTable};
use crate::reshape::{self, ReshapeSpec};
use crate::types::{AcquisitionRow, AnnualRow, DistributionRow};
use crate::util::{normalize_quantity, normalize_ui, parse_period, parse_plain_number, parse_year};

// Fixed, relative file names known at build time.
pub const ACQUISITIONS_CSV: &str = "medicamentos_coagulopatias.csv";
pub const DISTRIBUTION_CSV: &str = "historico_hemo8r.csv";
pub const MS_ANNUAL_CSV: &str = "hemo8R_MS.csv";
pub const EMICIZUMAB_HB_CSV: &str = "dados_emicizumabe_HB.csv";
pub const EMICIZUMAB_ROCHE_CSV: &str = "dados_emicizumabe_ROCHE.csv";

/// Row-level bookkeeping for one pipeline run. Individual bad rows are
/// never surfaced to the user; only these aggregate counts are.
#[derive(Debug, Clone, Default)]
pub struct LoadReport {
    pub total_rows: usize,
    pub kept_rows: usize,
    pub dropped_rows: usize,
}

/// Load the wide acquisitions file and melt it into long form.
///
/// The file is `;`-separated with one `medicamento` column and one column
/// per year. Non-year extra columns simply don't participate in the melt.
/// Output is sorted by (year, medicine) for deterministic chart ordering.
pub fn load_acquisitions(path: &Path) -> Result<(Vec<AcquisitionRow>, LoadReport), IngestError> {
    let table = loader::load_cached(path, Some(b';'))?;
    loader::require_columns(&table, path, &["medicamento"])?;

    let spec = ReshapeSpec {
        identifier_column: "medicamento",
    };
    let cells = reshape::reshape(&table, &spec);
    let mut report = LoadReport {
        total_rows: cells.len(),
        ..LoadReport::default()
    };

    let mut rows: Vec<AcquisitionRow> = Vec::with_capacity(cells.len());
    for cell in cells {
        // Value columns are selected by year-parseable header, so this
        // only drops cells if the header was mangled between the two
        // passes; counted all the same.
        let Some(year) = parse_year(&cell.key) else {
            report.dropped_rows += 1;
            continue;
        };
        rows.push(AcquisitionRow {
            medicine: cell.id,
            year,
            quantity: normalize_quantity(Some(&cell.value)),
        });
    }
    rows.sort_by(|a, b| a.year.cmp(&b.year).then_with(|| a.medicine.cmp(&b.medicine)));
    report.kept_rows = rows.len();
    Ok((rows, report))
}

/// Load the Hemo 8R distribution-by-service history.
///
/// Requires the period, service, and the five UI columns; fails fatally if
/// any is absent. UI cells zero-fill; rows whose period label does not
/// parse are dropped and counted.
pub fn load_distribution(path: &Path) -> Result<(Vec<DistributionRow>, LoadReport), IngestError> {
    let table = loader::load_cached(path, Some(b';'))?;
    let idx = loader::require_columns(
        &table,
        path,
        &[
            "Período de saída",
            "Serviço de Saúde",
            "250 UI",
            "500 UI",
            "1000 UI",
            "1500 UI",
            "Total Geral",
        ],
    )?;

    let mut report = LoadReport::default();
    let mut rows: Vec<DistributionRow> = Vec::with_capacity(table.rows.len());
    for row in &table.rows {
        report.total_rows += 1;
        let Some(period) = parse_period(&row[idx[0]]) else {
            report.dropped_rows += 1;
            continue;
        };
        rows.push(DistributionRow {
            period,
            service: row[idx[1]].trim().to_string(),
            ui_250: normalize_ui(Some(&row[idx[2]])),
            ui_500: normalize_ui(Some(&row[idx[3]])),
            ui_1000: normalize_ui(Some(&row[idx[4]])),
            ui_1500: normalize_ui(Some(&row[idx[5]])),
            total: normalize_ui(Some(&row[idx[6]])),
        });
    }
    report.kept_rows = rows.len();
    Ok((rows, report))
}

/// Load the Ministry of Health annual series (`ano`/`quantidade`).
///
/// Unlike the other pipelines this one drops a row when either field fails
/// to parse instead of zero-filling the quantity; a zero year-total that
/// only exists because of a bad cell would be indistinguishable from a real
/// zero in a two-column series. Sorted ascending by year.
pub fn load_ms_annual(path: &Path) -> Result<(Vec<AnnualRow>, LoadReport), IngestError> {
    let table = loader::load_cached(path, Some(b';'))?;
    let idx = loader::require_columns(&table, path, &["ano", "quantidade"])?;

    let mut report = LoadReport::default();
    let mut rows: Vec<AnnualRow> = Vec::with_capacity(table.rows.len());
    for row in &table.rows {
        report.total_rows += 1;
        let (Some(year), Some(quantity)) = (
            parse_year(&row[idx[0]]),
            parse_plain_number(&row[idx[1]]),
        ) else {
            report.dropped_rows += 1;
            continue;
        };
        rows.push(AnnualRow { year, quantity });
    }
    rows.sort_by_key(|r| r.year);
    report.kept_rows = rows.len();
    Ok((rows, report))
}

/// Load the two emicizumab scenario tables (Hemobrás and Roche).
///
/// These are display-only: delimiter is autodetected, cells stay text, and
/// no normalization is applied.
pub fn load_emicizumab_pair(
    hb_path: &Path,
    roche_path: &Path,
) -> Result<(Arc<RawTable>, Arc<RawTable>), IngestError> {
    let hb = loader::load_cached(hb_path, None)?;
    let roche = loader::load_cached(roche_path, None)?;
    Ok((hb, roche))
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use tempfile::NamedTempFile;

    fn temp_csv(content: &str) -> NamedTempFile {
        let mut f = NamedTempFile::new().unwrap();
        f.write_all(content.as_bytes()).unwrap();
        f.flush().unwrap();
        f
    }

    #[test]
    fn acquisitions_melt_and_sort() {
        let f = temp_csv(
            "2021;medicamento;2020\n\
             120;Fator IX;3.100\n\
             ;Fator VIII;1.234,56\n",
        );
        let (rows, report) = load_acquisitions(f.path()).unwrap();
        assert_eq!(report.total_rows, 4);
        assert_eq!(report.kept_rows, 4);
        assert_eq!(report.dropped_rows, 0);
        assert_eq!(
            rows,
            vec![
                AcquisitionRow {
                    medicine: "Fator IX".into(),
                    year: 2020,
                    quantity: 3100.0
                },
                AcquisitionRow {
                    medicine: "Fator VIII".into(),
                    year: 2020,
                    quantity: 1234.56
                },
                AcquisitionRow {
                    medicine: "Fator IX".into(),
                    year: 2021,
                    quantity: 120.0
                },
                AcquisitionRow {
                    medicine: "Fator VIII".into(),
                    year: 2021,
                    quantity: 0.0
                },
            ]
        );
    }

    #[test]
    fn acquisitions_reshape_round_trip() {
        // Summing the long form per medicine equals summing each wide row
        // across its year columns.
        let f = temp_csv(
            "medicamento;2019;2020;2021\n\
             A;1;2;3\n\
             B;10;;5\n",
        );
        let (rows, _) = load_acquisitions(f.path()).unwrap();
        let sum = |m: &str| -> f64 {
            rows.iter()
                .filter(|r| r.medicine == m)
                .map(|r| r.quantity)
                .sum()
        };
        assert_eq!(sum("A"), 6.0);
        assert_eq!(sum("B"), 15.0);
    }

    #[test]
    fn acquisitions_requires_identifier_column() {
        let f = temp_csv("produto;2020\nA;1\n");
        let err = load_acquisitions(f.path()).unwrap_err();
        assert!(matches!(err, IngestError::MissingColumn { .. }));
    }

    #[test]
    fn acquisitions_load_is_idempotent() {
        let f = temp_csv("medicamento;2020;2021\nA;1;2\nB;3;4\n");
        let (first, _) = load_acquisitions(f.path()).unwrap();
        let (second, _) = load_acquisitions(f.path()).unwrap();
        assert_eq!(first, second);
    }

    #[test]
    fn distribution_drops_unparseable_periods() {
        let f = temp_csv(
            "Período de saída;Serviço de Saúde;250 UI;500 UI;1000 UI;1500 UI;Total Geral\n\
             janeiro/19;Hemocentro A;3.100;0;200;;3.300\n\
             xyz/19;Hemocentro B;1;1;1;1;4\n\
             dezembro/2023;Hemocentro B;10;20;30;40;100\n",
        );
        let (rows, report) = load_distribution(f.path()).unwrap();
        assert_eq!(report.total_rows, 3);
        assert_eq!(report.kept_rows, 2);
        assert_eq!(report.dropped_rows, 1);
        assert_eq!(rows[0].period, chrono::NaiveDate::from_ymd_opt(2019, 1, 1).unwrap());
        assert_eq!(rows[0].ui_250, 3100);
        assert_eq!(rows[0].ui_1500, 0); // empty cell zero-fills
        assert_eq!(rows[1].period, chrono::NaiveDate::from_ymd_opt(2023, 12, 1).unwrap());
    }

    #[test]
    fn distribution_requires_all_ui_columns() {
        let f = temp_csv("Período de saída;Serviço de Saúde;250 UI\njaneiro/19;A;1\n");
        let err = load_distribution(f.path()).unwrap_err();
        match err {
            IngestError::MissingColumn { column, .. } => assert_eq!(column, "500 UI"),
            other => panic!("unexpected error: {other}"),
        }
    }

    #[test]
    fn ms_annual_drops_bad_rows_and_sorts() {
        let f = temp_csv("ano;quantidade\n2021;200\nn/d;50\n2019;100.5\n");
        let (rows, report) = load_ms_annual(f.path()).unwrap();
        assert_eq!(report.dropped_rows, 1);
        assert_eq!(
            rows,
            vec![
                AnnualRow { year: 2019, quantity: 100.5 },
                AnnualRow { year: 2021, quantity: 200.0 },
            ]
        );
    }

    #[test]
    fn emicizumab_pair_autodetects_mixed_delimiters() {
        let hb = temp_csv("cenario;ui\nHB;1.000\n");
        let roche = temp_csv("cenario,mg\nROCHE,500\n");
        let (t_hb, t_roche) = load_emicizumab_pair(hb.path(), roche.path()).unwrap();
        assert_eq!(t_hb.headers, vec!["cenario", "ui"]);
        assert_eq!(t_roche.headers, vec!["cenario", "mg"]);
        assert_eq!(t_roche.rows, vec![vec!["ROCHE", "500"]]);
    }
}
