// Entry point and interactive page menu.
//
// Each menu option renders one dashboard page on the console:
// - [1] coagulopathy medicine acquisitions (wide CSV melted to long form),
// - [2] emicizumab scenario tables (display-only, delimiter autodetected),
// - [3] Hemo 8R distribution (Ministry of Health annual series plus the
//   per-health-service history).
//
// The pages only consume prepared tables and filter selections; all
// normalization lives in the library modules. Re-rendering a page reuses
// the parsed base table through the loader cache.
mod datasets;
mod loader;
mod output;
mod reports;
mod reshape;
mod types;
mod util;

use std::io::{self, Write};
use std::path::Path;

use types::{FilterSelection, MedicineYearView, MonthlyUiView, ServiceRankView, YearTotalView};
use types::{AcquisitionView, DistributionView};
use util::{format_int, format_number};

const RAW_PREVIEW_ROWS: usize = 10;
const DEFAULT_TOP_N: usize = 15;

/// Read a single line of input after printing a prompt.
fn read_line(prompt: &str) -> String {
    print!("{}", prompt);
    let _ = io::stdout().flush();
    let mut buf = String::new();
    io::stdin().read_line(&mut buf).ok();
    buf.trim().to_string()
}

/// Ask the user whether to go back to the page menu after rendering.
///
/// Returns `true` if the user chose `Y`, `false` if they chose `N`.
fn prompt_back_to_menu() -> bool {
    loop {
        match read_line("Voltar ao menu de páginas (Y/N): ").to_uppercase().as_str() {
            "Y" => return true,
            "N" => return false,
            _ => println!("Opção inválida. Digite Y ou N."),
        }
    }
}

/// Prompt for an inclusive year range, defaulting to the full span of the
/// loaded data. Swapped bounds are reordered rather than rejected.
fn prompt_year_range(bounds: (i32, i32)) -> (i32, i32) {
    let from = read_line(&format!("Ano inicial [{}]: ", bounds.0))
        .parse::<i32>()
        .unwrap_or(bounds.0);
    let to = read_line(&format!("Ano final [{}]: ", bounds.1))
        .parse::<i32>()
        .unwrap_or(bounds.1);
    if from <= to {
        (from, to)
    } else {
        (to, from)
    }
}

/// Page [1]: acquisitions of coagulopathy medicines.
fn handle_acquisitions() {
    let path = Path::new(datasets::ACQUISITIONS_CSV);
    let (rows, report) = match datasets::load_acquisitions(path) {
        Ok(loaded) => loaded,
        Err(e) => {
            eprintln!("Erro ao carregar {}: {}\n", path.display(), e);
            return;
        }
    };
    let Some(bounds) = reports::year_bounds(&rows) else {
        println!("Nenhum dado disponível na planilha de medicamentos.\n");
        return;
    };
    println!(
        "Aquisições de Medicamentos para Coagulopatias ({} registros, {} descartados)\n",
        format_int(report.kept_rows as i64),
        format_int(report.dropped_rows as i64)
    );

    let range = prompt_year_range(bounds);
    let filter = FilterSelection {
        range: Some(range),
        selected: Default::default(),
    };
    let view = reports::apply_filter(&rows, &filter);
    let summary = reports::acquisitions_summary(&view, range);
    println!(
        "\nPeríodo analisado: {} - {}",
        summary.year_from, summary.year_to
    );
    println!("Medicamentos distintos: {}", summary.distinct_medicines);
    println!(
        "Total adquirido (todas apresentações): {}\n",
        format_number(summary.total_quantity, 0)
    );

    println!("Total anual de aquisições (todos os medicamentos)");
    let annual: Vec<YearTotalView> = reports::annual_totals(&view).iter().map(Into::into).collect();
    output::preview_table_rows(&annual, annual.len());

    println!("Composição das aquisições por medicamento");
    let by_medicine: Vec<MedicineYearView> = reports::annual_totals_by_medicine(&view)
        .iter()
        .map(Into::into)
        .collect();
    output::preview_table_rows(&by_medicine, by_medicine.len());

    // Mirrors the dashboard's default multi-select: the first five
    // medicines in name order.
    let medicines = reports::distinct_medicines(&view);
    let default_selection: std::collections::HashSet<String> =
        medicines.iter().take(5).cloned().collect();
    if !default_selection.is_empty() {
        let mut names: Vec<&str> = default_selection.iter().map(String::as_str).collect();
        names.sort_unstable();
        println!("Evolução anual por medicamento ({})", names.join(", "));
        let evolution_filter = FilterSelection {
            range: Some(range),
            selected: default_selection,
        };
        let evolution: Vec<MedicineYearView> =
            reports::annual_totals_by_medicine(&reports::apply_filter(&rows, &evolution_filter))
                .iter()
                .map(Into::into)
                .collect();
        output::preview_table_rows(&evolution, evolution.len());
    }

    println!("Dados detalhados (amostra)");
    let detail: Vec<AcquisitionView> = view.iter().map(Into::into).collect();
    output::preview_table_rows(&detail, RAW_PREVIEW_ROWS);
    output::print_summary_json("Resumo:", &summary);
}

/// Page [2]: emicizumab scenario tables, shown exactly as loaded.
fn handle_emicizumab() {
    let hb = Path::new(datasets::EMICIZUMAB_HB_CSV);
    let roche = Path::new(datasets::EMICIZUMAB_ROCHE_CSV);
    let (table_hb, table_roche) = match datasets::load_emicizumab_pair(hb, roche) {
        Ok(pair) => pair,
        Err(e) => {
            eprintln!("Erro ao carregar CSVs de emicizumabe: {}\n", e);
            return;
        }
    };
    println!("Emicizumabe – Cenários Hemobrás e Roche\n");
    println!("Cenário Hemobrás (Hemo 8R – UI)");
    output::preview_raw_table(&table_hb, RAW_PREVIEW_ROWS);
    println!("Cenário ROCHE (Emicizumabe – mg)");
    output::preview_raw_table(&table_roche, RAW_PREVIEW_ROWS);
    println!("Visualização somente leitura das tabelas originais. Nenhum dado é alterado.\n");
}

/// Page [3]: Hemo 8R distribution, Ministry of Health series first, then
/// the per-service history with the top-N ranking.
fn handle_hemo8r() {
    println!("Hemo 8R\n");

    println!("Distribuição do Hemo 8R — Ministério da Saúde");
    let ms_path = Path::new(datasets::MS_ANNUAL_CSV);
    match datasets::load_ms_annual(ms_path) {
        Ok((annual, _report)) => match reports::annual_summary(&annual) {
            Some(summary) => {
                println!("De: {}  Até: {}", summary.year_from, summary.year_to);
                println!(
                    "Total distribuído (UI): {}\n",
                    format_number(summary.total_quantity, 0)
                );
                let table: Vec<YearTotalView> = annual
                    .iter()
                    .map(|r| YearTotalView {
                        year: r.year,
                        quantity: format_number(r.quantity, 0),
                    })
                    .collect();
                output::preview_table_rows(&table, table.len());
                output::print_summary_json("Resumo MS:", &summary);
            }
            None => println!("Nenhum dado disponível do Ministério da Saúde.\n"),
        },
        // The MS block is optional on this page, same as the original:
        // a load failure warns and the service history still renders.
        Err(e) => eprintln!("Aviso: erro ao carregar {}: {}\n", ms_path.display(), e),
    }

    let path = Path::new(datasets::DISTRIBUTION_CSV);
    let (rows, report) = match datasets::load_distribution(path) {
        Ok(loaded) => loaded,
        Err(e) => {
            eprintln!("Erro ao carregar {}: {}\n", path.display(), e);
            return;
        }
    };
    println!("Distribuição do Hemo 8R — Serviços de saúde");
    let Some(summary) = reports::distribution_summary(&rows) else {
        println!("Nenhum registro com período válido.\n");
        return;
    };
    println!(
        "De: {}  Até: {}",
        summary.period_from.format("%m/%Y"),
        summary.period_to.format("%m/%Y")
    );
    println!("Serviços distintos: {}", format_int(summary.distinct_services as i64));
    println!("Volume total (UI): {}", format_int(summary.total_volume_ui));
    println!(
        "Registros: {} ({} descartados por período inválido)\n",
        format_int(summary.records as i64),
        format_int(report.dropped_rows as i64)
    );

    println!("Evolução mensal por UI");
    let monthly: Vec<MonthlyUiView> =
        reports::monthly_ui_totals(&rows).iter().map(Into::into).collect();
    output::preview_table_rows(&monthly, monthly.len());

    let n = read_line(&format!("Quantos serviços exibir? [{}]: ", DEFAULT_TOP_N))
        .parse::<usize>()
        .unwrap_or(DEFAULT_TOP_N);
    println!("\nTop serviços por volume total (UI)");
    let ranking: Vec<ServiceRankView> = reports::top_services(&rows, n)
        .into_iter()
        .enumerate()
        .map(|(idx, t)| ServiceRankView {
            rank: idx + 1,
            service: t.service,
            total: format_int(t.total),
        })
        .collect();
    output::preview_table_rows(&ranking, ranking.len());

    println!("Amostra dos dados tratados");
    let detail: Vec<DistributionView> = rows.iter().map(Into::into).collect();
    output::preview_table_rows(&detail, RAW_PREVIEW_ROWS);
    output::print_summary_json("Resumo:", &summary);
}

fn main() {
    loop {
        println!("Selecione a página:");
        println!("[1] Aquisições de Medicamentos para Coagulopatias");
        println!("[2] Emicizumabe – Cenários Hemobrás e Roche");
        println!("[3] Hemo 8R – Distribuição\n");
        match read_line("Opção: ").as_str() {
            "1" => handle_acquisitions(),
            "2" => handle_emicizumab(),
            "3" => handle_hemo8r(),
            _ => {
                println!("Opção inválida. Digite 1, 2 ou 3.\n");
                continue;
            }
        }
        if !prompt_back_to_menu() {
            println!("Encerrando.");
            break;
        }
    }
}
