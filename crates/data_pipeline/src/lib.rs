use std::path::PathBuf;

use anyhow::{Context, Result};

use dashboard_engine::compute_dashboard;
use data_normalization::{coerce_rows, resolve_columns};
use models::DashboardOutput;
use spreadsheet_ingest::load_table;

pub struct Config {
    pub input_path: PathBuf,
}

/// Run the whole batch once: load the spreadsheet, resolve the canonical
/// columns, coerce amounts, and compute the dashboard aggregates. Each stage
/// takes the previous stage's output as an explicit argument; there is no
/// process-wide state and nothing is re-run afterwards. Any stage error
/// aborts with context.
pub fn run(cfg: &Config) -> Result<DashboardOutput> {
    let table = load_table(&cfg.input_path)
        .with_context(|| format!("Loading {}", cfg.input_path.display()))?;
    tracing::info!(
        headers = ?table.headers,
        rows = table.rows.len(),
        "loaded spreadsheet"
    );

    let columns = resolve_columns(&table).context("Resolving canonical columns")?;
    tracing::info!(
        client = %table.headers[columns.client],
        amount = %table.headers[columns.amount],
        category = %table.headers[columns.category],
        payment = %table.headers[columns.payment],
        "resolved column mapping"
    );

    let report = coerce_rows(&table, &columns).context("Coercing amount column")?;
    if report.dropped_rows > 0 {
        tracing::warn!(
            dropped = report.dropped_rows,
            kept = report.transactions.len(),
            "dropped rows with non-numeric amounts"
        );
    }

    let source_file = cfg
        .input_path
        .file_name()
        .and_then(|name| name.to_str())
        .unwrap_or("input")
        .to_string();

    let dashboard = compute_dashboard(&report.transactions, &source_file)
        .context("Computing KPI aggregates")?;
    tracing::info!(
        transactions = dashboard.summary.transaction_count,
        total_sales = dashboard.summary.total_sales,
        "dashboard computed"
    );

    Ok(dashboard)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    fn csv_config(content: &str) -> (tempfile::NamedTempFile, Config) {
        let mut file = tempfile::Builder::new()
            .suffix(".csv")
            .tempfile()
            .unwrap();
        file.write_all(content.as_bytes()).unwrap();
        let cfg = Config {
            input_path: file.path().to_path_buf(),
        };
        (file, cfg)
    }

    #[test]
    fn test_full_pipeline_over_csv() {
        let (_file, cfg) = csv_config(
            "ID Client,Montant (€),Catégorie,Mode Paiement\n\
             C1,10,Food,Card\n\
             C1,20,Food,Cash\n\
             C2,30,Drinks,Card\n",
        );
        let dashboard = run(&cfg).unwrap();

        assert_eq!(dashboard.summary.total_sales, 60.0);
        assert_eq!(dashboard.summary.mean_transaction, 20.0);
        assert_eq!(dashboard.summary.recurrence_rate, 50.0);
        assert_eq!(dashboard.summary.mean_clv, 30.0);
        assert_eq!(dashboard.charts.len(), 3);
    }

    #[test]
    fn test_dropped_row_does_not_disturb_the_rest() {
        let base = "Client,Montant,Categorie,Paiement\n\
                    C1,10,Food,Card\n\
                    C2,30,Drinks,Card\n";
        let with_bad_row = "Client,Montant,Categorie,Paiement\n\
                            C1,10,Food,Card\n\
                            C9,abc,Snacks,Cash\n\
                            C2,30,Drinks,Card\n";

        let (_f1, cfg1) = csv_config(base);
        let (_f2, cfg2) = csv_config(with_bad_row);
        let clean = run(&cfg1).unwrap();
        let coerced = run(&cfg2).unwrap();

        // The unparseable row vanishes without changing anyone else's
        // contribution
        assert_eq!(
            coerced.summary.transaction_count,
            clean.summary.transaction_count
        );
        assert_eq!(coerced.summary.total_sales, clean.summary.total_sales);
        assert_eq!(
            coerced.categories["Food"].total,
            clean.categories["Food"].total
        );
        assert!(!coerced.categories.contains_key("Snacks"));
    }

    #[test]
    fn test_missing_file_aborts() {
        let cfg = Config {
            input_path: PathBuf::from("definitely_not_here.xlsx"),
        };
        let err = run(&cfg).unwrap_err();
        let chain = format!("{err:#}");
        assert!(chain.contains("not found"), "got: {chain}");
    }

    #[test]
    fn test_all_rows_dropped_aborts() {
        let (_file, cfg) = csv_config(
            "Client,Montant,Categorie,Paiement\n\
             C1,abc,Food,Card\n\
             C2,n/a,Drinks,Cash\n",
        );
        let err = run(&cfg).unwrap_err();
        let chain = format!("{err:#}");
        assert!(chain.contains("no rows left"), "got: {chain}");
    }

    #[test]
    fn test_amount_fallback_through_pipeline() {
        // No amount synonym in the headers; the single numeric column is
        // promoted
        let (_file, cfg) = csv_config(
            "Client,Prix,Categorie,Paiement\n\
             C1,12.5,Food,Card\n\
             C2,7.5,Drinks,Cash\n",
        );
        let dashboard = run(&cfg).unwrap();
        assert_eq!(dashboard.summary.total_sales, 20.0);
    }
}
