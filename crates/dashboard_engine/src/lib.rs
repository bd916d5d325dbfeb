use chrono::Local;
use models::{
    CategorySlice, DashboardMetadata, DashboardOutput, KpiSummary, PaymentSlice, Transaction,
};
use std::collections::BTreeMap;
use thiserror::Error;

mod charts;
pub use charts::build_charts;

#[derive(Debug, Error)]
pub enum EngineError {
    #[error("cannot compute KPIs over an empty transaction table")]
    EmptyTable,
}

fn round1(v: f64) -> f64 {
    (v * 10.0).round() / 10.0
}

/// Compute the full dashboard from the cleaned transaction table.
///
/// Every aggregate is a pure function of the input slice; grouping uses
/// `BTreeMap` so iteration order, and therefore tie-breaking and chart label
/// order, is deterministic. Ties for the top category and the preferred
/// payment mode resolve to the lexicographically smallest name.
pub fn compute_dashboard(
    transactions: &[Transaction],
    source_file: &str,
) -> Result<DashboardOutput, EngineError> {
    if transactions.is_empty() {
        return Err(EngineError::EmptyTable);
    }

    let transaction_count = transactions.len();
    let total_sales: f64 = transactions.iter().map(|t| t.amount).sum();
    let mean_transaction = total_sales / transaction_count as f64;

    // Revenue grouped by category, each group's share of the total
    let mut category_totals: BTreeMap<String, f64> = BTreeMap::new();
    for t in transactions {
        *category_totals.entry(t.category.clone()).or_insert(0.0) += t.amount;
    }
    let categories: BTreeMap<String, CategorySlice> = category_totals
        .iter()
        .map(|(name, &total)| {
            let share = if total_sales != 0.0 {
                round1(total / total_sales * 100.0)
            } else {
                0.0
            };
            (name.clone(), CategorySlice { total, share })
        })
        .collect();

    // Per-client transaction counts (recurrence) and amount sums (CLV)
    let mut client_counts: BTreeMap<&str, usize> = BTreeMap::new();
    let mut client_sums: BTreeMap<&str, f64> = BTreeMap::new();
    for t in transactions {
        *client_counts.entry(t.client_id.as_str()).or_insert(0) += 1;
        *client_sums.entry(t.client_id.as_str()).or_insert(0.0) += t.amount;
    }
    let distinct_clients = client_counts.len();
    let recurrent_clients = client_counts.values().filter(|&&count| count > 1).count();
    let recurrence_rate = if distinct_clients == 0 {
        0.0
    } else {
        round1(recurrent_clients as f64 / distinct_clients as f64 * 100.0)
    };
    let mean_clv = if distinct_clients == 0 {
        0.0
    } else {
        client_sums.values().sum::<f64>() / distinct_clients as f64
    };

    // Payment-mode frequencies and their share of all transactions
    let mut payment_counts: BTreeMap<String, usize> = BTreeMap::new();
    for t in transactions {
        *payment_counts.entry(t.payment_mode.clone()).or_insert(0) += 1;
    }
    let payments: BTreeMap<String, PaymentSlice> = payment_counts
        .iter()
        .map(|(name, &count)| {
            let share = round1(count as f64 / transaction_count as f64 * 100.0);
            (name.clone(), PaymentSlice { count, share })
        })
        .collect();

    let (top_category, top_category_revenue) =
        max_by_value(category_totals.iter().map(|(name, &total)| (name, total)));
    let (top_payment_mode, _) = max_by_value(
        payment_counts
            .iter()
            .map(|(name, &count)| (name, count as f64)),
    );
    let top_payment_share = payments
        .get(top_payment_mode)
        .map(|slice| slice.share)
        .unwrap_or(0.0);

    let summary = KpiSummary {
        mean_transaction,
        total_sales,
        transaction_count,
        recurrence_rate,
        recurrent_clients,
        distinct_clients,
        mean_clv,
        top_category: top_category.to_string(),
        top_category_revenue,
        top_payment_mode: top_payment_mode.to_string(),
        top_payment_share,
    };

    let charts = build_charts(&categories, &payments);

    Ok(DashboardOutput {
        metadata: DashboardMetadata {
            generated_at: Local::now().to_rfc3339(),
            source_file: source_file.to_string(),
        },
        summary,
        categories,
        payments,
        charts,
    })
}

/// Largest value wins; on a tie the first entry in iteration order does,
/// which over a `BTreeMap` is the lexicographically smallest key.
fn max_by_value<'a, I>(entries: I) -> (&'a str, f64)
where
    I: Iterator<Item = (&'a String, f64)>,
{
    let mut best: (&'a str, f64) = ("", f64::NEG_INFINITY);
    for (name, value) in entries {
        if value > best.1 {
            best = (name.as_str(), value);
        }
    }
    best
}
