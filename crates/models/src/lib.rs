use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;

/// One of the four normalized column roles every header variant is mapped onto.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum CanonicalField {
    ClientId,
    Amount,
    Category,
    PaymentMode,
}

impl CanonicalField {
    pub fn as_str(&self) -> &'static str {
        match self {
            CanonicalField::ClientId => "client_id",
            CanonicalField::Amount => "amount",
            CanonicalField::Category => "category",
            CanonicalField::PaymentMode => "payment_mode",
        }
    }
}

impl fmt::Display for CanonicalField {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A cleaned sales transaction. Amount is finite after coercion.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Transaction {
    pub client_id: String,
    pub amount: f64,
    pub category: String,
    pub payment_mode: String,
}

/// Per-category revenue and its share of total sales (percent, 1 decimal).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CategorySlice {
    pub total: f64,
    pub share: f64,
}

/// Per-payment-mode usage count and its share of all transactions (percent, 1 decimal).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PaymentSlice {
    pub count: usize,
    pub share: f64,
}

/// Fixed-shape summary statistics computed once over the cleaned table.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct KpiSummary {
    pub mean_transaction: f64,
    pub total_sales: f64,
    pub transaction_count: usize,
    pub recurrence_rate: f64,
    pub recurrent_clients: usize,
    pub distinct_clients: usize,
    pub mean_clv: f64,
    pub top_category: String,
    pub top_category_revenue: f64,
    pub top_payment_mode: String,
    pub top_payment_share: f64,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ChartKind {
    Donut,
    Bar,
}

/// Declarative chart descriptor; a pure projection of already-computed aggregates.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ChartSpec {
    pub kind: ChartKind,
    pub title: String,
    pub labels: Vec<String>,
    pub values: Vec<f64>,
    /// Print each value on top of its mark (bar charts).
    pub value_labels: bool,
    /// Inner radius fraction for donut charts.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub hole: Option<f64>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DashboardMetadata {
    pub generated_at: String,
    pub source_file: String,
}

/// Everything the page needs, computed once at startup and never mutated.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DashboardOutput {
    pub metadata: DashboardMetadata,
    pub summary: KpiSummary,
    pub categories: BTreeMap<String, CategorySlice>,
    pub payments: BTreeMap<String, PaymentSlice>,
    pub charts: Vec<ChartSpec>,
}
