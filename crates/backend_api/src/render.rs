use models::{ChartKind, ChartSpec, DashboardOutput};
use serde_json::json;
use std::fmt::Write;

/// Page slots for the three charts, in layout order: the two donuts side by
/// side, then the revenue bar chart.
const CHART_SLOTS: [&str; 3] = ["chart-categories", "chart-payments", "chart-revenue"];

/// Assemble the whole static component tree as one HTML string. Purely
/// presentational: every number on the page was computed upstream, this only
/// formats and escapes.
pub fn render_page(dashboard: &DashboardOutput) -> String {
    let summary = &dashboard.summary;
    let mut page = String::with_capacity(16 * 1024);

    page.push_str(
        "<!DOCTYPE html>\n\
         <html lang=\"en\">\n<head>\n\
         <meta charset=\"utf-8\">\n\
         <meta name=\"viewport\" content=\"width=device-width, initial-scale=1\">\n\
         <title>Sales KPI Dashboard</title>\n\
         <link href=\"https://cdn.jsdelivr.net/npm/bootstrap@5.3.3/dist/css/bootstrap.min.css\" rel=\"stylesheet\">\n\
         <script src=\"https://cdn.plot.ly/plotly-2.35.2.min.js\"></script>\n\
         <style>body{background-color:#f0f2f5}.insights{background-color:#f8f9fa}</style>\n\
         </head>\n<body>\n<div class=\"container-fluid\">\n",
    );

    // Header
    let _ = write!(
        page,
        "<div class=\"row\"><div class=\"col\">\n\
         <h1 class=\"text-center mb-2 mt-4\">Sales KPI Dashboard</h1>\n\
         <p class=\"text-center text-muted mb-4\">Analysis of {} transactions ({})</p>\n\
         </div></div>\n",
        summary.transaction_count,
        esc(&dashboard.metadata.source_file),
    );

    // KPI cards
    page.push_str("<div class=\"row mb-4\">\n");
    kpi_card(
        &mut page,
        "Average Transaction",
        "text-primary",
        &format!("{:.2} €", summary.mean_transaction),
        "Per transaction",
    );
    kpi_card(
        &mut page,
        "Total Sales",
        "text-success",
        &format!("{} €", fmt_thousands(summary.total_sales)),
        &format!("{} transactions", summary.transaction_count),
    );
    kpi_card(
        &mut page,
        "Recurrence Rate",
        "text-info",
        &format!("{:.1} %", summary.recurrence_rate),
        &format!(
            "{} / {} clients",
            summary.recurrent_clients, summary.distinct_clients
        ),
    );
    kpi_card(
        &mut page,
        "Average CLV",
        "text-warning",
        &format!("{:.2} €", summary.mean_clv),
        "Customer Lifetime Value",
    );
    page.push_str("</div>\n");

    // Two donut charts side by side
    let _ = write!(
        page,
        "<div class=\"row mb-4\">\n\
         <div class=\"col-12 col-md-6\"><div class=\"card shadow-sm\"><div class=\"card-body\">\
         <div id=\"{}\"></div></div></div></div>\n\
         <div class=\"col-12 col-md-6\"><div class=\"card shadow-sm\"><div class=\"card-body\">\
         <div id=\"{}\"></div></div></div></div>\n\
         </div>\n",
        CHART_SLOTS[0], CHART_SLOTS[1],
    );

    // Bar chart + insights panel
    let _ = write!(
        page,
        "<div class=\"row mb-4\">\n\
         <div class=\"col-12 col-md-8\"><div class=\"card shadow-sm\"><div class=\"card-body\">\
         <div id=\"{}\"></div></div></div></div>\n\
         <div class=\"col-12 col-md-4\">{}</div>\n\
         </div>\n",
        CHART_SLOTS[2],
        insights_panel(dashboard),
    );

    page.push_str("</div>\n");

    // One figure per slot; specs are embedded as plain Plotly figure JSON
    page.push_str("<script>\nconst figures = ");
    let figures: serde_json::Map<String, serde_json::Value> = dashboard
        .charts
        .iter()
        .zip(CHART_SLOTS)
        .map(|(spec, slot)| (slot.to_string(), chart_figure(spec)))
        .collect();
    page.push_str(&serde_json::Value::Object(figures).to_string());
    page.push_str(
        ";\nfor (const [slot, figure] of Object.entries(figures)) {\n\
         \x20 Plotly.newPlot(slot, figure.data, figure.layout, {responsive: true});\n\
         }\n</script>\n</body>\n</html>\n",
    );

    page
}

fn kpi_card(page: &mut String, label: &str, accent: &str, value: &str, footnote: &str) {
    let _ = write!(
        page,
        "<div class=\"col-12 col-md-3\"><div class=\"card shadow-sm mb-4\"><div class=\"card-body\">\n\
         <h6 class=\"card-subtitle mb-2 text-muted\">{}</h6>\n\
         <h2 class=\"card-title {}\">{}</h2>\n\
         <p class=\"card-text small\">{}</p>\n\
         </div></div></div>\n",
        esc(label),
        accent,
        esc(value),
        esc(footnote),
    );
}

fn insights_panel(dashboard: &DashboardOutput) -> String {
    let summary = &dashboard.summary;
    format!(
        "<div class=\"card shadow-sm h-100 insights\"><div class=\"card-body\">\n\
         <h5 class=\"mb-3\">Key Insights</h5><hr>\n\
         <p><strong>Best category: </strong><span class=\"text-primary\">{}</span></p>\n\
         <p><strong>Revenue generated: </strong><span class=\"text-success\">{} €</span></p>\n\
         <hr>\n\
         <p><strong>Preferred payment mode: </strong><span class=\"text-info\">{}</span></p>\n\
         <p><strong>Usage: </strong><span class=\"text-muted\">{:.1}%</span></p>\n\
         <hr>\n\
         <p><strong>Average basket: </strong><span class=\"text-warning\">{:.2} €</span></p>\n\
         <p><strong>Loyal clients: </strong><span class=\"text-danger\">{:.1}%</span></p>\n\
         </div></div>",
        esc(&summary.top_category),
        fmt_thousands(summary.top_category_revenue),
        esc(&summary.top_payment_mode),
        summary.top_payment_share,
        summary.mean_transaction,
        summary.recurrence_rate,
    )
}

/// Project one declarative chart spec onto a Plotly figure object.
fn chart_figure(spec: &ChartSpec) -> serde_json::Value {
    let data = match spec.kind {
        ChartKind::Donut => json!([{
            "type": "pie",
            "labels": &spec.labels,
            "values": &spec.values,
            "hole": spec.hole.unwrap_or(0.0),
        }]),
        ChartKind::Bar => {
            let mut trace = json!({
                "type": "bar",
                "x": &spec.labels,
                "y": &spec.values,
            });
            if spec.value_labels {
                trace["text"] = json!(spec
                    .values
                    .iter()
                    .map(|v| format!("{:.0}", v.round()))
                    .collect::<Vec<_>>());
                trace["textposition"] = json!("auto");
            }
            json!([trace])
        }
    };

    let mut layout = json!({
        "title": {"text": &spec.title},
        "height": 400,
    });
    if spec.kind == ChartKind::Bar {
        layout["xaxis"] = json!({"title": {"text": "Category"}});
        layout["yaxis"] = json!({"title": {"text": "Amount (€)"}});
    }

    json!({"data": data, "layout": layout})
}

fn esc(s: &str) -> String {
    html_escape::encode_text(s).into_owned()
}

/// Whole-unit amount with thousands separators, e.g. 1234567.4 -> "1,234,567".
fn fmt_thousands(v: f64) -> String {
    let rounded = v.round();
    let digits = format!("{}", rounded.abs() as i64);
    let mut out = String::with_capacity(digits.len() + digits.len() / 3);
    for (i, c) in digits.chars().enumerate() {
        if i > 0 && (digits.len() - i) % 3 == 0 {
            out.push(',');
        }
        out.push(c);
    }
    if rounded < 0.0 {
        format!("-{out}")
    } else {
        out
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use models::{
        CategorySlice, DashboardMetadata, KpiSummary, PaymentSlice,
    };
    use std::collections::BTreeMap;

    fn fixture() -> DashboardOutput {
        let mut categories = BTreeMap::new();
        categories.insert(
            "Drinks".to_string(),
            CategorySlice {
                total: 30.0,
                share: 50.0,
            },
        );
        categories.insert(
            "Food".to_string(),
            CategorySlice {
                total: 30.0,
                share: 50.0,
            },
        );
        let mut payments = BTreeMap::new();
        payments.insert(
            "Card".to_string(),
            PaymentSlice {
                count: 2,
                share: 66.7,
            },
        );
        payments.insert(
            "Cash".to_string(),
            PaymentSlice {
                count: 1,
                share: 33.3,
            },
        );
        let summary = KpiSummary {
            mean_transaction: 20.0,
            total_sales: 60.0,
            transaction_count: 3,
            recurrence_rate: 50.0,
            recurrent_clients: 1,
            distinct_clients: 2,
            mean_clv: 30.0,
            top_category: "Drinks".to_string(),
            top_category_revenue: 30.0,
            top_payment_mode: "Card".to_string(),
            top_payment_share: 66.7,
        };
        let charts = dashboard_charts(&categories, &payments);
        DashboardOutput {
            metadata: DashboardMetadata {
                generated_at: "2025-01-01T00:00:00+00:00".to_string(),
                source_file: "data_kpi.xlsx".to_string(),
            },
            summary,
            categories,
            payments,
            charts,
        }
    }

    fn dashboard_charts(
        categories: &BTreeMap<String, CategorySlice>,
        payments: &BTreeMap<String, PaymentSlice>,
    ) -> Vec<ChartSpec> {
        vec![
            ChartSpec {
                kind: ChartKind::Donut,
                title: "Sales by Category (%)".to_string(),
                labels: categories.keys().cloned().collect(),
                values: categories.values().map(|s| s.share).collect(),
                value_labels: false,
                hole: Some(0.3),
            },
            ChartSpec {
                kind: ChartKind::Donut,
                title: "Payment Modes (%)".to_string(),
                labels: payments.keys().cloned().collect(),
                values: payments.values().map(|s| s.share).collect(),
                value_labels: false,
                hole: Some(0.3),
            },
            ChartSpec {
                kind: ChartKind::Bar,
                title: "Revenue by Category (€)".to_string(),
                labels: categories.keys().cloned().collect(),
                values: categories.values().map(|s| s.total).collect(),
                value_labels: true,
                hole: None,
            },
        ]
    }

    #[test]
    fn test_page_contains_cards_and_insights() {
        let page = render_page(&fixture());

        assert!(page.contains("Sales KPI Dashboard"));
        assert!(page.contains("Analysis of 3 transactions"));
        assert!(page.contains("20.00 €"));
        assert!(page.contains("60 €"));
        assert!(page.contains("50.0 %"));
        assert!(page.contains("1 / 2 clients"));
        assert!(page.contains("Customer Lifetime Value"));
        assert!(page.contains("Key Insights"));
        assert!(page.contains("66.7%"));
    }

    #[test]
    fn test_page_embeds_all_three_figures() {
        let page = render_page(&fixture());
        for slot in CHART_SLOTS {
            assert!(page.contains(&format!("id=\"{slot}\"")));
            assert!(page.contains(&format!("\"{slot}\":")));
        }
        assert!(page.contains("\"type\":\"pie\""));
        assert!(page.contains("\"type\":\"bar\""));
        assert!(page.contains("\"hole\":0.3"));
    }

    #[test]
    fn test_labels_are_escaped() {
        let mut dashboard = fixture();
        dashboard.summary.top_category = "<script>alert(1)</script>".to_string();
        let page = render_page(&dashboard);
        assert!(!page.contains("<script>alert(1)</script>"));
        assert!(page.contains("&lt;script&gt;"));
    }

    #[test]
    fn test_fmt_thousands() {
        assert_eq!(fmt_thousands(0.0), "0");
        assert_eq!(fmt_thousands(999.4), "999");
        assert_eq!(fmt_thousands(1234.6), "1,235");
        assert_eq!(fmt_thousands(1234567.0), "1,234,567");
        assert_eq!(fmt_thousands(-5000.0), "-5,000");
    }
}
