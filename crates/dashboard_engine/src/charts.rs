use models::{CategorySlice, ChartKind, ChartSpec, PaymentSlice};
use std::collections::BTreeMap;

/// Project the aggregates into the three chart descriptors shown on the page.
/// Labels follow map iteration order, so charts and tables agree.
pub fn build_charts(
    categories: &BTreeMap<String, CategorySlice>,
    payments: &BTreeMap<String, PaymentSlice>,
) -> Vec<ChartSpec> {
    let category_shares = ChartSpec {
        kind: ChartKind::Donut,
        title: "Sales by Category (%)".to_string(),
        labels: categories.keys().cloned().collect(),
        values: categories.values().map(|slice| slice.share).collect(),
        value_labels: false,
        hole: Some(0.3),
    };

    let payment_shares = ChartSpec {
        kind: ChartKind::Donut,
        title: "Payment Modes (%)".to_string(),
        labels: payments.keys().cloned().collect(),
        values: payments.values().map(|slice| slice.share).collect(),
        value_labels: false,
        hole: Some(0.3),
    };

    let category_revenue = ChartSpec {
        kind: ChartKind::Bar,
        title: "Revenue by Category (€)".to_string(),
        labels: categories.keys().cloned().collect(),
        values: categories.values().map(|slice| slice.total).collect(),
        value_labels: true,
        hole: None,
    };

    vec![category_shares, payment_shares, category_revenue]
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_build_charts_shapes() {
        let mut categories = BTreeMap::new();
        categories.insert(
            "Food".to_string(),
            CategorySlice {
                total: 30.0,
                share: 50.0,
            },
        );
        categories.insert(
            "Drinks".to_string(),
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

        let charts = build_charts(&categories, &payments);
        assert_eq!(charts.len(), 3);

        assert_eq!(charts[0].kind, ChartKind::Donut);
        assert_eq!(charts[0].hole, Some(0.3));
        assert_eq!(charts[0].labels, vec!["Drinks", "Food"]);
        assert_eq!(charts[0].values, vec![50.0, 50.0]);

        assert_eq!(charts[1].kind, ChartKind::Donut);
        assert_eq!(charts[1].labels, vec!["Card"]);

        assert_eq!(charts[2].kind, ChartKind::Bar);
        assert!(charts[2].value_labels);
        assert_eq!(charts[2].values, vec![30.0, 30.0]);
        assert_eq!(charts[2].hole, None);
    }
}
