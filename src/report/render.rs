use crate::process::{MonthlyAggregate, MonthlyMode, ScalarMetrics, StateAggregate};
use crate::report::{Preview, Report, StateSection};
use prettytable::{format, Cell, Row, Table};
use serde::Serialize;
use std::fmt::Write;

/// Two decimals, or `n/a` when there was nothing to average.
pub fn fmt_metric(v: f64) -> String {
    if v.is_finite() {
        format!("{:.2}", v)
    } else {
        "n/a".to_string()
    }
}

pub fn scalar_lines(m: &ScalarMetrics, currency: &str) -> Vec<String> {
    let value = if m.avg_order_value.is_finite() {
        format!("{}{:.2}", currency, m.avg_order_value)
    } else {
        "n/a".to_string()
    };
    vec![
        format!("Average Items per Order: {}", fmt_metric(m.avg_items_per_order)),
        format!("Average Order Value: {}", value),
        format!("Average Orders per Month: {}", fmt_metric(m.avg_orders_per_month)),
    ]
}

/// One point of the line chart.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ChartRow {
    pub month: String,
    pub value: f64,
}

pub fn chart_rows(series: &[MonthlyAggregate], mode: MonthlyMode) -> Vec<ChartRow> {
    series
        .iter()
        .map(|m| ChartRow {
            month: m.month.to_string(),
            value: m.value(mode),
        })
        .collect()
}

fn boxed(header: &[&str]) -> Table {
    let mut table = Table::new();
    table.set_format(*format::consts::FORMAT_BOX_CHARS);
    table.set_titles(Row::new(
        header.iter().map(|h| Cell::new(h).style_spec("bFg")).collect(),
    ));
    table
}

pub fn preview_table(preview: &Preview) -> Table {
    let headers: Vec<&str> = preview.headers.iter().map(String::as_str).collect();
    let mut table = boxed(&headers);
    for row in &preview.rows {
        table.add_row(Row::new(row.iter().map(|c| Cell::new(c)).collect()));
    }
    table
}

pub fn monthly_table(series: &[MonthlyAggregate], mode: MonthlyMode) -> Table {
    let mut table = boxed(&["Month", mode.label()]);
    for row in chart_rows(series, mode) {
        let value = match mode {
            MonthlyMode::AverageValue => fmt_metric(row.value),
            MonthlyMode::Count => format!("{}", row.value as u64),
        };
        table.add_row(Row::new(vec![
            Cell::new(&row.month),
            Cell::new(&value).style_spec("r"),
        ]));
    }
    table
}

pub fn state_table(aggregates: &[StateAggregate]) -> Table {
    let mut table = boxed(&["State", "Shipments", "Normalized"]);
    for a in aggregates {
        table.add_row(Row::new(vec![
            Cell::new(a.state_code.as_str()),
            Cell::new(&a.shipment_count.to_string()).style_spec("r"),
            Cell::new(&format!("{:.3}", a.normalized_count)).style_spec("r"),
        ]));
    }
    table
}

/// The whole report as terminal text, sections in pipeline order.
pub fn render_text(report: &Report, currency: &str) -> String {
    let mut out = String::new();
    if !report.preview.rows.is_empty() {
        let _ = writeln!(out, "Uploaded Data:\n{}", preview_table(&report.preview));
    }
    for line in scalar_lines(&report.scalars, currency) {
        let _ = writeln!(out, "{}", line);
    }
    let _ = writeln!(
        out,
        "\n{} Over Time:\n{}",
        report.monthly_mode.label(),
        monthly_table(&report.monthly, report.monthly_mode)
    );
    match &report.states {
        StateSection::Disabled => {}
        StateSection::Failed { message, .. } => {
            let _ = writeln!(out, "Error: {}", message);
        }
        StateSection::Ready { aggregates, regions } => {
            let _ = writeln!(out, "Shipments by State:\n{}", state_table(aggregates));
            if let Some(regions) = regions {
                let empty = regions.iter().filter(|r| r.shipment_count == 0).count();
                let _ = writeln!(
                    out,
                    "Map regions: {} ({} without shipments)",
                    regions.len(),
                    empty
                );
            }
        }
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::ReportConfig;
    use crate::ingest::load_orders;
    use crate::process::MonthKey;
    use crate::report::{build_report, GeoJoin};

    #[test]
    fn failed_state_section_renders_after_earlier_sections() {
        let csv = "Created at,Lineitem quantity,Total,Billing Province\n\
                   2024-01-05 10:00:00 +0000,2,40.00,XX\n\
                   2024-02-05 10:00:00 +0000,1,20.00,xx\n";
        let table = load_orders(csv.as_bytes(), 0).unwrap();
        let report = build_report(&table, &ReportConfig::default(), GeoJoin::default()).unwrap();
        let text = render_text(&report, "$");

        let value = text.find("Average Order Value: $30.00").expect("scalar line");
        let monthly = text.find("2024-02").expect("monthly table");
        let error = text
            .find("Error: no orders matched a recognized state code")
            .expect("state error line");
        assert!(value < monthly && monthly < error, "{text}");
        assert!(!text.contains("Shipments by State"));
    }

    #[test]
    fn scalars_use_two_decimals_and_currency() {
        let m = ScalarMetrics {
            avg_items_per_order: 4.0,
            avg_order_value: 100.0,
            avg_orders_per_month: 1.0 / 3.0,
        };
        assert_eq!(
            scalar_lines(&m, "$"),
            [
                "Average Items per Order: 4.00",
                "Average Order Value: $100.00",
                "Average Orders per Month: 0.33",
            ]
        );
    }

    #[test]
    fn nan_cannot_be_displayed() {
        let m = ScalarMetrics {
            avg_items_per_order: f64::NAN,
            avg_order_value: f64::NAN,
            avg_orders_per_month: f64::NAN,
        };
        assert!(scalar_lines(&m, "$").iter().all(|l| l.ends_with("n/a")));
    }

    #[test]
    fn chart_rows_follow_mode() {
        let series = vec![MonthlyAggregate {
            month: MonthKey::new(2024, 3).unwrap(),
            order_count: 2,
            average_order_value: 12.5,
        }];
        assert_eq!(
            chart_rows(&series, MonthlyMode::AverageValue),
            [ChartRow { month: "2024-03".into(), value: 12.5 }]
        );
        assert_eq!(chart_rows(&series, MonthlyMode::Count)[0].value, 2.0);
        assert!(monthly_table(&series, MonthlyMode::Count)
            .to_string()
            .contains("2024-03"));
    }
}
