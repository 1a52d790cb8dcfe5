use anyhow::Result;
use orderscope::{
    build_report,
    config::ReportConfig,
    error::ReportError,
    geo::{to_feature_collection, Boundaries},
    ingest::{load_orders, load_orders_path, Column},
    process::{
        compute_scalar_metrics, monthly_series, parse_timestamps, state_aggregates, MonthlyMode,
        StateCodes, TimestampGrammar,
    },
    report::{render::render_text, StateSection},
    GeoJoin,
};
use std::io::Write;
use tempfile::NamedTempFile;

const HEADER: &str = "Name,Email,Created at,Lineitem quantity,Total,Billing Province\n";

fn csv(rows: &[&str]) -> String {
    let mut s = HEADER.to_string();
    for r in rows {
        s.push_str(r);
        s.push('\n');
    }
    s
}

#[test]
fn single_row_round_trip() -> Result<()> {
    let data = csv(&["#1,a@x.io,2024-03-14 09:26:53 -0400,4,100,ca"]);
    let table = load_orders(data.as_bytes(), 5)?;
    let orders = parse_timestamps(&table, TimestampGrammar::FixedOffset)?;

    let m = compute_scalar_metrics(&orders)?;
    assert_eq!(format!("{:.2}", m.avg_order_value), "100.00");
    assert_eq!(format!("{:.2}", m.avg_items_per_order), "4.00");

    let states = state_aggregates(&orders, &StateCodes::default())?;
    assert_eq!(states.len(), 1);
    assert_eq!(states[0].state_code.as_str(), "CA");
    assert_eq!(states[0].shipment_count, 1);
    assert_eq!(states[0].normalized_count, 1.0);
    Ok(())
}

#[test]
fn series_and_averages_agree_on_counts() -> Result<()> {
    let data = csv(&[
        "#1,,2023-12-30 10:00:00 +0000,1,10,TX",
        "#2,,2024-01-02 10:00:00 +0000,2,20,tx",
        "#3,,2023-11-15 10:00:00 +0000,3,30,WA",
        "#4,,2024-01-09 10:00:00 +0000,1,40,",
        "#5,,2023-12-01 10:00:00 +0000,1,50,ON",
        "#6,,2024-01-31 23:59:59 +0000,1,60,wa",
    ]);
    let table = load_orders(data.as_bytes(), 0)?;
    let orders = parse_timestamps(&table, TimestampGrammar::FixedOffset)?;

    let series = monthly_series(&orders, MonthlyMode::Count)?;
    let summed: usize = series.iter().map(|m| m.order_count).sum();
    assert_eq!(summed, orders.len());
    assert!(series.windows(2).all(|p| p[0].month < p[1].month));

    let m = compute_scalar_metrics(&orders)?;
    assert_eq!(m.avg_orders_per_month, orders.len() as f64 / series.len() as f64);

    // blank and foreign provinces still count above, but not here
    let states = state_aggregates(&orders, &StateCodes::default())?;
    let shipped: usize = states.iter().map(|s| s.shipment_count).sum();
    assert_eq!(shipped, 4);
    Ok(())
}

#[test]
fn parse_errors_name_the_value() -> Result<()> {
    for bad in ["not-a-date", "9999999-01-01 00:00:00 +0000"] {
        let data = csv(&[
            "#1,,2024-03-14 09:26:53 -0400,1,10,CA",
            &format!("#2,,{},1,10,CA", bad),
        ]);
        let table = load_orders(data.as_bytes(), 0)?;
        let err = parse_timestamps(&table, TimestampGrammar::FixedOffset).unwrap_err();
        assert!(err.is_parse(), "{bad}: {err:?}");
        assert!(err.to_string().contains(bad));
    }
    Ok(())
}

#[test]
fn missing_total_is_reported_by_name() -> Result<()> {
    let data = "Created at,Lineitem quantity\n2024-03-14 09:26:53 -0400,2\n";
    let table = load_orders(data.as_bytes(), 0)?;
    assert!(!table.columns.contains(Column::Total));
    let orders = parse_timestamps(&table, TimestampGrammar::FixedOffset)?;
    match compute_scalar_metrics(&orders) {
        Err(ReportError::MissingField(name)) => assert_eq!(name, "Total"),
        other => panic!("expected MissingField, got {:?}", other),
    }
    Ok(())
}

#[test]
fn foreign_provinces_only_is_no_state_data() -> Result<()> {
    let data = csv(&[
        "#1,,2024-03-14 09:26:53 -0400,1,10,XX",
        "#2,,2024-03-15 09:26:53 -0400,1,10,",
    ]);
    let table = load_orders(data.as_bytes(), 0)?;
    let orders = parse_timestamps(&table, TimestampGrammar::FixedOffset)?;
    assert!(matches!(
        state_aggregates(&orders, &StateCodes::default()),
        Err(ReportError::NoStateData)
    ));
    Ok(())
}

#[test]
fn iso_deployment_with_geo_join_from_files() -> Result<()> {
    let mut orders_file = NamedTempFile::new()?;
    write!(
        orders_file,
        "{}",
        csv(&[
            "#1,,2024-03-14T09:26:53-04:00,2,30,ca",
            "#2,,2024-03-20T10:00:00Z,1,50,CA",
            "#3,,2024-04-02T08:00:00+02:00,5,70,or",
        ])
    )?;

    let mut geo_file = NamedTempFile::new()?;
    write!(
        geo_file,
        r#"{{"type": "FeatureCollection", "features": [
            {{"type": "Feature", "id": "CA", "properties": {{"name": "California"}}, "geometry": null}},
            {{"type": "Feature", "id": "OR", "properties": {{"name": "Oregon"}}, "geometry": null}},
            {{"type": "Feature", "id": "WA", "properties": {{"name": "Washington"}}, "geometry": null}}
        ]}}"#
    )?;

    let config = ReportConfig::from_yaml_str(&format!(
        "timestamp_grammar: iso8601\nmonthly_mode: count\ngeo:\n  boundaries: {}\n",
        geo_file.path().display()
    ))?;
    let geo_cfg = config.geo.as_ref().expect("geo configured");
    let boundaries = Boundaries::from_path(&geo_cfg.boundaries, geo_cfg.key_property.as_deref())?;

    let table = load_orders_path(orders_file.path(), 2)?;
    let report = build_report(
        &table,
        &config,
        GeoJoin {
            boundaries: Some(&boundaries),
            hints: Some(&geo_cfg.hints),
        },
    )?;

    let counts: Vec<(String, usize)> = report
        .monthly
        .iter()
        .map(|m| (m.month.to_string(), m.order_count))
        .collect();
    assert_eq!(counts, [("2024-03".to_string(), 2), ("2024-04".to_string(), 1)]);

    let StateSection::Ready { aggregates, regions: Some(regions) } = &report.states else {
        panic!("expected joined states, got {:?}", report.states);
    };
    assert_eq!(aggregates.len(), 2);
    let by_key: Vec<(&str, usize)> = regions
        .iter()
        .map(|r| (r.key.as_str(), r.shipment_count))
        .collect();
    assert_eq!(by_key, [("CA", 2), ("OR", 1), ("WA", 0)]);

    let fc = to_feature_collection(&boundaries, regions);
    assert_eq!(fc["features"][2]["properties"]["normalized_count"], 0.0);
    assert_eq!(fc["features"][1]["properties"]["normalized_count"], 0.5);

    let text = render_text(&report, &config.currency_symbol);
    assert!(text.contains("Average Order Value: $50.00"));
    assert!(text.contains("Order Count Over Time"));
    assert!(text.contains("Map regions: 3 (1 without shipments)"));
    Ok(())
}
