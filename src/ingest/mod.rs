// src/ingest/mod.rs
pub mod utils;

use crate::error::{ReportError, Result};
use csv::{ReaderBuilder, StringRecord};
use std::{fs::File, io::Read, path::Path};
use tracing::{debug, info};

use utils::{clean_str, parse_number};

/// The fixed, case-sensitive headers the report reads.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Column {
    CreatedAt,
    LineitemQuantity,
    Total,
    BillingProvince,
}

impl Column {
    pub const ALL: [Column; 4] = [
        Column::CreatedAt,
        Column::LineitemQuantity,
        Column::Total,
        Column::BillingProvince,
    ];

    pub fn header(&self) -> &'static str {
        match self {
            Column::CreatedAt => "Created at",
            Column::LineitemQuantity => "Lineitem quantity",
            Column::Total => "Total",
            Column::BillingProvince => "Billing Province",
        }
    }
}

/// Which of the known columns the uploaded schema carries.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct Columns {
    present: [bool; 4],
}

impl Columns {
    pub fn all() -> Self {
        Self { present: [true; 4] }
    }

    pub fn from_headers(headers: &[String]) -> Self {
        let mut present = [false; 4];
        for (i, col) in Column::ALL.iter().enumerate() {
            present[i] = headers.iter().any(|h| h == col.header());
        }
        Self { present }
    }

    pub fn without(mut self, column: Column) -> Self {
        self.present[column as usize] = false;
        self
    }

    pub fn contains(&self, column: Column) -> bool {
        self.present[column as usize]
    }

    /// Fails with `MissingField` naming the header when absent.
    pub fn require(&self, column: Column) -> Result<()> {
        if self.contains(column) {
            Ok(())
        } else {
            Err(ReportError::missing(column.header()))
        }
    }
}

/// One uploaded row, restricted to the columns the report reads.
#[derive(Debug, Clone, PartialEq)]
pub struct OrderRecord {
    /// 1-based line in the source file (header is line 1).
    pub line: u64,
    pub created_at: String,
    pub line_item_quantity: Option<f64>,
    pub total: Option<f64>,
    pub billing_province: Option<String>,
}

impl OrderRecord {
    pub fn new(
        created_at: &str,
        line_item_quantity: f64,
        total: f64,
        billing_province: &str,
    ) -> Self {
        Self {
            line: 0,
            created_at: created_at.to_string(),
            line_item_quantity: Some(line_item_quantity),
            total: Some(total),
            billing_province: Some(billing_province.to_string()),
        }
    }
}

/// The whole upload, loaded at once.
#[derive(Debug, Clone, Default)]
pub struct OrderTable {
    /// Every header of the file, in order.
    pub headers: Vec<String>,
    pub columns: Columns,
    pub records: Vec<OrderRecord>,
    /// First few raw rows, all columns, for the upload preview.
    pub head: Vec<Vec<String>>,
}

impl OrderTable {
    /// Build a table from records whose columns are all present.
    pub fn from_records(mut records: Vec<OrderRecord>) -> Self {
        for (i, r) in records.iter_mut().enumerate() {
            if r.line == 0 {
                r.line = i as u64 + 2;
            }
        }
        Self {
            headers: Column::ALL.iter().map(|c| c.header().to_string()).collect(),
            columns: Columns::all(),
            records,
            head: Vec::new(),
        }
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }
}

/// Resolved header positions for one file.
struct ColumnIndex {
    created_at: Option<usize>,
    quantity: Option<usize>,
    total: Option<usize>,
    province: Option<usize>,
}

impl ColumnIndex {
    fn new(headers: &[String]) -> Self {
        let find = |c: Column| headers.iter().position(|h| h == c.header());
        Self {
            created_at: find(Column::CreatedAt),
            quantity: find(Column::LineitemQuantity),
            total: find(Column::Total),
            province: find(Column::BillingProvince),
        }
    }
}

fn numeric_cell(
    record: &StringRecord,
    idx: Option<usize>,
    column: Column,
    line: u64,
) -> Result<Option<f64>> {
    let Some(raw) = idx.and_then(|i| record.get(i)) else {
        return Ok(None);
    };
    match parse_number(raw) {
        None => Ok(None),
        Some(Ok(v)) => Ok(Some(v)),
        Some(Err(e)) => Err(ReportError::Unclassified(format!(
            "non-numeric value {:?} in '{}' at line {}: {}",
            raw,
            column.header(),
            line,
            e
        ))),
    }
}

/// Read a whole CSV upload into memory.
///
/// Headers are matched exactly. Columns the report does not read are kept
/// only in the preview. Rows longer than the header are malformed.
#[tracing::instrument(level = "info", skip(reader))]
pub fn load_orders<R: Read>(reader: R, preview_rows: usize) -> Result<OrderTable> {
    let mut rdr = ReaderBuilder::new()
        .has_headers(true)
        .flexible(true)
        .from_reader(reader);

    let headers: Vec<String> = rdr.headers()?.iter().map(|h| h.to_string()).collect();
    let index = ColumnIndex::new(&headers);
    let columns = Columns::from_headers(&headers);
    debug!(?headers, "read header row");

    let mut records = Vec::new();
    let mut head = Vec::with_capacity(preview_rows);
    for (idx, result) in rdr.records().enumerate() {
        let record = result?;
        let line = record
            .position()
            .map(|p| p.line())
            .unwrap_or(idx as u64 + 2);

        if record.len() > headers.len() {
            return Err(ReportError::Unclassified(format!(
                "malformed CSV: expected {} fields, saw {} at line {}",
                headers.len(),
                record.len(),
                line
            )));
        }
        // blank lines are skipped by the reader; an all-empty record is padding
        if record.iter().all(|f| f.trim().is_empty()) {
            continue;
        }

        if head.len() < preview_rows {
            head.push(record.iter().map(|f| f.to_string()).collect());
        }

        let created_at = index
            .created_at
            .and_then(|i| record.get(i))
            .map(|s| clean_str(s).to_string())
            .unwrap_or_default();
        let billing_province = index
            .province
            .and_then(|i| record.get(i))
            .map(clean_str)
            .filter(|s| !s.is_empty())
            .map(str::to_string);

        records.push(OrderRecord {
            line,
            created_at,
            line_item_quantity: numeric_cell(&record, index.quantity, Column::LineitemQuantity, line)?,
            total: numeric_cell(&record, index.total, Column::Total, line)?,
            billing_province,
        });
    }

    info!(rows = records.len(), columns = headers.len(), "loaded orders");
    Ok(OrderTable {
        headers,
        columns,
        records,
        head,
    })
}

/// Open, fully read and release the file at `path`.
pub fn load_orders_path<P: AsRef<Path>>(path: P, preview_rows: usize) -> Result<OrderTable> {
    let file = File::open(path.as_ref()).map_err(|e| {
        ReportError::Unclassified(format!("cannot open {}: {}", path.as_ref().display(), e))
    })?;
    load_orders(file, preview_rows)
}

#[cfg(test)]
mod tests {
    use super::*;

    const SAMPLE: &str = "\
Name,Created at,Lineitem quantity,Total,Billing Province
#1001,2024-01-05 10:00:00 -0500,2,40.00,ca
#1002,2024-01-20 12:30:00 +0000,1,,NY
#1003,2024-02-01 08:00:00 +0100,3,75.5,
";

    #[test]
    fn loads_known_columns_and_preview() {
        let table = load_orders(SAMPLE.as_bytes(), 2).unwrap();
        assert_eq!(table.len(), 3);
        assert_eq!(table.head.len(), 2);
        assert_eq!(table.head[0][0], "#1001");
        assert_eq!(table.columns, Columns::all());

        let first = &table.records[0];
        assert_eq!(first.line, 2);
        assert_eq!(first.created_at, "2024-01-05 10:00:00 -0500");
        assert_eq!(first.line_item_quantity, Some(2.0));
        assert_eq!(first.billing_province.as_deref(), Some("ca"));

        assert_eq!(table.records[1].total, None);
        assert_eq!(table.records[2].billing_province, None);
    }

    #[test]
    fn missing_headers_are_tracked() {
        let csv = "Created at,Lineitem quantity\n2024-01-05 10:00:00 +0000,1\n";
        let table = load_orders(csv.as_bytes(), 0).unwrap();
        assert!(table.columns.contains(Column::CreatedAt));
        assert!(!table.columns.contains(Column::Total));
        match table.columns.require(Column::Total) {
            Err(ReportError::MissingField(name)) => assert_eq!(name, "Total"),
            other => panic!("expected MissingField, got {:?}", other),
        }
    }

    #[test]
    fn headers_are_case_sensitive() {
        let csv = "created at,Total\n2024-01-05 10:00:00 +0000,1\n";
        let table = load_orders(csv.as_bytes(), 0).unwrap();
        assert!(!table.columns.contains(Column::CreatedAt));
    }

    #[test]
    fn non_numeric_total_is_unclassified() {
        let csv = "Created at,Total\n2024-01-05 10:00:00 +0000,lots\n";
        let err = load_orders(csv.as_bytes(), 0).unwrap_err();
        match err {
            ReportError::Unclassified(msg) => {
                assert!(msg.contains("lots"));
                assert!(msg.contains("Total"));
            }
            other => panic!("expected Unclassified, got {:?}", other),
        }
    }

    #[test]
    fn overlong_rows_are_malformed() {
        let csv = "Created at,Total\n2024-01-05 10:00:00 +0000,1,extra\n";
        assert!(matches!(
            load_orders(csv.as_bytes(), 0),
            Err(ReportError::Unclassified(_))
        ));
    }
}
