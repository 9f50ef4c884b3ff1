//! Tabular output assembly and the incremental column-reconciling merge.
//!
//! The output table is typed: two fixed leading columns plus two
//! variable-width column groups whose current widths are part of the
//! value. Reading an existing CSV recovers the old widths from the header
//! and slices every row at those *old* boundaries — padding an old row
//! straight to a new width without re-slicing first would shift reference
//! cells into predicate columns. Merge is then a pure function over two
//! typed tables, and padding happens only at write time.

use crate::errors::{ExtractError, Result};
use crate::types::ExtractionRecord;
use std::collections::HashSet;
use std::fs;
use std::path::Path;

pub const DEVICE_COLUMN: &str = "K-number";
pub const PRODUCT_CODE_COLUMN: &str = "Product Code";
pub const PREDICATE_PREFIX: &str = "Predicate ";
pub const REFERENCE_PREFIX: &str = "Reference Device ";
pub const SUPPLEMENT_COLUMN: &str = "Number with Suffix";

/// One document's row, sliced into its typed column groups.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TableRow {
    pub device_id: String,
    pub product_code: String,
    pub predicates: Vec<String>,
    pub reference_devices: Vec<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct OutputTable {
    pred_width: usize,
    ref_width: usize,
    rows: Vec<TableRow>,
}

impl OutputTable {
    /// Build a fresh table sized to the maximum predicate/reference counts
    /// observed in `records`.
    pub fn from_records(records: &[ExtractionRecord]) -> Self {
        let rows = records
            .iter()
            .map(|record| TableRow {
                device_id: record.device_id.clone(),
                product_code: record.product_code.clone().unwrap_or_default(),
                predicates: record
                    .predicates
                    .iter()
                    .map(|i| i.as_str().to_string())
                    .collect(),
                reference_devices: record
                    .reference_devices
                    .iter()
                    .map(|i| i.as_str().to_string())
                    .collect(),
            })
            .collect();
        Self::from_rows(rows)
    }

    fn from_rows(rows: Vec<TableRow>) -> Self {
        let pred_width = rows.iter().map(|r| r.predicates.len()).max().unwrap_or(0);
        let ref_width = rows
            .iter()
            .map(|r| r.reference_devices.len())
            .max()
            .unwrap_or(0);
        Self {
            pred_width,
            ref_width,
            rows,
        }
    }

    pub fn pred_width(&self) -> usize {
        self.pred_width
    }

    pub fn ref_width(&self) -> usize {
        self.ref_width
    }

    pub fn rows(&self) -> &[TableRow] {
        &self.rows
    }

    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    /// Device ids already present — the upstream "already processed"
    /// filter in incremental mode.
    pub fn device_ids(&self) -> HashSet<String> {
        self.rows.iter().map(|r| r.device_id.clone()).collect()
    }

    pub fn header(&self) -> Vec<String> {
        let mut header = vec![DEVICE_COLUMN.to_string(), PRODUCT_CODE_COLUMN.to_string()];
        for n in 1..=self.pred_width {
            header.push(format!("{PREDICATE_PREFIX}{n}"));
        }
        for n in 1..=self.ref_width {
            header.push(format!("{REFERENCE_PREFIX}{n}"));
        }
        header
    }

    /// Merge a new batch into a possibly pre-existing table: widths widen
    /// to the maximum of both sides, existing rows come first, and no cell
    /// moves out of its original group.
    pub fn merge(existing: Option<OutputTable>, new: OutputTable) -> OutputTable {
        match existing {
            None => new,
            Some(existing) => {
                let pred_width = existing.pred_width.max(new.pred_width);
                let ref_width = existing.ref_width.max(new.ref_width);
                let mut rows = existing.rows;
                rows.extend(new.rows);
                OutputTable {
                    pred_width,
                    ref_width,
                    rows,
                }
            }
        }
    }

    /// Read an existing output table, recovering the old column-group
    /// widths from the header and slicing each row at those boundaries.
    pub fn read_csv(path: &Path) -> Result<Self> {
        let mut reader = csv::ReaderBuilder::new()
            .flexible(true)
            .from_path(path)?;

        let header = reader.headers()?.clone();
        let (pred_width, ref_width) = parse_header(&header)?;

        let mut rows = Vec::new();
        for result in reader.records() {
            let record = result?;
            let field = |i: usize| record.get(i).unwrap_or("").to_string();

            rows.push(TableRow {
                device_id: field(0),
                product_code: field(1),
                predicates: (2..2 + pred_width).map(field).collect(),
                reference_devices: (2 + pred_width..2 + pred_width + ref_width)
                    .map(field)
                    .collect(),
            });
        }

        Ok(Self {
            pred_width,
            ref_width,
            rows,
        })
    }

    /// Write the table, padding each row's groups to the table widths with
    /// empty strings. The rewrite is atomic: temp file, then rename.
    pub fn write_csv(&self, path: &Path) -> Result<()> {
        let tmp_path = tmp_sibling(path);
        {
            let mut writer = csv::Writer::from_path(&tmp_path)?;
            writer.write_record(self.header())?;

            for row in &self.rows {
                let mut fields = vec![row.device_id.clone(), row.product_code.clone()];
                fields.extend(padded(&row.predicates, self.pred_width));
                fields.extend(padded(&row.reference_devices, self.ref_width));
                writer.write_record(&fields)?;
            }
            writer.flush()?;
        }
        fs::rename(&tmp_path, path)?;
        Ok(())
    }
}

/// Recover (predicate, reference) column counts from a header by prefix
/// counting. Anything that is not the fixed columns followed by the two
/// groups in order is a schema mismatch.
fn parse_header(header: &csv::StringRecord) -> Result<(usize, usize)> {
    let columns: Vec<&str> = header.iter().collect();

    if columns.first() != Some(&DEVICE_COLUMN) || columns.get(1) != Some(&PRODUCT_CODE_COLUMN) {
        return Err(ExtractError::MergeSchemaMismatch(format!(
            "expected leading columns '{DEVICE_COLUMN}', '{PRODUCT_CODE_COLUMN}', found {:?}",
            &columns[..columns.len().min(2)]
        )));
    }

    let mut pred_width = 0;
    let mut ref_width = 0;
    for column in &columns[2..] {
        if column.starts_with(PREDICATE_PREFIX) {
            if ref_width > 0 {
                return Err(ExtractError::MergeSchemaMismatch(format!(
                    "predicate column '{column}' appears after reference columns"
                )));
            }
            pred_width += 1;
        } else if column.starts_with(REFERENCE_PREFIX) {
            ref_width += 1;
        } else {
            return Err(ExtractError::MergeSchemaMismatch(format!(
                "unexpected column '{column}'"
            )));
        }
    }

    Ok((pred_width, ref_width))
}

fn padded(values: &[String], width: usize) -> Vec<String> {
    let mut out = values.to_vec();
    out.resize(width, String::new());
    out
}

fn tmp_sibling(path: &Path) -> std::path::PathBuf {
    let mut name = path
        .file_name()
        .map(|n| n.to_os_string())
        .unwrap_or_default();
    name.push(".tmp");
    path.with_file_name(name)
}

// ===== SUPPLEMENT TABLE =====

/// The `/S###`-suffixed tokens seen across all runs, deduplicated,
/// preserving discovery order.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SupplementTable {
    rows: Vec<String>,
}

impl SupplementTable {
    pub fn from_records(records: &[ExtractionRecord]) -> Self {
        let mut table = Self::default();
        for record in records {
            for token in &record.supplement_matches {
                table.push_unique(token);
            }
        }
        table
    }

    fn push_unique(&mut self, token: &str) {
        if !self.rows.iter().any(|existing| existing == token) {
            self.rows.push(token.to_string());
        }
    }

    pub fn rows(&self) -> &[String] {
        &self.rows
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    pub fn merge(existing: Option<SupplementTable>, new: SupplementTable) -> SupplementTable {
        match existing {
            None => new,
            Some(mut merged) => {
                for token in &new.rows {
                    merged.push_unique(token);
                }
                merged
            }
        }
    }

    pub fn read_csv(path: &Path) -> Result<Self> {
        let mut reader = csv::ReaderBuilder::new()
            .flexible(true)
            .from_path(path)?;

        let header = reader.headers()?.clone();
        if header.get(0) != Some(SUPPLEMENT_COLUMN) {
            return Err(ExtractError::MergeSchemaMismatch(format!(
                "expected supplement column '{SUPPLEMENT_COLUMN}', found {:?}",
                header.get(0)
            )));
        }

        let mut table = Self::default();
        for result in reader.records() {
            let record = result?;
            if let Some(token) = record.get(0) {
                if !token.is_empty() {
                    table.push_unique(token);
                }
            }
        }
        Ok(table)
    }

    pub fn write_csv(&self, path: &Path) -> Result<()> {
        let tmp_path = tmp_sibling(path);
        {
            let mut writer = csv::Writer::from_path(&tmp_path)?;
            writer.write_record([SUPPLEMENT_COLUMN])?;
            for token in &self.rows {
                writer.write_record([token.as_str()])?;
            }
            writer.flush()?;
        }
        fs::rename(&tmp_path, path)?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn row(device: &str, code: &str, preds: &[&str], refs: &[&str]) -> TableRow {
        TableRow {
            device_id: device.to_string(),
            product_code: code.to_string(),
            predicates: preds.iter().map(|s| s.to_string()).collect(),
            reference_devices: refs.iter().map(|s| s.to_string()).collect(),
        }
    }

    fn table(rows: Vec<TableRow>) -> OutputTable {
        OutputTable::from_rows(rows)
    }

    fn temp_csv(name: &str) -> std::path::PathBuf {
        let dir = std::env::temp_dir().join("predex_test_table");
        std::fs::create_dir_all(&dir).unwrap();
        dir.join(name)
    }

    #[test]
    fn header_reflects_group_widths() {
        let t = table(vec![row("K1", "ABC", &["K2", "K3"], &["K4"])]);
        assert_eq!(
            t.header(),
            vec![
                "K-number",
                "Product Code",
                "Predicate 1",
                "Predicate 2",
                "Reference Device 1"
            ]
        );
    }

    #[test]
    fn merging_zero_new_records_preserves_everything() {
        let existing = table(vec![
            row("K1", "ABC", &["K2", "K3"], &["K4"]),
            row("K5", "XYZ", &["K6"], &[]),
        ]);
        let merged = OutputTable::merge(Some(existing.clone()), OutputTable::from_records(&[]));

        assert_eq!(merged.len(), 2);
        assert_eq!(merged.pred_width(), existing.pred_width());
        assert_eq!(merged.ref_width(), existing.ref_width());
        assert_eq!(merged.rows(), existing.rows());
    }

    #[test]
    fn widening_keeps_old_values_in_their_original_slots() {
        let path = temp_csv("widening.csv");
        table(vec![row("K1", "ABC", &["K2", "K3"], &["K4"])])
            .write_csv(&path)
            .unwrap();

        let existing = OutputTable::read_csv(&path).unwrap();
        assert_eq!(existing.pred_width(), 2);

        let new = table(vec![row("K9", "QRS", &["K5", "K6", "K7", "K8"], &[])]);
        let merged = OutputTable::merge(Some(existing), new);
        assert_eq!(merged.pred_width(), 4);
        merged.write_csv(&path).unwrap();

        let reread = OutputTable::read_csv(&path).unwrap();
        assert_eq!(reread.pred_width(), 4);
        // Old predicate values stay in the first two slots, the widened
        // slots are empty — nothing shifted into the reference group
        assert_eq!(reread.rows()[0].predicates, vec!["K2", "K3", "", ""]);
        assert_eq!(reread.rows()[0].reference_devices, vec!["K4"]);
        assert_eq!(reread.rows()[1].predicates, vec!["K5", "K6", "K7", "K8"]);

        std::fs::remove_file(&path).ok();
    }

    #[test]
    fn csv_roundtrip_preserves_cells() {
        let path = temp_csv("roundtrip.csv");
        let original = table(vec![
            row("K1", "ABC", &["K2"], &["K3", "K4"]),
            row("K5", "", &[], &[]),
        ]);
        original.write_csv(&path).unwrap();

        let reread = OutputTable::read_csv(&path).unwrap();
        assert_eq!(reread.len(), 2);
        assert_eq!(reread.rows()[0].device_id, "K1");
        assert_eq!(reread.rows()[0].reference_devices, vec!["K3", "K4"]);
        assert_eq!(reread.rows()[1].predicates, vec!["", ""]);
        assert_eq!(reread.device_ids().len(), 2);

        std::fs::remove_file(&path).ok();
    }

    #[test]
    fn unparsable_header_is_a_schema_mismatch() {
        let path = temp_csv("bad_header.csv");
        std::fs::write(&path, "Device,Code\nK1,ABC\n").unwrap();
        match OutputTable::read_csv(&path) {
            Err(ExtractError::MergeSchemaMismatch(_)) => {}
            other => panic!("expected MergeSchemaMismatch, got {other:?}"),
        }

        std::fs::write(
            &path,
            "K-number,Product Code,Predicate 1,Notes\nK1,ABC,K2,hello\n",
        )
        .unwrap();
        assert!(matches!(
            OutputTable::read_csv(&path),
            Err(ExtractError::MergeSchemaMismatch(_))
        ));

        std::fs::remove_file(&path).ok();
    }

    #[test]
    fn supplement_table_dedups_preserving_discovery_order() {
        let path = temp_csv("supplement.csv");
        let mut first = SupplementTable::default();
        first.push_unique("P170019/S003");
        first.push_unique("P170019/S010");
        first.write_csv(&path).unwrap();

        let mut second = SupplementTable::default();
        second.push_unique("P170019/S010"); // already known
        second.push_unique("K123456/S001");

        let existing = SupplementTable::read_csv(&path).unwrap();
        let merged = SupplementTable::merge(Some(existing), second);
        assert_eq!(
            merged.rows(),
            &[
                "P170019/S003".to_string(),
                "P170019/S010".to_string(),
                "K123456/S001".to_string()
            ]
        );

        std::fs::remove_file(&path).ok();
    }
}
