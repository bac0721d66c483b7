//! Pure projection of session state into a display-ready table.
//!
//! Derivation is a function of (rows, columns, cells, search) and nothing
//! else. It never mutates the session and recomputes from scratch each
//! time, so it always reflects optimistic state the instant a mutation
//! lands.

use gridbase_model::{CellAddr, CellStore, CellValue, Column, RecordId, Row};

/// One visible row: identity plus every cell resolved against the visible
/// column order.
#[derive(Debug, Clone, PartialEq)]
pub struct ViewRow {
    pub id: RecordId,
    /// Dense position among *visible* rows, starting at zero. Filtering
    /// renumbers; this is not the row's stored order.
    pub display_index: usize,
    pub order: i64,
    pub provisional: bool,
    /// Parallel to [`TableView::columns`].
    pub values: Vec<CellValue>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct TableView {
    pub columns: Vec<Column>,
    pub rows: Vec<ViewRow>,
}

impl TableView {
    pub fn row_count(&self) -> usize {
        self.rows.len()
    }

    pub fn column_count(&self) -> usize {
        self.columns.len()
    }

    pub fn value_at(&self, row: usize, column: usize) -> Option<&CellValue> {
        self.rows.get(row)?.values.get(column)
    }
}

/// Build the view: columns sorted by order, rows sorted by order then
/// filtered against the search string (case-insensitive substring over the
/// display form of any cell in the row; whitespace-only search matches
/// everything).
pub fn derive(rows: &[Row], columns: &[Column], cells: &CellStore, search: &str) -> TableView {
    let mut visible_columns: Vec<Column> = columns.to_vec();
    visible_columns.sort_by_key(|c| c.order);

    let mut ordered_rows: Vec<&Row> = rows.iter().collect();
    ordered_rows.sort_by_key(|r| r.order);

    let needle = search.trim().to_lowercase();

    let mut view_rows = Vec::with_capacity(ordered_rows.len());
    for row in ordered_rows {
        let values: Vec<CellValue> = visible_columns
            .iter()
            .map(|column| cells.value(&CellAddr::new(row.id.clone(), column.id.clone())))
            .collect();

        if !needle.is_empty()
            && !values
                .iter()
                .any(|v| v.display().to_lowercase().contains(&needle))
        {
            continue;
        }

        view_rows.push(ViewRow {
            id: row.id.clone(),
            display_index: view_rows.len(),
            order: row.order,
            provisional: row.id.is_provisional(),
            values,
        });
    }

    TableView {
        columns: visible_columns,
        rows: view_rows,
    }
}
