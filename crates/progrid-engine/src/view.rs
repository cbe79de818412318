//! The table view engine.
//!
//! [`Grid`] holds the full grid state and produces, on demand, the ordered
//! row sequence to display. Mutations batch freely through the setters;
//! the (potentially `O(n log n)`) pipeline runs only when the caller asks
//! for it via [`Grid::recompute`].

use indexmap::IndexMap;
use serde::{Deserialize, Serialize};
use thiserror::Error;

use progrid_model::{GridSettings, SortRule};

use crate::filter::{compile_filters, FilterCompileError, RowFilter};
use crate::sort::sort_rows;
use crate::value::{format_value, Row, Value};

/// Per-column data type for a render pass.
///
/// Inferred from a single sample (the first displayed row), not validated
/// against the rest; mixed-type columns coerce through the sampled type.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ColumnType {
    Text,
    Bool,
}

/// A cell coerced and formatted for display.
#[derive(Debug, Clone, PartialEq)]
pub enum CellRender {
    Text(String),
    Bool(bool),
}

/// One displayable row of the computed view.
#[derive(Debug, Clone, PartialEq)]
pub struct ViewRow {
    /// Zero-based position of this row in the caller-supplied input
    /// sequence, preserved through filtering and sorting.
    pub original_index: usize,
    /// The row payload.
    pub row: Row,
    /// Rendered cells, one per visible column, in column order.
    pub cells: Vec<CellRender>,
}

/// The computed view: what the caller lays out.
#[derive(Debug, Clone, PartialEq)]
pub struct ViewResult {
    pub rows: Vec<ViewRow>,
    /// Effective type of every header column (overrides first, then
    /// single-sample inference).
    pub coltypes: IndexMap<String, ColumnType>,
    /// When set there is nothing to lay out; show the no-data message
    /// instead. Not triggered by filtering down to zero rows.
    pub empty_state: bool,
}

/// The data feed exceeds the configured row limit. Fatal: no view is
/// produced. Raise the limit to bypass, and expect layout cost to grow
/// with it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
#[error("data feed has {actual} rows but data_len_limit is {limit}")]
pub struct TooMuchDataError {
    pub limit: usize,
    pub actual: usize,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum RowUpdateError {
    #[error("row {index} is out of bounds for a view of {len} rows")]
    OutOfBounds { index: usize, len: usize },
    #[error("no view has been computed yet")]
    NoView,
}

/// One entry of an end-user customization: whether the column is shown and
/// the filter expression typed for it (blank for none).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CustomizationEntry {
    pub column: String,
    pub selected: bool,
    pub expression: String,
}

/// The grid engine: rows, columns, filters, sort rule and the computed
/// view.
///
/// Single-threaded and single-writer by design; the caller owns the write
/// schedule and calls [`Grid::recompute`] after batching mutations.
#[derive(Debug)]
pub struct Grid {
    data: Vec<Row>,
    headers: IndexMap<String, String>,
    columns: Vec<String>,
    col_order: Vec<String>,
    row_filters: IndexMap<String, RowFilter>,
    row_sorting: Vec<SortRule>,
    data_len_limit: usize,
    coltype_overrides: IndexMap<String, ColumnType>,
    force_filtering: bool,
    text_no_data: String,
    footer_text: String,
    aspect: progrid_model::AspectSettings,
    view: Option<ViewResult>,
}

impl Default for Grid {
    fn default() -> Self {
        let defaults = GridSettings::default();
        Self {
            data: Vec::new(),
            headers: IndexMap::new(),
            columns: Vec::new(),
            col_order: Vec::new(),
            row_filters: IndexMap::new(),
            row_sorting: Vec::new(),
            data_len_limit: defaults.data_len_limit,
            coltype_overrides: IndexMap::new(),
            force_filtering: false,
            text_no_data: defaults.text_no_data,
            footer_text: defaults.footer_text,
            aspect: defaults.aspect,
            view: None,
        }
    }
}

impl Grid {
    pub fn new() -> Self {
        Self::default()
    }

    /// Replace the data feed wholesale. The previous view stays until the
    /// next [`Grid::recompute`].
    pub fn set_data(&mut self, data: Vec<Row>) {
        self.data = data;
    }

    pub fn set_headers(&mut self, headers: IndexMap<String, String>) {
        self.headers = headers;
    }

    /// Set the visible columns, in display order.
    pub fn set_columns(&mut self, columns: Vec<String>) {
        self.columns = columns;
    }

    /// Set the canonical order of all available columns. Defaults to the
    /// visible columns when left empty.
    pub fn set_col_order(&mut self, col_order: Vec<String>) {
        self.col_order = col_order;
    }

    /// Install pre-compiled filters wholesale.
    pub fn set_row_filters(&mut self, filters: IndexMap<String, RowFilter>) {
        self.row_filters = filters;
    }

    /// Compile and install per-column filter expressions.
    ///
    /// Replacement semantics with per-column error scoping: successfully
    /// compiled expressions are installed, blank expressions clear their
    /// column, and a column whose expression fails to compile keeps its
    /// previously installed filter. Returned errors name the column by its
    /// header label.
    pub fn set_filter_expressions<I, K, E>(&mut self, expressions: I) -> Vec<FilterCompileError>
    where
        I: IntoIterator<Item = (K, E)>,
        K: Into<String>,
        E: AsRef<str>,
    {
        let (mut filters, errors) = compile_filters(expressions);
        for error in &errors {
            if let Some(previous) = self.row_filters.get(&error.column) {
                filters.insert(error.column.clone(), previous.clone());
            }
        }
        self.row_filters = filters;
        self.labelled(errors)
    }

    pub fn set_row_sorting(&mut self, sorting: Vec<SortRule>) {
        self.row_sorting = sorting;
    }

    pub fn set_data_len_limit(&mut self, limit: usize) {
        self.data_len_limit = limit;
    }

    /// Force a column's type instead of inferring it from data.
    pub fn set_coltype(&mut self, column: impl Into<String>, coltype: ColumnType) {
        self.coltype_overrides.insert(column.into(), coltype);
    }

    /// When enabled, data is shown only once at least one filter is set.
    pub fn set_force_filtering(&mut self, force: bool) {
        self.force_filtering = force;
    }

    pub fn set_text_no_data(&mut self, text: impl Into<String>) {
        self.text_no_data = text.into();
    }

    pub fn set_footer_text(&mut self, text: impl Into<String>) {
        self.footer_text = text.into();
    }

    pub fn columns(&self) -> &[String] {
        &self.columns
    }

    pub fn row_filters(&self) -> &IndexMap<String, RowFilter> {
        &self.row_filters
    }

    /// The message to show when the view is in the empty state.
    pub fn text_no_data(&self) -> &str {
        &self.text_no_data
    }

    /// The last computed view, if any.
    pub fn view(&self) -> Option<&ViewResult> {
        self.view.as_ref()
    }

    /// Run the full pipeline: limit guard, original-index tagging,
    /// empty-state decision, filtering, sorting, type inference, cell
    /// rendering.
    pub fn recompute(&mut self) -> Result<&ViewResult, TooMuchDataError> {
        if self.data.len() > self.data_len_limit {
            return Err(TooMuchDataError {
                limit: self.data_len_limit,
                actual: self.data.len(),
            });
        }

        if self.col_order.is_empty() {
            self.col_order = self.columns.clone();
        }

        if self.show_no_data() {
            let coltypes = self.build_coltypes(None);
            return Ok(self.view.insert(ViewResult {
                rows: Vec::new(),
                coltypes,
                empty_state: true,
            }));
        }

        // Tag with the input position, then keep rows accepted by every
        // per-column predicate. Missing cells evaluate as empty text.
        let mut kept: Vec<ViewRow> = self
            .data
            .iter()
            .enumerate()
            .filter(|(_, row)| self.accepts(row))
            .map(|(original_index, row)| ViewRow {
                original_index,
                row: row.clone(),
                cells: Vec::new(),
            })
            .collect();

        if let Some(rule) = self.row_sorting.first() {
            sort_rows(&mut kept, rule);
        }

        let coltypes = self.build_coltypes(kept.first().map(|v| &v.row));

        for view_row in &mut kept {
            view_row.cells = render_cells(&view_row.row, &self.columns, &coltypes);
        }

        Ok(self.view.insert(ViewResult {
            rows: kept,
            coltypes,
            empty_state: false,
        }))
    }

    /// Replace the row at display position `rowid` and re-render only that
    /// slot.
    ///
    /// The backing data at index `rowid` is replaced as well, and the
    /// filters and sort rule are deliberately *not* re-applied: the new row
    /// keeps the old row's display position until the next full
    /// [`Grid::recompute`], even if it would now be filtered out or sorted
    /// elsewhere. Incremental-update behavior, documented trade-off.
    pub fn update_single_row(&mut self, rowid: usize, row: Row) -> Result<(), RowUpdateError> {
        let Some(view) = self.view.as_mut() else {
            return Err(RowUpdateError::NoView);
        };
        if rowid >= view.rows.len() {
            return Err(RowUpdateError::OutOfBounds {
                index: rowid,
                len: view.rows.len(),
            });
        }
        // The data feed may have been replaced since the view was computed.
        if rowid >= self.data.len() {
            return Err(RowUpdateError::OutOfBounds {
                index: rowid,
                len: self.data.len(),
            });
        }

        self.data[rowid] = row.clone();
        let cells = render_cells(&row, &self.columns, &view.coltypes);
        view.rows[rowid] = ViewRow {
            original_index: rowid,
            row,
            cells,
        };
        Ok(())
    }

    /// Build the per-column substring filters a grid-wide search installs:
    /// every listed column matches rows whose value contains `needle`.
    pub fn search_filters(
        needle: &str,
        columns: &[impl AsRef<str>],
    ) -> IndexMap<String, RowFilter> {
        columns
            .iter()
            .map(|column| (column.as_ref().to_string(), RowFilter::contains(needle)))
            .collect()
    }

    /// Apply an end-user customization: visible columns become the selected
    /// entries ordered by `col_order`, and filters are rebuilt from the
    /// entries' expressions with per-column error scoping (a failing
    /// column keeps its previously installed filter).
    pub fn apply_customization<I>(&mut self, entries: I) -> Vec<FilterCompileError>
    where
        I: IntoIterator<Item = CustomizationEntry>,
    {
        let entries: Vec<CustomizationEntry> = entries.into_iter().collect();

        let mut selected: Vec<String> = entries
            .iter()
            .filter(|e| e.selected)
            .map(|e| e.column.clone())
            .collect();
        // Unknown columns keep their relative order after the known ones.
        selected.sort_by_key(|c| self.order_of(c));
        self.columns = selected;

        self.set_filter_expressions(
            entries
                .into_iter()
                .map(|e| (e.column, e.expression)),
        )
    }

    /// Import persisted settings. Filter expressions are recompiled with
    /// the usual per-column error scoping; everything else is copied.
    pub fn apply_settings(&mut self, settings: &GridSettings) -> Vec<FilterCompileError> {
        self.headers = settings.headers.clone();
        self.columns = settings.columns.clone();
        self.col_order = settings.col_order.clone();
        self.row_sorting = settings.row_sorting.clone();
        self.data_len_limit = settings.data_len_limit;
        self.text_no_data = settings.text_no_data.clone();
        self.footer_text = settings.footer_text.clone();
        self.aspect = settings.aspect.clone();
        self.set_filter_expressions(
            settings
                .row_filters
                .iter()
                .map(|(column, expression)| (column.clone(), expression.clone())),
        )
    }

    /// Export the current state as a persistable settings document.
    /// Installed filters are echoed back as their source expressions.
    pub fn settings(&self) -> GridSettings {
        GridSettings {
            footer_text: self.footer_text.clone(),
            data_len_limit: self.data_len_limit,
            text_no_data: self.text_no_data.clone(),
            headers: self.headers.clone(),
            columns: self.columns.clone(),
            col_order: self.col_order.clone(),
            row_filters: self
                .row_filters
                .iter()
                .map(|(column, filter)| (column.clone(), filter.source().to_string()))
                .collect(),
            row_sorting: self.row_sorting.clone(),
            aspect: self.aspect.clone(),
            ..GridSettings::default()
        }
    }

    fn show_no_data(&self) -> bool {
        let filters_not_ok = self.force_filtering && self.row_filters.is_empty();
        filters_not_ok || self.data.is_empty()
    }

    fn accepts(&self, row: &Row) -> bool {
        self.row_filters.iter().all(|(column, filter)| {
            let formatted = row.get(column).map(format_value).unwrap_or_default();
            filter.matches_formatted(&formatted)
        })
    }

    /// Overrides win; every other header column is inferred from the first
    /// displayed row (no rows: text).
    fn build_coltypes(&self, first_row: Option<&Row>) -> IndexMap<String, ColumnType> {
        let mut coltypes = self.coltype_overrides.clone();
        for column in self.headers.keys() {
            if coltypes.contains_key(column) {
                continue;
            }
            let inferred = match first_row.and_then(|row| row.get(column)) {
                Some(Value::Bool(_)) => ColumnType::Bool,
                _ => ColumnType::Text,
            };
            coltypes.insert(column.clone(), inferred);
        }
        coltypes
    }

    fn order_of(&self, column: &str) -> usize {
        self.col_order
            .iter()
            .position(|c| c == column)
            .unwrap_or(self.col_order.len())
    }

    /// Rewrite compile errors to name columns by their header label.
    fn labelled(&self, errors: Vec<FilterCompileError>) -> Vec<FilterCompileError> {
        errors
            .into_iter()
            .map(|mut error| {
                if let Some(label) = self.headers.get(&error.column) {
                    error.column = label.clone();
                }
                error
            })
            .collect()
    }
}

fn render_cells(row: &Row, columns: &[String], coltypes: &IndexMap<String, ColumnType>) -> Vec<CellRender> {
    columns
        .iter()
        .map(|column| render_cell(row.get(column), coltypes.get(column)))
        .collect()
}

fn render_cell(value: Option<&Value>, coltype: Option<&ColumnType>) -> CellRender {
    match coltype {
        Some(ColumnType::Bool) => CellRender::Bool(match value {
            Some(Value::Bool(b)) => *b,
            Some(Value::Number(n)) => *n != 0.0,
            Some(Value::Text(s)) => !s.is_empty(),
            None => false,
        }),
        _ => {
            let text = value.map(Value::display_text).unwrap_or_default();
            // Placeholder nulls from loosely-typed feeds render as blanks.
            if text == "None" {
                CellRender::Text(String::new())
            } else {
                CellRender::Text(text)
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn row(pairs: &[(&str, &str)]) -> Row {
        pairs.iter().map(|(k, v)| (*k, Value::from(*v))).collect()
    }

    fn grid_with(data: Vec<Row>) -> Grid {
        let mut grid = Grid::new();
        grid.set_headers(IndexMap::from([
            ("name".to_string(), "Name".to_string()),
            ("age".to_string(), "Age".to_string()),
        ]));
        grid.set_columns(vec!["name".to_string(), "age".to_string()]);
        grid.set_data(data);
        grid
    }

    #[test]
    fn limit_violation_is_fatal_and_carries_both_numbers() {
        let mut grid = grid_with(vec![row(&[("name", "a")]), row(&[("name", "b")])]);
        grid.set_data_len_limit(1);
        assert_eq!(
            grid.recompute().unwrap_err(),
            TooMuchDataError { limit: 1, actual: 2 }
        );
        assert!(grid.view().is_none());
    }

    #[test]
    fn col_order_defaults_to_visible_columns() {
        let mut grid = grid_with(vec![row(&[("name", "a")])]);
        grid.recompute().unwrap();
        let exported = grid.settings();
        assert_eq!(exported.col_order, vec!["name", "age"]);
    }

    #[test]
    fn coltypes_infer_bool_from_first_displayed_row() {
        let mut grid = grid_with(vec![Row::from_iter([
            ("name", Value::from("Mario")),
            ("age", Value::from(true)),
        ])]);
        let view = grid.recompute().unwrap();
        assert_eq!(view.coltypes["age"], ColumnType::Bool);
        assert_eq!(view.coltypes["name"], ColumnType::Text);
        assert_eq!(view.rows[0].cells[1], CellRender::Bool(true));
    }

    #[test]
    fn coltype_overrides_win_over_inference() {
        let mut grid = grid_with(vec![row(&[("name", "Mario"), ("age", "34")])]);
        grid.set_coltype("age", ColumnType::Bool);
        let view = grid.recompute().unwrap();
        assert_eq!(view.coltypes["age"], ColumnType::Bool);
        // Non-empty text is truthy.
        assert_eq!(view.rows[0].cells[1], CellRender::Bool(true));
    }

    #[test]
    fn none_text_renders_blank() {
        let mut grid = grid_with(vec![row(&[("name", "None"), ("age", "1")])]);
        let view = grid.recompute().unwrap();
        assert_eq!(view.rows[0].cells[0], CellRender::Text(String::new()));
    }

    #[test]
    fn failing_expression_keeps_previous_filter_for_that_column() {
        let mut grid = grid_with(vec![
            row(&[("name", "Mario"), ("age", "15")]),
            row(&[("name", "Luigi"), ("age", "10")]),
        ]);
        let errors = grid.set_filter_expressions([("age", "> 14")]);
        assert!(errors.is_empty());

        let errors = grid.set_filter_expressions([("age", "=> 20"), ("name", "mario")]);
        assert_eq!(errors.len(), 1);
        // Errors name the header label, not the column key.
        assert_eq!(errors[0].column, "Age");
        // The previous `> 14` stays installed next to the new name filter.
        assert_eq!(grid.row_filters()["age"].source(), "> 14");
        assert_eq!(grid.row_filters()["name"].source(), "mario");
    }

    #[test]
    fn customization_orders_selected_columns_by_col_order() {
        let mut grid = grid_with(vec![row(&[("name", "Mario"), ("age", "34")])]);
        grid.set_col_order(vec!["age".to_string(), "name".to_string()]);
        let errors = grid.apply_customization([
            CustomizationEntry {
                column: "name".to_string(),
                selected: true,
                expression: String::new(),
            },
            CustomizationEntry {
                column: "age".to_string(),
                selected: true,
                expression: "> 14".to_string(),
            },
        ]);
        assert!(errors.is_empty());
        assert_eq!(grid.columns(), ["age", "name"]);
        assert_eq!(grid.row_filters()["age"].source(), "> 14");
    }
}
