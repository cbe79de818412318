//! Row ordering.

use progrid_model::{SortDirection, SortRule};

use crate::value::{compare_values, Value};
use crate::view::ViewRow;

/// Stable-sort view rows by the rule's column.
///
/// `Descending` reverses the comparison, not the rows, so rows with equal
/// keys keep their post-filter relative order either way.
pub(crate) fn sort_rows(rows: &mut [ViewRow], rule: &SortRule) {
    rows.sort_by(|a, b| {
        let left = a.row.get(&rule.column);
        let right = b.row.get(&rule.column);
        let ordering = match (left, right) {
            (Some(l), Some(r)) => compare_values(l, r),
            (Some(l), None) => compare_values(l, &empty()),
            (None, Some(r)) => compare_values(&empty(), r),
            (None, None) => std::cmp::Ordering::Equal,
        };
        match rule.direction {
            SortDirection::Ascending => ordering,
            SortDirection::Descending => ordering.reverse(),
        }
    });
}

// Rows lacking the sort column sort as empty text (after all numeric
// values), matching the engine-wide missing-cell coercion.
fn empty() -> Value {
    Value::Text(String::new())
}
