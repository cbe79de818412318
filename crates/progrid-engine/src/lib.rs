#![forbid(unsafe_code)]
#![deny(unreachable_patterns)]

//! Tabular filter/sort engine and ad-hoc predicate compiler for ProGrid.
//!
//! Data flows top to bottom through two components:
//!
//! - [`filter`] compiles a short end-user filter expression into a
//!   [`RowFilter`] — a callable predicate over a single (normalized) field
//!   value. Three expression forms are supported: comparator expressions
//!   (`"> 14"`), placeholder expressions (`"$VAL.startswith('m')"`) and
//!   plain literal matches (`"mario"`). Expressions are parsed into a typed
//!   AST and interpreted directly; no dynamic code evaluation exists.
//! - [`view`] holds the grid state ([`Grid`]) and produces the row ordering
//!   to display: per-column predicates combined with AND semantics, a
//!   single stable sort rule, per-column type inference from the first
//!   displayed row, and a bounded data-size guard.
//!
//! The engine is single-threaded and single-writer: mutations batch freely
//! through `&mut self` setters and nothing recomputes until
//! [`Grid::recompute`] is called. The one exception is
//! [`Grid::update_single_row`], which patches a single display slot in
//! place and intentionally leaves it in its old filter/sort position until
//! the next full recompute.
//!
//! Persistable state (filter expressions, sort rules, column layout) lives
//! in `progrid-model`; [`Grid::apply_settings`] and [`Grid::settings`]
//! bridge the two.

pub mod filter;
mod sort;
pub mod value;
pub mod view;

pub use filter::{
    compile_filter, compile_filters, FilterCompileError, ParseError, RowFilter, Span,
};
pub use value::{compare_values, format_value, Row, Value};
pub use view::{
    CellRender, ColumnType, CustomizationEntry, Grid, RowUpdateError, TooMuchDataError, ViewResult,
    ViewRow,
};
