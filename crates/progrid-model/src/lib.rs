#![forbid(unsafe_code)]

//! Persistable state for ProGrid data grids.
//!
//! This crate holds everything about a grid that survives a session: header
//! labels, the visible-column and column-order lists, per-column row filter
//! expressions (stored as the raw text the user entered, never as compiled
//! predicates), sort rules, and a handful of cosmetic "aspect" fields that
//! hosts persist but the engine never interprets.
//!
//! The runtime counterpart lives in `progrid-engine`, which compiles the
//! filter expressions stored here into predicates and produces the actual
//! row ordering.

pub mod settings;

pub use settings::{
    Align, AspectSettings, ExportOptions, GridSettings, Rgba, SettingsError, SortDirection,
    SortRule, SETTINGS_VERSION,
};
