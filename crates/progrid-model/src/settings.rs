use indexmap::IndexMap;
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Current settings document version.
///
/// Documents without a `settings_version` field are read as version 1.
pub const SETTINGS_VERSION: u32 = 1;

/// An RGBA color with components in `0.0..=1.0`.
pub type Rgba = [f32; 4];

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum Align {
    #[default]
    Left,
    Center,
    Right,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
pub enum SortDirection {
    #[default]
    #[serde(rename = "asc")]
    Ascending,
    #[serde(rename = "desc")]
    Descending,
}

/// A single sort rule: a column name paired with a direction.
///
/// Sort rules are stored as a list for forward compatibility with saved
/// documents, but the engine honors only the first rule.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SortRule {
    pub column: String,
    #[serde(default)]
    pub direction: SortDirection,
}

impl SortRule {
    pub fn ascending(column: impl Into<String>) -> Self {
        Self {
            column: column.into(),
            direction: SortDirection::Ascending,
        }
    }

    pub fn descending(column: impl Into<String>) -> Self {
        Self {
            column: column.into(),
            direction: SortDirection::Descending,
        }
    }
}

/// Cosmetic fields persisted on behalf of the host UI.
///
/// The engine stores and round-trips these verbatim; nothing in this
/// workspace interprets them.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AspectSettings {
    pub content_align: Align,
    pub header_align: Align,
    pub footer_text_halign: Align,
    pub text_color: Rgba,
    pub grid_color: Rgba,
    pub selection_color: Rgba,
    pub content_background_color: Rgba,
    pub header_background_color: Rgba,
    pub footer_background_color: Rgba,
}

impl Default for AspectSettings {
    fn default() -> Self {
        Self {
            content_align: Align::Left,
            header_align: Align::Left,
            footer_text_halign: Align::Right,
            text_color: [0.0, 0.0, 0.0, 0.9],
            grid_color: [0.93, 0.93, 0.93, 1.0],
            selection_color: [0.6, 0.6, 1.0, 1.0],
            content_background_color: [0.98, 0.98, 0.98, 1.0],
            header_background_color: [0.93, 0.93, 0.93, 1.0],
            footer_background_color: [0.93, 0.93, 0.93, 1.0],
        }
    }
}

/// The full persistable grid configuration.
///
/// Serialized as a single flat JSON object mapping field name to value; the
/// `aspect` fields are flattened into the top level so the on-disk shape
/// stays a plain dictionary.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct GridSettings {
    pub settings_version: u32,
    pub footer_text: String,
    pub data_len_limit: usize,
    pub text_no_data: String,

    // Metadata group.
    /// Display label for each column.
    pub headers: IndexMap<String, String>,
    /// Columns currently shown, in display order.
    pub columns: Vec<String>,
    /// Every available column, in canonical order.
    pub col_order: Vec<String>,

    // Filters group.
    /// Per-column filter expressions, exactly as the user entered them.
    pub row_filters: IndexMap<String, String>,
    pub row_sorting: Vec<SortRule>,

    // Aspect group.
    #[serde(flatten)]
    pub aspect: AspectSettings,
}

impl Default for GridSettings {
    fn default() -> Self {
        Self {
            settings_version: SETTINGS_VERSION,
            footer_text: String::new(),
            data_len_limit: 1000,
            text_no_data: "No data found.".to_string(),
            headers: IndexMap::new(),
            columns: Vec::new(),
            col_order: Vec::new(),
            row_filters: IndexMap::new(),
            row_sorting: Vec::new(),
            aspect: AspectSettings::default(),
        }
    }
}

/// Which field groups an export includes. Base fields are always written.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ExportOptions {
    pub metadata: bool,
    pub filters: bool,
    pub aspect: bool,
}

impl Default for ExportOptions {
    fn default() -> Self {
        Self {
            metadata: true,
            filters: true,
            aspect: true,
        }
    }
}

const METADATA_FIELDS: &[&str] = &["headers", "columns", "col_order"];

const FILTER_FIELDS: &[&str] = &["row_filters", "row_sorting"];

const ASPECT_FIELDS: &[&str] = &[
    "content_align",
    "header_align",
    "footer_text_halign",
    "text_color",
    "grid_color",
    "selection_color",
    "content_background_color",
    "header_background_color",
    "footer_background_color",
];

#[derive(Debug, Error)]
pub enum SettingsError {
    #[error("malformed settings document: {0}")]
    Malformed(#[from] serde_json::Error),
    #[error("settings version {found} is newer than supported version {supported}")]
    UnsupportedVersion { found: u32, supported: u32 },
}

impl GridSettings {
    /// Serialize to a flat JSON object, dropping the fields of any excluded
    /// group.
    pub fn to_json(&self, options: ExportOptions) -> Result<String, SettingsError> {
        let mut value = serde_json::to_value(self)?;
        if let serde_json::Value::Object(map) = &mut value {
            if !options.metadata {
                for field in METADATA_FIELDS {
                    map.remove(*field);
                }
            }
            if !options.filters {
                for field in FILTER_FIELDS {
                    map.remove(*field);
                }
            }
            if !options.aspect {
                for field in ASPECT_FIELDS {
                    map.remove(*field);
                }
            }
        }
        Ok(serde_json::to_string(&value)?)
    }

    /// Parse a settings document.
    ///
    /// Any subset of fields may be present; absent fields keep their
    /// defaults and unknown fields are ignored, so documents written by
    /// partial exports (see [`ExportOptions`]) load cleanly.
    pub fn from_json(text: &str) -> Result<Self, SettingsError> {
        let settings: GridSettings = serde_json::from_str(text)?;
        if settings.settings_version > SETTINGS_VERSION {
            return Err(SettingsError::UnsupportedVersion {
                found: settings.settings_version,
                supported: SETTINGS_VERSION,
            });
        }
        Ok(settings)
    }
}
