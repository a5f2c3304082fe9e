//! Import configuration: the alias table and per-import options.
//!
//! The alias table is the only knob that changes how headers are matched.
//! It is passed explicitly into the resolver, so a table for another locale
//! can be loaded from JSON without touching the engine:
//!
//! ```json
//! {
//!   "name": ["producto", "nombre"],
//!   "expiry": ["caducidad", "vencimiento"]
//! }
//! ```
//!
//! Roles missing from the document keep the built-in synonyms.

use serde::{Deserialize, Serialize};
use std::fs;
use std::path::Path;

use crate::diagnostics::MAX_PREVIEW_ROWS;
use crate::error::{ConfigError, ConfigResult};
use crate::models::FieldRole;

/// Environment variable pointing at an alias table JSON file.
pub const ALIASES_ENV: &str = "SHELFLIFE_ALIASES";

// =============================================================================
// Alias table
// =============================================================================

/// Ordered synonym lists, one per [`FieldRole`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct AliasTable {
    pub name: Vec<String>,
    pub expiry: Vec<String>,
    pub category: Vec<String>,
    pub quantity: Vec<String>,
    pub location: Vec<String>,
    pub barcode: Vec<String>,
}

fn strings(items: &[&str]) -> Vec<String> {
    items.iter().map(|s| s.to_string()).collect()
}

impl Default for AliasTable {
    /// Portuguese and English synonyms seen in pantry, pharmacy and
    /// small-shop exports.
    fn default() -> Self {
        Self {
            name: strings(&[
                "produto",
                "nome",
                "nome do produto",
                "descricao",
                "item",
                "product",
                "name",
                "description",
            ]),
            expiry: strings(&[
                "validade",
                "data de validade",
                "vencimento",
                "data de vencimento",
                "venc",
                "expiry",
                "expiration",
                "expiry date",
                "best before",
                "data",
            ]),
            category: strings(&["categoria", "category", "tipo", "grupo", "secao"]),
            quantity: strings(&["quantidade", "qtd", "qtde", "quantity", "qty", "unidades"]),
            location: strings(&[
                "local",
                "localizacao",
                "location",
                "prateleira",
                "armazenamento",
                "setor",
            ]),
            barcode: strings(&[
                "codigo de barras",
                "cod barras",
                "barcode",
                "ean",
                "gtin",
                "sku",
            ]),
        }
    }
}

impl AliasTable {
    /// Synonyms for `role`, in priority order.
    pub fn aliases(&self, role: FieldRole) -> &[String] {
        match role {
            FieldRole::Name => &self.name,
            FieldRole::Expiry => &self.expiry,
            FieldRole::Category => &self.category,
            FieldRole::Quantity => &self.quantity,
            FieldRole::Location => &self.location,
            FieldRole::Barcode => &self.barcode,
        }
    }

    pub fn from_json_str(json: &str) -> ConfigResult<Self> {
        Ok(serde_json::from_str(json)?)
    }

    pub fn from_json_file(path: impl AsRef<Path>) -> ConfigResult<Self> {
        let path = path.as_ref();
        let content = fs::read_to_string(path).map_err(|source| ConfigError::Io {
            path: path.display().to_string(),
            source,
        })?;
        Self::from_json_str(&content)
    }

    pub fn to_json(&self) -> ConfigResult<String> {
        Ok(serde_json::to_string_pretty(self)?)
    }
}

/// Load the alias table for this process.
///
/// Priority: explicit path, then [`ALIASES_ENV`], then the built-in table.
pub fn load_alias_table(explicit: Option<&Path>) -> ConfigResult<AliasTable> {
    if let Some(path) = explicit {
        return AliasTable::from_json_file(path);
    }
    match std::env::var(ALIASES_ENV) {
        Ok(path) if !path.trim().is_empty() => AliasTable::from_json_file(path.trim()),
        _ => Ok(AliasTable::default()),
    }
}

// =============================================================================
// Import options
// =============================================================================

/// Options for a single import run.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ImportOptions {
    /// Physical rows above the first data row (the header line).
    pub header_offset: usize,

    /// Number of raw rows copied into the diagnostics preview.
    pub preview_rows: usize,
}

impl Default for ImportOptions {
    fn default() -> Self {
        Self {
            header_offset: 1,
            preview_rows: MAX_PREVIEW_ROWS,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use tempfile::NamedTempFile;

    #[test]
    fn test_default_options() {
        let opts = ImportOptions::default();
        assert_eq!(opts.header_offset, 1);
        assert_eq!(opts.preview_rows, 3);
    }

    #[test]
    fn test_default_table_covers_every_role() {
        let table = AliasTable::default();
        for role in FieldRole::ALL {
            assert!(!table.aliases(role).is_empty(), "no aliases for {}", role);
        }
    }

    #[test]
    fn test_partial_json_keeps_defaults() {
        let table = AliasTable::from_json_str(r#"{"expiry": ["caducidad"]}"#).unwrap();
        assert_eq!(table.expiry, vec!["caducidad"]);
        assert_eq!(table.name, AliasTable::default().name);
    }

    #[test]
    fn test_invalid_json() {
        let result = AliasTable::from_json_str("{ not json");
        assert!(matches!(result, Err(ConfigError::Json(_))));
    }

    #[test]
    fn test_load_from_explicit_file() {
        let mut file = NamedTempFile::new().unwrap();
        writeln!(file, r#"{{"name": ["producto"], "expiry": ["caducidad"]}}"#).unwrap();

        let table = load_alias_table(Some(file.path())).unwrap();
        assert_eq!(table.name, vec!["producto"]);
    }

    #[test]
    fn test_missing_file() {
        let result = AliasTable::from_json_file("/nonexistent/aliases.json");
        assert!(matches!(result, Err(ConfigError::Io { .. })));
    }
}
