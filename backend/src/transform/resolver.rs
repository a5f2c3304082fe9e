//! Header alias resolution.
//!
//! Maps each [`FieldRole`] to one observed header. Every role is resolved
//! independently in two passes over the headers, in their original order:
//!
//! 1. exact: normalized header equals a normalized alias
//! 2. containment: normalized header contains a normalized alias
//!
//! The containment pass only runs when the exact pass found nothing, so an
//! exact match always wins even when a looser match appears further left.

use serde::Serialize;
use std::collections::BTreeMap;

use super::normalize::normalize;
use crate::config::AliasTable;
use crate::error::ImportError;
use crate::models::FieldRole;

/// Role → chosen header, as observed in the source (unmodified).
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(transparent)]
pub struct ColumnMap {
    bindings: BTreeMap<FieldRole, String>,
}

impl ColumnMap {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn bind(&mut self, role: FieldRole, header: impl Into<String>) {
        self.bindings.insert(role, header.into());
    }

    /// Header bound to `role`, if any.
    pub fn get(&self, role: FieldRole) -> Option<&str> {
        self.bindings.get(&role).map(String::as_str)
    }

    pub fn is_resolved(&self, role: FieldRole) -> bool {
        self.bindings.contains_key(&role)
    }

    /// Required roles with no bound header, in resolution order.
    pub fn missing_required(&self) -> Vec<FieldRole> {
        FieldRole::REQUIRED
            .iter()
            .copied()
            .filter(|r| !self.is_resolved(*r))
            .collect()
    }

    /// Fail with [`ImportError::MissingRequiredColumns`] unless every
    /// required role is bound.
    pub fn ensure_required(&self, headers: &[String]) -> Result<(), ImportError> {
        let missing = self.missing_required();
        if missing.is_empty() {
            Ok(())
        } else {
            Err(ImportError::MissingRequiredColumns {
                missing,
                found: headers.to_vec(),
            })
        }
    }

    /// Headers bound to more than one role, with the roles sharing them.
    pub fn shared_headers(&self) -> Vec<(&str, Vec<FieldRole>)> {
        let mut by_header: BTreeMap<&str, Vec<FieldRole>> = BTreeMap::new();
        for (role, header) in &self.bindings {
            by_header.entry(header.as_str()).or_default().push(*role);
        }
        by_header.into_iter().filter(|(_, roles)| roles.len() > 1).collect()
    }

    pub fn iter(&self) -> impl Iterator<Item = (FieldRole, &str)> {
        self.bindings.iter().map(|(r, h)| (*r, h.as_str()))
    }

    pub fn len(&self) -> usize {
        self.bindings.len()
    }

    pub fn is_empty(&self) -> bool {
        self.bindings.is_empty()
    }

    /// One-line description for the step log.
    pub fn describe(&self) -> String {
        FieldRole::ALL
            .iter()
            .map(|role| match self.get(*role) {
                Some(header) => format!("{} → \"{}\"", role, header),
                None => format!("{} → (not found)", role),
            })
            .collect::<Vec<_>>()
            .join(", ")
    }
}

/// Build the column map for `headers` using `aliases`.
pub fn resolve_columns(headers: &[String], aliases: &AliasTable) -> ColumnMap {
    let normalized: Vec<String> = headers.iter().map(|h| normalize(h)).collect();
    let mut map = ColumnMap::new();

    for role in FieldRole::ALL {
        let wanted: Vec<String> = aliases
            .aliases(role)
            .iter()
            .map(|a| normalize(a))
            .filter(|a| !a.is_empty())
            .collect();

        let found =
            find_exact(&normalized, &wanted).or_else(|| find_containing(&normalized, &wanted));
        if let Some(idx) = found {
            map.bind(role, headers[idx].clone());
        }
    }

    map
}

fn find_exact(headers: &[String], aliases: &[String]) -> Option<usize> {
    headers
        .iter()
        .position(|h| !h.is_empty() && aliases.iter().any(|a| a == h))
}

fn find_containing(headers: &[String], aliases: &[String]) -> Option<usize> {
    headers
        .iter()
        .position(|h| aliases.iter().any(|a| h.contains(a.as_str())))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn headers(items: &[&str]) -> Vec<String> {
        items.iter().map(|s| s.to_string()).collect()
    }

    #[test]
    fn test_basic_resolution() {
        let h = headers(&["Produto", "Validade", "Qtd", "Categoria"]);
        let map = resolve_columns(&h, &AliasTable::default());

        assert_eq!(map.get(FieldRole::Name), Some("Produto"));
        assert_eq!(map.get(FieldRole::Expiry), Some("Validade"));
        assert_eq!(map.get(FieldRole::Quantity), Some("Qtd"));
        assert_eq!(map.get(FieldRole::Category), Some("Categoria"));
        assert_eq!(map.get(FieldRole::Barcode), None);
        assert!(map.ensure_required(&h).is_ok());
    }

    #[test]
    fn test_case_and_diacritic_insensitive() {
        for header in ["Validade", "VALIDADE", "validáde"] {
            let h = headers(&["Produto", header]);
            let map = resolve_columns(&h, &AliasTable::default());
            assert_eq!(map.get(FieldRole::Expiry), Some(header));
        }
    }

    #[test]
    fn test_exact_outranks_containment() {
        let h = headers(&["Data de Fabricação", "Produto", "Validade"]);
        let map = resolve_columns(&h, &AliasTable::default());
        assert_eq!(map.get(FieldRole::Expiry), Some("Validade"));
    }

    #[test]
    fn test_containment_fallback_first_header_wins() {
        let h = headers(&["Nome", "Validade do lote", "Validade da caixa"]);
        let map = resolve_columns(&h, &AliasTable::default());
        assert_eq!(map.get(FieldRole::Expiry), Some("Validade do lote"));
    }

    #[test]
    fn test_empty_alias_never_matches() {
        let table = AliasTable {
            name: headers(&["produto"]),
            expiry: headers(&["---", ""]),
            ..AliasTable::default()
        };
        let h = headers(&["Produto", "Qualquer coisa"]);
        let map = resolve_columns(&h, &table);
        assert!(!map.is_resolved(FieldRole::Expiry));
    }

    #[test]
    fn test_missing_required_lists_headers() {
        let h = headers(&["Produto", "Preço"]);
        let map = resolve_columns(&h, &AliasTable::default());

        match map.ensure_required(&h) {
            Err(ImportError::MissingRequiredColumns { missing, found }) => {
                assert_eq!(missing, vec![FieldRole::Expiry]);
                assert_eq!(found, h);
            }
            other => panic!("expected missing columns, got {:?}", other),
        }
    }

    #[test]
    fn test_overlapping_aliases_are_reported() {
        let table = AliasTable {
            name: headers(&["item"]),
            barcode: headers(&["item"]),
            ..AliasTable::default()
        };
        let h = headers(&["Item", "Validade"]);
        let map = resolve_columns(&h, &table);

        assert_eq!(map.get(FieldRole::Name), Some("Item"));
        assert_eq!(map.get(FieldRole::Barcode), Some("Item"));
        let shared = map.shared_headers();
        assert_eq!(shared.len(), 1);
        assert_eq!(shared[0].0, "Item");
        assert_eq!(shared[0].1, vec![FieldRole::Name, FieldRole::Barcode]);
    }

    #[test]
    fn test_describe_mentions_every_role() {
        let h = headers(&["Produto", "Validade"]);
        let map = resolve_columns(&h, &AliasTable::default());
        let text = map.describe();
        assert!(text.contains("product name → \"Produto\""));
        assert!(text.contains("barcode → (not found)"));
    }
}
