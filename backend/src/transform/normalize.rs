//! Text canonicalization for header matching.

use unicode_normalization::char::is_combining_mark;
use unicode_normalization::UnicodeNormalization;

/// Canonical form used to compare headers and aliases.
///
/// Lower-cases, decomposes (NFD) and drops diacritical marks, then keeps only
/// ASCII letters and digits. `"Data de Validade"`, `"DATA_DE_VALIDADE"` and
/// `"data de validáde"` all become `"datadevalidade"`.
pub fn normalize(text: &str) -> String {
    text.nfd()
        .filter(|c| !is_combining_mark(*c))
        .flat_map(char::to_lowercase)
        .filter(char::is_ascii_alphanumeric)
        .collect::<String>()
        .trim()
        .to_string()
}
