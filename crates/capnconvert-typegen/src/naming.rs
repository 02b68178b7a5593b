//! Identifier conventions for the emitted schema.
//!
//! Cap'n Proto wants lower-leading identifiers for fields, methods and
//! parameters; type names keep their Go spelling.

/// Convert a Go field/method/parameter name to a schema member name.
///
/// An all-upper-case identifier is treated as an acronym and lower-cased
/// wholesale (`ID` -> `id`); anything else only has its first character
/// lower-cased (`UserName` -> `userName`, `HTTPServer` -> `hTTPServer`).
pub fn to_field_name(s: &str) -> String {
    if s.is_empty() {
        return String::new();
    }
    if s.to_uppercase() == s {
        return s.to_lowercase();
    }
    let mut chars = s.chars();
    match chars.next() {
        Some(first) => first.to_lowercase().chain(chars).collect(),
        None => String::new(),
    }
}

/// Drop the package prefix of a qualified reference (`mypkg.Item` -> `Item`).
pub fn flatten(qualified: &str) -> &str {
    match qualified.rsplit_once('.') {
        Some((_, name)) => name,
        None => qualified,
    }
}

/// Synthesized name for the `index`-th result of a method.
pub fn result_name(index: usize) -> String {
    format!("result{index}")
}

/// Synthesized name for an unnamed parameter at `index`.
pub fn param_name(index: usize) -> String {
    format!("param{index}")
}
