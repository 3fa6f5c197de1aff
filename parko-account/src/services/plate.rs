//! Plate-number normalization and pattern-filter escaping.

/// Plates shorter than this never hit the database.
pub const MIN_PLATE_QUERY_LEN: usize = 3;

/// Canonical form used both at registration and at lookup: trimmed,
/// uppercased, inner whitespace and dashes removed.
pub fn normalize_plate(raw: &str) -> String {
    raw.trim()
        .chars()
        .filter(|c| !c.is_whitespace() && *c != '-')
        .collect::<String>()
        .to_uppercase()
}

/// Escape `\`, `%` and `_` so user input cannot inject wildcards into
/// an ILIKE filter. Backslash first, since it is the escape character.
pub fn escape_like(input: &str) -> String {
    let mut out = String::with_capacity(input.len());
    for c in input.chars() {
        match c {
            '\\' => out.push_str("\\\\"),
            '%' => out.push_str("\\%"),
            '_' => out.push_str("\\_"),
            _ => out.push(c),
        }
    }
    out
}

/// Normalize a lookup query; `None` when it is too short to search.
pub fn lookup_pattern(raw: &str) -> Option<String> {
    let normalized = normalize_plate(raw);
    if normalized.len() < MIN_PLATE_QUERY_LEN {
        return None;
    }
    Some(escape_like(&normalized))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn normalizes_case_and_separators() {
        assert_eq!(normalize_plate("  ca 1234 bc "), "CA1234BC");
        assert_eq!(normalize_plate("ca-1234-bc"), "CA1234BC");
    }

    #[test]
    fn escapes_wildcards() {
        assert_eq!(escape_like("AB%12"), "AB\\%12");
        assert_eq!(escape_like("AB_12"), "AB\\_12");
        assert_eq!(escape_like("AB\\12"), "AB\\\\12");
        assert_eq!(escape_like("%_\\"), "\\%\\_\\\\");
        assert_eq!(escape_like("CA1234BC"), "CA1234BC");
    }

    #[test]
    fn short_queries_are_rejected() {
        assert_eq!(lookup_pattern(""), None);
        assert_eq!(lookup_pattern("  "), None);
        assert_eq!(lookup_pattern("ab"), None);
        assert_eq!(lookup_pattern("a-b"), None); // "AB" after normalization
        assert_eq!(lookup_pattern("ab1"), Some("AB1".to_string()));
    }
}
