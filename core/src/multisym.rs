//! Dotted and colon-separated symbol names.
//!
//! `a.b.c` is a field path and `a.b:c` a method call on `a.b`. Anything
//! malformed is simply not a multi-symbol, and callers treat it as a plain
//! name.

/// A symbol name split into its path segments.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MultiSym {
    pub parts: Vec<String>,
    /// The last segment was introduced by `:`.
    pub method_call: bool,
}

fn is_separator(c: char) -> bool {
    c == '.' || c == ':'
}

/// Split `name` on `.` and `:`.
///
/// Returns `None` when the name has no separator, starts or ends with one,
/// contains two in a row, or uses `:` anywhere but before the last segment.
pub fn multi_sym(name: &str) -> Option<MultiSym> {
    if !name.contains(is_separator) || name.starts_with(is_separator) || name.ends_with(is_separator)
    {
        return None;
    }

    let mut parts = Vec::new();
    let mut method_call = false;
    let mut segment_start = 0;
    for (i, c) in name.char_indices() {
        if !is_separator(c) {
            continue;
        }
        if method_call {
            // A `:` was already seen and another segment follows it.
            return None;
        }
        let segment = &name[segment_start..i];
        if segment.is_empty() {
            return None;
        }
        parts.push(segment.to_string());
        method_call = c == ':';
        segment_start = i + c.len_utf8();
    }
    parts.push(name[segment_start..].to_string());

    Some(MultiSym { parts, method_call })
}
