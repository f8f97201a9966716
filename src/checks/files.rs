//! File checks shared by every platform comparator.

use std::path::Path;

/// Existence truth table. Penalty entries invert the verdict so the
/// comparator reports "penalty condition is active".
///
/// A present file with `should_exist = false` on a penalty entry is therefore
/// a match; see decision 3 in DESIGN.md.
pub fn existence_matches(exists: bool, should_exist: bool, is_penalty: bool) -> bool {
    (exists == should_exist) != is_penalty
}

/// Whether `path` currently exists. Unreadable parents count as absent.
pub fn file_exists(path: &Path) -> bool {
    match path.try_exists() {
        Ok(exists) => exists,
        Err(e) => {
            tracing::warn!(path = %path.display(), error = %e, "cannot stat file, treating as absent");
            false
        }
    }
}

/// True when `path` is a file containing every expected substring.
pub fn contains_all(path: &Path, expected: &[String]) -> bool {
    if !path.is_file() {
        return false;
    }

    let bytes = match std::fs::read(path) {
        Ok(bytes) => bytes,
        Err(e) => {
            tracing::warn!(path = %path.display(), error = %e, "cannot read file, treating as non-match");
            return false;
        }
    };
    let text = String::from_utf8_lossy(&bytes);

    expected.iter().all(|needle| text.contains(needle.as_str()))
}

/// Expand `%VAR%` references. Unknown variables are left as written.
pub fn expand_percent_vars(raw: &str, lookup: impl Fn(&str) -> Option<String>) -> String {
    let mut out = String::with_capacity(raw.len());
    let mut rest = raw;

    while let Some(start) = rest.find('%') {
        out.push_str(&rest[..start]);
        let after = &rest[start + 1..];
        match after.find('%') {
            Some(end) if end > 0 => {
                let name = &after[..end];
                match lookup(name) {
                    Some(value) => out.push_str(&value),
                    None => {
                        out.push('%');
                        out.push_str(name);
                        out.push('%');
                    }
                }
                rest = &after[end + 1..];
            }
            _ => {
                out.push('%');
                rest = after;
            }
        }
    }
    out.push_str(rest);
    out
}

/// Expand a leading `~` to `home` plus `$VAR` and `${VAR}` references.
pub fn expand_shell_vars(
    raw: &str,
    home: Option<&Path>,
    lookup: impl Fn(&str) -> Option<String>,
) -> String {
    let mut out = String::with_capacity(raw.len());
    let mut rest = raw;

    if rest == "~" || rest.starts_with("~/") {
        if let Some(home) = home {
            out.push_str(&home.to_string_lossy());
            rest = &rest[1..];
        }
    }

    while let Some(start) = rest.find('$') {
        out.push_str(&rest[..start]);
        let after = &rest[start + 1..];

        let (name, consumed) = if let Some(inner) = after.strip_prefix('{') {
            match inner.find('}') {
                Some(end) => (&inner[..end], end + 2),
                None => ("", 0),
            }
        } else {
            let end = after
                .find(|c: char| !(c.is_ascii_alphanumeric() || c == '_'))
                .unwrap_or(after.len());
            (&after[..end], end)
        };

        if name.is_empty() {
            out.push('$');
            rest = after;
            continue;
        }

        match lookup(name) {
            Some(value) => out.push_str(&value),
            None => {
                out.push('$');
                out.push_str(&after[..consumed]);
            }
        }
        rest = &after[consumed..];
    }
    out.push_str(rest);
    out
}
