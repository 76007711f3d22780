//! `${VAR}` and `${VAR:-fallback}` expansion for raw config text.

/// Expand `${VAR}` placeholders from the process environment.
///
/// `${VAR:-fallback}` uses `fallback` when `VAR` is unset or empty.
/// Placeholders that can't be resolved are kept verbatim.
pub fn substitute_env(input: &str) -> String {
    expand(input, |name| std::env::var(name).ok())
}

fn expand(input: &str, lookup: impl Fn(&str) -> Option<String>) -> String {
    let mut out = String::with_capacity(input.len());
    let mut rest = input;

    while let Some(start) = rest.find("${") {
        out.push_str(&rest[..start]);
        let after = &rest[start + 2..];

        let Some(end) = after.find('}') else {
            // Unterminated: copy the remainder untouched.
            out.push_str(&rest[start..]);
            return out;
        };

        let body = &after[..end];
        let (name, fallback) = match body.split_once(":-") {
            Some((name, fallback)) => (name, Some(fallback)),
            None => (body, None),
        };

        let value = if name.is_empty() {
            None
        } else {
            lookup(name).filter(|v| !v.is_empty() || fallback.is_none())
        };

        match (value, fallback) {
            (Some(v), _) => out.push_str(&v),
            (None, Some(fallback)) if !name.is_empty() => out.push_str(fallback),
            _ => out.push_str(&rest[start..start + 2 + end + 1]),
        }

        rest = &after[end + 1..];
    }

    out.push_str(rest);
    out
}
