//! Selector helpers for the site-owned DOM contract.

/// Placeholder replaced by the contact name in `contact_row`.
pub const NAME_PLACEHOLDER: &str = "{name}";

/// Escape a value for use inside a double-quoted CSS attribute string.
pub fn css_string_escape(value: &str) -> String {
    let mut out = String::with_capacity(value.len());
    for c in value.chars() {
        match c {
            '"' | '\\' => {
                out.push('\\');
                out.push(c);
            },
            // Newlines cannot appear raw in a CSS string.
            '\n' => out.push_str("\\a "),
            '\r' => out.push_str("\\d "),
            _ => out.push(c),
        }
    }
    out
}

/// Selector for the search result row of `name`.
pub fn contact_row(template: &str, name: &str) -> String {
    template.replace(NAME_PLACEHOLDER, &css_string_escape(name))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn plain_name() {
        assert_eq!(
            contact_row(r#"span[title="{name}"]"#, "Guilherme"),
            r#"span[title="Guilherme"]"#
        );
    }

    #[test]
    fn quotes_and_backslashes_are_escaped() {
        assert_eq!(
            contact_row(r#"span[title="{name}"]"#, r#"The "A" Team \o/"#),
            r#"span[title="The \"A\" Team \\o/"]"#
        );
    }

    #[test]
    fn emoji_and_accents_pass_through() {
        assert_eq!(css_string_escape("Família 🚀"), "Família 🚀");
        assert_eq!(css_string_escape("a\nb"), "a\\a b");
    }
}
