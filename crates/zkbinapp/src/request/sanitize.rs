//! Per-field sanitizers for query parameters and request metadata.
//!
//! Two flavors, matching the semantic type of the field:
//!
//! - [`special_chars`] for free text and identifiers: HTML-significant
//!   characters and ASCII control characters become numeric entities.
//! - [`url`] for links: every character outside the URL allow-list is dropped.

/// Characters besides ASCII alphanumerics that survive [`url`].
const URL_ALLOWED: &str = "$-_.+!*'(),{}|\\^~[]`<>#%\";/?:@&=";

/// Encodes `"`, `'`, `<`, `>`, `&` and ASCII control characters as numeric
/// HTML entities (`<` becomes `&#60;`). Everything else is kept.
pub fn special_chars(input: &str) -> String {
    let mut out = String::with_capacity(input.len());
    for c in input.chars() {
        match c {
            '"' | '\'' | '<' | '>' | '&' => out.push_str(&format!("&#{};", c as u32)),
            c if (c as u32) < 32 => out.push_str(&format!("&#{};", c as u32)),
            c => out.push(c),
        }
    }
    out
}

/// Drops every character that cannot appear in a URL.
pub fn url(input: &str) -> String {
    input
        .chars()
        .filter(|c| c.is_ascii_alphanumeric() || URL_ALLOWED.contains(*c))
        .collect()
}
