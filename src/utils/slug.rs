/// Derive a URL-safe slug from a title or name.
///
/// Lowercases, drops everything outside ASCII alphanumerics, underscores,
/// hyphens and whitespace, then collapses whitespace/hyphen runs into single
/// hyphens and trims them from both ends. Applying it to its own output is a
/// no-op, so stored slugs can be re-slugged safely.
pub fn slugify(text: &str) -> String {
    let mut slug = String::with_capacity(text.len());
    let mut pending_separator = false;

    for c in text.chars() {
        if c.is_ascii_alphanumeric() || c == '_' {
            if pending_separator && !slug.is_empty() {
                slug.push('-');
            }
            pending_separator = false;
            slug.push(c.to_ascii_lowercase());
        } else if c.is_whitespace() || c == '-' {
            pending_separator = true;
        }
        // Any other character is dropped without forcing a separator.
    }

    slug
}
