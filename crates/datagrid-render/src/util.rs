//! Text escaping helpers shared by the markup renderers.

/// Escapes text for HTML element content and attribute values.
///
/// ```rust
/// use datagrid_render::escape_html;
///
/// assert_eq!(escape_html("<a href=\"x\">&</a>"), "&lt;a href=&quot;x&quot;&gt;&amp;&lt;/a&gt;");
/// ```
pub fn escape_html(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    for c in text.chars() {
        match c {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            '\'' => out.push_str("&#39;"),
            other => out.push(other),
        }
    }
    out
}

/// Ensures a string is a valid XML element name.
///
/// XML names must start with a letter or underscore. Subsequent characters
/// may be letters, digits, hyphens, underscores, or periods. Invalid
/// characters are replaced with underscores.
pub fn sanitize_xml_name(name: &str) -> String {
    if name.is_empty() {
        return "_".to_string();
    }
    let mut result = String::with_capacity(name.len() + 1);
    for (i, c) in name.chars().enumerate() {
        if i == 0 {
            if c.is_ascii_alphabetic() || c == '_' {
                result.push(c);
            } else {
                result.push('_');
                if c.is_ascii_alphanumeric() {
                    result.push(c);
                }
            }
        } else if c.is_ascii_alphanumeric() || c == '_' || c == '-' || c == '.' {
            result.push(c);
        } else {
            result.push('_');
        }
    }
    result
}

/// Renders an attribute map as ` key="value"` pairs, escaped.
pub(crate) fn html_attributes<'a>(attrs: impl IntoIterator<Item = (&'a String, &'a String)>) -> String {
    attrs
        .into_iter()
        .map(|(k, v)| format!(" {}=\"{}\"", escape_html(k), escape_html(v)))
        .collect()
}
