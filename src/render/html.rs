// Self-contained HTML pages: escaping, JSON data islands, the page shell.

use anyhow::{Context, Result};
use serde::Serialize;

/// Escape text for HTML element content and attribute values.
pub fn escape(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    for c in text.chars() {
        match c {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            '\'' => out.push_str("&#39;"),
            _ => out.push(c),
        }
    }
    out
}

/// Serialize `value` for a `<script type="application/json">` block.
///
/// `<`, `>` and `&` only occur inside JSON strings, so they are rewritten as
/// unicode escapes. `JSON.parse` restores them and no markup survives in the
/// script data.
pub fn json_island<T: Serialize>(id: &str, value: &T) -> Result<String> {
    let json = serde_json::to_string(value).context("Failed to serialize plot data")?;
    let mut safe = String::with_capacity(json.len());
    for c in json.chars() {
        match c {
            '<' => safe.push_str("\\u003c"),
            '>' => safe.push_str("\\u003e"),
            '&' => safe.push_str("\\u0026"),
            _ => safe.push(c),
        }
    }
    Ok(format!(
        r#"<script type="application/json" id="{}">{}</script>"#,
        escape(id),
        safe
    ))
}

/// Wrap body markup and an inline script in a complete page.
pub fn page(title: &str, body: &str, script: &str) -> String {
    format!(
        r#"<!DOCTYPE html>
<html>
<head>
    <meta charset="utf-8">
    <title>{title}</title>
    <style>
        body {{ font-family: sans-serif; margin: 20px; color: #2a3f5f; }}
        h1 {{ font-size: 20px; font-weight: normal; }}
        .container {{ display: flex; gap: 16px; align-items: flex-start; }}
        svg {{ max-width: 100%; height: auto; background: #fff; }}
        .legend {{ list-style: none; padding: 0; margin: 0; font-size: 13px; }}
        .legend li {{ cursor: pointer; padding: 2px 4px; }}
        .legend li.off {{ opacity: 0.35; }}
        .swatch {{ display: inline-block; width: 10px; height: 10px; margin-right: 6px; border-radius: 50%; }}
        #info {{ min-height: 3em; font-size: 13px; padding: 6px; border-top: 1px solid #e5ecf6; }}
    </style>
</head>
<body>
    <h1>{title}</h1>
{body}
    <div id="info"></div>
    <script>
{script}
    </script>
</body>
</html>
"#,
        title = escape(title),
    )
}
