//! Wrap a rendered HTML fragment in the print document shell.

/// Print-oriented base stylesheet. wkhtmltopdf uses an old QtWebKit, so this
/// sticks to CSS 2.1.
const BASE_CSS: &str = r#"
body {
    font-family: Arial, sans-serif;
    line-height: 1.6;
    margin: 2em;
}
code {
    background-color: #f4f4f4;
    padding: 2px 4px;
    border-radius: 4px;
}
pre {
    background-color: #f4f4f4;
    padding: 1em;
    border-radius: 4px;
    overflow-x: auto;
    white-space: pre-wrap;
}
pre code {
    padding: 0;
    background-color: transparent;
}
table {
    border-collapse: collapse;
    margin: 1em 0;
}
th, td {
    border: 1px solid #ddd;
    padding: 8px;
}
th {
    background-color: #f4f4f4;
}
tr, img, pre {
    page-break-inside: avoid;
}
"#;

/// Build a complete UTF-8 HTML document around `fragment`.
///
/// `highlight_css` is appended after the base stylesheet so theme colours
/// win over the generic `pre` background.
pub fn wrap_document(fragment: &str, highlight_css: &str) -> String {
    format!(
        r#"<!DOCTYPE html>
<html>
<head>
<meta charset="UTF-8">
<style>{BASE_CSS}
{highlight_css}</style>
</head>
<body>
{fragment}
</body>
</html>
"#
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn shell_declares_utf8_and_embeds_fragment() {
        let doc = wrap_document("<h1>Title</h1>", ".hl-comment { color: gray; }");
        assert!(doc.starts_with("<!DOCTYPE html>"));
        assert!(doc.contains(r#"<meta charset="UTF-8">"#));
        assert!(doc.contains("<body>\n<h1>Title</h1>\n</body>"));
        assert!(doc.contains("border-collapse: collapse"));
    }

    #[test]
    fn highlight_css_follows_base_css() {
        let doc = wrap_document("", ".hl-keyword { color: red; }");
        let base = doc.find("border-collapse").unwrap();
        let theme = doc.find(".hl-keyword").unwrap();
        assert!(theme > base);
    }
}
