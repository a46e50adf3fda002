//! Markdown → HTML fragment, with syntax-highlighted code blocks.
//!
//! pulldown-cmark does the parsing with GFM tables enabled; fenced code is
//! part of CommonMark. Code blocks are intercepted before HTML emission and
//! replaced by syntect's class-based output, so the colours live in one
//! stylesheet ([`highlight_css`]) rather than being inlined on every span.
//!
//! Both syntect sets are loaded once per process: deserialising the bundled
//! syntaxes takes tens of milliseconds, far too slow to repeat per request.

use crate::error::ConversionError;
use once_cell::sync::Lazy;
use pulldown_cmark::{html, CodeBlockKind, CowStr, Event, Options, Parser, Tag, TagEnd};
use syntect::highlighting::ThemeSet;
use syntect::html::{css_for_theme_with_class_style, ClassStyle, ClassedHTMLGenerator};
use syntect::parsing::SyntaxSet;
use syntect::util::LinesWithEndings;

static SYNTAX_SET: Lazy<SyntaxSet> = Lazy::new(SyntaxSet::load_defaults_newlines);
static THEME_SET: Lazy<ThemeSet> = Lazy::new(ThemeSet::load_defaults);

/// Prefix keeps highlight classes from colliding with the page's own CSS.
const CLASS_STYLE: ClassStyle = ClassStyle::SpacedPrefixed { prefix: "hl-" };

/// Render Markdown to an HTML fragment (no `<html>`/`<body>` wrapper).
pub fn markdown_to_html(markdown: &str) -> Result<String, ConversionError> {
    let mut options = Options::empty();
    options.insert(Options::ENABLE_TABLES);

    let parser = Parser::new_ext(markdown, options);

    let mut events: Vec<Event<'_>> = Vec::new();
    // (language, accumulated source) while inside a code block
    let mut code_block: Option<(Option<String>, String)> = None;

    for event in parser {
        match event {
            Event::Start(Tag::CodeBlock(kind)) => {
                let language = match kind {
                    CodeBlockKind::Fenced(info) => info
                        .split_whitespace()
                        .next()
                        .filter(|l| !l.is_empty())
                        .map(str::to_string),
                    CodeBlockKind::Indented => None,
                };
                code_block = Some((language, String::new()));
            }
            Event::Text(text) if code_block.is_some() => {
                if let Some((_, source)) = code_block.as_mut() {
                    source.push_str(&text);
                }
            }
            Event::End(TagEnd::CodeBlock) => {
                if let Some((language, source)) = code_block.take() {
                    let highlighted = highlight_block(language.as_deref(), &source)?;
                    events.push(Event::Html(CowStr::from(highlighted)));
                }
            }
            other => events.push(other),
        }
    }

    let mut out = String::with_capacity(markdown.len() * 3 / 2);
    html::push_html(&mut out, events.into_iter());
    Ok(out)
}

/// Highlight one code block. Unknown languages fall back to plain text.
fn highlight_block(language: Option<&str>, source: &str) -> Result<String, ConversionError> {
    let ss = &*SYNTAX_SET;
    let syntax = language
        .and_then(|l| ss.find_syntax_by_token(l))
        .unwrap_or_else(|| ss.find_syntax_plain_text());

    let mut generator = ClassedHTMLGenerator::new_with_class_style(syntax, ss, CLASS_STYLE);
    for line in LinesWithEndings::from(source) {
        generator
            .parse_html_for_line_which_includes_newline(line)
            .map_err(|e| {
                ConversionError::Markdown(format!("highlighting {} block: {e}", syntax.name))
            })?;
    }
    let body = generator.finalize();

    let class_attr = match language {
        Some(l) => format!(
            " class=\"language-{}\"",
            html_escape::encode_double_quoted_attribute(l)
        ),
        None => String::new(),
    };

    Ok(format!(
        "<div class=\"codehilite\"><pre><code{class_attr}>{body}</code></pre></div>\n"
    ))
}

/// Stylesheet for the highlight classes emitted by [`markdown_to_html`].
pub fn highlight_css(theme_name: &str) -> Result<String, ConversionError> {
    let theme = THEME_SET
        .themes
        .get(theme_name)
        .ok_or_else(|| {
            ConversionError::InvalidConfig(format!("Unknown highlight theme '{theme_name}'"))
        })?;
    css_for_theme_with_class_style(theme, CLASS_STYLE)
        .map_err(|e| ConversionError::Markdown(format!("theme '{theme_name}' stylesheet: {e}")))
}

/// Whether syntect ships a theme with this name.
pub fn theme_exists(name: &str) -> bool {
    THEME_SET.themes.contains_key(name)
}

/// Bundled theme names, sorted.
pub fn theme_names() -> Vec<&'static str> {
    let set: &'static ThemeSet = &THEME_SET;
    let mut names: Vec<&'static str> = set.themes.keys().map(String::as_str).collect();
    names.sort_unstable();
    names
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn heading_and_emphasis() {
        let html = markdown_to_html("# Hello World\n\nThis is **bold** and *italic*.").unwrap();
        assert!(html.contains("<h1>Hello World</h1>"), "got: {html}");
        assert!(html.contains("<strong>bold</strong>"));
        assert!(html.contains("<em>italic</em>"));
    }

    #[test]
    fn tables_enabled() {
        let html = markdown_to_html("| A | B |\n|---|---|\n| 1 | 2 |\n").unwrap();
        assert!(html.contains("<table>"), "got: {html}");
        assert!(html.contains("<th>A</th>"));
        assert!(html.contains("<td>2</td>"));
    }

    #[test]
    fn fenced_code_is_highlighted() {
        let md = "```python\ndef hello():\n    print(\"Hello, World!\")\n```\n";
        let html = markdown_to_html(md).unwrap();
        assert!(html.contains("<div class=\"codehilite\">"), "got: {html}");
        assert!(html.contains("class=\"language-python\""));
        assert!(html.contains("hl-"), "expected highlight classes, got: {html}");
        // default pulldown output must not leak through as well
        assert_eq!(html.matches("<pre>").count(), 1);
    }

    #[test]
    fn code_is_escaped() {
        let md = "```\n<script>alert(1)</script>\n```\n";
        let html = markdown_to_html(md).unwrap();
        assert!(!html.contains("<script>"), "got: {html}");
        assert!(html.contains("&lt;script&gt;"));
    }

    #[test]
    fn unknown_language_falls_back_to_plain_text() {
        let md = "```no-such-language\nsome text\n```\n";
        let html = markdown_to_html(md).unwrap();
        assert!(html.contains("some text"));
        assert!(html.contains("language-no-such-language"));
    }

    #[test]
    fn indented_code_block_is_wrapped() {
        let html = markdown_to_html("para\n\n    let x = 1;\n").unwrap();
        assert!(html.contains("<div class=\"codehilite\"><pre><code>"), "got: {html}");
        assert!(html.contains("let x = 1;"));
    }

    #[test]
    fn themes_and_css() {
        assert!(theme_exists("InspiredGitHub"));
        assert!(!theme_exists("Nope"));
        assert!(theme_names().contains(&"InspiredGitHub"));
        let css = highlight_css("InspiredGitHub").unwrap();
        assert!(css.contains(".hl-"), "got: {css}");
        assert!(highlight_css("Nope").is_err());
    }

    #[test]
    fn unknown_theme_names_the_theme() {
        match highlight_css("Nope") {
            Err(ConversionError::InvalidConfig(msg)) => {
                assert_eq!(msg, "Unknown highlight theme 'Nope'")
            }
            other => panic!("unexpected result: {other:?}"),
        }
    }
}
