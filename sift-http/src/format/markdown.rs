//! Turns loosely structured model output into HTML.
//!
//! Models tend to answer with `Label: value` lines and typographic bullets
//! rather than real markdown. Each line is classified once:
//!
//! - a line starting with a label becomes `## Label: ...`, colon kept
//! - a line starting with `•`, `●` or `○` becomes a `* ` list item
//!
//! A label never spans lines, so no line gets more than one heading marker.
//!
//! The result is rendered as GitHub-flavoured markdown with soft breaks
//! turned into hard breaks.

use std::sync::LazyLock;

use pulldown_cmark::{html, Event, Options, Parser};
use regex::Regex;

static LABEL: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^[A-Za-z][A-Za-z \t]+:").expect("label pattern is valid"));

static BULLET: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^[•●○][ \t]*").expect("bullet pattern is valid"));

/// Format raw model text into HTML
pub fn format_markdown(text: &str) -> String {
    render_html(&to_markdown(text))
}

/// Rewrite raw model text into markdown, without rendering it
pub fn to_markdown(text: &str) -> String {
    let text = normalize_newlines(text);
    let classified = classify_lines(&text);

    classified
        .split("\n\n")
        .filter(|p| !p.is_empty())
        .map(|p| {
            if p.starts_with('#') || p.starts_with('*') || p.starts_with('-') {
                p.to_string()
            } else {
                format!("{p}\n")
            }
        })
        .collect::<Vec<_>>()
        .join("\n\n")
}

/// Render markdown with GFM extensions, soft breaks as `<br />`
pub fn render_html(markdown: &str) -> String {
    let mut options = Options::empty();
    options.insert(Options::ENABLE_TABLES);
    options.insert(Options::ENABLE_STRIKETHROUGH);
    options.insert(Options::ENABLE_TASKLISTS);

    let parser = Parser::new_ext(markdown, options).map(|event| match event {
        Event::SoftBreak => Event::HardBreak,
        other => other,
    });

    let mut out = String::with_capacity(markdown.len() * 3 / 2);
    html::push_html(&mut out, parser);
    out
}

fn normalize_newlines(text: &str) -> String {
    text.replace("\r\n", "\n").replace('\r', "\n")
}

fn classify_lines(text: &str) -> String {
    text.split('\n')
        .map(|line| {
            if LABEL.is_match(line) {
                format!("## {line}")
            } else {
                BULLET.replace(line, "* ").into_owned()
            }
        })
        .collect::<Vec<_>>()
        .join("\n")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn label_lines_separated_by_blank_lines_become_h2() {
        let html = format_markdown("Temperature: 72F\n\nHumidity: 40%");

        assert!(html.contains("<h2>Temperature: 72F</h2>"), "{html}");
        assert!(html.contains("<h2>Humidity: 40%</h2>"), "{html}");
        assert_eq!(html.matches("<h2>").count(), 2);
        assert!(!html.contains("<h3>"));
    }

    #[test]
    fn carriage_returns_are_normalized() {
        assert_eq!(
            format_markdown("Temperature: 72F\r\n\r\nHumidity: 40%"),
            format_markdown("Temperature: 72F\n\nHumidity: 40%"),
        );
        assert_eq!(to_markdown("a\rb"), to_markdown("a\nb"));
    }

    #[test]
    fn consecutive_label_lines_each_become_h2() {
        let html = format_markdown("Temperature: 72F\nHumidity: 40%");

        assert!(html.contains("<h2>Temperature: 72F</h2>"), "{html}");
        assert!(html.contains("<h2>Humidity: 40%</h2>"), "{html}");
        assert_eq!(html.matches("<h2>").count(), 2);
        assert!(!html.contains("<h3>"), "{html}");
    }

    #[test]
    fn every_label_line_gets_a_single_heading_marker() {
        let md = to_markdown("Summary: fine\nWind: strong\nPressure:1013 hPa");

        assert_eq!(md, "## Summary: fine\n## Wind: strong\n## Pressure:1013 hPa");
        let html = render_html(&md);
        assert_eq!(html.matches("<h2>").count(), 3, "{html}");
        assert!(html.contains("<h2>Pressure:1013 hPa</h2>"));
        assert!(!html.contains("##"));
    }

    #[test]
    fn single_letter_label_is_plain_text() {
        assert_eq!(to_markdown("Q: why"), "Q: why\n");
    }

    #[test]
    fn bullet_glyphs_become_list_items() {
        let md = to_markdown("Options:\n• first\n●second\n○  third");
        assert_eq!(md, "## Options:\n* first\n* second\n* third");

        let html = render_html(&md);
        assert_eq!(html.matches("<li>").count(), 3);
    }

    #[test]
    fn plain_paragraphs_keep_soft_breaks_as_hard_breaks() {
        let html = format_markdown("first line\nsecond line\n\nnext paragraph");

        assert!(html.contains("first line<br />\nsecond line"), "{html}");
        assert_eq!(html.matches("<p>").count(), 2);
    }

    #[test]
    fn well_formed_markdown_keeps_its_structure() {
        let md = "# Title\n\n## Section\n\n* one\n* two\n\n- three\n\nclosing words";
        assert_eq!(format_markdown(md), render_html(md));
    }

    #[test]
    fn empty_input_renders_nothing() {
        assert_eq!(format_markdown(""), "");
        assert_eq!(format_markdown("\n\n\n\n"), "");
    }

    #[test]
    fn gfm_tables_render() {
        let html = format_markdown("| a | b |\n|---|---|\n| 1 | 2 |");
        assert!(html.contains("<table>"), "{html}");
    }
}
