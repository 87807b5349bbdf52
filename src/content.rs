use pulldown_cmark::{Options, Parser, html};

use crate::classify::{ContentKind, classify};

#[derive(Debug, Clone, PartialEq)]
pub struct RenderedContent {
    pub kind: ContentKind,
    pub html: String,
}

pub fn render_content(text: &str) -> RenderedContent {
    let kind = classify(text);
    let html = match kind {
        ContentKind::StructuredMarkup => text.to_string(),
        ContentKind::LightweightMarkup => render_markdown(text),
        ContentKind::Plain => render_preformatted(text),
    };
    RenderedContent { kind, html }
}

fn render_markdown(markdown: &str) -> String {
    let parser = Parser::new_ext(markdown, Options::all());
    let mut output = String::new();
    html::push_html(&mut output, parser);
    output
}

fn render_preformatted(text: &str) -> String {
    format!("<pre>{}</pre>", escape_text(text))
}

fn escape_text(value: &str) -> String {
    value
        .replace('&', "&amp;")
        .replace('<', "&lt;")
        .replace('>', "&gt;")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn structured_markup_passes_through_verbatim() {
        let source = "<table><tr><td>total</td><td>42 &lt; 50</td></tr></table>";
        let rendered = render_content(source);
        assert_eq!(rendered.kind, ContentKind::StructuredMarkup);
        assert_eq!(rendered.html, source);
    }

    #[test]
    fn lightweight_markup_renders_headings_and_emphasis() {
        let rendered = render_content("## Receipt\n\n**total** 42");
        assert_eq!(rendered.kind, ContentKind::LightweightMarkup);
        assert!(rendered.html.contains("<h2>Receipt</h2>"));
        assert!(rendered.html.contains("<strong>total</strong>"));
    }

    #[test]
    fn lightweight_markup_renders_tables() {
        let rendered = render_content("| a | b |\n| - | - |\n| 1 | 2 |");
        assert_eq!(rendered.kind, ContentKind::LightweightMarkup);
        assert!(rendered.html.contains("<table>"));
        assert!(rendered.html.contains("<td>1</td>"));
    }

    #[test]
    fn plain_text_is_escaped_inside_pre() {
        let rendered = render_content("Tom & Jerry <3 \"quotes\"\nline two");
        assert_eq!(rendered.kind, ContentKind::Plain);
        assert_eq!(
            rendered.html,
            "<pre>Tom &amp; Jerry &lt;3 \"quotes\"\nline two</pre>"
        );
    }

    #[test]
    fn plain_text_preserves_whitespace_runs() {
        let rendered = render_content("col1    col2\n  indented");
        assert_eq!(rendered.html, "<pre>col1    col2\n  indented</pre>");
    }
}
