pub const STRUCTURED_MARKUP_TOKENS: [&str; 7] =
    ["<table", "<tr>", "<td>", "<div", "<p>", "<h1", "<h2"];

pub const LIGHTWEIGHT_MARKUP_TOKENS: [&str; 5] = ["##", "**", "```", "- ", "|"];

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ContentKind {
    StructuredMarkup,
    LightweightMarkup,
    Plain,
}

impl ContentKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            ContentKind::StructuredMarkup => "html",
            ContentKind::LightweightMarkup => "markdown",
            ContentKind::Plain => "plain",
        }
    }
}

pub fn classify(text: &str) -> ContentKind {
    if STRUCTURED_MARKUP_TOKENS
        .iter()
        .any(|token| text.contains(token))
    {
        return ContentKind::StructuredMarkup;
    }
    if LIGHTWEIGHT_MARKUP_TOKENS
        .iter()
        .any(|token| text.contains(token))
    {
        return ContentKind::LightweightMarkup;
    }
    ContentKind::Plain
}
