use html2text::render::TrivialDecorator;
use tracing::warn;

/// Marker appended to every truncated description
pub const ELLIPSIS: &str = "...";

/// Wide enough that html2text never wraps inside a word.
const RENDER_WIDTH: usize = 10_000;

/// Plain-text fallback summarizer used when no AI summary is available.
#[derive(Debug, Clone, Copy)]
pub struct TextSummarizer {
    max_chars: usize,
}

impl Default for TextSummarizer {
    fn default() -> Self {
        Self::new(common::DEFAULT_MAX_CHARS)
    }
}

impl TextSummarizer {
    pub fn new(max_chars: usize) -> Self {
        Self { max_chars }
    }

    /// Convert `raw_html` to plain text and cut it down to whole words. Never fails.
    pub fn summarize(&self, raw_html: &str) -> String {
        cut_words(&html_to_text(raw_html), self.max_chars)
    }
}

/// Render HTML as plain text with link targets and image sources dropped.
pub fn html_to_text(html: &str) -> String {
    if html.trim().is_empty() {
        return String::new();
    }
    match html2text::config::with_decorator(TrivialDecorator::new())
        .string_from_read(html.as_bytes(), RENDER_WIDTH)
    {
        Ok(text) => text,
        Err(e) => {
            warn!("text: failed to render description HTML, using raw input: {}", e);
            html.to_string()
        }
    }
}

/// Accumulate whitespace-delimited words while the running text stays within
/// `max_chars` characters, then append the ellipsis marker.
///
/// The check runs before each word is appended, against the text built so far
/// (including its trailing separator), and stops at the first word that does
/// not fit.
pub fn cut_words(text: &str, max_chars: usize) -> String {
    let mut out = String::new();
    let mut len = 0usize;
    for word in text.split_whitespace() {
        let word_len = word.chars().count();
        if len + word_len > max_chars {
            break;
        }
        out.push_str(word);
        out.push(' ');
        len += word_len + 1;
    }
    let mut summary = out.trim_end().to_string();
    summary.push_str(ELLIPSIS);
    summary
}
