use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use crate::pipeline::NewsItem;

/// Markup interpretation of a text object
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TextKind {
    PlainText,
    Mrkdwn,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TextObject {
    #[serde(rename = "type")]
    pub kind: TextKind,
    pub text: String,
}

impl TextObject {
    pub fn plain(text: impl Into<String>) -> Self {
        Self {
            kind: TextKind::PlainText,
            text: text.into(),
        }
    }

    pub fn markdown(text: impl Into<String>) -> Self {
        Self {
            kind: TextKind::Mrkdwn,
            text: text.into(),
        }
    }
}

/// One unit of display content, serialized in chat block-kit form.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum DisplayBlock {
    Header { text: TextObject },
    Section { text: TextObject },
    Divider,
}

impl DisplayBlock {
    pub fn header(text: impl Into<String>) -> Self {
        DisplayBlock::Header {
            text: TextObject::plain(text),
        }
    }

    pub fn section(text: TextObject) -> Self {
        DisplayBlock::Section { text }
    }
}

/// Render one source: a dated header, then title / summary / link / divider per item.
pub fn render(title: &str, items: &[NewsItem], as_of: NaiveDate) -> Vec<DisplayBlock> {
    let mut blocks = Vec::with_capacity(1 + items.len() * 4);
    blocks.push(DisplayBlock::header(format!(
        "{} # {}",
        title,
        as_of.format("%Y-%m-%d")
    )));
    for item in items {
        blocks.extend([
            DisplayBlock::section(TextObject::markdown(format!("*{}*", item.title))),
            DisplayBlock::section(TextObject::plain(item.summary.clone())),
            DisplayBlock::section(TextObject::markdown(format!("原文链接：<{}>", item.url))),
            DisplayBlock::Divider,
        ]);
    }
    blocks
}
