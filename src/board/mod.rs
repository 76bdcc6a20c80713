//! Discussion board data: posts, replies, and editor documents.
//!
//! SYSTEM CONTEXT
//! ==============
//! Board storage lives on the server. The client keeps the fetched posts and
//! a flat reply list per post, then nests the replies for rendering.

pub mod tree;

#[cfg(test)]
#[path = "mod_test.rs"]
mod tests;

use serde::{Deserialize, Serialize};
use serde_json::Value;

pub use tree::{ReplyNode, ReplyTree, ReplyView};

/// Rich-text editor document, kept as the editor's own JSON tree.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct EditorDocument(Value);

impl Default for EditorDocument {
    fn default() -> Self {
        Self::empty()
    }
}

impl EditorDocument {
    /// A document with a single empty paragraph.
    #[must_use]
    pub fn empty() -> Self {
        Self(serde_json::json!({"type": "doc", "content": [{"type": "paragraph"}]}))
    }

    #[must_use]
    pub fn from_json(value: Value) -> Self {
        Self(value)
    }

    /// One paragraph per line of `text`.
    #[must_use]
    pub fn from_plain_text(text: &str) -> Self {
        let content: Vec<Value> = text
            .lines()
            .map(|line| {
                if line.is_empty() {
                    serde_json::json!({"type": "paragraph"})
                } else {
                    serde_json::json!({"type": "paragraph", "content": [{"type": "text", "text": line}]})
                }
            })
            .collect();
        Self(serde_json::json!({"type": "doc", "content": content}))
    }

    #[must_use]
    pub fn as_json(&self) -> &Value {
        &self.0
    }

    /// Text content with one line per top-level block.
    #[must_use]
    pub fn plain_text(&self) -> String {
        match self.0.get("content").and_then(Value::as_array) {
            Some(blocks) => blocks
                .iter()
                .map(|block| {
                    let mut line = String::new();
                    collect_text(block, &mut line);
                    line
                })
                .collect::<Vec<_>>()
                .join("\n"),
            None => {
                let mut out = String::new();
                collect_text(&self.0, &mut out);
                out
            }
        }
    }

    #[must_use]
    pub fn is_blank(&self) -> bool {
        self.plain_text().trim().is_empty()
    }
}

fn collect_text(node: &Value, out: &mut String) {
    if let Some(text) = node.get("text").and_then(Value::as_str) {
        out.push_str(text);
    }
    if let Some(children) = node.get("content").and_then(Value::as_array) {
        for child in children {
            collect_text(child, out);
        }
    }
}

/// A board post as returned by the server.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BoardPost {
    pub id: i64,
    pub title: String,
    pub author: String,
    pub content: EditorDocument,
    /// Milliseconds since the Unix epoch.
    pub created_at: i64,
    #[serde(default)]
    pub reply_count: u32,
}

/// One reply under a post. `parent_id` is `None` for top-level replies.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Reply {
    pub id: i64,
    pub board_id: i64,
    pub parent_id: Option<i64>,
    pub author: String,
    pub content: EditorDocument,
    pub created_at: i64,
    #[serde(default)]
    pub deleted: bool,
}
