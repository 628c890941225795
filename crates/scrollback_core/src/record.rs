use std::collections::BTreeSet;
use std::fmt;

use crate::identity::fingerprint;

/// Speaker category of a harvested record.
///
/// `User` and `Assistant` are the two primary categories that receive their own
/// sequence numbers; everything else lands in `Other`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum Category {
    User,
    Assistant,
    Other,
}

impl Category {
    /// Map a source role attribute (`user`, `assistant`, ...) to a category.
    pub fn from_role(role: &str) -> Self {
        match role.trim().to_ascii_lowercase().as_str() {
            "user" | "human" => Category::User,
            "assistant" | "ai" | "model" => Category::Assistant,
            _ => Category::Other,
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Category::User => "user",
            Category::Assistant => "assistant",
            Category::Other => "other",
        }
    }

    pub fn is_primary(self) -> bool {
        !matches!(self, Category::Other)
    }

    /// Flattening precedence inside a group: lower sorts first.
    pub(crate) fn precedence(self) -> u8 {
        match self {
            Category::User => 0,
            Category::Assistant => 1,
            Category::Other => 2,
        }
    }
}

impl fmt::Display for Category {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Rich payload plus its plain-text fallback.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct Content {
    pub rich: String,
    pub plain: String,
}

impl Content {
    pub fn new(rich: impl Into<String>, plain: impl Into<String>) -> Self {
        Self {
            rich: rich.into(),
            plain: plain.into(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.rich.trim().is_empty() && self.plain.trim().is_empty()
    }

    /// Fold a later observation into this one. Returns true when anything changed.
    ///
    /// Each field keeps the most complete payload seen so far: non-empty beats empty,
    /// longer beats shorter, and an empty observation never clears a stored value.
    pub fn merge(&mut self, other: &Content) -> bool {
        let rich = merge_field(&mut self.rich, &other.rich);
        let plain = merge_field(&mut self.plain, &other.plain);
        rich || plain
    }
}

fn merge_field(current: &mut String, incoming: &str) -> bool {
    if incoming.trim().is_empty() || incoming == current.as_str() {
        return false;
    }
    if current.trim().is_empty() || incoming.len() > current.len() {
        *current = incoming.to_string();
        return true;
    }
    false
}

/// A record as pulled from the currently materialized window.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RawRecord {
    pub identity: Option<String>,
    pub category: Category,
    pub group_id: String,
    pub group_order: Option<u64>,
    pub rich_content: String,
    pub plain_text: String,
    pub attachment_names: Vec<String>,
}

impl RawRecord {
    pub fn new(group_id: impl Into<String>, category: Category) -> Self {
        Self {
            identity: None,
            category,
            group_id: group_id.into(),
            group_order: None,
            rich_content: String::new(),
            plain_text: String::new(),
            attachment_names: Vec::new(),
        }
    }

    pub fn with_identity(mut self, identity: impl Into<String>) -> Self {
        self.identity = Some(identity.into());
        self
    }

    pub fn with_group_order(mut self, order: u64) -> Self {
        self.group_order = Some(order);
        self
    }

    pub fn with_content(mut self, rich: impl Into<String>, plain: impl Into<String>) -> Self {
        self.rich_content = rich.into();
        self.plain_text = plain.into();
        self
    }

    pub fn with_attachment(mut self, name: impl Into<String>) -> Self {
        self.attachment_names.push(name.into());
        self
    }

    /// Stable deduplication key: the source id when present and non-blank,
    /// otherwise a fingerprint of the record's text (or attachment names when
    /// it has no text).
    pub fn identity_key(&self) -> String {
        if let Some(id) = self.identity.as_deref().map(str::trim) {
            if !id.is_empty() {
                return id.to_string();
            }
        }
        let text = if !self.plain_text.trim().is_empty() {
            self.plain_text.clone()
        } else if !self.rich_content.trim().is_empty() {
            self.rich_content.clone()
        } else {
            let mut names: Vec<&str> = self.attachment_names.iter().map(String::as_str).collect();
            names.sort_unstable();
            names.join("\n")
        };
        fingerprint(self.category, &text)
    }
}

/// A deduplicated record held in the accumulated store.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Record {
    pub identity: String,
    pub category: Category,
    pub group_id: String,
    pub content: Content,
    pub attachments: BTreeSet<String>,
}

impl Record {
    pub(crate) fn from_raw(identity: String, raw: RawRecord) -> Self {
        Self {
            identity,
            category: raw.category,
            group_id: raw.group_id,
            content: Content::new(raw.rich_content, raw.plain_text),
            attachments: clean_names(raw.attachment_names).collect(),
        }
    }

    /// Merge a re-observation. Returns true when content or attachments grew.
    pub(crate) fn merge(&mut self, raw: RawRecord) -> bool {
        let content_changed = self
            .content
            .merge(&Content::new(raw.rich_content, raw.plain_text));
        let before = self.attachments.len();
        self.attachments.extend(clean_names(raw.attachment_names));
        content_changed || self.attachments.len() != before
    }

    /// Records with neither content nor attachments are not emitted.
    pub fn has_payload(&self) -> bool {
        !self.content.is_empty() || !self.attachments.is_empty()
    }
}

fn clean_names(names: Vec<String>) -> impl Iterator<Item = String> {
    names
        .into_iter()
        .map(|name| name.trim().to_string())
        .filter(|name| !name.is_empty())
}
