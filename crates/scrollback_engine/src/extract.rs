use scrollback_core::{fingerprint, Category, RawRecord};
use scraper::{ElementRef, Html, Selector};

/// CSS selectors and attribute names describing a rendered conversation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SnapshotSelectors {
    /// One element per turn (group).
    pub turn: String,
    /// Attribute on the turn element carrying its id; trailing digits give the order.
    pub turn_id_attr: String,
    /// One element per message inside a turn.
    pub message: String,
    pub role_attr: String,
    pub message_id_attr: String,
    /// Rich body inside a message; the whole message is used when absent.
    pub body: String,
    /// Attachment chips inside a message.
    pub attachment: String,
    pub attachment_name_attr: String,
}

impl Default for SnapshotSelectors {
    fn default() -> Self {
        Self {
            turn: r#"[data-testid^="conversation-turn-"]"#.to_string(),
            turn_id_attr: "data-testid".to_string(),
            message: "[data-message-author-role]".to_string(),
            role_attr: "data-message-author-role".to_string(),
            message_id_attr: "data-message-id".to_string(),
            body: ".markdown, .whitespace-pre-wrap".to_string(),
            attachment: "[data-attachment-name]".to_string(),
            attachment_name_attr: "data-attachment-name".to_string(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ExtractError {
    #[error("invalid selector {selector:?}: {message}")]
    InvalidSelector { selector: String, message: String },
}

/// Pulls [`RawRecord`]s out of a rendered HTML window.
#[derive(Debug)]
pub struct SnapshotExtractor {
    selectors: SnapshotSelectors,
    turn: Selector,
    message: Selector,
    body: Selector,
    attachment: Selector,
}

impl SnapshotExtractor {
    pub fn new(selectors: SnapshotSelectors) -> Result<Self, ExtractError> {
        Ok(Self {
            turn: compile(&selectors.turn)?,
            message: compile(&selectors.message)?,
            body: compile(&selectors.body)?,
            attachment: compile(&selectors.attachment)?,
            selectors,
        })
    }

    pub fn extract(&self, html: &str) -> Vec<RawRecord> {
        let document = Html::parse_document(html);
        let mut records = Vec::new();
        for turn in document.select(&self.turn) {
            let (group_id, group_order) = match turn.value().attr(&self.selectors.turn_id_attr) {
                Some(id) => (id.to_string(), parse_group_order(id)),
                None => (self.fallback_group_id(turn), None),
            };
            for message in turn.select(&self.message) {
                records.push(self.extract_message(message, &group_id, group_order));
            }
        }
        records
    }

    /// Window-independent id for a turn without its own id attribute: the first
    /// message id it contains, else a fingerprint of the turn's text.
    fn fallback_group_id(&self, turn: ElementRef<'_>) -> String {
        let first_message_id = turn
            .select(&self.message)
            .filter_map(|message| message.value().attr(&self.selectors.message_id_attr))
            .map(str::trim)
            .find(|id| !id.is_empty());
        match first_message_id {
            Some(id) => format!("turn-of-{id}"),
            None => format!(
                "turn-{}",
                fingerprint(Category::Other, &collapse_whitespace(turn.text()))
            ),
        }
    }

    fn extract_message(
        &self,
        message: ElementRef<'_>,
        group_id: &str,
        group_order: Option<u64>,
    ) -> RawRecord {
        let value = message.value();
        let category = value
            .attr(&self.selectors.role_attr)
            .map(Category::from_role)
            .unwrap_or(Category::Other);
        let body = message.select(&self.body).next().unwrap_or(message);

        RawRecord {
            identity: value
                .attr(&self.selectors.message_id_attr)
                .map(str::trim)
                .filter(|id| !id.is_empty())
                .map(str::to_string),
            category,
            group_id: group_id.to_string(),
            group_order,
            rich_content: body.inner_html().trim().to_string(),
            plain_text: collapse_whitespace(body.text()),
            attachment_names: message
                .select(&self.attachment)
                .filter_map(|chip| chip.value().attr(&self.selectors.attachment_name_attr))
                .map(|name| name.trim().to_string())
                .filter(|name| !name.is_empty())
                .collect(),
        }
    }
}

fn compile(selector: &str) -> Result<Selector, ExtractError> {
    Selector::parse(selector).map_err(|err| ExtractError::InvalidSelector {
        selector: selector.to_string(),
        message: format!("{err:?}"),
    })
}

fn collapse_whitespace<'a>(parts: impl Iterator<Item = &'a str>) -> String {
    parts
        .flat_map(str::split_whitespace)
        .collect::<Vec<_>>()
        .join(" ")
}

/// Trailing decimal digits of a turn id (`conversation-turn-12` gives 12).
pub fn parse_group_order(group_id: &str) -> Option<u64> {
    let trimmed = group_id.trim();
    let digits = trimmed.len() - trimmed.trim_end_matches(|c: char| c.is_ascii_digit()).len();
    if digits == 0 {
        return None;
    }
    trimmed[trimmed.len() - digits..].parse().ok()
}
