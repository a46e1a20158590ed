use std::cmp::Ordering;

use time::OffsetDateTime;

/// A message waiting to be written.
///
/// Records order by timestamp (as an absolute instant, so the offset a
/// producer used does not matter), then by content bytes. This is the only
/// source of write ordering.
#[derive(Debug, Clone)]
pub struct Record {
    timestamp: OffsetDateTime,
    content: String,
}

impl Record {
    pub fn new(content: impl Into<String>, timestamp: OffsetDateTime) -> Self {
        Self {
            timestamp,
            content: content.into(),
        }
    }

    pub fn timestamp(&self) -> OffsetDateTime {
        self.timestamp
    }

    pub fn content(&self) -> &str {
        &self.content
    }

    pub fn into_content(self) -> String {
        self.content
    }
}

impl PartialEq for Record {
    fn eq(&self, other: &Self) -> bool {
        self.cmp(other) == Ordering::Equal
    }
}

impl Eq for Record {}

impl PartialOrd for Record {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for Record {
    fn cmp(&self, other: &Self) -> Ordering {
        self.timestamp
            .cmp(&other.timestamp)
            .then_with(|| self.content.as_bytes().cmp(other.content.as_bytes()))
    }
}
