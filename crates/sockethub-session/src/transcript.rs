//! The transcript: the ordered, append-only log of what the user sees.

use std::fmt;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Unique, monotonically increasing id of a transcript entry.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize,
    Deserialize,
)]
#[serde(transparent)]
pub struct EntryId(pub u64);

impl fmt::Display for EntryId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "m-{}", self.0)
    }
}

/// Where an entry came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Origin {
    /// Text the user sent.
    Sent,
    /// Content received from the server.
    Received,
    /// A note from the session itself: lifecycle changes and errors.
    System,
}

/// One line of the transcript. Never changes once appended.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TranscriptEntry {
    /// Unique id; later entries have larger ids.
    pub id: EntryId,
    /// What to display.
    pub text: String,
    /// Who produced it.
    pub origin: Origin,
    /// When it was appended.
    pub occurred_at: DateTime<Utc>,
}

/// Append-only, ordered sequence of [`TranscriptEntry`].
///
/// Insertion order is display order. Timestamps never go backwards even
/// if the wall clock does: an entry is stamped no earlier than the one
/// before it.
#[derive(Debug, Clone, Default)]
pub struct Transcript {
    entries: Vec<TranscriptEntry>,
    next_id: u64,
}

impl Transcript {
    /// Creates an empty transcript.
    pub fn new() -> Self {
        Self::default()
    }

    /// Appends an entry stamped with the current time.
    pub fn push(
        &mut self,
        text: impl Into<String>,
        origin: Origin,
    ) -> &TranscriptEntry {
        self.push_at(text, origin, Utc::now())
    }

    /// Appends an entry stamped `at`, or the previous entry's stamp if
    /// `at` is earlier.
    pub fn push_at(
        &mut self,
        text: impl Into<String>,
        origin: Origin,
        at: DateTime<Utc>,
    ) -> &TranscriptEntry {
        let occurred_at = match self.entries.last() {
            Some(last) if last.occurred_at > at => last.occurred_at,
            _ => at,
        };
        self.next_id += 1;
        self.entries.push(TranscriptEntry {
            id: EntryId(self.next_id),
            text: text.into(),
            origin,
            occurred_at,
        });
        &self.entries[self.entries.len() - 1]
    }

    /// All entries, oldest first.
    pub fn entries(&self) -> &[TranscriptEntry] {
        &self.entries
    }

    /// Entries appended after `id`. All of them when `id` is `None`.
    pub fn since(&self, id: Option<EntryId>) -> &[TranscriptEntry] {
        let Some(id) = id else {
            return &self.entries;
        };
        // Ids are strictly increasing, so the slice is sorted by id.
        let start = self.entries.partition_point(|entry| entry.id <= id);
        &self.entries[start..]
    }

    /// The most recent entry.
    pub fn last(&self) -> Option<&TranscriptEntry> {
        self.entries.last()
    }

    /// Number of entries.
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Returns `true` if nothing has been appended.
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}
