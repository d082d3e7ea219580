//! Display records and the bounded message log shared between the reader
//! thread and the UI.
//!
//! Scroll state lives next to the records so that one lock covers both: an
//! offset counted back from the newest record and an auto-scroll flag that is
//! true exactly when the offset is zero.
use chrono::{DateTime, Local};
use parking_lot::Mutex;
use std::collections::VecDeque;

use super::bus::{CoreToUi, Notifier};

pub const DEFAULT_LOG_CAPACITY: usize = 100;

pub const RECEIVED_PREFIX: &str = "->: ";
pub const SENT_PREFIX: &str = "<- ";
pub const ERROR_PREFIX: &str = "[ERROR] ";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RecordKind {
    Received,
    Sent,
    Info,
    Error,
}

/// One line of the message log.
#[derive(Debug, Clone)]
pub struct DisplayRecord {
    when: DateTime<Local>,
    kind: RecordKind,
    text: String,
}

impl DisplayRecord {
    pub fn new(kind: RecordKind, text: impl Into<String>) -> Self {
        Self {
            when: Local::now(),
            kind,
            text: text.into(),
        }
    }

    pub fn received(body: &str) -> Self {
        Self::new(RecordKind::Received, format!("{RECEIVED_PREFIX}{body}"))
    }

    pub fn sent(body: &str) -> Self {
        Self::new(RecordKind::Sent, format!("{SENT_PREFIX}{body}"))
    }

    pub fn info(text: impl Into<String>) -> Self {
        Self::new(RecordKind::Info, text)
    }

    pub fn error(text: &str) -> Self {
        Self::new(RecordKind::Error, format!("{ERROR_PREFIX}{text}"))
    }

    pub fn when(&self) -> DateTime<Local> {
        self.when
    }

    pub fn kind(&self) -> RecordKind {
        self.kind
    }

    pub fn text(&self) -> &str {
        &self.text
    }
}

/// What the UI needs to draw one frame.
#[derive(Debug, Clone)]
pub struct LogSnapshot {
    pub records: Vec<DisplayRecord>,
    pub offset: usize,
    pub auto_scroll: bool,
    pub total: usize,
}

struct LogState {
    records: VecDeque<DisplayRecord>,
    offset: usize,
    auto_scroll: bool,
}

/// Bounded, thread-safe log of display records.
pub struct MessageLog {
    capacity: usize,
    state: Mutex<LogState>,
    notifier: Option<Notifier>,
}

impl MessageLog {
    /// Create a log holding at most `capacity` records (at least one).
    pub fn new(capacity: usize) -> Self {
        let capacity = capacity.max(1);
        Self {
            capacity,
            state: Mutex::new(LogState {
                records: VecDeque::with_capacity(capacity),
                offset: 0,
                auto_scroll: true,
            }),
            notifier: None,
        }
    }

    /// Create a log that wakes the UI after every append.
    pub fn with_notifier(capacity: usize, notifier: Notifier) -> Self {
        Self {
            notifier: Some(notifier),
            ..Self::new(capacity)
        }
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }

    /// Add a record, evicting the oldest ones beyond capacity. While the user
    /// is scrolled back the offset grows with each append so the view stays on
    /// the same records.
    pub fn append(&self, record: DisplayRecord) {
        {
            let mut state = self.state.lock();
            state.records.push_back(record);
            while state.records.len() > self.capacity {
                state.records.pop_front();
            }
            if !state.auto_scroll {
                let max = state.records.len().saturating_sub(1);
                state.offset = (state.offset + 1).min(max);
            }
        }

        // Lock released before waking the UI
        if let Some(notifier) = &self.notifier {
            notifier.notify(CoreToUi::Tick);
        }
    }

    /// Records visible in a window of `visible_height` lines.
    pub fn snapshot(&self, visible_height: usize) -> LogSnapshot {
        let state = self.state.lock();
        let total = state.records.len();
        let offset = state.offset.min(total.saturating_sub(1));
        let end = total - offset;
        let start = end.saturating_sub(visible_height);

        LogSnapshot {
            records: state.records.range(start..end).cloned().collect(),
            offset,
            auto_scroll: state.auto_scroll,
            total,
        }
    }

    /// Move the view by `delta` records; positive scrolls back in time.
    /// Returns the new offset, clamped to `[0, len - 1]`.
    pub fn scroll(&self, delta: isize) -> usize {
        let mut state = self.state.lock();
        let max = state.records.len().saturating_sub(1);
        let next = if delta >= 0 {
            state.offset.saturating_add(delta.unsigned_abs()).min(max)
        } else {
            state.offset.saturating_sub(delta.unsigned_abs())
        };
        state.offset = next;
        state.auto_scroll = next == 0;
        next
    }

    /// Clone of every record, oldest first.
    pub fn records(&self) -> Vec<DisplayRecord> {
        self.state.lock().records.iter().cloned().collect()
    }

    pub fn len(&self) -> usize {
        self.state.lock().records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.state.lock().records.is_empty()
    }

    pub fn offset(&self) -> usize {
        self.state.lock().offset
    }

    pub fn auto_scroll(&self) -> bool {
        self.state.lock().auto_scroll
    }

    pub fn clear(&self) {
        let mut state = self.state.lock();
        state.records.clear();
        state.offset = 0;
        state.auto_scroll = true;
    }
}

impl Default for MessageLog {
    fn default() -> Self {
        Self::new(DEFAULT_LOG_CAPACITY)
    }
}
