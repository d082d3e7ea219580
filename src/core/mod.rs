/// State shared between the reader thread and the presentation loop:
/// the bounded message log and the wake-up channel into the UI.
pub mod bus;
pub mod logs;

pub use bus::{CoreToUi, Notifier};
pub use logs::{DisplayRecord, LogSnapshot, MessageLog, RecordKind};
