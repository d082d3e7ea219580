use std::sync::Arc;

use super::input::Action;
use crate::core::logs::{DisplayRecord, LogSnapshot, MessageLog};

type SendCallback<'a> = Box<dyn FnMut(&str) + 'a>;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Flow {
    Continue,
    Quit,
}

/// Presentation-side state: the line being edited and the message log it
/// renders. Submitted lines go to the registered send callback.
pub struct Console<'a> {
    log: Arc<MessageLog>,
    input: String,
    on_send: Option<SendCallback<'a>>,
}

impl<'a> Console<'a> {
    pub fn new(log: Arc<MessageLog>) -> Self {
        Self {
            log,
            input: String::new(),
            on_send: None,
        }
    }

    pub fn set_on_send(&mut self, callback: impl FnMut(&str) + 'a) {
        self.on_send = Some(Box::new(callback));
    }

    /// Hand a record to the log for display.
    pub fn post(&self, record: DisplayRecord) {
        self.log.append(record);
    }

    pub fn input(&self) -> &str {
        &self.input
    }

    pub fn snapshot(&self, visible_height: usize) -> LogSnapshot {
        self.log.snapshot(visible_height)
    }

    pub fn handle(&mut self, action: Action) -> Flow {
        match action {
            Action::Insert(c) => self.input.push(c),
            Action::Backspace => {
                self.input.pop();
            }
            Action::ClearLine => self.input.clear(),
            Action::DeleteWord => match self.input.rfind(' ') {
                Some(idx) => self.input.truncate(idx),
                None => self.input.clear(),
            },
            Action::Submit => self.submit(),
            Action::ScrollUp => {
                self.log.scroll(1);
            }
            Action::ScrollDown => {
                self.log.scroll(-1);
            }
            Action::Quit => return Flow::Quit,
            Action::None => {}
        }
        Flow::Continue
    }

    fn submit(&mut self) {
        if self.input.is_empty() {
            return;
        }
        let line = std::mem::take(&mut self.input);
        match self.on_send.as_mut() {
            Some(send) => send(&line),
            None => log::warn!("[tui] no send handler registered, dropping {line:?}"),
        }
    }
}
