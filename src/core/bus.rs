use flume::{Receiver, Sender, TrySendError};

/// Wake-ups queued beyond this depth are coalesced; the UI redraws from the
/// log's current state anyway.
const NOTIFY_DEPTH: usize = 16;

/// Messages sent from the core (reader thread, signal handler) to the UI thread.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CoreToUi {
    /// New records are available; UI may redraw.
    Tick,
    /// A cancellation was requested from outside the UI.
    Quit,
}

/// Sending side handed to producers.
#[derive(Debug, Clone)]
pub struct Notifier {
    tx: Sender<CoreToUi>,
}

impl Notifier {
    /// Try to enqueue a message. Returns `false` when it was coalesced with
    /// pending ones or nobody is listening any more.
    pub fn notify(&self, msg: CoreToUi) -> bool {
        match self.tx.try_send(msg) {
            Ok(()) => true,
            Err(TrySendError::Full(_)) => false,
            Err(TrySendError::Disconnected(_)) => {
                log::debug!("[bus] UI receiver dropped, discarding {msg:?}");
                false
            }
        }
    }
}

/// Create the core-to-UI channel.
pub fn channel() -> (Notifier, Receiver<CoreToUi>) {
    let (tx, rx) = flume::bounded(NOTIFY_DEPTH);
    (Notifier { tx }, rx)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn excess_ticks_are_coalesced() {
        let (notifier, rx) = channel();
        for _ in 0..NOTIFY_DEPTH {
            assert!(notifier.notify(CoreToUi::Tick));
        }
        assert!(!notifier.notify(CoreToUi::Tick));
        assert_eq!(rx.drain().count(), NOTIFY_DEPTH);
        assert!(notifier.notify(CoreToUi::Quit));
        assert_eq!(rx.try_recv(), Ok(CoreToUi::Quit));
    }

    #[test]
    fn dropped_receiver_is_not_an_error() {
        let (notifier, rx) = channel();
        drop(rx);
        assert!(!notifier.notify(CoreToUi::Tick));
    }
}
