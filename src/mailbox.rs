use std::sync::{Condvar, Mutex, MutexGuard, PoisonError};
use std::time::Duration;

struct Slot<T> {
    message: Option<T>,
    closed: bool,
}

/// Single-slot handoff between a producer thread and blocked consumers.
///
/// This is not a queue. `send` overwrites whatever has not been taken yet, so
/// a receiver only ever sees the most recent message.
pub struct Mailbox<T> {
    slot: Mutex<Slot<T>>,
    available: Condvar,
}

impl<T> Default for Mailbox<T> {
    fn default() -> Self {
        Self::new()
    }
}

impl<T> Mailbox<T> {
    pub fn new() -> Self {
        Self {
            slot: Mutex::new(Slot {
                message: None,
                closed: false,
            }),
            available: Condvar::new(),
        }
    }

    // The slot is a plain Option, a panicking holder can't leave it torn.
    fn lock(&self) -> MutexGuard<'_, Slot<T>> {
        self.slot.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Replace any pending message and wake one receiver.
    pub fn send(&self, message: T) {
        let mut slot = self.lock();
        slot.message = Some(message);
        self.available.notify_one();
    }

    /// Block until a message is present and take it.
    pub fn receive(&self) -> T {
        let slot = self.lock();
        let mut slot = self
            .available
            .wait_while(slot, |slot| slot.message.is_none())
            .unwrap_or_else(PoisonError::into_inner);
        match slot.message.take() {
            Some(message) => message,
            None => unreachable!("woken with an empty slot"),
        }
    }

    /// Like [`Mailbox::receive`], but gives up with `None` once the mailbox is
    /// closed and nothing is left to take.
    pub fn receive_until_closed(&self) -> Option<T> {
        let slot = self.lock();
        let mut slot = self
            .available
            .wait_while(slot, |slot| slot.message.is_none() && !slot.closed)
            .unwrap_or_else(PoisonError::into_inner);
        slot.message.take()
    }

    pub fn receive_timeout(&self, timeout: Duration) -> Option<T> {
        let slot = self.lock();
        let (mut slot, _) = self
            .available
            .wait_timeout_while(slot, timeout, |slot| slot.message.is_none())
            .unwrap_or_else(PoisonError::into_inner);
        slot.message.take()
    }

    pub fn try_receive(&self) -> Option<T> {
        self.lock().message.take()
    }

    /// Wake every receiver. A message already in the slot is still delivered.
    pub fn close(&self) {
        let mut slot = self.lock();
        slot.closed = true;
        self.available.notify_all();
    }

    pub fn is_closed(&self) -> bool {
        self.lock().closed
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::phase::Phase;
    use std::sync::{mpsc, Arc};
    use std::thread;

    const TIMEOUT: Duration = Duration::from_secs(5);

    #[test]
    fn test_latest_send_wins() {
        let mailbox = Mailbox::new();
        mailbox.send(1);
        mailbox.send(2);
        assert_eq!(mailbox.receive(), 2);
        assert_eq!(mailbox.try_receive(), None);
    }

    #[test]
    fn test_receive_takes_ownership() {
        let mailbox = Mailbox::new();
        mailbox.send(String::from("go"));
        let message: String = mailbox.receive();
        assert_eq!(message, "go");
        assert!(mailbox.try_receive().is_none());
    }

    #[test]
    fn test_receive_blocks_until_send() {
        let mailbox = Arc::new(Mailbox::new());
        let (tx, rx) = mpsc::channel();

        let receiver = {
            let mailbox = mailbox.clone();
            thread::spawn(move || {
                tx.send(mailbox.receive()).unwrap();
            })
        };

        assert!(rx.recv_timeout(Duration::from_millis(50)).is_err());
        mailbox.send(Phase::Go);
        assert_eq!(rx.recv_timeout(TIMEOUT).unwrap(), Phase::Go);
        receiver.join().unwrap();
    }

    #[test]
    fn test_receive_timeout_on_empty_mailbox() {
        let mailbox: Mailbox<Phase> = Mailbox::new();
        assert_eq!(mailbox.receive_timeout(Duration::from_millis(20)), None);

        mailbox.send(Phase::Stop);
        assert_eq!(
            mailbox.receive_timeout(Duration::from_millis(20)),
            Some(Phase::Stop)
        );
    }

    #[test]
    fn test_mailboxes_are_isolated() {
        let first = Arc::new(Mailbox::new());
        let second: Arc<Mailbox<Phase>> = Arc::new(Mailbox::new());

        let producer = {
            let first = first.clone();
            thread::spawn(move || first.send(Phase::Go))
        };
        producer.join().unwrap();

        assert_eq!(second.receive_timeout(Duration::from_millis(50)), None);
        assert_eq!(first.receive_timeout(TIMEOUT), Some(Phase::Go));
    }

    #[test]
    fn test_close_releases_blocked_receivers() {
        let mailbox: Arc<Mailbox<Phase>> = Arc::new(Mailbox::new());
        let (tx, rx) = mpsc::channel();

        let receivers: Vec<_> = (0..4)
            .map(|_| {
                let mailbox = mailbox.clone();
                let tx = tx.clone();
                thread::spawn(move || tx.send(mailbox.receive_until_closed()).unwrap())
            })
            .collect();

        thread::sleep(Duration::from_millis(20));
        mailbox.close();
        assert!(mailbox.is_closed());

        for _ in 0..4 {
            assert_eq!(rx.recv_timeout(TIMEOUT).unwrap(), None);
        }
        for receiver in receivers {
            receiver.join().unwrap();
        }
    }

    #[test]
    fn test_close_still_delivers_pending_message() {
        let mailbox = Mailbox::new();
        mailbox.send(Phase::Go);
        mailbox.close();
        assert_eq!(mailbox.receive_until_closed(), Some(Phase::Go));
        assert_eq!(mailbox.receive_until_closed(), None);
    }

    #[test]
    fn test_every_received_value_was_sent() {
        let mailbox = Arc::new(Mailbox::new());
        let producer = {
            let mailbox = mailbox.clone();
            thread::spawn(move || {
                for i in 1..=1000u32 {
                    mailbox.send(i);
                }
                mailbox.close();
            })
        };

        let mut last = 0;
        while let Some(value) = mailbox.receive_until_closed() {
            assert!((1..=1000).contains(&value));
            // a single producer means values can be skipped but never go back
            assert!(value > last);
            last = value;
        }
        producer.join().unwrap();
        assert_eq!(last, 1000);
    }
}
