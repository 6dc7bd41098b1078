// Communication channels lock-free
// Scheduled events travel from the sequencer to the voice dispatcher

use crate::midi::event::Ev;
use ringbuf::{HeapRb, traits::Split};

pub type EventProducer = ringbuf::HeapProd<Ev>;
pub type EventConsumer = ringbuf::HeapCons<Ev>;

pub fn create_event_channel(capacity: usize) -> (EventProducer, EventConsumer) {
    let rb = HeapRb::<Ev>::new(capacity);
    rb.split()
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, thiserror::Error)]
pub enum DispatchError {
    #[error("Event buffer is full ({dropped} events dropped)")]
    BufferFull { dropped: usize },
}

#[cfg(test)]
mod tests {
    use super::*;
    use ringbuf::traits::{Consumer, Producer};

    #[test]
    fn test_event_channel_roundtrip() {
        let (mut tx, mut rx) = create_event_channel(4);
        let ev = Ev::note_on(1, 10, 60, 100);

        assert!(tx.try_push(ev).is_ok());
        assert_eq!(rx.try_pop(), Some(ev));
        assert_eq!(rx.try_pop(), None);
    }

    #[test]
    fn test_error_display() {
        let err = DispatchError::BufferFull { dropped: 3 };
        assert_eq!(err.to_string(), "Event buffer is full (3 events dropped)");
    }
}
