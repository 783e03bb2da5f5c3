use std::collections::VecDeque;

/// A queued message, stamped with its position in the stream.
#[derive(Debug, Clone, PartialEq)]
pub struct Queued<E> {
    pub seq: u64,
    pub event: E,
}

/// FIFO message queue drained one message at a time.
///
/// Producers push from anywhere on the event loop; the owner processes
/// messages in arrival order so no handler ever runs re-entrantly.
#[derive(Debug)]
pub struct EventBus<E> {
    next_seq: u64,
    queue: VecDeque<Queued<E>>,
}

impl<E> Default for EventBus<E> {
    fn default() -> Self {
        Self {
            next_seq: 0,
            queue: VecDeque::new(),
        }
    }
}

impl<E> EventBus<E> {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn emit(&mut self, event: E) -> u64 {
        let seq = self.next_seq;
        self.next_seq = self.next_seq.wrapping_add(1);
        self.queue.push_back(Queued { seq, event });
        seq
    }

    pub fn pop(&mut self) -> Option<Queued<E>> {
        self.queue.pop_front()
    }

    pub fn len(&self) -> usize {
        self.queue.len()
    }

    pub fn is_empty(&self) -> bool {
        self.queue.is_empty()
    }

    pub fn events(&self) -> impl Iterator<Item = &E> {
        self.queue.iter().map(|q| &q.event)
    }

    pub fn drain(&mut self) -> Vec<Queued<E>> {
        self.queue.drain(..).collect()
    }
}
