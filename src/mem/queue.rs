//! the bounded transaction queue of one channel

use std::collections::VecDeque;

use super::request::Request;

/// pending requests awaiting scheduling, in arrival order.
///
/// insertion beyond the capacity is refused by handing the request back,
/// nothing is ever silently dropped.
#[derive(Debug)]
pub struct TransactionQueue {
    queue: VecDeque<Request>,
    capacity: usize,
}

impl TransactionQueue {
    pub fn new(capacity: usize) -> Self {
        Self {
            queue: VecDeque::with_capacity(capacity),
            capacity,
        }
    }

    pub fn len(&self) -> usize {
        self.queue.len()
    }

    pub fn is_empty(&self) -> bool {
        self.queue.is_empty()
    }

    pub fn is_full(&self) -> bool {
        self.queue.len() >= self.capacity
    }

    /// append at the tail, refused when the queue is at capacity
    pub fn enqueue(&mut self, request: Request) -> Result<(), Request> {
        if self.is_full() {
            Err(request)
        } else {
            self.queue.push_back(request);
            Ok(())
        }
    }

    /// reinsert a paused or cancelled request at the head.
    ///
    /// the request already owned a slot before it was dispatched, so the
    /// capacity check does not apply here.
    pub fn prequeue(&mut self, request: Request) {
        self.queue.push_front(request);
    }

    pub fn remove(&mut self, index: usize) -> Request {
        self.queue.remove(index).unwrap()
    }

    pub fn iter(&self) -> impl Iterator<Item = &Request> {
        self.queue.iter()
    }

    pub fn iter_mut(&mut self) -> impl Iterator<Item = &mut Request> {
        self.queue.iter_mut()
    }

    /// the index of the oldest request satisfying the predicate, by the
    /// explicit age comparator
    pub fn oldest_where(&self, mut pred: impl FnMut(&Request) -> bool) -> Option<usize> {
        self.queue
            .iter()
            .enumerate()
            .filter(|(_, r)| pred(r))
            .min_by_key(|(_, r)| r.age_key())
            .map(|(i, _)| i)
    }
}
