//! Timestamp-ordered priority queue of pending downlinks, keyed by the
//! concentrator's microsecond counter. A `BinaryHeap` replaces the source's
//! hand-rolled sorted linked list; the ordering contract at the API
//! boundary (lowest `count_us` dequeues first) is unchanged.
use crate::model::TxPacket;
use std::cmp::{Ordering, Reverse};
use std::collections::BinaryHeap;

/// Hard cap on pending scheduled downlinks. Not specified upstream; chosen
/// because a single-channel gateway with a sane network server should never
/// have more than a handful of downlinks in flight at once.
pub const MAX_QUEUE_LEN: usize = 64;

struct Entry(TxPacket);

impl PartialEq for Entry {
    fn eq(&self, other: &Self) -> bool {
        self.0.count_us == other.0.count_us
    }
}
impl Eq for Entry {}

impl PartialOrd for Entry {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}
impl Ord for Entry {
    fn cmp(&self, other: &Self) -> Ordering {
        self.0.count_us.cmp(&other.0.count_us)
    }
}

#[derive(Default)]
pub struct TxQueue {
    heap: BinaryHeap<Reverse<Entry>>,
}

impl TxQueue {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn is_empty(&self) -> bool {
        self.heap.is_empty()
    }

    pub fn len(&self) -> usize {
        self.heap.len()
    }

    /// Inserts a scheduled packet. Returns `false` and drops the packet
    /// (with the caller expected to log a warning) when the queue is full.
    pub fn insert(&mut self, packet: TxPacket) -> bool {
        if self.heap.len() >= MAX_QUEUE_LEN {
            return false;
        }
        self.heap.push(Reverse(Entry(packet)));
        true
    }

    /// The `count_us` of the next packet due, if any.
    pub fn peek_count_us(&self) -> Option<u32> {
        self.heap.peek().map(|Reverse(entry)| entry.0.count_us)
    }

    pub fn pop(&mut self) -> Option<TxPacket> {
        self.heap.pop().map(|Reverse(entry)| entry.0)
    }
}

#[cfg(test)]
mod test {
    use super::*;
    use crate::codec::{Bandwidth, CodingRate, SpreadingFactor};
    use crate::model::TxModulation;

    fn packet(count_us: u32) -> TxPacket {
        TxPacket {
            immediate: false,
            count_us,
            time_gps: None,
            freq_hz: 868_100_000,
            power_dbm: 14,
            modulation: TxModulation::Lora {
                bandwidth: Bandwidth::Bw125,
                coding_rate: CodingRate::Cr4_5,
                spreading_factor: SpreadingFactor::SF7,
            },
            invert_polar: true,
            preamble_len: None,
            no_crc: false,
            data: vec![],
        }
    }

    #[test]
    fn pops_in_ascending_count_us_order() {
        let mut q = TxQueue::new();
        q.insert(packet(3000));
        q.insert(packet(1000));
        q.insert(packet(2000));
        assert_eq!(q.pop().unwrap().count_us, 1000);
        assert_eq!(q.pop().unwrap().count_us, 2000);
        assert_eq!(q.pop().unwrap().count_us, 3000);
        assert!(q.pop().is_none());
    }

    #[test]
    fn caps_at_max_len_and_drops_overflow() {
        let mut q = TxQueue::new();
        for i in 0..MAX_QUEUE_LEN {
            assert!(q.insert(packet(i as u32)));
        }
        assert!(!q.insert(packet(9999)));
        assert_eq!(q.len(), MAX_QUEUE_LEN);
    }

    proptest::proptest! {
        #[test]
        fn pop_order_is_non_decreasing(mut counts in proptest::collection::vec(0u32..1_000_000, 0..64)) {
            let mut q = TxQueue::new();
            for c in counts.drain(..) {
                q.insert(packet(c));
            }
            let mut last = None;
            while let Some(p) = q.pop() {
                if let Some(last) = last {
                    proptest::prop_assert!(p.count_us >= last);
                }
                last = Some(p.count_us);
            }
        }
    }
}
