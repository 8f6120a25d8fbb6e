use std::collections::VecDeque;
use std::sync::Arc;

use voxmap_raster::Canvas;

use crate::host::{RecipientId, Transport};

pub const DEFAULT_BATCH_SIZE: usize = 10;

#[derive(Clone, Debug)]
pub struct Delivery {
    pub recipient: RecipientId,
    pub tile_id: u64,
    pub image: Arc<Canvas>,
}

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct StepReport {
    pub sent: usize,
    pub skipped: usize,
}

impl StepReport {
    pub fn attempted(&self) -> usize {
        self.sent + self.skipped
    }
}

/// Spreads tile pushes over successive ticks, `batch_size` attempts per step.
///
/// Every queued delivery is attempted exactly once. Recipients that have
/// disconnected by the time their turn comes are skipped.
#[derive(Debug)]
pub struct DeliveryScheduler {
    batch_size: usize,
    queue: VecDeque<Delivery>,
    sent_total: u64,
    skipped_total: u64,
}

impl Default for DeliveryScheduler {
    fn default() -> Self {
        Self::new(DEFAULT_BATCH_SIZE)
    }
}

impl DeliveryScheduler {
    pub fn new(batch_size: usize) -> Self {
        Self {
            batch_size: batch_size.max(1),
            queue: VecDeque::new(),
            sent_total: 0,
            skipped_total: 0,
        }
    }

    pub fn batch_size(&self) -> usize {
        self.batch_size
    }

    pub fn enqueue<I>(&mut self, deliveries: I)
    where
        I: IntoIterator<Item = Delivery>,
    {
        self.queue.extend(deliveries);
    }

    /// Attempts the next batch.
    pub fn step<T: Transport + ?Sized>(&mut self, transport: &T) -> StepReport {
        let mut report = StepReport::default();
        while report.attempted() < self.batch_size {
            let Some(d) = self.queue.pop_front() else {
                break;
            };
            if transport.is_connected(d.recipient) {
                transport.send_tile(d.recipient, d.tile_id, &d.image);
                report.sent += 1;
            } else {
                report.skipped += 1;
            }
        }
        self.sent_total += report.sent as u64;
        self.skipped_total += report.skipped as u64;
        report
    }

    pub fn pending(&self) -> usize {
        self.queue.len()
    }

    pub fn is_idle(&self) -> bool {
        self.queue.is_empty()
    }

    /// Lifetime `(sent, skipped)` counts.
    pub fn totals(&self) -> (u64, u64) {
        (self.sent_total, self.skipped_total)
    }
}
