use bevy::prelude::*;

/// Request/response protocol for framebuffer picks.
///
/// At most one request is outstanding; submitting while one is pending
/// supersedes it (last writer wins, no queueing). A superseded request is
/// reported explicitly rather than silently dropped, so callers waiting on
/// a generation always hear back exactly once.
#[derive(Default)]
pub struct PickQueue {
    next_generation: u64,
    pending: Option<(u64, Vec2)>,
    superseded: Vec<u64>,
}

impl PickQueue {
    /// Submit a pick at `position`, returning its generation. Any pending
    /// request is moved to the superseded list.
    pub fn submit(&mut self, position: Vec2) -> u64 {
        if let Some((old, _)) = self.pending.take() {
            self.superseded.push(old);
        }
        self.next_generation += 1;
        self.pending = Some((self.next_generation, position));
        self.next_generation
    }

    pub fn pending(&self) -> Option<(u64, Vec2)> {
        self.pending
    }

    /// Take the pending request for resolution. The readback path calls this
    /// once per completed frame; the coordinates are the latest submitted,
    /// so a request superseded before the readback never resolves.
    pub fn complete(&mut self) -> Option<(u64, Vec2)> {
        self.pending.take()
    }

    /// Drain the generations superseded since the last call.
    pub fn drain_superseded(&mut self) -> Vec<u64> {
        std::mem::take(&mut self.superseded)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn generations_are_monotonic() {
        let mut queue = PickQueue::default();
        let a = queue.submit(Vec2::new(1.0, 1.0));
        queue.complete();
        let b = queue.submit(Vec2::new(2.0, 2.0));
        assert!(b > a);
    }

    #[test]
    fn second_submit_supersedes_the_first() {
        let mut queue = PickQueue::default();
        let first = queue.submit(Vec2::new(100.0, 200.0));
        let second = queue.submit(Vec2::new(150.0, 250.0));

        // The earlier request is reported superseded, exactly once.
        assert_eq!(queue.drain_superseded(), vec![first]);
        assert!(queue.drain_superseded().is_empty());

        // Exactly one request resolves, carrying the later coordinates.
        let (generation, position) = queue.complete().unwrap();
        assert_eq!(generation, second);
        assert_eq!(position, Vec2::new(150.0, 250.0));
        assert!(queue.complete().is_none());
    }

    #[test]
    fn complete_without_pending_is_none() {
        let mut queue = PickQueue::default();
        assert!(queue.complete().is_none());
    }
}
