/// Handle for one requested redraw callback.
#[derive(Debug, Copy, Clone, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct FrameHandle(pub u64);

/// Redraw-callback capability (`requestAnimationFrame` and friends).
///
/// A request fires at most once. Hosts deliver the frame to whoever asked
/// for it; the requester then calls [`FrameScheduler::frame_delivered`] so
/// the scheduler can drop its bookkeeping.
pub trait FrameScheduler {
    fn schedule_frame(&mut self) -> FrameHandle;

    /// Returns `true` if the request was still pending.
    fn cancel_frame(&mut self, handle: FrameHandle) -> bool;

    fn frame_delivered(&mut self, _handle: FrameHandle) {}
}

/// Deterministic in-process frame source.
///
/// Records pending requests so a host loop (or a test) can see whether
/// anyone still wants a frame.
#[derive(Debug, Default)]
pub struct FrameRequests {
    next_id: u64,
    pending: Vec<FrameHandle>,
    cancelled: u64,
}

impl FrameRequests {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn pending(&self) -> &[FrameHandle] {
        &self.pending
    }

    pub fn has_pending(&self) -> bool {
        !self.pending.is_empty()
    }

    /// Total number of requests cancelled before delivery.
    pub fn cancelled_count(&self) -> u64 {
        self.cancelled
    }
}

impl FrameScheduler for FrameRequests {
    fn schedule_frame(&mut self) -> FrameHandle {
        let handle = FrameHandle(self.next_id);
        self.next_id = self.next_id.wrapping_add(1);
        self.pending.push(handle);
        handle
    }

    fn cancel_frame(&mut self, handle: FrameHandle) -> bool {
        let before = self.pending.len();
        self.pending.retain(|h| *h != handle);
        let removed = self.pending.len() != before;
        if removed {
            self.cancelled += 1;
        }
        removed
    }

    fn frame_delivered(&mut self, handle: FrameHandle) {
        self.pending.retain(|h| *h != handle);
    }
}
