use std::cell::Cell;
use std::rc::Rc;

use crate::frame::FrameInfo;

/// Host primitive that asks for one callback at the next display refresh
pub trait FrameScheduler {
    fn request_frame(&self);
}

/// Cancellation token for a render loop; clones share state
#[derive(Debug, Clone, Default)]
pub struct LoopHandle {
    canceled: Rc<Cell<bool>>,
}

impl LoopHandle {
    /// Stops future frames; returns false if already canceled
    pub fn cancel(&self) -> bool {
        !self.canceled.replace(true)
    }

    pub fn is_canceled(&self) -> bool {
        self.canceled.get()
    }
}

/// Repeating per-frame task driven by a `FrameScheduler`
///
/// At most one frame is outstanding: a new frame is requested only after the
/// previous callback returns, and never once the handle is canceled.
pub struct RenderLoop<S: FrameScheduler> {
    scheduler: S,
    handle: LoopHandle,
    frame_pending: bool,
    frame_number: u64,
    time: f32,
}

impl<S: FrameScheduler> RenderLoop<S> {
    /// Requests the first frame
    pub fn start(scheduler: S) -> Self {
        scheduler.request_frame();
        Self {
            scheduler,
            handle: LoopHandle::default(),
            frame_pending: true,
            frame_number: 0,
            time: 0.0,
        }
    }

    pub fn handle(&self) -> LoopHandle {
        self.handle.clone()
    }

    pub fn cancel(&self) -> bool {
        self.handle.cancel()
    }

    pub fn is_active(&self) -> bool {
        !self.handle.is_canceled()
    }

    /// Whether a frame has been requested and not yet run
    pub fn frame_pending(&self) -> bool {
        self.frame_pending && self.is_active()
    }

    pub fn frames_run(&self) -> u64 {
        self.frame_number
    }

    /// Runs the callback for the requested frame, then schedules the next
    ///
    /// Returns `None` without calling back when no frame is pending (a refresh
    /// the loop did not ask for) or the loop is canceled.
    pub fn run_frame(&mut self, delta: f32, callback: impl FnOnce(&FrameInfo)) -> Option<FrameInfo> {
        if !self.frame_pending() {
            return None;
        }
        self.frame_pending = false;

        self.time += delta;
        let frame = FrameInfo::new(self.frame_number, self.time, delta);
        self.frame_number += 1;

        callback(&frame);

        if self.is_active() {
            self.scheduler.request_frame();
            self.frame_pending = true;
        }
        Some(frame)
    }
}

impl<S: FrameScheduler> Drop for RenderLoop<S> {
    fn drop(&mut self) {
        self.handle.cancel();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[derive(Default, Clone)]
    struct CountingScheduler {
        requests: Rc<Cell<u32>>,
    }

    impl FrameScheduler for CountingScheduler {
        fn request_frame(&self) {
            self.requests.set(self.requests.get() + 1);
        }
    }

    #[test]
    fn start_requests_first_frame() {
        let scheduler = CountingScheduler::default();
        let render_loop = RenderLoop::start(scheduler.clone());

        assert_eq!(scheduler.requests.get(), 1);
        assert!(render_loop.frame_pending());
    }

    #[test]
    fn each_frame_schedules_exactly_one_more() {
        let scheduler = CountingScheduler::default();
        let mut render_loop = RenderLoop::start(scheduler.clone());
        let mut seen = Vec::new();

        for _ in 0..5 {
            render_loop.run_frame(0.016, |f| seen.push(f.number));
        }

        assert_eq!(seen, vec![0, 1, 2, 3, 4]);
        assert_eq!(scheduler.requests.get(), 6);
    }

    #[test]
    fn unrequested_refresh_is_skipped() {
        let scheduler = CountingScheduler::default();
        let mut render_loop = RenderLoop::start(scheduler.clone());
        render_loop.frame_pending = false;

        let mut called = false;
        assert!(render_loop.run_frame(0.016, |_| called = true).is_none());
        assert!(!called);
    }

    #[test]
    fn cancel_mid_frame_finishes_but_stops_scheduling() {
        let scheduler = CountingScheduler::default();
        let mut render_loop = RenderLoop::start(scheduler.clone());
        let handle = render_loop.handle();
        let mut finished = false;

        let frame = render_loop.run_frame(0.016, |_| {
            handle.cancel();
            finished = true;
        });

        assert!(frame.is_some());
        assert!(finished);
        assert_eq!(scheduler.requests.get(), 1);
        assert!(render_loop.run_frame(0.016, |_| panic!("frame after cancel")).is_none());
    }

    #[test]
    fn cancel_is_idempotent() {
        let render_loop = RenderLoop::start(CountingScheduler::default());
        let handle = render_loop.handle();

        assert!(handle.cancel());
        assert!(!handle.cancel());
        assert!(!render_loop.cancel());
        assert!(handle.is_canceled());
        assert!(!render_loop.is_active());
    }

    #[test]
    fn dropping_the_loop_cancels_its_handle() {
        let render_loop = RenderLoop::start(CountingScheduler::default());
        let handle = render_loop.handle();
        drop(render_loop);
        assert!(handle.is_canceled());
    }

    #[test]
    fn frame_time_accumulates() {
        let mut render_loop = RenderLoop::start(CountingScheduler::default());
        render_loop.run_frame(0.5, |_| {});
        let frame = render_loop.run_frame(0.25, |_| {}).unwrap();

        assert_eq!(frame.time, 0.75);
        assert_eq!(frame.delta, 0.25);
        assert_eq!(render_loop.frames_run(), 2);
    }
}
