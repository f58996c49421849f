//! Load gating and frame scheduling.
//!
//! The scheduler starts in [`SchedulerState::Waiting`] and flips to
//! [`SchedulerState::Running`] exactly once, when the font completion handler
//! calls [`FrameScheduler::start`]. That transition issues the first frame
//! request; every completed tick issues the next one. Nothing is requested
//! while waiting, so a host loop driven by these requests can never run tick
//! work before the scene is populated.

use instant::Instant;

/// Monotonic "assets are in" flag. `false` until the font completion handler ran.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct LoadState(bool);

impl LoadState {
    pub fn is_loaded(&self) -> bool {
        self.0
    }

    /// Returns `true` only for the call that performed the transition.
    pub fn mark_loaded(&mut self) -> bool {
        let transitioned = !self.0;
        self.0 = true;
        transitioned
    }
}

/// Something that can arrange for one more tick on the next display refresh.
pub trait FrameRequester {
    fn request_frame(&mut self);
}

#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub enum SchedulerState {
    #[default]
    Waiting,
    Running,
}

/// What a single tick did.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum TickOutcome {
    /// Not running yet; nothing was touched and nothing was requested.
    Skipped,
    Rendered { frame: u64, elapsed: f32 },
}

/// Seconds since the scheduler started.
#[derive(Debug, Default, Clone, Copy)]
pub struct FrameClock {
    start: Option<Instant>,
}

impl FrameClock {
    fn start(&mut self) {
        self.start.get_or_insert_with(Instant::now);
    }

    pub fn elapsed(&self) -> f32 {
        self.start
            .map(|start| start.elapsed().as_secs_f32())
            .unwrap_or(0.0)
    }
}

#[derive(Debug, Default)]
pub struct FrameScheduler {
    state: SchedulerState,
    clock: FrameClock,
    frames: u64,
    requests: u64,
}

impl FrameScheduler {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn state(&self) -> SchedulerState {
        self.state
    }

    pub fn is_running(&self) -> bool {
        self.state == SchedulerState::Running
    }

    /// WAITING -> RUNNING, issuing the first frame request. Later calls do nothing and return `false`.
    pub fn start(&mut self, requester: &mut impl FrameRequester) -> bool {
        if self.is_running() {
            return false;
        }
        self.state = SchedulerState::Running;
        self.clock.start();
        log::info!("frame scheduler running");
        self.request(requester);
        true
    }

    /// Elapsed seconds since [`start`](Self::start); `0.0` while waiting.
    pub fn elapsed(&self) -> f32 {
        self.clock.elapsed()
    }

    /// Record a finished tick and ask for the next one.
    pub(crate) fn complete_frame(&mut self, requester: &mut impl FrameRequester) -> u64 {
        self.frames += 1;
        self.request(requester);
        self.frames
    }

    fn request(&mut self, requester: &mut impl FrameRequester) {
        self.requests += 1;
        requester.request_frame();
    }

    /// Ticks completed so far.
    pub fn frames(&self) -> u64 {
        self.frames
    }

    /// Frame requests issued so far (the start request included).
    pub fn requests(&self) -> u64 {
        self.requests
    }
}
