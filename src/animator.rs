//! Ticker animation
//!
//! Keeps the on-screen text moving between polls using a typewriter
//! ("reveal") effect: every tick shows one more character of the current
//! text; once the whole text is visible the next tick starts over from
//! empty. A new snapshot restarts the reveal from zero with the new text.
//!
//! The state machine (`RevealAnimator`) is pure and cheap: a tick costs time
//! proportional to the text length and never touches the network. The task
//! started by `start_animator` drives it on its own interval, so a slow poll
//! can never delay a tick.

use crate::{
    constants::MIN_TIMER_PERIOD,
    display::{Publication, SnapshotSubscriber},
    lifecycle::{StopSignal, TaskHandle},
    types::ColorSpan,
};
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::watch;
use tokio::time::MissedTickBehavior;
use uuid::Uuid;

/// Animator states
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AnimatorState {
    /// No snapshot yet, nothing rendered
    Idle,
    /// Revealing `full_text`; the first `offset` chars are visible
    Animating { offset: usize, full_text: String },
    /// Terminal
    Stopped,
}

/// Reveal-mode animation state machine
#[derive(Debug, Clone)]
pub struct RevealAnimator {
    state: AnimatorState,
    /// Char count of the current text
    len: usize,
}

impl Default for RevealAnimator {
    fn default() -> Self {
        Self::new()
    }
}

impl RevealAnimator {
    pub fn new() -> Self {
        Self {
            state: AnimatorState::Idle,
            len: 0,
        }
    }

    pub fn state(&self) -> &AnimatorState {
        &self.state
    }

    /// Switches to `text` and restarts the reveal from empty
    ///
    /// Ignored once stopped.
    pub fn on_snapshot(&mut self, text: String) {
        if self.state == AnimatorState::Stopped {
            return;
        }
        self.len = text.chars().count();
        self.state = AnimatorState::Animating {
            offset: 0,
            full_text: text,
        };
    }

    /// Advances one step and returns the text now visible
    ///
    /// Returns `None` when there is nothing to render (idle or stopped).
    pub fn on_tick(&mut self) -> Option<String> {
        let AnimatorState::Animating { offset, full_text } = &mut self.state else {
            return None;
        };

        if *offset < self.len {
            *offset += 1;
        } else {
            *offset = 0;
        }

        Some(prefix(full_text, *offset).to_string())
    }

    /// Enters the terminal state
    pub fn on_stop(&mut self) {
        self.state = AnimatorState::Stopped;
    }

    /// Text visible right now
    pub fn visible(&self) -> &str {
        match &self.state {
            AnimatorState::Animating { offset, full_text } => prefix(full_text, *offset),
            _ => "",
        }
    }
}

/// First `chars` characters of `text`
fn prefix(text: &str, chars: usize) -> &str {
    match text.char_indices().nth(chars) {
        Some((end, _)) => &text[..end],
        None => text,
    }
}

/// Receiver of animator output, implemented by the front-end
pub trait TickerSink: Send + Sync {
    /// A new snapshot became the animated text
    fn on_snapshot_rendered(&self, publication: &Publication, text: &str, spans: &[ColorSpan]);

    /// The visible text changed
    fn on_animation_tick(&self, text: &str);
}

/// Latest state of the animated ticker, as seen by a front-end
#[derive(Debug, Clone, Default)]
pub struct TickerFrame {
    /// Visible prefix of the full text
    pub visible: String,
    /// Color spans over the full text
    pub spans: Arc<Vec<ColorSpan>>,
    /// Publication currently being animated
    pub publication_id: Option<Uuid>,
    pub sequence: u64,
}

/// `TickerSink` that keeps only the latest frame, for a UI loop to read
#[derive(Debug)]
pub struct FrameChannel {
    tx: watch::Sender<TickerFrame>,
}

impl FrameChannel {
    pub fn new() -> (Self, watch::Receiver<TickerFrame>) {
        let (tx, rx) = watch::channel(TickerFrame::default());
        (Self { tx }, rx)
    }
}

impl TickerSink for FrameChannel {
    fn on_snapshot_rendered(&self, publication: &Publication, _text: &str, spans: &[ColorSpan]) {
        self.tx.send_modify(|frame| {
            frame.visible.clear();
            frame.spans = Arc::new(spans.to_vec());
            frame.publication_id = Some(publication.id);
            frame.sequence = publication.sequence;
        });
    }

    fn on_animation_tick(&self, text: &str) {
        self.tx.send_if_modified(|frame| {
            if frame.visible == text {
                return false;
            }
            frame.visible.clear();
            frame.visible.push_str(text);
            true
        });
    }
}

/// `TickerSink` that logs rendered snapshots, for running without a UI
#[derive(Debug, Default)]
pub struct LogSink;

impl TickerSink for LogSink {
    fn on_snapshot_rendered(&self, publication: &Publication, text: &str, _spans: &[ColorSpan]) {
        tracing::info!(sequence = publication.sequence, "Ticker updated:\n{}", text);
    }

    fn on_animation_tick(&self, text: &str) {
        tracing::trace!(visible = text.chars().count(), "Animation tick");
    }
}

/// Spawns the animation loop
///
/// Consumes publications from `snapshots` and reports to `sink` on every
/// tick of `tick_interval` (at least `MIN_TIMER_PERIOD`) until the handle is
/// stopped.
pub fn start_animator(
    snapshots: SnapshotSubscriber,
    sink: Arc<dyn TickerSink>,
    tick_interval: Duration,
) -> TaskHandle {
    TaskHandle::spawn("ticker-animator", move |stop| {
        run_animator(snapshots, sink, tick_interval, stop)
    })
}

async fn run_animator(
    mut snapshots: SnapshotSubscriber,
    sink: Arc<dyn TickerSink>,
    tick_interval: Duration,
    mut stop: StopSignal,
) {
    let tick_interval = tick_interval.max(MIN_TIMER_PERIOD);
    tracing::debug!(tick_ms = tick_interval.as_millis() as u64, "Starting ticker animator");

    let mut animator = RevealAnimator::new();
    let mut ticker = tokio::time::interval(tick_interval);
    ticker.set_missed_tick_behavior(MissedTickBehavior::Skip);
    let mut publisher_alive = true;

    // Pick up anything published before we started
    if let Some(publication) = snapshots.take_latest() {
        render(&mut animator, sink.as_ref(), &publication);
    }

    loop {
        tokio::select! {
            biased;
            _ = stop.stopped() => break,
            next = snapshots.next(), if publisher_alive => match next {
                Some(publication) => render(&mut animator, sink.as_ref(), &publication),
                None => {
                    tracing::debug!("Snapshot publisher gone, animating last text");
                    publisher_alive = false;
                }
            },
            _ = ticker.tick() => {
                if let Some(visible) = animator.on_tick() {
                    sink.on_animation_tick(&visible);
                }
            }
        }
    }

    animator.on_stop();
    tracing::debug!("Ticker animator stopped");
}

fn render(animator: &mut RevealAnimator, sink: &dyn TickerSink, publication: &Publication) {
    let (text, spans) = publication.snapshot.render();
    sink.on_snapshot_rendered(publication, &text, &spans);
    animator.on_snapshot(text);
}
