use std::sync::{Arc, Mutex, MutexGuard, PoisonError, Weak};
use std::time::Duration;

use tracing::debug;

use super::timer::ScopedTimer;

/// Time given to the surrounding layout to settle before focusing.
pub const SETTLE_DELAY: Duration = Duration::from_millis(10);

/// Measures how tall the editor must be to show `text` without scrolling.
pub trait TextMetrics: Send + Sync {
    fn content_height(&self, text: &str) -> u32;
}

/// Fixed-pitch measurement: wrapped line count times line height.
#[derive(Debug, Clone, Copy)]
pub struct MonospaceMetrics {
    pub line_height: u32,
    pub columns: usize,
    pub padding: u32,
}

impl Default for MonospaceMetrics {
    fn default() -> Self {
        Self {
            line_height: 20,
            columns: 60,
            padding: 8,
        }
    }
}

impl TextMetrics for MonospaceMetrics {
    fn content_height(&self, text: &str) -> u32 {
        let columns = self.columns.max(1);
        let lines: usize = text
            .split('\n')
            .map(|line| line.chars().count().div_ceil(columns).max(1))
            .sum();
        (lines as u32).saturating_mul(self.line_height) + self.padding
    }
}

/// Callbacks supplied by the owner of the draft.
pub trait CommentEditHandler: Send {
    fn on_change(&mut self, value: String);
    fn on_confirm(&mut self);
    fn on_cancel(&mut self);
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Key {
    Enter,
    Escape,
    Char(char),
    Other,
}

#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct Modifiers {
    pub ctrl: bool,
    /// Command on macOS.
    pub meta: bool,
    pub shift: bool,
    pub alt: bool,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct KeyEvent {
    pub key: Key,
    pub modifiers: Modifiers,
}

impl KeyEvent {
    pub fn plain(key: Key) -> Self {
        Self {
            key,
            modifiers: Modifiers::default(),
        }
    }

    pub fn ctrl(key: Key) -> Self {
        Self {
            key,
            modifiers: Modifiers {
                ctrl: true,
                ..Modifiers::default()
            },
        }
    }

    pub fn meta(key: Key) -> Self {
        Self {
            key,
            modifiers: Modifiers {
                meta: true,
                ..Modifiers::default()
            },
        }
    }

    fn is_confirm_chord(&self) -> bool {
        self.key == Key::Enter && (self.modifiers.ctrl || self.modifiers.meta)
    }
}

/// What the host should do with a key press after the editor saw it.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum KeyOutcome {
    /// Confirm was invoked; the default action (newline) must be suppressed.
    Confirmed,
    Cancelled,
    /// Not ours; let the textarea handle it.
    Default,
}

impl KeyOutcome {
    pub fn prevents_default(self) -> bool {
        matches!(self, KeyOutcome::Confirmed)
    }
}

#[derive(Debug, Default)]
struct Surface {
    value: String,
    focused: bool,
    height: Option<u32>,
    /// Epoch of the current mount; `None` once unmounted.
    mounted: Option<u64>,
}

fn lock(surface: &Mutex<Surface>) -> MutexGuard<'_, Surface> {
    surface.lock().unwrap_or_else(PoisonError::into_inner)
}

/// Runs when the settle timer fires. A callback from an earlier mount, or one
/// that raced with `unmount`, finds a different epoch and does nothing.
fn settle(surface: &Mutex<Surface>, metrics: &dyn TextMetrics, epoch: u64) -> bool {
    let mut surface = lock(surface);
    if surface.mounted != Some(epoch) {
        return false;
    }
    surface.focused = true;
    surface.height = Some(metrics.content_height(&surface.value));
    debug!(height = ?surface.height, "comment editor focused");
    true
}

/// Controlled textarea: the owner holds the draft and pushes it in through
/// `set_value`; user edits go back out through `on_change`.
pub struct CommentEditInput<H: CommentEditHandler> {
    surface: Arc<Mutex<Surface>>,
    metrics: Arc<dyn TextMetrics>,
    handler: H,
    settle: Option<ScopedTimer>,
    epoch: u64,
}

impl<H: CommentEditHandler> CommentEditInput<H> {
    pub fn new(value: impl Into<String>, handler: H, metrics: Arc<dyn TextMetrics>) -> Self {
        Self {
            surface: Arc::new(Mutex::new(Surface {
                value: value.into(),
                ..Surface::default()
            })),
            metrics,
            handler,
            settle: None,
            epoch: 0,
        }
    }

    /// Schedule focus and an initial resize once layout has settled.
    ///
    /// Must be called from within a tokio runtime. Remounting replaces any
    /// pending timer.
    pub fn mount(&mut self) {
        self.epoch += 1;
        let epoch = self.epoch;
        lock(&self.surface).mounted = Some(epoch);

        let surface: Weak<Mutex<Surface>> = Arc::downgrade(&self.surface);
        let metrics = Arc::clone(&self.metrics);
        self.settle = Some(ScopedTimer::after(SETTLE_DELAY, move || {
            if let Some(surface) = surface.upgrade() {
                settle(&surface, metrics.as_ref(), epoch);
            }
        }));
    }

    /// Tear down: cancel a pending settle timer and release focus.
    ///
    /// Aborting cannot stop a callback already running on another worker, so
    /// the mount epoch is cleared under the same lock the callback takes.
    pub fn unmount(&mut self) {
        if let Some(timer) = self.settle.take() {
            timer.cancel();
        }
        let mut surface = lock(&self.surface);
        surface.mounted = None;
        surface.focused = false;
    }

    /// Owner-driven value update; recomputes height to fit.
    pub fn set_value(&mut self, value: impl Into<String>) {
        let mut surface = lock(&self.surface);
        surface.value = value.into();
        surface.height = Some(self.metrics.content_height(&surface.value));
    }

    /// The user edited the text. Forwarded to the owner, not applied here.
    pub fn input(&mut self, value: impl Into<String>) {
        self.handler.on_change(value.into());
    }

    pub fn key_down(&mut self, event: KeyEvent) -> KeyOutcome {
        if event.is_confirm_chord() {
            self.handler.on_confirm();
            KeyOutcome::Confirmed
        } else if event.key == Key::Escape {
            self.handler.on_cancel();
            KeyOutcome::Cancelled
        } else {
            KeyOutcome::Default
        }
    }

    pub fn click_confirm(&mut self) {
        self.handler.on_confirm();
    }

    pub fn click_cancel(&mut self) {
        self.handler.on_cancel();
    }

    pub fn value(&self) -> String {
        lock(&self.surface).value.clone()
    }

    /// `None` until the first measurement.
    pub fn height(&self) -> Option<u32> {
        lock(&self.surface).height
    }

    pub fn is_focused(&self) -> bool {
        lock(&self.surface).focused
    }

    pub fn handler(&self) -> &H {
        &self.handler
    }

    pub fn handler_mut(&mut self) -> &mut H {
        &mut self.handler
    }
}
