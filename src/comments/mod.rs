//! Client-side comment editing; UI state only.

pub mod edit_input;
pub mod timer;

pub use edit_input::{
    CommentEditHandler, CommentEditInput, Key, KeyEvent, KeyOutcome, Modifiers, MonospaceMetrics,
    TextMetrics, SETTLE_DELAY,
};
pub use timer::ScopedTimer;
