//! Server side model of a client's back/forward navigation history.
//!
//! Application code records reversible [`HistoryEntry`] values through a
//! [`HistoryControl`]. The control mirrors them into client navigation
//! frames via a [`Presentation`] and, when the client reports a different
//! checkpoint, undoes or redoes entries until both sides agree again.

pub mod config;
pub mod control;
pub mod entry;
pub mod error;
pub mod presentation;
pub mod protocol;
pub mod queue;

pub use crate::config::Config;
pub use crate::control::{HistoryControl, ReplayStep, Traversal};
pub use crate::entry::{FnEntry, HistoryEntry, IdentifiedEntry, SAFETY_ID};
pub use crate::error::HistoryError;
pub use crate::presentation::{FrameId, Presentation, WarnMode, WarningKind};
pub use crate::protocol::{dispatch, Request, Response};
pub use crate::queue::HistoryQueue;
