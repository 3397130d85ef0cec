use std::fmt;

use serde_derive::Deserialize;

/// Client side navigation frame.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct FrameId(pub u32);

impl fmt::Display for FrameId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "f{}", self.0)
    }
}

#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum WarningKind {
    /// An undo or redo reported a failure.
    StepFailed,
    /// The requested step would cross an open bracket.
    NotUndoable,
    /// The requested checkpoint is unknown; the user is about to leave the
    /// tracked region.
    SynchronizationLost,
}

impl WarningKind {
    pub fn message(&self) -> &'static str {
        use WarningKind::*;
        match self {
            StepFailed => "The step could not be applied.",
            NotUndoable => "This step cannot be undone.",
            SynchronizationLost => {
                "The browser history no longer matches the application. Going further back leaves the application."
            }
        }
    }
}

/// How a warning path reacts.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum WarnMode {
    /// Warn the user and revert the view.
    Dialog,
    /// Revert the view without a warning.
    Ignore,
    /// Let the action through without a warning.
    Continue,
}

impl Default for WarnMode {
    fn default() -> Self {
        WarnMode::Dialog
    }
}

/// Side effects the synchronizer requests from the layer that renders the
/// client. None of the results except the allocated frame id are consulted.
pub trait Presentation {
    fn allocate_frame(&mut self, stack_level: usize) -> FrameId;
    fn update_frame(&mut self, frame: FrameId, target: &str);
    fn remove_frame(&mut self, frame: FrameId);
    fn show_warning(&mut self, kind: WarningKind);
    fn revert_view(&mut self, target: &str);
    fn leave_session(&mut self);
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Call {
    Allocate(usize, FrameId),
    Update(FrameId, String),
    Remove(FrameId),
    Warning(WarningKind),
    Revert(String),
    Leave,
}

/// Presentation that records every call. Frames are numbered from 1.
#[derive(Default, Debug)]
pub struct Recorder {
    pub calls: Vec<Call>,
    next_frame: u32,
}

impl Recorder {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn take(&mut self) -> Vec<Call> {
        std::mem::take(&mut self.calls)
    }

    pub fn warnings(&self) -> Vec<WarningKind> {
        self.calls
            .iter()
            .filter_map(|c| match c {
                Call::Warning(kind) => Some(*kind),
                _ => None,
            })
            .collect()
    }
}

impl Presentation for Recorder {
    fn allocate_frame(&mut self, stack_level: usize) -> FrameId {
        self.next_frame += 1;
        let frame = FrameId(self.next_frame);
        self.calls.push(Call::Allocate(stack_level, frame));
        frame
    }

    fn update_frame(&mut self, frame: FrameId, target: &str) {
        self.calls.push(Call::Update(frame, target.to_string()));
    }

    fn remove_frame(&mut self, frame: FrameId) {
        self.calls.push(Call::Remove(frame));
    }

    fn show_warning(&mut self, kind: WarningKind) {
        self.calls.push(Call::Warning(kind));
    }

    fn revert_view(&mut self, target: &str) {
        self.calls.push(Call::Revert(target.to_string()));
    }

    fn leave_session(&mut self) {
        self.calls.push(Call::Leave);
    }
}
