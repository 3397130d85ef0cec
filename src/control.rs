use tracing::{debug, info, warn};

use crate::config::Config;
use crate::entry::{HistoryEntry, SAFETY_ID};
use crate::error::Result;
use crate::presentation::{FrameId, Presentation, WarnMode, WarningKind};
use crate::queue::HistoryQueue;

/// What a checkpoint change did to the history.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum Traversal {
    Unchanged,
    Undone(usize),
    Redone(usize),
    /// The view was forced back to the current entry.
    Reverted,
    /// The session is being left.
    Left,
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub enum ReplayStep {
    /// The client frame was pointed at the entry with this id.
    Step(String),
    Done,
    /// The request came from a frame that is not the most recent one.
    Ignored,
}

/// Keeps the client's native navigation history in line with the
/// [`HistoryQueue`].
///
/// Every bracket level that received entries owns one client frame. Adding
/// an entry at a level without a frame installs one, which is what creates
/// a native back step for the client.
pub struct HistoryControl<C, P> {
    queue: HistoryQueue<C>,
    presentation: P,
    frames: Vec<(usize, FrameId)>,
    not_undoable: WarnMode,
    logout: WarnMode,
}

impl<C, P: Presentation> HistoryControl<C, P> {
    pub fn new(max_size: usize, presentation: P) -> Self {
        Self {
            queue: HistoryQueue::new(max_size),
            presentation,
            frames: Vec::new(),
            not_undoable: WarnMode::default(),
            logout: WarnMode::default(),
        }
    }

    pub fn from_config(config: &Config, presentation: P) -> Self {
        Self::new(config.history_size, presentation)
            .with_warn_modes(config.not_undoable_warn_mode, config.logout_warn_mode)
    }

    pub fn with_warn_modes(mut self, not_undoable: WarnMode, logout: WarnMode) -> Self {
        self.not_undoable = not_undoable;
        self.logout = logout;
        self
    }

    pub fn queue(&self) -> &HistoryQueue<C> {
        &self.queue
    }

    pub fn presentation(&self) -> &P {
        &self.presentation
    }

    pub fn presentation_mut(&mut self) -> &mut P {
        &mut self.presentation
    }

    /// Installed frames with the bracket level they belong to, innermost last.
    pub fn frames(&self) -> &[(usize, FrameId)] {
        &self.frames
    }

    pub fn add_history(&mut self, entry: Box<dyn HistoryEntry<C>>) -> String {
        let previous = self.queue.current().id().to_string();
        let id = self.queue.add(entry);
        let depth = self.queue.stack_depth();

        let frame = match self.frames.last() {
            Some(&(level, frame)) if level == depth => frame,
            _ => self.install_frame(depth, &previous),
        };
        self.presentation.update_frame(frame, &id);
        id
    }

    fn install_frame(&mut self, level: usize, anchor: &str) -> FrameId {
        let frame = self.presentation.allocate_frame(level);
        info!(%frame, level, anchor, "history frame installed");
        self.presentation.update_frame(frame, anchor);
        self.frames.push((level, frame));
        frame
    }

    pub fn push(&mut self) {
        self.queue.push();
    }

    pub fn pop(&mut self) -> Result<()> {
        self.queue.pop()?;
        let depth = self.queue.stack_depth();
        while let Some(&(level, frame)) = self.frames.last() {
            if level <= depth {
                break;
            }
            self.presentation.remove_frame(frame);
            self.frames.pop();
            info!(%frame, level, "history frame removed");
        }
        Ok(())
    }

    /// The client now shows the checkpoint `requested`. Undoes or redoes
    /// entries until the queue agrees, or reverts the client.
    ///
    /// Only contract violations are returned as errors.
    pub fn checkpoint_changed(
        &mut self,
        ctx: &mut C,
        requested: &str,
        source: FrameId,
    ) -> Result<Traversal> {
        let index = self.queue.index();
        debug!(requested, %source, index, "checkpoint changed");

        let target = match self.queue.index_of(requested) {
            Some(target) if requested != SAFETY_ID => target,
            _ => return Ok(self.synchronization_lost(requested)),
        };

        if target < index {
            self.undo_to(ctx, target)
        } else if target > index {
            self.redo_to(ctx, target)
        } else {
            Ok(Traversal::Unchanged)
        }
    }

    fn undo_to(&mut self, ctx: &mut C, target: usize) -> Result<Traversal> {
        let mut steps = 0;
        while self.queue.index() > target {
            if self.queue.current().ends_stack() || self.queue.previous().ends_stack() {
                match self.not_undoable {
                    WarnMode::Dialog => {
                        warn!(id = self.queue.current().id(), "step crosses an open stack");
                        self.presentation.show_warning(WarningKind::NotUndoable);
                        return Ok(self.revert());
                    }
                    WarnMode::Ignore => return Ok(self.revert()),
                    WarnMode::Continue => {
                        debug!(id = self.queue.current().id(), "undo crosses an open stack");
                    }
                }
            }

            let entry = self.queue.current_mut();
            debug!(id = entry.id(), title = %entry.title(ctx), "undo");
            if let Err(err) = entry.undo(ctx) {
                if err.is_contract_violation() {
                    return Err(err);
                }
                warn!(%err, "undo failed");
                self.presentation.show_warning(WarningKind::StepFailed);
                return Ok(self.revert());
            }
            self.queue.step_back()?;
            steps += 1;
        }
        Ok(Traversal::Undone(steps))
    }

    fn redo_to(&mut self, ctx: &mut C, target: usize) -> Result<Traversal> {
        let mut steps = 0;
        while self.queue.index() < target {
            self.queue.step_forward()?;
            let entry = self.queue.current_mut();
            debug!(id = entry.id(), title = %entry.title(ctx), "redo");
            if let Err(err) = entry.redo(ctx) {
                if err.is_contract_violation() {
                    return Err(err);
                }
                self.queue.step_back()?;
                warn!(%err, "redo failed");
                self.presentation.show_warning(WarningKind::StepFailed);
                return Ok(self.revert());
            }
            steps += 1;
        }
        Ok(Traversal::Redone(steps))
    }

    fn revert(&mut self) -> Traversal {
        let id = self.queue.current().id().to_string();
        debug!(id = %id, "reverting view");
        self.presentation.revert_view(&id);
        Traversal::Reverted
    }

    fn synchronization_lost(&mut self, requested: &str) -> Traversal {
        warn!(requested, "checkpoint not in history");
        match self.logout {
            WarnMode::Dialog => {
                self.presentation
                    .show_warning(WarningKind::SynchronizationLost);
                self.revert()
            }
            WarnMode::Ignore => self.revert(),
            WarnMode::Continue => {
                info!("leaving session");
                self.presentation.leave_session();
                Traversal::Left
            }
        }
    }

    /// The client lost its frames. `source` becomes the outermost frame and
    /// replay starts after position `from_index`.
    pub fn start_replay(&mut self, from_index: usize, source: FrameId) {
        self.queue.set_replay_index(from_index);
        // A bracket opened before the first entry has no anchor node, so the
        // front of the history takes the level of the entry that follows it.
        let level = match self.queue.replay_index() {
            0 => self
                .queue
                .iter(false)
                .next()
                .map_or(self.queue.stack_depth(), |entry| entry.stack_depth()),
            _ => self.queue.replay_current().stack_depth(),
        };
        self.frames.clear();
        self.frames.push((level, source));
        info!(
            from_index = self.queue.replay_index(),
            to_index = self.queue.index(),
            %source,
            "replay started"
        );
    }

    /// Points the client at the next entry to replay.
    pub fn continue_replay(&mut self, source: FrameId) -> Result<ReplayStep> {
        let top = match self.frames.last() {
            Some(&(_, top)) if top == source => top,
            _ => {
                warn!(%source, "replay request from stale frame");
                return Ok(ReplayStep::Ignored);
            }
        };
        if self.queue.replay_index() >= self.queue.index() {
            info!(index = self.queue.index(), "replay done");
            return Ok(ReplayStep::Done);
        }

        let previous = self.queue.replay_current();
        let crossed = previous.ends_stack();
        let anchor = previous.id().to_string();

        self.queue.increase_replay_index()?;
        let entry = self.queue.replay_current();
        let id = entry.id().to_string();
        let level = entry.stack_depth();

        let frame = if crossed {
            self.install_frame(level, &anchor)
        } else {
            top
        };
        self.presentation.update_frame(frame, &id);
        debug!(id = %id, %frame, replay_index = self.queue.replay_index(), "replayed");
        Ok(ReplayStep::Step(id))
    }
}
