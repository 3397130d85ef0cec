use std::convert::TryFrom;

use tracing::debug;

use crate::control::{HistoryControl, ReplayStep, Traversal};
use crate::error::Result;
use crate::presentation::{FrameId, Presentation};

pub trait Message {
    type Result;
}

/// Handles one inbound request against the state `C` of a session.
pub trait Handler<C, M: Message> {
    fn handle(&mut self, ctx: &mut C, msg: M) -> M::Result;
}

/// The client's native history now shows `requested`.
#[derive(Clone, Debug, PartialEq)]
pub struct CheckpointChanged {
    pub requested: String,
    pub source: FrameId,
}

impl Message for CheckpointChanged {
    type Result = Result<Traversal>;
}

/// The client has no usable history and asks to rebuild it after
/// `from_index`. Negative indices start from the front.
#[derive(Clone, Debug, PartialEq)]
pub struct StartReplay {
    pub from_index: i64,
    pub source: FrameId,
}

impl Message for StartReplay {
    type Result = ();
}

/// A replayed frame finished loading and asks for the next entry.
#[derive(Clone, Debug, PartialEq)]
pub struct ContinueReplay {
    pub source: FrameId,
}

impl Message for ContinueReplay {
    type Result = Result<ReplayStep>;
}

impl<C, P: Presentation> Handler<C, CheckpointChanged> for HistoryControl<C, P> {
    fn handle(&mut self, ctx: &mut C, msg: CheckpointChanged) -> Result<Traversal> {
        self.checkpoint_changed(ctx, &msg.requested, msg.source)
    }
}

impl<C, P: Presentation> Handler<C, StartReplay> for HistoryControl<C, P> {
    fn handle(&mut self, _ctx: &mut C, msg: StartReplay) {
        let from_index = usize::try_from(msg.from_index).unwrap_or(0);
        self.start_replay(from_index, msg.source);
    }
}

impl<C, P: Presentation> Handler<C, ContinueReplay> for HistoryControl<C, P> {
    fn handle(&mut self, _ctx: &mut C, msg: ContinueReplay) -> Result<ReplayStep> {
        self.continue_replay(msg.source)
    }
}

#[derive(Clone, Debug, PartialEq)]
pub enum Request {
    CheckpointChanged(CheckpointChanged),
    StartReplay(StartReplay),
    ContinueReplay(ContinueReplay),
}

#[derive(Clone, Debug, PartialEq)]
pub enum Response {
    Traversal(Traversal),
    ReplayStarted,
    Replay(ReplayStep),
}

pub fn dispatch<C, P: Presentation>(
    control: &mut HistoryControl<C, P>,
    ctx: &mut C,
    request: Request,
) -> Result<Response> {
    debug!(?request, "history request");
    match request {
        Request::CheckpointChanged(msg) => control.handle(ctx, msg).map(Response::Traversal),
        Request::StartReplay(msg) => {
            control.handle(ctx, msg);
            Ok(Response::ReplayStarted)
        }
        Request::ContinueReplay(msg) => control.handle(ctx, msg).map(Response::Replay),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::entry::FnEntry;
    use crate::presentation::Recorder;

    fn control_with(count: usize) -> (HistoryControl<u32, Recorder>, Vec<String>) {
        let mut control = HistoryControl::new(10, Recorder::new());
        let ids = (0..count)
            .map(|_| {
                control.add_history(Box::new(FnEntry::new(
                    "step",
                    |n: &mut u32| {
                        *n -= 1;
                        Ok(())
                    },
                    |n: &mut u32| {
                        *n += 1;
                        Ok(())
                    },
                )))
            })
            .collect();
        (control, ids)
    }

    #[test]
    fn test_dispatch_checkpoint_changed() {
        let (mut control, ids) = control_with(3);
        let mut n = 3;
        let request = Request::CheckpointChanged(CheckpointChanged {
            requested: ids[0].clone(),
            source: FrameId(1),
        });
        assert_eq!(
            dispatch(&mut control, &mut n, request),
            Ok(Response::Traversal(Traversal::Undone(2)))
        );
        assert_eq!(n, 1);
    }

    #[test]
    fn test_dispatch_replay() {
        let (mut control, ids) = control_with(2);
        let mut n = 2;
        let start = Request::StartReplay(StartReplay {
            from_index: -4,
            source: FrameId(9),
        });
        assert_eq!(
            dispatch(&mut control, &mut n, start),
            Ok(Response::ReplayStarted)
        );
        assert_eq!(control.queue().replay_index(), 0);

        let next = Request::ContinueReplay(ContinueReplay { source: FrameId(9) });
        assert_eq!(
            dispatch(&mut control, &mut n, next.clone()),
            Ok(Response::Replay(ReplayStep::Step(ids[0].clone())))
        );
        assert_eq!(
            dispatch(&mut control, &mut n, next.clone()),
            Ok(Response::Replay(ReplayStep::Step(ids[1].clone())))
        );
        assert_eq!(
            dispatch(&mut control, &mut n, next),
            Ok(Response::Replay(ReplayStep::Done))
        );
        assert_eq!(n, 2);
    }

    #[test]
    fn test_handler_directly() {
        let (mut control, ids) = control_with(1);
        let mut n = 1;
        let result = control.handle(
            &mut n,
            CheckpointChanged {
                requested: ids[0].clone(),
                source: FrameId(1),
            },
        );
        assert_eq!(result, Ok(Traversal::Unchanged));
    }
}
