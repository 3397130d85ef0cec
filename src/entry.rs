use std::fmt;

use crate::error::{HistoryError, Result};
use crate::queue::NodeId;

/// Identifier reserved for the safety entry. Generated ids never collide
/// with it.
pub const SAFETY_ID: &str = "s";

/// One reversible unit of application state change.
///
/// `C` is the application state the entry operates on. It is handed in by
/// the synchronizer for the duration of a single request.
pub trait HistoryEntry<C> {
    fn undo(&mut self, ctx: &mut C) -> Result<()>;
    fn redo(&mut self, ctx: &mut C) -> Result<()>;
    fn title(&self, ctx: &C) -> String;
}

type Step<C> = Box<dyn FnMut(&mut C) -> Result<()>>;

/// Entry built from a pair of closures.
pub struct FnEntry<C> {
    title: String,
    undo: Step<C>,
    redo: Step<C>,
}

impl<C> FnEntry<C> {
    pub fn new<U, R>(title: impl Into<String>, undo: U, redo: R) -> Self
    where
        U: FnMut(&mut C) -> Result<()> + 'static,
        R: FnMut(&mut C) -> Result<()> + 'static,
    {
        Self {
            title: title.into(),
            undo: Box::new(undo),
            redo: Box::new(redo),
        }
    }
}

impl<C> HistoryEntry<C> for FnEntry<C> {
    fn undo(&mut self, ctx: &mut C) -> Result<()> {
        (self.undo)(ctx)
    }

    fn redo(&mut self, ctx: &mut C) -> Result<()> {
        (self.redo)(ctx)
    }

    fn title(&self, _ctx: &C) -> String {
        self.title.clone()
    }
}

pub(crate) enum Payload<C> {
    Safety,
    Entry(Box<dyn HistoryEntry<C>>),
}

/// Node of the history queue: an entry together with its id and the
/// bracket bookkeeping.
pub struct IdentifiedEntry<C> {
    id: String,
    stack_depth: usize,
    pub(crate) ends_stack: bool,
    payload: Payload<C>,
    pub(crate) prev: Option<NodeId>,
    pub(crate) next: Option<NodeId>,
}

impl<C> IdentifiedEntry<C> {
    pub(crate) fn new(id: String, stack_depth: usize, entry: Box<dyn HistoryEntry<C>>) -> Self {
        Self {
            id,
            stack_depth,
            ends_stack: false,
            payload: Payload::Entry(entry),
            prev: None,
            next: None,
        }
    }

    pub(crate) fn safety() -> Self {
        Self {
            id: SAFETY_ID.to_string(),
            stack_depth: 0,
            ends_stack: false,
            payload: Payload::Safety,
            prev: None,
            next: None,
        }
    }

    pub fn id(&self) -> &str {
        &self.id
    }

    pub fn stack_depth(&self) -> usize {
        self.stack_depth
    }

    pub fn ends_stack(&self) -> bool {
        self.ends_stack
    }

    pub fn is_safety(&self) -> bool {
        matches!(self.payload, Payload::Safety)
    }

    pub fn undo(&mut self, ctx: &mut C) -> Result<()> {
        match &mut self.payload {
            Payload::Safety => Err(HistoryError::SafetyEntry),
            Payload::Entry(e) => e.undo(ctx),
        }
    }

    pub fn redo(&mut self, ctx: &mut C) -> Result<()> {
        match &mut self.payload {
            Payload::Safety => Err(HistoryError::SafetyEntry),
            Payload::Entry(e) => e.redo(ctx),
        }
    }

    pub fn title(&self, ctx: &C) -> String {
        match &self.payload {
            Payload::Safety => String::new(),
            Payload::Entry(e) => e.title(ctx),
        }
    }
}

impl<C> fmt::Debug for IdentifiedEntry<C> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("IdentifiedEntry")
            .field("id", &self.id)
            .field("stack_depth", &self.stack_depth)
            .field("ends_stack", &self.ends_stack)
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn counter(step: i32) -> FnEntry<Vec<i32>> {
        FnEntry::new(
            format!("add {}", step),
            move |v: &mut Vec<i32>| match v.pop() {
                Some(n) if n == step => Ok(()),
                _ => Err(HistoryError::UndoFailed(format!("{} is not on top", step))),
            },
            move |v: &mut Vec<i32>| {
                v.push(step);
                Ok(())
            },
        )
    }

    #[test]
    fn test_safety_entry_refuses() {
        let mut safety = IdentifiedEntry::<Vec<i32>>::safety();
        let mut v = vec![];
        assert!(safety.is_safety());
        assert_eq!(safety.id(), SAFETY_ID);
        assert_eq!(safety.undo(&mut v), Err(HistoryError::SafetyEntry));
        assert_eq!(safety.redo(&mut v), Err(HistoryError::SafetyEntry));
    }

    #[test]
    fn test_undo_then_redo_restores() {
        let mut entry = IdentifiedEntry::new("h1".into(), 0, Box::new(counter(7)));
        let mut v = vec![1, 7];
        entry.undo(&mut v).unwrap();
        assert_eq!(v, vec![1]);
        entry.redo(&mut v).unwrap();
        assert_eq!(v, vec![1, 7]);
        assert_eq!(entry.title(&v), "add 7");
    }

    #[test]
    fn test_failed_undo_is_reported() {
        let mut entry = IdentifiedEntry::new("h1".into(), 0, Box::new(counter(7)));
        let mut v = vec![3];
        assert!(matches!(entry.undo(&mut v), Err(HistoryError::UndoFailed(_))));
    }
}
