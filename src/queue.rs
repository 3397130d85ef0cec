use tracing::{debug, warn};

use crate::entry::{HistoryEntry, IdentifiedEntry};
use crate::error::{HistoryError, Result};

/// Slot of a node in the queue arena.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub(crate) struct NodeId(usize);

/// Bounded history of identified entries with a current cursor, a replay
/// cursor and the bracket depth.
///
/// Index `0` never addresses a node: it stands for the safety entry which
/// logically precedes the first entry. Index `n` addresses the `n`-th node
/// counted from the front.
pub struct HistoryQueue<C> {
    slots: Vec<Option<IdentifiedEntry<C>>>,
    free: Vec<usize>,
    max_size: usize,
    size: usize,
    index: usize,
    replay_index: usize,
    stack_depth: usize,
    first: Option<NodeId>,
    last: Option<NodeId>,
    current: Option<NodeId>,
    replay: Option<NodeId>,
    mod_count: u64,
    next_id: u64,
    safety: IdentifiedEntry<C>,
}

impl<C> HistoryQueue<C> {
    pub fn new(max_size: usize) -> Self {
        Self {
            slots: Vec::new(),
            free: Vec::new(),
            max_size,
            size: 0,
            index: 0,
            replay_index: 0,
            stack_depth: 0,
            first: None,
            last: None,
            current: None,
            replay: None,
            mod_count: 0,
            next_id: 0,
            safety: IdentifiedEntry::safety(),
        }
    }

    pub fn max_size(&self) -> usize {
        self.max_size
    }

    pub fn size(&self) -> usize {
        self.size
    }

    pub fn is_empty(&self) -> bool {
        self.size == 0
    }

    pub fn index(&self) -> usize {
        self.index
    }

    pub fn replay_index(&self) -> usize {
        self.replay_index
    }

    pub fn stack_depth(&self) -> usize {
        self.stack_depth
    }

    pub fn safety(&self) -> &IdentifiedEntry<C> {
        &self.safety
    }

    fn node(&self, id: NodeId) -> &IdentifiedEntry<C> {
        match &self.slots[id.0] {
            Some(node) => node,
            None => unreachable!("dangling history node {:?}", id),
        }
    }

    fn node_mut(&mut self, id: NodeId) -> &mut IdentifiedEntry<C> {
        match &mut self.slots[id.0] {
            Some(node) => node,
            None => unreachable!("dangling history node {:?}", id),
        }
    }

    fn alloc(&mut self, node: IdentifiedEntry<C>) -> NodeId {
        if let Some(slot) = self.free.pop() {
            self.slots[slot] = Some(node);
            return NodeId(slot);
        }
        self.slots.push(Some(node));
        NodeId(self.slots.len() - 1)
    }

    fn release(&mut self, id: NodeId) -> IdentifiedEntry<C> {
        match self.slots[id.0].take() {
            Some(node) => {
                self.free.push(id.0);
                node
            }
            None => unreachable!("double release of history node {:?}", id),
        }
    }

    fn link_last(&mut self, id: NodeId) {
        self.node_mut(id).prev = self.last;
        match self.last {
            Some(last) => self.node_mut(last).next = Some(id),
            None => self.first = Some(id),
        }
        self.last = Some(id);
        self.size += 1;
    }

    fn next_of(&self, id: Option<NodeId>) -> Option<NodeId> {
        match id {
            Some(id) => self.node(id).next,
            None => self.first,
        }
    }

    /// Records `entry` behind the current entry and makes it current.
    ///
    /// Everything after the current entry is dropped first. When the queue
    /// then exceeds its capacity, the oldest entry is evicted. Returns the
    /// generated id, which stays valid for lookups only as long as the entry
    /// is not evicted.
    pub fn add(&mut self, entry: Box<dyn HistoryEntry<C>>) -> String {
        self.next_id += 1;
        let id = format!("h{}", self.next_id);

        self.truncate_after_current();
        let node = self.alloc(IdentifiedEntry::new(id.clone(), self.stack_depth, entry));
        self.link_last(node);
        self.index += 1;
        self.current = Some(node);
        self.mod_count += 1;
        debug!(id = %id, depth = self.stack_depth, size = self.size, "history entry added");

        if self.size > self.max_size {
            self.remove_first();
        }
        id
    }

    /// Drops all entries after the current one.
    fn truncate_after_current(&mut self) {
        let mut cursor = self.next_of(self.current);
        if cursor.is_none() {
            return;
        }

        match self.current {
            Some(current) => {
                self.node_mut(current).next = None;
                self.last = Some(current);
            }
            None => {
                self.first = None;
                self.last = None;
            }
        }

        let mut dropped = 0;
        while let Some(id) = cursor {
            cursor = self.release(id).next;
            self.size -= 1;
            dropped += 1;
        }
        if self.replay_index > self.index {
            self.replay_index = self.index;
            self.replay = self.current;
        }
        self.mod_count += 1;
        debug!(dropped, size = self.size, "history truncated");
    }

    /// Evicts the oldest entry and returns its id.
    pub fn remove_first(&mut self) -> Option<String> {
        let first = self.first?;
        let node = self.release(first);
        self.first = node.next;
        match node.next {
            Some(next) => self.node_mut(next).prev = None,
            None => self.last = None,
        }
        self.size -= 1;

        if self.index > 0 {
            self.index -= 1;
            if self.index == 0 {
                self.current = None;
            }
        }
        if self.replay_index > 0 {
            self.replay_index -= 1;
            if self.replay_index == 0 {
                self.replay = None;
            }
        }
        self.mod_count += 1;

        if node.ends_stack() && self.stack_depth > 0 {
            warn!(id = node.id(), "evicted the anchor of an open history stack");
        }
        debug!(id = node.id(), size = self.size, "history entry evicted");
        Some(node.id().to_string())
    }

    pub fn clear(&mut self) {
        self.slots.clear();
        self.free.clear();
        self.size = 0;
        self.index = 0;
        self.replay_index = 0;
        self.first = None;
        self.last = None;
        self.current = None;
        self.replay = None;
        self.mod_count += 1;
        debug!("history cleared");
    }

    pub fn current(&self) -> &IdentifiedEntry<C> {
        match self.current {
            Some(id) => self.node(id),
            None => &self.safety,
        }
    }

    pub fn current_mut(&mut self) -> &mut IdentifiedEntry<C> {
        match self.current {
            Some(id) => self.node_mut(id),
            None => &mut self.safety,
        }
    }

    /// Entry right before the current one; the safety entry when the
    /// current entry is the first one or the cursor is at the front.
    pub fn previous(&self) -> &IdentifiedEntry<C> {
        match self.current.and_then(|id| self.node(id).prev) {
            Some(id) => self.node(id),
            None => &self.safety,
        }
    }

    pub fn increase_current_index(&mut self) -> Result<()> {
        if self.index >= self.size {
            return Err(HistoryError::OutOfRange {
                index: self.index + 1,
                size: self.size,
            });
        }
        self.current = self.next_of(self.current);
        self.index += 1;
        Ok(())
    }

    pub fn decrease_current_index(&mut self) -> Result<()> {
        if self.index == 0 {
            return Err(HistoryError::OutOfRange {
                index: 0,
                size: self.size,
            });
        }
        self.current = self.current.and_then(|id| self.node(id).prev);
        self.index -= 1;
        Ok(())
    }

    /// Moves the cursor one entry back for an undo. When the entry left
    /// behind anchors an open bracket, the anchor moves to the new current
    /// entry so that closing the bracket still lands on the cursor.
    pub fn step_back(&mut self) -> Result<()> {
        let left = self.current;
        self.decrease_current_index()?;
        if let Some(left) = left {
            if self.node(left).ends_stack() {
                self.node_mut(left).ends_stack = false;
                if let Some(id) = self.current {
                    self.node_mut(id).ends_stack = true;
                }
                debug!(id = self.current().id(), "stack anchor moved back");
            }
        }
        Ok(())
    }

    /// Moves the cursor one entry forward for a redo. An anchor moved back
    /// by [`step_back`](Self::step_back) follows the cursor again while the
    /// entered entry was recorded outside the innermost open bracket.
    pub fn step_forward(&mut self) -> Result<()> {
        let left = self.current;
        self.increase_current_index()?;
        if let (Some(left), Some(entered)) = (left, self.current) {
            let left_depth = self.node(left).stack_depth();
            let entered_depth = self.node(entered).stack_depth();
            if self.node(left).ends_stack() && entered_depth < self.stack_depth {
                self.node_mut(entered).ends_stack = true;
                self.node_mut(left).ends_stack = entered_depth > left_depth;
                debug!(id = self.current().id(), "stack anchor moved forward");
            }
        }
        Ok(())
    }

    /// Opens a bracket. The current entry becomes a point undo must not
    /// cross while the bracket is open.
    pub fn push(&mut self) {
        if let Some(id) = self.current {
            self.node_mut(id).ends_stack = true;
        }
        self.stack_depth += 1;
        debug!(depth = self.stack_depth, "history stack pushed");
    }

    /// Closes the innermost bracket.
    ///
    /// The cursor moves back to the entry that was current when the bracket
    /// was opened and every entry recorded inside the bracket is dropped.
    pub fn pop(&mut self) -> Result<()> {
        if self.stack_depth == 0 {
            return Err(HistoryError::StackUnderflow);
        }
        if !self.no_stack_in_future() {
            return Err(HistoryError::StackInFuture);
        }

        if !self.current().ends_stack() {
            while self.index > 0 && !self.current().ends_stack() {
                self.decrease_current_index()?;
            }
            self.truncate_after_current();
        } else if self.index < self.size {
            self.truncate_after_current();
        }

        let depth = self.stack_depth - 1;
        if let Some(id) = self.current {
            let node = self.node_mut(id);
            node.ends_stack = depth > node.stack_depth();
        }
        self.stack_depth = depth;
        debug!(depth, index = self.index, size = self.size, "history stack popped");
        Ok(())
    }

    fn no_stack_in_future(&self) -> bool {
        let mut cursor = self.next_of(self.current);
        while let Some(id) = cursor {
            let node = self.node(id);
            if node.ends_stack() {
                return false;
            }
            cursor = node.next;
        }
        true
    }

    /// Position of the entry with the given id, scanning from the back.
    pub fn index_of(&self, id: &str) -> Option<usize> {
        self.iter(true)
            .position(|entry| entry.id() == id)
            .map(|from_back| self.size - from_back)
    }

    /// Moves the replay cursor to position `n`. Positions outside `1..=size`
    /// reset it to the front.
    pub fn set_replay_index(&mut self, n: usize) {
        if n == 0 || n > self.size {
            self.replay_index = 0;
            self.replay = None;
            return;
        }

        let mut cursor;
        if n <= self.size - n {
            cursor = self.first;
            for _ in 1..n {
                cursor = cursor.and_then(|id| self.node(id).next);
            }
        } else {
            cursor = self.last;
            for _ in n..self.size {
                cursor = cursor.and_then(|id| self.node(id).prev);
            }
        }
        self.replay_index = n;
        self.replay = cursor;
    }

    pub fn increase_replay_index(&mut self) -> Result<()> {
        if self.replay_index >= self.size {
            return Err(HistoryError::OutOfRange {
                index: self.replay_index + 1,
                size: self.size,
            });
        }
        self.replay = self.next_of(self.replay);
        self.replay_index += 1;
        Ok(())
    }

    pub fn decrease_replay_index(&mut self) -> Result<()> {
        if self.replay_index == 0 {
            return Err(HistoryError::OutOfRange {
                index: 0,
                size: self.size,
            });
        }
        self.replay = self.replay.and_then(|id| self.node(id).prev);
        self.replay_index -= 1;
        Ok(())
    }

    pub fn replay_current(&self) -> &IdentifiedEntry<C> {
        match self.replay {
            Some(id) => self.node(id),
            None => &self.safety,
        }
    }

    pub fn iter(&self, reverse: bool) -> Iter<'_, C> {
        Iter {
            queue: self,
            next: if reverse { self.last } else { self.first },
            reverse,
        }
    }

    /// Detached traversal that may outlive borrows of the queue and fails
    /// once the queue is structurally modified.
    pub fn walker(&self, reverse: bool) -> Walker {
        Walker {
            next: if reverse { self.last } else { self.first },
            reverse,
            expected_mod_count: self.mod_count,
        }
    }
}

pub struct Iter<'a, C> {
    queue: &'a HistoryQueue<C>,
    next: Option<NodeId>,
    reverse: bool,
}

impl<'a, C> Iterator for Iter<'a, C> {
    type Item = &'a IdentifiedEntry<C>;

    fn next(&mut self) -> Option<Self::Item> {
        let node = self.queue.node(self.next?);
        self.next = if self.reverse { node.prev } else { node.next };
        Some(node)
    }
}

pub struct Walker {
    next: Option<NodeId>,
    reverse: bool,
    expected_mod_count: u64,
}

impl Walker {
    pub fn next<'q, C>(
        &mut self,
        queue: &'q HistoryQueue<C>,
    ) -> Result<Option<&'q IdentifiedEntry<C>>> {
        if queue.mod_count != self.expected_mod_count {
            return Err(HistoryError::ConcurrentModification);
        }
        let id = match self.next {
            Some(id) => id,
            None => return Ok(None),
        };
        let node = queue.node(id);
        self.next = if self.reverse { node.prev } else { node.next };
        Ok(Some(node))
    }
}
