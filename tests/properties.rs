use proptest::prelude::*;

use navsync::error::Result;
use navsync::presentation::Recorder;
use navsync::{FrameId, HistoryControl, HistoryEntry, HistoryQueue, Traversal};

struct Value(u32);

impl HistoryEntry<Vec<u32>> for Value {
    fn undo(&mut self, ctx: &mut Vec<u32>) -> Result<()> {
        ctx.pop();
        Ok(())
    }

    fn redo(&mut self, ctx: &mut Vec<u32>) -> Result<()> {
        ctx.push(self.0);
        Ok(())
    }

    fn title(&self, _ctx: &Vec<u32>) -> String {
        self.0.to_string()
    }
}

fn ids(queue: &HistoryQueue<Vec<u32>>) -> Vec<String> {
    queue.iter(false).map(|e| e.id().to_string()).collect()
}

proptest! {
    #[test]
    fn bounded_window(max_size in 0usize..8, adds in 0usize..40) {
        let mut queue = HistoryQueue::new(max_size);
        for n in 0..adds {
            queue.add(Box::new(Value(n as u32)));
            prop_assert!(queue.size() <= max_size);
            prop_assert!(queue.index() <= queue.size());
        }
        if adds > max_size && max_size > 0 {
            let oldest = adds - max_size + 1;
            prop_assert_eq!(ids(&queue).first().cloned(), Some(format!("h{}", oldest)));
        }
        prop_assert_eq!(queue.size(), adds.min(max_size));
    }

    #[test]
    fn branch_truncation(count in 1usize..10, rewind in 0usize..10) {
        let rewind = rewind.min(count);
        let mut queue = HistoryQueue::new(20);
        for n in 0..count {
            queue.add(Box::new(Value(n as u32)));
        }
        for _ in 0..rewind {
            queue.decrease_current_index().unwrap();
        }
        let kept: Vec<String> = ids(&queue).into_iter().take(count - rewind).collect();
        let id = queue.add(Box::new(Value(99)));

        let mut expected = kept;
        expected.push(id);
        prop_assert_eq!(ids(&queue), expected);
        prop_assert_eq!(queue.index(), count - rewind + 1);
    }

    #[test]
    fn push_pop_is_neutral(count in 0usize..6, depth in 0usize..4) {
        let mut queue = HistoryQueue::new(10);
        for n in 0..count {
            queue.add(Box::new(Value(n as u32)));
        }
        for _ in 0..depth {
            queue.push();
        }
        let flags: Vec<bool> = queue.iter(false).map(|e| e.ends_stack()).collect();

        queue.push();
        queue.pop().unwrap();
        prop_assert_eq!(queue.stack_depth(), depth);
        prop_assert_eq!(queue.iter(false).map(|e| e.ends_stack()).collect::<Vec<_>>(), flags);
    }

    #[test]
    fn undo_redo_inverse(values in proptest::collection::vec(any::<u32>(), 1..10), back in 0usize..10) {
        let back = back % values.len();
        let mut control: HistoryControl<Vec<u32>, Recorder> = HistoryControl::new(20, Recorder::new());
        let mut state = Vec::new();
        let mut ids = Vec::new();
        for value in &values {
            state.push(*value);
            ids.push(control.add_history(Box::new(Value(*value))));
        }

        let target = &ids[values.len() - 1 - back];
        let result = control.checkpoint_changed(&mut state, target, FrameId(1));
        let expected = if back == 0 { Traversal::Unchanged } else { Traversal::Undone(back) };
        prop_assert_eq!(result, Ok(expected));
        prop_assert_eq!(&state[..], &values[..values.len() - back]);

        let result = control.checkpoint_changed(&mut state, &ids[values.len() - 1], FrameId(1));
        let expected = if back == 0 { Traversal::Unchanged } else { Traversal::Redone(back) };
        prop_assert_eq!(result, Ok(expected));
        prop_assert_eq!(state, values);
    }
}
