use std::io::Write;

use hashbrown::HashMap;

use navsync::{FrameId, Presentation, WarningKind};

/// Presentation that describes every client side effect as a line of text.
pub(crate) struct Console<W: Write> {
    out: W,
    frames: HashMap<FrameId, String>,
    next_frame: u32,
}

impl<W: Write> Console<W> {
    pub(crate) fn new(out: W) -> Self {
        Self {
            out,
            frames: HashMap::new(),
            next_frame: 0,
        }
    }

    pub(crate) fn print(&mut self, text: &str) {
        if let Err(e) = writeln!(self.out, "{}", text).and_then(|_| self.out.flush()) {
            tracing::error!("{}", e);
        }
    }

    /// Frames known to the client and the checkpoint each one shows.
    pub(crate) fn frames(&self) -> Vec<(FrameId, &str)> {
        let mut frames: Vec<_> = self
            .frames
            .iter()
            .map(|(frame, target)| (*frame, target.as_str()))
            .collect();
        frames.sort();
        frames
    }

    /// Forgets every frame. The client reloaded.
    pub(crate) fn reload(&mut self) {
        self.frames.clear();
        self.print("client reloaded");
    }

    /// Registers a frame created by the client itself.
    pub(crate) fn adopt(&mut self, frame: FrameId) {
        self.frames.entry(frame).or_insert_with(String::new);
        self.next_frame = self.next_frame.max(frame.0);
    }
}

#[cfg(test)]
impl Console<Vec<u8>> {
    pub(crate) fn output(&self) -> String {
        String::from_utf8_lossy(&self.out).into_owned()
    }
}

impl<W: Write> Presentation for Console<W> {
    fn allocate_frame(&mut self, stack_level: usize) -> FrameId {
        self.next_frame += 1;
        let frame = FrameId(self.next_frame);
        self.frames.insert(frame, String::new());
        self.print(&format!("frame {} installed at level {}", frame, stack_level));
        frame
    }

    fn update_frame(&mut self, frame: FrameId, target: &str) {
        self.frames.insert(frame, target.to_string());
        self.print(&format!("frame {} -> {}", frame, target));
    }

    fn remove_frame(&mut self, frame: FrameId) {
        self.frames.remove(&frame);
        self.print(&format!("frame {} removed", frame));
    }

    fn show_warning(&mut self, kind: WarningKind) {
        self.print(&format!("warning: {}", kind.message()));
    }

    fn revert_view(&mut self, target: &str) {
        self.print(&format!("revert to {}", target));
    }

    fn leave_session(&mut self) {
        self.frames.clear();
        self.print("session left");
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_console_output() {
        let mut console = Console::new(Vec::new());
        let frame = console.allocate_frame(0);
        console.update_frame(frame, "h1");
        console.show_warning(WarningKind::NotUndoable);
        console.revert_view("h1");
        assert_eq!(console.frames(), vec![(FrameId(1), "h1")]);

        assert_eq!(
            console.output(),
            "frame f1 installed at level 0\nframe f1 -> h1\nwarning: This step cannot be undone.\nrevert to h1\n"
        );
    }

    #[test]
    fn test_adopted_frames_are_not_reused() {
        let mut console = Console::new(Vec::new());
        console.adopt(FrameId(5));
        assert_eq!(console.allocate_frame(1), FrameId(6));
        console.reload();
        assert!(console.frames().is_empty());
    }
}
