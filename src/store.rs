use std::io::Write;

use flume::Receiver;

use navsync::error::HistoryError;
use navsync::{dispatch, HistoryControl, Request, Response, Traversal};

use crate::cmd::Cmd;
use crate::console::Console;
use crate::journal::{Journal, Line};

/// One simulated client session. Commands are applied one at a time, each
/// to completion.
pub(crate) struct Store<W: Write> {
    control: HistoryControl<Journal, Console<W>>,
    journal: Journal,
    rx: Receiver<Cmd>,
}

impl<W: Write> Store<W> {
    pub(crate) fn new(rx: Receiver<Cmd>, control: HistoryControl<Journal, Console<W>>) -> Self {
        Self {
            control,
            journal: Journal::default(),
            rx,
        }
    }

    pub(crate) async fn run(&mut self) {
        while let Ok(cmd) = self.rx.recv_async().await {
            match self.apply(cmd) {
                Ok(true) => {}
                Ok(false) => break,
                Err(e) => {
                    tracing::error!("{}", e);
                    self.console().print(&format!("error: {}", e));
                }
            }
        }
    }

    fn console(&mut self) -> &mut Console<W> {
        self.control.presentation_mut()
    }

    fn apply(&mut self, cmd: Cmd) -> Result<bool, HistoryError> {
        match cmd {
            Cmd::Add(text) => {
                self.journal.write(&text);
                self.control.add_history(Box::new(Line::new(text)));
            }
            Cmd::Fragile(text) => {
                self.journal.write(&text);
                self.control.add_history(Box::new(Line::fragile(text)));
            }
            Cmd::Push => self.control.push(),
            Cmd::Pop => self.control.pop()?,
            Cmd::Request(request) => {
                if let Request::StartReplay(start) = &request {
                    let source = start.source;
                    self.console().reload();
                    self.console().adopt(source);
                }
                let response = dispatch(&mut self.control, &mut self.journal, request)?;
                self.report(response);
            }
            Cmd::Show => self.show(),
            Cmd::Quit => return Ok(false),
        }
        Ok(true)
    }

    fn report(&mut self, response: Response) {
        let text = match response {
            Response::Traversal(Traversal::Undone(n)) => format!("undone {}", n),
            Response::Traversal(Traversal::Redone(n)) => format!("redone {}", n),
            Response::Traversal(other) => format!("{:?}", other).to_lowercase(),
            Response::ReplayStarted => "replay started".to_string(),
            Response::Replay(step) => format!("{:?}", step).to_lowercase(),
        };
        self.console().print(&text);
    }

    fn show(&mut self) {
        let queue = self.control.queue();
        let mut lines = vec![format!(
            "index {}/{} replay {} depth {}",
            queue.index(),
            queue.size(),
            queue.replay_index(),
            queue.stack_depth()
        )];
        for (position, entry) in queue.iter(false).enumerate() {
            let marker = if position + 1 == queue.index() { '>' } else { ' ' };
            let ends = if entry.ends_stack() { " |" } else { "" };
            lines.push(format!(
                "{} {} [{}] {}{}",
                marker,
                entry.id(),
                entry.stack_depth(),
                entry.title(&self.journal),
                ends
            ));
        }
        lines.push(format!("journal: {}", self.journal.lines.join(", ")));
        let frames: Vec<String> = self
            .control
            .presentation()
            .frames()
            .into_iter()
            .map(|(frame, target)| format!("{}={}", frame, target))
            .collect();
        lines.push(format!("frames: {}", frames.join(" ")));

        let console = self.console();
        for line in &lines {
            console.print(line);
        }
    }
}
