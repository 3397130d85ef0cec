use navsync::error::{HistoryError, Result};
use navsync::HistoryEntry;

/// Application state of the simulated session: the lines written so far.
#[derive(Default, Clone, Debug, PartialEq)]
pub(crate) struct Journal {
    pub(crate) lines: Vec<String>,
}

impl Journal {
    pub(crate) fn write(&mut self, text: &str) {
        self.lines.push(text.to_string());
    }
}

pub(crate) struct Line {
    text: String,
    fragile: bool,
}

impl Line {
    pub(crate) fn new(text: String) -> Self {
        Self {
            text,
            fragile: false,
        }
    }

    pub(crate) fn fragile(text: String) -> Self {
        Self {
            text,
            fragile: true,
        }
    }
}

impl HistoryEntry<Journal> for Line {
    fn undo(&mut self, journal: &mut Journal) -> Result<()> {
        if self.fragile {
            return Err(HistoryError::UndoFailed(format!(
                "'{}' cannot be taken back",
                self.text
            )));
        }
        match journal.lines.last() {
            Some(last) if *last == self.text => {
                journal.lines.pop();
                Ok(())
            }
            _ => Err(HistoryError::UndoFailed(format!(
                "'{}' is not the latest line",
                self.text
            ))),
        }
    }

    fn redo(&mut self, journal: &mut Journal) -> Result<()> {
        journal.write(&self.text);
        Ok(())
    }

    fn title(&self, _journal: &Journal) -> String {
        self.text.clone()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_line_round_trip() {
        let mut journal = Journal::default();
        journal.write("a");
        journal.write("b");
        let mut line = Line::new("b".to_string());
        line.undo(&mut journal).unwrap();
        assert_eq!(journal.lines, vec!["a"]);
        line.redo(&mut journal).unwrap();
        assert_eq!(journal.lines, vec!["a", "b"]);
    }

    #[test]
    fn test_out_of_order_undo_fails() {
        let mut journal = Journal::default();
        journal.write("a");
        journal.write("b");
        let mut line = Line::new("a".to_string());
        assert!(line.undo(&mut journal).is_err());
        assert_eq!(journal.lines.len(), 2);
    }

    #[test]
    fn test_fragile_line() {
        let mut journal = Journal::default();
        journal.write("a");
        let mut line = Line::fragile("a".to_string());
        assert!(matches!(
            line.undo(&mut journal),
            Err(HistoryError::UndoFailed(_))
        ));
        assert_eq!(line.title(&journal), "a");
    }
}
