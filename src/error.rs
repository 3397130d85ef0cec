use thiserror::Error;

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum HistoryError {
    #[error("history index {index} out of range 0..={size}")]
    OutOfRange { index: usize, size: usize },
    #[error("history queue modified during iteration")]
    ConcurrentModification,
    #[error("undo failed: {0}")]
    UndoFailed(String),
    #[error("redo failed: {0}")]
    RedoFailed(String),
    #[error("the safety entry must never be undone or redone")]
    SafetyEntry,
    #[error("pop without matching push")]
    StackUnderflow,
    #[error("an entry after the cursor still ends an open stack")]
    StackInFuture,
}

impl HistoryError {
    /// Errors that indicate a bug in the caller rather than a condition the
    /// synchronizer resolves by reverting the view.
    pub fn is_contract_violation(&self) -> bool {
        use HistoryError::*;
        match self {
            OutOfRange { .. } | ConcurrentModification | SafetyEntry | StackUnderflow
            | StackInFuture => true,
            UndoFailed(_) | RedoFailed(_) => false,
        }
    }
}

pub type Result<T> = std::result::Result<T, HistoryError>;

#[test]
fn test_contract_violation() {
    assert!(HistoryError::OutOfRange { index: 0, size: 0 }.is_contract_violation());
    assert!(HistoryError::StackUnderflow.is_contract_violation());
    assert!(!HistoryError::UndoFailed("veto".into()).is_contract_violation());
    assert_eq!(
        HistoryError::OutOfRange { index: 3, size: 2 }.to_string(),
        "history index 3 out of range 0..=2"
    );
}
