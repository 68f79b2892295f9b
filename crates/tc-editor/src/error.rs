use tc_core::CoreError;

pub type EditorResult<T> = Result<T, EditorError>;

/// Errors raised by the mutation surface.
///
/// Running off either end of the history is not an error: `undo` and `redo`
/// report it as `false`.
#[derive(thiserror::Error, Debug, Clone, PartialEq)]
pub enum EditorError {
    #[error(transparent)]
    Core(#[from] CoreError),

    #[error("nothing is selected")]
    NoSelection,

    #[error("expected a {expected} node, found {found}")]
    WrongVariant {
        expected: &'static str,
        found: &'static str,
    },

    #[error("no node with id {0}")]
    UnknownNode(String),

    #[error("no text edit in progress")]
    NotEditing,

    #[error("a text edit is still open")]
    EditInProgress,

    #[error("unknown image load ticket {0}")]
    UnknownTicket(u64),

    #[error("invalid value for {0}")]
    InvalidValue(&'static str),
}

impl EditorError {
    pub fn wrong_variant(expected: &'static str, found: &'static str) -> Self {
        Self::WrongVariant { expected, found }
    }
}
