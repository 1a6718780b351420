use fastfill_core_types::{CoreError, FieldType};
use page_dom::DomError;
use thiserror::Error;

#[derive(Debug, Error, Clone, PartialEq)]
pub enum FillError {
    /// No element in scope carries a pattern for the field.
    #[error("no element matches field '{0}'")]
    NoMatch(FieldType),
    /// The overlay never rendered any option within the poll budget.
    #[error("dropdown rendered no options after {attempts} attempts")]
    DropdownExhausted { attempts: usize },
    /// Options rendered but none matched the wanted text.
    #[error("no dropdown option matches '{wanted}' among {seen} options")]
    DropdownNoMatch { wanted: String, seen: usize },
    #[error("fill superseded or cancelled")]
    Cancelled,
    #[error(transparent)]
    Dom(#[from] DomError),
    /// The request could not reach the page. The only variant surfaced to end users.
    #[error("{0}")]
    Messaging(String),
}

impl FillError {
    pub const NO_LISTENER: &'static str = "no listener on page; reload the page and retry";

    pub fn no_listener() -> Self {
        FillError::Messaging(Self::NO_LISTENER.to_string())
    }

    pub fn is_user_facing(&self) -> bool {
        matches!(self, FillError::Messaging(_))
    }
}

impl From<FillError> for CoreError {
    fn from(err: FillError) -> Self {
        CoreError::new(err.to_string())
    }
}
