/// Outcome of the most recent fetch attempt.
#[derive(Debug, Clone, PartialEq)]
pub enum QueryState<T> {
    /// An attempt is in flight, or none has resolved yet.
    Loading,
    /// The attempt failed; a refetch is needed to try again.
    Error(String),
    Success(Vec<T>),
}

impl<T> Default for QueryState<T> {
    fn default() -> Self {
        Self::Loading
    }
}

impl<T> QueryState<T> {
    pub fn is_loading(&self) -> bool {
        matches!(self, Self::Loading)
    }

    pub fn error(&self) -> Option<&str> {
        match self {
            Self::Error(message) => Some(message),
            _ => None,
        }
    }

    pub fn data(&self) -> Option<&[T]> {
        match self {
            Self::Success(rows) => Some(rows),
            _ => None,
        }
    }
}
