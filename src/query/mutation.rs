//! Handles for in-flight writes

use super::lock;
use std::sync::{Arc, Mutex};

#[derive(Debug, Clone, PartialEq)]
pub enum MutationState<T> {
    Pending,
    Success(T),
    Failed(String),
}

/// Shared view of one write. The task that runs it resolves the state once;
/// the UI polls it every frame.
#[derive(Debug, Clone)]
pub struct Mutation<T> {
    state: Arc<Mutex<MutationState<T>>>,
}

impl<T: Clone> Mutation<T> {
    pub(crate) fn pending() -> Self {
        Self {
            state: Arc::new(Mutex::new(MutationState::Pending)),
        }
    }

    /// Already-settled handle
    #[cfg(test)]
    pub fn from_state(state: MutationState<T>) -> Self {
        Self {
            state: Arc::new(Mutex::new(state)),
        }
    }

    pub(crate) fn resolve(&self, result: Result<T, String>) {
        *lock(&self.state) = match result {
            Ok(value) => MutationState::Success(value),
            Err(message) => MutationState::Failed(message),
        };
    }

    pub fn state(&self) -> MutationState<T> {
        lock(&self.state).clone()
    }

    pub fn is_pending(&self) -> bool {
        matches!(*lock(&self.state), MutationState::Pending)
    }

    /// `None` while pending, the outcome once settled
    pub fn poll(&self) -> Option<Result<T, String>> {
        match self.state() {
            MutationState::Pending => None,
            MutationState::Success(value) => Some(Ok(value)),
            MutationState::Failed(message) => Some(Err(message)),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn resolves_once_visible_to_clones() {
        let mutation = Mutation::<u32>::pending();
        let seen_by_ui = mutation.clone();
        assert!(seen_by_ui.is_pending());
        assert_eq!(seen_by_ui.poll(), None);

        mutation.resolve(Ok(7));
        assert!(!seen_by_ui.is_pending());
        assert_eq!(seen_by_ui.poll(), Some(Ok(7)));
    }

    #[test]
    fn failure_carries_message() {
        let mutation = Mutation::<()>::pending();
        mutation.resolve(Err("Symbol already exists".into()));
        assert_eq!(
            mutation.state(),
            MutationState::Failed("Symbol already exists".into())
        );
    }
}
