use crate::ClientError;

/// Where an optimistic write stands with the server.
#[derive(Clone, Debug)]
pub enum MutationState {
    /// Applied locally; the server has not answered yet.
    Applied,
    /// The server accepted the write.
    Confirmed,
    /// The server rejected the write or could not be reached.
    Failed(ClientError),
}

/// An optimistic local change awaiting server confirmation.
///
/// `previous` is what the UI showed before the change and `next` what it shows now. While the
/// mutation is `Failed` the UI and the server disagree; the caller either retries pushing
/// `next` or reverts the UI to `previous`.
#[derive(Clone, Debug)]
pub struct PendingMutation<T> {
    previous: T,
    next: T,
    state: MutationState,
    attempts: u32,
}

impl<T> PendingMutation<T> {
    pub fn new(previous: T, next: T) -> Self {
        Self {
            previous,
            next,
            state: MutationState::Applied,
            attempts: 1,
        }
    }

    pub fn previous(&self) -> &T {
        &self.previous
    }

    pub fn next(&self) -> &T {
        &self.next
    }

    pub fn state(&self) -> &MutationState {
        &self.state
    }

    /// Number of times `next` has been pushed.
    pub fn attempts(&self) -> u32 {
        self.attempts
    }

    pub fn is_confirmed(&self) -> bool {
        matches!(self.state, MutationState::Confirmed)
    }

    pub fn is_failed(&self) -> bool {
        matches!(self.state, MutationState::Failed(_))
    }

    pub fn error(&self) -> Option<&ClientError> {
        match &self.state {
            MutationState::Failed(e) => Some(e),
            MutationState::Applied | MutationState::Confirmed => None,
        }
    }

    pub fn confirm(&mut self) {
        self.state = MutationState::Confirmed;
    }

    pub fn fail(&mut self, error: ClientError) {
        self.state = MutationState::Failed(error);
    }

    /// Puts a failed mutation back in flight and returns the value to push again.
    pub fn retry(&mut self) -> Result<&T, ClientError> {
        if !self.is_failed() {
            return Err(ClientError::NothingPending);
        }
        self.attempts += 1;
        self.state = MutationState::Applied;
        Ok(&self.next)
    }

    /// Gives up on a failed mutation, yielding the value the UI should go back to.
    ///
    /// A mutation that has not failed is handed back unchanged.
    pub fn revert(self) -> Result<T, Self> {
        if self.is_failed() {
            Ok(self.previous)
        } else {
            Err(self)
        }
    }
}
