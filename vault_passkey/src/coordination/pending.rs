use std::future::Future;

use super::errors::CoordinationError;

/// External operation a flow is currently suspended on.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum PendingOperation {
    #[default]
    None,
    AwaitingSelection,
    AwaitingRegistration,
}

/// Holds at most one outstanding operation per flow.
#[derive(Debug, Default)]
pub(crate) struct PendingSlot {
    current: PendingOperation,
}

impl PendingSlot {
    pub(crate) fn current(&self) -> PendingOperation {
        self.current
    }

    fn begin(&mut self, operation: PendingOperation) -> Result<(), CoordinationError> {
        if self.current != PendingOperation::None {
            return Err(CoordinationError::InvalidState(format!(
                "{operation:?} requested while {:?} is outstanding",
                self.current
            )));
        }
        self.current = operation;
        Ok(())
    }

    /// Awaits `operation` with the slot marked as busy.
    ///
    /// The slot stays busy if the future is dropped before completing, so the
    /// flow cannot be resumed afterwards.
    pub(crate) async fn run<F: Future>(
        &mut self,
        operation: PendingOperation,
        future: F,
    ) -> Result<F::Output, CoordinationError> {
        self.begin(operation)?;
        let output = future.await;
        self.current = PendingOperation::None;
        Ok(output)
    }
}
