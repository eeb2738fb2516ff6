//! Pipeline stage types

use crate::error::Result;
use async_trait::async_trait;
use serde::{Deserialize, Serialize};

/// Completion state of a batch as seen by downstream bookkeeping
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum BatchState {
    /// Written to staging, not yet visible in the destination
    Staged,
    /// Fully complete
    Complete,
}

/// Anything carrying a batch state tag
pub trait WithBatchState {
    /// The batch state of this item
    fn state(&self) -> BatchState;
}

/// Output of a single accumulator call
#[derive(Debug, Clone)]
pub enum BatchAccumulatorResult<S, O> {
    /// The key is still open: keep feeding `state`
    Intermediate {
        /// State to pass to the next call
        state: S,
        /// Output produced by this call
        output: O,
    },
    /// The key is done
    Final {
        /// Output produced by this call
        output: O,
    },
}

impl<S, O> BatchAccumulatorResult<S, O> {
    /// The output of this call
    pub fn output(&self) -> &O {
        match self {
            Self::Intermediate { output, .. } | Self::Final { output } => output,
        }
    }

    /// Consume into the output
    pub fn into_output(self) -> O {
        match self {
            Self::Intermediate { output, .. } | Self::Final { output } => output,
        }
    }

    /// The state to continue with, if the key is still open
    pub fn state(&self) -> Option<&S> {
        match self {
            Self::Intermediate { state, .. } => Some(state),
            Self::Final { .. } => None,
        }
    }

    /// Whether the key is done
    pub fn is_final(&self) -> bool {
        matches!(self, Self::Final { .. })
    }
}

/// A keyed pipeline stage
#[async_trait]
pub trait BatchAccumulator: Send + Sync {
    /// Per-key state
    type State: Send + Sync;
    /// Key identifying the unit of work
    type Key: Send + Sync;
    /// Input consumed per call
    type Input: Send;
    /// Output produced per call
    type Output: Send;

    /// Begin (or join) work on `key`
    async fn start(&self, key: &Self::Key) -> Result<Self::State>;

    /// Process one input against `state`
    async fn accept(
        &self,
        input: Self::Input,
        state: Self::State,
    ) -> Result<BatchAccumulatorResult<Self::State, Self::Output>>;

    /// End work on the key owning `state`
    async fn finish(
        &self,
        state: Self::State,
    ) -> Result<BatchAccumulatorResult<Self::State, Self::Output>>;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_result_accessors() {
        let intermediate: BatchAccumulatorResult<u32, &str> = BatchAccumulatorResult::Intermediate {
            state: 1,
            output: "a",
        };
        assert_eq!(intermediate.state(), Some(&1));
        assert_eq!(*intermediate.output(), "a");
        assert!(!intermediate.is_final());

        let fin: BatchAccumulatorResult<u32, &str> = BatchAccumulatorResult::Final { output: "b" };
        assert!(fin.state().is_none());
        assert!(fin.is_final());
        assert_eq!(fin.into_output(), "b");
    }

    #[test]
    fn test_batch_state_ordering() {
        assert!(BatchState::Staged < BatchState::Complete);
        assert_eq!(
            serde_json::to_string(&BatchState::Staged).unwrap(),
            "\"staged\""
        );
    }
}
