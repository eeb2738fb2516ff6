//! Pipeline module
//!
//! Contracts shared by load pipeline stages.
//!
//! # Overview
//!
//! A stage is a `BatchAccumulator`: it is started once per key, accepts
//! inputs one at a time, and is finished when its key has no more input.
//! Every output carries a `BatchState` tag that downstream bookkeeping
//! propagates without interpreting.

mod types;

pub use types::{BatchAccumulator, BatchAccumulatorResult, BatchState, WithBatchState};
