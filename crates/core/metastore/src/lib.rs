//! Client side of the managed query service: statement synthesis, query
//! submission and polling, result fetching, and the partition reconciliation
//! built on top of them.

pub mod client;
pub mod execution;
pub mod reconcile;
pub mod results;
pub mod statement;

pub use self::{
    client::{HttpQueryService, QueryService, QueryServiceError},
    execution::{
        ExecutionId, ExecutionState, ExecutionStatus, PollError, PollPolicy, QueryOutcome,
        wait_for_completion,
    },
    statement::QualifiedTable,
};
