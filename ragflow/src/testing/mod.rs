//! Test doubles for agents and indexes.
//!
//! These are part of the public API so downstream users can exercise
//! pipelines without live services.

mod mocks;

pub use mocks::{
    EchoAgent, FailingAgent, RecordedInvocation, ScriptedAgent, SearchingAgent, StubIndex,
};
