//! DAG Module - validation of editor graphs
//!
//! - `flow`: FlowGraph adjacency built from a snapshot, cycle search
//! - `validate`: the validation rules and the report handed to the host
//!
//! Everything here is a pure function of its input snapshot.

mod flow;
mod validate;

pub use flow::{Cycle, FlowGraph, Link};
pub use validate::{validate, ValidationReport, Verdict};
