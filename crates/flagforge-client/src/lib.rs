//! Evaluation pipeline: resolves a client's effective provider from the
//! registry, merges layered evaluation contexts, runs the before/after/
//! error/finally hook chain around the provider call, and guarantees a
//! typed result on every path — success or failure.

pub mod client;
pub mod options;
pub mod pipeline;
pub mod transaction;

pub use client::Client;
pub use options::EvaluationOptions;
pub use pipeline::TypedResolve;
pub use transaction::{merge_transaction_context, transaction_context, with_transaction_context};
