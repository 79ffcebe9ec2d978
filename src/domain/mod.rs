//! Core domain types: requests, fingerprints, outcomes, policy rules, and
//! reference-data snapshots. Everything here is plain data with no I/O.

mod fingerprint;
mod id;
mod outcome;
mod policy;
mod request;
mod snapshot;

pub use fingerprint::Fingerprint;
pub use id::{CallerId, RequestId, RuleId};
pub use outcome::{FailReason, Outcome, RejectReason};
pub use policy::{PolicyRule, Predicate, Severity};
pub use request::{OperationType, Request};
pub use snapshot::Snapshot;
