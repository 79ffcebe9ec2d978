//! Pipeline services: admission, validation, caching, scoring, routing, and
//! background refresh. Each service owns its own state and synchronization;
//! there is no lock shared across the whole pipeline.

pub mod cache;
pub mod compliance;
pub mod fraud;
pub mod limiter;
pub mod refresher;
pub mod router;

pub use cache::{Lookup, ResponseCache};
pub use compliance::{ComplianceReport, ComplianceValidator, Violation};
pub use fraud::{FraudAssessment, FraudScorer};
pub use limiter::{Admission, RateLimiter};
pub use refresher::{BackgroundRefresher, SnapshotStore};
pub use router::{Constraints, EndpointStatus, ModelReply, ModelRouter};
