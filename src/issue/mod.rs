//! Issue records: lookup, parsing and status updates.

pub mod record;
pub mod sections;
pub mod store;

pub use record::{IssueFrontmatter, IssueRecord, lane_of};
pub use sections::{ExpectedOutputs, ExpectedResult};
pub use store::IssueStore;
