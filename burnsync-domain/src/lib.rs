mod burndown;
mod error;
mod filter;
mod issue;

pub use burndown::{burndown, burndown_in, daily_buckets_in, BurndownPoint, DailyBucket};
pub use error::SyncError;
pub use filter::{TitleFilter, DEFAULT_TITLE_MARKER};
pub use issue::{Issue, IssueSource, IssueState, Project, StateType};
