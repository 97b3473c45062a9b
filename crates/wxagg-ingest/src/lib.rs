//! Article ingestion for the aggregator.
//!
//! Fetches posts from WeChat official accounts and arbitrary web pages,
//! normalizes them into [`wxagg_core::CanonicalArticle`] records, and persists
//! them through an [`wxagg_core::ArticleStore`]. The [`runner`] module glues
//! the pipeline to the schedule engine for unattended runs.

pub mod admin;
pub mod error;
pub mod normalize;
pub mod pipeline;
pub mod refresh;
pub mod runner;
pub mod sources;
pub mod types;

pub use admin::{add_manual_article, trigger_immediate_fetch, FetchReport, ManualAddOutcome};
pub use error::{FetchError, RunError};
pub use normalize::{normalize, normalize_at, NormalizeError};
pub use pipeline::IngestionPipeline;
pub use refresh::{parse_helper_output, CredentialRefresher, ProcessRefresher, RefreshError};
pub use runner::{FireReason, Runner, ScheduledRun};
pub use sources::web_page::{FetchedPage, WebPageSource};
pub use sources::wechat::WechatSource;
pub use sources::{build_http_client, ArticleSource};
pub use types::{AccountError, BatchOutcome, FetchResult, RawArticle, WechatOptions};
