// Library interface for newsjudge modules
// This allows tests and other binaries to import modules

pub mod article;
pub mod claims;
pub mod fetcher;
pub mod judge;
pub mod pipeline;
pub mod verdict;

pub use article::{Article, FactCheckStatus, RawArticle};
pub use judge::{BackendError, Judge};
pub use pipeline::{ArticlePipeline, PipelineOptions};
pub use verdict::Verdict;
