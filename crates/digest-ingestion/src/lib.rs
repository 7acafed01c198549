//! digest-ingestion — Paper discovery and the weekly digest pipeline.
//!
//! Sources (CrossRef, PubMed, journal feeds) are queried for the fetch window,
//! merged, backfilled from CrossRef and checked against Unpaywall before the
//! ranker and writer turn them into an issue.

pub mod dates;
pub mod dedup;
pub mod evidence;
pub mod exclusions;
pub mod fetcher;
pub mod pipeline;
pub mod sources;

pub use dates::{parse_pub_date, FetchWindow};
pub use exclusions::{Exclusion, ExclusionFilter};
pub use fetcher::{SourceEndpoints, SourceFetcher};
pub use pipeline::{week_key, CandidateProvider, DigestPipeline, GeneratedDigest};
pub use sources::LiteratureSource;
