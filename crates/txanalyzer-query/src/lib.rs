//! Query and mutation layer for the transaction dashboard
//!
//! - key: composite cache keys with prefix matching
//! - cache: the process-local store, staleness, dedupe, cancellation and eviction
//! - queries: typed reads with their keys and options
//! - mutation: writes and the cache effects they trigger

pub mod cache;
pub mod error;
pub mod key;
pub mod mutation;
pub mod queries;

pub use cache::{Fetcher, Query, QueryCache, QueryOptions, QueryState, QueryStatus, DEFAULT_GC_TIME};
pub use error::{QueryError, QueryErrorCode, QueryResult};
pub use key::QueryKey;
pub use mutation::{
    AnalyzePatterns, AnalyzeTransactions, CreateMerchantMutation, DeactivateMerchantMutation, MerchantUpdate, Mutation,
    MutationSpec, MutationState, MutationStatus, UpdateMerchantMutation, UploadTransactions,
};
pub use queries::{Queries, StaleTimes};
