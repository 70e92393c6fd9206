pub mod config;
pub mod events;
pub mod feed_reader;
pub mod fetcher;
pub mod parser;
pub mod pipeline;
pub mod resolver;
pub mod sources;
pub mod transform;
pub mod types;

pub use types::*;
pub use config::{FetchConfig, ItemFailurePolicy, PollConfig, RetryCounterMode};
pub use events::{DropReason, PollEvent, PollObserver, TracingObserver};
pub use feed_reader::FeedPageReader;
pub use fetcher::{Envelope, Fetcher};
pub use parser::ContentExtractor;
pub use pipeline::{PollOrchestrator, PollState};
pub use resolver::ItemContentResolver;
pub use sources::WireSource;
pub use transform::{PayloadTransformer, UNIDENTIFIED_EXTERNAL_ID};
