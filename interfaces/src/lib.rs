pub mod defs;

pub use defs::{CanonicalPayload, PayloadBody, PollRequest, PollResponse, WirePoller};
