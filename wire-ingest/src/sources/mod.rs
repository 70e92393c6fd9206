pub mod ap_feed;

pub use ap_feed::WireSource;
