//! Pluggable transports: HTTP, line-oriented request/reply, and
//! publish/subscribe, plus the shared URI normalizer.

pub mod http;
pub mod pubsub;
pub mod rep;
pub mod uri;

pub use pubsub::Publisher;
pub use uri::Uri;
