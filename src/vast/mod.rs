pub mod assembler;
pub mod document;
pub mod url_policy;

pub use assembler::{Assembler, TrackingMode};
pub use document::{TrackingEvent, Vast};
pub use url_policy::{Addressing, UrlPolicy};
