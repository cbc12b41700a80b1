pub mod document;
pub mod item;
pub mod source;

pub use document::{Enclosure, FeedDocument, FeedImage, RawItem};
pub use item::{normalize_key, NormalizedItem};
pub use source::{Category, FeedSource, SubCategory};
