//! Search pipeline core for CCMS: JSONL parsing, the boolean query
//! language, filtering, parallel scanning, and result rendering.
//!
//! `ccms-cli` and `ccms-tui` are thin front ends over this crate; all
//! matching semantics live here so the two front ends can never disagree
//! on what counts as a match.

mod coordinator;
mod error;
mod filters;
mod message;
mod noise;
mod parser;
mod project;
mod query;
mod render;
mod result;
mod scanner;

pub use coordinator::{Coordinator, SearchOutcome};
pub use error::{CoreError, Diagnostic, ScanError, SkipReason};
pub use filters::FilterSet;
pub use message::{ContentPart, Message, MessageKind, Payload, StringOrParts, ToolResultContent};
pub use query::{Query, RequiredLiteralSet};
pub use render::snippet;
pub use result::SearchResult;
