//! Small data-structure and concurrency helpers shared across the workspace.
//!
//! Nothing here knows about git; it's infrastructure any of the other crates
//! can depend on without pulling in the object model.

#![deny(rust_2018_idioms)]

mod pipeline;
mod sync;

pub use pipeline::{Pipeline, PipelineHandle};
pub use sync::OneThread;
