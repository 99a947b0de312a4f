//! Host adapters implementing the capability model
//!
//! - `memory` - in-process object tree with a queued event pump
//! - `demo` - the widgets-style demo window served by the binary

pub mod demo;
pub mod memory;

pub use demo::{build_demo, page_container, DemoApp};
pub use memory::{Facet, MemoryHost, MemoryObject, ObjectBuilder};
