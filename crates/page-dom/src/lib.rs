//! Live-page access for the fastfill engine.
//!
//! The engine only ever touches the page through [`PageDom`]. [`MemoryPage`] is an in-memory
//! document used for offline runs and tests; browser-backed implementations live elsewhere.

pub mod errors;
pub mod memory;
pub mod node;
pub mod page;
pub mod selector;

pub use errors::DomError;
pub use memory::MemoryPage;
pub use node::{EventKind, NodeId, Notification, Scope, SelectOption, Tone};
pub use page::PageDom;
pub use selector::{AttrMatcher, AttrOp, Complex, Compound, Selector, SelectorTarget};
