//! Port implementations over the in-memory store.

mod modification;
mod stage;
mod timeline;
