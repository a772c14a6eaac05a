//! Fragment Parser (C2): a bounded sliding-window buffer plus pure-function
//! extraction primitives that operate on fragments, never a whole document.

pub mod buffer;
pub mod entities;
pub mod extract;

pub use buffer::StreamingBuffer;
