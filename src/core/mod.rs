//! Core buffer components.
//!
//! This module contains the scrollback model, free of any terminal I/O:
//!
//! - **wrap**: splitting raw output into rows that fit the console width
//! - **line_store**: the fixed-capacity scrollback ring and its view cursor
//!
//! # Data Flow
//!
//! ```text
//! write / write_line
//!   └── LineStore::append
//!       ├── wrap (merge with the open row, split, chunk)
//!       └── push (evict oldest, keep view anchored)
//! ```

pub mod wrap;
pub mod line_store;

pub use line_store::{ColoredLine, LineStore};
pub use wrap::wrap;
