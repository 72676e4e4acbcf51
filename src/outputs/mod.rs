//! Run artifacts written after a selection.
//!
//! # Output Structure
//!
//! ```text
//! report_dir/
//! └── 2025-05-06/
//!     └── selection.json
//! ```

pub mod json;
