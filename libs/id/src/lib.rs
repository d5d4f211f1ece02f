//! # tramdoc-id
//!
//! Typed identifiers for tramdoc resources.
//!
//! Every resource ID is rendered as `{prefix}_{ulid}`:
//!
//! - `book_01HV4Z2WQXKJNM8GPQY6VBKC3D`
//! - `note_01HV4Z3MXNKPQR9HSTZ7WCLD4E`
//! - `req_01HV4Z4NYPLTRS0JTUA8XDME5F`
//!
//! The prefix keeps a note id from being passed where a book id is expected,
//! and the ULID keeps ids sortable by creation time.

mod error;
mod macros;
mod types;

pub use error::IdError;
pub use types::*;

/// Re-export ulid for consumers that need raw ULID operations
pub use ulid::Ulid;
