//! # Codeseek Chunk Model
//!
//! Data contracts shared between the content-processing pipeline that produces
//! code chunks and the hybrid search engine that indexes them.
//!
//! - [`Chunk`] / [`ChunkMetadata`]: an indexed unit of source text
//! - [`SearchFilter`] / [`FilterOperator`]: caller-supplied filters, passed to
//!   the semantic provider and checked locally for boosting
//! - [`QueryComponent`] / [`ComponentKind`]: output of an external query
//!   decomposition layer, consumed by component-oriented search
//!
//! ## Example
//!
//! ```
//! use codeseek_chunk_model::{Chunk, ChunkMetadata};
//!
//! let chunk = Chunk::with_metadata(
//!     "src/user.ts#getUser",
//!     "function getUser(id) { return db.find(id); }",
//!     ChunkMetadata::new("function").with_framework("express"),
//! );
//! assert_eq!(chunk.display_name(), "src/user.ts#getUser");
//! ```

mod chunk;
mod component;
mod filter;

pub use chunk::{Chunk, ChunkMetadata};
pub use component::{ComponentKind, QueryComponent};
pub use filter::{FilterOperator, SearchFilter};
