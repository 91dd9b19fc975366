//! The PDF page-subset engine: parse a complete file into a [`Document`],
//! copy a selection of its pages into a new document, and write that
//! document back out. Object syntax, cross-reference data and object streams
//! are handled by lopdf; this module adds the structural checks and the
//! page copying on top.

mod document;
mod error;
mod extract;
mod nesting;
mod parser;
mod writer;

#[cfg(test)]
pub(crate) mod testing;

pub use document::{Document, DocumentInfo, PageLeaf, PageTree, INHERITABLE_KEYS};
pub use error::{Error, Result};
pub use extract::{extract, CATALOG_ID, PAGES_ID};
pub use lopdf::{Dictionary, Object, ObjectId, Stream, StringFormat};
pub use nesting::MAX_NESTING_DEPTH;
pub use parser::parse;
pub use writer::serialize;
