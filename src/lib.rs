//! Page-subset extraction for PDF files.
//!
//! ```no_run
//! let source = pdfpick::pdf::parse(&std::fs::read("in.pdf")?)?;
//! let subset = pdfpick::pdf::extract(&source, &[2, 0, 0])?;
//! std::fs::write("out.pdf", pdfpick::pdf::serialize(&subset))?;
//! # Ok::<(), Box<dyn std::error::Error>>(())
//! ```

pub mod page_range;
pub mod pdf;
pub mod selection;

pub use selection::SelectionState;
