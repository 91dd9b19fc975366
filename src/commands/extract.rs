use super::info::load;
use anyhow::{Context, Result};
use pdfpick::page_range::expand_page_ranges;
use pdfpick::pdf::{self, Document};
use pdfpick::SelectionState;
use std::path::Path;
use tracing::info;

/// Copies the pages at `selection` (zero-based, in output order) from
/// `input` into a new PDF at `output`. Returns the output page count.
pub fn extract_file<P: AsRef<Path>, Q: AsRef<Path>>(
    input: P,
    selection: SelectionState,
    output: Q,
) -> Result<usize> {
    let source = load(&input)?;
    write_selection(&source, selection, output)
}

fn write_selection<Q: AsRef<Path>>(
    source: &Document,
    selection: SelectionState,
    output: Q,
) -> Result<usize> {
    if selection.is_empty() {
        anyhow::bail!("No pages specified");
    }
    selection.validate(source.page_count()?)?;

    let pages = selection.into_sequence();
    let new_doc = pdf::extract(source, &pages)?;
    let bytes = pdf::serialize(&new_doc);

    let output = output.as_ref();
    std::fs::write(output, &bytes)
        .with_context(|| format!("Failed to write PDF: {}", output.display()))?;
    info!(
        output = %output.display(),
        pages = pages.len(),
        bytes = bytes.len(),
        "wrote extracted pages"
    );
    Ok(pages.len())
}

pub fn run<P: AsRef<Path>, Q: AsRef<Path>>(input: P, pages: &str, output: Q) -> Result<()> {
    let source = load(&input)?;
    let selection: SelectionState = expand_page_ranges(pages, source.page_count()?)?
        .into_iter()
        .collect();

    let extracted = write_selection(&source, selection, &output)?;

    println!(
        "Extracted {} page(s) to {}",
        extracted,
        output.as_ref().display()
    );

    Ok(())
}
