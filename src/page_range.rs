use crate::pdf;
use anyhow::{anyhow, Result};

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PageRange {
    pub start: PageRef,
    pub end: Option<PageRef>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PageRef {
    Index(usize),
    End,
}

impl PageRange {
    /// Parse a page range like "3", "0-4", "4-0" or "2-end" (zero-based)
    pub fn parse(s: &str) -> Result<Self> {
        let s = s.trim();
        if s.is_empty() {
            return Err(anyhow!("Empty page range"));
        }

        match s.split_once('-') {
            // A leading dash would be a negative index
            Some(("", _)) => Err(anyhow!("Invalid page range: {}", s)),
            Some((start, end)) => Ok(PageRange {
                start: parse_page_ref(start)?,
                end: Some(parse_page_ref(end)?),
            }),
            None => Ok(PageRange {
                start: parse_page_ref(s)?,
                end: None,
            }),
        }
    }

    /// Expand this range into zero-based page indices, in the written
    /// direction. A single index is passed through for the extractor to
    /// check; both bounds of a range must name existing pages.
    pub fn expand(&self, page_count: usize) -> Result<Vec<usize>> {
        let start = self.start.resolve(page_count)?;
        let end = match &self.end {
            Some(end) => end.resolve(page_count)?,
            None => return Ok(vec![start]),
        };
        if let Some(index) = [start, end].into_iter().find(|&bound| bound >= page_count) {
            return Err(pdf::Error::IndexOutOfRange { index, page_count }.into());
        }

        let pages = if start <= end {
            (start..=end).collect()
        } else {
            (end..=start).rev().collect()
        };
        Ok(pages)
    }
}

impl PageRef {
    fn resolve(&self, page_count: usize) -> Result<usize> {
        match self {
            PageRef::Index(n) => Ok(*n),
            PageRef::End => page_count
                .checked_sub(1)
                .ok_or_else(|| anyhow!("\"end\" used on a document with no pages")),
        }
    }
}

fn parse_page_ref(s: &str) -> Result<PageRef> {
    let s = s.trim();
    if s.eq_ignore_ascii_case("end") {
        Ok(PageRef::End)
    } else {
        s.parse::<usize>()
            .map(PageRef::Index)
            .map_err(|_| anyhow!("Invalid page index: {}", s))
    }
}

/// Parse a comma-separated list of page ranges like "0-4,9,12-end"
pub fn parse_page_ranges(s: &str) -> Result<Vec<PageRange>> {
    s.split(',')
        .map(|part| PageRange::parse(part.trim()))
        .collect()
}

/// Expand a page range string into zero-based page indices, keeping the
/// written order and any repeats
pub fn expand_page_ranges(s: &str, page_count: usize) -> Result<Vec<usize>> {
    let ranges = parse_page_ranges(s)?;
    let mut pages = Vec::new();
    for range in ranges {
        pages.extend(range.expand(page_count)?);
    }
    Ok(pages)
}
