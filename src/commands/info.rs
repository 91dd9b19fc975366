use anyhow::{Context, Result};
use pdfpick::pdf::{self, Document, DocumentInfo, Object, PageLeaf};
use serde::Serialize;
use std::path::Path;

/// What `info` reports about one page.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PageSummary {
    /// Zero-based, as accepted by `extract`.
    pub index: usize,
    pub media_box: Option<[f64; 4]>,
    pub content_streams: usize,
    pub resources: usize,
}

#[derive(Debug, Clone)]
pub struct Summary {
    pub version: String,
    pub object_count: usize,
    pub info: DocumentInfo,
    pub pages: Vec<PageSummary>,
}

/// Reads and parses the PDF at `path`.
pub fn load<P: AsRef<Path>>(path: P) -> Result<Document> {
    let path = path.as_ref();
    let data =
        std::fs::read(path).with_context(|| format!("Failed to read PDF: {}", path.display()))?;
    pdf::parse(&data).with_context(|| format!("Failed to parse PDF: {}", path.display()))
}

pub fn inspect<P: AsRef<Path>>(path: P) -> Result<Summary> {
    let doc = load(&path)?;
    let pages = doc
        .pages()?
        .iter()
        .enumerate()
        .map(|(index, page)| summarize_page(&doc, index, page))
        .collect();

    Ok(Summary {
        version: doc.version.clone(),
        object_count: doc.objects.len(),
        info: doc.info(),
        pages,
    })
}

fn summarize_page(doc: &Document, index: usize, page: &PageLeaf) -> PageSummary {
    let media_box = doc
        .page_attribute(page, b"MediaBox")
        .and_then(|media_box| media_box.as_array().ok())
        .and_then(|values| {
            let values: Vec<f64> = values
                .iter()
                .filter_map(|v| doc.resolve(v)?.as_float().ok())
                .map(f64::from)
                .collect();
            values.try_into().ok()
        });

    let content_streams = match doc
        .get_dict(page.id)
        .and_then(|dict| dict.get(b"Contents").ok())
        .and_then(|contents| doc.resolve(contents))
    {
        Some(Object::Array(parts)) => parts.len(),
        Some(Object::Stream(_)) => 1,
        _ => 0,
    };

    // Named resources across all categories (fonts, images, ...).
    let resources = doc
        .page_attribute(page, b"Resources")
        .and_then(|resources| resources.as_dict().ok())
        .map(|dict| {
            dict.iter()
                .filter_map(|(_, category)| doc.resolve(category)?.as_dict().ok())
                .map(|category| category.len())
                .sum()
        })
        .unwrap_or(0);

    PageSummary {
        index,
        media_box,
        content_streams,
        resources,
    }
}

pub fn run<P: AsRef<Path>>(path: P) -> Result<()> {
    let summary = inspect(&path)?;
    let info = &summary.info;

    println!("File: {}", path.as_ref().display());
    println!("PDF version: {}", summary.version);
    println!("Objects: {}", summary.object_count);
    println!("Pages: {}", summary.pages.len());

    if let Some(title) = &info.title {
        println!("Title: {}", title);
    }
    if let Some(author) = &info.author {
        println!("Author: {}", author);
    }
    if let Some(subject) = &info.subject {
        println!("Subject: {}", subject);
    }
    if let Some(creator) = &info.creator {
        println!("Creator: {}", creator);
    }
    if let Some(producer) = &info.producer {
        println!("Producer: {}", producer);
    }
    if let Some(creation_date) = &info.creation_date {
        println!("Created: {}", format_pdf_date(creation_date));
    }
    if let Some(mod_date) = &info.mod_date {
        println!("Modified: {}", format_pdf_date(mod_date));
    }

    for page in &summary.pages {
        let size = match page.media_box {
            Some([x0, y0, x1, y1]) => format!("{} x {} pt", (x1 - x0).abs(), (y1 - y0).abs()),
            None => "no media box".to_string(),
        };
        println!(
            "  [{}] {}, {} content stream(s), {} resource(s)",
            page.index, size, page.content_streams, page.resources
        );
    }

    Ok(())
}

fn format_pdf_date(date: &str) -> String {
    // D:YYYYMMDDHHmmSSOHH'mm
    let Some(d) = date.strip_prefix("D:") else {
        return date.to_string();
    };
    let digits = d.bytes().take_while(u8::is_ascii_digit).count();
    if digits < 8 {
        return date.to_string();
    }
    let time = if digits >= 14 {
        format!(" {}:{}:{}", &d[8..10], &d[10..12], &d[12..14])
    } else {
        String::new()
    };
    format!("{}-{}-{}{}", &d[0..4], &d[4..6], &d[6..8], time)
}
