//! Page subset extraction.
//!
//! Builds a brand-new [`Document`] holding only the selected pages, in the
//! caller's order, plus every object those pages reach. Within one call an
//! object shared by several pages is copied once and referenced by all of
//! them; a page selected twice becomes two page objects sharing that copy.

use super::document::{dict_of, Document, PageLeaf};
use super::error::{Error, Result};
use super::nesting::{too_deep, MAX_NESTING_DEPTH};
use lopdf::{dictionary, Dictionary, Object, ObjectId, Stream};
use std::collections::{BTreeMap, HashMap, HashSet, VecDeque};
use tracing::debug;

pub const CATALOG_ID: ObjectId = (1, 0);
pub const PAGES_ID: ObjectId = (2, 0);
const FIRST_PAGE_NUMBER: u32 = 3;

/// US Letter, for pages that carry no MediaBox anywhere in their ancestry.
const DEFAULT_MEDIA_BOX: [i64; 4] = [0, 0, 612, 792];

/// Copies the pages at `selection` (zero-based, in output order, repeats
/// allowed) out of `source` into a new document with a flat page tree.
///
/// All-or-nothing: on error no document is produced, and `source` is never
/// modified either way.
pub fn extract(source: &Document, selection: &[usize]) -> Result<Document> {
    let tree = source.page_tree()?;
    let page_count = tree.pages.len();
    if let Some(&index) = selection.iter().find(|&&index| index >= page_count) {
        return Err(Error::IndexOutOfRange { index, page_count });
    }
    let too_many = || Error::malformed("selection needs more object numbers than a PDF allows");
    let page_slots = u32::try_from(selection.len()).map_err(|_| too_many())?;
    let next_number = FIRST_PAGE_NUMBER.checked_add(page_slots).ok_or_else(too_many)?;

    let output_ids: Vec<ObjectId> = (FIRST_PAGE_NUMBER..next_number)
        .map(|number| (number, 0))
        .collect();

    let mut first_copy = HashMap::new();
    for (&index, &output_id) in selection.iter().zip(&output_ids) {
        first_copy.entry(tree.pages[index].id).or_insert(output_id);
    }

    // Page tree nodes, the catalog, and any other page-like object. Links to
    // these (`/Parent`, `/P`, `/Dest`) would pull the whole source along.
    let mut structural = tree.nodes;
    structural.insert(source.catalog_id()?);
    structural.extend(source.objects.iter().filter_map(|(&id, object)| {
        let kind = dict_of(object)?.get(b"Type").and_then(Object::as_name).ok()?;
        matches!(kind, b"Page" | b"Pages" | b"Catalog").then_some(id)
    }));

    let mut copier = Copier {
        source,
        structural,
        first_copy,
        copied: HashMap::new(),
        queue: VecDeque::new(),
        objects: BTreeMap::new(),
        next_number,
    };

    let mut kids = Vec::with_capacity(selection.len());
    for (&index, &output_id) in selection.iter().zip(&output_ids) {
        let page = copier.copy_page(&tree.pages[index])?;
        copier.objects.insert(output_id, Object::Dictionary(page));
        kids.push(Object::Reference(output_id));
    }

    let info = match source.trailer.get(b"Info") {
        Ok(info) => Some(copier.translate(info, 0)?),
        Err(_) => None,
    };
    copier.drain()?;

    let mut document = Document::new(source.version.clone());
    document.objects = copier.objects;
    document.objects.insert(
        PAGES_ID,
        dictionary! {
            "Type" => "Pages",
            "Kids" => kids,
            "Count" => selection.len() as i64,
        }
        .into(),
    );
    document.objects.insert(
        CATALOG_ID,
        dictionary! {
            "Type" => "Catalog",
            "Pages" => PAGES_ID,
        }
        .into(),
    );
    document.trailer.set("Root", CATALOG_ID);
    if let Some(info) = info.filter(|info| !info.is_null()) {
        document.trailer.set("Info", info);
    }

    debug!(
        pages = selection.len(),
        objects = document.objects.len(),
        "extracted pages"
    );
    Ok(document)
}

struct Copier<'a> {
    source: &'a Document,
    /// Objects never copied as resources; references to them become null.
    structural: HashSet<ObjectId>,
    /// Source page -> its first copy in the output.
    first_copy: HashMap<ObjectId, ObjectId>,
    /// Source object -> output object, shared across all pages of one call.
    copied: HashMap<ObjectId, ObjectId>,
    /// Source objects that have an output number but no content yet.
    queue: VecDeque<ObjectId>,
    objects: BTreeMap<ObjectId, Object>,
    next_number: u32,
}

impl Copier<'_> {
    /// Builds the output page dictionary for one selected page.
    fn copy_page(&mut self, leaf: &PageLeaf) -> Result<Dictionary> {
        let source = self.source;
        let source_page = source
            .get_dict(leaf.id)
            .ok_or(Error::ResourceResolution(leaf.id))?;

        let mut page = Dictionary::new();
        for (key, value) in source_page.iter() {
            if key != b"Parent" {
                let value = self.translate(value, 1)?;
                page.set(key.clone(), value);
            }
        }
        for (key, value) in leaf.inherited.iter() {
            if !page.has(key) {
                let value = self.translate(value, 1)?;
                page.set(key.clone(), value);
            }
        }
        if !page.has(b"Resources") {
            page.set("Resources", Dictionary::new());
        }
        if !page.has(b"MediaBox") {
            let media_box: Vec<Object> = DEFAULT_MEDIA_BOX.iter().map(|&n| n.into()).collect();
            page.set("MediaBox", media_box);
        }
        page.set("Type", "Page");
        page.set("Parent", PAGES_ID);
        Ok(page)
    }

    /// Rewrites every reference in `value` into output numbering, assigning
    /// numbers (and queueing copies) for objects seen for the first time.
    /// `depth` counts the arrays and dictionaries enclosing `value`.
    fn translate(&mut self, value: &Object, depth: usize) -> Result<Object> {
        if depth > MAX_NESTING_DEPTH {
            return Err(too_deep());
        }
        let translated = match value {
            Object::Reference(id) => self.translate_reference(*id),
            Object::Array(items) => Object::Array(
                items
                    .iter()
                    .map(|item| self.translate(item, depth + 1))
                    .collect::<Result<_>>()?,
            ),
            Object::Dictionary(dict) => Object::Dictionary(self.translate_dict(dict, depth)?),
            Object::Stream(stream) => {
                let dict = self.translate_dict(&stream.dict, depth)?;
                Object::Stream(
                    Stream::new(dict, stream.content.clone())
                        .with_compression(stream.allows_compression),
                )
            }
            other => other.clone(),
        };
        Ok(translated)
    }

    fn translate_dict(&mut self, dict: &Dictionary, depth: usize) -> Result<Dictionary> {
        let mut translated = Dictionary::new();
        for (key, value) in dict.iter() {
            let value = self.translate(value, depth + 1)?;
            translated.set(key.clone(), value);
        }
        Ok(translated)
    }

    fn translate_reference(&mut self, id: ObjectId) -> Object {
        if let Some(&output) = self.first_copy.get(&id) {
            return Object::Reference(output);
        }
        if self.structural.contains(&id) {
            return Object::Null;
        }
        if let Some(&output) = self.copied.get(&id) {
            return Object::Reference(output);
        }
        let output = (self.next_number, 0);
        self.next_number += 1;
        self.copied.insert(id, output);
        self.queue.push_back(id);
        Object::Reference(output)
    }

    /// Copies queued objects until the reachable graph is exhausted.
    fn drain(&mut self) -> Result<()> {
        let source = self.source;
        while let Some(id) = self.queue.pop_front() {
            let object = source
                .get(id)
                .ok_or(Error::ResourceResolution(id))?;
            let translated = self.translate(object, 0)?;
            self.objects.insert(self.copied[&id], translated);
        }
        Ok(())
    }
}
