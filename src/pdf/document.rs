use super::error::{Error, Result};
use lopdf::{Dictionary, Object, ObjectId};
use std::collections::{BTreeMap, HashSet};

/// Page attributes a leaf may inherit from its ancestors in the page tree.
pub const INHERITABLE_KEYS: [&[u8]; 4] = [b"Resources", b"MediaBox", b"CropBox", b"Rotate"];

/// An in-memory PDF: every indirect object, plus the document-level trailer
/// entries (`/Root`, and `/Info` and `/ID` when present).
#[derive(Debug, Clone, PartialEq)]
pub struct Document {
    /// Header version, e.g. `"1.7"`.
    pub version: String,
    pub objects: BTreeMap<ObjectId, Object>,
    pub trailer: Dictionary,
}

/// A leaf of the page tree, in document order.
#[derive(Debug, Clone, PartialEq)]
pub struct PageLeaf {
    pub id: ObjectId,
    /// Inheritable attributes supplied by ancestors, nearest ancestor first
    /// wins. The leaf's own entries are not included.
    pub inherited: Dictionary,
}

/// Result of walking the page tree from the catalog.
#[derive(Debug, Clone)]
pub struct PageTree {
    pub pages: Vec<PageLeaf>,
    /// Every node visited, intermediate and leaf.
    pub nodes: HashSet<ObjectId>,
}

impl Document {
    pub fn new(version: impl Into<String>) -> Self {
        Document {
            version: version.into(),
            objects: BTreeMap::new(),
            trailer: Dictionary::new(),
        }
    }

    pub fn get(&self, id: ObjectId) -> Option<&Object> {
        self.objects.get(&id)
    }

    /// The dictionary of the dictionary or stream object `id`.
    pub fn get_dict(&self, id: ObjectId) -> Option<&Dictionary> {
        self.get(id).and_then(dict_of)
    }

    /// Follows `object` through any chain of references.
    pub fn resolve<'a>(&'a self, mut object: &'a Object) -> Option<&'a Object> {
        let mut hops = 0;
        while let Object::Reference(id) = object {
            object = self.get(*id)?;
            hops += 1;
            if hops > self.objects.len() {
                return None;
            }
        }
        Some(object)
    }

    pub fn catalog_id(&self) -> Result<ObjectId> {
        self.trailer
            .get(b"Root")
            .and_then(Object::as_reference)
            .map_err(|_| Error::malformed("trailer has no /Root reference"))
    }

    pub fn catalog(&self) -> Result<&Dictionary> {
        let id = self.catalog_id()?;
        self.get_dict(id)
            .ok_or_else(|| Error::malformed(format!("catalog {} {} R is not a dictionary", id.0, id.1)))
    }

    /// Walks the page tree depth first, in `/Kids` order.
    pub fn page_tree(&self) -> Result<PageTree> {
        let root = self
            .catalog()?
            .get(b"Pages")
            .and_then(Object::as_reference)
            .map_err(|_| Error::malformed("catalog has no /Pages reference"))?;

        let mut pages = Vec::new();
        let mut nodes = HashSet::new();
        let mut stack = vec![(root, Dictionary::new())];

        while let Some((id, inherited)) = stack.pop() {
            if !nodes.insert(id) {
                return Err(Error::malformed(format!(
                    "page tree node {} {} R is reachable twice",
                    id.0, id.1
                )));
            }
            let node = self.get_dict(id).ok_or_else(|| {
                Error::malformed(format!("page tree node {} {} R is missing", id.0, id.1))
            })?;

            let kids = match (node.get(b"Type").and_then(Object::as_name).ok(), node.get(b"Kids").ok()) {
                (Some(b"Page"), _) | (None, None) => None,
                (_, Some(kids)) => Some(
                    self.resolve(kids)
                        .and_then(|kids| kids.as_array().ok())
                        .ok_or_else(|| {
                            Error::malformed(format!("/Kids of {} {} R is not an array", id.0, id.1))
                        })?,
                ),
                (Some(other), None) => {
                    return Err(Error::malformed(format!(
                        "page tree node {} {} R has type /{} and no /Kids",
                        id.0,
                        id.1,
                        String::from_utf8_lossy(other)
                    )))
                }
            };

            match kids {
                None => pages.push(PageLeaf { id, inherited }),
                Some(kids) => {
                    let mut passed = inherited;
                    for key in INHERITABLE_KEYS {
                        if let Ok(value) = node.get(key) {
                            passed.set(key, value.clone());
                        }
                    }
                    for kid in kids.iter().rev() {
                        let kid = kid.as_reference().map_err(|_| {
                            Error::malformed(format!(
                                "/Kids of {} {} R holds a non-reference",
                                id.0, id.1
                            ))
                        })?;
                        stack.push((kid, passed.clone()));
                    }
                }
            }
        }

        Ok(PageTree { pages, nodes })
    }

    pub fn pages(&self) -> Result<Vec<PageLeaf>> {
        Ok(self.page_tree()?.pages)
    }

    pub fn page_count(&self) -> Result<usize> {
        Ok(self.page_tree()?.pages.len())
    }

    /// Looks up a page attribute on the leaf, falling back to inheritance.
    pub fn page_attribute<'a>(&'a self, page: &'a PageLeaf, key: &[u8]) -> Option<&'a Object> {
        self.get_dict(page.id)
            .and_then(|dict| dict.get(key).ok())
            .or_else(|| page.inherited.get(key).ok())
            .and_then(|value| self.resolve(value))
    }

    /// A reference, in the trailer or any object, whose target is not in the
    /// object map.
    pub fn dangling_reference(&self) -> Option<ObjectId> {
        let mut pending: Vec<&Object> = self.trailer.iter().map(|(_, value)| value).collect();
        pending.extend(self.objects.values());
        while let Some(object) = pending.pop() {
            match object {
                Object::Reference(id) if !self.objects.contains_key(id) => return Some(*id),
                Object::Array(items) => pending.extend(items),
                Object::Dictionary(dict) => pending.extend(dict.iter().map(|(_, value)| value)),
                Object::Stream(stream) => {
                    pending.extend(stream.dict.iter().map(|(_, value)| value))
                }
                _ => {}
            }
        }
        None
    }

    /// Metadata from the document information dictionary.
    pub fn info(&self) -> DocumentInfo {
        let mut info = DocumentInfo::default();

        let dict = self
            .trailer
            .get(b"Info")
            .ok()
            .and_then(|obj| self.resolve(obj))
            .and_then(dict_of);
        if let Some(dict) = dict {
            info.title = get_string_from_dict(dict, b"Title");
            info.author = get_string_from_dict(dict, b"Author");
            info.creator = get_string_from_dict(dict, b"Creator");
            info.producer = get_string_from_dict(dict, b"Producer");
            info.creation_date = get_string_from_dict(dict, b"CreationDate");
            info.mod_date = get_string_from_dict(dict, b"ModDate");
            info.subject = get_string_from_dict(dict, b"Subject");
            info.keywords = get_string_from_dict(dict, b"Keywords");
        }

        info
    }
}

#[derive(Debug, Default, Clone)]
pub struct DocumentInfo {
    pub title: Option<String>,
    pub author: Option<String>,
    pub creator: Option<String>,
    pub producer: Option<String>,
    pub creation_date: Option<String>,
    pub mod_date: Option<String>,
    pub subject: Option<String>,
    pub keywords: Option<String>,
}

/// The dictionary of a dictionary or stream object.
pub(crate) fn dict_of(object: &Object) -> Option<&Dictionary> {
    match object {
        Object::Dictionary(dict) => Some(dict),
        Object::Stream(stream) => Some(&stream.dict),
        _ => None,
    }
}

fn get_string_from_dict(dict: &Dictionary, key: &[u8]) -> Option<String> {
    dict.get(key).ok().and_then(|obj| match obj {
        Object::String(bytes, _) => decode_pdf_string(bytes),
        _ => None,
    })
}

fn decode_pdf_string(bytes: &[u8]) -> Option<String> {
    // Check for UTF-16 BOM
    if bytes.len() >= 2 && bytes[0] == 0xFE && bytes[1] == 0xFF {
        let u16_chars: Vec<u16> = bytes[2..]
            .chunks_exact(2)
            .map(|chunk| u16::from_be_bytes([chunk[0], chunk[1]]))
            .collect();
        String::from_utf16(&u16_chars).ok()
    } else {
        // Latin-1 / PDFDocEncoding (simplified)
        Some(bytes.iter().map(|&b| b as char).collect())
    }
}
