//! Serializes a [`Document`] through lopdf's writer as a classic PDF file:
//! header, objects in ascending number order, a cross-reference table, and
//! the trailer.

use super::document::Document;
use lopdf::xref::XrefType;
use lopdf::{Object, ObjectId};
use std::collections::{BTreeMap, HashMap};
use tracing::debug;

/// Writes `doc` as a complete PDF file.
///
/// Object numbers are kept when they already run `1..=n`; otherwise every
/// object is renumbered densely first, so the cross-reference table never
/// grows past the number of objects written.
///
/// # Panics
///
/// If `doc` has no catalog or holds a dangling reference. Documents from
/// [`parse`](super::parse) and [`extract`](super::extract) never do, so this
/// indicates a bug upstream rather than bad input.
pub fn serialize(doc: &Document) -> Vec<u8> {
    if let Some(id) = doc.dangling_reference() {
        panic!(
            "cannot serialize document: reference {} {} R has no target",
            id.0, id.1
        );
    }
    if doc.catalog().is_err() {
        panic!("cannot serialize document: trailer /Root does not name a catalog");
    }

    let mut out = lopdf::Document::with_version(doc.version.clone());
    out.reference_table.cross_reference_type = XrefType::CrossReferenceTable;
    out.objects = doc.objects.clone();
    out.trailer = doc.trailer.clone();
    out.trailer.remove(b"Size");

    let dense = out
        .objects
        .keys()
        .zip(1..)
        .all(|(&(number, _), expected)| number == expected);
    if !dense {
        compact(&mut out);
    }
    for object in out.objects.values_mut() {
        if let Object::Stream(stream) = object {
            stream.dict.set("Length", stream.content.len() as i64);
        }
    }
    out.max_id = out.objects.keys().next_back().map_or(0, |&(number, _)| number);

    let mut bytes = Vec::new();
    out.save_to(&mut bytes)
        .unwrap_or_else(|e| panic!("cannot serialize document: {}", e));
    debug!(
        objects = out.objects.len(),
        renumbered = !dense,
        bytes = bytes.len(),
        "serialized document"
    );
    bytes
}

/// Renumbers every object to `1..=n` in ascending order of its old number,
/// with generation 0, and rewrites references to match.
fn compact(doc: &mut lopdf::Document) {
    let numbers: HashMap<ObjectId, ObjectId> = doc
        .objects
        .keys()
        .zip(1..)
        .map(|(&old, number)| (old, (number, 0)))
        .collect();

    let mut objects = BTreeMap::new();
    for (old, mut object) in std::mem::take(&mut doc.objects) {
        renumber(&mut object, &numbers);
        objects.insert(numbers[&old], object);
    }
    doc.objects = objects;
    for (_, value) in doc.trailer.iter_mut() {
        renumber(value, &numbers);
    }
}

fn renumber(object: &mut Object, numbers: &HashMap<ObjectId, ObjectId>) {
    let mut pending = vec![object];
    while let Some(object) = pending.pop() {
        match object {
            Object::Reference(id) => {
                if let Some(&new) = numbers.get(id) {
                    *id = new;
                }
            }
            Object::Array(items) => pending.extend(items.iter_mut()),
            Object::Dictionary(dict) => pending.extend(dict.iter_mut().map(|(_, value)| value)),
            Object::Stream(stream) => {
                pending.extend(stream.dict.iter_mut().map(|(_, value)| value))
            }
            _ => {}
        }
    }
}
