//! Fixtures shared by the unit tests.

use super::document::Document;
use lopdf::{dictionary, Dictionary, Object, ObjectId, Stream};

/// Font used by every page of [`sample_document`].
pub const FONT_ID: ObjectId = (3, 0);
/// Image used by pages 0 and 1 of [`sample_document`].
pub const SHARED_IMAGE_ID: ObjectId = (4, 0);
const INFO_ID: ObjectId = (5, 0);

fn rect(values: [f64; 4]) -> Object {
    Object::Array(
        values
            .iter()
            .map(|&v| {
                if v.fract() == 0.0 {
                    Object::Integer(v as i64)
                } else {
                    Object::Real(v as f32)
                }
            })
            .collect(),
    )
}

/// A flat document of `page_count` pages under a single root `/Pages` node.
///
/// Every page draws with the shared font [`FONT_ID`]; the first two also
/// paint the shared image [`SHARED_IMAGE_ID`]. Content streams differ per
/// page so pages are distinguishable by [`page_graph`].
pub fn sample_document(page_count: usize) -> Document {
    let mut doc = Document::new("1.7");
    let page_ids: Vec<ObjectId> = (0..page_count)
        .map(|i| (7 + 2 * i as u32, 0))
        .collect();

    doc.objects.insert(
        (1, 0),
        dictionary! { "Type" => "Catalog", "Pages" => (2, 0) }.into(),
    );
    let kids: Vec<Object> = page_ids.iter().map(|&id| id.into()).collect();
    doc.objects.insert(
        (2, 0),
        dictionary! {
            "Type" => "Pages",
            "Kids" => kids,
            "Count" => page_count as i64,
        }
        .into(),
    );
    doc.objects.insert(
        FONT_ID,
        dictionary! {
            "Type" => "Font",
            "Subtype" => "Type1",
            "BaseFont" => "Helvetica",
        }
        .into(),
    );
    let image = dictionary! {
        "Type" => "XObject",
        "Subtype" => "Image",
        "Width" => 2,
        "Height" => 2,
        "ColorSpace" => "DeviceGray",
        "BitsPerComponent" => 8,
    };
    doc.objects.insert(
        SHARED_IMAGE_ID,
        Stream::new(image, vec![0x00, 0x40, 0x80, 0xFF]).into(),
    );
    doc.objects.insert(
        INFO_ID,
        dictionary! {
            "Title" => Object::string_literal("Sample (five) pages"),
            "Producer" => Object::string_literal("pdfpick tests"),
        }
        .into(),
    );

    for (index, &page_id) in page_ids.iter().enumerate() {
        let content_id = (page_id.0 - 1, 0);
        let mut content = format!("BT /F1 12 Tf 72 720 Td (Page {}) Tj ET", index + 1);
        let mut resources = dictionary! {
            "Font" => dictionary! { "F1" => FONT_ID },
        };
        if index < 2 {
            content.push_str("\nq 100 0 0 100 72 500 cm /Im1 Do Q");
            resources.set("XObject", dictionary! { "Im1" => SHARED_IMAGE_ID });
        }
        doc.objects.insert(
            content_id,
            Stream::new(Dictionary::new(), content.into_bytes()).into(),
        );
        let page = dictionary! {
            "Type" => "Page",
            "Parent" => (2, 0),
            "MediaBox" => rect([0.0, 0.0, 612.0, 792.0]),
            "CropBox" => rect([18.5, 18.5, 593.5, 773.5]),
            "Resources" => resources,
            "Contents" => content_id,
        };
        doc.objects.insert(page_id, page.into());
    }

    doc.trailer.set("Root", (1, 0));
    doc.trailer.set("Info", INFO_ID);
    doc
}

/// The content reachable from page `index` with every reference inlined,
/// inherited attributes applied and `/Parent` dropped. Two pages with equal
/// graphs render identically regardless of object numbering.
pub fn page_graph(doc: &Document, index: usize) -> Object {
    let pages = doc.pages().unwrap();
    let leaf = &pages[index];
    let mut page = doc.get_dict(leaf.id).unwrap().clone();
    for (key, value) in leaf.inherited.iter() {
        if !page.has(key) {
            page.set(key.clone(), value.clone());
        }
    }
    page.remove(b"Parent");
    let page_ids: Vec<ObjectId> = pages.iter().map(|p| p.id).collect();
    inline(doc, &Object::Dictionary(page), &page_ids, &mut Vec::new())
}

fn inline(doc: &Document, object: &Object, pages: &[ObjectId], path: &mut Vec<ObjectId>) -> Object {
    match object {
        // Page links are compared by presence only; their numbering differs.
        Object::Reference(id) if pages.contains(id) => "PageLink".into(),
        Object::Reference(id) if path.contains(id) => "Cycle".into(),
        Object::Reference(id) => {
            path.push(*id);
            let target = doc.get(*id).unwrap_or(&Object::Null);
            let inlined = inline(doc, target, pages, path);
            path.pop();
            inlined
        }
        Object::Array(items) => Object::Array(
            items
                .iter()
                .map(|item| inline(doc, item, pages, path))
                .collect(),
        ),
        Object::Dictionary(dict) => Object::Dictionary(inline_dict(doc, dict, pages, path)),
        Object::Stream(stream) => Object::Stream(Stream::new(
            inline_dict(doc, &stream.dict, pages, path),
            stream.content.clone(),
        )),
        other => other.clone(),
    }
}

fn inline_dict(doc: &Document, dict: &Dictionary, pages: &[ObjectId], path: &mut Vec<ObjectId>) -> Dictionary {
    dict.iter()
        .map(|(key, value)| (key.clone(), inline(doc, value, pages, path)))
        .collect()
}

/// A `page_count`-page PDF written by lopdf, for checking that files from
/// another producer parse.
pub fn lopdf_fixture(page_count: usize) -> Vec<u8> {
    let mut doc = lopdf::Document::with_version("1.5");
    let pages_id = doc.new_object_id();
    let font_id = doc.add_object(dictionary! {
        "Type" => "Font",
        "Subtype" => "Type1",
        "BaseFont" => "Courier",
    });

    let mut kids = Vec::new();
    for index in 0..page_count {
        let content = format!("BT /F1 24 Tf 100 600 Td (Fixture page {}) Tj ET", index + 1);
        let content_id = doc.add_object(Stream::new(dictionary! {}, content.into_bytes()));
        let page_id = doc.add_object(dictionary! {
            "Type" => "Page",
            "Parent" => Object::Reference(pages_id),
            "Contents" => Object::Reference(content_id),
        });
        kids.push(Object::Reference(page_id));
    }

    doc.objects.insert(
        pages_id,
        Object::Dictionary(dictionary! {
            "Type" => "Pages",
            "Kids" => kids,
            "Count" => Object::Integer(page_count as i64),
            "MediaBox" => vec![
                Object::Integer(0),
                Object::Integer(0),
                Object::Integer(595),
                Object::Integer(842),
            ],
            "Resources" => dictionary! {
                "Font" => dictionary! { "F1" => Object::Reference(font_id) },
            },
        }),
    );
    let catalog_id = doc.add_object(dictionary! {
        "Type" => "Catalog",
        "Pages" => Object::Reference(pages_id),
    });
    doc.trailer.set("Root", Object::Reference(catalog_id));

    let mut buf = Vec::new();
    doc.save_to(&mut buf).unwrap();
    buf
}
