use super::document::Document;
use super::error::{Error, Result};
use super::nesting;
use lopdf::{Dictionary, Object};
use tracing::debug;

/// Trailer keys that describe the document rather than the file layout.
const DOCUMENT_TRAILER_KEYS: [&[u8]; 3] = [b"Root", b"Info", b"ID"];

/// Object types that only describe how a file is laid out.
const CONTAINER_TYPES: [&[u8]; 3] = [b"ObjStm", b"XRef", b"Linearized"];

/// Parses a complete PDF file held in memory.
///
/// lopdf reads the objects; the result is then checked for encryption, object
/// numbers beyond the trailer's `/Size`, dangling references and a readable
/// page tree before it is returned.
pub fn parse(data: &[u8]) -> Result<Document> {
    nesting::check(data)?;
    let loaded = lopdf::Document::load_mem(data).map_err(|e| match e {
        lopdf::Error::Decryption(e) => Error::unsupported(format!("encrypted document: {}", e)),
        other => Error::malformed(other.to_string()),
    })?;

    let version = check_version(&loaded.version)?;
    if loaded.trailer.has(b"Encrypt") {
        return Err(Error::unsupported("encrypted documents"));
    }

    let size = loaded
        .trailer
        .get(b"Size")
        .and_then(Object::as_i64)
        .map_err(|_| Error::malformed("trailer has no /Size"))?;
    if let Some(&(number, _)) = loaded.objects.keys().next_back() {
        if i64::from(number) >= size {
            return Err(Error::malformed(format!(
                "object number {} is not below the trailer /Size {}",
                number, size
            )));
        }
    }

    let mut trailer = Dictionary::new();
    for key in DOCUMENT_TRAILER_KEYS {
        if let Ok(value) = loaded.trailer.get(key) {
            trailer.set(key, value.clone());
        }
    }
    let mut objects = loaded.objects;
    objects.retain(|_, object| {
        object
            .type_name()
            .map_or(true, |kind| !CONTAINER_TYPES.contains(&kind))
    });

    let document = Document {
        version,
        objects,
        trailer,
    };
    if let Some(id) = document.dangling_reference() {
        return Err(Error::malformed(format!(
            "reference to missing object {} {} R",
            id.0, id.1
        )));
    }
    let page_count = document.page_count()?;
    debug!(
        version = %document.version,
        objects = document.objects.len(),
        pages = page_count,
        "parsed document"
    );
    Ok(document)
}

/// Checks the `M.m` from the `%PDF-M.m` header line.
fn check_version(header: &str) -> Result<String> {
    let version = header.trim();
    let major = match version.split_once('.') {
        Some((major, minor)) if !minor.is_empty() && minor.bytes().all(|b| b.is_ascii_digit()) => {
            major.parse::<u32>().ok()
        }
        _ => None,
    }
    .ok_or_else(|| Error::malformed(format!("invalid header version '{}'", version)))?;
    if !(1..=2).contains(&major) {
        return Err(Error::unsupported(format!("PDF version {}", version)));
    }
    Ok(version.to_string())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::pdf::nesting::MAX_NESTING_DEPTH;
    use crate::pdf::testing::{lopdf_fixture, page_graph, sample_document};
    use crate::pdf::writer::serialize;
    use flate2::write::ZlibEncoder;
    use flate2::Compression;
    use std::io::Write;

    /// Assembles a classic-xref file from `(number, body)` pairs, one xref
    /// subsection per object. `/Size` is filled in unless `trailer` has one.
    fn build_pdf(version: &str, objects: &[(u32, &[u8])], trailer: &str) -> Vec<u8> {
        let mut data = format!("%PDF-{}\n", version).into_bytes();
        let mut offsets = Vec::new();
        for (number, body) in objects {
            offsets.push((*number, data.len()));
            data.extend_from_slice(format!("{} 0 obj\n", number).as_bytes());
            data.extend_from_slice(body);
            data.extend_from_slice(b"\nendobj\n");
        }
        let xref_offset = data.len();
        data.extend_from_slice(b"xref\n0 1\n0000000000 65535 f\r\n");
        for (number, offset) in &offsets {
            data.extend_from_slice(format!("{} 1\n{:010} 00000 n\r\n", number, offset).as_bytes());
        }
        let size = if trailer.contains("/Size") {
            String::new()
        } else {
            let size = objects.iter().map(|(n, _)| n + 1).max().unwrap_or(1);
            format!("/Size {} ", size)
        };
        data.extend_from_slice(
            format!(
                "trailer\n<< {}{} >>\nstartxref\n{}\n%%EOF\n",
                size, trailer, xref_offset
            )
            .as_bytes(),
        );
        data
    }

    fn minimal_objects() -> Vec<(u32, &'static [u8])> {
        vec![
            (1, b"<< /Type /Catalog /Pages 2 0 R >>"),
            (2, b"<< /Type /Pages /Kids [3 0 R] /Count 1 >>"),
            (3, b"<< /Type /Page /Parent 2 0 R /MediaBox [0 0 612 792] /Contents 4 0 R >>"),
            (4, b"<< /Length 5 0 R >>\nstream\nBT ET\nendstream"),
            (5, b"5"),
        ]
    }

    fn find(data: &[u8], needle: &[u8]) -> usize {
        data.windows(needle.len())
            .position(|window| window == needle)
            .unwrap()
    }

    #[test]
    fn test_parse_minimal_document() {
        let data = build_pdf("1.4", &minimal_objects(), "/Root 1 0 R");
        let doc = parse(&data).unwrap();
        assert_eq!(doc.version, "1.4");
        assert_eq!(doc.page_count().unwrap(), 1);

        // Indirect /Length is resolved and rewritten as a direct integer.
        let Some(Object::Stream(stream)) = doc.get((4, 0)) else {
            panic!("content stream missing");
        };
        assert_eq!(stream.content, b"BT ET");
        assert_eq!(stream.dict.get(b"Length").ok(), Some(&Object::Integer(5)));
    }

    #[test]
    fn test_unreadable_stream_leaves_dangling_contents() {
        let mut objects = minimal_objects();
        objects[3] = (4, b"<< /Length 999 >>\nstream\r\nq Q\r\nendstream");
        let data = build_pdf("1.4", &objects, "/Root 1 0 R");
        assert!(matches!(parse(&data), Err(Error::MalformedStructure(_))));
    }

    #[test]
    fn test_missing_header() {
        let data = build_pdf("1.4", &minimal_objects(), "/Root 1 0 R");
        let stripped = &data[b"%PDF-1.4\n".len()..];
        assert!(matches!(parse(stripped), Err(Error::MalformedStructure(_))));
    }

    #[test]
    fn test_future_major_version_is_unsupported() {
        let data = build_pdf("3.0", &minimal_objects(), "/Root 1 0 R");
        assert!(matches!(parse(&data), Err(Error::UnsupportedVersion(_))));
        assert_eq!(check_version("2.0 "), Ok("2.0".to_string()));
        assert!(matches!(check_version("1."), Err(Error::MalformedStructure(_))));
    }

    #[test]
    fn test_encrypted_document_is_unsupported() {
        let mut objects = minimal_objects();
        objects.push((6, b"<< /Filter /Standard /V 1 /R 2 >>"));
        let data = build_pdf("1.4", &objects, "/Root 1 0 R /Encrypt 6 0 R");
        assert!(matches!(parse(&data), Err(Error::UnsupportedVersion(_))));
    }

    #[test]
    fn test_dangling_reference_is_malformed() {
        let mut objects = minimal_objects();
        objects[2] = (
            3,
            b"<< /Type /Page /Parent 2 0 R /Resources 42 0 R /Contents 4 0 R >>",
        );
        let data = build_pdf("1.4", &objects, "/Root 1 0 R");
        assert!(matches!(parse(&data), Err(Error::MalformedStructure(_))));
    }

    #[test]
    fn test_missing_root_is_malformed() {
        let data = build_pdf("1.4", &minimal_objects(), "");
        assert!(matches!(parse(&data), Err(Error::MalformedStructure(_))));
    }

    #[test]
    fn test_truncated_file_is_malformed() {
        let data = build_pdf("1.4", &minimal_objects(), "/Root 1 0 R");
        let truncated = &data[..data.len() / 2];
        assert!(matches!(parse(truncated), Err(Error::MalformedStructure(_))));
    }

    #[test]
    fn test_xref_entry_pointing_at_wrong_object() {
        let mut data = build_pdf("1.4", &minimal_objects(), "/Root 1 0 R");
        // Renumber object 5 in its header; the xref still lists it as 5.
        let position = find(&data, b"5 0 obj");
        data[position] = b'7';
        assert!(matches!(parse(&data), Err(Error::MalformedStructure(_))));
    }

    #[test]
    fn test_object_number_beyond_size_is_malformed() {
        let mut objects = minimal_objects();
        objects.push((4_000_000_000, b"null"));
        let data = build_pdf("1.4", &objects, "/Size 6 /Root 1 0 R");
        assert!(matches!(parse(&data), Err(Error::MalformedStructure(_))));
    }

    #[test]
    fn test_deeply_nested_object_is_malformed() {
        let deep = format!(
            "<< /Type /Page /Parent 2 0 R /Foo {} >>",
            "[".repeat(200_000)
        );
        // Nesting up to the limit still parses.
        let shallow = format!(
            "<< /Type /Page /Parent 2 0 R /Contents 4 0 R /Foo {}{} >>",
            "[".repeat(MAX_NESTING_DEPTH - 1),
            "]".repeat(MAX_NESTING_DEPTH - 1)
        );

        let mut objects: Vec<(u32, &[u8])> = minimal_objects();
        objects[2] = (3, deep.as_bytes());
        let data = build_pdf("1.4", &objects, "/Root 1 0 R");
        assert!(matches!(parse(&data), Err(Error::MalformedStructure(_))));

        objects[2] = (3, shallow.as_bytes());
        let data = build_pdf("1.4", &objects, "/Root 1 0 R");
        assert_eq!(parse(&data).unwrap().page_count().unwrap(), 1);
    }

    #[test]
    fn test_object_and_xref_streams() {
        // Objects 1-3 live in object stream 4; the xref is stream 5.
        let members: [&[u8]; 3] = [
            b"<< /Type /Catalog /Pages 2 0 R >>",
            b"<< /Type /Pages /Kids [3 0 R] /Count 1 >>",
            b"<< /Type /Page /Parent 2 0 R /MediaBox [0 0 200 200] >>",
        ];
        let mut body = Vec::new();
        let mut header = String::new();
        for (i, member) in members.iter().enumerate() {
            header.push_str(&format!("{} {} ", i + 1, body.len()));
            body.extend_from_slice(member);
            body.push(b' ');
        }
        let mut plain = header.clone().into_bytes();
        plain.extend_from_slice(&body);
        let mut encoder = ZlibEncoder::new(Vec::new(), Compression::default());
        encoder.write_all(&plain).unwrap();
        let compressed = encoder.finish().unwrap();

        let mut data = b"%PDF-1.5\n".to_vec();
        let objstm_offset = data.len();
        data.extend_from_slice(
            format!(
                "4 0 obj\n<< /Type /ObjStm /N 3 /First {} /Filter /FlateDecode /Length {} >>\nstream\n",
                header.len(),
                compressed.len()
            )
            .as_bytes(),
        );
        data.extend_from_slice(&compressed);
        data.extend_from_slice(b"\nendstream\nendobj\n");

        let xref_offset = data.len();
        let mut rows = vec![0u8, 0, 0, 0xFF];
        for index in 0..3u8 {
            rows.extend_from_slice(&[2, 0, 4, index]);
        }
        rows.extend_from_slice(&[1, (objstm_offset >> 8) as u8, objstm_offset as u8, 0]);
        rows.extend_from_slice(&[1, (xref_offset >> 8) as u8, xref_offset as u8, 0]);
        data.extend_from_slice(
            format!(
                "5 0 obj\n<< /Type /XRef /Size 6 /W [1 2 1] /Root 1 0 R /Length {} >>\nstream\n",
                rows.len()
            )
            .as_bytes(),
        );
        data.extend_from_slice(&rows);
        data.extend_from_slice(b"\nendstream\nendobj\n");
        data.extend_from_slice(format!("startxref\n{}\n%%EOF\n", xref_offset).as_bytes());

        let doc = parse(&data).unwrap();
        assert_eq!(doc.page_count().unwrap(), 1);
        // The container streams are not part of the document model.
        assert!(doc.get((4, 0)).is_none());
        assert!(doc.get((5, 0)).is_none());
        assert_eq!(doc.objects.len(), 3);
        assert_eq!(doc.trailer.len(), 1);
    }

    #[test]
    fn test_reads_lopdf_output() {
        let data = lopdf_fixture(4);
        let doc = parse(&data).unwrap();
        assert_eq!(doc.page_count().unwrap(), 4);
    }

    #[test]
    fn test_round_trip_preserves_pages_and_resources() {
        let original = sample_document(5);
        let reparsed = parse(&serialize(&original)).unwrap();
        assert_eq!(reparsed.page_count().unwrap(), 5);
        for index in 0..5 {
            assert_eq!(page_graph(&original, index), page_graph(&reparsed, index));
        }
    }
}
