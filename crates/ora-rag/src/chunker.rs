//! Text extraction and overlapping chunk splitting

use ora_core::{Error, Result};

const PDF_MAGIC: &[u8] = b"%PDF-";

/// One logical unit of a document (a page), with its 1-based number.
#[derive(Debug, Clone, PartialEq)]
pub struct PageText {
    pub number: u32,
    pub text: String,
}

/// Extract logical pages from raw document bytes.
///
/// PDF documents (recognized by their magic prefix) are parsed with a
/// real PDF reader, one `PageText` per PDF page. Everything else is
/// treated as UTF-8 text (lossily decoded) with form-feed characters as
/// page separators, which is what text exports of PDFs produce. Pages
/// keep their original 1-based numbering even when blank pages in
/// between are dropped.
pub fn extract_pages(bytes: &[u8]) -> Result<Vec<PageText>> {
    if bytes.starts_with(PDF_MAGIC) {
        return extract_pdf_pages(bytes);
    }

    let text = String::from_utf8_lossy(bytes);
    Ok(text
        .split('\u{c}')
        .enumerate()
        .filter_map(|(i, page)| {
            if page.trim().is_empty() {
                None
            } else {
                Some(PageText {
                    number: (i + 1) as u32,
                    text: page.to_string(),
                })
            }
        })
        .collect())
}

fn extract_pdf_pages(bytes: &[u8]) -> Result<Vec<PageText>> {
    let doc = lopdf::Document::load_mem(bytes)
        .map_err(|e| Error::Parse(format!("could not read PDF document: {}", e)))?;

    let mut pages = Vec::new();
    for &number in doc.get_pages().keys() {
        match doc.extract_text(&[number]) {
            Ok(text) if !text.trim().is_empty() => pages.push(PageText {
                number,
                text,
            }),
            Ok(_) => {}
            Err(e) => {
                eprintln!("Warning: could not extract text from page {}: {}", number, e);
            }
        }
    }
    Ok(pages)
}

/// Split text into overlapping chunks of at most `max_len` characters.
///
/// Split points are chosen by boundary priority: paragraph break, then
/// line break, then space, then a hard character cut. Consecutive chunks
/// carry `overlap` characters of context across the boundary. Never
/// emits an empty or whitespace-only chunk, and always makes progress.
pub fn split_text(text: &str, max_len: usize, overlap: usize) -> Vec<String> {
    assert!(max_len > 0, "max_len must be positive");
    let overlap = overlap.min(max_len / 2);

    let chars: Vec<char> = text.chars().collect();
    let separators: [&[char]; 3] = [&['\n', '\n'], &['\n'], &[' ']];

    let mut chunks = Vec::new();
    let mut start = 0;

    while start < chars.len() {
        let hard_end = (start + max_len).min(chars.len());
        let mut end = hard_end;

        if hard_end < chars.len() {
            // Prefer the highest-priority boundary that still leaves a
            // reasonably sized chunk.
            let min_break = start + max_len / 2;
            for sep in separators {
                if let Some(pos) = last_boundary(&chars, min_break, hard_end, sep) {
                    end = pos;
                    break;
                }
            }
        }

        let chunk: String = chars[start..end].iter().collect();
        if !chunk.trim().is_empty() {
            chunks.push(chunk);
        }

        if end >= chars.len() {
            break;
        }
        start = end.saturating_sub(overlap).max(start + 1);
    }

    chunks
}

/// Find the last occurrence of `sep` ending within `(lo, hi]` and return
/// the position just past it.
fn last_boundary(chars: &[char], lo: usize, hi: usize, sep: &[char]) -> Option<usize> {
    if sep.is_empty() || hi < sep.len() {
        return None;
    }
    let mut end = hi;
    while end > lo && end >= sep.len() {
        if chars[end - sep.len()..end] == *sep {
            return Some(end);
        }
        end -= 1;
    }
    None
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_short_text_single_chunk() {
        let chunks = split_text("hello world", 1000, 200);
        assert_eq!(chunks, vec!["hello world".to_string()]);
    }

    #[test]
    fn test_no_empty_chunks() {
        let chunks = split_text("   \n\n  \n ", 10, 2);
        assert!(chunks.is_empty());

        let text = "a".repeat(25);
        let chunks = split_text(&text, 10, 2);
        assert!(chunks.iter().all(|c| !c.trim().is_empty()));
    }

    #[test]
    fn test_prefers_paragraph_boundary() {
        let text = format!("{}\n\n{}", "a".repeat(80), "b".repeat(80));
        let chunks = split_text(&text, 100, 10);
        // First chunk should end at the paragraph break, not mid-word.
        assert!(chunks[0].starts_with('a'));
        assert!(!chunks[0].contains('b'));
        assert!(chunks.last().unwrap().contains('b'));
    }

    #[test]
    fn test_overlap_carries_context() {
        let text = "a".repeat(150);
        let chunks = split_text(&text, 100, 20);
        assert!(chunks.len() >= 2);
        // Second chunk starts 20 chars before the end of the first.
        let total: usize = chunks.iter().map(|c| c.chars().count()).sum();
        assert!(total > 150);
    }

    #[test]
    fn test_hard_cut_when_no_boundary() {
        let text = "x".repeat(250);
        let chunks = split_text(&text, 100, 0);
        assert_eq!(chunks.len(), 3);
        assert_eq!(chunks[0].chars().count(), 100);
    }

    #[test]
    fn test_multibyte_safe() {
        let text = "日".repeat(300);
        let chunks = split_text(&text, 100, 10);
        assert!(chunks.iter().all(|c| c.chars().all(|ch| ch == '日')));
    }

    #[test]
    fn test_extract_pages_form_feed() {
        let bytes = "page one\u{c}page two\u{c}\u{c}page four".as_bytes();
        let pages = extract_pages(bytes).unwrap();
        assert_eq!(pages.len(), 3);
        assert_eq!(pages[0].number, 1);
        assert_eq!(pages[1].number, 2);
        // Blank page three is dropped but numbering is preserved.
        assert_eq!(pages[2].number, 4);
        assert_eq!(pages[2].text, "page four");
    }

    #[test]
    fn test_extract_pages_empty_input() {
        assert!(extract_pages(b"").unwrap().is_empty());
        assert!(extract_pages(b"  \n ").unwrap().is_empty());
    }

    /// Build a minimal single-font PDF with one page per text.
    fn pdf_with_pages(texts: &[&str]) -> Vec<u8> {
        use lopdf::content::{Content, Operation};
        use lopdf::{dictionary, Document, Object, Stream};

        let mut doc = Document::with_version("1.5");
        let pages_id = doc.new_object_id();
        let font_id = doc.add_object(dictionary! {
            "Type" => "Font",
            "Subtype" => "Type1",
            "BaseFont" => "Helvetica",
        });
        let resources_id = doc.add_object(dictionary! {
            "Font" => dictionary! { "F1" => font_id },
        });

        let kids: Vec<Object> = texts
            .iter()
            .map(|text| {
                let content = Content {
                    operations: vec![
                        Operation::new("BT", vec![]),
                        Operation::new("Tf", vec!["F1".into(), 12.into()]),
                        Operation::new("Td", vec![72.into(), 720.into()]),
                        Operation::new("Tj", vec![Object::string_literal(*text)]),
                        Operation::new("ET", vec![]),
                    ],
                };
                let content_id =
                    doc.add_object(Stream::new(dictionary! {}, content.encode().unwrap()));
                doc.add_object(dictionary! {
                    "Type" => "Page",
                    "Parent" => pages_id,
                    "Contents" => content_id,
                })
                .into()
            })
            .collect();

        let count = kids.len() as i64;
        doc.objects.insert(
            pages_id,
            Object::Dictionary(dictionary! {
                "Type" => "Pages",
                "Kids" => kids,
                "Count" => count,
                "Resources" => resources_id,
                "MediaBox" => vec![0.into(), 0.into(), 612.into(), 792.into()],
            }),
        );
        let catalog_id = doc.add_object(dictionary! {
            "Type" => "Catalog",
            "Pages" => pages_id,
        });
        doc.trailer.set("Root", catalog_id);

        let mut bytes = Vec::new();
        doc.save_to(&mut bytes).unwrap();
        bytes
    }

    #[test]
    fn test_extract_pages_from_pdf() {
        let bytes = pdf_with_pages(&[
            "Company overview and history.",
            "Quarterly revenue was $4.2M this period.",
        ]);
        let pages = extract_pages(&bytes).unwrap();
        assert_eq!(pages.len(), 2);
        assert_eq!(pages[0].number, 1);
        assert!(pages[0].text.contains("Company overview"));
        assert_eq!(pages[1].number, 2);
        assert!(pages[1].text.contains("$4.2M"));
    }

    #[test]
    fn test_corrupt_pdf_is_parse_error() {
        let err = extract_pages(b"%PDF-1.5 this is not a real document").unwrap_err();
        assert!(matches!(err, Error::Parse(_)));
    }
}
