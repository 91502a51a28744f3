//! Shared fixtures for CLI integration tests.

#![allow(dead_code)]

use std::path::{Path, PathBuf};

use assert_cmd::Command;
use lopdf::{Dictionary, Object, Stream, StringFormat, dictionary};

pub fn cmd() -> Command {
    Command::cargo_bin("pdflayer").unwrap()
}

/// Build a PDF with one 612x792 page per content stream and an optional
/// `manifest.json` in the EmbeddedFiles name tree.
pub fn pdf_bytes(contents: &[&[u8]], manifest: Option<&str>) -> Vec<u8> {
    let mut doc = lopdf::Document::with_version("1.7");
    let font = doc.add_object(dictionary! {
        "Type" => "Font",
        "Subtype" => "Type1",
        "BaseFont" => "Helvetica",
    });
    let pages_id = doc.new_object_id();

    let mut kids = Vec::new();
    for content in contents {
        let content_id = doc.add_object(Stream::new(dictionary! {}, content.to_vec()));
        kids.push(Object::Reference(doc.add_object(dictionary! {
            "Type" => "Page",
            "Parent" => pages_id,
            "MediaBox" => [0, 0, 612, 792].map(Object::Integer).to_vec(),
            "Contents" => content_id,
        })));
    }
    doc.objects.insert(
        pages_id,
        Object::Dictionary(dictionary! {
            "Type" => "Pages",
            "Kids" => kids,
            "Count" => contents.len() as i64,
            "Resources" => dictionary! { "Font" => dictionary! { "F1" => font } },
        }),
    );

    let mut catalog: Dictionary = dictionary! { "Type" => "Catalog", "Pages" => pages_id };
    if let Some(json) = manifest {
        let file = doc.add_object(Stream::new(dictionary! {}, json.as_bytes().to_vec()));
        let name = || Object::String(b"manifest.json".to_vec(), StringFormat::Literal);
        let spec = doc.add_object(dictionary! {
            "Type" => "Filespec",
            "F" => name(),
            "EF" => dictionary! { "F" => file },
        });
        catalog.set(
            "Names",
            dictionary! {
                "EmbeddedFiles" => dictionary! { "Names" => vec![name(), Object::Reference(spec)] },
            },
        );
    }
    let catalog_id = doc.add_object(catalog);
    doc.trailer.set("Root", catalog_id);

    let mut buf = Vec::new();
    doc.save_to(&mut buf).unwrap();
    buf
}

/// Write `bytes` as `name` inside `dir`.
pub fn write(dir: &Path, name: &str, bytes: &[u8]) -> PathBuf {
    let path = dir.join(name);
    std::fs::write(&path, bytes).unwrap();
    path
}
