//! Performance benchmarks for pdflayer.
//!
//! Covers opening documents and both extraction strategies on generated
//! documents:
//! - Simple: 1 page, a heading and a paragraph
//! - Dense: 10 pages of text lines over colored bands, with paint order
//! - Manifest: 10 pages described by an embedded manifest

use criterion::{Criterion, black_box, criterion_group, criterion_main};
use lopdf::{Object, Stream, StringFormat, dictionary};
use pdflayer::{ExtractOptions, Pdf};

/// Build a PDF with one page per content stream, optionally embedding a manifest.
fn build_pdf(contents: &[Vec<u8>], manifest: Option<&str>) -> Vec<u8> {
    let mut doc = lopdf::Document::with_version("1.7");
    let font = doc.add_object(dictionary! {
        "Type" => "Font",
        "Subtype" => "Type1",
        "BaseFont" => "Helvetica",
    });
    let pages_id = doc.new_object_id();

    let mut kids = Vec::new();
    for content in contents {
        let content_id = doc.add_object(Stream::new(dictionary! {}, content.clone()));
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

    let mut catalog = dictionary! { "Type" => "Catalog", "Pages" => pages_id };
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

/// `n_lines` text lines, every fifth one over a light colored band.
fn page_content(n_lines: usize) -> Vec<u8> {
    let mut ops = String::new();
    for i in 0..n_lines {
        let y = 740.0 - i as f64 * 14.0;
        if i % 5 == 0 {
            ops.push_str(&format!("0.8 0.9 1 rg 60 {} 490 14 re f\n", y - 3.0));
        }
        ops.push_str(&format!(
            "BT /F1 10 Tf 0 0 0 rg 72 {y} Td (Line {} with enough words to form a run) Tj ET\n",
            i + 1
        ));
    }
    ops.into_bytes()
}

fn manifest_json(pages: usize, texts_per_page: usize) -> String {
    let page = (0..texts_per_page)
        .map(|i| {
            format!(
                r#"{{"xNorm":0.1,"yNormTop":{},"text":"Entry {i}","fontSize":11}}"#,
                i as f64 / texts_per_page as f64
            )
        })
        .collect::<Vec<_>>()
        .join(",");
    let pages = vec![format!(r#"{{"texts":[{page}]}}"#); pages].join(",");
    format!(r#"{{"pageSize":{{"width":612,"height":792}},"pages":[{pages}]}}"#)
}

fn bench_pdf_open(c: &mut Criterion) {
    let dense = build_pdf(&vec![page_content(50); 10], None);

    c.bench_function("pdf_open_dense_10page", |b| {
        b.iter(|| {
            let pdf = Pdf::open(black_box(&dense), None).unwrap();
            black_box(pdf.page_count());
        });
    });
}

fn bench_geometric(c: &mut Criterion) {
    let simple = build_pdf(&[page_content(3)], None);
    let dense = build_pdf(&vec![page_content(50); 10], None);

    let mut group = c.benchmark_group("geometric_extraction");

    group.bench_function("simple_1page", |b| {
        let pdf = Pdf::open(&simple, None).unwrap();
        b.iter(|| black_box(pdf.extract()));
    });

    group.bench_function("dense_10page", |b| {
        let pdf = Pdf::open(&dense, None).unwrap();
        b.iter(|| black_box(pdf.extract()));
    });

    group.bench_function("dense_10page_no_paint_order", |b| {
        let mut options = ExtractOptions::default();
        options.paint_order.enabled = false;
        let pdf = Pdf::open(&dense, Some(options)).unwrap();
        b.iter(|| black_box(pdf.extract()));
    });

    group.finish();
}

fn bench_manifest(c: &mut Criterion) {
    let bytes = build_pdf(&vec![Vec::new(); 10], Some(&manifest_json(10, 40)));

    c.bench_function("manifest_extraction_10page", |b| {
        let pdf = Pdf::open(&bytes, None).unwrap();
        b.iter(|| black_box(pdf.extract()));
    });
}

criterion_group!(benches, bench_pdf_open, bench_geometric, bench_manifest);
criterion_main!(benches);
