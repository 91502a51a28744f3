//! Embedded manifest discovery.
//!
//! An authoring tool may embed a `manifest.json` describing every page's
//! layout. Four embedding conventions are searched in priority order and
//! the first readable JSON object wins:
//!
//! 1. a catalog-level `/EmbeddedFiles` array written by JavaScript PDF
//!    libraries (entries such as `{name, embedder: {fileData}}`),
//! 2. the standard `/Names /EmbeddedFiles` name tree,
//! 3. `/AF` associated files on the catalog,
//! 4. `/AF` associated files on each page.
//!
//! Structural problems in one location never stop the search.

use std::collections::{HashSet, VecDeque};
use std::fmt;

use encoding_rs::WINDOWS_1252;
use lopdf::{Dictionary, Document, Object};
use pdflayer_core::{ExtractOptions, ExtractWarning, ExtractWarningCode, decode_base64};
use serde_json::Value;
use tracing::{debug, trace};

use crate::objects::{decode_stream, get, get_dict, resolve, text_of};

/// File name suffix that identifies a manifest, compared case-insensitively.
pub const MANIFEST_FILE_NAME: &str = "manifest.json";

/// Where a manifest was found.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ManifestSource {
    /// Catalog `/EmbeddedFiles` array outside the name dictionary.
    EmbeddedFileList,
    /// `/Names /EmbeddedFiles` name tree.
    EmbeddedFilesNameTree,
    /// Catalog `/AF`.
    CatalogAssociatedFiles,
    /// Page `/AF` on the given 0-based page.
    PageAssociatedFiles { page_index: usize },
}

impl fmt::Display for ManifestSource {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ManifestSource::EmbeddedFileList => f.write_str("embedded file list"),
            ManifestSource::EmbeddedFilesNameTree => f.write_str("EmbeddedFiles name tree"),
            ManifestSource::CatalogAssociatedFiles => f.write_str("catalog associated files"),
            ManifestSource::PageAssociatedFiles { page_index } => {
                write!(f, "associated files of page {page_index}")
            }
        }
    }
}

/// A manifest that decoded to a JSON object.
#[derive(Debug, Clone, PartialEq)]
pub struct LocatedManifest {
    pub source: ManifestSource,
    pub file_name: String,
    /// Always a JSON object.
    pub value: Value,
}

/// Search every embedding convention for a manifest.
///
/// Candidates named like a manifest that cannot be read are reported in
/// `warnings` as [`ExtractWarningCode::ManifestUnreadable`] and skipped.
pub fn locate_manifest(
    doc: &Document,
    options: &ExtractOptions,
    warnings: &mut Vec<ExtractWarning>,
) -> Option<LocatedManifest> {
    let Some(catalog) = doc
        .trailer
        .get(b"Root")
        .ok()
        .and_then(|root| resolve(doc, root).as_dict().ok())
    else {
        debug!("document has no catalog");
        return None;
    };

    let mut search = Search { doc, warnings };

    if let Some(found) = search.embedded_file_list(catalog) {
        return Some(found);
    }
    if let Some(found) = search.name_tree(catalog, options.max_name_tree_nodes) {
        return Some(found);
    }
    if let Some(found) =
        search.associated_files(catalog, ManifestSource::CatalogAssociatedFiles)
    {
        return Some(found);
    }
    for (page_index, page_id) in doc.get_pages().into_values().enumerate() {
        let Ok(page) = doc.get_object(page_id).and_then(Object::as_dict) else {
            continue;
        };
        let source = ManifestSource::PageAssociatedFiles { page_index };
        if let Some(found) = search.associated_files(page, source) {
            return Some(found);
        }
    }
    debug!("no embedded manifest found");
    None
}

struct Search<'a, 'w> {
    doc: &'a Document,
    warnings: &'w mut Vec<ExtractWarning>,
}

impl<'a> Search<'a, '_> {
    fn embedded_file_list(&mut self, catalog: &'a Dictionary) -> Option<LocatedManifest> {
        let Some(Object::Array(entries)) = get(self.doc, catalog, b"EmbeddedFiles") else {
            return None;
        };
        for entry in entries {
            let Ok(dict) = resolve(self.doc, entry).as_dict() else {
                continue;
            };
            let name = ["name", "fileName", "filename", "Name"]
                .iter()
                .find_map(|key| get(self.doc, dict, key.as_bytes()).and_then(text_of))
                .or_else(|| filespec_name(self.doc, dict))
                .unwrap_or_default();
            if !is_manifest_name(&name) {
                continue;
            }
            let payload = self
                .loose_payload(dict)
                .or_else(|| filespec_payload(self.doc, dict));
            if let Some(found) = self.accept(ManifestSource::EmbeddedFileList, name, payload) {
                return Some(found);
            }
        }
        None
    }

    /// `embedder.fileData`, then `fileData`, then `data`.
    fn loose_payload(&self, dict: &'a Dictionary) -> Option<Vec<u8>> {
        let embedder_data = get_dict(self.doc, dict, b"embedder")
            .and_then(|embedder| get(self.doc, embedder, b"fileData"));
        embedder_data
            .or_else(|| get(self.doc, dict, b"fileData"))
            .or_else(|| get(self.doc, dict, b"data"))
            .and_then(|obj| match obj {
                Object::Stream(stream) => decode_stream(stream).ok(),
                Object::String(bytes, _) if !bytes.is_empty() => Some(bytes.clone()),
                _ => None,
            })
    }

    /// Breadth-first walk of the `/Names /EmbeddedFiles` tree.
    fn name_tree(&mut self, catalog: &'a Dictionary, max_nodes: usize) -> Option<LocatedManifest> {
        let root_obj = get_dict(self.doc, catalog, b"Names")
            .and_then(|names| names.get(b"EmbeddedFiles").ok())?;

        let mut queue: VecDeque<&'a Object> = VecDeque::from([root_obj]);
        let mut visited = HashSet::new();
        let mut nodes = 0usize;

        while let Some(node_obj) = queue.pop_front() {
            if let Object::Reference(id) = node_obj {
                if !visited.insert(*id) {
                    trace!(?id, "name tree node already visited");
                    continue;
                }
            }
            nodes += 1;
            if nodes > max_nodes {
                debug!(max_nodes, "name tree node bound reached");
                break;
            }
            let Ok(node) = resolve(self.doc, node_obj).as_dict() else {
                continue;
            };

            if let Some(Object::Array(pairs)) = get(self.doc, node, b"Names") {
                for pair in pairs.chunks_exact(2) {
                    let key = text_of(resolve(self.doc, &pair[0])).unwrap_or_default();
                    if !is_manifest_name(&key) {
                        continue;
                    }
                    let payload = resolve(self.doc, &pair[1])
                        .as_dict()
                        .ok()
                        .and_then(|spec| filespec_payload(self.doc, spec));
                    if let Some(found) =
                        self.accept(ManifestSource::EmbeddedFilesNameTree, key, payload)
                    {
                        return Some(found);
                    }
                }
            }
            if let Some(Object::Array(kids)) = get(self.doc, node, b"Kids") {
                queue.extend(kids.iter());
            }
        }
        None
    }

    /// `/AF` holding one file specification or an array of them.
    fn associated_files(
        &mut self,
        owner: &'a Dictionary,
        source: ManifestSource,
    ) -> Option<LocatedManifest> {
        let specs: Vec<&'a Object> = match get(self.doc, owner, b"AF")? {
            Object::Array(items) => items.iter().collect(),
            single => vec![single],
        };
        for spec_obj in specs {
            let Ok(spec) = resolve(self.doc, spec_obj).as_dict() else {
                continue;
            };
            let Some(name) = filespec_name(self.doc, spec) else {
                continue;
            };
            if !is_manifest_name(&name) {
                continue;
            }
            let payload = filespec_payload(self.doc, spec);
            if let Some(found) = self.accept(source, name, payload) {
                return Some(found);
            }
        }
        None
    }

    fn accept(
        &mut self,
        source: ManifestSource,
        file_name: String,
        payload: Option<Vec<u8>>,
    ) -> Option<LocatedManifest> {
        let Some(bytes) = payload else {
            self.unreadable(source, &file_name, "no embedded payload");
            return None;
        };
        match decode_json_object(&bytes) {
            Some(value) => {
                debug!(%source, file_name = %file_name, "manifest located");
                Some(LocatedManifest {
                    source,
                    file_name,
                    value,
                })
            }
            None => {
                self.unreadable(source, &file_name, "payload is not a JSON object");
                None
            }
        }
    }

    fn unreadable(&mut self, source: ManifestSource, file_name: &str, reason: &str) {
        debug!(%source, file_name, reason, "skipping manifest candidate");
        self.warnings.push(ExtractWarning::new(
            ExtractWarningCode::ManifestUnreadable,
            format!("{file_name} ({source}): {reason}"),
        ));
    }
}

fn is_manifest_name(name: &str) -> bool {
    name.trim().to_lowercase().ends_with(MANIFEST_FILE_NAME)
}

/// `/UF`, else `/F`, else `/Desc`.
fn filespec_name(doc: &Document, spec: &Dictionary) -> Option<String> {
    let keys: [&[u8]; 3] = [b"UF", b"F", b"Desc"];
    keys.iter()
        .find_map(|key| get(doc, spec, key).and_then(text_of))
}

/// Decompressed bytes of `/EF /F` (or `/EF /UF`).
fn filespec_payload(doc: &Document, spec: &Dictionary) -> Option<Vec<u8>> {
    let ef = get_dict(doc, spec, b"EF")?;
    let keys: [&[u8]; 2] = [b"F", b"UF"];
    keys.iter()
        .find_map(|key| get(doc, ef, key).and_then(|obj| obj.as_stream().ok()))
        .and_then(|stream| decode_stream(stream).ok())
}

/// Decode bytes as a JSON object: UTF-8, then Windows-1252, then lossy
/// UTF-8. Text that is not JSON is retried as base64.
pub fn decode_json_object(bytes: &[u8]) -> Option<Value> {
    decode_json_text(bytes).or_else(|| {
        let text = std::str::from_utf8(bytes).ok()?;
        decode_base64(text).and_then(|decoded| decode_json_text(&decoded))
    })
}

fn decode_json_text(bytes: &[u8]) -> Option<Value> {
    let as_object = |text: &str| {
        serde_json::from_str::<Value>(text.trim_start_matches('\u{feff}'))
            .ok()
            .filter(Value::is_object)
    };
    if let Ok(text) = std::str::from_utf8(bytes) {
        if let Some(value) = as_object(text) {
            return Some(value);
        }
    }
    let (latin, _) = WINDOWS_1252.decode_without_bom_handling(bytes);
    as_object(&latin).or_else(|| as_object(&String::from_utf8_lossy(bytes)))
}

#[cfg(test)]
mod tests {
    use super::*;
    use lopdf::{Stream, StringFormat, dictionary};

    const MANIFEST: &[u8] = br#"{"pages":[{"texts":[{"xNorm":0.1,"yNormTop":0.2,"text":"Hi"}]}]}"#;

    fn literal(text: &str) -> Object {
        Object::String(text.as_bytes().to_vec(), StringFormat::Literal)
    }

    /// A one-page document whose catalog gets `catalog_extra` and whose page gets `page_extra`.
    fn document(
        build: impl FnOnce(&mut Document) -> (Dictionary, Dictionary),
    ) -> Document {
        let mut doc = Document::with_version("1.7");
        let (catalog_extra, page_extra) = build(&mut doc);
        let pages_id = doc.new_object_id();
        let mut page = dictionary! {
            "Type" => "Page",
            "Parent" => pages_id,
            "MediaBox" => [0, 0, 612, 792].map(Object::Integer).to_vec(),
        };
        for (k, v) in page_extra.iter() {
            page.set(k.clone(), v.clone());
        }
        let page_id = doc.add_object(page);
        doc.objects.insert(
            pages_id,
            Object::Dictionary(dictionary! {
                "Type" => "Pages",
                "Kids" => vec![Object::Reference(page_id)],
                "Count" => 1,
            }),
        );
        let mut catalog = dictionary! { "Type" => "Catalog", "Pages" => pages_id };
        for (k, v) in catalog_extra.iter() {
            catalog.set(k.clone(), v.clone());
        }
        let catalog_id = doc.add_object(catalog);
        doc.trailer.set("Root", catalog_id);
        doc
    }

    fn filespec(doc: &mut Document, name: &str, bytes: &[u8]) -> Object {
        let file = doc.add_object(Stream::new(
            dictionary! { "Type" => "EmbeddedFile" },
            bytes.to_vec(),
        ));
        let spec = doc.add_object(dictionary! {
            "Type" => "Filespec",
            "F" => literal(name),
            "UF" => literal(name),
            "EF" => dictionary! { "F" => file },
        });
        Object::Reference(spec)
    }

    fn locate(doc: &Document) -> (Option<LocatedManifest>, Vec<ExtractWarning>) {
        let mut warnings = Vec::new();
        let found = locate_manifest(doc, &ExtractOptions::default(), &mut warnings);
        (found, warnings)
    }

    #[test]
    fn no_manifest_is_absent() {
        let doc = document(|_| (dictionary! {}, dictionary! {}));
        let (found, warnings) = locate(&doc);
        assert!(found.is_none());
        assert!(warnings.is_empty());
    }

    #[test]
    fn name_tree_leaf() {
        let doc = document(|doc| {
            let spec = filespec(doc, "manifest.json", MANIFEST);
            let catalog = dictionary! {
                "Names" => dictionary! {
                    "EmbeddedFiles" => dictionary! {
                        "Names" => vec![literal("manifest.json"), spec],
                    },
                },
            };
            (catalog, dictionary! {})
        });
        let (found, _) = locate(&doc);
        let found = found.unwrap();
        assert_eq!(found.source, ManifestSource::EmbeddedFilesNameTree);
        assert_eq!(found.file_name, "manifest.json");
        assert!(found.value["pages"].is_array());
    }

    #[test]
    fn name_tree_kids_are_walked() {
        let doc = document(|doc| {
            let other = filespec(doc, "notes.txt", b"hello");
            let spec = filespec(doc, "Layout-Manifest.JSON", MANIFEST);
            let leaf_a = doc.add_object(dictionary! {
                "Names" => vec![literal("notes.txt"), other],
            });
            let leaf_b = doc.add_object(dictionary! {
                "Names" => vec![literal("Layout-Manifest.JSON"), spec],
            });
            let middle = doc.add_object(dictionary! {
                "Kids" => vec![Object::Reference(leaf_b)],
            });
            let catalog = dictionary! {
                "Names" => dictionary! {
                    "EmbeddedFiles" => dictionary! {
                        "Kids" => vec![Object::Reference(leaf_a), Object::Reference(middle)],
                    },
                },
            };
            (catalog, dictionary! {})
        });
        let found = locate(&doc).0.unwrap();
        assert_eq!(found.file_name, "Layout-Manifest.JSON");
    }

    #[test]
    fn cyclic_name_tree_terminates() {
        let doc = document(|doc| {
            let node_id = doc.new_object_id();
            doc.objects.insert(
                node_id,
                Object::Dictionary(dictionary! {
                    "Kids" => vec![Object::Reference(node_id), Object::Reference(node_id)],
                }),
            );
            let catalog = dictionary! {
                "Names" => dictionary! { "EmbeddedFiles" => node_id },
            };
            (catalog, dictionary! {})
        });
        assert!(locate(&doc).0.is_none());
    }

    #[test]
    fn node_bound_stops_traversal() {
        let doc = document(|doc| {
            let spec = filespec(doc, "manifest.json", MANIFEST);
            let leaf = doc.add_object(dictionary! {
                "Names" => vec![literal("manifest.json"), spec],
            });
            let catalog = dictionary! {
                "Names" => dictionary! {
                    "EmbeddedFiles" => dictionary! { "Kids" => vec![Object::Reference(leaf)] },
                },
            };
            (catalog, dictionary! {})
        });
        let options = ExtractOptions {
            max_name_tree_nodes: 1,
            ..ExtractOptions::default()
        };
        let mut warnings = Vec::new();
        assert!(locate_manifest(&doc, &options, &mut warnings).is_none());
        assert!(locate(&doc).0.is_some());
    }

    #[test]
    fn js_style_embedded_file_list_with_base64() {
        let encoded = pdflayer_core::encode_data_uri("application/json", MANIFEST);
        let base64_text = encoded.trim_start_matches("data:application/json;base64,");
        let doc = document(|_| {
            let catalog = dictionary! {
                "EmbeddedFiles" => vec![Object::Dictionary(dictionary! {
                    "name" => literal("manifest.json"),
                    "embedder" => dictionary! { "fileData" => literal(base64_text) },
                })],
            };
            (catalog, dictionary! {})
        });
        let found = locate(&doc).0.unwrap();
        assert_eq!(found.source, ManifestSource::EmbeddedFileList);
    }

    #[test]
    fn catalog_associated_files() {
        let doc = document(|doc| {
            let spec = filespec(doc, "manifest.json", MANIFEST);
            (dictionary! { "AF" => vec![spec] }, dictionary! {})
        });
        let found = locate(&doc).0.unwrap();
        assert_eq!(found.source, ManifestSource::CatalogAssociatedFiles);
    }

    #[test]
    fn page_associated_files() {
        let doc = document(|doc| {
            let spec = filespec(doc, "manifest.json", MANIFEST);
            (dictionary! {}, dictionary! { "AF" => spec })
        });
        let found = locate(&doc).0.unwrap();
        assert_eq!(
            found.source,
            ManifestSource::PageAssociatedFiles { page_index: 0 }
        );
    }

    #[test]
    fn unreadable_candidate_falls_through_to_next_location() {
        let doc = document(|doc| {
            let broken = filespec(doc, "manifest.json", b"{ not json");
            let good = filespec(doc, "manifest.json", MANIFEST);
            let catalog = dictionary! {
                "Names" => dictionary! {
                    "EmbeddedFiles" => dictionary! {
                        "Names" => vec![literal("manifest.json"), broken],
                    },
                },
                "AF" => good,
            };
            (catalog, dictionary! {})
        });
        let (found, warnings) = locate(&doc);
        assert_eq!(found.unwrap().source, ManifestSource::CatalogAssociatedFiles);
        assert_eq!(warnings.len(), 1);
        assert_eq!(warnings[0].code, ExtractWarningCode::ManifestUnreadable);
    }

    #[test]
    fn json_decode_chain() {
        assert!(decode_json_object(br#"{"a":1}"#).is_some());
        // 0xE9 is not valid UTF-8 but is "é" in Windows-1252
        let latin = b"{\"t\":\"caf\xE9\"}";
        assert_eq!(decode_json_object(latin).unwrap()["t"], "caf\u{e9}");
        assert!(decode_json_object(b"[1,2]").is_none());
        assert!(decode_json_object(b"").is_none());
        assert!(decode_json_object(b"eyJhIjoxfQ==").is_some());
    }

    #[test]
    fn manifest_names_match_suffix_case_insensitively() {
        assert!(is_manifest_name("manifest.json"));
        assert!(is_manifest_name("doc.MANIFEST.JSON"));
        assert!(!is_manifest_name("manifest.json.bak"));
        assert!(!is_manifest_name(""));
    }
}
