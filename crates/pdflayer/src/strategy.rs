//! Choice between the embedded manifest and geometric extraction.

use pdflayer_core::{
    ExtractOptions, ExtractWarning, ExtractWarningCode, Flattened, Manifest, flatten_manifest,
};
use pdflayer_parse::locate_manifest;
use serde::Serialize;
use tracing::{debug, info, warn};

use crate::pdf::Pdf;

/// How a document's items were produced.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Strategy {
    /// Items come from an embedded `manifest.json`.
    Manifest,
    /// Items were reconstructed from the page content streams.
    Geometric,
}

impl Strategy {
    /// Decide which strategy applies to `pdf`.
    ///
    /// The manifest wins when one is found and it yields at least one
    /// item; anything else selects geometric extraction.
    pub fn select(pdf: &Pdf, options: &ExtractOptions) -> Strategy {
        plan(pdf, options, &mut Vec::new()).strategy()
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Strategy::Manifest => "manifest",
            Strategy::Geometric => "geometric",
        }
    }
}

impl std::fmt::Display for Strategy {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A selected strategy with the work already done to select it.
pub(crate) enum Plan {
    Manifest(Flattened),
    Geometric,
}

impl Plan {
    fn strategy(&self) -> Strategy {
        match self {
            Plan::Manifest(_) => Strategy::Manifest,
            Plan::Geometric => Strategy::Geometric,
        }
    }
}

pub(crate) fn plan(pdf: &Pdf, options: &ExtractOptions, warnings: &mut Vec<ExtractWarning>) -> Plan {
    let Some(located) = locate_manifest(pdf.document().inner(), options, warnings) else {
        debug!("no embedded manifest");
        return Plan::Geometric;
    };

    let Some(manifest) = Manifest::from_value(&located.value) else {
        warn!(source = %located.source, "manifest has no pages array, using geometric extraction");
        warnings.push(ExtractWarning::new(
            ExtractWarningCode::ManifestUnreadable,
            format!("{} has no pages array", located.file_name),
        ));
        return Plan::Geometric;
    };

    let mut flattened = flatten_manifest(
        &manifest,
        pdf.page_count(),
        pdf.document_dimensions(),
        options,
    );
    if flattened.items.is_empty() {
        warn!(source = %located.source, "manifest produced no items, using geometric extraction");
        warnings.append(&mut flattened.warnings);
        return Plan::Geometric;
    }

    info!(
        source = %located.source,
        items = flattened.items.len(),
        "using embedded manifest"
    );
    Plan::Manifest(flattened)
}
