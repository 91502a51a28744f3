use std::path::Path;

use pdflayer::ExtractOptions;
use pdflayer::pdflayer_parse::locate_manifest;

use crate::shared::{fail, open_pdf, print_json};

pub fn run(file: &Path, pretty: bool) -> Result<(), i32> {
    let options = ExtractOptions::default();
    let pdf = open_pdf(file, options.clone())?;

    let mut warnings = Vec::new();
    let Some(located) = locate_manifest(pdf.document().inner(), &options, &mut warnings) else {
        for warning in &warnings {
            tracing::warn!("{warning}");
        }
        return Err(fail("no embedded manifest found"));
    };

    let json = serde_json::json!({
        "source": located.source.to_string(),
        "fileName": located.file_name,
        "manifest": located.value,
    });
    print_json(&json, pretty)
}
