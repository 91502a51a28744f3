use std::path::PathBuf;
use std::time::Duration;

use pdflayer::{ExtractOptions, RasterizerConfig, extract_file};

use crate::shared::{ensure_exists, fail, print_json};

pub struct ExtractArgs {
    pub file: PathBuf,
    pub pretty: bool,
    pub no_paint_order: bool,
    pub font_family: Option<String>,
    pub rasterizer: Option<PathBuf>,
    pub rasterizer_timeout: u64,
    pub warnings: bool,
}

impl ExtractArgs {
    fn options(&self) -> ExtractOptions {
        let mut options = ExtractOptions::default();
        options.paint_order.enabled = !self.no_paint_order;
        if let Some(family) = &self.font_family {
            options.font_family = family.clone();
        }
        options.legacy_rasterizer = self.rasterizer.as_ref().map(|executable| RasterizerConfig {
            executable: executable.clone(),
            timeout: Duration::from_secs(self.rasterizer_timeout),
        });
        options
    }
}

pub fn run(args: &ExtractArgs) -> Result<(), i32> {
    ensure_exists(&args.file)?;
    let extraction = extract_file(&args.file, &args.options()).map_err(fail)?;

    let mut json = serde_json::to_value(&extraction).map_err(fail)?;
    if args.warnings {
        if let Some(obj) = json.as_object_mut() {
            obj.insert(
                "strategy".to_string(),
                serde_json::to_value(extraction.strategy).map_err(fail)?,
            );
            obj.insert(
                "warnings".to_string(),
                serde_json::to_value(&extraction.warnings).map_err(fail)?,
            );
        }
    }
    print_json(&json, args.pretty)
}
