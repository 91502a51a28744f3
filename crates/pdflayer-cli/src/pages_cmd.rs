use std::path::Path;

use pdflayer::ExtractOptions;

use crate::shared::open_pdf;

pub fn run(file: &Path) -> Result<(), i32> {
    let pdf = open_pdf(file, ExtractOptions::default())?;
    for index in 0..pdf.page_count() {
        let page_box = pdf.page_box(index);
        println!("{index}\t{}\t{}", page_box.width(), page_box.height());
    }
    Ok(())
}
