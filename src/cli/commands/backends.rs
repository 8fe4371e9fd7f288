//! Backend availability listing.

use console::style;

use crate::config::Config;
use crate::ocr::OcrBackendType;
use crate::render::PopplerLoader;

/// List OCR backends and the PDF renderer with their availability.
pub async fn cmd_backends(config: &Config) -> anyhow::Result<()> {
    let configured = config.backend_type().ok();

    println!("{}", style("OCR backends").bold());
    for backend_type in OcrBackendType::all() {
        let mut candidate = config.clone();
        candidate.ocr.backend = backend_type.as_str().to_string();
        let backend = candidate.build_backend()?;

        let marker = if backend.is_available() {
            style("✓").green()
        } else {
            style("✗").red()
        };
        let selected = if configured == Some(*backend_type) {
            " (configured)"
        } else {
            ""
        };
        println!(
            "  {} {}{}: {}",
            marker,
            backend_type,
            selected,
            backend.availability_hint()
        );
    }

    let loader = PopplerLoader::default();
    println!("{}", style("PDF rendering").bold());
    let marker = if loader.is_available() {
        style("✓").green()
    } else {
        style("✗").red()
    };
    println!("  {} {}", marker, loader.availability_hint());

    Ok(())
}
