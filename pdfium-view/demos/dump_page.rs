//! Dump what a viewer would see of one PDF page
//!
//! Usage: cargo run --features pdfium --example dump_page <pdf_path> [page] [output_dir]
//!
//! Prints the page layout, text, links and outline as JSON and writes the
//! rendered page as PNG. Set `RUST_LOG=pdfium_view=debug` to watch handles
//! being loaded and released.

use pdfium_view::backend::pdfium::PdfiumBackend;
use pdfium_view::{OpenResult, PixmapRequest, Session, SessionConfig};
use std::env;
use std::sync::Arc;
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;

fn main() -> Result<(), Box<dyn std::error::Error>> {
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "pdfium_view=info".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    let args: Vec<String> = env::args().collect();
    if args.len() < 2 {
        eprintln!("Usage: {} <pdf_path> [page] [output_dir]", args[0]);
        std::process::exit(1);
    }
    let pdf_path = &args[1];
    let page_index: usize = args.get(2).map(|s| s.parse()).transpose()?.unwrap_or(0);
    let output_dir = args.get(3).map(|s| s.as_str()).unwrap_or("/tmp/pdfium-view-dump");
    std::fs::create_dir_all(output_dir)?;

    let password = env::var("PDF_PASSWORD").ok();
    let mut session = Session::new(Arc::new(PdfiumBackend::new()), SessionConfig::new().set_dpi(96.0, 96.0));
    match session.load_document(pdf_path, password.as_deref()) {
        OpenResult::Success => {}
        OpenResult::NeedsPassword => {
            eprintln!("{} is encrypted; set PDF_PASSWORD", pdf_path);
            std::process::exit(2);
        }
        OpenResult::Error(e) => return Err(e.into()),
    }

    println!("{}", serde_json::to_string_pretty(&session.document_info())?);

    let Some(layout) = session.page_layouts().get(page_index).cloned() else {
        eprintln!("page {} out of range", page_index);
        std::process::exit(1);
    };
    println!("{}", serde_json::to_string_pretty(&layout)?);

    if let Some(text) = session.text_page(page_index) {
        println!("{} characters", text.entities.len());
        println!("{}", text.text());
        if let Some(links) = &text.links {
            println!("{}", serde_json::to_string_pretty(links)?);
        }
    }

    if let Some(synopsis) = session.synopsis() {
        for entry in synopsis.iter() {
            println!("outline: {} -> {:?}", entry.title, entry.viewport.map(|v| v.page));
        }
    }

    let request = PixmapRequest::new(page_index, layout.width.round() as u32, layout.height.round() as u32);
    let image = session.image(&request, || false);
    if image.is_empty() {
        eprintln!("render failed");
    } else {
        let path = format!("{}/page_{}.png", output_dir, page_index);
        image.save_as_png(&path)?;
        println!("Saved {}x{} image to {}", image.width(), image.height(), path);
    }

    Ok(())
}
