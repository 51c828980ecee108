use std::env;
use std::fs;
use std::path::{Path, PathBuf};

/// Headers covering every declaration `pdfium-view` calls.
const HEADERS: &[&str] = &[
    "fpdfview.h",
    "fpdf_text.h",
    "fpdf_doc.h",
    "fpdf_edit.h",
    "fpdf_ext.h",
];

fn main() {
    println!("cargo:rerun-if-changed=build.rs");
    println!("cargo:rerun-if-env-changed=PDFIUM_LIB_DIR");
    println!("cargo:rerun-if-env-changed=PDFIUM_INCLUDE_DIR");

    let target = env::var("TARGET").unwrap_or_default();
    let out_path = PathBuf::from(env::var("OUT_DIR").expect("OUT_DIR is set by cargo"));
    let manifest_dir = PathBuf::from(env::var("CARGO_MANIFEST_DIR").expect("CARGO_MANIFEST_DIR is set by cargo"));
    let workspace_root = manifest_dir.parent().map(Path::to_path_buf).unwrap_or_default();

    // Priority 1: Manual override via PDFIUM_LIB_DIR
    let (lib_dir, headers) = if let Ok(lib_dir) = env::var("PDFIUM_LIB_DIR") {
        println!("cargo:warning=Using PDFIUM_LIB_DIR: {}", lib_dir);
        let lib_dir = PathBuf::from(lib_dir);
        let headers = find_headers(Some(&lib_dir), &workspace_root);
        (Some(lib_dir), headers)
    } else {
        // Priority 2: A pdfium checkout next to the workspace (development mode)
        let release_dir = workspace_root.join("out/Release");
        if has_library(&release_dir) {
            println!("cargo:warning=Using development build: {}", release_dir.display());
            (Some(release_dir), find_headers(None, &workspace_root))
        } else {
            // Priority 3: Whatever the system linker finds
            (None, find_headers(None, &workspace_root))
        }
    };

    let bindings_path = out_path.join("bindings.rs");
    match headers {
        Some(include_dir) => {
            generate_bindings(&include_dir, &bindings_path);
            setup_linking(lib_dir.as_ref(), &target);
        }
        None => {
            // Without headers there is nothing to bind; the crate builds empty so
            // workspaces that leave the native backend off still compile.
            println!(
                "cargo:warning=PDFium headers not found (set PDFIUM_INCLUDE_DIR or PDFIUM_LIB_DIR); \
                 pdfium-sys is built without bindings"
            );
            fs::write(&bindings_path, "").expect("Couldn't write bindings!");
        }
    }
}

fn has_library(dir: &Path) -> bool {
    ["libpdfium.so", "libpdfium.dylib", "pdfium.dll"]
        .iter()
        .any(|name| dir.join(name).exists())
}

fn has_headers(dir: &Path) -> bool {
    dir.join("fpdfview.h").exists()
}

/// Look for the public headers: `PDFIUM_INCLUDE_DIR`, then next to the
/// library directory, then the `public/` directory of a pdfium checkout.
fn find_headers(lib_dir: Option<&PathBuf>, workspace_root: &Path) -> Option<PathBuf> {
    let mut candidates = Vec::new();
    if let Ok(dir) = env::var("PDFIUM_INCLUDE_DIR") {
        candidates.push(PathBuf::from(dir));
    }
    if let Some(lib_dir) = lib_dir {
        candidates.push(lib_dir.join("include"));
        if let Some(parent) = lib_dir.parent() {
            candidates.push(parent.join("include"));
            if let Some(root) = parent.parent() {
                candidates.push(root.join("public"));
            }
        }
    }
    candidates.push(workspace_root.join("public"));
    candidates.into_iter().find(|dir| has_headers(dir))
}

fn generate_bindings(include_dir: &Path, bindings_path: &Path) {
    println!("cargo:rerun-if-changed={}", include_dir.display());

    let builder = HEADERS
        .iter()
        .map(|name| include_dir.join(name))
        .filter(|header| header.exists())
        .fold(bindgen::Builder::default(), |builder, header| {
            builder.header(header.to_string_lossy())
        });

    let bindings = builder
        .clang_arg(format!("-I{}", include_dir.display()))
        .parse_callbacks(Box::new(bindgen::CargoCallbacks::new()))
        // Library, documents, pages, bitmaps, page labels, metadata
        .allowlist_function("FPDF_.*")
        .allowlist_function("FPDFBitmap_.*")
        .allowlist_function("FPDFPage_GetRotation")
        .allowlist_function("FPDFDoc_GetPageMode")
        // Text layer
        .allowlist_function("FPDFText_.*")
        // Links, actions, destinations, bookmarks
        .allowlist_function("FPDFLink_.*")
        .allowlist_function("FPDFAction_.*")
        .allowlist_function("FPDFDest_.*")
        .allowlist_function("FPDFBookmark_.*")
        .allowlist_type("FPDF.*")
        .allowlist_type("FS_RECTF")
        .allowlist_type("FS_MATRIX")
        .allowlist_var("FPDF.*")
        .allowlist_var("PAGEMODE_.*")
        .opaque_type("fpdf_.*")
        .derive_default(true)
        .generate()
        .expect("Unable to generate bindings");

    bindings
        .write_to_file(bindings_path)
        .expect("Couldn't write bindings!");
}

fn setup_linking(lib_dir: Option<&PathBuf>, target: &str) {
    if let Some(lib_dir) = lib_dir {
        println!("cargo:rustc-link-search=native={}", lib_dir.display());

        // Add rpath for runtime library discovery (macOS/Linux)
        if target.contains("apple") || target.contains("linux") {
            println!("cargo:rustc-link-arg=-Wl,-rpath,{}", lib_dir.display());
        }
    }
    println!("cargo:rustc-link-lib=dylib=pdfium");
}
