//! FFI bindings to PDFium
//!
//! Generated at build time by `bindgen` from the public headers
//! (`fpdfview.h`, `fpdf_text.h`, `fpdf_doc.h`, `fpdf_edit.h`, `fpdf_ext.h`),
//! restricted to the library, document, page, text layer, link, destination,
//! bookmark and bitmap APIs used by `pdfium-view`.
//!
//! Every function is `unsafe`; ownership rules are those of PDFium itself:
//! handles returned by `*_Load*` / `*_Create*` must be released with the
//! matching `*_Close*` / `*_Destroy` call, and a text page must be closed
//! before the page it was loaded from.
//!
//! Headers are looked up in `PDFIUM_INCLUDE_DIR`, next to `PDFIUM_LIB_DIR`,
//! or in the `public/` directory of a pdfium checkout.

#![allow(non_upper_case_globals)]
#![allow(non_camel_case_types)]
#![allow(non_snake_case)]
#![allow(dead_code)]

// Include generated bindings
include!(concat!(env!("OUT_DIR"), "/bindings.rs"));
