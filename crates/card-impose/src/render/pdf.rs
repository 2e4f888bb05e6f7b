//! Multi-page PDF of rendered sheets
//!
//! Each sheet image becomes one page at its physical size, with the raster
//! embedded as a DeviceRGB image XObject.

use super::sheet::SheetImage;
use crate::constants::POINTS_PER_INCH;
use crate::types::*;
use lopdf::{Dictionary, Document, Object, ObjectId, Stream};

/// Page size in points for an image rendered at `dpi`
fn page_size_pt(image: &SheetImage) -> (f32, f32) {
    let scale = POINTS_PER_INCH / image.dpi as f64;
    (
        (image.image.width() as f64 * scale) as f32,
        (image.image.height() as f64 * scale) as f32,
    )
}

fn image_xobject(output: &mut Document, image: &SheetImage) -> ObjectId {
    let dict = Dictionary::from_iter(vec![
        ("Type", Object::Name(b"XObject".to_vec())),
        ("Subtype", Object::Name(b"Image".to_vec())),
        ("Width", Object::Integer(image.image.width() as i64)),
        ("Height", Object::Integer(image.image.height() as i64)),
        ("ColorSpace", Object::Name(b"DeviceRGB".to_vec())),
        ("BitsPerComponent", Object::Integer(8)),
    ]);
    output.add_object(Stream::new(dict, image.image.as_raw().clone()))
}

fn sheet_page(output: &mut Document, image: &SheetImage, parent: ObjectId) -> ObjectId {
    let (width, height) = page_size_pt(image);
    let xobject_id = image_xobject(output, image);

    // Scale the unit square image onto the full page
    let content = format!("q\n{} 0 0 {} 0 0 cm\n/Sheet Do\nQ\n", width, height);
    let content_id = output.add_object(Stream::new(Dictionary::new(), content.into_bytes()));

    let mut xobjects = Dictionary::new();
    xobjects.set("Sheet", Object::Reference(xobject_id));
    let mut resources = Dictionary::new();
    resources.set("XObject", Object::Dictionary(xobjects));

    output.add_object(Dictionary::from_iter(vec![
        ("Type", Object::Name(b"Page".to_vec())),
        ("Parent", Object::Reference(parent)),
        (
            "MediaBox",
            Object::Array(vec![
                Object::Integer(0),
                Object::Integer(0),
                Object::Real(width),
                Object::Real(height),
            ]),
        ),
        ("Contents", Object::Reference(content_id)),
        ("Resources", Object::Dictionary(resources)),
    ]))
}

/// Build a PDF with one page per sheet image, in the given order
pub fn sheets_to_pdf(images: &[SheetImage]) -> Result<Document> {
    if images.is_empty() {
        return Err(ImposeError::Render("No sheets to write".to_string()));
    }

    let mut output = Document::with_version("1.7");
    let pages_tree_id = output.new_object_id();

    let page_refs: Vec<Object> = images
        .iter()
        .map(|image| Object::Reference(sheet_page(&mut output, image, pages_tree_id)))
        .collect();

    let count = page_refs.len() as i64;
    let pages_dict = Dictionary::from_iter(vec![
        ("Type", Object::Name(b"Pages".to_vec())),
        ("Kids", Object::Array(page_refs)),
        ("Count", Object::Integer(count)),
    ]);
    output
        .objects
        .insert(pages_tree_id, Object::Dictionary(pages_dict));

    let catalog_id = output.add_object(Dictionary::from_iter(vec![
        ("Type", Object::Name(b"Catalog".to_vec())),
        ("Pages", Object::Reference(pages_tree_id)),
    ]));
    output.trailer.set("Root", catalog_id);

    Ok(output)
}
