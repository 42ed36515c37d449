use annotation_model::{DisplayBox, ImageAnnotation};
use lopdf::{dictionary, Document, Object, ObjectId};

use crate::appearance::{rect_array, AppearanceCanvas};
use crate::PdfEngineError;

/// Write `annotation` as a `/Stamp` annotation on `page_id` and link it from the page
pub fn add_stamp_annotation(
    doc: &mut Document,
    page_id: ObjectId,
    annotation: &ImageAnnotation,
) -> Result<ObjectId, PdfEngineError> {
    let rect = annotation.appearance_rect();

    let mut canvas = AppearanceCanvas::new();
    annotation.draw(DisplayBox::MediaBox, &mut canvas);
    let appearance_id = canvas.into_form_xobject(doc, rect)?;

    let annot_id = doc.add_object(dictionary! {
        "Type" => "Annot",
        "Subtype" => "Stamp",
        "Rect" => rect_array(rect),
        "F" => 4,
        "NM" => Object::string_literal(annotation.id().to_string()),
        "P" => Object::Reference(page_id),
        "AP" => dictionary! {
            "N" => Object::Reference(appearance_id),
        },
    });

    append_to_page_annots(doc, page_id, annot_id)?;
    log::debug!("stamp {} written as object {:?}", annotation.id(), annot_id);

    Ok(annot_id)
}

/// Append `annot_id` to the page's `/Annots`, whether that array is direct or referenced
pub fn append_to_page_annots(
    doc: &mut Document,
    page_id: ObjectId,
    annot_id: ObjectId,
) -> Result<(), PdfEngineError> {
    let annots_ref = doc
        .get_dictionary(page_id)?
        .get(b"Annots")
        .ok()
        .and_then(|annots| annots.as_reference().ok());

    if let Some(annots_id) = annots_ref {
        if let Ok(array) = doc.get_object_mut(annots_id).and_then(Object::as_array_mut) {
            array.push(Object::Reference(annot_id));
            return Ok(());
        }
        log::warn!("page /Annots reference {:?} is not an array, replacing it", annots_id);
    }

    let page = doc.get_dictionary_mut(page_id)?;
    let mut annots = match page.get(b"Annots") {
        Ok(Object::Array(existing)) => existing.clone(),
        _ => Vec::new(),
    };
    annots.push(Object::Reference(annot_id));
    page.set("Annots", Object::Array(annots));

    Ok(())
}

/// Object ids in the page's `/Annots`, resolving a referenced array
pub fn page_annots(doc: &Document, page_id: ObjectId) -> Result<Vec<ObjectId>, PdfEngineError> {
    let page = doc.get_dictionary(page_id)?;
    let annots = match page.get(b"Annots") {
        Ok(Object::Reference(id)) => doc.get_object(*id)?,
        Ok(object) => object,
        Err(_) => return Ok(Vec::new()),
    };

    Ok(annots
        .as_array()
        .map(|array| array.iter().filter_map(|item| item.as_reference().ok()).collect())
        .unwrap_or_default())
}
