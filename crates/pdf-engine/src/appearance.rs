//! Appearance streams for image stamps
//!
//! [`AppearanceCanvas`] is the PDF side of the [`GraphicsContext`] seam: every
//! call becomes a content-stream operator, and every drawn image becomes an
//! image XObject referenced from the form's resources.

use annotation_model::{GraphicsContext, Rect, StampImage};
use lopdf::content::{Content, Operation};
use lopdf::{dictionary, Dictionary, Document, Object, ObjectId, Stream};

use crate::PdfEngineError;

/// Collects operators and images for one form XObject
#[derive(Debug, Default)]
pub struct AppearanceCanvas {
    operations: Vec<Operation>,
    images: Vec<(String, StampImage)>,
}

impl AppearanceCanvas {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn operations(&self) -> &[Operation] {
        &self.operations
    }

    /// Number of images drawn so far
    pub fn image_count(&self) -> usize {
        self.images.len()
    }

    /// Add the canvas as a form XObject with `bbox` in page space; returns its id
    pub fn into_form_xobject(
        self,
        doc: &mut Document,
        bbox: Rect,
    ) -> Result<ObjectId, PdfEngineError> {
        let mut xobjects = Dictionary::new();
        for (name, image) in &self.images {
            let image_id = add_image_xobject(doc, image);
            xobjects.set(name.as_bytes().to_vec(), Object::Reference(image_id));
        }

        let content = Content { operations: self.operations }.encode()?;
        let form = Stream::new(
            dictionary! {
                "Type" => "XObject",
                "Subtype" => "Form",
                "BBox" => rect_array(bbox),
                "Resources" => dictionary! {
                    "XObject" => xobjects,
                },
            },
            content,
        );

        Ok(doc.add_object(form))
    }

    fn cm(&mut self, a: f32, b: f32, c: f32, d: f32, e: f32, f: f32) {
        self.operations.push(Operation::new(
            "cm",
            vec![a.into(), b.into(), c.into(), d.into(), e.into(), f.into()],
        ));
    }
}

impl GraphicsContext for AppearanceCanvas {
    fn save_state(&mut self) {
        self.operations.push(Operation::new("q", vec![]));
    }

    fn restore_state(&mut self) {
        self.operations.push(Operation::new("Q", vec![]));
    }

    fn translate(&mut self, dx: f32, dy: f32) {
        self.cm(1.0, 0.0, 0.0, 1.0, dx, dy);
    }

    fn rotate(&mut self, radians: f32) {
        let (sin, cos) = radians.sin_cos();
        self.cm(cos, sin, -sin, cos, 0.0, 0.0);
    }

    fn draw_image(&mut self, image: &StampImage, rect: Rect) {
        // the same pixels drawn twice share one XObject
        let name = match self.images.iter().find(|(_, drawn)| drawn.ptr_eq(image)) {
            Some((name, _)) => name.clone(),
            None => {
                let name = format!("Im{}", self.images.len() + 1);
                self.images.push((name.clone(), image.clone()));
                name
            }
        };

        // image space is the unit square; stretch it over the rect
        self.save_state();
        self.cm(rect.width(), 0.0, 0.0, rect.height(), rect.min_x(), rect.min_y());
        self.operations.push(Operation::new("Do", vec![Object::Name(name.into_bytes())]));
        self.restore_state();
    }
}

/// Image XObject (DeviceRGB, 8 bpc) with a DeviceGray soft mask when any pixel is translucent
pub fn add_image_xobject(doc: &mut Document, image: &StampImage) -> ObjectId {
    let width = i64::from(image.width_px());
    let height = i64::from(image.height_px());

    let mut dict = dictionary! {
        "Type" => "XObject",
        "Subtype" => "Image",
        "Width" => width,
        "Height" => height,
        "ColorSpace" => "DeviceRGB",
        "BitsPerComponent" => 8,
    };

    if let Some(alpha) = image.alpha_samples() {
        let mask = Stream::new(
            dictionary! {
                "Type" => "XObject",
                "Subtype" => "Image",
                "Width" => width,
                "Height" => height,
                "ColorSpace" => "DeviceGray",
                "BitsPerComponent" => 8,
            },
            alpha,
        );
        dict.set("SMask", Object::Reference(doc.add_object(mask)));
    }

    doc.add_object(Stream::new(dict, image.rgb_samples()))
}

pub(crate) fn rect_array(rect: Rect) -> Vec<Object> {
    let rect = rect.standardized();
    vec![
        rect.min_x().into(),
        rect.min_y().into(),
        rect.max_x().into(),
        rect.max_y().into(),
    ]
}

#[cfg(test)]
mod tests {
    use super::*;
    use annotation_model::ImageAnnotation;
    use image::{Rgba, RgbaImage};

    fn stamp(alpha: u8) -> StampImage {
        StampImage::from_rgba(RgbaImage::from_pixel(2, 3, Rgba([10, 20, 30, alpha])))
            .expect("non-empty image")
    }

    fn operators(canvas: &AppearanceCanvas) -> Vec<&str> {
        canvas.operations().iter().map(|op| op.operator.as_str()).collect()
    }

    #[test]
    fn annotation_draw_emits_balanced_operators() {
        let annotation = ImageAnnotation::new(Rect::new(100.0, 200.0, 50.0, 40.0), stamp(255));
        let mut canvas = AppearanceCanvas::new();
        annotation.draw(Default::default(), &mut canvas);

        assert_eq!(operators(&canvas), vec!["q", "cm", "cm", "cm", "q", "cm", "Do", "Q", "Q"]);
        assert_eq!(canvas.image_count(), 1);
    }

    #[test]
    fn image_placement_matrix_covers_rect() {
        let mut canvas = AppearanceCanvas::new();
        canvas.draw_image(&stamp(255), Rect::new(10.0, 20.0, 30.0, 40.0));

        let placement = &canvas.operations()[1];
        assert_eq!(placement.operator, "cm");
        let values: Vec<f32> =
            placement.operands.iter().map(|o| o.as_float().expect("numeric operand")).collect();
        assert_eq!(values, vec![30.0, 0.0, 0.0, 40.0, 10.0, 20.0]);
    }

    #[test]
    fn same_image_is_registered_once() {
        let image = stamp(255);
        let mut canvas = AppearanceCanvas::new();
        canvas.draw_image(&image, Rect::new(0.0, 0.0, 1.0, 1.0));
        canvas.draw_image(&image.clone(), Rect::new(5.0, 5.0, 1.0, 1.0));

        assert_eq!(canvas.image_count(), 1);
    }

    #[test]
    fn opaque_image_has_no_soft_mask() {
        let mut doc = Document::with_version("1.5");
        let id = add_image_xobject(&mut doc, &stamp(255));

        let stream = doc.get_object(id).and_then(Object::as_stream).expect("image stream");
        assert!(stream.dict.get(b"SMask").is_err());
        assert_eq!(stream.content.len(), 2 * 3 * 3);
    }

    #[test]
    fn translucent_image_gets_soft_mask() {
        let mut doc = Document::with_version("1.5");
        let id = add_image_xobject(&mut doc, &stamp(128));

        let stream = doc.get_object(id).and_then(Object::as_stream).expect("image stream");
        let mask_id = stream
            .dict
            .get(b"SMask")
            .and_then(Object::as_reference)
            .expect("soft mask reference");
        let mask = doc.get_object(mask_id).and_then(Object::as_stream).expect("mask stream");
        assert_eq!(mask.content, vec![128; 6]);
    }

    #[test]
    fn form_xobject_carries_bbox_and_resources() {
        let mut doc = Document::with_version("1.5");
        let mut canvas = AppearanceCanvas::new();
        canvas.draw_image(&stamp(255), Rect::new(0.0, 0.0, 10.0, 10.0));

        let id = canvas
            .into_form_xobject(&mut doc, Rect::new(0.0, 0.0, 10.0, 10.0))
            .expect("form should build");
        let form = doc.get_object(id).and_then(Object::as_stream).expect("form stream");

        assert_eq!(form.dict.get(b"Subtype").and_then(Object::as_name).ok(), Some(&b"Form"[..]));
        let xobjects = form
            .dict
            .get(b"Resources")
            .and_then(Object::as_dict)
            .and_then(|resources| resources.get(b"XObject"))
            .and_then(Object::as_dict)
            .expect("xobject resources");
        assert!(xobjects.get(b"Im1").is_ok());
    }
}
