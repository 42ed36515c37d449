use annotation_model::ImageAnnotation;
use lopdf::{dictionary, Document, Object, ObjectId, Stream};
use std::collections::HashMap;
use std::fs;
use std::path::{Path, PathBuf};

pub mod appearance;
pub mod stamp;

pub use appearance::AppearanceCanvas;

/// How far back from the end of a file to look for an encryption key when the
/// cross-reference offset cannot be read
const TRAILER_SCAN_WINDOW: usize = 1024;

/// Page size used when neither the page nor its ancestors carry a MediaBox
pub const DEFAULT_PAGE_SIZE: PageSize = PageSize { width_pt: 612.0, height_pt: 792.0 };

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct DocumentHandle(u64);

impl DocumentHandle {
    pub fn raw(self) -> u64 {
        self.0
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PageSize {
    pub width_pt: f32,
    pub height_pt: f32,
}

#[derive(Debug, Clone)]
pub enum OpenSource {
    Path(PathBuf),
    Bytes(Vec<u8>),
}

impl From<PathBuf> for OpenSource {
    fn from(value: PathBuf) -> Self {
        Self::Path(value)
    }
}

impl From<&Path> for OpenSource {
    fn from(value: &Path) -> Self {
        Self::Path(value.to_path_buf())
    }
}

impl From<Vec<u8>> for OpenSource {
    fn from(value: Vec<u8>) -> Self {
        Self::Bytes(value)
    }
}

#[derive(Debug, thiserror::Error)]
pub enum PdfEngineError {
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
    #[error("PDF parse error: {0}")]
    Parse(#[from] lopdf::Error),
    #[error("invalid handle {0}")]
    InvalidHandle(u64),
    #[error("page {page} out of range (page_count={page_count})")]
    PageOutOfRange { page: u32, page_count: u32 },
    #[error("encrypted PDFs are not supported")]
    EncryptedUnsupported,
    #[error("backend error: {0}")]
    Backend(String),
}

pub trait PdfEngine {
    fn open(&mut self, source: OpenSource) -> Result<DocumentHandle, PdfEngineError>;
    fn page_count(&self, handle: DocumentHandle) -> Result<u32, PdfEngineError>;
    fn page_size(
        &self,
        handle: DocumentHandle,
        page_index: u32,
    ) -> Result<PageSize, PdfEngineError>;
    /// Number of entries in the page's `/Annots`
    fn annotation_count(
        &self,
        handle: DocumentHandle,
        page_index: u32,
    ) -> Result<usize, PdfEngineError>;
    /// Bake committed image annotations into the page as `/Stamp` annotations
    fn add_image_stamps(
        &mut self,
        handle: DocumentHandle,
        page_index: u32,
        annotations: &[ImageAnnotation],
    ) -> Result<usize, PdfEngineError>;
    fn save(&mut self, handle: DocumentHandle) -> Result<Vec<u8>, PdfEngineError>;
    fn save_to(&mut self, handle: DocumentHandle, path: &Path) -> Result<(), PdfEngineError>;
    fn close(&mut self, handle: DocumentHandle) -> Result<(), PdfEngineError>;
}

#[derive(Debug)]
struct DocumentRecord {
    document: Document,
    page_sizes: Vec<PageSize>,
}

impl DocumentRecord {
    fn page_id(&self, page_index: u32) -> Result<ObjectId, PdfEngineError> {
        self.document.get_pages().get(&(page_index + 1)).copied().ok_or(
            PdfEngineError::PageOutOfRange {
                page: page_index,
                page_count: self.page_sizes.len() as u32,
            },
        )
    }
}

#[derive(Debug, Default)]
pub struct LopdfEngine {
    next_handle: u64,
    docs: HashMap<DocumentHandle, DocumentRecord>,
}

impl LopdfEngine {
    pub fn new() -> Self {
        Self::default()
    }

    fn parse_sizes(doc: &Document) -> Result<Vec<PageSize>, PdfEngineError> {
        let pages = doc.get_pages();
        let mut sizes = Vec::with_capacity(pages.len());

        for (_, object_id) in pages {
            let size = media_box_size(doc, object_id).unwrap_or(DEFAULT_PAGE_SIZE);
            sizes.push(size);
        }

        if sizes.is_empty() {
            return Err(PdfEngineError::Backend("document has no pages".to_owned()));
        }

        Ok(sizes)
    }

    fn record(&self, handle: DocumentHandle) -> Result<&DocumentRecord, PdfEngineError> {
        self.docs.get(&handle).ok_or(PdfEngineError::InvalidHandle(handle.raw()))
    }

    fn record_mut(&mut self, handle: DocumentHandle) -> Result<&mut DocumentRecord, PdfEngineError> {
        self.docs.get_mut(&handle).ok_or(PdfEngineError::InvalidHandle(handle.raw()))
    }
}

/// Width and height of the page's MediaBox, following `/Parent` for inherited boxes
fn media_box_size(doc: &Document, page_id: ObjectId) -> Option<PageSize> {
    let mut node = doc.get_dictionary(page_id).ok()?;

    // page trees are shallow; the bound guards against cycles
    for _ in 0..32 {
        let media_box =
            node.get(b"MediaBox").and_then(|obj| resolve(doc, obj)).and_then(Object::as_array);
        if let Ok(array) = media_box {
            if array.len() != 4 {
                return None;
            }
            let x0 = array[0].as_float().ok()?;
            let y0 = array[1].as_float().ok()?;
            let x1 = array[2].as_float().ok()?;
            let y1 = array[3].as_float().ok()?;
            return Some(PageSize { width_pt: (x1 - x0).abs(), height_pt: (y1 - y0).abs() });
        }

        let parent = node.get(b"Parent").and_then(Object::as_reference).ok()?;
        node = doc.get_dictionary(parent).ok()?;
    }

    None
}

fn resolve<'a>(doc: &'a Document, object: &'a Object) -> Result<&'a Object, lopdf::Error> {
    match object {
        Object::Reference(id) => doc.get_object(*id),
        other => Ok(other),
    }
}

impl PdfEngine for LopdfEngine {
    fn open(&mut self, source: OpenSource) -> Result<DocumentHandle, PdfEngineError> {
        let bytes = match source {
            OpenSource::Path(path) => fs::read(path)?,
            OpenSource::Bytes(bytes) => bytes,
        };

        let trailer = trailer_section(&bytes);
        if trailer.windows(b"/Encrypt".len()).any(|window| window == b"/Encrypt") {
            return Err(PdfEngineError::EncryptedUnsupported);
        }

        let document = Document::load_mem(&bytes)?;
        if document.trailer.get(b"Encrypt").is_ok() {
            return Err(PdfEngineError::EncryptedUnsupported);
        }

        let page_sizes = Self::parse_sizes(&document)?;

        self.next_handle += 1;
        let handle = DocumentHandle(self.next_handle);
        log::debug!("opened document {} with {} pages", handle.raw(), page_sizes.len());
        self.docs.insert(handle, DocumentRecord { document, page_sizes });

        Ok(handle)
    }

    fn page_count(&self, handle: DocumentHandle) -> Result<u32, PdfEngineError> {
        Ok(self.record(handle)?.page_sizes.len() as u32)
    }

    fn page_size(
        &self,
        handle: DocumentHandle,
        page_index: u32,
    ) -> Result<PageSize, PdfEngineError> {
        let record = self.record(handle)?;
        record.page_sizes.get(page_index as usize).copied().ok_or(PdfEngineError::PageOutOfRange {
            page: page_index,
            page_count: record.page_sizes.len() as u32,
        })
    }

    fn annotation_count(
        &self,
        handle: DocumentHandle,
        page_index: u32,
    ) -> Result<usize, PdfEngineError> {
        let record = self.record(handle)?;
        let page_id = record.page_id(page_index)?;
        Ok(stamp::page_annots(&record.document, page_id)?.len())
    }

    fn add_image_stamps(
        &mut self,
        handle: DocumentHandle,
        page_index: u32,
        annotations: &[ImageAnnotation],
    ) -> Result<usize, PdfEngineError> {
        let record = self.record_mut(handle)?;
        let page_id = record.page_id(page_index)?;

        for annotation in annotations {
            stamp::add_stamp_annotation(&mut record.document, page_id, annotation)?;
        }

        log::debug!("added {} stamps to page {}", annotations.len(), page_index);
        Ok(annotations.len())
    }

    fn save(&mut self, handle: DocumentHandle) -> Result<Vec<u8>, PdfEngineError> {
        let record = self.record_mut(handle)?;
        record.document.compress();
        let mut bytes = Vec::new();
        record.document.save_to(&mut bytes)?;
        Ok(bytes)
    }

    fn save_to(&mut self, handle: DocumentHandle, path: &Path) -> Result<(), PdfEngineError> {
        let bytes = self.save(handle)?;
        fs::write(path, bytes)?;
        Ok(())
    }

    fn close(&mut self, handle: DocumentHandle) -> Result<(), PdfEngineError> {
        self.docs.remove(&handle).map(|_| ()).ok_or(PdfEngineError::InvalidHandle(handle.raw()))
    }
}

/// The last cross-reference section through end of file.
///
/// Only this part can hold the trailer, so scanning it never trips over
/// `/Encrypt` bytes that happen to occur inside stream data.
fn trailer_section(bytes: &[u8]) -> &[u8] {
    const STARTXREF: &[u8] = b"startxref";
    let tail = &bytes[bytes.len().saturating_sub(TRAILER_SCAN_WINDOW)..];

    let Some(keyword) = bytes.windows(STARTXREF.len()).rposition(|window| window == STARTXREF)
    else {
        return tail;
    };

    let digits: String = bytes[keyword + STARTXREF.len()..]
        .iter()
        .skip_while(|byte| byte.is_ascii_whitespace())
        .take_while(|byte| byte.is_ascii_digit())
        .map(|&byte| char::from(byte))
        .collect();

    match digits.parse::<usize>() {
        Ok(offset) if offset < keyword => &bytes[offset..],
        _ => tail,
    }
}

pub fn default_engine() -> LopdfEngine {
    LopdfEngine::new()
}

/// Serialized PDF with one empty page per entry in `pages`
pub fn blank_document(pages: &[PageSize]) -> Result<Vec<u8>, PdfEngineError> {
    if pages.is_empty() {
        return Err(PdfEngineError::Backend("document has no pages".to_owned()));
    }

    let mut doc = Document::with_version("1.5");
    let pages_id = doc.new_object_id();

    let mut kids = Vec::with_capacity(pages.len());
    for size in pages {
        let content_id = doc.add_object(Stream::new(dictionary! {}, Vec::new()));
        let page_id = doc.add_object(dictionary! {
            "Type" => "Page",
            "Parent" => pages_id,
            "MediaBox" => vec![
                Object::Integer(0),
                Object::Integer(0),
                Object::Real(size.width_pt),
                Object::Real(size.height_pt),
            ],
            "Contents" => content_id,
            "Resources" => dictionary! {},
        });
        kids.push(Object::Reference(page_id));
    }

    let count = kids.len() as i64;
    doc.objects.insert(
        pages_id,
        Object::Dictionary(dictionary! {
            "Type" => "Pages",
            "Kids" => kids,
            "Count" => count,
        }),
    );

    let catalog_id = doc.add_object(dictionary! {
        "Type" => "Catalog",
        "Pages" => pages_id,
    });
    doc.trailer.set("Root", catalog_id);
    doc.compress();

    let mut bytes = Vec::new();
    doc.save_to(&mut bytes)?;
    Ok(bytes)
}
