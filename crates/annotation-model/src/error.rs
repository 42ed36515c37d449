#[derive(Debug, thiserror::Error)]
pub enum ModelError {
    #[error("image decode error: {0}")]
    Decode(#[from] image::ImageError),
    #[error("image has no pixels")]
    EmptyImage,
}
