use thiserror::Error;

#[derive(Debug, Error)]
pub enum ChartError {
    #[error("no plottable rows for {state}")]
    EmptySeries { state: String },

    #[error("image error: {0}")]
    Image(#[from] image::ImageError),

    #[error("io error: {0}")]
    Io(#[from] std::io::Error),
}
