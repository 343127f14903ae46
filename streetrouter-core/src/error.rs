use thiserror::Error;

#[derive(Error, Debug)]
pub enum Error {
    #[error("No street found within {radius_m} m of ({lat}, {lon})")]
    NoSplitFound { lat: f64, lon: f64, radius_m: f64 },
    #[error("Path not found")]
    PathNotFound,
    #[error("Invalid vertex index {0}")]
    InvalidVertex(usize),
    #[error("Invalid edge index {0}")]
    InvalidEdge(usize),
    #[error("Invalid removal: {0}")]
    InvalidRemoval(String),
    #[error("Invalid data: {0}")]
    InvalidData(String),
    #[error("Configuration error: {0}")]
    Config(String),
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}
