/// Failures while loading a tour. Playback itself never fails outward: it
/// degrades locally and logs.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TourError {
    Dataset(String),
    Config(String),
    Io(String),
}

impl std::fmt::Display for TourError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            TourError::Dataset(msg) => write!(f, "invalid waypoint dataset: {msg}"),
            TourError::Config(msg) => write!(f, "invalid tour config: {msg}"),
            TourError::Io(msg) => write!(f, "tour io error: {msg}"),
        }
    }
}

impl std::error::Error for TourError {}

impl From<std::io::Error> for TourError {
    fn from(err: std::io::Error) -> Self {
        TourError::Io(err.to_string())
    }
}
