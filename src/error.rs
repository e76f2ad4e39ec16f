use thiserror::Error;

/// Failures that stop one step of a run (a fetch, the publish, the chart).
#[derive(Error, Debug)]
pub enum TrackerError {
    #[error("transport error: {0}")]
    Transport(#[from] reqwest::Error),

    #[error("unexpected status {status} for {url}")]
    HttpStatus { status: u16, url: String },

    #[error("request to {url} timed out")]
    Timeout { url: String },

    #[error("missing configuration: {0}")]
    MissingConfig(&'static str),

    #[error("malformed sink response: {0}")]
    SinkProtocol(String),

    #[error("sink rejected the update: {0}")]
    SinkRejected(String),

    #[error("chart rendering failed: {0}")]
    Chart(#[from] image::ImageError),

    #[error("chart font could not be loaded: {0}")]
    Font(#[from] ab_glyph::InvalidFont),

    #[error("file error: {0}")]
    Io(#[from] std::io::Error),

    #[error("csv error: {0}")]
    Csv(#[from] csv::Error),
}

impl TrackerError {
    /// Maps a reqwest failure to `Timeout` when that is what happened.
    pub fn from_request(err: reqwest::Error, url: &str) -> Self {
        if err.is_timeout() {
            TrackerError::Timeout { url: url.to_string() }
        } else {
            TrackerError::Transport(err)
        }
    }
}

/// Structural or numeric problems found while reading a page.
/// Each one is recovered at the smallest scope that contains it.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum ParseError {
    #[error("section '{0}' not found")]
    MissingSection(&'static str),

    #[error("no tab content with id '{tab_id}'")]
    MissingTabContent { tab_id: String },

    #[error("no participation table for year {year}")]
    MissingTable { year: i32 },

    #[error("unexpected number of columns ({count}): {text}")]
    UnexpectedCellCount { count: usize, text: String },

    #[error("could not parse {field} '{value}'")]
    InvalidNumber { field: &'static str, value: String },
}
