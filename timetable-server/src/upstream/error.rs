//! Timetable client error types.

/// Why a fetch from the timetable API produced no document.
#[derive(Debug, thiserror::Error)]
pub enum FetchError {
    /// Required configuration is absent; no request was attempted.
    #[error("not configured: {0}")]
    ConfigurationMissing(&'static str),

    /// Transport failure (connection, timeout, body read).
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    /// Upstream answered with a non-success status.
    #[error("API error {status} from {url}: {body}")]
    Status {
        url: String,
        status: u16,
        /// Response body, truncated.
        body: String,
    },

    /// The listing contained no timetables.
    #[error("no timetables found in listing")]
    NoTimetables,

    /// The chosen listing entry had no usable identifier.
    #[error("could not determine timetable id from listing entry: {entry}")]
    MissingIdentifier {
        /// The entry, truncated.
        entry: String,
    },

    /// The response held no timetable data.
    #[error("no timetable data returned from {url}")]
    EmptyPayload { url: String },

    /// The response held data, but not a timetable mapping.
    #[error("payload from {url} is not a timetable document")]
    NotADocument { url: String },
}
