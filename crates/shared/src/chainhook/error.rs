use reqwest::StatusCode;

#[derive(Debug, thiserror::Error)]
pub enum ChainhookError {
    #[error("invalid chainhook node url: {0}")]
    InvalidUrl(#[from] url::ParseError),

    #[error("request to chainhook node failed: {0}")]
    Http(#[from] reqwest::Error),

    #[error("chainhook node rejected request with {status}: {body}")]
    Rejected { status: StatusCode, body: String },
}
