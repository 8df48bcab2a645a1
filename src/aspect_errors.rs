use thiserror::Error;

#[derive(Error, Debug)]
pub enum AspectError {
    #[error("Unknown body name: {0}")]
    UnknownBody(String),

    #[error("Invalid aspect definition '{name}': {reason}")]
    InvalidAspectDefinition { name: String, reason: String },

    #[error("Duplicate aspect name in catalog: {0}")]
    DuplicateAspect(String),

    #[error("Invalid scan configuration: {0}")]
    InvalidScanConfig(String),

    #[error("Invalid position sample for {body} at JD {jd}: {reason}")]
    InvalidPositionSample {
        body: String,
        jd: f64,
        reason: String,
    },

    #[error("Unable to perform file operation: {0}")]
    IoError(#[from] std::io::Error),

    #[error("CSV parsing error: {0}")]
    CsvError(#[from] csv::Error),
}

impl PartialEq for AspectError {
    fn eq(&self, other: &Self) -> bool {
        use AspectError::*;
        match (self, other) {
            (UnknownBody(a), UnknownBody(b)) => a == b,
            (
                InvalidAspectDefinition { name: a, reason: ra },
                InvalidAspectDefinition { name: b, reason: rb },
            ) => a == b && ra == rb,
            (DuplicateAspect(a), DuplicateAspect(b)) => a == b,
            (InvalidScanConfig(a), InvalidScanConfig(b)) => a == b,
            (
                InvalidPositionSample {
                    body: a,
                    jd: ja,
                    reason: ra,
                },
                InvalidPositionSample {
                    body: b,
                    jd: jb,
                    reason: rb,
                },
            ) => a == b && ja == jb && ra == rb,

            // I/O and CSV errors carry no comparable payload
            (IoError(_), IoError(_)) => true,
            (CsvError(_), CsvError(_)) => true,

            _ => false,
        }
    }
}
