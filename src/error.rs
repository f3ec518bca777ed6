use thiserror::Error;

use crate::store::StoreError;
use crate::structuring::ValidateError;

/// Errors surfaced by the import pipeline.
///
/// None of these cross the document-processing boundary as a panic or a
/// bubbling error: the processor folds them into an `ImportOutcome` with
/// `success: false` so upload flows can show a message without crashing.
#[derive(Error, Debug)]
pub enum PipelineError {
    #[error("File could not be read: {0}")]
    UnreadableFile(String),

    #[error("No text could be extracted from the document")]
    NoTextExtracted,

    #[error("No recognized biomarkers were found in the document")]
    NoBiomarkersFound,

    #[error(transparent)]
    Validate(#[from] ValidateError),

    #[error(transparent)]
    Store(#[from] StoreError),
}
