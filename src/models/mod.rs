pub mod enums;
pub mod reading;
pub mod recommendation;

pub use enums::{ReadingSource, ReadingStatus, RecommendationStatus};
pub use reading::{BiomarkerReading, RawReadingFields};
pub use recommendation::Recommendation;
