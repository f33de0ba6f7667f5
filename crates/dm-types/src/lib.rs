pub mod events;
pub mod level;
pub mod locale;
pub mod resource;
pub mod snapshot;

pub use events::{AppEvent, LoadStatusView};
pub use level::Level;
pub use locale::{Locale, ParseTagError};
pub use resource::ResourcePath;
pub use snapshot::{
    ContentSnapshot, GrammarData, GrammarStatistics, LoadWarning, SnapshotCounts, VerbData,
    VocabularyData, VocabularyLevel,
};
