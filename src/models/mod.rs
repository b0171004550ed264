pub mod checkpoint;
pub mod issue;
pub mod lesson;
pub mod screen;

pub use checkpoint::{CompletedLesson, CrawlCheckpoint};
pub use issue::{IssueKind, IssueReport};
pub use lesson::{LessonInfo, LessonRecord};
pub use screen::{
    ExtractedScreen, ScreenContent, ScreenObservation, ScreenProgress, ScreenSignature, ScreenType,
};
