//! 业务能力层（Services Layer）
//!
//! 描述"我能做什么"，每个服务只处理单个画面/单个文件，不关心流程顺序。

pub mod advancement;
pub mod checkpoint_store;
pub mod extractor_registry;
pub mod issue_reporter;
pub mod lesson_navigator;
pub mod lesson_writer;
pub mod operator;
pub mod screen_classifier;
pub mod stuck_detector;

pub use advancement::{AdvanceResult, AdvancementDriver};
pub use checkpoint_store::CheckpointStore;
pub use extractor_registry::ExtractorRegistry;
pub use issue_reporter::{IssueDetails, IssueReporter};
pub use lesson_navigator::LessonNavigator;
pub use lesson_writer::LessonWriter;
pub use operator::{AutoOperator, ConsoleOperator, Operator};
pub use screen_classifier::ScreenClassifier;
pub use stuck_detector::{StuckDetector, StuckObservation};
