//! 课程写盘服务 - 业务能力层
//!
//! 只负责"把课程记录写进 output 目录"这一件事。每抽取一个画面就
//! 原子重写一次（部分记录），课程定稿后不再更新。
//!
//! 画面先落课程文件、检查点才登记——顺序不能反，否则崩溃后检查点
//! 会声称比实际落盘更多的进度。

use std::fs;
use std::path::PathBuf;

use tracing::debug;

use crate::error::{AppError, AppResult};
use crate::models::LessonRecord;
use crate::services::checkpoint_store::{sanitize_id, write_atomic};

/// 课程写盘服务
pub struct LessonWriter {
    output_dir: PathBuf,
}

impl LessonWriter {
    /// 创建课程写盘服务
    pub fn new(output_dir: impl Into<PathBuf>) -> Self {
        Self {
            output_dir: output_dir.into(),
        }
    }

    /// 原子写入课程记录，返回文件路径
    pub fn write(&self, record: &LessonRecord) -> AppResult<PathBuf> {
        let path = self.path_for(record.lesson_index, &record.title);
        let json = serde_json::to_string_pretty(record).map_err(AppError::from)?;
        write_atomic(&path, json.as_bytes())?;
        debug!(
            "课程记录已写入: {} ({} 个画面)",
            path.display(),
            record.screens.len()
        );
        Ok(path)
    }

    /// 加载中断前的部分课程记录（不存在或已定稿则返回 None）
    ///
    /// 课程内续传是尽力而为：只恢复已落盘的画面，远端位置不强求对齐。
    pub fn load_partial(&self, lesson_index: usize, title: &str) -> Option<LessonRecord> {
        let path = self.path_for(lesson_index, title);
        let content = fs::read_to_string(&path).ok()?;
        let record: LessonRecord = serde_json::from_str(&content).ok()?;
        if record.screen_count.is_some() {
            // 已定稿的记录不参与续传
            return None;
        }
        Some(record)
    }

    /// 课程记录的文件路径
    ///
    /// 序号参与命名：同一级别里同名的课程各有各的文件。
    pub fn path_for(&self, lesson_index: usize, title: &str) -> PathBuf {
        self.output_dir
            .join(format!("{:03}_{}.json", lesson_index, sanitize_id(title)))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{ExtractedScreen, ScreenContent, ScreenType};
    use chrono::Local;
    use tempfile::tempdir;

    fn screen(index: usize) -> ExtractedScreen {
        ExtractedScreen {
            index,
            screen_type: ScreenType::Vocabulary,
            instruction: None,
            content: ScreenContent::Raw { text: "x".into() },
            progress: None,
            flagged: false,
            extracted_at: Local::now(),
        }
    }

    #[test]
    fn test_write_partial_then_load() {
        let dir = tempdir().unwrap();
        let writer = LessonWriter::new(dir.path());

        let mut record = LessonRecord::new(0, "问候语", None, "a1");
        record.screens.push(screen(0));
        record.screens.push(screen(1));
        writer.write(&record).unwrap();

        let partial = writer.load_partial(0, "问候语").unwrap();
        assert_eq!(partial.screens.len(), 2);
        assert!(partial.screen_count.is_none());
    }

    #[test]
    fn test_finalized_record_not_loaded_as_partial() {
        let dir = tempdir().unwrap();
        let writer = LessonWriter::new(dir.path());

        let mut record = LessonRecord::new(0, "问候语", None, "a1");
        record.screens.push(screen(0));
        record.finalize();
        writer.write(&record).unwrap();

        assert!(writer.load_partial(0, "问候语").is_none());
    }

    #[test]
    fn test_rewrite_replaces_previous_content() {
        let dir = tempdir().unwrap();
        let writer = LessonWriter::new(dir.path());

        let mut record = LessonRecord::new(1, "数字", None, "a1");
        record.screens.push(screen(0));
        let first_path = writer.write(&record).unwrap();

        record.screens.push(screen(1));
        let second_path = writer.write(&record).unwrap();
        assert_eq!(first_path, second_path);

        let partial = writer.load_partial(1, "数字").unwrap();
        assert_eq!(partial.screens.len(), 2);
    }

    #[test]
    fn test_same_title_different_index_have_separate_files() {
        let dir = tempdir().unwrap();
        let writer = LessonWriter::new(dir.path());

        // 同一级别里的两节"复习"：各写各的文件，互不覆盖
        let mut first = LessonRecord::new(3, "复习", None, "a1");
        first.screens.push(screen(0));
        let first_path = writer.write(&first).unwrap();

        let mut second = LessonRecord::new(7, "复习", None, "a1");
        second.screens.push(screen(0));
        second.screens.push(screen(1));
        let second_path = writer.write(&second).unwrap();

        assert_ne!(first_path, second_path);
        assert_eq!(writer.load_partial(3, "复习").unwrap().screens.len(), 1);
        assert_eq!(writer.load_partial(7, "复习").unwrap().screens.len(), 2);
    }
}
