//! 抓取进度检查点
//!
//! 整个进程唯一的断点续传依据。运行开始时加载（不存在则为零值），
//! 每抽取一个画面、每完成一节课都会更新并同步落盘。
//!
//! 不变式：在任何可能被打断的时刻，`current_screen_index` 恒等于
//! 当前课程已经落盘的画面数——检查点绝不声称比实际持久化更多的进度。

use chrono::{DateTime, Local};
use serde::{Deserialize, Serialize};

/// 已完成课程的登记条目
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CompletedLesson {
    pub index: usize,
    pub title: String,
    pub completed_at: DateTime<Local>,
}

/// 抓取检查点
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CrawlCheckpoint {
    /// 级别/会话标识
    pub level_id: String,
    /// 已完成课程的有序列表
    pub completed_lessons: Vec<CompletedLesson>,
    /// 进行中的课程标题；空闲时为 None
    pub current_lesson: Option<String>,
    /// 进行中课程在级别内的序号（与标题一起区分同名课程）
    #[serde(default)]
    pub current_lesson_index: Option<usize>,
    /// 进行中课程已落盘的画面数
    pub current_screen_index: usize,
    pub last_updated: DateTime<Local>,
}

impl CrawlCheckpoint {
    /// 零值检查点（首次运行或检查点文件不存在时）
    pub fn empty(level_id: impl Into<String>) -> Self {
        Self {
            level_id: level_id.into(),
            completed_lessons: Vec::new(),
            current_lesson: None,
            current_lesson_index: None,
            current_screen_index: 0,
            last_updated: Local::now(),
        }
    }

    /// 指定序号的课程是否已完成
    pub fn is_completed(&self, lesson_index: usize) -> bool {
        self.completed_lessons.iter().any(|l| l.index == lesson_index)
    }

    /// 开始处理一节课
    ///
    /// 如果检查点里记录的正是这节课（崩溃后重跑），保留已保存的画面数，
    /// 供课程内续传使用；否则从 0 开始。序号和标题都要对上——同一
    /// 级别里允许出现同名课程。
    pub fn begin_lesson(&mut self, lesson_index: usize, title: &str) -> usize {
        let same_lesson = self.current_lesson_index == Some(lesson_index)
            && self.current_lesson.as_deref() == Some(title);
        if !same_lesson {
            self.current_lesson = Some(title.to_string());
            self.current_lesson_index = Some(lesson_index);
            self.current_screen_index = 0;
        }
        self.last_updated = Local::now();
        self.current_screen_index
    }

    /// 登记一个已落盘的画面
    ///
    /// `saved_screens` 必须是课程文件里实际持久化的画面数。
    pub fn record_screen(&mut self, saved_screens: usize) {
        self.current_screen_index = saved_screens;
        self.last_updated = Local::now();
    }

    /// 登记一节已完成的课程（幂等：同一序号只登记一次）
    pub fn finalize_lesson(&mut self, lesson_index: usize, title: &str) {
        if !self.is_completed(lesson_index) {
            self.completed_lessons.push(CompletedLesson {
                index: lesson_index,
                title: title.to_string(),
                completed_at: Local::now(),
            });
        }
        self.current_lesson = None;
        self.current_lesson_index = None;
        self.current_screen_index = 0;
        self.last_updated = Local::now();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_empty_checkpoint_is_zero_value() {
        let cp = CrawlCheckpoint::empty("a1");
        assert_eq!(cp.level_id, "a1");
        assert!(cp.completed_lessons.is_empty());
        assert!(cp.current_lesson.is_none());
        assert_eq!(cp.current_screen_index, 0);
    }

    #[test]
    fn test_finalize_lesson_is_idempotent() {
        let mut cp = CrawlCheckpoint::empty("a1");
        cp.finalize_lesson(0, "问候语");
        cp.finalize_lesson(0, "问候语");
        assert_eq!(cp.completed_lessons.len(), 1);
        assert!(cp.is_completed(0));
        assert!(!cp.is_completed(1));
    }

    #[test]
    fn test_begin_lesson_resumes_same_lesson() {
        let mut cp = CrawlCheckpoint::empty("a1");
        assert_eq!(cp.begin_lesson(1, "数字"), 0);
        cp.record_screen(3);

        // 崩溃后重跑同一节课：从已保存的画面数继续
        assert_eq!(cp.begin_lesson(1, "数字"), 3);
        // 换一节课：清零
        assert_eq!(cp.begin_lesson(2, "颜色"), 0);
    }

    #[test]
    fn test_same_title_different_index_is_a_new_lesson() {
        // 同一级别里允许出现同名课程（例如多节"复习"）
        let mut cp = CrawlCheckpoint::empty("a1");
        cp.begin_lesson(3, "复习");
        cp.record_screen(4);

        // 序号不同 ⇒ 另一节课，不能继承前一节的画面数
        assert_eq!(cp.begin_lesson(7, "复习"), 0);
        assert_eq!(cp.current_lesson_index, Some(7));
    }

    #[test]
    fn test_finalize_clears_current_lesson() {
        let mut cp = CrawlCheckpoint::empty("a1");
        cp.begin_lesson(2, "数字");
        cp.record_screen(5);
        cp.finalize_lesson(2, "数字");
        assert!(cp.current_lesson.is_none());
        assert!(cp.current_lesson_index.is_none());
        assert_eq!(cp.current_screen_index, 0);
    }
}
