//! 课程相关的数据模型

use chrono::{DateTime, Local};
use serde::{Deserialize, Serialize};

use crate::models::screen::ExtractedScreen;

/// 级别总览页上的一条课程信息
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LessonInfo {
    /// 课程在级别内的序号（从 0 开始）
    pub index: usize,
    pub title: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub unit: Option<String>,
}

/// 一节课的完整抽取记录
///
/// 每抽取一个画面就整体重写一次（原子替换），课程结束时定稿。
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LessonRecord {
    /// 课程在级别内的序号（参与输出文件命名，区分同名课程）
    pub lesson_index: usize,
    pub title: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub unit: Option<String>,
    pub level_id: String,
    pub screens: Vec<ExtractedScreen>,
    /// 定稿时写入的画面总数；定稿前为 None
    #[serde(skip_serializing_if = "Option::is_none")]
    pub screen_count: Option<usize>,
    pub extracted_at: DateTime<Local>,
}

impl LessonRecord {
    /// 创建一份新的课程记录
    pub fn new(
        lesson_index: usize,
        title: impl Into<String>,
        unit: Option<String>,
        level_id: impl Into<String>,
    ) -> Self {
        Self {
            lesson_index,
            title: title.into(),
            unit,
            level_id: level_id.into(),
            screens: Vec::new(),
            screen_count: None,
            extracted_at: Local::now(),
        }
    }

    /// 定稿：写入画面总数
    pub fn finalize(&mut self) {
        self.screen_count = Some(self.screens.len());
    }
}
