//! 画面处理上下文
//!
//! 封装"我正在处理哪个级别的哪节课的第几个画面"这一信息

use std::fmt::Display;

/// 画面处理上下文
#[derive(Debug, Clone)]
pub struct ScreenCtx {
    /// 级别/会话标识
    pub level_id: String,

    /// 课程标题
    pub lesson_title: String,

    /// 课程在级别内的序号（仅用于日志显示）
    pub lesson_index: usize,

    /// 画面在课程内的序号（从 0 开始）
    pub screen_index: usize,
}

impl ScreenCtx {
    /// 创建新的画面上下文
    pub fn new(
        level_id: String,
        lesson_title: String,
        lesson_index: usize,
        screen_index: usize,
    ) -> Self {
        Self {
            level_id,
            lesson_title,
            lesson_index,
            screen_index,
        }
    }
}

impl Display for ScreenCtx {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "[级别#{} 课程#{} 画面#{}]",
            self.level_id, self.lesson_title, self.screen_index
        )
    }
}
