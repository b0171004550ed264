//! 故障报告的数据模型
//!
//! 只在不可恢复的终止条件下创建，一次写入、从不修改，
//! 也不会被抓取流程读回——纯粹面向操作员的离线排查材料。

use chrono::{DateTime, Local};
use serde::Serialize;

use crate::models::screen::ScreenType;

/// 故障类别
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum IssueKind {
    /// 分类器返回了未知画面类型
    UnknownScreen,
    /// 连续多轮观察无前进（含画面数安全上限触发）
    Stuck,
    /// 未被捕获的异常到达了编排层边界
    Fatal,
}

impl IssueKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            IssueKind::UnknownScreen => "unknown_screen",
            IssueKind::Stuck => "stuck",
            IssueKind::Fatal => "fatal",
        }
    }
}

/// 故障报告（issue 目录里的 report.json）
#[derive(Debug, Clone, Serialize)]
pub struct IssueReport {
    pub id: String,
    pub kind: IssueKind,
    pub timestamp: DateTime<Local>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub url: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub lesson: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub screen_index: Option<usize>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub detected_type: Option<ScreenType>,
    /// 调用方补充的细节（卡死签名、错误信息等）
    pub detail: String,
}
