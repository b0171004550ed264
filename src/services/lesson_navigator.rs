//! 课程导航 - 业务能力层
//!
//! 从级别总览页读出课程列表，并负责打开指定课程。
//! 打开失败（入口控件缺失）是课程级错误：批量模式下记日志跳过，
//! 整个运行继续。

use anyhow::Result;
use serde::Deserialize;
use tokio::time::sleep;
use tracing::{info, warn};

use crate::error::{AppError, BusinessError};
use crate::infrastructure::SessionDriver;
use crate::models::LessonInfo;

/// 读取级别总览页课程列表的 JS
const LIST_LESSONS_JS: &str = r#"
(() => {
    const items = [...document.querySelectorAll('.lesson-list .lesson-entry')];
    return items.map((el, i) => ({
        index: i,
        title: el.querySelector('.lesson-title')?.textContent.trim() ?? `lesson-${i}`,
        unit: el.closest('.unit-section')?.querySelector('.unit-title')?.textContent.trim() ?? null,
    }));
})()
"#;

#[derive(Debug, Deserialize)]
struct LessonEntry {
    index: usize,
    title: String,
    unit: Option<String>,
}

/// 课程导航服务
pub struct LessonNavigator;

impl LessonNavigator {
    /// 创建课程导航服务
    pub fn new() -> Self {
        Self
    }

    /// 从级别总览页读出课程列表
    pub async fn list_lessons(
        &self,
        driver: &SessionDriver,
        level_id: &str,
    ) -> Result<Vec<LessonInfo>> {
        let entries: Vec<LessonEntry> = driver.eval_as(LIST_LESSONS_JS).await?;
        if entries.is_empty() {
            return Err(AppError::Business(BusinessError::EmptyLessonList {
                level_id: level_id.to_string(),
            })
            .into());
        }

        info!("✓ 级别 {} 共找到 {} 节课", level_id, entries.len());
        Ok(entries
            .into_iter()
            .map(|e| LessonInfo {
                index: e.index,
                title: e.title,
                unit: e.unit,
            })
            .collect())
    }

    /// 打开指定课程
    ///
    /// 点不到入口控件返回 `LessonOpenFailed`，由批量循环降级为跳过。
    pub async fn open_lesson(&self, driver: &SessionDriver, lesson: &LessonInfo) -> Result<()> {
        let js = format!(
            r#"
            (() => {{
                const entry = document.querySelectorAll('.lesson-list .lesson-entry')[{}];
                const btn = entry?.querySelector('.start-button, button');
                if (!btn) return {{ opened: false }};
                btn.click();
                return {{ opened: true }};
            }})()
            "#,
            lesson.index
        );

        let opened = driver
            .eval(js)
            .await?
            .get("opened")
            .and_then(|v| v.as_bool())
            .unwrap_or(false);

        if !opened {
            warn!("⚠️ 课程 {} 的入口控件不存在", lesson.title);
            return Err(AppError::Business(BusinessError::LessonOpenFailed {
                title: lesson.title.clone(),
                detail: "总览页上找不到入口控件".to_string(),
            })
            .into());
        }

        // 给前端路由切换留出时间，随后由分类器等待画面稳定
        sleep(tokio::time::Duration::from_millis(500)).await;
        info!("✓ 已打开课程: {}", lesson.title);
        Ok(())
    }

    /// 从课程画面返回级别总览页
    pub async fn back_to_overview(&self, driver: &SessionDriver, target_url: &str) -> Result<()> {
        driver.goto(target_url).await?;
        sleep(tokio::time::Duration::from_millis(500)).await;
        Ok(())
    }
}

impl Default for LessonNavigator {
    fn default() -> Self {
        Self::new()
    }
}
