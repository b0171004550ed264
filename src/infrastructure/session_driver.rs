//! 会话驱动 - 基础设施层
//!
//! 持有唯一的 page 资源，只暴露"执行 JS / 导航 / 取证"的能力

use anyhow::Result;
use chromiumoxide::cdp::browser_protocol::page::CaptureScreenshotFormat;
use chromiumoxide::page::ScreenshotParams;
use chromiumoxide::Page;
use serde::de::DeserializeOwned;
use serde_json::Value as JsonValue;

use crate::error::{AppError, BrowserError};

/// 会话驱动
///
/// 职责：
/// - 持有唯一的 Page 资源
/// - 暴露 eval() / goto() / 截图 / 取源码能力
/// - 不认识 Screen / Lesson
/// - 不处理业务流程
pub struct SessionDriver {
    page: Page,
}

impl SessionDriver {
    /// 创建新的会话驱动
    pub fn new(page: Page) -> Self {
        Self { page }
    }

    /// 获取 page 的引用（用于其他操作）
    pub fn page(&self) -> &Page {
        &self.page
    }

    /// 执行 JS 代码并返回 JSON 结果
    pub async fn eval(&self, js_code: impl Into<String>) -> Result<JsonValue> {
        let result = self
            .page
            .evaluate(js_code.into())
            .await
            .map_err(AppError::from)?;
        let json_value = result.into_value().map_err(AppError::from)?;
        Ok(json_value)
    }

    /// 执行 JS 代码并反序列化为指定类型
    pub async fn eval_as<T: DeserializeOwned>(&self, js_code: impl Into<String>) -> Result<T> {
        let json_value = self.eval(js_code).await?;
        let typed_value = serde_json::from_value(json_value)?;
        Ok(typed_value)
    }

    /// 导航到指定 URL
    pub async fn goto(&self, url: &str) -> Result<()> {
        self.page.goto(url).await.map_err(|e| {
            AppError::Browser(BrowserError::NavigationFailed {
                url: url.to_string(),
                source: Box::new(e),
            })
        })?;
        Ok(())
    }

    /// 获取当前页面 URL
    pub async fn current_url(&self) -> Result<Option<String>> {
        let url = self.page.url().await.map_err(AppError::from)?;
        Ok(url)
    }

    /// 获取当前页面的完整 HTML
    pub async fn page_html(&self) -> Result<String> {
        let html = self.page.content().await.map_err(AppError::from)?;
        Ok(html)
    }

    /// 对当前页面整页截图（PNG 字节）
    pub async fn screenshot_png(&self) -> Result<Vec<u8>> {
        let bytes = self
            .page
            .screenshot(
                ScreenshotParams::builder()
                    .format(CaptureScreenshotFormat::Png)
                    .full_page(true)
                    .build(),
            )
            .await
            .map_err(|e| {
                AppError::Browser(BrowserError::ScreenshotFailed {
                    source: Box::new(e),
                })
            })?;
        Ok(bytes)
    }
}
