use anyhow::Result;
use chromiumoxide::{Browser, Page};
use futures::StreamExt;
use tokio::time::sleep;
use tracing::{debug, error, info};

use crate::error::{AppError, BrowserError};

/// 连接到已开启调试端口的浏览器，并拿到学习应用所在的页面
///
/// 优先复用 URL 匹配 `target_url` 前缀的已有标签页（登录态通常已在
/// 这个标签页里），找不到时新建页面并导航过去。
pub async fn connect_to_browser_and_page(port: u16, target_url: &str) -> Result<(Browser, Page)> {
    let browser_url = format!("http://localhost:{}", port);
    info!("正在连接到浏览器: {}", browser_url);
    debug!("目标 URL: {}", target_url);

    let (browser, mut handler) = Browser::connect(&browser_url).await.map_err(|e| {
        error!("连接浏览器失败: {}", e);
        AppError::browser_connection_failed(port, e)
    })?;
    debug!("浏览器连接成功");

    // 在后台处理浏览器事件
    tokio::spawn(async move {
        while let Some(h) = handler.next().await {
            if h.is_err() {
                break;
            }
        }
    });

    // 添加短暂延迟以等待浏览器状态同步
    sleep(tokio::time::Duration::from_millis(300)).await;

    let pages = browser
        .pages()
        .await
        .map_err(|e| AppError::browser_connection_failed(port, e))?;
    debug!("获取到 {} 个页面", pages.len());

    // 查找已经打开学习应用的标签页
    let url_prefix = target_url.split('#').next().unwrap_or(target_url);
    for p in pages.iter() {
        if let Ok(Some(page_url)) = p.url().await {
            debug!("检查页面 URL: {}", page_url);
            if page_url.starts_with(url_prefix) {
                info!("✓ 复用已打开的学习应用页面: {}", page_url);
                return Ok((browser, p.clone()));
            }
        }
    }
    debug!("未找到已打开的学习应用页面，将创建新页面");

    let page = browser.new_page("about:blank").await.map_err(|e| {
        error!("创建新页面失败: {}", e);
        AppError::Browser(BrowserError::PageCreationFailed {
            source: Box::new(e),
        })
    })?;
    page.goto(target_url).await.map_err(|e| {
        error!("导航到 {} 失败: {}", target_url, e);
        AppError::Browser(BrowserError::NavigationFailed {
            url: target_url.to_string(),
            source: Box::new(e),
        })
    })?;
    info!("已导航到: {}", target_url);

    Ok((browser, page))
}
