//! 抽取器注册表 - 业务能力层
//!
//! 按画面类型分发内容抽取逻辑。每个抽取器是"一段取数 JS + 一个纯解析
//! 函数"；新增画面类型只需注册一个新条目，分发器本身永远不改。
//!
//! 两条降级规则（抽取失败永远不中断整节课）：
//! 1. 类型没有注册抽取器 ⇒ 兜底抓取画面可见文本；
//! 2. 抽取器执行或解析失败 ⇒ 降级为 `ScreenContent::Error` 记录。

use std::collections::HashMap;

use anyhow::{bail, Result};
use serde_json::Value as JsonValue;
use tracing::{debug, warn};

use crate::infrastructure::SessionDriver;
use crate::models::{ScreenContent, ScreenType};

/// 兜底抽取 JS：画面的可见文本
const FALLBACK_JS: &str = r#"
(() => {
    const root = document.querySelector('[data-screen]') || document.body;
    return { text: root.innerText };
})()
"#;

const VOCABULARY_JS: &str = r#"
(() => {
    const cards = [...document.querySelectorAll('[data-screen] .vocab-card')];
    return cards.map(card => ({
        term: card.querySelector('.term')?.textContent.trim() ?? null,
        translation: card.querySelector('.translation')?.textContent.trim() ?? null,
        example: card.querySelector('.example')?.textContent.trim() ?? null,
        audio: card.querySelector('audio')?.getAttribute('src') ?? null,
    }));
})()
"#;

const MATCHING_JS: &str = r#"
(() => {
    const left = [...document.querySelectorAll('[data-screen] .match-column.left .match-item')];
    const right = [...document.querySelectorAll('[data-screen] .match-column.right .match-item')];
    return {
        left: left.map(el => ({ key: el.getAttribute('data-pair'), text: el.textContent.trim() })),
        right: right.map(el => ({ key: el.getAttribute('data-pair'), text: el.textContent.trim() })),
    };
})()
"#;

const TRANSLATION_JS: &str = r#"
(() => {
    const root = document.querySelector('[data-screen]');
    return {
        source: root.querySelector('.source-sentence')?.textContent.trim() ?? null,
        answer: root.querySelector('[data-answer]')?.getAttribute('data-answer') ?? null,
        word_bank: [...root.querySelectorAll('.word-bank .word')].map(el => el.textContent.trim()),
    };
})()
"#;

const LISTENING_JS: &str = r#"
(() => {
    const root = document.querySelector('[data-screen]');
    return {
        audio: root.querySelector('audio')?.getAttribute('src') ?? null,
        transcript: root.querySelector('[data-transcript]')?.getAttribute('data-transcript') ?? null,
        options: [...root.querySelectorAll('.option')].map(el => el.textContent.trim()),
    };
})()
"#;

const FILL_BLANK_JS: &str = r#"
(() => {
    const root = document.querySelector('[data-screen]');
    return {
        sentence: root.querySelector('.cloze-sentence')?.textContent.trim() ?? null,
        answer: root.querySelector('[data-answer]')?.getAttribute('data-answer') ?? null,
        options: [...root.querySelectorAll('.option')].map(el => el.textContent.trim()),
    };
})()
"#;

const TEXT_PANEL_JS: &str = r#"
(() => {
    const root = document.querySelector('[data-screen]');
    return {
        heading: root.querySelector('h1, h2, .panel-title')?.textContent.trim() ?? null,
        body: root.querySelector('.panel-body, .tip-body')?.textContent.trim()
            ?? root.innerText,
    };
})()
"#;

/// 单个抽取器：取数 JS + 纯解析函数
pub struct Extractor {
    pub js: &'static str,
    pub parse: fn(JsonValue) -> Result<ScreenContent>,
}

/// 抽取器注册表
pub struct ExtractorRegistry {
    extractors: HashMap<ScreenType, Extractor>,
}

impl ExtractorRegistry {
    /// 创建带默认抽取器的注册表
    pub fn new() -> Self {
        let mut registry = Self {
            extractors: HashMap::new(),
        };
        registry.register(ScreenType::Vocabulary, VOCABULARY_JS, parse_vocabulary);
        registry.register(ScreenType::Matching, MATCHING_JS, parse_matching);
        registry.register(ScreenType::Translation, TRANSLATION_JS, parse_translation);
        registry.register(ScreenType::Listening, LISTENING_JS, parse_listening);
        registry.register(ScreenType::FillBlank, FILL_BLANK_JS, parse_fill_blank);
        registry.register(ScreenType::Tip, TEXT_PANEL_JS, parse_text_panel);
        registry.register(ScreenType::Intro, TEXT_PANEL_JS, parse_text_panel);
        registry
    }

    /// 注册（或覆盖）一个抽取器
    pub fn register(
        &mut self,
        screen_type: ScreenType,
        js: &'static str,
        parse: fn(JsonValue) -> Result<ScreenContent>,
    ) {
        self.extractors.insert(screen_type, Extractor { js, parse });
    }

    /// 查找抽取器；没注册不算错误，由 extract() 走兜底
    pub fn lookup(&self, screen_type: ScreenType) -> Option<&Extractor> {
        self.extractors.get(&screen_type)
    }

    /// 抽取当前画面的内容
    ///
    /// 对外不失败：任何一层出错都降级为内容记录，课程继续。
    pub async fn extract(&self, driver: &SessionDriver, screen_type: ScreenType) -> ScreenContent {
        match self.lookup(screen_type) {
            Some(extractor) => {
                let raw = driver.eval(extractor.js).await;
                parsed_content(extractor, raw, screen_type)
            }
            None => {
                debug!("类型 {} 没有注册抽取器，使用兜底抽取", screen_type);
                fallback_content(driver.eval(FALLBACK_JS).await)
            }
        }
    }
}

/// 把抽取器的取数结果映射为画面内容
///
/// 执行失败和解析失败都降级为错误记录，由调用方决定是否继续。
fn parsed_content(
    extractor: &Extractor,
    raw: Result<JsonValue>,
    screen_type: ScreenType,
) -> ScreenContent {
    let raw = match raw {
        Ok(v) => v,
        Err(e) => {
            warn!("⚠️ 抽取器执行失败 ({}): {}", screen_type, e);
            return ScreenContent::Error {
                message: format!("抽取器执行失败: {}", e),
            };
        }
    };
    match (extractor.parse)(raw) {
        Ok(content) => content,
        Err(e) => {
            warn!("⚠️ 抽取结果解析失败 ({}): {}", screen_type, e);
            ScreenContent::Error {
                message: format!("抽取结果解析失败: {}", e),
            }
        }
    }
}

/// 把兜底取数结果映射为画面可见文本
fn fallback_content(raw: Result<JsonValue>) -> ScreenContent {
    match raw {
        Ok(v) => {
            let text = v
                .get("text")
                .and_then(|t| t.as_str())
                .unwrap_or_default()
                .to_string();
            ScreenContent::Raw { text }
        }
        Err(e) => {
            warn!("⚠️ 兜底抽取失败: {}", e);
            ScreenContent::Error {
                message: format!("兜底抽取失败: {}", e),
            }
        }
    }
}

impl Default for ExtractorRegistry {
    fn default() -> Self {
        Self::new()
    }
}

// ========== 解析函数 ==========
// 只做形状校验再包装；校验不过就报错，由调用方降级。

fn parse_vocabulary(raw: JsonValue) -> Result<ScreenContent> {
    let cards = match raw.as_array() {
        Some(cards) if !cards.is_empty() => cards,
        _ => bail!("词汇画面没有抽到任何卡片"),
    };
    if cards.iter().any(|c| c.get("term").map_or(true, |t| t.is_null())) {
        bail!("存在缺少 term 字段的词汇卡片");
    }
    Ok(ScreenContent::Structured { data: raw })
}

fn parse_matching(raw: JsonValue) -> Result<ScreenContent> {
    let left_len = raw.get("left").and_then(|v| v.as_array()).map(Vec::len);
    let right_len = raw.get("right").and_then(|v| v.as_array()).map(Vec::len);
    match (left_len, right_len) {
        (Some(l), Some(r)) if l > 0 && l == r => Ok(ScreenContent::Structured { data: raw }),
        (Some(l), Some(r)) => bail!("配对两列数量不一致: {} vs {}", l, r),
        _ => bail!("配对画面缺少 left/right 列"),
    }
}

fn parse_translation(raw: JsonValue) -> Result<ScreenContent> {
    if raw.get("source").map_or(true, |s| s.is_null()) {
        bail!("翻译画面缺少原句");
    }
    Ok(ScreenContent::Structured { data: raw })
}

fn parse_listening(raw: JsonValue) -> Result<ScreenContent> {
    if raw.get("audio").map_or(true, |a| a.is_null()) {
        bail!("听力画面缺少音频地址");
    }
    Ok(ScreenContent::Structured { data: raw })
}

fn parse_fill_blank(raw: JsonValue) -> Result<ScreenContent> {
    if raw.get("sentence").map_or(true, |s| s.is_null()) {
        bail!("填空画面缺少句子");
    }
    Ok(ScreenContent::Structured { data: raw })
}

fn parse_text_panel(raw: JsonValue) -> Result<ScreenContent> {
    let body = raw.get("body").and_then(|b| b.as_str()).unwrap_or_default();
    if body.is_empty() {
        bail!("文本面板内容为空");
    }
    Ok(ScreenContent::Structured { data: raw })
}
