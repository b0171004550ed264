//! 画面相关的数据模型
//!
//! 包括画面类型、进度计数、识别结果和抽取结果。

use chrono::{DateTime, Local};
use phf::phf_map;
use serde::{Deserialize, Serialize};
use serde_json::Value as JsonValue;

/// 画面类型标签
///
/// 分类器的离散输出。远端应用的每一个课程画面都必须被归入其中一类；
/// 无法匹配任何已知签名的画面一律返回 `Unknown`，绝不猜测。
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ScreenType {
    /// 课程开头的介绍面板
    Intro,
    /// 词汇展示画面
    Vocabulary,
    /// 连线配对练习
    Matching,
    /// 翻译练习
    Translation,
    /// 听力练习
    Listening,
    /// 填空练习
    FillBlank,
    /// 语法/文化小贴士
    Tip,
    /// 课程结束画面（终止标志）
    LessonEnd,
    /// 未识别的画面
    Unknown,
}

/// DOM 标记 → 画面类型的静态查找表
///
/// 标记由分类器的 JS 探针从画面根节点的 `data-screen` 属性读出。
/// 新增画面类型时只需在这里加一行，并在注册表里注册对应的抽取器。
static MARKER_TAGS: phf::Map<&'static str, ScreenType> = phf_map! {
    "intro" => ScreenType::Intro,
    "vocabulary" => ScreenType::Vocabulary,
    "matching" => ScreenType::Matching,
    "translation" => ScreenType::Translation,
    "listening" => ScreenType::Listening,
    "fill-blank" => ScreenType::FillBlank,
    "tip" => ScreenType::Tip,
    "lesson-end" => ScreenType::LessonEnd,
};

impl ScreenType {
    /// 根据 DOM 标记解析画面类型
    ///
    /// 查找表里没有的标记一律视为 `Unknown`。
    pub fn from_marker(marker: &str) -> Self {
        MARKER_TAGS
            .get(marker)
            .copied()
            .unwrap_or(ScreenType::Unknown)
    }

    /// 是否为课程终止画面
    pub fn is_terminal(&self) -> bool {
        matches!(self, ScreenType::LessonEnd)
    }

    /// 是否为练习类画面（需要模拟作答才能前进）
    pub fn is_exercise(&self) -> bool {
        matches!(
            self,
            ScreenType::Matching
                | ScreenType::Translation
                | ScreenType::Listening
                | ScreenType::FillBlank
        )
    }

    /// 标签的字符串表示（与 serde 输出一致）
    pub fn as_str(&self) -> &'static str {
        match self {
            ScreenType::Intro => "intro",
            ScreenType::Vocabulary => "vocabulary",
            ScreenType::Matching => "matching",
            ScreenType::Translation => "translation",
            ScreenType::Listening => "listening",
            ScreenType::FillBlank => "fill_blank",
            ScreenType::Tip => "tip",
            ScreenType::LessonEnd => "lesson_end",
            ScreenType::Unknown => "unknown",
        }
    }
}

impl std::fmt::Display for ScreenType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// 画面内的进度计数（例如 "3 / 17"）
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ScreenProgress {
    pub current: u32,
    pub total: u32,
}

/// 分类器的单次识别结果
///
/// 每个轮询周期新建一份，只作为抽取和卡死检测的输入，从不落盘。
#[derive(Debug, Clone)]
pub struct ScreenObservation {
    pub screen_type: ScreenType,
    pub progress: Option<ScreenProgress>,
    pub instruction: Option<String>,
}

impl ScreenObservation {
    /// 生成卡死检测用的画面签名
    pub fn signature(&self) -> ScreenSignature {
        ScreenSignature {
            screen_type: self.screen_type,
            progress: self.progress,
        }
    }
}

/// 画面签名：类型标签 + 进度计数
///
/// 只靠类型标签会把连续两个同类画面误判为没有前进，
/// 进度计数是"远端是否真的动了"的廉价代理。
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ScreenSignature {
    pub screen_type: ScreenType,
    pub progress: Option<ScreenProgress>,
}

impl std::fmt::Display for ScreenSignature {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self.progress {
            Some(p) => write!(f, "{}({}/{})", self.screen_type, p.current, p.total),
            None => write!(f, "{}", self.screen_type),
        }
    }
}

/// 画面内容：结构化数据、生文本兜底或被降级的抽取错误
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum ScreenContent {
    /// 按画面类型抽取出的结构化内容
    Structured { data: JsonValue },
    /// 兜底抽取：画面的可见文本
    Raw { text: String },
    /// 抽取器失败，降级为错误记录（课程继续）
    Error { message: String },
}

/// 一个画面的抽取结果
///
/// 追加进课程记录后不可变；修正只能发生在追加之前的重抽取。
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ExtractedScreen {
    /// 画面在课程内的序号（从 0 开始）
    pub index: usize,
    pub screen_type: ScreenType,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub instruction: Option<String>,
    pub content: ScreenContent,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub progress: Option<ScreenProgress>,
    /// 操作员标记为"待人工复查"
    #[serde(default, skip_serializing_if = "std::ops::Not::not")]
    pub flagged: bool,
    pub extracted_at: DateTime<Local>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_from_marker_known_tags() {
        assert_eq!(ScreenType::from_marker("vocabulary"), ScreenType::Vocabulary);
        assert_eq!(ScreenType::from_marker("fill-blank"), ScreenType::FillBlank);
        assert_eq!(ScreenType::from_marker("lesson-end"), ScreenType::LessonEnd);
    }

    #[test]
    fn test_from_marker_unknown_never_guesses() {
        // 查找表外的标记必须返回 Unknown，不允许就近猜测
        assert_eq!(ScreenType::from_marker("vocab"), ScreenType::Unknown);
        assert_eq!(ScreenType::from_marker("matching2"), ScreenType::Unknown);
        assert_eq!(ScreenType::from_marker(""), ScreenType::Unknown);
    }

    #[test]
    fn test_signature_equality_uses_progress() {
        let a = ScreenSignature {
            screen_type: ScreenType::Vocabulary,
            progress: Some(ScreenProgress { current: 2, total: 5 }),
        };
        let b = ScreenSignature {
            screen_type: ScreenType::Vocabulary,
            progress: Some(ScreenProgress { current: 3, total: 5 }),
        };
        // 同类型、不同进度 ⇒ 两个不同的画面
        assert_ne!(a, b);
        assert_eq!(a, a.clone());
    }

    #[test]
    fn test_screen_type_serde_roundtrip() {
        let json = serde_json::to_string(&ScreenType::FillBlank).unwrap();
        assert_eq!(json, "\"fill_blank\"");
        let back: ScreenType = serde_json::from_str(&json).unwrap();
        assert_eq!(back, ScreenType::FillBlank);
    }
}
