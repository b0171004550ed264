//! 卡死检测器 - 业务能力层
//!
//! 比对连续观察到的画面签名（类型标签 + 进度计数）。同一签名连续
//! 重复达到阈值即判定课程卡死，这是终止条件，不做自动恢复。
//!
//! 已知局限：两个同类型、都没有进度计数、但内容不同的练习会共享
//! 签名，可能被误判为卡死。这里沿用这一行为，不引入内容哈希。

use crate::models::ScreenSignature;

/// 一次观察的判定结果
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StuckObservation {
    /// 新画面：编排器应当抽取它
    New,
    /// 与上一画面相同（第 n 次重复）：跳过抽取，避免重复记录
    Repeat(usize),
    /// 重复次数达到阈值：课程卡死
    Stuck,
}

/// 卡死检测器
///
/// 自持状态，由编排循环显式传递，不依赖任何全局量。
pub struct StuckDetector {
    threshold: usize,
    last_signature: Option<ScreenSignature>,
    repeat_count: usize,
}

impl StuckDetector {
    /// 创建检测器；`threshold` 为判定卡死所需的连续重复次数
    pub fn new(threshold: usize) -> Self {
        Self {
            threshold,
            last_signature: None,
            repeat_count: 0,
        }
    }

    /// 录入一次画面观察
    pub fn observe(&mut self, signature: &ScreenSignature) -> StuckObservation {
        if self.last_signature.as_ref() == Some(signature) {
            self.repeat_count += 1;
            if self.repeat_count >= self.threshold {
                return StuckObservation::Stuck;
            }
            StuckObservation::Repeat(self.repeat_count)
        } else {
            self.last_signature = Some(signature.clone());
            self.repeat_count = 0;
            StuckObservation::New
        }
    }

    /// 当前连续重复次数
    pub fn repeat_count(&self) -> usize {
        self.repeat_count
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{ScreenProgress, ScreenType};

    fn sig(screen_type: ScreenType, progress: Option<(u32, u32)>) -> ScreenSignature {
        ScreenSignature {
            screen_type,
            progress: progress.map(|(current, total)| ScreenProgress { current, total }),
        }
    }

    #[test]
    fn test_stuck_exactly_at_threshold() {
        let mut detector = StuckDetector::new(3);
        let s = sig(ScreenType::Translation, Some((2, 5)));

        assert_eq!(detector.observe(&s), StuckObservation::New);
        assert_eq!(detector.observe(&s), StuckObservation::Repeat(1));
        assert_eq!(detector.observe(&s), StuckObservation::Repeat(2));
        // 第 3 次重复 ⇒ 正好在阈值上判定卡死
        assert_eq!(detector.observe(&s), StuckObservation::Stuck);
    }

    #[test]
    fn test_distinct_signature_resets_count() {
        let mut detector = StuckDetector::new(3);
        let a = sig(ScreenType::Translation, Some((2, 5)));
        let b = sig(ScreenType::Translation, Some((3, 5)));

        detector.observe(&a);
        detector.observe(&a);
        detector.observe(&a);
        assert_eq!(detector.repeat_count(), 2);

        // 进度变了 ⇒ 新画面，计数清零
        assert_eq!(detector.observe(&b), StuckObservation::New);
        assert_eq!(detector.repeat_count(), 0);
    }

    #[test]
    fn test_same_type_different_progress_not_stuck() {
        // 连续的同类画面只要进度在走就不算卡死
        let mut detector = StuckDetector::new(3);
        for i in 1..=10 {
            let s = sig(ScreenType::Vocabulary, Some((i, 10)));
            assert_eq!(detector.observe(&s), StuckObservation::New);
        }
    }

    #[test]
    fn test_no_progress_counter_uses_type_only() {
        let mut detector = StuckDetector::new(2);
        let s = sig(ScreenType::Tip, None);

        assert_eq!(detector.observe(&s), StuckObservation::New);
        assert_eq!(detector.observe(&s), StuckObservation::Repeat(1));
        assert_eq!(detector.observe(&s), StuckObservation::Stuck);
    }
}
