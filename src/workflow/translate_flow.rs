//! 翻译校验与恢复流程 - 流程层
//!
//! 核心职责：保证一个顶层批次里的每个单元都拿到译文，或者明确失败。
//!
//! 协议：
//! 1. 构建带边界标记和期望数量说明的载荷，交给翻译服务
//! 2. 只按标记提取译文并校验数量
//! 3. 校验失败时：批次大于 1 就从中点拆成 ⌈n/2⌉ + ⌊n/2⌋ 两半
//!    分别递归（深度加一），按原始 index 顺序合并；批次等于 1
//!    就原样重试，重试耗尽即该单元不可恢复
//! 4. 深度超限或单元不可恢复都是致命错误，作用于整个顶层批次，
//!    绝不悄悄丢弃或替换单元内容
//!
//! 不持有任何资源，只依赖 `Translator` 能力。

use futures::future::BoxFuture;
use tracing::{debug, info, warn};

use crate::config::Config;
use crate::error::{AppError, AppResult, RecoveryError};
use crate::models::document::ContentUnit;
use crate::services::llm_service::Translator;
use crate::workflow::boundary;

/// 一个顶层批次的校验结果
#[derive(Debug, Clone, Copy)]
pub struct ValidationOutcome {
    /// 期望的单元数量
    pub expected_count: usize,
    /// 实际翻译成功的单元数量（成功时等于期望值）
    pub actual_count: usize,
    /// 是否经历过拆分或重试
    pub recovered: bool,
    /// 达到的最大递归深度
    pub depth: usize,
}

/// 子范围的翻译统计（内部使用）
#[derive(Debug, Clone, Copy)]
struct RangeStats {
    recovered: bool,
    depth: usize,
}

/// 翻译校验与恢复流程
pub struct TranslateFlow<T: Translator> {
    translator: T,
    max_unit_retries: usize,
    max_split_depth: usize,
}

impl<T: Translator> TranslateFlow<T> {
    /// 创建新的翻译流程
    pub fn new(translator: T, config: &Config) -> Self {
        Self {
            translator,
            max_unit_retries: config.max_unit_retries,
            max_split_depth: config.max_split_depth,
        }
    }

    /// 翻译一个顶层批次
    ///
    /// 成功时批内每个单元的 `translated_text` 都已写入，
    /// 顺序始终等于输入的 index 顺序。
    pub async fn run(
        &self,
        batch_no: usize,
        units: &mut [ContentUnit],
    ) -> AppResult<ValidationOutcome> {
        let expected = units.len();
        let stats = self.translate_range(batch_no, units, 0).await?;
        Ok(ValidationOutcome {
            expected_count: expected,
            actual_count: expected,
            recovered: stats.recovered,
            depth: stats.depth,
        })
    }

    /// 翻译一个连续的单元范围（递归，带显式深度参数）
    fn translate_range<'a>(
        &'a self,
        batch_no: usize,
        units: &'a mut [ContentUnit],
        depth: usize,
    ) -> BoxFuture<'a, AppResult<RangeStats>> {
        Box::pin(async move {
            let expected = units.len();
            let first_index = units.first().map(|u| u.index).unwrap_or(0);
            let last_index = units.last().map(|u| u.index).unwrap_or(0);

            if depth > self.max_split_depth {
                return Err(AppError::Recovery(RecoveryError::DepthExceeded {
                    start_index: first_index,
                    end_index: last_index,
                    depth,
                }));
            }

            let payload = boundary::build_payload(units);
            let mut attempt = 0usize;

            loop {
                let failure = match self.translator.translate(&payload, expected).await {
                    Ok(response) => match boundary::extract_units(&response, units) {
                        Ok(texts) => {
                            for (unit, text) in units.iter_mut().zip(texts) {
                                unit.set_translated(text);
                            }
                            debug!(
                                "[批次 {}] ✓ 单元 {}-{} 校验通过 (深度 {})",
                                batch_no, first_index, last_index, depth
                            );
                            return Ok(RangeStats {
                                recovered: attempt > 0,
                                depth,
                            });
                        }
                        Err(mismatch) => {
                            warn!(
                                "[批次 {}] ⚠️ 单元 {}-{} 校验失败: {}",
                                batch_no, first_index, last_index, mismatch
                            );
                            format!("{}", mismatch)
                        }
                    },
                    // 传输层重试已在服务内部耗尽，按校验失败处理
                    Err(e) => {
                        warn!(
                            "[批次 {}] ⚠️ 单元 {}-{} 翻译调用失败: {}",
                            batch_no, first_index, last_index, e
                        );
                        format!("{}", e)
                    }
                };

                if expected > 1 {
                    // 从中点拆成两半递归，按原始顺序合并
                    let mid = expected.div_ceil(2);
                    info!(
                        "[批次 {}] ✂️ 拆分单元 {}-{} 为 {} + {} (深度 {} → {})",
                        batch_no,
                        first_index,
                        last_index,
                        mid,
                        expected - mid,
                        depth,
                        depth + 1
                    );
                    let (left, right) = units.split_at_mut(mid);
                    let left_stats = self.translate_range(batch_no, left, depth + 1).await?;
                    let right_stats = self.translate_range(batch_no, right, depth + 1).await?;
                    return Ok(RangeStats {
                        recovered: true,
                        depth: left_stats.depth.max(right_stats.depth),
                    });
                }

                attempt += 1;
                if attempt > self.max_unit_retries {
                    return Err(AppError::Recovery(RecoveryError::UnitUnrecoverable {
                        index: first_index,
                        attempts: attempt,
                    }));
                }
                info!(
                    "[批次 {}] 🔁 单元 {} 重试 {}/{} (原因: {})",
                    batch_no, first_index, attempt, self.max_unit_retries, failure
                );
            }
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::document::UnitKind;
    use std::sync::atomic::{AtomicUsize, Ordering};

    fn make_units(texts: &[&str]) -> Vec<ContentUnit> {
        texts
            .iter()
            .enumerate()
            .map(|(i, t)| ContentUnit::new(UnitKind::Frame, i, t.to_string(), t.to_string()))
            .collect()
    }

    fn test_config() -> Config {
        Config {
            max_unit_retries: 2,
            max_split_depth: 6,
            ..Config::default()
        }
    }

    /// 从载荷里解析出 (index, 文本) 对，供脚本化假翻译器使用
    fn payload_units(payload: &str) -> Vec<(usize, String)> {
        let mut result = Vec::new();
        let mut current: Option<(usize, Vec<String>)> = None;
        for line in payload.lines() {
            if line.starts_with("% ===== UNIT ") && line.ends_with(" BEGIN =====") {
                let digits: String = line.chars().filter(|c| c.is_ascii_digit()).collect();
                current = Some((digits.parse().unwrap(), Vec::new()));
            } else if line.starts_with("% ===== UNIT ") && line.ends_with(" END =====") {
                if let Some((index, lines)) = current.take() {
                    result.push((index, lines.join("\n")));
                }
            } else if let Some((_, lines)) = current.as_mut() {
                lines.push(line.to_string());
            }
        }
        result
    }

    /// 把 (index, 文本) 对组装成合法响应
    fn render_response(items: &[(usize, String)]) -> String {
        let mut out = String::new();
        for (index, text) in items {
            out.push_str(&boundary::begin_tag(*index));
            out.push('\n');
            out.push_str(text);
            out.push('\n');
            out.push_str(&boundary::end_tag(*index));
            out.push('\n');
        }
        out
    }

    /// 原样翻译：返回载荷里的全部单元（加译名前缀），永远合法
    struct EchoTranslator {
        calls: AtomicUsize,
    }

    impl EchoTranslator {
        fn new() -> Self {
            Self {
                calls: AtomicUsize::new(0),
            }
        }
    }

    impl Translator for EchoTranslator {
        fn translate<'a>(
            &'a self,
            payload: &'a str,
            _expected_count: usize,
        ) -> BoxFuture<'a, AppResult<String>> {
            Box::pin(async move {
                self.calls.fetch_add(1, Ordering::SeqCst);
                let items: Vec<(usize, String)> = payload_units(payload)
                    .into_iter()
                    .map(|(i, t)| (i, format!("译{}", t)))
                    .collect();
                Ok(render_response(&items))
            })
        }
    }

    /// 批次大于 1 时丢掉某个单元，单独发送时才返回
    struct DropUnitTranslator {
        drop_index: usize,
        calls: AtomicUsize,
    }

    impl Translator for DropUnitTranslator {
        fn translate<'a>(
            &'a self,
            payload: &'a str,
            _expected_count: usize,
        ) -> BoxFuture<'a, AppResult<String>> {
            Box::pin(async move {
                self.calls.fetch_add(1, Ordering::SeqCst);
                let mut items = payload_units(payload);
                if items.len() > 1 {
                    items.retain(|(i, _)| *i != self.drop_index);
                }
                let items: Vec<(usize, String)> = items
                    .into_iter()
                    .map(|(i, t)| (i, format!("译{}", t)))
                    .collect();
                Ok(render_response(&items))
            })
        }
    }

    /// 倒序返回单元（标记完好），用于验证标记保序
    struct ReorderTranslator;

    impl Translator for ReorderTranslator {
        fn translate<'a>(
            &'a self,
            payload: &'a str,
            _expected_count: usize,
        ) -> BoxFuture<'a, AppResult<String>> {
            Box::pin(async move {
                let mut items: Vec<(usize, String)> = payload_units(payload)
                    .into_iter()
                    .map(|(i, t)| (i, format!("译{}", t)))
                    .collect();
                items.reverse();
                Ok(render_response(&items))
            })
        }
    }

    /// 永远返回垃圾
    struct GarbageTranslator {
        calls: AtomicUsize,
    }

    impl Translator for GarbageTranslator {
        fn translate<'a>(
            &'a self,
            _payload: &'a str,
            _expected_count: usize,
        ) -> BoxFuture<'a, AppResult<String>> {
            Box::pin(async move {
                self.calls.fetch_add(1, Ordering::SeqCst);
                Ok("抱歉，这个任务太难了。".to_string())
            })
        }
    }

    #[tokio::test]
    async fn test_clean_batch_succeeds_without_recovery() {
        let mut units = make_units(&["a", "b", "c"]);
        let flow = TranslateFlow::new(EchoTranslator::new(), &test_config());
        let outcome = flow.run(1, &mut units).await.unwrap();

        assert_eq!(outcome.expected_count, 3);
        assert_eq!(outcome.actual_count, 3);
        assert!(!outcome.recovered);
        assert_eq!(outcome.depth, 0);
        assert_eq!(units[0].translated_text.as_deref(), Some("译a"));
        assert_eq!(units[2].translated_text.as_deref(), Some("译c"));
        assert_eq!(flow.translator.calls.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn test_dropped_unit_recovered_by_splitting() {
        // 批 [U0,U1,U2]，响应丢了 U1 →
        // 拆成 [U0,U1] + [U2]；[U0,U1] 再丢 U1 → 拆成 [U0] + [U1]
        let mut units = make_units(&["a", "b", "c"]);
        let translator = DropUnitTranslator {
            drop_index: 1,
            calls: AtomicUsize::new(0),
        };
        let flow = TranslateFlow::new(translator, &test_config());
        let outcome = flow.run(1, &mut units).await.unwrap();

        assert!(outcome.recovered);
        assert_eq!(outcome.depth, 2);
        // 顺序与内容都完好
        assert_eq!(units[0].translated_text.as_deref(), Some("译a"));
        assert_eq!(units[1].translated_text.as_deref(), Some("译b"));
        assert_eq!(units[2].translated_text.as_deref(), Some("译c"));
    }

    #[tokio::test]
    async fn test_reordered_response_preserves_input_order() {
        let mut units = make_units(&["a", "b", "c", "d"]);
        let flow = TranslateFlow::new(ReorderTranslator, &test_config());
        let outcome = flow.run(1, &mut units).await.unwrap();

        // 标记完好、数量正确 → 一次通过，不触发恢复
        assert!(!outcome.recovered);
        for (i, unit) in units.iter().enumerate() {
            assert_eq!(unit.index, i);
            assert_eq!(
                unit.translated_text.as_deref(),
                Some(format!("译{}", unit.raw_text).as_str())
            );
        }
    }

    #[tokio::test]
    async fn test_single_unit_retries_then_fails() {
        let mut units = make_units(&["a"]);
        let translator = GarbageTranslator {
            calls: AtomicUsize::new(0),
        };
        let flow = TranslateFlow::new(translator, &test_config());
        let err = flow.run(1, &mut units).await.unwrap_err();

        match err {
            AppError::Recovery(RecoveryError::UnitUnrecoverable { index, attempts }) => {
                assert_eq!(index, 0);
                assert_eq!(attempts, 3); // 首次 + 2 次重试
            }
            other => panic!("期望 UnitUnrecoverable，得到: {}", other),
        }
        // 调用次数 = 1 + max_unit_retries
        assert_eq!(flow.translator.calls.load(Ordering::SeqCst), 3);
        assert!(units[0].translated_text.is_none());
    }

    #[tokio::test]
    async fn test_garbage_batch_terminates_at_unit_granularity() {
        // 全垃圾响应：递归必须在 O(log n) 层内落到单元粒度并失败，
        // 不会无限拆分
        let mut units = make_units(&["a", "b", "c", "d", "e"]);
        let translator = GarbageTranslator {
            calls: AtomicUsize::new(0),
        };
        let flow = TranslateFlow::new(translator, &test_config());
        let err = flow.run(1, &mut units).await.unwrap_err();

        assert!(matches!(
            err,
            AppError::Recovery(RecoveryError::UnitUnrecoverable { .. })
        ));
        // 5 个单元、深度上限 6：调用总量有限（n log n 级别）
        let calls = flow.translator.calls.load(Ordering::SeqCst);
        assert!(calls <= 5 * 4 * 3, "调用次数异常: {}", calls);
    }

    #[tokio::test]
    async fn test_depth_ceiling_is_fatal() {
        let mut units = make_units(&["a", "b", "c", "d"]);
        let translator = GarbageTranslator {
            calls: AtomicUsize::new(0),
        };
        let config = Config {
            max_split_depth: 1,
            ..test_config()
        };
        let flow = TranslateFlow::new(translator, &config);
        let err = flow.run(1, &mut units).await.unwrap_err();

        // 深度 0: [a,b,c,d] → 深度 1: [a,b] → 深度 2 超限
        match err {
            AppError::Recovery(RecoveryError::DepthExceeded { depth, .. }) => {
                assert_eq!(depth, 2);
            }
            other => panic!("期望 DepthExceeded，得到: {}", other),
        }
    }

    #[tokio::test]
    async fn test_split_sizes_are_ceil_floor() {
        // 7 个单元拆一次应该是 4 + 3；用丢单元的翻译器间接验证：
        // 只要最终全部译出且保序，拆分就是按中点进行的
        let mut units = make_units(&["a", "b", "c", "d", "e", "f", "g"]);
        let translator = DropUnitTranslator {
            drop_index: 3,
            calls: AtomicUsize::new(0),
        };
        let flow = TranslateFlow::new(translator, &test_config());
        let outcome = flow.run(1, &mut units).await.unwrap();

        assert!(outcome.recovered);
        for (i, unit) in units.iter().enumerate() {
            assert_eq!(unit.index, i);
            assert!(unit.translated_text.is_some(), "单元 {} 没有译文", i);
        }
    }
}
