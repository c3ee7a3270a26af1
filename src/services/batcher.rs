//! 单元分批 - 业务能力层
//!
//! 把有序的单元序列贪心地切成批次，同时受两个限制：
//! 每批最多 `batch_size` 个单元、每批的估算 token 总量不超过
//! `max_tokens`（软上限）。单元永远不会被拆开，单独超限的
//! 单元自成一批。

use crate::models::document::ContentUnit;
use tracing::info;

/// 平均每个 token 对应的字符数（混合 LaTeX/英文的粗略估算）
const CHARS_PER_TOKEN: usize = 4;

/// 估算文本的 token 数量（`ceil(字符数 / 4)`，刻意粗略）
pub fn estimate_tokens(text: &str) -> usize {
    text.chars().count().div_ceil(CHARS_PER_TOKEN)
}

/// 一个批次：指向单元序列的连续下标区间 [start, end)
///
/// 批次只记录区间，不复制单元内容；单元的所有权始终在
/// `BeamerDocument` 手里。
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct UnitBatch {
    pub start: usize,
    pub end: usize,
    /// 批内单元 stripped 文本的 token 估算总和
    pub estimated_tokens: usize,
}

impl UnitBatch {
    /// 批内单元数量
    pub fn len(&self) -> usize {
        self.end - self.start
    }

    pub fn is_empty(&self) -> bool {
        self.start == self.end
    }
}

/// 贪心分批
///
/// 逐个累加单元，加入下一个会超出数量或 token 上限时收口当前批。
/// 不做全局优化：打包不理想的代价由恢复流程的递归缩小来兜底。
///
/// # 返回
/// 批次列表；批次互不重叠、按顺序恰好覆盖全部单元、没有空批。
pub fn batch_units(units: &[ContentUnit], batch_size: usize, max_tokens: usize) -> Vec<UnitBatch> {
    let batch_size = batch_size.max(1);
    let mut batches: Vec<UnitBatch> = Vec::new();
    let mut current_start = 0usize;
    let mut current_len = 0usize;
    let mut current_tokens = 0usize;

    for (i, unit) in units.iter().enumerate() {
        let unit_tokens = estimate_tokens(&unit.stripped_text);

        // 加入当前单元会超限时，先收口当前批
        if current_len > 0
            && (current_len >= batch_size || current_tokens + unit_tokens > max_tokens)
        {
            batches.push(UnitBatch {
                start: current_start,
                end: i,
                estimated_tokens: current_tokens,
            });
            current_start = i;
            current_len = 0;
            current_tokens = 0;
        }

        current_len += 1;
        current_tokens += unit_tokens;
    }

    if current_len > 0 {
        batches.push(UnitBatch {
            start: current_start,
            end: units.len(),
            estimated_tokens: current_tokens,
        });
    }

    info!("✓ {} 个单元分成 {} 批", units.len(), batches.len());
    batches
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::document::UnitKind;

    fn make_units(texts: &[&str]) -> Vec<ContentUnit> {
        texts
            .iter()
            .enumerate()
            .map(|(i, t)| ContentUnit::new(UnitKind::Frame, i, t.to_string(), t.to_string()))
            .collect()
    }

    /// 批次必须恰好划分单元序列：不遗漏、不重复、无空批
    fn assert_partition(batches: &[UnitBatch], total: usize) {
        let mut expected_start = 0usize;
        for batch in batches {
            assert_eq!(batch.start, expected_start);
            assert!(!batch.is_empty());
            expected_start = batch.end;
        }
        assert_eq!(expected_start, total);
    }

    #[test]
    fn test_single_batch() {
        let units = make_units(&["f1", "f2", "f3"]);
        let batches = batch_units(&units, 5, 20_000);
        assert_eq!(batches.len(), 1);
        assert_eq!((batches[0].start, batches[0].end), (0, 3));
        assert_partition(&batches, 3);
    }

    #[test]
    fn test_splits_by_batch_size() {
        let units = make_units(&["a", "b", "c", "d", "e", "f", "g"]);
        let batches = batch_units(&units, 3, 20_000);
        assert_eq!(batches.len(), 3);
        assert_eq!(batches[0].len(), 3);
        assert_eq!(batches[1].len(), 3);
        assert_eq!(batches[2].len(), 1);
        assert_partition(&batches, 7);
    }

    #[test]
    fn test_splits_by_token_limit() {
        // 每个单元 100 字符 → 25 token，上限 30 → 每批一个
        let text = "x".repeat(100);
        let units = make_units(&[&text, &text, &text]);
        let batches = batch_units(&units, 10, 30);
        assert_eq!(batches.len(), 3);
        assert_partition(&batches, 3);
    }

    #[test]
    fn test_oversized_unit_forms_singleton_batch() {
        let big = "x".repeat(1000); // 250 token，远超上限
        let small = "y".repeat(8);
        let units = make_units(&[&small, &big, &small]);
        let batches = batch_units(&units, 10, 50);
        assert_eq!(batches.len(), 3);
        assert_eq!(batches[1].len(), 1);
        assert!(batches[1].estimated_tokens > 50);
        assert_partition(&batches, 3);
    }

    #[test]
    fn test_empty_input() {
        let batches = batch_units(&[], 3, 20_000);
        assert!(batches.is_empty());
    }

    #[test]
    fn test_estimate_tokens() {
        assert_eq!(estimate_tokens(""), 0);
        assert_eq!(estimate_tokens(&"a".repeat(100)), 25);
        assert_eq!(estimate_tokens("abc"), 1);
    }

    #[test]
    fn test_partition_holds_for_various_limits() {
        let texts: Vec<String> = (0..17).map(|i| "z".repeat(i * 7 + 1)).collect();
        let refs: Vec<&str> = texts.iter().map(|s| s.as_str()).collect();
        let units = make_units(&refs);
        for batch_size in [1, 2, 3, 5, 17, 100] {
            for max_tokens in [1, 10, 100, 20_000] {
                let batches = batch_units(&units, batch_size, max_tokens);
                assert_partition(&batches, units.len());
                for batch in &batches {
                    assert!(batch.len() <= batch_size);
                }
            }
        }
    }
}
