//! 边界标记 - 流程层
//!
//! 每个单元在传输时用一对注释形式的标记行包住，标记携带单元的
//! 全局 index（单调递增，整个文档内唯一）。提取译文时只信任
//! 标记：逐个定位每个期望的标记对，数量或位置不符就判失败，
//! 绝不做"尽力而为"的内容猜测。

use crate::models::document::ContentUnit;
use std::fmt;

const TAG_PREFIX: &str = "% ===== UNIT ";

/// 单元起始标记行
pub fn begin_tag(index: usize) -> String {
    format!("{}{} BEGIN =====", TAG_PREFIX, index)
}

/// 单元结束标记行
pub fn end_tag(index: usize) -> String {
    format!("{}{} END =====", TAG_PREFIX, index)
}

/// 构建一个批次的传输载荷
///
/// 明确告知期望的单元数量，并要求逐字保留标记行。
pub fn build_payload(units: &[ContentUnit]) -> String {
    let n = units.len();
    let mut payload = format!(
        "Translate the following {n} LaTeX Beamer content unit(s) from English into Chinese.\n\
         This batch contains EXACTLY {n} unit(s). Each unit is wrapped between a BEGIN marker \
         line and an END marker line.\n\
         Return ALL {n} unit(s). Reproduce every marker line EXACTLY as given, and translate \
         only the text between the markers.\n\n<UNITS>\n"
    );
    for unit in units {
        payload.push_str(&begin_tag(unit.index));
        payload.push('\n');
        payload.push_str(&unit.stripped_text);
        payload.push('\n');
        payload.push_str(&end_tag(unit.index));
        payload.push('\n');
    }
    payload.push_str("</UNITS>");
    payload
}

/// 标记校验失败（正常控制流，不是错误类型）
///
/// 触发上层的拆分或重试；只有预算耗尽才升级为真正的错误。
#[derive(Debug, Clone)]
pub struct TagMismatch {
    /// 期望的单元数量
    pub expected: usize,
    /// 实际完整恢复出的 (标记, 文本) 对数量
    pub actual: usize,
    /// 失败原因描述
    pub detail: String,
}

impl fmt::Display for TagMismatch {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "期望 {} 个单元，恢复出 {} 个: {}",
            self.expected, self.actual, self.detail
        )
    }
}

/// 从响应文本中按标记严格提取译文
///
/// 对批内每个单元：起始和结束标记必须各出现恰好一次，且顺序正确；
/// 响应中的标记总数还必须等于 2×单元数（多出的标记意味着内容被
/// 复制或编造）。任何一条不满足都返回 `TagMismatch`。
///
/// # 返回
/// 成功时返回与 `units` 等长、同序的译文列表。响应中单元的顺序
/// 无关紧要——只按标记定位，输出始终按输入顺序排列。
pub fn extract_units(response: &str, units: &[ContentUnit]) -> Result<Vec<String>, TagMismatch> {
    let expected = units.len();
    let mut texts = Vec::with_capacity(expected);
    let mut recovered = 0usize;
    let mut problems: Vec<String> = Vec::new();

    for unit in units {
        let begin = begin_tag(unit.index);
        let end = end_tag(unit.index);
        let begin_hits: Vec<usize> = response.match_indices(&begin).map(|(i, _)| i).collect();
        let end_hits: Vec<usize> = response.match_indices(&end).map(|(i, _)| i).collect();

        match (begin_hits.as_slice(), end_hits.as_slice()) {
            ([b], [e]) if b < e => {
                recovered += 1;
                let body = &response[b + begin.len()..*e];
                texts.push(trim_marker_padding(body).to_string());
            }
            ([], _) | (_, []) => {
                problems.push(format!("单元 {} 的标记缺失", unit.index));
            }
            ([b], [e]) => {
                debug_assert!(b >= e);
                problems.push(format!("单元 {} 的标记顺序颠倒", unit.index));
            }
            _ => {
                problems.push(format!("单元 {} 的标记重复出现", unit.index));
            }
        }
    }

    let marker_total = response.matches(TAG_PREFIX).count();
    if problems.is_empty() && marker_total != expected * 2 {
        problems.push(format!(
            "响应中出现 {} 个标记行，期望 {} 个",
            marker_total,
            expected * 2
        ));
    }

    if problems.is_empty() {
        Ok(texts)
    } else {
        Err(TagMismatch {
            expected,
            actual: recovered,
            detail: problems.join("; "),
        })
    }
}

/// 去掉标记行贴着译文的那一个换行（标记独占一行导致的）
fn trim_marker_padding(text: &str) -> &str {
    let text = text
        .strip_prefix("\r\n")
        .or_else(|| text.strip_prefix('\n'))
        .unwrap_or(text);
    match text.strip_suffix('\n') {
        Some(t) => t.strip_suffix('\r').unwrap_or(t),
        None => text,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::document::UnitKind;

    fn make_units(start_index: usize, texts: &[&str]) -> Vec<ContentUnit> {
        texts
            .iter()
            .enumerate()
            .map(|(i, t)| {
                ContentUnit::new(
                    UnitKind::Frame,
                    start_index + i,
                    t.to_string(),
                    t.to_string(),
                )
            })
            .collect()
    }

    #[test]
    fn test_payload_contains_tags_and_count() {
        let units = make_units(5, &["aaa", "bbb"]);
        let payload = build_payload(&units);
        assert!(payload.contains("EXACTLY 2 unit(s)"));
        assert!(payload.contains(&begin_tag(5)));
        assert!(payload.contains(&end_tag(5)));
        assert!(payload.contains(&begin_tag(6)));
        assert!(payload.contains("aaa"));
        assert!(payload.contains("bbb"));
    }

    #[test]
    fn test_extract_roundtrip_from_payload() {
        let units = make_units(0, &["第一段", "第二段", "第三段"]);
        let payload = build_payload(&units);
        // 原样返回载荷就是一份合法响应
        let texts = extract_units(&payload, &units).unwrap();
        assert_eq!(texts, vec!["第一段", "第二段", "第三段"]);
    }

    #[test]
    fn test_extract_tolerates_reordered_units() {
        let units = make_units(3, &["one", "two"]);
        let response = format!(
            "{}\n乙\n{}\n{}\n甲\n{}",
            begin_tag(4),
            end_tag(4),
            begin_tag(3),
            end_tag(3)
        );
        let texts = extract_units(&response, &units).unwrap();
        // 输出顺序跟随输入的 index 顺序，而不是响应顺序
        assert_eq!(texts, vec!["甲", "乙"]);
    }

    #[test]
    fn test_extract_missing_unit_is_mismatch() {
        let units = make_units(0, &["a", "b", "c"]);
        let response = format!(
            "{}\nA\n{}\n{}\nC\n{}",
            begin_tag(0),
            end_tag(0),
            begin_tag(2),
            end_tag(2)
        );
        let mismatch = extract_units(&response, &units).unwrap_err();
        assert_eq!(mismatch.expected, 3);
        assert_eq!(mismatch.actual, 2);
        assert!(mismatch.detail.contains("单元 1"));
    }

    #[test]
    fn test_extract_duplicate_tag_is_mismatch() {
        let units = make_units(0, &["a"]);
        let response = format!(
            "{}\nA\n{}\n{}\nA2\n{}",
            begin_tag(0),
            end_tag(0),
            begin_tag(0),
            end_tag(0)
        );
        let mismatch = extract_units(&response, &units).unwrap_err();
        assert!(mismatch.detail.contains("重复"));
    }

    #[test]
    fn test_extract_extra_fabricated_unit_is_mismatch() {
        let units = make_units(0, &["a"]);
        let response = format!(
            "{}\nA\n{}\n{}\n幻觉\n{}",
            begin_tag(0),
            end_tag(0),
            begin_tag(7),
            end_tag(7)
        );
        let mismatch = extract_units(&response, &units).unwrap_err();
        assert!(mismatch.detail.contains("标记行"));
    }

    #[test]
    fn test_extract_garbage_response_is_mismatch() {
        let units = make_units(0, &["a", "b"]);
        let mismatch = extract_units("抱歉，我无法完成这个任务。", &units).unwrap_err();
        assert_eq!(mismatch.actual, 0);
    }

    #[test]
    fn test_index_tags_do_not_collide_on_prefix() {
        // 单元 1 的标记不能匹配到单元 12 的标记里
        let units = make_units(1, &["x"]);
        let response = format!("{}\n十二\n{}", begin_tag(12), end_tag(12));
        assert!(extract_units(&response, &units).is_err());
    }

    #[test]
    fn test_trim_marker_padding_keeps_indentation() {
        assert_eq!(trim_marker_padding("\n  indented\n"), "  indented");
        assert_eq!(trim_marker_padding("bare"), "bare");
        assert_eq!(trim_marker_padding("\r\nwin\r\n"), "win");
    }
}
