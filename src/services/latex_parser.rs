//! LaTeX Beamer 结构解析器 - 业务能力层
//!
//! 把 .tex 源文本拆成头部、内容单元序列和尾部：
//! - frame 块用深度计数器匹配 \begin{frame}/\end{frame}，支持嵌套
//! - \section / \subsection 只在 frame 之外识别
//! - 整行注释在定位前被掩蔽（保留字节位置），不会误开/误闭一个块
//!
//! 未闭合的 frame 是致命的结构错误，报告其起始行号，绝不猜测边界。

use crate::error::{AppError, AppResult, ParseError};
use crate::models::document::{BeamerDocument, BodyPart, ContentUnit, DocumentTemplate, UnitKind};
use regex::Regex;
use std::path::Path;
use std::sync::OnceLock;
use tracing::info;

const BEGIN_DOCUMENT: &str = "\\begin{document}";
const END_DOCUMENT: &str = "\\end{document}";
const FRAME_OPEN: &str = "\\begin{frame}";
const FRAME_CLOSE: &str = "\\end{frame}";

/// \section{...} / \subsection{...}，支持可选的星号与一层嵌套花括号
fn section_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"\\(?:sub)?section\*?\s*\{(?:[^{}]|\{[^{}]*\})*\}").unwrap())
}

/// 解析 Beamer 源文本
///
/// # 参数
/// - `text`: 完整的 LaTeX 源文本
/// - `source_path`: 来源文件路径（仅用于日志和错误信息）
///
/// # 返回
/// 返回 `BeamerDocument`。头部、正文片段和尾部按顺序拼接可逐字节
/// 还原输入文本。
pub fn parse_beamer_tex(text: &str, source_path: Option<&Path>) -> AppResult<BeamerDocument> {
    let path_string = source_path.map(|p| p.display().to_string());

    let begin_end = match text.find(BEGIN_DOCUMENT) {
        Some(p) => p + BEGIN_DOCUMENT.len(),
        None => {
            return Err(AppError::Parse(ParseError::MissingDocumentEnvironment {
                path: path_string,
            }))
        }
    };
    let end_pos = match text[begin_end..].find(END_DOCUMENT) {
        Some(p) => begin_end + p,
        None => {
            return Err(AppError::Parse(ParseError::MissingDocumentEnvironment {
                path: path_string,
            }))
        }
    };

    let header = &text[..begin_end];
    let body = &text[begin_end..end_pos];
    let trailer = &text[end_pos..];

    // 注释行替换为等长空白，正文字节位置不变，
    // 被注释掉的标记不会参与定位
    let masked = mask_whole_line_comments(body);

    enum NextItem {
        Frame(usize),
        Heading(usize, usize),
    }

    let mut units: Vec<ContentUnit> = Vec::new();
    let mut body_parts: Vec<BodyPart> = Vec::new();
    let mut cursor = 0usize;

    loop {
        let next_frame = masked[cursor..].find(FRAME_OPEN).map(|p| cursor + p);
        let next_heading = section_re()
            .find(&masked[cursor..])
            .map(|m| (cursor + m.start(), cursor + m.end()));

        let next = match (next_frame, next_heading) {
            (None, None) => break,
            (Some(f), None) => NextItem::Frame(f),
            (None, Some((s, e))) => NextItem::Heading(s, e),
            (Some(f), Some((s, e))) => {
                if f < s {
                    NextItem::Frame(f)
                } else {
                    NextItem::Heading(s, e)
                }
            }
        };

        let (start, end, kind) = match next {
            NextItem::Frame(open) => {
                let close = find_matching_frame_close(&masked, open).ok_or_else(|| {
                    AppError::Parse(ParseError::UnterminatedFrame {
                        line: line_of(text, header.len() + open),
                    })
                })?;
                (open, close, UnitKind::Frame)
            }
            NextItem::Heading(s, e) => {
                let kind = if masked[s..].starts_with("\\subsection") {
                    UnitKind::Subsection
                } else {
                    UnitKind::Section
                };
                (s, e, kind)
            }
        };

        if cursor < start {
            body_parts.push(BodyPart::Passthrough(body[cursor..start].to_string()));
        }

        let raw = body[start..end].to_string();
        let stripped = strip_latex_comments(&raw);
        let index = units.len();
        body_parts.push(BodyPart::Unit(index));
        units.push(ContentUnit::new(kind, index, raw, stripped));
        cursor = end;
    }

    if cursor < body.len() {
        body_parts.push(BodyPart::Passthrough(body[cursor..].to_string()));
    }

    let frame_count = units.iter().filter(|u| u.kind == UnitKind::Frame).count();
    if frame_count == 0 {
        return Err(AppError::Parse(ParseError::NoFrames { path: path_string }));
    }

    info!(
        "✓ 解析完成: {} 个 frame, {} 个 section/subsection ({})",
        frame_count,
        units.len() - frame_count,
        path_string.as_deref().unwrap_or("<string>")
    );

    Ok(BeamerDocument {
        header: header.to_string(),
        body_parts,
        units,
        trailer: trailer.to_string(),
        source_path: path_string,
    })
}

/// 从磁盘读取并解析 .tex 文件
pub fn read_and_parse(path: &Path) -> AppResult<BeamerDocument> {
    if !path.exists() {
        return Err(AppError::file_not_found(path.display().to_string()));
    }
    let text = std::fs::read_to_string(path)
        .map_err(|e| AppError::file_read_failed(path.display().to_string(), e))?;
    parse_beamer_tex(&text, Some(path))
}

/// 加载外部文档模板
///
/// 模板是一个完整的 LaTeX 文档；取其 \begin{document} 之前（含标记）
/// 为头部，\end{document} 之后（含标记）为尾部。
///
/// # 返回
/// 文件不存在或缺少文档标记时返回致命错误。
pub fn load_document_template(path: &Path) -> AppResult<DocumentTemplate> {
    if !path.exists() {
        return Err(AppError::file_not_found(path.display().to_string()));
    }
    let text = std::fs::read_to_string(path)
        .map_err(|e| AppError::file_read_failed(path.display().to_string(), e))?;
    let template = extract_template(&text, path)?;
    info!(
        "✓ 已加载文档模板: {} ({} 字符)",
        path.display(),
        text.chars().count()
    );
    Ok(template)
}

fn extract_template(text: &str, path: &Path) -> AppResult<DocumentTemplate> {
    let begin_end = text.find(BEGIN_DOCUMENT).map(|p| p + BEGIN_DOCUMENT.len());
    let end_pos =
        begin_end.and_then(|be| text[be..].find(END_DOCUMENT).map(|p| be + p));

    match (begin_end, end_pos) {
        (Some(b), Some(e)) => Ok(DocumentTemplate {
            header: text[..b].to_string(),
            trailer: text[e..].to_string(),
        }),
        _ => Err(AppError::Parse(ParseError::TemplateInvalid {
            path: path.display().to_string(),
        })),
    }
}

/// 去掉整行注释（首个非空白字符为 % 的行），行尾注释原样保留
pub fn strip_latex_comments(text: &str) -> String {
    let filtered: Vec<&str> = text
        .split('\n')
        .filter(|line| !line.trim_start().starts_with('%'))
        .collect();
    filtered.join("\n")
}

/// 定位与 `open_start` 处的 \begin{frame} 匹配的 \end{frame}
///
/// 深度计数：同名嵌套 open 加一、close 减一，降到零才算闭合。
/// 返回闭合标记之后的字节位置；找不到则返回 None。
fn find_matching_frame_close(masked: &str, open_start: usize) -> Option<usize> {
    let mut depth = 1usize;
    let mut cursor = open_start + FRAME_OPEN.len();

    while depth > 0 {
        let rest = &masked[cursor..];
        let next_close = rest.find(FRAME_CLOSE)?;
        match rest.find(FRAME_OPEN) {
            Some(next_open) if next_open < next_close => {
                depth += 1;
                cursor += next_open + FRAME_OPEN.len();
            }
            _ => {
                depth -= 1;
                cursor += next_close + FRAME_CLOSE.len();
            }
        }
    }
    Some(cursor)
}

/// 把整行注释替换为等长空白，保持每个字节的位置不变
fn mask_whole_line_comments(text: &str) -> String {
    let mut masked = String::with_capacity(text.len());
    for line in text.split_inclusive('\n') {
        let content_len = line.trim_end_matches(['\r', '\n']).len();
        let content = &line[..content_len];
        if content.trim_start().starts_with('%') {
            masked.push_str(&" ".repeat(content.len()));
            masked.push_str(&line[content_len..]);
        } else {
            masked.push_str(line);
        }
    }
    masked
}

/// 字节偏移所在的行号（从 1 开始）
fn line_of(text: &str, offset: usize) -> usize {
    text[..offset].bytes().filter(|b| *b == b'\n').count() + 1
}
