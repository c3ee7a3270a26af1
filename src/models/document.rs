//! Beamer 文档数据模型
//!
//! 解析器一次性构建，之后只读；唯一的例外是翻译成功后
//! 对 `translated_text` 的单次写入。

/// 内容单元类型
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum UnitKind {
    /// 完整的 frame 环境（\begin{frame}...\end{frame}，可嵌套）
    Frame,
    /// 单行的 \section 声明
    Section,
    /// 单行的 \subsection 声明
    Subsection,
}

impl UnitKind {
    /// 获取标准名称
    pub fn name(self) -> &'static str {
        match self {
            UnitKind::Frame => "frame",
            UnitKind::Section => "section",
            UnitKind::Subsection => "subsection",
        }
    }
}

impl std::fmt::Display for UnitKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.name())
    }
}

/// 内容单元
///
/// 一个可翻译的原子结构元素：一个完整的 frame 块，
/// 或一行 section/subsection 声明。
#[derive(Debug, Clone)]
pub struct ContentUnit {
    /// 单元类型（创建后不可变）
    pub kind: UnitKind,
    /// 在文档中的位置（从 0 开始，连续递增，作为稳定标识）
    pub index: usize,
    /// 原始文本（逐字节保留，包含内部注释）
    pub raw_text: String,
    /// 去掉整行注释后的文本（发送给翻译服务的内容）
    pub stripped_text: String,
    /// 翻译后的文本（校验通过后写入一次）
    pub translated_text: Option<String>,
}

impl ContentUnit {
    /// 创建新的内容单元
    pub fn new(kind: UnitKind, index: usize, raw_text: String, stripped_text: String) -> Self {
        Self {
            kind,
            index,
            raw_text,
            stripped_text,
            translated_text: None,
        }
    }

    /// 写入翻译结果
    ///
    /// 每个单元只允许写入一次；重复写入说明恢复流程出现了
    /// 范围重叠，属于程序缺陷。
    pub fn set_translated(&mut self, text: String) {
        debug_assert!(
            self.translated_text.is_none(),
            "单元 {} 的翻译结果被重复写入",
            self.index
        );
        self.translated_text = Some(text);
    }

    /// 重组时使用的文本：优先翻译结果，否则原文
    pub fn output_text(&self) -> &str {
        self.translated_text.as_deref().unwrap_or(&self.raw_text)
    }
}

/// 文档正文片段
///
/// 正文是"透传文本"和"内容单元"的交替序列，按顺序拼接
/// 即可逐字节还原正文。
#[derive(Debug, Clone)]
pub enum BodyPart {
    /// 不参与翻译的原样文本
    Passthrough(String),
    /// 指向 `units` 中某个单元（按下标引用）
    Unit(usize),
}

/// 外部文档模板
///
/// 从一个完整的 LaTeX 文档中抽取的头部（到 \begin{document} 为止）
/// 和尾部（从 \end{document} 开始）。
#[derive(Debug, Clone)]
pub struct DocumentTemplate {
    pub header: String,
    pub trailer: String,
}

/// 解析后的 Beamer 文档
#[derive(Debug, Clone)]
pub struct BeamerDocument {
    /// \begin{document} 及之前的全部文本
    pub header: String,
    /// 正文片段序列（覆盖正文的每一个字节）
    pub body_parts: Vec<BodyPart>,
    /// 内容单元序列（文档顺序，index 连续递增）
    pub units: Vec<ContentUnit>,
    /// \end{document} 及之后的全部文本
    pub trailer: String,
    /// 来源文件路径（仅用于日志）
    pub source_path: Option<String>,
}

impl BeamerDocument {
    /// frame 单元数量
    pub fn frame_count(&self) -> usize {
        self.units
            .iter()
            .filter(|u| u.kind == UnitKind::Frame)
            .count()
    }

    /// section/subsection 单元数量
    pub fn heading_count(&self) -> usize {
        self.units.len() - self.frame_count()
    }

    /// 已写入翻译结果的单元数量
    pub fn translated_count(&self) -> usize {
        self.units
            .iter()
            .filter(|u| u.translated_text.is_some())
            .count()
    }

    /// 重组完整文档
    ///
    /// 按顺序拼接头部、正文片段和尾部。每个单元优先使用
    /// `translated_text`，否则回退到原文；提供模板时，模板的
    /// 头部和尾部整体替换文档自身的头部和尾部，单元序列不受影响。
    pub fn reconstruct(&self, template: Option<&DocumentTemplate>) -> String {
        let header = template.map(|t| t.header.as_str()).unwrap_or(&self.header);
        let trailer = template
            .map(|t| t.trailer.as_str())
            .unwrap_or(&self.trailer);

        let mut output = String::with_capacity(header.len() + trailer.len());
        output.push_str(header);
        for part in &self.body_parts {
            match part {
                BodyPart::Passthrough(text) => output.push_str(text),
                BodyPart::Unit(i) => output.push_str(self.units[*i].output_text()),
            }
        }
        output.push_str(trailer);
        output
    }
}
