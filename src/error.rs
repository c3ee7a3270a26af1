use std::fmt;

/// 应用程序错误类型
#[derive(Debug)]
pub enum AppError {
    /// 文档结构解析错误
    Parse(ParseError),
    /// 文件操作错误
    File(FileError),
    /// LLM 服务错误
    Llm(LlmError),
    /// 翻译恢复错误
    Recovery(RecoveryError),
    /// 其他错误（用于包装第三方库错误）
    Other(String),
}

impl fmt::Display for AppError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            AppError::Parse(e) => write!(f, "解析错误: {}", e),
            AppError::File(e) => write!(f, "文件错误: {}", e),
            AppError::Llm(e) => write!(f, "LLM错误: {}", e),
            AppError::Recovery(e) => write!(f, "恢复错误: {}", e),
            AppError::Other(msg) => write!(f, "错误: {}", msg),
        }
    }
}

impl std::error::Error for AppError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            AppError::Parse(e) => Some(e),
            AppError::File(e) => Some(e),
            AppError::Llm(e) => Some(e),
            AppError::Recovery(e) => Some(e),
            AppError::Other(_) => None,
        }
    }
}

/// 文档结构解析错误
#[derive(Debug)]
pub enum ParseError {
    /// 缺少 \begin{document} 或 \end{document}
    MissingDocumentEnvironment {
        path: Option<String>,
    },
    /// frame 环境未闭合
    UnterminatedFrame {
        line: usize,
    },
    /// 文档中没有任何 frame
    NoFrames {
        path: Option<String>,
    },
    /// 模板文件缺少文档标记
    TemplateInvalid {
        path: String,
    },
}

impl fmt::Display for ParseError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ParseError::MissingDocumentEnvironment { path } => match path {
                Some(p) => write!(
                    f,
                    "缺少 \\begin{{document}} 或 \\end{{document}} (文件: {})",
                    p
                ),
                None => write!(f, "缺少 \\begin{{document}} 或 \\end{{document}}"),
            },
            ParseError::UnterminatedFrame { line } => {
                write!(
                    f,
                    "第 {} 行的 \\begin{{frame}} 没有匹配的 \\end{{frame}}",
                    line
                )
            }
            ParseError::NoFrames { path } => match path {
                Some(p) => write!(f, "没有找到任何 \\begin{{frame}} 块 (文件: {})", p),
                None => write!(f, "没有找到任何 \\begin{{frame}} 块"),
            },
            ParseError::TemplateInvalid { path } => {
                write!(
                    f,
                    "模板必须包含 \\begin{{document}} 和 \\end{{document}} (文件: {})",
                    path
                )
            }
        }
    }
}

impl std::error::Error for ParseError {}

/// 文件操作错误
#[derive(Debug)]
pub enum FileError {
    /// 文件不存在
    NotFound {
        path: String,
    },
    /// 读取文件失败
    ReadFailed {
        path: String,
        source: Box<dyn std::error::Error + Send + Sync>,
    },
    /// 写入文件失败
    WriteFailed {
        path: String,
        source: Box<dyn std::error::Error + Send + Sync>,
    },
    /// TOML 解析失败
    TomlParseFailed {
        path: String,
        source: Box<dyn std::error::Error + Send + Sync>,
    },
}

impl fmt::Display for FileError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            FileError::NotFound { path } => write!(f, "文件不存在: {}", path),
            FileError::ReadFailed { path, source } => {
                write!(f, "读取文件失败 ({}): {}", path, source)
            }
            FileError::WriteFailed { path, source } => {
                write!(f, "写入文件失败 ({}): {}", path, source)
            }
            FileError::TomlParseFailed { path, source } => {
                write!(f, "TOML解析失败 ({}): {}", path, source)
            }
        }
    }
}

impl std::error::Error for FileError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            FileError::ReadFailed { source, .. }
            | FileError::WriteFailed { source, .. }
            | FileError::TomlParseFailed { source, .. } => {
                Some(source.as_ref() as &(dyn std::error::Error + 'static))
            }
            _ => None,
        }
    }
}

/// LLM 服务错误
#[derive(Debug)]
pub enum LlmError {
    /// 缺少 API Key
    MissingApiKey,
    /// API 调用失败
    ApiCallFailed {
        model: String,
        source: Box<dyn std::error::Error + Send + Sync>,
    },
    /// 返回内容为空
    EmptyContent {
        model: String,
    },
    /// 请求超时
    Timeout {
        model: String,
        secs: u64,
    },
}

impl fmt::Display for LlmError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            LlmError::MissingApiKey => {
                write!(
                    f,
                    "未找到 LLM API Key，请设置 LLM_API_KEY 环境变量或在配置文件中指定"
                )
            }
            LlmError::ApiCallFailed { model, source } => {
                write!(f, "LLM API调用失败 (模型: {}): {}", model, source)
            }
            LlmError::EmptyContent { model } => {
                write!(f, "LLM返回内容为空 (模型: {})", model)
            }
            LlmError::Timeout { model, secs } => {
                write!(f, "LLM请求超时 (模型: {}, 超时: {}秒)", model, secs)
            }
        }
    }
}

impl std::error::Error for LlmError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            LlmError::ApiCallFailed { source, .. } => {
                Some(source.as_ref() as &(dyn std::error::Error + 'static))
            }
            _ => None,
        }
    }
}

/// 翻译恢复错误
///
/// 只用于终止性失败：递归深度耗尽、单元重试耗尽。
/// 普通的"数量不匹配需要拆分"属于正常控制流，不走错误通道。
#[derive(Debug)]
pub enum RecoveryError {
    /// 递归拆分深度超限
    DepthExceeded {
        start_index: usize,
        end_index: usize,
        depth: usize,
    },
    /// 单元在耗尽重试后仍无法翻译
    UnitUnrecoverable {
        index: usize,
        attempts: usize,
    },
}

impl fmt::Display for RecoveryError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            RecoveryError::DepthExceeded {
                start_index,
                end_index,
                depth,
            } => {
                write!(
                    f,
                    "单元范围 [{}, {}] 的拆分深度 {} 超出上限",
                    start_index, end_index, depth
                )
            }
            RecoveryError::UnitUnrecoverable { index, attempts } => {
                write!(f, "单元 {} 在 {} 次尝试后仍无法翻译", index, attempts)
            }
        }
    }
}

impl std::error::Error for RecoveryError {}

// ========== 从常见错误类型转换 ==========
// 注意：不需要手动实现 From<AppError> for anyhow::Error，
// 因为 anyhow 已经为所有实现了 std::error::Error 的类型提供了自动实现

impl From<toml::de::Error> for AppError {
    fn from(err: toml::de::Error) -> Self {
        AppError::File(FileError::TomlParseFailed {
            path: String::new(), // TOML错误通常不包含路径信息
            source: Box::new(err),
        })
    }
}

impl From<std::io::Error> for AppError {
    fn from(err: std::io::Error) -> Self {
        AppError::File(FileError::ReadFailed {
            path: String::new(),
            source: Box::new(err),
        })
    }
}

// ========== 便捷构造函数 ==========

impl AppError {
    /// 创建文件不存在错误
    pub fn file_not_found(path: impl Into<String>) -> Self {
        AppError::File(FileError::NotFound { path: path.into() })
    }

    /// 创建文件读取错误
    pub fn file_read_failed(
        path: impl Into<String>,
        source: impl std::error::Error + Send + Sync + 'static,
    ) -> Self {
        AppError::File(FileError::ReadFailed {
            path: path.into(),
            source: Box::new(source),
        })
    }

    /// 创建文件写入错误
    pub fn file_write_failed(
        path: impl Into<String>,
        source: impl std::error::Error + Send + Sync + 'static,
    ) -> Self {
        AppError::File(FileError::WriteFailed {
            path: path.into(),
            source: Box::new(source),
        })
    }

    /// 创建LLM API调用错误
    pub fn llm_api_failed(
        model: impl Into<String>,
        source: impl std::error::Error + Send + Sync + 'static,
    ) -> Self {
        AppError::Llm(LlmError::ApiCallFailed {
            model: model.into(),
            source: Box::new(source),
        })
    }
}

// ========== Result 类型别名 ==========

/// 应用程序结果类型
pub type AppResult<T> = Result<T, AppError>;
