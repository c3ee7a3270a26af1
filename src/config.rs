use crate::error::AppResult;
use serde::Deserialize;
use std::path::Path;

/// 默认配置文件名
pub const CONFIG_FILE: &str = "beamer-translate.toml";

/// 程序配置
#[derive(Clone, Debug, Deserialize)]
#[serde(default)]
pub struct Config {
    /// 每批最多包含的单元数量
    pub batch_size: usize,
    /// 每批的软性 token 上限（按 stripped 文本估算）
    pub max_tokens: usize,
    /// 同时处理的批次数量
    pub max_concurrent_batches: usize,
    /// 单个单元的重试次数上限
    pub max_unit_retries: usize,
    /// 递归拆分的深度上限
    pub max_split_depth: usize,
    /// 单次 API 请求的超时时间（秒）
    pub request_timeout_secs: u64,
    /// 是否显示详细日志
    pub verbose_logging: bool,
    /// 翻译失败的单元保留原文而不是中止整个任务
    pub best_effort: bool,
    /// 无法翻译的单元记录文件
    pub warn_file: String,
    // --- LLM 配置 ---
    pub llm_api_key: String,
    pub llm_api_base_url: String,
    pub llm_model_name: String,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            batch_size: 3,
            max_tokens: 20_000,
            max_concurrent_batches: 4,
            max_unit_retries: 2,
            max_split_depth: 6,
            request_timeout_secs: 120,
            verbose_logging: false,
            best_effort: false,
            warn_file: "warn.txt".to_string(),
            llm_api_key: String::new(),
            llm_api_base_url: "https://api.openai.com/v1".to_string(),
            llm_model_name: "gemini-2.5-pro".to_string(),
        }
    }
}

impl Config {
    /// 从环境变量加载配置（缺失的字段使用默认值）
    pub fn from_env() -> Self {
        Self::default().overlay_env()
    }

    /// 从 TOML 配置文件加载（缺失的字段使用默认值）
    pub fn from_file(path: &Path) -> AppResult<Self> {
        let content = std::fs::read_to_string(path)
            .map_err(|e| crate::error::AppError::file_read_failed(path.display().to_string(), e))?;
        let config: Config = toml::from_str(&content)?;
        Ok(config)
    }

    /// 加载配置：先找配置文件，再用环境变量覆盖
    pub fn load() -> Self {
        let base = if Path::new(CONFIG_FILE).exists() {
            match Self::from_file(Path::new(CONFIG_FILE)) {
                Ok(config) => {
                    tracing::info!("已加载配置文件: {}", CONFIG_FILE);
                    config
                }
                Err(e) => {
                    tracing::warn!("配置文件加载失败，使用默认配置: {}", e);
                    Self::default()
                }
            }
        } else {
            Self::default()
        };
        base.overlay_env()
    }

    /// 用环境变量覆盖已有配置
    fn overlay_env(self) -> Self {
        Self {
            batch_size: std::env::var("BATCH_SIZE").ok().and_then(|v| v.parse().ok()).unwrap_or(self.batch_size),
            max_tokens: std::env::var("MAX_TOKENS").ok().and_then(|v| v.parse().ok()).unwrap_or(self.max_tokens),
            max_concurrent_batches: std::env::var("MAX_CONCURRENT_BATCHES").ok().and_then(|v| v.parse().ok()).unwrap_or(self.max_concurrent_batches),
            max_unit_retries: std::env::var("MAX_UNIT_RETRIES").ok().and_then(|v| v.parse().ok()).unwrap_or(self.max_unit_retries),
            max_split_depth: std::env::var("MAX_SPLIT_DEPTH").ok().and_then(|v| v.parse().ok()).unwrap_or(self.max_split_depth),
            request_timeout_secs: std::env::var("REQUEST_TIMEOUT_SECS").ok().and_then(|v| v.parse().ok()).unwrap_or(self.request_timeout_secs),
            verbose_logging: std::env::var("VERBOSE_LOGGING").ok().and_then(|v| v.parse().ok()).unwrap_or(self.verbose_logging),
            best_effort: std::env::var("BEST_EFFORT").ok().and_then(|v| v.parse().ok()).unwrap_or(self.best_effort),
            warn_file: std::env::var("WARN_FILE").unwrap_or(self.warn_file),
            llm_api_key: std::env::var("LLM_API_KEY").unwrap_or(self.llm_api_key),
            llm_api_base_url: std::env::var("LLM_API_BASE_URL").unwrap_or(self.llm_api_base_url),
            llm_model_name: std::env::var("LLM_MODEL_NAME").unwrap_or(self.llm_model_name),
        }
    }
}
