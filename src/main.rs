use std::path::PathBuf;
use std::process::ExitCode;

use clap::Parser;
use tracing::error;

use beamer_translate::config::Config;
use beamer_translate::logger;
use beamer_translate::orchestrator::{App, TranslateJob};

/// 使用 LLM 把 LaTeX Beamer 课件从英文翻译为中文
#[derive(Parser)]
#[command(name = "beamer-translate")]
#[command(about = "把 LaTeX Beamer 课件从英文翻译为中文")]
#[command(version)]
struct Cli {
    /// 输入 .tex 文件路径
    input: PathBuf,

    /// 输出文件路径（默认: <input>-zh.tex）
    #[arg(short, long)]
    output: Option<PathBuf>,

    /// LLM 模型名称
    #[arg(long)]
    model: Option<String>,

    /// 每批最多包含的单元数量
    #[arg(long)]
    batch_size: Option<usize>,

    /// 每批的软性 token 上限
    #[arg(long)]
    max_tokens: Option<usize>,

    /// 外部文档模板（整体替换导言区与结尾）
    #[arg(long)]
    template: Option<PathBuf>,

    /// 翻译失败的单元保留原文而不是中止
    #[arg(long)]
    best_effort: bool,

    /// 只解析和分批，不调用 API
    #[arg(long)]
    dry_run: bool,

    /// 显示详细日志
    #[arg(short, long)]
    verbose: bool,
}

impl Cli {
    /// 配置文件/环境变量打底，命令行参数覆盖
    fn build_config(&self) -> Config {
        let mut config = Config::load();
        if let Some(model) = &self.model {
            config.llm_model_name = model.clone();
        }
        if let Some(batch_size) = self.batch_size {
            config.batch_size = batch_size;
        }
        if let Some(max_tokens) = self.max_tokens {
            config.max_tokens = max_tokens;
        }
        if self.best_effort {
            config.best_effort = true;
        }
        if self.verbose {
            config.verbose_logging = true;
        }
        config
    }
}

#[tokio::main]
async fn main() -> ExitCode {
    let cli = Cli::parse();

    // 初始化日志
    logger::init(cli.verbose);

    // 加载配置
    let config = cli.build_config();

    let job = TranslateJob {
        input: cli.input.clone(),
        output: cli.output.clone(),
        template: cli.template.clone(),
        dry_run: cli.dry_run,
    };

    // 运行应用
    match App::new(config).run(&job).await {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            error!("❌ 翻译失败: {}", e);
            ExitCode::FAILURE
        }
    }
}
