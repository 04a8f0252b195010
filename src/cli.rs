use std::io::{IsTerminal, Read, Write};
use std::path::{Path, PathBuf};
use std::time::Instant;

use anyhow::{Context, bail};
use clap::{Args, Parser, Subcommand};
use rester::Client;
use rester::config::{ConfigLoader, Configuration};
use rester::history::recorder::record_transaction;
use rester::parser::directive::parse_duration;
use rester::utils::{OutputFormatter, OutputMode, pipe_through};

pub type Result<T> = std::result::Result<T, anyhow::Error>;

#[derive(Parser)]
#[command(author, version, about, long_about = None)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Option<Commands>,

    #[command(flatten)]
    pub request: RequestArgs,
}

#[derive(Subcommand)]
pub enum Commands {
    /// 查看最近的请求历史
    History {
        /// 显示的条数
        #[arg(short = 'n', long, default_value_t = 10)]
        limit: usize,
    },
}

#[derive(Args, Debug, Default)]
pub struct RequestArgs {
    /// 请求文件路径或请求文本；省略或 `-` 时从 stdin 读取
    pub request: Option<String>,

    /// 输出状态行与响应 headers
    #[arg(short, long)]
    pub include: bool,

    /// 输出每一跳的请求与响应报文
    #[arg(short, long)]
    pub verbose: bool,

    /// 将响应体依次送入 `|` 分隔的命令
    #[arg(long, value_name = "CMDS")]
    pub pipe: Option<String>,

    /// 不跟随重定向
    #[arg(long)]
    pub no_follow: bool,

    /// 最多跟随的重定向次数
    #[arg(long, value_name = "N")]
    pub redirect_limit: Option<u64>,

    /// 校验 HTTPS 证书
    #[arg(long)]
    pub verify: bool,

    /// 单跳超时，例如 500ms、5s、2m
    #[arg(long, value_name = "DURATION")]
    pub timeout: Option<String>,

    /// 配置文件路径（默认查找 rester.toml）
    #[arg(short, long, value_name = "PATH")]
    pub config: Option<PathBuf>,

    /// 关闭彩色输出
    #[arg(long)]
    pub no_color: bool,

    /// 不记录历史
    #[arg(long)]
    pub no_history: bool,
}

impl RequestArgs {
    fn output_mode(&self) -> OutputMode {
        if self.verbose {
            OutputMode::Verbose
        } else if self.include {
            OutputMode::Include
        } else {
            OutputMode::Body
        }
    }

    /// 配置文件 < 命令行参数
    fn configuration(&self) -> Result<Configuration> {
        let mut configuration = match &self.config {
            Some(path) => ConfigLoader::load_from_path(path)?,
            None => ConfigLoader::find_and_load().unwrap_or_default(),
        };

        if self.no_follow {
            configuration.insert(Configuration::FOLLOW_REDIRECTS, false);
        }
        if let Some(limit) = self.redirect_limit {
            configuration.insert(Configuration::REDIRECT_LIMIT, limit);
        }
        if self.verify {
            configuration.insert(Configuration::VERIFY_CERTIFICATES, true);
        }
        if let Some(timeout) = &self.timeout {
            parse_duration(timeout)?;
            configuration.insert(Configuration::TIMEOUT, timeout.as_str());
        }

        Ok(configuration)
    }
}

/// 读取请求文本：文件、字面文本或 stdin
fn read_request(request: Option<&str>) -> Result<String> {
    match request {
        None | Some("-") => {
            let mut text = String::new();
            std::io::stdin()
                .read_to_string(&mut text)
                .context("Failed to read request from stdin")?;
            Ok(text)
        }
        Some(request) => {
            let path = Path::new(request);
            if path.is_file() {
                std::fs::read_to_string(path)
                    .with_context(|| format!("Failed to read request file {}", path.display()))
            } else if path.exists() {
                bail!("Request path is not a file: {}", path.display())
            } else {
                Ok(request.to_string())
            }
        }
    }
}

/// 发送一次请求并输出结果
pub async fn run(args: RequestArgs) -> Result<()> {
    if args.no_color {
        colored::control::set_override(false);
    }

    let configuration = args.configuration()?;
    let text = read_request(args.request.as_deref())?;

    let client = Client::with_configuration(configuration);
    let mut transaction = client.request(&text)?;

    let start = Instant::now();
    let result = transaction.send().await;
    let duration = start.elapsed();

    if !args.no_history {
        record_transaction(&transaction, &result, duration);
    }

    let color = !args.no_color && std::io::stdout().is_terminal();
    let formatter = OutputFormatter::new(args.output_mode()).with_color(color);
    let mut stdout = std::io::stdout().lock();

    if let Err(e) = result {
        if formatter.mode() == OutputMode::Verbose {
            write!(stdout, "{}", formatter.preamble(&transaction))?;
            stdout.flush()?;
        }
        return Err(e.into());
    }

    match &args.pipe {
        Some(commands) => {
            write!(stdout, "{}", formatter.preamble(&transaction))?;
            let body = transaction
                .last_response()
                .map(|response| response.body.as_bytes())
                .unwrap_or_default();
            let output = pipe_through(commands, body).await?;
            stdout.write_all(&output)?;
        }
        None => write!(stdout, "{}", formatter.format(&transaction))?,
    }
    stdout.flush()?;

    Ok(())
}
