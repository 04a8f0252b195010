mod cli;

use anyhow::Result;
use clap::Parser;
use cli::{Cli, Commands};

#[tokio::main]
async fn main() -> Result<()> {
    // 初始化日志系统
    rester::logger::init_logger();

    let cli = Cli::parse();
    match cli.command {
        Some(Commands::History { limit }) => rester::history::printer::list_history(limit)?,
        None => cli::run(cli.request).await?,
    }
    Ok(())
}
