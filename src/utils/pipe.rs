use crate::Result;
use crate::error::ResterError;
use regex::Regex;
use std::io::ErrorKind;
use std::process::Stdio;
use std::sync::OnceLock;
use tokio::io::AsyncWriteExt;
use tokio::process::Command;

/// 按空白切分命令，单双引号内的内容作为一个参数（引号本身去掉）
pub fn tokenize_command(command: &str) -> Vec<String> {
    static TOKEN_REGEX: OnceLock<Regex> = OnceLock::new();
    let re = TOKEN_REGEX.get_or_init(|| Regex::new(r#"([^'"\s]+)|'([^']+)'|"([^"]+)""#).unwrap());

    re.captures_iter(command)
        .filter_map(|caps| {
            caps.get(1)
                .or_else(|| caps.get(2))
                .or_else(|| caps.get(3))
                .map(|m| m.as_str().to_string())
        })
        .collect()
}

/// 依次将 `input` 送入 `|` 分隔的各个命令，返回最后一个命令的标准输出
pub async fn pipe_through(commands: &str, input: &[u8]) -> Result<Vec<u8>> {
    let mut data = input.to_vec();

    for command in commands.split('|') {
        let tokens = tokenize_command(command);
        let Some((program, args)) = tokens.split_first() else {
            return Err(ResterError::Other(format!(
                "Empty command in pipe '{}'",
                commands
            )));
        };

        tracing::debug!("Piping {} bytes through {} {:?}", data.len(), program, args);

        let mut child = Command::new(program)
            .args(args)
            .stdin(Stdio::piped())
            .stdout(Stdio::piped())
            .spawn()
            .map_err(|e| ResterError::Other(format!("Failed to run '{}': {}", program, e)))?;

        let mut stdin = child
            .stdin
            .take()
            .ok_or_else(|| ResterError::Other(format!("No stdin for '{}'", program)))?;

        // 边写边读，避免输出缓冲区写满导致死锁
        let writer = tokio::spawn(async move {
            stdin.write_all(&data).await?;
            stdin.shutdown().await
        });

        let output = child.wait_with_output().await?;
        match writer.await {
            Ok(Err(e)) if e.kind() != ErrorKind::BrokenPipe => return Err(e.into()),
            Err(e) => return Err(ResterError::Other(format!("Pipe writer failed: {}", e))),
            _ => {}
        }

        if !output.status.success() {
            tracing::warn!("'{}' exited with {}", program, output.status);
        }
        data = output.stdout;
    }

    Ok(data)
}
