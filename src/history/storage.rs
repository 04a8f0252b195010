use super::model::HistoryEntry;
use crate::Result;
use fs2::FileExt;
use std::fs::{self, File, OpenOptions};
use std::io::{BufRead, BufReader, BufWriter, Seek, SeekFrom, Write};
use std::path::{Path, PathBuf};
use std::sync::OnceLock;

const HISTORY_DIR: &str = ".rester";
const HISTORY_FILE: &str = "history.jsonl";
const HISTORY_DIR_ENV: &str = "RESTER_HISTORY_DIR";
// 超过 20 MB 时压缩
const COMPACTION_THRESHOLD_BYTES: u64 = 20 * 1024 * 1024;
// 压缩后保留的条目数
const MAX_ENTRIES: usize = 10_000;

/// JSONL 历史文件，多进程间用文件锁互斥
pub struct HistoryStorage {
    file_path: PathBuf,
}

impl HistoryStorage {
    /// 当前目录下的 `.rester/history.jsonl`，可由 `RESTER_HISTORY_DIR` 覆盖目录
    pub fn new() -> Self {
        Self::default()
    }

    pub fn new_with_path(path: PathBuf) -> Self {
        Self { file_path: path }
    }

    pub fn path(&self) -> &Path {
        &self.file_path
    }

    fn ensure_dir(&self) -> Result<()> {
        if let Some(parent) = self.file_path.parent()
            && !parent.as_os_str().is_empty()
            && !parent.exists()
        {
            fs::create_dir_all(parent)?;
        }
        Ok(())
    }

    /// 追加一条记录
    ///
    /// 写入期间持有排他锁，保证并发进程的行不会交错。
    pub fn append(&self, entry: &HistoryEntry) -> Result<()> {
        self.ensure_dir()?;
        let json = serde_json::to_string(entry)?;

        let mut file = OpenOptions::new()
            .create(true)
            .append(true)
            .open(&self.file_path)?;

        file.lock_exclusive()?;
        writeln!(file, "{}", json)?;
        // drop 时释放锁
        Ok(())
    }

    /// 全部记录，按时间顺序（必要时先压缩）
    pub fn list(&self) -> Result<Vec<HistoryEntry>> {
        if !self.file_path.exists() {
            return Ok(Vec::new());
        }

        // 在读取时检查大小，追加路径保持简单
        self.compact_if_needed()?;
        self.read_all()
    }

    /// 最后 N 条，从旧到新
    pub fn tail(&self, n: usize) -> Result<Vec<HistoryEntry>> {
        let entries = self.list()?;
        let skip = entries.len().saturating_sub(n);
        Ok(entries.into_iter().skip(skip).collect())
    }

    fn read_all(&self) -> Result<Vec<HistoryEntry>> {
        let file = File::open(&self.file_path)?;
        // 共享锁，避免读到写了一半的行
        file.lock_shared()?;
        Ok(parse_entries(BufReader::new(&file)))
    }

    fn compact_if_needed(&self) -> Result<()> {
        let file = OpenOptions::new()
            .read(true)
            .write(true)
            .open(&self.file_path)?;

        if file.metadata()?.len() < COMPACTION_THRESHOLD_BYTES {
            return Ok(());
        }

        file.lock_exclusive()?;

        // 加锁后再检查一次，其他进程可能刚压缩过
        if file.metadata()?.len() < COMPACTION_THRESHOLD_BYTES {
            return Ok(());
        }

        let entries = parse_entries(BufReader::new(&file));
        if entries.len() <= MAX_ENTRIES {
            return Ok(());
        }

        tracing::info!(
            "Compacting history {} ({} entries)",
            self.file_path.display(),
            entries.len()
        );

        // 在同一句柄上截断重写，锁始终有效
        let mut file = file;
        file.set_len(0)?;
        file.seek(SeekFrom::Start(0))?;

        let mut writer = BufWriter::new(file);
        for entry in &entries[entries.len() - MAX_ENTRIES..] {
            let json = serde_json::to_string(entry)?;
            writeln!(writer, "{}", json)?;
        }
        writer.flush()?;

        Ok(())
    }
}

impl Default for HistoryStorage {
    fn default() -> Self {
        let dir = std::env::var(HISTORY_DIR_ENV).unwrap_or_else(|_| HISTORY_DIR.to_string());
        Self {
            file_path: Path::new(&dir).join(HISTORY_FILE),
        }
    }
}

/// 跳过空行与无法解析的行
fn parse_entries<R: BufRead>(reader: R) -> Vec<HistoryEntry> {
    reader
        .lines()
        .map_while(|line| line.ok())
        .filter(|line| !line.trim().is_empty())
        .filter_map(|line| match serde_json::from_str::<HistoryEntry>(&line) {
            Ok(entry) => Some(entry),
            Err(e) => {
                tracing::debug!("Skipping unreadable history line: {}", e);
                None
            }
        })
        .collect()
}

pub fn get_storage() -> &'static HistoryStorage {
    static STORAGE: OnceLock<HistoryStorage> = OnceLock::new();
    STORAGE.get_or_init(HistoryStorage::new)
}
