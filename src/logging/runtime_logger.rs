// src/logging/runtime_logger.rs

use std::collections::HashMap;
use std::io::Write;
use std::path::Path;
use std::sync::{Arc, Mutex};
use std::time::{Duration as StdDuration, SystemTime};
use chrono::Utc;
use serde_json::json;
use tokio::sync::mpsc::{self, Receiver, Sender};
use tokio::task::{self, JoinHandle};
use tokio::time::{self, Duration};
use tracing_appender::rolling::{self, RollingFileAppender};
use tracing_subscriber::fmt::MakeWriter;

const LEVELS: [&str; 5] = ["TRACE", "DEBUG", "INFO", "WARN", "ERROR"];

/// 单条日志消息
pub struct LogEntry {
    pub level: String,
    pub content: String,
}

/// RuntimeLogger 的参数
#[derive(Debug, Clone)]
pub struct RuntimeLoggerOptions {
    pub buffer_size: usize,     // mpsc 通道缓冲区大小
    pub batch_size: usize,      // 每个级别攒够多少条写一次盘
    pub flush_interval: u64,    // 定时刷盘间隔（毫秒）
    pub retention_hours: u64,   // 日志文件保留时长
}

impl Default for RuntimeLoggerOptions {
    fn default() -> Self {
        Self {
            buffer_size: 1000,
            batch_size: 100,
            flush_interval: 1000,
            retention_hours: 72,
        }
    }
}

/// 运行日志管理器（RuntimeLogger）
/// 将运行时日志按日志级别分流到不同的日志文件中，后台批量写盘。
pub struct RuntimeLogger {
    sender: Mutex<Option<Sender<LogEntry>>>,
    writer: Mutex<Option<JoinHandle<()>>>,
    cleaner: JoinHandle<()>,
}

impl RuntimeLogger {
    /// 创建 RuntimeLogger，文件名形如 `{file_prefix}_info.json.<hour>`
    pub fn new(log_dir: impl AsRef<Path>, file_prefix: &str, options: RuntimeLoggerOptions) -> Arc<Self> {
        let log_dir = log_dir.as_ref().to_path_buf();
        let (sender, receiver) = mpsc::channel(options.buffer_size);
        let mut log_files = HashMap::new();
        for level in LEVELS {
            let file_name = format!("{}_{}.json", file_prefix, level.to_lowercase());
            log_files.insert(level.to_string(), Arc::new(rolling::hourly(&log_dir, file_name)));
        }

        let writer = tokio::spawn(Self::background_log_writer(
            log_files,
            receiver,
            options.batch_size,
            options.flush_interval,
        ));

        // 每小时清理一次本记录器产生的过期日志
        let retention = StdDuration::from_secs(options.retention_hours * 3600);
        let file_prefix = format!("{}_", file_prefix);
        let cleaner = tokio::spawn(async move {
            let mut interval = time::interval(Duration::from_secs(3600));
            loop {
                interval.tick().await;
                Self::cleanup_old_logs(&log_dir, &file_prefix, retention).await;
            }
        });

        Arc::new(Self {
            sender: Mutex::new(Some(sender)),
            writer: Mutex::new(Some(writer)),
            cleaner,
        })
    }

    /// 记录运行日志；shutdown 之后的日志被丢弃
    pub async fn log(&self, level: &str, message: &str) {
        let sender = match self.sender.lock() {
            Ok(guard) => guard.clone(),
            Err(_) => None,
        };
        let Some(sender) = sender else {
            return;
        };

        let level = level.to_uppercase();
        let content = json!({
            "timestamp": Utc::now().to_rfc3339(),
            "level": level,
            "message": message,
        })
        .to_string();

        if let Err(e) = sender.send(LogEntry { level, content }).await {
            eprintln!("Failed to send runtime log message: {}", e);
        }
    }

    async fn background_log_writer(
        log_files: HashMap<String, Arc<RollingFileAppender>>,
        mut receiver: Receiver<LogEntry>,
        batch_size: usize,
        flush_interval: u64,
    ) {
        // 每个日志级别独立的缓冲区
        let mut buffers: HashMap<String, Vec<String>> = HashMap::new();
        let mut interval = time::interval(Duration::from_millis(flush_interval));
        loop {
            tokio::select! {
                entry = receiver.recv() => match entry {
                    Some(entry) => {
                        // 未知级别归入 INFO
                        let level = if log_files.contains_key(&entry.level) { entry.level } else { "INFO".to_string() };
                        let buffer = buffers.entry(level.clone()).or_default();
                        buffer.push(entry.content);
                        if buffer.len() >= batch_size {
                            let lines = std::mem::take(buffer);
                            if let Some(appender) = log_files.get(&level) {
                                Self::write_logs_to_disk(appender.clone(), lines).await;
                            }
                        }
                    }
                    None => {
                        Self::flush_all(&log_files, &mut buffers).await;
                        break;
                    }
                },
                _ = interval.tick() => {
                    Self::flush_all(&log_files, &mut buffers).await;
                }
            }
        }
    }

    async fn flush_all(
        log_files: &HashMap<String, Arc<RollingFileAppender>>,
        buffers: &mut HashMap<String, Vec<String>>,
    ) {
        for (level, buffer) in buffers.iter_mut() {
            if buffer.is_empty() {
                continue;
            }
            let lines = std::mem::take(buffer);
            if let Some(appender) = log_files.get(level) {
                Self::write_logs_to_disk(appender.clone(), lines).await;
            }
        }
    }

    async fn write_logs_to_disk(file: Arc<RollingFileAppender>, lines: Vec<String>) {
        let content = lines.join("\n") + "\n";
        let result = task::spawn_blocking(move || {
            let mut writer = file.make_writer();
            writer.write_all(content.as_bytes())
        })
        .await;
        match result {
            Ok(Ok(())) => {}
            Ok(Err(e)) => eprintln!("Failed to write runtime logs: {}", e),
            Err(e) => eprintln!("Runtime log writer task failed: {}", e),
        }
    }

    /// 只删除文件名以 `file_prefix` 开头的过期文件，同目录下的其他日志不受影响
    async fn cleanup_old_logs(log_dir: &Path, file_prefix: &str, retention: StdDuration) {
        let now = SystemTime::now();
        let mut dir = match tokio::fs::read_dir(log_dir).await {
            Ok(dir) => dir,
            Err(e) => {
                eprintln!("Failed to read log directory {}: {}", log_dir.display(), e);
                return;
            }
        };
        while let Ok(Some(entry)) = dir.next_entry().await {
            if !entry.file_name().to_string_lossy().starts_with(file_prefix) {
                continue;
            }
            let path = entry.path();
            let Ok(modified) = entry.metadata().await.and_then(|m| m.modified()) else {
                continue;
            };
            if now.duration_since(modified).unwrap_or_default() > retention {
                if let Err(e) = tokio::fs::remove_file(&path).await {
                    eprintln!("Failed to delete old log file {:?}: {}", path, e);
                }
            }
        }
    }

    /// 关闭通道并等待后台任务把缓冲区写完
    pub async fn shutdown(&self) {
        if let Ok(mut sender) = self.sender.lock() {
            sender.take();
        }
        let writer = match self.writer.lock() {
            Ok(mut guard) => guard.take(),
            Err(_) => None,
        };
        if let Some(writer) = writer {
            if let Err(e) = writer.await {
                eprintln!("Runtime log writer task failed: {}", e);
            }
        }
        self.cleaner.abort();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn read_level(dir: &Path, prefix: &str) -> String {
        std::fs::read_dir(dir)
            .unwrap()
            .filter_map(|e| e.ok())
            .filter(|e| e.file_name().to_string_lossy().starts_with(prefix))
            .map(|e| std::fs::read_to_string(e.path()).unwrap())
            .collect()
    }

    #[tokio::test]
    async fn shutdown_flushes_per_level_files() {
        let dir = std::env::temp_dir().join(format!("promoter-logs-{}", uuid::Uuid::new_v4()));
        let options = RuntimeLoggerOptions { flush_interval: 60_000, ..Default::default() };
        let logger = RuntimeLogger::new(&dir, "runtime", options);

        logger.log("INFO", "allocated jobs_banner").await;
        logger.log("error", "fallback campaign missing").await;
        logger.shutdown().await;
        // shutdown 之后的日志被丢弃
        logger.log("INFO", "late message").await;

        let info = read_level(&dir, "runtime_info");
        assert!(info.contains("allocated jobs_banner"));
        assert!(!info.contains("late message"));
        assert!(read_level(&dir, "runtime_error").contains("fallback campaign missing"));

        let _ = std::fs::remove_dir_all(&dir);
    }

    #[tokio::test]
    async fn cleanup_only_removes_own_expired_files() {
        let dir = std::env::temp_dir().join(format!("promoter-cleanup-{}", uuid::Uuid::new_v4()));
        std::fs::create_dir_all(&dir).unwrap();
        let stale = SystemTime::now() - StdDuration::from_secs(100 * 3600);
        for name in ["runtime_info.json.2024-01-01-00", "promoter_log.json.2024-01-01-00", "runtime_warn.json.fresh"] {
            let file = std::fs::File::create(dir.join(name)).unwrap();
            if !name.ends_with("fresh") {
                file.set_modified(stale).unwrap();
            }
        }

        RuntimeLogger::cleanup_old_logs(&dir, "runtime_", StdDuration::from_secs(72 * 3600)).await;

        assert!(!dir.join("runtime_info.json.2024-01-01-00").exists());
        assert!(dir.join("promoter_log.json.2024-01-01-00").exists());
        assert!(dir.join("runtime_warn.json.fresh").exists());

        let _ = std::fs::remove_dir_all(&dir);
    }
}
