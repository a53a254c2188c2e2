//! 后台任务管理
//!
//! 统一管理后台任务的注册、启动和关闭。

use std::fmt;
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;

/// 任务类型
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TaskKind {
    /// 长期后台工作者
    Worker,
    /// 定时任务
    Periodic,
}

impl fmt::Display for TaskKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TaskKind::Worker => write!(f, "Worker"),
            TaskKind::Periodic => write!(f, "Periodic"),
        }
    }
}

/// 已注册的后台任务
struct RegisteredTask {
    name: &'static str,
    kind: TaskKind,
    handle: JoinHandle<()>,
}

/// 后台任务管理器
pub struct BackgroundTasks {
    tasks: Vec<RegisteredTask>,
    shutdown: CancellationToken,
}

impl BackgroundTasks {
    pub fn new() -> Self {
        Self {
            tasks: Vec::new(),
            shutdown: CancellationToken::new(),
        }
    }

    /// 获取取消令牌（任务内部监听 shutdown 信号）
    pub fn shutdown_token(&self) -> CancellationToken {
        self.shutdown.clone()
    }

    /// 注册并启动一个后台任务
    pub fn spawn<F>(&mut self, name: &'static str, kind: TaskKind, future: F)
    where
        F: std::future::Future<Output = ()> + Send + 'static,
    {
        tracing::info!(task = name, kind = %kind, "Background task started");
        let handle = tokio::spawn(future);
        self.tasks.push(RegisteredTask { name, kind, handle });
    }

    /// Graceful shutdown: 发出取消信号并等待所有任务退出
    pub async fn shutdown(self) {
        self.shutdown.cancel();
        for task in self.tasks {
            match tokio::time::timeout(std::time::Duration::from_secs(10), task.handle).await {
                Ok(Ok(())) => {
                    tracing::info!(task = task.name, "Background task stopped");
                }
                Ok(Err(e)) => {
                    tracing::error!(task = task.name, "Background task panicked: {e}");
                }
                Err(_) => {
                    tracing::warn!(task = task.name, kind = %task.kind, "Background task shutdown timed out");
                }
            }
        }
    }
}

impl Default for BackgroundTasks {
    fn default() -> Self {
        Self::new()
    }
}
