//! Ingestion 错误类型
//!
//! 每个变体都代表一个在源头被丢弃、不会进入队列的事件。

use thiserror::Error;

/// Ingestion 错误
#[derive(Debug, Error)]
pub enum IngestionError {
    /// 聊天分类无法映射到频道 (System / Lore / 未知)
    #[error("chat classification '{classification}' has no channel")]
    Unclassified {
        /// 原始分类
        classification: String,
    },

    /// 启动时从持久化数据恢复的连接状态
    #[error("connection change for '{player}' restored from persistence")]
    PersistenceRestore {
        /// 玩家名
        player: String,
    },

    /// 无法解析用户
    #[error("user entity could not be resolved")]
    UnresolvedUser,

    /// 事件记录不合法
    #[error(transparent)]
    InvalidRecord(#[from] contracts::ContractError),
}

impl IngestionError {
    /// Short label used as a metric dimension
    pub fn reason(&self) -> &'static str {
        match self {
            Self::Unclassified { .. } => "unclassified",
            Self::PersistenceRestore { .. } => "persistence_restore",
            Self::UnresolvedUser => "unresolved_user",
            Self::InvalidRecord(_) => "invalid_record",
        }
    }
}

/// Ingestion Result 类型别名
pub type Result<T> = std::result::Result<T, IngestionError>;
