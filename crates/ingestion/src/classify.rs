//! 游戏原始事件分类
//!
//! 将服务器的聊天分类 / 连接状态变化映射为中继事件类型。

use std::fmt;
use std::str::FromStr;

use contracts::{Channel, EventKind};
use serde::{Deserialize, Serialize};

/// 服务器侧的聊天分类
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ChatClassification {
    Global,
    Team,
    WhisperFrom,
    WhisperTo,
    Region,
    Local,
    System,
    Lore,
    /// 服务器新增但本地未知的分类
    #[serde(other)]
    Unknown,
}

impl ChatClassification {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Global => "Global",
            Self::Team => "Team",
            Self::WhisperFrom => "WhisperFrom",
            Self::WhisperTo => "WhisperTo",
            Self::Region => "Region",
            Self::Local => "Local",
            Self::System => "System",
            Self::Lore => "Lore",
            Self::Unknown => "Unknown",
        }
    }
}

impl fmt::Display for ChatClassification {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ChatClassification {
    type Err = std::convert::Infallible;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Ok(match s {
            "Global" => Self::Global,
            "Team" => Self::Team,
            "WhisperFrom" => Self::WhisperFrom,
            "WhisperTo" => Self::WhisperTo,
            "Region" => Self::Region,
            "Local" => Self::Local,
            "System" => Self::System,
            "Lore" => Self::Lore,
            _ => Self::Unknown,
        })
    }
}

/// 聊天分类 -> 频道
///
/// Region 与 Local 合并为 local；System、Lore 及未知分类返回 None (丢弃)。
pub fn map_channel(classification: ChatClassification) -> Option<Channel> {
    match classification {
        ChatClassification::Global => Some(Channel::Global),
        ChatClassification::Team => Some(Channel::Clan),
        ChatClassification::WhisperFrom | ChatClassification::WhisperTo => Some(Channel::Whisper),
        ChatClassification::Region | ChatClassification::Local => Some(Channel::Local),
        ChatClassification::System | ChatClassification::Lore | ChatClassification::Unknown => {
            None
        }
    }
}

/// 连接状态变化方向
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ConnectionChange {
    Connected,
    Disconnected,
}

/// 连接状态转换
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ConnectionTransition {
    pub change: ConnectionChange,
    /// 服务器启动时从存档恢复
    pub from_persistence: bool,
}

/// 连接状态转换 -> 事件类型；存档恢复的转换返回 None
pub fn map_connection(transition: ConnectionTransition) -> Option<EventKind> {
    if transition.from_persistence {
        return None;
    }
    Some(match transition.change {
        ConnectionChange::Connected => EventKind::Connect,
        ConnectionChange::Disconnected => EventKind::Disconnect,
    })
}
