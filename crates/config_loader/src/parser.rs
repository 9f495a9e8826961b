//! 配置解析模块
//!
//! relay 配置只有两个表：`[monitor]` 与可选的 `[webhook]`。
//! 解析错误会指出出错所在的表，便于运维直接定位。

use std::path::Path;

use contracts::{ContractError, RelayConfig};

/// 配置文件格式
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConfigFormat {
    /// relay.toml
    Toml,
    /// relay.json
    Json,
}

impl ConfigFormat {
    pub fn from_extension(ext: &str) -> Option<Self> {
        match ext.to_lowercase().as_str() {
            "toml" => Some(Self::Toml),
            "json" => Some(Self::Json),
            _ => None,
        }
    }

    /// 按扩展名识别；无扩展名或未知扩展名均为解析错误
    pub fn from_path(path: &Path) -> Result<Self, ContractError> {
        let ext = path.extension().and_then(|e| e.to_str()).ok_or_else(|| {
            ContractError::config_parse(format!(
                "cannot determine relay config format of {}",
                path.display()
            ))
        })?;

        Self::from_extension(ext).ok_or_else(|| {
            ContractError::config_parse(format!(
                "unsupported config format: .{ext} (expected .toml or .json)"
            ))
        })
    }
}

/// 解析 TOML 格式配置
pub fn parse_toml(content: &str) -> Result<RelayConfig, ContractError> {
    toml::from_str(content).map_err(|e| {
        let section = e
            .span()
            .map(|span| section_at(content, span.start))
            .unwrap_or("relay config");
        ContractError::ConfigParse {
            message: format!("{section}: {}", e.message().trim_end()),
            source: Some(Box::new(e)),
        }
    })
}

/// 解析 JSON 格式配置
pub fn parse_json(content: &str) -> Result<RelayConfig, ContractError> {
    serde_json::from_str(content).map_err(|e| {
        let kind = if e.is_data() { "invalid value" } else { "malformed JSON" };
        ContractError::ConfigParse {
            message: format!(
                "relay config: {kind} at line {} column {}",
                e.line(),
                e.column()
            ),
            source: Some(Box::new(e)),
        }
    })
}

/// 根据格式解析配置
pub fn parse(content: &str, format: ConfigFormat) -> Result<RelayConfig, ContractError> {
    match format {
        ConfigFormat::Toml => parse_toml(content),
        ConfigFormat::Json => parse_json(content),
    }
}

/// 偏移量 `offset` 之前最近的表头
fn section_at(content: &str, offset: usize) -> &'static str {
    let before = content.get(..offset).unwrap_or(content);
    let header = before
        .lines()
        .rev()
        .map(str::trim)
        .find(|line| line.starts_with('['));
    match header {
        Some(h) if h.starts_with("[monitor]") => "[monitor]",
        Some(h) if h.starts_with("[webhook]") => "[webhook]",
        Some(_) => "unknown section",
        None => "relay config",
    }
}
