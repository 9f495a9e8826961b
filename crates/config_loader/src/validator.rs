//! 配置校验模块
//!
//! 校验规则：
//! - monitor.base_url 非空且为 http(s) URL
//! - monitor.api_key 非空
//! - monitor.server_id > 0
//! - webhook.url 若非空则必须为 http(s) URL
//!
//! 任一失败都意味着整个 relay 处于禁用状态。

use contracts::{ContractError, MonitorConfig, RelayConfig};
use ::validator::{Validate, ValidationError};

/// 校验 RelayConfig 配置
///
/// 返回第一个遇到的错误，或 Ok(())。
pub fn validate(config: &RelayConfig) -> Result<(), ContractError> {
    validate_required(&config.monitor)?;
    validate_monitor_fields(&config.monitor)?;
    validate_webhook(config)?;
    Ok(())
}

/// 校验必填字段 (空白视为缺失)
fn validate_required(monitor: &MonitorConfig) -> Result<(), ContractError> {
    if monitor.base_url.trim().is_empty() {
        return Err(ContractError::config_validation(
            "monitor.base_url",
            "base_url cannot be empty",
        ));
    }
    if monitor.api_key.trim().is_empty() {
        return Err(ContractError::config_validation(
            "monitor.api_key",
            "api_key cannot be empty",
        ));
    }
    if monitor.server_id <= 0 {
        return Err(ContractError::config_validation(
            "monitor.server_id",
            format!("server_id must be > 0, got {}", monitor.server_id),
        ));
    }
    check_http_scheme("monitor.base_url", &monitor.base_url)
}

/// 基于 derive 规则的字段校验
fn validate_monitor_fields(monitor: &MonitorConfig) -> Result<(), ContractError> {
    monitor.validate().map_err(|errors| {
        let mut fields: Vec<_> = errors.field_errors().into_iter().collect();
        fields.sort_by(|a, b| a.0.cmp(&b.0));
        match fields.first() {
            Some((field, field_errors)) => ContractError::config_validation(
                format!("monitor.{field}"),
                describe(field_errors),
            ),
            None => ContractError::config_validation("monitor", errors.to_string()),
        }
    })
}

/// 校验 webhook 配置 (空白 URL = 未配置)
fn validate_webhook(config: &RelayConfig) -> Result<(), ContractError> {
    match config.webhook_url() {
        Some(url) => check_http_scheme("webhook.url", url),
        None => Ok(()),
    }
}

fn check_http_scheme(field: &str, url: &str) -> Result<(), ContractError> {
    let url = url.trim();
    if url.starts_with("http://") || url.starts_with("https://") {
        Ok(())
    } else {
        Err(ContractError::config_validation(
            field,
            format!("'{url}' must start with http:// or https://"),
        ))
    }
}

fn describe(errors: &[ValidationError]) -> String {
    errors
        .iter()
        .map(|e| {
            e.message
                .as_ref()
                .map(|m| m.to_string())
                .unwrap_or_else(|| e.code.to_string())
        })
        .collect::<Vec<_>>()
        .join(", ")
}
