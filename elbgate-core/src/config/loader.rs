use crate::config::model::Settings;
use anyhow::Context;

/// 未通过命令行指定配置文件时读取的环境变量
pub const CONFIG_PATH_VAR: &str = "ELBGATE_CONFIG";

/// 解析配置文件路径：命令行参数优先，其次是环境变量
pub fn resolve_config_path(cli_path: Option<&str>) -> Option<String> {
    cli_path
        .map(str::to_string)
        .or_else(|| std::env::var(CONFIG_PATH_VAR).ok().filter(|p| !p.is_empty()))
}

/// 加载配置；没有配置文件时使用默认值
pub fn load_settings(config_path: Option<&str>) -> Result<Settings, anyhow::Error> {
    match config_path {
        Some(path) => load_settings_from_path(path),
        None => Ok(Settings::default()),
    }
}

pub fn load_settings_from_path(config_path: &str) -> Result<Settings, anyhow::Error> {
    let config_str = std::fs::read_to_string(config_path)
        .with_context(|| format!("failed to read configuration file {config_path}"))?;
    let settings: Settings = toml::from_str(&config_str)
        .with_context(|| format!("failed to parse configuration file {config_path}"))?;
    settings.validate()?;
    Ok(settings)
}
