//! 配置模块，负责加载JSON配置文件

use chrono::{FixedOffset, Offset, Utc};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::Path;

use crate::parser::MAX_GROUP_DEPTH;

/// 查询字符串的默认字节上限
pub const MAX_QUERY_BYTES: usize = 4096;

/// 搜索配置错误
#[derive(Debug)]
pub struct ConfigError {
    pub message: String,
}

impl std::fmt::Display for ConfigError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "配置错误: {}", self.message)
    }
}

impl std::error::Error for ConfigError {}

impl ConfigError {
    pub fn new(message: String) -> Self {
        Self { message }
    }
}

/// 搜索管线的运行配置
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SearchSettings {
    /// 无时区日期时间字面量使用的默认时区偏移（分钟, 东为正）
    #[serde(default)]
    pub default_utc_offset_minutes: i32,
    /// 查询字符串的最大字节数
    #[serde(default = "default_max_query_bytes")]
    pub max_query_bytes: usize,
    /// 括号嵌套深度上限
    #[serde(default = "default_max_group_depth")]
    pub max_group_depth: usize,
}

fn default_max_query_bytes() -> usize {
    MAX_QUERY_BYTES
}

fn default_max_group_depth() -> usize {
    MAX_GROUP_DEPTH
}

impl Default for SearchSettings {
    fn default() -> Self {
        Self {
            default_utc_offset_minutes: 0,
            max_query_bytes: MAX_QUERY_BYTES,
            max_group_depth: MAX_GROUP_DEPTH,
        }
    }
}

impl SearchSettings {
    /// 从JSON文件加载搜索配置
    pub fn from_json_file<P: AsRef<Path>>(path: P) -> Result<Self, ConfigError> {
        let path_ref = path.as_ref();

        // 检查文件是否存在
        if !path_ref.exists() {
            return Err(ConfigError::new(format!(
                "配置文件不存在: {}",
                path_ref.display()
            )));
        }

        // 读取文件内容
        let content = fs::read_to_string(path_ref).map_err(|e| {
            ConfigError::new(format!("无法读取配置文件 {}: {}", path_ref.display(), e))
        })?;

        // 解析JSON
        let settings: SearchSettings = serde_json::from_str(&content).map_err(|e| {
            ConfigError::new(format!("无法解析JSON配置文件 {}: {}", path_ref.display(), e))
        })?;

        Ok(settings)
    }

    /// 默认时区偏移; 越界的配置值回退到 UTC
    pub fn default_offset(&self) -> FixedOffset {
        FixedOffset::east_opt(self.default_utc_offset_minutes.saturating_mul(60))
            .unwrap_or_else(|| Utc.fix())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use std::io::Write;

    #[test]
    fn test_load_valid_json_config() {
        // 创建临时配置文件
        let temp_file = "test_search_settings.json";
        let mut file = fs::File::create(temp_file).unwrap();
        writeln!(
            file,
            r#"{{
            "default_utc_offset_minutes": 60,
            "max_query_bytes": 1024
        }}"#
        )
        .unwrap();

        // 测试加载
        let settings = SearchSettings::from_json_file(temp_file).unwrap();
        assert_eq!(settings.default_utc_offset_minutes, 60);
        assert_eq!(settings.max_query_bytes, 1024);
        // 未给出的字段使用默认值
        assert_eq!(settings.max_group_depth, MAX_GROUP_DEPTH);
        assert_eq!(
            settings.default_offset(),
            FixedOffset::east_opt(3600).unwrap()
        );

        // 清理
        fs::remove_file(temp_file).ok();
    }

    #[test]
    fn test_invalid_json_config() {
        let temp_file = "test_invalid_settings.json";
        let mut file = fs::File::create(temp_file).unwrap();
        writeln!(file, "invalid json").unwrap();

        let result = SearchSettings::from_json_file(temp_file);
        assert!(result.is_err());

        // 清理
        fs::remove_file(temp_file).ok();
    }

    #[test]
    fn test_missing_file() {
        let result = SearchSettings::from_json_file("non_existent_settings.json");
        assert!(result.is_err());
    }

    #[test]
    fn test_default_config() {
        let settings = SearchSettings::default();
        assert_eq!(settings.max_query_bytes, MAX_QUERY_BYTES);
        assert_eq!(settings.default_offset(), Utc.fix());
    }

    #[test]
    fn test_out_of_range_offset_falls_back_to_utc() {
        let settings = SearchSettings {
            default_utc_offset_minutes: 100_000,
            ..SearchSettings::default()
        };
        assert_eq!(settings.default_offset(), Utc.fix());
    }
}
