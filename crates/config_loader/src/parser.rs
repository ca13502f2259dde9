//! 配置文件格式：按扩展名识别，负责解析与序列化。

use std::path::Path;

use contracts::{ContractError, MailerBlueprint};

/// 配置文件格式
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConfigFormat {
    /// `newsletter.toml` (默认)
    Toml,
    Json,
}

impl ConfigFormat {
    /// 扩展名不区分大小写
    pub fn from_extension(ext: &str) -> Option<Self> {
        if ext.eq_ignore_ascii_case("toml") {
            Some(Self::Toml)
        } else if ext.eq_ignore_ascii_case("json") {
            Some(Self::Json)
        } else {
            None
        }
    }

    /// `newsletter.yaml` 之类的路径直接报错，不尝试读取
    pub fn from_path(path: &Path) -> Result<Self, ContractError> {
        let Some(ext) = path.extension().and_then(|e| e.to_str()) else {
            return Err(ContractError::config_parse(format!(
                "{} has no extension; expected .toml or .json",
                path.display()
            )));
        };
        Self::from_extension(ext).ok_or_else(|| {
            ContractError::config_parse(format!("unsupported config format: .{ext}"))
        })
    }

    fn label(self) -> &'static str {
        match self {
            Self::Toml => "TOML",
            Self::Json => "JSON",
        }
    }

    /// 只做反序列化；字段规则由 validator 负责
    pub(crate) fn parse(self, content: &str) -> Result<MailerBlueprint, ContractError> {
        let parsed: Result<MailerBlueprint, BoxedError> = match self {
            Self::Toml => toml::from_str(content).map_err(BoxedError::from),
            Self::Json => serde_json::from_str(content).map_err(BoxedError::from),
        };
        parsed.map_err(|e| ContractError::ConfigParse {
            message: format!("{} parse error: {e}", self.label()),
            source: Some(e),
        })
    }

    pub(crate) fn render(self, blueprint: &MailerBlueprint) -> Result<String, ContractError> {
        let rendered = match self {
            Self::Toml => toml::to_string_pretty(blueprint).map_err(|e| e.to_string()),
            Self::Json => serde_json::to_string_pretty(blueprint).map_err(|e| e.to_string()),
        };
        rendered.map_err(|e| {
            ContractError::config_parse(format!("{} serialize error: {e}", self.label()))
        })
    }
}

type BoxedError = Box<dyn std::error::Error + Send + Sync>;
