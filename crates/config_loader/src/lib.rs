//! # Config Loader
//!
//! 读取 `newsletter.toml` (或 JSON)，得到校验过的 `MailerBlueprint`。
//!
//! 加载顺序：扩展名识别格式 → 读文件 → 反序列化 (缺省段落取默认值)
//! → 字段规则与跨字段规则校验。CLI 覆盖参数之后应再调用一次 [`ConfigLoader::validate`]。
//!
//! ```no_run
//! use config_loader::ConfigLoader;
//! use std::path::Path;
//!
//! let blueprint = ConfigLoader::load_from_path(Path::new("newsletter.toml")).unwrap();
//! println!("SMTP: {}:{}", blueprint.smtp.host, blueprint.smtp.port);
//! ```

mod parser;
mod validator;

pub use contracts::MailerBlueprint;
pub use parser::ConfigFormat;

use contracts::ContractError;
use std::path::Path;

/// 配置加载入口
pub struct ConfigLoader;

impl ConfigLoader {
    /// 按扩展名 (`.toml` / `.json`) 读取并校验
    ///
    /// 不支持的扩展名在读文件之前就会失败。
    pub fn load_from_path(path: &Path) -> Result<MailerBlueprint, ContractError> {
        let format = ConfigFormat::from_path(path)?;
        let content = std::fs::read_to_string(path)?;
        Self::load_from_str(&content, format)
    }

    pub fn load_from_str(
        content: &str,
        format: ConfigFormat,
    ) -> Result<MailerBlueprint, ContractError> {
        let blueprint = format.parse(content)?;
        validator::validate(&blueprint)?;
        Ok(blueprint)
    }

    /// 覆盖 SMTP 主机、端口等字段后重新校验
    pub fn validate(blueprint: &MailerBlueprint) -> Result<(), ContractError> {
        validator::validate(blueprint)
    }

    pub fn to_toml(blueprint: &MailerBlueprint) -> Result<String, ContractError> {
        ConfigFormat::Toml.render(blueprint)
    }

    pub fn to_json(blueprint: &MailerBlueprint) -> Result<String, ContractError> {
        ConfigFormat::Json.render(blueprint)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const NEWSLETTER_TOML: &str = r#"
[smtp]
host = "smtp.example.com"
port = 587
username = "mailer"
password = "secret"

[sender]
email = "news@example.com"
display_name = "Newsletter"

[throttle]
emails_per_hour = 100

[staging]
attachments_dir = "uploads/newsletters"
recipients_dir = "uploads/recipients"

[ledger]
ledger_type = "file"
path = "ledger/deliveries.jsonl"
"#;

    fn newsletter() -> MailerBlueprint {
        ConfigLoader::load_from_str(NEWSLETTER_TOML, ConfigFormat::Toml).unwrap()
    }

    #[test]
    fn test_load_full_toml() {
        let bp = newsletter();
        assert_eq!(bp.smtp.host, "smtp.example.com");
        assert_eq!(bp.sender.display_name, "Newsletter");
        assert_eq!(bp.staging.max_attempts, 8);
    }

    #[test]
    fn test_serialized_forms_load_back() {
        let bp = newsletter();

        let from_toml =
            ConfigLoader::load_from_str(&ConfigLoader::to_toml(&bp).unwrap(), ConfigFormat::Toml)
                .unwrap();
        assert_eq!(from_toml.staging.recipients_dir, bp.staging.recipients_dir);

        let from_json =
            ConfigLoader::load_from_str(&ConfigLoader::to_json(&bp).unwrap(), ConfigFormat::Json)
                .unwrap();
        assert_eq!(from_json.ledger.path, bp.ledger.path);
    }

    #[test]
    fn test_zero_rate_is_rejected() {
        let content = "[smtp]\nhost = \"smtp.example.com\"\n\n[sender]\nemail = \"news@example.com\"\n\n\
                       [throttle]\nemails_per_hour = 0\n";

        let err = ConfigLoader::load_from_str(content, ConfigFormat::Toml).unwrap_err();
        assert!(err.to_string().contains("emails_per_hour"));
    }

    #[test]
    fn test_override_is_revalidated() {
        let mut bp = newsletter();
        bp.throttle.emails_per_hour = 0;
        assert!(ConfigLoader::validate(&bp).is_err());
    }

    #[test]
    fn test_unsupported_extension() {
        let err = ConfigLoader::load_from_path(Path::new("newsletter.yaml")).unwrap_err();
        assert!(err.to_string().contains("unsupported config format"));
    }
}
