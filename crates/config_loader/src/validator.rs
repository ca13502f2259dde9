//! 配置校验模块
//!
//! 校验规则：
//! - 字段级规则由 `validator` derive 声明 (host 非空、发件地址合法、限流 >= 1 ...)
//! - file 类型账本必须配置 path
//! - 附件目录不能为空路径

use std::path::Path;

use contracts::{ContractError, LedgerType, MailerBlueprint};
use validator::{Validate, ValidationErrors, ValidationErrorsKind};

/// 校验 MailerBlueprint 配置
///
/// 返回第一个遇到的错误，或 Ok(())。
pub fn validate(blueprint: &MailerBlueprint) -> Result<(), ContractError> {
    validate_fields(blueprint)?;
    validate_ledger(blueprint)?;
    validate_staging(blueprint)?;
    Ok(())
}

/// 字段级校验 (derive)
fn validate_fields(blueprint: &MailerBlueprint) -> Result<(), ContractError> {
    let Err(errors) = blueprint.validate() else {
        return Ok(());
    };

    let mut flat = Vec::new();
    flatten_errors("", &errors, &mut flat);
    flat.sort();

    match flat.into_iter().next() {
        Some((field, message)) => Err(ContractError::config_validation(field, message)),
        None => Err(ContractError::config_validation("blueprint", errors.to_string())),
    }
}

/// 将嵌套的校验错误展开为 (字段路径, 消息)
fn flatten_errors(prefix: &str, errors: &ValidationErrors, out: &mut Vec<(String, String)>) {
    for (field, kind) in errors.errors() {
        let path = if prefix.is_empty() {
            field.to_string()
        } else {
            format!("{prefix}.{field}")
        };

        match kind {
            ValidationErrorsKind::Field(field_errors) => {
                for error in field_errors {
                    let message = error
                        .message
                        .as_ref()
                        .map(|m| m.to_string())
                        .unwrap_or_else(|| error.code.to_string());
                    out.push((path.clone(), message));
                }
            }
            ValidationErrorsKind::Struct(inner) => flatten_errors(&path, inner, out),
            ValidationErrorsKind::List(items) => {
                for (idx, inner) in items {
                    flatten_errors(&format!("{path}[{idx}]"), inner, out);
                }
            }
        }
    }
}

/// 校验账本配置
fn validate_ledger(blueprint: &MailerBlueprint) -> Result<(), ContractError> {
    let ledger = &blueprint.ledger;
    if ledger.ledger_type == LedgerType::File {
        match ledger.path.as_deref() {
            Some(path) if !is_blank(path) => {}
            _ => {
                return Err(ContractError::config_validation(
                    "ledger.path",
                    "file ledger requires a path",
                ))
            }
        }
    }
    Ok(())
}

/// 校验落盘目录
fn validate_staging(blueprint: &MailerBlueprint) -> Result<(), ContractError> {
    let staging = &blueprint.staging;
    if is_blank(&staging.attachments_dir) {
        return Err(ContractError::config_validation(
            "staging.attachments_dir",
            "attachments_dir cannot be empty",
        ));
    }
    if let Some(dir) = staging.recipients_dir.as_deref() {
        if is_blank(dir) {
            return Err(ContractError::config_validation(
                "staging.recipients_dir",
                "recipients_dir cannot be empty when set",
            ));
        }
    }
    Ok(())
}

fn is_blank(path: &Path) -> bool {
    path.as_os_str().is_empty()
}
