//! 二进制列识别与取值规范化
//!
//! 写入端通过 `jsonb_populate_record` 接收 bytea，需要 Postgres 的 `\x` 十六进制文本。

use base64::Engine as _;
use base64::engine::general_purpose::STANDARD as BASE64;
use serde_json::Value;

const BINARY_NAMES: &[&str] = &["image", "photo", "picture", "data", "content"];
const BINARY_SUFFIXES: &[&str] = &["_image", "_data"];

/// 判断列是否为二进制列
///
/// 已知类型时只看类型；类型未知时按列名推断。
pub fn is_binary_column(name: &str, data_type: Option<&str>) -> bool {
    match data_type {
        Some(data_type) => data_type.eq_ignore_ascii_case("bytea"),
        None => {
            let lower = name.to_ascii_lowercase();
            BINARY_NAMES.contains(&lower.as_str())
                || BINARY_SUFFIXES.iter().any(|s| lower.ends_with(s))
        }
    }
}

/// 将二进制列的取值转换为 `\x…` 文本
///
/// - 已是 `\x` 开头：原样保留
/// - 去掉空格和 `-` 后长度为偶数：按十六进制解码，失败则取 UTF-8 字节
/// - 长度为奇数：按 base64 解码，失败则取 UTF-8 字节
pub fn normalize_binary(value: &str) -> String {
    if value.starts_with("\\x") {
        return value.to_string();
    }

    let compact: String = value.chars().filter(|c| *c != ' ' && *c != '-').collect();
    let bytes = if compact.len() % 2 == 0 {
        hex::decode(&compact).unwrap_or_else(|_| value.as_bytes().to_vec())
    } else {
        BASE64
            .decode(value)
            .unwrap_or_else(|_| value.as_bytes().to_vec())
    };

    format!("\\x{}", hex::encode(bytes))
}

/// 规范化一个 JSON 值；空串与非字符串值写为 NULL
pub fn normalize_binary_value(value: &Value) -> Value {
    match value {
        Value::String(s) if !s.is_empty() => Value::String(normalize_binary(s)),
        _ => Value::Null,
    }
}
