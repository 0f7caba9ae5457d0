//! 密码摘要
//!
//! 存储格式为密码 UTF-16LE 字节的 SHA-256，大写十六进制。

use sha2::{Digest, Sha256};

pub fn hash_password(password: &str) -> String {
    let bytes: Vec<u8> = password.encode_utf16().flat_map(u16::to_le_bytes).collect();
    hex::encode_upper(Sha256::digest(&bytes))
}

/// 十六进制比较不区分大小写
pub fn verify_password(password: &str, stored_hash: &str) -> bool {
    hash_password(password).eq_ignore_ascii_case(stored_hash.trim())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_hash_is_uppercase_hex_of_utf16() {
        let hash = hash_password("secret");
        assert_eq!(hash.len(), 64);
        assert!(hash.chars().all(|c| c.is_ascii_digit() || c.is_ascii_uppercase()));

        let utf8 = hex::encode_upper(Sha256::digest("secret".as_bytes()));
        assert_ne!(hash, utf8);
    }

    #[test]
    fn test_empty_password_hash() {
        assert_eq!(
            hash_password(""),
            "E3B0C44298FC1C149AFBF4C8996FB92427AE41E4649B934CA495991B7852B855"
        );
    }

    #[test]
    fn test_verify_ignores_hex_case() {
        let stored = hash_password("P@ssw0rd").to_lowercase();
        assert!(verify_password("P@ssw0rd", &stored));
        assert!(!verify_password("p@ssw0rd", &stored));
    }
}
