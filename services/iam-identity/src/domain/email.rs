//! Email 值对象

use std::fmt;

use serde::{Deserialize, Serialize};
use softwear_errors::AppError;

const MAX_EMAIL_LEN: usize = 254;

/// 去除首尾空白并转为小写的邮箱
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Email(String);

impl Email {
    pub fn new(email: impl AsRef<str>) -> Result<Self, EmailError> {
        let email = email.as_ref().trim();
        if !Self::is_valid(email) {
            return Err(EmailError::InvalidFormat(email.to_string()));
        }
        Ok(Self(email.to_lowercase()))
    }

    fn is_valid(email: &str) -> bool {
        let Some((local, domain)) = email.split_once('@') else {
            return false;
        };
        !local.is_empty()
            && !domain.is_empty()
            && !domain.contains('@')
            && !email.contains(char::is_whitespace)
            && email.len() <= MAX_EMAIL_LEN
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    pub fn domain(&self) -> Option<&str> {
        self.0.split('@').nth(1)
    }
}

impl fmt::Display for Email {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

#[derive(Debug, thiserror::Error)]
pub enum EmailError {
    #[error("Invalid email format: {0}")]
    InvalidFormat(String),
}

impl From<EmailError> for AppError {
    fn from(err: EmailError) -> Self {
        AppError::validation(err.to_string())
    }
}
