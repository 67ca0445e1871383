//! cPanel 連線設定，包含 URL、帳號與擇一使用的密碼或 API token。

use std::{env, time::Duration};

use serde::Deserialize;
use thiserror::Error;

use crate::{
    client::{CpanelClient, CpanelError},
    credential::Credential,
    transport::HttpTransport,
};

/// 設定不完整或無效時回傳的錯誤，皆在任何網路請求之前發生。
#[derive(Debug, Error, PartialEq, Eq)]
pub enum ConfigError {
    #[error("cPanel: url is required")]
    MissingUrl,
    #[error("cPanel: username is required")]
    MissingUsername,
    #[error("cPanel: password or token is required")]
    MissingSecret,
    #[error("cPanel: credential cannot be sent as an HTTP header: {0}")]
    InvalidCredential(String),
    #[error("cPanel: certificate material is empty: {0}")]
    MissingCertificateMaterial(&'static str),
}

/// 讀取設定時使用的環境變數名稱。
pub const ENV_URL: &str = "CPANEL_URL";
pub const ENV_USERNAME: &str = "CPANEL_USERNAME";
pub const ENV_PASSWORD: &str = "CPANEL_PASSWORD";
pub const ENV_TOKEN: &str = "CPANEL_TOKEN";

/// 建立 [`CpanelClient`] 所需的設定，採用 builder 模式。
///
/// `url` 須包含 scheme 與連接埠，例如 `https://host.example.com:2083`。
/// 密碼與 token 擇一即可，兩者皆提供時使用 token。
#[derive(Clone, Deserialize, PartialEq, Eq)]
pub struct CpanelConfig {
    pub url: String,
    pub username: String,
    #[serde(default)]
    pub password: Option<String>,
    #[serde(default)]
    pub token: Option<String>,
    /// 單次請求的逾時毫秒數，未設定時不限制。
    #[serde(default)]
    pub timeout_ms: Option<u64>,
}

impl CpanelConfig {
    /// 以 URL 與帳號建立設定，其餘欄位留空。
    pub fn new(url: &str, username: &str) -> Self {
        Self {
            url: url.to_string(),
            username: username.to_string(),
            password: None,
            token: None,
            timeout_ms: None,
        }
    }

    /// 從 `CPANEL_URL`、`CPANEL_USERNAME`、`CPANEL_PASSWORD` 與 `CPANEL_TOKEN` 讀取設定。
    ///
    /// 缺少的值會留空，交由 [`CpanelConfig::validate`] 判斷。
    pub fn from_env() -> Self {
        Self::from_lookup(|key| env::var(key).ok())
    }

    fn from_lookup<F>(lookup: F) -> Self
    where
        F: Fn(&str) -> Option<String>,
    {
        Self {
            url: lookup(ENV_URL).unwrap_or_default(),
            username: lookup(ENV_USERNAME).unwrap_or_default(),
            password: lookup(ENV_PASSWORD),
            token: lookup(ENV_TOKEN),
            timeout_ms: None,
        }
    }

    pub fn password(mut self, password: &str) -> Self {
        self.password = Some(password.to_string());
        self
    }

    pub fn token(mut self, token: &str) -> Self {
        self.token = Some(token.to_string());
        self
    }

    pub fn timeout(mut self, timeout: Duration) -> Self {
        self.timeout_ms = Some(u64::try_from(timeout.as_millis()).unwrap_or(u64::MAX));
        self
    }

    /// 檢查設定並產生對應的憑證。
    ///
    /// # 錯誤
    ///
    /// URL、帳號為空或密碼與 token 皆未提供時回傳 [`ConfigError`]。
    pub fn validate(&self) -> Result<Credential, ConfigError> {
        if self.url.trim().is_empty() {
            return Err(ConfigError::MissingUrl);
        }
        Credential::new(
            &self.username,
            self.password.as_deref(),
            self.token.as_deref(),
        )
    }

    /// 依照設定建立使用 HTTP 傳輸的 [`CpanelClient`]。
    pub fn build_client(&self) -> Result<CpanelClient<HttpTransport>, CpanelError> {
        let credential = self.validate()?;
        let transport = HttpTransport::new(
            &self.url,
            &credential,
            self.timeout_ms.map(Duration::from_millis),
        )?;
        Ok(CpanelClient::new(credential, transport))
    }
}

impl std::fmt::Debug for CpanelConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CpanelConfig")
            .field("url", &self.url)
            .field("username", &self.username)
            .field("password", &self.password.as_ref().map(|_| "***"))
            .field("token", &self.token.as_ref().map(|_| "***"))
            .field("timeout_ms", &self.timeout_ms)
            .finish()
    }
}
