use base64::{engine::general_purpose::STANDARD, Engine};

use crate::config::ConfigError;

/// cPanel API token 驗證使用的授權方案名稱。
pub const TOKEN_SCHEME: &str = "cpanel";

/// 表示呼叫 cPanel API 時使用的身分憑證。
///
/// 兩種形式互斥：帳號密碼以 HTTP Basic 編碼，API token 則使用 cPanel 專屬的授權方案。
#[derive(Clone, PartialEq, Eq)]
pub enum Credential {
    /// 帳號與密碼，以 `Authorization: Basic ...` 傳送。
    Password { username: String, password: String },
    /// 帳號與 API token，以 `Authorization: cpanel <user>:<token>` 傳送。
    Token { username: String, token: String },
}

impl Credential {
    /// 根據設定值建立憑證。
    ///
    /// 若同時提供密碼與 token，token 優先；空字串視同未提供。
    ///
    /// # 錯誤
    ///
    /// 帳號為空時回傳 [`ConfigError::MissingUsername`]，
    /// 密碼與 token 皆未提供時回傳 [`ConfigError::MissingSecret`]。
    pub fn new(
        username: &str,
        password: Option<&str>,
        token: Option<&str>,
    ) -> Result<Self, ConfigError> {
        if username.is_empty() {
            return Err(ConfigError::MissingUsername);
        }

        let password = password.filter(|p| !p.is_empty());
        let token = token.filter(|t| !t.is_empty());

        match (password, token) {
            (_, Some(token)) => Ok(Self::Token {
                username: username.to_string(),
                token: token.to_string(),
            }),
            (Some(password), None) => Ok(Self::Password {
                username: username.to_string(),
                password: password.to_string(),
            }),
            (None, None) => Err(ConfigError::MissingSecret),
        }
    }

    pub fn username(&self) -> &str {
        match self {
            Self::Password { username, .. } | Self::Token { username, .. } => username,
        }
    }

    /// 產生 `Authorization` 標頭的值。
    pub fn authorization(&self) -> String {
        match self {
            Self::Password { username, password } => {
                format!("Basic {}", STANDARD.encode(format!("{username}:{password}")))
            }
            Self::Token { username, token } => format!("{TOKEN_SCHEME} {username}:{token}"),
        }
    }
}

impl std::fmt::Debug for Credential {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Password { username, .. } => f
                .debug_struct("Password")
                .field("username", username)
                .finish_non_exhaustive(),
            Self::Token { username, .. } => f
                .debug_struct("Token")
                .field("username", username)
                .finish_non_exhaustive(),
        }
    }
}
