//! # cPanel ACME Integration Library
//!
//! 本庫透過 cPanel 的 JSON API（API 2）協助 ACME 客戶端完成兩件事：
//!
//! - **DNS-01 驗證**：在正確的 DNS zone 中建立與移除 `_acme-challenge` TXT 紀錄。
//! - **憑證安裝**：將簽發後的憑證、私鑰與 CA bundle 上傳到 cPanel。
//!
//! ## 模組
//!
//! - **config**: 連線設定（URL、帳號、密碼或 API token），可從環境變數讀取。
//! - **credential**: Basic 與 cPanel token 兩種授權標頭的編碼。
//! - **transport**: 阻塞式 HTTP 傳輸，以及測試用的 [`transport::MockTransport`]。
//! - **response**: `cpanelresult` 回應的解析，包含各版本不一致的錯誤訊息形狀。
//! - **zone**: 最長後綴 zone 選擇與紀錄行號排序。
//! - **client**: [`CpanelClient`]，提供 zone 解析、TXT 紀錄增刪與憑證安裝。
//! - **dns** / **installer**: 給 ACME 客戶端呼叫的 [`ChallengeDriver`] 與 [`CertificateDeployer`]。
//!
//! ## 示例
//!
//! ```no_run
//! use cpanel_acme::{CpanelConfig, ChallengeDriver, Authenticator};
//!
//! fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     // 1. 建立 cPanel 客戶端，token 與密碼擇一
//!     let client = CpanelConfig::new("https://cpanel.example.com:2083", "alice")
//!         .token("API-TOKEN")
//!         .build_client()?;
//!
//!     // 2. 建立驗證用 TXT 紀錄
//!     let auth = Authenticator::new(client);
//!     auth.perform("example.com", "_acme-challenge.example.com", "validation-value")?;
//!
//!     // 3. 等待傳播並完成驗證後清除紀錄
//!     std::thread::sleep(auth.propagation_delay());
//!     auth.cleanup("example.com", "_acme-challenge.example.com", "validation-value")?;
//!
//!     Ok(())
//! }
//! ```

pub mod client;
pub mod config;
pub mod credential;
pub mod dns;
pub mod installer;
pub mod response;
pub mod transport;
pub mod zone;

pub use client::{CertificateBundle, CpanelClient, CpanelError, RecordAction};
pub use config::{ConfigError, CpanelConfig};
pub use credential::Credential;
pub use dns::{Authenticator, ChallengeDriver};
pub use installer::{CertificateDeployer, Deployment, Installer, InstallerError, Lineage};
pub use transport::{ApiRequest, HttpTransport, MockTransport, RemoteCallError, Transport};
pub use zone::{Zone, ZoneMatch};
