//! DNS-01 驗證：透過 cPanel 建立與清除 `_acme-challenge` TXT 紀錄。

use std::time::Duration;

use crate::{
    client::{CpanelClient, Result},
    transport::Transport,
};

/// 新增紀錄後建議等待 DNS 傳播的秒數。
pub const DEFAULT_PROPAGATION_SECONDS: u64 = 10;

/// ACME 客戶端在 DNS-01 驗證流程中呼叫的介面。
pub trait ChallengeDriver {
    /// 建立驗證用的 TXT 紀錄。
    ///
    /// - `domain`: 申請憑證的網域。
    /// - `validation_name`: TXT 紀錄的完整名稱，例如 `_acme-challenge.example.com`。
    /// - `validation`: TXT 紀錄內容。
    fn perform(&self, domain: &str, validation_name: &str, validation: &str) -> Result<()>;

    /// 移除驗證用的 TXT 紀錄，紀錄不存在時不視為錯誤。
    fn cleanup(&self, domain: &str, validation_name: &str, validation: &str) -> Result<()>;

    /// 建立紀錄後到請 CA 驗證前應等待的時間。
    fn propagation_delay(&self) -> Duration;
}

/// 使用 cPanel DNS zone 完成 DNS-01 驗證的 [`ChallengeDriver`] 實作。
#[derive(Debug)]
pub struct Authenticator<T: Transport> {
    client: CpanelClient<T>,
    propagation_seconds: u64,
}

impl<T: Transport> Authenticator<T> {
    pub fn new(client: CpanelClient<T>) -> Self {
        Self {
            client,
            propagation_seconds: DEFAULT_PROPAGATION_SECONDS,
        }
    }

    /// 設定 DNS 傳播等待秒數。
    pub fn propagation_seconds(mut self, seconds: u64) -> Self {
        self.propagation_seconds = seconds;
        self
    }

    pub fn client(&self) -> &CpanelClient<T> {
        &self.client
    }
}

impl<T: Transport> ChallengeDriver for Authenticator<T> {
    fn perform(&self, domain: &str, validation_name: &str, validation: &str) -> Result<()> {
        log::debug!("Creating DNS-01 record {validation_name} for {domain}");
        self.client.add_txt_record(validation_name, validation)
    }

    fn cleanup(&self, domain: &str, validation_name: &str, validation: &str) -> Result<()> {
        log::debug!("Cleaning up DNS-01 record {validation_name} for {domain}");
        self.client.delete_txt_record(validation_name, validation)
    }

    fn propagation_delay(&self) -> Duration {
        Duration::from_secs(self.propagation_seconds)
    }
}
