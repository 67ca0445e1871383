use serde_json::Value;
use thiserror::Error;

use crate::{
    config::ConfigError,
    credential::Credential,
    response,
    transport::{ApiRequest, RemoteCallError, Transport},
    zone::{self, ZoneMatch},
};

/// TXT 紀錄的預設 TTL（秒）。
pub const DEFAULT_TTL: u32 = 60;

const ZONE_EDIT: &str = "ZoneEdit";
const SSL: &str = "SSL";

/// 定義 cPanel 操作可能產生的錯誤。
#[derive(Debug, Error)]
pub enum CpanelError {
    #[error(transparent)]
    Config(#[from] ConfigError),
    #[error("Could not get the zone for {0}. Is this name in a zone managed in cPanel?")]
    NoMatchingZone(String),
    #[error("Error {action} TXT record for {record}: {message}")]
    RecordOperation {
        action: RecordAction,
        record: String,
        message: String,
    },
    #[error("Error installing SSL certificate for {domain}: {message}")]
    CertificateInstall { domain: String, message: String },
    #[error("cPanel API call failed: {0}")]
    RemoteCall(#[from] RemoteCallError),
}

impl CpanelError {
    /// 是否為與伺服器通訊本身的失敗，而非伺服器回報的操作失敗。
    pub fn is_remote_call(&self) -> bool {
        matches!(self, Self::RemoteCall(_))
    }

    pub fn is_config(&self) -> bool {
        matches!(self, Self::Config(_))
    }
}

/// 自定義結果型別，錯誤類型為 `CpanelError`
pub type Result<T> = std::result::Result<T, CpanelError>;

/// 失敗的紀錄操作種類。
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RecordAction {
    Add,
    Remove,
}

impl std::fmt::Display for RecordAction {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(match self {
            Self::Add => "adding",
            Self::Remove => "removing",
        })
    }
}

/// 待安裝的憑證內容，僅檢查是否為空，不解析內容。
#[derive(Clone, PartialEq, Eq)]
pub struct CertificateBundle {
    pub domain: String,
    pub certificate: String,
    pub private_key: String,
    pub ca_bundle: String,
}

impl CertificateBundle {
    pub fn new(domain: &str, certificate: &str, private_key: &str, ca_bundle: &str) -> Self {
        Self {
            domain: domain.to_string(),
            certificate: certificate.to_string(),
            private_key: private_key.to_string(),
            ca_bundle: ca_bundle.to_string(),
        }
    }

    fn check_present(&self) -> std::result::Result<(), ConfigError> {
        [
            ("domain", &self.domain),
            ("crt", &self.certificate),
            ("key", &self.private_key),
            ("cabundle", &self.ca_bundle),
        ]
        .into_iter()
        .find(|(_, value)| value.trim().is_empty())
        .map_or(Ok(()), |(field, _)| {
            Err(ConfigError::MissingCertificateMaterial(field))
        })
    }
}

impl std::fmt::Debug for CertificateBundle {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CertificateBundle")
            .field("domain", &self.domain)
            .finish_non_exhaustive()
    }
}

/// cPanel API 2 的客戶端，負責 zone 解析、TXT 紀錄增刪與憑證安裝。
///
/// 除了建立時的設定外不保存任何狀態，每次操作都會重新查詢 zone 列表。
#[derive(Debug)]
pub struct CpanelClient<T: Transport> {
    credential: Credential,
    transport: T,
}

impl<T: Transport> CpanelClient<T> {
    pub fn new(credential: Credential, transport: T) -> Self {
        Self {
            credential,
            transport,
        }
    }

    pub fn credential(&self) -> &Credential {
        &self.credential
    }

    pub fn transport(&self) -> &T {
        &self.transport
    }

    /// 找出涵蓋 `fqdn` 的 zone，回傳 zone 名稱與網域在 zone 內的名稱。
    ///
    /// 多個 zone 符合時選擇最長（最精確）的後綴。
    ///
    /// # 錯誤
    ///
    /// 沒有任何啟用中的 zone 涵蓋此網域時回傳 [`CpanelError::NoMatchingZone`]。
    pub fn resolve_zone(&self, fqdn: &str) -> Result<ZoneMatch> {
        let result = self.call(ApiRequest::new(ZONE_EDIT, "fetchzones"))?;
        let zones = response::parse_zones(&result)?;

        zone::select_zone(fqdn, &zones)
            .ok_or_else(|| CpanelError::NoMatchingZone(fqdn.to_string()))
    }

    /// 以預設 TTL 新增 TXT 紀錄。
    pub fn add_txt_record(&self, record_name: &str, content: &str) -> Result<()> {
        self.add_txt_record_with_ttl(record_name, content, DEFAULT_TTL)
    }

    /// 新增 TXT 紀錄。
    ///
    /// # 錯誤
    ///
    /// 伺服器回傳的狀態不為 1 時回傳 [`CpanelError::RecordOperation`]，
    /// 並帶有伺服器的狀態訊息。
    pub fn add_txt_record_with_ttl(
        &self,
        record_name: &str,
        content: &str,
        ttl: u32,
    ) -> Result<()> {
        let found = self.resolve_zone(record_name)?;

        let request = ApiRequest::new(ZONE_EDIT, "add_zone_record")
            .param("domain", &found.zone)
            .param("name", &found.name)
            .param("type", "TXT")
            .param("txtdata", content)
            .param("ttl", ttl);

        let result = self.call(request)?;
        response::record_status(&result).map_err(|message| {
            log::error!("Failed to add TXT record for {record_name}: {message}");
            CpanelError::RecordOperation {
                action: RecordAction::Add,
                record: record_name.to_string(),
                message,
            }
        })?;

        log::info!("Successfully added TXT record for {record_name}");
        Ok(())
    }

    /// 以預設 TTL 刪除 TXT 紀錄。
    pub fn delete_txt_record(&self, record_name: &str, content: &str) -> Result<()> {
        self.delete_txt_record_with_ttl(record_name, content, DEFAULT_TTL)
    }

    /// 刪除所有名稱、內容與 TTL 相符的 TXT 紀錄，包含重複的紀錄。
    ///
    /// 依行號由大到小逐筆刪除；任一筆失敗即停止，已刪除的紀錄不會復原。
    /// 沒有相符紀錄時不送出任何刪除請求並直接成功。
    pub fn delete_txt_record_with_ttl(
        &self,
        record_name: &str,
        content: &str,
        ttl: u32,
    ) -> Result<()> {
        let found = self.resolve_zone(record_name)?;
        let lines = self.find_record_lines(&found.zone, record_name, content, ttl)?;

        if lines.is_empty() {
            log::info!("No TXT record for {record_name} to remove");
            return Ok(());
        }

        for line in zone::removal_order(lines) {
            let request = ApiRequest::new(ZONE_EDIT, "remove_zone_record")
                .param("domain", &found.zone)
                .param("line", line);

            let result = self.call(request)?;
            response::record_status(&result).map_err(|message| {
                log::error!(
                    "Failed to remove TXT record for {record_name} at line {line}: {message}"
                );
                CpanelError::RecordOperation {
                    action: RecordAction::Remove,
                    record: record_name.to_string(),
                    message,
                }
            })?;

            log::info!("Successfully removed TXT record for {record_name}");
        }

        Ok(())
    }

    /// 查詢 zone 中符合條件的 TXT 紀錄行號。
    pub fn find_record_lines(
        &self,
        zone: &str,
        record_name: &str,
        content: &str,
        ttl: u32,
    ) -> Result<Vec<u32>> {
        let request = ApiRequest::new(ZONE_EDIT, "fetchzone_records")
            .param("domain", zone)
            .param("name", zone::qualified(record_name))
            .param("type", "TXT")
            .param("txtdata", content)
            .param("ttl", ttl);

        let result = self.call(request)?;
        Ok(response::parse_record_lines(&result)?)
    }

    /// 將憑證、私鑰與 CA bundle 安裝到指定網域。
    ///
    /// 此端點的成功旗標是 `data[0].result` 本身為 1，與紀錄操作的形狀不同。
    ///
    /// # 錯誤
    ///
    /// 任一欄位為空時回傳 [`ConfigError::MissingCertificateMaterial`]（不送出請求）；
    /// 安裝失敗時回傳 [`CpanelError::CertificateInstall`]，訊息取自回應或為原始回應內容。
    pub fn install_certificate(&self, bundle: &CertificateBundle) -> Result<()> {
        bundle.check_present()?;

        let request = ApiRequest::new(SSL, "installssl")
            .param("domain", &bundle.domain)
            .param("cabundle", &bundle.ca_bundle)
            .param("crt", &bundle.certificate)
            .param("key", &bundle.private_key);

        let result = self.call(request)?;
        response::install_status(&result).map_err(|message| {
            log::error!("Failed to install SSL certificate for {}: {message}", bundle.domain);
            CpanelError::CertificateInstall {
                domain: bundle.domain.clone(),
                message,
            }
        })?;

        log::info!("Successfully installed SSL certificate for {}", bundle.domain);
        Ok(())
    }

    fn call(&self, request: ApiRequest) -> Result<Value> {
        let body = self.transport.call(&request)?;
        let result = response::envelope(body)?;
        if request.module() != SSL {
            log::debug!("{}::{} -> {result}", request.module(), request.func());
        }
        Ok(result)
    }
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::*;
    use crate::transport::MockTransport;

    fn zones() -> Value {
        json!({"cpanelresult": {"data": [{"zones": {
            "example.com": 1,
            "sub.example.com": 1,
            "old.example.com": 0
        }}]}})
    }

    fn status(code: u8, message: &str) -> Value {
        json!({"cpanelresult": {"data": [{"result": {"status": code, "statusmsg": message}}]}})
    }

    fn lines(lines: &[u32]) -> Value {
        let data: Vec<Value> = lines
            .iter()
            .map(|line| json!({"line": line, "type": "TXT"}))
            .collect();
        json!({"cpanelresult": {"data": data}})
    }

    fn client(transport: MockTransport) -> CpanelClient<MockTransport> {
        let credential = Credential::new("alice", Some("pw"), None).unwrap();
        CpanelClient::new(credential, transport)
    }

    #[test]
    fn test_resolve_zone_picks_most_specific() -> Result<()> {
        let client = client(MockTransport::new().respond(zones()));
        let found = client.resolve_zone("_acme-challenge.sub.example.com")?;
        assert_eq!(found.zone, "sub.example.com");
        assert_eq!(found.name, "_acme-challenge");
        Ok(())
    }

    #[test]
    fn test_resolve_zone_no_match() {
        let client = client(MockTransport::new().respond(zones()));
        let result = client.resolve_zone("_acme-challenge.other.org");
        assert!(
            matches!(result, Err(CpanelError::NoMatchingZone(d)) if d == "_acme-challenge.other.org")
        );
    }

    #[test]
    fn test_resolve_zone_skips_inactive() -> Result<()> {
        let client = client(MockTransport::new().respond(zones()));
        let found = client.resolve_zone("_acme-challenge.old.example.com")?;
        assert_eq!(found.zone, "example.com");
        assert_eq!(found.name, "_acme-challenge.old");
        Ok(())
    }

    #[test]
    fn test_add_txt_record_success() -> Result<()> {
        let transport = MockTransport::new()
            .respond(zones())
            .respond(status(1, "Bind reloading on host"));
        let client = client(transport);

        client.add_txt_record("_acme-challenge.sub.example.com", "token-value")?;

        let added = client.transport().requests_for("add_zone_record");
        assert_eq!(added.len(), 1);
        let request = &added[0];
        assert_eq!(request.module(), "ZoneEdit");
        assert_eq!(request.get("domain"), Some("sub.example.com"));
        assert_eq!(request.get("name"), Some("_acme-challenge"));
        assert_eq!(request.get("type"), Some("TXT"));
        assert_eq!(request.get("txtdata"), Some("token-value"));
        assert_eq!(request.get("ttl"), Some("60"));
        Ok(())
    }

    #[test]
    fn test_add_txt_record_failure_carries_message() {
        let transport = MockTransport::new()
            .respond(zones())
            .respond(status(0, "You do not have permission to edit this zone."));
        let client = client(transport);

        match client.add_txt_record("_acme-challenge.example.com", "token-value") {
            Err(CpanelError::RecordOperation { action, message, .. }) => {
                assert_eq!(action, RecordAction::Add);
                assert_eq!(message, "You do not have permission to edit this zone.");
            }
            other => panic!("預期 RecordOperation 錯誤，實際為 {other:?}"),
        }
    }

    #[test]
    fn test_add_txt_record_custom_ttl() -> Result<()> {
        let transport = MockTransport::new().respond(zones()).respond(status(1, ""));
        let client = client(transport);
        client.add_txt_record_with_ttl("_acme-challenge.example.com", "v", 300)?;
        let added = client.transport().requests_for("add_zone_record");
        assert_eq!(added[0].get("ttl"), Some("300"));
        Ok(())
    }

    #[test]
    fn test_delete_removes_highest_line_first() -> Result<()> {
        let transport = MockTransport::new()
            .respond(zones())
            .respond(lines(&[2, 5, 3]))
            .respond(status(1, ""))
            .respond(status(1, ""))
            .respond(status(1, ""));
        let client = client(transport);

        client.delete_txt_record("_acme-challenge.example.com", "token-value")?;

        let removed: Vec<String> = client
            .transport()
            .requests_for("remove_zone_record")
            .iter()
            .map(|r| r.get("line").unwrap_or_default().to_string())
            .collect();
        assert_eq!(removed, vec!["5", "3", "2"]);
        Ok(())
    }

    #[test]
    fn test_delete_queries_qualified_name() -> Result<()> {
        let transport = MockTransport::new().respond(zones()).respond(lines(&[]));
        let client = client(transport);

        client.delete_txt_record("_acme-challenge.example.com", "token-value")?;

        let queries = client.transport().requests_for("fetchzone_records");
        assert_eq!(queries.len(), 1);
        let query = &queries[0];
        assert_eq!(query.get("domain"), Some("example.com"));
        assert_eq!(query.get("name"), Some("_acme-challenge.example.com."));
        assert_eq!(query.get("type"), Some("TXT"));
        assert_eq!(query.get("txtdata"), Some("token-value"));
        assert_eq!(query.get("ttl"), Some("60"));
        Ok(())
    }

    #[test]
    fn test_delete_missing_record_is_noop() -> Result<()> {
        let transport = MockTransport::new().respond(zones()).respond(lines(&[]));
        let client = client(transport);

        client.delete_txt_record("_acme-challenge.example.com", "gone")?;

        assert!(client.transport().requests_for("remove_zone_record").is_empty());
        Ok(())
    }

    #[test]
    fn test_delete_aborts_on_first_failure() {
        let transport = MockTransport::new()
            .respond(zones())
            .respond(lines(&[4, 9, 1]))
            .respond(status(1, ""))
            .respond(status(0, "Line 4 does not exist"))
            .respond(status(1, ""));
        let client = client(transport);

        let result = client.delete_txt_record("_acme-challenge.example.com", "token-value");
        assert!(matches!(
            result,
            Err(CpanelError::RecordOperation { action: RecordAction::Remove, ref message, .. })
                if message == "Line 4 does not exist"
        ));

        let removed: Vec<String> = client
            .transport()
            .requests_for("remove_zone_record")
            .iter()
            .map(|r| r.get("line").unwrap_or_default().to_string())
            .collect();
        assert_eq!(removed, vec!["9", "4"]);
    }

    #[test]
    fn test_install_certificate_success() -> Result<()> {
        let transport = MockTransport::new()
            .respond(json!({"cpanelresult": {"data": [{"result": 1, "output": "ok"}]}}));
        let client = client(transport);
        let bundle = CertificateBundle::new("www.example.com", "CRT", "KEY", "CA");

        client.install_certificate(&bundle)?;

        let requests = client.transport().requests();
        assert_eq!(requests.len(), 1);
        let request = &requests[0];
        assert_eq!(request.module(), "SSL");
        assert_eq!(request.func(), "installssl");
        assert_eq!(request.get("domain"), Some("www.example.com"));
        assert_eq!(request.get("cabundle"), Some("CA"));
        assert_eq!(request.get("crt"), Some("CRT"));
        assert_eq!(request.get("key"), Some("KEY"));
        Ok(())
    }

    #[test]
    fn test_install_certificate_nested_message() {
        let transport = MockTransport::new().respond(json!({"cpanelresult": {"data": [
            {"result": {"status": 0, "output": "The certificate does not match the key."}}
        ]}}));
        let client = client(transport);
        let bundle = CertificateBundle::new("www.example.com", "CRT", "KEY", "CA");

        match client.install_certificate(&bundle) {
            Err(CpanelError::CertificateInstall { domain, message }) => {
                assert_eq!(domain, "www.example.com");
                assert_eq!(message, "The certificate does not match the key.");
            }
            other => panic!("預期 CertificateInstall 錯誤，實際為 {other:?}"),
        }
    }

    #[test]
    fn test_install_certificate_unknown_shape_dumps_raw() {
        let transport = MockTransport::new()
            .respond(json!({"cpanelresult": {"data": [{"result": 0}], "event": {"result": 0}}}));
        let client = client(transport);
        let bundle = CertificateBundle::new("www.example.com", "CRT", "KEY", "CA");

        match client.install_certificate(&bundle) {
            Err(CpanelError::CertificateInstall { message, .. }) => {
                assert!(message.contains("\"event\""));
            }
            other => panic!("預期 CertificateInstall 錯誤，實際為 {other:?}"),
        }
    }

    #[test]
    fn test_install_certificate_rejects_empty_material() {
        let client = client(MockTransport::new());
        let bundle = CertificateBundle::new("www.example.com", "CRT", "", "CA");

        assert!(matches!(
            client.install_certificate(&bundle),
            Err(CpanelError::Config(ConfigError::MissingCertificateMaterial("key")))
        ));
        assert!(client.transport().requests().is_empty());
    }

    #[test]
    fn test_missing_envelope_is_remote_error() {
        let client = client(MockTransport::new().respond(json!({"status": 0})));
        assert!(matches!(
            client.resolve_zone("example.com"),
            Err(CpanelError::RemoteCall(RemoteCallError::MalformedResponse(_)))
        ));
    }

    #[test]
    fn test_error_kind_helpers() {
        let client = client(MockTransport::new().respond(json!({"status": 0})));
        let remote = client.resolve_zone("example.com").unwrap_err();
        assert!(remote.is_remote_call());
        assert!(!remote.is_config());

        let bundle = CertificateBundle::new("www.example.com", "", "KEY", "CA");
        let config = client.install_certificate(&bundle).unwrap_err();
        assert!(config.is_config());
        assert!(!config.is_remote_call());

        let failed = CpanelError::NoMatchingZone("example.org".to_string());
        assert!(!failed.is_remote_call());
    }
}
