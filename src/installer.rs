//! 憑證部署：讀取 ACME 客戶端產生的憑證檔案並安裝到 cPanel。

use std::{
    fs,
    io,
    path::{Path, PathBuf},
};

use thiserror::Error;

use crate::{
    client::{CertificateBundle, CpanelClient, CpanelError},
    transport::Transport,
};

/// 部署憑證時可能發生的錯誤。
#[derive(Debug, Error)]
pub enum InstallerError {
    #[error("Failed to read {path}: {source}")]
    ReadMaterial {
        path: PathBuf,
        #[source]
        source: io::Error,
    },
    #[error("Certificate lineage has no domain names")]
    EmptyLineage,
    #[error(transparent)]
    Cpanel(#[from] CpanelError),
}

type Result<T> = std::result::Result<T, InstallerError>;

/// 部署結果。
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Deployment {
    Installed,
    /// cPanel 不接受萬用字元網域，略過而不視為錯誤。
    SkippedWildcard,
}

/// 續期後的憑證資訊：涵蓋的網域與各檔案路徑。
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Lineage {
    pub names: Vec<String>,
    pub cert_path: PathBuf,
    pub key_path: PathBuf,
    pub chain_path: PathBuf,
    pub fullchain_path: PathBuf,
}

/// ACME 客戶端在憑證簽發或續期後呼叫的介面。
pub trait CertificateDeployer {
    /// 將指定網域的憑證、私鑰與憑證鏈部署到伺服器。
    ///
    /// `fullchain_path` 由 ACME 客戶端一併提供，實作可自行決定是否使用。
    fn deploy_cert(
        &self,
        domain: &str,
        cert_path: &Path,
        key_path: &Path,
        chain_path: &Path,
        fullchain_path: &Path,
    ) -> Result<Deployment>;

    /// 續期後以 lineage 的第一個網域重新部署。
    fn renew_deploy(&self, lineage: &Lineage) -> Result<Deployment> {
        let domain = lineage.names.first().ok_or(InstallerError::EmptyLineage)?;
        self.deploy_cert(
            domain,
            &lineage.cert_path,
            &lineage.key_path,
            &lineage.chain_path,
            &lineage.fullchain_path,
        )
    }
}

/// 透過 `SSL::installssl` 安裝憑證的 [`CertificateDeployer`] 實作。
///
/// cPanel 分開接收憑證與 CA bundle，因此不會讀取 fullchain。
#[derive(Debug)]
pub struct Installer<T: Transport> {
    client: CpanelClient<T>,
}

impl<T: Transport> Installer<T> {
    pub fn new(client: CpanelClient<T>) -> Self {
        Self { client }
    }

    pub fn client(&self) -> &CpanelClient<T> {
        &self.client
    }
}

impl<T: Transport> CertificateDeployer for Installer<T> {
    fn deploy_cert(
        &self,
        domain: &str,
        cert_path: &Path,
        key_path: &Path,
        chain_path: &Path,
        _fullchain_path: &Path,
    ) -> Result<Deployment> {
        if domain.starts_with("*.") {
            log::info!("Skipping wildcard domain {domain}");
            return Ok(Deployment::SkippedWildcard);
        }

        let ca_bundle = read_material(chain_path)?;
        let certificate = read_material(cert_path)?;
        let private_key = read_material(key_path)?;

        let bundle = CertificateBundle::new(domain, &certificate, &private_key, &ca_bundle);
        self.client.install_certificate(&bundle)?;
        Ok(Deployment::Installed)
    }
}

fn read_material(path: &Path) -> Result<String> {
    fs::read_to_string(path).map_err(|source| InstallerError::ReadMaterial {
        path: path.to_path_buf(),
        source,
    })
}
