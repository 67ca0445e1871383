use std::{collections::VecDeque, sync::Mutex, time::Duration};

use reqwest::{
    blocking::Client,
    header::{HeaderMap, HeaderValue, AUTHORIZATION},
    StatusCode,
};
use serde_json::Value;
use thiserror::Error;

use crate::{
    client::Result,
    config::ConfigError,
    credential::Credential,
};

/// cPanel JSON API 的路徑。
pub const API_PATH: &str = "/json-api/cpanel";
/// 使用的 cPanel API 版本（API 2）。
pub const API_VERSION: &str = "2";

/// 與遠端 API 通訊時發生的錯誤，不在本地重試或復原。
#[derive(Debug, Error)]
pub enum RemoteCallError {
    /// 錯誤中不含請求 URL，因為查詢字串可能帶有私鑰。
    #[error("HTTP request failed: {0}")]
    Request(reqwest::Error),
    #[error("JSON parsing failed: {0}")]
    Json(#[from] serde_json::Error),
    #[error("Unexpected HTTP status {status}: {body}")]
    UnexpectedStatus { status: StatusCode, body: String },
    #[error("Malformed response: {0}")]
    MalformedResponse(String),
    #[error("Transport lock poisoned")]
    LockPoisoned,
}

impl RemoteCallError {
    /// 包裝 `reqwest` 錯誤並移除其中的 URL。
    pub fn from_reqwest(error: reqwest::Error) -> Self {
        Self::Request(error.without_url())
    }
}

/// 單次 cPanel API 2 呼叫：模組、函式與操作相關的參數。
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ApiRequest {
    module: String,
    func: String,
    params: Vec<(String, String)>,
}

impl ApiRequest {
    pub fn new(module: &str, func: &str) -> Self {
        Self {
            module: module.to_string(),
            func: func.to_string(),
            params: Vec::new(),
        }
    }

    /// 加入一個查詢參數，保留加入順序。
    pub fn param(mut self, key: &str, value: impl ToString) -> Self {
        self.params.push((key.to_string(), value.to_string()));
        self
    }

    pub fn module(&self) -> &str {
        &self.module
    }

    pub fn func(&self) -> &str {
        &self.func
    }

    pub fn params(&self) -> &[(String, String)] {
        &self.params
    }

    /// 取得指定參數的值，若不存在則回傳 `None`。
    pub fn get(&self, key: &str) -> Option<&str> {
        self.params
            .iter()
            .find(|(k, _)| k == key)
            .map(|(_, v)| v.as_str())
    }
}

/// 定義送出 API 呼叫並取得 JSON 回應本體的行為。
pub trait Transport {
    /// 送出請求並回傳解析後的完整 JSON 本體（包含 `cpanelresult`）。
    fn call(&self, request: &ApiRequest) -> std::result::Result<Value, RemoteCallError>;
}

/// 透過阻塞式 HTTP GET 呼叫 `<url>/json-api/cpanel` 的實作。
///
/// 授權標頭在建立時固定，並附加於每一個請求；不保留閒置連線。
#[derive(Debug)]
pub struct HttpTransport {
    client: Client,
    endpoint: String,
    username: String,
}

impl HttpTransport {
    /// 建立新的 `HttpTransport`。
    ///
    /// # 參數
    ///
    /// - `base_url`: cPanel 的 URL，包含 scheme 與連接埠。
    /// - `credential`: 用於產生 `Authorization` 標頭的憑證。
    /// - `timeout`: 單次請求的逾時，`None` 表示不限制。
    ///
    /// # 錯誤
    ///
    /// 憑證含有無法放入標頭的字元時回傳 [`ConfigError::InvalidCredential`]，
    /// HTTP client 建立失敗時回傳 [`RemoteCallError::Request`]。
    pub fn new(
        base_url: &str,
        credential: &Credential,
        timeout: Option<Duration>,
    ) -> Result<Self> {
        let mut authorization = HeaderValue::from_str(&credential.authorization())
            .map_err(|e| ConfigError::InvalidCredential(e.to_string()))?;
        authorization.set_sensitive(true);

        let mut headers = HeaderMap::new();
        headers.insert(AUTHORIZATION, authorization);

        let mut builder = Client::builder()
            .default_headers(headers)
            .pool_max_idle_per_host(0);
        if let Some(timeout) = timeout {
            builder = builder.timeout(timeout);
        }
        let client = builder.build().map_err(RemoteCallError::from_reqwest)?;

        Ok(Self {
            client,
            endpoint: format!("{}{}", base_url.trim_end_matches('/'), API_PATH),
            username: credential.username().to_string(),
        })
    }

    pub fn endpoint(&self) -> &str {
        &self.endpoint
    }

    fn query<'a>(&'a self, request: &'a ApiRequest) -> Vec<(&'a str, &'a str)> {
        let mut query = vec![
            ("cpanel_jsonapi_user", self.username.as_str()),
            ("cpanel_jsonapi_apiversion", API_VERSION),
            ("cpanel_jsonapi_module", request.module()),
            ("cpanel_jsonapi_func", request.func()),
        ];
        query.extend(request.params().iter().map(|(k, v)| (k.as_str(), v.as_str())));
        query
    }
}

impl Transport for HttpTransport {
    fn call(&self, request: &ApiRequest) -> std::result::Result<Value, RemoteCallError> {
        log::debug!("GET {} ({}::{})", self.endpoint, request.module(), request.func());

        let response = self
            .client
            .get(&self.endpoint)
            .query(&self.query(request))
            .send()
            .map_err(RemoteCallError::from_reqwest)?;

        let status = response.status();
        log::debug!("Response Status: {status}");

        let body = response.text().map_err(RemoteCallError::from_reqwest)?;
        if !status.is_success() {
            log::error!(
                "cPanel API returned {status} for {}::{}",
                request.module(),
                request.func()
            );
            return Err(RemoteCallError::UnexpectedStatus { status, body });
        }

        serde_json::from_str(&body).map_err(|e| {
            log::error!("JSON parsing failed: {e}");
            RemoteCallError::Json(e)
        })
    }
}

/// 模擬傳輸實作，依序回傳預先設定的回應並記錄收到的請求，適用於測試環境。
#[derive(Debug, Default)]
pub struct MockTransport {
    responses: Mutex<VecDeque<Value>>,
    requests: Mutex<Vec<ApiRequest>>,
}

impl MockTransport {
    pub fn new() -> Self {
        Self::default()
    }

    /// 加入下一個要回傳的 JSON 本體。
    pub fn respond(self, body: Value) -> Self {
        self.responses
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .push_back(body);
        self
    }

    /// 回傳目前為止收到的所有請求，依呼叫順序排列。
    pub fn requests(&self) -> Vec<ApiRequest> {
        self.requests
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .clone()
    }

    /// 回傳指定 cPanel 函式被呼叫時的請求。
    pub fn requests_for(&self, func: &str) -> Vec<ApiRequest> {
        self.requests()
            .into_iter()
            .filter(|r| r.func() == func)
            .collect()
    }
}

impl Transport for MockTransport {
    fn call(&self, request: &ApiRequest) -> std::result::Result<Value, RemoteCallError> {
        self.requests
            .lock()
            .map_err(|_| RemoteCallError::LockPoisoned)?
            .push(request.clone());

        self.responses
            .lock()
            .map_err(|_| RemoteCallError::LockPoisoned)?
            .pop_front()
            .ok_or_else(|| {
                RemoteCallError::MalformedResponse(format!(
                    "no scripted response for {}::{}",
                    request.module(),
                    request.func()
                ))
            })
    }
}
