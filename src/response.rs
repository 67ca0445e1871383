//! cPanel API 2 回應的解析。
//!
//! 所有回應都包在 `cpanelresult` 之下，但成功旗標與錯誤訊息的位置依操作與伺服器版本而不同，
//! 因此這裡以 JSON pointer 依序嘗試已知的形狀，最後退回原始回應內容。

use serde_json::Value;

use crate::{transport::RemoteCallError, zone::Zone};

/// 紀錄新增/刪除操作的狀態碼位置。
const RECORD_STATUS: &str = "/data/0/result/status";

/// 紀錄操作失敗時嘗試取得訊息的位置，依序嘗試。
const RECORD_MESSAGE_SHAPES: &[&str] = &["/data/0/result/statusmsg", "/error"];

/// 憑證安裝的狀態位置；成功時 `result` 本身即為 `1`。
const INSTALL_STATUS: &str = "/data/0/result";

/// 憑證安裝失敗時嘗試取得訊息的位置，依序嘗試。
const INSTALL_MESSAGE_SHAPES: &[&str] = &[
    "/data/0/result/output",
    "/data/0/output",
    "/data/0/result/statusmsg",
    "/data/0/statusmsg",
    "/error",
];

/// 取出 `cpanelresult` 物件。
pub fn envelope(mut body: Value) -> Result<Value, RemoteCallError> {
    let result = body.get_mut("cpanelresult").map(Value::take);
    match result {
        Some(result @ Value::Object(_)) => Ok(result),
        _ => Err(RemoteCallError::MalformedResponse(format!(
            "missing cpanelresult: {body}"
        ))),
    }
}

/// 判斷值是否為 `1`，接受數字或字串形式。
pub fn is_one(value: &Value) -> bool {
    match value {
        Value::Number(n) => n.as_u64() == Some(1) || n.as_f64() == Some(1.0),
        Value::String(s) => s.trim() == "1",
        _ => false,
    }
}

/// 以寬鬆的真值規則判斷旗標。
pub fn is_truthy(value: &Value) -> bool {
    match value {
        Value::Null => false,
        Value::Bool(b) => *b,
        Value::Number(n) => n.as_f64().is_some_and(|f| f != 0.0),
        Value::String(s) => !s.is_empty() && s != "0",
        Value::Array(a) => !a.is_empty(),
        Value::Object(o) => !o.is_empty(),
    }
}

/// 解析 `ZoneEdit::fetchzones` 的結果，保留伺服器回傳的順序。
pub fn parse_zones(result: &Value) -> Result<Vec<Zone>, RemoteCallError> {
    let zones = result
        .pointer("/data/0/zones")
        .and_then(Value::as_object)
        .ok_or_else(|| RemoteCallError::MalformedResponse(format!("missing zone list: {result}")))?;

    Ok(zones
        .iter()
        .map(|(name, flag)| Zone::new(name, is_truthy(flag)))
        .collect())
}

/// 解析 `ZoneEdit::fetchzone_records` 的結果，取得所有符合紀錄的行號。
pub fn parse_record_lines(result: &Value) -> Result<Vec<u32>, RemoteCallError> {
    let records = match result.get("data") {
        Some(Value::Array(records)) => records,
        Some(Value::Null) => return Ok(Vec::new()),
        _ => {
            return Err(RemoteCallError::MalformedResponse(format!(
                "missing record list: {result}"
            )))
        }
    };

    records
        .iter()
        .map(|record| {
            record
                .get("line")
                .and_then(as_line)
                .ok_or_else(|| {
                    RemoteCallError::MalformedResponse(format!("record without line: {record}"))
                })
        })
        .collect()
}

fn as_line(value: &Value) -> Option<u32> {
    match value {
        Value::Number(n) => n.as_u64().and_then(|n| u32::try_from(n).ok()),
        Value::String(s) => s.trim().parse().ok(),
        _ => None,
    }
}

/// 檢查紀錄操作的回應，失敗時回傳伺服器提供的訊息。
pub fn record_status(result: &Value) -> Result<(), String> {
    if result.pointer(RECORD_STATUS).is_some_and(is_one) {
        return Ok(());
    }
    Err(extract_message(result, RECORD_MESSAGE_SHAPES))
}

/// 檢查憑證安裝的回應，失敗時回傳盡力取得的訊息或原始回應。
pub fn install_status(result: &Value) -> Result<(), String> {
    if result.pointer(INSTALL_STATUS).is_some_and(is_one) {
        return Ok(());
    }
    Err(extract_message(result, INSTALL_MESSAGE_SHAPES))
}

/// 依序嘗試各個位置，取第一個存在的訊息；皆不存在時回傳整個回應的 JSON。
fn extract_message(result: &Value, shapes: &[&str]) -> String {
    shapes
        .iter()
        .filter_map(|shape| result.pointer(shape))
        .find_map(|message| match message {
            Value::Null => None,
            Value::String(s) => Some(s.clone()),
            other => Some(other.to_string()),
        })
        .unwrap_or_else(|| result.to_string())
}
