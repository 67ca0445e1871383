/// cPanel 管理的 DNS zone。
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Zone {
    pub name: String,
    /// 列表 API 回傳的啟用旗標
    pub active: bool,
}

impl Zone {
    pub fn new(name: &str, active: bool) -> Self {
        Self {
            name: name.to_string(),
            active,
        }
    }

    /// 判斷網域是否等於此 zone 或位於其下，不分大小寫。
    pub fn covers(&self, fqdn: &str) -> bool {
        let fqdn = trim_root(fqdn);
        let zone = trim_root(&self.name);
        if zone.is_empty() || fqdn.len() < zone.len() {
            return false;
        }
        if fqdn.len() == zone.len() {
            return fqdn.eq_ignore_ascii_case(zone);
        }

        let split = fqdn.len() - zone.len();
        fqdn.is_char_boundary(split)
            && fqdn[split..].eq_ignore_ascii_case(zone)
            && fqdn[..split].ends_with('.')
    }
}

/// zone 解析結果：選中的 zone 名稱與網域在該 zone 內的標籤。
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ZoneMatch {
    pub zone: String,
    /// 去除 zone 後綴與分隔點後的左側標籤；網域等於 zone 時為空字串。
    pub name: String,
}

/// 在啟用中的 zone 裡選出涵蓋 `fqdn` 的最長者。
///
/// 長度相同時取字典序較小的名稱，使結果與伺服器回傳順序無關。
pub fn select_zone(fqdn: &str, zones: &[Zone]) -> Option<ZoneMatch> {
    let chosen = zones
        .iter()
        .filter(|zone| zone.active && zone.covers(fqdn))
        .map(|zone| trim_root(&zone.name))
        .min_by(|a, b| b.len().cmp(&a.len()).then_with(|| a.cmp(b)))?;

    let fqdn = trim_root(fqdn);
    let name = fqdn[..fqdn.len() - chosen.len()]
        .strip_suffix('.')
        .unwrap_or_default();

    Some(ZoneMatch {
        zone: chosen.to_string(),
        name: name.to_string(),
    })
}

/// 將紀錄名稱補上結尾的 `.`，符合 API 的完整名稱格式。
pub fn qualified(record_name: &str) -> String {
    if record_name.ends_with('.') {
        record_name.to_string()
    } else {
        format!("{record_name}.")
    }
}

/// 將行號由大到小排序。
///
/// 每刪除一筆紀錄，其後的行號都會往前移一位，從最大行號開始刪除才能讓尚未處理的行號保持有效。
pub fn removal_order(mut lines: Vec<u32>) -> Vec<u32> {
    lines.sort_unstable_by(|a, b| b.cmp(a));
    lines
}

fn trim_root(name: &str) -> &str {
    name.strip_suffix('.').unwrap_or(name)
}
