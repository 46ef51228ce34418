//! Fund listing and period performance.

use crate::endpoint::{EndpointClient, FetchError};
use crate::models::Record;
use regex::Regex;
use serde_json::Value;
use tracing::info;

const PERIOD_RENAMES: &[(&str, &str)] = &[
    ("syl", "return_pct"),
    ("avg", "category_avg"),
    ("rank", "category_rank"),
    ("sc", "category_total"),
    ("title", "window"),
];

/// Human-readable labels for the vendor's period codes, in the order the
/// endpoint serves them.
const WINDOW_TITLES: &[(&str, &str)] = &[
    ("Z", "1w"),
    ("Y", "1m"),
    ("3Y", "3m"),
    ("6Y", "6m"),
    ("1N", "1y"),
    ("2Y", "2y"),
    ("3N", "3y"),
    ("5N", "5y"),
    ("JN", "ytd"),
    ("LN", "since-inception"),
];

/// Category filter for the public fund listing.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FundKind {
    Stock,
    Bond,
}

impl FundKind {
    pub fn as_str(&self) -> &str {
        match self {
            FundKind::Stock => "gp",
            FundKind::Bond => "zq",
        }
    }
}

/// Fetches the public listing of all open-end funds, optionally filtered by
/// kind. The ranking handler serves a JavaScript body, not JSON, so the
/// `(code, short name)` pairs are regex-extracted from it.
pub async fn fund_listing(
    client: &EndpointClient,
    kind: Option<FundKind>,
) -> Result<Vec<Record>, FetchError> {
    let mut params = vec![
        ("op", "ph".to_string()),
        ("dt", "kf".to_string()),
        ("rs", String::new()),
        ("gs", "0".to_string()),
        ("sc", "6yzf".to_string()),
        ("st", "desc".to_string()),
        ("qdii", String::new()),
        ("tabSubtype", ",,,,,".to_string()),
        ("pi", "1".to_string()),
        ("pn", "50000".to_string()),
        ("dx", "1".to_string()),
    ];
    if let Some(kind) = kind {
        params.push(("ft", kind.as_str().to_string()));
    }

    let url = client.config().ranking_url.clone();
    let body = client.get_text(&url, &params).await?;
    let rows = listing_rows(&body);
    info!(funds = rows.len(), "fetched fund listing");
    Ok(rows)
}

pub(crate) fn listing_rows(body: &str) -> Vec<Record> {
    // Each listing entry starts with a 6-digit fund code followed by its
    // short name, comma-separated inside a quoted blob.
    let pattern = Regex::new(r"(\d{6}),([^,]*?),").expect("listing pattern is valid");
    pattern
        .captures_iter(body)
        .map(|captures| {
            let mut record = Record::empty();
            record.insert("code", Value::String(captures[1].to_string()));
            record.insert("name", Value::String(captures[2].to_string()));
            record
        })
        .collect()
}

/// Fetches the staged performance of one fund: one row per time window,
/// from one week back to since-inception.
pub async fn period_performance(
    client: &EndpointClient,
    code: &str,
) -> Result<Vec<Record>, FetchError> {
    let credentials = &client.config().credentials;
    let params = vec![
        ("AppVersion", "6.3.8".to_string()),
        ("FCODE", code.to_string()),
        ("MobileKey", credentials.device_id.clone()),
        ("OSVersion", "14.3".to_string()),
        ("deviceid", credentials.device_id.clone()),
        ("passportid", credentials.passport_id.clone()),
        ("plat", "Iphone".to_string()),
        ("product", "EFund".to_string()),
        ("version", "6.3.6".to_string()),
    ];

    let url = client.api_url("FundMNPeriodIncrease");
    let payload = client.get_json(&url, &params).await?;
    Ok(period_rows(&payload, code))
}

pub(crate) fn period_rows(payload: &Value, code: &str) -> Vec<Record> {
    let Some(rows) = payload["Datas"].as_array() else {
        return Vec::new();
    };
    rows.iter()
        .map(|row| {
            let mut record = Record::from_payload(row, PERIOD_RENAMES);
            let label = match record.get("window") {
                Some(Value::String(window)) => WINDOW_TITLES
                    .iter()
                    .find(|(vendor, _)| *vendor == window.as_str())
                    .map(|(_, label)| *label),
                _ => None,
            };
            if let Some(label) = label {
                record.insert("window", Value::String(label.to_string()));
            }
            record.insert("code", Value::String(code.to_string()));
            record
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_listing_rows_extracts_code_name_pairs() {
        let body = r#"var rankData = {datas:["000001,华夏成长混合,HXCZHH,2021-01-15,1.0640",
            "000003,中海可转债A,ZHKZZA,2021-01-15,0.7710"],allRecords:2};"#;

        let rows = listing_rows(body);
        assert_eq!(rows.len(), 2);
        assert_eq!(rows[0].get("code"), Some(&json!("000001")));
        assert_eq!(rows[0].get("name"), Some(&json!("华夏成长混合")));
        assert_eq!(rows[1].get("code"), Some(&json!("000003")));
    }

    #[test]
    fn test_listing_rows_no_matches() {
        assert!(listing_rows("var rankData = {datas:[]};").is_empty());
    }

    #[test]
    fn test_period_rows_maps_window_titles() {
        let payload = json!({
            "Datas": [
                { "title": "Z", "syl": "0.5", "avg": "0.3", "rank": "120", "sc": "900" },
                { "title": "LN", "syl": "241.0", "avg": "180.2", "rank": "15", "sc": "600" },
                { "title": "??", "syl": "1.0" },
            ]
        });

        let rows = period_rows(&payload, "000001");
        assert_eq!(rows.len(), 3);
        assert_eq!(rows[0].get("window"), Some(&json!("1w")));
        assert_eq!(rows[1].get("window"), Some(&json!("since-inception")));
        // Unknown period codes pass through untranslated.
        assert_eq!(rows[2].get("window"), Some(&json!("??")));
        assert_eq!(rows[0].get("code"), Some(&json!("000001")));
    }
}
