//! Net-asset-value history and realtime estimates.

use crate::endpoint::{EndpointClient, FetchError};
use crate::fetcher::mobile_params;
use crate::models::Record;
use serde_json::Value;
use tracing::info;

const HISTORY_RENAMES: &[(&str, &str)] = &[
    ("FSRQ", "date"),
    ("DWJZ", "unit_nav"),
    ("LJJZ", "cumulative_nav"),
    ("JZZZL", "change_pct"),
];

const ESTIMATE_RENAMES: &[(&str, &str)] = &[
    ("FCODE", "code"),
    ("SHORTNAME", "name"),
    ("GSZZL", "estimate_change_pct"),
    ("GZTIME", "estimate_time"),
];

/// Fetches the NAV history of one fund, newest first, up to `page_size` rows.
/// The vendor serves the full history in one page when `page_size` is large
/// enough (the CLI default is 40000).
pub async fn nav_history(
    client: &EndpointClient,
    code: &str,
    page_size: usize,
) -> Result<Vec<Record>, FetchError> {
    let mut params = mobile_params(&client.config().credentials);
    params.push(("FCODE", code.to_string()));
    params.push(("IsShareNet", "true".to_string()));
    params.push(("pageIndex", "1".to_string()));
    params.push(("pageSize", page_size.to_string()));

    let url = client.api_url("FundMNHisNetList");
    let payload = client.get_json(&url, &params).await?;
    let rows = history_rows(&payload);
    info!(code, rows = rows.len(), "fetched NAV history");
    Ok(rows)
}

pub(crate) fn history_rows(payload: &Value) -> Vec<Record> {
    let Some(rows) = payload["Datas"].as_array() else {
        return Vec::new();
    };
    rows.iter()
        .map(|row| {
            let mut record = Record::from_payload(row, HISTORY_RENAMES);
            coerce_number(&mut record, "unit_nav");
            coerce_number(&mut record, "cumulative_nav");
            record
        })
        .collect()
}

/// Fetches the realtime estimated change for a list of funds. This endpoint
/// takes all codes in one request (comma-joined), so it is not batched.
pub async fn realtime_estimates(
    client: &EndpointClient,
    codes: &[String],
) -> Result<Vec<Record>, FetchError> {
    let credentials = &client.config().credentials;
    let params = vec![
        ("pageIndex", "1".to_string()),
        ("pageSize", "300000".to_string()),
        ("Sort", String::new()),
        ("Fcodes", codes.join(",")),
        ("SortColumn", String::new()),
        ("IsShowSE", "false".to_string()),
        ("P", "F".to_string()),
        ("deviceid", credentials.device_id.clone()),
        ("plat", "Iphone".to_string()),
        ("product", "EFund".to_string()),
        ("version", "6.2.8".to_string()),
    ];

    let url = client.api_url("FundMNFInfo");
    let payload = client.get_json(&url, &params).await?;
    Ok(estimate_rows(&payload))
}

pub(crate) fn estimate_rows(payload: &Value) -> Vec<Record> {
    let Some(rows) = payload["Datas"].as_array() else {
        return Vec::new();
    };
    rows.iter()
        .map(|row| Record::from_payload(row, ESTIMATE_RENAMES))
        .collect()
}

/// The vendor serves NAV figures as strings; coerce the field to a number
/// where it parses, leaving unparseable values as-is.
fn coerce_number(record: &mut Record, field: &str) {
    let parsed = match record.get(field) {
        Some(Value::String(s)) => s.parse::<f64>().ok(),
        _ => None,
    };
    if let Some(number) = parsed.and_then(serde_json::Number::from_f64) {
        record.insert(field, Value::Number(number));
    }
}
