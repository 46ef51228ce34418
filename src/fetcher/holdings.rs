//! Portfolio disclosures: stock holdings, asset allocation, industry
//! distribution, and the dates they were published on.
//!
//! These endpoints are keyed by (fund code, disclosure date). Passing no
//! date asks the vendor for the most recent disclosure. Dates with nothing
//! published contribute no rows (the omit policy), matching how the vendor
//! reports them.

use crate::endpoint::{EndpointClient, FetchError};
use crate::fetcher::mobile_params;
use crate::models::Record;
use chrono::NaiveDate;
use serde_json::Value;
use tracing::info;

const HOLDINGS_RENAMES: &[(&str, &str)] = &[
    ("GPDM", "stock_code"),
    ("GPJC", "stock_name"),
    ("JZBL", "weight_pct"),
    ("PCTNVCHG", "change_from_prev"),
];

const ALLOCATION_RENAMES: &[(&str, &str)] = &[
    ("GP", "stock_pct"),
    ("ZQ", "bond_pct"),
    ("HB", "cash_pct"),
    ("JZC", "net_assets"),
    ("QT", "other_pct"),
];

const INDUSTRY_RENAMES: &[(&str, &str)] = &[
    ("HYMC", "industry"),
    ("ZJZBL", "weight_pct"),
    ("FSRQ", "published_date"),
    ("SZ", "market_value"),
];

/// Fetches the disclosed stock holdings of one fund for each requested date.
pub async fn stock_holdings(
    client: &EndpointClient,
    code: &str,
    dates: &[Option<NaiveDate>],
) -> Result<Vec<Record>, FetchError> {
    let mut rows = Vec::new();
    for date in dates {
        let mut params = mobile_params(&client.config().credentials);
        params.push(("FCODE", code.to_string()));
        if let Some(date) = date {
            params.push(("DATE", date.to_string()));
        }

        let url = client.api_url("FundMNInverstPosition");
        let payload = client.get_json(&url, &params).await?;
        rows.extend(holdings_rows(&payload, code, date.as_ref()));
    }
    info!(code, rows = rows.len(), "fetched stock holdings");
    Ok(rows)
}

pub(crate) fn holdings_rows(
    payload: &Value,
    code: &str,
    date: Option<&NaiveDate>,
) -> Vec<Record> {
    let Some(stocks) = payload["Datas"]["fundStocks"].as_array() else {
        return Vec::new();
    };
    stocks
        .iter()
        .map(|stock| {
            let mut record = Record::from_payload(stock, HOLDINGS_RENAMES);
            record.insert("code", Value::String(code.to_string()));
            if let Some(date) = date {
                record.insert("disclosure_date", Value::String(date.to_string()));
            }
            record
        })
        .collect()
}

/// Fetches the stock/bond/cash split of one fund for each requested date.
pub async fn asset_allocation(
    client: &EndpointClient,
    code: &str,
    dates: &[Option<NaiveDate>],
) -> Result<Vec<Record>, FetchError> {
    let mut rows = Vec::new();
    for date in dates {
        let mut params = mobile_params(&client.config().credentials);
        params.push(("FCODE", code.to_string()));
        if let Some(date) = date {
            params.push(("DATE", date.to_string()));
        }

        let url = client.api_url("FundMNAssetAllocationNew");
        let payload = client.get_json(&url, &params).await?;
        rows.extend(table_rows(&payload, ALLOCATION_RENAMES, code));
    }
    Ok(rows)
}

/// Fetches the industry weighting of one fund for each requested date.
/// The vendor repeats rows across adjacent disclosures, so the result is
/// deduplicated.
pub async fn industry_distribution(
    client: &EndpointClient,
    code: &str,
    dates: &[Option<NaiveDate>],
) -> Result<Vec<Record>, FetchError> {
    let mut rows = Vec::new();
    for date in dates {
        let mut params = mobile_params(&client.config().credentials);
        params.push(("FCODE", code.to_string()));
        if let Some(date) = date {
            params.push(("DATE", date.to_string()));
        }

        let url = client.api_url("FundMNSectorAllocation");
        let payload = client.get_json(&url, &params).await?;
        for row in table_rows(&payload, INDUSTRY_RENAMES, code) {
            if !rows.contains(&row) {
                rows.push(row);
            }
        }
    }
    Ok(rows)
}

/// Lists the dates a fund published portfolio disclosures on, newest first.
/// A null payload is the no-data shape and yields an empty list.
pub async fn disclosure_dates(
    client: &EndpointClient,
    code: &str,
) -> Result<Vec<String>, FetchError> {
    let mut params = mobile_params(&client.config().credentials);
    params.push(("FCODE", code.to_string()));

    let url = client.api_url("FundMNIVInfoMultiple");
    let payload = client.get_json(&url, &params).await?;

    let dates = payload["Datas"]
        .as_array()
        .map(|dates| {
            dates
                .iter()
                .filter_map(|d| d.as_str().map(str::to_string))
                .collect()
        })
        .unwrap_or_default();
    Ok(dates)
}

fn table_rows(payload: &Value, renames: &[(&str, &str)], code: &str) -> Vec<Record> {
    let Some(rows) = payload["Datas"].as_array() else {
        return Vec::new();
    };
    rows.iter()
        .map(|row| {
            let mut record = Record::from_payload(row, renames);
            record.insert("code", Value::String(code.to_string()));
            record
        })
        .collect()
}
