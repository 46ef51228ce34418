use chrono::NaiveDate;
use clap::{Parser, Subcommand};
use efund::fetcher::rankings::FundKind;
use std::path::PathBuf;

#[derive(Parser)]
#[command(name = "efund")]
#[command(about = "CLI tool for fetching fund NAVs, holdings, rankings and PDF reports from the Eastmoney mobile API")]
#[command(version)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Fetch the NAV history of one fund
    History {
        /// 6-digit fund code
        code: String,

        /// Rows per page; the default fetches the full history in one page
        #[arg(long, default_value = "40000")]
        page_size: usize,
    },

    /// Fetch realtime estimated changes for one or more funds
    Estimate {
        /// 6-digit fund codes
        #[arg(required = true)]
        codes: Vec<String>,
    },

    /// Fetch basic information for one or more funds (concurrent batch)
    Basics {
        /// 6-digit fund codes
        #[arg(required = true)]
        codes: Vec<String>,
    },

    /// Fetch disclosed stock holdings
    Holdings {
        /// 6-digit fund code
        code: String,

        /// Disclosure date (YYYY-MM-DD), repeatable; latest when omitted
        #[arg(long)]
        date: Vec<NaiveDate>,
    },

    /// Fetch the stock/bond/cash allocation split
    Allocation {
        /// 6-digit fund code
        code: String,

        /// Disclosure date (YYYY-MM-DD), repeatable; latest when omitted
        #[arg(long)]
        date: Vec<NaiveDate>,
    },

    /// Fetch the industry weighting of the portfolio
    Industries {
        /// 6-digit fund code
        code: String,

        /// Disclosure date (YYYY-MM-DD), repeatable; latest when omitted
        #[arg(long)]
        date: Vec<NaiveDate>,
    },

    /// Fetch staged performance, one row per time window
    Periods {
        /// 6-digit fund code
        code: String,
    },

    /// List the dates a fund published portfolio disclosures on
    PublicDates {
        /// 6-digit fund code
        code: String,
    },

    /// List all public open-end funds
    List {
        /// Fund kind filter (stock/gp, bond/zq)
        #[arg(long)]
        kind: Option<String>,
    },

    /// Download the most recent PDF reports of a fund (concurrent)
    Reports {
        /// 6-digit fund code
        code: String,

        /// Maximum number of reports, counted from the newest
        #[arg(long, default_value = "12")]
        max_count: usize,

        /// Destination directory (default from EFUND_DOWNLOAD_DIR or ./pdf)
        #[arg(short, long)]
        output: Option<PathBuf>,
    },
}

impl Commands {
    pub fn parse_fund_kind(kind: &str) -> Result<FundKind, anyhow::Error> {
        match kind.to_lowercase().as_str() {
            "gp" | "stock" => Ok(FundKind::Stock),
            "zq" | "bond" => Ok(FundKind::Bond),
            other => anyhow::bail!("Unsupported fund kind: {} (expected stock or bond)", other),
        }
    }

    /// Normalizes CLI dates into the fetcher shape: no dates means "latest".
    pub fn disclosure_dates(dates: &[NaiveDate]) -> Vec<Option<NaiveDate>> {
        if dates.is_empty() {
            vec![None]
        } else {
            dates.iter().copied().map(Some).collect()
        }
    }
}
