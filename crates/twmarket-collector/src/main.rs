//! Taiwan market daily-report collector CLI.

use chrono::NaiveDate;
use clap::{Parser, Subcommand};
use twmarket_collector::{collect_daily, fetch_report, today_in_taipei, ReportRequest};
use twmarket_core::logging::{init_logging, LogConfig};
use twmarket_core::ListingMarket;
use twmarket_data::{ScraperConfig, Scrapers};

#[derive(Parser)]
#[command(name = "twmarket-collector")]
#[command(about = "Taiwan market daily report collector (TWSE, TPEx, TAIFEX)", long_about = None)]
#[command(version)]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// 로그 레벨 (trace, debug, info, warn, error). 지정하면 RUST_LOG보다 우선
    #[arg(long, global = true)]
    log_level: Option<String>,

    /// 조회 날짜 (YYYY-MM-DD, 기본값: 대만 기준 오늘)
    #[arg(long, global = true)]
    date: Option<NaiveDate>,
}

#[derive(Subcommand)]
enum Commands {
    /// 종목 목록 (ISIN)
    Listed {
        /// 시장 (tse, otc)
        #[arg(long, default_value = "tse")]
        market: ListingMarket,
    },

    /// 시장 거래량/거래대금
    Trades {
        #[arg(long, default_value = "tse")]
        market: ListingMarket,
    },

    /// 등락 종목 수
    Breadth {
        #[arg(long, default_value = "tse")]
        market: ListingMarket,
    },

    /// 3대 법인 순매수
    Institutional {
        #[arg(long, default_value = "tse")]
        market: ListingMarket,
    },

    /// 신용거래 잔고
    Margin {
        #[arg(long, default_value = "tse")]
        market: ListingMarket,
    },

    /// 법인 TXF 순미결제약정
    Txf,

    /// 법인 TXO 콜/풋 순미결제약정
    Txo,

    /// 개인 MXF 포지션
    RetailMx,

    /// 상위 10대 거래자 TX 포지션
    LargeTraders,

    /// 해당 날짜의 모든 일별 리포트
    Daily,
}

impl Commands {
    fn request(&self) -> Option<ReportRequest> {
        let request = match *self {
            Commands::Listed { market } => ReportRequest::Listed(market),
            Commands::Trades { market } => ReportRequest::Trades(market),
            Commands::Breadth { market } => ReportRequest::Breadth(market),
            Commands::Institutional { market } => ReportRequest::Institutional(market),
            Commands::Margin { market } => ReportRequest::Margin(market),
            Commands::Txf => ReportRequest::Txf,
            Commands::Txo => ReportRequest::Txo,
            Commands::RetailMx => ReportRequest::RetailMx,
            Commands::LargeTraders => ReportRequest::LargeTraders,
            Commands::Daily => return None,
        };
        Some(request)
    }
}

/// 환경변수 설정에 `--log-level`을 덮어씀.
fn log_config(cli: &Cli) -> LogConfig {
    let config = LogConfig::from_env();
    match &cli.log_level {
        Some(level) => config.with_level(level),
        None => config,
    }
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    // 로깅 초기화
    init_logging(log_config(&cli)).map_err(|e| anyhow::anyhow!("로깅 초기화 실패: {}", e))?;

    // 설정 로드
    let config = ScraperConfig::from_env();
    tracing::debug!(endpoints = ?config.endpoints, "설정 로드 완료");

    let scrapers = Scrapers::from_config(&config)?;
    let date = cli.date.unwrap_or_else(today_in_taipei);

    let output = match cli.command.request() {
        Some(request) => {
            tracing::info!(?request, %date, "리포트 조회");
            fetch_report(&scrapers, request, date).await?
        }
        None => {
            let (report, stats) = collect_daily(&scrapers, date).await;
            if stats.errors > 0 {
                tracing::warn!(errors = stats.errors, "일부 리포트 수집 실패");
            }
            report
        }
    };

    println!("{}", serde_json::to_string_pretty(&output)?);
    Ok(())
}
