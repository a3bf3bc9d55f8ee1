//! 수집 명령 실행.

use std::time::Instant;

use chrono::{NaiveDate, Utc};
use chrono_tz::Asia::Taipei;
use futures::future::join_all;
use serde::Serialize;
use serde_json::{json, Map, Value};
use twmarket_core::{ListingMarket, Provider, Report, ScraperError};
use twmarket_data::{BoardReportSource, Scrapers, TaifexScraper};

use crate::stats::CollectionStats;

/// 단일 리포트 요청.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ReportRequest {
    Listed(ListingMarket),
    Trades(ListingMarket),
    Breadth(ListingMarket),
    Institutional(ListingMarket),
    Margin(ListingMarket),
    Txf,
    Txo,
    RetailMx,
    LargeTraders,
}

/// 대만 현지(Asia/Taipei) 기준 오늘 날짜.
pub fn today_in_taipei() -> NaiveDate {
    Utc::now().with_timezone(&Taipei).date_naive()
}

/// 레코드를 JSON으로 변환. 부재는 `null`.
fn to_json<T: Serialize>(record: Option<T>) -> anyhow::Result<Value> {
    Ok(serde_json::to_value(record)?)
}

/// 리포트 하나를 조회해 JSON으로 반환.
pub async fn fetch_report(
    scrapers: &Scrapers,
    request: ReportRequest,
    date: NaiveDate,
) -> anyhow::Result<Value> {
    let value = match request {
        ReportRequest::Listed(market) => {
            serde_json::to_value(scrapers.twse.fetch_listed_instruments(market).await?)?
        }
        ReportRequest::Trades(market) => {
            to_json(scrapers.board(market).fetch_market_trades(date).await?)?
        }
        ReportRequest::Breadth(market) => {
            to_json(scrapers.board(market).fetch_market_breadth(date).await?)?
        }
        ReportRequest::Institutional(market) => {
            to_json(scrapers.board(market).fetch_inst_investors_trades(date).await?)?
        }
        ReportRequest::Margin(market) => {
            to_json(scrapers.board(market).fetch_margin_transactions(date).await?)?
        }
        ReportRequest::Txf => to_json(scrapers.taifex.fetch_inst_investors_txf_trades(date).await?)?,
        ReportRequest::Txo => to_json(scrapers.taifex.fetch_inst_investors_txo_trades(date).await?)?,
        ReportRequest::RetailMx => to_json(scrapers.taifex.fetch_retail_mx_position(date).await?)?,
        ReportRequest::LargeTraders => {
            to_json(scrapers.taifex.fetch_large_traders_tx_position(date).await?)?
        }
    };

    Ok(value)
}

/// 일별 수집 대상 리포트.
///
/// 날짜와 무관한 리포트와, 같은 목록의 조합 리포트가 이미 조회하는 구성 리포트는 제외합니다.
pub fn daily_plan(reports: &[Report]) -> Vec<Report> {
    reports
        .iter()
        .copied()
        .filter(|report| report.is_dated())
        .filter(|report| {
            !reports
                .iter()
                .any(|other| other.components().contains(report))
        })
        .collect()
}

/// 레코드 결과를 JSON 결과로 변환.
fn into_value<T: Serialize>(
    result: twmarket_core::Result<Option<T>>,
) -> twmarket_core::Result<Option<Value>> {
    result?
        .map(serde_json::to_value)
        .transpose()
        .map_err(ScraperError::from)
}

fn unsupported(provider: Provider, report: Report) -> ScraperError {
    ScraperError::Config(format!("{} 리포트는 {}에서 제공하지 않음", report, provider))
}

async fn fetch_board_report(
    board: &dyn BoardReportSource,
    report: Report,
    date: NaiveDate,
) -> twmarket_core::Result<Option<Value>> {
    match report {
        Report::MarketTrades => into_value(board.fetch_market_trades(date).await),
        Report::MarketBreadth => into_value(board.fetch_market_breadth(date).await),
        Report::InstInvestorsTrades => into_value(board.fetch_inst_investors_trades(date).await),
        Report::MarginTransactions => into_value(board.fetch_margin_transactions(date).await),
        other => Err(unsupported(board.provider(), other)),
    }
}

async fn fetch_taifex_report(
    taifex: &TaifexScraper,
    report: Report,
    date: NaiveDate,
) -> twmarket_core::Result<Option<Value>> {
    match report {
        Report::InstInvestorsTxfTrades => {
            into_value(taifex.fetch_inst_investors_txf_trades(date).await)
        }
        Report::InstInvestorsTxoTrades => {
            into_value(taifex.fetch_inst_investors_txo_trades(date).await)
        }
        Report::MxfMarketOi => into_value(taifex.fetch_mxf_market_oi(date).await),
        Report::InstInvestorsMxfOi => into_value(taifex.fetch_inst_investors_mxf_oi(date).await),
        Report::RetailMxPosition => into_value(taifex.fetch_retail_mx_position(date).await),
        Report::LargeTradersTxPosition => {
            into_value(taifex.fetch_large_traders_tx_position(date).await)
        }
        other => Err(unsupported(Provider::Taifex, other)),
    }
}

/// 출력 JSON 키 (레코드와 같은 camelCase).
fn report_key(report: Report) -> String {
    match serde_json::to_value(report) {
        Ok(Value::String(key)) => key,
        _ => report.name().to_string(),
    }
}

/// 결과를 통계에 기록하고 리포트별 JSON 객체로 묶음 (실패는 `{"error": ...}`).
fn entries(
    stats: &mut CollectionStats,
    plan: &[Report],
    results: Vec<twmarket_core::Result<Option<Value>>>,
) -> Value {
    let entries: Map<String, Value> = plan
        .iter()
        .zip(results)
        .map(|(&report, result)| {
            stats.record(&result);
            let value = match result {
                Ok(record) => record.unwrap_or(Value::Null),
                Err(e) => {
                    tracing::error!(%report, error = %e, "리포트 수집 실패");
                    json!({ "error": e.to_string() })
                }
            };
            (report_key(report), value)
        })
        .collect();
    Value::Object(entries)
}

/// 주식 시장 하나의 일별 리포트 전체.
async fn collect_board(
    board: &dyn BoardReportSource,
    date: NaiveDate,
    stats: &mut CollectionStats,
) -> Value {
    let plan = daily_plan(board.reports());
    let results = join_all(
        plan.iter()
            .map(|&report| fetch_board_report(board, report, date)),
    )
    .await;
    entries(stats, &plan, results)
}

/// 선물거래소 일별 리포트 전체.
async fn collect_taifex(
    taifex: &TaifexScraper,
    date: NaiveDate,
    stats: &mut CollectionStats,
) -> Value {
    let plan = daily_plan(taifex.reports());
    let results = join_all(
        plan.iter()
            .map(|&report| fetch_taifex_report(taifex, report, date)),
    )
    .await;
    entries(stats, &plan, results)
}

/// 날짜 하나의 모든 일별 리포트 수집.
///
/// 리포트별 실패는 전체를 중단하지 않고 해당 항목에 오류로 남깁니다.
pub async fn collect_daily(scrapers: &Scrapers, date: NaiveDate) -> (Value, CollectionStats) {
    let started = Instant::now();
    let mut stats = CollectionStats::new();

    tracing::info!(%date, "=== 일별 리포트 수집 시작 ===");

    tracing::info!("Step 1/3: TWSE");
    let tse = collect_board(scrapers.board(ListingMarket::Tse), date, &mut stats).await;

    tracing::info!("Step 2/3: TPEx");
    let otc = collect_board(scrapers.board(ListingMarket::Otc), date, &mut stats).await;

    tracing::info!("Step 3/3: TAIFEX");
    let taifex = collect_taifex(&scrapers.taifex, date, &mut stats).await;

    stats.elapsed = started.elapsed();
    stats.log_summary("일별 리포트");

    let report = json!({
        "date": date,
        "tse": tse,
        "otc": otc,
        "taifex": taifex,
    });
    (report, stats)
}
