//! Integration tests for the collector commands with an in-memory transport.

use std::sync::Arc;

use async_trait::async_trait;
use chrono::NaiveDate;
use serde_json::Value;
use twmarket_collector::{collect_daily, fetch_report, ReportRequest};
use twmarket_core::{Result, ScraperError};
use twmarket_data::{Endpoints, Params, Scrapers, Transport};

/// Every exchange reports "no data": TWSE/TPEx with their JSON flags, TAIFEX with an HTML page.
struct HolidayTransport;

#[async_trait]
impl Transport for HolidayTransport {
    async fn get(&self, _url: &str, _query: &Params) -> Result<Vec<u8>> {
        Ok(br#"{"stat":"no data","iTotalRecords":0}"#.to_vec())
    }

    async fn post_form(&self, _url: &str, _form: &Params) -> Result<Vec<u8>> {
        Ok(b"<html><body>holiday</body></html>".to_vec())
    }
}

/// TWSE/TPEx work, TAIFEX is unreachable.
struct TaifexDownTransport;

#[async_trait]
impl Transport for TaifexDownTransport {
    async fn get(&self, _url: &str, _query: &Params) -> Result<Vec<u8>> {
        Ok(br#"{"stat":"no data","iTotalRecords":0}"#.to_vec())
    }

    async fn post_form(&self, url: &str, _form: &Params) -> Result<Vec<u8>> {
        Err(ScraperError::Transport(format!("connection refused: {}", url)))
    }
}

fn date() -> NaiveDate {
    NaiveDate::from_ymd_opt(2024, 2, 10).unwrap()
}

fn scrapers(transport: Arc<dyn Transport>) -> Scrapers {
    Scrapers::new(transport, &Endpoints::all("http://fake"))
}

#[tokio::test]
async fn test_single_report_absence_prints_null() {
    let scrapers = scrapers(Arc::new(HolidayTransport));

    for request in [
        ReportRequest::Trades(twmarket_core::ListingMarket::Otc),
        ReportRequest::Margin(twmarket_core::ListingMarket::Tse),
        ReportRequest::Txo,
        ReportRequest::RetailMx,
    ] {
        let value = fetch_report(&scrapers, request, date()).await.unwrap();
        assert_eq!(value, Value::Null, "{request:?}");
    }
}

#[tokio::test]
async fn test_single_report_error_propagates() {
    let scrapers = scrapers(Arc::new(TaifexDownTransport));

    let err = fetch_report(&scrapers, ReportRequest::LargeTraders, date())
        .await
        .unwrap_err();
    let scraper_error = err.downcast_ref::<ScraperError>().unwrap();
    assert!(scraper_error.is_transport());
}

#[tokio::test]
async fn test_collect_daily_on_holiday() {
    let (report, stats) = collect_daily(&scrapers(Arc::new(HolidayTransport)), date()).await;

    assert_eq!(stats.total, 12);
    assert_eq!(stats.absent, 12);
    assert_eq!(stats.errors, 0);
    assert_eq!(report["date"], "2024-02-10");
    assert_eq!(report["tse"]["marketTrades"], Value::Null);
    assert_eq!(report["otc"]["marginTransactions"], Value::Null);
    assert_eq!(report["taifex"]["retailMxPosition"], Value::Null);
}

#[tokio::test]
async fn test_collect_daily_keeps_going_after_failures() {
    let (report, stats) = collect_daily(&scrapers(Arc::new(TaifexDownTransport)), date()).await;

    assert_eq!(stats.total, 12);
    assert_eq!(stats.absent, 8);
    assert_eq!(stats.errors, 4);
    assert!(report["taifex"]["instInvestorsTxfTrades"]["error"]
        .as_str()
        .unwrap()
        .contains("connection refused"));
    assert_eq!(report["tse"]["marketBreadth"], Value::Null);
}
