//! TPEx (타이베이 거래소) 스크래퍼.
//!
//! 장외(OTC) 시장의 일별 리포트를 수집합니다. 모든 요청은 민국력 날짜
//! (`d=113/01/02`)를 사용하며, `iTotalRecords`가 0보다 클 때만 데이터가 있습니다.

use std::sync::Arc;

use async_trait::async_trait;
use chrono::NaiveDate;
use serde::Deserialize;
use serde_json::Value;
use tracing::instrument;
use twmarket_core::decode::{json_cell, json_rows};
use twmarket_core::table::{flatten_numbers, numeric_cells, value_at};
use twmarket_core::{
    margin_balance_changes, parse_json_envelope, parse_number, to_roc, Envelope,
    InstInvestorsTrades, MarginOffsets, MarginTransactions, MarketBreadth, MarketTrades,
    Provider, Report, Result, ScraperError,
};

use super::board::{market_trades_from_rows, BoardReportSource};
use super::{join_url, settle};
use crate::config::Endpoints;
use crate::transport::{Params, Transport};

const MARKET_TRADES_PATH: &str = "/web/stock/aftertrading/daily_trading_index/st41_result.php";
const MARKET_BREADTH_PATH: &str = "/web/stock/aftertrading/market_highlight/highlight_result.php";
const INST_INVESTORS_PATH: &str = "/web/stock/3insti/3insti_summary/3itridsum_result.php";
const MARGIN_PATH: &str = "/web/stock/margin_trading/margin_balance/margin_bal_result.php";

/// 3itridsum 평탄화 위치.
mod inst_layout {
    pub const FINI: usize = 2;
    pub const SITC: usize = 11;
    pub const DEALERS: usize = 14;
}

/// 신용거래 합계 행 (`tfootData_one` + `tfootData_two`, 숫자 셀만) 위치.
const MARGIN_OFFSETS: MarginOffsets = MarginOffsets {
    margin_balance: (4, 0),
    margin_balance_value: (14, 10),
    short_balance: (9, 5),
};

// ==================== 응답 타입 ====================

/// TPEx JSON 응답.
///
/// 숫자 필드가 문자열로 오기도 하므로 원시 JSON 값으로 받습니다.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TpexResponse {
    #[serde(default)]
    pub i_total_records: Value,
    #[serde(default)]
    pub aa_data: Vec<Vec<Value>>,
    #[serde(default, rename = "tfootData_one")]
    pub tfoot_data_one: Vec<Value>,
    #[serde(default, rename = "tfootData_two")]
    pub tfoot_data_two: Vec<Value>,

    // 시장 요약 (highlight_result)
    #[serde(default)]
    pub up_num: Option<Value>,
    #[serde(default)]
    pub up_stop_num: Option<Value>,
    #[serde(default)]
    pub down_num: Option<Value>,
    #[serde(default)]
    pub down_stop_num: Option<Value>,
    #[serde(default)]
    pub no_change_num: Option<Value>,
    #[serde(default)]
    pub matched_num: Option<Value>,
}

impl Envelope for TpexResponse {
    fn has_data(&self) -> bool {
        let total = match &self.i_total_records {
            Value::Number(n) => n.as_f64(),
            Value::String(s) => s.trim().parse::<f64>().ok(),
            _ => None,
        };
        total.is_some_and(|n| n > 0.0)
    }
}

/// 필수 요약 필드를 숫자로 파싱.
fn summary_field(value: &Option<Value>, name: &str) -> Result<rust_decimal::Decimal> {
    let value = value
        .as_ref()
        .ok_or_else(|| ScraperError::Parse(format!("요약 필드 없음: {}", name)))?;
    parse_number(&json_cell(value))
}

// ==================== 추출기 ====================

/// st41 월간 표에서 요청 날짜의 시장 거래 추출.
pub fn extract_market_trades(
    response: &TpexResponse,
    date: NaiveDate,
) -> Result<Option<MarketTrades>> {
    market_trades_from_rows(&json_rows(&response.aa_data), date)
}

/// 시장 요약의 등락 종목 수 추출.
///
/// 미체결 종목 수는 `matchedNum` 필드를 그대로 사용합니다.
pub fn extract_market_breadth(response: &TpexResponse, date: NaiveDate) -> Result<MarketBreadth> {
    Ok(MarketBreadth {
        date,
        up: summary_field(&response.up_num, "upNum")?,
        limit_up: summary_field(&response.up_stop_num, "upStopNum")?,
        down: summary_field(&response.down_num, "downNum")?,
        limit_down: summary_field(&response.down_stop_num, "downStopNum")?,
        unchanged: summary_field(&response.no_change_num, "noChangeNum")?,
        unmatched: summary_field(&response.matched_num, "matchedNum")?,
    })
}

/// 3대 법인 매매 요약에서 순매수 추출.
pub fn extract_inst_investors_trades(
    response: &TpexResponse,
    date: NaiveDate,
) -> Result<InstInvestorsTrades> {
    let values = flatten_numbers(&json_rows(&response.aa_data))?;

    Ok(InstInvestorsTrades {
        date,
        fini_net_buy_sell: value_at(&values, inst_layout::FINI)?,
        sitc_net_buy_sell: value_at(&values, inst_layout::SITC)?,
        dealers_net_buy_sell: value_at(&values, inst_layout::DEALERS)?,
    })
}

/// 신용거래 합계 행에서 잔고와 증감 추출.
///
/// 라벨/빈 셀을 제외한 숫자 셀만 위치 계산에 사용합니다 (0은 유지).
pub fn extract_margin_transactions(
    response: &TpexResponse,
    date: NaiveDate,
) -> Result<MarginTransactions> {
    let cells: Vec<String> = response
        .tfoot_data_one
        .iter()
        .chain(response.tfoot_data_two.iter())
        .map(json_cell)
        .collect();
    let values = numeric_cells(&cells)?;

    margin_balance_changes(date, &values, &MARGIN_OFFSETS)
}

// ==================== 스크래퍼 ====================

/// TPEx 스크래퍼.
#[derive(Clone)]
pub struct TpexScraper {
    transport: Arc<dyn Transport>,
    base_url: String,
}

impl TpexScraper {
    /// 새 스크래퍼 생성.
    pub fn new(transport: Arc<dyn Transport>, endpoints: &Endpoints) -> Self {
        Self {
            transport,
            base_url: endpoints.tpex.clone(),
        }
    }

    /// 리포트 JSON 조회. `iTotalRecords`가 0이면 `None`.
    async fn fetch_envelope(
        &self,
        path: &str,
        date: NaiveDate,
        extra: &[(&'static str, &str)],
    ) -> Result<Option<TpexResponse>> {
        let mut query: Params = vec![("d", to_roc(date).to_string())];
        query.extend(extra.iter().map(|(k, v)| (*k, v.to_string())));
        query.push(("o", "json".to_string()));

        let url = join_url(&self.base_url, path);
        let body = self.transport.get(&url, &query).await?;
        parse_json_envelope(&body)
    }
}

#[async_trait]
impl BoardReportSource for TpexScraper {
    fn provider(&self) -> Provider {
        Provider::Tpex
    }

    fn reports(&self) -> &'static [Report] {
        &[
            Report::MarketTrades,
            Report::MarketBreadth,
            Report::InstInvestorsTrades,
            Report::MarginTransactions,
        ]
    }

    #[instrument(skip(self))]
    async fn fetch_market_trades(&self, date: NaiveDate) -> Result<Option<MarketTrades>> {
        let result = async {
            match self.fetch_envelope(MARKET_TRADES_PATH, date, &[]).await? {
                Some(response) => extract_market_trades(&response, date),
                None => Ok(None),
            }
        }
        .await;

        settle(Provider::Tpex, Report::MarketTrades, date, result)
    }

    #[instrument(skip(self))]
    async fn fetch_market_breadth(&self, date: NaiveDate) -> Result<Option<MarketBreadth>> {
        let result = async {
            self.fetch_envelope(MARKET_BREADTH_PATH, date, &[])
                .await?
                .map(|response| extract_market_breadth(&response, date))
                .transpose()
        }
        .await;

        settle(Provider::Tpex, Report::MarketBreadth, date, result)
    }

    #[instrument(skip(self))]
    async fn fetch_inst_investors_trades(
        &self,
        date: NaiveDate,
    ) -> Result<Option<InstInvestorsTrades>> {
        let result = async {
            self.fetch_envelope(INST_INVESTORS_PATH, date, &[("t", "D")])
                .await?
                .map(|response| extract_inst_investors_trades(&response, date))
                .transpose()
        }
        .await;

        settle(Provider::Tpex, Report::InstInvestorsTrades, date, result)
    }

    #[instrument(skip(self))]
    async fn fetch_margin_transactions(
        &self,
        date: NaiveDate,
    ) -> Result<Option<MarginTransactions>> {
        let result = async {
            self.fetch_envelope(MARGIN_PATH, date, &[])
                .await?
                .map(|response| extract_margin_transactions(&response, date))
                .transpose()
        }
        .await;

        settle(Provider::Tpex, Report::MarginTransactions, date, result)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;
    use serde_json::json;

    fn date() -> NaiveDate {
        NaiveDate::from_ymd_opt(2024, 1, 2).unwrap()
    }

    fn response(value: Value) -> TpexResponse {
        serde_json::from_value(value).unwrap()
    }

    #[test]
    fn test_total_records_gate() {
        assert!(parse_json_envelope::<TpexResponse>(br#"{"iTotalRecords":3}"#)
            .unwrap()
            .is_some());
        assert!(parse_json_envelope::<TpexResponse>(br#"{"iTotalRecords":"3"}"#)
            .unwrap()
            .is_some());
        assert!(parse_json_envelope::<TpexResponse>(br#"{"iTotalRecords":0,"aaData":[]}"#)
            .unwrap()
            .is_none());
        assert!(parse_json_envelope::<TpexResponse>(br#"{}"#).unwrap().is_none());
    }

    #[test]
    fn test_extract_market_trades() {
        let response = response(json!({
            "iTotalRecords": 2,
            "aaData": [
                ["113/01/02", "450,123", "12,345,678", "234,567", "231.45", "-1.23"],
                ["113/01/03", "460,000", "13,000,000", "240,000", "229.80", "-1.65"]
            ]
        }));

        let trades = extract_market_trades(&response, date()).unwrap().unwrap();
        assert_eq!(trades.trade_volume, dec!(450123));
        assert_eq!(trades.price, dec!(231.45));
        assert_eq!(trades.change, dec!(-1.23));
    }

    #[test]
    fn test_extract_market_breadth_mixed_types() {
        let response = response(json!({
            "iTotalRecords": 1,
            "upNum": 412,
            "upStopNum": "15",
            "downNum": "1,023",
            "downStopNum": 3,
            "noChangeNum": 88,
            "matchedNum": "7"
        }));

        let breadth = extract_market_breadth(&response, date()).unwrap();
        assert_eq!(breadth.up, dec!(412));
        assert_eq!(breadth.limit_up, dec!(15));
        assert_eq!(breadth.down, dec!(1023));
        assert_eq!(breadth.limit_down, dec!(3));
        assert_eq!(breadth.unchanged, dec!(88));
        assert_eq!(breadth.unmatched, dec!(7));
    }

    #[test]
    fn test_extract_market_breadth_missing_field_is_parse_error() {
        let response = response(json!({ "iTotalRecords": 1, "upNum": 1 }));
        assert!(extract_market_breadth(&response, date()).unwrap_err().is_parse());
    }

    #[test]
    fn test_extract_inst_investors_trades() {
        let response = response(json!({
            "iTotalRecords": 5,
            "aaData": [
                ["外資及陸資(不含外資自營商)", "10,000", "8,000", "2,000"],
                ["外資自營商", "0", "0", "0"],
                ["外資及陸資合計", "10,000", "8,000", "2,000"],
                ["投信", "3,000", "2,500", "500"],
                ["自營商合計", "1,500", "2,000", "-500"]
            ]
        }));

        let trades = extract_inst_investors_trades(&response, date()).unwrap();
        assert_eq!(trades.fini_net_buy_sell, dec!(2000));
        assert_eq!(trades.sitc_net_buy_sell, dec!(500));
        assert_eq!(trades.dealers_net_buy_sell, dec!(-500));
    }

    #[test]
    fn test_extract_margin_transactions_keeps_zero_cells() {
        let response = response(json!({
            "iTotalRecords": 700,
            "tfootData_one": ["", "合計(張)", "120,000", "3,000", "2,000", "0", "121,000"],
            "tfootData_two": [
                "", "", "10,000", "400", "300", "20", "10,080",
                "", "", "3,100,000", "50,000", "40,000", "0", "3,110,000"
            ]
        }));

        // 숫자 셀: [120000, 3000, 2000, 0, 121000,
        //          10000, 400, 300, 20, 10080,
        //          3100000, 50000, 40000, 0, 3110000]
        let margin = extract_margin_transactions(&response, date()).unwrap();
        assert_eq!(margin.margin_balance, dec!(121000));
        assert_eq!(margin.margin_balance_change, dec!(1000));
        assert_eq!(margin.short_balance, dec!(10080));
        assert_eq!(margin.short_balance_change, dec!(80));
        assert_eq!(margin.margin_balance_value, dec!(3110000));
        assert_eq!(margin.margin_balance_value_change, dec!(10000));
    }

    #[test]
    fn test_extract_margin_transactions_short_footer_is_parse_error() {
        let response = response(json!({
            "iTotalRecords": 1,
            "tfootData_one": ["合計", "1", "2"]
        }));
        assert!(extract_margin_transactions(&response, date())
            .unwrap_err()
            .is_parse());
    }
}
