//! TAIFEX (대만선물거래소) 스크래퍼.
//!
//! 모든 리포트는 form POST로 요청하며 Big5 CSV로 응답합니다.
//! 헤더 행 첫 셀(표식)이 기대값과 같을 때만 해당 날짜 데이터가 있습니다.
//! 데이터가 없는 날에는 표식이 다르거나 HTML 안내 페이지가 옵니다.
//!
//! # 리포트
//!
//! | 리포트 | 경로 | 표식 |
//! |--------|------|------|
//! | 법인 TXF 순미결제 | `/cht/3/futContractsDateDown` (TXF) | `日期` |
//! | 법인 TXO 순미결제 | `/cht/3/callsAndPutsDateDown` (TXO) | `日期` |
//! | MXF 시장 미결제 | `/cht/3/futDataDown` (MTX) | `交易日期` |
//! | 법인 MXF 미결제 | `/cht/3/futContractsDateDown` (MXF) | `日期` |
//! | 대형 거래자 TX | `/cht/3/largeTraderFutDown` | `日期` |
//!
//! 개인 MXF 포지션은 두 MXF 리포트를 동시에 조회해 계산합니다.

use std::sync::Arc;

use chrono::NaiveDate;
use rust_decimal::Decimal;
use tracing::instrument;
use twmarket_core::calendar::{lookback_start, slash_date, slash_datetime};
use twmarket_core::decode::looks_like_html;
use twmarket_core::{
    compose_retail_position, decode, net_large_traders, parse_tabular, InstInvestorsMxfOi,
    InstInvestorsTxfTrades, InstInvestorsTxoTrades, LargeTraderRows, LargeTradersTxPosition,
    LongShort, MxfMarketOi, Provider, RawTable, Report, Result, RetailMxPosition, TableOptions,
    TextEncoding,
};

use super::{join_url, settle};
use crate::config::Endpoints;
use crate::transport::{Params, Transport};

const FUT_CONTRACTS_PATH: &str = "/cht/3/futContractsDateDown";
const CALLS_AND_PUTS_PATH: &str = "/cht/3/callsAndPutsDateDown";
const FUT_DATA_PATH: &str = "/cht/3/futDataDown";
const LARGE_TRADER_PATH: &str = "/cht/3/largeTraderFutDown";

/// 법인별 리포트 표식.
const DATE_MARKER: &str = "日期";
/// 일별 시세 리포트 표식.
const TRADE_DATE_MARKER: &str = "交易日期";

/// 법인별 데이터 행 위치 (헤더 제외).
mod category_rows {
    pub const DEALERS: usize = 0;
    pub const SITC: usize = 1;
    pub const FINI: usize = 2;
}

/// futContractsDateDown 열 위치.
mod fut_contracts_cols {
    pub const LONG_OI: usize = 9;
    pub const SHORT_OI: usize = 11;
    pub const NET_OI: usize = 13;
}

/// callsAndPutsDateDown 레이아웃. 콜 3행 다음에 풋 3행이 옵니다.
mod calls_and_puts_layout {
    pub const PUTS_OFFSET: usize = 3;
    pub const NET_OI: usize = 14;
    pub const NET_OI_VALUE: usize = 15;
}

/// futDataDown 열 위치.
mod fut_data_cols {
    pub const OPEN_INTEREST: usize = 11;
    pub const SESSION: usize = 17;
    pub const SPREAD_FLAG: usize = 18;
    /// 일반 거래 시간
    pub const REGULAR_SESSION: &str = "一般";
}

/// largeTraderFutDown 레이아웃 (계약 코드로 거른 뒤의 행 위치).
mod large_trader_layout {
    pub const CONTRACT: usize = 1;
    pub const TX_CONTRACT: &str = "TX";

    pub const FRONT_MONTH_ALL: usize = 2;
    pub const FRONT_MONTH_SPECIFIC: usize = 3;
    pub const ALL_MONTHS_ALL: usize = 4;
    pub const ALL_MONTHS_SPECIFIC: usize = 5;

    pub const LONG_OI: usize = 7;
    pub const SHORT_OI: usize = 8;
    pub const MARKET_OI: usize = 9;
}

// ==================== 추출기 ====================

/// 법인 TXF 순미결제약정 추출.
pub fn extract_inst_investors_txf_trades(
    table: &RawTable,
    date: NaiveDate,
) -> Result<Option<InstInvestorsTxfTrades>> {
    use category_rows::*;
    use fut_contracts_cols::NET_OI;

    if !table.has_marker(DATE_MARKER) {
        return Ok(None);
    }

    Ok(Some(InstInvestorsTxfTrades {
        date,
        fini_txf_net_oi: table.number_at(FINI, NET_OI)?,
        sitc_txf_net_oi: table.number_at(SITC, NET_OI)?,
        dealers_txf_net_oi: table.number_at(DEALERS, NET_OI)?,
    }))
}

/// 법인 TXO 콜/풋 순미결제약정 및 금액 추출.
pub fn extract_inst_investors_txo_trades(
    table: &RawTable,
    date: NaiveDate,
) -> Result<Option<InstInvestorsTxoTrades>> {
    use calls_and_puts_layout::*;
    use category_rows::*;

    if !table.has_marker(DATE_MARKER) {
        return Ok(None);
    }

    let calls = |row: usize, col: usize| table.number_at(row, col);
    let puts = |row: usize, col: usize| table.number_at(PUTS_OFFSET + row, col);

    Ok(Some(InstInvestorsTxoTrades {
        date,
        fini_txo_calls_net_oi: calls(FINI, NET_OI)?,
        fini_txo_calls_net_oi_value: calls(FINI, NET_OI_VALUE)?,
        sitc_txo_calls_net_oi: calls(SITC, NET_OI)?,
        sitc_txo_calls_net_oi_value: calls(SITC, NET_OI_VALUE)?,
        dealers_txo_calls_net_oi: calls(DEALERS, NET_OI)?,
        dealers_txo_calls_net_oi_value: calls(DEALERS, NET_OI_VALUE)?,
        fini_txo_puts_net_oi: puts(FINI, NET_OI)?,
        fini_txo_puts_net_oi_value: puts(FINI, NET_OI_VALUE)?,
        sitc_txo_puts_net_oi: puts(SITC, NET_OI)?,
        sitc_txo_puts_net_oi_value: puts(SITC, NET_OI_VALUE)?,
        dealers_txo_puts_net_oi: puts(DEALERS, NET_OI)?,
        dealers_txo_puts_net_oi_value: puts(DEALERS, NET_OI_VALUE)?,
    }))
}

/// MXF 시장 미결제약정 추출.
///
/// 일반 거래 시간이면서 스프레드 구분 셀이 채워진 행의 미결제약정을 합산합니다.
pub fn extract_mxf_market_oi(table: &RawTable, date: NaiveDate) -> Result<Option<MxfMarketOi>> {
    use fut_data_cols::*;

    if !table.has_marker(TRADE_DATE_MARKER) {
        return Ok(None);
    }

    let regular = table.filter_rows(|row| {
        row.cells().get(SESSION).map(|c| c.trim()) == Some(REGULAR_SESSION)
            && row.is_filled(SPREAD_FLAG)
    });

    let mut mxf_market_oi = Decimal::ZERO;
    for row in &regular.rows {
        mxf_market_oi += row.number(OPEN_INTEREST)?;
    }

    Ok(Some(MxfMarketOi {
        date,
        mxf_market_oi,
    }))
}

/// 법인 MXF 매수/매도 미결제약정 합계 추출 (세 법인 각자의 행).
pub fn extract_inst_investors_mxf_oi(
    table: &RawTable,
    date: NaiveDate,
) -> Result<Option<InstInvestorsMxfOi>> {
    use category_rows::*;
    use fut_contracts_cols::{LONG_OI, SHORT_OI};

    if !table.has_marker(DATE_MARKER) {
        return Ok(None);
    }

    let mut long = Decimal::ZERO;
    let mut short = Decimal::ZERO;
    for row in [DEALERS, SITC, FINI] {
        long += table.number_at(row, LONG_OI)?;
        short += table.number_at(row, SHORT_OI)?;
    }

    Ok(Some(InstInvestorsMxfOi {
        date,
        inst_investors_mxf_long_oi: long,
        inst_investors_mxf_short_oi: short,
    }))
}

/// 대형 거래자 TX 포지션 추출.
pub fn extract_large_traders_tx_position(
    table: &RawTable,
    date: NaiveDate,
) -> Result<Option<LargeTradersTxPosition>> {
    use large_trader_layout::*;

    if !table.has_marker(DATE_MARKER) {
        return Ok(None);
    }

    let tx = table.filter_rows(|row| {
        row.cells().get(CONTRACT).map(|c| c.trim()) == Some(TX_CONTRACT)
    });
    let long_short = |row: usize| -> Result<LongShort> {
        Ok(LongShort::new(
            tx.number_at(row, LONG_OI)?,
            tx.number_at(row, SHORT_OI)?,
        ))
    };

    let rows = LargeTraderRows {
        front_month_all: long_short(FRONT_MONTH_ALL)?,
        front_month_specific: long_short(FRONT_MONTH_SPECIFIC)?,
        all_months_all: long_short(ALL_MONTHS_ALL)?,
        all_months_specific: long_short(ALL_MONTHS_SPECIFIC)?,
        all_months_market_oi: tx.number_at(ALL_MONTHS_ALL, MARKET_OI)?,
    };

    Ok(Some(net_large_traders(date, &rows)))
}

/// Big5 CSV 응답을 표로 변환. HTML 안내 페이지는 `None`.
pub fn decode_csv(body: &[u8]) -> Result<Option<RawTable>> {
    let head = body
        .iter()
        .position(|b| !b.is_ascii_whitespace())
        .map(|i| &body[i..])
        .unwrap_or_default();
    if head.starts_with(b"<") {
        return Ok(None);
    }

    let text = decode(body, TextEncoding::Big5)?;
    if looks_like_html(&text) {
        return Ok(None);
    }

    parse_tabular(&text, TableOptions::default()).map(Some)
}

// ==================== 스크래퍼 ====================

/// TAIFEX 스크래퍼.
#[derive(Clone)]
pub struct TaifexScraper {
    transport: Arc<dyn Transport>,
    base_url: String,
}

impl TaifexScraper {
    /// 새 스크래퍼 생성.
    pub fn new(transport: Arc<dyn Transport>, endpoints: &Endpoints) -> Self {
        Self {
            transport,
            base_url: endpoints.taifex.clone(),
        }
    }

    /// 조회할 수 있는 리포트. 개인 MXF 포지션은 두 MXF 리포트의 조합입니다.
    pub fn reports(&self) -> &'static [Report] {
        &[
            Report::InstInvestorsTxfTrades,
            Report::InstInvestorsTxoTrades,
            Report::MxfMarketOi,
            Report::InstInvestorsMxfOi,
            Report::RetailMxPosition,
            Report::LargeTradersTxPosition,
        ]
    }

    /// 조회 기간 (당일 하루).
    fn date_range(date: NaiveDate) -> Params {
        vec![
            ("queryStartDate", slash_date(date)),
            ("queryEndDate", slash_date(date)),
        ]
    }

    /// 법인별 리포트 form (조회 가능 기간 포함).
    fn contracts_form(date: NaiveDate, commodity_id: &str) -> Params {
        let mut form = Self::date_range(date);
        form.push(("commodityId", commodity_id.to_string()));
        form.push(("firstDate", slash_datetime(lookback_start(date))));
        form.push(("lastDate", slash_datetime(date)));
        form
    }

    async fn fetch_table(&self, path: &str, form: Params) -> Result<Option<RawTable>> {
        let url = join_url(&self.base_url, path);
        let body = self.transport.post_form(&url, &form).await?;
        decode_csv(&body)
    }

    /// 법인 TXF 순미결제약정.
    #[instrument(skip(self))]
    pub async fn fetch_inst_investors_txf_trades(
        &self,
        date: NaiveDate,
    ) -> Result<Option<InstInvestorsTxfTrades>> {
        let result = async {
            match self
                .fetch_table(FUT_CONTRACTS_PATH, Self::contracts_form(date, "TXF"))
                .await?
            {
                Some(table) => extract_inst_investors_txf_trades(&table, date),
                None => Ok(None),
            }
        }
        .await;

        settle(Provider::Taifex, Report::InstInvestorsTxfTrades, date, result)
    }

    /// 법인 TXO 콜/풋 순미결제약정.
    #[instrument(skip(self))]
    pub async fn fetch_inst_investors_txo_trades(
        &self,
        date: NaiveDate,
    ) -> Result<Option<InstInvestorsTxoTrades>> {
        let result = async {
            match self
                .fetch_table(CALLS_AND_PUTS_PATH, Self::contracts_form(date, "TXO"))
                .await?
            {
                Some(table) => extract_inst_investors_txo_trades(&table, date),
                None => Ok(None),
            }
        }
        .await;

        settle(Provider::Taifex, Report::InstInvestorsTxoTrades, date, result)
    }

    /// MXF 시장 미결제약정 (일반 거래 시간).
    #[instrument(skip(self))]
    pub async fn fetch_mxf_market_oi(&self, date: NaiveDate) -> Result<Option<MxfMarketOi>> {
        let mut form: Params = vec![("down_type", "1".to_string())];
        form.extend(Self::date_range(date));
        form.push(("commodity_id", "MTX".to_string()));

        let result = async {
            match self.fetch_table(FUT_DATA_PATH, form).await? {
                Some(table) => extract_mxf_market_oi(&table, date),
                None => Ok(None),
            }
        }
        .await;

        settle(Provider::Taifex, Report::MxfMarketOi, date, result)
    }

    /// 법인 MXF 매수/매도 미결제약정.
    #[instrument(skip(self))]
    pub async fn fetch_inst_investors_mxf_oi(
        &self,
        date: NaiveDate,
    ) -> Result<Option<InstInvestorsMxfOi>> {
        let mut form = Self::date_range(date);
        form.push(("commodityId", "MXF".to_string()));

        let result = async {
            match self.fetch_table(FUT_CONTRACTS_PATH, form).await? {
                Some(table) => extract_inst_investors_mxf_oi(&table, date),
                None => Ok(None),
            }
        }
        .await;

        settle(Provider::Taifex, Report::InstInvestorsMxfOi, date, result)
    }

    /// 개인 MXF 포지션.
    ///
    /// 시장/법인 미결제약정을 동시에 조회합니다. 하나라도 실패하면 실패,
    /// 하나라도 없으면 `None`입니다.
    #[instrument(skip(self))]
    pub async fn fetch_retail_mx_position(
        &self,
        date: NaiveDate,
    ) -> Result<Option<RetailMxPosition>> {
        let (market, institutional) = tokio::try_join!(
            self.fetch_mxf_market_oi(date),
            self.fetch_inst_investors_mxf_oi(date)
        )?;

        let (Some(market), Some(institutional)) = (market, institutional) else {
            tracing::info!(%date, "MXF 구성 리포트 없음, 개인 포지션 계산 생략");
            return Ok(None);
        };

        let position = compose_retail_position(Some(&market), Some(&institutional));
        if let Some(position) = &position {
            tracing::info!(
                %date,
                net_oi = %position.retail_mxf_net_oi,
                ratio = %position.retail_mxf_long_short_ratio,
                "개인 MXF 포지션 계산 완료"
            );
        }
        Ok(position)
    }

    /// 상위 10대 거래자 TX 포지션.
    #[instrument(skip(self))]
    pub async fn fetch_large_traders_tx_position(
        &self,
        date: NaiveDate,
    ) -> Result<Option<LargeTradersTxPosition>> {
        let result = async {
            match self
                .fetch_table(LARGE_TRADER_PATH, Self::date_range(date))
                .await?
            {
                Some(table) => extract_large_traders_tx_position(&table, date),
                None => Ok(None),
            }
        }
        .await;

        settle(Provider::Taifex, Report::LargeTradersTxPosition, date, result)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    fn date() -> NaiveDate {
        NaiveDate::from_ymd_opt(2024, 1, 2).unwrap()
    }

    fn table(csv: &str) -> RawTable {
        parse_tabular(csv, TableOptions::default()).unwrap()
    }

    /// futContractsDateDown 형식 행 (열 9 매수 OI, 11 매도 OI, 13 순 OI).
    fn contracts_row(identity: &str, long: &str, short: &str, net: &str) -> String {
        format!(
            "2024/01/02,臺股期貨,{identity},1,1,1,1,0,0,{long},0,{short},0,{net}\n"
        )
    }

    #[test]
    fn test_extract_txf_trades() {
        let csv = format!(
            "日期,商品名稱,身份別,多方交易口數,多方交易契約金額,空方交易口數,空方交易契約金額,多空交易口數淨額,多空交易契約金額淨額,多方未平倉口數,多方未平倉契約金額,空方未平倉口數,空方未平倉契約金額,多空未平倉口數淨額\n{}{}{}",
            contracts_row("自營商", "10000", "12000", "-2000"),
            contracts_row("投信", "30000", "5000", "25000"),
            contracts_row("外資及陸資", "40000", "60123", "-20123"),
        );

        let trades = extract_inst_investors_txf_trades(&table(&csv), date())
            .unwrap()
            .unwrap();
        assert_eq!(trades.dealers_txf_net_oi, dec!(-2000));
        assert_eq!(trades.sitc_txf_net_oi, dec!(25000));
        assert_eq!(trades.fini_txf_net_oi, dec!(-20123));
    }

    #[test]
    fn test_marker_mismatch_is_absent() {
        let csv = "查無資料\n";
        assert!(extract_inst_investors_txf_trades(&table(csv), date())
            .unwrap()
            .is_none());
        assert!(extract_large_traders_tx_position(&table(csv), date())
            .unwrap()
            .is_none());
        assert!(extract_mxf_market_oi(&table("日期,x\n"), date())
            .unwrap()
            .is_none());
        assert!(extract_inst_investors_txo_trades(&table(csv), date())
            .unwrap()
            .is_none());
        assert!(extract_inst_investors_mxf_oi(&table(csv), date())
            .unwrap()
            .is_none());
        assert!(extract_inst_investors_mxf_oi(&table("交易日期,x\n"), date())
            .unwrap()
            .is_none());
    }

    #[test]
    fn test_extract_mxf_oi_uses_each_category_row() {
        let csv = format!(
            "日期,商品名稱,身份別,a,b,c,d,e,f,g,h,i,j,k\n{}{}{}",
            contracts_row("自營商", "1000", "2000", "0"),
            contracts_row("投信", "300", "100", "0"),
            contracts_row("外資及陸資", "5000", "7000", "0"),
        );

        let oi = extract_inst_investors_mxf_oi(&table(&csv), date())
            .unwrap()
            .unwrap();
        assert_eq!(oi.inst_investors_mxf_long_oi, dec!(6300));
        assert_eq!(oi.inst_investors_mxf_short_oi, dec!(9100));
    }

    #[test]
    fn test_extract_txo_trades() {
        let row = |kind: &str, identity: &str, net: &str, value: &str| {
            format!("2024/01/02,臺指選擇權,{kind},{identity},0,0,0,0,0,0,0,0,0,0,{net},{value}\n")
        };
        let csv = format!(
            "日期,商品名稱,買賣權別,身份別,a,b,c,d,e,f,g,h,i,j,k,l\n{}{}{}{}{}{}",
            row("買權", "自營商", "1000", "20000"),
            row("買權", "投信", "10", "300"),
            row("買權", "外資及陸資", "-5000", "-150000"),
            row("賣權", "自營商", "2000", "10000"),
            row("賣權", "投信", "0", "0"),
            row("賣權", "外資及陸資", "8000", "90000"),
        );

        let txo = extract_inst_investors_txo_trades(&table(&csv), date())
            .unwrap()
            .unwrap();
        assert_eq!(txo.dealers_txo_calls_net_oi, dec!(1000));
        assert_eq!(txo.sitc_txo_calls_net_oi_value, dec!(300));
        assert_eq!(txo.fini_txo_calls_net_oi, dec!(-5000));
        assert_eq!(txo.fini_txo_calls_net_oi_value, dec!(-150000));
        assert_eq!(txo.dealers_txo_puts_net_oi_value, dec!(10000));
        assert_eq!(txo.sitc_txo_puts_net_oi, dec!(0));
        assert_eq!(txo.fini_txo_puts_net_oi, dec!(8000));
    }

    #[test]
    fn test_extract_mxf_market_oi_filters_regular_session() {
        // 열 11 미결제약정, 17 거래시간, 18 스프레드 구분
        let row = |month: &str, oi: &str, session: &str, flag: &str| {
            format!("2024/01/02,MTX,{month},0,0,0,0,0,0,0,0,{oi},0,0,0,0,0,{session},{flag}\n")
        };
        let csv = format!(
            "交易日期,契約,到期月份(週別)\n{}{}{}{}",
            row("202401", "30000", "一般", "是"),
            row("202402", "5000", "一般", "是"),
            row("202401/202402", "-", "一般", ""),
            row("202401", "29000", "盤後", "是"),
        );

        let oi = extract_mxf_market_oi(&table(&csv), date()).unwrap().unwrap();
        assert_eq!(oi.mxf_market_oi, dec!(35000));
    }

    #[test]
    fn test_extract_large_traders_filters_tx_contract() {
        // 열 1 계약, 7 매수, 8 매도, 9 시장 OI
        let row = |contract: &str, long: &str, short: &str, market: &str| {
            format!("2024/01/02,{contract},臺股期貨,月份,0,0,0,{long},{short},{market}\n")
        };
        let csv = format!(
            "日期,商品(契約),商品名稱,到期月份,a,b,c,d,e,f\n{}{}{}{}{}{}{}",
            row("MTX", "1", "1", "1"),
            row("TX", "0", "0", "0"),
            row("TX", "0", "0", "0"),
            row("TX", "40000", "30000", "80000"),
            row("TX", "25000", "20000", "80000"),
            row("TX", "52000", "41000", "95000"),
            row("TX", "33000", "25000", "95000"),
        );

        let position = extract_large_traders_tx_position(&table(&csv), date())
            .unwrap()
            .unwrap();
        // 근월물: 전체 10,000, 특정 5,000 → 비특정 5,000
        assert_eq!(position.top_ten_specific_front_month_net_oi, dec!(5000));
        assert_eq!(position.top_ten_nonspecific_front_month_txf_net_oi, dec!(5000));
        // 전체 월물: 전체 11,000, 특정 8,000 → 비특정 3,000
        assert_eq!(position.top_ten_specific_back_months_txf_net_oi, dec!(3000));
        assert_eq!(position.top_ten_nonspecific_back_months_txf_net_oi, dec!(-2000));
        assert_eq!(position.all_months_txf_market_oi, dec!(95000));
    }

    #[test]
    fn test_large_traders_missing_rows_is_parse_error() {
        let csv = "日期,商品(契約)\n2024/01/02,TX\n";
        assert!(extract_large_traders_tx_position(&table(csv), date())
            .unwrap_err()
            .is_parse());
    }

    #[test]
    fn test_decode_csv_html_is_absent() {
        let body = b"  <!DOCTYPE html><html><body>\xe6\x9f\xa5\xe7\x84\xa1</body></html>";
        assert!(decode_csv(body).unwrap().is_none());
    }

    #[test]
    fn test_decode_csv_invalid_big5_is_decode_error() {
        let body = [0xA4u8, 0x0A, b',', b'1'];
        assert!(decode_csv(&body).unwrap_err().is_decode());
    }

    #[test]
    fn test_contracts_form_lookback() {
        let form = TaifexScraper::contracts_form(date(), "TXF");
        assert!(form.contains(&("queryStartDate", "2024/01/02".to_string())));
        assert!(form.contains(&("commodityId", "TXF".to_string())));
        assert!(form.contains(&("firstDate", "2021/01/02 00:00".to_string())));
        assert!(form.contains(&("lastDate", "2024/01/02 00:00".to_string())));
    }
}
