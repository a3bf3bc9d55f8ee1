//! 정규화된 일별 레코드.
//!
//! 모든 레코드는 서기 날짜(`YYYY-MM-DD`)와 Decimal 숫자 필드를 가지며,
//! 모든 필드가 채워진 상태로만 생성됩니다.

use chrono::NaiveDate;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

/// 상장/장외 종목 정보.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ListedInstrument {
    /// 종목 코드 (예: 2330)
    pub symbol: String,
    /// 종목명
    pub name: String,
    /// 시장 구분 (上市/上櫃)
    pub market: String,
    /// 산업 분류
    pub industry: String,
}

/// 시장 전체 거래량/거래대금.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MarketTrades {
    pub date: NaiveDate,
    /// 거래량 (주)
    pub trade_volume: Decimal,
    /// 거래대금
    pub trade_value: Decimal,
    /// 체결 건수
    pub transaction: Decimal,
    /// 지수
    pub price: Decimal,
    /// 지수 등락
    pub change: Decimal,
}

/// 시장 등락 종목 수.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MarketBreadth {
    pub date: NaiveDate,
    pub up: Decimal,
    pub limit_up: Decimal,
    pub down: Decimal,
    pub limit_down: Decimal,
    pub unchanged: Decimal,
    pub unmatched: Decimal,
}

/// 3대 법인 순매수 금액.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct InstInvestorsTrades {
    pub date: NaiveDate,
    /// 외국인
    pub fini_net_buy_sell: Decimal,
    /// 투신
    pub sitc_net_buy_sell: Decimal,
    /// 자영상
    pub dealers_net_buy_sell: Decimal,
}

/// 신용거래 잔고.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MarginTransactions {
    pub date: NaiveDate,
    /// 융자 잔고 (단위: 거래단위)
    pub margin_balance: Decimal,
    pub margin_balance_change: Decimal,
    /// 융자 잔고 금액
    pub margin_balance_value: Decimal,
    pub margin_balance_value_change: Decimal,
    /// 융권(대주) 잔고
    pub short_balance: Decimal,
    pub short_balance_change: Decimal,
}

/// 대만지수선물(TXF) 3대 법인 순미결제약정.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct InstInvestorsTxfTrades {
    pub date: NaiveDate,
    pub fini_txf_net_oi: Decimal,
    pub sitc_txf_net_oi: Decimal,
    pub dealers_txf_net_oi: Decimal,
}

/// 대만지수옵션(TXO) 3대 법인 콜/풋 순미결제약정 및 금액.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct InstInvestorsTxoTrades {
    pub date: NaiveDate,
    pub fini_txo_calls_net_oi: Decimal,
    pub fini_txo_calls_net_oi_value: Decimal,
    pub sitc_txo_calls_net_oi: Decimal,
    pub sitc_txo_calls_net_oi_value: Decimal,
    pub dealers_txo_calls_net_oi: Decimal,
    pub dealers_txo_calls_net_oi_value: Decimal,
    pub fini_txo_puts_net_oi: Decimal,
    pub fini_txo_puts_net_oi_value: Decimal,
    pub sitc_txo_puts_net_oi: Decimal,
    pub sitc_txo_puts_net_oi_value: Decimal,
    pub dealers_txo_puts_net_oi: Decimal,
    pub dealers_txo_puts_net_oi_value: Decimal,
}

/// 미니 대만지수선물(MXF) 시장 전체 미결제약정.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MxfMarketOi {
    pub date: NaiveDate,
    pub mxf_market_oi: Decimal,
}

/// 미니 대만지수선물(MXF) 3대 법인 합산 매수/매도 미결제약정.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct InstInvestorsMxfOi {
    pub date: NaiveDate,
    pub inst_investors_mxf_long_oi: Decimal,
    pub inst_investors_mxf_short_oi: Decimal,
}

/// 개인투자자 MXF 포지션 (시장 OI - 법인 OI).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RetailMxPosition {
    pub date: NaiveDate,
    pub retail_mxf_long_oi: Decimal,
    pub retail_mxf_short_oi: Decimal,
    pub retail_mxf_net_oi: Decimal,
    /// 순포지션 / 시장 OI (소수점 4자리)
    pub retail_mxf_long_short_ratio: Decimal,
}

/// 대만지수선물 대형 거래자(상위 10) 포지션.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LargeTradersTxPosition {
    pub date: NaiveDate,
    pub top_ten_specific_front_month_net_oi: Decimal,
    pub top_ten_specific_back_months_txf_net_oi: Decimal,
    pub top_ten_nonspecific_front_month_txf_net_oi: Decimal,
    pub top_ten_nonspecific_back_months_txf_net_oi: Decimal,
    pub all_months_txf_market_oi: Decimal,
}
