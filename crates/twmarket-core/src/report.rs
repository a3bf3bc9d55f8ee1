//! 거래소 및 리포트 식별자.

use serde::{Deserialize, Serialize};
use std::fmt;

/// 데이터 제공 거래소.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum Provider {
    /// 대만증권거래소 (상장 시장)
    Twse,
    /// 타이베이 거래소 (장외/OTC 시장)
    Tpex,
    /// 대만선물거래소
    Taifex,
}

impl fmt::Display for Provider {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Twse => write!(f, "TWSE"),
            Self::Tpex => write!(f, "TPEX"),
            Self::Taifex => write!(f, "TAIFEX"),
        }
    }
}

/// 리포트 식별자.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum Report {
    ListedInstruments,
    MarketTrades,
    MarketBreadth,
    InstInvestorsTrades,
    MarginTransactions,
    InstInvestorsTxfTrades,
    InstInvestorsTxoTrades,
    MxfMarketOi,
    InstInvestorsMxfOi,
    RetailMxPosition,
    LargeTradersTxPosition,
}

impl Report {
    /// 로그/오류 메시지용 이름.
    pub fn name(&self) -> &'static str {
        match self {
            Self::ListedInstruments => "listed_instruments",
            Self::MarketTrades => "market_trades",
            Self::MarketBreadth => "market_breadth",
            Self::InstInvestorsTrades => "inst_investors_trades",
            Self::MarginTransactions => "margin_transactions",
            Self::InstInvestorsTxfTrades => "inst_investors_txf_trades",
            Self::InstInvestorsTxoTrades => "inst_investors_txo_trades",
            Self::MxfMarketOi => "mxf_market_oi",
            Self::InstInvestorsMxfOi => "inst_investors_mxf_oi",
            Self::RetailMxPosition => "retail_mx_position",
            Self::LargeTradersTxPosition => "large_traders_tx_position",
        }
    }

    /// 조합 리포트의 구성 리포트. 조합 리포트가 아니면 빈 목록.
    pub fn components(&self) -> &'static [Report] {
        match self {
            Self::RetailMxPosition => &[Self::MxfMarketOi, Self::InstInvestorsMxfOi],
            _ => &[],
        }
    }

    /// 여러 리포트를 조합해 만드는 리포트인지 확인.
    pub fn is_composite(&self) -> bool {
        !self.components().is_empty()
    }

    /// 날짜별 리포트인지 확인 (종목 목록은 날짜와 무관).
    pub fn is_dated(&self) -> bool {
        !matches!(self, Self::ListedInstruments)
    }
}

impl fmt::Display for Report {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// 종목 목록 조회 대상 시장.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum ListingMarket {
    /// 상장 (TSE)
    #[default]
    Tse,
    /// 장외 (OTC)
    Otc,
}

impl fmt::Display for ListingMarket {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Tse => write!(f, "TSE"),
            Self::Otc => write!(f, "OTC"),
        }
    }
}

impl std::str::FromStr for ListingMarket {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_uppercase().as_str() {
            "TSE" | "TWSE" => Ok(Self::Tse),
            "OTC" | "TPEX" => Ok(Self::Otc),
            _ => Err(format!("Unknown market: {}", s)),
        }
    }
}
