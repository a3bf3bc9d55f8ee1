//! 환경변수 기반 설정 모듈.

use std::time::Duration;

/// TWSE 기본 URL.
pub const DEFAULT_TWSE_BASE_URL: &str = "https://www.twse.com.tw";
/// TWSE 종목 코드(ISIN) 사이트 기본 URL.
pub const DEFAULT_TWSE_ISIN_BASE_URL: &str = "https://isin.twse.com.tw";
/// TPEx 기본 URL.
pub const DEFAULT_TPEX_BASE_URL: &str = "https://www.tpex.org.tw";
/// TAIFEX 기본 URL.
pub const DEFAULT_TAIFEX_BASE_URL: &str = "https://www.taifex.com.tw";

const DEFAULT_USER_AGENT: &str =
    "Mozilla/5.0 (Windows NT 10.0; Win64; x64) AppleWebKit/537.36 (KHTML, like Gecko) Chrome/120.0.0.0 Safari/537.36";

/// 스크래퍼 전체 설정
#[derive(Debug, Clone, Default)]
pub struct ScraperConfig {
    /// 거래소별 기본 URL
    pub endpoints: Endpoints,
    /// HTTP 요청 설정
    pub http: HttpConfig,
}

/// 거래소별 기본 URL (테스트에서는 모의 서버 주소로 교체)
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Endpoints {
    pub twse: String,
    pub twse_isin: String,
    pub tpex: String,
    pub taifex: String,
}

impl Default for Endpoints {
    fn default() -> Self {
        Self {
            twse: DEFAULT_TWSE_BASE_URL.to_string(),
            twse_isin: DEFAULT_TWSE_ISIN_BASE_URL.to_string(),
            tpex: DEFAULT_TPEX_BASE_URL.to_string(),
            taifex: DEFAULT_TAIFEX_BASE_URL.to_string(),
        }
    }
}

impl Endpoints {
    /// 모든 거래소를 같은 주소로 지정 (모의 서버용).
    pub fn all(base_url: impl Into<String>) -> Self {
        let base_url = base_url.into();
        Self {
            twse: base_url.clone(),
            twse_isin: base_url.clone(),
            tpex: base_url.clone(),
            taifex: base_url,
        }
    }
}

/// HTTP 요청 설정
#[derive(Debug, Clone)]
pub struct HttpConfig {
    /// 요청 타임아웃 (초)
    pub timeout_secs: u64,
    /// User-Agent 헤더
    pub user_agent: String,
}

impl Default for HttpConfig {
    fn default() -> Self {
        Self {
            timeout_secs: 30,
            user_agent: DEFAULT_USER_AGENT.to_string(),
        }
    }
}

impl HttpConfig {
    /// 요청 타임아웃을 Duration으로 반환
    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs)
    }
}

impl ScraperConfig {
    /// 환경변수에서 설정 로드 (`.env` 파일 포함)
    pub fn from_env() -> Self {
        dotenvy::dotenv().ok();

        Self {
            endpoints: Endpoints {
                twse: env_var_string("TWSE_BASE_URL", DEFAULT_TWSE_BASE_URL),
                twse_isin: env_var_string("TWSE_ISIN_BASE_URL", DEFAULT_TWSE_ISIN_BASE_URL),
                tpex: env_var_string("TPEX_BASE_URL", DEFAULT_TPEX_BASE_URL),
                taifex: env_var_string("TAIFEX_BASE_URL", DEFAULT_TAIFEX_BASE_URL),
            },
            http: HttpConfig {
                timeout_secs: env_var_parse("SCRAPER_TIMEOUT_SECS", 30),
                user_agent: env_var_string("SCRAPER_USER_AGENT", DEFAULT_USER_AGENT),
            },
        }
    }
}

/// 환경변수에서 값을 파싱 (실패 시 기본값 사용)
fn env_var_parse<T: std::str::FromStr>(key: &str, default: T) -> T {
    std::env::var(key)
        .ok()
        .and_then(|v| v.parse().ok())
        .unwrap_or(default)
}

/// 환경변수 문자열 (비어 있으면 기본값, 끝의 `/` 제거)
fn env_var_string(key: &str, default: &str) -> String {
    std::env::var(key)
        .ok()
        .map(|v| v.trim().trim_end_matches('/').to_string())
        .filter(|v| !v.is_empty())
        .unwrap_or_else(|| default.to_string())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let config = ScraperConfig::default();
        assert_eq!(config.endpoints.taifex, DEFAULT_TAIFEX_BASE_URL);
        assert_eq!(config.http.timeout(), Duration::from_secs(30));
    }

    #[test]
    fn test_endpoints_all() {
        let endpoints = Endpoints::all("http://127.0.0.1:1234");
        assert_eq!(endpoints.twse, "http://127.0.0.1:1234");
        assert_eq!(endpoints.taifex, "http://127.0.0.1:1234");
    }

    #[test]
    fn test_env_var_fallbacks() {
        assert_eq!(env_var_parse("TWMARKET_TEST_UNSET_NUMBER", 7u64), 7);
        assert_eq!(
            env_var_string("TWMARKET_TEST_UNSET_URL", "https://example.com"),
            "https://example.com"
        );
    }
}
