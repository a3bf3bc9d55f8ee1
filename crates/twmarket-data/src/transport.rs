//! HTTP 전송 계층.
//!
//! 응답은 항상 원시 바이트로 반환합니다. Big5 본문은 디코더가 직접 처리하므로
//! 전송 계층에서 텍스트로 변환하지 않습니다.

use async_trait::async_trait;
use reqwest::Client;
use twmarket_core::{Result, ScraperError};

use crate::config::HttpConfig;

/// 요청 파라미터 (이름, 값).
pub type Params = Vec<(&'static str, String)>;

/// 전송 계층 trait.
///
/// 네트워크/HTTP 실패는 [`ScraperError::Transport`]로 반환해야 합니다.
#[async_trait]
pub trait Transport: Send + Sync {
    /// GET 요청.
    async fn get(&self, url: &str, query: &Params) -> Result<Vec<u8>>;

    /// `application/x-www-form-urlencoded` POST 요청.
    async fn post_form(&self, url: &str, form: &Params) -> Result<Vec<u8>>;
}

/// reqwest 기반 전송 계층.
#[derive(Clone)]
pub struct HttpTransport {
    client: Client,
}

impl HttpTransport {
    /// 설정으로 생성.
    pub fn new(config: &HttpConfig) -> Result<Self> {
        let client = Client::builder()
            .timeout(config.timeout())
            .user_agent(config.user_agent.as_str())
            .build()
            .map_err(|e| ScraperError::Config(format!("HTTP 클라이언트 생성 실패: {}", e)))?;

        Ok(Self { client })
    }

    async fn read_body(url: &str, response: reqwest::Response) -> Result<Vec<u8>> {
        let status = response.status();
        if !status.is_success() {
            return Err(ScraperError::Transport(format!("HTTP {} - {}", status, url)));
        }

        let bytes = response
            .bytes()
            .await
            .map_err(|e| ScraperError::Transport(format!("응답 읽기 실패: {} - {}", url, e)))?;

        tracing::debug!(url = url, response_len = bytes.len(), "응답 수신");
        Ok(bytes.to_vec())
    }
}

#[async_trait]
impl Transport for HttpTransport {
    async fn get(&self, url: &str, query: &Params) -> Result<Vec<u8>> {
        tracing::debug!(url = url, ?query, "GET 요청");

        let response = self
            .client
            .get(url)
            .query(query)
            .send()
            .await
            .map_err(|e| ScraperError::Transport(format!("요청 실패: {} - {}", url, e)))?;

        Self::read_body(url, response).await
    }

    async fn post_form(&self, url: &str, form: &Params) -> Result<Vec<u8>> {
        tracing::debug!(url = url, ?form, "POST 요청");

        let response = self
            .client
            .post(url)
            .form(form)
            .send()
            .await
            .map_err(|e| ScraperError::Transport(format!("요청 실패: {} - {}", url, e)))?;

        Self::read_body(url, response).await
    }
}
