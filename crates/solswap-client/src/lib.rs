// ----- standard library imports
// ----- extra library imports
use solswap_webapi::swap as web_swap;
use thiserror::Error;
// ----- local modules
// ----- local imports
pub use reqwest::Url;

pub type Result<T> = std::result::Result<T, Error>;
#[derive(Debug, Error)]
pub enum Error {
    #[error("invalid request {0}")]
    InvalidRequest(String),
    #[error("upstream unavailable {0}")]
    Unavailable(String),
    #[error("server error {status}: {message}")]
    Server {
        status: reqwest::StatusCode,
        message: String,
    },

    #[error("internal error {0}")]
    Reqwest(#[from] reqwest::Error),
}

#[derive(Debug, Clone)]
pub struct SwapClient {
    cl: reqwest::Client,
    base: reqwest::Url,
}

impl SwapClient {
    pub fn new(base: reqwest::Url) -> Self {
        Self {
            cl: reqwest::Client::new(),
            base,
        }
    }

    async fn error_from(res: reqwest::Response) -> Error {
        let status = res.status();
        let message = match res.json::<web_swap::ErrorResponse>().await {
            Ok(body) => body.error,
            Err(e) => e.to_string(),
        };
        match status {
            reqwest::StatusCode::BAD_REQUEST => Error::InvalidRequest(message),
            reqwest::StatusCode::BAD_GATEWAY => Error::Unavailable(message),
            _ => Error::Server { status, message },
        }
    }

    pub async fn swap_transaction(
        &self,
        request: &web_swap::SwapTransactionRequest,
    ) -> Result<web_swap::SwapTransactionResponse> {
        let url = self
            .base
            .join("/v1/swap/transaction")
            .expect("swap transaction relative path");
        let res = self.cl.post(url).json(request).send().await?;
        if !res.status().is_success() {
            return Err(Self::error_from(res).await);
        }
        let response = res.json::<web_swap::SwapTransactionResponse>().await?;
        Ok(response)
    }

    pub async fn info(&self) -> Result<web_swap::ServiceInfo> {
        let url = self.base.join("/v1/info").expect("info relative path");
        let res = self.cl.get(url).send().await?;
        let info = res.error_for_status()?.json::<web_swap::ServiceInfo>().await?;
        Ok(info)
    }

    pub async fn health(&self) -> Result<String> {
        let url = self.base.join("/").expect("health relative path");
        let res = self.cl.get(url).send().await?;
        let text = res.error_for_status()?.text().await?;
        Ok(text)
    }
}
