use crate::{
    error::ErrorResponse,
    models::{
        ApiResponse, Balance, LoginRequest, LoginResponse, PayQrRequest, Transaction, VerifiedQr,
        VerifyQrRequest,
    },
};
use anyhow::{bail, Context, Result};
use reqwest::{Client, RequestBuilder};
use serde::de::DeserializeOwned;

/// Thin HTTP client for the student-facing payment endpoints.
pub struct CampusPayClient {
    http: Client,
    base_url: String,
    token: Option<String>,
}

impl CampusPayClient {
    pub fn new(base_url: impl Into<String>) -> Self {
        Self {
            http: Client::new(),
            base_url: base_url.into().trim_end_matches('/').to_string(),
            token: None,
        }
    }

    pub fn is_authenticated(&self) -> bool {
        self.token.is_some()
    }

    pub async fn login(&mut self, email: &str, password: &str) -> Result<LoginResponse> {
        let body = LoginRequest {
            email: email.to_string(),
            password: password.to_string(),
        };
        let session: LoginResponse = self
            .send(self.http.post(self.url("/auth/login")).json(&body))
            .await?;
        self.token = Some(session.token.clone());
        Ok(session)
    }

    pub async fn balance(&self) -> Result<Balance> {
        self.send(self.authed(self.http.get(self.url("/wallet/balance")))?)
            .await
    }

    pub async fn verify_qr(&self, payload: &str) -> Result<VerifiedQr> {
        let body = VerifyQrRequest {
            payload: payload.to_string(),
        };
        self.send(self.authed(self.http.post(self.url("/transaction/verify-qr")))?.json(&body))
            .await
    }

    pub async fn pay(&self, tid: &str, mpin: &str) -> Result<Transaction> {
        let body = PayQrRequest {
            tid: tid.to_string(),
            mpin: mpin.to_string(),
        };
        self.send(self.authed(self.http.post(self.url("/transaction/pay")))?.json(&body))
            .await
    }

    fn url(&self, path: &str) -> String {
        format!("{}{}", self.base_url, path)
    }

    fn authed(&self, request: RequestBuilder) -> Result<RequestBuilder> {
        let token = self.token.as_deref().context("not logged in")?;
        Ok(request.bearer_auth(token))
    }

    async fn send<T: DeserializeOwned>(&self, request: RequestBuilder) -> Result<T> {
        let response = request.send().await.context("request failed")?;
        let status = response.status();
        let bytes = response.bytes().await?;

        if !status.is_success() {
            match serde_json::from_slice::<ErrorResponse>(&bytes) {
                Ok(err) => bail!("{} {}: {}", status.as_u16(), err.error_code, err.error),
                Err(_) => bail!("{}: {}", status, String::from_utf8_lossy(&bytes)),
            }
        }

        let envelope: ApiResponse<T> =
            serde_json::from_slice(&bytes).context("unexpected response body")?;
        Ok(envelope.data)
    }
}
