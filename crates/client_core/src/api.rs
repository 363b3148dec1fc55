//! HTTP access to the budget backend.

use std::sync::Arc;

use async_trait::async_trait;
use reqwest::{Client, Method, RequestBuilder, Response};
use serde::de::DeserializeOwned;
use shared::{
    domain::{Category, CategoryId},
    error::ApiErrorBody,
    protocol::{
        CategoryListResponse, CreateCategoryRequest, LoginRequest, LoginResponse, MutationAck,
        RegisterRequest, UpdateCategoryRequest,
    },
};
use tracing::debug;
use url::Url;

use crate::{error::ApiClientError, session::SessionStore};

/// The category endpoints the list controller depends on.
#[async_trait]
pub trait CategoryService: Send + Sync {
    async fn list_categories(&self) -> Result<CategoryListResponse, ApiClientError>;
    async fn create_category(
        &self,
        request: &CreateCategoryRequest,
    ) -> Result<MutationAck, ApiClientError>;
    async fn update_category(
        &self,
        id: CategoryId,
        request: &UpdateCategoryRequest,
    ) -> Result<MutationAck, ApiClientError>;
    async fn delete_category(&self, id: CategoryId) -> Result<MutationAck, ApiClientError>;
}

pub struct ApiClient {
    http: Client,
    base_url: Url,
    session: Arc<SessionStore>,
}

impl ApiClient {
    pub fn new(base_url: &str, session: Arc<SessionStore>) -> Result<Self, ApiClientError> {
        Self::with_http_client(Client::new(), base_url, session)
    }

    pub fn with_http_client(
        http: Client,
        base_url: &str,
        session: Arc<SessionStore>,
    ) -> Result<Self, ApiClientError> {
        let mut base_url = Url::parse(base_url.trim())?;
        // Without a trailing slash `join` would replace the last path segment.
        if !base_url.path().ends_with('/') {
            let path = format!("{}/", base_url.path());
            base_url.set_path(&path);
        }
        Ok(Self {
            http,
            base_url,
            session,
        })
    }

    pub fn base_url(&self) -> &Url {
        &self.base_url
    }

    fn endpoint(&self, path: &str) -> Result<Url, ApiClientError> {
        Ok(self.base_url.join(path.trim_start_matches('/'))?)
    }

    async fn request(&self, method: Method, path: &str) -> Result<RequestBuilder, ApiClientError> {
        let url = self.endpoint(path)?;
        debug!("api: {method} {url}");
        let builder = self.http.request(method, url);
        Ok(match self.session.token().await {
            Some(token) => builder.bearer_auth(token),
            None => builder,
        })
    }

    pub async fn login(&self, email: &str, password: &str) -> Result<LoginResponse, ApiClientError> {
        let response = self
            .request(Method::POST, "/login")
            .await?
            .json(&LoginRequest {
                email: email.to_string(),
                password: password.to_string(),
            })
            .send()
            .await?;
        let body: LoginResponse = read_json(response).await?;
        match body.access_token.as_deref() {
            Some(token) if !token.trim().is_empty() => Ok(body),
            _ => Err(ApiClientError::MissingAccessToken),
        }
    }

    pub async fn register(&self, request: &RegisterRequest) -> Result<(), ApiClientError> {
        let response = self
            .request(Method::POST, "/register")
            .await?
            .json(request)
            .send()
            .await?;
        let raw = read_success_text(response).await?;
        let body = ApiErrorBody::parse(&raw);
        if body.success == Some(false) {
            return Err(ApiClientError::Rejected {
                status: None,
                message: body.message().map(str::to_string),
            });
        }
        Ok(())
    }
}

#[async_trait]
impl CategoryService for ApiClient {
    async fn list_categories(&self) -> Result<CategoryListResponse, ApiClientError> {
        let response = self.request(Method::GET, "/categories").await?.send().await?;
        read_json::<CategoryListResponse>(response).await
    }

    async fn create_category(
        &self,
        request: &CreateCategoryRequest,
    ) -> Result<MutationAck, ApiClientError> {
        let response = self
            .request(Method::POST, "/categories")
            .await?
            .json(request)
            .send()
            .await?;
        read_json(response).await
    }

    async fn update_category(
        &self,
        id: CategoryId,
        request: &UpdateCategoryRequest,
    ) -> Result<MutationAck, ApiClientError> {
        let response = self
            .request(Method::PUT, &format!("/categories/{id}"))
            .await?
            .json(request)
            .send()
            .await?;
        read_json(response).await
    }

    async fn delete_category(&self, id: CategoryId) -> Result<MutationAck, ApiClientError> {
        let response = self
            .request(Method::DELETE, &format!("/categories/{id}"))
            .await?
            .send()
            .await?;
        // The delete endpoint may answer with an empty body.
        let raw = read_success_text(response).await?;
        let body = ApiErrorBody::parse(&raw);
        Ok(MutationAck {
            success: body.success.unwrap_or(true),
            message: body.message,
        })
    }
}

async fn read_success_text(response: Response) -> Result<String, ApiClientError> {
    let status = response.status();
    let raw = response.text().await?;
    if !status.is_success() {
        let body = ApiErrorBody::parse(&raw);
        return Err(ApiClientError::Rejected {
            status: Some(status.as_u16()),
            message: body.message().map(str::to_string),
        });
    }
    Ok(raw)
}

async fn read_json<T: DeserializeOwned>(response: Response) -> Result<T, ApiClientError> {
    let raw = read_success_text(response).await?;
    Ok(serde_json::from_str(&raw)?)
}

/// Pulls the category list out of an envelope, treating `success: false` or
/// a missing payload as a rejection.
pub(crate) fn into_categories(
    envelope: CategoryListResponse,
) -> Result<Vec<Category>, ApiClientError> {
    match envelope {
        CategoryListResponse {
            success: true,
            data: Some(categories),
            ..
        } => Ok(categories),
        CategoryListResponse { message, .. } => Err(ApiClientError::Rejected {
            status: None,
            message,
        }),
    }
}

#[cfg(test)]
#[path = "tests/api_tests.rs"]
mod tests;
