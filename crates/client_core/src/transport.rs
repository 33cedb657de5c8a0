use async_trait::async_trait;
use reqwest::{Client, RequestBuilder, Response};
use shared::{
    domain::{OrgId, UserId},
    error::ApiError,
    protocol::{CurrentUserResponse, ListUsersRequest, ListUsersResponse, SearchQuery},
};
use tracing::{debug, warn};
use url::Url;

use crate::{
    collaborators::{AuthSession, UserDirectory},
    config::Settings,
    error::{ServiceError, ServiceResult},
};

const ORG_HEADER: &str = "x-zitadel-orgid";

#[derive(Clone)]
pub struct HttpUserDirectory {
    http: Client,
    base_url: Url,
    access_token: Option<String>,
    org_id: Option<OrgId>,
}

impl HttpUserDirectory {
    pub fn new(base_url: &str) -> ServiceResult<Self> {
        let invalid = |reason: String| ServiceError::InvalidBaseUrl {
            url: base_url.to_string(),
            reason,
        };
        let base_url = Url::parse(base_url).map_err(|e| invalid(e.to_string()))?;
        if base_url.cannot_be_a_base() {
            return Err(invalid("url cannot carry a path".into()));
        }
        if !matches!(base_url.scheme(), "http" | "https") {
            return Err(invalid(format!("unsupported scheme '{}'", base_url.scheme())));
        }

        Ok(Self {
            http: Client::new(),
            base_url,
            access_token: None,
            org_id: None,
        })
    }

    pub fn from_settings(settings: &Settings) -> ServiceResult<Self> {
        let mut directory = Self::new(&settings.api_base_url)?;
        directory.access_token = settings.access_token.clone();
        directory.org_id = settings.org_id.as_deref().map(OrgId::new);
        Ok(directory)
    }

    pub fn with_access_token(mut self, token: impl Into<String>) -> Self {
        self.access_token = Some(token.into());
        self
    }

    pub fn with_org_id(mut self, org_id: OrgId) -> Self {
        self.org_id = Some(org_id);
        self
    }

    pub fn base_url(&self) -> &Url {
        &self.base_url
    }

    fn endpoint(&self, segments: &[&str]) -> Url {
        let mut url = self.base_url.clone();
        if let Ok(mut path) = url.path_segments_mut() {
            path.pop_if_empty().extend(segments);
        }
        url
    }

    fn authorize(&self, request: RequestBuilder) -> RequestBuilder {
        let request = match &self.access_token {
            Some(token) => request.bearer_auth(token),
            None => request,
        };
        match &self.org_id {
            Some(org_id) => request.header(ORG_HEADER, org_id.as_str()),
            None => request,
        }
    }

    async fn send(&self, request: RequestBuilder) -> ServiceResult<Response> {
        let response = self.authorize(request).send().await?;
        if response.status().is_success() {
            Ok(response)
        } else {
            Err(rejection(response).await)
        }
    }

    async fn user_action(&self, id: &UserId, action: &str) -> ServiceResult<()> {
        let url = self.endpoint(&["management", "v1", "users", id.as_str(), action]);
        debug!(user_id = %id, action, "user action");
        self.send(self.http.post(url).json(&serde_json::json!({})))
            .await?;
        Ok(())
    }
}

async fn rejection(response: Response) -> ServiceError {
    let status = response.status().as_u16();
    match response.json::<ApiError>().await {
        Ok(body) if !body.message.is_empty() || body.code != 0 => ServiceError::Api(body.into()),
        Ok(_) | Err(_) => {
            warn!(status, "request rejected without an error body");
            ServiceError::Status { status }
        }
    }
}

#[async_trait]
impl UserDirectory for HttpUserDirectory {
    async fn list_users(
        &self,
        limit: u32,
        offset: u64,
        queries: &[SearchQuery],
    ) -> ServiceResult<ListUsersResponse> {
        let url = self.endpoint(&["management", "v1", "users", "_search"]);
        let body = ListUsersRequest::new(limit, offset, queries.to_vec());
        let response = self.send(self.http.post(url).json(&body)).await?;
        Ok(response.json().await?)
    }

    async fn deactivate_user(&self, id: &UserId) -> ServiceResult<()> {
        self.user_action(id, "_deactivate").await
    }

    async fn reactivate_user(&self, id: &UserId) -> ServiceResult<()> {
        self.user_action(id, "_reactivate").await
    }

    async fn remove_user(&self, id: &UserId) -> ServiceResult<()> {
        let url = self.endpoint(&["management", "v1", "users", id.as_str()]);
        self.send(self.http.delete(url)).await?;
        Ok(())
    }
}

#[async_trait]
impl AuthSession for HttpUserDirectory {
    async fn current_user_id(&self) -> Option<UserId> {
        let url = self.endpoint(&["auth", "v1", "users", "me"]);
        let response = match self.send(self.http.get(url)).await {
            Ok(response) => response,
            Err(err) => {
                warn!(error = %err, "failed to resolve signed-in user");
                return None;
            }
        };
        match response.json::<CurrentUserResponse>().await {
            Ok(me) => Some(me.user.id),
            Err(err) => {
                warn!(error = %err, "failed to decode signed-in user");
                None
            }
        }
    }
}
