//! The Para API client.
//!
//! [`ParaClient`] builds signed requests for the Para REST API and keeps the
//! JWT session. It performs no I/O: every operation returns a
//! [`SignedRequest`] for the caller's HTTP stack, and responses that change
//! client state are fed back through the `apply_*` methods.

use chrono::Utc;
use http::Method;
use para_auth::request::json_bytes;
use para_auth::{QueryParams, SignedRequest, Signer, SignerConfig, SigningCredentials, SigningRequest};
use para_core::{ClientConfig, Constraint, JWT_PATH, ParaError, ParaObject, ParaResult};
use parking_lot::RwLock;
use serde::Serialize;
use serde::de::DeserializeOwned;
use serde_json::{Value, json};
use tracing::{debug, error, warn};

use crate::session::JwtSession;

/// Secrets shorter than this are almost certainly misconfigured.
const MIN_SECRET_KEY_LEN: usize = 6;

/// Request builder and session holder for one Para app.
///
/// # Examples
///
/// ```
/// use para_auth::SignerConfig;
/// use para_client::ParaClient;
/// use para_core::{ClientConfig, ParaObject};
///
/// let client = ParaClient::new(
///     ClientConfig::builder()
///         .endpoint("https://api.example.com")
///         .access_key("app:blog")
///         .secret_key("a-long-secret")
///         .build(),
///     SignerConfig::default(),
/// );
///
/// let request = client.create_request(&ParaObject::new().with_type("post"));
/// assert_eq!(request.method, http::Method::POST);
/// assert_eq!(request.url, "https://api.example.com/v1/post");
/// ```
#[derive(Debug)]
pub struct ParaClient {
    config: ClientConfig,
    signer: Signer,
    session: RwLock<JwtSession>,
}

impl ParaClient {
    /// Create a client. Warns when the secret key looks invalid.
    #[must_use]
    pub fn new(config: ClientConfig, signer_config: SignerConfig) -> Self {
        if config.secret_key.trim().len() < MIN_SECRET_KEY_LEN {
            warn!("Secret key appears to be invalid. Make sure you sign in first.");
        }
        Self {
            config,
            signer: Signer::new(signer_config),
            session: RwLock::new(JwtSession::new()),
        }
    }

    /// Restore a previously persisted session.
    #[must_use]
    pub fn with_session(self, session: JwtSession) -> Self {
        *self.session.write() = session;
        self
    }

    /// The client configuration.
    #[must_use]
    pub fn config(&self) -> &ClientConfig {
        &self.config
    }

    /// A snapshot of the JWT session, e.g. for persisting it.
    #[must_use]
    pub fn session(&self) -> JwtSession {
        self.session.read().clone()
    }

    /// Resolve a resource path against the API path.
    ///
    /// JWT paths are returned unchanged; anything else loses its leading `/`
    /// and is appended to the API path.
    ///
    /// # Examples
    ///
    /// ```
    /// use para_auth::SignerConfig;
    /// use para_client::ParaClient;
    /// use para_core::ClientConfig;
    ///
    /// let client = ParaClient::new(ClientConfig::default(), SignerConfig::default());
    /// assert_eq!(client.full_path("/users/1"), "/v1/users/1");
    /// assert_eq!(client.full_path("users"), "/v1/users");
    /// assert_eq!(client.full_path("/jwt_auth"), "/jwt_auth");
    /// ```
    #[must_use]
    pub fn full_path(&self, resource_path: &str) -> String {
        if resource_path.starts_with(JWT_PATH) {
            return resource_path.to_owned();
        }
        let relative = resource_path.strip_prefix('/').unwrap_or(resource_path);
        format!("{}{relative}", self.config.api_path())
    }

    /// The credentials used for the next request: the JWT when signed in,
    /// the app's secret key otherwise.
    #[must_use]
    pub fn credentials(&self) -> SigningCredentials {
        match self.session.read().token() {
            Some(token) => SigningCredentials::bearer(self.config.access_key.as_str(), token),
            None => SigningCredentials::new(
                self.config.access_key.as_str(),
                self.config.secret_key.as_str(),
            ),
        }
    }

    /// Build a signed `GET`.
    #[must_use]
    pub fn invoke_get(&self, resource_path: &str, params: QueryParams) -> SignedRequest {
        self.invoke(Method::GET, resource_path, params, None)
    }

    /// Build a signed `POST` with a JSON entity.
    #[must_use]
    pub fn invoke_post<T: Serialize + ?Sized>(
        &self,
        resource_path: &str,
        entity: Option<&T>,
    ) -> SignedRequest {
        self.invoke(Method::POST, resource_path, QueryParams::new(), Some(json_bytes(entity)))
    }

    /// Build a signed `PUT` with a JSON entity.
    #[must_use]
    pub fn invoke_put<T: Serialize + ?Sized>(
        &self,
        resource_path: &str,
        entity: Option<&T>,
    ) -> SignedRequest {
        self.invoke(Method::PUT, resource_path, QueryParams::new(), Some(json_bytes(entity)))
    }

    /// Build a signed `PATCH` with a JSON entity.
    #[must_use]
    pub fn invoke_patch<T: Serialize + ?Sized>(
        &self,
        resource_path: &str,
        entity: Option<&T>,
    ) -> SignedRequest {
        self.invoke(Method::PATCH, resource_path, QueryParams::new(), Some(json_bytes(entity)))
    }

    /// Build a signed `DELETE`.
    #[must_use]
    pub fn invoke_delete(&self, resource_path: &str, params: QueryParams) -> SignedRequest {
        self.invoke(Method::DELETE, resource_path, params, None)
    }

    fn invoke(
        &self,
        method: Method,
        resource_path: &str,
        params: QueryParams,
        body: Option<Vec<u8>>,
    ) -> SignedRequest {
        let request = SigningRequest {
            method,
            endpoint: self.config.endpoint().to_owned(),
            resource_path: self.full_path(resource_path),
            headers: para_auth::Headers::new(),
            params,
            body,
            signing_time: None,
        };
        self.invoke_signed_request(&request)
    }

    /// Sign a fully described request with this client's signer and credentials.
    ///
    /// The request's `resource_path` is used as given; resolve it with
    /// [`full_path`](Self::full_path) first.
    #[must_use]
    pub fn invoke_signed_request(&self, request: &SigningRequest) -> SignedRequest {
        self.signer.invoke_signed_request(request, &self.credentials())
    }

    /// Build the sign-in request exchanging an identity provider token for a JWT.
    ///
    /// Feed the response to [`apply_sign_in_response`](Self::apply_sign_in_response).
    ///
    /// # Errors
    ///
    /// Returns [`ParaError::InvalidArgument`] if `provider` or `provider_token` is blank.
    pub fn sign_in_request(&self, provider: &str, provider_token: &str) -> ParaResult<SignedRequest> {
        require("provider", provider)?;
        require("provider_token", provider_token)?;

        let credentials = json!({
            "appid": self.config.access_key,
            "provider": provider,
            "token": provider_token,
        });
        Ok(self.invoke_post(JWT_PATH, Some(&credentials)))
    }

    /// Store the JWT from a sign-in response and return the signed-in user.
    ///
    /// An unexpected response clears the session.
    pub fn apply_sign_in_response(&self, response: &Value) -> Option<ParaObject> {
        self.session.write().apply_auth_response(response)
    }

    /// Build a token refresh request, if the session is due for one.
    #[must_use]
    pub fn refresh_token_request(&self) -> Option<SignedRequest> {
        let now = Utc::now().timestamp_millis();
        if !self.session.read().needs_refresh(now) {
            return None;
        }
        debug!("JWT is due for refresh");
        Some(self.invoke_get(JWT_PATH, QueryParams::new()))
    }

    /// Store the JWT from a refresh response. Returns `false` and clears the
    /// session when the response carries no token.
    pub fn apply_refresh_response(&self, response: &Value) -> bool {
        let mut session = self.session.write();
        session.apply_auth_response(response);
        session.token().is_some()
    }

    /// Build the request revoking every token of the signed-in user.
    #[must_use]
    pub fn revoke_all_tokens_request(&self) -> SignedRequest {
        self.invoke_delete(JWT_PATH, QueryParams::new())
    }

    /// Forget the JWT locally. The token itself stays valid on the server.
    pub fn sign_out(&self) {
        self.session.write().clear();
    }

    /// The JWT access token, if signed in.
    #[must_use]
    pub fn access_token(&self) -> Option<String> {
        self.session.read().token().map(ToOwned::to_owned)
    }

    /// Set the JWT access token directly. A blank token signs out.
    pub fn set_access_token(&self, token: &str) {
        self.session.write().set_access_token(token);
    }

    /// Build the request persisting an object.
    ///
    /// Objects with an id are written with `PUT {type}/{id}`, overwriting any
    /// existing object; others are created with `POST {type}`.
    #[must_use]
    pub fn create_request(&self, obj: &ParaObject) -> SignedRequest {
        let object_type = obj.type_name();
        match obj.id.as_deref().filter(|id| !id.trim().is_empty()) {
            Some(id) => self.invoke_put(&format!("{object_type}/{id}"), Some(obj)),
            None => self.invoke_post(object_type, Some(obj)),
        }
    }

    /// Build the request reading one object, by type and id or by id alone.
    ///
    /// # Errors
    ///
    /// Returns [`ParaError::InvalidArgument`] if `id` is blank.
    pub fn read_request(&self, object_type: Option<&str>, id: &str) -> ParaResult<SignedRequest> {
        require("id", id)?;
        let path = match object_type.filter(|t| !t.trim().is_empty()) {
            Some(object_type) => format!("{object_type}/{id}"),
            None => format!("_id/{id}"),
        };
        Ok(self.invoke_get(&path, QueryParams::new()))
    }

    /// Build the request adding a validation constraint to a field.
    ///
    /// # Errors
    ///
    /// Returns [`ParaError::InvalidArgument`] if `object_type` or `field` is blank.
    pub fn add_validation_constraint_request(
        &self,
        object_type: &str,
        field: &str,
        constraint: &Constraint,
    ) -> ParaResult<SignedRequest> {
        require("type", object_type)?;
        require("field", field)?;
        let path = format!("_constraints/{object_type}/{field}/{}", constraint.name());
        Ok(self.invoke_put(&path, Some(&constraint.payload())))
    }

    /// Build the request removing a validation constraint from a field.
    ///
    /// # Errors
    ///
    /// Returns [`ParaError::InvalidArgument`] if any argument is blank.
    pub fn remove_validation_constraint_request(
        &self,
        object_type: &str,
        field: &str,
        constraint_name: &str,
    ) -> ParaResult<SignedRequest> {
        require("type", object_type)?;
        require("field", field)?;
        require("constraint_name", constraint_name)?;
        let path = format!("_constraints/{object_type}/{field}/{constraint_name}");
        Ok(self.invoke_delete(&path, QueryParams::new()))
    }

    /// Deserialize a response body. An empty body yields `Ok(None)`.
    ///
    /// # Errors
    ///
    /// Returns [`ParaError::Json`] if the body is not valid JSON for `T`.
    pub fn read_entity<T: DeserializeOwned>(data: &[u8]) -> ParaResult<Option<T>> {
        if data.is_empty() {
            return Ok(None);
        }
        serde_json::from_slice(data).map(Some).map_err(|e| {
            error!(error = %e, "Could not read response entity");
            ParaError::from(e)
        })
    }

    /// Extract and log the message of an error response body.
    ///
    /// Para errors look like `{"code": 404, "message": "..."}`.
    #[must_use]
    pub fn error_message(status: http::StatusCode, data: &[u8]) -> String {
        let error: Option<Value> = serde_json::from_slice(data).ok();
        let code = error.as_ref().and_then(|e| e.get("code")).cloned();
        let message = error
            .as_ref()
            .and_then(|e| e.get("message"))
            .and_then(Value::as_str)
            .map_or_else(|| status.to_string(), ToOwned::to_owned);

        match code {
            Some(code) => error!(%code, %message, "Para API error"),
            None => error!(%status, %message, "Para API error"),
        }
        message
    }
}

fn require(name: &str, value: &str) -> ParaResult<()> {
    if value.trim().is_empty() {
        return Err(ParaError::InvalidArgument(format!("{name} must not be blank")));
    }
    Ok(())
}
