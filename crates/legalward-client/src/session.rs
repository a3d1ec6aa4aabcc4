//! Headless session endpoints: session lookup, email login, logout and
//! the advertised login configuration.

use legalward_core::session::{LoginMethods, Session, User};
use reqwest::StatusCode;
use serde::Deserialize;
use serde_json::json;
use tracing::{debug, info};

use crate::{
  ApiClient, Error, Result,
  client::{decode, read_success},
};

/// Session payloads come either flat or wrapped as `{ data: { user } }`.
#[derive(Deserialize)]
#[serde(untagged)]
enum SessionBody {
  Envelope { data: SessionData },
  Flat(User),
}

#[derive(Deserialize)]
struct SessionData {
  user: User,
}

impl From<SessionBody> for User {
  fn from(body: SessionBody) -> Self {
    match body {
      SessionBody::Envelope { data } => data.user,
      SessionBody::Flat(user) => user,
    }
  }
}

#[derive(Deserialize)]
struct ConfigBody {
  data: ConfigData,
}

#[derive(Deserialize)]
struct ConfigData {
  #[serde(default)]
  account:       AccountConfig,
  #[serde(default)]
  socialaccount: Option<SocialConfig>,
}

#[derive(Default, Deserialize)]
struct AccountConfig {
  #[serde(default)]
  login_methods: Vec<String>,
}

#[derive(Deserialize)]
struct SocialConfig {
  #[serde(default)]
  providers: Vec<Provider>,
}

#[derive(Deserialize)]
struct Provider {
  id: String,
}

impl From<ConfigBody> for LoginMethods {
  fn from(body: ConfigBody) -> Self {
    let ConfigData { account, socialaccount } = body.data;
    Self {
      email:     account.login_methods.iter().any(|m| m == "email"),
      providers: socialaccount
        .map(|s| s.providers.into_iter().map(|p| p.id).collect())
        .unwrap_or_default(),
    }
  }
}

impl ApiClient {
  /// `GET /auth/session`. A 401 means nobody is signed in.
  pub async fn session(&self) -> Result<Session> {
    const ENDPOINT: &str = "GET /auth/session";
    let resp = self.client.get(self.auth_url("/auth/session")).send().await?;
    if resp.status() == StatusCode::UNAUTHORIZED {
      debug!("no active session");
      return Ok(Session::Anonymous);
    }
    let body = read_success(ENDPOINT, resp).await?;
    let user: SessionBody = decode(ENDPOINT, &body)?;
    Ok(Session::Authenticated(user.into()))
  }

  /// `POST /auth/login` with email and password. The session cookie set by
  /// the response is kept by the client for later requests.
  pub async fn login(&self, email: &str, password: &str) -> Result<Session> {
    const ENDPOINT: &str = "POST /auth/login";
    let resp = self
      .client
      .post(self.auth_url("/auth/login"))
      .json(&json!({ "email": email, "password": password }))
      .send()
      .await?;
    let body = read_success(ENDPOINT, resp).await?;
    let user: User = decode::<SessionBody>(ENDPOINT, &body)?.into();
    info!(user_id = user.id, "signed in");
    Ok(Session::Authenticated(user))
  }

  /// `DELETE /auth/session`. The backend answers 401 once the session is
  /// gone, which counts as success.
  pub async fn logout(&self) -> Result<()> {
    let resp = self
      .client
      .delete(self.auth_url("/auth/session"))
      .send()
      .await?;
    match resp.status() {
      s if s.is_success() || s == StatusCode::UNAUTHORIZED => {
        info!("signed out");
        Ok(())
      }
      s => Err(Error::Status {
        endpoint: "DELETE /auth/session".to_string(),
        status:   s.as_u16(),
        body:     resp.text().await.unwrap_or_default(),
      }),
    }
  }

  /// `GET /config`
  pub async fn login_methods(&self) -> Result<LoginMethods> {
    const ENDPOINT: &str = "GET /config";
    let resp = self.client.get(self.auth_url("/config")).send().await?;
    let body = read_success(ENDPOINT, resp).await?;
    Ok(decode::<ConfigBody>(ENDPOINT, &body)?.into())
  }
}

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn session_body_accepts_both_shapes() {
    let flat: SessionBody =
      serde_json::from_str(r#"{"id":3,"email":"a@b.cl","display":"Ana","authenticated":true}"#)
        .unwrap();
    let wrapped: SessionBody = serde_json::from_str(
      r#"{"status":200,"data":{"user":{"id":3,"email":"a@b.cl","display":"Ana"}}}"#,
    )
    .unwrap();
    assert_eq!(User::from(flat), User::from(wrapped));
  }

  #[test]
  fn config_lists_email_and_providers() {
    let body: ConfigBody = serde_json::from_str(
      r#"{"data":{"account":{"login_methods":["email"]},
          "socialaccount":{"providers":[{"id":"google","name":"Google"}]}}}"#,
    )
    .unwrap();
    let methods = LoginMethods::from(body);
    assert!(methods.email);
    assert_eq!(methods.providers, vec!["google".to_string()]);
  }

  #[test]
  fn config_without_social_accounts() {
    let body: ConfigBody = serde_json::from_str(r#"{"data":{"account":{}}}"#).unwrap();
    assert_eq!(LoginMethods::from(body), LoginMethods::default());
  }
}
