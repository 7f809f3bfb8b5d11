//! Session-authenticated console over the `cars` table. Edits made here go straight to the
//! store and skip the listing validation rules.

use crate::domain::{AdminCarPage, AdminCarRow};
use crate::error::ApiError;
use crate::query::{ADMIN_FILTERS, ADMIN_SEARCH, CarQuery, SortKey};
use crate::service::{now, page_request};
use crate::store::{CarStoreExt, StoreError};
use axum::extract::{Request, State};
use axum::http::HeaderMap;
use axum::http::header::COOKIE;
use axum::middleware::Next;
use axum::response::Response;
use chrono::Utc;
use common::config::Admin;
use common::persistence::models::{Car, CarChangeset, NewCar};
use hmac::digest::InvalidLength;
use hmac::{Hmac, Mac};
use sha2::Sha256;
use std::collections::HashMap;
use std::sync::Arc;
use subtle::ConstantTimeEq;
use tracing::{info, instrument, warn};

type HmacSha256 = Hmac<Sha256>;

pub const SESSION_COOKIE: &str = "admin_session";
pub const SESSION_TTL_SECS: i64 = 14 * 24 * 60 * 60;

#[derive(Clone)]
pub struct AdminGateway {
    config: Arc<Admin>,
    signer: HmacSha256,
    store: Arc<dyn CarStoreExt>,
}

impl AdminGateway {
    pub fn new(config: Admin, store: Arc<dyn CarStoreExt>) -> Result<Self, InvalidLength> {
        let signer = HmacSha256::new_from_slice(config.session_secret.as_bytes())?;
        Ok(Self {
            config: Arc::new(config),
            signer,
            store,
        })
    }

    pub fn check_credentials(&self, username: &str, password: &str) -> bool {
        let user_ok = username.as_bytes().ct_eq(self.config.admin_user.as_bytes());
        let pass_ok = password.as_bytes().ct_eq(self.config.admin_pass.as_bytes());
        (user_ok & pass_ok).into()
    }

    fn mac(&self, expires_at: i64) -> HmacSha256 {
        let mut mac = self.signer.clone();
        mac.update(format!("admin:{expires_at}").as_bytes());
        mac
    }

    /// Signed token `<expires_at>.<hex hmac>`.
    pub fn issue_session(&self, now: i64) -> String {
        let expires_at = now + SESSION_TTL_SECS;
        let signature = hex::encode(self.mac(expires_at).finalize().into_bytes());
        format!("{expires_at}.{signature}")
    }

    pub fn verify_session(&self, token: &str, now: i64) -> bool {
        let Some((expires_at, signature)) = token.split_once('.') else {
            return false;
        };
        let Ok(expires_at) = expires_at.parse::<i64>() else {
            return false;
        };
        let Ok(signature) = hex::decode(signature) else {
            return false;
        };
        expires_at > now && self.mac(expires_at).verify_slice(&signature).is_ok()
    }

    pub fn session_cookie(&self, now: i64) -> String {
        format!(
            "{SESSION_COOKIE}={}; Path=/admin; HttpOnly; SameSite=Lax; Max-Age={SESSION_TTL_SECS}",
            self.issue_session(now)
        )
    }

    pub fn cleared_cookie() -> String {
        format!("{SESSION_COOKIE}=; Path=/admin; HttpOnly; SameSite=Lax; Max-Age=0")
    }

    pub fn is_authenticated(&self, headers: &HeaderMap) -> bool {
        let now = Utc::now().timestamp();
        session_token(headers).is_some_and(|token| self.verify_session(token, now))
    }

    #[instrument(skip_all)]
    pub async fn list(&self, params: &HashMap<String, String>) -> Result<AdminCarPage, ApiError> {
        let page = page_request(params)?;
        let mut query = CarQuery::from_params(&ADMIN_FILTERS, ADMIN_SEARCH, params);
        query.sort.get_or_insert(SortKey::PostedAtDesc);
        let result = self.store.search(&query, page).await?.map(AdminCarRow::from);

        Ok(AdminCarPage {
            total: result.total,
            page: page.page,
            page_size: page.page_size,
            items: result.items,
        })
    }

    /// Inserts columns as given, without the listing validation. `posted_at` defaults to now.
    #[instrument(skip_all)]
    pub async fn create(&self, mut new_car: NewCar) -> Result<Car, ApiError> {
        new_car.posted_at.get_or_insert_with(now);
        let vin = new_car.vin.clone();
        let car = self.store.insert(new_car).await.map_err(|e| match e {
            StoreError::Conflict(_) => ApiError::VinConflict(vin.unwrap_or_default()),
            other => other.into(),
        })?;
        info!("admin created car `{}`", car.id);
        Ok(car)
    }

    pub async fn get(&self, id: i32) -> Result<Car, ApiError> {
        self.store.find(id).await?.ok_or(ApiError::CarNotFound(id))
    }

    #[instrument(skip(self, changes))]
    pub async fn edit(&self, id: i32, changes: CarChangeset) -> Result<Car, ApiError> {
        let car = self
            .store
            .update(id, changes)
            .await?
            .ok_or(ApiError::CarNotFound(id))?;
        info!("admin edited car `{id}`");
        Ok(car)
    }

    #[instrument(skip(self))]
    pub async fn delete(&self, id: i32) -> Result<(), ApiError> {
        if !self.store.delete(id).await? {
            return Err(ApiError::CarNotFound(id));
        }
        info!("admin deleted car `{id}`");
        Ok(())
    }
}

fn session_token(headers: &HeaderMap) -> Option<&str> {
    headers
        .get_all(COOKIE)
        .iter()
        .filter_map(|value| value.to_str().ok())
        .flat_map(|value| value.split(';'))
        .filter_map(|pair| pair.trim().split_once('='))
        .find(|(name, _)| *name == SESSION_COOKIE)
        .map(|(_, token)| token)
}

/// Rejects requests without a valid session cookie.
pub async fn require_session(
    State(admin): State<AdminGateway>,
    request: Request,
    next: Next,
) -> Result<Response, ApiError> {
    if !admin.is_authenticated(request.headers()) {
        warn!(path = %request.uri().path(), "unauthenticated admin request");
        return Err(ApiError::Unauthorized);
    }
    Ok(next.run(request).await)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::store::MemoryCarStore;
    use axum::http::HeaderValue;

    fn gateway(secret: &str) -> AdminGateway {
        AdminGateway::new(
            Admin {
                admin_user: "root".into(),
                admin_pass: "pw".into(),
                session_secret: secret.into(),
            },
            Arc::new(MemoryCarStore::new()),
        )
        .unwrap()
    }

    #[test]
    fn test_credentials() {
        let admin = gateway("s");
        assert!(admin.check_credentials("root", "pw"));
        assert!(!admin.check_credentials("root", "pw2"));
        assert!(!admin.check_credentials("admin", "pw"));
        assert!(!admin.check_credentials("", ""));
    }

    #[test]
    fn test_session_roundtrip_and_expiry() {
        let admin = gateway("s");
        let token = admin.issue_session(1_000);
        assert!(admin.verify_session(&token, 1_000));
        assert!(admin.verify_session(&token, 1_000 + SESSION_TTL_SECS - 1));
        assert!(!admin.verify_session(&token, 1_000 + SESSION_TTL_SECS));
    }

    #[test]
    fn test_session_rejects_tampering() {
        let admin = gateway("s");
        let token = admin.issue_session(1_000);
        let (_, signature) = token.split_once('.').unwrap();

        assert!(!admin.verify_session(&format!("99999999999.{signature}"), 1_000));
        assert!(!gateway("other").verify_session(&token, 1_000));
        assert!(!admin.verify_session("garbage", 1_000));
        assert!(!admin.verify_session("1.zz", 0));
    }

    #[test]
    fn test_session_token_from_cookie_header() {
        let mut headers = HeaderMap::new();
        headers.insert(
            COOKIE,
            HeaderValue::from_static("theme=dark; admin_session=123.abc; other=1"),
        );
        assert_eq!(session_token(&headers), Some("123.abc"));
        assert_eq!(session_token(&HeaderMap::new()), None);
    }
}
