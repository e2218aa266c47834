use axum::{
    extract::{FromRequestParts, OptionalFromRequestParts},
    http::{request::Parts, HeaderMap},
};

use crate::{database::Database, error::AppError};

// Заголовок выставляет шлюз авторизации перед сервисом
pub const ACCOUNT_HEADER: &str = "x-account-id";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CurrentAccount {
    pub account_id: i64,
}

// None - заголовка нет, Err - заголовок есть, но мусор
fn account_from_headers(headers: &HeaderMap) -> Result<Option<CurrentAccount>, AppError> {
    let Some(value) = headers.get(ACCOUNT_HEADER) else {
        return Ok(None);
    };

    let account_id = value
        .to_str()
        .ok()
        .and_then(|v| v.trim().parse::<i64>().ok())
        .filter(|id| *id > 0)
        .ok_or(AppError::Unauthorized)?;

    Ok(Some(CurrentAccount { account_id }))
}

impl<S> FromRequestParts<S> for CurrentAccount
where
    S: Send + Sync,
{
    type Rejection = AppError;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        account_from_headers(&parts.headers)?.ok_or(AppError::Unauthorized)
    }
}

impl<S> OptionalFromRequestParts<S> for CurrentAccount
where
    S: Send + Sync,
{
    type Rejection = AppError;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Option<Self>, Self::Rejection> {
        account_from_headers(&parts.headers)
    }
}

/// Fails with `NotFound` for an unknown venue and `Forbidden` when the
/// account does not own it.
pub async fn ensure_owner(db: &Database, venue_id: i64, account: CurrentAccount) -> Result<(), AppError> {
    let owner_id = sqlx::query_scalar::<_, i64>("SELECT owner_id FROM venues WHERE id = $1")
        .bind(venue_id)
        .fetch_optional(&db.pool)
        .await?
        .ok_or_else(|| AppError::NotFound(format!("venue {} not found", venue_id)))?;

    if owner_id != account.account_id {
        tracing::warn!(
            "account {} tried to manage venue {} owned by {}",
            account.account_id, venue_id, owner_id
        );
        return Err(AppError::Forbidden("venue belongs to another owner".to_string()));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::http::HeaderValue;

    fn headers(value: Option<&'static str>) -> HeaderMap {
        let mut headers = HeaderMap::new();
        if let Some(v) = value {
            headers.insert(ACCOUNT_HEADER, HeaderValue::from_static(v));
        }
        headers
    }

    #[test]
    fn reads_positive_account_id() {
        let account = account_from_headers(&headers(Some(" 42 "))).unwrap();
        assert_eq!(account, Some(CurrentAccount { account_id: 42 }));
    }

    #[test]
    fn missing_header_is_anonymous() {
        assert_eq!(account_from_headers(&headers(None)).unwrap(), None);
    }

    #[test]
    fn garbage_header_is_unauthorized() {
        assert!(matches!(account_from_headers(&headers(Some("abc"))), Err(AppError::Unauthorized)));
        assert!(matches!(account_from_headers(&headers(Some("-3"))), Err(AppError::Unauthorized)));
    }
}
