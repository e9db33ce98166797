// src/middleware/auth.rs

use axum::{
    extract::{FromRequestParts, Request, State},
    http::request::Parts,
    middleware::Next,
    response::Response,
};
use axum_extra::headers::{authorization::Bearer, Authorization, HeaderMapExt};
use jsonwebtoken::{decode, Algorithm, DecodingKey, Validation};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::{
    common::error::{ApiError, AppError},
    config::AppState,
    middleware::i18n::Locale,
};

// Audiência dos tokens de sessão emitidos pelo Supabase Auth
const SUPABASE_AUDIENCE: &str = "authenticated";

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct AppMetadata {
    pub role: Option<String>,
}

// Claims do JWT do Supabase (só o que usamos)
#[derive(Debug, Serialize, Deserialize)]
pub struct Claims {
    pub sub: Uuid,
    pub email: Option<String>,
    pub role: Option<String>,
    pub aud: String,
    pub exp: usize,
    #[serde(default)]
    pub app_metadata: AppMetadata,
}

#[derive(Debug, Clone)]
pub struct AuthenticatedUser {
    pub id: Uuid,
    pub email: Option<String>,
    pub is_admin: bool,
}

impl From<Claims> for AuthenticatedUser {
    fn from(claims: Claims) -> Self {
        let is_admin = claims.app_metadata.role.as_deref() == Some("admin");
        Self {
            id: claims.sub,
            email: claims.email,
            is_admin,
        }
    }
}

/// Valida um token HS256 emitido pelo Supabase Auth.
pub fn decode_token(token: &str, jwt_secret: &str) -> Result<Claims, AppError> {
    let mut validation = Validation::new(Algorithm::HS256);
    validation.set_audience(&[SUPABASE_AUDIENCE]);

    let data = decode::<Claims>(
        token,
        &DecodingKey::from_secret(jwt_secret.as_bytes()),
        &validation,
    )
    .map_err(|_| AppError::InvalidToken)?;

    Ok(data.claims)
}

// O middleware em si: sem token válido a requisição nem chega no handler.
pub async fn auth_guard(
    State(app_state): State<AppState>,
    locale: Locale,
    mut request: Request,
    next: Next,
) -> Result<Response, ApiError> {
    let bearer = request
        .headers()
        .typed_get::<Authorization<Bearer>>()
        .ok_or_else(|| AppError::InvalidToken.to_api_error(&locale))?;

    let claims = decode_token(bearer.token(), &app_state.jwt_secret)
        .map_err(|e| e.to_api_error(&locale))?;

    request.extensions_mut().insert(AuthenticatedUser::from(claims));
    Ok(next.run(request).await)
}

impl<S> FromRequestParts<S> for AuthenticatedUser
where
    S: Send + Sync,
{
    type Rejection = ApiError;

    async fn from_request_parts(parts: &mut Parts, state: &S) -> Result<Self, Self::Rejection> {
        let locale = Locale::from_request_parts(parts, state).await.unwrap_or_default();
        parts
            .extensions
            .get::<AuthenticatedUser>()
            .cloned()
            .ok_or_else(|| AppError::InvalidToken.to_api_error(&locale))
    }
}

// Guardião das rotas administrativas (aprovação de cancelamentos etc.)
pub struct AdminUser(pub AuthenticatedUser);

impl<S> FromRequestParts<S> for AdminUser
where
    S: Send + Sync,
{
    type Rejection = ApiError;

    async fn from_request_parts(parts: &mut Parts, state: &S) -> Result<Self, Self::Rejection> {
        let user = AuthenticatedUser::from_request_parts(parts, state).await?;
        if !user.is_admin {
            let locale = Locale::from_request_parts(parts, state).await.unwrap_or_default();
            return Err(AppError::Forbidden.to_api_error(&locale));
        }
        Ok(AdminUser(user))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use jsonwebtoken::{encode, EncodingKey, Header};

    const SECRET: &str = "segredo-de-teste";

    fn token(role: Option<&str>, aud: &str, exp_offset: i64) -> (Uuid, String) {
        let id = Uuid::new_v4();
        let claims = Claims {
            sub: id,
            email: Some("caixa@loja.com".into()),
            role: Some("authenticated".into()),
            aud: aud.into(),
            exp: (chrono::Utc::now().timestamp() + exp_offset) as usize,
            app_metadata: AppMetadata { role: role.map(str::to_string) },
        };
        let t = encode(&Header::default(), &claims, &EncodingKey::from_secret(SECRET.as_bytes()))
            .unwrap();
        (id, t)
    }

    #[test]
    fn aceita_token_do_supabase() {
        let (id, t) = token(None, "authenticated", 3600);
        let user = AuthenticatedUser::from(decode_token(&t, SECRET).unwrap());
        assert_eq!(user.id, id);
        assert!(!user.is_admin);
    }

    #[test]
    fn reconhece_admin_pelo_app_metadata() {
        let (_, t) = token(Some("admin"), "authenticated", 3600);
        let user = AuthenticatedUser::from(decode_token(&t, SECRET).unwrap());
        assert!(user.is_admin);
    }

    #[test]
    fn rejeita_token_expirado_ou_de_outra_audiencia() {
        let (_, expirado) = token(None, "authenticated", -3600);
        assert!(matches!(decode_token(&expirado, SECRET), Err(AppError::InvalidToken)));

        let (_, outra_aud) = token(None, "anon", 3600);
        assert!(matches!(decode_token(&outra_aud, SECRET), Err(AppError::InvalidToken)));
    }

    #[test]
    fn rejeita_segredo_errado() {
        let (_, t) = token(None, "authenticated", 3600);
        assert!(decode_token(&t, "outro-segredo").is_err());
    }
}
