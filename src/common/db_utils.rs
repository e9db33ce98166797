use sqlx::{Postgres, Transaction};

use crate::common::error::AppError;
use crate::config::AppState;
use crate::middleware::auth::AuthenticatedUser;

// Pares (parâmetro, valor) publicados no início de cada transação
fn parametros_rls(user: &AuthenticatedUser, role: Option<&str>) -> Vec<(&'static str, String)> {
    let claims = serde_json::json!({
        "sub": user.id.to_string(),
        "email": user.email,
        "role": "authenticated",
    });

    let mut parametros = vec![
        ("request.jwt.claims", claims.to_string()),
        ("request.jwt.claim.sub", user.id.to_string()),
    ];
    if let Some(role) = role {
        parametros.push(("role", role.to_string()));
    }
    parametros
}

// ---
// Helper RLS: a "chave" para o banco
// ---
/// Abre uma transação e publica as claims do usuário do jeito que as
/// policies do Supabase esperam (`request.jwt.claims`, `auth.uid()`).
/// Com `DB_RLS_ROLE` configurado a transação também troca para esse role;
/// sem ele vale o role da conexão do pool (um superusuário ignora as policies).
/// `set_config(..., true)` só vale dentro da transação, por isso ela é devolvida
/// ao handler, que faz o commit no final.
pub(crate) async fn begin_rls_transaction(
    app_state: &AppState,
    user: &AuthenticatedUser,
) -> Result<Transaction<'static, Postgres>, AppError> {
    let mut tx = app_state.db_pool.begin().await?;

    for (parametro, valor) in parametros_rls(user, app_state.rls_role.as_deref()) {
        sqlx::query("SELECT set_config($1, $2, true)")
            .bind(parametro)
            .bind(valor)
            .execute(&mut *tx)
            .await?;
    }

    Ok(tx)
}

#[cfg(test)]
mod tests {
    use super::*;
    use uuid::Uuid;

    fn usuario() -> AuthenticatedUser {
        AuthenticatedUser {
            id: Uuid::new_v4(),
            email: Some("caixa@loja.com".into()),
            is_admin: false,
        }
    }

    #[test]
    fn publica_claims_do_usuario() {
        let user = usuario();
        let parametros = parametros_rls(&user, None);

        assert_eq!(parametros[1], ("request.jwt.claim.sub", user.id.to_string()));
        let claims: serde_json::Value = serde_json::from_str(&parametros[0].1).unwrap();
        assert_eq!(claims["sub"], user.id.to_string());
        assert_eq!(claims["email"], "caixa@loja.com");
        assert!(parametros.iter().all(|(p, _)| *p != "role"));
    }

    #[test]
    fn troca_de_role_quando_configurada() {
        let parametros = parametros_rls(&usuario(), Some("authenticated"));
        assert_eq!(parametros.last(), Some(&("role", "authenticated".to_string())));
    }
}
