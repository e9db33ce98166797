// src/middleware/i18n.rs

use axum::extract::FromRequestParts;
use axum::http::{header, request::Parts};

// Extrator de idioma. O painel é em português; `en` só quando pedido.
#[derive(Debug, Clone)]
pub struct Locale(pub String);

impl Locale {
    pub fn is_english(&self) -> bool {
        self.0 == "en"
    }
}

impl Default for Locale {
    fn default() -> Self {
        Locale("pt".to_string())
    }
}

impl<S> FromRequestParts<S> for Locale
where
    S: Send + Sync,
{
    type Rejection = std::convert::Infallible;

    async fn from_request_parts(
        parts: &mut Parts,
        _state: &S,
    ) -> Result<Self, Self::Rejection> {
        let lang = parts
            .headers
            .get(header::ACCEPT_LANGUAGE)
            .and_then(|header_value| header_value.to_str().ok())
            .and_then(|header_str| {
                accept_language::parse(header_str)
                    .first()
                    // "pt-BR" -> "pt", "en-US" -> "en"
                    .map(|tag| tag.split('-').next().unwrap_or(tag.as_str()).to_lowercase())
            });

        Ok(lang.map(Locale).unwrap_or_default())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::http::Request;

    async fn locale_de(header: Option<&str>) -> Locale {
        let mut builder = Request::builder();
        if let Some(h) = header {
            builder = builder.header(header::ACCEPT_LANGUAGE, h);
        }
        let (mut parts, _) = builder.body(()).unwrap().into_parts();
        Locale::from_request_parts(&mut parts, &()).await.unwrap()
    }

    #[tokio::test]
    async fn padrao_e_portugues() {
        assert_eq!(locale_de(None).await.0, "pt");
    }

    #[tokio::test]
    async fn pega_o_idioma_de_maior_peso() {
        assert_eq!(locale_de(Some("en-US,en;q=0.9,pt;q=0.5")).await.0, "en");
        assert_eq!(locale_de(Some("pt-BR")).await.0, "pt");
    }
}
