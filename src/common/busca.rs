// src/common/busca.rs

// Todas as listagens com `?busca=` usam o mesmo padrão ILIKE,
// assim o filtro é o mesmo em qualquer tela.
pub fn normalize_search(termo: Option<&str>) -> Option<String> {
    let termo = termo?.trim();
    if termo.is_empty() {
        return None;
    }

    let mut padrao = String::with_capacity(termo.len() + 2);
    padrao.push('%');
    for c in termo.chars() {
        if matches!(c, '%' | '_' | '\\') {
            padrao.push('\\');
        }
        padrao.push(c);
    }
    padrao.push('%');
    Some(padrao)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn termo_vazio_nao_filtra() {
        assert_eq!(normalize_search(None), None);
        assert_eq!(normalize_search(Some("   ")), None);
    }

    #[test]
    fn monta_padrao_ilike() {
        assert_eq!(normalize_search(Some(" maria ")), Some("%maria%".to_string()));
    }

    #[test]
    fn escapa_curingas() {
        assert_eq!(normalize_search(Some("50%_off")), Some("%50\\%\\_off%".to_string()));
        assert_eq!(normalize_search(Some("a\\b")), Some("%a\\\\b%".to_string()));
    }
}
