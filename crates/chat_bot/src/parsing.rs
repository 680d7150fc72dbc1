use engine::MoneyCents;
use unicode_normalization::{UnicodeNormalization, char::is_combining_mark};

#[derive(Debug, PartialEq, Eq, thiserror::Error)]
pub enum ParseError {
    #[error("valor inválido: {0}")]
    InvalidAmount(String),
}

/// Parses an amount captured by a command pattern.
pub(crate) fn parse_amount(raw: &str) -> Result<MoneyCents, ParseError> {
    raw.parse()
        .map_err(|_| ParseError::InvalidAmount(raw.to_string()))
}

fn collapse_whitespace(input: &str) -> String {
    input.split_whitespace().collect::<Vec<_>>().join(" ")
}

/// Canonical form of a fixed phrase: lower-cased, single-spaced and without
/// diacritics, so that `Excluir  Último` and `excluir ultimo` compare equal.
pub(crate) fn fold_phrase(input: &str) -> String {
    collapse_whitespace(input)
        .to_lowercase()
        .nfkd()
        .filter(|c| !is_combining_mark(*c))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn folds_case_spaces_and_accents() {
        assert_eq!(fold_phrase("  Excluir   Último "), "excluir ultimo");
        assert_eq!(fold_phrase("ORÇAMENTOS"), "orcamentos");
        assert_eq!(fold_phrase("resumo mês"), "resumo mes");
    }

    #[test]
    fn amount_accepts_both_separators() {
        assert_eq!(parse_amount("50,00"), Ok(MoneyCents::new(5000)));
        assert_eq!(parse_amount("12.5"), Ok(MoneyCents::new(1250)));
        assert_eq!(parse_amount("7"), Ok(MoneyCents::new(700)));
    }

    #[test]
    fn amount_rejects_three_decimals() {
        assert_eq!(
            parse_amount("1.234"),
            Err(ParseError::InvalidAmount("1.234".to_string()))
        );
    }

    #[test]
    fn amount_rejects_values_above_the_ceiling() {
        assert_eq!(parse_amount("1000000000"), Ok(MoneyCents::MAX_AMOUNT));
        assert_eq!(
            parse_amount("90000000000000000"),
            Err(ParseError::InvalidAmount("90000000000000000".to_string()))
        );
    }
}
