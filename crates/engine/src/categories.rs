//! Keyword based category table and the classifier built on it.

use serde::{Deserialize, Serialize};

/// Category returned when no keyword matches.
pub const OTHER_CATEGORY: &str = "outros";

const DEFAULT_CATEGORIES: &[(&str, &[&str])] = &[
    (
        "alimentação",
        &["comida", "restaurante", "lanche", "mercado", "supermercado", "feira", "delivery"],
    ),
    (
        "transporte",
        &[
            "uber", "táxi", "99", "gasolina", "combustível", "estacionamento", "metrô", "ônibus",
            "passagem",
        ],
    ),
    (
        "moradia",
        &["aluguel", "condomínio", "água", "luz", "energia", "gás", "internet", "iptu"],
    ),
    (
        "lazer",
        &["cinema", "teatro", "show", "viagem", "passeio", "streaming", "netflix", "spotify"],
    ),
    (
        "saúde",
        &["remédio", "farmácia", "médico", "consulta", "exame", "academia", "dentista"],
    ),
    (
        "educação",
        &["curso", "livro", "faculdade", "escola", "material", "mensalidade"],
    ),
    (
        "compras",
        &["roupa", "sapato", "eletrônico", "celular", "presente", "shopping"],
    ),
    (OTHER_CATEGORY, &[]),
];

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Category {
    pub name: String,
    pub keywords: Vec<String>,
}

/// Outcome of [`CategoryTable::add_keyword`].
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum KeywordAdded {
    Added,
    /// The category was missing and has been created.
    CategoryCreated,
    AlreadyPresent,
}

/// Ordered category -> keywords table.
///
/// Order matters: when keywords of several categories match a text, the
/// category inserted first wins.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct CategoryTable {
    categories: Vec<Category>,
}

impl Default for CategoryTable {
    fn default() -> Self {
        let categories = DEFAULT_CATEGORIES
            .iter()
            .map(|(name, keywords)| Category {
                name: (*name).to_string(),
                keywords: keywords.iter().map(|k| (*k).to_string()).collect(),
            })
            .collect();
        Self { categories }
    }
}

impl CategoryTable {
    /// Returns the first category having a keyword contained in `text`.
    ///
    /// Matching is a case-insensitive substring search. Falls back to
    /// [`OTHER_CATEGORY`].
    pub fn classify(&self, text: &str) -> &str {
        let text = text.to_lowercase();
        self.categories
            .iter()
            .find(|category| {
                category
                    .keywords
                    .iter()
                    .any(|keyword| text.contains(&keyword.to_lowercase()))
            })
            .map_or(OTHER_CATEGORY, |category| category.name.as_str())
    }

    /// Category for a free-text description: the classified category, or the
    /// trimmed description itself when nothing matched.
    pub fn resolve(&self, description: &str) -> String {
        let description = description.trim();
        match self.classify(description) {
            OTHER_CATEGORY => description.to_string(),
            category => category.to_string(),
        }
    }

    pub fn add_keyword(&mut self, keyword: &str, category: &str) -> KeywordAdded {
        match self.categories.iter_mut().find(|c| c.name == category) {
            Some(existing) if existing.keywords.iter().any(|k| k == keyword) => {
                KeywordAdded::AlreadyPresent
            }
            Some(existing) => {
                existing.keywords.push(keyword.to_string());
                KeywordAdded::Added
            }
            None => {
                self.categories.push(Category {
                    name: category.to_string(),
                    keywords: vec![keyword.to_string()],
                });
                KeywordAdded::CategoryCreated
            }
        }
    }

    /// Position of `category` in the table, used to break ties in reports.
    pub fn position(&self, category: &str) -> Option<usize> {
        self.categories.iter().position(|c| c.name == category)
    }

    pub fn iter(&self) -> impl Iterator<Item = &Category> {
        self.categories.iter()
    }

    pub fn len(&self) -> usize {
        self.categories.len()
    }

    pub fn is_empty(&self) -> bool {
        self.categories.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn classifies_by_keyword_substring() {
        let table = CategoryTable::default();
        assert_eq!(table.classify("mercado"), "alimentação");
        assert_eq!(table.classify("Almoço no RESTAURANTE"), "alimentação");
        assert_eq!(table.classify("corrida de uber"), "transporte");
    }

    #[test]
    fn unknown_text_falls_back_to_other() {
        let table = CategoryTable::default();
        assert_eq!(table.classify("presente de aniversário"), "compras");
        assert_eq!(table.classify("pet shop ração"), OTHER_CATEGORY);
        assert_eq!(table.classify(""), OTHER_CATEGORY);
    }

    #[test]
    fn earlier_category_shadows_later_one() {
        let table = CategoryTable::default();
        // "mercado" (alimentação) and "gasolina" (transporte) both match.
        assert_eq!(table.classify("gasolina e mercado"), "alimentação");
    }

    #[test]
    fn resolve_keeps_raw_text_for_other() {
        let table = CategoryTable::default();
        assert_eq!(table.resolve("  mercado  "), "alimentação");
        assert_eq!(table.resolve("  pet shop "), "pet shop");
    }

    #[test]
    fn add_keyword_creates_category_and_rejects_duplicates() {
        let mut table = CategoryTable::default();
        let before = table.len();

        assert_eq!(table.add_keyword("ração", "pets"), KeywordAdded::CategoryCreated);
        assert_eq!(table.len(), before + 1);
        assert_eq!(table.position("pets"), Some(before));
        assert_eq!(table.classify("saco de ração"), "pets");

        assert_eq!(table.add_keyword("ração", "pets"), KeywordAdded::AlreadyPresent);
        assert_eq!(table.add_keyword("veterinário", "pets"), KeywordAdded::Added);
        assert_eq!(table.classify("veterinário"), "pets");
    }

    #[test]
    fn keyword_added_to_later_category_is_shadowed() {
        let mut table = CategoryTable::default();
        table.add_keyword("mercado", "compras");
        assert_eq!(table.classify("mercado"), "alimentação");
    }
}
