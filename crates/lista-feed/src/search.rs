//! Multi-token substring search over a catalog.
//!
//! A product matches when every query token is a case-insensitive substring
//! of its name, detail or brand (any one of them, per token). Results keep
//! catalog order; there is no ranking.

use std::sync::Arc;

use lista_core::{Catalog, Product};

/// A search string split into lowercase, whitespace-separated tokens.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Query {
    tokens: Vec<String>,
}

impl Query {
    #[must_use]
    pub fn parse(raw: &str) -> Self {
        Self {
            tokens: raw.split_whitespace().map(str::to_lowercase).collect(),
        }
    }

    #[must_use]
    pub fn tokens(&self) -> &[String] {
        &self.tokens
    }

    /// `true` when the query has no tokens and therefore matches everything.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.tokens.is_empty()
    }

    #[must_use]
    pub fn matches(&self, product: &Product) -> bool {
        let fields = [
            product.name.to_lowercase(),
            product.detail.to_lowercase(),
            product.brand.to_lowercase(),
        ];
        self.tokens
            .iter()
            .all(|token| fields.iter().any(|field| field.contains(token.as_str())))
    }
}

/// Filters `catalog` by a raw query string with a full scan.
///
/// An empty or whitespace-only query returns the input catalog unchanged.
#[must_use]
pub fn search(catalog: &Catalog, raw_query: &str) -> Catalog {
    let query = Query::parse(raw_query);
    if query.is_empty() {
        return catalog.clone();
    }
    catalog
        .iter()
        .filter(|product| query.matches(product))
        .cloned()
        .collect()
}

/// A catalog paired with its lowercased search text, built once per
/// published catalog and never updated in place.
#[derive(Debug, Clone)]
pub struct SearchIndex {
    catalog: Catalog,
    haystacks: Arc<[String]>,
}

impl SearchIndex {
    #[must_use]
    pub fn new(catalog: Catalog) -> Self {
        let haystacks = catalog.iter().map(haystack).collect();
        Self { catalog, haystacks }
    }

    #[must_use]
    pub fn catalog(&self) -> &Catalog {
        &self.catalog
    }

    /// Same results as [`search`], without re-lowercasing every product.
    #[must_use]
    pub fn search(&self, query: &Query) -> Catalog {
        if query.is_empty() {
            return self.catalog.clone();
        }
        self.catalog
            .iter()
            .zip(self.haystacks.iter())
            .filter(|(_, text)| query.tokens().iter().all(|t| text.contains(t.as_str())))
            .map(|(product, _)| product.clone())
            .collect()
    }
}

impl Default for SearchIndex {
    fn default() -> Self {
        Self::new(Catalog::empty())
    }
}

// Fields are joined with a newline: tokens never contain whitespace, so no
// token can match across a field boundary.
fn haystack(product: &Product) -> String {
    format!(
        "{}\n{}\n{}",
        product.name.to_lowercase(),
        product.detail.to_lowercase(),
        product.brand.to_lowercase()
    )
}
