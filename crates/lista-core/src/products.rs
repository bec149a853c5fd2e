//! Catalog domain types.
//!
//! All text carried by a [`Product`] comes straight from the published feed
//! and is untrusted: renderers must escape it for their output medium.

use std::fmt;
use std::sync::{Arc, LazyLock};

use regex::Regex;
use rust_decimal::Decimal;
use serde::{Deserialize, Deserializer, Serialize, Serializer};

/// How a product is sold, which decides its display suffix.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum UnitKind {
    /// Sold per piece (`"UN"` on the wire).
    Unit,
    /// Sold per metre. Any wire code other than `"UN"` maps here.
    Length,
}

impl UnitKind {
    /// Maps the feed's `unidad` code to a unit kind.
    #[must_use]
    pub fn from_wire(code: &str) -> Self {
        if code == "UN" {
            Self::Unit
        } else {
            Self::Length
        }
    }

    #[must_use]
    pub fn wire_code(self) -> &'static str {
        match self {
            Self::Unit => "UN",
            Self::Length => "MTS",
        }
    }

    /// Short label shown next to a price, e.g. `"Un"` or `"Mts"`.
    #[must_use]
    pub fn suffix(self) -> &'static str {
        match self {
            Self::Unit => "Un",
            Self::Length => "Mts",
        }
    }
}

/// One catalog line item.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Product {
    pub name: String,
    pub detail: String,
    pub brand: String,
    pub unit_kind: UnitKind,
    /// Currency label exactly as published, e.g. `"USD"` or `"$"`.
    pub currency: String,
    /// Non-negative; enforced when the feed is decoded.
    pub price: Decimal,
}

/// An immutable, ordered list of products decoded from one snapshot.
///
/// Cloning is cheap: the product list is shared. A new sync produces a new
/// `Catalog` rather than mutating an existing one.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Catalog {
    products: Arc<[Product]>,
}

impl Catalog {
    #[must_use]
    pub fn new(products: Vec<Product>) -> Self {
        Self {
            products: products.into(),
        }
    }

    #[must_use]
    pub fn empty() -> Self {
        Self::new(Vec::new())
    }

    #[must_use]
    pub fn products(&self) -> &[Product] {
        &self.products
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.products.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.products.is_empty()
    }

    pub fn iter(&self) -> std::slice::Iter<'_, Product> {
        self.products.iter()
    }

    /// Returns `true` if both catalogs share the same underlying allocation.
    #[must_use]
    pub fn ptr_eq(&self, other: &Self) -> bool {
        Arc::ptr_eq(&self.products, &other.products)
    }
}

impl Default for Catalog {
    fn default() -> Self {
        Self::empty()
    }
}

impl From<Vec<Product>> for Catalog {
    fn from(products: Vec<Product>) -> Self {
        Self::new(products)
    }
}

impl FromIterator<Product> for Catalog {
    fn from_iter<I: IntoIterator<Item = Product>>(iter: I) -> Self {
        Self::new(iter.into_iter().collect())
    }
}

impl<'a> IntoIterator for &'a Catalog {
    type Item = &'a Product;
    type IntoIter = std::slice::Iter<'a, Product>;

    fn into_iter(self) -> Self::IntoIter {
        self.iter()
    }
}

impl Serialize for Catalog {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        self.products().serialize(serializer)
    }
}

impl<'de> Deserialize<'de> for Catalog {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        Vec::<Product>::deserialize(deserializer).map(Self::new)
    }
}

/// Name of one published catalog version, e.g. `"lista-24-06-25.json.gz"`.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct SnapshotId(String);

impl SnapshotId {
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// The date token embedded in the identifier, if any. See [`extract_date`].
    #[must_use]
    pub fn date(&self) -> Option<&str> {
        extract_date(&self.0)
    }
}

impl fmt::Display for SnapshotId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl AsRef<str> for SnapshotId {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

static DATE_TOKEN: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"[0-9]{2}-[0-9]{2}-(?:[0-9]{4}|[0-9]{2})").expect("valid date token regex")
});

/// Extracts the first `DD-DD-DD` or `DD-DD-DDDD` token from a snapshot name.
///
/// ```
/// use lista_core::extract_date;
///
/// assert_eq!(extract_date("lista-24-06-25.json.gz"), Some("24-06-25"));
/// assert_eq!(extract_date("lista-24-06-2025.json.gz"), Some("24-06-2025"));
/// assert_eq!(extract_date("nofile.json"), None);
/// ```
#[must_use]
pub fn extract_date(identifier: &str) -> Option<&str> {
    DATE_TOKEN.find(identifier).map(|m| m.as_str())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn product(name: &str) -> Product {
        Product {
            name: name.to_string(),
            detail: "detalle".to_string(),
            brand: "marca".to_string(),
            unit_kind: UnitKind::Unit,
            currency: "USD".to_string(),
            price: Decimal::new(1250, 2),
        }
    }

    #[test]
    fn unit_kind_from_wire_maps_un_to_unit() {
        assert_eq!(UnitKind::from_wire("UN"), UnitKind::Unit);
    }

    #[test]
    fn unit_kind_from_wire_maps_everything_else_to_length() {
        assert_eq!(UnitKind::from_wire("MTS"), UnitKind::Length);
        assert_eq!(UnitKind::from_wire("un"), UnitKind::Length);
        assert_eq!(UnitKind::from_wire(""), UnitKind::Length);
    }

    #[test]
    fn unit_kind_suffixes() {
        assert_eq!(UnitKind::Unit.suffix(), "Un");
        assert_eq!(UnitKind::Length.suffix(), "Mts");
    }

    #[test]
    fn extract_date_short_year() {
        assert_eq!(extract_date("lista-24-06-25.json.gz"), Some("24-06-25"));
    }

    #[test]
    fn extract_date_long_year() {
        assert_eq!(extract_date("lista-24-06-2025.json.gz"), Some("24-06-2025"));
    }

    #[test]
    fn extract_date_absent() {
        assert_eq!(extract_date("nofile.json"), None);
        assert_eq!(extract_date("lista-2-6-25.json.gz"), None);
    }

    #[test]
    fn snapshot_id_exposes_date() {
        let id = SnapshotId::new("lista-01-12-24.json.gz");
        assert_eq!(id.date(), Some("01-12-24"));
        assert_eq!(id.to_string(), "lista-01-12-24.json.gz");
    }

    #[test]
    fn catalog_clone_shares_products() {
        let catalog = Catalog::new(vec![product("a"), product("b")]);
        let copy = catalog.clone();
        assert!(catalog.ptr_eq(&copy));
        assert_eq!(copy.len(), 2);
    }

    #[test]
    fn catalog_serializes_as_plain_array() {
        let catalog = Catalog::new(vec![product("a")]);
        let json = serde_json::to_value(&catalog).unwrap();
        assert!(json.is_array());
        assert_eq!(json[0]["name"], "a");
        assert_eq!(json[0]["unit_kind"], "unit");

        let back: Catalog = serde_json::from_value(json).unwrap();
        assert_eq!(back, catalog);
    }
}
