//! Wire format of a published snapshot.
//!
//! A snapshot is a gzip-compressed JSON array of objects:
//!
//! ```json
//! [{"producto": "Caño", "detalle": "20mm", "marca": "Acme",
//!   "unidad": "UN", "moneda": "USD", "precio": 12.5}]
//! ```
//!
//! `unidad` is `"UN"` for items sold per piece; any other code means the item
//! is sold by length. `precio` may be a JSON number or a numeric string.

use std::io::Write;

use flate2::write::GzEncoder;
use flate2::Compression;
use lista_core::{Catalog, Product, UnitKind};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::error::FeedError;

#[derive(Debug, Serialize, Deserialize)]
struct WireProduct {
    producto: String,
    detalle: String,
    marca: String,
    unidad: String,
    moneda: String,
    precio: Decimal,
}

impl WireProduct {
    fn from_product(product: &Product) -> Self {
        Self {
            producto: product.name.clone(),
            detalle: product.detail.clone(),
            marca: product.brand.clone(),
            unidad: product.unit_kind.wire_code().to_owned(),
            moneda: product.currency.clone(),
            precio: product.price,
        }
    }

    fn into_product(self, index: usize, context: &str) -> Result<Product, FeedError> {
        if self.precio.is_sign_negative() && !self.precio.is_zero() {
            return Err(FeedError::Parse {
                context: context.to_owned(),
                reason: format!(
                    "product {index} (\"{}\") has negative price {}",
                    self.producto, self.precio
                ),
            });
        }

        Ok(Product {
            name: self.producto,
            detail: self.detalle,
            brand: self.marca,
            unit_kind: UnitKind::from_wire(&self.unidad),
            currency: self.moneda,
            price: self.precio,
        })
    }
}

/// Parses decoded snapshot text into a validated catalog.
///
/// `context` names the snapshot in error messages.
///
/// # Errors
///
/// Returns [`FeedError::Parse`] if the text is not a JSON array of product
/// records or any record has a negative price.
pub fn parse_catalog(text: &str, context: &str) -> Result<Catalog, FeedError> {
    let rows: Vec<WireProduct> = serde_json::from_str(text).map_err(|e| FeedError::Parse {
        context: context.to_owned(),
        reason: e.to_string(),
    })?;

    rows.into_iter()
        .enumerate()
        .map(|(index, row)| row.into_product(index, context))
        .collect::<Result<Vec<_>, _>>()
        .map(Catalog::new)
}

/// Encodes a catalog in the published format (JSON, then gzip).
///
/// # Errors
///
/// Returns an I/O error if serialization or compression fails.
pub fn encode_catalog(catalog: &Catalog) -> std::io::Result<Vec<u8>> {
    let rows: Vec<WireProduct> = catalog.iter().map(WireProduct::from_product).collect();
    let json = serde_json::to_vec(&rows)?;

    let mut encoder = GzEncoder::new(Vec::new(), Compression::default());
    encoder.write_all(&json)?;
    encoder.finish()
}

#[cfg(test)]
mod tests {
    use futures::stream;

    use super::*;
    use crate::decode::{collect_text, text_chunks};

    fn product(name: &str, unit_kind: UnitKind, price: Decimal) -> Product {
        Product {
            name: name.to_owned(),
            detail: "Ø 20mm <b>rojo</b>".to_owned(),
            brand: "Tigre".to_owned(),
            unit_kind,
            currency: "USD".to_owned(),
            price,
        }
    }

    #[test]
    fn parse_catalog_maps_wire_fields() {
        let text = r#"[
            {"producto":"Caño","detalle":"20mm","marca":"Tigre","unidad":"UN","moneda":"USD","precio":12.5},
            {"producto":"Cable","detalle":"2.5mm","marca":"Pirelli","unidad":"MTS","moneda":"$","precio":"830.10"}
        ]"#;
        let catalog = parse_catalog(text, "a.json.gz").unwrap();

        assert_eq!(catalog.len(), 2);
        let first = &catalog.products()[0];
        assert_eq!(first.name, "Caño");
        assert_eq!(first.detail, "20mm");
        assert_eq!(first.brand, "Tigre");
        assert_eq!(first.unit_kind, UnitKind::Unit);
        assert_eq!(first.currency, "USD");
        assert_eq!(first.price, Decimal::new(125, 1));

        let second = &catalog.products()[1];
        assert_eq!(second.unit_kind, UnitKind::Length);
        assert_eq!(second.price, Decimal::new(83010, 2));
    }

    #[test]
    fn parse_catalog_accepts_empty_array() {
        assert!(parse_catalog("[]", "empty.json.gz").unwrap().is_empty());
    }

    #[test]
    fn parse_catalog_rejects_malformed_json() {
        let err = parse_catalog("[{\"producto\": ", "bad.json.gz").unwrap_err();
        assert!(
            matches!(err, FeedError::Parse { ref context, .. } if context == "bad.json.gz"),
            "expected Parse, got: {err:?}"
        );
    }

    #[test]
    fn parse_catalog_rejects_missing_field() {
        let text = r#"[{"producto":"Caño","detalle":"20mm","unidad":"UN","moneda":"USD","precio":1}]"#;
        let err = parse_catalog(text, "a.json.gz").unwrap_err();
        assert!(matches!(err, FeedError::Parse { ref reason, .. } if reason.contains("marca")));
    }

    #[test]
    fn parse_catalog_rejects_negative_price() {
        let text = r#"[{"producto":"Caño","detalle":"","marca":"","unidad":"UN","moneda":"USD","precio":-3}]"#;
        let err = parse_catalog(text, "a.json.gz").unwrap_err();
        assert!(matches!(err, FeedError::Parse { ref reason, .. } if reason.contains("negative price")));
    }

    #[tokio::test]
    async fn encode_then_decode_reproduces_catalog() {
        let catalog = Catalog::new(vec![
            product("Caño PVC", UnitKind::Unit, Decimal::new(1999, 2)),
            product("Manguera", UnitKind::Length, Decimal::new(0, 0)),
            product("Codo \"90°\"", UnitKind::Unit, Decimal::new(123_456_789, 3)),
        ]);

        let compressed = encode_catalog(&catalog).unwrap();
        let chunks: Vec<Result<Vec<u8>, FeedError>> =
            compressed.chunks(7).map(|c| Ok(c.to_vec())).collect();
        let text = collect_text(text_chunks(stream::iter(chunks))).await.unwrap();
        let decoded = parse_catalog(&text, "roundtrip.json.gz").unwrap();

        assert_eq!(decoded, catalog);
    }
}
