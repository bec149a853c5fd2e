//! Text and HTML rendering of catalog views.
//!
//! Product text comes straight from the feed, so every field is escaped for
//! its target before it is written: HTML entities for `--html`, control
//! characters removed for the terminal.

use std::fmt::Write;

use lista_core::{Catalog, Product};
use lista_feed::{CatalogView, Freshness, SyncReport};

const EMPTY_RESULT: &str = "No products found.";

const NAME_WIDTH: usize = 36;
const DETAIL_WIDTH: usize = 32;
const BRAND_WIDTH: usize = 18;
const UNIT_WIDTH: usize = 6;

/// Removes control characters so feed text cannot move the cursor or emit
/// terminal escape sequences.
pub(crate) fn sanitize_terminal(text: &str) -> String {
    text.chars().filter(|c| !c.is_control()).collect()
}

pub(crate) fn escape_html(text: &str) -> String {
    let mut escaped = String::with_capacity(text.len());
    for c in text.chars() {
        match c {
            '&' => escaped.push_str("&amp;"),
            '<' => escaped.push_str("&lt;"),
            '>' => escaped.push_str("&gt;"),
            '"' => escaped.push_str("&quot;"),
            '\'' => escaped.push_str("&#39;"),
            _ => escaped.push(c),
        }
    }
    escaped
}

fn price_label(product: &Product) -> String {
    format!("{} {}", product.currency, product.price)
}

/// Truncates to `width` characters, marking the cut with `...`.
fn fit(text: &str, width: usize) -> String {
    if text.chars().count() > width {
        let kept: String = text.chars().take(width.saturating_sub(3)).collect();
        format!("{kept}...")
    } else {
        text.to_owned()
    }
}

pub(crate) fn render_text(catalog: &Catalog) -> String {
    if catalog.is_empty() {
        return format!("{EMPTY_RESULT}\n");
    }

    let mut out = String::new();
    let _ = writeln!(
        out,
        "{:<NAME_WIDTH$} {:<DETAIL_WIDTH$} {:<BRAND_WIDTH$} {:<UNIT_WIDTH$} PRICE",
        "PRODUCT", "DETAIL", "BRAND", "UNIT"
    );
    for product in catalog {
        let _ = writeln!(
            out,
            "{:<NAME_WIDTH$} {:<DETAIL_WIDTH$} {:<BRAND_WIDTH$} {:<UNIT_WIDTH$} {}",
            fit(&sanitize_terminal(&product.name), NAME_WIDTH),
            fit(&sanitize_terminal(&product.detail), DETAIL_WIDTH),
            fit(&sanitize_terminal(&product.brand), BRAND_WIDTH),
            product.unit_kind.suffix(),
            sanitize_terminal(&price_label(product)),
        );
    }
    out
}

/// One `<tr>` per product, cells labelled for responsive tables.
pub(crate) fn render_html_rows(catalog: &Catalog) -> String {
    if catalog.is_empty() {
        return format!("<tr><td colspan=\"5\">{EMPTY_RESULT}</td></tr>\n");
    }

    let mut out = String::new();
    for product in catalog {
        let _ = writeln!(
            out,
            "<tr><td data-label=\"Product\">{}</td><td data-label=\"Detail\">{}</td>\
             <td data-label=\"Brand\">{}</td><td data-label=\"Unit\">{}</td>\
             <td data-label=\"Price\">{}</td></tr>",
            escape_html(&product.name),
            escape_html(&product.detail),
            escape_html(&product.brand),
            product.unit_kind.suffix(),
            escape_html(&price_label(product)),
        );
    }
    out
}

pub(crate) fn render_catalog(catalog: &Catalog, html: bool) -> String {
    if html {
        render_html_rows(catalog)
    } else {
        render_text(catalog)
    }
}

/// Summary of a sync cycle for the terminal.
pub(crate) fn render_status(report: &SyncReport) -> String {
    let mut out = String::new();
    match report.final_state() {
        Some(state) => {
            let _ = writeln!(out, "state: {state}");
        }
        None => {
            let _ = writeln!(out, "state: skipped (another sync is running)");
        }
    }
    if let Some(error) = &report.error {
        let _ = writeln!(out, "error: {}", sanitize_terminal(&error.to_string()));
    }
    out.push_str(&render_view_summary(&report.view));
    out
}

fn render_view_summary(view: &CatalogView) -> String {
    let mut out = String::new();
    if let Some(identifier) = view.identifier() {
        let _ = writeln!(out, "snapshot: {}", sanitize_terminal(identifier.as_str()));
    }
    if let Some(date) = view.date_label() {
        let _ = writeln!(out, "Price list of {date}");
    }
    match view.freshness() {
        Freshness::Fresh => {
            let _ = writeln!(out, "products: {} (up to date)", view.catalog().len());
        }
        Freshness::Fallback => {
            let _ = writeln!(
                out,
                "products: {} (cached copy; the latest price list could not be loaded)",
                view.catalog().len()
            );
        }
        Freshness::Empty => {
            let _ = writeln!(out, "no price list available");
        }
    }
    out
}
