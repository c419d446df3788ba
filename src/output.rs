use preco_tracker::model::{BatchReport, ScrapedProduct};

pub fn format_product(product: &ScrapedProduct) -> String {
    let mut out = String::new();

    out.push_str(&format!("# {}\n\n", product.title));
    out.push_str(&format!("- **ASIN:** {}\n", product.asin));

    match product.price {
        Some(price) => out.push_str(&format!("- **Price:** R$ {:.2}\n", price)),
        None => {
            let reason = product
                .unavailable_reason
                .as_deref()
                .unwrap_or("unavailable");
            out.push_str(&format!("- **Price:** n/a ({})\n", reason));
        }
    }

    if let Some(categories) = &product.categories {
        out.push_str(&format!("- **Category:** {}\n", categories.join(" > ")));
    }

    out
}

pub fn format_report(report: &BatchReport) -> String {
    let mut out = String::new();

    out.push_str(&format!(
        "## Batch refresh: {} updated, {} skipped, {} errors\n",
        report.updated,
        report.skipped,
        report.errors.len()
    ));

    if !report.errors.is_empty() {
        out.push('\n');
        for error in &report.errors {
            out.push_str(&format!("- {}: {}\n", error.asin, error.message));
        }
    }

    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use preco_tracker::model::Asin;

    #[test]
    fn unavailable_product_shows_reason_instead_of_price() {
        let asin = Asin::parse("B08N5WRWNW").unwrap();
        let product = ScrapedProduct::unavailable(
            asin,
            "Mouse".into(),
            Some("Currently unavailable".into()),
            None,
        );
        let text = format_product(&product);
        assert!(text.contains("Currently unavailable"));
        assert!(!text.contains("R$"));
    }

    #[test]
    fn category_path_is_joined_root_to_leaf() {
        let asin = Asin::parse("B08N5WRWNW").unwrap();
        let product = ScrapedProduct::in_stock(
            asin,
            "Mouse".into(),
            89.9,
            Some(vec!["Eletrônicos".into(), "Mouses".into()]),
        );
        let text = format_product(&product);
        assert!(text.contains("Eletrônicos > Mouses"));
        assert!(text.contains("R$ 89.90"));
    }
}
