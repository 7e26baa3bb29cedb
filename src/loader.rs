use crate::error::{CliError, CliResult};
use scoreforge_core::{Product, ProductId, VerticalConfig};
use std::collections::HashMap;
use std::fs::{self, File};
use std::io::Read;
use std::path::Path;
use tracing::{debug, warn};

pub fn load_vertical<P: AsRef<Path>>(path: P) -> CliResult<VerticalConfig> {
    let content = fs::read_to_string(path)?;
    let vertical: VerticalConfig = serde_json::from_str(&content)?;
    if vertical.id.trim().is_empty() {
        return Err(CliError::Validation("vertical config has no id".to_string()));
    }
    Ok(vertical)
}

pub fn load_products<P: AsRef<Path>>(path: P) -> CliResult<Vec<Product>> {
    let file = File::open(path)?;
    read_products(file)
}

/// Reads a long-format attribute file:
/// `product_id,sub_population,attribute,value`, one attribute per row.
/// Rows of the same product are grouped in order of first appearance.
pub fn read_products<R: Read>(reader: R) -> CliResult<Vec<Product>> {
    let mut rdr = csv::ReaderBuilder::new()
        .flexible(true)
        .has_headers(true)
        .trim(csv::Trim::All)
        .from_reader(reader);

    let mut products: Vec<Product> = Vec::new();
    let mut index: HashMap<ProductId, usize> = HashMap::new();
    let mut skipped = 0usize;

    for (row_idx, result) in rdr.records().enumerate() {
        let rec = result?;
        if rec.len() < 4 {
            skipped += 1;
            continue;
        }

        let id: ProductId = match rec[0].parse() {
            Ok(id) => id,
            Err(_) => {
                warn!("[Row {}] invalid product id '{}'", row_idx + 1, &rec[0]);
                skipped += 1;
                continue;
            }
        };

        let slot = *index.entry(id).or_insert_with(|| {
            products.push(Product::new(id));
            products.len() - 1
        });
        let product = &mut products[slot];

        if !rec[1].is_empty() {
            product.sub_population = Some(rec[1].to_string());
        }
        if !rec[2].is_empty() {
            product
                .attributes
                .insert(rec[2].to_string(), rec[3].to_string());
        }
    }

    if skipped > 0 {
        warn!("Skipped {} invalid product rows", skipped);
    }
    debug!("Loaded {} products", products.len());
    Ok(products)
}

pub fn write_products<P: AsRef<Path>>(path: P, products: &[Product]) -> CliResult<()> {
    let json = serde_json::to_string_pretty(products)?;
    fs::write(path, json)?;
    Ok(())
}
