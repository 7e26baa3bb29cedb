use scoreforge::error::CliError;
use scoreforge::loader::{load_products, load_vertical, write_products};
use scoreforge_core::{Direction, Product};
use std::io::Write;
use tempfile::NamedTempFile;

#[test]
fn test_vertical_loads_camel_case_json() {
    let mut file = NamedTempFile::new().unwrap();
    write!(
        file,
        r#"{{
            "id": "tv",
            "attributes": [
                {{"key": "REPAIR", "asScore": true, "betterIs": "LOWER",
                  "synonyms": {{"shop-a": ["REPARABILITY"]}}}}
            ],
            "impactScore": {{"criteriasPonderation": {{"REPAIR": 1.0}},
                            "minDistinctValuesForSigma": 4}},
            "worseLimit": 2
        }}"#
    )
    .unwrap();

    let vertical = load_vertical(file.path()).unwrap();
    assert_eq!(vertical.id, "tv");
    assert_eq!(vertical.direction_for("REPAIR"), Direction::Lower);
    let keys: Vec<&str> = vertical.attribute("REPAIR").unwrap().lookup_keys().collect();
    assert_eq!(keys, vec!["REPAIR", "REPARABILITY"]);
    assert_eq!(vertical.worse_limit, 2);
    assert_eq!(vertical.betters_limit, 3);
    assert_eq!(
        vertical.impact_score.unwrap().min_distinct_values_for_sigma,
        Some(4)
    );
}

#[test]
fn test_vertical_without_id_is_rejected() {
    let mut file = NamedTempFile::new().unwrap();
    write!(file, r#"{{"attributes": []}}"#).unwrap();
    assert!(matches!(
        load_vertical(file.path()),
        Err(CliError::Validation(_))
    ));
}

#[test]
fn test_malformed_vertical_is_a_json_error() {
    let mut file = NamedTempFile::new().unwrap();
    write!(file, "{{ not json").unwrap();
    assert!(matches!(load_vertical(file.path()), Err(CliError::Json(_))));
}

#[test]
fn test_products_csv() {
    let mut file = NamedTempFile::new().unwrap();
    writeln!(file, "product_id,sub_population,attribute,value").unwrap();
    writeln!(file, "1,oled,REPAIR,4").unwrap();
    writeln!(file, " 2 , lcd , REPAIR , 9 ").unwrap();
    writeln!(file, "1,oled,WARRANTY,2").unwrap();

    let products = load_products(file.path()).unwrap();
    assert_eq!(products.len(), 2);
    assert_eq!(products[0].attributes.len(), 2);
    assert_eq!(products[1].attributes["REPAIR"], "9");
    assert_eq!(products[1].sub_population.as_deref(), Some("lcd"));
}

#[test]
fn test_missing_products_file_is_io_error() {
    assert!(matches!(
        load_products("/definitely/not/here.csv"),
        Err(CliError::Io(_))
    ));
}

#[test]
fn test_written_products_read_back() {
    let file = NamedTempFile::new().unwrap();
    let products = vec![Product::new(5).with_attribute("REPAIR", "4")];
    write_products(file.path(), &products).unwrap();

    let content = std::fs::read_to_string(file.path()).unwrap();
    let back: Vec<Product> = serde_json::from_str(&content).unwrap();
    assert_eq!(back, products);
}
