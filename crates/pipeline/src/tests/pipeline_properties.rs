//! Whole-record behaviour of the pipeline across the built-in families.

use crate::{
    Chunk, ChunkIdStrategy, ChunkType, DiagnosticKind, Pipeline, SchemaDescriptor,
    StructuralError,
};
use catalog_core::AppConfig;
use serde_json::{json, Map, Value};

#[cfg(test)]
mod tests {
    use super::*;

    fn pipeline(family: &str) -> Pipeline {
        Pipeline::new(SchemaDescriptor::builtin(family).unwrap()).unwrap()
    }

    /// Company record with the given branches and products.
    fn company(company_id: &str, branches: Vec<Value>, products: Vec<Value>) -> Value {
        json!({
            "company_id": company_id,
            "company_name": "Acme Assurance",
            "company_type": "general",
            "license_info": {"regulator": "IRA", "license_reference": "L-1"},
            "headquarters": "Nairobi",
            "branches": branches,
            "digital_presence": {"website": "https://acme.example"},
            "reputation": {"customer_rating": 4.1, "claims_settlement_ratio": "88%"},
            "products": products,
            "last_compiled": "2025-01-01"
        })
    }

    fn branch(name: &str) -> Value {
        json!({"branch_name": name, "address": format!("{} Road", name), "phone": ["0700"]})
    }

    /// Product with descriptive fields only; facets are added per test.
    fn product(product_id: &str) -> Map<String, Value> {
        let value = json!({
            "product_id": product_id,
            "product_name": format!("Product {}", product_id),
            "category": "motor",
            "target_market": "private owners",
            "eligibility": {"age_min": 18, "age_max": 70},
            "geographic_coverage": "Kenya"
        });
        match value {
            Value::Object(map) => map,
            _ => unreachable!(),
        }
    }

    fn with(mut product: Map<String, Value>, key: &str, value: Value) -> Map<String, Value> {
        product.insert(key.to_string(), value);
        product
    }

    fn premium() -> Value {
        json!({
            "currency": "KES",
            "payment_frequency": "annual",
            "sample_examples": ["KES 20,000 for a saloon"],
            "rate_table": {"notes": "Rates vary by vehicle value"}
        })
    }

    fn coverage() -> Value {
        json!({"benefits": ["Theft", "Fire"], "duration": "12 months"})
    }

    fn types(chunks: &[Chunk]) -> Vec<ChunkType> {
        chunks.iter().map(|c| c.chunk_type).collect()
    }

    /// Everything but the chunk id.
    fn content(chunks: &[Chunk]) -> Vec<Value> {
        chunks
            .iter()
            .map(|c| {
                let mut value = serde_json::to_value(c).unwrap();
                value.as_object_mut().unwrap().remove("chunk_id");
                value
            })
            .collect()
    }

    #[test]
    fn test_single_product_yields_five_chunks() {
        let p1 = with(with(product("P1"), "premium", premium()), "coverage", coverage());
        let record = company("C1", vec![branch("Main")], vec![Value::Object(p1)]);

        let output = pipeline("alt-facet").run(&record).unwrap();
        let chunks = &output.chunks;

        assert_eq!(
            types(chunks),
            vec![
                ChunkType::CompanyMetadata,
                ChunkType::Branch,
                ChunkType::ProductMetadata,
                ChunkType::Premium,
                ChunkType::Coverage
            ]
        );
        assert!(chunks.iter().all(|c| c.company_id == "C1"));
        assert!(chunks[..2].iter().all(|c| c.product_id.is_none()));
        assert!(chunks[2..]
            .iter()
            .all(|c| c.product_id.as_deref() == Some("P1")));
        assert!(output.reconciliation.is_empty());
        assert_eq!(output.diagnostics.count(DiagnosticKind::Render), 0);

        assert_eq!(
            chunks[3].text,
            "Premium for Product P1 (ID: P1): Currency: KES, Payment frequency: annual. \
             Sample examples: KES 20,000 for a saloon. Notes: Rates vary by vehicle value."
        );
        assert_eq!(chunks[3].raw_data["premium_currency"], json!("KES"));
    }

    #[test]
    fn test_five_products_reconcile_cleanly() {
        let products: Vec<Value> = (1..=5)
            .map(|i| {
                let p = with(product(&format!("P{}", i)), "premium", premium());
                let p = with(p, "coverage", coverage());
                Value::Object(with(p, "exclusions", json!(["War", "Riots"])))
            })
            .collect();
        let branches = vec![branch("Nairobi"), branch("Mombasa"), branch("Kisumu")];
        let record = company("C1", branches, products);

        let output = pipeline("alt-facet").run(&record).unwrap();

        assert_eq!(output.chunks.len(), 1 + 3 + 5 * 4);
        assert!(output.reconciliation.is_empty());
        assert_eq!(output.diagnostics.count(DiagnosticKind::Reconciliation), 0);

        let exclusions: Vec<&Chunk> = output
            .chunks
            .iter()
            .filter(|c| c.chunk_type == ChunkType::Exclusions)
            .collect();
        assert_eq!(exclusions.len(), 5);
        assert_eq!(exclusions[4].text, "Exclusions for Product P5 (ID: P5): War, Riots.");
    }

    #[test]
    fn test_exclusions_missing_null_and_empty() {
        let cases = [
            (None, 0),
            (Some(Value::Null), 0),
            (Some(json!("")), 1),
        ];

        for (exclusions, expected) in cases {
            let mut p = product("P1");
            if let Some(value) = exclusions.clone() {
                p.insert("exclusions".to_string(), value);
            }
            let record = company("C1", vec![], vec![Value::Object(p)]);

            let output = pipeline("alt-facet").run(&record).unwrap();
            let found: Vec<&Chunk> = output
                .chunks
                .iter()
                .filter(|c| c.chunk_type == ChunkType::Exclusions)
                .collect();
            assert_eq!(found.len(), expected, "exclusions = {:?}", exclusions);

            if expected == 1 {
                assert_eq!(found[0].text, "Exclusions for Product P1 (ID: P1): .");
                assert_eq!(found[0].raw_data["exclusions"], json!(""));
            }
        }
    }

    #[test]
    fn test_customer_reviews_scalar_is_wrapped() {
        let p1 = with(product("P1"), "customer_reviews", json!("Quick payouts"));
        let p2 = with(
            product("P2"),
            "customer_reviews",
            json!(["Friendly agents", "Slow renewals"]),
        );
        let record = company("C1", vec![], vec![Value::Object(p1), Value::Object(p2)]);

        let output = pipeline("flat-product").run(&record).unwrap();
        let reviews: Vec<&Chunk> = output
            .chunks
            .iter()
            .filter(|c| c.chunk_type == ChunkType::CustomerReviews)
            .collect();

        assert_eq!(reviews.len(), 2);
        assert_eq!(
            Value::Object(reviews[0].raw_data.clone()),
            json!({"customer_reviews": "Quick payouts"})
        );
        assert_eq!(
            reviews[0].text,
            "Customer reviews for Product P1 (ID: P1): Quick payouts."
        );
        assert_eq!(reviews[0].product_id.as_deref(), Some("P1"));
        assert_eq!(
            reviews[1].raw_data["customer_reviews"],
            json!("Friendly agents, Slow renewals")
        );
        assert_eq!(
            reviews[1].text,
            "Customer reviews for Product P2 (ID: P2): Friendly agents, Slow renewals."
        );
        assert_eq!(output.diagnostics.count(DiagnosticKind::Render), 0);
    }

    #[test]
    fn test_premium_missing_required_field_degrades() {
        let p1 = with(product("P1"), "premium", json!({"currency": "KES"}));
        let record = company("C1", vec![], vec![Value::Object(p1)]);

        let output = pipeline("flat-product").run(&record).unwrap();
        let premium = output
            .chunks
            .iter()
            .find(|c| c.chunk_type == ChunkType::Premium)
            .unwrap();

        assert!(premium
            .text
            .starts_with("Error generating text for premium: Missing key"));
        assert_eq!(
            premium.text,
            "Error generating text for premium: Missing key premium_payment_frequency"
        );
        assert_eq!(premium.raw_data["premium_currency"], json!("KES"));
        assert_eq!(output.diagnostics.count(DiagnosticKind::Render), 1);
        assert!(output.reconciliation.is_empty());
    }

    #[test]
    fn test_identical_input_identical_content() {
        let p1 = with(product("P1"), "premium", premium());
        let record = company(
            "C1",
            vec![branch("Main"), branch("Annex")],
            vec![Value::Object(p1)],
        );
        let pipeline = pipeline("flat-product");

        let first = pipeline.run(&record).unwrap();
        let second = pipeline.run(&record).unwrap();

        assert_eq!(content(&first.chunks), content(&second.chunks));
        assert_ne!(first.chunks[0].chunk_id, second.chunks[0].chunk_id);
    }

    #[test]
    fn test_deterministic_ids_from_config() {
        let config = AppConfig {
            schema: "nested-product".to_string(),
            id_strategy: "deterministic".to_string(),
            ..AppConfig::default()
        };
        let pipeline = Pipeline::from_config(&config).unwrap();
        let record = company("C1", vec![branch("Main")], vec![]);

        let first = pipeline.run(&record).unwrap();
        let second = pipeline.run(&record).unwrap();
        let ids = |chunks: &[Chunk]| chunks.iter().map(|c| c.chunk_id.clone()).collect::<Vec<_>>();
        assert_eq!(ids(&first.chunks), ids(&second.chunks));

        let explicit = pipeline.with_id_strategy(ChunkIdStrategy::Random);
        let third = explicit.run(&record).unwrap();
        assert_ne!(ids(&first.chunks), ids(&third.chunks));
    }

    #[test]
    fn test_nested_hierarchy_counts_and_keys() {
        let variants = json!([
            {"variant_id": "V1", "variant_name": "Gold", "premium": {"currency": "KES"}},
            {"variant_id": "V2", "variant_name": "Silver"}
        ]);
        let sub_products = json!([
            {"sub_product_id": "S1", "sub_product_name": "Term", "variants": variants},
            {"sub_product_id": "S2", "sub_product_name": "Whole", "variants": null}
        ]);
        let p1 = with(product("P1"), "sub_products", sub_products);
        let record = company("C1", vec![], vec![Value::Object(p1)]);

        let output = pipeline("nested-product").run(&record).unwrap();
        assert!(output.reconciliation.is_empty(), "{:?}", output.reconciliation);

        assert_eq!(
            types(&output.chunks),
            vec![
                ChunkType::CompanyMetadata,
                ChunkType::ProductMetadata,
                ChunkType::SubProductMetadata,
                ChunkType::VariantMetadata,
                ChunkType::Premium,
                ChunkType::VariantMetadata,
                ChunkType::SubProductMetadata,
            ]
        );

        let gold_premium = &output.chunks[4];
        assert_eq!(gold_premium.product_id.as_deref(), Some("P1"));
        assert_eq!(gold_premium.sub_product_id.as_deref(), Some("S1"));
        assert_eq!(gold_premium.variant_id.as_deref(), Some("V1"));
        assert!(gold_premium.text.starts_with("Premium for Gold (ID: V1)"));

        let whole = &output.chunks[6];
        assert_eq!(whole.sub_product_id.as_deref(), Some("S2"));
        assert!(whole.variant_id.is_none());
    }

    #[test]
    fn test_missing_optional_keys_do_not_block_output() {
        let record = company(
            "C1",
            vec![],
            vec![json!({"product_id": "P1", "product_name": "Bare"})],
        );

        let output = pipeline("alt-facet").run(&record).unwrap();
        assert_eq!(output.chunks.len(), 2);
        assert!(output.diagnostics.count(DiagnosticKind::FieldMissing) > 0);
        // product metadata needs category, so its text is degraded
        assert_eq!(output.diagnostics.count(DiagnosticKind::Render), 1);
    }

    #[test]
    fn test_structural_error_aborts_run() {
        let mut record = company("C1", vec![], vec![]);
        record["branches"] = json!("Nairobi");

        let err = pipeline("flat-product").run(&record).unwrap_err();
        assert!(matches!(err, StructuralError::NotASequence { .. }));
    }

    #[test]
    fn test_input_record_is_not_mutated() {
        let p1 = with(product("P1"), "premium", premium());
        let record = company("C1", vec![branch("Main")], vec![Value::Object(p1)]);
        let before = record.clone();

        pipeline("nested-product").run(&record).unwrap();
        assert_eq!(record, before);
    }
}
