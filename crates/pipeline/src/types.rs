//! Catalog chunk type definitions.

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::fmt;
use std::str::FromStr;

/// Position of an entity in the company hierarchy.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EntityLevel {
    Company,
    Branch,
    Product,
    SubProduct,
    Variant,
}

impl EntityLevel {
    /// Metadata chunk type emitted once per entity of this level.
    pub fn metadata_chunk_type(&self) -> ChunkType {
        match self {
            EntityLevel::Company => ChunkType::CompanyMetadata,
            EntityLevel::Branch => ChunkType::Branch,
            EntityLevel::Product => ChunkType::ProductMetadata,
            EntityLevel::SubProduct => ChunkType::SubProductMetadata,
            EntityLevel::Variant => ChunkType::VariantMetadata,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            EntityLevel::Company => "company",
            EntityLevel::Branch => "branch",
            EntityLevel::Product => "product",
            EntityLevel::SubProduct => "sub_product",
            EntityLevel::Variant => "variant",
        }
    }
}

/// Kind of a chunk; selects the render template and the required foreign keys.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ChunkType {
    CompanyMetadata,
    Branch,
    ProductMetadata,
    SubProductMetadata,
    VariantMetadata,
    Premium,
    Coverage,
    Exclusions,
    AddOns,
    ClaimsProcess,
    RenewalTerms,
    ProviderNetwork,
    SumAssured,
    CustomerReviews,
}

impl ChunkType {
    pub const ALL: [ChunkType; 14] = [
        ChunkType::CompanyMetadata,
        ChunkType::Branch,
        ChunkType::ProductMetadata,
        ChunkType::SubProductMetadata,
        ChunkType::VariantMetadata,
        ChunkType::Premium,
        ChunkType::Coverage,
        ChunkType::Exclusions,
        ChunkType::AddOns,
        ChunkType::ClaimsProcess,
        ChunkType::RenewalTerms,
        ChunkType::ProviderNetwork,
        ChunkType::SumAssured,
        ChunkType::CustomerReviews,
    ];

    /// Wire name, also the facet key in source records.
    pub fn as_str(&self) -> &'static str {
        match self {
            ChunkType::CompanyMetadata => "company_metadata",
            ChunkType::Branch => "branch",
            ChunkType::ProductMetadata => "product_metadata",
            ChunkType::SubProductMetadata => "sub_product_metadata",
            ChunkType::VariantMetadata => "variant_metadata",
            ChunkType::Premium => "premium",
            ChunkType::Coverage => "coverage",
            ChunkType::Exclusions => "exclusions",
            ChunkType::AddOns => "add_ons",
            ChunkType::ClaimsProcess => "claims_process",
            ChunkType::RenewalTerms => "renewal_terms",
            ChunkType::ProviderNetwork => "provider_network",
            ChunkType::SumAssured => "sum_assured",
            ChunkType::CustomerReviews => "customer_reviews",
        }
    }

    /// Whether this chunk type is rendered from a product-like facet.
    pub fn is_facet(&self) -> bool {
        !matches!(
            self,
            ChunkType::CompanyMetadata
                | ChunkType::Branch
                | ChunkType::ProductMetadata
                | ChunkType::SubProductMetadata
                | ChunkType::VariantMetadata
        )
    }
}

impl fmt::Display for ChunkType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ChunkType {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        ChunkType::ALL
            .iter()
            .copied()
            .find(|t| t.as_str() == s)
            .ok_or_else(|| format!("Unknown chunk type: {}", s))
    }
}

/// Foreign keys that tie a chunk (or entity) back to its place in the hierarchy.
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct EntityKeys {
    pub company_id: String,
    pub product_id: Option<String>,
    pub sub_product_id: Option<String>,
    pub variant_id: Option<String>,
}

impl EntityKeys {
    pub fn company(company_id: impl Into<String>) -> Self {
        Self {
            company_id: company_id.into(),
            ..Default::default()
        }
    }

    /// Keys for a child entity one level below `self`.
    pub fn child(&self, level: EntityLevel, id: &str) -> Self {
        let mut keys = self.clone();
        match level {
            EntityLevel::Product => keys.product_id = Some(id.to_string()),
            EntityLevel::SubProduct => keys.sub_product_id = Some(id.to_string()),
            EntityLevel::Variant => keys.variant_id = Some(id.to_string()),
            EntityLevel::Company | EntityLevel::Branch => {}
        }
        keys
    }

    /// The deepest level these keys identify.
    pub fn level(&self) -> EntityLevel {
        if self.variant_id.is_some() {
            EntityLevel::Variant
        } else if self.sub_product_id.is_some() {
            EntityLevel::SubProduct
        } else if self.product_id.is_some() {
            EntityLevel::Product
        } else {
            EntityLevel::Company
        }
    }

    /// Identity fields as `(name, value)` pairs, outermost first.
    pub fn pairs(&self) -> Vec<(&'static str, &str)> {
        let mut pairs = vec![("company_id", self.company_id.as_str())];
        if let Some(id) = &self.product_id {
            pairs.push(("product_id", id.as_str()));
        }
        if let Some(id) = &self.sub_product_id {
            pairs.push(("sub_product_id", id.as_str()));
        }
        if let Some(id) = &self.variant_id {
            pairs.push(("variant_id", id.as_str()));
        }
        pairs
    }
}

/// One retrievable text unit plus its provenance.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Chunk {
    /// Opaque, globally unique identifier
    pub chunk_id: String,

    pub company_id: String,

    pub product_id: Option<String>,

    pub sub_product_id: Option<String>,

    pub variant_id: Option<String>,

    pub chunk_type: ChunkType,

    /// Flattened source mapping the text was rendered from
    pub raw_data: Map<String, Value>,

    /// Rendered natural-language text
    pub text: String,
}

impl Chunk {
    pub fn new(
        chunk_id: String,
        keys: EntityKeys,
        chunk_type: ChunkType,
        raw_data: Map<String, Value>,
        text: String,
    ) -> Self {
        Self {
            chunk_id,
            company_id: keys.company_id,
            product_id: keys.product_id,
            sub_product_id: keys.sub_product_id,
            variant_id: keys.variant_id,
            chunk_type,
            raw_data,
            text,
        }
    }

    pub fn keys(&self) -> EntityKeys {
        EntityKeys {
            company_id: self.company_id.clone(),
            product_id: self.product_id.clone(),
            sub_product_id: self.sub_product_id.clone(),
            variant_id: self.variant_id.clone(),
        }
    }
}
