//! Result normalization and deduplication.

use std::collections::HashSet;

use crate::{CanonicalProduct, ProductDraft};

/// Keep the first product for every distinct id, preserving iteration order.
pub fn dedupe_by_id(products: impl IntoIterator<Item = CanonicalProduct>) -> Vec<CanonicalProduct> {
    let mut seen = HashSet::new();
    products
        .into_iter()
        .filter(|product| seen.insert(product.id().to_owned()))
        .collect()
}

/// Freeze drafts, dropping any record that fails validation, then deduplicate.
///
/// Running `normalize` on its own output returns the same list.
pub fn normalize(drafts: impl IntoIterator<Item = ProductDraft>) -> Vec<CanonicalProduct> {
    dedupe_by_id(drafts.into_iter().filter_map(|draft| draft.build().ok()))
}

/// Truncate to at most `limit` products.
pub fn cap(mut products: Vec<CanonicalProduct>, limit: usize) -> Vec<CanonicalProduct> {
    products.truncate(limit);
    products
}
