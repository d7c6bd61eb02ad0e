//! In-memory product search used by clients over an already-fetched list.
//! Pure and synchronous: the result is a function of the product slice and
//! the current filter state, with no I/O behind it.

use serde::{Deserialize, Serialize};
use std::cmp::Ordering;

// `i64::div_ceil` is not yet stable; this mirrors its standard library semantics.
fn div_ceil_i64(lhs: i64, rhs: i64) -> i64 {
    let d = lhs / rhs;
    let r = lhs % rhs;
    if (r > 0 && rhs > 0) || (r < 0 && rhs < 0) {
        d + 1
    } else {
        d
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct SearchProduct {
    pub id: i64,
    pub name: String,
    pub description: String,
    #[serde(default)]
    pub brand: Option<String>,
    #[serde(default)]
    pub category: Option<String>,
    #[serde(default)]
    pub tags: Vec<String>,
    pub final_price: i64,
    #[serde(default)]
    pub rating: f64,
    #[serde(default)]
    pub review_count: i32,
    #[serde(default)]
    pub stock: i32,
    #[serde(default)]
    pub discount: i32,
    #[serde(default)]
    pub featured: bool,
    #[serde(default)]
    pub variants: Vec<SearchVariant>,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct SearchVariant {
    #[serde(default)]
    pub color: Option<String>,
    #[serde(default)]
    pub size: Option<String>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
pub enum SortKey {
    #[serde(rename = "price-asc")]
    PriceAsc,
    #[serde(rename = "price-desc")]
    PriceDesc,
    #[serde(rename = "rating")]
    Rating,
    #[serde(rename = "name")]
    Name,
    #[serde(rename = "popular")]
    Popular,
    #[default]
    #[serde(rename = "newest")]
    Newest,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase", default)]
pub struct SearchFilters {
    pub category: Option<String>,
    pub min_price: Option<i64>,
    pub max_price: Option<i64>,
    pub rating: Option<f64>,
    pub in_stock: bool,
    pub on_sale: bool,
    pub featured: bool,
    pub brands: Vec<String>,
    pub colors: Vec<String>,
    pub sizes: Vec<String>,
    pub sort: SortKey,
    pub page: usize,
    pub limit: usize,
}

impl Default for SearchFilters {
    fn default() -> Self {
        SearchFilters {
            category: None,
            min_price: None,
            max_price: None,
            rating: None,
            in_stock: false,
            on_sale: false,
            featured: false,
            brands: Vec::new(),
            colors: Vec::new(),
            sizes: Vec::new(),
            sort: SortKey::Newest,
            page: 1,
            limit: 12,
        }
    }
}

#[derive(Debug, Serialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct SearchPage {
    pub products: Vec<SearchProduct>,
    pub total: usize,
    pub page: usize,
    pub total_pages: usize,
    pub has_more: bool,
}

#[derive(Debug, Serialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct PriceRange {
    pub min: i64,
    pub max: i64,
}

#[derive(Debug, Serialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct FilterOptions {
    pub brands: Vec<String>,
    pub categories: Vec<String>,
    pub colors: Vec<String>,
    pub sizes: Vec<String>,
    pub price_range: PriceRange,
}

#[derive(Debug, Default)]
pub struct ProductSearch {
    pub filters: SearchFilters,
}

impl ProductSearch {
    pub fn new() -> Self {
        Self::default()
    }

    /// Filter, sort, and slice `products` against the current filter state.
    /// Predicates AND across dimensions; multi-select dimensions (brands,
    /// colors, sizes) OR within themselves.
    pub fn search(&self, products: &[SearchProduct], query: &str) -> SearchPage {
        let query_lower = query.to_lowercase();
        let mut matched: Vec<&SearchProduct> = products
            .iter()
            .filter(|p| query.is_empty() || Self::matches_text(p, &query_lower))
            .filter(|p| self.matches_filters(p))
            .collect();

        self.sort(&mut matched);

        let total = matched.len();
        let limit = self.filters.limit.max(1);
        let page = self.filters.page.max(1);
        let start = (page - 1) * limit;
        let end = start + limit;

        SearchPage {
            products: matched
                .into_iter()
                .skip(start)
                .take(limit)
                .cloned()
                .collect(),
            total,
            page,
            total_pages: total.div_ceil(limit),
            has_more: end < total,
        }
    }

    pub fn reset(&mut self) {
        self.filters = SearchFilters::default();
    }

    fn matches_text(product: &SearchProduct, query_lower: &str) -> bool {
        product.name.to_lowercase().contains(query_lower)
            || product.description.to_lowercase().contains(query_lower)
            || product
                .brand
                .as_ref()
                .is_some_and(|brand| brand.to_lowercase().contains(query_lower))
            || product
                .tags
                .iter()
                .any(|tag| tag.to_lowercase().contains(query_lower))
    }

    fn matches_filters(&self, product: &SearchProduct) -> bool {
        let filters = &self.filters;

        if let Some(category) = &filters.category {
            if category != "all" && product.category.as_deref() != Some(category.as_str()) {
                return false;
            }
        }
        if let Some(min_price) = filters.min_price {
            if product.final_price < min_price {
                return false;
            }
        }
        if let Some(max_price) = filters.max_price {
            if product.final_price > max_price {
                return false;
            }
        }
        if let Some(rating) = filters.rating {
            if product.rating < rating {
                return false;
            }
        }
        if filters.in_stock && product.stock <= 0 {
            return false;
        }
        if filters.on_sale && product.discount <= 0 {
            return false;
        }
        if filters.featured && !product.featured {
            return false;
        }
        if !filters.brands.is_empty() {
            let brand_matches = product
                .brand
                .as_ref()
                .is_some_and(|brand| filters.brands.contains(brand));
            if !brand_matches {
                return false;
            }
        }
        if !filters.colors.is_empty() {
            let color_matches = product.variants.iter().any(|variant| {
                variant
                    .color
                    .as_ref()
                    .is_some_and(|color| filters.colors.contains(color))
            });
            if !color_matches {
                return false;
            }
        }
        if !filters.sizes.is_empty() {
            let size_matches = product.variants.iter().any(|variant| {
                variant
                    .size
                    .as_ref()
                    .is_some_and(|size| filters.sizes.contains(size))
            });
            if !size_matches {
                return false;
            }
        }

        true
    }

    fn sort(&self, products: &mut [&SearchProduct]) {
        match self.filters.sort {
            SortKey::PriceAsc => products.sort_by_key(|p| p.final_price),
            SortKey::PriceDesc => products.sort_by_key(|p| std::cmp::Reverse(p.final_price)),
            SortKey::Rating => products.sort_by(|a, b| {
                b.rating.partial_cmp(&a.rating).unwrap_or(Ordering::Equal)
            }),
            SortKey::Name => products.sort_by(|a, b| a.name.cmp(&b.name)),
            SortKey::Popular => products.sort_by_key(|p| std::cmp::Reverse(p.review_count)),
            SortKey::Newest => products.sort_by_key(|p| std::cmp::Reverse(p.id)),
        }
    }

    /// Distinct filter choices present in `products`, for rendering facets.
    pub fn filter_options(products: &[SearchProduct]) -> FilterOptions {
        let mut brands = Vec::new();
        let mut categories = vec!["all".to_owned()];
        let mut colors = Vec::new();
        let mut sizes = Vec::new();

        for product in products {
            if let Some(brand) = &product.brand {
                if !brands.contains(brand) {
                    brands.push(brand.clone());
                }
            }
            if let Some(category) = &product.category {
                if !categories.contains(category) {
                    categories.push(category.clone());
                }
            }
            for variant in &product.variants {
                if let Some(color) = &variant.color {
                    if !colors.contains(color) {
                        colors.push(color.clone());
                    }
                }
                if let Some(size) = &variant.size {
                    if !sizes.contains(size) {
                        sizes.push(size.clone());
                    }
                }
            }
        }

        let min = products.iter().map(|p| p.final_price).min().unwrap_or(0);
        let max = products.iter().map(|p| p.final_price).max().unwrap_or(0);

        FilterOptions {
            brands,
            categories,
            colors,
            sizes,
            price_range: PriceRange {
                min: min / 1000 * 1000,
                max: div_ceil_i64(max, 1000) * 1000,
            },
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn product(id: i64, name: &str, final_price: i64) -> SearchProduct {
        SearchProduct {
            id,
            name: name.to_owned(),
            description: format!("{name} description"),
            brand: None,
            category: None,
            tags: Vec::new(),
            final_price,
            rating: 4.0,
            review_count: 0,
            stock: 10,
            discount: 0,
            featured: false,
            variants: Vec::new(),
        }
    }

    fn catalog() -> Vec<SearchProduct> {
        vec![
            SearchProduct {
                brand: Some("Aster".to_owned()),
                category: Some("shoes".to_owned()),
                tags: vec!["running".to_owned()],
                rating: 4.5,
                review_count: 120,
                discount: 20,
                featured: true,
                variants: vec![SearchVariant {
                    color: Some("Blue".to_owned()),
                    size: Some("42".to_owned()),
                }],
                ..product(1, "Trail Runner", 80_000)
            },
            SearchProduct {
                brand: Some("Borea".to_owned()),
                category: Some("shoes".to_owned()),
                rating: 3.8,
                review_count: 40,
                stock: 0,
                variants: vec![SearchVariant {
                    color: Some("Red".to_owned()),
                    size: Some("40".to_owned()),
                }],
                ..product(2, "City Sneaker", 120_000)
            },
            SearchProduct {
                brand: Some("Aster".to_owned()),
                category: Some("bags".to_owned()),
                rating: 4.9,
                review_count: 300,
                ..product(3, "Day Pack", 150_000)
            },
        ]
    }

    #[test]
    fn price_ascending_is_non_decreasing() {
        let mut search = ProductSearch::new();
        search.filters.sort = SortKey::PriceAsc;

        let page = search.search(&catalog(), "");
        let prices: Vec<i64> = page.products.iter().map(|p| p.final_price).collect();
        assert!(prices.windows(2).all(|pair| pair[0] <= pair[1]));
    }

    #[test]
    fn default_sort_is_newest_first() {
        let search = ProductSearch::new();
        let page = search.search(&catalog(), "");
        let ids: Vec<i64> = page.products.iter().map(|p| p.id).collect();
        assert_eq!(ids, vec![3, 2, 1]);
    }

    #[test]
    fn pagination_slices_and_counts() {
        let products: Vec<SearchProduct> = (1..=25)
            .map(|i| product(i, &format!("Item {i}"), i * 1000))
            .collect();

        let mut search = ProductSearch::new();
        search.filters.sort = SortKey::PriceAsc;
        search.filters.page = 2;

        let page = search.search(&products, "");
        assert_eq!(page.total, 25);
        assert_eq!(page.total_pages, 3);
        assert_eq!(page.page, 2);
        assert!(page.has_more);
        // limit 12, page 2: items 13 through 24
        assert_eq!(page.products.len(), 12);
        assert_eq!(page.products.first().map(|p| p.id), Some(13));
        assert_eq!(page.products.last().map(|p| p.id), Some(24));

        search.filters.page = 3;
        let last = search.search(&products, "");
        assert_eq!(last.products.len(), 1);
        assert!(!last.has_more);
    }

    #[test]
    fn filters_are_a_conjunction() {
        let mut search = ProductSearch::new();
        search.filters.category = Some("shoes".to_owned());
        search.filters.in_stock = true;

        let page = search.search(&catalog(), "");
        assert_eq!(page.total, 1);
        assert_eq!(page.products[0].id, 1);
    }

    #[test]
    fn brand_filter_ors_within_the_set() {
        let mut search = ProductSearch::new();
        search.filters.brands = vec!["Aster".to_owned(), "Borea".to_owned()];

        assert_eq!(search.search(&catalog(), "").total, 3);

        search.filters.brands = vec!["Borea".to_owned()];
        assert_eq!(search.search(&catalog(), "").total, 1);
    }

    #[test]
    fn variant_dimensions_filter_by_color_and_size() {
        let mut search = ProductSearch::new();
        search.filters.colors = vec!["Blue".to_owned()];

        let page = search.search(&catalog(), "");
        assert_eq!(page.total, 1);
        assert_eq!(page.products[0].id, 1);

        search.filters.colors.clear();
        search.filters.sizes = vec!["40".to_owned()];
        let page = search.search(&catalog(), "");
        assert_eq!(page.total, 1);
        assert_eq!(page.products[0].id, 2);
    }

    #[test]
    fn text_query_spans_name_brand_and_tags() {
        let search = ProductSearch::new();

        assert_eq!(search.search(&catalog(), "sneaker").total, 1);
        assert_eq!(search.search(&catalog(), "aster").total, 2);
        assert_eq!(search.search(&catalog(), "running").total, 1);
        assert_eq!(search.search(&catalog(), "nothing-matches").total, 0);
    }

    #[test]
    fn reset_restores_defaults() {
        let mut search = ProductSearch::new();
        search.filters.page = 4;
        search.filters.on_sale = true;

        search.reset();
        assert_eq!(search.filters, SearchFilters::default());
    }

    #[test]
    fn filter_options_collects_distinct_values() {
        let options = ProductSearch::filter_options(&catalog());

        assert_eq!(options.brands, vec!["Aster", "Borea"]);
        assert_eq!(options.categories, vec!["all", "shoes", "bags"]);
        assert_eq!(options.colors, vec!["Blue", "Red"]);
        assert_eq!(options.sizes, vec!["42", "40"]);
        assert_eq!(
            options.price_range,
            PriceRange {
                min: 80_000,
                max: 150_000
            }
        );
    }

    #[test]
    fn filter_options_rounds_price_bounds_to_thousands() {
        let products = vec![product(1, "A", 1_499), product(2, "B", 2_001)];
        let options = ProductSearch::filter_options(&products);
        assert_eq!(
            options.price_range,
            PriceRange {
                min: 1_000,
                max: 3_000
            }
        );
    }
}
