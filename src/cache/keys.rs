//! Cache key policy.
//!
//! Keys are coarse: one constant key for all categories, one key per product
//! or per product's variations, and one key per distinct product list
//! parameter set. Callers pass list parameters in a fixed order, so the same
//! logical query always renders the same key.

use std::fmt;

use url::form_urlencoded;

/// The upstream resource family a store caches.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ResourceFamily {
    Products,
    Categories,
    Variations,
}

impl ResourceFamily {
    pub fn as_str(&self) -> &'static str {
        match self {
            ResourceFamily::Products => "products",
            ResourceFamily::Categories => "categories",
            ResourceFamily::Variations => "variations",
        }
    }
}

impl fmt::Display for ResourceFamily {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct CacheKey(String);

impl CacheKey {
    pub fn all_categories() -> Self {
        Self("categories:all".to_string())
    }

    pub fn product(id: u64) -> Self {
        Self(format!("product:{id}"))
    }

    pub fn variations(product_id: u64) -> Self {
        Self(format!("variations:{product_id}"))
    }

    /// Key for a product listing. Parameters are form-encoded in the order
    /// given, so a value containing `&` or `=` cannot impersonate another
    /// parameter.
    pub fn product_list<'a, I>(params: I) -> Self
    where
        I: IntoIterator<Item = (&'a str, &'a str)>,
    {
        let query = form_urlencoded::Serializer::new(String::new())
            .extend_pairs(params)
            .finish();
        if query.is_empty() {
            Self("products:list".to_string())
        } else {
            Self(format!("products:list?{query}"))
        }
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for CacheKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}
