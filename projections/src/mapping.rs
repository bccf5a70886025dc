//! Default index naming and article mapping.
//!
//! Articles live in the dedicated index of the screening they belong to, so
//! deleting a screening's index removes its articles with it. The owning
//! screening is read from a configurable article field (`screeningId` by
//! default).

use listing_sync_core::decode::{require_str, Article};
use listing_sync_core::error::DecodeError;
use listing_sync_core::handler::{ArticleIndexMapper, ScreeningIndexNamer};
use listing_sync_core::store::{index_name_violation, IndexDocument};

/// Default prefix for dedicated screening indices.
pub const DEFAULT_SCREENING_INDEX_PREFIX: &str = "screening-";

/// Default article field naming the owning screening.
pub const DEFAULT_ARTICLE_SCREENING_FIELD: &str = "screeningId";

/// Names dedicated indices `{prefix}{screening_id}`, lowercased.
///
/// Search engines reject index names with uppercase characters. Ids that are
/// empty, start with `_`, `-` or `+`, or contain characters forbidden in index
/// names are rejected, so a name never addresses more than one index.
///
/// # Example
///
/// ```
/// use listing_sync_core::handler::ScreeningIndexNamer;
/// use listing_sync_projections::mapping::PrefixedIndexNamer;
///
/// let namer = PrefixedIndexNamer::new("screening-");
/// assert_eq!(namer.dedicated_index_name("AbC").unwrap(), "screening-abc");
/// assert!(namer.dedicated_index_name("*").is_err());
/// ```
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PrefixedIndexNamer {
    prefix: String,
}

impl PrefixedIndexNamer {
    /// Create a namer with the given prefix.
    pub fn new(prefix: impl Into<String>) -> Self {
        Self {
            prefix: prefix.into(),
        }
    }
}

impl Default for PrefixedIndexNamer {
    fn default() -> Self {
        Self::new(DEFAULT_SCREENING_INDEX_PREFIX)
    }
}

impl ScreeningIndexNamer for PrefixedIndexNamer {
    fn dedicated_index_name(&self, screening_id: &str) -> Result<String, DecodeError> {
        if let Some(reason) = index_name_violation(screening_id) {
            return Err(DecodeError::InvalidIndexId {
                id: screening_id.to_string(),
                reason,
            });
        }
        Ok(format!("{}{screening_id}", self.prefix).to_lowercase())
    }
}

/// Routes each article to its owning screening's dedicated index.
#[derive(Debug, Clone)]
pub struct ScreeningArticleMapper<N> {
    namer: N,
    screening_field: String,
}

impl<N: ScreeningIndexNamer> ScreeningArticleMapper<N> {
    /// Create a mapper reading the owner from [`DEFAULT_ARTICLE_SCREENING_FIELD`].
    pub fn new(namer: N) -> Self {
        Self::with_screening_field(namer, DEFAULT_ARTICLE_SCREENING_FIELD)
    }

    /// Create a mapper reading the owner from a custom field.
    pub fn with_screening_field(namer: N, screening_field: impl Into<String>) -> Self {
        Self {
            namer,
            screening_field: screening_field.into(),
        }
    }
}

impl<N: ScreeningIndexNamer> ArticleIndexMapper for ScreeningArticleMapper<N> {
    fn map_article(&self, article: Article) -> Result<IndexDocument, DecodeError> {
        let screening_id = require_str(&article.fields, &self.screening_field)?;
        let index_name = self.namer.dedicated_index_name(screening_id)?;
        Ok(IndexDocument::new(index_name, article.id, article.fields))
    }
}
