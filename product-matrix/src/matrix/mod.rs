//! The matrix product pipeline.
//!
//! ```text
//! dispatch ─► search (grouped search + coarse vendor filter)
//!          ─► assemble (per subscription list: copy, tag, vendor filter, re-qualify, override)
//!          ─► enrich (bulk catalog item / slug detail, paced batches)
//! ```
//!
//! Stages run strictly in sequence. Within the assemble stage, vendor-SKU
//! override lookups fan out concurrently, bounded by the configured
//! `fan_out_limit`; completion order among them is unspecified but the
//! collected results keep input order.

mod assembler;
mod dispatch;
mod enrich;
mod filter;
mod overrides;
mod search;


pub use assembler::{assemble, assemble_list};
pub use dispatch::{PipelineOutcome, dispatch};
pub use enrich::{collect_detail_keys, enrich};
pub use filter::filter_variants;
pub use overrides::select_override;
pub use search::{coarse_filter, search_matrix_items};

use crate::request::ChannelSettings;

/// The matrix-qualification rule.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct MatrixPolicy {
    /// When set, a single surviving variant makes an item simple, not matrix.
    pub single_variant_is_simple: bool,
}

impl MatrixPolicy {
    /// Whether an item with `variant_count` surviving variants is a matrix item.
    ///
    /// # Examples
    ///
    /// ```
    /// use product_matrix::matrix::MatrixPolicy;
    ///
    /// let policy = MatrixPolicy { single_variant_is_simple: true };
    /// assert!(!policy.qualifies(1));
    /// assert!(policy.qualifies(2));
    /// ```
    #[must_use]
    pub const fn qualifies(self, variant_count: usize) -> bool {
        if self.single_variant_is_simple { variant_count > 1 } else { variant_count >= 1 }
    }
}

impl From<&ChannelSettings> for MatrixPolicy {
    fn from(settings: &ChannelSettings) -> Self {
        Self { single_variant_is_simple: settings.single_variant_is_simple }
    }
}
