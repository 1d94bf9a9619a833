//! The rewriting passes, in pipeline order

mod aggregate_support;
mod from_source_alias;
mod group_by_item_alias;
mod group_key_references;
mod order_by_sort_spec;
mod select_list_item_alias;
mod select_star;

pub use aggregate_support::AggregateSupport;
pub use from_source_alias::FromSourceAlias;
pub use group_by_item_alias::GroupByItemAlias;
pub use group_key_references::GroupKeyReferences;
pub use order_by_sort_spec::OrderBySortSpec;
pub use select_list_item_alias::SelectListItemAlias;
pub use select_star::SelectStar;
