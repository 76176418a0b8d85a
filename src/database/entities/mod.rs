pub mod categories;
pub mod category_values;
pub mod data_source_fields;
pub mod data_sources;
pub mod deployable_entities;
pub mod edge_labels;
pub mod edges;
pub mod entity_edge_selectors;
pub mod entity_edges;
pub mod project_edge_selectors;
pub mod project_edges;
pub mod projects;
pub mod topic_claims;
