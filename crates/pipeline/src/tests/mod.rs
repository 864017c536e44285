//! End-to-end tests over whole company records.

mod pipeline_properties;
