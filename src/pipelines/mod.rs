//! Render pipelines.

pub mod matcap;
