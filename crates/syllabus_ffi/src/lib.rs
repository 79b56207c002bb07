//! Flutter-facing bindings for the syllabus editor core.

pub mod api;
