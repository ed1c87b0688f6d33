//! Render functions compiled from `templates/` at build time.

include!(concat!(env!("OUT_DIR"), "/templates.rs"));
