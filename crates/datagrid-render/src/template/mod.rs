//! Template engines for container composition.

mod engine;

pub use engine::{register_filters, MiniJinjaEngine, TemplateEngine};
