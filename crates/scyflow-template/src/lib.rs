//! Template Engine (§4.E): parses workflow templates and instantiates them
//! as a project's block/edge graph, in topological order, atomically.

mod engine;
mod error;
mod graph;
mod repo;
mod schema;

pub use engine::TemplateEngine;
pub use error::TemplateError;
pub use graph::{layout, LayoutResult, Position};
pub use repo::{get_template, list_templates};
pub use schema::{DependsOn, PipelineHeader, TemplateBlock, TemplateDocument, TemplateInput, TemplateOutput};
