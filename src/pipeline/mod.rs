// The composition layer: the Track aggregate and its file format.

mod persistence;
mod project;

pub use persistence::{export_json, import_json, load_track, save_track};
pub use project::Track;
