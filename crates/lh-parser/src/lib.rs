pub mod preprocess;
pub mod tag;

pub use preprocess::{preprocess, PreprocessedSource, TagIndex};
pub use tag::{
    exposed_variables, malformed_exposed_tags, parse_tag, serialized_variables, ReservedTag,
    EDITOR_ONLY,
};
