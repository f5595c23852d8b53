mod json;

pub use json::{extract_json, parse_completion};
