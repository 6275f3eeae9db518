//! The individual steps of building a list: each one is a prompt plus a
//! parser around a model call, or a plain transformation.

mod extract;
mod group;
mod unify;

pub use extract::{extract_ingredients, ingredients_schema};
pub use group::group_by_ingredient_name;
pub use unify::{apply_name_mappings, name_mappings_schema, unify_ingredient_names};
