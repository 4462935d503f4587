//! Query strings and form bodies.

use serde::Deserialize;
use validator::Validate;

use super::validation::{no_control_chars, valid_entry_name};

/// `GET /changeSort?col=`.
#[derive(Debug, Deserialize)]
pub struct SortQuery {
    /// Column name from the listing header (`name`, `filetype`, `data`, `size`).
    #[serde(default = "default_sort_column")]
    pub col: String,
}

fn default_sort_column() -> String {
    "name".to_string()
}

/// `GET /move?from_=&to_=`.
#[derive(Debug, Default, Deserialize)]
pub struct MoveQuery {
    /// Entry being moved. Folders end with `/`.
    #[serde(default)]
    pub from_: String,
    /// Destination folder, `/` for the home folder.
    #[serde(default)]
    pub to_: String,
}

/// `GET /rename/{path}?name=&obj=`.
#[derive(Debug, Default, Deserialize)]
pub struct RenameQuery {
    /// New name.
    #[serde(default)]
    pub name: String,
    /// `folder` or `file`.
    #[serde(default)]
    pub obj: String,
}

/// `POST /create/{path}`.
#[derive(Debug, Deserialize, Validate)]
pub struct CreateFolderForm {
    /// Name of the new folder.
    #[validate(
        length(max = 255, message = "Folder name is too long"),
        custom(function = "valid_entry_name")
    )]
    pub dir_name: String,
}

/// `POST /find/{path}`.
#[derive(Debug, Deserialize, Validate)]
pub struct FindForm {
    /// Text searched for in entry names.
    #[serde(default)]
    #[validate(
        length(max = 255, message = "Search text is too long"),
        custom(function = "no_control_chars")
    )]
    pub search_name: String,
}
