//! Configurable limits for one interpreter run.
//!
//! The limits arrive from a JSON configuration file (loaded by the driver);
//! this crate only defines the schema and defaults so that the lexer and the
//! interpreter can share one struct. Unknown keys in the file are ignored and
//! missing keys take their defaults.

use serde::Deserialize;

fn default_max_func_depth() -> usize {
    200
}

fn default_max_rec_depth() -> usize {
    100
}

fn default_max_string_length() -> usize {
    10_000
}

fn default_max_identifier_length() -> usize {
    64
}

fn default_max_comment_length() -> usize {
    10_000
}

fn default_max_folder_depth() -> usize {
    16
}

/// Limits recognized by the pipeline.
///
/// # Examples
///
/// ```
/// use audc_util::Limits;
///
/// let limits = Limits::default();
/// assert_eq!(limits.max_func_depth, 200);
/// assert_eq!(limits.max_identifier_length, 64);
/// ```
#[derive(Clone, Debug, Deserialize, PartialEq, Eq)]
pub struct Limits {
    /// Max call-context stack depth.
    #[serde(rename = "MAX_FUNC_DEPTH", default = "default_max_func_depth")]
    pub max_func_depth: usize,

    /// Max consecutive same-function recursion depth.
    #[serde(rename = "MAX_REC_DEPTH", default = "default_max_rec_depth")]
    pub max_rec_depth: usize,

    /// Max source string literal length, in characters between the quotes.
    #[serde(rename = "MAX_STRING_LENGTH", default = "default_max_string_length")]
    pub max_string_length: usize,

    /// Max identifier length.
    #[serde(
        rename = "MAX_IDENTIFIER_LENGTH",
        default = "default_max_identifier_length"
    )]
    pub max_identifier_length: usize,

    /// Max block comment length, `/*` to `*/` inclusive.
    #[serde(rename = "MAX_COMMENT_LENGTH", default = "default_max_comment_length")]
    pub max_comment_length: usize,

    /// Max folder-tree materialization depth.
    #[serde(rename = "MAX_FOLDER_DEPTH", default = "default_max_folder_depth")]
    pub max_folder_depth: usize,
}

impl Default for Limits {
    fn default() -> Self {
        Self {
            max_func_depth: default_max_func_depth(),
            max_rec_depth: default_max_rec_depth(),
            max_string_length: default_max_string_length(),
            max_identifier_length: default_max_identifier_length(),
            max_comment_length: default_max_comment_length(),
            max_folder_depth: default_max_folder_depth(),
        }
    }
}
