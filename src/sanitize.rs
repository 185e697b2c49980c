//! Folder name sanitization for extracted titles.
//!
//! Titles come straight out of filenames, so they may contain characters that
//! at least one major filesystem refuses in a path component.
//!
//! # Examples
//!
//! ```
//! use episort::sanitize::sanitize_folder_name;
//!
//! assert_eq!(sanitize_folder_name("Weird:Title*Name"), "Weird_Title_Name");
//! assert_eq!(sanitize_folder_name("  Demo  "), "Demo");
//! ```

/// Characters rejected in folder names on Windows, which is the strictest target.
pub const INVALID_FOLDER_CHARS: [char; 9] = ['\\', '/', ':', '*', '?', '"', '<', '>', '|'];

/// Replaces every invalid folder character with `_` and trims surrounding whitespace.
pub fn sanitize_folder_name(title: &str) -> String {
    title
        .chars()
        .map(|c| {
            if INVALID_FOLDER_CHARS.contains(&c) {
                '_'
            } else {
                c
            }
        })
        .collect::<String>()
        .trim()
        .to_string()
}

/// Returns true if `name` can be joined onto a directory as a single new component.
///
/// Sanitized titles can still be empty or refer to the current/parent directory.
pub fn is_usable_folder_name(name: &str) -> bool {
    !name.is_empty() && name != "." && name != ".."
}
