/// Characters that are not legal in folder names on common filesystems.
const FORBIDDEN: [char; 9] = ['<', '>', ':', '"', '/', '\\', '|', '?', '*'];

/// Derive a filesystem-safe folder name from a user-supplied comic name.
///
/// Strips the forbidden characters, then collapses every whitespace run to a
/// single underscore and drops leading/trailing whitespace. The result can
/// be empty (e.g. a name made entirely of forbidden characters); callers
/// must treat an empty result as an invalid name.
pub fn sanitize_name(name: &str) -> String {
    let stripped: String = name.chars().filter(|c| !FORBIDDEN.contains(c)).collect();
    stripped.split_whitespace().collect::<Vec<_>>().join("_")
}
