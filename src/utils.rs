/// Truncate a SHA to its first 8 characters for display
pub fn short_sha(sha: &str) -> &str {
    match sha.char_indices().nth(8) {
        Some((end, _)) => &sha[..end],
        None => sha,
    }
}
