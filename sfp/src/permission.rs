/// Check whether `owner` may access `path`.
///
/// `path` must begin with either `/A{owner}` or the shared prefix `/A0`,
/// and the byte right after the matched prefix must be end-of-string or
/// `/` — this is what stops `/A5` from matching `/A50`. Mirrors
/// `panda_kernel::vfs::with_resolved_path`'s longest-prefix-with-boundary
/// check, specialized to two fixed candidate prefixes instead of a mount
/// table.
pub fn is_allowed(owner: u32, path: &str) -> bool {
    let owner_prefix = format!("/A{owner}");
    has_prefix_boundary(path, &owner_prefix) || has_prefix_boundary(path, "/A0")
}

fn has_prefix_boundary(path: &str, prefix: &str) -> bool {
    path.len() >= prefix.len()
        && &path.as_bytes()[..prefix.len()] == prefix.as_bytes()
        && (path.len() == prefix.len() || path.as_bytes()[prefix.len()] == b'/')
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn owner_may_access_their_own_root_and_subpaths() {
        assert!(is_allowed(5, "/A5"));
        assert!(is_allowed(5, "/A5/x"));
    }

    #[test]
    fn prefix_matching_does_not_leak_to_longer_siblings() {
        assert!(!is_allowed(5, "/A50"));
        assert!(!is_allowed(5, "/A50/x"));
    }

    #[test]
    fn shared_prefix_is_accessible_to_everyone() {
        assert!(is_allowed(5, "/A0/x"));
        assert!(is_allowed(1, "/A0"));
        assert!(!is_allowed(5, "/A00"));
    }

    #[test]
    fn owner_cannot_access_another_owners_path() {
        assert!(!is_allowed(2, "/A1/f"));
    }
}
