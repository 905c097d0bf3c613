#![allow(clippy::unwrap_used, missing_docs)]

use fscache::path::{normalize, split};

#[test]
fn collapses_repeated_separators_and_dot_segments() {
    assert_eq!(normalize("repo//sub/./a.txt").unwrap(), "repo/sub/a.txt");
    assert_eq!(normalize("./repo/a.txt").unwrap(), "repo/a.txt");
}

#[test]
fn strips_trailing_separator() {
    assert_eq!(normalize("repo/sub/").unwrap(), "repo/sub");
    assert_eq!(normalize("/repo/").unwrap(), "/repo");
}

#[test]
fn resolves_dot_dot_against_prefix() {
    assert_eq!(normalize("repo/sub/../a.txt").unwrap(), "repo/a.txt");
    assert_eq!(normalize("a/b/../../c").unwrap(), "c");
    assert_eq!(normalize("a/..").unwrap(), "");
}

#[test]
fn climbing_above_the_root_is_invalid() {
    assert!(normalize("..").is_none());
    assert!(normalize("../x").is_none());
    assert!(normalize("a/../..").is_none());
    assert!(normalize("/..").is_none());
}

#[test]
fn root_and_current_dir_forms() {
    assert_eq!(normalize("/").unwrap(), "/");
    assert_eq!(normalize("").unwrap(), "");
    assert_eq!(normalize(".").unwrap(), "");
}

#[test]
fn split_parent_and_leaf() {
    assert_eq!(split("repo/a.txt"), ("repo", "a.txt"));
    assert_eq!(split("repo/sub/a.txt"), ("repo/sub", "a.txt"));
    assert_eq!(split("/a"), ("/", "a"));
    assert_eq!(split("a"), ("", "a"));
    assert_eq!(split("/"), ("/", ""));
    assert_eq!(split(""), ("", ""));
}
