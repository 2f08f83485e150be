//! Integration tests for reference listings and repository hashes.

mod common;

use common::{engine, git_stdout, run_git, TestRepo};

use gitweave::core::context::RequestContext;
use gitweave::core::errors::ErrorKind;
use gitweave::core::types::ObjectType;
use gitweave::engine::{HashRepositoryParams, ListRefsParams};
use gitweave::hash::{serialize_head, serialize_reference, AggregationType, HashType, Hasher};
use gitweave::refs::{SortField, SortOrder};

/// An origin with branches `b01`..`b10` next to `main`.
fn with_branches() -> TestRepo {
    let repo = TestRepo::new();
    for i in 1..=10 {
        run_git(&repo.origin(), &["branch", &format!("b{i:02}"), "main"]);
    }
    repo
}

fn tag(repo: &TestRepo, name: &str, annotated: bool) {
    let mut args = vec![
        "-c",
        "user.name=Test User",
        "-c",
        "user.email=test@example.com",
        "tag",
    ];
    if annotated {
        args.extend(["-m", "release"]);
    }
    args.extend([name, "main"]);
    run_git(&repo.origin(), &args);
}

fn list_params(repo: &TestRepo) -> ListRefsParams {
    ListRefsParams {
        repo: repo.origin(),
        ..ListRefsParams::default()
    }
}

fn names(listing: &gitweave::engine::RefListing) -> Vec<&str> {
    listing.references.iter().map(|r| r.name.as_str()).collect()
}

// =============================================================================
// Branch Listings
// =============================================================================

#[test]
fn lists_all_branches_by_name() {
    let repo = with_branches();
    let listing = engine()
        .list_branches(&RequestContext::background(), &list_params(&repo))
        .unwrap();

    assert_eq!(listing.references.len(), 11);
    assert_eq!(listing.references[0].name, "b01");
    assert_eq!(listing.references[10].name, "main");
    assert_eq!(listing.references[0].sha, repo.rev("main"));
}

#[test]
fn second_page_of_three() {
    let repo = with_branches();
    let params = ListRefsParams {
        page: 2,
        page_size: 3,
        ..list_params(&repo)
    };

    let listing = engine()
        .list_branches(&RequestContext::background(), &params)
        .unwrap();

    assert_eq!(names(&listing), vec!["b04", "b05", "b06"]);
    assert_eq!(listing.scanned, 6);
}

#[test]
fn page_past_the_end_is_empty() {
    let repo = with_branches();
    let params = ListRefsParams {
        page: 5,
        page_size: 3,
        ..list_params(&repo)
    };

    let listing = engine()
        .list_branches(&RequestContext::background(), &params)
        .unwrap();
    assert!(listing.references.is_empty());
}

#[test]
fn descending_order() {
    let repo = with_branches();
    let params = ListRefsParams {
        page: 1,
        page_size: 2,
        order: SortOrder::Desc,
        ..list_params(&repo)
    };

    let listing = engine()
        .list_branches(&RequestContext::background(), &params)
        .unwrap();
    assert_eq!(names(&listing), vec!["main", "b10"]);
}

#[test]
fn query_filters_by_substring_and_anchor() {
    let repo = with_branches();
    let ctx = RequestContext::background();

    let contains = engine()
        .list_branches(
            &ctx,
            &ListRefsParams {
                query: "0".into(),
                ..list_params(&repo)
            },
        )
        .unwrap();
    assert_eq!(contains.references.len(), 10);

    let exact = engine()
        .list_branches(
            &ctx,
            &ListRefsParams {
                query: "^b07$".into(),
                ..list_params(&repo)
            },
        )
        .unwrap();
    assert_eq!(names(&exact), vec!["b07"]);
}

#[test]
fn nested_branch_names_match_as_folders() {
    let repo = TestRepo::new();
    run_git(&repo.origin(), &["branch", "feature/login", "main"]);
    run_git(&repo.origin(), &["branch", "feature/logout", "main"]);
    run_git(&repo.origin(), &["branch", "bugfix", "main"]);

    let listing = engine()
        .list_branches(
            &RequestContext::background(),
            &ListRefsParams {
                query: "^feature".into(),
                ..list_params(&repo)
            },
        )
        .unwrap();
    assert_eq!(names(&listing), vec!["feature/login", "feature/logout"]);
}

#[test]
fn overflowing_page_is_invalid() {
    let repo = with_branches();
    let err = engine()
        .list_branches(
            &RequestContext::background(),
            &ListRefsParams {
                page: usize::MAX,
                page_size: usize::MAX,
                ..list_params(&repo)
            },
        )
        .unwrap_err();
    assert_eq!(err.kind(), ErrorKind::InvalidArgument);
}

// =============================================================================
// Tag Listings
// =============================================================================

#[test]
fn lists_tags_with_object_types() {
    let repo = TestRepo::new();
    tag(&repo, "v1", false);
    tag(&repo, "v2", true);

    let listing = engine()
        .list_tags(&RequestContext::background(), &list_params(&repo))
        .unwrap();

    assert_eq!(names(&listing), vec!["v1", "v2"]);
    assert_eq!(listing.references[0].object_type, Some(ObjectType::Commit));
    assert_eq!(listing.references[1].object_type, Some(ObjectType::Tag));
}

#[test]
fn filters_tags_by_object_type_with_pages() {
    let repo = TestRepo::new();
    for name in ["a1", "a2", "a3"] {
        tag(&repo, name, true);
    }
    for name in ["l1", "l2"] {
        tag(&repo, name, false);
    }

    let listing = engine()
        .list_tags(
            &RequestContext::background(),
            &ListRefsParams {
                page: 2,
                page_size: 2,
                object_type: Some(ObjectType::Tag),
                ..list_params(&repo)
            },
        )
        .unwrap();
    assert_eq!(names(&listing), vec!["a3"]);
}

/// Annotated tag on `main` with a fixed creation date.
fn dated_tag(repo: &TestRepo, name: &str, date: &str) {
    let output = std::process::Command::new("git")
        .args(["tag", "-m", name, name, "main"])
        .env("GIT_COMMITTER_NAME", "Test User")
        .env("GIT_COMMITTER_EMAIL", "test@example.com")
        .env("GIT_COMMITTER_DATE", date)
        .current_dir(repo.origin())
        .output()
        .expect("git tag failed");
    assert!(output.status.success());
}

#[test]
fn tags_sorted_by_date() {
    let repo = TestRepo::new();
    dated_tag(&repo, "middle", "2022-06-01T00:00:00Z");
    dated_tag(&repo, "newest", "2024-06-01T00:00:00Z");
    dated_tag(&repo, "oldest", "2020-06-01T00:00:00Z");
    let ctx = RequestContext::background();

    let newest_first = engine()
        .list_tags(
            &ctx,
            &ListRefsParams {
                sort: SortField::CreatorDate,
                ..list_params(&repo)
            },
        )
        .unwrap();
    assert_eq!(names(&newest_first), vec!["newest", "middle", "oldest"]);

    let oldest_first = engine()
        .list_tags(
            &ctx,
            &ListRefsParams {
                sort: SortField::CreatorDate,
                order: SortOrder::Asc,
                ..list_params(&repo)
            },
        )
        .unwrap();
    assert_eq!(names(&oldest_first), vec!["oldest", "middle", "newest"]);
}

// =============================================================================
// Repository Hash
// =============================================================================

/// Hash computed from plain git output.
fn expected_hash(repo: &TestRepo, hash_type: HashType) -> String {
    let refs = git_stdout(
        &repo.origin(),
        &["for-each-ref", "--format=%(refname) %(objectname)"],
    );
    let head = std::iter::once(Ok::<_, String>(serialize_head("main")));
    let elements = refs.lines().map(|line| {
        let (name, sha) = line.split_once(' ').unwrap();
        Ok(serialize_reference(name, sha))
    });
    let digest = Hasher::new(hash_type, AggregationType::Xor)
        .hash(head.chain(elements))
        .unwrap();
    hex::encode(digest)
}

fn hash_params(repo: &TestRepo) -> HashRepositoryParams {
    HashRepositoryParams {
        repo: repo.origin(),
        hash_type: None,
        aggregation: None,
    }
}

#[test]
fn hash_matches_reference_list() {
    let repo = with_branches();
    tag(&repo, "v1", true);

    let hash = engine()
        .hash_repository(&RequestContext::background(), &hash_params(&repo))
        .unwrap();

    assert_eq!(hash.hash_type, HashType::Sha256);
    assert_eq!(hash.hash, expected_hash(&repo, HashType::Sha256));
}

#[test]
fn hash_changes_with_references() {
    let repo = TestRepo::new();
    let ctx = RequestContext::background();
    let before = engine().hash_repository(&ctx, &hash_params(&repo)).unwrap();
    let again = engine().hash_repository(&ctx, &hash_params(&repo)).unwrap();
    assert_eq!(before, again);

    run_git(&repo.origin(), &["branch", "extra", "main"]);
    let after = engine().hash_repository(&ctx, &hash_params(&repo)).unwrap();
    assert_ne!(before.hash, after.hash);

    run_git(&repo.origin(), &["branch", "-D", "extra"]);
    let restored = engine().hash_repository(&ctx, &hash_params(&repo)).unwrap();
    assert_eq!(before.hash, restored.hash);
}

#[test]
fn sha512_hash() {
    let repo = TestRepo::new();
    let hash = engine()
        .hash_repository(
            &RequestContext::background(),
            &HashRepositoryParams {
                hash_type: Some(HashType::Sha512),
                ..hash_params(&repo)
            },
        )
        .unwrap();

    assert_eq!(hash.hash.len(), 128);
    assert_eq!(hash.hash, expected_hash(&repo, HashType::Sha512));
}
