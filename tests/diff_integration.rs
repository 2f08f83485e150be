//! Integration tests for diff services over repository revisions.

mod common;

use common::{engine, run_git, TestRepo};

use gitweave::core::context::RequestContext;
use gitweave::core::errors::ErrorKind;
use gitweave::diff::DiffCutParams;
use gitweave::engine::{DiffCutRequest, DiffRange};

const NUMBERS: &str = "1\n2\n3\n4\n5\n6\n7\n8\n9\n10\n";

/// `main` holds numbers.txt; `feature` rewrites line 5 and adds new.txt.
fn with_feature() -> TestRepo {
    let repo = TestRepo::new();
    repo.commit_file("numbers.txt", NUMBERS, "Add numbers");
    repo.checkout_new("feature");
    repo.commit_file(
        "numbers.txt",
        &NUMBERS.replace("\n5\n", "\nfive\n"),
        "Spell out five",
    );
    repo.commit_file("new.txt", "a\nb\nc\n", "Add new file");
    repo
}

fn cut_request(repo: &TestRepo, path: &str, params: DiffCutParams) -> DiffCutRequest {
    DiffCutRequest {
        repo: repo.origin(),
        source: "main".into(),
        target: "feature".into(),
        path: path.into(),
        params,
    }
}

fn single_line(line: usize, context: usize) -> DiffCutParams {
    DiffCutParams {
        line_start: line,
        line_end: line,
        before_lines: context,
        after_lines: context,
        ..DiffCutParams::default()
    }
}

// =============================================================================
// Hunk Headers
// =============================================================================

#[test]
fn hunk_headers_per_changed_file() {
    let repo = with_feature();
    let files = engine()
        .get_diff_hunk_headers(
            &RequestContext::background(),
            &DiffRange {
                repo: repo.origin(),
                source: "main".into(),
                target: "feature".into(),
            },
        )
        .unwrap();

    assert_eq!(files.len(), 2);
    assert_eq!(files[0].file_header.new_file_name, "new.txt");
    assert_eq!(files[0].hunk_headers[0].to_string(), "@@ -0,0 +1,3 @@");
    assert_eq!(files[1].file_header.new_file_name, "numbers.txt");
    assert_eq!(files[1].hunk_headers.len(), 1);
    assert_eq!(files[1].hunk_headers[0].old_line, 5);
    assert_eq!(files[1].hunk_headers[0].new_line, 5);
}

#[test]
fn hunk_headers_for_unknown_revision() {
    let repo = TestRepo::new();
    let err = engine()
        .get_diff_hunk_headers(
            &RequestContext::background(),
            &DiffRange {
                repo: repo.origin(),
                source: "main".into(),
                target: "nowhere".into(),
            },
        )
        .unwrap_err();
    assert_eq!(err.kind(), ErrorKind::NotFound);
}

// =============================================================================
// Diff Cut
// =============================================================================

#[test]
fn cut_modified_line_with_context() {
    let repo = with_feature();
    let out = engine()
        .diff_cut(
            &RequestContext::background(),
            &cut_request(&repo, "numbers.txt", single_line(5, 1)),
        )
        .unwrap();

    assert_eq!(out.header.to_string(), "@@ -5 +5 @@");
    assert_eq!(out.lines, vec![" 4", "-5", "+five", " 6"]);
    assert_eq!(out.lines_header.old_line, 4);
    assert_eq!(out.lines_header.old_span, 3);
    assert_eq!(out.merge_base_sha, repo.rev("main"));
    assert_eq!(out.old_blob_sha, Some(repo.rev("main:numbers.txt")));
    assert_eq!(out.new_blob_sha, Some(repo.rev("feature:numbers.txt")));
}

#[test]
fn cut_added_file() {
    let repo = with_feature();
    let out = engine()
        .diff_cut(
            &RequestContext::background(),
            &cut_request(&repo, "new.txt", single_line(2, 0)),
        )
        .unwrap();

    assert_eq!(out.lines, vec!["+b"]);
    assert_eq!(out.header.new_line, 2);
    assert_eq!(out.old_blob_sha, None);
    assert!(out.new_blob_sha.is_some());
}

#[test]
fn cut_ignores_changes_only_on_source() {
    let repo = with_feature();
    repo.checkout("main");
    repo.commit_file("numbers.txt", &NUMBERS.replace("\n9\n", "\nnine\n"), "Edit nine");

    let out = engine()
        .diff_cut(
            &RequestContext::background(),
            &cut_request(&repo, "numbers.txt", single_line(9, 0)),
        )
        .unwrap();
    assert_eq!(out.lines, vec![" 9"]);
}

#[test]
fn cut_unchanged_file_is_not_found() {
    let repo = with_feature();
    let err = engine()
        .diff_cut(
            &RequestContext::background(),
            &cut_request(&repo, "README.md", single_line(1, 0)),
        )
        .unwrap_err();
    assert_eq!(err.kind(), ErrorKind::NotFound);
}

#[test]
fn cut_same_revisions_is_invalid() {
    let repo = with_feature();
    let mut request = cut_request(&repo, "numbers.txt", single_line(5, 0));
    request.target = "main".into();

    let err = engine()
        .diff_cut(&RequestContext::background(), &request)
        .unwrap_err();
    assert_eq!(err.kind(), ErrorKind::InvalidArgument);
}

#[test]
fn cut_unrelated_histories() {
    let repo = with_feature();
    run_git(&repo.work(), &["checkout", "--quiet", "--orphan", "island"]);
    repo.commit_file("numbers.txt", "1\n", "Unrelated root");

    let mut request = cut_request(&repo, "numbers.txt", single_line(1, 0));
    request.target = "island".into();
    let err = engine()
        .diff_cut(&RequestContext::background(), &request)
        .unwrap_err();
    assert_eq!(err.kind(), ErrorKind::PreconditionFailed);
}
