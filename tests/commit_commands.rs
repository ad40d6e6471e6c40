use assert_fs::TempDir;
use assert_fs::prelude::*;
use predicates::prelude::predicate;
use pretty_assertions::assert_eq;
use rstest::rstest;

mod common;

use common::command::{gitgo_commit, repository_dir, run_gitgo_command};
use common::{blob_oid, object_exists, read_branch, tree_oid};

/// init / add / commit / log over a single file.
#[rstest]
fn first_commit_records_the_expected_snapshot(
    repository_dir: TempDir,
) -> Result<(), Box<dyn std::error::Error>> {
    let dir = repository_dir;
    run_gitgo_command(dir.path(), &["init"]).assert().success();

    dir.child("a.txt").write_str("hello")?;
    run_gitgo_command(dir.path(), &["add", "a.txt"])
        .assert()
        .success();

    gitgo_commit(dir.path(), "first")
        .assert()
        .success()
        .stdout(predicate::str::is_match(
            r"^\[main \(root-commit\) [0-9a-f]{40}\] first\n$",
        )?);

    // the branch advanced to the new commit
    let commit_oid = read_branch(dir.path(), "main");
    assert_eq!(commit_oid.len(), 40);
    assert!(object_exists(dir.path(), &commit_oid));

    // the commit references the expected single-entry tree and has no
    // parent
    let expected_tree = tree_oid(&[("100644", "a.txt", &blob_oid("hello"))]);
    let output = run_gitgo_command(dir.path(), &["cat-file", "-p", &commit_oid])
        .assert()
        .success()
        .stdout(predicate::str::contains(format!("tree {expected_tree}")))
        .stdout(predicate::str::contains("parent").count(0))
        .get_output()
        .stdout
        .clone();
    assert!(String::from_utf8(output)?.ends_with("\n\nfirst"));

    // log shows exactly one entry with the message
    run_gitgo_command(dir.path(), &["log"])
        .assert()
        .success()
        .stdout(predicate::str::contains("commit ").count(1))
        .stdout(predicate::str::contains("    first"));

    Ok(())
}

/// Two-commit chain: the second commit's parent is the first, and its
/// tree carries both files in sorted order.
#[rstest]
fn second_commit_chains_onto_the_first(
    repository_dir: TempDir,
) -> Result<(), Box<dyn std::error::Error>> {
    let dir = repository_dir;
    run_gitgo_command(dir.path(), &["init"]).assert().success();

    dir.child("a.txt").write_str("hello")?;
    run_gitgo_command(dir.path(), &["add", "a.txt"])
        .assert()
        .success();
    gitgo_commit(dir.path(), "first").assert().success();
    let first_oid = read_branch(dir.path(), "main");

    dir.child("b.txt").write_str("world")?;
    run_gitgo_command(dir.path(), &["add", "b.txt"])
        .assert()
        .success();
    gitgo_commit(dir.path(), "second").assert().success();
    let second_oid = read_branch(dir.path(), "main");

    assert_ne!(first_oid, second_oid);

    // parent chain
    run_gitgo_command(dir.path(), &["cat-file", "-p", &second_oid])
        .assert()
        .success()
        .stdout(predicate::str::contains(format!("parent {first_oid}")));

    // the second root tree has both entries, name-ascending
    let expected_tree = tree_oid(&[
        ("100644", "a.txt", &blob_oid("hello")),
        ("100644", "b.txt", &blob_oid("world")),
    ]);
    run_gitgo_command(dir.path(), &["cat-file", "-p", &second_oid])
        .assert()
        .stdout(predicate::str::contains(format!("tree {expected_tree}")));

    // log walks the chain newest first
    run_gitgo_command(dir.path(), &["log"])
        .assert()
        .success()
        .stdout(predicate::str::contains("commit ").count(2))
        .stdout(predicate::str::is_match("(?s)second.*first")?);

    Ok(())
}

#[rstest]
fn commit_with_an_empty_index_fails(
    repository_dir: TempDir,
) -> Result<(), Box<dyn std::error::Error>> {
    let dir = repository_dir;
    run_gitgo_command(dir.path(), &["init"]).assert().success();

    gitgo_commit(dir.path(), "nothing staged")
        .assert()
        .failure()
        .stderr(predicate::str::contains("staging area is empty"));

    Ok(())
}

/// The index is cleared (and persisted) after a successful commit, so
/// an immediate second commit has nothing to record.
#[rstest]
fn commit_clears_the_index(
    repository_dir: TempDir,
) -> Result<(), Box<dyn std::error::Error>> {
    let dir = repository_dir;
    run_gitgo_command(dir.path(), &["init"]).assert().success();

    dir.child("a.txt").write_str("hello")?;
    run_gitgo_command(dir.path(), &["add", "a.txt"])
        .assert()
        .success();
    gitgo_commit(dir.path(), "first").assert().success();

    gitgo_commit(dir.path(), "again")
        .assert()
        .failure()
        .stderr(predicate::str::contains("staging area is empty"));

    Ok(())
}

#[rstest]
fn commit_on_a_detached_head_fails(
    repository_dir: TempDir,
) -> Result<(), Box<dyn std::error::Error>> {
    let dir = repository_dir;
    run_gitgo_command(dir.path(), &["init"]).assert().success();

    dir.child("a.txt").write_str("hello")?;
    run_gitgo_command(dir.path(), &["add", "a.txt"])
        .assert()
        .success();
    gitgo_commit(dir.path(), "first").assert().success();
    let commit_oid = read_branch(dir.path(), "main");

    run_gitgo_command(dir.path(), &["checkout", &commit_oid])
        .assert()
        .success();

    dir.child("b.txt").write_str("world")?;
    run_gitgo_command(dir.path(), &["add", "b.txt"])
        .assert()
        .success();

    gitgo_commit(dir.path(), "detached")
        .assert()
        .failure()
        .stderr(predicate::str::contains("HEAD is detached"));

    Ok(())
}

/// Removing a path from the index does not remove it from the next
/// snapshot: the builder seeds from the previous tree, so the path
/// reappears. This codifies the current staged-removal semantics and
/// must flip if that policy ever changes.
#[rstest]
fn removed_path_reappears_in_next_commit(
    repository_dir: TempDir,
) -> Result<(), Box<dyn std::error::Error>> {
    let dir = repository_dir;
    run_gitgo_command(dir.path(), &["init"]).assert().success();

    dir.child("a.txt").write_str("hello")?;
    dir.child("b.txt").write_str("world")?;
    run_gitgo_command(dir.path(), &["add", "a.txt", "b.txt"])
        .assert()
        .success();
    gitgo_commit(dir.path(), "both").assert().success();

    // restage both, then drop b.txt from the index again
    run_gitgo_command(dir.path(), &["add", "a.txt", "b.txt"])
        .assert()
        .success();
    run_gitgo_command(dir.path(), &["remove", "b.txt"])
        .assert()
        .success();
    gitgo_commit(dir.path(), "rm").assert().success();

    // the new root tree still contains b.txt, inherited from the
    // previous snapshot
    let head_oid = read_branch(dir.path(), "main");
    let commit_output = run_gitgo_command(dir.path(), &["cat-file", "-p", &head_oid])
        .assert()
        .success()
        .get_output()
        .stdout
        .clone();
    let commit_text = String::from_utf8(commit_output)?;
    let tree_oid = commit_text
        .lines()
        .next()
        .unwrap()
        .strip_prefix("tree ")
        .unwrap()
        .to_string();

    run_gitgo_command(dir.path(), &["cat-file", "-p", &tree_oid])
        .assert()
        .success()
        .stdout(predicate::str::contains("b.txt"));

    Ok(())
}

#[rstest]
fn nested_directories_produce_nested_trees(
    repository_dir: TempDir,
) -> Result<(), Box<dyn std::error::Error>> {
    let dir = repository_dir;
    run_gitgo_command(dir.path(), &["init"]).assert().success();

    dir.child("readme.md").write_str("docs")?;
    dir.child("src/lib.rs").write_str("lib")?;
    dir.child("src/deep/util.rs").write_str("util")?;
    run_gitgo_command(dir.path(), &["add", "."])
        .assert()
        .success();
    gitgo_commit(dir.path(), "nested").assert().success();

    let deep_tree = tree_oid(&[("100644", "util.rs", &blob_oid("util"))]);
    let src_tree = tree_oid(&[
        ("40000", "deep", &deep_tree),
        ("100644", "lib.rs", &blob_oid("lib")),
    ]);
    let root_tree = tree_oid(&[
        ("100644", "readme.md", &blob_oid("docs")),
        ("40000", "src", &src_tree),
    ]);

    let head_oid = read_branch(dir.path(), "main");
    run_gitgo_command(dir.path(), &["cat-file", "-p", &head_oid])
        .assert()
        .success()
        .stdout(predicate::str::contains(format!("tree {root_tree}")));

    Ok(())
}

#[rstest]
fn multi_line_messages_survive_verbatim(
    repository_dir: TempDir,
) -> Result<(), Box<dyn std::error::Error>> {
    let dir = repository_dir;
    run_gitgo_command(dir.path(), &["init"]).assert().success();

    dir.child("a.txt").write_str("hello")?;
    run_gitgo_command(dir.path(), &["add", "a.txt"])
        .assert()
        .success();
    gitgo_commit(dir.path(), "subject\n\nbody line one\nbody line two")
        .assert()
        .success()
        // the short form shown after committing is the first line only
        .stdout(predicate::str::contains("] subject"));

    run_gitgo_command(dir.path(), &["log"])
        .assert()
        .success()
        .stdout(predicate::str::contains("    subject"))
        .stdout(predicate::str::contains("    body line one"))
        .stdout(predicate::str::contains("    body line two"));

    Ok(())
}

#[rstest]
fn commit_author_comes_from_the_environment(
    repository_dir: TempDir,
) -> Result<(), Box<dyn std::error::Error>> {
    let dir = repository_dir;
    run_gitgo_command(dir.path(), &["init"]).assert().success();

    dir.child("a.txt").write_str("hello")?;
    run_gitgo_command(dir.path(), &["add", "a.txt"])
        .assert()
        .success();

    run_gitgo_command(dir.path(), &["commit", "-m", "authored"])
        .env("GITGO_AUTHOR_NAME", "Ada_Lovelace")
        .env("GITGO_AUTHOR_EMAIL", "ada@example.com")
        .assert()
        .success();

    run_gitgo_command(dir.path(), &["log"])
        .assert()
        .success()
        .stdout(predicate::str::contains(
            "Author: Ada_Lovelace <ada@example.com>",
        ));

    Ok(())
}
