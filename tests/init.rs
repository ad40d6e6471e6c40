use assert_cmd::Command;
use predicates::prelude::predicate;
use pretty_assertions::assert_eq;

mod common;

#[test]
fn init_creates_the_repository_layout() -> Result<(), Box<dyn std::error::Error>> {
    let dir = assert_fs::TempDir::new()?;
    let mut sut = Command::cargo_bin("gitgo")?;

    sut.current_dir(dir.path()).arg("init");

    sut.assert()
        .success()
        .stdout(predicate::str::contains(
            "Initialized empty gitgo repository in",
        ));

    let gitgo = dir.path().join(".gitgo");
    assert!(gitgo.is_dir());
    assert!(gitgo.join("objects").is_dir());
    assert!(gitgo.join("refs").join("heads").is_dir());
    assert!(gitgo.join("index").is_file());

    let head = std::fs::read_to_string(gitgo.join("HEAD"))?;
    assert_eq!(head, "ref: refs/heads/main\n");

    // main exists but is empty until the first commit
    let main = std::fs::read_to_string(gitgo.join("refs").join("heads").join("main"))?;
    assert_eq!(main, "");

    Ok(())
}

#[test]
fn init_with_a_path_argument_creates_the_target() -> Result<(), Box<dyn std::error::Error>> {
    let dir = assert_fs::TempDir::new()?;
    let mut sut = Command::cargo_bin("gitgo")?;

    sut.current_dir(dir.path()).arg("init").arg("nested/project");

    sut.assert().success();
    assert!(dir.path().join("nested/project/.gitgo").is_dir());

    Ok(())
}

#[test]
fn init_twice_fails() -> Result<(), Box<dyn std::error::Error>> {
    let dir = assert_fs::TempDir::new()?;

    common::command::run_gitgo_command(dir.path(), &["init"])
        .assert()
        .success();

    common::command::run_gitgo_command(dir.path(), &["init"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("already exists"));

    Ok(())
}
