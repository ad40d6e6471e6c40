use crate::common::file::{FileSpec, write_file};
use assert_cmd::Command;
use assert_fs::TempDir;
use derive_new::new;
use rstest::fixture;
use std::path::Path;

#[fixture]
pub fn repository_dir() -> TempDir {
    TempDir::new().expect("Failed to create temp dir")
}

/// A repository with one commit over three files:
/// `1.txt`, `a/2.txt`, `a/b/3.txt`.
#[fixture]
pub fn init_repository_dir(repository_dir: TempDir) -> TempDir {
    run_gitgo_command(repository_dir.path(), &["init"])
        .assert()
        .success();

    write_file(FileSpec::new(
        repository_dir.path().join("1.txt"),
        "one".to_string(),
    ));
    write_file(FileSpec::new(
        repository_dir.path().join("a").join("2.txt"),
        "two".to_string(),
    ));
    write_file(FileSpec::new(
        repository_dir.path().join("a").join("b").join("3.txt"),
        "three".to_string(),
    ));

    run_gitgo_command(repository_dir.path(), &["add", "."])
        .assert()
        .success();

    gitgo_commit(repository_dir.path(), "Initial commit")
        .assert()
        .success();

    repository_dir
}

pub fn run_gitgo_command(dir: &Path, args: &[&str]) -> Command {
    let mut cmd = Command::cargo_bin("gitgo").expect("Failed to find gitgo binary");
    cmd.current_dir(dir);
    for arg in args {
        cmd.arg(arg);
    }
    cmd
}

#[derive(Debug, Clone, new)]
pub struct RandomAuthor {
    pub name: String,
    pub email: String,
}

pub fn generate_random_author() -> RandomAuthor {
    use fake::Fake;
    use fake::faker::internet::en::FreeEmail;
    use fake::faker::name::en::Name;

    let name = Name().fake::<String>().replace(" ", "_");
    let email = FreeEmail().fake::<String>();
    RandomAuthor::new(name, email)
}

pub fn gitgo_commit(dir: &Path, message: &str) -> Command {
    let author = generate_random_author();
    let mut cmd = run_gitgo_command(dir, &["commit", "-m", message]);
    cmd.envs(vec![
        ("GITGO_AUTHOR_NAME", &author.name),
        ("GITGO_AUTHOR_EMAIL", &author.email),
    ]);
    cmd
}
