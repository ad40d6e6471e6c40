#![allow(dead_code)]

use crate::areas::repository::Repository;
use anyhow::Result;
use clap::{Parser, Subcommand};

mod areas;
mod artifacts;
mod commands;
mod errors;

#[derive(Parser)]
#[command(
    name = "gitgo",
    version = "0.1.0",
    about = "A minimal content-addressed version control system",
    long_about = "gitgo records immutable snapshots of a working tree in a local, \
    content-addressed object database and restores prior snapshots on demand. \
    It follows the conventions of the well-known VCS design without aiming for \
    wire compatibility.",
    help_template = r"
{name} {version} - {about}

USAGE:
    {usage}

OPTIONS:
    {all-args}
"
)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    #[command(
        name = "init",
        about = "Initialize a new repository",
        long_about = "Creates the .gitgo layout in the current directory or at the given path, \
        with an empty main branch and HEAD pointing at it."
    )]
    Init {
        #[arg(index = 1, help = "The path to the repository")]
        path: Option<String>,
    },
    #[command(name = "add", about = "Add files or directories to the index")]
    Add {
        #[arg(index = 1, required = true, help = "The files or directories to stage")]
        paths: Vec<String>,
    },
    #[command(
        name = "remove",
        about = "Remove files from the index",
        long_about = "Drops index entries for the given paths. Working files are left in place."
    )]
    Remove {
        #[arg(index = 1, required = true, help = "The staged paths to drop")]
        paths: Vec<String>,
    },
    #[command(name = "commit", about = "Record the staged snapshot on the current branch")]
    Commit {
        #[arg(short, long, help = "The commit message")]
        message: String,
    },
    #[command(
        name = "branch",
        about = "List, create, or delete branches",
        long_about = "Without flags, lists branches. With -c creates a branch at the current \
        commit; with -d deletes one (the current branch is protected)."
    )]
    Branch {
        #[arg(short = 'c', long = "create", value_name = "NAME", help = "Create a new branch")]
        create: Option<String>,
        #[arg(
            short = 'd',
            long = "delete",
            value_name = "NAME",
            conflicts_with = "create",
            help = "Delete a branch"
        )]
        delete: Option<String>,
    },
    #[command(
        name = "checkout",
        about = "Materialize a branch or commit into the working tree"
    )]
    Checkout {
        #[arg(index = 1, help = "A branch name or a full commit hash")]
        target: String,
    },
    #[command(name = "log", about = "Show the first-parent history from HEAD")]
    Log {
        #[arg(short = 'n', value_name = "N", help = "Limit the number of commits")]
        max_count: Option<usize>,
    },
    #[command(name = "cat-file", about = "Print the content of an object")]
    CatFile {
        #[arg(short = 'p', long, help = "The object SHA to print")]
        sha: String,
    },
    #[command(
        name = "hash-object",
        about = "Hash a file as a blob and optionally store it"
    )]
    HashObject {
        #[arg(short, long, required = false, help = "Write the blob to the object database")]
        write: bool,
        #[arg(index = 1)]
        file: String,
    },
}

fn main() {
    let cli = Cli::parse();

    if let Err(err) = run(cli) {
        // one diagnostic line, no stack traces
        eprintln!("error: {err:#}");
        std::process::exit(1);
    }
}

fn run(cli: Cli) -> Result<()> {
    let repository = match &cli.command {
        Commands::Init { path: Some(path) } => {
            Repository::new(path.into(), Box::new(std::io::stdout()))?
        }
        _ => Repository::new(std::env::current_dir()?, Box::new(std::io::stdout()))?,
    };

    match &cli.command {
        Commands::Init { .. } => repository.init(),
        Commands::Add { paths } => repository.add(paths),
        Commands::Remove { paths } => repository.remove(paths),
        Commands::Commit { message } => repository.commit(message),
        Commands::Branch { create, delete } => match (create, delete) {
            (Some(name), _) => repository.create_branch(name),
            (_, Some(name)) => repository.delete_branch(name),
            (None, None) => repository.list_branches(),
        },
        Commands::Checkout { target } => repository.checkout(target),
        Commands::Log { max_count } => repository.log(*max_count),
        Commands::CatFile { sha } => repository.cat_file(sha),
        Commands::HashObject { write, file } => repository.hash_object(file, *write),
    }
}
