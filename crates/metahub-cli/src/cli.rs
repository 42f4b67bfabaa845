use std::path::PathBuf;

use clap::{Args, Parser, Subcommand};

#[derive(Parser)]
#[command(
    name = "metahub",
    about = "metahub -- shared metadata store with peer cache coherence",
    version
)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Command,

    #[arg(short, long, global = true)]
    pub verbose: bool,
}

#[derive(Subcommand)]
pub enum Command {
    /// Run a node: receiver endpoint, cache and broadcaster
    Serve(ServeArgs),
    /// List the children of a folder in a store
    Ls(LsArgs),
    /// Print a resource's content and version
    Cat(ResourceArgs),
    /// Write a file's content to a resource (compare-and-swap)
    Put(PutArgs),
    /// Delete a resource
    Rm(ResourceArgs),
    /// Send one change notification to a peer
    Announce(AnnounceArgs),
}

#[derive(Args)]
pub struct ServeArgs {
    /// Node configuration file (TOML). Defaults apply when omitted.
    #[arg(short, long)]
    pub config: Option<PathBuf>,
}

#[derive(Args)]
pub struct LsArgs {
    /// Store root directory
    pub root: PathBuf,
    #[arg(default_value = "/")]
    pub path: String,
    /// List every leaf resource below the folder
    #[arg(short, long)]
    pub recursive: bool,
}

#[derive(Args)]
pub struct ResourceArgs {
    pub root: PathBuf,
    pub path: String,
}

#[derive(Args)]
pub struct PutArgs {
    pub root: PathBuf,
    pub path: String,
    /// File whose content is written
    pub file: PathBuf,
}

#[derive(Args)]
pub struct AnnounceArgs {
    /// Peer base URL, e.g. http://10.0.0.2:7070
    #[arg(long)]
    pub peer: String,
    /// Entity type token: cube, cube_desc, project, table, data_model, all
    pub entity_type: String,
    pub entity_name: String,
    /// Event token: create, update, drop
    pub event: String,
    #[arg(long, default_value = "5000")]
    pub timeout_ms: u64,
}
