use std::time::Duration;

use anyhow::Context;
use colored::Colorize;

use metahub_broadcast::{HttpTransport, PeerTransport};
use metahub_server::{MetahubNode, NodeConfig};
use metahub_store::{FileResourceStore, ResourceStore};
use metahub_types::{next_version, BroadcastEvent, PeerNode};

use crate::cli::*;

pub fn run_command(cli: Cli) -> anyhow::Result<()> {
    match cli.command {
        Command::Serve(args) => cmd_serve(args),
        Command::Ls(args) => cmd_ls(args),
        Command::Cat(args) => cmd_cat(args),
        Command::Put(args) => cmd_put(args),
        Command::Rm(args) => cmd_rm(args),
        Command::Announce(args) => cmd_announce(args),
    }
}

fn runtime() -> anyhow::Result<tokio::runtime::Runtime> {
    tokio::runtime::Runtime::new().context("failed to start tokio runtime")
}

fn cmd_serve(args: ServeArgs) -> anyhow::Result<()> {
    let config = match &args.config {
        Some(path) => NodeConfig::load(path)?,
        None => NodeConfig::default(),
    };
    println!(
        "metahub node on {} (root: {}, peers: {})",
        config.bind_addr.to_string().bold(),
        config.metadata_root.display(),
        config.peers.len()
    );
    runtime()?.block_on(async move {
        let node = MetahubNode::open(config)?;
        node.serve().await
    })?;
    Ok(())
}

fn cmd_ls(args: LsArgs) -> anyhow::Result<()> {
    let store = FileResourceStore::open(&args.root)?;
    if args.recursive {
        for path in store.list_recursive(&args.path)? {
            println!("{path}");
        }
        return Ok(());
    }
    let Some(children) = store.list(&args.path)? else {
        anyhow::bail!("{} is not a folder", args.path);
    };
    for child in children {
        if store.exists(&child)? {
            println!("{child}");
        } else {
            println!("{}/", child.blue().bold());
        }
    }
    Ok(())
}

fn cmd_cat(args: ResourceArgs) -> anyhow::Result<()> {
    let store = FileResourceStore::open(&args.root)?;
    let resource = store
        .get(&args.path)?
        .with_context(|| format!("no resource at {}", args.path))?;
    eprintln!("{} {}", "version".dimmed(), resource.version);
    println!("{}", String::from_utf8_lossy(&resource.content));
    Ok(())
}

fn cmd_put(args: PutArgs) -> anyhow::Result<()> {
    let store = FileResourceStore::open(&args.root)?;
    let content = std::fs::read(&args.file)
        .with_context(|| format!("failed to read {}", args.file.display()))?;
    let old = store.get_version(&args.path)?;
    let version = store.check_and_put(&args.path, &content, old, next_version(old))?;
    println!(
        "{} {} ({} bytes, version {})",
        "✓".green().bold(),
        store.readable_path(&args.path),
        content.len(),
        version.to_string().yellow()
    );
    Ok(())
}

fn cmd_rm(args: ResourceArgs) -> anyhow::Result<()> {
    let store = FileResourceStore::open(&args.root)?;
    if !store.exists(&args.path)? {
        println!("{} not found, nothing removed", args.path);
        return Ok(());
    }
    store.delete(&args.path)?;
    println!("{} Removed {}", "✓".green().bold(), args.path);
    Ok(())
}

fn cmd_announce(args: AnnounceArgs) -> anyhow::Result<()> {
    let peer = PeerNode::parse(&args.peer)?;
    let event = BroadcastEvent::decode(&args.entity_type, &args.entity_name, &args.event)?;
    let transport = HttpTransport::new(Duration::from_millis(args.timeout_ms))?;
    runtime()?.block_on(transport.deliver(&peer, &event))?;
    println!("{} Announced {} to {}", "✓".green().bold(), event.to_string().yellow(), peer);
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::path::PathBuf;

    fn put_args(root: &std::path::Path, path: &str, file: PathBuf) -> PutArgs {
        PutArgs {
            root: root.to_path_buf(),
            path: path.into(),
            file,
        }
    }

    #[test]
    fn put_then_rm() {
        let dir = tempfile::tempdir().unwrap();
        let source = dir.path().join("input.json");
        std::fs::write(&source, b"{\"name\":\"p\"}").unwrap();
        let root = dir.path().join("meta");
        std::fs::create_dir(&root).unwrap();

        cmd_put(put_args(&root, "/project/p.json", source.clone())).unwrap();
        cmd_put(put_args(&root, "/project/p.json", source)).unwrap();
        let store = FileResourceStore::open(&root).unwrap();
        assert!(store.exists("/project/p.json").unwrap());

        cmd_rm(ResourceArgs {
            root: root.clone(),
            path: "/project/p.json".into(),
        })
        .unwrap();
        assert!(!store.exists("/project/p.json").unwrap());
    }

    #[test]
    fn cat_missing_resource_fails() {
        let dir = tempfile::tempdir().unwrap();
        let err = cmd_cat(ResourceArgs {
            root: dir.path().to_path_buf(),
            path: "/cube/nope.json".into(),
        });
        assert!(err.is_err());
    }

    #[test]
    fn announce_rejects_bad_tokens() {
        let args = AnnounceArgs {
            peer: "127.0.0.1:9".into(),
            entity_type: "widget".into(),
            entity_name: "x".into(),
            event: "UPDATE".into(),
            timeout_ms: 100,
        };
        assert!(cmd_announce(args).is_err());
    }
}
