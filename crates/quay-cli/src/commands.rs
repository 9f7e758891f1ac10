use std::io::{Read, Write};
use std::path::Path;

use anyhow::{bail, Context};
use colored::Colorize;
use quay_repo::Repository;
use quay_session::{ObjectId, ObjectSession, ReaderSession, SessionOptions, WriterSession};
use walkdir::WalkDir;

use crate::cli::*;

pub fn run_command(cli: Cli) -> anyhow::Result<()> {
    let repo = cli.repo.as_path();
    let branch = cli.branch.as_str();
    match cli.command {
        Command::Init => cmd_init(repo),
        Command::Put(args) => cmd_put(repo, branch, args),
        Command::Import(args) => cmd_import(repo, branch, args),
        Command::Rm(args) => cmd_rm(repo, branch, args),
        Command::Cat(args) => cmd_cat(repo, branch, args),
        Command::Ls(args) => cmd_ls(repo, branch, args),
        Command::Diff(args) => cmd_diff(repo, branch, args),
        Command::Log(args) => cmd_log(repo, branch, args),
        Command::Head => cmd_head(repo, branch),
    }
}

fn open_writer(repo: &Path, branch: &str) -> anyhow::Result<WriterSession> {
    SessionOptions::new()
        .location(repo)
        .branch(branch)
        .open_writer()
        .with_context(|| format!("opening {} for writing", branch))
}

fn open_reader(repo: &Path, branch: &str, at: Option<&str>) -> anyhow::Result<ReaderSession> {
    let mut options = SessionOptions::new().location(repo).branch(branch);
    if let Some(at) = at {
        let commit: ObjectId = at.parse().with_context(|| format!("invalid commit id {at:?}"))?;
        options = options.at_commit(commit);
    }
    Ok(options.open_reader()?)
}

/// Commit and flush, then report the outcome.
fn finish(mut writer: WriterSession, message: Option<&str>) -> anyhow::Result<()> {
    if writer.commit_and_flush(message)? {
        println!(
            "{} {} on {}",
            "✓".green().bold(),
            writer.current_commit_id().short_hex().yellow(),
            writer.branch().green()
        );
    } else {
        println!("Nothing changed.");
    }
    Ok(())
}

fn cmd_init(repo: &Path) -> anyhow::Result<()> {
    let repository = Repository::init(repo)?;
    println!(
        "{} Initialized quay repository in {}",
        "✓".green().bold(),
        repo.display().to_string().bold()
    );
    println!("  Branch: {}", repository.config().core.default_branch.yellow());
    Ok(())
}

fn cmd_put(repo: &Path, branch: &str, args: PutArgs) -> anyhow::Result<()> {
    let data = match &args.file {
        Some(file) => std::fs::read(file).with_context(|| format!("reading {}", file.display()))?,
        None => {
            let mut buf = Vec::new();
            std::io::stdin().read_to_end(&mut buf)?;
            buf
        }
    };

    let mut writer = open_writer(repo, branch)?;
    if !writer.write_checked(&args.path, &data)? {
        println!("{} unchanged", args.path.dimmed());
    }
    finish(writer, args.message.as_deref())
}

fn cmd_import(repo: &Path, branch: &str, args: ImportArgs) -> anyhow::Result<()> {
    let mut writer = open_writer(repo, branch)?;
    let mut count = 0usize;
    for entry in WalkDir::new(&args.dir).sort_by_file_name() {
        let entry = entry?;
        if !entry.file_type().is_file() {
            continue;
        }
        let relative = entry.path().strip_prefix(&args.dir)?;
        let mut path = relative
            .components()
            .map(|c| c.as_os_str().to_string_lossy())
            .collect::<Vec<_>>()
            .join("/");
        if let Some(prefix) = &args.prefix {
            path = format!("{}/{path}", prefix.trim_end_matches('/'));
        }
        let data = std::fs::read(entry.path())
            .with_context(|| format!("reading {}", entry.path().display()))?;
        writer.write_unchecked(&path, &data)?;
        count += 1;
    }
    println!("Staged {} files from {}", count.to_string().bold(), args.dir.display());
    finish(writer, args.message.as_deref())
}

fn cmd_rm(repo: &Path, branch: &str, args: RmArgs) -> anyhow::Result<()> {
    let mut writer = open_writer(repo, branch)?;
    for path in &args.paths {
        if writer.remove_file(path)? {
            println!("  {} {}", "removed:".red(), path);
        } else {
            println!("  {} {}", "not found:".dimmed(), path);
        }
    }
    finish(writer, args.message.as_deref())
}

fn cmd_cat(repo: &Path, branch: &str, args: CatArgs) -> anyhow::Result<()> {
    let reader = open_reader(repo, branch, args.at.as_deref())?;
    let Some(data) = reader.read_file(&args.path)? else {
        bail!("{}: no such file", args.path);
    };
    let mut stdout = std::io::stdout().lock();
    stdout.write_all(&data)?;
    stdout.flush()?;
    Ok(())
}

fn cmd_ls(repo: &Path, branch: &str, args: LsArgs) -> anyhow::Result<()> {
    let reader = open_reader(repo, branch, args.at.as_deref())?;
    reader.recursive_read(&args.root, |path, data| {
        println!("{:>10}  {}", data.len(), path);
    })?;
    Ok(())
}

fn cmd_diff(repo: &Path, branch: &str, args: DiffArgs) -> anyhow::Result<()> {
    let reader = open_reader(repo, branch, args.at.as_deref())?;
    let old: ObjectId = args
        .old
        .parse()
        .with_context(|| format!("invalid commit id {:?}", args.old))?;
    reader.diff_since(
        &old,
        |path, data| println!("{} {} ({} bytes)", "changed:".green(), path, data.len()),
        |path| println!("{} {}", "deleted:".red(), path),
    )?;
    Ok(())
}

fn cmd_log(repo: &Path, branch: &str, args: LogArgs) -> anyhow::Result<()> {
    let reader = open_reader(repo, branch, None)?;
    for entry in reader.history(args.limit)? {
        if args.oneline {
            println!("{} {}", entry.id.short_hex().yellow(), first_line(&entry.message));
            continue;
        }
        println!("{} {}", "commit".yellow(), entry.id.to_hex().yellow());
        println!("Author: {}", entry.author);
        println!("Date:   {}", format_timestamp(entry.timestamp_ms));
        println!("\n    {}\n", entry.message);
    }
    Ok(())
}

fn cmd_head(repo: &Path, branch: &str) -> anyhow::Result<()> {
    let reader = open_reader(repo, branch, None)?;
    println!("{}", reader.current_commit_id());
    Ok(())
}

fn first_line(message: &str) -> &str {
    message.lines().next().unwrap_or("")
}

fn format_timestamp(ms: u64) -> String {
    chrono::DateTime::from_timestamp_millis(ms as i64)
        .map(|t| t.with_timezone(&chrono::Local).format("%Y-%m-%d %H:%M:%S").to_string())
        .unwrap_or_else(|| ms.to_string())
}
