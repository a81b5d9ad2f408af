//! Print the OpenAPI document as JSON, or write it to a file.

use std::io::{self, Write};
use std::path::{Path, PathBuf};

use cap_std::{ambient_authority, fs::Dir};
use clap::Parser;
use questline::doc::ApiDoc;
use utoipa::OpenApi;

/// `openapi-dump` command arguments.
#[derive(Debug, Clone, Parser)]
#[command(
    name = "openapi-dump",
    about = "Emit the edge function OpenAPI document",
    version
)]
struct CliArgs {
    /// Write the document here instead of standard output.
    #[arg(long = "output", short = 'o', value_name = "path")]
    output: Option<PathBuf>,
}

fn main() -> io::Result<()> {
    let args = CliArgs::try_parse().map_err(io::Error::other)?;
    let json = ApiDoc::openapi()
        .to_pretty_json()
        .map_err(io::Error::other)?;
    args.output.map_or_else(
        || writeln!(io::stdout().lock(), "{json}"),
        |path| write_document(&path, &json),
    )
}

fn write_document(path: &Path, json: &str) -> io::Result<()> {
    let file_name = path
        .file_name()
        .ok_or_else(|| io::Error::other(format!("{} names no file", path.display())))?;
    let parent = path
        .parent()
        .filter(|parent| !parent.as_os_str().is_empty())
        .unwrap_or_else(|| Path::new("."));
    let dir = Dir::open_ambient_dir(parent, ambient_authority())?;
    dir.write(file_name, format!("{json}\n"))
}
