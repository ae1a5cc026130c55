//! Generate wire-schema documents from a service design document.
//!
//! Usage:
//!   gen_proto [OPTIONS] design.json
//!
//! Options:
//!   --out=DIR    Root directory for generated files (default: current dir)
//!   --stdout     Print generated documents instead of writing files
//!
//! The design document is the serde form of [`wireschema::Design`], as
//! produced by a design front end. One `.proto` file is generated per
//! service, under `gen/grpc/<service>/<service>.proto`. Exits non-zero on a
//! wire fault (unsupported field type, duplicate tag), printing the
//! offending service/endpoint/field.

use anyhow::Context;
use std::path::PathBuf;
use wireschema::{proto_files, write_files, Design, ServicesData};

fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .with_writer(std::io::stderr)
        .init();

    let mut args: Vec<String> = std::env::args().skip(1).collect();
    let to_stdout = if let Some(pos) = args.iter().position(|a| a == "--stdout") {
        args.remove(pos);
        true
    } else {
        false
    };
    let out_dir: PathBuf = args
        .iter()
        .position(|a| a.starts_with("--out="))
        .map(|pos| {
            let arg = args.remove(pos);
            PathBuf::from(arg.trim_start_matches("--out="))
        })
        .unwrap_or_else(|| PathBuf::from("."));

    let Some(design_path) = args.first().map(PathBuf::from) else {
        eprintln!("usage: gen_proto [--out=DIR] [--stdout] design.json");
        std::process::exit(2);
    };

    let src = std::fs::read_to_string(&design_path)
        .with_context(|| format!("read design document {}", design_path.display()))?;
    let mut design: Design = serde_json::from_str(&src)
        .with_context(|| format!("parse design document {}", design_path.display()))?;

    let mut registry = ServicesData::new();
    let files = proto_files(&mut design, &mut registry)?;

    if to_stdout {
        for file in &files {
            println!("// {}", file.path.display());
            print!("{}", file.content);
        }
    } else {
        write_files(&files, &out_dir)
            .with_context(|| format!("write generated files under {}", out_dir.display()))?;
        for file in &files {
            eprintln!("wrote {}", out_dir.join(&file.path).display());
        }
    }
    eprintln!("gen_proto: {} service(s)", files.len());
    Ok(())
}
