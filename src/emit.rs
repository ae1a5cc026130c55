//! Render computed service schemas into textual wire-schema documents.
//!
//! Output is deterministic: the same design always renders byte-for-byte
//! identical documents. One `.proto` file is produced per service, under
//! `gen/grpc/<service>/<service>.proto`.

use crate::design::Design;
use crate::registry::{GenError, MessageSchema, ServiceSchema, ServicesData};
use heck::ToSnakeCase;
use std::path::{Path, PathBuf};

/// A generated document and the path it belongs at (relative to the
/// generation root).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OutputFile {
    pub path: PathBuf,
    pub content: String,
}

/// Render one service's schema: the service block with one rpc declaration
/// per endpoint in declared order, then one message block per derived
/// message in extraction order.
pub fn render(schema: &ServiceSchema) -> String {
    let mut lines: Vec<String> = Vec::new();
    push_comment(&mut lines, "", schema.description.as_deref());
    lines.push(format!("service {} {{", schema.name));
    for ep in &schema.endpoints {
        push_comment(&mut lines, "\t", ep.description.as_deref());
        lines.push(format!(
            "\trpc {} ({}) returns ({}) {{}}",
            ep.name, ep.request_message, ep.response_message
        ));
    }
    lines.push("}".to_string());
    for msg in &schema.messages {
        lines.push(String::new());
        render_message(msg, 0, &mut lines);
    }
    lines.join("\n") + "\n"
}

fn render_message(msg: &MessageSchema, depth: usize, lines: &mut Vec<String>) {
    let pad = "\t".repeat(depth);
    push_comment(lines, &pad, msg.description.as_deref());
    lines.push(format!("{}message {} {{", pad, msg.name));
    for nested in &msg.nested {
        render_message(nested, depth + 1, lines);
    }
    for field in &msg.fields {
        lines.push(format!(
            "{}\t{} {} = {};",
            pad, field.type_name, field.name, field.tag
        ));
    }
    lines.push(format!("{}}}", pad));
}

fn push_comment(lines: &mut Vec<String>, pad: &str, text: Option<&str>) {
    if let Some(text) = text {
        for line in text.lines() {
            lines.push(format!("{}// {}", pad, line));
        }
    }
}

/// Generated-code header prepended to every document.
pub fn header(title: &str) -> String {
    format!("// Code generated by wireschema, DO NOT EDIT.\n//\n// {}\n\n", title)
}

/// One output file per service in the design, in declared service order.
/// Services absent from the design contribute nothing; a wire fault on any
/// endpoint halts the run.
pub fn proto_files(
    design: &mut Design,
    registry: &mut ServicesData,
) -> Result<Vec<OutputFile>, GenError> {
    let names: Vec<String> = design.services.iter().map(|s| s.name.clone()).collect();
    let mut out = Vec::with_capacity(names.len());
    for name in names {
        let Some(schema) = registry.get(design, &name)? else {
            continue;
        };
        let snake = name.to_snake_case();
        let path = PathBuf::from("gen")
            .join("grpc")
            .join(&snake)
            .join(format!("{}.proto", snake));
        let title = format!("{} protocol buffer definition", name);
        let content = format!("{}{}", header(&title), render(schema));
        out.push(OutputFile { path, content });
    }
    Ok(out)
}

/// Write generated files under `root`, creating parent directories.
pub fn write_files(files: &[OutputFile], root: &Path) -> std::io::Result<()> {
    for file in files {
        let path = root.join(&file.path);
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        std::fs::write(&path, &file.content)?;
    }
    Ok(())
}
