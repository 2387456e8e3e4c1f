use std::fs;
use std::io::{stdout, Write};
use std::path::Path;

use anyhow::{anyhow, Context, Result};
use ccsds_mo::mo::{schema_info, Dispatcher};
use ccsds_mo::store::Stores;
use ccsds_mo::xml::{self, Element};
use serde_json::{json, Value};
use tracing::debug;

#[derive(Debug, Clone)]
pub enum Format {
    Json,
    Text,
}

impl clap::ValueEnum for Format {
    fn value_variants<'a>() -> &'a [Self] {
        &[Self::Json, Self::Text]
    }

    fn to_possible_value(&self) -> Option<clap::builder::PossibleValue> {
        match self {
            Self::Json => Some(clap::builder::PossibleValue::new("json")),
            Self::Text => Some(clap::builder::PossibleValue::new("text")),
        }
    }
}

fn seeded_dispatcher() -> Dispatcher {
    let stores = Stores::new();
    stores.parameters.seed_samples();
    Dispatcher::new(stores)
}

fn read(input: &Path) -> Result<String> {
    fs::read_to_string(input).with_context(|| format!("reading {input:?}"))
}

fn failed(err: &ccsds_mo::mo::Error) -> anyhow::Error {
    anyhow!("{} ({}): {err}", err.code(), err.status())
}

pub fn request(operation: &str, input: &Path) -> Result<()> {
    let body: Value = serde_json::from_str(&read(input)?)
        .with_context(|| format!("{input:?} is not JSON"))?;
    let dispatcher = seeded_dispatcher();
    let response = dispatcher
        .dispatch(operation, body)
        .map_err(|err| failed(&err))?;
    serde_json::to_writer_pretty(stdout(), &response)?;
    println!();
    Ok(())
}

pub fn xml(input: &Path) -> Result<()> {
    let dispatcher = seeded_dispatcher();
    let response = dispatcher
        .dispatch_xml(&read(input)?)
        .map_err(|err| failed(&err))?;
    debug!(history = ?dispatcher.history(1), "handled request");
    println!("{response}");
    Ok(())
}

pub fn validate(input: &Path, format: &Format) -> Result<()> {
    let text = read(input)?;
    let report = xml::validate(&text);
    let tree = Element::parse(&text).map(|root| root.to_tree()).ok();

    match format {
        Format::Json => {
            serde_json::to_writer_pretty(stdout(), &json!({"validation": report, "tree": tree}))?;
            println!();
        }
        Format::Text => {
            let mut out = stdout().lock();
            writeln!(out, "valid: {}", report.valid)?;
            writeln!(
                out,
                "operation: {}",
                report.operation.as_deref().unwrap_or("unknown")
            )?;
            for err in &report.errors {
                writeln!(out, "error: {err}")?;
            }
            for warning in &report.warnings {
                writeln!(out, "warning: {warning}")?;
            }
            if let Some(tree) = tree {
                serde_json::to_writer_pretty(&mut out, &tree)?;
                writeln!(out)?;
            }
        }
    }
    Ok(())
}

pub fn sample(name: Option<&str>) -> Result<()> {
    let Some(name) = name else {
        let info = schema_info();
        for doc in info.documents {
            println!("{} (version {})", doc.name, doc.version);
        }
        return Ok(());
    };
    let doc = xml::sample(name).ok_or_else(|| anyhow!("no sample document named {name}"))?;
    println!("{doc}");
    Ok(())
}
