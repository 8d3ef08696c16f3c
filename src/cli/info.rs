use std::collections::BTreeMap;

use afp::structs::field::{Document, TypeId};
use afp::structs::record::Record;
use anyhow::Result;
use indicatif::MultiProgress;

use super::command::{Cli, InputArgs};
use super::progress::decode_document;
use super::reader_for;
use crate::input::{input_name, read_document_bytes};

pub fn cmd_info(args: &InputArgs, cli: &Cli, multi: Option<&MultiProgress>) -> Result<()> {
    log::info!("Analyzing AFP document: {}", input_name(&args.input));

    let data = read_document_bytes(&args.input)?;
    let document = decode_document(&reader_for(cli), &data, multi, "Analyzing fields...")?;

    let summary = Summary::from_document(&document);
    display_histogram(&summary);
    display_totals(&summary, data.len());

    Ok(())
}

#[derive(Debug, Default)]
struct TypeStats {
    name: &'static str,
    count: usize,
    triplets: usize,
    elements: usize,
}

#[derive(Debug, Default)]
struct Summary {
    by_type: BTreeMap<TypeId, TypeStats>,
    fields: usize,
    unknown: usize,
    max_depth: usize,
}

impl Summary {
    fn from_document(document: &Document) -> Self {
        let mut summary = Summary::default();
        let mut depth = 0usize;

        for field in &document.fields {
            let record = &field.record;
            let stats = summary.by_type.entry(field.type_id()).or_default();

            stats.name = record.name();
            stats.count += 1;
            stats.triplets += record.triplets().len();
            stats.elements += record.element_count();

            match record {
                Record::Begin(_) => {
                    depth += 1;
                    summary.max_depth = summary.max_depth.max(depth);
                }
                Record::End(_) => depth = depth.saturating_sub(1),
                Record::Unknown { .. } => summary.unknown += 1,
                _ => {}
            }

            summary.fields += 1;
        }

        if depth != 0 {
            log::warn!("{depth} Begin fields are never closed by an End");
        }

        summary
    }
}

fn display_histogram(summary: &Summary) {
    println!();
    println!("AFP Document Information");
    println!("========================");
    println!();
    println!("  {:<8}  {:<32}  {:>6}  {:>8}  {:>8}", "Id", "Name", "Count", "Triplets", "Elements");

    for (type_id, stats) in &summary.by_type {
        println!(
            "  {:<8}  {:<32}  {:>6}  {:>8}  {:>8}",
            type_id.to_string(),
            stats.name,
            stats.count,
            stats.triplets,
            stats.elements
        );
    }

    println!();
}

fn display_totals(summary: &Summary, total_bytes: usize) {
    println!("Analysis Summary");
    println!("  Structured fields         {}", summary.fields);
    println!("  Distinct types            {}", summary.by_type.len());
    println!("  Unknown fields            {}", summary.unknown);
    println!("  Maximum nesting           {}", summary.max_depth);

    let size_kb = total_bytes as f64 / 1_000.0;
    println!("  Size                      {size_kb:.2} kB ({total_bytes} bytes)");
    println!();
}
