use afp::process::read::Reader;
use afp::structs::field::StructuredField;
use afp::structs::record::Record;
use afp::utils::charset::Charset;
use anyhow::Result;
use indicatif::MultiProgress;
use serde::{Deserialize, Serialize};

use super::command::{Cli, InputArgs};
use super::reader_for;
use crate::input::{input_name, read_document_bytes};

#[derive(Debug, PartialEq, Deserialize, Serialize)]
pub struct DumpDocument {
    input: String,
    size: usize,
    fields: Vec<FieldSummary>,
}

#[derive(Debug, PartialEq, Deserialize, Serialize)]
#[serde(rename_all = "camelCase")]
struct FieldSummary {
    index: usize,
    offset: usize,
    id: String,
    name: String,
    length: usize,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    triplets: Vec<String>,
    #[serde(default, skip_serializing_if = "is_zero")]
    elements: usize,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    text: Option<String>,
}

fn is_zero(value: &usize) -> bool {
    *value == 0
}

impl FieldSummary {
    fn new(
        index: usize,
        offset: usize,
        length: usize,
        field: &StructuredField,
        charset: Charset,
    ) -> Self {
        let record = &field.record;

        Self {
            index,
            offset,
            id: field.type_id().to_string(),
            name: record.name().to_string(),
            length,
            triplets: record
                .triplets()
                .into_iter()
                .map(|triplet| format!("{:02X} {}", triplet.code(), triplet.name()))
                .collect(),
            elements: record.element_count(),
            text: match record {
                Record::PresentationText(ptx) => Some(ptx.text(charset)),
                _ => None,
            },
        }
    }
}

impl DumpDocument {
    pub fn from_bytes(name: String, data: &[u8], reader: &Reader) -> Result<Self> {
        let charset = reader.config().charset;
        let mut fields = reader.fields(data);
        let mut summaries = Vec::new();
        let mut offset = fields.offset();

        while let Some(field) = fields.next() {
            let field = field?;
            let end = fields.offset();

            let summary = FieldSummary::new(summaries.len(), offset, end - offset, &field, charset);
            summaries.push(summary);
            offset = end;
        }

        Ok(Self {
            input: name,
            size: data.len(),
            fields: summaries,
        })
    }

    pub fn serialize_yaml(&self) -> Result<String> {
        Ok(serde_yaml_ng::to_string(self)?)
    }
}

pub fn cmd_dump(args: &InputArgs, cli: &Cli, multi: Option<&MultiProgress>) -> Result<()> {
    let name = input_name(&args.input);
    log::info!("Dumping AFP document: {name}");

    let data = read_document_bytes(&args.input)?;
    let dump = DumpDocument::from_bytes(name, &data, &reader_for(cli))?;
    let yaml = dump.serialize_yaml()?;

    match multi {
        Some(multi) => multi.suspend(|| print!("{yaml}")),
        None => print!("{yaml}"),
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use afp::process::EXAMPLE_DATA;

    #[test]
    fn example_dump() -> Result<()> {
        let dump = DumpDocument::from_bytes("example".into(), EXAMPLE_DATA, &Reader::default())?;

        assert_eq!(dump.fields.len(), 18);
        assert_eq!(dump.fields.iter().map(|f| f.length).sum::<usize>(), EXAMPLE_DATA.len());

        let ptx = &dump.fields[8];
        assert_eq!(ptx.id, "D3EE9B");
        assert_eq!(ptx.text.as_deref(), Some("Hello"));
        assert_eq!(ptx.elements, 5);

        let bdt = &dump.fields[0];
        assert_eq!(
            bdt.triplets,
            ["21 Object Function Set Specification", "65 Comment"]
        );

        let yaml = dump.serialize_yaml()?;
        assert!(yaml.contains("name: Code Page Index"));

        let parsed: DumpDocument = serde_yaml_ng::from_str(&yaml)?;
        assert_eq!(parsed, dump);

        Ok(())
    }
}
