use anyhow::Result;
use chrono::TimeZone;
use std::env;
use std::fs;
use std::process::Command;
use vergen_gitcl::{Emitter, GitclBuilder};

fn main() -> Result<()> {
    // Generate git information
    let gitcl = GitclBuilder::default()
        .describe(true, true, Some("[0-9]*"))
        .build()?;

    let gitcl_res = Emitter::default()
        .idempotent()
        .fail_on_error()
        .add_instructions(&gitcl)
        .and_then(|emitter| emitter.emit());

    if let Err(e) = gitcl_res {
        eprintln!("error occurred while generating instructions: {e:?}");
        Emitter::default().idempotent().fail_on_error().emit()?;
    }

    let now = match env::var("SOURCE_DATE_EPOCH") {
        Ok(val) => {
            let secs = val.parse::<i64>()?;
            chrono::Utc
                .timestamp_opt(secs, 0)
                .single()
                .ok_or_else(|| anyhow::anyhow!("SOURCE_DATE_EPOCH {secs} is out of range"))?
        }
        Err(_) => chrono::Utc::now(),
    };

    println!(
        "cargo:rustc-env=BUILD_TIMESTAMP={}",
        now.format("%Y-%m-%d %H:%M:%S UTC")
    );

    let afp_version = afp_version_from_metadata()
        .or_else(|_| afp_version_fallback())
        .unwrap_or_else(|_| "unknown".to_string());
    println!("cargo:rustc-env=AFP_VERSION={afp_version}");

    println!("cargo:rerun-if-changed=afp/Cargo.toml");

    Ok(())
}

/// Library version from cargo metadata, local or published.
fn afp_version_from_metadata() -> Result<String> {
    let output = Command::new("cargo")
        .args(["metadata", "--format-version", "1"])
        .output()?;

    if !output.status.success() {
        anyhow::bail!("cargo metadata failed");
    }

    let metadata: serde_json::Value = serde_json::from_slice(&output.stdout)?;

    let version = metadata["packages"]
        .as_array()
        .into_iter()
        .flatten()
        .find(|package| package["name"].as_str() == Some("afp"))
        .and_then(|package| package["version"].as_str());

    match version {
        Some(version) => Ok(version.to_string()),
        None => anyhow::bail!("afp package not found in metadata"),
    }
}

fn afp_version_fallback() -> Result<String> {
    let toml_content = fs::read_to_string("afp/Cargo.toml")?;

    for line in toml_content.lines() {
        let line = line.trim();
        if let Some(value) = line.strip_prefix("version") {
            if let Some(value) = value.trim().strip_prefix('=') {
                return Ok(value.trim().trim_matches('"').to_string());
            }
        }
    }

    anyhow::bail!("Could not find version in afp/Cargo.toml");
}
