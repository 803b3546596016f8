use miette::{IntoDiagnostic, Result};
use propmangle_core::version::{version_string, SCHEMA_VERSION};
use propmangle_core::VERSION;
use serde::Serialize;

#[derive(Serialize)]
struct VersionJson {
    name: &'static str,
    version: &'static str,
    schema_version: u32,
}

pub fn run(json: bool) -> Result<()> {
    if json {
        let out = VersionJson {
            name: "propmangle",
            version: VERSION,
            schema_version: SCHEMA_VERSION,
        };
        println!("{}", serde_json::to_string(&out).into_diagnostic()?);
    } else {
        println!("{}", version_string());
    }
    Ok(())
}
