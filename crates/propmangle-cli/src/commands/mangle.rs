//! `propmangle mangle` command implementation.
//!
//! Every input shares one name cache and is processed in argument order, so
//! a name gets the same substitute in every file of the batch.

use miette::{IntoDiagnostic, Result};
use propmangle_core::{
    mangle_source, AlphabetKind, CacheSnapshot, Error, MangleConfig, MangleStats, NameCache,
};
use propmangle_parser::CodegenOptions;
use serde::Serialize;
use std::path::{Path, PathBuf};
use std::time::Instant;
use tracing::{debug, info};
use walkdir::WalkDir;

const EXTENSIONS: [&str; 3] = ["js", "cjs", "mjs"];

/// Mangle command action.
#[derive(Debug, Clone, Default)]
pub struct MangleAction {
    pub cwd: PathBuf,
    /// Files or directories to mangle.
    pub inputs: Vec<PathBuf>,
    /// Write outputs here instead of stdout.
    pub out_dir: Option<PathBuf>,
    /// Config file; `propmangle.json` in `cwd` is used when absent.
    pub config: Option<PathBuf>,
    pub reserved: Vec<String>,
    /// Replaces the configured global aliases when non-empty.
    pub global_aliases: Vec<String>,
    pub debug: bool,
    pub debug_suffix: Option<String>,
    pub prefix: Option<String>,
    pub alphabet: Option<AlphabetKind>,
    pub randomise_alphabet: bool,
    pub alphabet_seed: Option<u64>,
    /// Write the final name table here.
    pub name_map: Option<PathBuf>,
    /// Start from a previously written name table.
    pub load_name_map: Option<PathBuf>,
    pub minify: bool,
}

/// JSON output for the mangle command.
#[derive(Serialize)]
struct MangleResultJson {
    ok: bool,
    files: Vec<FileResultJson>,
    names: usize,
    seed: u64,
    #[serde(skip_serializing_if = "Option::is_none")]
    name_map: Option<String>,
    duration_ms: u64,
    #[serde(skip_serializing_if = "Option::is_none")]
    error: Option<MangleErrorJson>,
}

#[derive(Serialize)]
struct FileResultJson {
    input: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    output: Option<String>,
    renamed: usize,
    generated: usize,
    /// Mangled code, when no output directory was given.
    #[serde(skip_serializing_if = "Option::is_none")]
    code: Option<String>,
}

#[derive(Serialize)]
struct MangleErrorJson {
    code: &'static str,
    message: String,
}

/// One input file and the path it keeps under `--out-dir`.
#[derive(Debug)]
struct InputFile {
    path: PathBuf,
    relative: PathBuf,
}

struct FileReport {
    input: PathBuf,
    output: Option<PathBuf>,
    stats: MangleStats,
    code: String,
}

struct Report {
    files: Vec<FileReport>,
    names: usize,
    seed: u64,
    name_map: Option<PathBuf>,
}

/// Run the mangle command.
pub fn run(action: MangleAction, json: bool) -> Result<()> {
    let start = Instant::now();
    let result = execute(&action);
    let duration_ms = start.elapsed().as_millis() as u64;

    match result {
        Ok(report) => {
            if json {
                let out = MangleResultJson {
                    ok: true,
                    files: report
                        .files
                        .iter()
                        .map(|f| FileResultJson {
                            input: f.input.display().to_string(),
                            output: f.output.as_ref().map(|p| p.display().to_string()),
                            renamed: f.stats.renamed,
                            generated: f.stats.generated,
                            code: f.output.is_none().then(|| f.code.clone()),
                        })
                        .collect(),
                    names: report.names,
                    seed: report.seed,
                    name_map: report.name_map.as_ref().map(|p| p.display().to_string()),
                    duration_ms,
                    error: None,
                };
                println!("{}", serde_json::to_string(&out).into_diagnostic()?);
            } else {
                for file in &report.files {
                    match &file.output {
                        Some(output) => println!(
                            "  {} -> {} ({} renamed, {} new names)",
                            file.input.display(),
                            output.display(),
                            file.stats.renamed,
                            file.stats.generated
                        ),
                        None => print!("{}", file.code),
                    }
                }
            }
            Ok(())
        }
        Err(e) => {
            if json {
                let out = MangleResultJson {
                    ok: false,
                    files: Vec::new(),
                    names: 0,
                    seed: 0,
                    name_map: None,
                    duration_ms,
                    error: Some(MangleErrorJson {
                        code: error_code(&e),
                        message: e.to_string(),
                    }),
                };
                println!("{}", serde_json::to_string(&out).into_diagnostic()?);
                std::process::exit(1);
            }
            Err(e).into_diagnostic()
        }
    }
}

fn execute(action: &MangleAction) -> propmangle_core::Result<Report> {
    let config = resolve_config(action)?;
    let options = config.mangle_options();
    let cache_options = config.cache_options();

    let mut cache = match &action.load_name_map {
        Some(path) => {
            let snapshot = CacheSnapshot::load(&absolute(&action.cwd, path))?;
            NameCache::restore(cache_options, snapshot)?
        }
        None => NameCache::new(cache_options)?,
    };

    let codegen = CodegenOptions {
        minify: action.minify,
        ..Default::default()
    };
    let out_dir = action.out_dir.as_ref().map(|dir| absolute(&action.cwd, dir));

    let mut files = Vec::new();
    let mut total = MangleStats::default();
    for input in collect_inputs(&action.cwd, &action.inputs)? {
        let source = std::fs::read_to_string(&input.path)?;
        let output = mangle_source(&source, &mut cache, &options, codegen.clone())
            .map_err(|err| Error::parse(&input.path, &source, &err))?;

        let written = match &out_dir {
            Some(dir) => {
                let target = dir.join(&input.relative);
                if let Some(parent) = target.parent() {
                    std::fs::create_dir_all(parent)?;
                }
                std::fs::write(&target, &output.code)?;
                Some(target)
            }
            None => None,
        };
        info!(
            input = %input.path.display(),
            renamed = output.stats.renamed,
            generated = output.stats.generated,
            "mangled file"
        );
        total += output.stats;
        files.push(FileReport {
            input: input.path,
            output: written,
            stats: output.stats,
            code: output.code,
        });
    }

    let name_map = match &action.name_map {
        Some(path) => {
            let path = absolute(&action.cwd, path);
            cache.snapshot().save(&path)?;
            debug!(path = %path.display(), names = cache.len(), "wrote name map");
            Some(path)
        }
        None => None,
    };

    debug!(
        files = files.len(),
        renamed = total.renamed,
        generated = total.generated,
        seed = cache.seed(),
        "batch complete"
    );

    Ok(Report {
        files,
        names: cache.len(),
        seed: cache.seed(),
        name_map,
    })
}

/// Config file values, overridden by command-line flags.
fn resolve_config(action: &MangleAction) -> propmangle_core::Result<MangleConfig> {
    let mut config = match &action.config {
        Some(path) => MangleConfig::load(&absolute(&action.cwd, path))?,
        None => MangleConfig::discover(&action.cwd)?.unwrap_or_default(),
    };

    config.reserved_names.extend(action.reserved.iter().cloned());
    if !action.global_aliases.is_empty() {
        config.global_aliases = Some(action.global_aliases.clone());
    }
    if action.debug {
        config.debug = true;
    }
    if let Some(suffix) = &action.debug_suffix {
        config.debug_suffix.clone_from(suffix);
    }
    if let Some(prefix) = &action.prefix {
        config.identifier_prefix.clone_from(prefix);
    }
    if let Some(alphabet) = action.alphabet {
        config.alphabet = alphabet;
    }
    if action.randomise_alphabet {
        config.randomise_alphabet = true;
    }
    if action.alphabet_seed.is_some() {
        config.alphabet_seed = action.alphabet_seed;
    }
    Ok(config)
}

/// Expand inputs into files, in argument order. Directories are walked in
/// file-name order so the encounter order never depends on the file system.
fn collect_inputs(cwd: &Path, inputs: &[PathBuf]) -> propmangle_core::Result<Vec<InputFile>> {
    let mut files = Vec::new();
    for input in inputs {
        let path = absolute(cwd, input);
        if path.is_dir() {
            for entry in WalkDir::new(&path).sort_by_file_name() {
                let entry = entry.map_err(std::io::Error::from)?;
                if !entry.file_type().is_file() || !is_script(entry.path()) {
                    continue;
                }
                let relative = entry
                    .path()
                    .strip_prefix(&path)
                    .map_or_else(|_| entry.path().to_path_buf(), Path::to_path_buf);
                files.push(InputFile {
                    path: entry.path().to_path_buf(),
                    relative,
                });
            }
        } else if path.is_file() {
            let relative = path.file_name().map_or_else(|| path.clone(), PathBuf::from);
            files.push(InputFile { path, relative });
        } else {
            return Err(Error::other(format!("input not found: {}", path.display())));
        }
    }
    Ok(files)
}

fn is_script(path: &Path) -> bool {
    path.extension()
        .and_then(|ext| ext.to_str())
        .is_some_and(|ext| EXTENSIONS.contains(&ext))
}

fn absolute(cwd: &Path, path: &Path) -> PathBuf {
    if path.is_absolute() {
        path.to_path_buf()
    } else {
        cwd.join(path)
    }
}

fn error_code(error: &Error) -> &'static str {
    match error {
        Error::Io(_) => "IO_ERROR",
        Error::ConfigRead { .. } | Error::ConfigParse { .. } => "CONFIG_ERROR",
        Error::Parse { .. } => "PARSE_ERROR",
        Error::NameMapRead { .. } | Error::NameMapParse { .. } => "NAME_MAP_ERROR",
        Error::Alphabet(_) => "ALPHABET_ERROR",
        Error::Other(_) => "ERROR",
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_collect_inputs_sorted_and_filtered() {
        let dir = tempfile::tempdir().unwrap();
        let src = dir.path().join("src");
        std::fs::create_dir_all(src.join("nested")).unwrap();
        std::fs::write(src.join("b.js"), "").unwrap();
        std::fs::write(src.join("a.mjs"), "").unwrap();
        std::fs::write(src.join("notes.txt"), "").unwrap();
        std::fs::write(src.join("nested/c.cjs"), "").unwrap();

        let files = collect_inputs(dir.path(), &[PathBuf::from("src")]).unwrap();
        let relative: Vec<_> = files.iter().map(|f| f.relative.clone()).collect();
        assert_eq!(
            relative,
            vec![PathBuf::from("a.mjs"), PathBuf::from("b.js"), PathBuf::from("nested/c.cjs")]
        );
    }

    #[test]
    fn test_missing_input() {
        let dir = tempfile::tempdir().unwrap();
        let err = collect_inputs(dir.path(), &[PathBuf::from("nope.js")]).unwrap_err();
        assert_eq!(error_code(&err), "ERROR");
    }

    #[test]
    fn test_flags_override_config() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(
            dir.path().join("propmangle.json"),
            r#"{"reservedNames": ["a"], "identifierPrefix": "x", "debugSuffix": "s"}"#,
        )
        .unwrap();
        let action = MangleAction {
            cwd: dir.path().to_path_buf(),
            reserved: vec!["b".to_string()],
            prefix: Some("y".to_string()),
            debug: true,
            ..Default::default()
        };
        let config = resolve_config(&action).unwrap();
        assert_eq!(config.reserved_names, vec!["a".to_string(), "b".to_string()]);
        assert_eq!(config.identifier_prefix, "y");
        assert!(config.debug);
        assert_eq!(config.debug_suffix, "s");
    }
}
