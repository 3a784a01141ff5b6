//! yamlet command-line tool for formatting, querying, verifying, and
//! transcoding YAML-subset manifests.
//!
//! Usage: yamlet [OPTIONS] <COMMAND>
//!
//! Commands:
//!   fmt      Decode and re-emit canonical subset text
//!   check    Strictly validate files
//!   get      Print the value at a property path
//!   package  Print the Carvel package reference
//!   verify   Check a property across every document that has it
//!   convert  Transcode to JSON, YAML, TOML, CBOR, or CBOR diagnostic notation
//!
//! Global options:
//!       --strict         Reject input outside the subset [env: YAMLET_STRICT]
//!       --indent <N>     Spaces per indentation level [env: YAMLET_INDENT]
//!   -v, --verbose...     More logging on stderr (RUST_LOG overrides)

use anyhow::{anyhow, Context, Result};
use clap::builder::FalseyValueParser;
use clap::{ArgAction, Args, Parser, Subcommand, ValueEnum};
use libyamlet::manifest::{check_property_with, decode_documents, find_package};
use libyamlet::path::{get_segments, parse_path};
use libyamlet::{
    coerce, encode_with_indent, scalar_to_plain_string, try_encode_with_indent, DecodeOptions,
    ManifestError, Mode, Value, DEFAULT_INDENT_UNIT,
};
use std::fs;
use std::io::{self, Read, Write};
use std::path::{Path, PathBuf};
use std::process::ExitCode;
use tracing::{debug, info};
use tracing_subscriber::EnvFilter;

mod transcode;

#[derive(Parser, Debug)]
#[command(name = "yamlet", version, about = "YAML-subset manifest tool")]
struct Cli {
    #[command(flatten)]
    global: GlobalArgs,

    #[command(subcommand)]
    command: Command,
}

#[derive(Args, Debug)]
struct GlobalArgs {
    /// Reject input outside the supported subset instead of skipping it
    #[arg(long, global = true, env = "YAMLET_STRICT", value_parser = FalseyValueParser::new())]
    strict: bool,

    /// Spaces per indentation level, for reading and writing
    #[arg(long, global = true, env = "YAMLET_INDENT", default_value_t = DEFAULT_INDENT_UNIT)]
    indent: usize,

    /// Increase log verbosity (-v info, -vv debug, -vvv trace)
    #[arg(short, long, global = true, action = ArgAction::Count)]
    verbose: u8,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Decode and re-emit canonical subset text
    Fmt {
        /// Input file, or `-` for stdin
        input: Option<PathBuf>,
        /// Write output to this file
        #[arg(short, long)]
        output: Option<PathBuf>,
        /// Rewrite the input file in place
        #[arg(short, long, conflicts_with = "output")]
        write: bool,
    },
    /// Strictly validate files, reporting the first error in each
    Check {
        #[arg(required = true)]
        inputs: Vec<PathBuf>,
    },
    /// Print the value at a property path from the first document that has it
    Get {
        /// Dotted path such as `spec.refName` or `spec.ports[0]`
        path: String,
        input: Option<PathBuf>,
    },
    /// Print the `refName/version` of the Carvel package document
    Package { input: Option<PathBuf> },
    /// Check that every document containing PATH has the expected value
    Verify {
        path: String,
        /// Expected value, typed the same way as a document scalar
        expected: String,
        #[arg(required = true)]
        inputs: Vec<PathBuf>,
        /// Accept values whose text contains EXPECTED
        #[arg(long)]
        contains: bool,
    },
    /// Transcode a document to another format
    Convert {
        input: Option<PathBuf>,
        #[arg(short, long, value_enum, default_value_t = InputFormat::Subset)]
        from: InputFormat,
        #[arg(short, long, value_enum)]
        to: OutputFormat,
        #[arg(short, long)]
        output: Option<PathBuf>,
    },
}

#[derive(ValueEnum, Clone, Copy, Debug, PartialEq, Eq)]
enum InputFormat {
    /// The YAML subset
    Subset,
    /// Full YAML (and JSON)
    Yaml,
}

#[derive(ValueEnum, Clone, Copy, Debug, PartialEq, Eq)]
enum OutputFormat {
    Subset,
    Json,
    Yaml,
    Toml,
    Cbor,
    /// CBOR diagnostic notation
    Diag,
}

/// Exit status for a property that is missing or differs.
const EXIT_MISMATCH: u8 = 2;

fn main() -> ExitCode {
    let cli = Cli::parse();
    init_tracing(cli.global.verbose);

    match run(cli) {
        Ok(code) => code,
        Err(e) => {
            eprintln!("Error: {:#}", e);
            ExitCode::FAILURE
        }
    }
}

fn init_tracing(verbose: u8) {
    let default = match verbose {
        0 => "warn",
        1 => "info",
        2 => "debug",
        _ => "trace",
    };
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default)),
        )
        .with_writer(io::stderr)
        .with_target(false)
        .init();
}


fn run(cli: Cli) -> Result<ExitCode> {
    let global = &cli.global;
    match cli.command {
        Command::Fmt {
            input,
            output,
            write,
        } => {
            let source = Source::read(input.as_deref())?;
            let text = format_documents(&source.text, &global.options(&source), global.indent)?;
            let target = if write {
                Some(source.path.clone().context("--write requires an input file")?)
            } else {
                output
            };
            write_text_output(&text, target.as_deref())?;
        }
        Command::Check { inputs } => return Ok(check_files(global, &inputs).emit()),
        Command::Get { path, input } => {
            let source = Source::read(input.as_deref())?;
            let text = get_property(&source.text, &global.options(&source), &path, global.indent)?;
            write_text_output(&text, None)?;
        }
        Command::Package { input } => {
            let source = Source::read(input.as_deref())?;
            let text = package_ref(&source.text, &global.options(&source))?;
            write_text_output(&text, None)?;
        }
        Command::Verify {
            path,
            expected,
            inputs,
            contains,
        } => {
            let mut docs = Vec::new();
            for input in &inputs {
                let source = Source::read(Some(input.as_path()))?;
                docs.extend(decode_documents(&source.text, &global.options(&source))?);
            }
            return Ok(verify_documents(&docs, &path, &expected, contains)?.emit());
        }
        Command::Convert {
            input,
            from,
            to,
            output,
        } => {
            let source = Source::read(input.as_deref())?;
            let converted =
                convert_text(&source.text, from, to, &global.options(&source), global.indent)?;
            match converted {
                Output::Text(text) => write_text_output(&text, output.as_deref())?,
                Output::Binary(bytes) => write_binary_output(&bytes, output.as_deref())?,
            }
        }
    }
    Ok(ExitCode::SUCCESS)
}

impl GlobalArgs {
    fn options(&self, source: &Source) -> DecodeOptions {
        let mode = if self.strict { Mode::Strict } else { Mode::Lenient };
        let options = DecodeOptions::default()
            .with_mode(mode)
            .with_indent_unit(self.indent);
        match &source.path {
            Some(path) => options.with_filename(path.display().to_string()),
            None => options,
        }
    }
}

/// Input text and the file it came from, if any.
struct Source {
    text: String,
    path: Option<PathBuf>,
}

impl Source {
    /// Read a file, or stdin when the path is absent or `-`.
    fn read(path: Option<&Path>) -> Result<Source> {
        match path {
            Some(path) if path != Path::new("-") => {
                let text = fs::read_to_string(path)
                    .with_context(|| format!("Error reading {}", path.display()))?;
                debug!(path = %path.display(), bytes = text.len(), "read input");
                Ok(Source {
                    text,
                    path: Some(path.to_path_buf()),
                })
            }
            _ => {
                let mut text = String::new();
                io::stdin()
                    .read_to_string(&mut text)
                    .context("Error reading stdin")?;
                Ok(Source { text, path: None })
            }
        }
    }
}

/// What a subcommand prints and the status it exits with.
#[derive(Debug, Default, PartialEq, Eq)]
struct Report {
    status: u8,
    stdout: String,
    stderr: String,
}

impl Report {
    fn emit(self) -> ExitCode {
        print!("{}", self.stdout);
        eprint!("{}", self.stderr);
        ExitCode::from(self.status)
    }
}

/// Converted output, ready to write.
#[derive(Debug, PartialEq)]
enum Output {
    Text(String),
    Binary(Vec<u8>),
}

/// Encode documents as subset text separated by `---` lines.
fn encode_documents(docs: &[Value], indent: usize) -> Result<String> {
    let mut parts = Vec::with_capacity(docs.len());
    for (index, doc) in docs.iter().enumerate() {
        let text = try_encode_with_indent(doc, indent)
            .with_context(|| format!("Cannot write document {} as subset text", index + 1))?;
        parts.push(text);
    }
    Ok(parts.join("\n---\n"))
}

/// `fmt`: decode every document and re-emit it.
fn format_documents(text: &str, options: &DecodeOptions, indent: usize) -> Result<String> {
    let docs = decode_documents(text, options)?;
    debug!(documents = docs.len(), "formatting");
    encode_documents(&docs, indent)
}

/// `get`: the value at `path` in the first document that has it.
fn get_property(text: &str, options: &DecodeOptions, path: &str, indent: usize) -> Result<String> {
    let docs = decode_documents(text, options)?;
    let segments = parse_path(path)?;
    let value = docs
        .iter()
        .find_map(|doc| get_segments(doc, &segments))
        .ok_or_else(|| anyhow!("Property {} not found in any document", path))?;
    Ok(match value {
        Value::Scalar(s) => scalar_to_plain_string(s),
        other => encode_with_indent(other, indent),
    })
}

/// `package`: `refName/version` of the package document.
fn package_ref(text: &str, options: &DecodeOptions) -> Result<String> {
    let docs = decode_documents(text, options)?;
    Ok(find_package(&docs)?.to_string())
}

/// `check`: strict-decode each file. Unreadable files count as failures.
fn check_files(global: &GlobalArgs, inputs: &[PathBuf]) -> Report {
    let mut report = Report::default();
    let mut failed = 0usize;
    for path in inputs {
        let outcome = Source::read(Some(path.as_path())).and_then(|source| {
            let options = global.options(&source).with_mode(Mode::Strict);
            Ok(decode_documents(&source.text, &options)?.len())
        });
        match outcome {
            Ok(documents) => {
                info!(path = %path.display(), documents, "valid");
                report.stdout.push_str(&format!("{}: ok\n", path.display()));
            }
            Err(e) => {
                failed += 1;
                report.stdout.push_str(&format!("{}: {:#}\n", path.display(), e));
            }
        }
    }
    if failed > 0 {
        report.status = 1;
        report.stderr = format!("{} of {} files failed\n", failed, inputs.len());
    }
    report
}

/// `verify`: compare `path` against `expected` in every document that has it.
///
/// A missing or different property is a report with [`EXIT_MISMATCH`]; a
/// malformed path is an error.
fn verify_documents(docs: &[Value], path: &str, expected: &str, contains: bool) -> Result<Report> {
    let expected = Value::Scalar(coerce(expected));
    let result = if contains {
        check_property_with(docs, path, &expected, text_contains)
    } else {
        check_property_with(docs, path, &expected, |actual, expected| actual == expected)
    };

    match result {
        Ok(()) => Ok(Report {
            stdout: format!("{}: ok\n", path),
            ..Report::default()
        }),
        Err(ManifestError::Path(e)) => Err(e.into()),
        Err(e) => Ok(Report {
            status: EXIT_MISMATCH,
            stderr: format!("{}\n", e),
            ..Report::default()
        }),
    }
}

/// Substring match on the plain text of two scalars.
fn text_contains(actual: &Value, expected: &Value) -> bool {
    match (actual, expected) {
        (Value::Scalar(a), Value::Scalar(e)) => {
            scalar_to_plain_string(a).contains(&scalar_to_plain_string(e))
        }
        _ => false,
    }
}

/// `convert`: decode `text` as `from` and render it as `to`.
///
/// Subset output keeps one document per `---` section. Other formats get a
/// single value, with a multi-document stream as a sequence of documents.
fn convert_text(
    text: &str,
    from: InputFormat,
    to: OutputFormat,
    options: &DecodeOptions,
    indent: usize,
) -> Result<Output> {
    let docs = match from {
        InputFormat::Subset => decode_documents(text, options)?,
        InputFormat::Yaml => vec![transcode::yaml::decode(text).map_err(|e| anyhow!(e))?],
    };
    let output = match to {
        OutputFormat::Subset => Output::Text(encode_documents(&docs, indent)?),
        OutputFormat::Json => Output::Text(
            transcode::json::encode(&into_single(docs))
                .map_err(|e| anyhow!("Cannot convert to JSON: {}", e))?,
        ),
        OutputFormat::Yaml => Output::Text(
            transcode::yaml::encode(&into_single(docs))
                .map_err(|e| anyhow!("Cannot convert to YAML: {}", e))?,
        ),
        OutputFormat::Toml => Output::Text(
            transcode::toml::encode(&into_single(docs))
                .map_err(|e| anyhow!("Cannot convert to TOML: {}", e))?,
        ),
        OutputFormat::Cbor => Output::Binary(transcode::cbor::encode(&into_single(docs))),
        OutputFormat::Diag => Output::Text(
            transcode::cbor::diagnostic(&transcode::cbor::encode(&into_single(docs)))
                .map_err(|e| anyhow!("Cannot render CBOR diagnostic notation: {}", e))?,
        ),
    };
    Ok(output)
}

/// Collapse a document stream into one value.
fn into_single(mut docs: Vec<Value>) -> Value {
    match docs.len() {
        0 => Value::empty_mapping(),
        1 => docs.remove(0),
        _ => Value::Sequence(docs),
    }
}

fn write_text_output(output: &str, output_file: Option<&Path>) -> Result<()> {
    if let Some(path) = output_file {
        let mut text = output.to_string();
        if !text.ends_with('\n') {
            text.push('\n');
        }
        fs::write(path, text).with_context(|| format!("Error writing {}", path.display()))?;
        info!(path = %path.display(), "wrote output");
    } else {
        print!("{}", output);
        // Ensure output ends with newline
        if !output.ends_with('\n') {
            println!();
        }
    }
    Ok(())
}

fn write_binary_output(output: &[u8], output_file: Option<&Path>) -> Result<()> {
    if let Some(path) = output_file {
        fs::write(path, output).with_context(|| format!("Error writing {}", path.display()))?;
        info!(path = %path.display(), bytes = output.len(), "wrote output");
    } else {
        io::stdout()
            .lock()
            .write_all(output)
            .context("Error writing to stdout")?;
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;

    #[test]
    fn test_cli_definition() {
        Cli::command().debug_assert();
    }

    #[test]
    fn test_parse_convert() {
        let cli = Cli::try_parse_from(["yamlet", "convert", "-t", "json", "pkg.yaml"]).unwrap();
        match cli.command {
            Command::Convert {
                input, from, to, ..
            } => {
                assert_eq!(input, Some(PathBuf::from("pkg.yaml")));
                assert_eq!(from, InputFormat::Subset);
                assert_eq!(to, OutputFormat::Json);
            }
            other => panic!("unexpected command {:?}", other),
        }
        assert!(Cli::try_parse_from(["yamlet", "convert", "-t", "xml"]).is_err());
    }

    #[test]
    fn test_global_flags_after_subcommand() {
        let cli =
            Cli::try_parse_from(["yamlet", "get", "spec.version", "--strict", "--indent", "4", "-vv"])
                .unwrap();
        assert!(cli.global.strict);
        assert_eq!(cli.global.indent, 4);
        assert_eq!(cli.global.verbose, 2);
    }

    #[test]
    fn test_fmt_write_conflicts_with_output() {
        assert!(Cli::try_parse_from(["yamlet", "fmt", "a.yaml", "-w", "-o", "b.yaml"]).is_err());
    }

    #[test]
    fn test_options_from_globals() {
        let global = GlobalArgs {
            strict: true,
            indent: 4,
            verbose: 0,
        };
        let source = Source {
            text: String::new(),
            path: Some(PathBuf::from("pkg.yaml")),
        };
        let options = global.options(&source);
        assert!(options.is_strict());
        assert_eq!(options.indent_unit, 4);
        assert_eq!(options.filename.as_deref(), Some("pkg.yaml"));
    }

    #[test]
    fn test_text_contains() {
        let actual = Value::from("1.0.0-24815986");
        assert!(text_contains(&actual, &Value::Scalar(coerce("24815986"))));
        assert!(text_contains(&Value::from(2.5), &Value::Scalar(coerce("2"))));
        assert!(!text_contains(&actual, &Value::from("2.0")));
        assert!(!text_contains(&Value::from(vec![actual.clone()]), &actual));
    }

    const NAMESPACE_AND_PACKAGE: &str = "\
kind: Namespace
metadata:
  name: argocd
---
kind: Package
spec:
  refName: argocd-service.vsphere.vmware.com
  version: 1.0.0-24815986
";

    fn lenient() -> DecodeOptions {
        DecodeOptions::default()
    }

    fn decode_all(text: &str) -> Vec<Value> {
        decode_documents(text, &lenient()).unwrap()
    }

    #[test]
    fn test_format_keeps_documents_apart() {
        let text = format_documents(NAMESPACE_AND_PACKAGE, &lenient(), 2).unwrap();
        assert_eq!(
            text,
            "kind: Namespace\nmetadata:\n  name: argocd\n---\nkind: Package\nspec:\n  \
             refName: argocd-service.vsphere.vmware.com\n  version: \"1.0.0-24815986\""
        );
        assert_eq!(decode_all(&text), decode_all(NAMESPACE_AND_PACKAGE));
    }

    #[test]
    fn test_format_single_document_and_indent() {
        let text = format_documents("a:\n  b:   'x'\n# gone\n", &lenient(), 4).unwrap();
        assert_eq!(text, "a:\n    b: x");
        assert_eq!(format_documents("", &lenient(), 2).unwrap(), "");
    }

    #[test]
    fn test_format_strict_reports_errors() {
        let err = format_documents("a: 1\n---\nnot yaml", &DecodeOptions::strict(), 2).unwrap_err();
        assert_eq!(err.to_string(), "Malformed line \"not yaml\" at line 1");
    }

    #[test]
    fn test_get_property() {
        assert_eq!(
            get_property(NAMESPACE_AND_PACKAGE, &lenient(), "spec.version", 2).unwrap(),
            "1.0.0-24815986"
        );
        assert_eq!(
            get_property(NAMESPACE_AND_PACKAGE, &lenient(), "metadata", 2).unwrap(),
            "name: argocd"
        );
        assert_eq!(
            get_property(NAMESPACE_AND_PACKAGE, &lenient(), "spec.missing", 2)
                .unwrap_err()
                .to_string(),
            "Property spec.missing not found in any document"
        );
        assert!(get_property(NAMESPACE_AND_PACKAGE, &lenient(), "spec..x", 2).is_err());
    }

    #[test]
    fn test_package_ref() {
        assert_eq!(
            package_ref(NAMESPACE_AND_PACKAGE, &lenient()).unwrap(),
            "argocd-service.vsphere.vmware.com/1.0.0-24815986"
        );
        assert!(package_ref("kind: Namespace", &lenient()).is_err());
    }

    #[test]
    fn test_verify_documents() {
        let docs = decode_all(NAMESPACE_AND_PACKAGE);

        let report = verify_documents(&docs, "spec.version", "1.0.0-24815986", false).unwrap();
        assert_eq!(report.status, 0);
        assert_eq!(report.stdout, "spec.version: ok\n");

        let report = verify_documents(&docs, "spec.version", "24815986", true).unwrap();
        assert_eq!(report.status, 0);

        let report = verify_documents(&docs, "spec.version", "2.0.0", false).unwrap();
        assert_eq!(report.status, EXIT_MISMATCH);
        assert_eq!(
            report.stderr,
            "Property spec.version in document 1 is \"1.0.0-24815986\", expected \"2.0.0\"\n"
        );

        let report = verify_documents(&docs, "spec.owner", "me", false).unwrap();
        assert_eq!(report.status, EXIT_MISMATCH);
        assert_eq!(report.stderr, "Property spec.owner not found in any document\n");

        assert!(verify_documents(&docs, "spec[", "x", false).is_err());
    }

    #[test]
    fn test_check_files_continues_past_unreadable() {
        let dir = std::env::temp_dir().join(format!("yamlet-check-{}", std::process::id()));
        fs::create_dir_all(&dir).unwrap();
        let good = dir.join("good.yaml");
        let bad = dir.join("bad.yaml");
        let missing = dir.join("missing.yaml");
        fs::write(&good, NAMESPACE_AND_PACKAGE).unwrap();
        fs::write(&bad, "a:\n   b: 1\n").unwrap();

        let global = GlobalArgs {
            strict: false,
            indent: 2,
            verbose: 0,
        };
        let report = check_files(&global, &[missing.clone(), bad.clone(), good.clone()]);
        fs::remove_dir_all(&dir).unwrap();

        let lines: Vec<&str> = report.stdout.lines().collect();
        assert_eq!(lines.len(), 3);
        assert!(lines[0].starts_with(&format!("{}: Error reading", missing.display())));
        assert_eq!(
            lines[1],
            format!(
                "{}: Indentation of 3 spaces is not a multiple of 2 at line 2 of <{}>",
                bad.display(),
                bad.display()
            )
        );
        assert_eq!(lines[2], format!("{}: ok", good.display()));
        assert_eq!(report.status, 1);
        assert_eq!(report.stderr, "2 of 3 files failed\n");
    }

    #[test]
    fn test_convert_subset_keeps_documents() {
        let output = convert_text(
            "a: 1\n---\nb:\n  - x\n",
            InputFormat::Subset,
            OutputFormat::Subset,
            &lenient(),
            2,
        )
        .unwrap();
        assert_eq!(output, Output::Text("a: 1\n---\nb:\n  - x".to_string()));
    }

    #[test]
    fn test_convert_multi_document_to_json() {
        let Output::Text(text) = convert_text(
            "a: 1\n---\nb: true\n",
            InputFormat::Subset,
            OutputFormat::Json,
            &lenient(),
            2,
        )
        .unwrap() else {
            panic!("expected text output");
        };
        let parsed: serde_json::Value = serde_json::from_str(&text).unwrap();
        assert_eq!(parsed, serde_json::json!([{"a": 1}, {"b": true}]));
    }

    #[test]
    fn test_convert_yaml_to_subset() {
        let output = convert_text(
            "spec: {refName: argocd, ports: [80, 443]}\n",
            InputFormat::Yaml,
            OutputFormat::Subset,
            &lenient(),
            2,
        )
        .unwrap();
        assert_eq!(
            output,
            Output::Text("spec:\n  refName: argocd\n  ports:\n    - 80\n    - 443".to_string())
        );
    }

    #[test]
    fn test_convert_rejects_unrepresentable_subset() {
        for (source, message) in [
            ("\"a: b\": 1\n", "Mapping key \"a: b\" at a: b cannot be written as subset text"),
            ("\"#c\": 2\n", "Mapping key \"#c\" at #c cannot be written as subset text"),
            (
                "list:\n  - name: x\n",
                "Sequence item at list[0] is a mapping; only scalars can be sequence items",
            ),
            ("[1, 2]\n", "Cannot encode a sequence as a document; the root must be a mapping"),
        ] {
            let err = convert_text(source, InputFormat::Yaml, OutputFormat::Subset, &lenient(), 2)
                .unwrap_err();
            assert_eq!(
                format!("{:#}", err),
                format!("Cannot write document 1 as subset text: {}", message)
            );
        }
    }

    #[test]
    fn test_convert_binary_and_diag() {
        let output =
            convert_text("n: 1\n", InputFormat::Subset, OutputFormat::Cbor, &lenient(), 2).unwrap();
        assert_eq!(output, Output::Binary(vec![0xa1, 0x61, b'n', 0x01]));

        let output =
            convert_text("n: 1\n", InputFormat::Subset, OutputFormat::Diag, &lenient(), 2).unwrap();
        assert_eq!(output, Output::Text("{\n  \"n\": 1\n}\n".to_string()));

        assert!(
            convert_text("n: ~\n", InputFormat::Subset, OutputFormat::Toml, &lenient(), 2).is_err()
        );
    }
}
