//! Minimal CLI: convert → Flow libdefs
use std::path::{Path, PathBuf};

use anyhow::{Context, bail};
use clap::{Args, Parser, Subcommand};
use colored::Colorize;
use rayon::prelude::*;

// ————————————————————————————————————————————————————————————————————————————
// TYPES
// ————————————————————————————————————————————————————————————————————————————

/// convert TypeScript declaration files into Flow libdef files
#[derive(Parser, Debug)]
pub struct CommandLineInterface {
    #[command(subcommand)]
    cmd: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// convert declaration files and write Flow libdefs
    Convert(ConvertArgs),
}

#[derive(Args, Debug, Clone)]
struct InputSettings {
    /// One or more inputs. May be literal paths or quoted glob patterns
    #[arg(long, short, num_args = 1.., required = true)]
    input: Vec<String>,
}

#[derive(clap::Parser, Debug)]
struct ConvertArgs {
    #[command(flatten)]
    input_settings: InputSettings,

    /// output directory (defaults to next to each input)
    #[arg(short, long)]
    out_dir: Option<PathBuf>,

    /// extension appended to the input stem for generated files
    #[arg(long, default_value = ".js.flow")]
    ext: String,

    /// print generated output to stdout instead of writing files
    #[arg(long)]
    stdout: bool,

    /// debugging
    #[arg(long)]
    no_op: bool,
}

// ————————————————————————————————————————————————————————————————————————————
// IMPLEMENTATION
// ————————————————————————————————————————————————————————————————————————————

impl CommandLineInterface {
    pub fn load() -> Self {
        Self::parse()
    }

    pub fn run(&self) -> anyhow::Result<()> {
        match &self.cmd {
            Command::Convert(target) => {
                // debug path
                if target.no_op {
                    eprintln!("{self:#?}");
                    return Ok(());
                }

                let source_paths =
                    resolve_file_path_patterns(&target.input_settings.input)
                        .context("failed to resolve input file paths")?;

                // files are independent units; convert them in parallel
                let results: Vec<anyhow::Result<()>> = source_paths
                    .par_iter()
                    .map(|source_path| convert_file(source_path, target))
                    .collect();

                let mut failures = 0usize;
                for result in results {
                    if let Err(error) = result {
                        failures += 1;
                        eprintln!("{} {error:#}", "error:".red().bold());
                    }
                }
                if failures > 0 {
                    bail!("{failures} input file(s) failed");
                }
                Ok(())
            }
        }
    }
}

fn convert_file(source_path: &Path, target: &ConvertArgs) -> anyhow::Result<()> {
    let source = std::fs::read_to_string(source_path)
        .with_context(|| format!("failed to read source file {}", source_path.display()))?;

    let stmts = crate::convert::convert_source(&source);
    let output = crate::printer::print_file(&stmts);
    // the banner mentions the tags, so count only past it
    let diagnostics = output[crate::printer::HEADER.len()..].matches("dtsflow-").count();

    if target.stdout {
        println!("{output}");
        return Ok(());
    }

    let out_path = output_path(source_path, target)?;
    if let Some(parent) = out_path.parent() {
        std::fs::create_dir_all(parent)
            .with_context(|| format!("failed to create output directory {}", parent.display()))?;
    }
    std::fs::write(&out_path, &output)
        .with_context(|| format!("failed to write output file {}", out_path.display()))?;

    let status = if diagnostics == 0 {
        "clean".green().to_string()
    } else {
        format!("{diagnostics} diagnostic(s)").yellow().to_string()
    };
    eprintln!(
        "{} {} -> {} [{status}]",
        "converted".cyan(),
        source_path.display(),
        out_path.display()
    );
    Ok(())
}

fn output_path(source_path: &Path, target: &ConvertArgs) -> anyhow::Result<PathBuf> {
    let file_name = source_path
        .file_name()
        .and_then(|n| n.to_str())
        .with_context(|| format!("input path has no usable file name: {}", source_path.display()))?;
    let stem = file_name
        .strip_suffix(".d.ts")
        .or_else(|| file_name.strip_suffix(".ts"))
        .unwrap_or(file_name);
    let out_name = format!("{stem}{}", target.ext);
    let dir = match &target.out_dir {
        Some(dir) => dir.clone(),
        None => source_path.parent().map(Path::to_path_buf).unwrap_or_default(),
    };
    Ok(dir.join(out_name))
}

// ————————————————————————————————————————————————————————————————————————————
// INTERNAL HELPERS
// ————————————————————————————————————————————————————————————————————————————

fn resolve_file_path_patterns<I>(patterns: I) -> anyhow::Result<Vec<PathBuf>>
where
    I: IntoIterator,
    I::Item: AsRef<str>,
{
    fn has_glob_chars(s: &str) -> bool {
        // Minimal glob detection for the `glob` crate syntax.
        s.bytes().any(|b| matches!(b, b'*' | b'?' | b'[' | b'{'))
    }

    let mut out = Vec::<PathBuf>::new();

    for raw in patterns {
        let pattern = raw.as_ref();

        if has_glob_chars(pattern) {
            // Treat as a glob pattern
            let mut matched_any = false;
            for entry in glob::glob(pattern)? {
                out.push(entry?);
                matched_any = true;
            }
            if !matched_any {
                // Pattern was explicitly a glob but matched nothing -> surface as an error
                bail!("glob pattern matched no files: {pattern}");
            }
        } else {
            // Treat as a literal path
            out.push(PathBuf::from(pattern));
        }
    }

    Ok(out)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn args_for(input: &Path) -> ConvertArgs {
        ConvertArgs {
            input_settings: InputSettings {
                input: vec![input.to_string_lossy().into_owned()],
            },
            out_dir: None,
            ext: ".js.flow".to_string(),
            stdout: false,
            no_op: false,
        }
    }

    #[test]
    fn converts_a_file_next_to_its_input() {
        let dir = tempfile::tempdir().unwrap();
        let input = dir.path().join("lib.d.ts");
        std::fs::write(&input, "declare const version: string;\n").unwrap();

        convert_file(&input, &args_for(&input)).unwrap();

        let out = std::fs::read_to_string(dir.path().join("lib.js.flow")).unwrap();
        assert!(out.starts_with("// @flow\n"), "{out}");
        assert!(out.contains("declare var version: string;"), "{out}");
    }

    #[test]
    fn output_name_strips_the_declaration_suffix() {
        let args = args_for(Path::new("pkg/types/index.d.ts"));
        let out = output_path(Path::new("pkg/types/index.d.ts"), &args).unwrap();
        assert_eq!(out, PathBuf::from("pkg/types/index.js.flow"));
    }

    #[test]
    fn out_dir_redirects_every_output() {
        let dir = tempfile::tempdir().unwrap();
        let input = dir.path().join("api.d.ts");
        std::fs::write(&input, "type Id = string;\n").unwrap();

        let mut args = args_for(&input);
        args.out_dir = Some(dir.path().join("flow"));
        convert_file(&input, &args).unwrap();

        assert!(dir.path().join("flow/api.js.flow").is_file());
    }

    #[test]
    fn unmatched_glob_is_an_error() {
        let err = resolve_file_path_patterns(["no/such/dir/*.d.ts"]).unwrap_err();
        assert!(err.to_string().contains("matched no files"));
    }
}
