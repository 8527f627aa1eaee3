use crate::config::ConvertOptions;
use crate::core::{Converter, SourceKind};
use crate::error::BridgeResult;
use crate::parser;
use crate::types::Conversion;
use clap::Args;
use colored::Colorize;
use std::fs;
use std::path::{Path, PathBuf};

/// Flags shared by every conversion command
#[derive(Args, Debug, Clone, Default)]
pub struct ConvertArgs {
    /// Input document (.yaml, .yml or .json)
    pub file: PathBuf,

    /// Write the converted text here instead of stdout
    #[arg(short, long)]
    pub output: Option<PathBuf>,

    /// Options file (.yaml or .json)
    #[arg(short, long, env = "CALCBRIDGE_CONFIG")]
    pub config: Option<PathBuf>,

    /// Leave out the section heading lines of sheet output
    #[arg(long)]
    pub no_headings: bool,

    /// Leave out the leading source comment
    #[arg(long)]
    pub no_header_comment: bool,
}

/// Options from the config file (or defaults), then command-line overrides
pub fn load_options(args: &ConvertArgs) -> BridgeResult<ConvertOptions> {
    let mut options = match &args.config {
        Some(path) => ConvertOptions::from_file(path)?,
        None => ConvertOptions::default(),
    };
    if args.no_headings {
        options.headings = false;
    }
    if args.no_header_comment {
        options.header_comment = false;
    }
    Ok(options)
}

/// Execute a conversion command
pub fn convert(kind: SourceKind, args: ConvertArgs, verbose: bool) -> BridgeResult<()> {
    let options = load_options(&args)?;

    if verbose {
        eprintln!("{}", format!("📖 Reading {} document...", kind).cyan());
        eprintln!("   File: {}", args.file.display());
    }

    let document = parser::parse_document(&args.file, kind)?;
    let conversion = Converter::new(options).convert(&document);

    match &args.output {
        Some(path) => {
            write_output(path, &conversion)?;
            eprintln!(
                "{}",
                format!(
                    "✅ Wrote {} line(s) to {}",
                    conversion.lines().count(),
                    path.display()
                )
                .bold()
                .green()
            );
        }
        None => print!("{}", conversion.text),
    }

    report_warnings(&conversion.warnings);
    Ok(())
}

fn write_output(path: &Path, conversion: &Conversion) -> BridgeResult<()> {
    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        fs::create_dir_all(parent)?;
    }
    fs::write(path, &conversion.text)?;
    Ok(())
}

/// Warnings go to stderr so stdout carries only the converted text
fn report_warnings(warnings: &[String]) {
    if warnings.is_empty() {
        return;
    }
    eprintln!(
        "{}",
        format!("⚠️  {} warning(s):", warnings.len()).yellow().bold()
    );
    for warning in warnings {
        eprintln!("   {} {}", "•".yellow(), warning);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn test_load_options_defaults_and_overrides() {
        let args = ConvertArgs {
            no_headings: true,
            ..ConvertArgs::default()
        };
        let options = load_options(&args).unwrap();
        assert!(!options.headings);
        assert!(options.header_comment);
        assert_eq!(options.max_depth, 256);
    }

    #[test]
    fn test_load_options_from_file_then_flags() {
        let mut file = tempfile::Builder::new().suffix(".yaml").tempfile().unwrap();
        writeln!(file, "max_depth: 8\nheader_comment: true").unwrap();
        let args = ConvertArgs {
            config: Some(file.path().to_path_buf()),
            no_header_comment: true,
            ..ConvertArgs::default()
        };
        let options = load_options(&args).unwrap();
        assert_eq!(options.max_depth, 8);
        assert!(!options.header_comment);
    }

    #[test]
    fn test_convert_writes_output_file() {
        let dir = tempfile::tempdir().unwrap();
        let input = dir.path().join("regions.yaml");
        fs::write(
            &input,
            "regions:\n  - tokens:\n      - { kind: operand, text: a }\n      - { kind: operand, text: b }\n      - { kind: operator, text: '*', arity: 2 }\n",
        )
        .unwrap();
        let output = dir.path().join("out").join("result.cpd");

        let args = ConvertArgs {
            file: input,
            output: Some(output.clone()),
            no_header_comment: true,
            ..ConvertArgs::default()
        };
        convert(SourceKind::Tokens, args, false).unwrap();
        assert_eq!(fs::read_to_string(output).unwrap(), "a*b\n");
    }
}
