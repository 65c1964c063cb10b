//! The `shotprobe scan` command: OCR-search saved captures.

use clap::{Args, ValueEnum};
use console::Style;
use shotprobe_core::output::OutputFormat as CoreOutputFormat;
use shotprobe_core::{
    parse_fragment_list, Config, ContentFilter, FileDiscovery, FolderScanner, OutputWriter,
    TesseractEngine,
};
use std::fs::File;
use std::io::BufWriter;
use std::path::PathBuf;
use std::sync::Arc;

/// Arguments for the `scan` command.
#[derive(Args, Debug)]
pub struct ScanArgs {
    /// Folder (or single image) to search
    #[arg(required = true)]
    pub input: PathBuf,

    /// Comma-separated words to look for (case-insensitive)
    #[arg(required = true)]
    pub words: String,

    /// Also write matches (with recognized text) to this file
    #[arg(short, long)]
    pub output: Option<PathBuf>,

    /// Format of the --output file
    #[arg(long, value_enum, default_value = "jsonl")]
    pub format: OutputFormat,
}

/// Supported output formats.
#[derive(Clone, Copy, Debug, ValueEnum)]
pub enum OutputFormat {
    /// Single JSON array
    Json,
    /// One JSON object per line (newline-delimited)
    Jsonl,
}

impl From<OutputFormat> for CoreOutputFormat {
    fn from(format: OutputFormat) -> Self {
        match format {
            OutputFormat::Json => CoreOutputFormat::Json,
            OutputFormat::Jsonl => CoreOutputFormat::JsonLines,
        }
    }
}

/// Execute the scan command.
pub async fn execute(args: ScanArgs, config: Config) -> anyhow::Result<()> {
    if !args.input.exists() {
        anyhow::bail!(
            "Input path does not exist: {:?}\n\n  Hint: Check the folder path and try again.",
            args.input
        );
    }

    let fragments = parse_fragment_list(&args.words);
    if fragments.is_empty() {
        anyhow::bail!("No words to search for");
    }

    let engine = TesseractEngine::from_config(&config.filter, &config.limits);
    if !engine.is_available().await {
        anyhow::bail!(
            "OCR engine `{}` could not be run.\n\n  \
             Hint: install tesseract or set `filter.ocr_command` in your config.",
            config.filter.ocr_command
        );
    }

    let scanner = FolderScanner::new(
        FileDiscovery::default(),
        ContentFilter::new(&fragments, Arc::new(engine)),
    );
    let files = scanner.discover(&args.input);
    if files.is_empty() {
        tracing::warn!("No png/jpg/jpeg files found at {:?}", args.input);
        return Ok(());
    }
    tracing::info!("Scanning {} image(s) for: {}", files.len(), fragments.join(", "));

    let green = Style::new().green().bold();
    let (matches, summary) = scanner
        .scan(&files, |m| {
            println!(
                "{} {}: contains '{}'",
                green.apply_to("[MATCH]"),
                m.file_name,
                m.fragment
            );
        })
        .await;

    if let Some(output_path) = &args.output {
        let file = File::create(output_path)?;
        let mut writer = OutputWriter::new(BufWriter::new(file), args.format.into(), true);
        writer.write_all(&matches)?;
        writer.flush()?;
        tracing::info!("Matches written to {:?}", output_path);
    }

    if summary.failed > 0 {
        tracing::warn!("{} file(s) could not be read or recognized", summary.failed);
    }
    println!(
        "\nTotal matches: {} of {} file(s)",
        summary.matched, summary.scanned
    );

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn format_maps_to_core() {
        assert_eq!(
            CoreOutputFormat::from(OutputFormat::Jsonl),
            CoreOutputFormat::JsonLines
        );
        assert_eq!(CoreOutputFormat::from(OutputFormat::Json), CoreOutputFormat::Json);
    }

    #[tokio::test]
    async fn missing_input_is_an_error() {
        let args = ScanArgs {
            input: PathBuf::from("/definitely/not/here"),
            words: "invoice".to_string(),
            output: None,
            format: OutputFormat::Jsonl,
        };
        assert!(execute(args, Config::default()).await.is_err());
    }

    #[tokio::test]
    async fn blank_word_list_is_an_error() {
        let dir = tempfile::tempdir().unwrap();
        let args = ScanArgs {
            input: dir.path().to_path_buf(),
            words: " , ".to_string(),
            output: None,
            format: OutputFormat::Jsonl,
        };
        assert!(execute(args, Config::default()).await.is_err());
    }
}
