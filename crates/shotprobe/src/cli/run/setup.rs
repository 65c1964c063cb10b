//! Run setup: config overrides, run directory, prober assembly.

use chrono::{DateTime, Local};
use shotprobe_core::{
    parse_fragment_list, Config, ContentFilter, DiskSink, Harvester, HttpResolver, Prober,
    RunOptions, TesseractEngine, Validator,
};
use std::path::{Path, PathBuf};
use std::sync::Arc;

use super::RunArgs;

/// Folder name format for a run started at a given local time.
const RUN_DIR_FORMAT: &str = "%Y-%m-%d_%H-%M-%S";

/// Everything `execute` needs, assembled from config and flags.
pub(crate) struct RunContext {
    pub harvester: Harvester,
    pub run_dir: PathBuf,
    pub fragments: Vec<String>,
}

/// Apply flags on top of config and build the harvester.
pub async fn setup_harvester(args: &RunArgs, mut config: Config) -> anyhow::Result<RunContext> {
    apply_overrides(&mut config, args);
    config.validate()?;

    let run_dir = match &args.output_dir {
        Some(dir) => PathBuf::from(shellexpand::tilde(&dir.to_string_lossy()).as_ref()),
        None => run_dir_for(&config.output_root(), Local::now()),
    };

    let fragments = config.filter.fragments.clone();
    let filter = if fragments.is_empty() {
        ContentFilter::disabled()
    } else {
        let engine = TesseractEngine::from_config(&config.filter, &config.limits);
        if !engine.is_available().await {
            anyhow::bail!(
                "Text filter needs the `{}` OCR engine, but it could not be run.\n\n  \
                 Hint: install tesseract or set `filter.ocr_command` in your config.",
                config.filter.ocr_command
            );
        }
        ContentFilter::new(&fragments, Arc::new(engine))
    };

    let resolver = HttpResolver::new(&config.remote, &config.limits)?;
    let prober = Prober::new(
        Arc::new(resolver),
        Validator::new(config.limits.clone()),
        filter,
        Arc::new(DiskSink::new(&run_dir)),
    );
    let harvester = Harvester::new(prober, RunOptions::from_config(&config.probe));

    Ok(RunContext {
        harvester,
        run_dir,
        fragments,
    })
}

/// Flags win over config values.
fn apply_overrides(config: &mut Config, args: &RunArgs) {
    if let Some(count) = args.count {
        config.probe.target = count;
    }
    if let Some(workers) = args.workers {
        config.probe.workers = workers;
    }
    if let Some(max_attempts) = args.max_attempts {
        config.probe.max_attempts = Some(max_attempts);
    }
    if let Some(seed) = args.seed {
        config.probe.seed = Some(seed);
    }
    if let Some(raw) = &args.filter {
        config.filter.fragments = parse_fragment_list(raw);
    }
}

/// `<root>/<YYYY-MM-DD_HH-MM-SS>` for a run started at `started`.
fn run_dir_for(root: &Path, started: DateTime<Local>) -> PathBuf {
    root.join(started.format(RUN_DIR_FORMAT).to_string())
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    #[test]
    fn run_dir_is_timestamped() {
        let started = Local.with_ymd_and_hms(2024, 3, 9, 7, 5, 2).unwrap();
        let dir = run_dir_for(Path::new("/captures"), started);
        assert_eq!(dir, PathBuf::from("/captures/2024-03-09_07-05-02"));
    }

    #[test]
    fn flags_override_config() {
        let mut config = Config::default();
        config.filter.fragments = vec!["from-config".to_string()];
        let args = RunArgs {
            count: Some(3),
            workers: Some(2),
            filter: Some(" Invoice , ,receipt".to_string()),
            seed: Some(7),
            ..RunArgs::default()
        };

        apply_overrides(&mut config, &args);
        assert_eq!(config.probe.target, 3);
        assert_eq!(config.probe.workers, 2);
        assert_eq!(config.probe.seed, Some(7));
        assert_eq!(config.probe.max_attempts, None);
        assert_eq!(config.filter.fragments, vec!["invoice", "receipt"]);
    }

    #[test]
    fn unset_flags_keep_config() {
        let mut config = Config::default();
        config.probe.target = 25;
        config.filter.fragments = vec!["hello".to_string()];

        apply_overrides(&mut config, &RunArgs::default());
        assert_eq!(config.probe.target, 25);
        assert_eq!(config.probe.workers, 8);
        assert_eq!(config.filter.fragments, vec!["hello"]);
    }

    #[tokio::test]
    async fn zero_count_is_rejected_before_any_request() {
        let args = RunArgs {
            count: Some(0),
            ..RunArgs::default()
        };
        assert!(setup_harvester(&args, Config::default()).await.is_err());
    }
}
