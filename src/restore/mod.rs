pub(crate) mod logic;
pub(crate) mod report;

use anyhow::{Context, Result};
use tracing::{info, warn};

use crate::config::AppConfig;
use crate::resolve::PathResolver;
use crate::store::ObjectStore;
use logic::{RestoreOrchestrator, RunOutcome};

/// Public entry point for a run: resolve inputs, then classify and either
/// report or restore.
pub async fn run_restore_flow<S: ObjectStore + ?Sized>(
    app_config: &AppConfig,
    store: &S,
) -> Result<RunOutcome> {
    let resolution = PathResolver::new(store)
        .resolve(&app_config.inputs)
        .await
        .context("Failed to resolve input paths")?;
    for skipped in &resolution.warnings {
        warn!(
            "{}:{}: skipping line without s3:// prefix: {}",
            skipped.file, skipped.line_number, skipped.line
        );
    }
    info!("Resolved {} object(s)", resolution.locations.len());

    RestoreOrchestrator::new(store, app_config)
        .run(&resolution.locations)
        .await
        .context("Restore process failed")
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::{ClassifyErrorPolicy, RestorePolicy, RunMode, StoreSettings};
    use crate::store::SpeedTier;
    use crate::store::memory::{MemoryStore, archived};
    use std::io::Write;

    #[tokio::test]
    async fn test_list_file_with_malformed_line_still_restores_valid_entry() -> anyhow::Result<()> {
        let mut list = tempfile::NamedTempFile::new()?;
        writeln!(list, "bucket/missing-scheme.bin")?;
        writeln!(list, "s3://bucket/archived.bin")?;

        let store = MemoryStore::new().with_object("s3://bucket/archived.bin", archived("GLACIER", 1_000));
        let cfg = AppConfig {
            inputs: vec![list.path().to_string_lossy().to_string()],
            policy: RestorePolicy { days: 7, speed: SpeedTier::Standard },
            store: StoreSettings::default(),
            mode: RunMode::Restore { wait: None },
            classify_errors: ClassifyErrorPolicy::Abort,
            debug: false,
        };

        let outcome = run_restore_flow(&cfg, &store).await?;

        match outcome {
            RunOutcome::Restored { summary, .. } => assert_eq!(summary.initiated.len(), 1),
            other => panic!("unexpected outcome {:?}", other),
        }
        // existence check while resolving, then classification
        assert_eq!(store.head_calls().len(), 2);
        Ok(())
    }

    #[tokio::test]
    async fn test_bad_input_fails_before_store_calls() {
        let store = MemoryStore::new().with_object("s3://bucket/a", archived("GLACIER", 1));
        let cfg = AppConfig {
            inputs: vec!["s3://bucket/a".into(), "no/such/list.txt".into()],
            policy: RestorePolicy { days: 7, speed: SpeedTier::Standard },
            store: StoreSettings::default(),
            mode: RunMode::Restore { wait: None },
            classify_errors: ClassifyErrorPolicy::Abort,
            debug: false,
        };

        assert!(run_restore_flow(&cfg, &store).await.is_err());
        assert!(store.head_calls().is_empty());
        assert!(store.restore_calls().is_empty());
    }
}
