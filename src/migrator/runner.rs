use std::collections::{HashMap, HashSet};

use sea_orm::TransactionTrait;

use crate::database::{Database, SeaSchemaStore};
use crate::ports::schema_store::StepLedger;

use super::{MigrationStep, MigratorError};

/// Where a registered step stands against a store.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StepStatus {
    pub id: String,
    /// Unix timestamp (seconds), `None` while pending
    pub applied_at: Option<i64>,
}

/// Runs registered steps in sequence order, tracking them in the ledger.
pub struct Migrator {
    steps: Vec<Box<dyn MigrationStep>>,
}

impl Migrator {
    /// Register `steps`, ordering them by sequence.
    ///
    /// Fails when two steps share a sequence or an id.
    pub fn new(mut steps: Vec<Box<dyn MigrationStep>>) -> Result<Self, MigratorError> {
        steps.sort_by_key(|step| step.sequence());

        for pair in steps.windows(2) {
            if pair[0].sequence() == pair[1].sequence() {
                return Err(MigratorError::DuplicateSequence {
                    sequence: pair[1].sequence(),
                    first: pair[0].id().to_string(),
                    second: pair[1].id().to_string(),
                });
            }
        }

        let mut ids = HashSet::new();
        for step in &steps {
            if !ids.insert(step.id()) {
                return Err(MigratorError::DuplicateId(step.id().to_string()));
            }
        }

        Ok(Self { steps })
    }

    /// Registered steps in ascending sequence order.
    pub fn steps(&self) -> impl Iterator<Item = &dyn MigrationStep> {
        self.steps.iter().map(|step| step.as_ref())
    }

    pub fn find_step(&self, id: &str) -> Option<&dyn MigrationStep> {
        self.steps().find(|step| step.id() == id)
    }

    /// Steps not yet in the ledger, in the order they would be applied.
    pub async fn list_pending_steps(
        &self,
        ledger: &dyn StepLedger,
    ) -> Result<Vec<&dyn MigrationStep>, MigratorError> {
        let applied: HashSet<String> = ledger
            .applied_steps()
            .await?
            .into_iter()
            .map(|step| step.id)
            .collect();

        Ok(self
            .steps()
            .filter(|step| !applied.contains(step.id()))
            .collect())
    }

    pub async fn is_applied(
        &self,
        ledger: &dyn StepLedger,
        step_id: &str,
    ) -> Result<bool, MigratorError> {
        Ok(ledger.is_applied(step_id).await?)
    }

    pub async fn status(&self, ledger: &dyn StepLedger) -> Result<Vec<StepStatus>, MigratorError> {
        let applied: HashMap<String, i64> = ledger
            .applied_steps()
            .await?
            .into_iter()
            .map(|step| (step.id, step.applied_at))
            .collect();

        Ok(self
            .steps()
            .map(|step| StepStatus {
                id: step.id().to_string(),
                applied_at: applied.get(step.id()).copied(),
            })
            .collect())
    }

    /// Apply pending steps in ascending order, at most `limit` of them.
    ///
    /// Each step runs in its own transaction together with its ledger entry.
    /// The first failure rolls that step back and stops the run; steps applied
    /// before it stay applied. Returns the ids of the applied steps.
    pub async fn up(
        &self,
        db: &Database,
        limit: Option<usize>,
    ) -> Result<Vec<String>, MigratorError> {
        let pending = self.list_pending_steps(&db.store()).await?;
        let pending: Vec<_> = match limit {
            Some(limit) => pending.into_iter().take(limit).collect(),
            None => pending,
        };

        if pending.is_empty() {
            log::info!("No pending migration steps");
            return Ok(Vec::new());
        }

        let mut applied = Vec::with_capacity(pending.len());
        for step in pending {
            log::info!("Applying migration step {}", step.id());

            let txn = db.conn.begin().await?;
            let result = {
                let store = SeaSchemaStore::new(&txn);
                match step.apply(&store).await {
                    Ok(()) => store.record_applied(step.id(), step.sequence()).await,
                    Err(e) => Err(e),
                }
            };

            if let Err(source) = result {
                if let Err(e) = txn.rollback().await {
                    log::warn!("Failed to roll back step {}: {}", step.id(), e);
                }
                if source.is_conflict() {
                    log::warn!(
                        "Migration step {} looks already applied but is missing from the ledger",
                        step.id()
                    );
                }
                log::error!("Migration step {} failed: {}", step.id(), source);
                return Err(MigratorError::Step {
                    step: step.id().to_string(),
                    source,
                });
            }

            txn.commit().await?;
            applied.push(step.id().to_string());
        }

        log::info!("Applied {} migration step(s)", applied.len());
        Ok(applied)
    }

    /// Revert the `count` most recently applied steps, newest first.
    ///
    /// Returns the ids of the reverted steps.
    pub async fn down(&self, db: &Database, count: usize) -> Result<Vec<String>, MigratorError> {
        let applied = db.store().applied_steps().await?;

        let mut reverted = Vec::new();
        for entry in applied.iter().rev().take(count) {
            let step = self
                .find_step(&entry.id)
                .ok_or_else(|| MigratorError::UnknownAppliedStep(entry.id.clone()))?;
            log::info!("Reverting migration step {}", step.id());

            let txn = db.conn.begin().await?;
            let result = {
                let store = SeaSchemaStore::new(&txn);
                match step.revert(&store).await {
                    Ok(()) => store.record_reverted(step.id()).await,
                    Err(e) => Err(e),
                }
            };

            if let Err(source) = result {
                if let Err(e) = txn.rollback().await {
                    log::warn!("Failed to roll back revert of {}: {}", step.id(), e);
                }
                log::error!("Reverting migration step {} failed: {}", step.id(), source);
                return Err(MigratorError::Step {
                    step: step.id().to_string(),
                    source,
                });
            }

            txn.commit().await?;
            reverted.push(step.id().to_string());
        }

        if reverted.is_empty() {
            log::info!("No applied migration steps to revert");
        } else {
            log::info!("Reverted {} migration step(s)", reverted.len());
        }
        Ok(reverted)
    }
}
