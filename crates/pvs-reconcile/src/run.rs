use tracing::{debug, info, warn};

use crate::{
    assemble, Epsilon, Field, FilterVerdict, FuzzyTimestamp, Gate, Instant, InteractionMode,
    InteractionPolicy, LocalArchive, Prompt, ReconcileDay, ReconciliationReport,
    ReconciliationSet, RecordFilter, RemoteStatuses, RunError, StatusUploader, UploadError,
};

/// Per-run parameters. Fixed for the lifetime of one [`Reconciler::run`].
#[derive(Clone, Debug)]
pub struct RunParams {
    pub epsilon: Epsilon,
    /// Reference instant for the age policy.
    pub now: Instant,
    /// A record needs at least one of these to be worth publishing.
    pub required_fields: Vec<Field>,
    pub mode: InteractionMode,
}

impl RunParams {
    pub fn validate(&self) -> Result<(), RunError> {
        if self.required_fields.is_empty() {
            return Err(RunError::Config(
                "required_fields must name at least one field".to_string(),
            ));
        }
        Ok(())
    }
}

/// Drives one reconciliation date end to end.
pub struct Reconciler<'a> {
    archive: &'a dyn LocalArchive,
    remote: &'a dyn RemoteStatuses,
    uploader: &'a dyn StatusUploader,
    prompt: &'a mut dyn Prompt,
}

impl<'a> Reconciler<'a> {
    pub fn new(
        archive: &'a dyn LocalArchive,
        remote: &'a dyn RemoteStatuses,
        uploader: &'a dyn StatusUploader,
        prompt: &'a mut dyn Prompt,
    ) -> Self {
        Self {
            archive,
            remote,
            uploader,
            prompt,
        }
    }

    /// Find what the remote is missing for `day`, filter it, gate it, and
    /// publish it in batches.
    ///
    /// Archive, remote-listing and limits failures abort before anything is
    /// uploaded. A failed batch is counted and the next batch is still tried.
    pub async fn run(
        &mut self,
        day: &ReconcileDay,
        params: &RunParams,
    ) -> Result<ReconciliationReport, RunError> {
        params.validate()?;

        let limits = self.uploader.limits().await.map_err(RunError::Limits)?;
        info!(
            date = %day.date,
            max_batch_size = limits.max_batch_size.get(),
            max_age_days = limits.max_age_days,
            "station limits"
        );

        let local = self
            .archive
            .list_timestamps(day)
            .await
            .map_err(RunError::LocalRead)?;
        let remote = self
            .remote
            .list_timestamps(day)
            .await
            .map_err(RunError::RemoteRead)?;

        let set = ReconciliationSet::new(
            local.into_iter().map(FuzzyTimestamp::new).collect(),
            remote.into_iter().map(FuzzyTimestamp::new).collect(),
        );
        let mut report = ReconciliationReport::new(day.date, params.mode);
        report.record_found(set.local_len(), set.remote_len());

        let missing = set.missing(params.epsilon);
        report.record_missing(missing.len());
        info!(
            local = set.local_len(),
            remote = set.remote_len(),
            missing = missing.len(),
            epsilon_secs = params.epsilon.secs(),
            "reconciled timestamps"
        );

        let filter = RecordFilter::new(limits.max_age_days, params.required_fields.clone());
        let mut policy = InteractionPolicy::new(params.mode);
        let mut accepted = Vec::with_capacity(missing.len());

        // Duplicate instants come back together from one fetch.
        let mut instants: Vec<Instant> = missing.iter().map(|ts| ts.instant()).collect();
        instants.dedup();

        'candidates: for ts in instants {
            let records = self
                .archive
                .fetch_records(day, ts)
                .await
                .map_err(RunError::LocalRead)?;

            for record in records {
                let verdict = filter.verdict(&record, params.now);
                if verdict != FilterVerdict::Accept {
                    debug!(ts = record.timestamp(), ?verdict, "filtered");
                    report.record_filtered(verdict);
                    continue;
                }

                match policy.gate(&record, &mut *self.prompt) {
                    Gate::Accept => accepted.push(record),
                    Gate::Skip => {
                        info!(ts = record.timestamp(), "skipped by operator");
                        report.record_skipped(&record);
                    }
                    Gate::Quit => {
                        warn!(
                            ts = record.timestamp(),
                            accepted = accepted.len(),
                            "operator quit; remaining candidates not processed"
                        );
                        report.mark_quit();
                        break 'candidates;
                    }
                }
            }
        }
        report.record_accepted(accepted.len());

        for batch in assemble(accepted, limits.max_batch_size) {
            if policy.is_dry_run() {
                debug!(batch = batch.index(), size = batch.len(), "dry run: upload skipped");
                report.record_simulated(&batch);
                continue;
            }

            match self.uploader.upload_batch(&batch).await {
                Ok(acknowledged) => {
                    if acknowledged < batch.len() {
                        warn!(
                            batch = batch.index(),
                            size = batch.len(),
                            acknowledged,
                            "remote acknowledged part of batch"
                        );
                    } else {
                        info!(batch = batch.index(), size = batch.len(), "batch published");
                    }
                    report.record_acknowledged(&batch, acknowledged);
                }
                Err(UploadError::Failed(reason)) => {
                    warn!(
                        batch = batch.index(),
                        size = batch.len(),
                        first_ts = batch.first_timestamp(),
                        %reason,
                        "batch upload failed"
                    );
                    report.record_failed_batch(&batch, &reason);
                }
                Err(UploadError::Unauthorized(message)) => {
                    return Err(RunError::Unauthorized {
                        message,
                        published: report.published(),
                    });
                }
            }
        }

        info!("{}", report.summary());
        Ok(report)
    }
}
