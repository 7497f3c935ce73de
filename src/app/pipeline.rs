//! Training pipeline: load -> transform -> fit.
//!
//! Stages run strictly in order, all with the same arguments, and each one
//! overwrites its outputs, so re-running the whole pipeline is safe. The first
//! failing stage stops the run; a failure marker is written to the output
//! directory and the error is returned to the caller.

use std::fs::{create_dir_all, write};
use std::path::{Path, PathBuf};

use tracing::{error, info};

use crate::domain::{Hyperparameters, TrainingPaths};
use crate::error::{AppError, ErrorKind};
use crate::io::{artifact_path, format_source_data, read_table, save_bundle};
use crate::models::MultiSeriesModel;
use crate::report::write_diagnostics;
use crate::transform::seasonal_difference;

pub const FAILURE_FILE: &str = "failure";

/// Arguments shared by every stage.
#[derive(Debug, Clone, PartialEq)]
pub struct StageArgs {
    /// Directory holding the raw CSV files.
    pub source_path: PathBuf,
    /// Directory holding the canonical training table.
    pub training_data_path: PathBuf,
    pub model_save_path: PathBuf,
    pub output_path: PathBuf,
    pub hyperparameters: Hyperparameters,
}

impl StageArgs {
    pub fn new(paths: &TrainingPaths, hyperparameters: Hyperparameters) -> Self {
        Self {
            source_path: paths.input.clone(),
            training_data_path: paths.input.clone(),
            model_save_path: paths.model.clone(),
            output_path: paths.output.clone(),
            hyperparameters,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Stage {
    Load,
    Transform,
    Fit,
}

impl Stage {
    /// The training pipeline, in execution order.
    pub const TRAINING: [Stage; 3] = [Stage::Load, Stage::Transform, Stage::Fit];

    pub fn name(self) -> &'static str {
        match self {
            Stage::Load => "load",
            Stage::Transform => "transform",
            Stage::Fit => "fit",
        }
    }

    pub fn run(self, args: &StageArgs) -> Result<(), AppError> {
        match self {
            Stage::Load => format_source_data(&args.source_path).map(|_| ()),
            Stage::Transform => {
                seasonal_difference(&args.training_data_path, args.hyperparameters.season_len)
            }
            Stage::Fit => train_model(args).map(|_| ()),
        }
    }
}

/// Where and why a pipeline run stopped.
#[derive(Debug, Clone)]
pub struct PipelineFailure {
    pub stage: String,
    pub completed: Vec<Stage>,
    pub error: AppError,
}

impl PipelineFailure {
    /// Failure marker text: fixed title, the error, then the trace.
    pub fn report(&self) -> String {
        let completed: Vec<&str> = self.completed.iter().map(|s| s.name()).collect();
        format!(
            "Exception raised during training\n\n{}\nstage: {}\nkind: {}\ncompleted: [{}]\n",
            self.error,
            self.stage,
            self.error.kind(),
            completed.join(", ")
        )
    }
}

/// Run `stages` in order, stopping at the first error.
pub fn execute_pipeline(stages: &[Stage], args: &StageArgs) -> Result<(), PipelineFailure> {
    let mut completed = Vec::with_capacity(stages.len());
    for &stage in stages {
        info!(stage = stage.name(), "Running stage");
        if let Err(error) = stage.run(args) {
            return Err(PipelineFailure {
                stage: stage.name().to_string(),
                completed,
                error,
            });
        }
        completed.push(stage);
    }
    Ok(())
}

/// Full training run with environment-resolved paths. Writes the failure
/// marker on any error, including a bad hyperparameter file.
pub fn run_training(paths: &TrainingPaths) -> Result<PathBuf, AppError> {
    let hyperparameters = Hyperparameters::load(&paths.config).map_err(|error| {
        record_failure(
            &paths.output,
            &PipelineFailure {
                stage: "configure".to_string(),
                completed: Vec::new(),
                error,
            },
        )
    })?;
    info!(
        input = %paths.input.display(),
        model = %paths.model.display(),
        season_len = hyperparameters.season_len,
        order = %hyperparameters.order,
        "Starting training"
    );

    let args = StageArgs::new(paths, hyperparameters);
    execute_pipeline(&Stage::TRAINING, &args).map_err(|f| record_failure(&paths.output, &f))?;
    Ok(args.model_save_path.join(crate::domain::MODEL_FILE_NAME))
}

/// Fit stage: read the table, fit every zone, persist bundle and diagnostics.
pub fn train_model(args: &StageArgs) -> Result<MultiSeriesModel, AppError> {
    let hp = &args.hyperparameters;
    let records = read_table(&artifact_path(&args.training_data_path))?;

    let mut model = MultiSeriesModel::new(hp.order, hp.freq_secs);
    let report = model.fit_all(&records)?;

    if report.fitted.is_empty() {
        return Err(AppError::new(
            ErrorKind::ModelFit,
            format!("No zone could be fitted: {}", describe_failures(&report.failed)),
        ));
    }
    if !report.failed.is_empty() && !hp.allow_partial_fit {
        return Err(AppError::new(
            ErrorKind::ModelFit,
            format!("Zone fit failed: {}", describe_failures(&report.failed)),
        ));
    }

    let bundle = save_bundle(&args.model_save_path, &model)?;
    let diagnostics = write_diagnostics(&args.output_path, &model)?;
    info!(
        bundle = %bundle.display(),
        diagnostics = %diagnostics.display(),
        fitted = report.fitted.len(),
        failed = report.failed.len(),
        "Model saved"
    );
    Ok(model)
}

fn describe_failures(failed: &[(crate::domain::Zone, String)]) -> String {
    failed
        .iter()
        .map(|(zone, reason)| format!("{zone}: {reason}"))
        .collect::<Vec<_>>()
        .join("; ")
}

/// Write the failure marker and hand the error back.
fn record_failure(output: &Path, failure: &PipelineFailure) -> AppError {
    error!(stage = %failure.stage, error = %failure.error, "Training failed");
    let path = output.join(FAILURE_FILE);
    let written = create_dir_all(output).and_then(|()| write(&path, failure.report()));
    if let Err(e) = written {
        error!(path = %path.display(), error = %e, "Failed to write failure marker");
    }
    failure.error.clone()
}
