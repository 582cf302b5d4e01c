use std::sync::Arc;
use std::time::{Duration, Instant};

use log::{debug, error, info};
use serde_json::Value;
use tokio::sync::watch;
use tokio::task::JoinHandle;
use tokio::time::timeout;

use super::Stage;
use crate::error::AnalysisError;
use crate::model::NutritionAnalysis;
use crate::nutrition::NutritionStructurer;
use crate::validation::{validate_request, validate_response};
use crate::vision::FoodVision;

pub const DEFAULT_PIPELINE_TIMEOUT: Duration = Duration::from_secs(120);

/// Runs validate → vision → structure → validate for one request at a time.
///
/// The pipeline only holds shared handles to the two model clients, so a
/// single instance can serve any number of concurrent requests.
pub struct AnalysisPipeline {
    vision: Arc<dyn FoodVision>,
    nutrition: Arc<dyn NutritionStructurer>,
    deadline: Duration,
}

impl AnalysisPipeline {
    pub fn new(vision: Arc<dyn FoodVision>, nutrition: Arc<dyn NutritionStructurer>) -> Self {
        AnalysisPipeline {
            vision,
            nutrition,
            deadline: DEFAULT_PIPELINE_TIMEOUT,
        }
    }

    pub fn with_deadline(mut self, deadline: Duration) -> Self {
        self.deadline = deadline;
        self
    }

    pub fn deadline(&self) -> Duration {
        self.deadline
    }

    /// Process a raw request body into a validated `NutritionAnalysis`.
    ///
    /// The stages run in their own task. When the deadline passes the task is
    /// aborted, which drops any in-flight HTTP request and closes its
    /// connection. Dropping the returned future aborts the task as well.
    pub async fn run(&self, raw: Value) -> Result<NutritionAnalysis, AnalysisError> {
        let started = Instant::now();
        let (progress, stage) = watch::channel(Stage::Validating);

        let mut task = AbortOnDrop(tokio::spawn(run_stages(
            Arc::clone(&self.vision),
            Arc::clone(&self.nutrition),
            raw,
            progress,
        )));

        let outcome = match timeout(self.deadline, &mut task.0).await {
            Ok(Ok(result)) => result,
            Ok(Err(join_error)) => {
                error!("Pipeline task did not complete: {}", join_error);
                Err(AnalysisError::Internal(join_error.to_string()))
            }
            Err(_) => {
                let active = *stage.borrow();
                error!("Request timed out while {}", active);
                task.0.abort();
                // Wait until the stage future has actually been dropped
                let _ = (&mut task.0).await;
                Err(AnalysisError::Timeout(self.deadline))
            }
        };

        match &outcome {
            Ok(_) => info!("Analysis completed in {:?}", started.elapsed()),
            Err(e) => debug!("Analysis failed ({}) after {:?}", e.kind(), started.elapsed()),
        }
        outcome
    }
}

struct AbortOnDrop<T>(JoinHandle<T>);

impl<T> Drop for AbortOnDrop<T> {
    fn drop(&mut self) {
        self.0.abort();
    }
}

async fn run_stages(
    vision: Arc<dyn FoodVision>,
    nutrition: Arc<dyn NutritionStructurer>,
    raw: Value,
    progress: watch::Sender<Stage>,
) -> Result<NutritionAnalysis, AnalysisError> {
    let result = drive(vision.as_ref(), nutrition.as_ref(), &raw, &progress).await;

    if let Err(e) = &result {
        let failed_in = *progress.borrow();
        error!("Pipeline failed while {}: {}", failed_in, e);
        progress.send_replace(Stage::Failed(e.kind()));
    }
    result
}

async fn drive(
    vision: &dyn FoodVision,
    nutrition: &dyn NutritionStructurer,
    raw: &Value,
    progress: &watch::Sender<Stage>,
) -> Result<NutritionAnalysis, AnalysisError> {
    let advance = || {
        let next = progress.borrow().next();
        debug!("Pipeline stage: {}", next);
        progress.send_replace(next);
    };

    let request = validate_request(raw)?;
    info!("Analyzing food image: {}", request.image_url);
    advance();

    let description = vision.analyze(&request.image_url).await?;
    info!("Vision analysis completed");
    advance();

    let structured = nutrition.structure(&description).await?;
    info!("Nutrition structuring completed");
    advance();

    let analysis = validate_response(structured)?;
    advance();

    Ok(analysis)
}
