use carprice::config::TrainingConfig;
use carprice::training::run_training;
use log::{error, info};

fn main() {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    let config = TrainingConfig::default();
    match run_training(&config) {
        Ok(report) => {
            info!(
                "Best parameters: {} (mean CV score {:.6})",
                report.best_params, report.best_score
            );
            info!("Model written to {}", config.model_path().display());
            info!("Metrics written to {}", config.metrics_path().display());
        }
        Err(e) => {
            error!("Training failed: {}", e);
            std::process::exit(1);
        }
    }
}
