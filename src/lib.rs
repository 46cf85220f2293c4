//! Student CGPA store keyed by a direct-addressed index derived from the
//! student id, plus the reports computed over it.

use std::path::Path;

use tracing::{info, warn};

pub mod config;
pub mod loader;
pub mod output;
pub mod prompts;
pub mod reports;
pub mod store;
pub mod student;

use config::StoreConfig;
use prompts::Prompt;
use reports::Window;
use store::RecordStore;

/// Loads the records, answers every prompt in order, then appends the
/// department statistics.
pub fn run(config: StoreConfig, input: &Path, prompts: &Path, output: &Path) -> RecordStore {
    let window = Window::from_config(&config);
    let delimiter = config.delimiter.clone();
    let lock = config.lock_output;
    let trigger = config.hall_of_fame_trigger.clone();

    let mut store = RecordStore::new(config);
    loader::run(input, &mut store);

    for prompt in prompts::read(prompts, &trigger) {
        let written = match prompt {
            Prompt::HallOfFame => {
                let report = reports::hall_of_fame(&store, window);
                info!(entries = report.entries.len(), eligible = report.eligible, "hall of fame");
                output::write_truncating(output, &output::render_hall_of_fame(&report, &delimiter), lock)
            }
            Prompt::NewCourse { label, low, high } => {
                let report = reports::new_course(&store, window, &label, low, high);
                info!(label = %label, entries = report.entries.len(), "new course candidates");
                output::append(output, &output::render_new_course(&report, &delimiter))
            }
        };
        if let Err(err) = written {
            warn!(error = %err, "failed to write report");
        }
    }

    let stats = reports::department_stats(&store);
    info!(departments = stats.len(), "department stats");
    if let Err(err) = output::append(output, &output::render_department_stats(&stats, &delimiter)) {
        warn!(error = %err, "failed to write report");
    }
    store
}
