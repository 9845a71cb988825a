//! wq-worker: process entry point for a single worker instance. Builds its
//! collaborators once and never reconstructs them per batch: wires the
//! Config Resolver, Database Manager, Distributed Processor, and Flow
//! Template together and runs one batch per invocation, or continuously
//! with `--loop`.

use std::sync::Arc;

use wq_config::{ConfigResolver, EnvConfigSource};
use wq_core::exec::TaskPool;
use wq_db::DatabaseManager;
use wq_processor::DistributedProcessor;

fn main() {
    env_logger::init();
    let args: Vec<String> = std::env::args().collect();
    let flow_name = args.get(1).cloned().unwrap_or_else(|| "default".to_string());
    let run_forever = args.iter().any(|a| a == "--loop");

    if let Err(e) = run(&flow_name, run_forever) {
        eprintln!("wq-worker: {e}");
        std::process::exit(1);
    }
}

fn run(flow_name: &str, run_forever: bool) -> Result<(), wq_core::WqError> {
    let environment = std::env::var("WQ_ENVIRONMENT").unwrap_or_else(|_| "dev".to_string());
    let config = ConfigResolver::new(environment, vec![Box::new(EnvConfigSource)]);
    let distributed_config = config.get_distributed_config(Some(flow_name))?;

    let primary = DatabaseManager::new("primary")?;
    let processor = Arc::new(DistributedProcessor::new("worker", primary));
    let pool = TaskPool::new(num_cpus());

    loop {
        let summary = wq_flow::run_batch(&processor, &pool, flow_name, distributed_config.default_batch_size, echo_business_fn)?;
        log::info!("batch summary: {}", serde_json::to_string(&summary).expect("summary is always serializable"));

        if !run_forever || summary.records_claimed == 0 {
            break;
        }
    }
    Ok(())
}

/// Placeholder business function: the real one is injected by whatever
/// deploys this worker; that injected logic is out of scope here.
/// Echoes the payload back unchanged so the wiring is exercisable without
/// a real workload.
fn echo_business_fn(payload: &serde_json::Value) -> Result<serde_json::Value, String> {
    Ok(payload.clone())
}

fn num_cpus() -> usize {
    std::thread::available_parallelism().map(|n| n.get()).unwrap_or(4)
}
