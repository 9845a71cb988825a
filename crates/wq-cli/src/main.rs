//! wq-cli: a thin shell over the Operational Manager's four verbs.
//! Demonstrates the manager wired to an in-memory
//! `MockOrchestrator`; a real deployment would construct a
//! `DockerSwarmOrchestrator` pointed at its fleet instead.

use std::process::exit;
use std::sync::Arc;

use wq_core::WqError;
use wq_domain::{DeploymentConfig, IncidentSeverity, ScalingPolicy};
use wq_ops::OperationalManager;
use wq_orchestrator::MockOrchestrator;

fn main() {
    env_logger::init();
    let args: Vec<String> = std::env::args().collect();
    let result = tokio::runtime::Builder::new_multi_thread().enable_all()
                                                             .build()
                                                             .expect("failed to build tokio runtime")
                                                             .block_on(run(&args));
    match result {
        Ok(()) => exit(0),
        Err(e) => {
            eprintln!("error: {e}");
            exit(1);
        }
    }
}

async fn run(args: &[String]) -> Result<(), WqError> {
    let manager = OperationalManager::new(Arc::new(MockOrchestrator::new()));
    match args.get(1).map(String::as_str) {
        Some("deploy") => cmd_deploy(&manager, args.get(2)).await,
        Some("rollback") => cmd_rollback(&manager, args.get(2), args.get(3)).await,
        Some("scale") => cmd_scale(&manager, args.get(2)).await,
        Some("incident") => cmd_incident(&manager, args.get(2), args.get(3), args.get(4..)).await,
        _ => {
            eprintln!("usage: wq-cli <deploy|rollback|scale|incident> ...");
            Err(WqError::InvalidInput("no verb given".to_string()))
        }
    }
}

async fn cmd_deploy(manager: &OperationalManager, config_path: Option<&String>) -> Result<(), WqError> {
    let path = config_path.ok_or_else(|| WqError::InvalidInput("usage: wq-cli deploy <config.json>".to_string()))?;
    let raw = std::fs::read_to_string(path).map_err(|e| WqError::InvalidInput(format!("reading {path}: {e}")))?;
    let config: DeploymentConfig =
        serde_json::from_str(&raw).map_err(|e| WqError::InvalidInput(format!("parsing {path}: {e}")))?;
    let deployment = manager.deploy(&config).await?;
    println!("{}", serde_json::to_string_pretty(&deployment).expect("deployment is always serializable"));
    Ok(())
}

async fn cmd_rollback(manager: &OperationalManager, service_name: Option<&String>, image_tag: Option<&String>) -> Result<(), WqError> {
    let service_name = service_name.ok_or_else(|| WqError::InvalidInput("usage: wq-cli rollback <service_name> <image_tag>".to_string()))?;
    let image_tag = image_tag.ok_or_else(|| WqError::InvalidInput("usage: wq-cli rollback <service_name> <image_tag>".to_string()))?;
    let current = manager.service_info(service_name).await?
                          .ok_or_else(|| WqError::InvalidInput(format!("service {service_name} does not exist")))?;
    let config = DeploymentConfig { service_name: service_name.clone(),
                                     image_tag: image_tag.clone(),
                                     replicas: current.replicas,
                                     rolling_update_config: Default::default(),
                                     health_check_config: Default::default(),
                                     environment_variables: current.environment_variables,
                                     resource_limits: Default::default(),
                                     rollback_enabled: false,
                                     max_rollback_attempts: 0 };
    let deployment = manager.deploy(&config).await?;
    println!("{}", serde_json::to_string_pretty(&deployment).expect("deployment is always serializable"));
    Ok(())
}

async fn cmd_scale(manager: &OperationalManager, policy_path: Option<&String>) -> Result<(), WqError> {
    let path = policy_path.ok_or_else(|| WqError::InvalidInput("usage: wq-cli scale <policy.json>".to_string()))?;
    let raw = std::fs::read_to_string(path).map_err(|e| WqError::InvalidInput(format!("reading {path}: {e}")))?;
    let policy: ScalingPolicy = serde_json::from_str(&raw).map_err(|e| WqError::InvalidInput(format!("parsing {path}: {e}")))?;
    let result = manager.evaluate_scaling(&policy).await?;
    println!("{}", serde_json::to_string_pretty(&result).expect("scaling result is always serializable"));
    Ok(())
}

async fn cmd_incident(manager: &OperationalManager, service_name: Option<&String>, severity: Option<&String>,
                       description: Option<&[String]>)
                       -> Result<(), WqError> {
    let service_name = service_name.ok_or_else(|| incident_usage())?;
    let severity = severity.ok_or_else(|| incident_usage())?;
    let severity = match severity.as_str() {
        "low" => IncidentSeverity::Low,
        "medium" => IncidentSeverity::Medium,
        "high" => IncidentSeverity::High,
        "critical" => IncidentSeverity::Critical,
        other => return Err(WqError::InvalidInput(format!("unknown severity: {other}"))),
    };
    let description = description.filter(|d| !d.is_empty())
                                  .map(|d| d.join(" "))
                                  .ok_or_else(incident_usage)?;
    let response = manager.open_incident(service_name, severity, &description);
    println!("{}", serde_json::to_string_pretty(&response).expect("incident response is always serializable"));
    Ok(())
}

fn incident_usage() -> WqError {
    WqError::InvalidInput("usage: wq-cli incident <service_name> <low|medium|high|critical> <description...>".to_string())
}
