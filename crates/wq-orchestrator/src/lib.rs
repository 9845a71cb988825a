//! wq-orchestrator — `ServiceOrchestrator` implementations: an in-memory
//! mock for tests and a Docker Swarm-facing HTTP adapter.

pub mod docker_swarm;
pub mod mock;

pub use docker_swarm::DockerSwarmOrchestrator;
pub use mock::MockOrchestrator;
