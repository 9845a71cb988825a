//! wq-policies — pure decision functions consumed by `wq-ops`: scaling
//! direction/amount and incident classification/handling.
//! Nothing here touches the network, the clock, or a database; that
//! keeps these rules exhaustively unit-testable and lets `wq-ops` own all
//! the stateful plumbing (cooldowns, histories, the orchestrator client).

pub mod incident;
pub mod scaling;

pub use incident::{classify, handle};
pub use scaling::decide_scaling;
