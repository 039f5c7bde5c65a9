//! Engine services: the state machine choke points, stock reconciler,
//! notification dispatcher, no-show processor, and error recovery
//! coordinator.

pub mod no_show;
pub mod notifier;
pub mod orders;
pub mod recovery;
pub mod stock;
