//! Intent registry and dispatcher.

pub mod dispatcher;
pub mod registry;

pub use dispatcher::{Dispatcher, DispatcherBuilder};
pub use registry::{HandlerKind, Intent, IntentDescriptor, Phase, Registry, RegistryError};
