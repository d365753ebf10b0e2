pub mod feedback;
pub mod form;
pub mod prelude;
pub mod provider;

pub use provider::{ArenaProvider, ProviderScope, ToastHost, try_use_toasts, use_toasts};

#[cfg(test)]
mod test_public_api;
