//! Registry trait for self-registering implementations.
//!
//! Account and delivery implementations each expose a `Registry` struct so the
//! binary can map the names used in configuration files to factory functions.

/// Base trait for implementation registries.
pub trait ImplementationRegistry {
	/// The name used in configuration files to reference this implementation.
	///
	/// For example `"local"` for `[account.implementations.local]` or
	/// `"json_rpc"` for the HTTP node client.
	const NAME: &'static str;

	/// The factory function type this implementation provides.
	type Factory;

	/// Get the factory function for this implementation.
	fn factory() -> Self::Factory;
}
