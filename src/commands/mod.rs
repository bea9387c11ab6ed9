//! Command implementations behind the CLI subcommands.
//!
//! Each command resolves the configuration it needs up front, builds its
//! services, and prints its result. The `record_entry` / `request_subscription`
//! halves are generic over the service traits so they can run against mocks.

mod entries;
mod submit;
mod subscribe;

pub use entries::{entries, format_entry};
pub use submit::{record_entry, submit, validate_text};
pub use subscribe::{request_subscription, subscribe, subscription_success};
