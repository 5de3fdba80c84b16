//! # mgw-cli: Developer CLI for the Mock Gateway
//!
//! ## Subcommands
//!
//! - `mgw validate`: load a gateway configuration and list what it serves.
//! - `mgw render`: evaluate one mapping template against a JSON context.
//! - `mgw token`: mint an HS256 development credential.
//! - `mgw presignup`: run the pre-sign-up hook on an event.
//!
//! ```bash
//! mgw validate --config config/gateway.yaml
//! mgw token --scope testResourceServer/test
//! mgw render --template response.vtl --context ctx.json
//! ```
//!
//! Every handler writes to the given output and returns the process exit
//! code: 0 on success, 1 when the input is rejected.

pub mod presignup;
pub mod render;
pub mod token;
pub mod validate;
