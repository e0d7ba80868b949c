//! # wiki-edit-mcp
//!
//! MCP (Model Context Protocol) server that lets an AI assistant create or
//! edit pages on a MediaWiki wiki through the Action API.
//!
//! ## Features
//!
//! - **MCP-compliant**: Implements JSON-RPC 2.0 over stdio (standard MCP transport)
//! - **Single tool**: `edit_page` replaces or appends page wikitext
//! - **Optional login**: edits anonymously unless credentials are supplied
//! - **Isolated sessions**: every edit gets its own cookie store
//!
//! ## Edit flow
//!
//! 1. With credentials: fetch a login token, then `action=login`
//! 2. Fetch a CSRF token
//! 3. `action=edit`, returning the wiki's JSON response unchanged
//!
//! ## Usage with VS Code
//!
//! Add to your `.vscode/mcp.json`:
//!
//! ```json
//! {
//!   "servers": {
//!     "wiki": {
//!       "command": "wiki-edit-mcp",
//!       "env": { "WIKI_API_ENDPOINT": "https://test2.wikipedia.org/w/api.php" }
//!     }
//!   }
//! }
//! ```

#![warn(missing_docs)]
#![warn(clippy::all)]

pub mod config;
pub mod cookies;
pub mod error;
pub mod protocol;
pub mod server;
pub mod tools;
pub mod wiki;

pub use config::WikiConfig;
pub use cookies::CookieStore;
pub use error::{Error, Result};
pub use protocol::{JsonRpcRequest, JsonRpcResponse, McpMessage};
pub use server::McpServer;
pub use tools::{Tool, ToolRegistry};
pub use wiki::{EditRequest, WikiClient};
