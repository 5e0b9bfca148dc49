//! REST API module
//!
//! Hosts a single ledger behind HTTP. Callers identify themselves with the
//! `caller` field of each request; amounts are decimal strings.
//!
//! # Endpoints
//!
//! ## Queries
//! - `GET /api/ledger` - Name, symbol, owner and supply
//! - `GET /api/balances/{address}` - Balance and denylist status
//! - `GET /api/allowances?owner=..&spender=..` - Allowance
//! - `GET /api/holders` - Accounts with a positive balance
//! - `GET /api/denylist` - Denylisted accounts
//! - `GET /api/denylist/{address}` - Denylist membership
//! - `GET /api/history` - Recent events
//!
//! ## Mutations
//! - `POST /api/transfer`, `/api/approve`, `/api/transfer-from`
//! - `POST /api/burn`, `/api/burn-from`
//! - `POST /api/mint`, `/api/denylist/add`, `/api/denylist/remove`,
//!   `/api/retrieve`, `/api/ownership/transfer` (owner only)
//!
//! ## WebSocket
//! - `GET /ws` - Every ledger event as it happens

pub mod handlers;
pub mod routes;
pub mod websocket;

pub use handlers::ApiState;
pub use routes::create_router;
pub use websocket::{WsBroadcaster, WsEvent};
