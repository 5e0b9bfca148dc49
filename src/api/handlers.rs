//! REST API handlers for ledger operations
//!
//! The ledger sits behind a single `RwLock`: queries share the read side,
//! every mutation takes the write side for its whole duration.

use crate::api::websocket::{WsBroadcaster, WsEvent};
use crate::ledger::{Address, EventRecord, Ledger, LedgerError, LedgerEvent};
use crate::storage::Storage;
use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    Json,
};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tokio::sync::RwLock;

/// Shared application state for API handlers
#[derive(Clone)]
pub struct ApiState {
    pub ledger: Arc<RwLock<Ledger>>,
    pub storage: Arc<Storage>,
    pub ws_broadcaster: Arc<WsBroadcaster>,
}

impl ApiState {
    pub fn new(ledger: Ledger, storage: Storage) -> Self {
        Self {
            ledger: Arc::new(RwLock::new(ledger)),
            storage: Arc::new(storage),
            ws_broadcaster: Arc::new(WsBroadcaster::new()),
        }
    }
}

// ============================================================================
// Response Types
// ============================================================================

#[derive(Serialize)]
pub struct LedgerInfo {
    pub name: String,
    pub symbol: String,
    pub decimals: u8,
    pub owner: String,
    pub total_supply: String,
    pub holder_count: usize,
    pub denylisted_count: usize,
}

#[derive(Serialize)]
pub struct BalanceResponse {
    pub address: String,
    pub balance: String,
    pub denylisted: bool,
}

#[derive(Serialize)]
pub struct AllowanceResponse {
    pub owner: String,
    pub spender: String,
    pub allowance: String,
}

#[derive(Serialize)]
pub struct DenylistStatus {
    pub address: String,
    pub denylisted: bool,
}

#[derive(Serialize, Deserialize, Debug)]
pub struct ApiError {
    pub error: String,
}

type ApiResult<T> = Result<Json<T>, (StatusCode, Json<ApiError>)>;

// ============================================================================
// Request Types
// ============================================================================

#[derive(Deserialize)]
pub struct TransferRequest {
    pub caller: String,
    pub to: String,
    pub amount: String,
}

#[derive(Deserialize)]
pub struct ApproveRequest {
    pub caller: String,
    pub spender: String,
    pub amount: String,
}

#[derive(Deserialize)]
pub struct TransferFromRequest {
    pub caller: String,
    pub from: String,
    pub to: String,
    pub amount: String,
}

#[derive(Deserialize)]
pub struct BurnRequest {
    pub caller: String,
    pub amount: String,
}

#[derive(Deserialize)]
pub struct BurnFromRequest {
    pub caller: String,
    pub from: String,
    pub amount: String,
}

#[derive(Deserialize)]
pub struct MintRequest {
    pub caller: String,
    pub to: String,
    pub amount: String,
}

#[derive(Deserialize)]
pub struct DenylistRequest {
    pub caller: String,
    pub account: String,
}

#[derive(Deserialize)]
pub struct RetrieveRequest {
    pub caller: String,
    pub from: String,
    pub to: String,
    pub amount: String,
}

#[derive(Deserialize)]
pub struct OwnershipRequest {
    pub caller: String,
    pub new_owner: String,
}

#[derive(Deserialize)]
pub struct AllowanceQuery {
    pub owner: String,
    pub spender: String,
}

// ============================================================================
// Helpers
// ============================================================================

fn bad_request(error: String) -> (StatusCode, Json<ApiError>) {
    (StatusCode::BAD_REQUEST, Json(ApiError { error }))
}

fn parse_address(value: &str) -> Result<Address, (StatusCode, Json<ApiError>)> {
    value
        .parse()
        .map_err(|e| bad_request(format!("Invalid address {}: {}", value, e)))
}

fn parse_amount(value: &str) -> Result<u128, (StatusCode, Json<ApiError>)> {
    value
        .parse()
        .map_err(|_| bad_request("Invalid amount: must be a non-negative integer".to_string()))
}

/// Map a ledger rejection to an HTTP status
fn ledger_error(error: LedgerError) -> (StatusCode, Json<ApiError>) {
    let status = match &error {
        LedgerError::Unauthorized(_) => StatusCode::FORBIDDEN,
        e if e.is_denylist_violation() => StatusCode::FORBIDDEN,
        _ => StatusCode::BAD_REQUEST,
    };

    (
        status,
        Json(ApiError {
            error: error.to_string(),
        }),
    )
}

/// Run one mutation under the write lock, save, and broadcast its event.
///
/// A mutation that cannot be saved is rolled back and reported as a 500.
async fn apply<F>(state: &ApiState, operation: F) -> ApiResult<LedgerEvent>
where
    F: FnOnce(&mut Ledger) -> Result<LedgerEvent, LedgerError>,
{
    let event = {
        let mut ledger = state.ledger.write().await;
        let previous = ledger.clone();
        let event = operation(&mut *ledger).map_err(ledger_error)?;

        // Save ledger
        if let Err(e) = state.storage.save(&ledger) {
            log::error!("Failed to save ledger: {}", e);
            *ledger = previous;
            return Err((
                StatusCode::INTERNAL_SERVER_ERROR,
                Json(ApiError {
                    error: format!("Failed to save ledger: {}", e),
                }),
            ));
        }
        event
    };

    state.ws_broadcaster.broadcast(WsEvent::Ledger {
        event: event.clone(),
    });

    Ok(Json(event))
}

// ============================================================================
// Query Handlers
// ============================================================================

/// GET /health - Health check
pub async fn health_check() -> &'static str {
    "OK"
}

/// GET /api/ledger - Ledger info
pub async fn get_ledger_info(State(state): State<ApiState>) -> Json<LedgerInfo> {
    let ledger = state.ledger.read().await;

    Json(LedgerInfo {
        name: ledger.name().to_string(),
        symbol: ledger.symbol().to_string(),
        decimals: ledger.decimals(),
        owner: ledger.owner().to_string(),
        total_supply: ledger.total_supply().to_string(),
        holder_count: ledger.holder_count(),
        denylisted_count: ledger.denylist().len(),
    })
}

/// GET /api/balances/{address} - Get balance
pub async fn get_balance(
    State(state): State<ApiState>,
    Path(address): Path<String>,
) -> ApiResult<BalanceResponse> {
    let account = parse_address(&address)?;
    let ledger = state.ledger.read().await;

    Ok(Json(BalanceResponse {
        address: account.to_string(),
        balance: ledger.balance_of(&account).to_string(),
        denylisted: ledger.is_denylisted(&account),
    }))
}

/// GET /api/allowances?owner=..&spender=.. - Get allowance
pub async fn get_allowance(
    State(state): State<ApiState>,
    Query(query): Query<AllowanceQuery>,
) -> ApiResult<AllowanceResponse> {
    let owner = parse_address(&query.owner)?;
    let spender = parse_address(&query.spender)?;
    let ledger = state.ledger.read().await;

    Ok(Json(AllowanceResponse {
        owner: owner.to_string(),
        spender: spender.to_string(),
        allowance: ledger.allowance(&owner, &spender).to_string(),
    }))
}

/// GET /api/holders - Accounts with a positive balance
pub async fn get_holders(State(state): State<ApiState>) -> Json<Vec<BalanceResponse>> {
    let ledger = state.ledger.read().await;

    Json(
        ledger
            .holders()
            .into_iter()
            .map(|(account, balance)| BalanceResponse {
                address: account.to_string(),
                balance: balance.to_string(),
                denylisted: ledger.is_denylisted(&account),
            })
            .collect(),
    )
}

/// GET /api/denylist - List denylisted accounts
pub async fn list_denylist(State(state): State<ApiState>) -> Json<Vec<String>> {
    let ledger = state.ledger.read().await;

    Json(
        ledger
            .denylist()
            .accounts()
            .iter()
            .map(|a| a.to_string())
            .collect(),
    )
}

/// GET /api/denylist/{address} - Denylist membership
pub async fn get_denylist_status(
    State(state): State<ApiState>,
    Path(address): Path<String>,
) -> ApiResult<DenylistStatus> {
    let account = parse_address(&address)?;
    let ledger = state.ledger.read().await;

    Ok(Json(DenylistStatus {
        address: account.to_string(),
        denylisted: ledger.is_denylisted(&account),
    }))
}

/// GET /api/history - Recent events
pub async fn get_history(State(state): State<ApiState>) -> Json<Vec<EventRecord>> {
    let ledger = state.ledger.read().await;
    Json(ledger.history().cloned().collect())
}

// ============================================================================
// Mutation Handlers
// ============================================================================

/// POST /api/transfer - Transfer from the caller
pub async fn transfer(
    State(state): State<ApiState>,
    Json(req): Json<TransferRequest>,
) -> ApiResult<LedgerEvent> {
    let caller = parse_address(&req.caller)?;
    let to = parse_address(&req.to)?;
    let amount = parse_amount(&req.amount)?;

    apply(&state, move |ledger| ledger.transfer(&caller, &to, amount)).await
}

/// POST /api/approve - Set an allowance
pub async fn approve(
    State(state): State<ApiState>,
    Json(req): Json<ApproveRequest>,
) -> ApiResult<LedgerEvent> {
    let caller = parse_address(&req.caller)?;
    let spender = parse_address(&req.spender)?;
    let amount = parse_amount(&req.amount)?;

    apply(&state, move |ledger| ledger.approve(&caller, &spender, amount)).await
}

/// POST /api/transfer-from - Delegated transfer
pub async fn transfer_from(
    State(state): State<ApiState>,
    Json(req): Json<TransferFromRequest>,
) -> ApiResult<LedgerEvent> {
    let caller = parse_address(&req.caller)?;
    let from = parse_address(&req.from)?;
    let to = parse_address(&req.to)?;
    let amount = parse_amount(&req.amount)?;

    apply(&state, move |ledger| {
        ledger.transfer_from(&caller, &from, &to, amount)
    })
    .await
}

/// POST /api/burn - Burn the caller's funds
pub async fn burn(
    State(state): State<ApiState>,
    Json(req): Json<BurnRequest>,
) -> ApiResult<LedgerEvent> {
    let caller = parse_address(&req.caller)?;
    let amount = parse_amount(&req.amount)?;

    apply(&state, move |ledger| ledger.burn(&caller, amount)).await
}

/// POST /api/burn-from - Delegated burn
pub async fn burn_from(
    State(state): State<ApiState>,
    Json(req): Json<BurnFromRequest>,
) -> ApiResult<LedgerEvent> {
    let caller = parse_address(&req.caller)?;
    let from = parse_address(&req.from)?;
    let amount = parse_amount(&req.amount)?;

    apply(&state, move |ledger| ledger.burn_from(&caller, &from, amount)).await
}

/// POST /api/mint - Mint new funds (owner only)
pub async fn mint(
    State(state): State<ApiState>,
    Json(req): Json<MintRequest>,
) -> ApiResult<LedgerEvent> {
    let caller = parse_address(&req.caller)?;
    let to = parse_address(&req.to)?;
    let amount = parse_amount(&req.amount)?;

    apply(&state, move |ledger| ledger.mint(&caller, &to, amount)).await
}

/// POST /api/denylist/add - Add to denylist (owner only)
pub async fn add_to_denylist(
    State(state): State<ApiState>,
    Json(req): Json<DenylistRequest>,
) -> ApiResult<LedgerEvent> {
    let caller = parse_address(&req.caller)?;
    let account = parse_address(&req.account)?;

    apply(&state, move |ledger| ledger.add_to_denylist(&caller, &account)).await
}

/// POST /api/denylist/remove - Remove from denylist (owner only)
pub async fn remove_from_denylist(
    State(state): State<ApiState>,
    Json(req): Json<DenylistRequest>,
) -> ApiResult<LedgerEvent> {
    let caller = parse_address(&req.caller)?;
    let account = parse_address(&req.account)?;

    apply(&state, move |ledger| {
        ledger.remove_from_denylist(&caller, &account)
    })
    .await
}

/// POST /api/retrieve - Move funds out of a denylisted account (owner only)
pub async fn retrieve(
    State(state): State<ApiState>,
    Json(req): Json<RetrieveRequest>,
) -> ApiResult<LedgerEvent> {
    let caller = parse_address(&req.caller)?;
    let from = parse_address(&req.from)?;
    let to = parse_address(&req.to)?;
    let amount = parse_amount(&req.amount)?;

    apply(&state, move |ledger| {
        ledger.retrieve_from_denylist(&caller, &from, &to, amount)
    })
    .await
}

/// POST /api/ownership/transfer - Transfer ownership (owner only)
pub async fn transfer_ownership(
    State(state): State<ApiState>,
    Json(req): Json<OwnershipRequest>,
) -> ApiResult<LedgerEvent> {
    let caller = parse_address(&req.caller)?;
    let new_owner = parse_address(&req.new_owner)?;

    apply(&state, move |ledger| {
        ledger.transfer_ownership(&caller, &new_owner)
    })
    .await
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ledger::LedgerConfig;
    use crate::storage::StorageConfig;

    fn test_state(temp_dir: &tempfile::TempDir) -> ApiState {
        let ledger = Ledger::new(LedgerConfig::trd(
            Address::from_label("owner"),
            Address::from_label("first"),
            Address::from_label("second"),
        ))
        .unwrap();
        let storage = Storage::new(StorageConfig {
            data_dir: temp_dir.path().to_path_buf(),
            ..Default::default()
        })
        .unwrap();

        ApiState::new(ledger, storage)
    }

    fn label(name: &str) -> String {
        Address::from_label(name).to_string()
    }

    #[tokio::test]
    async fn test_transfer_and_balance() {
        let temp_dir = tempfile::tempdir().unwrap();
        let state = test_state(&temp_dir);

        let Json(event) = transfer(
            State(state.clone()),
            Json(TransferRequest {
                caller: label("first"),
                to: label("receiver"),
                amount: "800".to_string(),
            }),
        )
        .await
        .unwrap();

        assert_eq!(
            event,
            LedgerEvent::Transfer {
                from: Address::from_label("first"),
                to: Address::from_label("receiver"),
                amount: 800,
            }
        );

        let Json(balance) = get_balance(State(state.clone()), Path(label("receiver")))
            .await
            .unwrap();
        assert_eq!(balance.balance, "800");
        assert!(!balance.denylisted);
    }

    #[tokio::test]
    async fn test_non_owner_is_forbidden() {
        let temp_dir = tempfile::tempdir().unwrap();
        let state = test_state(&temp_dir);

        let (status, Json(error)) = mint(
            State(state.clone()),
            Json(MintRequest {
                caller: label("first"),
                to: label("receiver"),
                amount: "1".to_string(),
            }),
        )
        .await
        .unwrap_err();

        assert_eq!(status, StatusCode::FORBIDDEN);
        assert!(error.error.contains("Unauthorized"));
    }

    #[tokio::test]
    async fn test_denylisted_caller_is_forbidden() {
        let temp_dir = tempfile::tempdir().unwrap();
        let state = test_state(&temp_dir);

        add_to_denylist(
            State(state.clone()),
            Json(DenylistRequest {
                caller: label("owner"),
                account: label("first"),
            }),
        )
        .await
        .unwrap();

        let (status, _) = approve(
            State(state.clone()),
            Json(ApproveRequest {
                caller: label("first"),
                spender: label("receiver"),
                amount: "10".to_string(),
            }),
        )
        .await
        .unwrap_err();
        assert_eq!(status, StatusCode::FORBIDDEN);

        let Json(status) = get_denylist_status(State(state.clone()), Path(label("first")))
            .await
            .unwrap();
        assert!(status.denylisted);
    }

    #[tokio::test]
    async fn test_bad_input() {
        let temp_dir = tempfile::tempdir().unwrap();
        let state = test_state(&temp_dir);

        let (status, _) = burn(
            State(state.clone()),
            Json(BurnRequest {
                caller: "not-an-address".to_string(),
                amount: "1".to_string(),
            }),
        )
        .await
        .unwrap_err();
        assert_eq!(status, StatusCode::BAD_REQUEST);

        let (status, _) = burn(
            State(state.clone()),
            Json(BurnRequest {
                caller: label("first"),
                amount: "-1".to_string(),
            }),
        )
        .await
        .unwrap_err();
        assert_eq!(status, StatusCode::BAD_REQUEST);
    }

    #[tokio::test]
    async fn test_events_are_broadcast() {
        let temp_dir = tempfile::tempdir().unwrap();
        let state = test_state(&temp_dir);
        let mut rx = state.ws_broadcaster.subscribe();

        burn(
            State(state.clone()),
            Json(BurnRequest {
                caller: label("second"),
                amount: "5".to_string(),
            }),
        )
        .await
        .unwrap();

        match rx.recv().await.unwrap() {
            WsEvent::Ledger { event } => assert_eq!(
                event,
                LedgerEvent::Transfer {
                    from: Address::from_label("second"),
                    to: Address::ZERO,
                    amount: 5,
                }
            ),
            other => panic!("unexpected event: {:?}", other),
        }
    }

    #[tokio::test]
    async fn test_allowance_query() {
        let temp_dir = tempfile::tempdir().unwrap();
        let state = test_state(&temp_dir);

        approve(
            State(state.clone()),
            Json(ApproveRequest {
                caller: label("first"),
                spender: label("second"),
                amount: "42".to_string(),
            }),
        )
        .await
        .unwrap();

        let Json(allowance) = get_allowance(
            State(state.clone()),
            Query(AllowanceQuery {
                owner: label("first"),
                spender: label("second"),
            }),
        )
        .await
        .unwrap();
        assert_eq!(allowance.allowance, "42");
    }

    #[tokio::test]
    async fn test_holders_listing() {
        let temp_dir = tempfile::tempdir().unwrap();
        let state = test_state(&temp_dir);

        add_to_denylist(
            State(state.clone()),
            Json(DenylistRequest {
                caller: label("owner"),
                account: label("second"),
            }),
        )
        .await
        .unwrap();

        let Json(holders) = get_holders(State(state.clone())).await;
        assert_eq!(holders.len(), 2);

        let second = holders
            .iter()
            .find(|h| h.address == label("second"))
            .unwrap();
        assert!(second.denylisted);
        assert_eq!(second.balance, "7800000000000000000000000000");
    }

    #[tokio::test]
    async fn test_unsaved_mutation_is_rolled_back() {
        let temp_dir = tempfile::tempdir().unwrap();
        let state = test_state(&temp_dir);
        let mut rx = state.ws_broadcaster.subscribe();
        let before = state.ledger.read().await.balance_of(&Address::from_label("first"));

        // Snapshot writes fail once the data directory is gone
        std::fs::remove_dir_all(temp_dir.path()).unwrap();

        let (status, Json(error)) = transfer(
            State(state.clone()),
            Json(TransferRequest {
                caller: label("first"),
                to: label("receiver"),
                amount: "800".to_string(),
            }),
        )
        .await
        .unwrap_err();

        assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
        assert!(error.error.contains("Failed to save ledger"));

        let ledger = state.ledger.read().await;
        assert_eq!(ledger.balance_of(&Address::from_label("first")), before);
        assert_eq!(ledger.balance_of(&Address::from_label("receiver")), 0);
        assert!(rx.try_recv().is_err());
    }
}
