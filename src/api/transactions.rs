// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! Stored transaction listing.

use axum::{
    extract::{Path, State},
    Json,
};

use super::extract::ApiQuery;
use super::wallets::resolve_wallet;
use crate::{
    error::ApiError,
    models::{PageQuery, TransactionPage},
    state::AppState,
};

/// List a registered wallet's stored transactions, newest first.
///
/// Ties on timestamp are ordered by transaction hash. Pages past the end are
/// empty but still report the total.
#[utoipa::path(
    get,
    path = "/wallet/{address}/transactions",
    tag = "Transactions",
    params(
        ("address" = String, Path, description = "Wallet address"),
        PageQuery
    ),
    responses(
        (status = 200, description = "One page of transactions", body = TransactionPage),
        (status = 400, description = "Invalid address"),
        (status = 404, description = "Wallet not registered"),
        (status = 422, description = "Invalid pagination")
    )
)]
pub async fn list_wallet_transactions(
    State(state): State<AppState>,
    Path(address): Path<String>,
    ApiQuery(query): ApiQuery<PageQuery>,
) -> Result<Json<TransactionPage>, ApiError> {
    let (page, page_size) = query.resolve()?;

    let page = state
        .db
        .blocking(move |db| {
            let (wallet, _network) = resolve_wallet(db, &address, query.network.as_deref())?;
            Ok::<_, ApiError>(db.list_transactions(wallet.wallet_id, page, page_size)?)
        })
        .await?;

    Ok(Json(TransactionPage::from(page)))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::normalizer::to_transaction_items;
    use crate::storage::{Direction, NewWallet};
    use crate::sync::upsert_transactions;
    use crate::testing::{raw_tx, test_state, WALLET};
    use axum::http::StatusCode;

    async fn list(
        state: &AppState,
        page: i64,
        page_size: i64,
    ) -> Result<Json<TransactionPage>, ApiError> {
        let query = PageQuery {
            page: Some(page),
            page_size: Some(page_size),
            network: None,
        };
        list_wallet_transactions(State(state.clone()), Path(WALLET.to_string()), ApiQuery(query))
            .await
    }

    fn seed(state: &AppState, count: i64) {
        let network = state.db.first_network().unwrap().unwrap();
        let user = state.db.get_or_create_user("bob").unwrap();
        let wallet = state
            .db
            .create_wallet(NewWallet {
                user_id: user.user_id,
                network_id: network.network_id,
                address: WALLET.to_string(),
                label: Some("hot".to_string()),
            })
            .unwrap();

        let raw: Vec<_> = (1..=count)
            .map(|ts| serde_json::from_value(raw_tx(ts, 1, "0")).unwrap())
            .collect();
        let items = to_transaction_items(&raw, WALLET).unwrap();
        upsert_transactions(&state.db, &wallet, &items).unwrap();
    }

    #[tokio::test]
    async fn pages_newest_first() {
        let (state, _dir) = test_state("http://127.0.0.1:9/v2/api");
        seed(&state, 25);

        let Json(first) = list(&state, 1, 20).await.unwrap();
        assert_eq!(first.total, 25);
        assert_eq!(first.page_size, 20);
        assert_eq!(first.items.len(), 20);
        assert_eq!(first.items[0].block_number, 100_025);
        assert_eq!(first.items[0].direction, Direction::Out);
        assert_eq!(first.items[0].tx_fee_eth, 0.0);

        let Json(second) = list(&state, 2, 20).await.unwrap();
        assert_eq!(second.items.len(), 5);
        assert_eq!(second.items[4].block_number, 100_001);

        let Json(beyond) = list(&state, 9, 20).await.unwrap();
        assert!(beyond.items.is_empty());
        assert_eq!(beyond.total, 25);
    }

    #[tokio::test]
    async fn invalid_pagination_is_422() {
        let (state, _dir) = test_state("http://127.0.0.1:9/v2/api");
        seed(&state, 1);

        for (page, size) in [(0, 20), (1, 0), (1, 101)] {
            let err = list(&state, page, size).await.unwrap_err();
            assert_eq!(err.status, StatusCode::UNPROCESSABLE_ENTITY);
        }
    }

    #[tokio::test]
    async fn unregistered_wallet_is_404() {
        let (state, _dir) = test_state("http://127.0.0.1:9/v2/api");
        let err = list(&state, 1, 20).await.unwrap_err();
        assert_eq!(err.status, StatusCode::NOT_FOUND);
    }
}
