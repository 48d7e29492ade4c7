//! Player-to-player money transfers and the public ledger.

use famiglia_protocol::{PlayerId, TradeRecord, TransferMoneyRequest};
use famiglia_session::Identity;
use famiglia_store::{PlayerPatch, PlayerStore, Storage, TradeStore};
use serde::Serialize;
use tracing::{error, info};

use crate::game::{require_admin, require_stored_player};
use crate::{Game, GameError, Notifier};

/// Result of a successful transfer.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TransferReceipt {
    pub success: bool,
    pub trade_id: u64,
    pub from_player: String,
    pub to_player: String,
    pub amount: f64,
    pub new_balance: f64,
}

impl<S: Storage, N: Notifier> Game<S, N> {
    /// Moves money from the caller to another player.
    ///
    /// The sender is debited first (with a funds check on the fresh
    /// record), then the recipient is credited. If the credit fails the
    /// sender is refunded before the error is returned.
    pub async fn transfer(
        &self,
        sender: &Identity,
        req: TransferMoneyRequest,
    ) -> Result<TransferReceipt, GameError> {
        let amount = req.amount;
        if !amount.is_finite() || amount <= 0.0 {
            return Err(GameError::InvalidRequest("amount must be positive".into()));
        }
        let from_id = require_stored_player(sender, "transfer money")?
            .player_id
            .clone()
            .ok_or_else(|| GameError::NotFound("player".into()))?;
        if req.to_player_id == from_id {
            return Err(GameError::InvalidRequest(
                "cannot transfer money to yourself".into(),
            ));
        }

        let from = self.require_player(&from_id).await?;
        if !from.alive {
            return Err(GameError::PlayerEliminated("make transfers"));
        }
        let to = self
            .storage()
            .players()
            .get_by_id(&req.to_player_id)
            .await?
            .ok_or_else(|| GameError::NotFound("recipient".into()))?;
        if !to.alive {
            return Err(GameError::InvalidRequest(
                "cannot transfer to an eliminated player".into(),
            ));
        }
        if from.balance < amount {
            return Err(GameError::InsufficientFunds {
                needed: amount,
                available: from.balance,
            });
        }

        let debited = self
            .mutate_player(&from_id, |p| {
                if !p.alive {
                    return Err(GameError::PlayerEliminated("make transfers"));
                }
                if p.balance < amount {
                    return Err(GameError::InsufficientFunds {
                        needed: amount,
                        available: p.balance,
                    });
                }
                Ok(PlayerPatch {
                    balance: Some(p.balance - amount),
                    ..Default::default()
                })
            })
            .await?;

        let credit = self
            .mutate_player(&req.to_player_id, |p| {
                Ok(PlayerPatch {
                    balance: Some(p.balance + amount),
                    trades_completed: Some(p.stats.trades_completed + 1),
                    ..Default::default()
                })
            })
            .await;
        if let Err(e) = credit {
            self.refund(&from_id, amount).await;
            return Err(e);
        }

        let trade = self
            .storage()
            .trades()
            .append(TradeRecord {
                trade_id: 0,
                from_player: from_id.clone(),
                to_player: req.to_player_id.clone(),
                amount,
                item: "money".to_string(),
                message: req.message,
                timestamp: self.now(),
            })
            .await
            .inspect_err(|e| {
                error!(from = %from_id, to = %req.to_player_id, amount, error = %e, "transfer done but not recorded");
            })?;

        info!(
            trade_id = trade.trade_id,
            from = %from_id,
            to = %req.to_player_id,
            amount,
            "money transferred"
        );
        Ok(TransferReceipt {
            success: true,
            trade_id: trade.trade_id,
            from_player: from.name,
            to_player: to.name,
            amount,
            new_balance: debited.balance,
        })
    }

    async fn refund(&self, id: &PlayerId, amount: f64) {
        let refunded = self
            .mutate_player(id, |p| {
                Ok(PlayerPatch {
                    balance: Some(p.balance + amount),
                    ..Default::default()
                })
            })
            .await;
        if let Err(e) = refunded {
            error!(player_id = %id, amount, error = %e, "refund after failed transfer did not apply");
        }
    }

    /// Trades the caller sent or received.
    pub async fn trade_history(&self, caller: &Identity) -> Result<Vec<TradeRecord>, GameError> {
        let me = caller.player_id();
        Ok(self
            .storage()
            .trades()
            .list_all()
            .await?
            .into_iter()
            .filter(|t| t.involves(&me))
            .collect())
    }

    /// The full ledger. Admin only.
    pub async fn all_trades(&self, caller: &Identity) -> Result<Vec<TradeRecord>, GameError> {
        require_admin(caller)?;
        Ok(self.storage().trades().list_all().await?)
    }
}
