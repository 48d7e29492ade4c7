//! The black market: time-gated purchases from a finite stock.

use famiglia_protocol::{CreateOfferRequest, Offer, OfferId};
use famiglia_session::Identity;
use famiglia_store::{OfferStore, PlayerPatch, Storage, StoreError};
use serde::Serialize;
use tracing::{error, info};

use crate::game::{require_admin, require_stored_player};
use crate::gates::market_open;
use crate::{Game, GameError, Notifier};

/// An offer as listed to players.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct OfferView {
    #[serde(flatten)]
    pub offer: Offer,
    pub available: bool,
}

/// The market listing.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct OfferBoard {
    pub offers: Vec<OfferView>,
    pub market_open: bool,
    pub total: usize,
}

/// Result of a successful purchase.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PurchaseReceipt {
    pub success: bool,
    pub offer_id: OfferId,
    pub item_name: String,
    pub price: f64,
    pub new_balance: f64,
    pub remaining_quantity: u32,
}

impl<S: Storage, N: Notifier> Game<S, N> {
    /// Every offer, with whether the market is open right now.
    pub async fn offers(&self) -> Result<OfferBoard, GameError> {
        let offers: Vec<OfferView> = self
            .storage()
            .offers()
            .list_all()
            .await?
            .into_iter()
            .map(|offer| OfferView {
                available: offer.in_stock(),
                offer,
            })
            .collect();
        Ok(OfferBoard {
            total: offers.len(),
            market_open: market_open(self.now()),
            offers,
        })
    }

    /// Buys one unit of an offer.
    ///
    /// Stock is taken first with an atomic decrement, then the buyer is
    /// charged. If charging fails the unit goes back on the shelf.
    pub async fn purchase(
        &self,
        buyer: &Identity,
        offer_id: OfferId,
    ) -> Result<PurchaseReceipt, GameError> {
        if !market_open(self.now()) {
            return Err(GameError::MarketClosed);
        }
        let buyer_id = require_stored_player(buyer, "buy from the black market")?
            .player_id
            .clone()
            .ok_or_else(|| GameError::NotFound("player".into()))?;

        let player = self.require_player(&buyer_id).await?;
        if !player.alive {
            return Err(GameError::PlayerEliminated("make purchases"));
        }

        let offers = self.storage().offers();
        let offer = offers
            .get(offer_id)
            .await?
            .ok_or_else(|| GameError::NotFound(format!("offer {offer_id}")))?;
        if !offer.in_stock() {
            return Err(GameError::OutOfStock(offer_id));
        }
        if player.balance < offer.price {
            return Err(GameError::InsufficientFunds {
                needed: offer.price,
                available: player.balance,
            });
        }

        let taken = offers
            .decrement_quantity(offer_id, 1)
            .await
            .map_err(|e| match e {
                StoreError::InsufficientQuantity { .. } => GameError::OutOfStock(offer_id),
                other => other.into(),
            })?;

        let price = offer.price;
        let item_name = offer.item_name.clone();
        let charged = self
            .mutate_player(&buyer_id, |p| {
                if !p.alive {
                    return Err(GameError::PlayerEliminated("make purchases"));
                }
                if p.balance < price {
                    return Err(GameError::InsufficientFunds {
                        needed: price,
                        available: p.balance,
                    });
                }
                let mut items = p.items.clone();
                items.push(item_name.clone());
                Ok(PlayerPatch {
                    balance: Some(p.balance - price),
                    items: Some(items),
                    ..Default::default()
                })
            })
            .await;

        let player = match charged {
            Ok(player) => player,
            Err(e) => {
                if let Err(restock) = offers.increment_quantity(offer_id, 1).await {
                    error!(
                        offer_id = %offer_id,
                        error = %restock,
                        "failed to restock after aborted purchase"
                    );
                }
                return Err(e);
            }
        };

        info!(
            offer_id = %offer_id,
            player_id = %buyer_id,
            price,
            remaining = taken.quantity_available,
            "black market purchase"
        );
        Ok(PurchaseReceipt {
            success: true,
            offer_id,
            item_name: offer.item_name,
            price,
            new_balance: player.balance,
            remaining_quantity: taken.quantity_available,
        })
    }

    /// Every offer, including sold-out ones. Admin only.
    pub async fn all_offers(&self, caller: &Identity) -> Result<Vec<Offer>, GameError> {
        require_admin(caller)?;
        Ok(self.storage().offers().list_all().await?)
    }

    /// Puts a new item up for sale. Admin only.
    pub async fn create_offer(
        &self,
        caller: &Identity,
        req: CreateOfferRequest,
    ) -> Result<Offer, GameError> {
        require_admin(caller)?;
        if req.item_name.trim().is_empty() {
            return Err(GameError::InvalidRequest("item_name must not be empty".into()));
        }
        if !req.price.is_finite() || req.price < 0.0 {
            return Err(GameError::InvalidRequest(
                "price must be a non-negative number".into(),
            ));
        }
        let offer = self
            .storage()
            .offers()
            .append(Offer {
                offer_id: OfferId(0),
                item_name: req.item_name,
                description: req.description,
                price: req.price,
                quantity_available: req.quantity_available,
            })
            .await?;
        info!(offer_id = %offer.offer_id, item = %offer.item_name, "offer created");
        Ok(offer)
    }

    /// Withdraws an offer. Admin only.
    pub async fn delete_offer(&self, caller: &Identity, offer_id: OfferId) -> Result<(), GameError> {
        require_admin(caller)?;
        self.storage()
            .offers()
            .delete(offer_id)
            .await
            .map_err(|e| match e {
                StoreError::NotFound(_) => GameError::NotFound(format!("offer {offer_id}")),
                other => other.into(),
            })?;
        info!(offer_id = %offer_id, "offer deleted");
        Ok(())
    }
}
