//! Pharmacy catalogue, stock, purchase intents, and goods receipt.

use std::collections::BTreeSet;
use std::sync::Arc;

use mockable::Clock;
use pagination::PageRequest;
use serde_json::json;
use tracing::{info, warn};

use crate::domain::ports::{
    GrnFilter, GrnRepository, IntentFilter, IntentRepository, ListSlice, ProductFilter,
    ProductRepository, SequenceGenerator, StockRepository,
};
use crate::domain::service_support::{
    duplicate, map_repository_error, map_stock_error, next_document_number, not_found,
};
use crate::domain::validation::field_value_error;
use crate::domain::{
    Error, Grn, GrnDraft, GrnId, Intent, IntentDraft, IntentId, IntentItem, IntentStatus,
    Product, ProductDraft, ProductId, SequenceKind, StockBatch, StockSummary,
};

/// Pharmacy back-office service.
#[derive(Clone)]
pub struct PharmacyService {
    products: Arc<dyn ProductRepository>,
    stock: Arc<dyn StockRepository>,
    intents: Arc<dyn IntentRepository>,
    grns: Arc<dyn GrnRepository>,
    sequences: Arc<dyn SequenceGenerator>,
    clock: Arc<dyn Clock>,
}

impl PharmacyService {
    /// Create the service. `products` is normally the cached adapter.
    pub fn new(
        products: Arc<dyn ProductRepository>,
        stock: Arc<dyn StockRepository>,
        intents: Arc<dyn IntentRepository>,
        grns: Arc<dyn GrnRepository>,
        sequences: Arc<dyn SequenceGenerator>,
        clock: Arc<dyn Clock>,
    ) -> Self {
        Self {
            products,
            stock,
            intents,
            grns,
            sequences,
            clock,
        }
    }

    // Products

    /// Add a catalogue entry with a unique name.
    pub async fn create_product(&self, draft: ProductDraft) -> Result<Product, Error> {
        self.ensure_product_name_free(&draft.name, None).await?;
        let product = Product {
            id: ProductId::random(),
            name: draft.name,
            generic_name: draft.generic_name,
            manufacturer: draft.manufacturer,
            unit: draft.unit,
            reorder_level: draft.reorder_level,
            is_active: true,
            created_at: self.clock.utc(),
        };
        self.products
            .create(&product)
            .await
            .map_err(|e| map_repository_error("product", e))?;
        info!(product_id = %product.id, name = %product.name, "product created");
        Ok(product)
    }

    /// Replace catalogue fields.
    pub async fn update_product(
        &self,
        id: ProductId,
        draft: ProductDraft,
    ) -> Result<Product, Error> {
        let mut product = self.product(id).await?;
        self.ensure_product_name_free(&draft.name, Some(id)).await?;
        product.apply(draft);
        self.save_product(&product).await?;
        info!(product_id = %id, "product updated");
        Ok(product)
    }

    /// Withdraw a product from ordering and sale.
    pub async fn deactivate_product(&self, id: ProductId) -> Result<Product, Error> {
        let mut product = self.product(id).await?;
        product.is_active = false;
        self.save_product(&product).await?;
        info!(product_id = %id, "product deactivated");
        Ok(product)
    }

    /// Fetch one product.
    pub async fn product(&self, id: ProductId) -> Result<Product, Error> {
        self.products
            .find(id)
            .await
            .map_err(|e| map_repository_error("product", e))?
            .ok_or_else(|| not_found("product", id))
    }

    /// Search the catalogue.
    pub async fn list_products(
        &self,
        filter: &ProductFilter,
        page: PageRequest,
    ) -> Result<ListSlice<Product>, Error> {
        self.products
            .list(filter, page)
            .await
            .map_err(|e| map_repository_error("product", e))
    }

    /// Available and expired units for a product with its batches by expiry.
    pub async fn stock_summary(&self, id: ProductId) -> Result<StockSummary, Error> {
        self.product(id).await?;
        let batches = self.stock.batches_for(id).await.map_err(map_stock_error)?;
        Ok(StockSummary::new(id, batches, self.clock.utc().date_naive()))
    }

    async fn save_product(&self, product: &Product) -> Result<(), Error> {
        self.products
            .update(product)
            .await
            .map_err(|e| map_repository_error("product", e))
    }

    async fn ensure_product_name_free(
        &self,
        name: &str,
        except: Option<ProductId>,
    ) -> Result<(), Error> {
        let existing = self
            .products
            .find_by_name(name)
            .await
            .map_err(|e| map_repository_error("product", e))?;
        match existing {
            Some(found) if Some(found.id) != except => Err(duplicate("product", "name", name)),
            _ => Ok(()),
        }
    }

    async fn require_products(
        &self,
        field: &str,
        ids: impl IntoIterator<Item = ProductId>,
    ) -> Result<(), Error> {
        for id in ids.into_iter().collect::<BTreeSet<_>>() {
            let found = self
                .products
                .find(id)
                .await
                .map_err(|e| map_repository_error("product", e))?;
            if found.is_none() {
                return Err(field_value_error(
                    field,
                    "unknown_product",
                    id.to_string(),
                    "product does not exist",
                ));
            }
        }
        Ok(())
    }

    // Intents

    /// Raise a purchase intent.
    pub async fn create_intent(&self, draft: IntentDraft) -> Result<Intent, Error> {
        self.require_products("items.productId", draft.items.iter().map(|(id, _)| *id))
            .await?;
        let number = next_document_number(self.sequences.as_ref(), SequenceKind::Intent).await?;
        let intent = Intent {
            id: IntentId::random(),
            number,
            items: draft
                .items
                .into_iter()
                .map(|(product_id, quantity_requested)| IntentItem {
                    product_id,
                    quantity_requested,
                    quantity_received: 0,
                })
                .collect(),
            status: IntentStatus::Pending,
            note: draft.note,
            created_at: self.clock.utc(),
        };
        self.intents
            .create(&intent)
            .await
            .map_err(|e| map_repository_error("intent", e))?;
        info!(intent_id = %intent.id, number = %intent.number, "intent raised");
        Ok(intent)
    }

    /// Cancel a pending intent.
    pub async fn cancel_intent(&self, id: IntentId) -> Result<Intent, Error> {
        let read = self.intent(id).await?;
        let mut intent = read.clone();
        if let Err(error) = intent.cancel() {
            warn!(intent_id = %id, status = %intent.status, "intent cancel rejected");
            return Err(error);
        }
        self.intents
            .update(&read, &intent)
            .await
            .map_err(|e| map_repository_error("intent", e))?;
        info!(intent_id = %id, number = %intent.number, "intent cancelled");
        Ok(intent)
    }

    /// Fetch one intent.
    pub async fn intent(&self, id: IntentId) -> Result<Intent, Error> {
        self.intents
            .find(id)
            .await
            .map_err(|e| map_repository_error("intent", e))?
            .ok_or_else(|| not_found("intent", id))
    }

    /// List intents.
    pub async fn list_intents(
        &self,
        filter: &IntentFilter,
        page: PageRequest,
    ) -> Result<ListSlice<Intent>, Error> {
        self.intents
            .list(filter, page)
            .await
            .map_err(|e| map_repository_error("intent", e))
    }

    // Goods receipt

    /// Receive goods: credit the intent when one is referenced, then record
    /// the GRN and shelve one batch per line. The intent is credited first
    /// so a concurrent change to it rejects the receipt before anything is
    /// stored.
    pub async fn receive_grn(&self, draft: GrnDraft) -> Result<Grn, Error> {
        let now = self.clock.utc();
        self.require_products("items.productId", draft.items.iter().map(|i| i.product_id))
            .await?;
        let intent = match draft.intent_id {
            Some(intent_id) => Some(self.receivable_intent(intent_id, &draft).await?),
            None => None,
        };

        let number = next_document_number(self.sequences.as_ref(), SequenceKind::Grn).await?;
        let grn = Grn {
            id: GrnId::random(),
            number,
            supplier_name: draft.supplier_name,
            invoice_number: draft.invoice_number,
            intent_id: draft.intent_id,
            items: draft.items,
            total_cost: draft.total_cost,
            received_at: now,
        };
        let batches: Vec<StockBatch> = grn
            .items
            .iter()
            .map(|item| StockBatch {
                id: item.batch_id,
                product_id: item.product_id,
                batch_number: item.batch_number.clone(),
                expiry_date: item.expiry_date,
                mrp: item.mrp,
                purchase_price: item.purchase_price,
                quantity_available: item.units_received(),
                grn_id: grn.id,
                received_at: now,
            })
            .collect();

        if let Some(read) = intent {
            let mut intent = read.clone();
            intent.record_receipt(
                grn.items
                    .iter()
                    .map(|item| (item.product_id, item.units_received())),
            );
            self.intents
                .update(&read, &intent)
                .await
                .map_err(|e| map_repository_error("intent", e))?;
            info!(intent_id = %intent.id, status = %intent.status, "intent credited");
        }
        self.grns
            .create(&grn)
            .await
            .map_err(|e| map_repository_error("grn", e))?;
        self.stock
            .insert_batches(&batches)
            .await
            .map_err(map_stock_error)?;
        info!(
            grn_id = %grn.id,
            number = %grn.number,
            batches = batches.len(),
            total_cost = grn.total_cost.minor(),
            "goods received"
        );
        Ok(grn)
    }

    async fn receivable_intent(&self, id: IntentId, draft: &GrnDraft) -> Result<Intent, Error> {
        let intent = self
            .intents
            .find(id)
            .await
            .map_err(|e| map_repository_error("intent", e))?
            .ok_or_else(|| {
                field_value_error(
                    "intentId",
                    "unknown_intent",
                    id.to_string(),
                    "intent does not exist",
                )
            })?;
        if !intent.accepts_receipts() {
            warn!(
                intent_id = %id,
                status = %intent.status,
                "receipt against closed intent rejected"
            );
            return Err(
                Error::conflict(format!("intent {} is {}", intent.number, intent.status))
                    .with_details(json!({ "intentId": id, "status": intent.status })),
            );
        }
        let requested = intent.products();
        if let Some(stray) = draft
            .items
            .iter()
            .find(|item| !requested.contains(&item.product_id))
        {
            return Err(field_value_error(
                "items.productId",
                "not_on_intent",
                stray.product_id.to_string(),
                "product is not on the referenced intent",
            ));
        }
        Ok(intent)
    }

    /// Fetch one GRN.
    pub async fn grn(&self, id: GrnId) -> Result<Grn, Error> {
        self.grns
            .find(id)
            .await
            .map_err(|e| map_repository_error("grn", e))?
            .ok_or_else(|| not_found("grn", id))
    }

    /// List GRNs.
    pub async fn list_grns(
        &self,
        filter: &GrnFilter,
        page: PageRequest,
    ) -> Result<ListSlice<Grn>, Error> {
        self.grns
            .list(filter, page)
            .await
            .map_err(|e| map_repository_error("grn", e))
    }
}

#[cfg(test)]
#[path = "pharmacy_service_tests.rs"]
mod tests;
