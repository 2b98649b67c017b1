//! Payment-status reconciliation
//!
//! Webhooks can be lost. The reconciler walks every order whose payment is
//! still pending at the gateway, asks the gateway for the current status and
//! applies any change. One pass at a time per process; a failure on one
//! order is logged and the pass moves on.

use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::time::Duration;

use serde::Serialize;
use shared::models::{
    NotificationKind, Order, OrderStatus, PaymentStatus, PaymentUpdate,
};
use shared::util::now_millis;
use thiserror::Error;
use tokio_util::sync::CancellationToken;

use crate::BoxError;
use crate::notify::Notifier;
use crate::payment::{GatewayPayment, PaymentGateway};
use crate::persistence::ShopStore;

/// Orders checked per background pass
const BATCH_LIMIT: i64 = 200;
/// Orders checked when a store admin asks for a pass
const STORE_BATCH_LIMIT: i64 = 50;

#[derive(Debug, Error)]
pub enum ReconcileError {
    #[error("a reconciliation pass is already running")]
    AlreadyRunning,

    #[error("online payments are not configured")]
    GatewayDisabled,

    #[error("failed to list pending payments: {0}")]
    Store(BoxError),
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct ReconcileSummary {
    pub checked: usize,
    pub updated: usize,
    pub failed: usize,
}

/// Clears the running flag when a pass ends, including on early return
struct RunGuard<'a>(&'a AtomicBool);

impl<'a> RunGuard<'a> {
    fn acquire(flag: &'a AtomicBool) -> Option<Self> {
        flag.compare_exchange(false, true, Ordering::AcqRel, Ordering::Acquire)
            .ok()
            .map(|_| Self(flag))
    }
}

impl Drop for RunGuard<'_> {
    fn drop(&mut self) {
        self.0.store(false, Ordering::Release);
    }
}

#[derive(Clone)]
pub struct PaymentReconciler {
    store: Arc<dyn ShopStore>,
    gateway: Option<Arc<dyn PaymentGateway>>,
    notifier: Notifier,
    running: Arc<AtomicBool>,
}

impl PaymentReconciler {
    pub fn new(
        store: Arc<dyn ShopStore>,
        gateway: Option<Arc<dyn PaymentGateway>>,
        notifier: Notifier,
    ) -> Self {
        Self {
            store,
            gateway,
            notifier,
            running: Arc::new(AtomicBool::new(false)),
        }
    }

    pub fn is_running(&self) -> bool {
        self.running.load(Ordering::Acquire)
    }

    /// Run one reconciliation pass over every store
    pub async fn run_once(&self) -> Result<ReconcileSummary, ReconcileError> {
        self.run(None, BATCH_LIMIT).await
    }

    /// Run one pass limited to a single store's orders
    pub async fn run_for_store(&self, store_id: i64) -> Result<ReconcileSummary, ReconcileError> {
        self.run(Some(store_id), STORE_BATCH_LIMIT).await
    }

    async fn run(
        &self,
        store_id: Option<i64>,
        limit: i64,
    ) -> Result<ReconcileSummary, ReconcileError> {
        let gateway = self.gateway.as_ref().ok_or(ReconcileError::GatewayDisabled)?;
        let _guard = RunGuard::acquire(&self.running).ok_or(ReconcileError::AlreadyRunning)?;

        let orders = self
            .store
            .list_pending_payments(store_id, limit)
            .await
            .map_err(ReconcileError::Store)?;

        let mut summary = ReconcileSummary::default();
        for order in orders {
            let Some(payment_id) = order.payment_id.as_deref() else {
                continue;
            };
            summary.checked += 1;

            let payment = match gateway.get_payment(payment_id).await {
                Ok(p) => p,
                Err(e) => {
                    tracing::warn!(order_id = %order.id, payment_id, error = %e, "Payment lookup failed");
                    summary.failed += 1;
                    continue;
                }
            };

            match apply_payment_status(self.store.as_ref(), &self.notifier, &order, &payment).await
            {
                Ok(Some(_)) => summary.updated += 1,
                Ok(None) => {}
                Err(e) => {
                    tracing::error!(order_id = %order.id, error = %e, "Failed to apply payment status");
                    summary.failed += 1;
                }
            }
        }

        if summary.updated > 0 || summary.failed > 0 {
            tracing::info!(
                checked = summary.checked,
                updated = summary.updated,
                failed = summary.failed,
                "Payment reconciliation pass finished"
            );
        }
        Ok(summary)
    }

    /// Periodic loop until `shutdown` is cancelled
    pub fn spawn(self, every: Duration, shutdown: CancellationToken) -> tokio::task::JoinHandle<()> {
        tokio::spawn(async move {
            tracing::info!(interval_secs = every.as_secs(), "Payment reconciler started");
            let mut interval = tokio::time::interval(every);
            interval.set_missed_tick_behavior(tokio::time::MissedTickBehavior::Skip);
            loop {
                tokio::select! {
                    _ = shutdown.cancelled() => break,
                    _ = interval.tick() => {
                        match self.run_once().await {
                            Ok(_) => {}
                            Err(ReconcileError::AlreadyRunning) => {
                                tracing::debug!("Reconciliation still running, skipping tick");
                            }
                            Err(e) => tracing::error!(error = %e, "Reconciliation pass failed"),
                        }
                    }
                }
            }
            tracing::info!("Payment reconciler stopped");
        })
    }
}

/// Order status that follows a payment outcome, if any
fn follow_up_status(order: &Order, payment: PaymentStatus) -> Option<OrderStatus> {
    let target = match payment {
        PaymentStatus::Approved => OrderStatus::Confirmed,
        PaymentStatus::Rejected
        | PaymentStatus::Cancelled
        | PaymentStatus::Refunded
        | PaymentStatus::ChargedBack => OrderStatus::Cancelled,
        PaymentStatus::Pending => return None,
    };
    order
        .status
        .can_transition_to(target, order.fulfillment)
        .then_some(target)
}

/// Apply a gateway payment onto its order.
///
/// Shared by the webhook and the reconciler. Returns the updated order, or
/// `None` when nothing changed (same status, disallowed transition, or a
/// concurrent writer got there first, or a payment whose external reference
/// names another order).
pub async fn apply_payment_status(
    store: &dyn ShopStore,
    notifier: &Notifier,
    order: &Order,
    payment: &GatewayPayment,
) -> Result<Option<Order>, BoxError> {
    if let Some(reference) = payment.external_reference.as_deref()
        && reference != order.id.to_string()
    {
        tracing::warn!(
            order_id = %order.id,
            payment_id = %payment.id,
            external_reference = reference,
            "Payment belongs to another order, ignoring"
        );
        return Ok(None);
    }

    let next = payment.status;
    if !order.payment_status.can_transition_to(next) {
        if order.payment_status != next {
            tracing::warn!(
                order_id = %order.id,
                from = order.payment_status.as_db(),
                to = next.as_db(),
                "Ignoring payment status regression"
            );
        }
        return Ok(None);
    }

    let now = now_millis();
    let update = PaymentUpdate {
        payment_id: order.payment_id.is_none().then(|| payment.id.clone()),
        payment_status: Some(next),
        payment_status_detail: payment.status_detail.clone(),
        ..Default::default()
    };
    let Some(mut updated) = store
        .apply_payment_update(order.id, order.payment_status, &update, now)
        .await?
    else {
        return Ok(None);
    };
    tracing::info!(
        order_id = %order.id,
        from = order.payment_status.as_db(),
        to = next.as_db(),
        "Payment status updated"
    );

    if let Some(target) = follow_up_status(&updated, next)
        && let Some(o) = store
            .update_order_status(updated.store_id, updated.id, updated.status, target, now)
            .await?
    {
        updated = o;
    }

    let short_id = short_order_id(&updated);
    let (kind, title, body) = match next {
        PaymentStatus::Approved => (
            NotificationKind::PaymentApproved,
            "Pagamento aprovado",
            format!("Pedido {short_id} de {} foi pago", updated.customer_name),
        ),
        PaymentStatus::Rejected | PaymentStatus::Cancelled => (
            NotificationKind::PaymentFailed,
            "Pagamento não concluído",
            format!("Pedido {short_id} foi cancelado: pagamento {}", next.as_db()),
        ),
        PaymentStatus::Refunded | PaymentStatus::ChargedBack => (
            NotificationKind::OrderCancelled,
            "Pagamento estornado",
            format!("Pedido {short_id}: pagamento {}", next.as_db()),
        ),
        PaymentStatus::Pending => return Ok(Some(updated)),
    };
    notifier
        .notify(updated.store_id, kind, title, &body, Some(updated.id))
        .await;

    Ok(Some(updated))
}

/// First 8 hex chars of the order id, as shown to staff
pub fn short_order_id(order: &Order) -> String {
    let id = order.id.simple().to_string();
    format!("#{}", &id[..8].to_uppercase())
}
