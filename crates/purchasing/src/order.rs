use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use storeline_core::{
    Aggregate, AggregateId, AggregateRoot, DomainError, Lifecycle, Money, ProductId, SupplierId,
    TenantId, UserId,
};
use storeline_events::Event;

use crate::rules::check_business_rules;
use crate::status::PurchaseOrderStatus;
use crate::totals::{TotalsInput, TotalsLine, validate_totals};

/// Purchase order identifier (tenant-scoped via `tenant_id` fields in events/commands).
#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct PurchaseOrderId(pub AggregateId);

impl PurchaseOrderId {
    pub fn new(id: AggregateId) -> Self {
        Self(id)
    }
}

impl core::fmt::Display for PurchaseOrderId {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        core::fmt::Display::fmt(&self.0, f)
    }
}

/// Line as submitted by the buyer.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NewOrderLine {
    pub product_id: ProductId,
    pub quantity: i64,
    pub unit_cost: Money,
    pub total_cost: Money,
}

/// Accepted purchase order line.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct OrderLine {
    pub line_no: u32,
    pub product_id: ProductId,
    pub quantity: i64,
    pub unit_cost: Money,
    pub total_cost: Money,
    #[serde(default)]
    pub received_quantity: i64,
}

impl OrderLine {
    pub fn outstanding(&self) -> i64 {
        self.quantity.saturating_sub(self.received_quantity)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct OrderTotals {
    pub subtotal: Money,
    pub tax: Money,
    pub shipping: Money,
    pub total_amount: Money,
}

/// Quantity delivered against one line.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct LineReceipt {
    pub line_no: u32,
    pub quantity: i64,
}

/// Audit entry for every status change.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StatusChange {
    pub from: Option<PurchaseOrderStatus>,
    pub to: PurchaseOrderStatus,
    pub actor: UserId,
    pub note: Option<String>,
    pub at: DateTime<Utc>,
}

/// Aggregate root: PurchaseOrder.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PurchaseOrder {
    id: PurchaseOrderId,
    tenant_id: Option<TenantId>,
    supplier_id: Option<SupplierId>,
    created_by: Option<UserId>,
    status: PurchaseOrderStatus,
    lines: Vec<OrderLine>,
    totals: OrderTotals,
    notes: Option<String>,
    history: Vec<StatusChange>,
    version: u64,
    created: bool,
}

impl PurchaseOrder {
    /// Create an empty, not-yet-created aggregate instance for rehydration.
    pub fn empty(id: PurchaseOrderId) -> Self {
        Self {
            id,
            tenant_id: None,
            supplier_id: None,
            created_by: None,
            status: PurchaseOrderStatus::Draft,
            lines: Vec::new(),
            totals: OrderTotals {
                subtotal: Money::ZERO,
                tax: Money::ZERO,
                shipping: Money::ZERO,
                total_amount: Money::ZERO,
            },
            notes: None,
            history: Vec::new(),
            version: 0,
            created: false,
        }
    }

    pub fn id_typed(&self) -> PurchaseOrderId {
        self.id
    }

    pub fn is_created(&self) -> bool {
        self.created
    }

    pub fn tenant_id(&self) -> Option<TenantId> {
        self.tenant_id
    }

    pub fn supplier_id(&self) -> Option<SupplierId> {
        self.supplier_id
    }

    pub fn created_by(&self) -> Option<UserId> {
        self.created_by
    }

    pub fn status(&self) -> PurchaseOrderStatus {
        self.status
    }

    pub fn lines(&self) -> &[OrderLine] {
        &self.lines
    }

    pub fn totals(&self) -> OrderTotals {
        self.totals
    }

    pub fn notes(&self) -> Option<&str> {
        self.notes.as_deref()
    }

    pub fn history(&self) -> &[StatusChange] {
        &self.history
    }
}

impl AggregateRoot for PurchaseOrder {
    type Id = PurchaseOrderId;

    fn id(&self) -> &Self::Id {
        &self.id
    }

    fn version(&self) -> u64 {
        self.version
    }
}

/// Command: CreatePurchaseOrder.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CreatePurchaseOrder {
    pub tenant_id: TenantId,
    pub order_id: PurchaseOrderId,
    pub supplier_id: SupplierId,
    pub actor: UserId,
    pub lines: Vec<NewOrderLine>,
    pub subtotal: Money,
    pub tax: Money,
    pub shipping: Money,
    pub total_amount: Money,
    pub notes: Option<String>,
    pub occurred_at: DateTime<Utc>,
}

/// Command: PlaceOrder (draft -> ordered).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PlaceOrder {
    pub tenant_id: TenantId,
    pub order_id: PurchaseOrderId,
    pub actor: UserId,
    pub notes: Option<String>,
    pub occurred_at: DateTime<Utc>,
}

/// Command: ReceiveGoods.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ReceiveGoods {
    pub tenant_id: TenantId,
    pub order_id: PurchaseOrderId,
    pub actor: UserId,
    pub receipts: Vec<LineReceipt>,
    pub notes: Option<String>,
    pub occurred_at: DateTime<Utc>,
}

/// Command: CancelOrder.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CancelOrder {
    pub tenant_id: TenantId,
    pub order_id: PurchaseOrderId,
    pub actor: UserId,
    pub reason: String,
    pub occurred_at: DateTime<Utc>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum PurchaseOrderCommand {
    CreatePurchaseOrder(CreatePurchaseOrder),
    PlaceOrder(PlaceOrder),
    ReceiveGoods(ReceiveGoods),
    CancelOrder(CancelOrder),
}

/// Event: PurchaseOrderCreated.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PurchaseOrderCreated {
    pub tenant_id: TenantId,
    pub order_id: PurchaseOrderId,
    pub supplier_id: SupplierId,
    pub actor: UserId,
    pub lines: Vec<OrderLine>,
    pub totals: OrderTotals,
    pub notes: Option<String>,
    pub occurred_at: DateTime<Utc>,
}

/// Event: PurchaseOrderPlaced.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PurchaseOrderPlaced {
    pub tenant_id: TenantId,
    pub order_id: PurchaseOrderId,
    pub actor: UserId,
    pub notes: Option<String>,
    pub occurred_at: DateTime<Utc>,
}

/// Event: GoodsReceived.
///
/// Carries the per-line quantities so a stock consumer can book them in, and
/// the status the order ends up in after this delivery.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct GoodsReceived {
    pub tenant_id: TenantId,
    pub order_id: PurchaseOrderId,
    pub actor: UserId,
    pub receipts: Vec<LineReceipt>,
    pub resulting_status: PurchaseOrderStatus,
    pub notes: Option<String>,
    pub occurred_at: DateTime<Utc>,
}

/// Event: PurchaseOrderCancelled.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PurchaseOrderCancelled {
    pub tenant_id: TenantId,
    pub order_id: PurchaseOrderId,
    pub actor: UserId,
    pub reason: String,
    pub occurred_at: DateTime<Utc>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum PurchaseOrderEvent {
    PurchaseOrderCreated(PurchaseOrderCreated),
    PurchaseOrderPlaced(PurchaseOrderPlaced),
    GoodsReceived(GoodsReceived),
    PurchaseOrderCancelled(PurchaseOrderCancelled),
}

impl Event for PurchaseOrderEvent {
    fn event_type(&self) -> &'static str {
        match self {
            PurchaseOrderEvent::PurchaseOrderCreated(_) => "purchasing.order.created",
            PurchaseOrderEvent::PurchaseOrderPlaced(_) => "purchasing.order.placed",
            PurchaseOrderEvent::GoodsReceived(_) => "purchasing.order.goods_received",
            PurchaseOrderEvent::PurchaseOrderCancelled(_) => "purchasing.order.cancelled",
        }
    }

    fn version(&self) -> u32 {
        1
    }

    fn occurred_at(&self) -> DateTime<Utc> {
        match self {
            PurchaseOrderEvent::PurchaseOrderCreated(e) => e.occurred_at,
            PurchaseOrderEvent::PurchaseOrderPlaced(e) => e.occurred_at,
            PurchaseOrderEvent::GoodsReceived(e) => e.occurred_at,
            PurchaseOrderEvent::PurchaseOrderCancelled(e) => e.occurred_at,
        }
    }
}

impl Aggregate for PurchaseOrder {
    type Command = PurchaseOrderCommand;
    type Event = PurchaseOrderEvent;
    type Error = DomainError;

    fn apply(&mut self, event: &Self::Event) {
        match event {
            PurchaseOrderEvent::PurchaseOrderCreated(e) => {
                self.id = e.order_id;
                self.tenant_id = Some(e.tenant_id);
                self.supplier_id = Some(e.supplier_id);
                self.created_by = Some(e.actor);
                self.status = PurchaseOrderStatus::Draft;
                self.lines = e.lines.clone();
                self.totals = e.totals;
                self.notes = e.notes.clone();
                self.history = vec![StatusChange {
                    from: None,
                    to: PurchaseOrderStatus::Draft,
                    actor: e.actor,
                    note: e.notes.clone(),
                    at: e.occurred_at,
                }];
                self.created = true;
            }
            PurchaseOrderEvent::PurchaseOrderPlaced(e) => {
                self.change_status(
                    PurchaseOrderStatus::Ordered,
                    e.actor,
                    e.notes.clone(),
                    e.occurred_at,
                );
            }
            PurchaseOrderEvent::GoodsReceived(e) => {
                for receipt in &e.receipts {
                    if let Some(line) = self
                        .lines
                        .iter_mut()
                        .find(|l| l.line_no == receipt.line_no)
                    {
                        line.received_quantity =
                            line.received_quantity.saturating_add(receipt.quantity);
                    }
                }
                self.change_status(e.resulting_status, e.actor, e.notes.clone(), e.occurred_at);
            }
            PurchaseOrderEvent::PurchaseOrderCancelled(e) => {
                self.change_status(
                    PurchaseOrderStatus::Cancelled,
                    e.actor,
                    Some(e.reason.clone()),
                    e.occurred_at,
                );
            }
        }

        // Deterministic version tracking: +1 per applied event.
        self.version += 1;
    }

    fn handle(&self, command: &Self::Command) -> Result<Vec<Self::Event>, Self::Error> {
        match command {
            PurchaseOrderCommand::CreatePurchaseOrder(cmd) => self.handle_create(cmd),
            PurchaseOrderCommand::PlaceOrder(cmd) => self.handle_place(cmd),
            PurchaseOrderCommand::ReceiveGoods(cmd) => self.handle_receive(cmd),
            PurchaseOrderCommand::CancelOrder(cmd) => self.handle_cancel(cmd),
        }
    }
}

impl PurchaseOrder {
    fn change_status(
        &mut self,
        to: PurchaseOrderStatus,
        actor: UserId,
        note: Option<String>,
        at: DateTime<Utc>,
    ) {
        self.history.push(StatusChange {
            from: Some(self.status),
            to,
            actor,
            note,
            at,
        });
        self.status = to;
    }

    fn ensure_existing(
        &self,
        tenant_id: TenantId,
        order_id: PurchaseOrderId,
    ) -> Result<(), DomainError> {
        if !self.created {
            return Err(DomainError::not_found());
        }
        if self.tenant_id != Some(tenant_id) {
            return Err(DomainError::invariant("tenant mismatch"));
        }
        if self.id != order_id {
            return Err(DomainError::invariant("order_id mismatch"));
        }
        Ok(())
    }

    fn handle_create(
        &self,
        cmd: &CreatePurchaseOrder,
    ) -> Result<Vec<PurchaseOrderEvent>, DomainError> {
        if self.created {
            return Err(DomainError::conflict("purchase order already exists"));
        }
        if cmd.lines.is_empty() {
            return Err(DomainError::validation(
                "purchase order requires at least one line",
            ));
        }

        let quantities: Vec<i64> = cmd.lines.iter().map(|l| l.quantity).collect();
        let mut violations = check_business_rules(&quantities, cmd.total_amount);

        for (idx, line) in cmd.lines.iter().enumerate() {
            if line.unit_cost.is_negative() {
                violations.push(format!("Item {}: unit cost cannot be negative", idx + 1));
            }
        }
        if cmd.tax.is_negative() {
            violations.push("Tax cannot be negative".to_string());
        }
        if cmd.shipping.is_negative() {
            violations.push("Shipping cannot be negative".to_string());
        }

        let totals = validate_totals(&TotalsInput {
            subtotal: cmd.subtotal,
            tax: cmd.tax,
            shipping: cmd.shipping,
            total_amount: cmd.total_amount,
            items: cmd
                .lines
                .iter()
                .map(|l| TotalsLine {
                    total_cost: l.total_cost,
                    quantity: Some(l.quantity),
                    unit_cost: Some(l.unit_cost),
                })
                .collect(),
        });
        violations.extend(totals.violations());

        DomainError::from_violations(violations)?;

        let lines = cmd
            .lines
            .iter()
            .enumerate()
            .map(|(idx, l)| OrderLine {
                line_no: idx as u32 + 1,
                product_id: l.product_id,
                quantity: l.quantity,
                unit_cost: l.unit_cost,
                total_cost: l.total_cost,
                received_quantity: 0,
            })
            .collect();

        Ok(vec![PurchaseOrderEvent::PurchaseOrderCreated(
            PurchaseOrderCreated {
                tenant_id: cmd.tenant_id,
                order_id: cmd.order_id,
                supplier_id: cmd.supplier_id,
                actor: cmd.actor,
                lines,
                totals: OrderTotals {
                    subtotal: cmd.subtotal,
                    tax: cmd.tax,
                    shipping: cmd.shipping,
                    total_amount: cmd.total_amount,
                },
                notes: cmd.notes.clone(),
                occurred_at: cmd.occurred_at,
            },
        )])
    }

    fn handle_place(&self, cmd: &PlaceOrder) -> Result<Vec<PurchaseOrderEvent>, DomainError> {
        self.ensure_existing(cmd.tenant_id, cmd.order_id)?;
        self.status.ensure_transition(PurchaseOrderStatus::Ordered)?;

        Ok(vec![PurchaseOrderEvent::PurchaseOrderPlaced(
            PurchaseOrderPlaced {
                tenant_id: cmd.tenant_id,
                order_id: cmd.order_id,
                actor: cmd.actor,
                notes: cmd.notes.clone(),
                occurred_at: cmd.occurred_at,
            },
        )])
    }

    fn handle_receive(
        &self,
        cmd: &ReceiveGoods,
    ) -> Result<Vec<PurchaseOrderEvent>, DomainError> {
        self.ensure_existing(cmd.tenant_id, cmd.order_id)?;

        // Both receiving targets share the same source states; checking one
        // rejects drafts and terminal orders before the receipts are looked at.
        self.status.ensure_transition(PurchaseOrderStatus::Received)?;

        if cmd.receipts.is_empty() {
            return Err(DomainError::validation("at least one receipt line is required"));
        }

        let mut received: Vec<i64> = self.lines.iter().map(|l| l.received_quantity).collect();
        for receipt in &cmd.receipts {
            if receipt.quantity <= 0 {
                return Err(DomainError::validation(format!(
                    "line {}: received quantity must be positive",
                    receipt.line_no
                )));
            }
            let idx = self
                .lines
                .iter()
                .position(|l| l.line_no == receipt.line_no)
                .ok_or_else(|| {
                    DomainError::validation(format!("line {} does not exist", receipt.line_no))
                })?;

            let over_receipt = || {
                DomainError::invariant(format!(
                    "line {}: cannot receive more than the {} ordered",
                    receipt.line_no, self.lines[idx].quantity
                ))
            };
            received[idx] = received[idx]
                .checked_add(receipt.quantity)
                .ok_or_else(over_receipt)?;
            if received[idx] > self.lines[idx].quantity {
                return Err(over_receipt());
            }
        }

        let fully_received = self
            .lines
            .iter()
            .zip(&received)
            .all(|(line, got)| *got == line.quantity);
        let resulting_status = if fully_received {
            PurchaseOrderStatus::Received
        } else {
            PurchaseOrderStatus::PartialReceived
        };
        self.status.ensure_transition(resulting_status)?;

        Ok(vec![PurchaseOrderEvent::GoodsReceived(GoodsReceived {
            tenant_id: cmd.tenant_id,
            order_id: cmd.order_id,
            actor: cmd.actor,
            receipts: cmd.receipts.clone(),
            resulting_status,
            notes: cmd.notes.clone(),
            occurred_at: cmd.occurred_at,
        })])
    }

    fn handle_cancel(&self, cmd: &CancelOrder) -> Result<Vec<PurchaseOrderEvent>, DomainError> {
        self.ensure_existing(cmd.tenant_id, cmd.order_id)?;
        self.status.ensure_transition(PurchaseOrderStatus::Cancelled)?;

        if cmd.reason.trim().is_empty() {
            return Err(DomainError::validation("cancellation reason is required"));
        }

        Ok(vec![PurchaseOrderEvent::PurchaseOrderCancelled(
            PurchaseOrderCancelled {
                tenant_id: cmd.tenant_id,
                order_id: cmd.order_id,
                actor: cmd.actor,
                reason: cmd.reason.trim().to_string(),
                occurred_at: cmd.occurred_at,
            },
        )])
    }
}
