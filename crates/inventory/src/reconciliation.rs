use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use storeline_core::{
    Aggregate, AggregateId, AggregateRoot, DomainError, Lifecycle, Money, ProductId, TenantId,
    UserId,
};
use storeline_events::Event;

use crate::status::ReconciliationStatus;

/// Stock reconciliation identifier.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct StockReconciliationId(pub AggregateId);

impl StockReconciliationId {
    pub fn new(id: AggregateId) -> Self {
        Self(id)
    }
}

impl core::fmt::Display for StockReconciliationId {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        core::fmt::Display::fmt(&self.0, f)
    }
}

/// Physical count of one product against the book quantity.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CountLine {
    pub product_id: ProductId,
    pub system_quantity: i64,
    pub counted_quantity: i64,
    pub unit_cost: Money,
}

impl CountLine {
    /// Positive when more stock was found than the books show.
    pub fn variance(&self) -> i64 {
        self.counted_quantity - self.system_quantity
    }

    pub fn variance_value(&self) -> Option<Money> {
        self.unit_cost.checked_mul(self.variance())
    }
}

/// Stock movement to book once a reconciliation is approved.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct StockAdjustment {
    pub product_id: ProductId,
    pub delta: i64,
}

/// Aggregate root: StockReconciliation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StockReconciliation {
    id: StockReconciliationId,
    tenant_id: Option<TenantId>,
    location: String,
    notes: Option<String>,
    status: ReconciliationStatus,
    lines: Vec<CountLine>,
    created_by: Option<UserId>,
    submitted_by: Option<UserId>,
    reviewed_by: Option<UserId>,
    reviewed_at: Option<DateTime<Utc>>,
    review_note: Option<String>,
    version: u64,
    created: bool,
}

impl StockReconciliation {
    /// Create an empty, not-yet-created aggregate instance for rehydration.
    pub fn empty(id: StockReconciliationId) -> Self {
        Self {
            id,
            tenant_id: None,
            location: String::new(),
            notes: None,
            status: ReconciliationStatus::Draft,
            lines: Vec::new(),
            created_by: None,
            submitted_by: None,
            reviewed_by: None,
            reviewed_at: None,
            review_note: None,
            version: 0,
            created: false,
        }
    }

    pub fn id_typed(&self) -> StockReconciliationId {
        self.id
    }

    pub fn is_created(&self) -> bool {
        self.created
    }

    pub fn tenant_id(&self) -> Option<TenantId> {
        self.tenant_id
    }

    pub fn location(&self) -> &str {
        &self.location
    }

    pub fn notes(&self) -> Option<&str> {
        self.notes.as_deref()
    }

    pub fn status(&self) -> ReconciliationStatus {
        self.status
    }

    pub fn lines(&self) -> &[CountLine] {
        &self.lines
    }

    pub fn created_by(&self) -> Option<UserId> {
        self.created_by
    }

    pub fn submitted_by(&self) -> Option<UserId> {
        self.submitted_by
    }

    pub fn reviewed_by(&self) -> Option<UserId> {
        self.reviewed_by
    }

    pub fn reviewed_at(&self) -> Option<DateTime<Utc>> {
        self.reviewed_at
    }

    pub fn review_note(&self) -> Option<&str> {
        self.review_note.as_deref()
    }

    /// Net value of all variances; `None` on overflow.
    pub fn total_variance_value(&self) -> Option<Money> {
        self.lines
            .iter()
            .try_fold(Money::ZERO, |acc, l| acc.checked_add(l.variance_value()?))
    }

    /// Adjustments implied by the current counts (zero variances omitted).
    pub fn adjustments(&self) -> Vec<StockAdjustment> {
        self.lines
            .iter()
            .filter(|l| l.variance() != 0)
            .map(|l| StockAdjustment {
                product_id: l.product_id,
                delta: l.variance(),
            })
            .collect()
    }
}

impl AggregateRoot for StockReconciliation {
    type Id = StockReconciliationId;

    fn id(&self) -> &Self::Id {
        &self.id
    }

    fn version(&self) -> u64 {
        self.version
    }
}

/// Command: StartReconciliation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StartReconciliation {
    pub tenant_id: TenantId,
    pub reconciliation_id: StockReconciliationId,
    pub actor: UserId,
    pub location: String,
    pub notes: Option<String>,
    pub occurred_at: DateTime<Utc>,
}

/// Command: RecordCount (draft only; replaces an earlier count of the same product).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RecordCount {
    pub tenant_id: TenantId,
    pub reconciliation_id: StockReconciliationId,
    pub actor: UserId,
    pub line: CountLine,
    pub occurred_at: DateTime<Utc>,
}

/// Command: SubmitForApproval.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SubmitForApproval {
    pub tenant_id: TenantId,
    pub reconciliation_id: StockReconciliationId,
    pub actor: UserId,
    pub notes: Option<String>,
    pub occurred_at: DateTime<Utc>,
}

/// Command: ApproveReconciliation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ApproveReconciliation {
    pub tenant_id: TenantId,
    pub reconciliation_id: StockReconciliationId,
    pub actor: UserId,
    pub notes: Option<String>,
    pub occurred_at: DateTime<Utc>,
}

/// Command: RejectReconciliation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RejectReconciliation {
    pub tenant_id: TenantId,
    pub reconciliation_id: StockReconciliationId,
    pub actor: UserId,
    pub reason: String,
    pub occurred_at: DateTime<Utc>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum ReconciliationCommand {
    StartReconciliation(StartReconciliation),
    RecordCount(RecordCount),
    SubmitForApproval(SubmitForApproval),
    ApproveReconciliation(ApproveReconciliation),
    RejectReconciliation(RejectReconciliation),
}

/// Event: ReconciliationStarted.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ReconciliationStarted {
    pub tenant_id: TenantId,
    pub reconciliation_id: StockReconciliationId,
    pub actor: UserId,
    pub location: String,
    pub notes: Option<String>,
    pub occurred_at: DateTime<Utc>,
}

/// Event: CountRecorded.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CountRecorded {
    pub tenant_id: TenantId,
    pub reconciliation_id: StockReconciliationId,
    pub actor: UserId,
    pub line: CountLine,
    pub occurred_at: DateTime<Utc>,
}

/// Event: ReconciliationSubmitted.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ReconciliationSubmitted {
    pub tenant_id: TenantId,
    pub reconciliation_id: StockReconciliationId,
    pub actor: UserId,
    pub notes: Option<String>,
    pub occurred_at: DateTime<Utc>,
}

/// Event: ReconciliationApproved.
///
/// `adjustments` is what an inventory consumer should book; counts with no
/// variance are left out.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ReconciliationApproved {
    pub tenant_id: TenantId,
    pub reconciliation_id: StockReconciliationId,
    pub actor: UserId,
    pub adjustments: Vec<StockAdjustment>,
    pub notes: Option<String>,
    pub occurred_at: DateTime<Utc>,
}

/// Event: ReconciliationRejected.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ReconciliationRejected {
    pub tenant_id: TenantId,
    pub reconciliation_id: StockReconciliationId,
    pub actor: UserId,
    pub reason: String,
    pub occurred_at: DateTime<Utc>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum ReconciliationEvent {
    ReconciliationStarted(ReconciliationStarted),
    CountRecorded(CountRecorded),
    ReconciliationSubmitted(ReconciliationSubmitted),
    ReconciliationApproved(ReconciliationApproved),
    ReconciliationRejected(ReconciliationRejected),
}

impl Event for ReconciliationEvent {
    fn event_type(&self) -> &'static str {
        match self {
            ReconciliationEvent::ReconciliationStarted(_) => "inventory.reconciliation.started",
            ReconciliationEvent::CountRecorded(_) => "inventory.reconciliation.count_recorded",
            ReconciliationEvent::ReconciliationSubmitted(_) => "inventory.reconciliation.submitted",
            ReconciliationEvent::ReconciliationApproved(_) => "inventory.reconciliation.approved",
            ReconciliationEvent::ReconciliationRejected(_) => "inventory.reconciliation.rejected",
        }
    }

    fn version(&self) -> u32 {
        1
    }

    fn occurred_at(&self) -> DateTime<Utc> {
        match self {
            ReconciliationEvent::ReconciliationStarted(e) => e.occurred_at,
            ReconciliationEvent::CountRecorded(e) => e.occurred_at,
            ReconciliationEvent::ReconciliationSubmitted(e) => e.occurred_at,
            ReconciliationEvent::ReconciliationApproved(e) => e.occurred_at,
            ReconciliationEvent::ReconciliationRejected(e) => e.occurred_at,
        }
    }
}

impl Aggregate for StockReconciliation {
    type Command = ReconciliationCommand;
    type Event = ReconciliationEvent;
    type Error = DomainError;

    fn apply(&mut self, event: &Self::Event) {
        match event {
            ReconciliationEvent::ReconciliationStarted(e) => {
                self.id = e.reconciliation_id;
                self.tenant_id = Some(e.tenant_id);
                self.location = e.location.clone();
                self.notes = e.notes.clone();
                self.status = ReconciliationStatus::Draft;
                self.lines.clear();
                self.created_by = Some(e.actor);
                self.created = true;
            }
            ReconciliationEvent::CountRecorded(e) => {
                match self
                    .lines
                    .iter_mut()
                    .find(|l| l.product_id == e.line.product_id)
                {
                    Some(existing) => *existing = e.line.clone(),
                    None => self.lines.push(e.line.clone()),
                }
            }
            ReconciliationEvent::ReconciliationSubmitted(e) => {
                self.status = ReconciliationStatus::Pending;
                self.submitted_by = Some(e.actor);
            }
            ReconciliationEvent::ReconciliationApproved(e) => {
                self.status = ReconciliationStatus::Approved;
                self.reviewed_by = Some(e.actor);
                self.reviewed_at = Some(e.occurred_at);
                self.review_note = e.notes.clone();
            }
            ReconciliationEvent::ReconciliationRejected(e) => {
                self.status = ReconciliationStatus::Rejected;
                self.reviewed_by = Some(e.actor);
                self.reviewed_at = Some(e.occurred_at);
                self.review_note = Some(e.reason.clone());
            }
        }

        self.version += 1;
    }

    fn handle(&self, command: &Self::Command) -> Result<Vec<Self::Event>, Self::Error> {
        match command {
            ReconciliationCommand::StartReconciliation(cmd) => self.handle_start(cmd),
            ReconciliationCommand::RecordCount(cmd) => self.handle_record(cmd),
            ReconciliationCommand::SubmitForApproval(cmd) => self.handle_submit(cmd),
            ReconciliationCommand::ApproveReconciliation(cmd) => self.handle_approve(cmd),
            ReconciliationCommand::RejectReconciliation(cmd) => self.handle_reject(cmd),
        }
    }
}

impl StockReconciliation {
    fn ensure_existing(
        &self,
        tenant_id: TenantId,
        reconciliation_id: StockReconciliationId,
    ) -> Result<(), DomainError> {
        if !self.created {
            return Err(DomainError::not_found());
        }
        if self.tenant_id != Some(tenant_id) {
            return Err(DomainError::invariant("tenant mismatch"));
        }
        if self.id != reconciliation_id {
            return Err(DomainError::invariant("reconciliation_id mismatch"));
        }
        Ok(())
    }

    fn handle_start(
        &self,
        cmd: &StartReconciliation,
    ) -> Result<Vec<ReconciliationEvent>, DomainError> {
        if self.created {
            return Err(DomainError::conflict("reconciliation already exists"));
        }
        if cmd.location.trim().is_empty() {
            return Err(DomainError::validation("location cannot be empty"));
        }

        Ok(vec![ReconciliationEvent::ReconciliationStarted(
            ReconciliationStarted {
                tenant_id: cmd.tenant_id,
                reconciliation_id: cmd.reconciliation_id,
                actor: cmd.actor,
                location: cmd.location.trim().to_string(),
                notes: cmd.notes.clone(),
                occurred_at: cmd.occurred_at,
            },
        )])
    }

    fn handle_record(&self, cmd: &RecordCount) -> Result<Vec<ReconciliationEvent>, DomainError> {
        self.ensure_existing(cmd.tenant_id, cmd.reconciliation_id)?;

        if self.status != ReconciliationStatus::Draft {
            return Err(DomainError::invariant(
                "counts can only be recorded on a draft reconciliation",
            ));
        }

        let mut violations = Vec::new();
        if cmd.line.system_quantity < 0 {
            violations.push("System quantity cannot be negative".to_string());
        }
        if cmd.line.counted_quantity < 0 {
            violations.push("Counted quantity cannot be negative".to_string());
        }
        if cmd.line.unit_cost.is_negative() {
            violations.push("Unit cost cannot be negative".to_string());
        }
        DomainError::from_violations(violations)?;

        Ok(vec![ReconciliationEvent::CountRecorded(CountRecorded {
            tenant_id: cmd.tenant_id,
            reconciliation_id: cmd.reconciliation_id,
            actor: cmd.actor,
            line: cmd.line.clone(),
            occurred_at: cmd.occurred_at,
        })])
    }

    fn handle_submit(
        &self,
        cmd: &SubmitForApproval,
    ) -> Result<Vec<ReconciliationEvent>, DomainError> {
        self.ensure_existing(cmd.tenant_id, cmd.reconciliation_id)?;
        self.status.ensure_transition(ReconciliationStatus::Pending)?;

        if self.lines.is_empty() {
            return Err(DomainError::validation(
                "cannot submit a reconciliation without counts",
            ));
        }

        Ok(vec![ReconciliationEvent::ReconciliationSubmitted(
            ReconciliationSubmitted {
                tenant_id: cmd.tenant_id,
                reconciliation_id: cmd.reconciliation_id,
                actor: cmd.actor,
                notes: cmd.notes.clone(),
                occurred_at: cmd.occurred_at,
            },
        )])
    }

    fn handle_approve(
        &self,
        cmd: &ApproveReconciliation,
    ) -> Result<Vec<ReconciliationEvent>, DomainError> {
        self.ensure_existing(cmd.tenant_id, cmd.reconciliation_id)?;
        self.status.ensure_transition(ReconciliationStatus::Approved)?;

        if self.total_variance_value().is_none() {
            return Err(DomainError::invariant("variance value overflow"));
        }

        Ok(vec![ReconciliationEvent::ReconciliationApproved(
            ReconciliationApproved {
                tenant_id: cmd.tenant_id,
                reconciliation_id: cmd.reconciliation_id,
                actor: cmd.actor,
                adjustments: self.adjustments(),
                notes: cmd.notes.clone(),
                occurred_at: cmd.occurred_at,
            },
        )])
    }

    fn handle_reject(
        &self,
        cmd: &RejectReconciliation,
    ) -> Result<Vec<ReconciliationEvent>, DomainError> {
        self.ensure_existing(cmd.tenant_id, cmd.reconciliation_id)?;
        self.status.ensure_transition(ReconciliationStatus::Rejected)?;

        if cmd.reason.trim().is_empty() {
            return Err(DomainError::validation("rejection reason is required"));
        }

        Ok(vec![ReconciliationEvent::ReconciliationRejected(
            ReconciliationRejected {
                tenant_id: cmd.tenant_id,
                reconciliation_id: cmd.reconciliation_id,
                actor: cmd.actor,
                reason: cmd.reason.trim().to_string(),
                occurred_at: cmd.occurred_at,
            },
        )])
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    struct Fixture {
        tenant_id: TenantId,
        id: StockReconciliationId,
        counter: UserId,
        manager: UserId,
        rec: StockReconciliation,
    }

    impl Fixture {
        fn started() -> Self {
            let id = StockReconciliationId::new(AggregateId::new());
            let mut fx = Self {
                tenant_id: TenantId::new(),
                id,
                counter: UserId::new(),
                manager: UserId::new(),
                rec: StockReconciliation::empty(id),
            };
            fx.run(ReconciliationCommand::StartReconciliation(StartReconciliation {
                tenant_id: fx.tenant_id,
                reconciliation_id: id,
                actor: fx.counter,
                location: " Main store ".to_string(),
                notes: None,
                occurred_at: Utc::now(),
            }))
            .unwrap();
            fx
        }

        fn run(
            &mut self,
            cmd: ReconciliationCommand,
        ) -> Result<Vec<ReconciliationEvent>, DomainError> {
            let events = self.rec.handle(&cmd)?;
            for e in &events {
                self.rec.apply(e);
            }
            Ok(events)
        }

        fn count(
            &mut self,
            product_id: ProductId,
            system: i64,
            counted: i64,
            unit_naira: i64,
        ) -> Result<Vec<ReconciliationEvent>, DomainError> {
            self.run(ReconciliationCommand::RecordCount(RecordCount {
                tenant_id: self.tenant_id,
                reconciliation_id: self.id,
                actor: self.counter,
                line: CountLine {
                    product_id,
                    system_quantity: system,
                    counted_quantity: counted,
                    unit_cost: Money::naira(unit_naira),
                },
                occurred_at: Utc::now(),
            }))
        }

        fn submit(&mut self) -> Result<Vec<ReconciliationEvent>, DomainError> {
            self.run(ReconciliationCommand::SubmitForApproval(SubmitForApproval {
                tenant_id: self.tenant_id,
                reconciliation_id: self.id,
                actor: self.counter,
                notes: None,
                occurred_at: Utc::now(),
            }))
        }

        fn approve(&mut self) -> Result<Vec<ReconciliationEvent>, DomainError> {
            self.run(ReconciliationCommand::ApproveReconciliation(ApproveReconciliation {
                tenant_id: self.tenant_id,
                reconciliation_id: self.id,
                actor: self.manager,
                notes: Some("checked".to_string()),
                occurred_at: Utc::now(),
            }))
        }

        fn reject(&mut self, reason: &str) -> Result<Vec<ReconciliationEvent>, DomainError> {
            self.run(ReconciliationCommand::RejectReconciliation(RejectReconciliation {
                tenant_id: self.tenant_id,
                reconciliation_id: self.id,
                actor: self.manager,
                reason: reason.to_string(),
                occurred_at: Utc::now(),
            }))
        }
    }

    #[test]
    fn start_creates_draft_with_trimmed_location() {
        let fx = Fixture::started();
        assert_eq!(fx.rec.status(), ReconciliationStatus::Draft);
        assert_eq!(fx.rec.location(), "Main store");
        assert_eq!(fx.rec.created_by(), Some(fx.counter));
        assert_eq!(fx.rec.version(), 1);
    }

    #[test]
    fn recount_replaces_previous_line() {
        let mut fx = Fixture::started();
        let product = ProductId::new();
        fx.count(product, 10, 7, 100).unwrap();
        fx.count(product, 10, 8, 100).unwrap();

        assert_eq!(fx.rec.lines().len(), 1);
        assert_eq!(fx.rec.lines()[0].counted_quantity, 8);
        assert_eq!(fx.rec.total_variance_value(), Some(Money::naira(-200)));
    }

    #[test]
    fn negative_counts_accumulate_violations() {
        let mut fx = Fixture::started();
        let err = fx.count(ProductId::new(), -1, -2, 5).unwrap_err();
        assert_eq!(
            err,
            DomainError::Rules(vec![
                "System quantity cannot be negative".to_string(),
                "Counted quantity cannot be negative".to_string(),
            ])
        );
    }

    #[test]
    fn empty_reconciliation_cannot_be_submitted() {
        let mut fx = Fixture::started();
        assert!(matches!(fx.submit(), Err(DomainError::Validation(_))));
    }

    #[test]
    fn approval_emits_non_zero_adjustments() {
        let mut fx = Fixture::started();
        let short = ProductId::new();
        let exact = ProductId::new();
        let over = ProductId::new();
        fx.count(short, 10, 7, 100).unwrap();
        fx.count(exact, 4, 4, 50).unwrap();
        fx.count(over, 0, 2, 20).unwrap();
        fx.submit().unwrap();
        assert_eq!(fx.rec.status(), ReconciliationStatus::Pending);
        assert_eq!(fx.rec.submitted_by(), Some(fx.counter));

        let events = fx.approve().unwrap();
        match &events[0] {
            ReconciliationEvent::ReconciliationApproved(e) => {
                assert_eq!(
                    e.adjustments,
                    vec![
                        StockAdjustment { product_id: short, delta: -3 },
                        StockAdjustment { product_id: over, delta: 2 },
                    ]
                );
            }
            other => panic!("expected ReconciliationApproved, got {other:?}"),
        }
        assert_eq!(fx.rec.status(), ReconciliationStatus::Approved);
        assert_eq!(fx.rec.reviewed_by(), Some(fx.manager));
        assert_eq!(fx.rec.review_note(), Some("checked"));
    }

    #[test]
    fn draft_cannot_be_approved_directly() {
        let mut fx = Fixture::started();
        fx.count(ProductId::new(), 1, 1, 1).unwrap();
        assert_eq!(
            fx.approve().unwrap_err(),
            DomainError::invariant("invalid status transition from 'draft' to 'approved'")
        );
    }

    #[test]
    fn rejection_requires_reason_and_is_terminal() {
        let mut fx = Fixture::started();
        fx.count(ProductId::new(), 3, 1, 10).unwrap();
        fx.submit().unwrap();

        assert!(matches!(fx.reject(""), Err(DomainError::Validation(_))));
        fx.reject("recount aisle 4").unwrap();
        assert_eq!(fx.rec.status(), ReconciliationStatus::Rejected);
        assert_eq!(fx.rec.review_note(), Some("recount aisle 4"));

        assert!(matches!(fx.approve(), Err(DomainError::InvariantViolation(_))));
        assert!(matches!(fx.submit(), Err(DomainError::InvariantViolation(_))));
    }

    #[test]
    fn counts_are_frozen_once_submitted() {
        let mut fx = Fixture::started();
        fx.count(ProductId::new(), 3, 1, 10).unwrap();
        fx.submit().unwrap();

        let err = fx.count(ProductId::new(), 1, 1, 1).unwrap_err();
        assert!(matches!(err, DomainError::InvariantViolation(_)));
    }

    #[test]
    fn approving_twice_fails() {
        let mut fx = Fixture::started();
        fx.count(ProductId::new(), 3, 1, 10).unwrap();
        fx.submit().unwrap();
        fx.approve().unwrap();
        assert!(matches!(fx.approve(), Err(DomainError::InvariantViolation(_))));
    }
}
