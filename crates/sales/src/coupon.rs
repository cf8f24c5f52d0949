use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use storeline_core::{Aggregate, AggregateId, AggregateRoot, DomainError, Money, TenantId, UserId};
use storeline_events::Event;

/// 100% expressed in basis points.
pub const FULL_PERCENTAGE_BPS: u32 = 10_000;

/// Coupon identifier.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct CouponId(pub AggregateId);

impl CouponId {
    pub fn new(id: AggregateId) -> Self {
        Self(id)
    }
}

impl core::fmt::Display for CouponId {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        core::fmt::Display::fmt(&self.0, f)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum Discount {
    /// `basis_points` of the order amount (1_000 = 10%), rounded down to the kobo.
    Percentage { basis_points: u32 },
    Fixed { amount: Money },
}

/// Terms a coupon is issued with.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CouponTerms {
    pub code: String,
    pub discount: Discount,
    #[serde(default)]
    pub min_order_amount: Option<Money>,
    #[serde(default)]
    pub max_discount: Option<Money>,
    #[serde(default)]
    pub starts_at: Option<DateTime<Utc>>,
    #[serde(default)]
    pub expires_at: Option<DateTime<Utc>>,
    #[serde(default)]
    pub usage_limit: Option<u32>,
}

impl CouponTerms {
    fn violations(&self) -> Vec<String> {
        let mut out = Vec::new();
        if self.code.trim().is_empty() {
            out.push("Coupon code is required".to_string());
        }
        match self.discount {
            Discount::Percentage { basis_points } => {
                if basis_points == 0 || basis_points > FULL_PERCENTAGE_BPS {
                    out.push("Percentage discount must be between 0.01% and 100%".to_string());
                }
            }
            Discount::Fixed { amount } => {
                if amount <= Money::ZERO {
                    out.push("Fixed discount must be greater than zero".to_string());
                }
            }
        }
        if matches!(self.min_order_amount, Some(m) if m.is_negative()) {
            out.push("Minimum order amount cannot be negative".to_string());
        }
        if matches!(self.max_discount, Some(m) if m <= Money::ZERO) {
            out.push("Maximum discount must be greater than zero".to_string());
        }
        if let (Some(starts), Some(expires)) = (self.starts_at, self.expires_at) {
            if expires <= starts {
                out.push("Coupon must expire after it starts".to_string());
            }
        }
        if self.usage_limit == Some(0) {
            out.push("Usage limit must be at least 1".to_string());
        }
        out
    }
}

/// Aggregate root: Coupon.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Coupon {
    id: CouponId,
    tenant_id: Option<TenantId>,
    terms: Option<CouponTerms>,
    active: bool,
    times_used: u32,
    version: u64,
    created: bool,
}

impl Coupon {
    /// Create an empty, not-yet-created aggregate instance for rehydration.
    pub fn empty(id: CouponId) -> Self {
        Self {
            id,
            tenant_id: None,
            terms: None,
            active: false,
            times_used: 0,
            version: 0,
            created: false,
        }
    }

    pub fn id_typed(&self) -> CouponId {
        self.id
    }

    pub fn is_created(&self) -> bool {
        self.created
    }

    pub fn tenant_id(&self) -> Option<TenantId> {
        self.tenant_id
    }

    pub fn terms(&self) -> Option<&CouponTerms> {
        self.terms.as_ref()
    }

    pub fn is_active(&self) -> bool {
        self.active
    }

    pub fn times_used(&self) -> u32 {
        self.times_used
    }

    /// Every reason the coupon cannot be used on an order of `order_amount`
    /// at `now`. Empty means usable.
    pub fn check(&self, order_amount: Money, now: DateTime<Utc>) -> Vec<String> {
        let Some(terms) = &self.terms else {
            return vec!["Coupon does not exist".to_string()];
        };

        let mut violations = Vec::new();
        if !self.active {
            violations.push("Coupon is inactive".to_string());
        }
        if matches!(terms.starts_at, Some(starts) if now < starts) {
            violations.push("Coupon is not yet valid".to_string());
        }
        if matches!(terms.expires_at, Some(expires) if now >= expires) {
            violations.push("Coupon has expired".to_string());
        }
        if matches!(terms.usage_limit, Some(limit) if self.times_used >= limit) {
            violations.push("Coupon usage limit reached".to_string());
        }
        if let Some(min) = terms.min_order_amount {
            if order_amount < min {
                violations.push(format!("Minimum order amount for this coupon is {min}"));
            }
        }
        violations
    }

    /// Discount granted on `order_amount`, capped by the coupon's maximum and
    /// by the order amount itself. Does not run [`Coupon::check`].
    pub fn discount_for(&self, order_amount: Money) -> Money {
        let Some(terms) = &self.terms else {
            return Money::ZERO;
        };
        if order_amount <= Money::ZERO {
            return Money::ZERO;
        }

        let raw = match terms.discount {
            Discount::Percentage { basis_points } => {
                let kobo = order_amount.minor() as i128 * basis_points as i128
                    / FULL_PERCENTAGE_BPS as i128;
                Money::from_minor(kobo as i64)
            }
            Discount::Fixed { amount } => amount,
        };

        let capped = match terms.max_discount {
            Some(max) => raw.min(max),
            None => raw,
        };
        capped.min(order_amount)
    }
}

impl AggregateRoot for Coupon {
    type Id = CouponId;

    fn id(&self) -> &Self::Id {
        &self.id
    }

    fn version(&self) -> u64 {
        self.version
    }
}

/// Command: CreateCoupon.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CreateCoupon {
    pub tenant_id: TenantId,
    pub coupon_id: CouponId,
    pub actor: UserId,
    pub terms: CouponTerms,
    pub occurred_at: DateTime<Utc>,
}

/// Command: RedeemCoupon.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RedeemCoupon {
    pub tenant_id: TenantId,
    pub coupon_id: CouponId,
    pub actor: UserId,
    pub order_amount: Money,
    pub order_reference: Option<String>,
    pub occurred_at: DateTime<Utc>,
}

/// Command: DeactivateCoupon.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DeactivateCoupon {
    pub tenant_id: TenantId,
    pub coupon_id: CouponId,
    pub actor: UserId,
    pub reason: Option<String>,
    pub occurred_at: DateTime<Utc>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum CouponCommand {
    CreateCoupon(CreateCoupon),
    RedeemCoupon(RedeemCoupon),
    DeactivateCoupon(DeactivateCoupon),
}

/// Event: CouponCreated.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CouponCreated {
    pub tenant_id: TenantId,
    pub coupon_id: CouponId,
    pub actor: UserId,
    pub terms: CouponTerms,
    pub occurred_at: DateTime<Utc>,
}

/// Event: CouponRedeemed.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CouponRedeemed {
    pub tenant_id: TenantId,
    pub coupon_id: CouponId,
    pub actor: UserId,
    pub order_amount: Money,
    pub discount: Money,
    pub order_reference: Option<String>,
    pub occurred_at: DateTime<Utc>,
}

/// Event: CouponDeactivated.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CouponDeactivated {
    pub tenant_id: TenantId,
    pub coupon_id: CouponId,
    pub actor: UserId,
    pub reason: Option<String>,
    pub occurred_at: DateTime<Utc>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum CouponEvent {
    CouponCreated(CouponCreated),
    CouponRedeemed(CouponRedeemed),
    CouponDeactivated(CouponDeactivated),
}

impl Event for CouponEvent {
    fn event_type(&self) -> &'static str {
        match self {
            CouponEvent::CouponCreated(_) => "sales.coupon.created",
            CouponEvent::CouponRedeemed(_) => "sales.coupon.redeemed",
            CouponEvent::CouponDeactivated(_) => "sales.coupon.deactivated",
        }
    }

    fn version(&self) -> u32 {
        1
    }

    fn occurred_at(&self) -> DateTime<Utc> {
        match self {
            CouponEvent::CouponCreated(e) => e.occurred_at,
            CouponEvent::CouponRedeemed(e) => e.occurred_at,
            CouponEvent::CouponDeactivated(e) => e.occurred_at,
        }
    }
}

impl Aggregate for Coupon {
    type Command = CouponCommand;
    type Event = CouponEvent;
    type Error = DomainError;

    fn apply(&mut self, event: &Self::Event) {
        match event {
            CouponEvent::CouponCreated(e) => {
                self.id = e.coupon_id;
                self.tenant_id = Some(e.tenant_id);
                self.terms = Some(e.terms.clone());
                self.active = true;
                self.times_used = 0;
                self.created = true;
            }
            CouponEvent::CouponRedeemed(_) => {
                self.times_used = self.times_used.saturating_add(1);
            }
            CouponEvent::CouponDeactivated(_) => {
                self.active = false;
            }
        }

        self.version += 1;
    }

    fn handle(&self, command: &Self::Command) -> Result<Vec<Self::Event>, Self::Error> {
        match command {
            CouponCommand::CreateCoupon(cmd) => self.handle_create(cmd),
            CouponCommand::RedeemCoupon(cmd) => self.handle_redeem(cmd),
            CouponCommand::DeactivateCoupon(cmd) => self.handle_deactivate(cmd),
        }
    }
}

impl Coupon {
    fn ensure_existing(&self, tenant_id: TenantId, coupon_id: CouponId) -> Result<(), DomainError> {
        if !self.created {
            return Err(DomainError::not_found());
        }
        if self.tenant_id != Some(tenant_id) {
            return Err(DomainError::invariant("tenant mismatch"));
        }
        if self.id != coupon_id {
            return Err(DomainError::invariant("coupon_id mismatch"));
        }
        Ok(())
    }

    fn handle_create(&self, cmd: &CreateCoupon) -> Result<Vec<CouponEvent>, DomainError> {
        if self.created {
            return Err(DomainError::conflict("coupon already exists"));
        }
        DomainError::from_violations(cmd.terms.violations())?;

        let mut terms = cmd.terms.clone();
        terms.code = terms.code.trim().to_uppercase();

        Ok(vec![CouponEvent::CouponCreated(CouponCreated {
            tenant_id: cmd.tenant_id,
            coupon_id: cmd.coupon_id,
            actor: cmd.actor,
            terms,
            occurred_at: cmd.occurred_at,
        })])
    }

    fn handle_redeem(&self, cmd: &RedeemCoupon) -> Result<Vec<CouponEvent>, DomainError> {
        self.ensure_existing(cmd.tenant_id, cmd.coupon_id)?;

        if cmd.order_amount <= Money::ZERO {
            return Err(DomainError::validation("order amount must be positive"));
        }
        DomainError::from_violations(self.check(cmd.order_amount, cmd.occurred_at))?;

        Ok(vec![CouponEvent::CouponRedeemed(CouponRedeemed {
            tenant_id: cmd.tenant_id,
            coupon_id: cmd.coupon_id,
            actor: cmd.actor,
            order_amount: cmd.order_amount,
            discount: self.discount_for(cmd.order_amount),
            order_reference: cmd.order_reference.clone(),
            occurred_at: cmd.occurred_at,
        })])
    }

    fn handle_deactivate(&self, cmd: &DeactivateCoupon) -> Result<Vec<CouponEvent>, DomainError> {
        self.ensure_existing(cmd.tenant_id, cmd.coupon_id)?;

        if !self.active {
            return Err(DomainError::invariant("coupon is already inactive"));
        }

        Ok(vec![CouponEvent::CouponDeactivated(CouponDeactivated {
            tenant_id: cmd.tenant_id,
            coupon_id: cmd.coupon_id,
            actor: cmd.actor,
            reason: cmd.reason.clone(),
            occurred_at: cmd.occurred_at,
        })])
    }
}
