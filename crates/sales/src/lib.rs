//! Sales domain module (point-of-sale coupons, event-sourced).
//!
//! Coupon validation is a handful of independent predicates (active, validity
//! window, usage limit, minimum spend) plus the discount computation. Pure
//! domain logic: no IO, no HTTP, no storage.

pub mod coupon;

pub use coupon::{
    Coupon, CouponCommand, CouponCreated, CouponDeactivated, CouponEvent, CouponId, CouponRedeemed,
    CouponTerms, CreateCoupon, DeactivateCoupon, Discount, RedeemCoupon,
};
