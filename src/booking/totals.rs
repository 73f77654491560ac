use rust_decimal::{Decimal, RoundingStrategy};

/// Tax and grand total derived from a base amount
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Totals {
    pub tax: Decimal,
    pub total: Decimal,
}

/// Compute GST and total for `base_amount`.
///
/// Tax is `base_amount * rate_percent / 100` rounded to two places with
/// banker's rounding (half to even), so `0.125` becomes `0.12` and `0.135`
/// becomes `0.14`. `total` is always `base_amount + tax`.
///
/// Returns `None` when the arithmetic overflows `Decimal`.
pub fn compute_totals(
    base_amount: Decimal,
    apply_tax: bool,
    rate_percent: Decimal,
) -> Option<Totals> {
    if !apply_tax {
        return Some(Totals {
            tax: Decimal::ZERO,
            total: base_amount,
        });
    }

    let tax = base_amount
        .checked_mul(rate_percent)?
        .checked_div(Decimal::ONE_HUNDRED)?
        .round_dp_with_strategy(2, RoundingStrategy::MidpointNearestEven);

    Some(Totals {
        tax,
        total: base_amount.checked_add(tax)?,
    })
}
