//! Balance engine
//!
//! Turns the expense and payment ledger into net positions and settlement
//! transfers. Everything here is a pure function over a `LedgerSnapshot`.
//!
//! Arithmetic is exact. Every amount is scaled to integer minor units at the
//! largest decimal scale found in the ledger, then multiplied by the least
//! common multiple of all participant counts. Each share is then a whole
//! `i128` and the nets of all users sum to exactly zero. Values are rounded
//! to cents only when they leave the engine.
//!
//! `Amount` caps the scale at four decimal places and the size at
//! `MAX_AMOUNT`, so the frame only outgrows `i128` through the participant
//! counts: roughly forty distinct group sizes at the largest amounts, many
//! more at everyday ones. `check_capacity` finds that out before a record
//! is accepted.

use std::cmp::Reverse;
use std::collections::{BTreeMap, BinaryHeap, HashSet};

use rust_decimal::Decimal;
use thiserror::Error;

use crate::domain::entities::{
    ActivityId, Amount, Balance, Expense, LedgerSnapshot, NetBalance, Payment,
    SettlementStrategy, Share, UserId, CURRENCY_SCALE, MAX_AMOUNT, MAX_AMOUNT_SCALE,
};

/// Errors raised while computing balances
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum BalanceError {
    #[error("Invalid amount {0}: amounts must be greater than zero")]
    InvalidAmount(Decimal),

    #[error("Invalid amount {0}: amounts must not exceed {max}", max = MAX_AMOUNT)]
    AmountTooLarge(Decimal),

    #[error(
        "Invalid amount {0}: amounts may have at most {max} decimal places",
        max = MAX_AMOUNT_SCALE
    )]
    AmountTooPrecise(Decimal),

    #[error("Invalid expense: {0}")]
    InvalidExpense(String),

    #[error("Unknown user: {0}")]
    UnknownUser(UserId),

    #[error("Ledger values exceed the exact arithmetic range")]
    Overflow,
}

/// Compute who owes whom across the whole ledger
pub fn compute_balances(
    snapshot: &LedgerSnapshot,
    strategy: SettlementStrategy,
) -> Result<Vec<Balance>, BalanceError> {
    let view = LedgerView::new(
        snapshot,
        snapshot.expenses.iter().collect(),
        snapshot.payments.iter().collect(),
    )?;

    let transfers = match strategy {
        SettlementStrategy::Minimal => settle_minimal(&view.nets()?),
        SettlementStrategy::Pairwise => net_pairs(&view.pair_debts()?),
    };

    view.to_balances(transfers)
}

/// Net position of every user in the snapshot, in snapshot order
pub fn compute_net_balances(snapshot: &LedgerSnapshot) -> Result<Vec<NetBalance>, BalanceError> {
    let view = LedgerView::new(
        snapshot,
        snapshot.expenses.iter().collect(),
        snapshot.payments.iter().collect(),
    )?;
    let nets = view.nets()?;

    snapshot
        .users
        .iter()
        .map(|user| {
            let net = nets.get(&user.id).copied().unwrap_or(0);
            Ok(NetBalance {
                user_id: user.id,
                net: view.scale.to_currency(net)?,
            })
        })
        .collect()
}

/// Minimal settlement of a single activity's expenses.
///
/// Payments are not tied to activities, so they are left out.
pub fn settle_activity(
    snapshot: &LedgerSnapshot,
    activity_id: &ActivityId,
) -> Result<Vec<Balance>, BalanceError> {
    let expenses = snapshot
        .expenses
        .iter()
        .filter(|e| &e.activity_id == activity_id)
        .collect();
    let view = LedgerView::new(snapshot, expenses, Vec::new())?;

    view.to_balances(settle_minimal(&view.nets()?))
}

/// Split `amount` evenly in cents. The first participants absorb the
/// leftover cents, so the shares always add up to the amount rounded to
/// cents.
pub fn split_evenly(amount: Amount, participants: &[UserId]) -> Result<Vec<Share>, BalanceError> {
    if participants.is_empty() {
        return Err(BalanceError::InvalidExpense(
            "an expense needs at least one participant".to_string(),
        ));
    }

    let scale = Scale {
        decimals: amount.value().scale().max(CURRENCY_SCALE),
        denominator: 1,
    };
    let cents = scale.to_currency(scale.units(amount)?)?.mantissa();
    let count = participants.len() as i128;
    let (base, leftover) = (cents / count, cents % count);

    participants
        .iter()
        .enumerate()
        .map(|(i, user_id)| {
            let share = if (i as i128) < leftover { base + 1 } else { base };
            Ok(Share {
                user_id: *user_id,
                amount: Decimal::try_from_i128_with_scale(share, CURRENCY_SCALE)
                    .map_err(|_| BalanceError::Overflow)?,
            })
        })
        .collect()
}

/// Check that every view of the ledger can still be computed exactly.
///
/// Runs the same arithmetic as `compute_balances` with both strategies,
/// without settling. Fails with `Overflow` when the ledger has outgrown the
/// exact range.
pub fn check_capacity(snapshot: &LedgerSnapshot) -> Result<(), BalanceError> {
    let view = LedgerView::new(
        snapshot,
        snapshot.expenses.iter().collect(),
        snapshot.payments.iter().collect(),
    )?;

    for net in view.nets()?.values() {
        view.scale.to_currency(*net)?;
    }
    for debt in view.pair_debts()?.values() {
        view.scale.to_currency(*debt)?;
    }

    Ok(())
}

/// Fixed-point frame shared by every value of one computation
#[derive(Debug, Clone, Copy)]
struct Scale {
    /// Decimal places of one minor unit
    decimals: u32,
    /// Least common multiple of all participant counts
    denominator: i128,
}

impl Scale {
    fn for_ledger(expenses: &[&Expense], payments: &[&Payment]) -> Result<Self, BalanceError> {
        let decimals = expenses
            .iter()
            .map(|e| e.amount.value().scale())
            .chain(payments.iter().map(|p| p.amount.value().scale()))
            .fold(CURRENCY_SCALE, u32::max);

        let mut denominator = 1i128;
        for expense in expenses {
            denominator = lcm(denominator, expense.participants.len() as i128)?;
        }

        Ok(Self {
            decimals,
            denominator,
        })
    }

    fn units(&self, amount: Amount) -> Result<i128, BalanceError> {
        let value = amount.value();
        pow10(self.decimals - value.scale())?
            .checked_mul(value.mantissa())
            .and_then(|v| v.checked_mul(self.denominator))
            .ok_or(BalanceError::Overflow)
    }

    /// Round exact units to cents, halves away from zero
    fn to_currency(&self, units: i128) -> Result<Decimal, BalanceError> {
        let divisor = pow10(self.decimals - CURRENCY_SCALE)?
            .checked_mul(self.denominator)
            .ok_or(BalanceError::Overflow)?;

        let mut cents = units / divisor;
        let remainder = (units % divisor).abs();
        if remainder.checked_mul(2).ok_or(BalanceError::Overflow)? >= divisor {
            cents += units.signum();
        }

        Decimal::try_from_i128_with_scale(cents, CURRENCY_SCALE).map_err(|_| BalanceError::Overflow)
    }
}

/// Validated subset of the ledger the engine runs over
struct LedgerView<'a> {
    known: HashSet<UserId>,
    expenses: Vec<&'a Expense>,
    payments: Vec<&'a Payment>,
    scale: Scale,
}

impl<'a> LedgerView<'a> {
    fn new(
        snapshot: &LedgerSnapshot,
        expenses: Vec<&'a Expense>,
        payments: Vec<&'a Payment>,
    ) -> Result<Self, BalanceError> {
        let known: HashSet<UserId> = snapshot.users.iter().map(|u| u.id).collect();

        for expense in &expenses {
            if expense.participants.is_empty() {
                return Err(BalanceError::InvalidExpense(format!(
                    "expense {} has no participants",
                    expense.id
                )));
            }
            ensure_known(&known, &expense.paid_by_user_id)?;
            for participant in &expense.participants {
                ensure_known(&known, participant)?;
            }
        }
        for payment in &payments {
            ensure_known(&known, &payment.from_user_id)?;
            ensure_known(&known, &payment.to_user_id)?;
        }

        let scale = Scale::for_ledger(&expenses, &payments)?;

        Ok(Self {
            known,
            expenses,
            payments,
            scale,
        })
    }

    /// Signed net per user in exact units. Sums to zero.
    fn nets(&self) -> Result<BTreeMap<UserId, i128>, BalanceError> {
        let mut nets: BTreeMap<UserId, i128> = self.known.iter().map(|id| (*id, 0)).collect();

        for expense in &self.expenses {
            let total = self.scale.units(expense.amount)?;
            let share = total / expense.participants.len() as i128;

            add(&mut nets, expense.paid_by_user_id, total)?;
            for participant in &expense.participants {
                add(&mut nets, *participant, -share)?;
            }
        }

        for payment in &self.payments {
            let amount = self.scale.units(payment.amount)?;
            add(&mut nets, payment.from_user_id, amount)?;
            add(&mut nets, payment.to_user_id, -amount)?;
        }

        Ok(nets)
    }

    /// Debt per unordered pair `(low, high)`. Positive means `low` owes `high`.
    fn pair_debts(&self) -> Result<BTreeMap<(UserId, UserId), i128>, BalanceError> {
        let mut pairs = BTreeMap::new();

        for expense in &self.expenses {
            let share =
                self.scale.units(expense.amount)? / expense.participants.len() as i128;
            for participant in &expense.participants {
                owe(&mut pairs, *participant, expense.paid_by_user_id, share)?;
            }
        }

        // paying someone back shrinks what you owe them
        for payment in &self.payments {
            let amount = self.scale.units(payment.amount)?;
            owe(&mut pairs, payment.to_user_id, payment.from_user_id, amount)?;
        }

        Ok(pairs)
    }

    fn to_balances(&self, transfers: Vec<Transfer>) -> Result<Vec<Balance>, BalanceError> {
        let mut balances = Vec::with_capacity(transfers.len());
        for transfer in transfers {
            let amount = self.scale.to_currency(transfer.units)?;
            if amount > Decimal::ZERO {
                balances.push(Balance {
                    debtor: transfer.debtor,
                    creditor: transfer.creditor,
                    amount,
                });
            }
        }
        Ok(balances)
    }
}

/// Exact transfer before rounding
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
struct Transfer {
    debtor: UserId,
    creditor: UserId,
    units: i128,
}

/// Greedy settlement: the largest debt is paid to the largest credit until
/// every net is zero. Ties go to the lower user id. Each round clears at
/// least one user, so `n` nonzero users need at most `n - 1` transfers.
fn settle_minimal(nets: &BTreeMap<UserId, i128>) -> Vec<Transfer> {
    let mut debtors: BinaryHeap<(i128, Reverse<UserId>)> = nets
        .iter()
        .filter(|(_, net)| **net < 0)
        .map(|(id, net)| (-net, Reverse(*id)))
        .collect();
    let mut creditors: BinaryHeap<(i128, Reverse<UserId>)> = nets
        .iter()
        .filter(|(_, net)| **net > 0)
        .map(|(id, net)| (*net, Reverse(*id)))
        .collect();

    let mut transfers = Vec::new();
    while let (Some((debt, Reverse(debtor))), Some((credit, Reverse(creditor)))) =
        (debtors.pop(), creditors.pop())
    {
        let units = debt.min(credit);
        transfers.push(Transfer {
            debtor,
            creditor,
            units,
        });

        if debt > units {
            debtors.push((debt - units, Reverse(debtor)));
        }
        if credit > units {
            creditors.push((credit - units, Reverse(creditor)));
        }
    }

    transfers
}

fn net_pairs(pairs: &BTreeMap<(UserId, UserId), i128>) -> Vec<Transfer> {
    pairs
        .iter()
        .filter(|(_, units)| **units != 0)
        .map(|((low, high), units)| {
            if *units > 0 {
                Transfer {
                    debtor: *low,
                    creditor: *high,
                    units: *units,
                }
            } else {
                Transfer {
                    debtor: *high,
                    creditor: *low,
                    units: -units,
                }
            }
        })
        .collect()
}

fn ensure_known(known: &HashSet<UserId>, id: &UserId) -> Result<(), BalanceError> {
    if known.contains(id) {
        Ok(())
    } else {
        Err(BalanceError::UnknownUser(*id))
    }
}

fn add(nets: &mut BTreeMap<UserId, i128>, user: UserId, delta: i128) -> Result<(), BalanceError> {
    let net = nets.entry(user).or_insert(0);
    *net = net.checked_add(delta).ok_or(BalanceError::Overflow)?;
    Ok(())
}

fn owe(
    pairs: &mut BTreeMap<(UserId, UserId), i128>,
    debtor: UserId,
    creditor: UserId,
    units: i128,
) -> Result<(), BalanceError> {
    if debtor == creditor {
        return Ok(());
    }
    let (key, delta) = if debtor < creditor {
        ((debtor, creditor), units)
    } else {
        ((creditor, debtor), -units)
    };
    let debt = pairs.entry(key).or_insert(0);
    *debt = debt.checked_add(delta).ok_or(BalanceError::Overflow)?;
    Ok(())
}

fn pow10(exp: u32) -> Result<i128, BalanceError> {
    10i128.checked_pow(exp).ok_or(BalanceError::Overflow)
}

fn gcd(mut a: i128, mut b: i128) -> i128 {
    while b != 0 {
        (a, b) = (b, a % b);
    }
    a.abs()
}

fn lcm(a: i128, b: i128) -> Result<i128, BalanceError> {
    (a / gcd(a, b))
        .checked_mul(b)
        .ok_or(BalanceError::Overflow)
}
