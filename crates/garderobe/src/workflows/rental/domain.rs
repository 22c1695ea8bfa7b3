use chrono::{DateTime, Duration, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::ops::{Add, AddAssign, Sub, SubAssign};

/// Identifier wrapper for renters (account ids minted by the auth collaborator).
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct RenterId(pub String);

/// Identifier wrapper for physical garments.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct GarmentId(pub String);

/// Identifier wrapper for bookings.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct BookingId(pub String);

/// Identifier wrapper for custodial wallets.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct WalletId(pub String);

/// Identifier wrapper for ledger entries.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct EntryId(pub String);

/// Identifier wrapper for damage claims.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ClaimId(pub String);

/// Monetary amount in minor currency units. Integer only; the ledger never
/// sees a float.
#[derive(
    Debug, Clone, Copy, Default, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize,
)]
#[serde(transparent)]
pub struct Money(i64);

impl Money {
    pub const fn from_minor(minor: i64) -> Self {
        Money(minor)
    }

    pub const fn minor(self) -> i64 {
        self.0
    }

    pub const fn zero() -> Self {
        Money(0)
    }

    pub const fn is_zero(self) -> bool {
        self.0 == 0
    }

    pub const fn is_positive(self) -> bool {
        self.0 > 0
    }

    /// Percentage of the amount, rounded half-up in minor units.
    pub fn percent(self, pct: u32) -> Money {
        let scaled = self.0 as i128 * pct as i128 + 50;
        Money((scaled / 100) as i64)
    }

    /// Multiplies by a whole-day count (extension fees).
    pub fn times(self, count: u32) -> Money {
        Money(self.0 * count as i64)
    }
}

impl fmt::Display for Money {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl Add for Money {
    type Output = Money;

    fn add(self, rhs: Money) -> Money {
        Money(self.0 + rhs.0)
    }
}

impl AddAssign for Money {
    fn add_assign(&mut self, rhs: Money) {
        self.0 += rhs.0;
    }
}

impl Sub for Money {
    type Output = Money;

    fn sub(self, rhs: Money) -> Money {
        Money(self.0 - rhs.0)
    }
}

impl SubAssign for Money {
    fn sub_assign(&mut self, rhs: Money) {
        self.0 -= rhs.0;
    }
}

/// Physical custody state of a garment within the shop/hub/renter loop.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CustodyStatus {
    Draft,
    Available,
    Reserved,
    Rented,
    Maintenance,
    Retired,
}

impl CustodyStatus {
    /// Whether the calendar may take new bookings for a garment in this
    /// custody state. Reserved and rented garments still accept disjoint
    /// future windows; the scheduler owns the overlap decision.
    pub const fn is_bookable(self) -> bool {
        matches!(self, Self::Available | Self::Reserved | Self::Rented)
    }

    pub const fn label(self) -> &'static str {
        match self {
            Self::Draft => "draft",
            Self::Available => "available",
            Self::Reserved => "reserved",
            Self::Rented => "rented",
            Self::Maintenance => "maintenance",
            Self::Retired => "retired",
        }
    }
}

/// Authoritative booking status. Transitions go through [`BookingStatus::after`]
/// only; there is no other mutation path.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum BookingStatus {
    Pending,
    AwaitingPayment,
    Confirmed,
    AtHub,
    Shipping,
    PickedUp,
    InUse,
    AwaitingReturn,
    Returned,
    ReturnedToHub,
    QcChecking,
    Cleaning,
    ReturnedToShop,
    Completed,
    Disputed,
    Cancelled,
}

impl BookingStatus {
    pub const fn label(self) -> &'static str {
        match self {
            Self::Pending => "pending",
            Self::AwaitingPayment => "awaiting_payment",
            Self::Confirmed => "confirmed",
            Self::AtHub => "at_hub",
            Self::Shipping => "shipping",
            Self::PickedUp => "picked_up",
            Self::InUse => "in_use",
            Self::AwaitingReturn => "awaiting_return",
            Self::Returned => "returned",
            Self::ReturnedToHub => "returned_to_hub",
            Self::QcChecking => "qc_checking",
            Self::Cleaning => "cleaning",
            Self::ReturnedToShop => "returned_to_shop",
            Self::Completed => "completed",
            Self::Disputed => "disputed",
            Self::Cancelled => "cancelled",
        }
    }

    /// Active bookings hold their garment's calendar slot.
    pub const fn is_active(self) -> bool {
        !matches!(self, Self::Cancelled | Self::Completed)
    }

    /// The single transition table. `None` means the pair is not a legal
    /// transition and the caller must reject it.
    pub fn after(self, action: BookingAction) -> Option<BookingStatus> {
        use BookingAction as A;
        use BookingStatus as S;

        match (self, action) {
            (S::AwaitingPayment, A::Pay) => Some(S::Confirmed),
            (S::Pending | S::AwaitingPayment | S::Confirmed, A::Cancel) => Some(S::Cancelled),
            (S::Confirmed, A::HubReceive) => Some(S::AtHub),
            (S::AtHub, A::HubSend) => Some(S::Shipping),
            (S::Shipping, A::ConfirmPickup) => Some(S::PickedUp),
            (S::PickedUp, A::MarkInUse) => Some(S::InUse),
            (S::PickedUp | S::InUse, A::OpenReturn) => Some(S::AwaitingReturn),
            (S::AwaitingReturn, A::ConfirmReturn) => Some(S::Returned),
            (S::Returned, A::HubReceiveReturn) => Some(S::ReturnedToHub),
            (S::ReturnedToHub, A::StartQc) => Some(S::QcChecking),
            (S::ReturnedToHub | S::QcChecking, A::QcPass) => Some(S::Cleaning),
            (S::ReturnedToHub | S::QcChecking, A::QcDamage) => Some(S::Disputed),
            (S::Cleaning, A::CleaningDone) => Some(S::ReturnedToShop),
            (S::ReturnedToShop, A::Complete) => Some(S::Completed),
            _ => None,
        }
    }
}

/// Events accepted by the booking transition table.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum BookingAction {
    Pay,
    Cancel,
    HubReceive,
    HubSend,
    ConfirmPickup,
    MarkInUse,
    OpenReturn,
    ConfirmReturn,
    HubReceiveReturn,
    StartQc,
    QcPass,
    QcDamage,
    CleaningDone,
    Complete,
}

impl BookingAction {
    pub const fn label(self) -> &'static str {
        match self {
            Self::Pay => "pay",
            Self::Cancel => "cancel",
            Self::HubReceive => "hub_receive",
            Self::HubSend => "hub_send",
            Self::ConfirmPickup => "confirm_pickup",
            Self::MarkInUse => "mark_in_use",
            Self::OpenReturn => "open_return",
            Self::ConfirmReturn => "confirm_return",
            Self::HubReceiveReturn => "hub_receive_return",
            Self::StartQc => "start_qc",
            Self::QcPass => "qc_pass",
            Self::QcDamage => "qc_damage",
            Self::CleaningDone => "cleaning_done",
            Self::Complete => "complete",
        }
    }
}

/// Lifecycle of a booking's security deposit. Check-and-set on this field is
/// what makes a second unlock structurally impossible.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DepositDisposition {
    None,
    Locked,
    Released,
    Forfeited,
}

/// Intake checks the hub performs before taking custody of a garment.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum HubIntakeItem {
    GarmentMatchesBooking,
    ConditionPhotographed,
    AccessoriesComplete,
    PackagingPrepared,
    TagSealed,
}

impl HubIntakeItem {
    pub const COUNT: usize = 5;

    pub const fn ordered() -> [Self; Self::COUNT] {
        [
            Self::GarmentMatchesBooking,
            Self::ConditionPhotographed,
            Self::AccessoriesComplete,
            Self::PackagingPrepared,
            Self::TagSealed,
        ]
    }

    pub const fn label(self) -> &'static str {
        match self {
            Self::GarmentMatchesBooking => "garment_matches_booking",
            Self::ConditionPhotographed => "condition_photographed",
            Self::AccessoriesComplete => "accessories_complete",
            Self::PackagingPrepared => "packaging_prepared",
            Self::TagSealed => "tag_sealed",
        }
    }
}

/// Enum-indexed checklist; completeness is a property of the array, not of a
/// runtime string-set comparison.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct HubChecklist([bool; HubIntakeItem::COUNT]);

impl HubChecklist {
    pub const fn empty() -> Self {
        HubChecklist([false; HubIntakeItem::COUNT])
    }

    pub fn from_items(items: &[HubIntakeItem]) -> Self {
        let mut checklist = Self::empty();
        for item in items {
            checklist.record(*item);
        }
        checklist
    }

    pub fn record(&mut self, item: HubIntakeItem) {
        self.0[item as usize] = true;
    }

    pub fn is_checked(&self, item: HubIntakeItem) -> bool {
        self.0[item as usize]
    }

    pub fn is_complete(&self) -> bool {
        self.0.iter().all(|checked| *checked)
    }

    pub fn missing(&self) -> Vec<HubIntakeItem> {
        HubIntakeItem::ordered()
            .into_iter()
            .filter(|item| !self.is_checked(*item))
            .collect()
    }
}

/// A physical garment owned by a shop and rented through the platform.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Garment {
    pub id: GarmentId,
    pub shop_code: String,
    pub name: String,
    pub custody: CustodyStatus,
    /// Post-return cleaning buffer blocking the calendar after each rental.
    pub buffer_days: u32,
    pub rental_price: Money,
    pub deposit_amount: Money,
}

impl Garment {
    /// End of the calendar slot a rental occupies: return date plus buffer.
    pub fn buffer_end(&self, return_date: NaiveDate) -> NaiveDate {
        return_date + Duration::days(self.buffer_days as i64)
    }
}

/// A reservation of one garment for a fixed date range. Never deleted;
/// cancelled bookings are retained with status [`BookingStatus::Cancelled`].
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Booking {
    pub id: BookingId,
    pub renter_id: RenterId,
    pub garment_id: GarmentId,
    pub status: BookingStatus,
    pub pickup_date: NaiveDate,
    pub return_date: NaiveDate,
    /// `return_date` + the garment's buffer days; kept with the booking so the
    /// scheduler never re-reads the garment to test overlap.
    pub buffer_end: NaiveDate,
    pub event_date: NaiveDate,
    pub rental_fee: Money,
    pub service_fee: Money,
    pub delivery_fee: Money,
    pub laundry_fee: Money,
    pub extension_fee: Money,
    pub extended_days: u32,
    /// Sum of the fees above, excluding the deposit hold.
    pub total_amount: Money,
    pub hold_amount: Money,
    pub deposit: DepositDisposition,
    pub pay_deadline: DateTime<Utc>,
    pub paid_at: Option<DateTime<Utc>>,
    pub tracking_code: Option<String>,
    pub checklist: HubChecklist,
    pub hub_received_at: Option<DateTime<Utc>>,
    pub shipped_at: Option<DateTime<Utc>>,
    pub returned_at: Option<DateTime<Utc>>,
    pub qc_passed_at: Option<DateTime<Utc>>,
    pub notes: Option<String>,
    pub created_at: DateTime<Utc>,
}

/// Custodial wallet; one per renter, created lazily with zero balances.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Wallet {
    pub id: WalletId,
    pub renter_id: RenterId,
    pub available: Money,
    pub locked: Money,
}

/// Movement kinds recorded against a wallet.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum LedgerEntryType {
    TopUp,
    Withdraw,
    Lock,
    Unlock,
    Payment,
    Refund,
}

impl LedgerEntryType {
    pub const fn label(self) -> &'static str {
        match self {
            Self::TopUp => "topup",
            Self::Withdraw => "withdraw",
            Self::Lock => "lock",
            Self::Unlock => "unlock",
            Self::Payment => "payment",
            Self::Refund => "refund",
        }
    }
}

/// Append-only record explaining one wallet balance change.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LedgerEntry {
    pub id: EntryId,
    pub wallet_id: WalletId,
    pub entry_type: LedgerEntryType,
    pub amount: Money,
    pub reference: Option<BookingId>,
    pub created_at: DateTime<Utc>,
}

/// Open or resolved damage finding raised by quality control.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DamageClaim {
    pub id: ClaimId,
    pub booking_id: BookingId,
    pub renter_id: RenterId,
    pub description: String,
    pub estimated_cost: Money,
    pub status: ClaimStatus,
    pub created_at: DateTime<Utc>,
}

/// Damage claim settlement state; resolution happens outside the engine.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ClaimStatus {
    Pending,
    Resolved,
}
