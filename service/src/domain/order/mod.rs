//! [`Order`] definitions.

pub mod line;

use std::sync::LazyLock;

use common::{define_kind, unit, DateTime, DateTimeOf, Money};
use derive_more::{AsRef, Display, From, FromStr, Into};
#[cfg(feature = "postgres")]
use postgres_types::{FromSql, ToSql};
use rand::Rng as _;
use regex::Regex;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

pub use self::line::Line;

/// Persisted customer order, the root aggregate of the ordering flow.
#[derive(Clone, Debug)]
pub struct Order {
    /// ID of this [`Order`].
    pub id: Id,

    /// Human-readable display [`Number`] of this [`Order`].
    ///
    /// Not guaranteed to be unique, the true key is the [`Id`].
    pub number: Number,

    /// [`CustomerName`] this [`Order`] was placed by.
    pub customer_name: CustomerName,

    /// [`CustomerEmail`] of this [`Order`], if provided.
    ///
    /// Gates the email notification channel.
    pub customer_email: Option<CustomerEmail>,

    /// [`CustomerPhone`] of this [`Order`], if provided.
    pub customer_phone: Option<CustomerPhone>,

    /// [`MessagingId`] of this [`Order`], if provided.
    ///
    /// Gates the messaging notification channel.
    pub customer_messaging_id: Option<MessagingId>,

    /// Current [`Status`] of this [`Order`].
    pub status: Status,

    /// Total amount of this [`Order`].
    ///
    /// Captured at creation time and never recomputed afterwards, even if
    /// catalog prices change later.
    pub total_amount: Money,

    /// Freeform [`Notes`] of this [`Order`], if any.
    pub notes: Option<Notes>,

    /// [`DateTime`] when this [`Order`] should be picked up, if requested.
    pub pickup_time: Option<PickupDateTime>,

    /// Reference to the hosted payment session of this [`Order`], if one
    /// was opened.
    pub payment_session_id: Option<PaymentSessionId>,

    /// [`DateTime`] when this [`Order`] was created.
    pub created_at: CreationDateTime,

    /// [`DateTime`] when this [`Order`] was last updated.
    pub updated_at: UpdateDateTime,
}

impl Order {
    /// Sets the provided [`Status`] directly on this [`Order`], bypassing
    /// the forward-only chain.
    ///
    /// This is the automated (payment webhook) transition authority:
    /// exact-target and idempotent.
    pub fn set_status(&mut self, status: Status) {
        self.status = status;
        self.updated_at = DateTime::now().coerce();
    }

    /// Advances this [`Order`] to the next [`Status`] along the forward
    /// chain.
    ///
    /// This is the human (staff) transition authority: next-step-only.
    ///
    /// # Errors
    ///
    /// If the current [`Status`] has no next step.
    pub fn advance_status(&mut self) -> Result<Status, InvalidTransition> {
        let next = self
            .status
            .next()
            .ok_or(InvalidTransition(self.status))?;
        self.set_status(next);
        Ok(next)
    }
}

/// ID of an [`Order`].
#[derive(
    Clone,
    Copy,
    Debug,
    Default,
    Deserialize,
    Display,
    Eq,
    From,
    FromStr,
    Hash,
    Into,
    PartialEq,
    Serialize,
)]
#[cfg_attr(feature = "postgres", derive(ToSql, FromSql), postgres(transparent))]
pub struct Id(Uuid);

impl Id {
    /// Creates a new random [`Id`].
    #[must_use]
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }
}

/// Human-readable display code of an [`Order`] in the `HHMM-RRR` format,
/// where `HHMM` is the time of day the [`Order`] was placed at and `RRR` is
/// a random suffix.
///
/// This is a display convenience only: collisions across days (or within
/// the same minute) are possible and acceptable.
#[derive(AsRef, Clone, Debug, Display, Eq, PartialEq, Serialize)]
#[as_ref(str, String)]
#[cfg_attr(feature = "postgres", derive(FromSql, ToSql), postgres(transparent))]
pub struct Number(String);

impl Number {
    /// Generates a new [`Number`] from the current time of day and a random
    /// suffix.
    #[must_use]
    pub fn generate() -> Self {
        let (hour, minute) = DateTime::now().hour_minute();
        let suffix = rand::thread_rng().gen_range(0..1000_u16);
        Self(format!("{hour:02}{minute:02}-{suffix:03}"))
    }

    /// Creates a new [`Number`] if the given `number` matches the
    /// `HHMM-RRR` format.
    #[must_use]
    pub fn new(number: impl Into<String>) -> Option<Self> {
        let number = number.into();
        Self::check(&number).then_some(Self(number))
    }

    /// Checks whether the given `number` is a valid [`Number`].
    fn check(number: impl AsRef<str>) -> bool {
        /// Regular expression checking the `HHMM-RRR` format.
        static REGEX: LazyLock<Regex> = LazyLock::new(|| {
            Regex::new(r"^\d{4}-\d{3}$").expect("valid regex")
        });

        REGEX.is_match(number.as_ref())
    }
}

impl FromStr for Number {
    type Err = &'static str;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::new(s).ok_or("invalid `Number`")
    }
}

/// Name of the customer an [`Order`] was placed by.
#[derive(AsRef, Clone, Debug, Display, Eq, PartialEq, Serialize)]
#[as_ref(str, String)]
#[cfg_attr(feature = "postgres", derive(FromSql, ToSql), postgres(transparent))]
pub struct CustomerName(String);

impl CustomerName {
    /// Creates a new [`CustomerName`] if the given `name` is valid.
    #[must_use]
    pub fn new(name: impl Into<String>) -> Option<Self> {
        let name = name.into();
        Self::check(&name).then_some(Self(name))
    }

    /// Checks whether the given `name` is a valid [`CustomerName`].
    fn check(name: impl AsRef<str>) -> bool {
        let name = name.as_ref();
        name.trim() == name && !name.is_empty() && name.len() <= 256
    }
}

impl FromStr for CustomerName {
    type Err = &'static str;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::new(s).ok_or("invalid `CustomerName`")
    }
}

/// Email address of the customer an [`Order`] was placed by.
#[derive(AsRef, Clone, Debug, Display, Eq, PartialEq, Serialize)]
#[as_ref(str, String)]
#[cfg_attr(feature = "postgres", derive(FromSql, ToSql), postgres(transparent))]
pub struct CustomerEmail(String);

impl CustomerEmail {
    /// Creates a new [`CustomerEmail`] if the given `address` is valid.
    #[must_use]
    pub fn new(address: impl Into<String>) -> Option<Self> {
        let address = address.into();
        Self::check(&address).then_some(Self(address))
    }

    /// Checks whether the given `address` is a valid [`CustomerEmail`].
    fn check(address: impl AsRef<str>) -> bool {
        /// Regular expression checking the [`CustomerEmail`] format.
        static REGEX: LazyLock<Regex> = LazyLock::new(|| {
            Regex::new(r"^[^\s@]+@[^\s@]+\.[^\s@]+$").expect("valid regex")
        });

        REGEX.is_match(address.as_ref())
    }
}

impl FromStr for CustomerEmail {
    type Err = &'static str;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::new(s).ok_or("invalid `CustomerEmail`")
    }
}

/// Phone number of the customer an [`Order`] was placed by.
#[derive(AsRef, Clone, Debug, Display, Eq, PartialEq, Serialize)]
#[as_ref(str, String)]
#[cfg_attr(feature = "postgres", derive(FromSql, ToSql), postgres(transparent))]
pub struct CustomerPhone(String);

impl CustomerPhone {
    /// Creates a new [`CustomerPhone`] if the given `phone` is valid.
    #[must_use]
    pub fn new(phone: impl Into<String>) -> Option<Self> {
        let phone = phone.into();
        Self::check(&phone).then_some(Self(phone))
    }

    /// Checks whether the given `phone` is a valid [`CustomerPhone`].
    fn check(phone: impl AsRef<str>) -> bool {
        /// Regular expression checking the [`CustomerPhone`] format.
        static REGEX: LazyLock<Regex> = LazyLock::new(|| {
            Regex::new(r"^\+?[\d\- ]{4,20}$").expect("valid regex")
        });

        REGEX.is_match(phone.as_ref())
    }
}

impl FromStr for CustomerPhone {
    type Err = &'static str;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::new(s).ok_or("invalid `CustomerPhone`")
    }
}

/// Messaging platform identifier of the customer an [`Order`] was placed
/// by.
///
/// Opaque to this system: it is only handed over to the messaging
/// notification channel.
#[derive(
    AsRef, Clone, Debug, Deserialize, Display, Eq, From, PartialEq, Serialize,
)]
#[as_ref(str, String)]
#[from(&str, String)]
#[cfg_attr(feature = "postgres", derive(FromSql, ToSql), postgres(transparent))]
pub struct MessagingId(String);

/// Freeform notes attached to an [`Order`] by the customer.
#[derive(
    AsRef, Clone, Debug, Deserialize, Display, Eq, From, PartialEq, Serialize,
)]
#[as_ref(str, String)]
#[from(&str, String)]
#[cfg_attr(feature = "postgres", derive(FromSql, ToSql), postgres(transparent))]
pub struct Notes(String);

/// Reference to the hosted payment session opened for an [`Order`].
#[derive(
    AsRef, Clone, Debug, Deserialize, Display, Eq, From, PartialEq, Serialize,
)]
#[as_ref(str, String)]
#[from(&str, String)]
#[cfg_attr(feature = "postgres", derive(FromSql, ToSql), postgres(transparent))]
pub struct PaymentSessionId(String);

define_kind! {
    #[doc = "Lifecycle status of an [`Order`]."]
    enum Status {
        #[doc = "Awaiting payment confirmation."]
        Pending = 1,

        #[doc = "Payment confirmed (or placed to pay at the counter)."]
        Confirmed = 2,

        #[doc = "Preparation has begun."]
        Preparing = 3,

        #[doc = "Ready for handover to the customer."]
        Ready = 4,

        #[doc = "Handed to the customer. Terminal."]
        Completed = 5,

        #[doc = "Cancelled. Terminal."]
        Cancelled = 6,
    }
}

impl Status {
    /// Returns the next [`Status`] along the staff-facing forward chain.
    ///
    /// [`None`] is returned for terminal statuses, and for
    /// [`Status::Pending`]: the `pending -> confirmed` edge belongs
    /// exclusively to the payment webhook.
    #[must_use]
    pub fn next(self) -> Option<Self> {
        match self {
            Self::Confirmed => Some(Self::Preparing),
            Self::Preparing => Some(Self::Ready),
            Self::Ready => Some(Self::Completed),
            Self::Pending | Self::Completed | Self::Cancelled => None,
        }
    }

    /// Indicates whether this [`Status`] is terminal.
    #[must_use]
    pub fn is_terminal(self) -> bool {
        matches!(self, Self::Completed | Self::Cancelled)
    }
}

/// Error of advancing an [`Order`] out of a [`Status`] with no next step.
#[derive(Clone, Copy, Debug, Display, derive_more::Error)]
#[display("no forward transition out of `{_0}` status")]
pub struct InvalidTransition(#[error(not(source))] pub Status);

/// [`DateTime`] of an [`Order`] creation.
///
/// [`DateTime`]: common::DateTime
pub type CreationDateTime = DateTimeOf<unit::Creation>;

/// [`DateTime`] of the last [`Order`] update.
///
/// [`DateTime`]: common::DateTime
pub type UpdateDateTime = DateTimeOf<unit::Update>;

/// [`DateTime`] an [`Order`] should be picked up at.
///
/// [`DateTime`]: common::DateTime
pub type PickupDateTime = DateTimeOf<unit::Pickup>;

#[cfg(test)]
mod spec {
    use common::{DateTime, Money};

    use super::{
        CustomerName, Id, InvalidTransition, Number, Order, Status,
    };

    fn order(status: Status) -> Order {
        Order {
            id: Id::new(),
            number: Number::generate(),
            customer_name: CustomerName::new("Sato").unwrap(),
            customer_email: None,
            customer_phone: None,
            customer_messaging_id: None,
            status,
            total_amount: Money::new(480).unwrap(),
            notes: None,
            pickup_time: None,
            payment_session_id: None,
            created_at: DateTime::now().coerce(),
            updated_at: DateTime::now().coerce(),
        }
    }

    #[test]
    fn number_format() {
        let number = Number::generate();
        assert!(
            Number::new(AsRef::<str>::as_ref(&number)).is_some(),
            "generated `{number}` must match `HHMM-RRR`",
        );
        assert!(Number::new("1234-567").is_some());
        assert!(Number::new("123-4567").is_none());
        assert!(Number::new("12345678").is_none());
    }

    #[test]
    fn advances_along_the_chain_only() {
        let mut order = order(Status::Confirmed);

        assert_eq!(order.advance_status().unwrap(), Status::Preparing);
        assert_eq!(order.advance_status().unwrap(), Status::Ready);
        assert_eq!(order.advance_status().unwrap(), Status::Completed);

        let err = order.advance_status().unwrap_err();
        assert!(matches!(err, InvalidTransition(Status::Completed)));
        assert_eq!(order.status, Status::Completed);
    }

    #[test]
    fn terminal_statuses_reject_advancing() {
        for status in [Status::Completed, Status::Cancelled] {
            let mut order = order(status);
            assert!(order.advance_status().is_err());
            assert_eq!(order.status, status);
        }
    }

    #[test]
    fn pending_is_reserved_for_the_webhook() {
        let mut order = order(Status::Pending);

        // Staff cannot advance out of `pending`.
        assert!(order.advance_status().is_err());

        // The webhook direct-set can, and is idempotent.
        order.set_status(Status::Confirmed);
        assert_eq!(order.status, Status::Confirmed);
        order.set_status(Status::Confirmed);
        assert_eq!(order.status, Status::Confirmed);
    }
}
