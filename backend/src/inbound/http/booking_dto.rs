//! Wire DTOs for booking, reschedule and payment payloads.
//!
//! Domain records are mapped into these camelCase shapes so the JSON contract
//! is documented in one place and stays stable if the domain grows.

use pagination::Page;
use serde::Serialize;
use serde_json::Value;
use utoipa::ToSchema;

use crate::domain::ports::{BookingDetails, BookingView, CreateBookingResponse};
use crate::domain::{
    Booking, BookingSlot, BookingStatus, PartyRole, PaymentResult, PaymentStatus,
    ProfileSummary, Reschedule, RescheduleStatus, SlotGroup, SlotRequest,
};

/// Checkout linkage of a booking.
#[derive(Debug, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct PaymentDto {
    pub merchant_transaction_id: Option<String>,
    pub checkout_id: Option<String>,
    /// Two-decimal amount, e.g. `"150.00"`.
    pub amount: Option<String>,
    pub currency: Option<String>,
    pub status: PaymentStatus,
}

/// Booking record as returned to clients.
#[derive(Debug, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct BookingDto {
    #[schema(format = Uuid)]
    pub id: String,
    #[schema(format = Uuid)]
    pub client_id: String,
    #[schema(format = Uuid)]
    pub talent_id: String,
    pub note: Option<String>,
    pub status: BookingStatus,
    pub skill_id: Option<String>,
    pub created_at: String,
    pub updated_at: String,
    pub payment: PaymentDto,
}

impl From<Booking> for BookingDto {
    fn from(booking: Booking) -> Self {
        Self {
            id: booking.id.to_string(),
            client_id: booking.client_id.to_string(),
            talent_id: booking.talent_id.to_string(),
            note: booking.note,
            status: booking.status,
            skill_id: booking.skill_id.map(|id| id.to_string()),
            created_at: booking.created_at.to_rfc3339(),
            updated_at: booking.updated_at.to_rfc3339(),
            payment: PaymentDto {
                merchant_transaction_id: booking.payment.merchant_transaction_id,
                checkout_id: booking.payment.checkout_id,
                amount: booking.payment.amount.map(|amount| amount.to_string()),
                currency: booking.payment.currency,
                status: booking.payment.status,
            },
        }
    }
}

/// One persisted ledger row.
#[derive(Debug, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct BookingSlotDto {
    #[schema(format = Uuid)]
    pub id: String,
    #[schema(value_type = String, format = Date)]
    pub date: chrono::NaiveDate,
    pub time: String,
}

impl From<BookingSlot> for BookingSlotDto {
    fn from(slot: BookingSlot) -> Self {
        Self {
            id: slot.id.to_string(),
            date: slot.date,
            time: slot.time,
        }
    }
}

/// A requested `(date, time)` pair.
#[derive(Debug, Serialize, ToSchema)]
pub struct SlotPairDto {
    #[schema(value_type = String, format = Date)]
    pub date: chrono::NaiveDate,
    #[schema(example = "09:00 - 10:00")]
    pub time: String,
}

impl From<SlotRequest> for SlotPairDto {
    fn from(slot: SlotRequest) -> Self {
        Self {
            date: slot.date,
            time: slot.time.to_string(),
        }
    }
}

/// Merged ranges of one date.
#[derive(Debug, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct SlotGroupDto {
    #[schema(value_type = String, format = Date)]
    pub booking_date: chrono::NaiveDate,
    pub booking_times: Vec<String>,
}

impl From<SlotGroup> for SlotGroupDto {
    fn from(group: SlotGroup) -> Self {
        Self {
            booking_date: group.booking_date,
            booking_times: group.booking_times,
        }
    }
}

/// Result of a booking creation.
#[derive(Debug, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct CreatedBookingDto {
    pub booking: BookingDto,
    pub slots: Vec<BookingSlotDto>,
    /// Pairs repeated in the request and inserted once.
    pub duplicates: Vec<SlotPairDto>,
}

impl From<CreateBookingResponse> for CreatedBookingDto {
    fn from(created: CreateBookingResponse) -> Self {
        Self {
            booking: created.booking.into(),
            slots: created.slots.into_iter().map(Into::into).collect(),
            duplicates: created.duplicates.into_iter().map(Into::into).collect(),
        }
    }
}

/// Booking with merged slots and computed price.
#[derive(Debug, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct BookingSummaryDto {
    #[serde(flatten)]
    pub booking: BookingDto,
    pub slots: Vec<SlotGroupDto>,
    #[schema(example = "100.00")]
    pub total_price: String,
}

impl From<BookingView> for BookingSummaryDto {
    fn from(view: BookingView) -> Self {
        Self {
            booking: view.booking.into(),
            slots: view.slots.into_iter().map(Into::into).collect(),
            total_price: view.total_price.to_string(),
        }
    }
}

/// Reschedule proposal.
#[derive(Debug, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct RescheduleDto {
    #[schema(format = Uuid)]
    pub id: String,
    #[schema(format = Uuid)]
    pub booking_id: String,
    pub requested_by_role: PartyRole,
    #[schema(format = Uuid)]
    pub requested_by: String,
    #[schema(value_type = String, format = Date)]
    pub old_date: chrono::NaiveDate,
    pub old_time: String,
    #[schema(value_type = String, format = Date)]
    pub new_date: chrono::NaiveDate,
    pub new_time: String,
    pub status: RescheduleStatus,
    pub remarks: Option<String>,
    pub created_at: String,
    pub updated_at: String,
}

impl From<Reschedule> for RescheduleDto {
    fn from(reschedule: Reschedule) -> Self {
        Self {
            id: reschedule.id.to_string(),
            booking_id: reschedule.booking_id.to_string(),
            requested_by_role: reschedule.requested_by_role,
            requested_by: reschedule.requested_by.to_string(),
            old_date: reschedule.old_date,
            old_time: reschedule.old_time,
            new_date: reschedule.new_date,
            new_time: reschedule.new_time,
            status: reschedule.status,
            remarks: reschedule.remarks,
            created_at: reschedule.created_at.to_rfc3339(),
            updated_at: reschedule.updated_at.to_rfc3339(),
        }
    }
}

/// Booking details read model.
#[derive(Debug, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct BookingDetailsDto {
    #[serde(flatten)]
    pub summary: BookingSummaryDto,
    pub latest_reschedule: Option<RescheduleDto>,
    pub counterparty: Option<ProfileSummary>,
}

impl From<BookingDetails> for BookingDetailsDto {
    fn from(details: BookingDetails) -> Self {
        Self {
            summary: details.view.into(),
            latest_reschedule: details.latest_reschedule.map(Into::into),
            counterparty: details.counterparty,
        }
    }
}

/// One page of bookings.
#[derive(Debug, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct BookingPageDto {
    pub bookings: Vec<BookingSummaryDto>,
    pub total_records: u64,
    pub current_page: u32,
    pub total_pages: u64,
}

impl From<Page<BookingView>> for BookingPageDto {
    fn from(page: Page<BookingView>) -> Self {
        let total_records = page.total_records();
        let current_page = page.current_page();
        let total_pages = page.total_pages();
        Self {
            bookings: page.into_items().into_iter().map(Into::into).collect(),
            total_records,
            current_page,
            total_pages,
        }
    }
}

/// Provider verdict.
#[derive(Debug, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct PaymentResultDto {
    #[schema(example = "000.100.110")]
    pub code: String,
    pub description: String,
    /// Complete provider response.
    #[schema(value_type = Object)]
    pub raw: Value,
}

impl From<PaymentResult> for PaymentResultDto {
    fn from(result: PaymentResult) -> Self {
        Self {
            code: result.code,
            description: result.description,
            raw: result.raw,
        }
    }
}

/// Polling result with the reconciled booking.
#[derive(Debug, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct PaymentStatusDto {
    pub payment_result: PaymentResultDto,
    pub booking: BookingDto,
}

/// Wrapper naming the booking in single-booking responses.
#[derive(Debug, Serialize, ToSchema)]
pub struct BookingEnvelopeDto {
    pub booking: BookingDto,
}

/// Wrapper naming the proposal in reschedule responses.
#[derive(Debug, Serialize, ToSchema)]
pub struct RescheduleEnvelopeDto {
    pub reschedule: RescheduleDto,
}
